//! UTF-8 String Coders
//!
//! Three termination strategies:
//! - fixed byte count with zero-pad on encode and trailing-NUL strip on
//!   decode (over-long input truncates at a character boundary)
//! - length prefix encoded with a caller-supplied numeric coder
//! - single zero-byte terminator

use std::sync::Arc;

use crate::coder::{Coder, DynCoder};
use crate::coders::length::{length_from_value, Length};
use crate::context::Context;
use crate::error::{CodecError, Result};
use crate::refs::RefId;
use crate::value::Value;

fn check_space(buf: &[u8], needed: usize) -> Result<()> {
    if buf.len() < needed {
        return Err(CodecError::buffer_too_small(needed, buf.len()));
    }
    Ok(())
}

fn utf8(bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|e| CodecError::conversion(format!("invalid UTF-8 string payload: {}", e)))
}

/// Largest prefix of `s` that fits `max` bytes without splitting a character
fn truncate_at_char_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

struct FixedString {
    id: RefId,
    len: Length,
}

impl Coder for FixedString {
    fn ref_id(&self) -> RefId {
        self.id
    }

    fn encode(&self, value: &Value, buf: &mut [u8], ctx: &mut Context) -> Result<usize> {
        let width = self.len.resolve(ctx)?;
        let s = value.expect_str("fixed-width string")?;
        let kept = truncate_at_char_boundary(s, width);
        check_space(buf, width)?;
        buf[..kept.len()].copy_from_slice(kept.as_bytes());
        buf[kept.len()..width].fill(0);
        // Record wire truth: the truncated form is what a reference sees.
        ctx.record(self.id, Value::Str(kept.to_string()));
        Ok(width)
    }

    fn decode(&self, buf: &[u8], ctx: &mut Context) -> Result<(Value, usize)> {
        let width = self.len.resolve(ctx)?;
        check_space(buf, width)?;
        let end = buf[..width]
            .iter()
            .rposition(|&b| b != 0)
            .map_or(0, |i| i + 1);
        let s = utf8(&buf[..end])?;
        ctx.record(self.id, Value::Str(s.clone()));
        Ok((Value::Str(s), width))
    }
}

struct PrefixedString {
    id: RefId,
    count: DynCoder,
}

impl Coder for PrefixedString {
    fn ref_id(&self) -> RefId {
        self.id
    }

    fn encode(&self, value: &Value, buf: &mut [u8], ctx: &mut Context) -> Result<usize> {
        let s = value.expect_str("length-prefixed string")?;
        let payload = s.as_bytes();
        let mut offset = self
            .count
            .encode(&Value::UInt(payload.len() as u64), buf, ctx)?;
        check_space(&buf[offset..], payload.len())?;
        buf[offset..offset + payload.len()].copy_from_slice(payload);
        offset += payload.len();
        ctx.record(self.id, Value::Str(s.to_string()));
        Ok(offset)
    }

    fn decode(&self, buf: &[u8], ctx: &mut Context) -> Result<(Value, usize)> {
        let (count_value, mut offset) = self.count.decode(buf, ctx)?;
        let width = length_from_value(&count_value)?;
        check_space(&buf[offset..], width)?;
        let s = utf8(&buf[offset..offset + width])?;
        offset += width;
        ctx.record(self.id, Value::Str(s.clone()));
        Ok((Value::Str(s), offset))
    }
}

struct TerminatedString {
    id: RefId,
}

impl Coder for TerminatedString {
    fn ref_id(&self) -> RefId {
        self.id
    }

    fn encode(&self, value: &Value, buf: &mut [u8], ctx: &mut Context) -> Result<usize> {
        let s = value.expect_str("terminated string")?;
        if s.as_bytes().contains(&0) {
            return Err(CodecError::conversion(
                "terminated string cannot contain an interior NUL byte",
            ));
        }
        let payload = s.as_bytes();
        check_space(buf, payload.len() + 1)?;
        buf[..payload.len()].copy_from_slice(payload);
        buf[payload.len()] = 0;
        ctx.record(self.id, Value::Str(s.to_string()));
        Ok(payload.len() + 1)
    }

    fn decode(&self, buf: &[u8], ctx: &mut Context) -> Result<(Value, usize)> {
        let terminator = buf
            .iter()
            .position(|&b| b == 0)
            .ok_or(CodecError::BufferTooSmall {
                needed: buf.len() + 1,
                available: buf.len(),
            })?;
        let s = utf8(&buf[..terminator])?;
        ctx.record(self.id, Value::Str(s.clone()));
        Ok((Value::Str(s), terminator + 1))
    }
}

/// Fixed byte count, zero-padded; over-long input truncates
pub fn fixed_string(len: impl Into<Length>) -> DynCoder {
    Arc::new(FixedString {
        id: RefId::next(),
        len: len.into(),
    })
}

/// Byte count prefix encoded with the supplied numeric coder
pub fn prefixed_string(count: DynCoder) -> DynCoder {
    Arc::new(PrefixedString {
        id: RefId::next(),
        count,
    })
}

/// Single zero-byte terminator
pub fn terminated_string() -> DynCoder {
    Arc::new(TerminatedString { id: RefId::next() })
}
