//! Raw Byte-Block Coders
//!
//! `fixed_bytes` carries an exact byte count (literal or referenced);
//! `remaining_bytes` consumes or fills whatever is left of the buffer view.

use std::sync::Arc;

use crate::coder::{Coder, DynCoder};
use crate::coders::length::Length;
use crate::context::Context;
use crate::error::{CodecError, Result};
use crate::refs::RefId;
use crate::value::Value;

struct FixedBytes {
    id: RefId,
    len: Length,
}

impl Coder for FixedBytes {
    fn ref_id(&self) -> RefId {
        self.id
    }

    fn encode(&self, value: &Value, buf: &mut [u8], ctx: &mut Context) -> Result<usize> {
        let expected = self.len.resolve(ctx)?;
        let payload = value.expect_bytes("fixed byte block")?;
        // The resolved length is ground truth, not the payload length.
        if payload.len() != expected {
            return Err(CodecError::LengthMismatch {
                expected,
                actual: payload.len(),
            });
        }
        if buf.len() < expected {
            return Err(CodecError::buffer_too_small(expected, buf.len()));
        }
        buf[..expected].copy_from_slice(payload);
        ctx.record(self.id, Value::Bytes(payload.to_vec()));
        Ok(expected)
    }

    fn decode(&self, buf: &[u8], ctx: &mut Context) -> Result<(Value, usize)> {
        let expected = self.len.resolve(ctx)?;
        if buf.len() < expected {
            return Err(CodecError::buffer_too_small(expected, buf.len()));
        }
        let payload = buf[..expected].to_vec();
        ctx.record(self.id, Value::Bytes(payload.clone()));
        Ok((Value::Bytes(payload), expected))
    }
}

struct RemainingBytes {
    id: RefId,
}

impl Coder for RemainingBytes {
    fn ref_id(&self) -> RefId {
        self.id
    }

    fn encode(&self, value: &Value, buf: &mut [u8], ctx: &mut Context) -> Result<usize> {
        let payload = value.expect_bytes("remainder byte block")?;
        if buf.len() < payload.len() {
            return Err(CodecError::buffer_too_small(payload.len(), buf.len()));
        }
        buf[..payload.len()].copy_from_slice(payload);
        ctx.record(self.id, Value::Bytes(payload.to_vec()));
        Ok(payload.len())
    }

    fn decode(&self, buf: &[u8], ctx: &mut Context) -> Result<(Value, usize)> {
        let payload = buf.to_vec();
        ctx.record(self.id, Value::Bytes(payload.clone()));
        Ok((Value::Bytes(payload), buf.len()))
    }
}

/// Byte block with an exact length (literal or reference)
pub fn fixed_bytes(len: impl Into<Length>) -> DynCoder {
    Arc::new(FixedBytes {
        id: RefId::next(),
        len: len.into(),
    })
}

/// Byte block spanning the remainder of the buffer view
pub fn remaining_bytes() -> DynCoder {
    Arc::new(RemainingBytes { id: RefId::next() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coder::{decode, encode_into};

    #[test]
    fn test_fixed_bytes_roundtrip() {
        let c = fixed_bytes(3usize);
        let mut buf = [0u8; 8];
        let n = encode_into(&c, &Value::Bytes(vec![1, 2, 3]), &mut buf).unwrap();
        assert_eq!(n, 3);
        assert_eq!(&buf[..3], &[1, 2, 3]);
        assert_eq!(
            decode(&c, &[1, 2, 3]).unwrap(),
            Value::Bytes(vec![1, 2, 3])
        );
    }

    #[test]
    fn test_fixed_bytes_length_mismatch() {
        let c = fixed_bytes(4usize);
        let mut buf = [0u8; 8];
        let err = encode_into(&c, &Value::Bytes(vec![1, 2]), &mut buf).unwrap_err();
        assert!(matches!(
            err,
            CodecError::LengthMismatch {
                expected: 4,
                actual: 2
            }
        ));
    }

    #[test]
    fn test_fixed_bytes_decode_consumes_exactly() {
        let c = fixed_bytes(2usize);
        let mut ctx = Context::for_decode();
        let (value, consumed) = c.decode(&[0xAA, 0xBB, 0xCC], &mut ctx).unwrap();
        assert_eq!(value, Value::Bytes(vec![0xAA, 0xBB]));
        assert_eq!(consumed, 2);
    }

    #[test]
    fn test_fixed_bytes_short_decode_fails() {
        let c = fixed_bytes(4usize);
        let err = decode(&c, &[1, 2]).unwrap_err();
        assert!(matches!(
            err,
            CodecError::BufferTooSmall {
                needed: 4,
                available: 2
            }
        ));
    }

    #[test]
    fn test_remaining_bytes_takes_whole_view() {
        let c = remaining_bytes();
        assert_eq!(
            decode(&c, &[9, 8, 7]).unwrap(),
            Value::Bytes(vec![9, 8, 7])
        );
        assert_eq!(decode(&c, &[]).unwrap(), Value::Bytes(vec![]));
    }
}
