//! Bit-Packed Record Codec
//!
//! Packs sub-byte unsigned fields MSB-first in declaration order: the first
//! field's high bit occupies bit 7 of byte 0, and a field spanning a byte
//! boundary is split into the bits available in the current byte plus a
//! remainder carried into the next. The schema is validated at
//! construction: every width must be 1..=32 and the total a whole number
//! of bytes.
//!
//! The whole record is one reference target; individual bit fields are not
//! separately referenceable.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::coder::{Coder, DynCoder};
use crate::context::Context;
use crate::error::{CodecError, Result};
use crate::refs::RefId;
use crate::value::Value;

struct BitStruct {
    id: RefId,
    fields: Vec<(String, u32)>,
    total_bytes: usize,
}

/// Pack `value` (already range-checked) into `out` starting at the cursor,
/// MSB-first, returning the advanced cursor as (byte, bits_used).
fn pack_bits(out: &mut [u8], mut byte: usize, mut used: u32, width: u32, value: u64) -> (usize, u32) {
    let mut remaining = width;
    while remaining > 0 {
        let avail = 8 - used;
        let take = avail.min(remaining);
        let chunk = ((value >> (remaining - take)) & ((1u64 << take) - 1)) as u8;
        out[byte] |= chunk << (avail - take);
        used += take;
        remaining -= take;
        if used == 8 {
            used = 0;
            byte += 1;
        }
    }
    (byte, used)
}

/// Symmetric extraction for one field at the cursor.
fn unpack_bits(src: &[u8], mut byte: usize, mut used: u32, width: u32) -> (u64, usize, u32) {
    let mut value = 0u64;
    let mut remaining = width;
    while remaining > 0 {
        let avail = 8 - used;
        let take = avail.min(remaining);
        let mask = ((1u16 << take) - 1) as u8;
        let chunk = (src[byte] >> (avail - take)) & mask;
        value = (value << take) | chunk as u64;
        used += take;
        remaining -= take;
        if used == 8 {
            used = 0;
            byte += 1;
        }
    }
    (value, byte, used)
}

impl Coder for BitStruct {
    fn ref_id(&self) -> RefId {
        self.id
    }

    fn encode(&self, value: &Value, buf: &mut [u8], ctx: &mut Context) -> Result<usize> {
        let rec = value.expect_record("bit-packed record")?;
        if buf.len() < self.total_bytes {
            return Err(CodecError::buffer_too_small(self.total_bytes, buf.len()));
        }
        buf[..self.total_bytes].fill(0);

        let mut byte = 0usize;
        let mut used = 0u32;
        for (name, width) in &self.fields {
            let field = rec.get(name).ok_or_else(|| {
                CodecError::conversion(format!("bit-packed record is missing field '{}'", name))
            })?;
            let v = field.expect_u64("bit field")?;
            let max = (1u64 << width) - 1;
            if v > max {
                return Err(CodecError::BitValueOutOfRange {
                    field: name.clone(),
                    value: v,
                    max,
                });
            }
            (byte, used) = pack_bits(buf, byte, used, *width, v);
        }
        ctx.record(self.id, value.clone());
        Ok(self.total_bytes)
    }

    fn decode(&self, buf: &[u8], ctx: &mut Context) -> Result<(Value, usize)> {
        if buf.len() < self.total_bytes {
            return Err(CodecError::buffer_too_small(self.total_bytes, buf.len()));
        }
        let mut fields = BTreeMap::new();
        let mut byte = 0usize;
        let mut used = 0u32;
        for (name, width) in &self.fields {
            let (v, next_byte, next_used) = unpack_bits(buf, byte, used, *width);
            fields.insert(name.clone(), Value::UInt(v));
            byte = next_byte;
            used = next_used;
        }
        let value = Value::Record(fields);
        ctx.record(self.id, value.clone());
        Ok((value, self.total_bytes))
    }
}

/// Bit-packed record over `(name, width)` fields in declaration order.
///
/// Fails at construction on a width outside 1..=32 or a total that is not
/// a multiple of 8; the alignment error names the exact padding needed.
pub fn bit_struct<K, I>(fields: I) -> Result<DynCoder>
where
    K: Into<String>,
    I: IntoIterator<Item = (K, u32)>,
{
    let fields: Vec<(String, u32)> = fields
        .into_iter()
        .map(|(name, width)| (name.into(), width))
        .collect();

    let mut total_bits = 0u32;
    for (name, width) in &fields {
        if *width == 0 || *width > 32 {
            return Err(CodecError::InvalidBitWidth {
                field: name.clone(),
                width: *width,
            });
        }
        total_bits += width;
    }
    if total_bits % 8 != 0 {
        return Err(CodecError::NonByteAligned {
            total_bits,
            padding: 8 - total_bits % 8,
        });
    }

    Ok(Arc::new(BitStruct {
        id: RefId::next(),
        fields,
        total_bytes: (total_bits / 8) as usize,
    }))
}
