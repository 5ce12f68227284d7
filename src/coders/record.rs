//! Record Coder
//!
//! Flat struct over named fields, walked strictly in declaration order on
//! both directions. The same Context threads through every field, so a
//! field can reference any field declared before it. This is the reason
//! length and count fields belong ahead of their dependents.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::coder::{Coder, DynCoder};
use crate::context::{with_depth, Context};
use crate::error::{CodecError, Result};
use crate::refs::RefId;
use crate::value::Value;

struct RecordCoder {
    id: RefId,
    fields: Vec<(String, DynCoder)>,
}

impl Coder for RecordCoder {
    fn ref_id(&self) -> RefId {
        self.id
    }

    fn encode(&self, value: &Value, buf: &mut [u8], ctx: &mut Context) -> Result<usize> {
        let rec = value.expect_record("record coder")?;
        let written = with_depth(ctx, |ctx| {
            let mut offset = 0usize;
            for (name, coder) in &self.fields {
                let field = rec.get(name).ok_or_else(|| {
                    CodecError::conversion(format!("record is missing field '{}'", name))
                })?;
                offset += coder.encode(field, &mut buf[offset..], ctx)?;
            }
            Ok(offset)
        })?;
        ctx.record(self.id, value.clone());
        Ok(written)
    }

    fn decode(&self, buf: &[u8], ctx: &mut Context) -> Result<(Value, usize)> {
        let (fields, consumed) = with_depth(ctx, |ctx| {
            let mut fields = BTreeMap::new();
            let mut offset = 0usize;
            for (name, coder) in &self.fields {
                let (field, used) = coder.decode(&buf[offset..], ctx)?;
                fields.insert(name.clone(), field);
                offset += used;
            }
            Ok((fields, offset))
        })?;
        let value = Value::Record(fields);
        ctx.record(self.id, value.clone());
        Ok((value, consumed))
    }
}

/// Record over `(name, coder)` fields in declaration order
pub fn record<K, I>(fields: I) -> DynCoder
where
    K: Into<String>,
    I: IntoIterator<Item = (K, DynCoder)>,
{
    Arc::new(RecordCoder {
        id: RefId::next(),
        fields: fields
            .into_iter()
            .map(|(name, coder)| (name.into(), coder))
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coder::{decode, encode_into};
    use crate::coders::num::{uint16, uint8, Endian};
    use crate::coders::raw::fixed_bytes;
    use crate::refs::ref_to;

    #[test]
    fn test_record_walks_fields_in_declaration_order() {
        let frame = record([
            ("kind", uint8()),
            ("seq", uint16(Endian::Big)),
        ]);
        let mut buf = [0u8; 8];
        let value = Value::record([
            ("kind", Value::UInt(0x7F)),
            ("seq", Value::UInt(0x0102)),
        ]);
        let n = encode_into(&frame, &value, &mut buf).unwrap();
        assert_eq!(n, 3);
        // "kind" precedes "seq" on the wire despite map ordering.
        assert_eq!(&buf[..3], &[0x7F, 0x01, 0x02]);
        assert_eq!(decode(&frame, &buf[..3]).unwrap(), value);
    }

    #[test]
    fn test_record_missing_field_fails() {
        let frame = record([("a", uint8()), ("b", uint8())]);
        let mut buf = [0u8; 4];
        let err = encode_into(
            &frame,
            &Value::record([("a", Value::UInt(1))]),
            &mut buf,
        )
        .unwrap_err();
        assert!(matches!(err, CodecError::DataConversion(_)));
    }

    #[test]
    fn test_length_field_drives_later_payload() {
        let len = uint8();
        let frame = record([
            ("len", len.clone()),
            ("payload", fixed_bytes(ref_to(&len))),
        ]);

        let mut buf = [0u8; 8];
        let value = Value::record([
            ("len", Value::UInt(3)),
            ("payload", Value::Bytes(vec![0xA, 0xB, 0xC])),
        ]);
        let n = encode_into(&frame, &value, &mut buf).unwrap();
        assert_eq!(&buf[..n], &[3, 0xA, 0xB, 0xC]);
        assert_eq!(decode(&frame, &buf[..n]).unwrap(), value);
    }

    #[test]
    fn test_forward_reference_fails_both_directions() {
        // Target declared after its referencer: the reference must fail,
        // never resolve a stale value.
        let len = uint8();
        let frame = record([
            ("payload", fixed_bytes(ref_to(&len))),
            ("len", len.clone()),
        ]);

        let mut buf = [0u8; 8];
        let value = Value::record([
            ("len", Value::UInt(2)),
            ("payload", Value::Bytes(vec![1, 2])),
        ]);
        assert!(matches!(
            encode_into(&frame, &value, &mut buf).unwrap_err(),
            CodecError::RefNotFound(_)
        ));
        assert!(matches!(
            decode(&frame, &[2, 1, 2]).unwrap_err(),
            CodecError::RefNotFound(_)
        ));
    }

    #[test]
    fn test_nested_records() {
        let inner = record([("x", uint8()), ("y", uint8())]);
        let outer = record([("point", inner), ("flags", uint8())]);

        let value = Value::record([
            (
                "point",
                Value::record([("x", Value::UInt(1)), ("y", Value::UInt(2))]),
            ),
            ("flags", Value::UInt(3)),
        ]);
        let mut buf = [0u8; 8];
        let n = encode_into(&outer, &value, &mut buf).unwrap();
        assert_eq!(&buf[..n], &[1, 2, 3]);
        assert_eq!(decode(&outer, &buf[..n]).unwrap(), value);
    }
}
