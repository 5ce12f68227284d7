//! Shared Length Specification
//!
//! A length is a literal non-negative integer or a reference resolved at
//! traversal time. All length-bearing coders share one validator: the
//! resolved value must be a non-negative integer, checked before any
//! buffer access.

use crate::coder::DynCoder;
use crate::context::Context;
use crate::error::{CodecError, Result};
use crate::refs::{ref_to, ValueRef};
use crate::value::Value;

/// Length specification for size-bearing coders
#[derive(Debug, Clone)]
pub enum Length {
    /// Literal unit count known at schema-build time
    Fixed(usize),
    /// Count produced earlier in the traversal by another coder
    Ref(ValueRef),
}

impl Length {
    /// Resolve to a concrete unit count, validating before any buffer
    /// access takes place.
    pub(crate) fn resolve(&self, ctx: &Context) -> Result<usize> {
        match self {
            Length::Fixed(n) => Ok(*n),
            Length::Ref(r) => {
                let value = r.resolve(ctx)?;
                length_from_value(&value)
            }
        }
    }
}

impl From<usize> for Length {
    fn from(n: usize) -> Self {
        Length::Fixed(n)
    }
}

impl From<ValueRef> for Length {
    fn from(r: ValueRef) -> Self {
        Length::Ref(r)
    }
}

impl From<&DynCoder> for Length {
    fn from(coder: &DynCoder) -> Self {
        Length::Ref(ref_to(coder))
    }
}

/// The single length validator: integer and non-negative.
pub(crate) fn length_from_value(value: &Value) -> Result<usize> {
    match value {
        Value::UInt(n) => Ok(*n as usize),
        Value::Int(n) if *n >= 0 => Ok(*n as usize),
        Value::Int(n) => Err(CodecError::invalid_length(format!(
            "length must be non-negative, got {}",
            n
        ))),
        Value::Float(f) if f.is_finite() && f.fract() == 0.0 && *f >= 0.0 => Ok(*f as usize),
        other => Err(CodecError::invalid_length(format!(
            "length must be a non-negative integer, got {:?}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validator_accepts_integral_values() {
        assert_eq!(length_from_value(&Value::UInt(4)).unwrap(), 4);
        assert_eq!(length_from_value(&Value::Int(4)).unwrap(), 4);
        assert_eq!(length_from_value(&Value::Float(4.0)).unwrap(), 4);
    }

    #[test]
    fn test_validator_rejects_negative_and_fractional() {
        assert!(matches!(
            length_from_value(&Value::Int(-1)),
            Err(CodecError::InvalidLength(_))
        ));
        assert!(matches!(
            length_from_value(&Value::Float(1.5)),
            Err(CodecError::InvalidLength(_))
        ));
        assert!(matches!(
            length_from_value(&Value::Float(f64::NAN)),
            Err(CodecError::InvalidLength(_))
        ));
        assert!(matches!(
            length_from_value(&Value::Str("4".into())),
            Err(CodecError::InvalidLength(_))
        ));
    }
}
