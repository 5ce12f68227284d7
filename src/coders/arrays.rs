//! Array Coders
//!
//! Containers of one element coder with three sizing strategies: a fixed
//! count (literal or referenced), a leading count field, or a per-element
//! predicate probed before each element.

use std::sync::Arc;

use crate::coder::{Coder, DynCoder};
use crate::coders::length::{length_from_value, Length};
use crate::context::{with_depth, Context};
use crate::error::{CodecError, Result};
use crate::refs::RefId;
use crate::value::Value;

/// Read-only view handed to an `array_while` predicate before each element.
///
/// On encode, `elements` is the complete target array, current element
/// included; on decode it holds only the elements decoded so far. Schemas
/// that probe `elements[index]` therefore see it on encode only; the
/// asymmetry is part of the contract.
pub struct WhileView<'a> {
    /// Index of the element about to be processed
    pub index: usize,
    /// Element values visible at this point of the traversal
    pub elements: &'a [Value],
    /// Unprocessed tail of the buffer view
    pub remaining: &'a [u8],
    /// The traversal context (direction, references)
    pub context: &'a Context,
}

/// Continuation predicate for `array_while`
pub type WhilePredicate = Arc<dyn Fn(&WhileView<'_>) -> bool + Send + Sync>;

struct FixedArray {
    id: RefId,
    elem: DynCoder,
    count: Length,
}

impl Coder for FixedArray {
    fn ref_id(&self) -> RefId {
        self.id
    }

    fn encode(&self, value: &Value, buf: &mut [u8], ctx: &mut Context) -> Result<usize> {
        let expected = self.count.resolve(ctx)?;
        let items = value.expect_list("fixed-count array")?;
        if items.len() != expected {
            return Err(CodecError::LengthMismatch {
                expected,
                actual: items.len(),
            });
        }
        let written = with_depth(ctx, |ctx| {
            let mut offset = 0usize;
            for item in items {
                offset += self.elem.encode(item, &mut buf[offset..], ctx)?;
            }
            Ok(offset)
        })?;
        ctx.record(self.id, value.clone());
        Ok(written)
    }

    fn decode(&self, buf: &[u8], ctx: &mut Context) -> Result<(Value, usize)> {
        let expected = self.count.resolve(ctx)?;
        let (items, consumed) = with_depth(ctx, |ctx| {
            let mut items = Vec::with_capacity(expected);
            let mut offset = 0usize;
            for _ in 0..expected {
                let (item, used) = self.elem.decode(&buf[offset..], ctx)?;
                items.push(item);
                offset += used;
            }
            Ok((items, offset))
        })?;
        let value = Value::List(items);
        ctx.record(self.id, value.clone());
        Ok((value, consumed))
    }
}

struct PrefixedArray {
    id: RefId,
    count: DynCoder,
    elem: DynCoder,
}

impl Coder for PrefixedArray {
    fn ref_id(&self) -> RefId {
        self.id
    }

    fn encode(&self, value: &Value, buf: &mut [u8], ctx: &mut Context) -> Result<usize> {
        let items = value.expect_list("length-prefixed array")?;
        let prefix = self
            .count
            .encode(&Value::UInt(items.len() as u64), buf, ctx)?;
        let written = with_depth(ctx, |ctx| {
            let mut offset = prefix;
            for item in items {
                offset += self.elem.encode(item, &mut buf[offset..], ctx)?;
            }
            Ok(offset)
        })?;
        ctx.record(self.id, value.clone());
        Ok(written)
    }

    fn decode(&self, buf: &[u8], ctx: &mut Context) -> Result<(Value, usize)> {
        let (count_value, prefix) = self.count.decode(buf, ctx)?;
        let expected = length_from_value(&count_value)?;
        let (items, consumed) = with_depth(ctx, |ctx| {
            let mut items = Vec::with_capacity(expected);
            let mut offset = prefix;
            for _ in 0..expected {
                let (item, used) = self.elem.decode(&buf[offset..], ctx)?;
                items.push(item);
                offset += used;
            }
            Ok((items, offset))
        })?;
        let value = Value::List(items);
        ctx.record(self.id, value.clone());
        Ok((value, consumed))
    }
}

struct WhileArray {
    id: RefId,
    elem: DynCoder,
    pred: WhilePredicate,
}

impl Coder for WhileArray {
    fn ref_id(&self) -> RefId {
        self.id
    }

    fn encode(&self, value: &Value, buf: &mut [u8], ctx: &mut Context) -> Result<usize> {
        let items = value.expect_list("predicate-terminated array")?;
        let (taken, written) = with_depth(ctx, |ctx| {
            let mut offset = 0usize;
            let mut taken = 0usize;
            for (index, item) in items.iter().enumerate() {
                let keep = {
                    let view = WhileView {
                        index,
                        elements: items,
                        remaining: &buf[offset..],
                        context: ctx,
                    };
                    (self.pred)(&view)
                };
                if !keep {
                    break;
                }
                offset += self.elem.encode(item, &mut buf[offset..], ctx)?;
                taken += 1;
            }
            Ok((taken, offset))
        })?;
        // Record wire truth: only the encoded prefix is observable.
        ctx.record(self.id, Value::List(items[..taken].to_vec()));
        Ok(written)
    }

    fn decode(&self, buf: &[u8], ctx: &mut Context) -> Result<(Value, usize)> {
        let (items, consumed) = with_depth(ctx, |ctx| {
            let mut items: Vec<Value> = Vec::new();
            let mut offset = 0usize;
            loop {
                let keep = {
                    let view = WhileView {
                        index: items.len(),
                        elements: &items,
                        remaining: &buf[offset..],
                        context: ctx,
                    };
                    (self.pred)(&view)
                };
                if !keep {
                    break;
                }
                let (item, used) = self.elem.decode(&buf[offset..], ctx)?;
                items.push(item);
                offset += used;
            }
            Ok((items, offset))
        })?;
        let value = Value::List(items);
        ctx.record(self.id, value.clone());
        Ok((value, consumed))
    }
}

/// Array with an exact element count (literal or reference)
pub fn fixed_array(elem: DynCoder, count: impl Into<Length>) -> DynCoder {
    Arc::new(FixedArray {
        id: RefId::next(),
        elem,
        count: count.into(),
    })
}

/// Array with a leading count field encoded by the supplied numeric coder
pub fn prefixed_array(count: DynCoder, elem: DynCoder) -> DynCoder {
    Arc::new(PrefixedArray {
        id: RefId::next(),
        count,
        elem,
    })
}

/// Array terminated by a predicate probed before each element
pub fn array_while<F>(elem: DynCoder, pred: F) -> DynCoder
where
    F: Fn(&WhileView<'_>) -> bool + Send + Sync + 'static,
{
    Arc::new(WhileArray {
        id: RefId::next(),
        elem,
        pred: Arc::new(pred),
    })
}
