//! Reference Resolution
//!
//! Lets one coder reuse a value produced earlier in the same traversal by
//! another coder. Identity is a small integer handle assigned at
//! construction time from a process-wide counter, so a reference captures a
//! handle rather than a live pointer; the per-call table in
//! [`Context`](crate::context::Context) maps handle to last recorded value.
//!
//! Traversal is strictly sequential and recording is immediate, so a
//! reference only ever observes coders that appear before it in
//! declaration order, on both encode and decode. There is no forward
//! reference or two-pass resolution; schema authors must place length and
//! count fields before their dependents.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::coder::DynCoder;
use crate::context::Context;
use crate::error::{CodecError, Result};
use crate::value::Value;

/// Identity handle for a referenceable coder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RefId(u64);

static NEXT_REF_ID: AtomicU64 = AtomicU64::new(1);

impl RefId {
    /// Allocate a fresh handle. Called once per coder construction, so two
    /// coder instances never share an identity.
    pub(crate) fn next() -> Self {
        RefId(NEXT_REF_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub(crate) fn raw(self) -> u64 {
        self.0
    }
}

type Combine1 = Arc<dyn Fn(&Value) -> Result<Value> + Send + Sync>;
type Combine2 = Arc<dyn Fn(&Value, &Value) -> Result<Value> + Send + Sync>;
type Combine3 = Arc<dyn Fn(&Value, &Value, &Value) -> Result<Value> + Send + Sync>;

/// Combinators are kept at explicit fixed arities so the combiner's
/// parameter list stays checked at the call site.
#[derive(Clone)]
enum Source {
    Coder(RefId),
    Map1(Box<ValueRef>, Combine1),
    Map2(Box<(ValueRef, ValueRef)>, Combine2),
    Map3(Box<(ValueRef, ValueRef, ValueRef)>, Combine3),
}

/// Lazy lookup of a previously recorded coder value, optionally derived
/// through pure combinators.
#[derive(Clone)]
pub struct ValueRef {
    source: Source,
}

impl fmt::Debug for ValueRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Source::Coder(id) => write!(f, "ValueRef(coder #{})", id.raw()),
            Source::Map1(..) => write!(f, "ValueRef(map/1)"),
            Source::Map2(..) => write!(f, "ValueRef(map/2)"),
            Source::Map3(..) => write!(f, "ValueRef(map/3)"),
        }
    }
}

impl ValueRef {
    /// Resolve against the given context. Combinators re-evaluate on every
    /// resolution; they must be pure and cheap.
    pub fn resolve(&self, ctx: &Context) -> Result<Value> {
        match &self.source {
            Source::Coder(id) => ctx
                .lookup(*id)
                .cloned()
                .ok_or(CodecError::RefNotFound(id.raw())),
            Source::Map1(dep, f) => {
                let v = dep.resolve(ctx)?;
                f(&v)
            }
            Source::Map2(deps, f) => {
                let a = deps.0.resolve(ctx)?;
                let b = deps.1.resolve(ctx)?;
                f(&a, &b)
            }
            Source::Map3(deps, f) => {
                let a = deps.0.resolve(ctx)?;
                let b = deps.1.resolve(ctx)?;
                let c = deps.2.resolve(ctx)?;
                f(&a, &b, &c)
            }
        }
    }

    /// Derive a reference through a 1-ary pure function
    pub fn map<F>(self, f: F) -> ValueRef
    where
        F: Fn(&Value) -> Result<Value> + Send + Sync + 'static,
    {
        ValueRef {
            source: Source::Map1(Box::new(self), Arc::new(f)),
        }
    }

    /// Derive a reference through a 2-ary pure function
    pub fn zip_with<F>(self, other: ValueRef, f: F) -> ValueRef
    where
        F: Fn(&Value, &Value) -> Result<Value> + Send + Sync + 'static,
    {
        ValueRef {
            source: Source::Map2(Box::new((self, other)), Arc::new(f)),
        }
    }
}

/// Bind a reference to the exact coder instance
pub fn ref_to(coder: &DynCoder) -> ValueRef {
    ValueRef {
        source: Source::Coder(coder.ref_id()),
    }
}

/// Derive a reference through a 3-ary pure function
pub fn zip3_with<F>(a: ValueRef, b: ValueRef, c: ValueRef, f: F) -> ValueRef
where
    F: Fn(&Value, &Value, &Value) -> Result<Value> + Send + Sync + 'static,
{
    ValueRef {
        source: Source::Map3(Box::new((a, b, c)), Arc::new(f)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Context, Direction};

    fn ctx_with(id: RefId, value: Value) -> Context {
        let mut ctx = Context::new(Direction::Decode);
        ctx.record(id, value);
        ctx
    }

    #[test]
    fn test_resolve_recorded_value() {
        let id = RefId::next();
        let ctx = ctx_with(id, Value::UInt(42));
        let r = ValueRef {
            source: Source::Coder(id),
        };
        assert_eq!(r.resolve(&ctx).unwrap(), Value::UInt(42));
    }

    #[test]
    fn test_resolve_missing_fails() {
        let ctx = Context::new(Direction::Decode);
        let r = ValueRef {
            source: Source::Coder(RefId::next()),
        };
        assert!(matches!(
            r.resolve(&ctx),
            Err(CodecError::RefNotFound(_))
        ));
    }

    #[test]
    fn test_map_reevaluates_per_resolution() {
        let id = RefId::next();
        let r = ValueRef {
            source: Source::Coder(id),
        }
        .map(|v| Ok(Value::UInt(v.expect_u64("map")? * 2)));

        let ctx = ctx_with(id, Value::UInt(3));
        assert_eq!(r.resolve(&ctx).unwrap(), Value::UInt(6));

        // Same ref, new value: the combinator must see the update.
        let ctx = ctx_with(id, Value::UInt(10));
        assert_eq!(r.resolve(&ctx).unwrap(), Value::UInt(20));
    }

    #[test]
    fn test_zip_with_two_dependencies() {
        let a = RefId::next();
        let b = RefId::next();
        let mut ctx = Context::new(Direction::Encode);
        ctx.record(a, Value::UInt(4));
        ctx.record(b, Value::UInt(5));

        let r = ValueRef {
            source: Source::Coder(a),
        }
        .zip_with(
            ValueRef {
                source: Source::Coder(b),
            },
            |x, y| Ok(Value::UInt(x.expect_u64("zip")? + y.expect_u64("zip")?)),
        );
        assert_eq!(r.resolve(&ctx).unwrap(), Value::UInt(9));
    }

    #[test]
    fn test_zip3_missing_dependency_fails() {
        let a = RefId::next();
        let mut ctx = Context::new(Direction::Encode);
        ctx.record(a, Value::UInt(1));

        let have = ValueRef {
            source: Source::Coder(a),
        };
        let missing = ValueRef {
            source: Source::Coder(RefId::next()),
        };
        let r = zip3_with(have.clone(), have, missing, |_, _, _| Ok(Value::UInt(0)));
        assert!(matches!(r.resolve(&ctx), Err(CodecError::RefNotFound(_))));
    }
}
