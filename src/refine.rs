//! Refinement Coders
//!
//! A refiner layers a logical type over a physical one: a pure
//! `refine`/`unrefine` pair, with any fixed arguments bound by closure.
//! `refine` wraps a single base coder; `refine_switch` turns one physical
//! layout into a runtime-selected family of logical record types.
//!
//! The engine cannot verify that the two selectors of a switch agree for
//! corresponding base/refined pairs. A desynchronized selector pair yields
//! silently wrong variant selection or a runtime key failure, never a
//! build-time error. Keeping both selectors derived from the same
//! discriminant is a schema-author obligation.

use std::sync::Arc;

use tracing::trace;

use crate::coder::{Coder, DynCoder};
use crate::context::{with_depth, Context};
use crate::error::{CodecError, Result};
use crate::refs::RefId;
use crate::value::Value;

type RefineFn = Arc<dyn Fn(&Value, &mut Context) -> Result<Value> + Send + Sync>;
type SelectFn = Arc<dyn Fn(&Value, &Context) -> Option<String> + Send + Sync>;

/// Bidirectional pure transform between a physical and a logical value
#[derive(Clone)]
pub struct Refiner {
    refine: RefineFn,
    unrefine: RefineFn,
}

impl Refiner {
    pub fn new<R, U>(refine: R, unrefine: U) -> Self
    where
        R: Fn(&Value, &mut Context) -> Result<Value> + Send + Sync + 'static,
        U: Fn(&Value, &mut Context) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            refine: Arc::new(refine),
            unrefine: Arc::new(unrefine),
        }
    }
}

/// Variant key selectors for a discriminated switch
#[derive(Clone)]
pub struct Selector {
    for_decode: SelectFn,
    for_encode: SelectFn,
}

impl Selector {
    pub fn new<D, E>(for_decode: D, for_encode: E) -> Self
    where
        D: Fn(&Value, &Context) -> Option<String> + Send + Sync + 'static,
        E: Fn(&Value, &Context) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            for_decode: Arc::new(for_decode),
            for_encode: Arc::new(for_encode),
        }
    }
}

struct RefineCoder {
    id: RefId,
    base: DynCoder,
    refiner: Refiner,
}

impl Coder for RefineCoder {
    fn ref_id(&self) -> RefId {
        self.id
    }

    fn encode(&self, value: &Value, buf: &mut [u8], ctx: &mut Context) -> Result<usize> {
        let base_value = (self.refiner.unrefine)(value, ctx)?;
        let written = with_depth(ctx, |ctx| self.base.encode(&base_value, buf, ctx))?;
        ctx.record(self.id, value.clone());
        Ok(written)
    }

    fn decode(&self, buf: &[u8], ctx: &mut Context) -> Result<(Value, usize)> {
        let (base_value, consumed) = with_depth(ctx, |ctx| self.base.decode(buf, ctx))?;
        let refined = (self.refiner.refine)(&base_value, ctx)?;
        ctx.record(self.id, refined.clone());
        Ok((refined, consumed))
    }
}

struct RefineSwitch {
    id: RefId,
    base: DynCoder,
    variants: Vec<(String, Refiner)>,
    selector: Selector,
}

impl RefineSwitch {
    fn variant(&self, key: &str) -> Result<&Refiner> {
        self.variants
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, refiner)| refiner)
            .ok_or_else(|| CodecError::InvalidVariantKey(key.to_string()))
    }
}

impl Coder for RefineSwitch {
    fn ref_id(&self) -> RefId {
        self.id
    }

    fn encode(&self, value: &Value, buf: &mut [u8], ctx: &mut Context) -> Result<usize> {
        let key = (self.selector.for_encode)(value, ctx).ok_or(CodecError::NoVariantSelected)?;
        let refiner = self.variant(&key)?;
        trace!("encoding variant '{}'", key);
        let base_value = (refiner.unrefine)(value, ctx)?;
        let written = with_depth(ctx, |ctx| self.base.encode(&base_value, buf, ctx))?;
        ctx.record(self.id, value.clone());
        Ok(written)
    }

    fn decode(&self, buf: &[u8], ctx: &mut Context) -> Result<(Value, usize)> {
        let (base_value, consumed) = with_depth(ctx, |ctx| self.base.decode(buf, ctx))?;
        let key =
            (self.selector.for_decode)(&base_value, ctx).ok_or(CodecError::NoVariantSelected)?;
        let refiner = self.variant(&key)?;
        trace!("decoding variant '{}'", key);
        let refined = (refiner.refine)(&base_value, ctx)?;
        ctx.record(self.id, refined.clone());
        Ok((refined, consumed))
    }
}

/// Apply one refiner over a base coder unconditionally
pub fn refine(base: DynCoder, refiner: Refiner) -> DynCoder {
    Arc::new(RefineCoder {
        id: RefId::next(),
        base,
        refiner,
    })
}

/// Runtime-selected family of refiners over one physical base layout
pub fn refine_switch<K, I>(base: DynCoder, variants: I, selector: Selector) -> DynCoder
where
    K: Into<String>,
    I: IntoIterator<Item = (K, Refiner)>,
{
    Arc::new(RefineSwitch {
        id: RefId::next(),
        base,
        variants: variants
            .into_iter()
            .map(|(name, refiner)| (name.into(), refiner))
            .collect(),
        selector,
    })
}
