//! Per-Call Traversal Context
//!
//! A Context is created once per top-level call (or supplied explicitly to
//! share reference state across related calls) and threaded by value
//! through every nested coder invocation. It is direction-tagged and hosts
//! the reference table; sharing one Context across two concurrent
//! traversals causes reference cross-talk, so the discipline is one
//! Context per logical call.

use ahash::AHashMap;

use crate::error::{CodecError, Result};
use crate::refs::RefId;
use crate::value::Value;

/// Traversal direction a Context is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Encode,
    Decode,
}

/// Default limit for the recursion-depth guard
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Per-invocation side table: direction plus the handle-keyed reference
/// table, with a depth guard for deeply nested schemas.
#[derive(Debug)]
pub struct Context {
    direction: Direction,
    refs: AHashMap<RefId, Value>,
    depth: usize,
    max_depth: usize,
}

impl Context {
    pub fn new(direction: Direction) -> Self {
        Self::with_max_depth(direction, DEFAULT_MAX_DEPTH)
    }

    pub fn with_max_depth(direction: Direction, max_depth: usize) -> Self {
        Self {
            direction,
            refs: AHashMap::new(),
            depth: 0,
            max_depth,
        }
    }

    pub fn for_encode() -> Self {
        Self::new(Direction::Encode)
    }

    pub fn for_decode() -> Self {
        Self::new(Direction::Decode)
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_encode(&self) -> bool {
        self.direction == Direction::Encode
    }

    pub fn is_decode(&self) -> bool {
        self.direction == Direction::Decode
    }

    /// Record a coder's value. Last write wins: a coder that runs twice in
    /// one traversal (an array element, say) leaves its most recent value.
    pub(crate) fn record(&mut self, id: RefId, value: Value) {
        self.refs.insert(id, value);
    }

    pub(crate) fn lookup(&self, id: RefId) -> Option<&Value> {
        self.refs.get(&id)
    }

    /// Enter one nesting level; containers call this around child
    /// invocations so a runaway schema fails instead of overflowing the
    /// host stack.
    pub(crate) fn descend(&mut self) -> Result<()> {
        if self.depth >= self.max_depth {
            return Err(CodecError::NestingTooDeep(self.max_depth));
        }
        self.depth += 1;
        Ok(())
    }

    pub(crate) fn ascend(&mut self) {
        debug_assert!(self.depth > 0, "ascend below depth zero");
        self.depth = self.depth.saturating_sub(1);
    }
}

/// Run a container body one nesting level down, restoring the depth even
/// when the body fails (a shared Context outlives failed calls).
pub(crate) fn with_depth<T, F>(ctx: &mut Context, body: F) -> Result<T>
where
    F: FnOnce(&mut Context) -> Result<T>,
{
    ctx.descend()?;
    let out = body(ctx);
    ctx.ascend();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_tag() {
        assert!(Context::for_encode().is_encode());
        assert!(Context::for_decode().is_decode());
    }

    #[test]
    fn test_record_last_value_wins() {
        let id = RefId::next();
        let mut ctx = Context::for_decode();
        ctx.record(id, Value::UInt(1));
        ctx.record(id, Value::UInt(2));
        assert_eq!(ctx.lookup(id), Some(&Value::UInt(2)));
    }

    #[test]
    fn test_depth_guard_trips_at_limit() {
        let mut ctx = Context::with_max_depth(Direction::Encode, 2);
        ctx.descend().unwrap();
        ctx.descend().unwrap();
        assert!(matches!(
            ctx.descend(),
            Err(CodecError::NestingTooDeep(2))
        ));
        ctx.ascend();
        ctx.descend().unwrap();
    }
}
