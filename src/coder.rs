//! The Coder Contract
//!
//! A coder is the universal unit: one paired encode/decode operation over a
//! caller-owned byte buffer view for one logical type. Coders are stateless
//! apart from closed-over configuration, never allocate their destination,
//! and never retain the buffer past the call. A coder tree is built once at
//! format-definition time and reused unmutated; per-call state lives in the
//! [`Context`].
//!
//! Top-level entry points live here too: `encode` allocates through the
//! growth helper, `encode_into`/`decode` run against caller-owned views,
//! and the `*_with_context` variants share reference state across related
//! calls.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, trace};

use crate::context::{Context, Direction};
use crate::error::{CodecError, Result};
use crate::growth::{grow_and_retry, GrowthOptions};
use crate::refs::RefId;
use crate::value::Value;

/// Paired encode/decode operation over a byte buffer view.
///
/// Implementations must record their own value into the Context
/// immediately after doing their work, on both directions. Any coder can
/// be a reference target, not only designated length fields.
pub trait Coder: Send + Sync {
    /// Identity handle captured by [`ref_to`](crate::refs::ref_to)
    fn ref_id(&self) -> RefId;

    /// Write `value` into the front of `buf`, returning bytes written
    fn encode(&self, value: &Value, buf: &mut [u8], ctx: &mut Context) -> Result<usize>;

    /// Read a value from the front of `buf`, returning it with bytes consumed
    fn decode(&self, buf: &[u8], ctx: &mut Context) -> Result<(Value, usize)>;
}

/// Shared handle to a coder in a format tree
pub type DynCoder = Arc<dyn Coder>;

/// Encode with a growable destination and default growth options
pub fn encode(coder: &DynCoder, value: &Value) -> Result<Bytes> {
    encode_with(coder, value, &GrowthOptions::default())
}

/// Encode with a growable destination and explicit growth options.
///
/// Each retry attempt runs against a fresh Context so references recorded
/// by a failed attempt cannot leak into the next one.
pub fn encode_with(coder: &DynCoder, value: &Value, opts: &GrowthOptions) -> Result<Bytes> {
    let out = grow_and_retry(opts, |buf| {
        let mut ctx = Context::for_encode();
        let written = coder.encode(value, buf, &mut ctx)?;
        Ok(Bytes::copy_from_slice(&buf[..written]))
    })?;
    debug!("encoded {} byte(s)", out.len());
    trace!("encoded frame: {}", hex::encode(&out));
    Ok(out)
}

/// Encode into a caller-owned target buffer; no growth applies
pub fn encode_into(coder: &DynCoder, value: &Value, buf: &mut [u8]) -> Result<usize> {
    let mut ctx = Context::for_encode();
    coder.encode(value, buf, &mut ctx)
}

/// Encode into a caller-owned buffer, sharing an existing Context.
///
/// The Context must be encode-direction; related multi-pass protocols may
/// reuse one Context so later passes can reference earlier values.
pub fn encode_into_with_context(
    coder: &DynCoder,
    value: &Value,
    buf: &mut [u8],
    ctx: &mut Context,
) -> Result<usize> {
    if ctx.direction() != Direction::Encode {
        return Err(CodecError::config(
            "encode requires an encode-direction context",
        ));
    }
    coder.encode(value, buf, ctx)
}

/// Decode a value from the front of `buf`
pub fn decode(coder: &DynCoder, buf: &[u8]) -> Result<Value> {
    let mut ctx = Context::for_decode();
    let (value, consumed) = coder.decode(buf, &mut ctx)?;
    debug!("decoded {} byte(s)", consumed);
    Ok(value)
}

/// Decode sharing an existing Context, returning bytes consumed as well
pub fn decode_with_context(
    coder: &DynCoder,
    buf: &[u8],
    ctx: &mut Context,
) -> Result<(Value, usize)> {
    if ctx.direction() != Direction::Decode {
        return Err(CodecError::config(
            "decode requires a decode-direction context",
        ));
    }
    coder.decode(buf, ctx)
}
