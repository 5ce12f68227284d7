//! Voltage Codec Library
//!
//! Composable binary structure codecs for industrial protocol and
//! file-format work: packet headers, TLV containers, bit-packed flags,
//! length-prefixed records. Formats are assembled from small
//! encoder/decoder units ("coders") at runtime, with no schema compiler
//! and no code-generation step.
//!
//! # Architecture
//!
//! This library provides:
//! - **Coder contract**: [`Coder`], one paired encode/decode operation
//!   over a caller-owned buffer view, shared as [`DynCoder`]
//! - **Reference system**: [`ref_to`] and [`ValueRef`]: one field's value
//!   driving another field's size or shape, resolved through the per-call
//!   [`Context`]
//! - **Composite coders**: records, arrays, strings, and byte blocks with
//!   literal, referenced, or predicate-driven sizing
//! - **Bit-packed records**: [`bit_struct`], MSB-first sub-byte fields
//!   across byte boundaries
//! - **Discriminated refinement**: [`refine_switch`], one physical layout
//!   decoded into a runtime-selected family of logical record types
//! - **Buffer growth**: [`GrowthOptions`], encode-side retry for unknown
//!   output sizes
//!
//! # Example
//!
//! ```
//! use voltage_codec::{
//!     decode, encode, fixed_bytes, record, ref_to, uint8, Value,
//! };
//!
//! // A length-prefixed frame: the payload size comes from the `len` field.
//! let len = uint8();
//! let frame = record([
//!     ("len", len.clone()),
//!     ("payload", fixed_bytes(ref_to(&len))),
//! ]);
//!
//! let value = Value::record([
//!     ("len", Value::UInt(3)),
//!     ("payload", Value::Bytes(vec![0x01, 0x02, 0x03])),
//! ]);
//! let wire = encode(&frame, &value).unwrap();
//! assert_eq!(wire.as_ref(), &[0x03, 0x01, 0x02, 0x03]);
//! assert_eq!(decode(&frame, &wire).unwrap(), value);
//! ```

pub mod bits;
pub mod coder;
pub mod coders;
pub mod context;
pub mod error;
pub mod growth;
pub mod refine;
pub mod refs;
pub mod value;

// Re-export core types
pub use bits::bit_struct;
pub use coder::{
    decode, decode_with_context, encode, encode_into, encode_into_with_context, encode_with,
    Coder, DynCoder,
};
pub use coders::{
    array_while, fixed_array, fixed_bytes, fixed_string, float32, float64, int16, int32, int64,
    int8, prefixed_array, prefixed_string, record, remaining_bytes, terminated_string, uint16,
    uint32, uint64, uint8, Endian, Length, WhileView,
};
pub use context::{Context, Direction};
pub use error::{CodecError, Result};
pub use growth::{grow_and_retry, GrowthOptions};
pub use refine::{refine, refine_switch, Refiner, Selector};
pub use refs::{ref_to, zip3_with, RefId, ValueRef};
pub use value::Value;
