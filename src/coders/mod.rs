//! Leaf and Container Coders
//!
//! - `num`: fixed-width integers and floats with per-field byte order
//! - `raw`: fixed-length and remainder byte blocks
//! - `strings`: UTF-8 with length-prefix, terminator, or fixed-count layout
//! - `arrays`: fixed-count, length-prefixed, and predicate-terminated lists
//! - `record`: flat struct walking fields in declaration order
//! - `length`: the shared length specification (literal or reference)

pub mod arrays;
pub mod length;
pub mod num;
pub mod raw;
pub mod record;
pub mod strings;

pub use arrays::{array_while, fixed_array, prefixed_array, WhileView};
pub use length::Length;
pub use num::{
    float32, float64, int16, int32, int64, int8, uint16, uint32, uint64, uint8, Endian,
};
pub use raw::{fixed_bytes, remaining_bytes};
pub use record::record;
pub use strings::{fixed_string, prefixed_string, terminated_string};
