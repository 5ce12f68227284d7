//! Encode-Side Buffer Growth
//!
//! Encoding often starts without knowing the output size. The growth
//! helper allocates an initial buffer and retries the encode against
//! progressively larger ones whenever it fails with the distinguished
//! buffer-too-small kind; every other failure propagates immediately.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{CodecError, Result};

/// Default initial allocation for a growable encode
pub const DEFAULT_INITIAL_SIZE: usize = 4096;

/// Default growth ceiling (400 MiB)
pub const DEFAULT_MAX_BYTE_LENGTH: usize = 400 * 1024 * 1024;

/// Default geometric growth factor
pub const DEFAULT_GROWTH_FACTOR: f64 = 2.0;

/// Options governing the growth retry loop
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthOptions {
    /// First allocation, in bytes
    pub initial_size: usize,
    /// Hard ceiling; reaching it without success fails the encode
    pub max_byte_length: usize,
    /// Geometric factor applied per retry; must be greater than 1
    pub growth_factor: f64,
}

impl Default for GrowthOptions {
    fn default() -> Self {
        Self {
            initial_size: DEFAULT_INITIAL_SIZE,
            max_byte_length: DEFAULT_MAX_BYTE_LENGTH,
            growth_factor: DEFAULT_GROWTH_FACTOR,
        }
    }
}

impl GrowthOptions {
    pub fn validate(&self) -> Result<()> {
        if self.initial_size > self.max_byte_length {
            return Err(CodecError::config(format!(
                "initial_size {} exceeds max_byte_length {}",
                self.initial_size, self.max_byte_length
            )));
        }
        if !(self.growth_factor.is_finite() && self.growth_factor > 1.0) {
            return Err(CodecError::config(format!(
                "growth_factor must be finite and greater than 1, got {}",
                self.growth_factor
            )));
        }
        Ok(())
    }

    /// Next buffer size after a too-small failure at `current`.
    ///
    /// The +1 floor keeps growth factors arbitrarily close to 1 from
    /// stalling at small sizes; the ceiling is `max_byte_length`.
    fn grown(&self, current: usize) -> usize {
        let scaled = (current as f64 * self.growth_factor).floor() as usize;
        scaled.max(current + 1).min(self.max_byte_length)
    }
}

/// Run `try_encode` against a fresh zeroed buffer, growing and retrying on
/// the buffer-too-small failure until success or the ceiling is reached.
pub fn grow_and_retry<T, F>(opts: &GrowthOptions, mut try_encode: F) -> Result<T>
where
    F: FnMut(&mut [u8]) -> Result<T>,
{
    opts.validate()?;

    let mut size = opts.initial_size;
    loop {
        let mut buf = vec![0u8; size];
        match try_encode(&mut buf) {
            Ok(out) => return Ok(out),
            Err(err) if err.is_buffer_too_small() => {
                if size >= opts.max_byte_length {
                    return Err(CodecError::BufferGrowthExhausted(opts.max_byte_length));
                }
                size = opts.grown(size);
                trace!("encode destination too small, retrying with {} byte(s)", size);
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ---------- option validation ----------

    #[test]
    fn test_validate_rejects_initial_above_max() {
        let opts = GrowthOptions {
            initial_size: 10,
            max_byte_length: 4,
            growth_factor: 2.0,
        };
        assert!(matches!(opts.validate(), Err(CodecError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_growth_factor_at_or_below_one() {
        for factor in [1.0, 0.5, -2.0, f64::NAN, f64::INFINITY] {
            let opts = GrowthOptions {
                growth_factor: factor,
                ..GrowthOptions::default()
            };
            assert!(
                opts.validate().is_err(),
                "factor {} should be rejected",
                factor
            );
        }
    }

    // ---------- retry loop ----------

    #[test]
    fn test_success_on_first_attempt() {
        let opts = GrowthOptions::default();
        let sizes = std::cell::RefCell::new(Vec::new());
        let out = grow_and_retry(&opts, |buf| {
            sizes.borrow_mut().push(buf.len());
            Ok(buf.len())
        })
        .unwrap();
        assert_eq!(out, DEFAULT_INITIAL_SIZE);
        assert_eq!(sizes.borrow().len(), 1);
    }

    #[test]
    fn test_grows_until_payload_fits() {
        let opts = GrowthOptions {
            initial_size: 1,
            max_byte_length: 1024,
            growth_factor: 2.0,
        };
        let needed = 100usize;
        let out = grow_and_retry(&opts, |buf| {
            if buf.len() < needed {
                Err(CodecError::buffer_too_small(needed, buf.len()))
            } else {
                Ok(buf.len())
            }
        })
        .unwrap();
        // 1 -> 2 -> 4 -> ... -> 128
        assert_eq!(out, 128);
    }

    #[test]
    fn test_fractional_factor_terminates() {
        // floor(1 * 1.01) == 1 would stall forever without the +1 floor
        let opts = GrowthOptions {
            initial_size: 1,
            max_byte_length: 64,
            growth_factor: 1.01,
        };
        let err = grow_and_retry(&opts, |buf| -> Result<()> {
            Err(CodecError::buffer_too_small(usize::MAX, buf.len()))
        })
        .unwrap_err();
        assert!(matches!(err, CodecError::BufferGrowthExhausted(64)));
    }

    #[test]
    fn test_non_retryable_error_propagates() {
        let opts = GrowthOptions::default();
        let err = grow_and_retry(&opts, |_| -> Result<()> {
            Err(CodecError::NoVariantSelected)
        })
        .unwrap_err();
        assert!(matches!(err, CodecError::NoVariantSelected));
    }

    #[test]
    fn test_zero_initial_size_grows() {
        let opts = GrowthOptions {
            initial_size: 0,
            max_byte_length: 16,
            growth_factor: 2.0,
        };
        let out = grow_and_retry(&opts, |buf| {
            if buf.is_empty() {
                Err(CodecError::buffer_too_small(1, 0))
            } else {
                Ok(buf.len())
            }
        })
        .unwrap();
        assert_eq!(out, 1);
    }
}
