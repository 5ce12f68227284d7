//! Fixed-Width Numeric Coders
//!
//! Integer and float leaves with per-field byte order selection. Signed
//! integers are two's-complement, floats are IEEE-754. Encode validates the
//! value fits the field width; decode fails when the view is short. Every
//! numeric leaf records its value, so any of them can drive a later length
//! or count.

use std::sync::Arc;

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::coder::{Coder, DynCoder};
use crate::context::Context;
use crate::error::{CodecError, Result};
use crate::refs::RefId;
use crate::value::Value;

/// Per-field byte order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    /// Most significant byte first (network byte order)
    Big,
    /// Least significant byte first
    Little,
}

fn check_space(buf: &[u8], needed: usize) -> Result<()> {
    if buf.len() < needed {
        return Err(CodecError::buffer_too_small(needed, buf.len()));
    }
    Ok(())
}

struct UIntCoder {
    id: RefId,
    width: usize,
    endian: Endian,
}

impl Coder for UIntCoder {
    fn ref_id(&self) -> RefId {
        self.id
    }

    fn encode(&self, value: &Value, buf: &mut [u8], ctx: &mut Context) -> Result<usize> {
        let v = value.expect_u64("unsigned integer coder")?;
        if self.width < 8 {
            let max = (1u64 << (self.width * 8)) - 1;
            if v > max {
                return Err(CodecError::conversion(format!(
                    "value {} does not fit in {} byte(s)",
                    v, self.width
                )));
            }
        }
        check_space(buf, self.width)?;
        match self.endian {
            Endian::Big => BigEndian::write_uint(&mut buf[..self.width], v, self.width),
            Endian::Little => LittleEndian::write_uint(&mut buf[..self.width], v, self.width),
        }
        ctx.record(self.id, Value::UInt(v));
        Ok(self.width)
    }

    fn decode(&self, buf: &[u8], ctx: &mut Context) -> Result<(Value, usize)> {
        check_space(buf, self.width)?;
        let v = match self.endian {
            Endian::Big => BigEndian::read_uint(&buf[..self.width], self.width),
            Endian::Little => LittleEndian::read_uint(&buf[..self.width], self.width),
        };
        ctx.record(self.id, Value::UInt(v));
        Ok((Value::UInt(v), self.width))
    }
}

struct IntCoder {
    id: RefId,
    width: usize,
    endian: Endian,
}

impl Coder for IntCoder {
    fn ref_id(&self) -> RefId {
        self.id
    }

    fn encode(&self, value: &Value, buf: &mut [u8], ctx: &mut Context) -> Result<usize> {
        let v = value.expect_i64("signed integer coder")?;
        if self.width < 8 {
            let bits = self.width as u32 * 8;
            let min = -(1i64 << (bits - 1));
            let max = (1i64 << (bits - 1)) - 1;
            if v < min || v > max {
                return Err(CodecError::conversion(format!(
                    "value {} does not fit in {} signed byte(s)",
                    v, self.width
                )));
            }
        }
        check_space(buf, self.width)?;
        match self.endian {
            Endian::Big => BigEndian::write_int(&mut buf[..self.width], v, self.width),
            Endian::Little => LittleEndian::write_int(&mut buf[..self.width], v, self.width),
        }
        ctx.record(self.id, Value::Int(v));
        Ok(self.width)
    }

    fn decode(&self, buf: &[u8], ctx: &mut Context) -> Result<(Value, usize)> {
        check_space(buf, self.width)?;
        let v = match self.endian {
            Endian::Big => BigEndian::read_int(&buf[..self.width], self.width),
            Endian::Little => LittleEndian::read_int(&buf[..self.width], self.width),
        };
        ctx.record(self.id, Value::Int(v));
        Ok((Value::Int(v), self.width))
    }
}

struct FloatCoder {
    id: RefId,
    double: bool,
    endian: Endian,
}

impl FloatCoder {
    fn width(&self) -> usize {
        if self.double {
            8
        } else {
            4
        }
    }
}

impl Coder for FloatCoder {
    fn ref_id(&self) -> RefId {
        self.id
    }

    fn encode(&self, value: &Value, buf: &mut [u8], ctx: &mut Context) -> Result<usize> {
        let v = value.expect_f64("float coder")?;
        let width = self.width();
        check_space(buf, width)?;
        match (self.double, self.endian) {
            (false, Endian::Big) => BigEndian::write_f32(&mut buf[..4], v as f32),
            (false, Endian::Little) => LittleEndian::write_f32(&mut buf[..4], v as f32),
            (true, Endian::Big) => BigEndian::write_f64(&mut buf[..8], v),
            (true, Endian::Little) => LittleEndian::write_f64(&mut buf[..8], v),
        }
        ctx.record(self.id, Value::Float(v));
        Ok(width)
    }

    fn decode(&self, buf: &[u8], ctx: &mut Context) -> Result<(Value, usize)> {
        let width = self.width();
        check_space(buf, width)?;
        let v = match (self.double, self.endian) {
            (false, Endian::Big) => BigEndian::read_f32(&buf[..4]) as f64,
            (false, Endian::Little) => LittleEndian::read_f32(&buf[..4]) as f64,
            (true, Endian::Big) => BigEndian::read_f64(&buf[..8]),
            (true, Endian::Little) => LittleEndian::read_f64(&buf[..8]),
        };
        ctx.record(self.id, Value::Float(v));
        Ok((Value::Float(v), width))
    }
}

fn uint(width: usize, endian: Endian) -> DynCoder {
    Arc::new(UIntCoder {
        id: RefId::next(),
        width,
        endian,
    })
}

fn int(width: usize, endian: Endian) -> DynCoder {
    Arc::new(IntCoder {
        id: RefId::next(),
        width,
        endian,
    })
}

pub fn uint8() -> DynCoder {
    uint(1, Endian::Big)
}

pub fn uint16(endian: Endian) -> DynCoder {
    uint(2, endian)
}

pub fn uint32(endian: Endian) -> DynCoder {
    uint(4, endian)
}

pub fn uint64(endian: Endian) -> DynCoder {
    uint(8, endian)
}

pub fn int8() -> DynCoder {
    int(1, Endian::Big)
}

pub fn int16(endian: Endian) -> DynCoder {
    int(2, endian)
}

pub fn int32(endian: Endian) -> DynCoder {
    int(4, endian)
}

pub fn int64(endian: Endian) -> DynCoder {
    int(8, endian)
}

pub fn float32(endian: Endian) -> DynCoder {
    Arc::new(FloatCoder {
        id: RefId::next(),
        double: false,
        endian,
    })
}

pub fn float64(endian: Endian) -> DynCoder {
    Arc::new(FloatCoder {
        id: RefId::next(),
        double: true,
        endian,
    })
}
