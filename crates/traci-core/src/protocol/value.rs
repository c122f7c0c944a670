//! Tagged values.
//!
//! Every value on the wire is `[tag:u8][payload]`. Decoding is strict: the
//! caller states the type it expects and a different tag is a
//! `TypeMismatch`, never a silent conversion.

use num_enum::{IntoPrimitive, TryFromPrimitive};

use super::constants::*;
use super::storage::{Reader, Storage};
use crate::error::{Result, TraciError};

/// Compounds nested deeper than this are rejected.
pub const MAX_COMPOUND_DEPTH: usize = 16;

/// Type tag table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum ValueType {
    Position2D = POSITION_2D,
    Position3D = POSITION_3D,
    RoadMap = POSITION_ROADMAP,
    UByte = TYPE_UBYTE,
    Byte = TYPE_BYTE,
    Int = TYPE_INTEGER,
    Double = TYPE_DOUBLE,
    String = TYPE_STRING,
    StringList = TYPE_STRINGLIST,
    Compound = TYPE_COMPOUND,
    Color = TYPE_COLOR,
}

/// RGBA color, one unsigned byte per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const YELLOW: Color = Color { r: 255, g: 255, b: 0, a: 255 };

    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// A decoded (or to-be-encoded) wire value.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    UByte(u8),
    Byte(i8),
    Int(i32),
    Double(f64),
    String(String),
    StringList(Vec<String>),
    Color(Color),
    Compound(Vec<TypedValue>),
    Position2D { x: f64, y: f64 },
    Position3D { x: f64, y: f64, z: f64 },
    RoadMap { edge_id: String, pos: f64, lane: u8 },
}

impl TypedValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            TypedValue::UByte(_) => ValueType::UByte,
            TypedValue::Byte(_) => ValueType::Byte,
            TypedValue::Int(_) => ValueType::Int,
            TypedValue::Double(_) => ValueType::Double,
            TypedValue::String(_) => ValueType::String,
            TypedValue::StringList(_) => ValueType::StringList,
            TypedValue::Color(_) => ValueType::Color,
            TypedValue::Compound(_) => ValueType::Compound,
            TypedValue::Position2D { .. } => ValueType::Position2D,
            TypedValue::Position3D { .. } => ValueType::Position3D,
            TypedValue::RoadMap { .. } => ValueType::RoadMap,
        }
    }

    /// Write tag and payload.
    pub fn encode(&self, out: &mut Storage) -> Result<()> {
        out.write_u8(self.value_type().into());
        match self {
            TypedValue::UByte(v) => out.write_u8(*v),
            TypedValue::Byte(v) => out.write_i8(*v),
            TypedValue::Int(v) => out.write_i32(*v),
            TypedValue::Double(v) => out.write_f64(*v),
            TypedValue::String(s) => out.write_string(s)?,
            TypedValue::StringList(items) => out.write_string_list(items)?,
            TypedValue::Color(c) => {
                out.write_u8(c.r);
                out.write_u8(c.g);
                out.write_u8(c.b);
                out.write_u8(c.a);
            }
            TypedValue::Compound(items) => {
                out.write_len(items.len())?;
                for item in items {
                    item.encode(out)?;
                }
            }
            TypedValue::Position2D { x, y } => {
                out.write_f64(*x);
                out.write_f64(*y);
            }
            TypedValue::Position3D { x, y, z } => {
                out.write_f64(*x);
                out.write_f64(*y);
                out.write_f64(*z);
            }
            TypedValue::RoadMap { edge_id, pos, lane } => {
                out.write_string(edge_id)?;
                out.write_f64(*pos);
                out.write_u8(*lane);
            }
        }
        Ok(())
    }

    /// Decode whatever value comes next.
    pub fn decode(r: &mut Reader) -> Result<TypedValue> {
        Self::decode_depth(r, 0)
    }

    /// Decode the next value, failing with `TypeMismatch` unless its tag is `expected`.
    pub fn decode_as(expected: ValueType, r: &mut Reader) -> Result<TypedValue> {
        let found = r.peek_u8()?;
        if found != u8::from(expected) {
            return Err(TraciError::TypeMismatch {
                expected: expected.into(),
                found,
            });
        }
        Self::decode(r)
    }

    fn decode_depth(r: &mut Reader, depth: usize) -> Result<TypedValue> {
        let tag = r.read_u8()?;
        let ty = ValueType::try_from(tag)
            .map_err(|_| TraciError::Protocol(format!("unknown type tag 0x{tag:02x}")))?;
        Self::decode_payload(ty, r, depth)
    }

    fn decode_payload(ty: ValueType, r: &mut Reader, depth: usize) -> Result<TypedValue> {
        Ok(match ty {
            ValueType::UByte => TypedValue::UByte(r.read_u8()?),
            ValueType::Byte => TypedValue::Byte(r.read_i8()?),
            ValueType::Int => TypedValue::Int(r.read_i32()?),
            ValueType::Double => TypedValue::Double(r.read_f64()?),
            ValueType::String => TypedValue::String(r.read_string()?),
            ValueType::StringList => TypedValue::StringList(r.read_string_list()?),
            ValueType::Color => TypedValue::Color(Color {
                r: r.read_u8()?,
                g: r.read_u8()?,
                b: r.read_u8()?,
                a: r.read_u8()?,
            }),
            ValueType::Compound => {
                if depth >= MAX_COMPOUND_DEPTH {
                    return Err(TraciError::Protocol("compound nesting too deep".into()));
                }
                let count = read_count(r)?;
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    items.push(Self::decode_depth(r, depth + 1)?);
                }
                TypedValue::Compound(items)
            }
            ValueType::Position2D => TypedValue::Position2D {
                x: r.read_f64()?,
                y: r.read_f64()?,
            },
            ValueType::Position3D => TypedValue::Position3D {
                x: r.read_f64()?,
                y: r.read_f64()?,
                z: r.read_f64()?,
            },
            ValueType::RoadMap => TypedValue::RoadMap {
                edge_id: r.read_string()?,
                pos: r.read_f64()?,
                lane: r.read_u8()?,
            },
        })
    }
}

fn read_count(r: &mut Reader) -> Result<usize> {
    let n = r.read_i32()?;
    let count =
        usize::try_from(n).map_err(|_| TraciError::Protocol(format!("negative item count {n}")))?;
    // each item has at least its tag byte
    if count > r.remaining() {
        return Err(TraciError::Truncated {
            needed: count,
            remaining: r.remaining(),
        });
    }
    Ok(count)
}

// --------------------
// Strict typed reads
// --------------------
impl Reader {
    fn expect_tag(&mut self, expected: ValueType) -> Result<()> {
        let found = self.read_u8()?;
        if found != u8::from(expected) {
            return Err(TraciError::TypeMismatch {
                expected: expected.into(),
                found,
            });
        }
        Ok(())
    }

    pub fn read_typed_ubyte(&mut self) -> Result<u8> {
        self.expect_tag(ValueType::UByte)?;
        self.read_u8()
    }

    pub fn read_typed_byte(&mut self) -> Result<i8> {
        self.expect_tag(ValueType::Byte)?;
        self.read_i8()
    }

    pub fn read_typed_int(&mut self) -> Result<i32> {
        self.expect_tag(ValueType::Int)?;
        self.read_i32()
    }

    pub fn read_typed_double(&mut self) -> Result<f64> {
        self.expect_tag(ValueType::Double)?;
        self.read_f64()
    }

    pub fn read_typed_string(&mut self) -> Result<String> {
        self.expect_tag(ValueType::String)?;
        self.read_string()
    }

    pub fn read_typed_string_list(&mut self) -> Result<Vec<String>> {
        self.expect_tag(ValueType::StringList)?;
        self.read_string_list()
    }

    pub fn read_typed_color(&mut self) -> Result<Color> {
        self.expect_tag(ValueType::Color)?;
        Ok(Color {
            r: self.read_u8()?,
            g: self.read_u8()?,
            b: self.read_u8()?,
            a: self.read_u8()?,
        })
    }

    /// Read a compound tag and its declared item count.
    pub fn read_compound_header(&mut self) -> Result<usize> {
        self.expect_tag(ValueType::Compound)?;
        read_count(self)
    }
}
