//! Typed resource values (`Res_value`).
//!
//! A [`ResValue`] is an 8-byte record: a size, a reserved byte, a type tag and
//! 32 bits of data whose meaning depends on the tag. The raw record is kept as
//! is; [`ResValue::value`] and the `as_*` accessors reinterpret the data for the
//! tag, and the constructors build new records instead of mutating in place.

use std::fmt;
use std::io::Read;

use resbin_common::{LeU16, LeU32, ReadExt};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{Error, ResRef, Result, StringRef};

/// Value type tags.
///
/// The values are the actual binary values of the `dataType` byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(u8)]
pub enum ValueType {
    /// Contains no data.
    Null = 0x00,
    /// Resource reference.
    Reference = 0x01,
    /// Attribute resource identifier.
    Attribute = 0x02,
    /// Index into the string pool.
    String = 0x03,
    /// IEEE-754 single precision float.
    Float = 0x04,
    /// Complex number with a dimension unit.
    Dimension = 0x05,
    /// Complex number with a fraction unit.
    Fraction = 0x06,
    /// Integer rendered in decimal.
    IntDec = 0x10,
    /// Integer rendered in hexadecimal.
    IntHex = 0x11,
    /// Integer rendered as a boolean.
    IntBoolean = 0x12,
    /// Color rendered as `#aarrggbb`.
    IntColorArgb8 = 0x1c,
    /// Color rendered as `#rrggbb`.
    IntColorRgb8 = 0x1d,
    /// Color rendered as `#argb`.
    IntColorArgb4 = 0x1e,
    /// Color rendered as `#rgb`.
    IntColorRgb4 = 0x1f,
}

impl ValueType {
    /// Parse from a u8 value.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Self::Null),
            0x01 => Some(Self::Reference),
            0x02 => Some(Self::Attribute),
            0x03 => Some(Self::String),
            0x04 => Some(Self::Float),
            0x05 => Some(Self::Dimension),
            0x06 => Some(Self::Fraction),
            0x10 => Some(Self::IntDec),
            0x11 => Some(Self::IntHex),
            0x12 => Some(Self::IntBoolean),
            0x1c => Some(Self::IntColorArgb8),
            0x1d => Some(Self::IntColorRgb8),
            0x1e => Some(Self::IntColorArgb4),
            0x1f => Some(Self::IntColorRgb4),
            _ => None,
        }
    }

    /// Check if this is one of the four color types.
    pub fn is_color(&self) -> bool {
        matches!(
            self,
            Self::IntColorArgb8 | Self::IntColorRgb8 | Self::IntColorArgb4 | Self::IntColorRgb4
        )
    }
}

/// Units of a [`ValueType::Dimension`] value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(u8)]
pub enum DimensionUnit {
    /// Pixels.
    Px = 0,
    /// Device independent pixels.
    Dip = 1,
    /// Scaled device independent pixels.
    Sp = 2,
    /// Points.
    Pt = 3,
    /// Inches.
    In = 4,
    /// Millimeters.
    Mm = 5,
}

impl DimensionUnit {
    /// Parse from the low four bits of a complex value.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Px),
            1 => Some(Self::Dip),
            2 => Some(Self::Sp),
            3 => Some(Self::Pt),
            4 => Some(Self::In),
            5 => Some(Self::Mm),
            _ => None,
        }
    }

    /// Unit suffix as written in XML.
    pub const fn suffix(&self) -> &'static str {
        match self {
            Self::Px => "px",
            Self::Dip => "dip",
            Self::Sp => "sp",
            Self::Pt => "pt",
            Self::In => "in",
            Self::Mm => "mm",
        }
    }
}

/// Units of a [`ValueType::Fraction`] value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(u8)]
pub enum FractionUnit {
    /// Fraction of the element itself (`%`).
    Fraction = 0,
    /// Fraction of the parent (`%p`).
    FractionParent = 1,
}

impl FractionUnit {
    /// Parse from the low four bits of a complex value.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Fraction),
            1 => Some(Self::FractionParent),
            _ => None,
        }
    }

    /// Unit suffix as written in XML.
    pub const fn suffix(&self) -> &'static str {
        match self {
            Self::Fraction => "%",
            Self::FractionParent => "%p",
        }
    }
}

/// A 32-bit color with 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Color {
    pub a: u8,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    /// Create a color from its channels.
    pub const fn new(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self { a, r, g, b }
    }

    /// Unpack from the data word, stored as little-endian bytes B, G, R, A.
    pub const fn from_raw(data: u32) -> Self {
        let [b, g, r, a] = data.to_le_bytes();
        Self { a, r, g, b }
    }

    /// Pack into the data word.
    pub const fn to_raw(&self) -> u32 {
        u32::from_le_bytes([self.b, self.g, self.r, self.a])
    }
}

/// Bits holding the unit of a complex value.
pub const COMPLEX_UNIT_MASK: u32 = 0xF;
/// Shift and mask of the radix selector of a complex value.
pub const COMPLEX_RADIX_SHIFT: u32 = 4;
pub const COMPLEX_RADIX_MASK: u32 = 0x3;
/// Shift of the signed 24-bit mantissa of a complex value.
pub const COMPLEX_MANTISSA_SHIFT: u32 = 8;

const COMPLEX_MANTISSA_MAX: i64 = 0x7F_FFFF;

/// Divisor applied to the mantissa for each radix (23p0, 16p7, 8p15, 0p23).
const RADIX_SCALE: [f32; 4] = [1.0, 128.0, 32768.0, 8_388_608.0];

/// Decode the number stored in a complex value, ignoring its unit.
pub fn complex_to_float(data: u32) -> f32 {
    let radix = ((data >> COMPLEX_RADIX_SHIFT) & COMPLEX_RADIX_MASK) as usize;
    let mantissa = (data as i32) >> COMPLEX_MANTISSA_SHIFT;
    mantissa as f32 / RADIX_SCALE[radix]
}

/// Encode `value` as a complex number carrying the low four bits of `unit`.
///
/// The radix is picked from the magnitude (below 1, 256, 65536 and 8388608
/// respectively select radix 3, 2, 1 and 0). If rounding pushes the mantissa
/// past 24 signed bits the next coarser radix is used instead. Magnitudes that
/// do not fit any radix are rejected.
pub fn float_to_complex(value: f32, unit: u32) -> Result<u32> {
    let abs = value.abs();
    let first_radix = if abs < 1.0 {
        3
    } else if abs < 256.0 {
        2
    } else if abs < 65536.0 {
        1
    } else if abs < 8_388_608.0 {
        0
    } else {
        return Err(Error::ComplexOutOfRange(value));
    };

    for radix in (0..=first_radix).rev() {
        let mantissa = (f64::from(abs) * f64::from(RADIX_SCALE[radix]) + 0.5) as i64;
        if mantissa > COMPLEX_MANTISSA_MAX {
            continue;
        }
        let signed = (if value < 0.0 { -mantissa } else { mantissa }) as i32;
        return Ok(((signed << COMPLEX_MANTISSA_SHIFT) as u32)
            | ((radix as u32) << COMPLEX_RADIX_SHIFT)
            | (unit & COMPLEX_UNIT_MASK));
    }

    Err(Error::ComplexOutOfRange(value))
}

/// On-disk layout of a typed value.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
struct RawResValue {
    size: LeU16,
    res0: u8,
    data_type: u8,
    data: LeU32,
}

/// A typed value record as stored in attributes, text nodes and map entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ResValue {
    size: u16,
    res0: u8,
    data_type: u8,
    data: u32,
}

impl ResValue {
    /// Size of the record on the wire.
    pub const SIZE: u16 = 8;

    /// Create a value with the given type tag and data.
    pub const fn new(data_type: ValueType, data: u32) -> Self {
        Self::from_parts(data_type as u8, data)
    }

    /// Create a value from a raw, possibly unknown, type tag.
    pub const fn from_parts(data_type: u8, data: u32) -> Self {
        Self {
            size: Self::SIZE,
            res0: 0,
            data_type,
            data,
        }
    }

    /// Read a value record from the stream.
    pub fn read<R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let raw: RawResValue = reader.read_struct()?;
        Ok(Self {
            size: raw.size.get(),
            res0: raw.res0,
            data_type: raw.data_type,
            data: raw.data.get(),
        })
    }

    /// Serialize the record in wire layout.
    pub fn to_bytes(&self) -> [u8; 8] {
        let raw = RawResValue {
            size: LeU16::new(self.size),
            res0: self.res0,
            data_type: self.data_type,
            data: LeU32::new(self.data),
        };
        let mut out = [0u8; 8];
        out.copy_from_slice(raw.as_bytes());
        out
    }

    /// The `size` field as read; normally 8.
    pub const fn size(&self) -> u16 {
        self.size
    }

    /// The reserved byte as read; normally 0.
    pub const fn res0(&self) -> u8 {
        self.res0
    }

    /// The raw type tag.
    pub const fn data_type_raw(&self) -> u8 {
        self.data_type
    }

    /// The known type tag, or `None` for an unrecognised one.
    pub fn data_type(&self) -> Option<ValueType> {
        ValueType::from_u8(self.data_type)
    }

    /// The raw 32-bit data.
    pub const fn data(&self) -> u32 {
        self.data
    }

    fn mismatch(&self, expected: &'static str) -> Error {
        Error::TypeMismatch {
            expected,
            actual: self.data_type,
        }
    }

    fn require(&self, allowed: &[ValueType], expected: &'static str) -> Result<ValueType> {
        match self.data_type() {
            Some(t) if allowed.contains(&t) => Ok(t),
            _ => Err(self.mismatch(expected)),
        }
    }

    /// Decode into the variant selected by the type tag.
    pub fn value(&self) -> Value {
        let Some(data_type) = self.data_type() else {
            return Value::Other {
                data_type: self.data_type,
                data: self.data,
            };
        };
        let unit = (self.data & COMPLEX_UNIT_MASK) as u8;
        match data_type {
            ValueType::Null => Value::Null,
            ValueType::Reference => Value::Reference(ResRef::from_raw(self.data)),
            ValueType::Attribute => Value::Attribute(ResRef::from_raw(self.data)),
            ValueType::String => Value::String(StringRef::from_raw(self.data)),
            ValueType::Float => Value::Float(f32::from_bits(self.data)),
            ValueType::Dimension => match DimensionUnit::from_u8(unit) {
                Some(unit) => Value::Dimension(complex_to_float(self.data), unit),
                None => Value::Other {
                    data_type: self.data_type,
                    data: self.data,
                },
            },
            ValueType::Fraction => match FractionUnit::from_u8(unit) {
                Some(unit) => Value::Fraction(complex_to_float(self.data), unit),
                None => Value::Other {
                    data_type: self.data_type,
                    data: self.data,
                },
            },
            ValueType::IntDec => Value::IntDec(self.data as i32),
            ValueType::IntHex => Value::IntHex(self.data as i32),
            ValueType::IntBoolean => Value::Boolean(self.data != 0),
            ValueType::IntColorArgb8
            | ValueType::IntColorRgb8
            | ValueType::IntColorArgb4
            | ValueType::IntColorRgb4 => Value::Color(data_type, Color::from_raw(self.data)),
        }
    }

    /// Data as a resource reference (reference or attribute types).
    pub fn as_reference(&self) -> Result<ResRef> {
        self.require(&[ValueType::Reference, ValueType::Attribute], "reference")?;
        Ok(ResRef::from_raw(self.data))
    }

    /// Data as a string pool reference.
    pub fn as_string_ref(&self) -> Result<StringRef> {
        self.require(&[ValueType::String], "string")?;
        Ok(StringRef::from_raw(self.data))
    }

    /// Data as a float, bit for bit.
    pub fn as_float(&self) -> Result<f32> {
        self.require(&[ValueType::Float], "float")?;
        Ok(f32::from_bits(self.data))
    }

    /// Data as a signed integer (decimal or hex types).
    pub fn as_int(&self) -> Result<i32> {
        self.require(&[ValueType::IntDec, ValueType::IntHex], "integer")?;
        Ok(self.data as i32)
    }

    /// Data as a boolean.
    pub fn as_bool(&self) -> Result<bool> {
        self.require(&[ValueType::IntBoolean], "boolean")?;
        Ok(self.data != 0)
    }

    /// Data as a color (any of the four color types).
    pub fn as_color(&self) -> Result<Color> {
        match self.data_type() {
            Some(t) if t.is_color() => Ok(Color::from_raw(self.data)),
            _ => Err(self.mismatch("color")),
        }
    }

    /// Number stored in a dimension or fraction value.
    pub fn complex_value(&self) -> Result<f32> {
        self.require(&[ValueType::Dimension, ValueType::Fraction], "complex")?;
        Ok(complex_to_float(self.data))
    }

    /// Unit of a dimension value.
    pub fn dimension_unit(&self) -> Result<DimensionUnit> {
        self.require(&[ValueType::Dimension], "dimension")?;
        let unit = (self.data & COMPLEX_UNIT_MASK) as u8;
        DimensionUnit::from_u8(unit)
            .ok_or_else(|| Error::InvalidArgument(format!("unknown dimension unit {unit}")))
    }

    /// Unit of a fraction value.
    pub fn fraction_unit(&self) -> Result<FractionUnit> {
        self.require(&[ValueType::Fraction], "fraction")?;
        let unit = (self.data & COMPLEX_UNIT_MASK) as u8;
        FractionUnit::from_u8(unit)
            .ok_or_else(|| Error::InvalidArgument(format!("unknown fraction unit {unit}")))
    }

    pub const fn null() -> Self {
        Self::new(ValueType::Null, 0)
    }

    pub const fn reference(reference: ResRef) -> Self {
        Self::new(ValueType::Reference, reference.raw())
    }

    pub const fn attribute(reference: ResRef) -> Self {
        Self::new(ValueType::Attribute, reference.raw())
    }

    pub const fn string(reference: StringRef) -> Self {
        Self::new(ValueType::String, reference.raw())
    }

    pub fn float(value: f32) -> Self {
        Self::new(ValueType::Float, value.to_bits())
    }

    pub const fn int_dec(value: i32) -> Self {
        Self::new(ValueType::IntDec, value as u32)
    }

    pub const fn int_hex(value: i32) -> Self {
        Self::new(ValueType::IntHex, value as u32)
    }

    /// Booleans are stored as `0xFFFFFFFF` for true and `0` for false.
    pub const fn boolean(value: bool) -> Self {
        Self::new(ValueType::IntBoolean, if value { 0xFFFF_FFFF } else { 0 })
    }

    /// Create a color value; `data_type` must be one of the color types.
    pub fn color(data_type: ValueType, color: Color) -> Result<Self> {
        if !data_type.is_color() {
            return Err(Error::TypeMismatch {
                expected: "color",
                actual: data_type as u8,
            });
        }
        Ok(Self::new(data_type, color.to_raw()))
    }

    /// Create a dimension value.
    pub fn dimension(value: f32, unit: DimensionUnit) -> Result<Self> {
        Ok(Self::new(ValueType::Dimension, float_to_complex(value, unit as u32)?))
    }

    /// Create a fraction value.
    pub fn fraction(value: f32, unit: FractionUnit) -> Result<Self> {
        Ok(Self::new(ValueType::Fraction, float_to_complex(value, unit as u32)?))
    }

    /// Replace the number of a complex value, keeping its unit bits.
    pub fn with_complex_value(self, value: f32) -> Result<Self> {
        self.require(&[ValueType::Dimension, ValueType::Fraction], "complex")?;
        let data = float_to_complex(value, self.data & COMPLEX_UNIT_MASK)?;
        Ok(Self { data, ..self })
    }

    /// Replace the unit of a dimension value, keeping its number.
    pub fn with_dimension_unit(self, unit: DimensionUnit) -> Result<Self> {
        self.require(&[ValueType::Dimension], "dimension")?;
        Ok(Self {
            data: (self.data & !COMPLEX_UNIT_MASK) | unit as u32,
            ..self
        })
    }

    /// Replace the unit of a fraction value, keeping its number.
    pub fn with_fraction_unit(self, unit: FractionUnit) -> Result<Self> {
        self.require(&[ValueType::Fraction], "fraction")?;
        Ok(Self {
            data: (self.data & !COMPLEX_UNIT_MASK) | unit as u32,
            ..self
        })
    }
}

/// A decoded typed value.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Value {
    Null,
    Reference(ResRef),
    Attribute(ResRef),
    String(StringRef),
    Float(f32),
    Dimension(f32, DimensionUnit),
    Fraction(f32, FractionUnit),
    IntDec(i32),
    IntHex(i32),
    Boolean(bool),
    Color(ValueType, Color),
    /// Unrecognised type tag or unit.
    Other { data_type: u8, data: u32 },
}

impl fmt::Display for Value {
    /// Formats the value the way it would be written in a source XML file.
    ///
    /// String values print their pool index; resolve them against the pool
    /// for the actual text.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("@null"),
            Value::Reference(r) => match r.ident() {
                Some(id) => write!(f, "@0x{id:08x}"),
                None => f.write_str("@null"),
            },
            Value::Attribute(r) => match r.ident() {
                Some(id) => write!(f, "?0x{id:08x}"),
                None => f.write_str("?null"),
            },
            Value::String(r) => match r.index() {
                Some(index) => write!(f, "string#{index}"),
                None => Ok(()),
            },
            Value::Float(v) => write!(f, "{v}"),
            Value::Dimension(v, unit) => write!(f, "{v}{}", unit.suffix()),
            Value::Fraction(v, unit) => write!(f, "{}{}", v * 100.0, unit.suffix()),
            Value::IntDec(v) => write!(f, "{v}"),
            Value::IntHex(v) => write!(f, "0x{:08x}", *v as u32),
            Value::Boolean(v) => write!(f, "{v}"),
            Value::Color(t, c) => match t {
                ValueType::IntColorRgb8 => write!(f, "#{:02x}{:02x}{:02x}", c.r, c.g, c.b),
                ValueType::IntColorArgb4 => {
                    write!(f, "#{:x}{:x}{:x}{:x}", c.a >> 4, c.r >> 4, c.g >> 4, c.b >> 4)
                }
                ValueType::IntColorRgb4 => write!(f, "#{:x}{:x}{:x}", c.r >> 4, c.g >> 4, c.b >> 4),
                _ => write!(f, "#{:02x}{:02x}{:02x}{:02x}", c.a, c.r, c.g, c.b),
            },
            Value::Other { data, .. } => write!(f, "0x{data:08x}"),
        }
    }
}
