// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bounds-checked casting from wire representations to native scalars.
//!
//! The wire value is always materialized as its declared [`SignalType`]
//! first (little-endian), then converted to the requested native type, so a
//! wire `i16` requested as `f64` converts through a real `i16` and never
//! reinterprets bytes. When wire and native type agree the conversion is the
//! identity and the decode is a plain fixed-width LE read.
//!
//! Undersized input yields a zero value instead of reading out of bounds;
//! callers that need to distinguish that case check the buffer length up
//! front (the extractor layer does). An unsupported wire type is a hard
//! error by default; [`cast_value_lenient`] offers zero-and-continue for
//! callers probing unknown layouts.

use crate::types::SignalType;

/// Casting failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastError {
    /// The wire type has no scalar representation (e.g. a struct node).
    UnsupportedType(SignalType),
}

impl std::fmt::Display for CastError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CastError::UnsupportedType(ty) => {
                write!(f, "wire type {ty:?} has no scalar cast")
            }
        }
    }
}

impl std::error::Error for CastError {}

/// A wire scalar materialized as its declared type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WireScalar {
    Bool(bool),
    Char(char),
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    F32(f32),
    F64(f64),
}

macro_rules! read_le {
    ($ty:ty, $bytes:expr) => {{
        let mut raw = [0u8; std::mem::size_of::<$ty>()];
        raw.copy_from_slice(&$bytes[..std::mem::size_of::<$ty>()]);
        <$ty>::from_le_bytes(raw)
    }};
}

/// Decode the declared wire type from the front of `bytes`.
///
/// Returns `None` for wire types without a scalar width. A buffer shorter
/// than the wire width decodes to the type's zero value; the read never
/// touches bytes past `bytes.len()`.
#[must_use]
pub fn read_wire(wire: SignalType, bytes: &[u8]) -> Option<WireScalar> {
    let width = wire.size()?;
    if bytes.len() < width {
        return Some(zero_scalar(wire));
    }
    let scalar = match wire {
        SignalType::Bool => WireScalar::Bool(bytes[0] != 0),
        SignalType::Char => WireScalar::Char(bytes[0] as char),
        SignalType::U8 => WireScalar::U8(bytes[0]),
        SignalType::I8 => WireScalar::I8(bytes[0] as i8),
        SignalType::U16 => WireScalar::U16(read_le!(u16, bytes)),
        SignalType::I16 => WireScalar::I16(read_le!(i16, bytes)),
        SignalType::U32 => WireScalar::U32(read_le!(u32, bytes)),
        SignalType::I32 => WireScalar::I32(read_le!(i32, bytes)),
        SignalType::U64 => WireScalar::U64(read_le!(u64, bytes)),
        SignalType::I64 => WireScalar::I64(read_le!(i64, bytes)),
        SignalType::F32 => WireScalar::F32(read_le!(f32, bytes)),
        SignalType::F64 => WireScalar::F64(read_le!(f64, bytes)),
        SignalType::Struct => unreachable!("Struct has no size"),
    };
    Some(scalar)
}

fn zero_scalar(wire: SignalType) -> WireScalar {
    match wire {
        SignalType::Bool => WireScalar::Bool(false),
        SignalType::Char => WireScalar::Char('\0'),
        SignalType::U8 => WireScalar::U8(0),
        SignalType::I8 => WireScalar::I8(0),
        SignalType::U16 => WireScalar::U16(0),
        SignalType::I16 => WireScalar::I16(0),
        SignalType::U32 => WireScalar::U32(0),
        SignalType::I32 => WireScalar::I32(0),
        SignalType::U64 => WireScalar::U64(0),
        SignalType::I64 => WireScalar::I64(0),
        SignalType::F32 => WireScalar::F32(0.0),
        SignalType::F64 => WireScalar::F64(0.0),
        SignalType::Struct => unreachable!("Struct has no size"),
    }
}

/// Native scalar types a wire value can be converted into.
pub trait FromWire: Default + Copy {
    fn from_wire(scalar: WireScalar) -> Self;
}

macro_rules! impl_from_wire_numeric {
    ($($ty:ty),*) => {$(
        impl FromWire for $ty {
            fn from_wire(scalar: WireScalar) -> Self {
                match scalar {
                    WireScalar::Bool(v) => v as u8 as $ty,
                    WireScalar::Char(v) => v as u8 as $ty,
                    WireScalar::U8(v) => v as $ty,
                    WireScalar::I8(v) => v as $ty,
                    WireScalar::U16(v) => v as $ty,
                    WireScalar::I16(v) => v as $ty,
                    WireScalar::U32(v) => v as $ty,
                    WireScalar::I32(v) => v as $ty,
                    WireScalar::U64(v) => v as $ty,
                    WireScalar::I64(v) => v as $ty,
                    WireScalar::F32(v) => v as $ty,
                    WireScalar::F64(v) => v as $ty,
                }
            }
        }
    )*};
}

impl_from_wire_numeric!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

impl FromWire for bool {
    fn from_wire(scalar: WireScalar) -> Self {
        u64::from_wire(scalar) != 0
    }
}

impl FromWire for char {
    fn from_wire(scalar: WireScalar) -> Self {
        match scalar {
            WireScalar::Char(v) => v,
            other => u8::from_wire(other) as char,
        }
    }
}

/// Cast the wire value at the front of `bytes` to the native type `T`.
///
/// # Errors
///
/// `CastError::UnsupportedType` if the wire type has no scalar
/// representation.
pub fn cast_value<T: FromWire>(wire: SignalType, bytes: &[u8]) -> Result<T, CastError> {
    match read_wire(wire, bytes) {
        Some(scalar) => Ok(T::from_wire(scalar)),
        None => Err(CastError::UnsupportedType(wire)),
    }
}

/// Lenient variant of [`cast_value`]: unsupported wire types yield `T`'s
/// zero value instead of an error.
#[must_use]
pub fn cast_value_lenient<T: FromWire>(wire: SignalType, bytes: &[u8]) -> T {
    cast_value(wire, bytes).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_round_trips() {
        assert_eq!(cast_value::<u8>(SignalType::U8, &[0]), Ok(0));
        assert_eq!(cast_value::<u8>(SignalType::U8, &[255]), Ok(u8::MAX));
        assert_eq!(
            cast_value::<i16>(SignalType::I16, &(-1234i16).to_le_bytes()),
            Ok(-1234)
        );
        assert_eq!(
            cast_value::<u32>(SignalType::U32, &u32::MAX.to_le_bytes()),
            Ok(u32::MAX)
        );
        assert_eq!(
            cast_value::<i64>(SignalType::I64, &i64::MIN.to_le_bytes()),
            Ok(i64::MIN)
        );
        assert_eq!(
            cast_value::<f32>(SignalType::F32, &3.14f32.to_le_bytes()),
            Ok(3.14f32)
        );
        assert_eq!(
            cast_value::<f64>(SignalType::F64, &(-2.5f64).to_le_bytes()),
            Ok(-2.5f64)
        );
    }

    #[test]
    fn widening_goes_through_wire_type() {
        // wire i16 requested as f64: converts through a real i16
        let v: f64 = cast_value(SignalType::I16, &(-42i16).to_le_bytes()).unwrap();
        assert_eq!(v, -42.0);
        // wire f32 requested as i32: truncating numeric conversion
        let v: i32 = cast_value(SignalType::F32, &3.9f32.to_le_bytes()).unwrap();
        assert_eq!(v, 3);
    }

    #[test]
    fn narrowing_is_saturating_for_floats() {
        // `as` float->int conversion saturates, no UB
        let v: i8 = cast_value(SignalType::F64, &1e9f64.to_le_bytes()).unwrap();
        assert_eq!(v, i8::MAX);
    }

    #[test]
    fn undersized_buffer_yields_zero() {
        let v: u32 = cast_value(SignalType::U32, &[0xFF, 0xFF]).unwrap();
        assert_eq!(v, 0);
        let v: f64 = cast_value(SignalType::F64, &[]).unwrap();
        assert_eq!(v, 0.0);
    }

    #[test]
    fn unsupported_type_is_loud() {
        assert_eq!(
            cast_value::<u32>(SignalType::Struct, &[1, 2, 3, 4]),
            Err(CastError::UnsupportedType(SignalType::Struct))
        );
        // lenient mode keeps the old silent-zero behavior
        assert_eq!(cast_value_lenient::<u32>(SignalType::Struct, &[1, 2, 3, 4]), 0);
    }

    #[test]
    fn bool_and_char() {
        assert_eq!(cast_value::<bool>(SignalType::U8, &[2]), Ok(true));
        assert_eq!(cast_value::<bool>(SignalType::U8, &[0]), Ok(false));
        assert_eq!(cast_value::<char>(SignalType::Char, b"A"), Ok('A'));
        assert_eq!(cast_value::<u8>(SignalType::Char, b"A"), Ok(65));
    }
}
