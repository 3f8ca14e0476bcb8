// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Core data types shared across the crate.
//!
//! Wire-type enumeration, dynamic extraction values, resolved signal
//! information and the description/package format identifiers carried in
//! package meta data.

/// On-the-wire primitive representation of a signal.
///
/// `Struct` marks an internal node of a described layout; it has no scalar
/// width and cannot be cast to a native value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalType {
    Bool,
    Char,
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
    Struct,
}

impl SignalType {
    /// Byte width of the wire representation (None for `Struct`).
    #[must_use]
    pub fn size(&self) -> Option<usize> {
        match self {
            Self::Bool | Self::Char | Self::U8 | Self::I8 => Some(1),
            Self::U16 | Self::I16 => Some(2),
            Self::U32 | Self::I32 | Self::F32 => Some(4),
            Self::U64 | Self::I64 | Self::F64 => Some(8),
            Self::Struct => None,
        }
    }

    /// Parse an SDL type attribute (`"float"`, `"ulong"`, ...).
    ///
    /// SDL carries the pre-C99 Windows-flavored names used by the
    /// measurement toolchain.
    #[must_use]
    pub fn from_sdl_name(name: &str) -> Option<Self> {
        match name {
            "bool" | "boolean" => Some(Self::Bool),
            "char" => Some(Self::Char),
            "uchar" | "uint8" => Some(Self::U8),
            "schar" | "int8" => Some(Self::I8),
            "ushort" | "uint16" => Some(Self::U16),
            "short" | "int16" => Some(Self::I16),
            "ulong" | "uint32" => Some(Self::U32),
            "long" | "int32" => Some(Self::I32),
            "uint64" | "ulonglong" => Some(Self::U64),
            "int64" | "longlong" => Some(Self::I64),
            "float" => Some(Self::F32),
            "double" => Some(Self::F64),
            _ => None,
        }
    }

    /// SDL type attribute for this wire type (inverse of [`from_sdl_name`]).
    ///
    /// [`from_sdl_name`]: SignalType::from_sdl_name
    #[must_use]
    pub fn sdl_name(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Char => "char",
            Self::U8 => "uchar",
            Self::I8 => "schar",
            Self::U16 => "ushort",
            Self::I16 => "short",
            Self::U32 => "ulong",
            Self::I32 => "long",
            Self::U64 => "uint64",
            Self::I64 => "int64",
            Self::F32 => "float",
            Self::F64 => "double",
            Self::Struct => "struct",
        }
    }
}

/// A value extracted from a described binary blob.
///
/// Scalars map 1:1 to [`SignalType`]; `Array` holds fixed-length signal
/// arrays and `Struct` holds named children in description order.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalValue {
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
    Array(Vec<SignalValue>),
    Struct(Vec<(String, SignalValue)>),
}

impl SignalValue {
    /// Try to get as f32.
    #[must_use]
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Self::F32(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as f64.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::F64(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as u64 (any unsigned scalar widens).
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::U8(v) => Some(u64::from(*v)),
            Self::U16(v) => Some(u64::from(*v)),
            Self::U32(v) => Some(u64::from(*v)),
            Self::U64(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as i64 (any signed scalar widens).
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::I8(v) => Some(i64::from(*v)),
            Self::I16(v) => Some(i64::from(*v)),
            Self::I32(v) => Some(i64::from(*v)),
            Self::I64(v) => Some(*v),
            _ => None,
        }
    }

    /// Struct member lookup by name.
    #[must_use]
    pub fn member(&self, name: &str) -> Option<&SignalValue> {
        match self {
            Self::Struct(fields) => fields.iter().find(|(n, _)| n == name).map(|(_, v)| v),
            _ => None,
        }
    }
}

/// Resolved addressing information for one signal URL.
///
/// `offset` is absolute within the owning package buffer once resolution is
/// complete; `signal_size` is the wire width of a single element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalInfo {
    pub signal_type: SignalType,
    pub signal_size: usize,
    pub array_size: usize,
    pub offset: usize,
}

impl SignalInfo {
    /// Total byte span of the signal (all array elements).
    #[must_use]
    #[inline]
    pub fn byte_span(&self) -> usize {
        self.signal_size * self.array_size
    }
}

/// Source format of a registered data description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptionFormat {
    Sdl,
    Dbc,
    Fibex,
    Cdl,
}

impl DescriptionFormat {
    /// Canonical file extension for the format.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Sdl => "sdl",
            Self::Dbc => "dbc",
            Self::Fibex => "xml",
            Self::Cdl => "cdl",
        }
    }

    /// Parse the format tag carried in package meta data.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "sdl" => Some(Self::Sdl),
            "dbc" => Some(Self::Dbc),
            "fibex" => Some(Self::Fibex),
            "cdl" => Some(Self::Cdl),
            _ => None,
        }
    }

    /// Format tag used on the wire and in topic bookkeeping.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Sdl => "sdl",
            Self::Dbc => "dbc",
            Self::Fibex => "fibex",
            Self::Cdl => "cdl",
        }
    }
}

impl std::fmt::Display for DescriptionFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}
