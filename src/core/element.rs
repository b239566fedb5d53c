use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::buffer::{Container, Payload};

/// Precision all computation collaborators work in.
pub type WorkType = f32;

/// Closed set of element types a record payload can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Uint8,
    Int16,
    Uint16,
    Int32,
    Float,
    Double,
}

impl ElementType {
    pub const ALL: [ElementType; 6] = [
        ElementType::Uint8,
        ElementType::Int16,
        ElementType::Uint16,
        ElementType::Int32,
        ElementType::Float,
        ElementType::Double,
    ];

    /// Width of one element in bytes
    pub fn width(&self) -> usize {
        match self {
            Self::Uint8 => 1,
            Self::Int16 | Self::Uint16 => 2,
            Self::Int32 | Self::Float => 4,
            Self::Double => 8,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Uint8 => "uint8",
            Self::Int16 => "int16",
            Self::Uint16 => "uint16",
            Self::Int32 => "int32",
            Self::Float => "float",
            Self::Double => "double",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown element type: {0}")]
pub struct UnknownElementType(pub String);

impl FromStr for ElementType {
    type Err = UnknownElementType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ElementType::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownElementType(s.to_string()))
    }
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for u8 {}
    impl Sealed for i16 {}
    impl Sealed for u16 {}
    impl Sealed for i32 {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
}

/// Primitive types that can back a payload.
///
/// Sealed: the element set is closed, adding one means adding a payload
/// variant and new dispatch entries.
pub trait Element: sealed::Sealed + Copy + Default + Send + Sync + fmt::Debug + 'static {
    const TYPE: ElementType;
    const WIDTH: usize;

    /// Decode one element from exactly `WIDTH` little-endian bytes
    fn read_le(bytes: &[u8]) -> Self;

    /// Widen to the working precision
    fn to_work(self) -> WorkType;

    /// Narrow from the working precision, saturating at the type bounds
    fn clamp_from(value: WorkType) -> Self;

    fn container(payload: &Payload) -> Option<&Container<Self>>;

    fn into_payload(container: Container<Self>) -> Payload;
}

macro_rules! integer_element {
    ($ty:ty, $tag:ident, $variant:ident) => {
        impl Element for $ty {
            const TYPE: ElementType = ElementType::$tag;
            const WIDTH: usize = std::mem::size_of::<$ty>();

            fn read_le(bytes: &[u8]) -> Self {
                let mut raw = [0u8; std::mem::size_of::<$ty>()];
                raw.copy_from_slice(bytes);
                <$ty>::from_le_bytes(raw)
            }

            fn to_work(self) -> WorkType {
                self as WorkType
            }

            fn clamp_from(value: WorkType) -> Self {
                if value.is_nan() {
                    return 0;
                }
                // Truncates toward zero after clamping
                value.clamp(<$ty>::MIN as WorkType, <$ty>::MAX as WorkType) as $ty
            }

            fn container(payload: &Payload) -> Option<&Container<Self>> {
                match payload {
                    Payload::$variant(c) => Some(c),
                    _ => None,
                }
            }

            fn into_payload(container: Container<Self>) -> Payload {
                Payload::$variant(container)
            }
        }
    };
}

macro_rules! float_element {
    ($ty:ty, $tag:ident, $variant:ident) => {
        impl Element for $ty {
            const TYPE: ElementType = ElementType::$tag;
            const WIDTH: usize = std::mem::size_of::<$ty>();

            fn read_le(bytes: &[u8]) -> Self {
                let mut raw = [0u8; std::mem::size_of::<$ty>()];
                raw.copy_from_slice(bytes);
                <$ty>::from_le_bytes(raw)
            }

            fn to_work(self) -> WorkType {
                self as WorkType
            }

            fn clamp_from(value: WorkType) -> Self {
                value as $ty
            }

            fn container(payload: &Payload) -> Option<&Container<Self>> {
                match payload {
                    Payload::$variant(c) => Some(c),
                    _ => None,
                }
            }

            fn into_payload(container: Container<Self>) -> Payload {
                Payload::$variant(container)
            }
        }
    };
}

integer_element!(u8, Uint8, Uint8);
integer_element!(i16, Int16, Int16);
integer_element!(u16, Uint16, Uint16);
integer_element!(i32, Int32, Int32);
float_element!(f32, Float, Float);
float_element!(f64, Double, Double);
