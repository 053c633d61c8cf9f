//! Value-type tags, to be able to know at runtime which primitive a
//! generic matrix stores.
//!
//! Consumers dispatch on the tag but must not assume anything about the
//! in-memory layout; a matrix may surface `Float64` while storing a
//! narrower integer internally.

use std::fmt;

use num_traits::{Num, NumCast, ToPrimitive};

/// Runtime tag for the nominal value type of a matrix.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ContentType {
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::UInt8 => write!(f, "uint8"),
            Self::UInt16 => write!(f, "uint16"),
            Self::UInt32 => write!(f, "uint32"),
            Self::UInt64 => write!(f, "uint64"),
            Self::Int8 => write!(f, "int8"),
            Self::Int16 => write!(f, "int16"),
            Self::Int32 => write!(f, "int32"),
            Self::Int64 => write!(f, "int64"),
            Self::Float32 => write!(f, "float32"),
            Self::Float64 => write!(f, "float64"),
        }
    }
}

/// Maps a primitive scalar type to its runtime [`ContentType`] tag.
pub trait TypedValue {
    fn content_type() -> ContentType;
}

macro_rules! typed_value_impl {
    ($prim: ty, $kind: expr) => {
        impl TypedValue for $prim {
            fn content_type() -> ContentType {
                $kind
            }
        }
    };
}

typed_value_impl!(u8, ContentType::UInt8);
typed_value_impl!(u16, ContentType::UInt16);
typed_value_impl!(u32, ContentType::UInt32);
typed_value_impl!(u64, ContentType::UInt64);
typed_value_impl!(usize, ContentType::UInt64);
typed_value_impl!(i8, ContentType::Int8);
typed_value_impl!(i16, ContentType::Int16);
typed_value_impl!(i32, ContentType::Int32);
typed_value_impl!(i64, ContentType::Int64);
typed_value_impl!(isize, ContentType::Int64);
typed_value_impl!(f32, ContentType::Float32);
typed_value_impl!(f64, ContentType::Float64);

/// The bounds required of a matrix scalar.
///
/// Blanket-implemented for every primitive numeric type.
pub trait Value:
    Copy + Default + Num + NumCast + ToPrimitive + PartialOrd + TypedValue + fmt::Debug + 'static
{
}

impl<T> Value for T where
    T: Copy
        + Default
        + Num
        + NumCast
        + ToPrimitive
        + PartialOrd
        + TypedValue
        + fmt::Debug
        + 'static
{
}
