use crate::core::errors::UnsupportedDtypeError;
use bytemuck::{Pod, Zeroable};
use num_traits::ToPrimitive;
use std::{
    fmt::{self, Debug, Display, Formatter},
    str::FromStr,
};

/// Element kinds an [`ImgArray`](crate::ImgArray) buffer can hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DType {
    Float32,
    Float64,
    Int8,
    Uint8,
    /// 8-bit unsigned, saturating to [0, 255] on store.
    Uint8Clamped,
    Int16,
    Uint16,
    Int32,
    Uint32,
}

impl DType {
    pub const ALL: [DType; 9] = [
        DType::Float32,
        DType::Uint8,
        DType::Uint16,
        DType::Int32,
        DType::Uint32,
        DType::Uint8Clamped,
        DType::Int16,
        DType::Int8,
        DType::Float64,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DType::Float32 => "float32",
            DType::Float64 => "float64",
            DType::Int8 => "int8",
            DType::Uint8 => "uint8",
            DType::Uint8Clamped => "cuint8",
            DType::Int16 => "int16",
            DType::Uint16 => "uint16",
            DType::Int32 => "int32",
            DType::Uint32 => "uint32",
        }
    }

    pub fn names() -> Vec<&'static str> {
        DType::ALL.iter().map(DType::name).collect()
    }

    /// Bytes per element.
    pub fn size_of(&self) -> usize {
        match self {
            DType::Int8 | DType::Uint8 | DType::Uint8Clamped => 1,
            DType::Int16 | DType::Uint16 => 2,
            DType::Float32 | DType::Int32 | DType::Uint32 => 4,
            DType::Float64 => 8,
        }
    }
}

impl Display for DType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DType {
    type Err = UnsupportedDtypeError;

    fn from_str(name: &str) -> Result<DType, UnsupportedDtypeError> {
        DType::ALL
            .into_iter()
            .find(|dtype| dtype.name() == name)
            .ok_or_else(|| UnsupportedDtypeError {
                name: name.to_string(),
                supported: DType::names(),
            })
    }
}

/// A value that can live in an array buffer.
///
/// Arithmetic is done in `f64`; `from_f64` stores the result back with typed-buffer
/// semantics: floats cast, integers truncate toward zero and wrap, [`Clamped`] rounds
/// half to even and saturates.
pub trait Element:
    Copy + Default + PartialOrd + Pod + Debug + Display + ToPrimitive + Send + Sync + 'static
{
    const DTYPE: DType;

    fn from_f64(value: f64) -> Self;

    fn as_f64(self) -> f64 {
        self.to_f64().unwrap_or(f64::NAN)
    }
}

/// Saturating 8-bit unsigned element.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Pod, Zeroable)]
#[repr(transparent)]
pub struct Clamped(pub u8);

impl Display for Clamped {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl ToPrimitive for Clamped {
    fn to_i64(&self) -> Option<i64> {
        Some(self.0 as i64)
    }

    fn to_u64(&self) -> Option<u64> {
        Some(self.0 as u64)
    }

    fn to_f64(&self) -> Option<f64> {
        Some(self.0 as f64)
    }
}

impl Element for Clamped {
    const DTYPE: DType = DType::Uint8Clamped;

    fn from_f64(value: f64) -> Clamped {
        if value.is_nan() {
            return Clamped(0);
        }
        Clamped(value.clamp(0.0, 255.0).round_ties_even() as u8)
    }
}

// Truncate toward zero, then wrap into [0, 2^bits). Non-finite values store 0.
fn wrap_bits(value: f64, bits: i32) -> u64 {
    if !value.is_finite() {
        return 0;
    }
    value.trunc().rem_euclid(2f64.powi(bits)) as u64
}

macro_rules! integer_element {
    ($type:ty, $dtype:expr, $bits:expr) => {
        impl Element for $type {
            const DTYPE: DType = $dtype;

            fn from_f64(value: f64) -> $type {
                wrap_bits(value, $bits) as $type
            }
        }
    };
}

integer_element!(i8, DType::Int8, 8);
integer_element!(u8, DType::Uint8, 8);
integer_element!(i16, DType::Int16, 16);
integer_element!(u16, DType::Uint16, 16);
integer_element!(i32, DType::Int32, 32);
integer_element!(u32, DType::Uint32, 32);

impl Element for f32 {
    const DTYPE: DType = DType::Float32;

    fn from_f64(value: f64) -> f32 {
        value as f32
    }
}

impl Element for f64 {
    const DTYPE: DType = DType::Float64;

    fn from_f64(value: f64) -> f64 {
        value
    }
}
