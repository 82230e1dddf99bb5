use anyhow::Result;
use log::warn;

use crate::core::{
    array::ImgArray,
    dtype::{Clamped, DType},
    shape::Shape,
};

/// An [`ImgArray`] whose element type is chosen at runtime, e.g. from a dtype name.
///
/// The variant is fixed when the array is built, so [`empty_like`](AnyArray::empty_like)
/// always yields the same kind.
#[derive(Clone, Debug, PartialEq)]
pub enum AnyArray {
    Float32(ImgArray<f32>),
    Float64(ImgArray<f64>),
    Int8(ImgArray<i8>),
    Uint8(ImgArray<u8>),
    Uint8Clamped(ImgArray<Clamped>),
    Int16(ImgArray<i16>),
    Uint16(ImgArray<u16>),
    Int32(ImgArray<i32>),
    Uint32(ImgArray<u32>),
}

macro_rules! dispatch {
    ($value:expr, $array:ident => $body:expr) => {
        match $value {
            AnyArray::Float32($array) => $body,
            AnyArray::Float64($array) => $body,
            AnyArray::Int8($array) => $body,
            AnyArray::Uint8($array) => $body,
            AnyArray::Uint8Clamped($array) => $body,
            AnyArray::Int16($array) => $body,
            AnyArray::Uint16($array) => $body,
            AnyArray::Int32($array) => $body,
            AnyArray::Uint32($array) => $body,
        }
    };
}

macro_rules! construct {
    ($dtype:expr, $build:ident ( $($arg:expr),* )) => {
        match $dtype {
            DType::Float32 => AnyArray::Float32(ImgArray::$build($($arg),*)),
            DType::Float64 => AnyArray::Float64(ImgArray::$build($($arg),*)),
            DType::Int8 => AnyArray::Int8(ImgArray::$build($($arg),*)),
            DType::Uint8 => AnyArray::Uint8(ImgArray::$build($($arg),*)),
            DType::Uint8Clamped => AnyArray::Uint8Clamped(ImgArray::$build($($arg),*)),
            DType::Int16 => AnyArray::Int16(ImgArray::$build($($arg),*)),
            DType::Uint16 => AnyArray::Uint16(ImgArray::$build($($arg),*)),
            DType::Int32 => AnyArray::Int32(ImgArray::$build($($arg),*)),
            DType::Uint32 => AnyArray::Uint32(ImgArray::$build($($arg),*)),
        }
    };
}

impl AnyArray {
    pub fn new(shape: Shape, dtype: DType, lazy: bool) -> AnyArray {
        construct!(dtype, new(shape, lazy))
    }

    /// Imports a raw buffer whose element kind is given by name (`"float32"`, `"cuint8"`, ...).
    pub fn from_bytes(bytes: &[u8], shape: Shape, dtype: &str) -> Result<AnyArray> {
        let dtype = dtype
            .parse::<DType>()
            .inspect_err(|error| warn!("{error}"))?;

        Ok(match dtype {
            DType::Float32 => AnyArray::Float32(ImgArray::from_bytes(bytes, shape)?),
            DType::Float64 => AnyArray::Float64(ImgArray::from_bytes(bytes, shape)?),
            DType::Int8 => AnyArray::Int8(ImgArray::from_bytes(bytes, shape)?),
            DType::Uint8 => AnyArray::Uint8(ImgArray::from_bytes(bytes, shape)?),
            DType::Uint8Clamped => AnyArray::Uint8Clamped(ImgArray::from_bytes(bytes, shape)?),
            DType::Int16 => AnyArray::Int16(ImgArray::from_bytes(bytes, shape)?),
            DType::Uint16 => AnyArray::Uint16(ImgArray::from_bytes(bytes, shape)?),
            DType::Int32 => AnyArray::Int32(ImgArray::from_bytes(bytes, shape)?),
            DType::Uint32 => AnyArray::Uint32(ImgArray::from_bytes(bytes, shape)?),
        })
    }

    pub fn dtype(&self) -> DType {
        dispatch!(self, array => array.dtype())
    }

    pub fn shape(&self) -> Shape {
        dispatch!(self, array => array.shape())
    }

    pub fn as_bytes(&self) -> Result<&[u8]> {
        dispatch!(self, array => array.as_bytes())
    }

    /// Byte stride of one element in [`as_bytes`](Self::as_bytes).
    pub fn element_size(&self) -> usize {
        self.dtype().size_of()
    }

    pub fn empty_like(&self, lazy: bool) -> AnyArray {
        AnyArray::new(self.shape(), self.dtype(), lazy)
    }

    pub fn to_f32(&self) -> Result<ImgArray<f32>> {
        dispatch!(self, array => array.astype::<f32>())
    }
}

macro_rules! from_array {
    ($type:ty, $variant:ident) => {
        impl From<ImgArray<$type>> for AnyArray {
            fn from(array: ImgArray<$type>) -> AnyArray {
                AnyArray::$variant(array)
            }
        }
    };
}

from_array!(f32, Float32);
from_array!(f64, Float64);
from_array!(i8, Int8);
from_array!(u8, Uint8);
from_array!(Clamped, Uint8Clamped);
from_array!(i16, Int16);
from_array!(u16, Uint16);
from_array!(i32, Int32);
from_array!(u32, Uint32);
