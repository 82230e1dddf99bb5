use anyhow::{bail, Result};
use log::warn;
use std::{
    fmt::{self, Debug, Formatter},
    ops::{Add, Div, Mul, Sub},
};

use crate::core::{array::ImgArray, dtype::Element, errors::DivisionByZeroError};

/// Right-hand side of an arithmetic operation.
pub enum Operand<'a, T> {
    Array(&'a ImgArray<T>),
    Scalar(f64),
}

impl<T> Clone for Operand<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Operand<'_, T> {}

impl<T: Element> Debug for Operand<'_, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Array(array) => f.debug_tuple("Array").field(array).finish(),
            Operand::Scalar(value) => f.debug_tuple("Scalar").field(value).finish(),
        }
    }
}

impl<'a, T> From<&'a ImgArray<T>> for Operand<'a, T> {
    fn from(array: &'a ImgArray<T>) -> Self {
        Operand::Array(array)
    }
}

impl<T> From<f64> for Operand<'_, T> {
    fn from(value: f64) -> Self {
        Operand::Scalar(value)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arith {
    Add,
    Sub,
    Mul,
    Div,
}

impl Arith {
    fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            Arith::Add => lhs + rhs,
            Arith::Sub => lhs - rhs,
            Arith::Mul => lhs * rhs,
            Arith::Div => lhs / rhs,
        }
    }
}

/// Comparison is always `x > threshold`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Threshold {
    /// `maxval` above, 0 otherwise.
    #[default]
    Binary,
    /// 0 above, `maxval` otherwise.
    BinaryInv,
    /// `threshold` above, unchanged otherwise.
    Truncate,
    /// Unchanged above, 0 otherwise.
    ToZero,
    /// 0 above, unchanged otherwise.
    ToZeroInv,
}

impl<T: Element> ImgArray<T> {
    pub fn arith<'a>(&self, rhs: impl Into<Operand<'a, T>>, op: Arith) -> Result<ImgArray<T>>
    where
        T: 'a,
    {
        match rhs.into() {
            Operand::Scalar(value) => {
                if op == Arith::Div && value == 0.0 {
                    warn!("division of a {} array by the scalar 0", T::DTYPE);
                    bail!(DivisionByZeroError::Scalar);
                }

                self.vectorize(|elem| op.apply(elem, value))
            }
            Operand::Array(array) => {
                self.shape
                    .valid_same(&array.shape)
                    .inspect_err(|error| warn!("{error}"))?;

                if op == Arith::Div {
                    let zero = array.data()?.iter().position(|elem| elem.as_f64() == 0.0);
                    if let Some(offset) = zero {
                        warn!("divisor array holds 0 at offset {offset}");
                        bail!(DivisionByZeroError::Element { offset });
                    }
                }

                self.zip_f64(array, |lhs, rhs| op.apply(lhs, rhs))
            }
        }
    }

    pub fn add<'a>(&self, rhs: impl Into<Operand<'a, T>>) -> Result<ImgArray<T>>
    where
        T: 'a,
    {
        self.arith(rhs, Arith::Add)
    }

    pub fn sub<'a>(&self, rhs: impl Into<Operand<'a, T>>) -> Result<ImgArray<T>>
    where
        T: 'a,
    {
        self.arith(rhs, Arith::Sub)
    }

    pub fn mul<'a>(&self, rhs: impl Into<Operand<'a, T>>) -> Result<ImgArray<T>>
    where
        T: 'a,
    {
        self.arith(rhs, Arith::Mul)
    }

    pub fn div<'a>(&self, rhs: impl Into<Operand<'a, T>>) -> Result<ImgArray<T>>
    where
        T: 'a,
    {
        self.arith(rhs, Arith::Div)
    }

    // --- Unary maps ---

    pub fn clamp(&self, vmin: f64, vmax: f64) -> Result<ImgArray<T>> {
        self.vectorize(|elem| {
            if elem < vmin {
                vmin
            } else if elem > vmax {
                vmax
            } else {
                elem
            }
        })
    }

    pub fn abs(&self) -> Result<ImgArray<T>> {
        self.vectorize(f64::abs)
    }

    pub fn square(&self) -> Result<ImgArray<T>> {
        self.vectorize(|elem| elem * elem)
    }

    pub fn pow(&self, exponent: f64) -> Result<ImgArray<T>> {
        self.vectorize(|elem| elem.powf(exponent))
    }

    /// Raises everything below `floor` to `floor`.
    pub fn relu(&self, floor: f64) -> Result<ImgArray<T>> {
        self.vectorize(|elem| if elem < floor { floor } else { elem })
    }

    pub fn opposite(&self) -> Result<ImgArray<T>> {
        self.vectorize(|elem| -elem)
    }

    pub fn threshold(&self, threshold: f64, method: Threshold, maxval: f64) -> Result<ImgArray<T>> {
        self.vectorize(|elem| {
            let above = elem > threshold;
            match method {
                Threshold::Binary => if above { maxval } else { 0.0 },
                Threshold::BinaryInv => if above { 0.0 } else { maxval },
                Threshold::Truncate => if above { threshold } else { elem },
                Threshold::ToZero => if above { elem } else { 0.0 },
                Threshold::ToZeroInv => if above { 0.0 } else { elem },
            }
        })
    }

    /// Maps `[lower, upper]` linearly onto `[vmin, vmax]`, saturating outside.
    pub fn span(&self, lower: f64, upper: f64, vmin: f64, vmax: f64) -> Result<ImgArray<T>> {
        self.vectorize(|elem| {
            if elem >= upper {
                vmax
            } else if elem <= lower {
                vmin
            } else {
                (elem - lower) / (upper - lower) * (vmax - vmin) + vmin
            }
        })
    }

    /// Rescales the global range onto `[vmin, vmax]`. A constant array becomes the midpoint.
    pub fn stretch(&self, vmin: f64, vmax: f64) -> Result<ImgArray<T>> {
        let range = self.global_min_max()?;
        let (minv, maxv) = (range.min.as_f64(), range.max.as_f64());

        if minv == maxv {
            return Ok(ImgArray::full(self.shape, (vmin + vmax) / 2.0));
        }

        self.vectorize(|elem| (elem - minv) / (maxv - minv) * (vmax - vmin) + vmin)
    }
}

// --- Operators ---

macro_rules! binary_ops {
    ($trait:ident, $method:ident, $op:expr) => {
        impl<T: Element> $trait for &ImgArray<T> {
            type Output = Result<ImgArray<T>>;
            fn $method(self, rhs: &ImgArray<T>) -> Self::Output {
                self.arith(rhs, $op)
            }
        }

        impl<T: Element> $trait<ImgArray<T>> for &ImgArray<T> {
            type Output = Result<ImgArray<T>>;
            fn $method(self, rhs: ImgArray<T>) -> Self::Output {
                self.arith(&rhs, $op)
            }
        }

        impl<T: Element> $trait<f64> for &ImgArray<T> {
            type Output = Result<ImgArray<T>>;
            fn $method(self, rhs: f64) -> Self::Output {
                self.arith(rhs, $op)
            }
        }
    };
}

binary_ops!(Add, add, Arith::Add);
binary_ops!(Sub, sub, Arith::Sub);
binary_ops!(Mul, mul, Arith::Mul);
binary_ops!(Div, div, Arith::Div);
