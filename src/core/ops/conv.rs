use anyhow::{bail, Result};
use std::f64::consts::PI;

use crate::core::{array::ImgArray, dtype::Element, errors::KernelError, ops::window::valid_window};

/// Odd × odd correlation weights, stored row-major to match the window scan order.
#[derive(Clone, Debug, PartialEq)]
pub struct Kernel {
    height: usize,
    width: usize,
    weights: Vec<f64>,
}

/// Laplacian connectivity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Neighbourhood {
    #[default]
    Four,
    Eight,
}

impl Kernel {
    pub fn new(rows: &[Vec<f64>]) -> Result<Kernel> {
        let Some(first) = rows.first() else {
            bail!(KernelError::Empty);
        };
        let (height, width) = (rows.len(), first.len());

        if let Some((row, values)) = rows
            .iter()
            .enumerate()
            .find(|(_, values)| values.len() != width)
        {
            bail!(KernelError::Ragged {
                row,
                expected: width,
                found: values.len(),
            });
        }
        valid_window(height, width)?;

        Ok(Kernel {
            height,
            width,
            weights: rows.concat(),
        })
    }

    fn square(weights: [f64; 9]) -> Kernel {
        Kernel {
            height: 3,
            width: 3,
            weights: weights.to_vec(),
        }
    }

    /// Normalised Gaussian centred on the middle cell of each axis.
    pub fn gaussian(sigma: f64, height: usize, width: usize) -> Result<Kernel> {
        valid_window(height, width)?;
        if !(sigma.is_finite() && sigma > 0.0) {
            bail!(KernelError::Sigma(sigma));
        }

        let (center_y, center_x) = ((height / 2) as f64, (width / 2) as f64);
        let variance = sigma * sigma;

        let mut weights: Vec<f64> = (0..height * width)
            .map(|index| {
                let y = (index / width) as f64 - center_y;
                let x = (index % width) as f64 - center_x;
                (-(x * x + y * y) / (2.0 * variance)).exp() / (2.0 * PI * variance)
            })
            .collect();

        let total: f64 = weights.iter().sum();
        weights.iter_mut().for_each(|weight| *weight /= total);

        Ok(Kernel {
            height,
            width,
            weights,
        })
    }

    /// Uniform `1 / (height * width)` weights.
    pub fn box_blur(height: usize, width: usize) -> Result<Kernel> {
        valid_window(height, width)?;

        let weight = 1.0 / (height * width) as f64;
        Ok(Kernel {
            height,
            width,
            weights: vec![weight; height * width],
        })
    }

    pub fn sobel_x() -> Kernel {
        Kernel::square([-1.0, 0.0, 1.0, -2.0, 0.0, 2.0, -1.0, 0.0, 1.0])
    }

    pub fn sobel_y() -> Kernel {
        Kernel::square([-1.0, -2.0, -1.0, 0.0, 0.0, 0.0, 1.0, 2.0, 1.0])
    }

    pub fn prewitt_x() -> Kernel {
        Kernel::square([-1.0, 0.0, 1.0, -1.0, 0.0, 1.0, -1.0, 0.0, 1.0])
    }

    pub fn prewitt_y() -> Kernel {
        Kernel::square([-1.0, -1.0, -1.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0])
    }

    pub fn scharr_x() -> Kernel {
        Kernel::square([-3.0, 0.0, 3.0, -10.0, 0.0, 10.0, -3.0, 0.0, 3.0])
    }

    pub fn scharr_y() -> Kernel {
        Kernel::square([-3.0, -10.0, -3.0, 0.0, 0.0, 0.0, 3.0, 10.0, 3.0])
    }

    pub fn laplacian(neighbourhood: Neighbourhood) -> Kernel {
        match neighbourhood {
            Neighbourhood::Four => {
                Kernel::square([0.0, -1.0, 0.0, -1.0, 4.0, -1.0, 0.0, -1.0, 0.0])
            }
            Neighbourhood::Eight => {
                Kernel::square([-1.0, -1.0, -1.0, -1.0, 8.0, -1.0, -1.0, -1.0, -1.0])
            }
        }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }
}

impl<T: Element> ImgArray<T> {
    /// Same-size 2-D correlation with a constant border of `fillvalue`.
    ///
    /// Meant for single-channel input. With more channels only the leading
    /// `kernel.height * kernel.width` stacked values of each pixel are weighted.
    pub fn conv2d(&self, kernel: &Kernel, bias: f64, fillvalue: f64) -> Result<ImgArray<f32>> {
        self.neighbor(kernel.height, kernel.width, fillvalue)?
            .linear_combination(&kernel.weights, bias)
    }

    pub fn gaussian_blur(
        &self,
        sigma: f64,
        height: usize,
        width: usize,
        fillvalue: f64,
    ) -> Result<ImgArray<f32>> {
        self.conv2d(&Kernel::gaussian(sigma, height, width)?, 0.0, fillvalue)
    }

    pub fn sobel_x(&self) -> Result<ImgArray<f32>> {
        self.conv2d(&Kernel::sobel_x(), 0.0, 0.0)
    }

    pub fn sobel_y(&self) -> Result<ImgArray<f32>> {
        self.conv2d(&Kernel::sobel_y(), 0.0, 0.0)
    }

    pub fn sobel_xy(&self) -> Result<ImgArray<f32>> {
        self.gradient_magnitude(&Kernel::sobel_x(), &Kernel::sobel_y())
    }

    pub fn prewitt_x(&self) -> Result<ImgArray<f32>> {
        self.conv2d(&Kernel::prewitt_x(), 0.0, 0.0)
    }

    pub fn prewitt_y(&self) -> Result<ImgArray<f32>> {
        self.conv2d(&Kernel::prewitt_y(), 0.0, 0.0)
    }

    pub fn prewitt_xy(&self) -> Result<ImgArray<f32>> {
        self.gradient_magnitude(&Kernel::prewitt_x(), &Kernel::prewitt_y())
    }

    pub fn scharr_x(&self) -> Result<ImgArray<f32>> {
        self.conv2d(&Kernel::scharr_x(), 0.0, 0.0)
    }

    pub fn scharr_y(&self) -> Result<ImgArray<f32>> {
        self.conv2d(&Kernel::scharr_y(), 0.0, 0.0)
    }

    pub fn scharr_xy(&self) -> Result<ImgArray<f32>> {
        self.gradient_magnitude(&Kernel::scharr_x(), &Kernel::scharr_y())
    }

    pub fn laplacian(&self, neighbourhood: Neighbourhood) -> Result<ImgArray<f32>> {
        self.conv2d(&Kernel::laplacian(neighbourhood), 0.0, 0.0)
    }

    // |Gx| + |Gy|
    fn gradient_magnitude(&self, x: &Kernel, y: &Kernel) -> Result<ImgArray<f32>> {
        let gx = self.conv2d(x, 0.0, 0.0)?.abs()?;
        let gy = self.conv2d(y, 0.0, 0.0)?.abs()?;

        &gx + &gy
    }
}

#[cfg(test)]
mod conv_tests {
    use super::*;
    use crate::core::{errors::InvalidWindowSizeError, shape::Shape};
    use approx::assert_relative_eq;

    #[test]
    fn gaussian_is_normalised_and_symmetric() {
        let kernel = Kernel::gaussian(1.5, 3, 5).unwrap();
        let weights = kernel.weights();

        assert_relative_eq!(weights.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(weights[0], weights[4]);
        assert_relative_eq!(weights[0], weights[14]);
        assert!(weights[7] > weights[6]);
    }

    #[test]
    fn gaussian_rejects_bad_sigma() {
        assert!(Kernel::gaussian(0.0, 3, 3).is_err());
        assert!(Kernel::gaussian(f64::NAN, 3, 3).is_err());
    }

    #[test]
    fn sobel_on_horizontal_ramp() {
        let shape = Shape::new(3, 3, 1).unwrap();
        let ramp = ImgArray::<f32>::from_f64s(
            &[0.0, 1.0, 2.0, 0.0, 1.0, 2.0, 0.0, 1.0, 2.0],
            shape,
        )
        .unwrap();

        let gx = ramp.sobel_x().unwrap();
        let gy = ramp.sobel_y().unwrap();

        assert_relative_eq!(gx.get(1, 1, 0).unwrap(), 8.0);
        assert_relative_eq!(gy.get(1, 1, 0).unwrap(), 0.0);
        assert_relative_eq!(ramp.sobel_xy().unwrap().get(1, 1, 0).unwrap(), 8.0);
    }

    #[test]
    fn prewitt_and_scharr_follow_the_ramp() {
        let shape = Shape::new(3, 3, 1).unwrap();
        let ramp = ImgArray::<f32>::from_f64s(
            &[0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0],
            shape,
        )
        .unwrap();

        assert_relative_eq!(ramp.prewitt_x().unwrap().get(1, 1, 0).unwrap(), 0.0);
        assert_relative_eq!(ramp.prewitt_y().unwrap().get(1, 1, 0).unwrap(), 6.0);
        assert_relative_eq!(ramp.prewitt_xy().unwrap().get(1, 1, 0).unwrap(), 6.0);

        assert_relative_eq!(ramp.scharr_x().unwrap().get(1, 1, 0).unwrap(), 0.0);
        assert_relative_eq!(ramp.scharr_y().unwrap().get(1, 1, 0).unwrap(), 32.0);
        assert_relative_eq!(ramp.scharr_xy().unwrap().get(1, 1, 0).unwrap(), 32.0);
    }

    #[test]
    fn laplacian_of_flat_interior_is_zero() {
        let flat = ImgArray::<u8>::full(Shape::new(3, 3, 1).unwrap(), 7.0);

        let four = flat.laplacian(Neighbourhood::Four).unwrap();
        let eight = flat.laplacian(Neighbourhood::Eight).unwrap();

        assert_relative_eq!(four.get(1, 1, 0).unwrap(), 0.0);
        assert_relative_eq!(eight.get(1, 1, 0).unwrap(), 0.0);
        // corner sees two zero-filled neighbours
        assert_relative_eq!(four.get(0, 0, 0).unwrap(), 14.0);
    }

    #[test]
    fn ragged_kernel() {
        let error = Kernel::new(&[vec![1.0, 1.0, 1.0], vec![1.0]]).unwrap_err();
        assert!(matches!(
            error.downcast_ref::<KernelError>(),
            Some(KernelError::Ragged { row: 1, .. })
        ));
    }

    #[test]
    fn ragged_rows_are_reported_before_size() {
        let error = Kernel::new(&[vec![1.0, 1.0], vec![1.0]]).unwrap_err();
        assert!(matches!(
            error.downcast_ref::<KernelError>(),
            Some(KernelError::Ragged { row: 1, expected: 2, found: 1 })
        ));

        let even = Kernel::new(&[vec![1.0, 1.0], vec![1.0, 1.0]]).unwrap_err();
        assert!(even.downcast_ref::<InvalidWindowSizeError>().is_some());
    }
}
