use anyhow::{bail, Result};
use log::warn;

use crate::core::{array::ImgArray, dtype::Element, errors::ChannelMismatchError};

/// Global extremes found in a single pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MinMax<T> {
    pub min: T,
    pub max: T,
}

impl<T: Element> ImgArray<T> {
    pub fn sum(&self) -> Result<f64> {
        Ok(self.data()?.iter().map(|elem| elem.as_f64()).sum())
    }

    pub fn mean(&self) -> Result<f64> {
        Ok(self.sum()? / self.numel() as f64)
    }

    pub fn min(&self) -> Result<T> {
        Ok(self.global_min_max()?.min)
    }

    pub fn max(&self) -> Result<T> {
        Ok(self.global_min_max()?.max)
    }

    pub fn global_min_max(&self) -> Result<MinMax<T>> {
        let data = self.data()?;
        let first = data[0];

        Ok(data.iter().fold(
            MinMax {
                min: first,
                max: first,
            },
            |mut range, &elem| {
                if elem < range.min {
                    range.min = elem;
                } else if elem > range.max {
                    range.max = elem;
                }
                range
            },
        ))
    }

    // --- Along channel ---

    pub fn mean_channel(&self) -> Result<ImgArray<f32>> {
        self.reduce_channels(|pixel| {
            pixel.iter().map(|elem| elem.as_f64()).sum::<f64>() / pixel.len() as f64
        })
    }

    pub fn max_channel(&self) -> Result<ImgArray<f32>> {
        self.reduce_channels(|pixel| channel_extreme(pixel, |elem, best| elem > best))
    }

    pub fn min_channel(&self) -> Result<ImgArray<f32>> {
        self.reduce_channels(|pixel| channel_extreme(pixel, |elem, best| elem < best))
    }

    /// Dot product of each channel vector's leading `weights.len()` entries with `weights`, plus `bias`.
    pub fn linear_combination(&self, weights: &[f64], bias: f64) -> Result<ImgArray<f32>> {
        if weights.len() > self.shape.channel {
            warn!(
                "{} weights for a {}-channel array",
                weights.len(),
                self.shape.channel
            );
            bail!(ChannelMismatchError {
                expected: self.shape.channel,
                found: weights.len(),
            });
        }

        self.reduce_channels(|pixel| {
            pixel
                .iter()
                .zip(weights)
                .map(|(elem, weight)| elem.as_f64() * weight)
                .sum::<f64>()
                + bias
        })
    }
}

fn channel_extreme<T: Element>(pixel: &[T], better: impl Fn(f64, f64) -> bool) -> f64 {
    let first = pixel[0].as_f64();

    pixel[1..].iter().fold(first, |best, elem| {
        let elem = elem.as_f64();
        if better(elem, best) {
            elem
        } else {
            best
        }
    })
}
