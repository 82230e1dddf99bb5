use anyhow::Result;

use crate::core::{array::ImgArray, dtype::Element};

// Same-size local filters: the window slides over every pixel, nothing is subsampled.

impl<T: Element> ImgArray<T> {
    pub fn max_pool(&self, height: usize, width: usize, fillvalue: f64) -> Result<ImgArray<f32>> {
        self.neighbor(height, width, fillvalue)?.max_channel()
    }

    pub fn min_pool(&self, height: usize, width: usize, fillvalue: f64) -> Result<ImgArray<f32>> {
        self.neighbor(height, width, fillvalue)?.min_channel()
    }

    /// Mean filter.
    pub fn avg_pool(&self, height: usize, width: usize, fillvalue: f64) -> Result<ImgArray<f32>> {
        self.neighbor(height, width, fillvalue)?.mean_channel()
    }

    /// Middle of the sorted window; an even-length vector averages its two middle values.
    pub fn median(&self, height: usize, width: usize, fillvalue: f64) -> Result<ImgArray<f32>> {
        self.neighbor(height, width, fillvalue)?
            .reduce_channels(|pixel| {
                let mut values: Vec<f64> = pixel.iter().map(|elem| elem.as_f64()).collect();
                values.sort_by(f64::total_cmp);

                let mid = values.len() / 2;
                if values.len() % 2 == 0 {
                    (values[mid - 1] + values[mid]) / 2.0
                } else {
                    values[mid]
                }
            })
    }

    /// 1 where a pixel exceeds its neighbourhood mean minus `constant`, else 0.
    pub fn adaptive_threshold(
        &self,
        height: usize,
        width: usize,
        fillvalue: f64,
        constant: f64,
    ) -> Result<ImgArray<f32>> {
        let local_mean = self.avg_pool(height, width, fillvalue)?;

        self.zip(&local_mean, |elem, mean| {
            if elem.as_f64() > mean as f64 - constant {
                1.0
            } else {
                0.0
            }
        })
    }
}
