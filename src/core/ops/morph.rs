use anyhow::Result;

use crate::core::{array::ImgArray, dtype::Element, ops::window::Pattern};

impl<T: Element> ImgArray<T> {
    pub fn dilate(&self, pattern: &Pattern, fillvalue: f64) -> Result<ImgArray<f32>> {
        self.structure(pattern, fillvalue)?.max_channel()
    }

    pub fn erode(&self, pattern: &Pattern, fillvalue: f64) -> Result<ImgArray<f32>> {
        self.structure(pattern, fillvalue)?.min_channel()
    }

    /// Erode, then dilate.
    pub fn open(&self, pattern: &Pattern, fillvalue: f64) -> Result<ImgArray<f32>> {
        self.erode(pattern, fillvalue)?.dilate(pattern, fillvalue)
    }

    /// Dilate, then erode.
    pub fn close(&self, pattern: &Pattern, fillvalue: f64) -> Result<ImgArray<f32>> {
        self.dilate(pattern, fillvalue)?.erode(pattern, fillvalue)
    }

    pub fn top_hat(&self, pattern: &Pattern, fillvalue: f64) -> Result<ImgArray<f32>> {
        &self.astype::<f32>()? - &self.open(pattern, fillvalue)?
    }

    pub fn black_hat(&self, pattern: &Pattern, fillvalue: f64) -> Result<ImgArray<f32>> {
        &self.close(pattern, fillvalue)? - &self.astype::<f32>()?
    }

    /// Local max minus local min over a full neighbourhood.
    pub fn morph_gradient(
        &self,
        height: usize,
        width: usize,
        fillvalue: f64,
    ) -> Result<ImgArray<f32>> {
        let stacked = self.neighbor(height, width, fillvalue)?;

        &stacked.max_channel()? - &stacked.min_channel()?
    }
}
