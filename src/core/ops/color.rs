use anyhow::{bail, Result};
use log::warn;

use crate::core::{array::ImgArray, dtype::Element, errors::ChannelMismatchError};

// BT.601 full range, chroma offset 128.

fn ycbcr_from_rgb(r: f64, g: f64, b: f64) -> [f64; 3] {
    [
        0.299 * r + 0.587 * g + 0.114 * b,
        -0.168736 * r - 0.331264 * g + 0.5 * b + 128.0,
        0.5 * r - 0.418688 * g - 0.081312 * b + 128.0,
    ]
}

fn rgb_from_ycbcr(y: f64, cb: f64, cr: f64) -> [f64; 3] {
    [
        y + 1.402 * (cr - 128.0),
        y - 0.344136 * (cb - 128.0) - 0.714136 * (cr - 128.0),
        y + 1.772 * (cb - 128.0),
    ]
}

impl<T: Element> ImgArray<T> {
    // Rewrites the first three channels of every pixel; the rest are copied through.
    fn convert_triplets(&self, f: impl Fn(f64, f64, f64) -> [f64; 3]) -> Result<ImgArray<T>> {
        if self.shape.channel < 3 {
            warn!("colour conversion needs 3 channels, got {}", self.shape.channel);
            bail!(ChannelMismatchError {
                expected: 3,
                found: self.shape.channel,
            });
        }

        let channel = self.shape.channel;
        let mut data = self.data()?.to_vec();
        for pixel in data.chunks_exact_mut(channel) {
            let converted = f(pixel[0].as_f64(), pixel[1].as_f64(), pixel[2].as_f64());
            for (elem, value) in pixel.iter_mut().zip(converted) {
                *elem = T::from_f64(value);
            }
        }

        Ok(ImgArray::init(data, self.shape))
    }

    pub fn rgb_to_ycbcr(&self) -> Result<ImgArray<T>> {
        self.convert_triplets(ycbcr_from_rgb)
    }

    pub fn ycbcr_to_rgb(&self) -> Result<ImgArray<T>> {
        self.convert_triplets(rgb_from_ycbcr)
    }
}

#[cfg(test)]
mod color_tests {
    use crate::{
        core::{errors::UninitializedError, shape::Shape},
        ImgArray,
    };
    use approx::assert_relative_eq;

    #[test]
    fn grey_has_neutral_chroma() {
        let shape = Shape::new(1, 1, 4).unwrap();
        let grey = ImgArray::<f32>::from_vec(vec![100.0, 100.0, 100.0, 7.0], shape).unwrap();

        let ycbcr = grey.rgb_to_ycbcr().unwrap();
        assert_relative_eq!(ycbcr.get(0, 0, 0).unwrap(), 100.0, epsilon = 1e-4);
        assert_relative_eq!(ycbcr.get(0, 0, 1).unwrap(), 128.0, epsilon = 1e-4);
        assert_relative_eq!(ycbcr.get(0, 0, 2).unwrap(), 128.0, epsilon = 1e-4);
        assert_eq!(ycbcr.get(0, 0, 3).unwrap(), 7.0);
    }

    #[test]
    fn round_trip_is_close() {
        let shape = Shape::new(1, 1, 3).unwrap();
        let red = ImgArray::<f64>::from_vec(vec![200.0, 30.0, 60.0], shape).unwrap();

        let back = red.rgb_to_ycbcr().unwrap().ycbcr_to_rgb().unwrap();
        for ch in 0..3 {
            assert_relative_eq!(
                back.get(0, 0, ch).unwrap(),
                red.get(0, 0, ch).unwrap(),
                epsilon = 1e-2
            );
        }
    }

    #[test]
    fn needs_three_channels() {
        let grey = ImgArray::<u8>::zeros(Shape::new(2, 2, 1).unwrap());
        assert!(grey.rgb_to_ycbcr().is_err());
    }

    #[test]
    fn lazy_input_is_not_converted() {
        let lazy = ImgArray::<u8>::new(Shape::new(1, 1, 3).unwrap(), true);

        let error = lazy.ycbcr_to_rgb().unwrap_err();
        assert!(error.downcast_ref::<UninitializedError>().is_some());
    }
}
