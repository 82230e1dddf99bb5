use anyhow::{bail, Result};
use log::{debug, warn};

use crate::core::{
    array::ImgArray,
    dtype::{Clamped, Element},
    errors::{BitIndexError, UnsupportedChannelCountError},
    shape::Shape,
};

/// Something that can display or persist an RGBA frame, such as a window or an image file.
pub trait Surface {
    /// `rgba` is row-major, 4 bytes per pixel.
    fn present(&mut self, height: usize, width: usize, rgba: &[u8]) -> Result<()>;
}

/// Value range mapped onto 0..=255 when an array is turned into an image.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShowOptions {
    pub vmin: f64,
    pub vmax: f64,
}

impl Default for ShowOptions {
    fn default() -> Self {
        ShowOptions {
            vmin: 0.0,
            vmax: 255.0,
        }
    }
}

/// An RGBA image paired with the surface it is shown on.
pub struct Canvas<S> {
    image: ImgArray<Clamped>,
    surface: S,
}

impl<S: Surface> Canvas<S> {
    /// Spans `[vmin, vmax]` onto `[0, 255]` and expands grey or RGB input to opaque RGBA.
    pub fn from_array<T: Element>(
        array: &ImgArray<T>,
        options: &ShowOptions,
        surface: S,
    ) -> Result<Canvas<S>> {
        let channel = array.channel();
        if ![1, 3, 4].contains(&channel) {
            warn!("cannot show an array with {channel} channels");
            bail!(UnsupportedChannelCountError(channel));
        }

        let spanned = array
            .astype::<f64>()?
            .span(options.vmin, options.vmax, 0.0, 255.0)?;

        let mut rgba = Vec::with_capacity(array.shape().pixels() * 4);
        for pixel in spanned.data()?.chunks_exact(channel) {
            let expanded = match *pixel {
                [grey] => [grey, grey, grey, 255.0],
                [r, g, b] => [r, g, b, 255.0],
                [r, g, b, a] => [r, g, b, a],
                _ => bail!(UnsupportedChannelCountError(channel)),
            };
            rgba.extend(expanded.map(Clamped::from_f64));
        }

        let shape = Shape::new(array.height(), array.width(), 4)?;
        Ok(Canvas {
            image: ImgArray::from_vec(rgba, shape)?,
            surface,
        })
    }

    pub fn image(&self) -> &ImgArray<Clamped> {
        &self.image
    }

    pub fn image_mut(&mut self) -> &mut ImgArray<Clamped> {
        &mut self.image
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn into_parts(self) -> (ImgArray<Clamped>, S) {
        (self.image, self.surface)
    }

    /// Pushes the current buffer to the surface.
    pub fn show(&mut self) -> Result<&mut Self> {
        let (height, width) = (self.image.height(), self.image.width());
        debug!("presenting {height}x{width} frame");

        self.surface
            .present(height, width, self.image.as_bytes()?)?;
        Ok(self)
    }

    // --- Pixels ---

    /// RGBA at column `x`, row `y`.
    pub fn get_pixel(&self, x: usize, y: usize) -> Result<[u8; 4]> {
        let start = self.image.offset(y, x, 0)?;
        let data = self.image.data()?;

        Ok([data[start].0, data[start + 1].0, data[start + 2].0, data[start + 3].0])
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, rgba: [u8; 4]) -> Result<&mut Self> {
        let start = self.image.offset(y, x, 0)?;
        let data = self.image.data_mut();

        for (elem, value) in data[start..start + 4].iter_mut().zip(rgba) {
            *elem = Clamped(value);
        }
        Ok(self)
    }

    /// Sets the alpha channel everywhere.
    pub fn opacity(&mut self, value: u8) -> Result<&mut Self> {
        self.image.fill_channel(Clamped(value), 3)?;
        Ok(self)
    }

    /// 256-bin histogram of one channel.
    pub fn histogram(&self, channel: usize) -> Result<[u32; 256]> {
        let plane = self.image.dsplit(&[channel])?;
        let mut bins = [0u32; 256];

        for value in plane[0].data()? {
            bins[value.0 as usize] += 1;
        }
        Ok(bins)
    }

    /// 255 where `bit` of `channel` is set, 0 elsewhere.
    pub fn bit_plane(&self, channel: usize, bit: u32) -> Result<ImgArray<f32>> {
        if bit > 7 {
            warn!("bit plane {bit} requested from an 8-bit image");
            bail!(BitIndexError { bit });
        }

        let plane = self.image.dsplit(&[channel])?;
        plane[0].map(|value| ((value.0 >> bit) & 1) as f32 * 255.0)
    }

    /// Replaces RGB with a diverging warm-to-cool colour for the mean grey level.
    /// Dark pixels turn red, mid grey stays near white, bright pixels turn blue. Alpha is kept.
    pub fn apply_colormap(&mut self) -> Result<&mut Self> {
        let table: Vec<[Clamped; 3]> = (0..=255).map(diverging).collect();

        for pixel in self.image.data_mut().chunks_exact_mut(4) {
            let grey = pixel[..3].iter().map(|value| value.0 as usize).sum::<usize>() / 3;
            pixel[..3].copy_from_slice(&table[grey]);
        }
        Ok(self)
    }
}

const WARM: [f64; 3] = [0.705882352941, 0.0156862745098, 0.149019607843];
const NEUTRAL: [f64; 3] = [0.865, 0.865, 0.865];
const COOL: [f64; 3] = [0.23137254902, 0.298039215686, 0.752941176471];

fn diverging(level: u32) -> [Clamped; 3] {
    let x = level as f64 / 255.0;
    let (from, to, t) = if x < 0.5 {
        (WARM, NEUTRAL, x / 0.5)
    } else {
        (NEUTRAL, COOL, (x - 0.5) / 0.5)
    };

    [0, 1, 2].map(|ch| Clamped::from_f64(((1.0 - t) * from[ch] + t * to[ch]) * 255.0))
}
