use anyhow::{bail, Result};
use log::warn;

use crate::core::{
    array::{ImgArray, PadOptions},
    dtype::Element,
    errors::{InvalidWindowSizeError, PatternError},
    iters::{Offsets, Pixels},
};

/// Odd × odd binary mask selecting which neighbour offsets take part in a window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pattern {
    height: usize,
    width: usize,
    cells: Vec<bool>,
}

impl Pattern {
    pub fn new(rows: &[Vec<u8>]) -> Result<Pattern> {
        let Some(first) = rows.first() else {
            bail!(PatternError::Empty);
        };
        let (height, width) = (rows.len(), first.len());

        if let Some((row, values)) = rows
            .iter()
            .enumerate()
            .find(|(_, values)| values.len() != width)
        {
            bail!(PatternError::Ragged {
                row,
                expected: width,
                found: values.len(),
            });
        }
        valid_window(height, width)?;

        let mut cells = Vec::with_capacity(height * width);
        for (row, values) in rows.iter().enumerate() {
            for (col, &value) in values.iter().enumerate() {
                if value > 1 {
                    bail!(PatternError::NonBinary { row, col, value });
                }
                cells.push(value == 1);
            }
        }

        if !cells.contains(&true) {
            bail!(PatternError::NoneSelected);
        }

        Ok(Pattern {
            height,
            width,
            cells,
        })
    }

    /// Full rectangular neighbourhood.
    pub fn ones(height: usize, width: usize) -> Result<Pattern> {
        valid_window(height, width)?;

        Ok(Pattern {
            height,
            width,
            cells: vec![true; height * width],
        })
    }

    /// `[[1, 1, 1], [0, 1, 0], [1, 1, 1]]`
    pub fn cross() -> Pattern {
        Pattern {
            height: 3,
            width: 3,
            cells: [1, 1, 1, 0, 1, 0, 1, 1, 1].map(|cell| cell == 1).to_vec(),
        }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of selected cells, i.e. window slots.
    pub fn count(&self) -> usize {
        self.cells.iter().filter(|&&cell| cell).count()
    }

    /// `(dy, dx)` of every selected cell in row-major scan order.
    pub fn offsets(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        Offsets::new(&self.cells, self.width)
    }
}

impl Default for Pattern {
    fn default() -> Self {
        Pattern::cross()
    }
}

pub(crate) fn valid_window(height: usize, width: usize) -> Result<(), InvalidWindowSizeError> {
    if height % 2 == 1 && width % 2 == 1 {
        Ok(())
    } else {
        warn!("window of {height}x{width} has no center");
        Err(InvalidWindowSizeError { height, width })
    }
}

impl<T: Element> ImgArray<T> {
    /// Expands every pixel's pattern-selected neighbourhood into its channel axis.
    ///
    /// The border is padded with `fillvalue`. Output channel `slot * channel + c` holds
    /// original channel `c` of the neighbour at the `slot`-th selected offset, so the result has
    /// `channel * pattern.count()` channels. For multi-channel input the slots interleave
    /// unrelated original channels; reductions over the whole vector are then not per channel.
    pub fn structure(&self, pattern: &Pattern, fillvalue: f64) -> Result<ImgArray<T>> {
        let options = PadOptions::symmetric(pattern.height / 2, pattern.width / 2, fillvalue);
        let padded = self.pad(&options)?;
        let source = padded.data()?;

        let slots: Vec<(usize, usize)> = pattern.offsets().collect();
        let channel = self.shape.channel;
        let shape = self.shape.with_channel(channel * slots.len());

        let mut data = Vec::with_capacity(shape.numel());
        for (row, col) in Pixels::new(self.shape.height, self.shape.width) {
            for &(dy, dx) in &slots {
                let start = padded.shape.idx(row + dy, col + dx, 0);
                data.extend_from_slice(&source[start..start + channel]);
            }
        }

        Ok(ImgArray::init(data, shape))
    }

    /// `structure` over a full `height` × `width` neighbourhood.
    pub fn neighbor(&self, height: usize, width: usize, fillvalue: f64) -> Result<ImgArray<T>> {
        self.structure(&Pattern::ones(height, width)?, fillvalue)
    }

    /// Reduces each pixel's channel vector to one value.
    pub fn apply_along_channel<R: Element>(&self, f: impl Fn(&[T]) -> R) -> Result<ImgArray<R>> {
        let data = self
            .data()?
            .chunks_exact(self.shape.channel)
            .map(f)
            .collect();

        Ok(ImgArray::init(data, self.shape.with_channel(1)))
    }

    pub(crate) fn reduce_channels(&self, f: impl Fn(&[T]) -> f64) -> Result<ImgArray<f32>> {
        self.apply_along_channel(|pixel| f(pixel) as f32)
    }
}
