use anyhow::{bail, Result};
use log::warn;
use rand::Rng;
use std::{iter::once, mem::size_of, ops::Range};

use crate::core::{
    dtype::{DType, Element},
    errors::*,
    iters::Pixels,
    shape::Shape,
};

/// A height × width × channel array owning a flat buffer of `T`.
///
/// The buffer may be absent (lazy) until it is written to or [`materialize`](Self::materialize)d.
/// Every producing operation allocates a fresh buffer.
#[derive(Clone)]
pub struct ImgArray<T = f32> {
    pub(crate) data: Option<Vec<T>>,
    pub(crate) shape: Shape,
}

/// Constant border added around the height and width axes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PadOptions {
    pub left: usize,
    pub right: usize,
    pub top: usize,
    pub bottom: usize,
    pub fillvalue: f64,
}

impl Default for PadOptions {
    fn default() -> Self {
        PadOptions {
            left: 1,
            right: 2,
            top: 3,
            bottom: 4,
            fillvalue: 0.0,
        }
    }
}

impl PadOptions {
    /// `y` rows above and below, `x` columns left and right.
    pub fn symmetric(y: usize, x: usize, fillvalue: f64) -> PadOptions {
        PadOptions {
            left: x,
            right: x,
            top: y,
            bottom: y,
            fillvalue,
        }
    }
}

impl<T: Element> ImgArray<T> {
    pub(crate) fn init(data: Vec<T>, shape: Shape) -> ImgArray<T> {
        ImgArray {
            data: Some(data),
            shape,
        }
    }

    pub fn new(shape: Shape, lazy: bool) -> ImgArray<T> {
        let data = (!lazy).then(|| vec![T::default(); shape.numel()]);
        ImgArray { data, shape }
    }

    pub fn from_vec(data: Vec<T>, shape: Shape) -> Result<ImgArray<T>> {
        shape.valid_data_length(data.len())?;

        Ok(ImgArray::init(data, shape))
    }

    pub fn from_slice(data: &[T], shape: Shape) -> Result<ImgArray<T>> {
        ImgArray::from_vec(data.to_vec(), shape)
    }

    /// Stores each value with `T`'s store semantics.
    pub fn from_f64s(values: &[f64], shape: Shape) -> Result<ImgArray<T>> {
        shape.valid_data_length(values.len())?;

        let data = values.iter().map(|&value| T::from_f64(value)).collect();
        Ok(ImgArray::init(data, shape))
    }

    /// Copies a raw native-endian buffer laid out as (row, col, channel).
    pub fn from_bytes(bytes: &[u8], shape: Shape) -> Result<ImgArray<T>> {
        let expected = shape.numel() * size_of::<T>();

        if bytes.len() != expected {
            warn!(
                "{} buffer of {} bytes cannot hold shape {shape}",
                T::DTYPE,
                bytes.len()
            );
            bail!(SizeMismatchError {
                length: bytes.len(),
                expected,
                shape,
            });
        }

        Ok(ImgArray::init(bytemuck::pod_collect_to_vec(bytes), shape))
    }

    pub fn full(shape: Shape, value: f64) -> ImgArray<T> {
        ImgArray::init(vec![T::from_f64(value); shape.numel()], shape)
    }

    pub fn zeros(shape: Shape) -> ImgArray<T> {
        ImgArray::new(shape, false)
    }

    pub fn ones(shape: Shape) -> ImgArray<T> {
        ImgArray::full(shape, 1.0)
    }

    /// Uniform values in `[vmin, vmax)`.
    pub fn random<R>(shape: Shape, vmin: f64, vmax: f64, rng: &mut R) -> ImgArray<T>
    where
        R: Rng + ?Sized,
    {
        let data = (0..shape.numel())
            .map(|_| T::from_f64(rng.gen::<f64>() * (vmax - vmin) + vmin))
            .collect();

        ImgArray::init(data, shape)
    }

    pub fn random_default(shape: Shape, vmin: f64, vmax: f64) -> ImgArray<T> {
        ImgArray::random(shape, vmin, vmax, &mut rand::thread_rng())
    }

    /// Single-channel grids holding each pixel's row and column value.
    pub fn meshgrid(rows: Range<i64>, cols: Range<i64>) -> Result<(ImgArray<T>, ImgArray<T>)> {
        let height = usize::try_from(rows.end - rows.start).unwrap_or(0);
        let width = usize::try_from(cols.end - cols.start).unwrap_or(0);
        let shape = Shape::new(height, width, 1)?;

        let (row_data, col_data) = Pixels::new(height, width)
            .map(|(row, col)| {
                (
                    T::from_f64((rows.start + row as i64) as f64),
                    T::from_f64((cols.start + col as i64) as f64),
                )
            })
            .unzip();

        Ok((
            ImgArray::init(row_data, shape),
            ImgArray::init(col_data, shape),
        ))
    }

    // --- Buffer ---

    pub fn is_lazy(&self) -> bool {
        self.data.is_none()
    }

    /// Allocates a zero-filled buffer if there is none yet.
    pub fn materialize(&mut self) -> &mut Self {
        self.data_mut();
        self
    }

    pub fn data(&self) -> Result<&[T]> {
        match &self.data {
            Some(data) => Ok(data),
            None => {
                warn!("read from a lazy {} array of shape {}", T::DTYPE, self.shape);
                bail!(UninitializedError)
            }
        }
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        let numel = self.shape.numel();
        self.data.get_or_insert_with(|| vec![T::default(); numel])
    }

    pub fn into_vec(mut self) -> Vec<T> {
        self.data_mut();
        self.data.unwrap_or_default()
    }

    /// Raw buffer for export; pair with [`element_size`](Self::element_size) as the stride.
    pub fn as_bytes(&self) -> Result<&[u8]> {
        Ok(bytemuck::cast_slice(self.data()?))
    }

    // --- Attributes ---

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn height(&self) -> usize {
        self.shape.height
    }

    pub fn width(&self) -> usize {
        self.shape.width
    }

    pub fn channel(&self) -> usize {
        self.shape.channel
    }

    pub fn numel(&self) -> usize {
        self.shape.numel()
    }

    pub fn dtype(&self) -> DType {
        T::DTYPE
    }

    pub fn element_size(&self) -> usize {
        size_of::<T>()
    }

    pub fn byte_size(&self) -> usize {
        self.numel() * self.element_size()
    }

    pub fn is_same_shape<U: Element>(&self, rhs: &ImgArray<U>) -> bool {
        self.shape == rhs.shape
    }

    pub fn is_same_hw<U: Element>(&self, rhs: &ImgArray<U>) -> bool {
        self.shape.height == rhs.shape.height && self.shape.width == rhs.shape.width
    }

    pub fn is_same_channel<U: Element>(&self, rhs: &ImgArray<U>) -> bool {
        self.shape.channel == rhs.shape.channel
    }

    // --- Elements ---

    pub fn offset(&self, row: usize, col: usize, channel: usize) -> Result<usize> {
        Ok(self.shape.offset(row, col, channel)?)
    }

    pub fn coordinate(&self, offset: usize) -> Result<(usize, usize, usize)> {
        Ok(self.shape.coordinate(offset)?)
    }

    pub fn get(&self, row: usize, col: usize, channel: usize) -> Result<T> {
        let offset = self
            .shape
            .offset(row, col, channel)
            .inspect_err(|error| warn!("{error}"))?;

        Ok(self.data()?[offset])
    }

    pub fn set(&mut self, row: usize, col: usize, channel: usize, value: T) -> Result<&mut Self> {
        let offset = self
            .shape
            .offset(row, col, channel)
            .inspect_err(|error| warn!("{error}"))?;

        self.data_mut()[offset] = value;
        Ok(self)
    }

    pub fn fill(&mut self, value: T) -> &mut Self {
        self.data_mut().fill(value);
        self
    }

    pub fn fill_channel(&mut self, value: T, channel: usize) -> Result<&mut Self> {
        self.fill_channels(value, &[channel])
    }

    pub fn fill_channels(&mut self, value: T, channels: &[usize]) -> Result<&mut Self> {
        let values = vec![value; channels.len()];
        self.fill_per_channel(&values, channels)
    }

    /// Writes `values[i]` to every element on channel `channels[i]`.
    pub fn fill_per_channel(&mut self, values: &[T], channels: &[usize]) -> Result<&mut Self> {
        if values.len() != channels.len() {
            warn!(
                "{} fill values for {} channels",
                values.len(),
                channels.len()
            );
            bail!(ChannelMismatchError {
                expected: channels.len(),
                found: values.len(),
            });
        }
        for &channel in channels {
            self.shape.valid_channel(channel)?;
        }

        let channel_count = self.shape.channel;
        for pixel in self.data_mut().chunks_exact_mut(channel_count) {
            for (&channel, &value) in channels.iter().zip(values) {
                pixel[channel] = value;
            }
        }

        Ok(self)
    }

    // --- Copies ---

    pub fn copy(&self) -> ImgArray<T> {
        self.clone()
    }

    /// Same shape and dtype, zero-filled (or lazy).
    pub fn empty_like(&self, lazy: bool) -> ImgArray<T> {
        ImgArray::new(self.shape, lazy)
    }

    pub fn astype<U: Element>(&self) -> Result<ImgArray<U>> {
        self.map(|elem| U::from_f64(elem.as_f64()))
    }

    // --- Maps and Zips ---

    pub fn map<R: Element>(&self, f: impl Fn(T) -> R) -> Result<ImgArray<R>> {
        let data = self.data()?.iter().map(|&elem| f(elem)).collect();

        Ok(ImgArray::init(data, self.shape))
    }

    /// `map` through `f64`, storing back with `T`'s semantics.
    pub fn vectorize(&self, f: impl Fn(f64) -> f64) -> Result<ImgArray<T>> {
        self.map(|elem| T::from_f64(f(elem.as_f64())))
    }

    pub fn zip<U, R>(&self, rhs: &ImgArray<U>, f: impl Fn(T, U) -> R) -> Result<ImgArray<R>>
    where
        U: Element,
        R: Element,
    {
        self.shape
            .valid_same(&rhs.shape)
            .inspect_err(|error| warn!("{error}"))?;

        let data = self
            .data()?
            .iter()
            .zip(rhs.data()?)
            .map(|(&lhs_elem, &rhs_elem)| f(lhs_elem, rhs_elem))
            .collect();

        Ok(ImgArray::init(data, self.shape))
    }

    pub fn zip_f64<U: Element>(
        &self,
        rhs: &ImgArray<U>,
        f: impl Fn(f64, f64) -> f64,
    ) -> Result<ImgArray<T>> {
        self.zip(rhs, |lhs_elem, rhs_elem| {
            T::from_f64(f(lhs_elem.as_f64(), rhs_elem.as_f64()))
        })
    }

    // --- Pad and Slice ---

    pub fn pad(&self, options: &PadOptions) -> Result<ImgArray<T>> {
        let source = self.data()?;
        let shape = self
            .shape
            .pad(options.left, options.right, options.top, options.bottom);
        let mut data = vec![T::from_f64(options.fillvalue); shape.numel()];

        let row_len = self.shape.row_len();
        for (row, chunk) in source.chunks_exact(row_len).enumerate() {
            let start = shape.idx(row + options.top, options.left, 0);
            data[start..start + row_len].copy_from_slice(chunk);
        }

        Ok(ImgArray::init(data, shape))
    }

    /// Half-open `rows` and `cols` ranges.
    pub fn slice(&self, rows: (usize, usize), cols: (usize, usize)) -> Result<ImgArray<T>> {
        let shape = self
            .shape
            .slice(rows, cols)
            .inspect_err(|error| warn!("{error}"))?;
        let source = self.data()?;

        let row_len = shape.row_len();
        let mut data = Vec::with_capacity(shape.numel());
        for row in rows.0..rows.1 {
            let start = self.shape.idx(row, cols.0, 0);
            data.extend_from_slice(&source[start..start + row_len]);
        }

        Ok(ImgArray::init(data, shape))
    }

    // --- Channel stacking ---

    /// Concatenates `self` and `others` along the channel axis.
    pub fn dstack(&self, others: &[&ImgArray<T>]) -> Result<ImgArray<T>> {
        let arrays: Vec<&ImgArray<T>> = once(self).chain(others.iter().copied()).collect();

        for array in &arrays {
            self.shape
                .valid_same_hw(&array.shape)
                .inspect_err(|error| warn!("{error}"))?;
        }

        let sources = arrays
            .iter()
            .map(|array| Ok((array.data()?, array.shape.channel)))
            .collect::<Result<Vec<(&[T], usize)>>>()?;

        let channel = sources.iter().map(|&(_, channel)| channel).sum();
        let shape = self.shape.with_channel(channel);

        let mut data = Vec::with_capacity(shape.numel());
        for pixel in 0..shape.pixels() {
            for &(source, channel) in &sources {
                data.extend_from_slice(&source[pixel * channel..(pixel + 1) * channel]);
            }
        }

        Ok(ImgArray::init(data, shape))
    }

    /// One single-channel array per selected channel; an empty selector takes every channel.
    pub fn dsplit(&self, channels: &[usize]) -> Result<Vec<ImgArray<T>>> {
        let channels: Vec<usize> = if channels.is_empty() {
            (0..self.shape.channel).collect()
        } else {
            channels.to_vec()
        };
        for &channel in &channels {
            self.shape.valid_channel(channel)?;
        }

        let source = self.data()?;
        let shape = self.shape.with_channel(1);

        Ok(channels
            .iter()
            .map(|&channel| {
                let data = source
                    .chunks_exact(self.shape.channel)
                    .map(|pixel| pixel[channel])
                    .collect();
                ImgArray::init(data, shape)
            })
            .collect())
    }
}

impl<T: Element> PartialEq for ImgArray<T> {
    fn eq(&self, rhs: &ImgArray<T>) -> bool {
        self.shape == rhs.shape && self.data == rhs.data
    }
}
