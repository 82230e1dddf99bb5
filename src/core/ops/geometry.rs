use anyhow::{bail, Result};
use log::warn;
use std::iter::once;

use crate::core::{
    array::ImgArray,
    dtype::Element,
    errors::{GridError, ShapeMismatchError, TileCountError},
    iters::Pixels,
    shape::Shape,
};

impl<T: Element> ImgArray<T> {
    // Builds an array of `shape` by copying each output pixel from `source(row, col)`;
    // `None` leaves the pixel zeroed.
    fn remap(
        &self,
        shape: Shape,
        source: impl Fn(usize, usize) -> Option<(usize, usize)>,
    ) -> Result<ImgArray<T>> {
        let input = self.data()?;
        let channel = self.shape.channel;
        let mut data = vec![T::default(); shape.numel()];

        for (row, col) in Pixels::new(shape.height, shape.width) {
            if let Some((src_row, src_col)) = source(row, col) {
                let from = self.shape.idx(src_row, src_col, 0);
                let to = shape.idx(row, col, 0);
                data[to..to + channel].copy_from_slice(&input[from..from + channel]);
            }
        }

        Ok(ImgArray::init(data, shape))
    }

    // --- Stacking ---

    /// Side by side; every array needs the same height and channel count.
    pub fn hstack(&self, others: &[&ImgArray<T>]) -> Result<ImgArray<T>> {
        let arrays: Vec<&ImgArray<T>> = once(self).chain(others.iter().copied()).collect();
        for array in &arrays {
            if array.shape.height != self.shape.height || array.shape.channel != self.shape.channel {
                warn!("cannot hstack {} with {}", self.shape, array.shape);
                bail!(ShapeMismatchError {
                    lhs: self.shape,
                    rhs: array.shape,
                });
            }
        }

        let width = arrays.iter().map(|array| array.shape.width).sum();
        let shape = self.shape.with_hw(self.shape.height, width);

        let mut data = Vec::with_capacity(shape.numel());
        for row in 0..shape.height {
            for array in &arrays {
                let row_len = array.shape.row_len();
                data.extend_from_slice(&array.data()?[row * row_len..(row + 1) * row_len]);
            }
        }

        Ok(ImgArray::init(data, shape))
    }

    /// Top to bottom; every array needs the same width and channel count.
    pub fn vstack(&self, others: &[&ImgArray<T>]) -> Result<ImgArray<T>> {
        let arrays: Vec<&ImgArray<T>> = once(self).chain(others.iter().copied()).collect();
        for array in &arrays {
            if array.shape.width != self.shape.width || array.shape.channel != self.shape.channel {
                warn!("cannot vstack {} with {}", self.shape, array.shape);
                bail!(ShapeMismatchError {
                    lhs: self.shape,
                    rhs: array.shape,
                });
            }
        }

        let height = arrays.iter().map(|array| array.shape.height).sum();
        let shape = self.shape.with_hw(height, self.shape.width);

        let mut data = Vec::with_capacity(shape.numel());
        for array in &arrays {
            data.extend_from_slice(array.data()?);
        }

        Ok(ImgArray::init(data, shape))
    }

    /// Tiles `self` followed by `others` row by row into a `rows` × `cols` grid.
    pub fn grid(&self, rows: usize, cols: usize, others: &[&ImgArray<T>]) -> Result<ImgArray<T>> {
        let tiles: Vec<&ImgArray<T>> = once(self).chain(others.iter().copied()).collect();

        if tiles.len() != rows * cols {
            warn!("{} arrays for a {rows}x{cols} grid", tiles.len());
            bail!(GridError {
                rows,
                cols,
                expected: rows * cols,
                found: tiles.len(),
            });
        }
        for tile in &tiles {
            self.shape
                .valid_same(&tile.shape)
                .inspect_err(|error| warn!("{error}"))?;
        }

        let row_tiles = tiles
            .chunks_exact(cols)
            .map(|chunk| chunk[0].hstack(&chunk[1..]))
            .collect::<Result<Vec<ImgArray<T>>>>()?;
        let rest: Vec<&ImgArray<T>> = row_tiles[1..].iter().collect();

        row_tiles[0].vstack(&rest)
    }

    pub fn repeat(&self, rows: usize, cols: usize) -> Result<ImgArray<T>> {
        if rows * cols < 2 {
            warn!("repeat needs at least 2 tiles, got {rows}x{cols}");
            bail!(TileCountError { rows, cols });
        }

        let (height, width) = (self.shape.height, self.shape.width);
        let shape = self.shape.with_hw(height * rows, width * cols);

        self.remap(shape, |row, col| Some((row % height, col % width)))
    }

    /// Nearest-neighbour upscale by an integer factor.
    pub fn scale(&self, k: usize) -> Result<ImgArray<T>> {
        let shape = Shape::new(self.shape.height * k, self.shape.width * k, self.shape.channel)?;

        self.remap(shape, |row, col| Some((row / k, col / k)))
    }

    // --- Flip, Roll, Rotate ---

    pub fn fliplr(&self) -> Result<ImgArray<T>> {
        let width = self.shape.width;
        self.remap(self.shape, |row, col| Some((row, width - 1 - col)))
    }

    pub fn flipud(&self) -> Result<ImgArray<T>> {
        let height = self.shape.height;
        self.remap(self.shape, |row, col| Some((height - 1 - row, col)))
    }

    /// Cyclic shift along the height axis; positive `dy` moves content up.
    pub fn roll_rows(&self, dy: i64) -> Result<ImgArray<T>> {
        let height = self.shape.height as i64;
        let shift = dy.rem_euclid(height);

        self.remap(self.shape, |row, col| {
            Some((((row as i64 + shift) % height) as usize, col))
        })
    }

    /// Cyclic shift along the width axis; positive `dx` moves content right.
    pub fn roll_cols(&self, dx: i64) -> Result<ImgArray<T>> {
        let width = self.shape.width as i64;
        let shift = dx.rem_euclid(width);

        self.remap(self.shape, |row, col| {
            Some((row, ((col as i64 - shift).rem_euclid(width)) as usize))
        })
    }

    /// Rotation about the centre with nearest-pixel lookup. Pixels whose source falls outside
    /// the array stay zero.
    pub fn rotate(&self, degrees: f64) -> Result<ImgArray<T>> {
        let radians = (degrees % 360.0).to_radians();
        let (sin, cos) = radians.sin_cos();

        let (height, width) = (self.shape.height as f64, self.shape.width as f64);
        let (cx, cy) = ((width - 1.0) / 2.0, (height - 1.0) / 2.0);
        let dx = cx - cx * cos + cy * sin;
        let dy = cy - cx * sin - cy * cos;

        self.remap(self.shape, |row, col| {
            let (row, col) = (row as f64, col as f64);
            let src_col = (cos * col - sin * row + dx).round();
            let src_row = (sin * col + cos * row + dy).round();

            let inside = (0.0..height).contains(&src_row) && (0.0..width).contains(&src_col);
            inside.then_some((src_row as usize, src_col as usize))
        })
    }

    // --- Layout ---

    /// Planar (channel, row, col) copy of the buffer.
    pub fn hwc_to_chw(&self) -> Result<Vec<T>> {
        let data = self.data()?;
        let channel = self.shape.channel;

        Ok((0..channel)
            .flat_map(|ch| data.iter().skip(ch).step_by(channel).copied())
            .collect())
    }

    /// Inverse of [`hwc_to_chw`](Self::hwc_to_chw).
    pub fn chw_to_hwc(planar: &[T], shape: Shape) -> Result<ImgArray<T>> {
        shape.valid_data_length(planar.len())?;

        let pixels = shape.pixels();
        let data = (0..shape.numel())
            .map(|offset| planar[(offset % shape.channel) * pixels + offset / shape.channel])
            .collect();

        Ok(ImgArray::init(data, shape))
    }
}

#[cfg(test)]
mod geometry_tests {
    use crate::{core::shape::Shape, ImgArray};

    fn counting(height: usize, width: usize, channel: usize) -> ImgArray<i32> {
        let shape = Shape::new(height, width, channel).unwrap();
        let values: Vec<f64> = (0..shape.numel()).map(|value| value as f64).collect();
        ImgArray::from_f64s(&values, shape).unwrap()
    }

    #[test]
    fn stacks() {
        let a = counting(2, 1, 1);
        let b = counting(2, 2, 1);

        let wide = a.hstack(&[&b]).unwrap();
        assert_eq!(wide.data().unwrap(), &[0, 0, 1, 1, 2, 3]);

        let tall = b.vstack(&[&b]).unwrap();
        assert_eq!(tall.shape(), Shape::new(4, 2, 1).unwrap());
        assert!(a.vstack(&[&b]).is_err());
    }

    #[test]
    fn grid_and_repeat() {
        let a = counting(1, 1, 1);
        let b = a.add(1.0).unwrap();

        let grid = a.grid(2, 2, &[&b, &b, &a]).unwrap();
        assert_eq!(grid.data().unwrap(), &[0, 1, 1, 0]);
        assert!(a.grid(2, 2, &[&b]).is_err());

        let repeated = counting(1, 2, 1).repeat(2, 2).unwrap();
        assert_eq!(repeated.data().unwrap(), &[0, 1, 0, 1, 0, 1, 0, 1]);
        assert!(a.repeat(1, 1).is_err());
    }

    #[test]
    fn flips_and_rolls() {
        let array = counting(3, 1, 1);

        assert_eq!(array.flipud().unwrap().data().unwrap(), &[2, 1, 0]);
        assert_eq!(array.roll_rows(1).unwrap().data().unwrap(), &[1, 2, 0]);
        assert_eq!(array.roll_rows(-4).unwrap().data().unwrap(), &[2, 0, 1]);

        let row = counting(1, 3, 1);
        assert_eq!(row.fliplr().unwrap().data().unwrap(), &[2, 1, 0]);
        assert_eq!(row.roll_cols(1).unwrap().data().unwrap(), &[2, 0, 1]);
    }

    #[test]
    fn rotate_quarter_turn() {
        let array = counting(3, 3, 1);

        let rotated = array.rotate(90.0).unwrap();
        assert_eq!(rotated.data().unwrap(), &[2, 5, 8, 1, 4, 7, 0, 3, 6]);
        assert_eq!(array.rotate(360.0).unwrap(), array);
    }

    #[test]
    fn scale_and_planar() {
        let array = counting(1, 2, 2);

        let scaled = array.scale(2).unwrap();
        assert_eq!(scaled.shape(), Shape::new(2, 4, 2).unwrap());
        assert_eq!(scaled.get(1, 3, 1).unwrap(), 3);

        let planar = array.hwc_to_chw().unwrap();
        assert_eq!(planar, vec![0, 2, 1, 3]);
        assert_eq!(ImgArray::chw_to_hwc(&planar, array.shape()).unwrap(), array);
    }
}
