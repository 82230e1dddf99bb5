use crate::core::errors::*;
use std::fmt::{self, Display, Formatter};

/// Height, width and channel count of an array.
///
/// Elements are laid out row-major with channel as the fastest-varying axis:
/// `offset = (row * width + col) * channel + channel_index`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Shape {
    pub(crate) height: usize,
    pub(crate) width: usize,
    pub(crate) channel: usize,
}

impl Shape {
    pub fn new(height: usize, width: usize, channel: usize) -> Result<Shape, ShapeError> {
        if height == 0 || width == 0 || channel == 0 {
            return Err(ShapeError::EmptyDimension {
                height,
                width,
                channel,
            });
        }

        height
            .checked_mul(width)
            .and_then(|pixels| pixels.checked_mul(channel))
            .ok_or(ShapeError::Overflow {
                height,
                width,
                channel,
            })?;

        Ok(Shape {
            height,
            width,
            channel,
        })
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn channel(&self) -> usize {
        self.channel
    }

    pub(crate) fn with_channel(&self, channel: usize) -> Shape {
        Shape { channel, ..*self }
    }

    pub(crate) fn with_hw(&self, height: usize, width: usize) -> Shape {
        Shape {
            height,
            width,
            ..*self
        }
    }

    pub fn numel(&self) -> usize {
        self.height * self.width * self.channel
    }

    pub fn pixels(&self) -> usize {
        self.height * self.width
    }

    /// Elements per row.
    pub fn row_len(&self) -> usize {
        self.width * self.channel
    }

    // --- Index ---

    pub(crate) fn idx(&self, row: usize, col: usize, channel: usize) -> usize {
        (row * self.width + col) * self.channel + channel
    }

    pub fn offset(&self, row: usize, col: usize, channel: usize) -> Result<usize, IndexError> {
        self.valid_coordinate(row, col, channel)?;

        Ok(self.idx(row, col, channel))
    }

    pub fn coordinate(&self, offset: usize) -> Result<(usize, usize, usize), IndexError> {
        let numel = self.numel();
        if offset >= numel {
            return Err(IndexError::Offset { offset, numel });
        }

        let row_len = self.row_len();
        let row = offset / row_len;
        let rest = offset % row_len;

        Ok((row, rest / self.channel, rest % self.channel))
    }

    // --- Pad, Slice ---

    pub(crate) fn pad(&self, left: usize, right: usize, top: usize, bottom: usize) -> Shape {
        self.with_hw(self.height + top + bottom, self.width + left + right)
    }

    pub(crate) fn slice(
        &self,
        rows: (usize, usize),
        cols: (usize, usize),
    ) -> Result<Shape, IndexError> {
        self.valid_ranges(rows, cols)?;

        Ok(self.with_hw(rows.1 - rows.0, cols.1 - cols.0))
    }

    // --- Validation ---

    pub(crate) fn is_valid(&self, row: usize, col: usize, channel: usize) -> bool {
        row < self.height && col < self.width && channel < self.channel
    }

    pub(crate) fn valid_coordinate(
        &self,
        row: usize,
        col: usize,
        channel: usize,
    ) -> Result<(), IndexError> {
        if self.is_valid(row, col, channel) {
            Ok(())
        } else {
            Err(IndexError::Coordinate {
                row,
                col,
                channel,
                shape: *self,
            })
        }
    }

    pub(crate) fn valid_channel(&self, channel: usize) -> Result<(), IndexError> {
        if channel < self.channel {
            Ok(())
        } else {
            Err(IndexError::Channel {
                channel,
                channels: self.channel,
            })
        }
    }

    fn valid_ranges(&self, rows: (usize, usize), cols: (usize, usize)) -> Result<(), IndexError> {
        let valid = rows.0 < rows.1
            && cols.0 < cols.1
            && self.is_valid(rows.0, cols.0, 0)
            && self.is_valid(rows.1 - 1, cols.1 - 1, 0);

        if valid {
            Ok(())
        } else {
            Err(IndexError::Slice {
                rows,
                cols,
                shape: *self,
            })
        }
    }

    pub(crate) fn valid_data_length(&self, length: usize) -> Result<(), SizeMismatchError> {
        let expected = self.numel();

        if length != expected {
            Err(SizeMismatchError {
                length,
                expected,
                shape: *self,
            })
        } else {
            Ok(())
        }
    }

    pub(crate) fn valid_same(&self, rhs: &Shape) -> Result<(), ShapeMismatchError> {
        if self == rhs {
            Ok(())
        } else {
            Err(ShapeMismatchError {
                lhs: *self,
                rhs: *rhs,
            })
        }
    }

    pub(crate) fn valid_same_hw(&self, rhs: &Shape) -> Result<(), ShapeMismatchError> {
        if self.height == rhs.height && self.width == rhs.width {
            Ok(())
        } else {
            Err(ShapeMismatchError {
                lhs: *self,
                rhs: *rhs,
            })
        }
    }
}

impl Display for Shape {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.height, self.width, self.channel)
    }
}
