use crate::core::shape::Shape;
use thiserror::Error;

// --- Shape ---

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShapeError {
    #[error("Every dimension must be positive, got [{height}, {width}, {channel}].")]
    EmptyDimension {
        height: usize,
        width: usize,
        channel: usize,
    },
    #[error("Shape [{height}, {width}, {channel}] has more elements than fit in memory.")]
    Overflow {
        height: usize,
        width: usize,
        channel: usize,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Buffer length ({length}) does not match the expected length ({expected}) for shape {shape}.")]
pub struct SizeMismatchError {
    pub length: usize,
    pub expected: usize,
    pub shape: Shape,
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Shapes {lhs} and {rhs} do not match.")]
pub struct ShapeMismatchError {
    pub lhs: Shape,
    pub rhs: Shape,
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Expected {expected} channel values, got {found}.")]
pub struct ChannelMismatchError {
    pub expected: usize,
    pub found: usize,
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Array buffer is not initialized. Call `materialize()` or write to it first.")]
pub struct UninitializedError;

// --- Index, Range ---

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndexError {
    #[error("Coordinate ({row}, {col}, {channel}) is out of range for shape {shape}.")]
    Coordinate {
        row: usize,
        col: usize,
        channel: usize,
        shape: Shape,
    },

    #[error("Element offset {offset} is out of range for {numel} elements.")]
    Offset { offset: usize, numel: usize },

    #[error("Channel {channel} is out of range for {channels} channels.")]
    Channel { channel: usize, channels: usize },

    #[error("Slice rows {rows:?}, cols {cols:?} is out of range for shape {shape}.")]
    Slice {
        rows: (usize, usize),
        cols: (usize, usize),
        shape: Shape,
    },
}

// --- Arithmetic ---

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DivisionByZeroError {
    #[error("Cannot divide by the scalar 0.")]
    Scalar,

    #[error("Divisor array contains a 0 element at offset {offset}.")]
    Element { offset: usize },
}

// --- Windows ---

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Window size {height}x{width} has no center. Both sizes must be odd.")]
pub struct InvalidWindowSizeError {
    pub height: usize,
    pub width: usize,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PatternError {
    #[error("Pattern has no rows.")]
    Empty,

    #[error("Pattern row {row} has {found} cells, expected {expected}.")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Pattern cell ({row}, {col}) is {value}. Cells must be 0 or 1.")]
    NonBinary { row: usize, col: usize, value: u8 },

    #[error("Pattern selects no cells.")]
    NoneSelected,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum KernelError {
    #[error("Kernel has no rows.")]
    Empty,

    #[error("Kernel row {row} has {found} weights, expected {expected}.")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Gaussian sigma must be positive and finite, got {0}.")]
    Sigma(f64),
}

// --- Stacking, Tiling ---

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Tiling needs at least 2 tiles, got {rows}x{cols}.")]
pub struct TileCountError {
    pub rows: usize,
    pub cols: usize,
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Grid of {rows}x{cols} needs {expected} arrays, got {found}.")]
pub struct GridError {
    pub rows: usize,
    pub cols: usize,
    pub expected: usize,
    pub found: usize,
}

// --- Clustering ---

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Cluster count must be positive.")]
pub struct InvalidClusterCountError;

// --- Dtype, Surface ---

#[derive(Error, Debug, Clone, PartialEq)]
#[error("dtype `{name}` is not supported. Supported dtypes are {supported:?}.")]
pub struct UnsupportedDtypeError {
    pub name: String,
    pub supported: Vec<&'static str>,
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Bit {bit} is out of range for an 8-bit channel.")]
pub struct BitIndexError {
    pub bit: u32,
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Cannot render {0} channels. Expected 1 (grey), 3 (RGB) or 4 (RGBA).")]
pub struct UnsupportedChannelCountError(pub usize);
