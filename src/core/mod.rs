pub mod array;
mod display;
pub mod dtype;
pub mod dynamic;
pub mod errors;
mod iters;
pub mod ops;
pub mod shape;
pub mod surface;

pub use array::{ImgArray, PadOptions};
pub use dtype::{Clamped, DType, Element};
pub use dynamic::AnyArray;
pub use shape::Shape;
pub use surface::{Canvas, ShowOptions, Surface};
