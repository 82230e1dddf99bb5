pub mod cluster;
pub mod color;
pub mod conv;
pub mod elem_ops;
pub mod geometry;
pub mod morph;
pub mod pool;
pub mod reduce_ops;
pub mod texture;
pub mod window;
