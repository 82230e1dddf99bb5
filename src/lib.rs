/*!
```console
 _                 _   _
(_)_ __ ___   __ _| \ | |_   _ _ __ ___
| | '_ ` _ \ / _` |  \| | | | | '_ ` _ \
| | | | | | | (_| | |\  | |_| | | | | | |
|_|_| |_| |_|\__, |_| \_|\__,_|_| |_| |_|
             |___/
```

Typed height × width × channel arrays for images, with a sliding-window engine that
expands neighbourhoods into the channel axis, and a small DICOM pixel-data reader.
*/

mod core;
pub mod dicom;

pub use core::errors;
pub use core::ops::{
    cluster::{ClusterStep, Metric},
    conv::{Kernel, Neighbourhood},
    elem_ops::{Arith, Operand, Threshold},
    reduce_ops::MinMax,
    window::Pattern,
};
pub use core::{
    AnyArray, Canvas, Clamped, DType, Element, ImgArray, PadOptions, Shape, ShowOptions, Surface,
};
