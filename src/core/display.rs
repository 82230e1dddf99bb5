use prettytable::{
    format::consts::FORMAT_BOX_CHARS,
    {Cell, Row, Table},
};
use std::fmt::{Debug, Display, Formatter, Result};

use crate::core::{array::ImgArray, dtype::Element};

impl<T: Element> Debug for ImgArray<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.debug_struct("ImgArray")
            .field("dtype", &T::DTYPE.name())
            .field("shape", &self.shape)
            .field("elems", &self.numel())
            .field("lazy", &self.is_lazy())
            .finish()
    }
}

/// One table cell per pixel, holding its channel vector.
impl<T: Element> Display for ImgArray<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        if let Some(data) = &self.data {
            let channel = self.shape.channel;
            let rows = data
                .chunks_exact(self.shape.row_len())
                .map(|row| Row::new(row.chunks_exact(channel).map(pixel_cell).collect()))
                .collect();

            let mut table = Table::init(rows);
            table.set_format(*FORMAT_BOX_CHARS);
            write!(f, "{}", table)?;
        }

        writeln!(f, "{:?}", self)
    }
}

fn pixel_cell<T: Element>(pixel: &[T]) -> Cell {
    let values = pixel
        .iter()
        .map(|elem| format!("{:.2}", elem.as_f64()))
        .collect::<Vec<String>>()
        .join(", ");

    Cell::new(&values)
}
