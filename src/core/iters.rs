// -- Pixels ( row-major (row, col) pairs )

pub(crate) struct Pixels {
    width: usize,
    current: usize,
    maximum: usize,
}

impl Pixels {
    pub(crate) fn new(height: usize, width: usize) -> Self {
        Pixels {
            width,
            current: 0,
            maximum: height * width,
        }
    }
}

impl Iterator for Pixels {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        if self.current == self.maximum {
            return None;
        };

        let next = (self.current / self.width, self.current % self.width);
        self.current += 1;
        Some(next)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.maximum - self.current;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Pixels {}

// -- Offsets ( (dy, dx) of selected window cells, row-major )

pub(crate) struct Offsets<'a> {
    cells: &'a [bool],
    width: usize,
    current: usize,
}

impl<'a> Offsets<'a> {
    pub(crate) fn new(cells: &'a [bool], width: usize) -> Self {
        Offsets {
            cells,
            width,
            current: 0,
        }
    }
}

impl<'a> Iterator for Offsets<'a> {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        while self.current < self.cells.len() {
            let index = self.current;
            self.current += 1;

            if self.cells[index] {
                return Some((index / self.width, index % self.width));
            }
        }

        None
    }
}
