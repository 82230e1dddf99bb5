use anyhow::Result;

use crate::core::{array::ImgArray, dtype::Element};

const LBP_WEIGHTS: [f64; 9] = [128.0, 64.0, 32.0, 1.0, 0.0, 16.0, 2.0, 4.0, 8.0];

impl<T: Element> ImgArray<T> {
    /// Local binary pattern over the 3 × 3 neighbourhood, zero border. Codes are in 0..=255.
    pub fn lbp(&self) -> Result<ImgArray<f32>> {
        self.neighbor(3, 3, 0.0)?.reduce_channels(|window| {
            let center = window[4];

            window
                .iter()
                .zip(LBP_WEIGHTS)
                .filter(|&(&value, _)| value > center)
                .map(|(_, weight)| weight)
                .sum()
        })
    }

    /// Local minimum index: how many window values fall strictly below the centre.
    pub fn lmi(&self, height: usize, width: usize) -> Result<ImgArray<f32>> {
        self.neighbor(height, width, 0.0)?.reduce_channels(|window| {
            let center = window[window.len() / 2];
            window.iter().filter(|&&value| value < center).count() as f64
        })
    }

    /// One life-like automaton generation. Cells `>= 0.5` are alive; the count includes the
    /// centre, so a live cell survives at 3 or 4 and a dead one is born at exactly 3.
    pub fn cell_step(&self, height: usize, width: usize) -> Result<ImgArray<f32>> {
        self.neighbor(height, width, 0.0)?.reduce_channels(|window| {
            let alive = |value: &T| value.as_f64() >= 0.5;
            let count = window.iter().filter(|value| alive(value)).count();

            let next = if alive(&window[window.len() / 2]) {
                count == 3 || count == 4
            } else {
                count == 3
            };

            if next {
                1.0
            } else {
                0.0
            }
        })
    }
}

#[cfg(test)]
mod texture_tests {
    use crate::{core::shape::Shape, ImgArray};

    #[test]
    fn lbp_codes() {
        let shape = Shape::new(3, 3, 1).unwrap();
        let array =
            ImgArray::<u8>::from_vec(vec![9, 0, 0, 0, 5, 9, 0, 0, 9], shape).unwrap();

        let codes = array.lbp().unwrap();
        assert_eq!(codes.get(1, 1, 0).unwrap(), 128.0 + 16.0 + 8.0);
    }

    #[test]
    fn lmi_counts_lower_neighbours() {
        let shape = Shape::new(1, 3, 1).unwrap();
        let array = ImgArray::<f32>::from_vec(vec![1.0, 2.0, 3.0], shape).unwrap();

        let lmi = array.lmi(1, 3).unwrap();
        // zero border counts as lower
        assert_eq!(lmi.data().unwrap(), &[1.0, 1.0, 2.0]);
    }

    #[test]
    fn blinker_oscillates() {
        let shape = Shape::new(5, 5, 1).unwrap();
        let mut board = ImgArray::<u8>::zeros(shape);
        for col in 1..4 {
            board.set(2, col, 0, 1).unwrap();
        }

        let next = board.cell_step(3, 3).unwrap();
        for row in 0..5 {
            for col in 0..5 {
                let expected = if col == 2 && (1..4).contains(&row) { 1.0 } else { 0.0 };
                assert_eq!(next.get(row, col, 0).unwrap(), expected, "({row}, {col})");
            }
        }

        let back = next.cell_step(3, 3).unwrap();
        assert_eq!(back, board.astype::<f32>().unwrap());
    }
}
