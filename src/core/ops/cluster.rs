use anyhow::{bail, Result};
use log::{debug, warn};
use rand::Rng;

use crate::core::{
    array::ImgArray,
    dtype::{Clamped, Element},
    errors::{ChannelMismatchError, InvalidClusterCountError},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Metric {
    #[default]
    Euclidean,
    /// `1 - cosine similarity`
    Cosine,
}

/// Result of one assignment + update pass.
#[derive(Clone, Debug)]
pub struct ClusterStep {
    /// Mean channel vector of each cluster. A cluster that got no pixels is all NaN.
    pub centers: Vec<Vec<f64>>,
    /// Index of the nearest center per pixel.
    pub labels: ImgArray<Clamped>,
}

const COSINE_EPSILON: f64 = 1e-7;

impl<T: Element> ImgArray<T> {
    fn valid_vector(&self, vector: &[f64]) -> Result<()> {
        if vector.len() != self.shape.channel {
            warn!(
                "vector of {} components for a {}-channel array",
                vector.len(),
                self.shape.channel
            );
            bail!(ChannelMismatchError {
                expected: self.shape.channel,
                found: vector.len(),
            });
        }

        Ok(())
    }

    /// Per-pixel Euclidean distance between the channel vector and `vector`.
    pub fn distance(&self, vector: &[f64]) -> Result<ImgArray<f32>> {
        self.valid_vector(vector)?;

        self.reduce_channels(|pixel| {
            pixel
                .iter()
                .zip(vector)
                .map(|(elem, component)| (elem.as_f64() - component).powi(2))
                .sum::<f64>()
                .sqrt()
        })
    }

    /// Per-pixel `1 - cos(pixel, vector)`.
    pub fn cosine_distance(&self, vector: &[f64]) -> Result<ImgArray<f32>> {
        self.valid_vector(vector)?;
        let norm = vector.iter().map(|component| component * component).sum::<f64>().sqrt();

        self.reduce_channels(|pixel| {
            let (dot, squares) = pixel.iter().zip(vector).fold(
                (0.0, 0.0),
                |(dot, squares), (elem, component)| {
                    let elem = elem.as_f64();
                    (dot + elem * component, squares + elem * elem)
                },
            );

            1.0 - dot / (norm * squares.sqrt() + COSINE_EPSILON)
        })
    }

    pub fn metric_distance(&self, vector: &[f64], metric: Metric) -> Result<ImgArray<f32>> {
        match metric {
            Metric::Euclidean => self.distance(vector),
            Metric::Cosine => self.cosine_distance(vector),
        }
    }

    /// A single k-means step: assign every pixel to its nearest center, then average.
    ///
    /// Without `centers`, `k` centers are read at uniformly random pixels. With `centers`, `k`
    /// is their count. Centers are ordered by their largest component before assignment, and
    /// ties go to the lower index. Call repeatedly with the returned centers to iterate.
    pub fn cluster_step<R>(
        &self,
        k: usize,
        centers: Option<&[Vec<f64>]>,
        metric: Metric,
        rng: &mut R,
    ) -> Result<ClusterStep>
    where
        R: Rng + ?Sized,
    {
        let data = self.data()?;
        let channel = self.shape.channel;

        let mut centers = match centers {
            Some(centers) => centers.to_vec(),
            None => (0..k)
                .map(|_| {
                    let row = rng.gen_range(0..self.shape.height);
                    let col = rng.gen_range(0..self.shape.width);
                    let start = self.shape.idx(row, col, 0);

                    data[start..start + channel]
                        .iter()
                        .map(|elem| elem.as_f64())
                        .collect()
                })
                .collect(),
        };

        if centers.is_empty() {
            warn!("cluster step with no centers");
            bail!(InvalidClusterCountError);
        }
        for center in &centers {
            self.valid_vector(center)?;
        }

        centers.sort_by(|a, b| largest(a).total_cmp(&largest(b)));

        let distances = centers
            .iter()
            .map(|center| Ok(self.metric_distance(center, metric)?.into_vec()))
            .collect::<Result<Vec<Vec<f32>>>>()?;

        let mut sums = vec![vec![0.0; channel]; centers.len()];
        let mut counts = vec![0usize; centers.len()];
        let mut labels = Vec::with_capacity(self.shape.pixels());

        for (pixel, values) in data.chunks_exact(channel).enumerate() {
            let mut nearest = (0, f32::INFINITY);
            for (index, distance) in distances.iter().enumerate() {
                if distance[pixel] < nearest.1 {
                    nearest = (index, distance[pixel]);
                }
            }

            let label = nearest.0;
            labels.push(Clamped::from_f64(label as f64));
            counts[label] += 1;
            for (sum, elem) in sums[label].iter_mut().zip(values) {
                *sum += elem.as_f64();
            }
        }

        debug!("cluster sizes {counts:?}");

        let centers = sums
            .into_iter()
            .zip(&counts)
            .map(|(sum, &count)| sum.into_iter().map(|total| total / count as f64).collect())
            .collect();

        Ok(ClusterStep {
            centers,
            labels: ImgArray::init(labels, self.shape.with_channel(1)),
        })
    }

    pub fn cluster_step_default(
        &self,
        k: usize,
        centers: Option<&[Vec<f64>]>,
        metric: Metric,
    ) -> Result<ClusterStep> {
        self.cluster_step(k, centers, metric, &mut rand::thread_rng())
    }
}

fn largest(vector: &[f64]) -> f64 {
    vector.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

#[cfg(test)]
mod cluster_tests {
    use super::*;
    use crate::core::shape::Shape;
    use approx::assert_relative_eq;
    use rand::{rngs::StdRng, SeedableRng};

    fn two_tone() -> ImgArray<f32> {
        let shape = Shape::new(2, 2, 1).unwrap();
        ImgArray::from_vec(vec![0.0, 0.0, 10.0, 10.0], shape).unwrap()
    }

    #[test]
    fn distances() {
        let shape = Shape::new(1, 2, 2).unwrap();
        let array = ImgArray::<f32>::from_vec(vec![3.0, 4.0, 1.0, 0.0], shape).unwrap();

        let euclid = array.distance(&[0.0, 0.0]).unwrap();
        assert_relative_eq!(euclid.get(0, 0, 0).unwrap(), 5.0);

        let cosine = array.cosine_distance(&[0.0, 2.0]).unwrap();
        assert_relative_eq!(cosine.get(0, 0, 0).unwrap(), 0.2, epsilon = 1e-6);
        assert_relative_eq!(cosine.get(0, 1, 0).unwrap(), 1.0, epsilon = 1e-6);

        let error = array.distance(&[1.0]).unwrap_err();
        assert!(error.downcast_ref::<ChannelMismatchError>().is_some());
    }

    #[test]
    fn supplied_centers_are_sorted() {
        let centers = vec![vec![10.0], vec![0.0]];
        let step = two_tone()
            .cluster_step_default(0, Some(centers.as_slice()), Metric::Euclidean)
            .unwrap();

        assert_eq!(step.centers, vec![vec![0.0], vec![10.0]]);
        assert_eq!(
            step.labels.data().unwrap(),
            &[Clamped(0), Clamped(0), Clamped(1), Clamped(1)]
        );
    }

    #[test]
    fn empty_cluster_is_nan() {
        let centers = vec![vec![0.0], vec![10.0], vec![100.0]];
        let step = two_tone()
            .cluster_step_default(3, Some(centers.as_slice()), Metric::Euclidean)
            .unwrap();

        assert!(step.centers[2][0].is_nan());
    }

    #[test]
    fn random_init_is_seeded() {
        let array = two_tone();

        let first = array
            .cluster_step(2, None, Metric::Euclidean, &mut StdRng::seed_from_u64(7))
            .unwrap();
        let second = array
            .cluster_step(2, None, Metric::Euclidean, &mut StdRng::seed_from_u64(7))
            .unwrap();

        assert_eq!(first.labels, second.labels);
        assert_eq!(first.centers.len(), 2);
    }

    #[test]
    fn zero_clusters() {
        let error = two_tone()
            .cluster_step_default(0, None, Metric::Cosine)
            .unwrap_err();
        assert!(error.downcast_ref::<InvalidClusterCountError>().is_some());
    }

    #[test]
    fn cosine_groups_by_direction() {
        let shape = Shape::new(1, 4, 2).unwrap();
        let array = ImgArray::<f32>::from_vec(
            vec![1.0, 0.0, 2.0, 0.1, 0.0, 1.0, 0.1, 3.0],
            shape,
        )
        .unwrap();
        let centers = vec![vec![1.0, 0.0], vec![0.0, 1.0]];

        let step = array
            .cluster_step_default(2, Some(centers.as_slice()), Metric::Cosine)
            .unwrap();

        assert_eq!(
            step.labels.data().unwrap(),
            &[Clamped(0), Clamped(0), Clamped(1), Clamped(1)]
        );
        assert_relative_eq!(step.centers[0][0], 1.5, epsilon = 1e-6);
        assert_relative_eq!(step.centers[0][1], 0.05, epsilon = 1e-6);
        assert_relative_eq!(step.centers[1][0], 0.05, epsilon = 1e-6);
        assert_relative_eq!(step.centers[1][1], 2.0, epsilon = 1e-6);
    }
}
