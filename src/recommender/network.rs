// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! The SOM grid and its training/query operations (§4.4 "Network"), grounded on
//! `libs/som/include/som/{Network,Matrix}.hpp` and `src/clusterer/SOM.cpp`.

use rand::Rng;

use super::input_vector::InputVector;
use super::SomError;

/// A position on the SOM grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
}

impl Position {
    /// Build a position.
    #[must_use]
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance between two grid positions.
    #[must_use]
    fn distance(self, other: Self) -> f64 {
        let dx = f64::from(self.x) - f64::from(other.x);
        let dy = f64::from(self.y) - f64::from(other.y);
        (dx * dx + dy * dy).sqrt()
    }
}

/// A 2D row-major grid of `T`, indexed by [`Position`]. Mirrors the C++ `Matrix<T>` template:
/// `get({x, y})` reads `values[x + width * y]`.
#[derive(Debug, Clone)]
struct Matrix<T> {
    width: u32,
    height: u32,
    values: Vec<T>,
}

impl<T> Matrix<T> {
    fn index(&self, position: Position) -> usize {
        (position.x + self.width * position.y) as usize
    }

    fn get(&self, position: Position) -> &T {
        &self.values[self.index(position)]
    }

    fn get_mut(&mut self, position: Position) -> &mut T {
        let index = self.index(position);
        &mut self.values[index]
    }

    fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        let width = self.width;
        let height = self.height;
        (0..height).flat_map(move |y| (0..width).map(move |x| Position::new(x, y)))
    }
}

/// Progress of an in-flight [`Network::train`] call, passed to the caller-provided progress
/// callback at each iteration boundary (§4.4 "Progress/cancel").
#[derive(Debug, Clone, Copy)]
pub struct TrainingProgress {
    /// Index of the iteration about to run, `0`-based.
    pub current_iteration: usize,
    /// Total number of iterations this training run was asked to do.
    pub total_iterations: usize,
}

/// `alpha(t) = exp(-(t+1)/T)`, the default learning factor (§4.4).
fn default_learning_factor(progress: TrainingProgress) -> f64 {
    let t = progress.total_iterations as f64;
    (-((progress.current_iteration + 1) as f64) / t).exp()
}

/// `sigma(t) = exp(-(t+1)/T)`, shared by the default neighbourhood function (§4.4).
fn default_sigma(progress: TrainingProgress) -> f64 {
    let t = progress.total_iterations as f64;
    (-((progress.current_iteration + 1) as f64) / t).exp()
}

/// `h(d, t) = exp(-d^2 / (2 * sigma(t)^2))`, the default neighbourhood function (§4.4).
fn default_neighbourhood(distance: f64, progress: TrainingProgress) -> f64 {
    let sigma = default_sigma(progress);
    (-(distance * distance) / (2.0 * sigma * sigma)).exp()
}

/// A self-organising map: a `width x height` grid of [`InputVector`] reference vectors, trained
/// against a set of samples (§4.4 "Network").
#[derive(Debug)]
pub struct Network {
    ref_vectors: Matrix<InputVector>,
    input_dimensions: usize,
    weights: InputVector,
}

impl Network {
    /// Build a network with `width x height` reference vectors of `input_dimensions` components
    /// each, initialised uniformly at random in `[0, 1]` (§4.4).
    #[must_use]
    pub fn new(width: u32, height: u32, input_dimensions: usize) -> Self {
        let mut rng = rand::thread_rng();
        let count = (width as usize) * (height as usize);
        let values = (0..count)
            .map(|_| {
                InputVector::from_values((0..input_dimensions).map(|_| rng.gen_range(0.0..1.0)).collect())
            })
            .collect();
        Self {
            ref_vectors: Matrix { width, height, values },
            input_dimensions,
            weights: InputVector::new(input_dimensions, 1.0),
        }
    }

    /// Grid width.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.ref_vectors.width
    }

    /// Grid height.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.ref_vectors.height
    }

    /// Number of components every reference/input vector has.
    #[must_use]
    pub fn input_dimensions(&self) -> usize {
        self.input_dimensions
    }

    /// Override the per-dimension distance weights (default: all `1`).
    ///
    /// # Errors
    ///
    /// Returns [`SomError::DimensionMismatch`] if `weights` doesn't have `input_dimensions`
    /// components.
    pub fn set_data_weights(&mut self, weights: InputVector) -> Result<(), SomError> {
        if weights.dimensions() != self.input_dimensions {
            return Err(SomError::DimensionMismatch);
        }
        self.weights = weights;
        Ok(())
    }

    /// Read the reference vector at `position`.
    #[must_use]
    pub fn ref_vector(&self, position: Position) -> &InputVector {
        self.ref_vectors.get(position)
    }

    /// `classify(x)` (§4.4 "Querying"): the grid position whose reference vector minimises the
    /// distance to `data`.
    ///
    /// # Errors
    ///
    /// Returns [`SomError::DimensionMismatch`] if `data` doesn't have `input_dimensions`
    /// components.
    pub fn classify(&self, data: &InputVector) -> Result<Position, SomError> {
        let mut best: Option<(Position, f64)> = None;
        for position in self.ref_vectors.positions() {
            let distance = self.ref_vectors.get(position).weighted_squared_distance(data, &self.weights)?;
            let improves = match best {
                Some((_, best_distance)) => distance < best_distance,
                None => true,
            };
            if improves {
                best = Some((position, distance));
            }
        }
        best.map(|(position, _)| position).ok_or(SomError::EmptyNetwork)
    }

    /// `classifyN(x, N)` (§4.4): the first `n` grid positions, sorted by distance from `x`'s
    /// classified reference vector, ties broken by row-major grid order.
    ///
    /// # Errors
    ///
    /// Returns [`SomError::DimensionMismatch`] if `data` doesn't have `input_dimensions`
    /// components.
    pub fn classify_n(&self, data: &InputVector, n: usize) -> Result<Vec<Position>, SomError> {
        let closest = self.classify(data)?;
        let closest_ref = self.ref_vectors.get(closest);

        let mut entries: Vec<(Position, f64)> = Vec::with_capacity(self.ref_vectors.values.len());
        for position in self.ref_vectors.positions() {
            let distance = self.ref_vectors.get(position).weighted_squared_distance(closest_ref, &self.weights)?;
            entries.push((position, distance));
        }
        entries.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        entries.truncate(n);
        Ok(entries.into_iter().map(|(position, _)| position).collect())
    }

    /// Train the network for `iteration_count` passes over `samples` (already-normalised data,
    /// §4.4 "Training (offline)").
    ///
    /// `progress` is invoked once per iteration with the iteration's index. `should_cancel` is
    /// polled once per iteration; if it returns `true`, training stops and the network is left in
    /// whatever state the last fully-completed iteration produced (§4.4 "a cancelled training
    /// leaves the previous trained state intact").
    ///
    /// # Errors
    ///
    /// Returns [`SomError::DimensionMismatch`] if any sample doesn't have `input_dimensions`
    /// components, or [`SomError::EmptyNetwork`] if the grid is `0x0`.
    pub fn train(
        &mut self,
        samples: &[InputVector],
        iteration_count: usize,
        mut progress: impl FnMut(TrainingProgress),
        mut should_cancel: impl FnMut() -> bool,
    ) -> Result<(), SomError> {
        if self.ref_vectors.values.is_empty() {
            return Err(SomError::EmptyNetwork);
        }
        for sample in samples {
            if sample.dimensions() != self.input_dimensions {
                return Err(SomError::DimensionMismatch);
            }
        }
        if iteration_count == 0 || samples.is_empty() {
            return Ok(());
        }

        let mut shuffled: Vec<&InputVector> = samples.iter().collect();
        let mut rng = rand::thread_rng();

        for iteration in 0..iteration_count {
            if should_cancel() {
                return Ok(());
            }

            let current_progress = TrainingProgress { current_iteration: iteration, total_iterations: iteration_count };
            progress(current_progress);

            shuffle(&mut shuffled, &mut rng);

            for sample in &shuffled {
                let closest = self.classify(sample)?;
                self.update_ref_vectors(closest, sample, current_progress);
            }
        }
        Ok(())
    }

    /// Update every reference vector towards `input`, weighted by distance (in grid coordinates)
    /// from `closest` (§4.4 "For every cell (i,j) ... Update r(i,j)").
    fn update_ref_vectors(&mut self, closest: Position, input: &InputVector, progress: TrainingProgress) {
        let alpha = default_learning_factor(progress);
        let positions: Vec<Position> = self.ref_vectors.positions().collect();
        for position in positions {
            let grid_distance = position.distance(closest);
            let factor = alpha * default_neighbourhood(grid_distance, progress);
            let delta = input.sub(self.ref_vectors.get(position));
            self.ref_vectors.get_mut(position).add_scaled(&delta, factor);
        }
    }
}

/// Fisher-Yates shuffle over a slice of references, avoiding a dependency on `rand`'s
/// `SliceRandom` trait bound quirks for non-`Copy` element types.
fn shuffle<T>(items: &mut [T], rng: &mut impl Rng) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_picks_nearest_reference() {
        let mut network = Network::new(2, 2, 1);
        network.ref_vectors.values = vec![
            InputVector::from_values(vec![0.0]),
            InputVector::from_values(vec![0.3]),
            InputVector::from_values(vec![0.6]),
            InputVector::from_values(vec![1.0]),
        ];

        let data = InputVector::from_values(vec![0.65]);
        let position = network.classify(&data).unwrap();
        assert_eq!(network.ref_vector(position).values(), &[0.6]);
    }

    #[test]
    fn classify_n_orders_by_distance_and_breaks_ties_row_major() {
        let mut network = Network::new(2, 1, 1);
        network.ref_vectors.values = vec![InputVector::from_values(vec![0.0]), InputVector::from_values(vec![0.0])];

        let data = InputVector::from_values(vec![0.0]);
        let positions = network.classify_n(&data, 2).unwrap();
        assert_eq!(positions, vec![Position::new(0, 0), Position::new(1, 0)]);
    }

    #[test]
    fn training_shrinks_average_distance_to_samples() {
        let mut network = Network::new(3, 3, 2);
        let samples = vec![
            InputVector::from_values(vec![0.1, 0.1]),
            InputVector::from_values(vec![0.9, 0.9]),
            InputVector::from_values(vec![0.1, 0.9]),
        ];

        let weights = InputVector::new(2, 1.0);
        let mean_distance = |net: &Network| -> f64 {
            samples
                .iter()
                .map(|sample| {
                    let closest = net.classify(sample).unwrap();
                    net.ref_vector(closest).weighted_squared_distance(sample, &weights).unwrap()
                })
                .sum::<f64>()
                / samples.len() as f64
        };

        let before = mean_distance(&network);
        network.train(&samples, 50, |_| {}, || false).unwrap();
        let after = mean_distance(&network);

        assert!(after <= before, "training should not increase mean distance to samples ({after} > {before})");
    }

    #[test]
    fn cancellation_leaves_state_untouched_on_first_iteration() {
        let mut network = Network::new(2, 2, 1);
        let before = network.ref_vectors.values.clone();
        let samples = vec![InputVector::from_values(vec![0.5])];

        network.train(&samples, 10, |_| {}, || true).unwrap();
        assert_eq!(network.ref_vectors.values, before);
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        let network = Network::new(2, 2, 2);
        let bad = InputVector::new(3, 0.0);
        assert!(matches!(network.classify(&bad), Err(SomError::DimensionMismatch)));
    }
}
