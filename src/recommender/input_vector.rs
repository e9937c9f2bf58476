// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! A fixed-dimension feature vector (§4.4 "InputVector"), grounded on
//! `libs/som/include/som/InputVector.hpp`.

use super::SomError;

/// A fixed-dimension vector of `f64` features, used both as a training sample and as a grid
/// reference vector.
#[derive(Debug, Clone, PartialEq)]
pub struct InputVector {
    values: Vec<f64>,
}

impl InputVector {
    /// Build a vector of `dimensions` components, all initialised to `default`.
    #[must_use]
    pub fn new(dimensions: usize, default: f64) -> Self {
        Self { values: vec![default; dimensions] }
    }

    /// Build a vector from already-computed component values.
    #[must_use]
    pub fn from_values(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// Number of components.
    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.values.len()
    }

    /// `true` if `self` and `other` have the same number of components.
    #[must_use]
    pub fn has_same_dimensions(&self, other: &Self) -> bool {
        self.values.len() == other.values.len()
    }

    /// Borrow the raw components.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Mutable access to the raw components.
    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    /// Weighted squared Euclidean distance between `self` and `other` (§4.4 "default distance is
    /// weighted squared Euclidean").
    ///
    /// # Errors
    ///
    /// Returns [`SomError::DimensionMismatch`] if `self`, `other` and `weights` do not all share
    /// the same dimension count.
    pub fn weighted_squared_distance(&self, other: &Self, weights: &Self) -> Result<f64, SomError> {
        if !self.has_same_dimensions(other) || !self.has_same_dimensions(weights) {
            return Err(SomError::DimensionMismatch);
        }

        let mut result = 0.0;
        for i in 0..self.values.len() {
            let diff = self.values[i] - other.values[i];
            result += diff * diff * weights.values[i];
        }
        Ok(result)
    }

    /// In-place `self += delta * factor`.
    pub fn add_scaled(&mut self, delta: &Self, factor: f64) {
        for (value, delta) in self.values.iter_mut().zip(delta.values.iter()) {
            *value += delta * factor;
        }
    }

    /// `self - other`, component-wise. Panics if dimensions mismatch; callers are expected to have
    /// already checked via [`Self::has_same_dimensions`].
    #[must_use]
    pub fn sub(&self, other: &Self) -> Self {
        debug_assert!(self.has_same_dimensions(other));
        Self {
            values: self.values.iter().zip(other.values.iter()).map(|(a, b)| a - b).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weighted_distance_of_identical_vectors_is_zero() {
        let a = InputVector::from_values(vec![0.2, 0.5, 0.9]);
        let weights = InputVector::new(3, 1.0);
        assert_eq!(a.weighted_squared_distance(&a, &weights).unwrap(), 0.0);
    }

    #[test]
    fn weighted_distance_applies_weights() {
        let a = InputVector::from_values(vec![0.0, 0.0]);
        let b = InputVector::from_values(vec![1.0, 2.0]);
        let weights = InputVector::from_values(vec![1.0, 0.0]);
        // only the first dimension is weighted, so (1-0)^2 * 1 + (2-0)^2 * 0 = 1
        assert_eq!(a.weighted_squared_distance(&b, &weights).unwrap(), 1.0);
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        let a = InputVector::new(2, 0.0);
        let b = InputVector::new(3, 0.0);
        let weights = InputVector::new(2, 1.0);
        assert!(matches!(
            a.weighted_squared_distance(&b, &weights),
            Err(SomError::DimensionMismatch)
        ));
    }

    #[test]
    fn add_scaled_updates_in_place() {
        let mut a = InputVector::from_values(vec![1.0, 1.0]);
        let delta = InputVector::from_values(vec![2.0, -2.0]);
        a.add_scaled(&delta, 0.5);
        assert_eq!(a.values(), &[2.0, 0.0]);
    }
}
