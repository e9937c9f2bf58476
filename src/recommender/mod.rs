// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! The SOM-based similarity engine (§4.4), grounded on `src/libs/som/include/som/{InputVector,
//! DataNormalizer,Network,Matrix}.hpp` and the generic `Clusterer<T>` composition in
//! `src/clusterer/Clusterer.hpp` (train a [`Network`] over normalised samples, then bucket each
//! sample's value by the cell it classifies to).
//!
//! This module knows nothing about the catalog's storage; [`TrainedRecommender::similar_releases`]
//! and [`TrainedRecommender::similar_artists`] take caller-supplied `id -> [TrackId]` membership
//! maps and tie-break closures so the scanner/query layer can feed in whatever release/artist
//! grouping and display-name data it already has loaded, keeping this module storage-agnostic.

mod input_vector;
mod network;
mod normalizer;

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use thiserror::Error;

use crate::config::RecommenderConfig;
use crate::model::ids::TrackId;

pub use input_vector::InputVector;
pub use network::{Network, Position, TrainingProgress};
pub use normalizer::DataNormalizer;

/// Errors raised by the SOM engine.
#[derive(Debug, Error)]
pub enum SomError {
    /// Two vectors involved in a distance computation, or a sample and the trained network,
    /// didn't share the same dimension count.
    #[error("input vectors have mismatched dimensions")]
    DimensionMismatch,
    /// A query was issued against a `0x0` grid (no samples were available to train on).
    #[error("SOM grid is empty")]
    EmptyNetwork,
    /// None of the requested seed tracks have a known position in the trained grid.
    #[error("none of the seed tracks are present in the trained model")]
    NoKnownSeeds,
}

/// SOM grid size heuristic (§4.4 "Network"): `width = height = floor(sqrt(sampleCount / 20))`,
/// floored at `1` so a non-empty sample set always yields a usable grid.
fn heuristic_grid_size(sample_count: usize) -> u32 {
    let size = ((sample_count as f64) / 20.0).sqrt().floor() as u32;
    size.max(1)
}

/// A trained similarity engine: a [`Network`] plus the per-cell [`TrackId`] membership computed
/// at the end of training (§4.4 "Top-level recommender").
#[derive(Debug)]
pub struct TrainedRecommender {
    network: Network,
    normalizer: DataNormalizer,
    cells: HashMap<Position, Vec<TrackId>>,
    /// Normalised input vector for every track that took part in training, kept so a similarity
    /// query can compute the centroid of an arbitrary seed set without re-deriving features.
    track_vectors: HashMap<TrackId, InputVector>,
}

impl TrainedRecommender {
    /// Train a fresh engine on `samples` (§4.4 "Training (offline)").
    ///
    /// `config.grid_width`/`grid_height` of `0` (or absent) means "use the
    /// `floor(sqrt(n/20))` heuristic"; any other value is used verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`SomError::EmptyNetwork`] if `samples` is empty, or
    /// [`SomError::DimensionMismatch`] if the samples don't all share the same dimension count.
    pub fn train(
        samples: &[(TrackId, InputVector)],
        config: &RecommenderConfig,
        mut progress: impl FnMut(TrainingProgress),
        mut should_cancel: impl FnMut() -> bool,
    ) -> Result<Self, SomError> {
        if samples.is_empty() {
            return Err(SomError::EmptyNetwork);
        }
        let input_dimensions = samples[0].1.dimensions();

        let width = match config.grid_width {
            Some(0) | None => heuristic_grid_size(samples.len()),
            Some(width) => width,
        };
        let height = match config.grid_height {
            Some(0) | None => heuristic_grid_size(samples.len()),
            Some(height) => height,
        };
        let iteration_count = config.iteration_count.unwrap_or(500) as usize;

        let vectors: Vec<InputVector> = samples.iter().map(|(_, vector)| vector.clone()).collect();
        let mut normalizer = DataNormalizer::new(input_dimensions);
        normalizer.compute_normalization_factors(&vectors);

        let normalized: Vec<InputVector> = vectors
            .into_iter()
            .map(|mut vector| {
                normalizer.normalize(&mut vector);
                vector
            })
            .collect();

        let mut network = Network::new(width, height, input_dimensions);
        network.train(&normalized, iteration_count, &mut progress, &mut should_cancel)?;

        let mut cells: HashMap<Position, Vec<TrackId>> = HashMap::new();
        let mut track_vectors = HashMap::new();
        for ((track_id, _), vector) in samples.iter().zip(normalized.into_iter()) {
            let position = network.classify(&vector)?;
            cells.entry(position).or_default().push(*track_id);
            track_vectors.insert(*track_id, vector);
        }

        Ok(Self { network, normalizer, cells, track_vectors })
    }

    /// The trained grid, for callers that want read-only introspection (e.g. a status endpoint).
    #[must_use]
    pub fn network(&self) -> &Network {
        &self.network
    }

    /// The learned normalisation bounds.
    #[must_use]
    pub fn normalizer(&self) -> &DataNormalizer {
        &self.normalizer
    }

    /// `similarTracks(seedTrackIds, k)` (§4.4): up to `k` tracks most similar to the centroid of
    /// the seed set. Seeds absent from the trained model are ignored; seeds are never returned.
    ///
    /// # Errors
    ///
    /// Returns [`SomError::NoKnownSeeds`] if none of `seeds` were part of the training set.
    pub fn similar_tracks(&self, seeds: &[TrackId], k: usize) -> Result<Vec<TrackId>, SomError> {
        let seed_vectors: Vec<&InputVector> =
            seeds.iter().filter_map(|id| self.track_vectors.get(id)).collect();
        if seed_vectors.is_empty() {
            return Err(SomError::NoKnownSeeds);
        }

        let centroid = centroid_of(&seed_vectors);
        let positions = self.network.classify_n(&centroid, (self.network.width() * self.network.height()) as usize)?;

        let excluded: HashSet<TrackId> = seeds.iter().copied().collect();
        let mut seen = HashSet::new();
        let mut result = Vec::with_capacity(k);
        'outer: for position in positions {
            if let Some(tracks) = self.cells.get(&position) {
                for &track_id in tracks {
                    if excluded.contains(&track_id) || !seen.insert(track_id) {
                        continue;
                    }
                    result.push(track_id);
                    if result.len() == k {
                        break 'outer;
                    }
                }
            }
        }
        Ok(result)
    }

    /// `similarTracksFromTrackList(trackListId, k)` (§4.4): equivalent to [`Self::similar_tracks`],
    /// seeded by a track list's contents (the caller loads `trackListId`'s entries and passes the
    /// resulting track ids here).
    ///
    /// # Errors
    ///
    /// Returns [`SomError::NoKnownSeeds`] if none of `seed_tracks` were part of the training set.
    pub fn similar_tracks_from_track_list(&self, seed_tracks: &[TrackId], k: usize) -> Result<Vec<TrackId>, SomError> {
        self.similar_tracks(seed_tracks, k)
    }

    /// Rank the members of `membership` (excluding `seed`) by how many grid cells they share with
    /// `seed`'s own tracks (§4.4 "Similar releases/artists are derived by aggregating the cells of
    /// their constituent tracks and counting cell-membership intersections").
    ///
    /// Ties are broken by `tie_break(id) -> (secondary_key_desc, sort_name_asc)`, e.g. total track
    /// count descending then display name ascending (DESIGN.md's similar-artists tie-break).
    fn similar_by_cell_intersection<Id>(
        &self,
        membership: &HashMap<Id, Vec<TrackId>>,
        seed: Id,
        k: usize,
        tie_break: impl Fn(Id) -> (i64, String),
    ) -> Vec<Id>
    where
        Id: Copy + Eq + Hash + Ord,
    {
        let Some(seed_tracks) = membership.get(&seed) else {
            return Vec::new();
        };
        let seed_cells: HashSet<Position> =
            seed_tracks.iter().filter_map(|id| self.track_vectors.get(id)).filter_map(|v| self.network.classify(v).ok()).collect();
        if seed_cells.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(Id, usize, i64, String)> = membership
            .iter()
            .filter(|(id, _)| **id != seed)
            .map(|(&id, tracks)| {
                let cells: HashSet<Position> =
                    tracks.iter().filter_map(|t| self.track_vectors.get(t)).filter_map(|v| self.network.classify(v).ok()).collect();
                let intersection = seed_cells.intersection(&cells).count();
                let (secondary, name) = tie_break(id);
                (id, intersection, secondary, name)
            })
            .filter(|(_, intersection, _, _)| *intersection > 0)
            .collect();

        scored.sort_by(|a, b| {
            b.1.cmp(&a.1)
                .then_with(|| b.2.cmp(&a.2))
                .then_with(|| a.3.cmp(&b.3))
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(k);
        scored.into_iter().map(|(id, _, _, _)| id).collect()
    }

    /// `similarReleases(releaseId, k)` (§4.4). `release_tracks` maps every candidate release (the
    /// seed included) to its own constituent track ids; `tie_break` supplies `(track_count,
    /// sort_name)` for deterministic ordering among equally-similar releases.
    #[must_use]
    pub fn similar_releases<R>(
        &self,
        release_tracks: &HashMap<R, Vec<TrackId>>,
        seed: R,
        k: usize,
        tie_break: impl Fn(R) -> (i64, String),
    ) -> Vec<R>
    where
        R: Copy + Eq + Hash + Ord,
    {
        self.similar_by_cell_intersection(release_tracks, seed, k, tie_break)
    }

    /// `similarArtists(artistId, linkTypes, k)` (§4.4). `artist_tracks` maps every candidate
    /// artist (the seed included) to the track ids on which they hold one of the roles the caller
    /// wants considered (§4.4 "restricted to artists playing one of the given roles" — the
    /// caller performs that role filtering before building this map, since this module has no
    /// notion of [`crate::model::ArtistLinkType`]).
    #[must_use]
    pub fn similar_artists<A>(
        &self,
        artist_tracks: &HashMap<A, Vec<TrackId>>,
        seed: A,
        k: usize,
        tie_break: impl Fn(A) -> (i64, String),
    ) -> Vec<A>
    where
        A: Copy + Eq + Hash + Ord,
    {
        self.similar_by_cell_intersection(artist_tracks, seed, k, tie_break)
    }
}

/// Elementwise mean of a non-empty slice of same-dimension vectors.
fn centroid_of(vectors: &[&InputVector]) -> InputVector {
    let dimensions = vectors[0].dimensions();
    let mut sums = vec![0.0; dimensions];
    for vector in vectors {
        for (sum, value) in sums.iter_mut().zip(vector.values()) {
            *sum += value;
        }
    }
    let count = vectors.len() as f64;
    InputVector::from_values(sums.into_iter().map(|sum| sum / count).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ids::{ArtistId, ReleaseId};

    fn config(width: u32, height: u32, iterations: u32) -> RecommenderConfig {
        RecommenderConfig { grid_width: Some(width), grid_height: Some(height), iteration_count: Some(iterations) }
    }

    fn sample(id: i64, values: Vec<f64>) -> (TrackId, InputVector) {
        (TrackId::new(id), InputVector::from_values(values))
    }

    #[test]
    fn heuristic_grid_size_is_never_zero() {
        assert_eq!(heuristic_grid_size(0), 1);
        assert_eq!(heuristic_grid_size(19), 1);
        assert_eq!(heuristic_grid_size(80), 2);
    }

    #[test]
    fn training_rejects_empty_sample_set() {
        let result = TrainedRecommender::train(&[], &config(0, 0, 10), |_| {}, || false);
        assert!(matches!(result, Err(SomError::EmptyNetwork)));
    }

    #[test]
    fn similar_tracks_excludes_seeds_and_respects_k() {
        let samples = vec![
            sample(1, vec![0.0, 0.0]),
            sample(2, vec![0.05, 0.0]),
            sample(3, vec![0.1, 0.0]),
            sample(4, vec![0.9, 0.9]),
            sample(5, vec![1.0, 1.0]),
        ];
        let recommender = TrainedRecommender::train(&samples, &config(2, 2, 50), |_| {}, || false).unwrap();

        let result = recommender.similar_tracks(&[TrackId::new(1)], 2).unwrap();
        assert!(!result.contains(&TrackId::new(1)));
        assert!(result.len() <= 2);
    }

    #[test]
    fn similar_tracks_errors_on_unknown_seed() {
        let samples = vec![sample(1, vec![0.0]), sample(2, vec![1.0])];
        let recommender = TrainedRecommender::train(&samples, &config(1, 1, 10), |_| {}, || false).unwrap();
        let result = recommender.similar_tracks(&[TrackId::new(999)], 5);
        assert!(matches!(result, Err(SomError::NoKnownSeeds)));
    }

    #[test]
    fn similar_releases_ranks_by_cell_intersection() {
        let samples = vec![
            sample(1, vec![0.0, 0.0]),
            sample(2, vec![0.02, 0.0]),
            sample(3, vec![1.0, 1.0]),
        ];
        let recommender = TrainedRecommender::train(&samples, &config(2, 2, 50), |_| {}, || false).unwrap();

        let mut release_tracks = HashMap::new();
        release_tracks.insert(ReleaseId::new(1), vec![TrackId::new(1)]);
        release_tracks.insert(ReleaseId::new(2), vec![TrackId::new(2)]);
        release_tracks.insert(ReleaseId::new(3), vec![TrackId::new(3)]);

        let result = recommender.similar_releases(&release_tracks, ReleaseId::new(1), 5, |_| (0, String::new()));
        assert!(!result.contains(&ReleaseId::new(1)));
    }

    #[test]
    fn similar_artists_with_no_known_cells_returns_empty() {
        let samples = vec![sample(1, vec![0.0]), sample(2, vec![1.0])];
        let recommender = TrainedRecommender::train(&samples, &config(1, 1, 10), |_| {}, || false).unwrap();

        let artist_tracks: HashMap<ArtistId, Vec<TrackId>> = HashMap::new();
        let result = recommender.similar_artists(&artist_tracks, ArtistId::new(1), 5, |_| (0, String::new()));
        assert!(result.is_empty());
    }
}
