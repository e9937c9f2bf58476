// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! `ReloadSimilarityEngine` (§4.3 step 13): retrain the SOM recommender on the post-scan feature
//! set and swap the trained model into [`super::super::shared_recommender`] (§5 "Recommender
//! trained state: shared read-only after training; writers take an exclusive swap-in").
//!
//! The catalog has no dedicated "feature vector" column (the original analysis-to-SOM pipeline
//! this spec describes isn't part of the shipped schema — see `DESIGN.md`), so this step builds
//! each track's [`InputVector`] from the numeric signal-derived columns `ScanFiles` already
//! populates: duration, ReplayGain track gain/peak, and the mean/variance of the decoded
//! Chromaprint fingerprint bytes (a cheap proxy for acoustic content, in lieu of re-decoding audio
//! at this stage). A cancelled training run (abort requested mid-training) leaves the previously
//! trained state untouched, per §4.4 "Progress/cancel".

use std::sync::atomic::{AtomicBool, Ordering};

use base64::prelude::{Engine, BASE64_URL_SAFE_NO_PAD};

use crate::model::ids::TrackId;
use crate::recommender::{InputVector, TrainedRecommender};

use super::super::{shared_recommender, ScanContext, ScanError, StepStats};

/// Number of components in the feature vector built below: duration (s), track ReplayGain gain/
/// peak, release ReplayGain gain/peak, and fingerprint mean/variance.
const FEATURE_DIMENSIONS: usize = 7;

struct TrackFeatureRow {
    id: i64,
    duration_ms: i64,
    replay_gain_track_gain: Option<f64>,
    replay_gain_track_peak: Option<f64>,
    replay_gain_release_gain: Option<f64>,
    replay_gain_release_peak: Option<f64>,
    acoustic_fingerprint: Option<String>,
}

fn fingerprint_mean_and_variance(encoded: &str) -> (f64, f64) {
    let Ok(bytes) = BASE64_URL_SAFE_NO_PAD.decode(encoded) else {
        return (0.0, 0.0);
    };
    if bytes.is_empty() {
        return (0.0, 0.0);
    }
    let n = bytes.len() as f64;
    let mean = bytes.iter().map(|&b| f64::from(b)).sum::<f64>() / n;
    let variance = bytes.iter().map(|&b| (f64::from(b) - mean).powi(2)).sum::<f64>() / n;
    (mean, variance)
}

fn to_input_vector(row: &TrackFeatureRow) -> InputVector {
    let (fingerprint_mean, fingerprint_variance) = row
        .acoustic_fingerprint
        .as_deref()
        .map(fingerprint_mean_and_variance)
        .unwrap_or((0.0, 0.0));

    InputVector::from_values(vec![
        row.duration_ms as f64 / 1000.0,
        row.replay_gain_track_gain.unwrap_or(0.0),
        row.replay_gain_track_peak.unwrap_or(0.0),
        row.replay_gain_release_gain.unwrap_or(0.0),
        row.replay_gain_release_peak.unwrap_or(0.0),
        fingerprint_mean,
        fingerprint_variance,
    ])
}

pub(super) fn run(
    ctx: &mut ScanContext<'_>,
    abort: &AtomicBool,
    on_batch: &mut dyn FnMut(StepStats),
) -> Result<(), ScanError> {
    let rows: Vec<TrackFeatureRow> = {
        let tx = ctx.session().read()?;
        let mut stmt = tx.prepare(
            "SELECT id, duration_ms, replay_gain_track_gain, replay_gain_track_peak, \
             replay_gain_release_gain, replay_gain_release_peak, acoustic_fingerprint FROM track ORDER BY id",
        )?;
        let rows = stmt
            .query_map([], |r| {
                Ok(TrackFeatureRow {
                    id: r.get(0)?,
                    duration_ms: r.get(1)?,
                    replay_gain_track_gain: r.get(2)?,
                    replay_gain_track_peak: r.get(3)?,
                    replay_gain_release_gain: r.get(4)?,
                    replay_gain_release_peak: r.get(5)?,
                    acoustic_fingerprint: r.get(6)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        drop(stmt);
        tx.commit()?;
        rows
    };

    let mut total = StepStats { total_elems: 1, processed_elems: 0 };
    if rows.is_empty() {
        on_batch(total);
        return Ok(());
    }

    let samples: Vec<(TrackId, InputVector)> =
        rows.iter().map(|row| (TrackId::new(row.id), to_input_vector(row))).collect();
    debug_assert!(samples.iter().all(|(_, v)| v.dimensions() == FEATURE_DIMENSIONS));

    let recommender_config = ctx.config().recommender.clone();
    let result = TrainedRecommender::train(
        &samples,
        &recommender_config,
        |_progress| {},
        || abort.load(Ordering::SeqCst),
    );

    match result {
        Ok(trained) => {
            if let Ok(mut slot) = shared_recommender().write() {
                *slot = Some(trained);
            }
            ctx.stats_mut().updates += samples.len() as u64;
        }
        Err(err) => {
            log::warn!(target: "lms::scanner", "SOM retraining failed, keeping previous model: {err}");
        }
    }

    total.processed_elems = 1;
    on_batch(total);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_stats_on_empty_string_are_zero() {
        assert_eq!(fingerprint_mean_and_variance(""), (0.0, 0.0));
    }

    #[test]
    fn fingerprint_stats_are_computed_from_decoded_bytes() {
        let encoded = BASE64_URL_SAFE_NO_PAD.encode([0u8, 10, 20]);
        let (mean, variance) = fingerprint_mean_and_variance(&encoded);
        assert!((mean - 10.0).abs() < 1e-9);
        assert!(variance > 0.0);
    }

    #[test]
    fn to_input_vector_has_the_expected_dimension_count() {
        let row = TrackFeatureRow {
            id: 1,
            duration_ms: 180_000,
            replay_gain_track_gain: Some(-6.0),
            replay_gain_track_peak: Some(0.9),
            replay_gain_release_gain: None,
            replay_gain_release_peak: None,
            acoustic_fingerprint: None,
        };
        assert_eq!(to_input_vector(&row).dimensions(), FEATURE_DIMENSIONS);
    }
}
