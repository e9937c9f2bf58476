// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! The individual scan steps, dispatched in the fixed order declared by [`super::ScanStep::ALL`].

mod associate;
mod check_for_removed_files;
mod compact;
mod compute_cluster_stats;
mod db_helpers;
mod discover_files;
mod fetch_artist_info;
mod optimize;
mod reload_similarity_engine;
mod scan_files;
mod update_library_fields;

use std::sync::atomic::AtomicBool;

use super::{ScanContext, ScanError, ScanStep, StepStats};

/// Batch size used by `CheckForRemovedFiles`, matching `ScanStepCheckForRemovedFiles.cpp`.
pub(super) const REMOVED_FILES_BATCH_SIZE: usize = 200;
/// Batch size used by `UpdateLibraryFields`, matching `ScanStepUpdateLibraryFields.cpp`.
pub(super) const LIBRARY_FIELDS_BATCH_SIZE: usize = 100;
/// Batch size used by `ScanFiles` and the `Associate*` steps, which have no original template to
/// pin a size from; chosen in the same order of magnitude as the other batched steps.
pub(super) const SCAN_FILES_BATCH_SIZE: usize = 100;

/// Run one step, reporting progress via `on_batch` at each batch boundary and honouring `abort`
/// at the same granularity (§5 "cancellation honoured at batch boundaries").
pub(super) fn run(
    step: ScanStep,
    ctx: &mut ScanContext<'_>,
    abort: &AtomicBool,
    on_batch: &mut dyn FnMut(StepStats),
) -> Result<(), ScanError> {
    match step {
        ScanStep::DiscoverFiles => discover_files::run(ctx, abort, on_batch),
        ScanStep::CheckForRemovedFiles => check_for_removed_files::run(ctx, abort, on_batch),
        ScanStep::UpdateLibraryFields => update_library_fields::run(ctx, abort, on_batch),
        ScanStep::ScanFiles => scan_files::run(ctx, abort, on_batch),
        ScanStep::AssociateExternalLyrics => associate::run_external_lyrics(ctx, abort, on_batch),
        ScanStep::AssociatePlayListFiles => associate::run_playlist_files(ctx, abort, on_batch),
        ScanStep::AssociateArtistImages => associate::run_artist_images(ctx, abort, on_batch),
        ScanStep::AssociateReleaseImages => associate::run_release_images(ctx, abort, on_batch),
        ScanStep::AssociateTrackImages => associate::run_track_images(ctx, abort, on_batch),
        ScanStep::ComputeClusterStats => compute_cluster_stats::run(ctx, abort, on_batch),
        ScanStep::FetchArtistInfo => fetch_artist_info::run(ctx, abort, on_batch),
        ScanStep::Compact => compact::run(ctx, abort, on_batch),
        ScanStep::Optimize => optimize::run(ctx, abort, on_batch),
        ScanStep::ReloadSimilarityEngine => reload_similarity_engine::run(ctx, abort, on_batch),
    }
}
