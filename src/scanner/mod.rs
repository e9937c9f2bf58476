// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! The scanner pipeline (§4.3): a strictly-ordered sequence of steps that bring the catalog into
//! agreement with the filesystem, grounded on
//! `libs/services/scanner/impl/{ScannerSettings.hpp,ScanStepUpdateLibraryFields.*,steps/*}`.
//!
//! Each step runs to completion (or to the first `abort()` request) before the next one starts,
//! and every step commits its work in small batches so a killed or aborted scan leaves the
//! catalog in the state of its last successful batch (§7's "an aborted step leaves the catalog in
//! the state of the last successful batch" propagation policy).

mod context;
pub mod lyrics;
mod steps;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, RwLock};

use thiserror::Error;

use crate::config::Config;
use crate::db::{Db, DbError};
use crate::model::ids::{DirectoryId, MediaLibraryId};
use crate::recommender::TrainedRecommender;

pub(crate) use context::{DiscoveredFile, DiscoveredKind, ScanContext};

/// Errors raised by the scan pipeline itself (not per-file errors, which are always recovered
/// locally and folded into [`ScanStats::errors`] — see §7's propagation policy).
#[derive(Debug, Error)]
pub enum ScanError {
    /// The persistence layer reported an error outside of a per-file context (step setup, batch
    /// commit).
    #[error("database error during scan: {0}")]
    Db(#[from] DbError),
    /// A raw `rusqlite` call against an already-open transaction failed.
    #[error("sqlite error during scan: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A filesystem error while walking a `MediaLibrary` root itself (not an individual file).
    #[error("filesystem error during scan: {0}")]
    Io(#[from] std::io::Error),
    /// `config.media_libraries` named a root path that doesn't exist or isn't a directory.
    #[error("media library root {0} does not exist or is not a directory")]
    InvalidMediaLibraryRoot(PathBuf),
}

/// Which kind of scan to run (§4.3, §6 `startScan(kind)`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanKind {
    /// Re-evaluate every file regardless of its recorded `scan_version`/mtime/size.
    Full,
    /// Skip files whose `(size, mtime, scan_version)` match the stored row (the common case).
    Incremental,
}

/// One phase of the ordered pipeline (§4.3's ten-step sequence).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanStep {
    /// Walk every `MediaLibrary` root and count recognised files.
    DiscoverFiles,
    /// Remove rows whose backing file is gone, out of any root, or no longer recognised.
    CheckForRemovedFiles,
    /// Fix up `Directory.media_library_id` after a library's root configuration changes.
    UpdateLibraryFields,
    /// Parse tags/run analyzers for new or changed files and upsert their rows.
    ScanFiles,
    /// Match orphan external lyrics sidecars to their owning track.
    AssociateExternalLyrics,
    /// Match orphan playlist files to their directory.
    AssociatePlayListFiles,
    /// Match orphan artist portrait images.
    AssociateArtistImages,
    /// Match orphan release cover images.
    AssociateReleaseImages,
    /// Match orphan per-track cover images.
    AssociateTrackImages,
    /// Refresh `Cluster.track_count`.
    ComputeClusterStats,
    /// Optional remote artist enrichment.
    FetchArtistInfo,
    /// Garbage-collect entities with zero inbound references.
    Compact,
    /// Run `ANALYZE`/`PRAGMA optimize`.
    Optimize,
    /// Retrain the SOM recommender on the post-scan feature set.
    ReloadSimilarityEngine,
}

impl ScanStep {
    /// All steps, in the fixed order they run (§4.3 "strict order").
    const ALL: [Self; 14] = [
        Self::DiscoverFiles,
        Self::CheckForRemovedFiles,
        Self::UpdateLibraryFields,
        Self::ScanFiles,
        Self::AssociateExternalLyrics,
        Self::AssociatePlayListFiles,
        Self::AssociateArtistImages,
        Self::AssociateReleaseImages,
        Self::AssociateTrackImages,
        Self::ComputeClusterStats,
        Self::FetchArtistInfo,
        Self::Compact,
        Self::Optimize,
        Self::ReloadSimilarityEngine,
    ];
}

impl std::fmt::Display for ScanStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::DiscoverFiles => "DiscoverFiles",
            Self::CheckForRemovedFiles => "CheckForRemovedFiles",
            Self::UpdateLibraryFields => "UpdateLibraryFields",
            Self::ScanFiles => "ScanFiles",
            Self::AssociateExternalLyrics => "AssociateExternalLyrics",
            Self::AssociatePlayListFiles => "AssociatePlayListFiles",
            Self::AssociateArtistImages => "AssociateArtistImages",
            Self::AssociateReleaseImages => "AssociateReleaseImages",
            Self::AssociateTrackImages => "AssociateTrackImages",
            Self::ComputeClusterStats => "ComputeClusterStats",
            Self::FetchArtistInfo => "FetchArtistInfo",
            Self::Compact => "Compact",
            Self::Optimize => "Optimize",
            Self::ReloadSimilarityEngine => "ReloadSimilarityEngine",
        };
        f.write_str(name)
    }
}

/// Progress for the step currently running (§4.3 "Progress model").
#[derive(Debug, Clone, Copy, Default)]
pub struct StepStats {
    /// Total number of elements this step expects to look at, if known up-front.
    pub total_elems: u64,
    /// Number of elements processed so far.
    pub processed_elems: u64,
}

/// Aggregate counters across the whole run, accumulated across every step.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanStats {
    /// Files seen by `DiscoverFiles`.
    pub discovered: u64,
    /// Rows removed because their backing file is gone (`CheckForRemovedFiles`, `Compact`).
    pub deletions: u64,
    /// New rows created.
    pub additions: u64,
    /// Existing rows whose content changed.
    pub updates: u64,
    /// Files left untouched because they were already up to date.
    pub skipped: u64,
    /// Per-file errors recovered locally (logged, never propagated — §7).
    pub errors: u64,
}

impl ScanStats {
    fn merge(&mut self, other: &Self) {
        self.discovered += other.discovered;
        self.deletions += other.deletions;
        self.additions += other.additions;
        self.updates += other.updates;
        self.skipped += other.skipped;
        self.errors += other.errors;
    }
}

/// Current state of a [`ScanController`] (§6 `getStatus()`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanState {
    /// No scan is running.
    #[default]
    Idle,
    /// A scan is in progress.
    Running,
    /// `requestStop()` was called; the pipeline will exit at the next batch boundary.
    Aborting,
}

/// A snapshot of scan progress (§6 `getStatus() -> {state, currentStep, currentStepStats,
/// overallStats}`).
#[derive(Debug, Clone, Default)]
pub struct ScanStatus {
    /// Whether a scan is running, aborting, or idle.
    pub state: ScanState,
    /// The step currently executing, if any.
    pub current_step: Option<ScanStep>,
    /// That step's progress.
    pub current_step_stats: StepStats,
    /// Counters accumulated so far across every completed step.
    pub overall_stats: ScanStats,
}

/// Run a scan to completion, synchronously, with no progress reporting and no external abort
/// mechanism — the entry point used by a one-shot CLI invocation.
///
/// # Errors
///
/// Returns [`ScanError`] if a step fails in a way that isn't recoverable per-file (database
/// error, or a configured `MediaLibrary` root that doesn't exist).
pub fn run_scan(db: &Arc<Db>, config: &Config, kind: ScanKind) -> Result<ScanStats, ScanError> {
    let abort = AtomicBool::new(false);
    run_scan_with_progress(db, config, kind, &abort, |_, _| {})
}

/// Run a scan to completion, invoking `on_progress(step, stats)` at every batch boundary and
/// checking `abort` at the same points (§4.3 "An abort() request sets a flag checked at each
/// batch").
///
/// # Errors
///
/// See [`run_scan`].
pub fn run_scan_with_progress(
    db: &Arc<Db>,
    config: &Config,
    kind: ScanKind,
    abort: &AtomicBool,
    mut on_progress: impl FnMut(ScanStep, StepStats),
) -> Result<ScanStats, ScanError> {
    log::info!(target: "lms::scanner", "starting {kind:?} scan");
    let session = db.session();
    let mut ctx = ScanContext::new(&session, config, kind);

    for step in ScanStep::ALL {
        if abort.load(Ordering::SeqCst) {
            log::info!(target: "lms::scanner", "scan aborted before {step}");
            break;
        }
        log::info!(target: "lms::scanner", "running step {step}");
        let mut step_stats = StepStats::default();
        steps::run(step, &mut ctx, abort, &mut |delta: StepStats| {
            step_stats = delta;
            on_progress(step, step_stats);
        })?;
    }

    if !abort.load(Ordering::SeqCst) {
        let mut settings = ctx.scan_settings().clone();
        settings.last_scan_completed = Some(chrono::Utc::now());
        ctx.save_scan_settings(&settings)?;
    }

    log::info!(target: "lms::scanner", "scan complete: {:?}", ctx.stats());
    Ok(*ctx.stats())
}

/// Process-wide handle to the trained similarity engine (§5 "Recommender trained state: shared
/// read-only after training; writers take an exclusive swap-in").
///
/// Modelled as an explicitly-initialised service with a typed "not present" state (`None`) rather
/// than a zero-initialised global, per the architecture notes on avoiding ad hoc global mutable
/// state: the slot always exists, callers just find it empty until the first
/// `ReloadSimilarityEngine` step completes.
pub fn shared_recommender() -> &'static Arc<RwLock<Option<TrainedRecommender>>> {
    static HANDLE: OnceLock<Arc<RwLock<Option<TrainedRecommender>>>> = OnceLock::new();
    HANDLE.get_or_init(|| Arc::new(RwLock::new(None)))
}

/// A long-lived controller around [`run_scan_with_progress`] that enforces "only one scan runs at
/// a time" (§4.3 "Scheduling") and publishes a queryable [`ScanStatus`] (§6 `getStatus()`).
#[derive(Debug, Clone)]
pub struct ScanController {
    running: Arc<AtomicBool>,
    abort: Arc<AtomicBool>,
    status: Arc<Mutex<ScanStatus>>,
}

impl Default for ScanController {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanController {
    /// Build an idle controller.
    #[must_use]
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
            abort: Arc::new(AtomicBool::new(false)),
            status: Arc::new(Mutex::new(ScanStatus::default())),
        }
    }

    /// `requestStop()` (§6): set the abort flag, checked by the running scan at its next batch
    /// boundary. A no-op if no scan is running.
    pub fn request_stop(&self) {
        self.abort.store(true, Ordering::SeqCst);
        if let Ok(mut status) = self.status.lock() {
            if status.state == ScanState::Running {
                status.state = ScanState::Aborting;
            }
        }
    }

    /// `getStatus()` (§6): a snapshot of the current run, or the idle state plus the last run's
    /// final counters if nothing is running.
    #[must_use]
    pub fn status(&self) -> ScanStatus {
        self.status.lock().map(|guard| guard.clone()).unwrap_or_default()
    }

    /// `startScan(kind)` (§6): run a scan, returning [`crate::Error::Busy`] if one is already in
    /// progress (§4.3 "Only one scan runs at a time; concurrent triggers are dropped with a
    /// 'busy' result").
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Busy`] if a scan is already running, or a wrapped [`ScanError`]
    /// from the pipeline itself.
    pub fn start_scan(&self, db: &Arc<Db>, config: &Config, kind: ScanKind) -> crate::Result<ScanStats> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(crate::Error::Busy);
        }
        self.abort.store(false, Ordering::SeqCst);
        if let Ok(mut status) = self.status.lock() {
            status.state = ScanState::Running;
            status.current_step = None;
            status.current_step_stats = StepStats::default();
        }

        let result = run_scan_with_progress(db, config, kind, &self.abort, |step, step_stats| {
            if let Ok(mut status) = self.status.lock() {
                status.current_step = Some(step);
                status.current_step_stats = step_stats;
            }
        });

        self.running.store(false, Ordering::SeqCst);
        if let Ok(mut status) = self.status.lock() {
            status.state = ScanState::Idle;
            status.current_step = None;
            if let Ok(stats) = &result {
                status.overall_stats.merge(stats);
            }
        }

        result.map_err(Into::into)
    }
}

/// A `Directory` row's id keyed by its absolute path, built once per scan by `DiscoverFiles` and
/// reused by every later step so they never need to re-walk the filesystem.
pub(crate) type DirectoryIndex = std::collections::HashMap<PathBuf, DirectoryId>;
/// A `MediaLibrary` row's id keyed by its configured root path.
pub(crate) type MediaLibraryIndex = std::collections::HashMap<PathBuf, MediaLibraryId>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_step_display_matches_variant_name() {
        assert_eq!(ScanStep::DiscoverFiles.to_string(), "DiscoverFiles");
        assert_eq!(ScanStep::ReloadSimilarityEngine.to_string(), "ReloadSimilarityEngine");
    }

    #[test]
    fn scan_stats_merge_sums_every_field() {
        let mut total = ScanStats { discovered: 1, deletions: 2, additions: 3, updates: 4, skipped: 5, errors: 6 };
        let delta = ScanStats { discovered: 1, deletions: 1, additions: 1, updates: 1, skipped: 1, errors: 1 };
        total.merge(&delta);
        assert_eq!(total.discovered, 2);
        assert_eq!(total.errors, 7);
    }

    #[test]
    fn controller_rejects_concurrent_start() {
        let controller = ScanController::new();
        controller.running.store(true, Ordering::SeqCst);
        let db_path = std::env::temp_dir().join(format!("lms-scan-busy-test-{}.db", std::process::id()));
        let db = Arc::new(Db::open(&db_path, 1, crate::config::IntegrityCheck::None, false).unwrap());
        let config = Config::default();
        let result = controller.start_scan(&db, &config, ScanKind::Incremental);
        assert!(matches!(result, Err(crate::Error::Busy)));
        let _ = std::fs::remove_file(&db_path);
    }

    #[test]
    fn shared_recommender_starts_empty() {
        assert!(shared_recommender().read().unwrap().is_none());
    }
}
