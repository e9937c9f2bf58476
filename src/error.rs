// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Error and result types.

use std::path::PathBuf;
use thiserror::Error;

use crate::analyzer::AnalyzerError;
use crate::db::DbError;
use crate::model::ids::EntityId;
use crate::player::PlayerError;
use crate::recommender::SomError;
use crate::scanner::ScanError;

/// Top-level error type surfaced by the core.
///
/// Names follow the conceptual error kinds rather than the source tokens of any particular
/// collaborator: most variants wrap a module-local error via `#[from]`.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file could not be read, parsed, or contained a malformed required value.
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),
    /// The connection pool could not open a connection, or timed out acquiring one.
    #[error("database unavailable: {0}")]
    DatabaseUnavailable(#[from] DbError),
    /// A file on disk could not be opened or read by the scanner.
    #[error("cannot read {path}: {cause}")]
    FileUnreadable {
        /// Path that failed to open.
        path: PathBuf,
        /// Human-readable cause.
        cause: String,
    },
    /// A file's metadata could not be decoded.
    #[error("cannot parse tags in {path}: {cause}")]
    TagParseFailed {
        /// Path whose tags failed to parse.
        path: PathBuf,
        /// Human-readable cause.
        cause: String,
    },
    /// A previously scanned file no longer resides under any configured media library.
    #[error("{0} is no longer under any configured media library")]
    LibraryMismatch(PathBuf),
    /// The audio sink reported an error.
    #[error(transparent)]
    AudioSinkFailed(#[from] PlayerError),
    /// A typed "not found" result for an entity lookup.
    #[error("entity {0} not found")]
    NotFound(EntityId),
    /// A scan was requested while one was already running.
    #[error("busy: a scan is already in progress")]
    Busy,
    /// Scanner-layer error.
    #[error(transparent)]
    Scan(#[from] ScanError),
    /// Recommender/SOM-layer error.
    #[error(transparent)]
    Som(#[from] SomError),
    /// Audio analysis error, surfaced as a non-fatal scan-step warning.
    #[error("audio analysis failed: {0}")]
    Analyzer(#[from] AnalyzerError),
    /// I/O error with no more specific mapping above.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
