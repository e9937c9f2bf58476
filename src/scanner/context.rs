// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Shared state threaded through every step of one [`super::run_scan_with_progress`] call: the
//! open [`Session`], the directory/media-library indexes built by `DiscoverFiles` and reused by
//! every later step (so nothing re-walks the filesystem), and the running [`ScanStats`] total.

use std::path::PathBuf;

use crate::config::Config;
use crate::db::Session;
use crate::model::ScanSettings;
use crate::model::ids::{DirectoryId, MediaLibraryId};

use super::{DirectoryIndex, MediaLibraryIndex, ScanError, ScanKind, ScanStats};

/// What kind of recognised file [`DiscoverFiles`](super::ScanStep::DiscoverFiles) found at a
/// given path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DiscoveredKind {
    /// A file extension [`crate::tag::TaggedFile::recognised_extensions`] claims.
    Audio,
    /// `jpg`/`jpeg`/`png`/`bmp`/`gif`.
    Image,
    /// `lrc`/`txt`, a candidate external lyrics sidecar.
    Lyrics,
    /// `m3u`/`m3u8`.
    PlayList,
}

/// One file found by `DiscoverFiles`, carried forward so later steps never re-walk the
/// filesystem.
#[derive(Debug, Clone)]
pub(crate) struct DiscoveredFile {
    /// Absolute path.
    pub path: PathBuf,
    /// What kind of file this is.
    pub kind: DiscoveredKind,
    /// The `Directory` row that contains it.
    pub directory_id: DirectoryId,
    /// The `MediaLibrary` it belongs to.
    pub media_library_id: MediaLibraryId,
}

/// Per-run scanner state, owned by [`super::run_scan_with_progress`] and passed by `&mut` to every
/// step in turn.
pub(crate) struct ScanContext<'a> {
    session: &'a Session,
    config: &'a Config,
    kind: ScanKind,
    stats: ScanStats,
    directories: DirectoryIndex,
    libraries: MediaLibraryIndex,
    discovered: Vec<DiscoveredFile>,
    scan_settings: ScanSettings,
}

impl<'a> ScanContext<'a> {
    pub fn new(session: &'a Session, config: &'a Config, kind: ScanKind) -> Self {
        let scan_settings = load_scan_settings(session).unwrap_or_default();
        Self {
            session,
            config,
            kind,
            stats: ScanStats::default(),
            directories: DirectoryIndex::new(),
            libraries: MediaLibraryIndex::new(),
            discovered: Vec::new(),
            scan_settings,
        }
    }

    pub fn session(&self) -> &'a Session {
        self.session
    }

    pub fn config(&self) -> &'a Config {
        self.config
    }

    pub fn kind(&self) -> ScanKind {
        self.kind
    }

    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut ScanStats {
        &mut self.stats
    }

    pub fn directories(&self) -> &DirectoryIndex {
        &self.directories
    }

    pub fn directories_mut(&mut self) -> &mut DirectoryIndex {
        &mut self.directories
    }

    pub fn libraries(&self) -> &MediaLibraryIndex {
        &self.libraries
    }

    pub fn libraries_mut(&mut self) -> &mut MediaLibraryIndex {
        &mut self.libraries
    }

    pub fn discovered(&self) -> &[DiscoveredFile] {
        &self.discovered
    }

    pub fn set_discovered(&mut self, discovered: Vec<DiscoveredFile>) {
        self.discovered = discovered;
    }

    pub fn scan_settings(&self) -> &ScanSettings {
        &self.scan_settings
    }

    pub fn save_scan_settings(&mut self, settings: &ScanSettings) -> Result<(), ScanError> {
        let tx = self.session.write()?;
        tx.execute(
            "UPDATE scan_settings SET last_scan_completed = ?1 WHERE id = 1",
            [settings.last_scan_completed.map(|dt| dt.timestamp_millis())],
        )?;
        tx.commit()?;
        self.scan_settings = settings.clone();
        Ok(())
    }
}

fn load_scan_settings(session: &Session) -> Option<ScanSettings> {
    let tx = session.read().ok()?;
    let result = tx
        .query_row(
            "SELECT audio_scan_version, artist_info_scan_version, last_scan_completed, \
             update_period_hours, daily_start_time_minutes FROM scan_settings WHERE id = 1",
            [],
            |row| {
                let last_scan_completed: Option<i64> = row.get(2)?;
                Ok(ScanSettings {
                    audio_scan_version: row.get(0)?,
                    artist_info_scan_version: row.get(1)?,
                    last_scan_completed: last_scan_completed
                        .and_then(|ms| chrono::DateTime::from_timestamp_millis(ms)),
                    update_period_hours: row.get(3)?,
                    daily_start_time_minutes: row.get(4)?,
                })
            },
        )
        .ok();
    let _ = tx.commit();
    result
}
