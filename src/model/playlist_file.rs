// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! The `PlayListFile` entity (§3), grounded on
//! `libs/database/include/database/objects/PlayListFile.hpp` and
//! `libs/database/impl/objects/PlayListFile.cpp`.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

use super::ids::{DirectoryId, MediaLibraryId, PlayListFileId, TrackListId};

/// An on-disk `.m3u`/`.m3u8` playlist file (§3 "PlayListFile").
///
/// `entries_json` stores the snapshot of referenced paths exactly as last parsed, opaquely
/// (matching the source's "entries" json-encoded column); [`PlayListFile::files`] is the lenient
/// accessor described by Open Question 2 in `DESIGN.md`.
#[derive(Debug, Clone)]
pub struct PlayListFile {
    /// Surrogate primary key.
    pub id: PlayListFileId,
    /// Absolute path on disk, unique.
    pub path: PathBuf,
    /// File size in bytes, as of the last scan.
    pub file_size: u64,
    /// File modification time, as of the last scan.
    pub file_last_modified: DateTime<Utc>,
    /// Display name (defaults to the file stem).
    pub name: String,
    /// Owning media library.
    pub media_library_id: MediaLibraryId,
    /// Containing directory.
    pub directory_id: DirectoryId,
    /// The `TrackList` this file projects to, created alongside it.
    pub track_list_id: TrackListId,
    /// JSON-encoded list of referenced absolute paths, exactly as last (successfully) parsed.
    pub entries_json: String,
}

impl PlayListFile {
    /// Parse [`Self::entries_json`] into the list of absolute paths it references.
    ///
    /// Lenient by design (Open Question 2): a malformed blob logs a warning and returns an empty
    /// list rather than treating the row as corrupt, so the row survives until the next scan
    /// re-derives `entries_json` from the file on disk.
    #[must_use]
    pub fn files(&self) -> Vec<PathBuf> {
        match serde_json::from_str::<Vec<String>>(&self.entries_json) {
            Ok(paths) => paths.into_iter().map(PathBuf::from).collect(),
            Err(err) => {
                log::warn!(
                    "playlist {}: could not parse entries as JSON: {err}",
                    self.path.display()
                );
                Vec::new()
            }
        }
    }

    /// Serialize a list of absolute paths the way [`Self::entries_json`] expects.
    #[must_use]
    pub fn encode_files(files: &[impl AsRef<Path>]) -> String {
        let as_strings: Vec<String> = files
            .iter()
            .map(|p| p.as_ref().to_string_lossy().into_owned())
            .collect();
        serde_json::to_string(&as_strings).unwrap_or_else(|_| "[]".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(entries_json: &str) -> PlayListFile {
        PlayListFile {
            id: PlayListFileId::new(1),
            path: PathBuf::from("/music/mix.m3u"),
            file_size: 0,
            file_last_modified: Utc::now(),
            name: "mix".to_string(),
            media_library_id: MediaLibraryId::new(1),
            directory_id: DirectoryId::new(1),
            track_list_id: TrackListId::new(1),
            entries_json: entries_json.to_string(),
        }
    }

    #[test]
    fn malformed_json_yields_empty_list() {
        let playlist = sample("not json");
        assert!(playlist.files().is_empty());
    }

    #[test]
    fn round_trips_through_encode_files() {
        let paths = [PathBuf::from("/music/a.flac"), PathBuf::from("/music/b.flac")];
        let encoded = PlayListFile::encode_files(&paths);
        let playlist = sample(&encoded);
        assert_eq!(playlist.files(), paths.to_vec());
    }
}
