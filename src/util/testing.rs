// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

#![cfg(any(test, feature = "dev"))]
//! Builders for fixture entities, used by this crate's own tests and by `dev`-feature
//! consumers exercising the scanner/recommender/player against an in-memory catalog without a
//! real scan.

use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::model::ids::{ArtistId, DirectoryId, MediaLibraryId, ReleaseId, TrackId};
use crate::model::{Artist, ArtistLinkType, Release, ReplayGain, Track, TrackArtistLink};

/// Builds a fixture [`Artist`], with every field besides `id`/`name` defaulted.
#[derive(Debug, Clone)]
pub struct FakeArtist {
    id: ArtistId,
    name: String,
    sort_name: Option<String>,
    mbid: Option<String>,
}

impl FakeArtist {
    /// Start a builder for an artist with the given id and display name.
    #[must_use]
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id: ArtistId::new(id),
            name: name.into(),
            sort_name: None,
            mbid: None,
        }
    }

    /// Set the sort name. Defaults to the display name if unset.
    #[must_use]
    pub fn with_sort_name(mut self, sort_name: impl Into<String>) -> Self {
        self.sort_name = Some(sort_name.into());
        self
    }

    /// Set the MusicBrainz artist id.
    #[must_use]
    pub fn with_mbid(mut self, mbid: impl Into<String>) -> Self {
        self.mbid = Some(mbid.into());
        self
    }

    /// Build the [`Artist`].
    #[must_use]
    pub fn build(self) -> Artist {
        Artist {
            id: self.id,
            sort_name: self.sort_name.unwrap_or_else(|| self.name.clone()),
            name: self.name,
            mbid: self.mbid,
            biography: None,
            image_id: None,
        }
    }
}

/// Builds a fixture [`Release`], with every field besides `id`/`name` defaulted.
#[derive(Debug, Clone)]
pub struct FakeRelease {
    id: ReleaseId,
    name: String,
    year: Option<i32>,
    mbid: Option<String>,
}

impl FakeRelease {
    /// Start a builder for a release with the given id and display name.
    #[must_use]
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id: ReleaseId::new(id),
            name: name.into(),
            year: None,
            mbid: None,
        }
    }

    /// Set the release year (also used as `original_year`).
    #[must_use]
    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    /// Set the MusicBrainz release-group id.
    #[must_use]
    pub fn with_mbid(mut self, mbid: impl Into<String>) -> Self {
        self.mbid = Some(mbid.into());
        self
    }

    /// Build the [`Release`].
    #[must_use]
    pub fn build(self) -> Release {
        Release {
            id: self.id,
            sort_name: self.name.clone(),
            name: self.name,
            mbid: self.mbid,
            year: self.year,
            original_year: self.year,
            total_discs: None,
            release_types: Vec::new(),
            labels: Vec::new(),
            cover_image_id: None,
        }
    }
}

/// Builds a fixture [`Track`], with every field besides `id`/`path` defaulted.
///
/// Defaults to a three-minute track with no release, no artists and no fingerprint, so a test
/// only has to override whatever it actually exercises.
#[derive(Debug, Clone)]
pub struct FakeTrack {
    id: TrackId,
    path: PathBuf,
    duration_ms: u64,
    release_id: Option<ReleaseId>,
    media_library_id: MediaLibraryId,
    directory_id: DirectoryId,
    artists: Vec<TrackArtistLink>,
    acoustic_fingerprint: Option<String>,
    mbid_recording: Option<String>,
}

/// A default track duration: three minutes.
const DEFAULT_DURATION_MS: u64 = 180_000;

impl FakeTrack {
    /// Start a builder for a track with the given id and path.
    #[must_use]
    pub fn new(id: i64, path: impl AsRef<Path>) -> Self {
        Self {
            id: TrackId::new(id),
            path: path.as_ref().to_path_buf(),
            duration_ms: DEFAULT_DURATION_MS,
            release_id: None,
            media_library_id: MediaLibraryId::new(1),
            directory_id: DirectoryId::new(1),
            artists: Vec::new(),
            acoustic_fingerprint: None,
            mbid_recording: None,
        }
    }

    /// Set the playback duration.
    #[must_use]
    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    /// Set the owning release.
    #[must_use]
    pub fn with_release(mut self, release_id: ReleaseId) -> Self {
        self.release_id = Some(release_id);
        self
    }

    /// Add a track-artist link with [`ArtistLinkType::Artist`].
    #[must_use]
    pub fn with_artist(mut self, artist_id: ArtistId) -> Self {
        self.artists.push(TrackArtistLink {
            artist_id,
            link_type: ArtistLinkType::Artist,
            sub_type: None,
        });
        self
    }

    /// Set the chromaprint acoustic fingerprint, consumed as a SOM input feature by the
    /// recommender.
    #[must_use]
    pub fn with_acoustic_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.acoustic_fingerprint = Some(fingerprint.into());
        self
    }

    /// Set the MusicBrainz recording id, used by the `skipDuplicateTrackMBID` dedup key.
    #[must_use]
    pub fn with_mbid_recording(mut self, mbid: impl Into<String>) -> Self {
        self.mbid_recording = Some(mbid.into());
        self
    }

    /// Build the [`Track`].
    #[must_use]
    pub fn build(self) -> Track {
        let now = Utc::now();
        Track {
            id: self.id,
            path: self.path,
            file_size: 0,
            file_last_modified: now,
            scan_imported_time: now,
            scan_version: 1,
            duration_ms: self.duration_ms,
            track_number: None,
            total_tracks: None,
            disc_number: None,
            total_discs: None,
            release_date: None,
            original_release_date: None,
            mbid_recording: self.mbid_recording,
            mbid_release: None,
            mbid_track: None,
            replay_gain_track: ReplayGain::default(),
            replay_gain_release: ReplayGain::default(),
            copyright: None,
            copyright_url: None,
            encoding: None,
            bits_per_sample: None,
            channels: None,
            sample_rate: None,
            release_id: self.release_id,
            media_library_id: self.media_library_id,
            directory_id: self.directory_id,
            artists: self.artists,
            acoustic_fingerprint: self.acoustic_fingerprint,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_artist_defaults_sort_name_to_name() {
        let artist = FakeArtist::new(1, "Boards of Canada").build();
        assert_eq!(artist.sort_name, "Boards of Canada");
    }

    #[test]
    fn fake_release_carries_year_into_original_year() {
        let release = FakeRelease::new(1, "Music Has the Right to Children").with_year(1998).build();
        assert_eq!(release.year, Some(1998));
        assert_eq!(release.original_year, Some(1998));
    }

    #[test]
    fn fake_track_builder_links_artist_and_release() {
        let release = ReleaseId::new(7);
        let artist = ArtistId::new(3);
        let track = FakeTrack::new(1, "/music/a.flac")
            .with_release(release)
            .with_artist(artist)
            .with_duration_ms(210_000)
            .build();
        assert_eq!(track.release_id, Some(release));
        assert_eq!(track.artists.len(), 1);
        assert_eq!(track.artists[0].artist_id, artist);
        assert_eq!(track.duration_ms, 210_000);
    }
}
