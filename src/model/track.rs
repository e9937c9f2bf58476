// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! The `Track` entity (§3), grounded on `src/database/Track.cpp` / `libs/database/impl/Track.cpp`.

use chrono::{DateTime, Utc};
use std::path::PathBuf;

use super::ids::{ArtistId, DirectoryId, MediaLibraryId, ReleaseId, TrackId};

/// The role an [`Artist`](super::Artist) plays on a [`Track`], mirroring the link-type taxonomy
/// implied by §3's "zero-or-more Artist links (each tagged with a role)".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtistLinkType {
    /// Primary track artist.
    Artist,
    /// Release-level artist (credited via the track's release).
    ReleaseArtist,
    /// Composer.
    Composer,
    /// Conductor.
    Conductor,
    /// Lyricist.
    Lyricist,
    /// Mixer.
    Mixer,
    /// Performer, with an optional instrument/role sub-description (e.g. "vocals").
    Performer,
    /// Producer.
    Producer,
    /// Remixer.
    Remixer,
    /// Writer.
    Writer,
}

/// One `(Artist, role)` link on a [`Track`].
#[derive(Debug, Clone)]
pub struct TrackArtistLink {
    /// The linked artist.
    pub artist_id: ArtistId,
    /// The role under which the artist is linked.
    pub link_type: ArtistLinkType,
    /// For [`ArtistLinkType::Performer`], the sub-description ("vocals", "guitar", ...).
    pub sub_type: Option<String>,
}

/// ReplayGain values (dB / linear peak), optionally present per-track and per-release.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReplayGain {
    /// Gain adjustment in dB.
    pub gain: Option<f64>,
    /// Peak sample value (0.0-1.0 linear scale).
    pub peak: Option<f64>,
}

/// A playable audio file (§3 "Track").
#[derive(Debug, Clone)]
pub struct Track {
    /// Surrogate primary key.
    pub id: TrackId,
    /// Absolute path on disk; unique, used as the natural key alongside `id`.
    pub path: PathBuf,
    /// File size in bytes, as of the last scan that touched this row.
    pub file_size: u64,
    /// File modification time, as of the last scan that touched this row.
    pub file_last_modified: DateTime<Utc>,
    /// When this row was first created by a scan.
    pub scan_imported_time: DateTime<Utc>,
    /// Schema/content version this row was scanned under (§4.3 `ScanFiles`'s `scan-version`
    /// comparison key).
    pub scan_version: u32,
    /// Playback duration.
    pub duration_ms: u64,
    /// Track number on its disc, if known.
    pub track_number: Option<u32>,
    /// Total tracks on its disc, if known.
    pub total_tracks: Option<u32>,
    /// Disc number within the release, if known.
    pub disc_number: Option<u32>,
    /// Total discs in the release, if known (denormalised convenience copy of
    /// `Release::total_discs` at scan time).
    pub total_discs: Option<u32>,
    /// Release date, if known.
    pub release_date: Option<DateTime<Utc>>,
    /// Original release date, if known (may predate `release_date` for reissues).
    pub original_release_date: Option<DateTime<Utc>>,
    /// MusicBrainz recording id.
    pub mbid_recording: Option<String>,
    /// MusicBrainz release id (denormalised from the owning release).
    pub mbid_release: Option<String>,
    /// MusicBrainz track id (distinct from the recording id: identifies this specific track's
    /// position on a specific release).
    pub mbid_track: Option<String>,
    /// Track-level ReplayGain.
    pub replay_gain_track: ReplayGain,
    /// Release-level ReplayGain (denormalised copy, used so track playback doesn't need a join).
    pub replay_gain_release: ReplayGain,
    /// Copyright notice, if tagged.
    pub copyright: Option<String>,
    /// Copyright URL, if tagged.
    pub copyright_url: Option<String>,
    /// Codec/container hint (e.g. "flac", "mp3").
    pub encoding: Option<String>,
    /// Bits per sample, if known.
    pub bits_per_sample: Option<u8>,
    /// Channel count, if known.
    pub channels: Option<u8>,
    /// Sample rate in Hz, if known.
    pub sample_rate: Option<u32>,
    /// Owning release, if any (a track with no release metadata has `None`).
    pub release_id: Option<ReleaseId>,
    /// Media library this track belongs to.
    pub media_library_id: MediaLibraryId,
    /// Containing directory.
    pub directory_id: DirectoryId,
    /// `(Artist, role)` links, in tag order.
    pub artists: Vec<TrackArtistLink>,
    /// Chromaprint acoustic fingerprint, base64 or raw-encoded as produced by
    /// [`crate::analyzer`], used as the SOM input feature and for duplicate detection.
    pub acoustic_fingerprint: Option<String>,
}

impl Track {
    /// `true` if this track's MusicBrainz recording id is present, usable as the
    /// `skipDuplicateTrackMBID` dedup key (§4.3 `ScanFiles`).
    #[must_use]
    pub fn has_mbid_recording(&self) -> bool {
        self.mbid_recording.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replay_gain_defaults_to_absent() {
        let gain = ReplayGain::default();
        assert_eq!(gain.gain, None);
        assert_eq!(gain.peak, None);
    }
}
