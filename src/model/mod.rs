// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Entity model (§3): row types and their strongly-typed ids.
//!
//! Grounded on `libs/database/impl/objects/*.cpp` and `src/database/Track.cpp` /
//! `libs/database/impl/Track.cpp` for row shape; persistence (SQL mapping, typed queries) lives
//! in [`crate::db`] and [`crate::query`], not here — this module is deliberately storage-agnostic.

mod artist;
mod auth_token;
mod cluster;
mod image;
pub mod ids;
mod lyrics;
mod media_library;
mod playlist_file;
mod release;
mod scan_settings;
mod starred;
mod track;
mod tracklist;
mod ui_state;
mod user;

pub use artist::Artist;
pub use auth_token::{AuthToken, TokenOutcome};
pub use cluster::{Cluster, ClusterType};
pub use image::Image;
pub use lyrics::{LyricsBody, SynchronizedLine, TrackLyrics};
pub use media_library::{Directory, MediaLibrary};
pub use playlist_file::PlayListFile;
pub use release::{Label, Release, ReleaseType};
pub use scan_settings::ScanSettings;
pub use starred::{FeedbackBackend, StarredArtist, StarredCommon, StarredRelease, StarredTrack, SyncState};
pub use track::{ArtistLinkType, ReplayGain, Track, TrackArtistLink};
pub use tracklist::{TrackList, TrackListEntry, TrackListType, TrackListVisibility};
pub use ui_state::UiState;
pub use user::{ArtistListMode, SubsonicPreferences, SubsonicTranscodeMode, User, UserType};
