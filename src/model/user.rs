// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! The `User` entity (§3). Authentication backends and UI theming are out of scope; this module
//! holds only the catalog-consumer state the core persists and cascades on deletion.

use chrono::{DateTime, Utc};

use super::ids::{TrackListId, UserId};

/// A catalog consumer's privilege level (§3 "User").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserType {
    /// Full administrative access.
    Admin,
    /// Ordinary catalog consumer.
    Regular,
    /// Read-only demo account.
    Demo,
}

/// How the Subsonic API should transcode for a user, by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubsonicTranscodeMode {
    /// Never transcode; serve the original file.
    Never,
    /// Transcode only formats the client cannot play natively.
    WhenNeeded,
    /// Always transcode to the configured target format/bitrate.
    Always,
}

/// Per-user Subsonic transcode preferences (§3 "per-user preferences").
#[derive(Debug, Clone)]
pub struct SubsonicPreferences {
    /// When to transcode.
    pub mode: SubsonicTranscodeMode,
    /// Target output format (e.g. `"opus"`, `"mp3"`).
    pub format: String,
    /// Target bitrate, in kbps.
    pub bitrate_kbps: u32,
}

impl Default for SubsonicPreferences {
    fn default() -> Self {
        Self {
            mode: SubsonicTranscodeMode::WhenNeeded,
            format: "opus".to_string(),
            bitrate_kbps: 128,
        }
    }
}

/// How the "browse by artist" list is built for a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtistListMode {
    /// One row per artist that has any release.
    AllArtists,
    /// One row per release artist only.
    ReleaseArtistsOnly,
    /// One row per artist that has a dedicated MusicBrainz id.
    MusicBrainzArtistsOnly,
}

/// Catalog consumer (§3 "User").
#[derive(Debug, Clone)]
pub struct User {
    /// Surrogate primary key.
    pub id: UserId,
    /// Login name, unique.
    pub login_name: String,
    /// Privilege level.
    pub user_type: UserType,
    /// PBKDF2/argon2-style password hash, `None` for users authenticated by another backend
    /// (auth token / HTTP header / env).
    pub password_hash: Option<String>,
    /// Salt paired with `password_hash`.
    pub password_salt: Option<String>,
    /// Last successful login.
    pub last_login: Option<DateTime<Utc>>,
    /// Subsonic transcode preferences.
    pub subsonic_preferences: SubsonicPreferences,
    /// Artist-list browsing mode.
    pub artist_list_mode: ArtistListMode,
    /// UI theme name.
    pub ui_theme: String,
    /// This user's `PlayedTracks` track list (§3).
    pub played_tracks_list_id: TrackListId,
    /// This user's "current queue" track list (§3).
    pub queue_list_id: TrackListId,
}
