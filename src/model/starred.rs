// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! `Starred{Artist,Release,Track}` favourites and their remote-feedback sync state (§3, invariant
//! 6).

use chrono::{DateTime, Utc};

use super::ids::{ArtistId, ReleaseId, TrackId, UserId};

/// Synchronisation state of a starred row against a remote feedback backend (invariant 6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Purely local; no remote backend configured (or the "Internal" backend).
    Unsynchronized,
    /// Queued to be pushed to the remote backend as a new favourite.
    PendingAdd,
    /// Queued to be pushed to the remote backend as a removal.
    PendingRemove,
    /// Acknowledged by the remote backend; may be re-synthesised from a remote fetch at any time.
    Synchronized,
}

/// The remote feedback backend a starred row is tracked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackBackend {
    /// No remote backend; purely local favourites.
    Internal,
    /// `ListenBrainz` feedback API.
    ListenBrainz,
}

/// A generic starred row shared by the three `Starred*` entities (§3); the `subject_id` varies by
/// entity as recorded in [`StarredArtist`]/[`StarredRelease`]/[`StarredTrack`].
#[derive(Debug, Clone, Copy)]
pub struct StarredCommon {
    /// Owning user.
    pub user_id: UserId,
    /// Remote backend this row is tracked against.
    pub backend: FeedbackBackend,
    /// When the user starred this item (locally).
    pub starred_at: DateTime<Utc>,
    /// Remote synchronisation state.
    pub sync_state: SyncState,
}

/// A user's favourite artist (§3 "StarredArtist").
#[derive(Debug, Clone, Copy)]
pub struct StarredArtist {
    /// Starred artist.
    pub artist_id: ArtistId,
    /// Shared starred-row fields.
    pub common: StarredCommon,
}

/// A user's favourite release (§3 "StarredRelease").
#[derive(Debug, Clone, Copy)]
pub struct StarredRelease {
    /// Starred release.
    pub release_id: ReleaseId,
    /// Shared starred-row fields.
    pub common: StarredCommon,
}

/// A user's favourite track (§3 "StarredTrack").
#[derive(Debug, Clone, Copy)]
pub struct StarredTrack {
    /// Starred track.
    pub track_id: TrackId,
    /// Shared starred-row fields.
    pub common: StarredCommon,
}
