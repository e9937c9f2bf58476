// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! The `TrackList`/`TrackListEntry` entities (§3), grounded on
//! `libs/database/impl/objects/TrackList.cpp`.

use chrono::{DateTime, Utc};

use super::ids::{TrackId, TrackListEntryId, TrackListId, UserId};

/// The kind of an owner-scoped track sequence (§3 "TrackList").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackListType {
    /// A user-created, user-named playlist.
    Playlist,
    /// A playlist materialised from an on-disk `PlayListFile`.
    Internal,
    /// The user's scrobble/play history (`TrackListEntry::played_at` is set on every entry).
    PlayedTracks,
    /// The user's favourites list.
    Favorites,
    /// The user's "now playing" queue.
    Queue,
}

/// Whether a [`TrackList`] is visible to users other than its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackListVisibility {
    /// Visible only to the owner.
    Private,
    /// Visible to every user.
    Public,
}

/// An ordered, owner-scoped sequence of tracks (§3 "TrackList").
///
/// `name` is unique per `(owner, list_type)` (invariant implied by §3's definition); entry order
/// is insertion order unless an explicit reorder has been performed (invariant 7).
#[derive(Debug, Clone)]
pub struct TrackList {
    /// Surrogate primary key.
    pub id: TrackListId,
    /// Display name, unique per `(owner_id, list_type)`.
    pub name: String,
    /// List kind.
    pub list_type: TrackListType,
    /// Visibility.
    pub visibility: TrackListVisibility,
    /// Owning user.
    pub owner_id: UserId,
    /// Creation time.
    pub created: DateTime<Utc>,
    /// Last time an entry was inserted, removed, or reordered (invariant 7: monotonically
    /// increasing).
    pub last_modified: DateTime<Utc>,
}

/// One entry in a [`TrackList`]. Position is implicit: entries are returned ordered by insertion
/// (`id`) unless an explicit reorder has renumbered them.
#[derive(Debug, Clone)]
pub struct TrackListEntry {
    /// Surrogate primary key; also the implicit position within the owning list.
    pub id: TrackListEntryId,
    /// Owning list.
    pub track_list_id: TrackListId,
    /// Referenced track.
    pub track_id: TrackId,
    /// For `PlayedTracks` lists, when this play was scrobbled. `None` for ordinary playlist
    /// entries.
    pub played_at: Option<DateTime<Utc>>,
}
