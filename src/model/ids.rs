// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Strongly-typed entity IDs (§4.2 "ID type safety").
//!
//! Every entity gets its own ID newtype so that, say, a `TrackId` can never be passed where a
//! `ReleaseId` is expected, even though both wrap the same `i64` row id. Each type carries its own
//! "invalid" sentinel, distinguishable from any id SQLite will ever assign (`AUTOINCREMENT` row
//! ids start at 1).

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use std::fmt;

/// Declares a newtype wrapping `i64` for one entity's primary key, with an invalid sentinel and
/// the `rusqlite` conversions needed to bind/read it directly as a SQL column.
macro_rules! declare_id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(i64);

        impl $name {
            /// The sentinel "invalid" value, distinct from any row id SQLite will assign.
            pub const INVALID: Self = Self(-1);

            /// Wrap a raw row id.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// The raw row id.
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }

            /// `true` unless this is [`Self::INVALID`].
            #[must_use]
            pub const fn is_valid(self) -> bool {
                self.0 >= 0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.0))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value.as_i64().map(Self).map_err(FromSqlError::from)
            }
        }
    };
}

declare_id_type!(
    /// Identifies a [`crate::model::Track`].
    TrackId
);
declare_id_type!(
    /// Identifies a [`crate::model::Release`].
    ReleaseId
);
declare_id_type!(
    /// Identifies a [`crate::model::Artist`].
    ArtistId
);
declare_id_type!(
    /// Identifies a [`crate::model::ClusterType`].
    ClusterTypeId
);
declare_id_type!(
    /// Identifies a [`crate::model::Cluster`].
    ClusterId
);
declare_id_type!(
    /// Identifies a [`crate::model::Label`].
    LabelId
);
declare_id_type!(
    /// Identifies a [`crate::model::ReleaseType`].
    ReleaseTypeId
);
declare_id_type!(
    /// Identifies a [`crate::model::MediaLibrary`].
    MediaLibraryId
);
declare_id_type!(
    /// Identifies a [`crate::model::Directory`].
    DirectoryId
);
declare_id_type!(
    /// Identifies a [`crate::model::Image`].
    ImageId
);
declare_id_type!(
    /// Identifies a [`crate::model::TrackLyrics`].
    TrackLyricsId
);
declare_id_type!(
    /// Identifies a [`crate::model::PlayListFile`].
    PlayListFileId
);
declare_id_type!(
    /// Identifies a [`crate::model::TrackList`].
    TrackListId
);
declare_id_type!(
    /// Identifies a [`crate::model::TrackListEntry`].
    TrackListEntryId
);
declare_id_type!(
    /// Identifies a [`crate::model::User`].
    UserId
);
declare_id_type!(
    /// Identifies a [`crate::model::AuthToken`].
    AuthTokenId
);
declare_id_type!(
    /// Identifies a starred-artist row.
    StarredArtistId
);
declare_id_type!(
    /// Identifies a starred-release row.
    StarredReleaseId
);
declare_id_type!(
    /// Identifies a starred-track row.
    StarredTrackId
);
declare_id_type!(
    /// Identifies a [`crate::model::UiState`] row.
    UiStateId
);

/// A type-erased entity id, used only by [`crate::Error::NotFound`] to report which lookup
/// failed without needing one error variant per entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityId {
    /// A [`TrackId`].
    Track(TrackId),
    /// A [`ReleaseId`].
    Release(ReleaseId),
    /// An [`ArtistId`].
    Artist(ArtistId),
    /// A [`ClusterId`].
    Cluster(ClusterId),
    /// A [`TrackListId`].
    TrackList(TrackListId),
    /// A [`UserId`].
    User(UserId),
    /// A [`DirectoryId`].
    Directory(DirectoryId),
    /// A [`MediaLibraryId`].
    MediaLibrary(MediaLibraryId),
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Track(id) => write!(f, "{id}"),
            Self::Release(id) => write!(f, "{id}"),
            Self::Artist(id) => write!(f, "{id}"),
            Self::Cluster(id) => write!(f, "{id}"),
            Self::TrackList(id) => write!(f, "{id}"),
            Self::User(id) => write!(f, "{id}"),
            Self::Directory(id) => write!(f, "{id}"),
            Self::MediaLibrary(id) => write!(f, "{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_sentinel_is_distinguishable() {
        assert!(!TrackId::INVALID.is_valid());
        assert!(TrackId::new(1).is_valid());
        assert_ne!(TrackId::INVALID, TrackId::new(0));
    }

    #[test]
    fn distinct_id_types_do_not_compare() {
        let track = TrackId::new(1);
        let release = ReleaseId::new(1);
        // Different types entirely - this just documents that `track.get() == release.get()`
        // is legal (both wrap the same underlying row id space) while the types themselves are
        // never interchangeable at the type level.
        assert_eq!(track.get(), release.get());
    }
}
