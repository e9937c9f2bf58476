// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! The `TrackLyrics` entity (§3): synchronized or unsynchronized lyrics, embedded in the audio
//! file's tags or living in an external sidecar file. Parsing is in
//! [`crate::scanner::lyrics`]; this module is just the persisted shape.

use std::path::PathBuf;

use super::ids::{TrackId, TrackLyricsId};

/// One synchronized line: a timestamp, in milliseconds from the start of playback, and the line
/// of text that begins there.
#[derive(Debug, Clone, PartialEq)]
pub struct SynchronizedLine {
    /// Offset from the start of the track, in milliseconds.
    pub timestamp_ms: i64,
    /// Line text (may be empty, e.g. an instrumental-break marker).
    pub text: String,
}

/// The body of a [`TrackLyrics`] row: either an ordered `(timestamp, line)` sequence, or a plain
/// ordered sequence of lines with no timing information.
#[derive(Debug, Clone, PartialEq)]
pub enum LyricsBody {
    /// LRC-style synchronized lyrics, ordered by timestamp.
    Synchronized(Vec<SynchronizedLine>),
    /// Plain lyrics with no timing information.
    Unsynchronized(Vec<String>),
}

impl LyricsBody {
    /// `true` if this is the [`LyricsBody::Synchronized`] variant.
    #[must_use]
    pub fn is_synchronized(&self) -> bool {
        matches!(self, Self::Synchronized(_))
    }
}

/// Synchronized or unsynchronized lyrics for a [`crate::model::Track`] (§3 "TrackLyrics").
#[derive(Debug, Clone)]
pub struct TrackLyrics {
    /// Surrogate primary key.
    pub id: TrackLyricsId,
    /// Owning track.
    pub track_id: TrackId,
    /// Absolute path of the external sidecar file. `None` for lyrics embedded in the audio file's
    /// own tags (invariant 8: "embedded" iff this is `None`).
    pub external_path: Option<PathBuf>,
    /// Lyrics body.
    pub body: LyricsBody,
    /// ISO 639-3 language code, if tagged/declared.
    pub language: Option<String>,
    /// Display artist, as declared by an `[ar: ...]` LRC tag (or the embedded tag equivalent).
    pub display_artist: Option<String>,
    /// Display album.
    pub display_album: Option<String>,
    /// Display title.
    pub display_title: Option<String>,
    /// Signed millisecond offset applied to every timestamp (LRC `[offset: ...]` tag).
    pub offset_ms: i64,
}

impl TrackLyrics {
    /// `true` iff this row is embedded (invariant 8).
    #[must_use]
    pub fn is_embedded(&self) -> bool {
        self.external_path.is_none()
    }
}
