// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! The play queue (§4.5 "`Queue[Track]`") and the anchor bookkeeping behind progress reporting.

use crate::model::Track;

/// One entry in the play queue: a track plus the metadata the player needs without going back to
/// the catalog (path and duration already live on [`Track`] itself).
pub type QueueEntry = Track;

/// An anchor recording, for one queue entry that has started playing, the sink write-time at
/// which it started and the in-track offset it started from. `getStatus`'s `currentPlayTime`
/// (§4.5 "Progress reporting") is computed by finding the anchor whose entry is currently being
/// read and adding the elapsed sink read-time since that anchor.
#[derive(Debug, Clone, Copy)]
pub struct Anchor {
    /// Index into the queue this anchor covers.
    pub entry_index: usize,
    /// In-track offset, in milliseconds, that playback started from for this entry.
    pub track_offset_ms: u64,
    /// The sink's write-time, in milliseconds, at the moment this entry started.
    pub audio_output_start_time_ms: u64,
}

/// The ordered list of tracks to play, the currently-selected entry, and the anchors needed to
/// map the sink's read pointer back to `(entry, offset)`.
#[derive(Debug, Default)]
pub struct Queue {
    entries: Vec<QueueEntry>,
    current: Option<usize>,
    anchors: Vec<Anchor>,
}

impl Queue {
    /// Build an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the queue contents. Clears the current selection and every anchor.
    pub fn set_entries(&mut self, entries: Vec<QueueEntry>) {
        self.entries = entries;
        self.current = None;
        self.anchors.clear();
    }

    /// Borrow the queue's entries.
    #[must_use]
    pub fn entries(&self) -> &[QueueEntry] {
        &self.entries
    }

    /// The currently selected entry index, if any.
    #[must_use]
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// The currently selected entry, if any.
    #[must_use]
    pub fn current_entry(&self) -> Option<&QueueEntry> {
        self.current.and_then(|i| self.entries.get(i))
    }

    /// Select `index` as current, recording a fresh anchor at `track_offset_ms` starting from
    /// sink write-time `audio_output_start_time_ms`. Returns `false` (and leaves the selection
    /// unchanged) if `index` is out of range.
    #[must_use]
    pub fn select(&mut self, index: usize, track_offset_ms: u64, audio_output_start_time_ms: u64) -> bool {
        if index >= self.entries.len() {
            return false;
        }
        self.current = Some(index);
        self.anchors.push(Anchor { entry_index: index, track_offset_ms, audio_output_start_time_ms });
        true
    }

    /// Select the next entry after the current one, anchoring it at offset `0` from
    /// `audio_output_start_time_ms`. Returns `false` if the queue is already at its last entry or
    /// empty.
    #[must_use]
    pub fn advance(&mut self, audio_output_start_time_ms: u64) -> bool {
        let next = match self.current {
            Some(i) => i + 1,
            None => 0,
        };
        self.select(next, 0, audio_output_start_time_ms)
    }

    /// Drop the current selection and every anchor, without touching the entries themselves
    /// (`stop()` keeps the queue, only clears playback position, per §4.5's state machine).
    pub fn clear_anchors(&mut self) {
        self.current = None;
        self.anchors.clear();
    }

    /// Given the sink's current read-time, find the anchor covering it and return
    /// `(entry_index, currentPlayTime)` per §4.5's `trackOffset + (readTime - audioOutputStartTime)`
    /// formula. Picks the most recent anchor whose start time is `<= read_time_ms`, so seeks/skips
    /// that pushed new anchors after older ones resolve correctly.
    #[must_use]
    pub fn resolve_play_time(&self, read_time_ms: u64) -> Option<(usize, u64)> {
        self.anchors
            .iter()
            .rev()
            .find(|anchor| anchor.audio_output_start_time_ms <= read_time_ms)
            .map(|anchor| {
                let elapsed = read_time_ms - anchor.audio_output_start_time_ms;
                (anchor.entry_index, anchor.track_offset_ms + elapsed)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::FakeTrack;

    fn sample_entries() -> Vec<QueueEntry> {
        vec![FakeTrack::new(1, "/a.flac").build(), FakeTrack::new(2, "/b.flac").build()]
    }

    #[test]
    fn select_out_of_range_index_fails() {
        let mut queue = Queue::new();
        queue.set_entries(sample_entries());
        assert!(!queue.select(5, 0, 0));
        assert_eq!(queue.current_index(), None);
    }

    #[test]
    fn advance_moves_from_none_to_first_entry() {
        let mut queue = Queue::new();
        queue.set_entries(sample_entries());
        assert!(queue.advance(1000));
        assert_eq!(queue.current_index(), Some(0));
        assert!(queue.advance(5000));
        assert_eq!(queue.current_index(), Some(1));
        assert!(!queue.advance(9000));
    }

    #[test]
    fn resolve_play_time_uses_most_recent_covering_anchor() {
        let mut queue = Queue::new();
        queue.set_entries(sample_entries());
        queue.select(0, 0, 1000);
        queue.select(1, 0, 5000);
        assert_eq!(queue.resolve_play_time(2000), Some((0, 1000)));
        assert_eq!(queue.resolve_play_time(6000), Some((1, 1000)));
    }

    #[test]
    fn clear_anchors_drops_selection_but_keeps_entries() {
        let mut queue = Queue::new();
        queue.set_entries(sample_entries());
        queue.select(0, 0, 0);
        queue.clear_anchors();
        assert_eq!(queue.current_index(), None);
        assert_eq!(queue.entries().len(), 2);
    }
}
