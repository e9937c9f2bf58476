// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! The local player (§4.5): `Queue[Track] -> Transcoder (pulling) -> RingBuffer[bytes] -> Sink`,
//! grounded on `libs/localplayer/impl/LocalPlayer.hpp` and the `ILocalPlayer`/`IAudioOutput`
//! interfaces.
//!
//! The player serialises every state transition on a single mutex standing in for the C++
//! original's single-threaded strand (§5 "one cooperative strand per subsystem that has ordering
//! guarantees"): every public method here takes that lock for its whole body, so callers never
//! observe a transition half-applied. Sink callbacks (`onCanWrite`) are expected to call back
//! into [`LocalPlayer::on_can_write`], which takes the same lock.

mod queue;
mod ring_buffer;
mod sink;
mod transcoder;

use std::sync::Mutex;

use thiserror::Error;

use crate::model::ids::TrackId;
use crate::model::Track;

pub use queue::{Anchor, Queue, QueueEntry};
pub use ring_buffer::RingBuffer;
pub use sink::{CanWriteCallback, SampleFormat, Sink, StreamSpec};
#[cfg(feature = "pulseaudio")]
pub use sink::PulseSink;
pub use sink::NullSink;
pub use transcoder::Transcoder;

/// Errors raised by the local player, its transcoder, and its sink.
#[derive(Error, Debug)]
pub enum PlayerError {
    /// The sink could not be constructed or connected.
    #[error("audio sink could not be initialised")]
    SinkInitFailed,
    /// A write was attempted while the sink wasn't running.
    #[error("audio sink is not running")]
    SinkNotRunning,
    /// The sink rejected a write.
    #[error("audio sink write failed")]
    SinkWriteFailed,
    /// Decoding a queue entry failed; non-fatal, the player advances past it (§7
    /// "`TranscodeFailed(trackId, cause)`: advance to next queue entry").
    #[error("failed to decode track {track_id}: {cause}")]
    TranscodeFailed {
        /// The track whose decode failed.
        track_id: TrackId,
        /// Human-readable cause.
        cause: String,
    },
    /// A transport command referenced a queue entry index that doesn't exist.
    #[error("queue entry index {0} is out of range")]
    InvalidEntryIndex(usize),
    /// `play()` was called on an empty queue.
    #[error("play queue is empty")]
    QueueEmpty,
}

/// The player's transport state (§4.5 "State machine").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
    /// No sink connected, no transcoder alive.
    Stopped,
    /// Sink connected and being fed from the current queue entry's transcoder.
    Playing,
    /// Sink connected but not being pulled from; playback is frozen.
    Paused,
}

/// A snapshot of the player's transport state (§4.5 "Progress reporting", §6 `getStatus()`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerStatus {
    /// Current transport state.
    pub play_state: PlayState,
    /// The queue entry currently playing, if any.
    pub entry_index: Option<usize>,
    /// Elapsed playback position within `entry_index`, in milliseconds.
    pub current_play_time_ms: Option<u64>,
}

/// How many bytes of decoded PCM the feed loop tries to keep buffered ahead of the sink. Not
/// operator-configurable; it only bounds how much CPU a single `onCanWrite` burst can spend
/// decoding ahead before yielding back to the caller.
const FEED_CHUNK_BYTES: usize = 64 * 1024;

/// Mutable transport state, held behind the player's strand-standin mutex.
struct State {
    play_state: PlayState,
    queue: Queue,
    transcoder: Option<Transcoder>,
    ring: RingBuffer,
}

impl State {
    fn new() -> Self {
        Self {
            play_state: PlayState::Stopped,
            queue: Queue::new(),
            transcoder: None,
            ring: RingBuffer::new(FEED_CHUNK_BYTES * 4),
        }
    }
}

/// Drives a single [`Sink`] from a [`Queue`] of tracks.
///
/// Generic over the sink implementation so tests (and operators without a PulseAudio server) can
/// plug in [`NullSink`] instead of [`PulseSink`].
pub struct LocalPlayer<S: Sink> {
    sink: Mutex<S>,
    state: Mutex<State>,
}

impl<S: Sink> LocalPlayer<S> {
    /// Wrap `sink` in a fresh, stopped player with an empty queue.
    pub fn new(sink: S) -> Self {
        Self { sink: Mutex::new(sink), state: Mutex::new(State::new()) }
    }

    /// Replace the play queue. Implicitly stops playback if one was in progress, mirroring
    /// `ILocalPlayer::setQueue`'s "replace everything" semantics (§6 `setQueue(tracks[])`).
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex was poisoned by a prior panic.
    pub fn set_queue(&self, tracks: Vec<Track>) {
        self.stop_locked();
        let mut state = self.state.lock().expect("player state poisoned");
        state.queue.set_entries(tracks);
    }

    /// Start (or restart) playback.
    ///
    /// From `Stopped`: starts the sink, selects `entry_index` (defaulting to the first entry),
    /// constructs a transcoder at `offset_ms`, anchors it, and enters `Playing`.
    ///
    /// From `Playing`/`Paused` with an explicit `entry_index`: flushes the sink, seeks the write
    /// pointer to the sink's current read-time, re-anchors at the new entry/offset, and resumes
    /// `Playing` (§4.5 "From `Playing` with an explicit `entryIndex` and `immediate=true`").
    ///
    /// # Errors
    ///
    /// Returns [`PlayerError::QueueEmpty`] if the queue has no entries, or
    /// [`PlayerError::InvalidEntryIndex`] if `entry_index` is out of range.
    pub fn play(&self, entry_index: Option<usize>, offset_ms: u64) -> Result<(), PlayerError> {
        let mut state = self.state.lock().expect("player state poisoned");
        if state.queue.entries().is_empty() {
            return Err(PlayerError::QueueEmpty);
        }
        let index = entry_index.or(state.queue.current_index()).unwrap_or(0);
        if index >= state.queue.entries().len() {
            return Err(PlayerError::InvalidEntryIndex(index));
        }

        let mut sink = self.sink.lock().expect("sink poisoned");
        match state.play_state {
            PlayState::Stopped => {
                sink.start()?;
            }
            PlayState::Playing | PlayState::Paused => {
                sink.flush()?;
            }
        }
        let anchor_time = sink.current_write_time_ms();
        drop(sink);

        if !state.queue.select(index, offset_ms, anchor_time) {
            return Err(PlayerError::InvalidEntryIndex(index));
        }
        state.ring.clear();
        let track_id = state.queue.entries()[index].id;
        let path = state.queue.entries()[index].path.clone();
        state.transcoder = Some(Transcoder::new(track_id, &path, offset_ms)?);
        state.play_state = PlayState::Playing;
        Ok(())
    }

    /// Pause playback: the sink keeps running, but the feed loop stops pulling from the
    /// transcoder (§4.5 "`pause()` from `Playing`").
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex was poisoned by a prior panic.
    pub fn pause(&self) {
        let mut state = self.state.lock().expect("player state poisoned");
        if state.play_state == PlayState::Playing {
            state.play_state = PlayState::Paused;
        }
    }

    /// Resume playback from `Paused`, without touching the current anchor.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex was poisoned by a prior panic.
    pub fn resume(&self) {
        let mut state = self.state.lock().expect("player state poisoned");
        if state.play_state == PlayState::Paused {
            state.play_state = PlayState::Playing;
        }
    }

    /// Seek within the current entry: equivalent to `play(current_entry, offset_ms)`.
    ///
    /// # Errors
    ///
    /// Returns [`PlayerError::QueueEmpty`] if nothing is selected yet.
    pub fn seek(&self, offset_ms: u64) -> Result<(), PlayerError> {
        let current = {
            let state = self.state.lock().expect("player state poisoned");
            state.queue.current_index()
        };
        self.play(current, offset_ms)
    }

    /// Destroy the transcoder, stop the sink, clear anchors, and return to `Stopped` (§4.5
    /// "`stop()`"). The queue's entries are preserved; only playback position is reset.
    pub fn stop(&self) {
        self.stop_locked();
    }

    fn stop_locked(&self) {
        let mut state = self.state.lock().expect("player state poisoned");
        if state.play_state == PlayState::Stopped {
            return;
        }
        state.transcoder = None;
        state.ring.clear();
        state.queue.clear_anchors();
        state.play_state = PlayState::Stopped;
        drop(state);
        let _ = self.sink.lock().expect("sink poisoned").stop();
    }

    /// Current transport status (§4.5 "Progress reporting").
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex was poisoned by a prior panic.
    #[must_use]
    pub fn status(&self) -> PlayerStatus {
        let state = self.state.lock().expect("player state poisoned");
        if state.play_state == PlayState::Stopped {
            return PlayerStatus { play_state: state.play_state, entry_index: None, current_play_time_ms: None };
        }
        let read_time = self.sink.lock().expect("sink poisoned").current_read_time_ms();
        let resolved = state.queue.resolve_play_time(read_time);
        PlayerStatus {
            play_state: state.play_state,
            entry_index: resolved.map(|(index, _)| index),
            current_play_time_ms: resolved.map(|(_, time)| time),
        }
    }

    /// The sink's `onCanWrite(n)` handler (§4.5): pull up to `n` frame-aligned bytes from the
    /// transcoder and hand them to the sink. If the transcoder is at EOF, advances to the next
    /// queue entry (or stops, if none remain) and continues feeding from the new source.
    ///
    /// Callers are expected to register this (via [`Sink::set_on_can_write_callback`]) so it runs
    /// on the sink's mainloop thread; it takes the player's own lock internally, which is safe
    /// because the sink methods it calls are themselves lock-reentrant-safe per the `Sink`
    /// contract's "callbacks invoked on that very thread must not relock" rule -- this handler
    /// only calls back into the *player's* mutex, never the sink's mainloop lock.
    ///
    /// # Errors
    ///
    /// Returns [`PlayerError`] if decoding or writing fails; the player transitions to `Stopped`
    /// before propagating (§4.5 "Cancellation / backpressure").
    pub fn on_can_write(&self, writable_bytes: usize) -> Result<(), PlayerError> {
        let mut state = self.state.lock().expect("player state poisoned");
        if state.play_state != PlayState::Playing {
            return Ok(());
        }

        let frame_size = self.sink.lock().expect("sink poisoned").spec().frame_size().max(1);
        let mut remaining = writable_bytes - (writable_bytes % frame_size);
        while remaining > 0 {
            if state.ring.is_empty() {
                match self.pull_into_ring(&mut state)? {
                    PullOutcome::Filled => {}
                    PullOutcome::AdvancedToNextEntry => continue,
                    PullOutcome::QueueExhausted => break,
                }
            }
            if state.ring.is_empty() {
                break;
            }
            let take = remaining.min(state.ring.len());
            let take = take - (take % frame_size);
            if take == 0 {
                break;
            }
            let chunk = state.ring.pop(take);
            let mut sink = self.sink.lock().expect("sink poisoned");
            let written = match sink.write(&chunk, None) {
                Ok(n) => n,
                Err(err) => {
                    drop(sink);
                    drop(state);
                    self.stop();
                    return Err(err);
                }
            };
            drop(sink);
            remaining = remaining.saturating_sub(written);
        }
        Ok(())
    }

    /// Decode up to `FEED_CHUNK_BYTES` from the current transcoder into the ring buffer, handling
    /// end-of-entry by advancing the queue.
    fn pull_into_ring(&self, state: &mut State) -> Result<PullOutcome, PlayerError> {
        let Some(transcoder) = state.transcoder.as_mut() else {
            return Ok(PullOutcome::QueueExhausted);
        };

        let mut buf = vec![0u8; FEED_CHUNK_BYTES];
        let n = transcoder.read_some(&mut buf)?;
        if n > 0 {
            state.ring.push(&buf[..n]);
            return Ok(PullOutcome::Filled);
        }

        if !transcoder.is_eof() {
            return Ok(PullOutcome::Filled);
        }

        let write_time = self.sink.lock().expect("sink poisoned").current_write_time_ms();
        if state.queue.advance(write_time) {
            let index = state.queue.current_index().expect("just advanced");
            let track_id = state.queue.entries()[index].id;
            let path = state.queue.entries()[index].path.clone();
            state.transcoder = Some(Transcoder::new(track_id, &path, 0)?);
            Ok(PullOutcome::AdvancedToNextEntry)
        } else {
            state.transcoder = None;
            Ok(PullOutcome::QueueExhausted)
        }
    }

    /// Synchronous poll, mirroring `Sink::can_write_bytes`, used by callers driving the feed loop
    /// without a callback-based sink (e.g. [`NullSink`] in tests).
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex was poisoned by a prior panic.
    #[must_use]
    pub fn can_write_bytes(&self) -> usize {
        self.sink.lock().expect("sink poisoned").can_write_bytes()
    }
}

/// Outcome of one attempt to keep the ring buffer fed from the current transcoder.
enum PullOutcome {
    /// The ring buffer now has data in it.
    Filled,
    /// The previous entry hit EOF and a new transcoder was started for the next one.
    AdvancedToNextEntry,
    /// There is no more queue to play.
    QueueExhausted,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::FakeTrack;

    fn player_with_queue() -> LocalPlayer<NullSink> {
        let player = LocalPlayer::new(NullSink::default());
        player.set_queue(vec![FakeTrack::new(1, "/nonexistent/a.flac").build()]);
        player
    }

    #[test]
    fn play_on_empty_queue_fails() {
        let player = LocalPlayer::new(NullSink::default());
        assert!(matches!(player.play(None, 0), Err(PlayerError::QueueEmpty)));
    }

    #[test]
    fn play_with_missing_file_surfaces_transcode_error() {
        let player = player_with_queue();
        assert!(matches!(player.play(None, 0), Err(PlayerError::TranscodeFailed { .. })));
    }

    #[test]
    fn status_is_stopped_before_any_play_call() {
        let player: LocalPlayer<NullSink> = LocalPlayer::new(NullSink::default());
        let status = player.status();
        assert_eq!(status.play_state, PlayState::Stopped);
        assert_eq!(status.entry_index, None);
    }

    #[test]
    fn pause_only_applies_while_playing() {
        let player: LocalPlayer<NullSink> = LocalPlayer::new(NullSink::default());
        player.pause();
        assert_eq!(player.status().play_state, PlayState::Stopped);
    }
}
