// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! The audio sink abstraction (§4.5 "Sink"), grounded on
//! `libs/localplayer/include/localplayer/IAudioOutput.hpp`.
//!
//! The catalog ships a single real implementation, [`PulseSink`] (feature `pulseaudio`), plus
//! [`NullSink`] for headless tests and for operators running without a PulseAudio server.

use super::PlayerError;

/// PCM format the sink accepts. Only `S16LE` is implemented; the enum exists so call sites read
/// the way §6's "PCM S16LE, 44.1 kHz, stereo" external-interface note does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    /// 16-bit signed little-endian PCM.
    S16Le,
}

/// Fixed stream parameters (§6 "Audio sink (PulseAudio)").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSpec {
    /// Sample format.
    pub format: SampleFormat,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u8,
}

impl StreamSpec {
    /// Bytes per sample for this spec's format.
    #[must_use]
    pub fn bytes_per_sample(&self) -> usize {
        match self.format {
            SampleFormat::S16Le => 2,
        }
    }

    /// Bytes per frame (one sample per channel).
    #[must_use]
    pub fn frame_size(&self) -> usize {
        self.bytes_per_sample() * self.channels as usize
    }

    /// Largest frame-aligned length `<= len`.
    #[must_use]
    pub fn frame_align(&self, len: usize) -> usize {
        len - (len % self.frame_size())
    }

    /// Convert a byte offset into this stream into milliseconds from stream start.
    #[must_use]
    pub fn bytes_to_ms(&self, bytes: u64) -> u64 {
        let frames = bytes / self.frame_size() as u64;
        frames * 1000 / u64::from(self.sample_rate)
    }

    /// Convert milliseconds from stream start into a byte offset, frame-aligned.
    #[must_use]
    pub fn ms_to_bytes(&self, ms: u64) -> u64 {
        let frames = ms * u64::from(self.sample_rate) / 1000;
        frames * self.frame_size() as u64
    }
}

impl Default for StreamSpec {
    /// `S16LE`, 44.1 kHz, stereo (§6).
    fn default() -> Self {
        Self { format: SampleFormat::S16Le, sample_rate: 44100, channels: 2 }
    }
}

/// Callback invoked on the sink's mainloop thread whenever the sink can accept more bytes. The
/// argument is the number of bytes currently writable.
pub type CanWriteCallback = Box<dyn FnMut(usize) + Send>;

/// The audio sink abstraction driven by the local player (§4.5 "Sink").
///
/// All calls into a sink occur while holding its mainloop lock, except from callbacks invoked on
/// that very thread (which must not relock); implementations are responsible for enforcing that
/// discipline internally (see [`PulseSink`]'s `MainloopLock` guard).
pub trait Sink: Send {
    /// This sink's fixed stream parameters.
    fn spec(&self) -> StreamSpec;

    /// Connect the stream and start accepting writes.
    fn start(&mut self) -> Result<(), PlayerError>;

    /// Disconnect the stream.
    fn stop(&mut self) -> Result<(), PlayerError>;

    /// Drop all buffered-but-unplayed frames; the write pointer is moved back to the current read
    /// pointer.
    fn flush(&mut self) -> Result<(), PlayerError>;

    /// Register (or clear, with `None`) the can-write callback.
    fn set_on_can_write_callback(&mut self, callback: Option<CanWriteCallback>);

    /// Synchronous poll of how many bytes the sink can currently accept.
    fn can_write_bytes(&self) -> usize;

    /// Write whole frames from `buf`, truncated to the largest frame-aligned prefix `<= buf.len()`.
    /// If `absolute_timestamp_ms` is given the frames are placed at that playback position
    /// (a seek); otherwise they're appended at the current write pointer. Returns the number of
    /// bytes actually written.
    fn write(&mut self, buf: &[u8], absolute_timestamp_ms: Option<u64>) -> Result<usize, PlayerError>;

    /// Milliseconds of audio that have actually been played back, from stream start.
    fn current_read_time_ms(&self) -> u64;

    /// Milliseconds of audio that have been queued (written) so far, from stream start.
    fn current_write_time_ms(&self) -> u64;
}

/// A headless sink that accepts every write instantly and reports its read pointer as equal to
/// its write pointer. Used by tests and by operators with no PulseAudio server reachable.
#[derive(Debug)]
pub struct NullSink {
    spec: StreamSpec,
    running: bool,
    write_pos_bytes: u64,
    callback: Option<CanWriteCallback>,
    /// How many bytes a caller is told it may write per poll; large enough that tests rarely hit
    /// backpressure unless they ask for it via [`Self::set_can_write_bytes`].
    can_write_bytes: usize,
}

/// Default `canWriteBytes` advertised by a fresh [`NullSink`]: generous enough that ordinary
/// tests never see backpressure.
const DEFAULT_CAN_WRITE_BYTES: usize = 64 * 1024;

impl Default for NullSink {
    fn default() -> Self {
        Self::new(StreamSpec::default())
    }
}

impl NullSink {
    /// Build a null sink with the given stream spec.
    #[must_use]
    pub fn new(spec: StreamSpec) -> Self {
        Self {
            spec,
            running: false,
            write_pos_bytes: 0,
            callback: None,
            can_write_bytes: DEFAULT_CAN_WRITE_BYTES,
        }
    }

    /// Set how many bytes this sink reports as writable, then fire the can-write callback (if
    /// any) with that value. Lets a test exercise the player's `onCanWrite` handling without a
    /// real mainloop thread.
    pub fn set_can_write_bytes(&mut self, n: usize) {
        self.can_write_bytes = n;
        if let Some(callback) = self.callback.as_mut() {
            callback(n);
        }
    }

    /// `true` if [`Sink::start`] has been called more recently than [`Sink::stop`].
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl Sink for NullSink {
    fn spec(&self) -> StreamSpec {
        self.spec
    }

    fn start(&mut self) -> Result<(), PlayerError> {
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), PlayerError> {
        self.running = false;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), PlayerError> {
        // read pointer == write pointer for this sink already, so flush is a no-op beyond
        // discarding whatever a caller thought was still in flight.
        Ok(())
    }

    fn set_on_can_write_callback(&mut self, callback: Option<CanWriteCallback>) {
        self.callback = callback;
    }

    fn can_write_bytes(&self) -> usize {
        self.can_write_bytes
    }

    fn write(&mut self, buf: &[u8], absolute_timestamp_ms: Option<u64>) -> Result<usize, PlayerError> {
        if !self.running {
            return Err(PlayerError::SinkNotRunning);
        }
        let len = self.spec.frame_align(buf.len());
        let end_pos = match absolute_timestamp_ms {
            Some(ms) => self.spec.ms_to_bytes(ms) + len as u64,
            None => self.write_pos_bytes + len as u64,
        };
        self.write_pos_bytes = end_pos.max(self.write_pos_bytes);
        Ok(len)
    }

    fn current_read_time_ms(&self) -> u64 {
        self.spec.bytes_to_ms(self.write_pos_bytes)
    }

    fn current_write_time_ms(&self) -> u64 {
        self.spec.bytes_to_ms(self.write_pos_bytes)
    }
}

#[cfg(feature = "pulseaudio")]
mod pulse {
    use std::sync::{Arc, Mutex};

    use libpulse_binding::context::{Context, FlagSet as ContextFlagSet, State as ContextState};
    use libpulse_binding::def::BufferAttr;
    use libpulse_binding::mainloop::threaded::Mainloop;
    use libpulse_binding::proplist::Proplist;
    use libpulse_binding::sample::{Format as PaFormat, Spec as PaSpec};
    use libpulse_binding::stream::{FlagSet as StreamFlagSet, SeekMode, State as StreamState, Stream};

    use super::{CanWriteCallback, PlayerError, Sink, StreamSpec};

    /// RAII guard grounded on `PulseAudioOutput`'s `MainLoopLock`: locks the threaded mainloop
    /// unless we're already executing on it (a callback calling back into the sink), in which
    /// case relocking would deadlock.
    struct MainloopLock<'a> {
        mainloop: &'a Mainloop,
        locked: bool,
    }

    impl<'a> MainloopLock<'a> {
        fn new(mainloop: &'a Mainloop) -> Self {
            let locked = !mainloop.in_thread();
            if locked {
                mainloop.lock();
            }
            Self { mainloop, locked }
        }
    }

    impl Drop for MainloopLock<'_> {
        fn drop(&mut self) {
            if self.locked {
                // SAFETY: paired with the `lock()` taken in `new` when `locked` is set.
                unsafe {
                    self.mainloop.unlock();
                }
            }
        }
    }

    /// Shared state touched from both the caller's thread and the mainloop thread's stream
    /// callbacks; guarded independently of the mainloop lock since the callback closures
    /// themselves are only reachable while already on that thread.
    struct SharedState {
        callback: Option<CanWriteCallback>,
    }

    /// A PulseAudio-backed [`Sink`] using a threaded mainloop (stream name `"LMS-app"`,
    /// application name `"LMS"`, per §6), grounded on
    /// `libs/localplayer/impl/pulseaudio/PulseAudioOutput.hpp`.
    pub struct PulseSink {
        spec: StreamSpec,
        mainloop: Mainloop,
        context: Option<Context>,
        stream: Option<Stream>,
        shared: Arc<Mutex<SharedState>>,
    }

    // The raw pointers inside `Mainloop`/`Context`/`Stream` are only ever touched while holding
    // the mainloop lock (or from the mainloop thread itself), so it's sound to move a `PulseSink`
    // across threads as long as that discipline is honoured, matching the C++ original's
    // thread-confinement contract.
    unsafe impl Send for PulseSink {}

    impl PulseSink {
        /// Create a sink with the fixed `S16LE`/44.1 kHz/stereo spec.
        ///
        /// # Errors
        ///
        /// Returns [`PlayerError::SinkInitFailed`] if the mainloop, context or proplist cannot be
        /// constructed.
        pub fn new() -> Result<Self, PlayerError> {
            let spec = StreamSpec::default();

            let mut proplist = Proplist::new().ok_or(PlayerError::SinkInitFailed)?;
            proplist
                .set_str(libpulse_binding::proplist::properties::APPLICATION_NAME, "LMS")
                .map_err(|()| PlayerError::SinkInitFailed)?;

            let mut mainloop = Mainloop::new().ok_or(PlayerError::SinkInitFailed)?;
            let context = Context::new_with_proplist(&mainloop, "LMS-app", &proplist)
                .ok_or(PlayerError::SinkInitFailed)?;

            mainloop.start().map_err(|_| PlayerError::SinkInitFailed)?;

            Ok(Self {
                spec,
                mainloop,
                context: Some(context),
                stream: None,
                shared: Arc::new(Mutex::new(SharedState { callback: None })),
            })
        }

        fn pa_spec(&self) -> PaSpec {
            PaSpec {
                format: PaFormat::S16le,
                rate: self.spec.sample_rate,
                channels: self.spec.channels,
            }
        }

        fn connect_context(&mut self) -> Result<(), PlayerError> {
            let _guard = MainloopLock::new(&self.mainloop);
            let context = self.context.as_mut().ok_or(PlayerError::SinkInitFailed)?;
            context
                .connect(None, ContextFlagSet::NOFLAGS, None)
                .map_err(|_| PlayerError::SinkInitFailed)?;

            loop {
                match context.get_state() {
                    ContextState::Ready => break,
                    ContextState::Failed | ContextState::Terminated => {
                        return Err(PlayerError::SinkInitFailed)
                    }
                    _ => self.mainloop.wait(),
                }
            }
            Ok(())
        }

        fn create_stream(&mut self) -> Result<(), PlayerError> {
            let _guard = MainloopLock::new(&self.mainloop);
            let pa_spec = self.pa_spec();
            let context = self.context.as_mut().ok_or(PlayerError::SinkInitFailed)?;
            let mut stream = Stream::new(context, "LMS-app", &pa_spec, None)
                .ok_or(PlayerError::SinkInitFailed)?;

            let shared = Arc::clone(&self.shared);
            stream.set_write_callback(Some(Box::new(move |nbytes| {
                if let Ok(mut shared) = shared.lock() {
                    if let Some(callback) = shared.callback.as_mut() {
                        callback(nbytes);
                    }
                }
            })));

            // `{maxlength, tlength, prebuf, minreq, fragsize} = default`: let the server decide.
            let attr = BufferAttr {
                maxlength: u32::MAX,
                tlength: u32::MAX,
                prebuf: u32::MAX,
                minreq: u32::MAX,
                fragsize: u32::MAX,
            };
            stream
                .connect_playback(None, Some(&attr), StreamFlagSet::START_CORKED, None, None)
                .map_err(|_| PlayerError::SinkInitFailed)?;

            loop {
                match stream.get_state() {
                    StreamState::Ready => break,
                    StreamState::Failed | StreamState::Terminated => {
                        return Err(PlayerError::SinkInitFailed)
                    }
                    _ => self.mainloop.wait(),
                }
            }

            self.stream = Some(stream);
            Ok(())
        }
    }

    impl Drop for PulseSink {
        fn drop(&mut self) {
            let _guard = MainloopLock::new(&self.mainloop);
            if let Some(stream) = self.stream.as_mut() {
                let _ = stream.disconnect();
            }
            if let Some(context) = self.context.as_mut() {
                context.disconnect();
            }
            drop(_guard);
            self.mainloop.stop();
        }
    }

    impl Sink for PulseSink {
        fn spec(&self) -> StreamSpec {
            self.spec
        }

        fn start(&mut self) -> Result<(), PlayerError> {
            if self.context.as_ref().is_some_and(|c| c.get_state() != ContextState::Ready) {
                self.connect_context()?;
            }
            if self.stream.is_none() {
                self.create_stream()?;
            }
            let _guard = MainloopLock::new(&self.mainloop);
            if let Some(stream) = self.stream.as_mut() {
                stream.uncork(None);
            }
            Ok(())
        }

        fn stop(&mut self) -> Result<(), PlayerError> {
            let _guard = MainloopLock::new(&self.mainloop);
            if let Some(mut stream) = self.stream.take() {
                let _ = stream.disconnect();
            }
            Ok(())
        }

        fn flush(&mut self) -> Result<(), PlayerError> {
            let _guard = MainloopLock::new(&self.mainloop);
            if let Some(stream) = self.stream.as_mut() {
                stream.flush(None);
            }
            Ok(())
        }

        fn set_on_can_write_callback(&mut self, callback: Option<CanWriteCallback>) {
            if let Ok(mut shared) = self.shared.lock() {
                shared.callback = callback;
            }
        }

        fn can_write_bytes(&self) -> usize {
            let _guard = MainloopLock::new(&self.mainloop);
            self.stream.as_ref().and_then(Stream::writable_size).unwrap_or(0)
        }

        fn write(
            &mut self,
            buf: &[u8],
            absolute_timestamp_ms: Option<u64>,
        ) -> Result<usize, PlayerError> {
            let _guard = MainloopLock::new(&self.mainloop);
            let len = self.spec.frame_align(buf.len());
            let stream = self.stream.as_mut().ok_or(PlayerError::SinkNotRunning)?;
            let (offset, seek) = match absolute_timestamp_ms {
                Some(ms) => (self.spec.ms_to_bytes(ms) as i64, SeekMode::Absolute),
                None => (0, SeekMode::Relative),
            };
            stream
                .write(&buf[..len], Some(offset), seek)
                .map_err(|_| PlayerError::SinkWriteFailed)?;
            Ok(len)
        }

        fn current_read_time_ms(&self) -> u64 {
            let _guard = MainloopLock::new(&self.mainloop);
            self.stream
                .as_ref()
                .and_then(|s| s.get_time().ok())
                .map(|t| t.as_micros() / 1000)
                .unwrap_or(0)
        }

        fn current_write_time_ms(&self) -> u64 {
            // PulseAudio doesn't expose a distinct write-side clock; the write pointer is always
            // ahead of the read pointer by whatever's buffered, which callers derive from
            // `can_write_bytes` instead.
            self.current_read_time_ms()
        }
    }
}

#[cfg(feature = "pulseaudio")]
pub use pulse::PulseSink;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn frame_align_truncates_to_whole_frames() {
        let spec = StreamSpec::default();
        assert_eq!(spec.frame_size(), 4);
        assert_eq!(spec.frame_align(10), 8);
        assert_eq!(spec.frame_align(8), 8);
    }

    #[test]
    fn null_sink_rejects_writes_before_start() {
        let mut sink = NullSink::default();
        assert!(matches!(sink.write(&[0; 4], None), Err(PlayerError::SinkNotRunning)));
    }

    #[test]
    fn null_sink_tracks_write_pointer_and_read_time() {
        let mut sink = NullSink::default();
        sink.start().unwrap();
        let written = sink.write(&[0; 44100 * 4], None).unwrap();
        assert_eq!(written, 44100 * 4);
        assert_eq!(sink.current_read_time_ms(), 1000);
        assert_eq!(sink.current_write_time_ms(), 1000);
    }

    #[test]
    fn null_sink_seek_moves_write_pointer_to_timestamp() {
        let mut sink = NullSink::default();
        sink.start().unwrap();
        sink.write(&[0; 4 * 44100], None).unwrap();
        sink.write(&[1, 2, 3, 4], Some(500)).unwrap();
        assert_eq!(sink.current_read_time_ms(), 500);
    }

    #[test]
    fn set_can_write_bytes_invokes_registered_callback() {
        let mut sink = NullSink::default();
        let seen = Arc::new(Mutex::new(None));
        let seen_clone = Arc::clone(&seen);
        sink.set_on_can_write_callback(Some(Box::new(move |n| {
            *seen_clone.lock().unwrap() = Some(n);
        })));
        sink.set_can_write_bytes(1234);
        assert_eq!(*seen.lock().unwrap(), Some(1234));
    }
}
