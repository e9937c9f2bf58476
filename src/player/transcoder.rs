// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Per-entry decode pipeline (§4.5 "Transcoder"), grounded on `libs/av/impl/Transcoder.cpp` and
//! reusing this crate's own [`symphonia`] decode plumbing (see `analyzer::AudioReader`).

use std::collections::VecDeque;
use std::path::Path;

use symphonia::core::audio::{AudioBufferRef, SampleBuffer};
use symphonia::core::codecs::{CodecParameters, Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, SeekMode as SymphoniaSeekMode, SeekTo};
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::units::Time;

use super::PlayerError;
use crate::model::ids::TrackId;

/// Decodes one queue entry's audio file into interleaved `S16LE` PCM bytes, stripping any
/// metadata along the way (`strip_metadata=true`): callers only ever see raw sample bytes, never
/// tag data.
pub struct Transcoder {
    track_id: TrackId,
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_num: u32,
    sample_buf: Option<SampleBuffer<i16>>,
    /// Decoded bytes not yet handed to a caller.
    pending: VecDeque<u8>,
    eof: bool,
}

impl Transcoder {
    /// Open `path` for decoding, seeking to `offset_ms` if nonzero.
    ///
    /// # Errors
    ///
    /// Returns [`PlayerError::TranscodeFailed`] if the file can't be opened, probed, or contains
    /// no supported audio track.
    pub fn new(track_id: TrackId, path: &Path, offset_ms: u64) -> Result<Self, PlayerError> {
        let open = || -> Result<Self, SymphoniaError> {
            let src = std::fs::File::open(path)?;
            let mss = MediaSourceStream::new(Box::new(src), MediaSourceStreamOptions::default());

            let mut hint = Hint::new();
            #[expect(unused_results)]
            if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
                hint.with_extension(ext);
            }

            let probed = symphonia::default::get_probe().format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )?;
            let mut format = probed.format;

            let track = format
                .tracks()
                .iter()
                .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
                .ok_or(SymphoniaError::Unsupported("no supported audio track"))?;
            let track_num = track.id;
            let decoder =
                symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

            if offset_ms > 0 {
                format.seek(
                    SymphoniaSeekMode::Accurate,
                    SeekTo::Time {
                        time: Time::new(offset_ms / 1000, (offset_ms % 1000) as f64 / 1000.0),
                        track_id: Some(track_num),
                    },
                )?;
            }

            Ok(Self {
                track_id,
                format,
                decoder,
                track_num,
                sample_buf: None,
                pending: VecDeque::new(),
                eof: false,
            })
        };

        open().map_err(|cause| PlayerError::TranscodeFailed { track_id, cause: cause.to_string() })
    }

    /// The codec parameters of the decoded track, used by callers that need the original sample
    /// rate/channel layout before resampling is implemented (not yet needed: the sink's fixed
    /// `S16LE`/44.1 kHz/stereo format matches every source this catalog's scanner accepts).
    #[must_use]
    pub fn codec_params(&self) -> Option<&CodecParameters> {
        self.format
            .tracks()
            .iter()
            .find_map(|t| (t.id == self.track_num).then_some(&t.codec_params))
    }

    /// `true` once every decodable sample has been handed out via [`Self::read_some`].
    #[must_use]
    pub fn is_eof(&self) -> bool {
        self.eof && self.pending.is_empty()
    }

    /// Decode forward until at least one byte is pending, or end of stream.
    fn fill_pending(&mut self) -> Result<(), PlayerError> {
        while self.pending.is_empty() && !self.eof {
            let packet = loop {
                match self.format.next_packet() {
                    Ok(packet) if packet.track_id() == self.track_num => break Some(packet),
                    Ok(_) => continue,
                    Err(SymphoniaError::IoError(err))
                        if err.kind() == std::io::ErrorKind::UnexpectedEof =>
                    {
                        break None
                    }
                    Err(cause) => {
                        return Err(PlayerError::TranscodeFailed {
                            track_id: self.track_id,
                            cause: cause.to_string(),
                        })
                    }
                }
            };

            let Some(packet) = packet else {
                self.eof = true;
                break;
            };

            let audio_buf = match self.decoder.decode(&packet) {
                Ok(buf) => buf,
                Err(SymphoniaError::DecodeError(_)) => continue,
                Err(cause) => {
                    return Err(PlayerError::TranscodeFailed {
                        track_id: self.track_id,
                        cause: cause.to_string(),
                    })
                }
            };

            self.push_decoded(audio_buf);
        }
        Ok(())
    }

    fn push_decoded(&mut self, audio_buf: AudioBufferRef<'_>) {
        if self.sample_buf.is_none() {
            let spec = *audio_buf.spec();
            let duration = audio_buf.capacity() as u64;
            self.sample_buf = Some(SampleBuffer::<i16>::new(duration, spec));
        }
        let Some(buf) = self.sample_buf.as_mut() else { return };
        buf.copy_interleaved_ref(audio_buf);
        for sample in buf.samples() {
            self.pending.extend(sample.to_le_bytes());
        }
    }

    /// Copy up to `buf.len()` decoded bytes into `buf`. Returns the number of bytes actually
    /// copied (`0` once [`Self::is_eof`] is `true`).
    ///
    /// # Errors
    ///
    /// Returns [`PlayerError::TranscodeFailed`] if decoding the next packet fails.
    pub fn read_some(&mut self, buf: &mut [u8]) -> Result<usize, PlayerError> {
        self.fill_pending()?;
        let n = buf.len().min(self.pending.len());
        for slot in &mut buf[..n] {
            *slot = self.pending.pop_front().unwrap_or(0);
        }
        Ok(n)
    }

    /// Decode forward, cooperatively, until at least one byte is producible (or EOF), then invoke
    /// `callback`. Since decoding here is plain CPU work rather than real asynchronous I/O, this
    /// runs synchronously; the callback indirection exists so callers (the player's feed loop)
    /// don't need a different code path depending on whether data was already buffered.
    ///
    /// # Errors
    ///
    /// Returns [`PlayerError::TranscodeFailed`] if decoding fails.
    pub fn async_wait_for_data(&mut self, mut callback: impl FnMut(&mut Self)) -> Result<(), PlayerError> {
        self.fill_pending()?;
        callback(self);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opening_a_nonexistent_file_fails_with_track_id() {
        let track_id = TrackId::new(42);
        let err = Transcoder::new(track_id, Path::new("/nonexistent/does-not-exist.flac"), 0)
            .expect_err("missing file must fail to open");
        match err {
            PlayerError::TranscodeFailed { track_id: id, .. } => assert_eq!(id, track_id),
            other => panic!("unexpected error variant: {other:?}"),
        }
    }
}
