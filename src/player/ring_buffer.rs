// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! A fixed-capacity byte queue sitting between the [`super::transcoder::Transcoder`] and the
//! [`super::sink::Sink`] (§4.5 "`RingBuffer[bytes]`").

use std::collections::VecDeque;

/// A growable-but-capped FIFO of decoded PCM bytes.
///
/// `VecDeque` already gives amortised O(1) push/pop from either end; this wrapper only adds the
/// capacity ceiling and the frame-aligned "how much can I still push" query the player's feed loop
/// needs.
#[derive(Debug)]
pub struct RingBuffer {
    buf: VecDeque<u8>,
    capacity: usize,
}

impl RingBuffer {
    /// Build an empty buffer that holds at most `capacity` bytes.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self { buf: VecDeque::with_capacity(capacity), capacity }
    }

    /// Bytes currently queued.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// `true` if no bytes are queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Remaining free capacity.
    #[must_use]
    pub fn free(&self) -> usize {
        self.capacity.saturating_sub(self.buf.len())
    }

    /// Append `data`, truncated to however much free capacity remains. Returns the number of
    /// bytes actually appended.
    pub fn push(&mut self, data: &[u8]) -> usize {
        let n = data.len().min(self.free());
        self.buf.extend(&data[..n]);
        n
    }

    /// Pop up to `max_len` bytes into a freshly allocated buffer.
    pub fn pop(&mut self, max_len: usize) -> Vec<u8> {
        let n = max_len.min(self.buf.len());
        self.buf.drain(..n).collect()
    }

    /// Drop every buffered byte.
    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_truncates_to_free_capacity() {
        let mut rb = RingBuffer::new(4);
        assert_eq!(rb.push(&[1, 2, 3, 4, 5, 6]), 4);
        assert_eq!(rb.len(), 4);
        assert_eq!(rb.free(), 0);
    }

    #[test]
    fn pop_respects_fifo_order() {
        let mut rb = RingBuffer::new(8);
        rb.push(&[1, 2, 3]);
        rb.push(&[4, 5]);
        assert_eq!(rb.pop(2), vec![1, 2]);
        assert_eq!(rb.pop(10), vec![3, 4, 5]);
        assert!(rb.is_empty());
    }

    #[test]
    fn clear_empties_the_buffer() {
        let mut rb = RingBuffer::new(4);
        rb.push(&[1, 2, 3]);
        rb.clear();
        assert!(rb.is_empty());
        assert_eq!(rb.free(), 4);
    }
}
