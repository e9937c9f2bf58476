// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! LRC-style synchronized lyrics parsing and serialization (§4.3 "Tag parsing contracts").

use crate::model::{LyricsBody, SynchronizedLine};
use crate::util::string::format_lrc_timestamp;

/// Everything a `[k: v]` metadata line or a synchronized/unsynchronized body can contribute,
/// outside of the persisted `TrackLyrics` row's `track_id`/`external_path`/`id`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLyrics {
    /// Lyrics body, synchronized or not.
    pub body: LyricsBody,
    /// `[la: ...]`.
    pub language: Option<String>,
    /// `[ar: ...]`.
    pub display_artist: Option<String>,
    /// `[al: ...]`.
    pub display_album: Option<String>,
    /// `[ti: ...]`.
    pub display_title: Option<String>,
    /// `[offset: ...]`, signed milliseconds. Defaults to `0` when absent.
    pub offset_ms: i64,
}

/// Recognised metadata tag keys, matched verbatim against the bracketed key of a `[k: v]` line.
const METADATA_KEYS: &[&str] = &["id", "ar", "al", "ti", "la", "length", "offset"];

/// Parse an LRC document.
///
/// Grammar (§4.3): a `[k: v]` line with `k` in [`METADATA_KEYS`] sets metadata. A line starting
/// with one or more consecutive timestamp tags (`[HH:MM:SS.mmm]`, `[MM:SS.mmm]`, `[H:MM:SS.mmm]`,
/// or `[MM:SS]`, optionally separated by whitespace) associates the remainder of the line with
/// every one of those timestamps. A line with none of the above, once at least one timestamp has
/// been seen, is appended (with a `\n` separator) to every entry opened by the most recent
/// timestamp line. `##` lines are comments. Free text before the first timestamp is discarded if a
/// timestamp is ever seen; otherwise the whole document is unsynchronized.
#[must_use]
pub fn parse(text: &str) -> ParsedLyrics {
    let mut language = None;
    let mut display_artist = None;
    let mut display_album = None;
    let mut display_title = None;
    let mut offset_ms = 0_i64;

    let mut sync_lines: Vec<SynchronizedLine> = Vec::new();
    let mut current_group: Vec<usize> = Vec::new();
    let mut seen_timestamp = false;
    let mut plain_lines: Vec<String> = Vec::new();

    for raw_line in trim_trailing_blank_lines(text) {
        let line = raw_line.strip_suffix('\r').unwrap_or(raw_line);

        if line.starts_with("##") {
            continue;
        }

        if let Some((key, value)) = parse_metadata_line(line) {
            match key {
                "la" => language = Some(value.to_string()),
                "ar" => display_artist = Some(value.to_string()),
                "al" => display_album = Some(value.to_string()),
                "ti" => display_title = Some(value.to_string()),
                "offset" => offset_ms = value.trim().parse().unwrap_or(0),
                _ => {}
            }
            continue;
        }

        let (timestamps, remainder) = parse_leading_timestamps(line);
        if timestamps.is_empty() {
            if seen_timestamp {
                for &index in &current_group {
                    sync_lines[index].text.push('\n');
                    sync_lines[index].text.push_str(line);
                }
            } else {
                plain_lines.push(line.to_string());
            }
            continue;
        }

        seen_timestamp = true;
        plain_lines.clear();
        current_group = Vec::with_capacity(timestamps.len());
        for timestamp_ms in timestamps {
            current_group.push(sync_lines.len());
            sync_lines.push(SynchronizedLine { timestamp_ms, text: remainder.to_string() });
        }
    }

    let body = if seen_timestamp {
        sync_lines.sort_by_key(|line| line.timestamp_ms);
        LyricsBody::Synchronized(sync_lines)
    } else {
        LyricsBody::Unsynchronized(plain_lines)
    };

    ParsedLyrics { body, language, display_artist, display_album, display_title, offset_ms }
}

/// Serialize [`ParsedLyrics`] back into LRC text, in canonical form: one metadata line per
/// populated field, then one timestamp line per synchronized entry (or one plain line per
/// unsynchronized line).
///
/// This canonical form is a fixed point: parsing it back and re-serializing yields byte-identical
/// output (the `LyricsRoundTrip` property), even though it is not a faithful reproduction of
/// arbitrary hand-written LRC (fan-out/continuation lines are flattened away).
#[must_use]
pub fn serialize(parsed: &ParsedLyrics) -> String {
    let mut out = String::new();
    if let Some(artist) = &parsed.display_artist {
        out.push_str(&format!("[ar: {artist}]\n"));
    }
    if let Some(album) = &parsed.display_album {
        out.push_str(&format!("[al: {album}]\n"));
    }
    if let Some(title) = &parsed.display_title {
        out.push_str(&format!("[ti: {title}]\n"));
    }
    if let Some(language) = &parsed.language {
        out.push_str(&format!("[la: {language}]\n"));
    }
    if parsed.offset_ms != 0 {
        out.push_str(&format!("[offset: {}]\n", parsed.offset_ms));
    }

    match &parsed.body {
        LyricsBody::Synchronized(lines) => {
            for line in lines {
                out.push_str(&format_lrc_timestamp(line.timestamp_ms));
                out.push_str(&line.text);
                out.push('\n');
            }
        }
        LyricsBody::Unsynchronized(lines) => {
            for line in lines {
                out.push_str(line);
                out.push('\n');
            }
        }
    }

    out.pop();
    out
}

/// Split `text` into lines, discarding any run of trailing blank lines.
fn trim_trailing_blank_lines(text: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = text.lines().collect();
    while matches!(lines.last(), Some(line) if line.trim().is_empty()) {
        lines.pop();
    }
    lines
}

/// Match a whole line against `[key: value]` for a recognised metadata key.
fn parse_metadata_line(line: &str) -> Option<(&str, &str)> {
    let inner = line.strip_prefix('[')?.strip_suffix(']')?;
    let (key, value) = inner.split_once(':')?;
    let key = key.trim();
    if !METADATA_KEYS.contains(&key) {
        return None;
    }
    Some((key, value.trim()))
}

/// Consume a run of consecutive `[timestamp]` tags from the start of `line`, skipping whitespace
/// between them. Returns the parsed millisecond offsets and the unconsumed remainder.
fn parse_leading_timestamps(line: &str) -> (Vec<i64>, &str) {
    let mut timestamps = Vec::new();
    let mut rest = line;
    loop {
        let trimmed = rest.trim_start_matches(' ');
        match parse_one_timestamp(trimmed) {
            Some((ms, remainder)) => {
                timestamps.push(ms);
                rest = remainder;
            }
            None => break,
        }
    }
    (timestamps, rest)
}

/// Parse a single leading `[H:MM:SS.mmm]`/`[HH:MM:SS.mmm]`/`[MM:SS.mmm]`/`[MM:SS]` tag, returning
/// the timestamp in milliseconds and the remainder of the string after the closing bracket.
fn parse_one_timestamp(s: &str) -> Option<(i64, &str)> {
    let rest = s.strip_prefix('[')?;
    let end = rest.find(']')?;
    let (body, after) = (&rest[..end], &rest[end + 1..]);

    let fields: Vec<&str> = body.split(':').collect();
    let (hours, minutes, seconds_field) = match fields.as_slice() {
        [minutes, seconds] => (0, *minutes, *seconds),
        [hours, minutes, seconds] => (hours.parse::<i64>().ok()?, *minutes, *seconds),
        _ => return None,
    };

    let minutes: i64 = minutes.parse().ok()?;
    let (seconds, millis) = match seconds_field.split_once('.') {
        Some((seconds, frac)) => {
            if frac.is_empty() || frac.len() > 3 || !frac.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            let padded = format!("{frac:0<3}");
            (seconds.parse::<i64>().ok()?, padded.parse::<i64>().ok()?)
        }
        None => (seconds_field.parse::<i64>().ok()?, 0),
    };

    let total_ms = ((hours * 60 + minutes) * 60 + seconds) * 1000 + millis;
    Some((total_ms, after))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synchronised_lrc_scenario() {
        let input = "[id: dqsxdkbu]\n\
                     [ar: Lady Gaga]\n\
                     [ti: Die With A Smile]\n\
                     [la: eng]\n\
                     [offset: -34]\n\
                     [00:03.30]Ooh, ooh\n\
                     [00:06.75]\n\
                     [00:09.16]I, I just woke up from a dream\n";
        let parsed = parse(input);
        assert_eq!(parsed.display_artist.as_deref(), Some("Lady Gaga"));
        assert_eq!(parsed.display_title.as_deref(), Some("Die With A Smile"));
        assert_eq!(parsed.language.as_deref(), Some("eng"));
        assert_eq!(parsed.offset_ms, -34);

        let LyricsBody::Synchronized(lines) = parsed.body else {
            panic!("expected synchronized lyrics");
        };
        assert_eq!(
            lines,
            vec![
                SynchronizedLine { timestamp_ms: 3_300, text: "Ooh, ooh".to_string() },
                SynchronizedLine { timestamp_ms: 6_750, text: String::new() },
                SynchronizedLine {
                    timestamp_ms: 9_160,
                    text: "I, I just woke up from a dream".to_string()
                },
            ]
        );
    }

    #[test]
    fn multi_timestamp_lrc_scenario() {
        let input = "[00:03.30][00:09.16] [00:15.16]Ooh, ooh\n[00:06.75]I, I just woke up from a dream";
        let parsed = parse(input);
        let LyricsBody::Synchronized(lines) = parsed.body else {
            panic!("expected synchronized lyrics");
        };
        assert_eq!(
            lines,
            vec![
                SynchronizedLine { timestamp_ms: 3_300, text: "Ooh, ooh".to_string() },
                SynchronizedLine {
                    timestamp_ms: 6_750,
                    text: "I, I just woke up from a dream".to_string()
                },
                SynchronizedLine { timestamp_ms: 9_160, text: "Ooh, ooh".to_string() },
                SynchronizedLine { timestamp_ms: 15_160, text: "Ooh, ooh".to_string() },
            ]
        );
    }

    #[test]
    fn leading_free_text_is_discarded_once_a_timestamp_appears() {
        let parsed = parse("some header nobody asked for\n[00:01.00]hello");
        let LyricsBody::Synchronized(lines) = parsed.body else {
            panic!("expected synchronized lyrics");
        };
        assert_eq!(lines, vec![SynchronizedLine { timestamp_ms: 1_000, text: "hello".to_string() }]);
    }

    #[test]
    fn no_timestamp_is_unsynchronized() {
        let parsed = parse("first line\nsecond line\n\n");
        assert_eq!(
            parsed.body,
            LyricsBody::Unsynchronized(vec!["first line".to_string(), "second line".to_string()])
        );
    }

    #[test]
    fn continuation_lines_append_to_every_entry_in_the_group() {
        let parsed = parse("[00:01.00][00:02.00]hello\nworld");
        let LyricsBody::Synchronized(lines) = parsed.body else {
            panic!("expected synchronized lyrics");
        };
        assert_eq!(lines[0].text, "hello\nworld");
        assert_eq!(lines[1].text, "hello\nworld");
    }

    #[test]
    fn round_trip_is_a_fixed_point() {
        let original = ParsedLyrics {
            body: LyricsBody::Synchronized(vec![
                SynchronizedLine { timestamp_ms: 1_000, text: "a".to_string() },
                SynchronizedLine { timestamp_ms: 2_000, text: "b".to_string() },
            ]),
            language: Some("eng".to_string()),
            display_artist: Some("Artist".to_string()),
            display_album: None,
            display_title: Some("Title".to_string()),
            offset_ms: -34,
        };
        let serialized = serialize(&original);
        let reparsed = parse(&serialized);
        assert_eq!(serialize(&reparsed), serialized);
    }
}
