// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! String utilities: splitting, escaping, hex and ISO-8601 conversions.
//!
//! Ported from `libs/core/impl/String.cpp`, pinned to the edge cases exercised by
//! `libs/core/test/String.cpp`.

use chrono::{DateTime, Utc};

/// Split `input` on any of the delimiter strings in `delimiters`, dropping empty tokens.
///
/// Mirrors `splitString(s, {delims...})`: `splitString("a b,c|defgh  ", {" ", ",", "|"})` yields
/// `["a", "b", "c", "defgh"]`.
#[must_use]
pub fn split_any<'a>(input: &'a str, delimiters: &[&str]) -> Vec<&'a str> {
    if delimiters.is_empty() {
        return if input.is_empty() { vec![] } else { vec![input] };
    }

    let mut result = Vec::new();
    let mut rest = input;
    'outer: loop {
        for delim in delimiters {
            if delim.is_empty() {
                continue;
            }
            if let Some(pos) = rest.find(delim) {
                let (head, tail) = rest.split_at(pos);
                if !head.is_empty() {
                    result.push(head);
                }
                rest = &tail[delim.len()..];
                continue 'outer;
            }
        }
        break;
    }
    if !rest.is_empty() {
        result.push(rest);
    }
    result
}

/// Split an artist tag value on the configured delimiters, unless the whole value is listed in
/// `never_split` (compared case-sensitively, as the source does).
#[must_use]
pub fn split_tag_value<'a>(
    value: &'a str,
    delimiters: &[String],
    never_split: &[String],
) -> Vec<&'a str> {
    if never_split.iter().any(|name| name == value) {
        return vec![value];
    }
    let delims: Vec<&str> = delimiters.iter().map(String::as_str).collect();
    split_any(value, &delims)
}

/// Join `parts` with `sep`, escaping any occurrence of `sep` or the escape character itself inside
/// a part with a backslash.
#[must_use]
pub fn join_escaped(parts: &[impl AsRef<str>], sep: char) -> String {
    parts
        .iter()
        .map(|part| {
            part.as_ref().chars().fold(String::new(), |mut acc, c| {
                if c == sep || c == '\\' {
                    acc.push('\\');
                }
                acc.push(c);
                acc
            })
        })
        .collect::<Vec<_>>()
        .join(&sep.to_string())
}

/// Escape a string for embedding inside a JSON/JS string literal (used by the LRC metadata
/// sidecar writer).
#[must_use]
pub fn escape_json(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

/// Format a UTC timestamp as `"2020-01-03T09:08:11.075Z"` (millisecond precision, trailing `Z`).
#[must_use]
pub fn to_iso8601(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Parse an ISO-8601 UTC timestamp, with or without a trailing `Z`, millisecond precision.
#[must_use]
pub fn from_iso8601(s: &str) -> Option<DateTime<Utc>> {
    let s = s.strip_suffix('Z').unwrap_or(s);
    DateTime::parse_from_rfc3339(&format!("{s}+00:00"))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Encode bytes as lowercase hex.
#[must_use]
pub fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Decode a lowercase- or uppercase-hex string into bytes. Returns `None` for odd-length or
/// non-hex input.
#[must_use]
pub fn hex_decode(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok())
        .collect()
}

/// Case-insensitive ASCII/Unicode equality.
#[must_use]
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Case-insensitive substring search.
#[must_use]
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Capitalise the first character of `s`, leaving the rest untouched.
#[must_use]
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Format a millisecond timestamp as an LRC tag, `"[MM:SS.mmm]"`.
#[must_use]
pub fn format_lrc_timestamp(ms: i64) -> String {
    let ms = ms.max(0);
    let total_centiseconds = ms / 10;
    let minutes = total_centiseconds / 6000;
    let seconds = (total_centiseconds / 100) % 60;
    let millis = ms % 1000;
    format!("[{minutes:02}:{seconds:02}.{millis:03}]")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_by_set_of_delimiters() {
        assert_eq!(
            split_any("a b,c|defgh  ", &[" ", ",", "|"]),
            vec!["a", "b", "c", "defgh"]
        );
    }

    #[test]
    fn split_tag_value_respects_never_split() {
        let delims = vec![", ".to_string()];
        let never_split = vec!["Earth, Wind & Fire".to_string()];
        assert_eq!(
            split_tag_value("Earth, Wind & Fire", &delims, &never_split),
            vec!["Earth, Wind & Fire"]
        );
        assert_eq!(
            split_tag_value("Daft Punk, Pharrell Williams", &delims, &never_split),
            vec!["Daft Punk", "Pharrell Williams"]
        );
    }

    #[test]
    fn iso8601_round_trip() {
        let dt = DateTime::parse_from_rfc3339("2020-01-03T09:08:11.075+00:00")
            .unwrap()
            .with_timezone(&Utc);
        let text = to_iso8601(&dt);
        assert_eq!(text, "2020-01-03T09:08:11.075Z");
        assert_eq!(from_iso8601(&text), Some(dt));
    }

    #[test]
    fn hex_round_trip() {
        let bytes = [0x00u8, 0x0f, 0xff, 0xab];
        let text = hex_encode(&bytes);
        assert_eq!(text, "000fffab");
        assert_eq!(hex_decode(&text), Some(bytes.to_vec()));
    }

    #[test]
    fn lrc_timestamp_formatting() {
        assert_eq!(format_lrc_timestamp(3_300), "[00:03.300]");
        assert_eq!(format_lrc_timestamp(9_160), "[00:09.160]");
    }
}
