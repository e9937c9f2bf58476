// Copyright (c) 2024 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Time-related utility functions.

use chrono::TimeDelta;

/// Parse a year out of a tag value that may be a bare `"YYYY"`, a full date (`"YYYY-MM-DD"`,
/// `"YYYY-MM-DDTHH:MM:SS"`), or have leading/trailing whitespace. Takes the first run of 4 ASCII
/// digits found, mirroring tag readers that are lenient about the exact date format embedded in a
/// `ReleaseDate`/`OriginalReleaseDate`/`ReleaseYear` tag.
#[must_use]
pub fn parse_year_from_str(s: &str) -> Option<i32> {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i + 4 <= bytes.len() {
        if bytes[i..i + 4].iter().all(u8::is_ascii_digit) {
            return s[i..i + 4].parse().ok();
        }
        i += 1;
    }
    None
}

/// Indicates that a value can be represent a duration as a formatted string.
pub trait FormattedDuration {
    /// Format the duration as a string, either in the form `M:SS` or `H:MM:SS`.
    fn formatted_duration(&self) -> String;
}

impl FormattedDuration for TimeDelta {
    fn formatted_duration(&self) -> String {
        let hours = self.num_hours();
        let minutes = self.num_minutes() - hours * 60;
        let seconds = self.num_seconds() - hours * 60 * 60 - minutes * 60;
        if hours > 0 {
            format!("{hours}:{minutes:02}:{seconds:02}")
        } else {
            format!("{minutes}:{seconds:02}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_year() {
        assert_eq!(parse_year_from_str("1999"), Some(1999));
    }

    #[test]
    fn parses_year_from_full_date() {
        assert_eq!(parse_year_from_str("2020-01-03"), Some(2020));
        assert_eq!(parse_year_from_str("2020-01-03T09:08:11"), Some(2020));
    }

    #[test]
    fn rejects_non_numeric_input() {
        assert_eq!(parse_year_from_str("unknown"), None);
        assert_eq!(parse_year_from_str(""), None);
    }
}
