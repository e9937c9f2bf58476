// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! The `ScanSettings` entity (§3): operator-configured scan parameters plus the scan-version
//! counters that let `ScanFiles` tell an up-to-date row from a stale one.

use chrono::{DateTime, Utc};

/// Persisted scan configuration and version counters.
///
/// `audio_scan_version`/`artist_info_scan_version` are bumped whenever the shape of what gets
/// extracted changes (e.g. a new analyzer is enabled); every `Track`/`Artist` row remembers the
/// version it was last scanned under, so bumping these forces a full re-scan of the affected
/// entities on the next run.
#[derive(Debug, Clone)]
pub struct ScanSettings {
    /// Current audio-metadata scan version.
    pub audio_scan_version: u32,
    /// Current artist-info scan version.
    pub artist_info_scan_version: u32,
    /// Timestamp of the last completed scan, used to decide whether the startup scan is due.
    pub last_scan_completed: Option<DateTime<Utc>>,
    /// Operator-configured update period, in hours, for the startup-triggered scan.
    pub update_period_hours: u32,
    /// Operator-configured daily start time (minutes since midnight, local time), if scheduled.
    pub daily_start_time_minutes: Option<u32>,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            audio_scan_version: 1,
            artist_info_scan_version: 1,
            last_scan_completed: None,
            update_period_hours: 24,
            daily_start_time_minutes: None,
        }
    }
}
