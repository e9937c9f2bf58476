// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Operator configuration.
//!
//! Configuration is TOML, parsed with `serde`, and merged against a compiled-in default table
//! using the `MergeableConfig` merge-on-`Option` pattern: a value set in the operator's file wins,
//! otherwise the default table's value is used.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Encountered when the configuration cannot be loaded.
#[derive(Error, Debug)]
#[error("configuration error: {0}")]
pub struct ConfigError(#[from] toml::de::Error);

/// Default configuration TOML string, compiled into the binary.
const DEFAULT_CONFIG: &str = include_str!("default_config.toml");

/// Represents a piece of configuration that can be merged with another one.
trait MergeableConfig {
    /// Merge this configuration object with another one, taking values not set in this object
    /// from the other one (if present).
    fn merge(&self, other: &Self) -> Self;
}

/// Strength of the startup integrity check (§4.1).
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegrityCheck {
    /// `PRAGMA quick_check`, the default.
    #[default]
    Quick,
    /// `PRAGMA integrity_check` plus `PRAGMA foreign_key_check`.
    Full,
    /// No check at all.
    None,
}

/// An audio-analysis kind that the scanner's `ScanFiles` step can run on a decoded track.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnalyzerType {
    /// Precise track length from decoded PCM duration.
    TrackLength,
    /// Chromaprint acoustic fingerprint.
    ChromaprintFingerprint,
    /// EBU R128 loudness / ReplayGain.
    #[serde(rename = "ebu-r128")]
    EbuR128,
}

/// Configuration for the audio analyzers run during `ScanFiles`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalyzerConfig {
    /// Which analyzers are enabled.
    #[serde(default)]
    pub enabled: Vec<AnalyzerType>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            enabled: vec![
                AnalyzerType::TrackLength,
                AnalyzerType::ChromaprintFingerprint,
                AnalyzerType::EbuR128,
            ],
        }
    }
}

impl MergeableConfig for AnalyzerConfig {
    fn merge(&self, other: &Self) -> Self {
        if self.enabled.is_empty() {
            Self {
                enabled: other.enabled.clone(),
            }
        } else {
            self.clone()
        }
    }
}

/// Database-layer settings (§4.1).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct DatabaseConfig {
    /// Path to the SQLite catalog file.
    #[serde(default)]
    pub path: Option<String>,
    /// Size of the connection pool.
    #[serde(default)]
    pub connection_count: Option<u32>,
    /// Startup integrity check strength.
    #[serde(default)]
    pub integrity_check: Option<IntegrityCheck>,
    /// Log every SQL statement executed.
    #[serde(default)]
    pub show_queries: Option<bool>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: Some("lms.db".to_string()),
            connection_count: Some(4),
            integrity_check: Some(IntegrityCheck::Quick),
            show_queries: Some(false),
        }
    }
}

impl MergeableConfig for DatabaseConfig {
    fn merge(&self, other: &Self) -> Self {
        Self {
            path: self.path.clone().or_else(|| other.path.clone()),
            connection_count: self.connection_count.or(other.connection_count),
            integrity_check: self.integrity_check.or(other.integrity_check),
            show_queries: self.show_queries.or(other.show_queries),
        }
    }
}

/// ListenBrainz feedback-backend settings, consumed only by the `Starred*` sync-state contract
/// (the feedback synchroniser itself is out of scope).
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ListenBrainzConfig {
    /// API base URL.
    #[serde(default)]
    pub api_base_url: Option<String>,
    /// Maximum number of feedback entries to sync per run.
    #[serde(default)]
    pub max_sync_feedback_count: Option<u32>,
    /// How often, in hours, to resynchronise feedback.
    #[serde(default)]
    pub sync_feedbacks_period_hours: Option<u32>,
}

impl MergeableConfig for ListenBrainzConfig {
    fn merge(&self, other: &Self) -> Self {
        Self {
            api_base_url: self.api_base_url.clone().or_else(|| other.api_base_url.clone()),
            max_sync_feedback_count: self
                .max_sync_feedback_count
                .or(other.max_sync_feedback_count),
            sync_feedbacks_period_hours: self
                .sync_feedbacks_period_hours
                .or(other.sync_feedbacks_period_hours),
        }
    }
}

/// Scanner tag-parsing settings (§4.3 "Tag parsing contracts").
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ScannerConfig {
    /// Skip a track whose MusicBrainz recording ID duplicates an already-scanned track.
    #[serde(default)]
    pub skip_duplicate_track_mbid: Option<bool>,
    /// Delimiter substrings used to split multi-valued artist tags.
    #[serde(default)]
    pub artist_tag_delimiters: Option<Vec<String>>,
    /// Artist names that must never be split, even if they contain a delimiter substring.
    #[serde(default)]
    pub artists_to_not_split: Option<Vec<String>>,
    /// Delimiter substrings used for all other multi-valued tags.
    #[serde(default)]
    pub default_tag_delimiters: Option<Vec<String>>,
    /// Skip importing playlists that reference a single release.
    #[serde(default)]
    pub skip_single_release_playlists: Option<bool>,
    /// Allow falling back to an artist-name match when no MBID is present.
    #[serde(default)]
    pub allow_artist_mbid_fallback: Option<bool>,
    /// Fall back to the release's cover art for an artist with no dedicated image.
    #[serde(default)]
    pub artist_image_fallback_to_release: Option<bool>,
    /// Run the `FetchArtistInfo` step's remote MusicBrainz lookup (§4.3 step 7, "optional remote
    /// enrichment"). Has no effect when the crate is built without the `musicbrainz` feature.
    #[serde(default)]
    pub fetch_artist_info: Option<bool>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            skip_duplicate_track_mbid: Some(false),
            artist_tag_delimiters: Some(vec![";".to_string(), ", ".to_string()]),
            artists_to_not_split: Some(Vec::new()),
            default_tag_delimiters: Some(vec![";".to_string()]),
            skip_single_release_playlists: Some(false),
            allow_artist_mbid_fallback: Some(true),
            artist_image_fallback_to_release: Some(false),
            fetch_artist_info: Some(false),
        }
    }
}

impl MergeableConfig for ScannerConfig {
    fn merge(&self, other: &Self) -> Self {
        Self {
            skip_duplicate_track_mbid: self
                .skip_duplicate_track_mbid
                .or(other.skip_duplicate_track_mbid),
            artist_tag_delimiters: self
                .artist_tag_delimiters
                .clone()
                .or_else(|| other.artist_tag_delimiters.clone()),
            artists_to_not_split: self
                .artists_to_not_split
                .clone()
                .or_else(|| other.artists_to_not_split.clone()),
            default_tag_delimiters: self
                .default_tag_delimiters
                .clone()
                .or_else(|| other.default_tag_delimiters.clone()),
            skip_single_release_playlists: self
                .skip_single_release_playlists
                .or(other.skip_single_release_playlists),
            allow_artist_mbid_fallback: self
                .allow_artist_mbid_fallback
                .or(other.allow_artist_mbid_fallback),
            artist_image_fallback_to_release: self
                .artist_image_fallback_to_release
                .or(other.artist_image_fallback_to_release),
            fetch_artist_info: self.fetch_artist_info.or(other.fetch_artist_info),
        }
    }
}

/// SOM recommender settings (§4.4). `grid_width`/`grid_height` of `0` means "use the
/// `floor(sqrt(sample_count / 20))` heuristic" (kept as an Open Question override point).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RecommenderConfig {
    /// Explicit grid width, or `0` for the heuristic.
    #[serde(default)]
    pub grid_width: Option<u32>,
    /// Explicit grid height, or `0` for the heuristic.
    #[serde(default)]
    pub grid_height: Option<u32>,
    /// Number of training iterations.
    #[serde(default)]
    pub iteration_count: Option<u32>,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            grid_width: Some(0),
            grid_height: Some(0),
            iteration_count: Some(500),
        }
    }
}

impl MergeableConfig for RecommenderConfig {
    fn merge(&self, other: &Self) -> Self {
        Self {
            grid_width: self.grid_width.or(other.grid_width),
            grid_height: self.grid_height.or(other.grid_height),
            iteration_count: self.iteration_count.or(other.iteration_count),
        }
    }
}

/// Media library roots the scanner walks.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct MediaLibraryEntry {
    /// Operator-visible name.
    pub name: String,
    /// Root directory path.
    pub path: String,
}

/// The main configuration struct.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Database-layer settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Scanner tag-parsing settings.
    #[serde(default)]
    pub scanner: ScannerConfig,
    /// Audio analyzers run during scanning.
    #[serde(default)]
    pub analyzers: AnalyzerConfig,
    /// SOM recommender settings.
    #[serde(default)]
    pub recommender: RecommenderConfig,
    /// ListenBrainz feedback-backend settings.
    #[serde(default)]
    pub listenbrainz: ListenBrainzConfig,
    /// Configured media library roots.
    #[serde(default)]
    pub media_libraries: Vec<MediaLibraryEntry>,
}

impl Default for Config {
    fn default() -> Self {
        Self::load_default().expect("failed to load compiled-in default config")
    }
}

impl MergeableConfig for Config {
    fn merge(&self, other: &Self) -> Self {
        Self {
            database: self.database.merge(&other.database),
            scanner: self.scanner.merge(&other.scanner),
            analyzers: self.analyzers.merge(&other.analyzers),
            recommender: self.recommender.merge(&other.recommender),
            listenbrainz: self.listenbrainz.merge(&other.listenbrainz),
            media_libraries: if self.media_libraries.is_empty() {
                other.media_libraries.clone()
            } else {
                self.media_libraries.clone()
            },
        }
    }
}

/// Top-level table keys `Config` understands.
const KNOWN_TOP_LEVEL_KEYS: &[&str] =
    &["database", "scanner", "analyzers", "recommender", "listenbrainz", "media-libraries"];

/// Per-section known keys, checked against whichever top-level table is present.
const KNOWN_SECTION_KEYS: &[(&str, &[&str])] = &[
    ("database", &["path", "connection-count", "integrity-check", "show-queries"]),
    (
        "scanner",
        &[
            "skip-duplicate-track-mbid",
            "artist-tag-delimiters",
            "artists-to-not-split",
            "default-tag-delimiters",
            "skip-single-release-playlists",
            "allow-artist-mbid-fallback",
            "artist-image-fallback-to-release",
            "fetch-artist-info",
        ],
    ),
    ("analyzers", &["enabled"]),
    ("recommender", &["grid-width", "grid-height", "iteration-count"]),
    ("listenbrainz", &["api-base-url", "max-sync-feedback-count", "sync-feedbacks-period-hours"]),
];

/// Warn about any table key in `value` that `Config` doesn't recognise (§6, SPEC_FULL §A.3:
/// "unknown keys are ignored with a warning").
fn warn_on_unknown_keys(value: &toml::Value) {
    let Some(table) = value.as_table() else { return };
    for key in table.keys() {
        if !KNOWN_TOP_LEVEL_KEYS.contains(&key.as_str()) {
            log::warn!(target: "lms::config", "unknown configuration key: {key}");
        }
    }
    for (section, known) in KNOWN_SECTION_KEYS {
        let Some(section_table) = table.get(*section).and_then(toml::Value::as_table) else { continue };
        for key in section_table.keys() {
            if !known.contains(&key.as_str()) {
                log::warn!(target: "lms::config", "unknown configuration key: {section}.{key}");
            }
        }
    }
}

impl Config {
    /// Load the configuration from a string slice.
    fn load_from_str(text: &str) -> std::result::Result<Self, ConfigError> {
        let value: toml::Value = toml::from_str(text)?;
        warn_on_unknown_keys(&value);
        let config = Self::deserialize(value)?;
        Ok(config)
    }

    /// Load the compiled-in default configuration.
    fn load_default() -> std::result::Result<Self, ConfigError> {
        Self::load_from_str(DEFAULT_CONFIG)
    }

    /// Load the configuration from a file located at the given path, then merge it against the
    /// compiled-in defaults so any key the operator did not set still has a value.
    ///
    /// # Errors
    ///
    /// This method can fail if the file cannot be accessed or if it contains malformed markup.
    pub fn load_from_path<T: AsRef<Path>>(path: T) -> crate::Result<Self> {
        let text = std::fs::read_to_string(path).map_err(crate::Error::Io)?;
        let config = Self::load_from_str(&text)
            .map_err(|err| crate::Error::ConfigInvalid(err.to_string()))?;
        Ok(config.with_defaults())
    }

    /// Merge this configuration struct with the compiled-in default values.
    #[must_use]
    pub fn with_defaults(&self) -> Self {
        let default = Self::default();
        self.merge(&default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn omitted_section_falls_back_to_the_default() {
        let config = Config::load_from_str("[database]\nshow-queries = true\n")
            .unwrap()
            .with_defaults();
        assert_eq!(config.database.show_queries, Some(true));
        assert_eq!(config.database.path, Some("lms.db".to_string()));
        assert_eq!(config.scanner.fetch_artist_info, Some(false));
        assert!(!config.analyzers.enabled.is_empty());
    }

    #[test]
    fn empty_file_merges_to_all_defaults() {
        let config = Config::load_from_str("").unwrap().with_defaults();
        let default = Config::default();
        assert_eq!(config.database.path, default.database.path);
        assert_eq!(config.scanner.fetch_artist_info, default.scanner.fetch_artist_info);
        assert_eq!(config.recommender.iteration_count, default.recommender.iteration_count);
        assert_eq!(config.listenbrainz.max_sync_feedback_count, default.listenbrainz.max_sync_feedback_count);
    }

    #[test]
    fn unknown_keys_do_not_fail_parsing() {
        let config = Config::load_from_str("[database]\npath = \"x.db\"\nbogus-key = 1\n")
            .unwrap()
            .with_defaults();
        assert_eq!(config.database.path, Some("x.db".to_string()));
    }
}
