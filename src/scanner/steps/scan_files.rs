// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! `ScanFiles` (§4.3 step 4): for every file `DiscoverFiles` classified as audio, skip it if its
//! `(size, mtime, scan_version)` still matches the stored row (`ScanKind::Incremental`),
//! otherwise parse its tags, run the configured analyzers, and upsert the `Track` row plus its
//! `Release`/`Artist`/`Cluster`/embedded-lyrics relations.
//!
//! Per-file errors (an unreadable file, a tag parser failure, an analyzer failure) are always
//! recovered locally: logged, counted in [`crate::scanner::ScanStats::errors`], and the file is
//! skipped rather than aborting the batch (§7 propagation policy).

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension;

use crate::analyzer::{self, CompoundAnalyzerResult};
use crate::model::ArtistLinkType;
use crate::model::ids::{ArtistId, ClusterId, ReleaseId, TrackId};
use crate::tag::{Tag, TagKey, TaggedFile};
use crate::util::string::{from_iso8601, split_tag_value};

use super::super::{DiscoveredKind, ScanContext, ScanError, ScanKind, StepStats};
use super::{db_helpers, SCAN_FILES_BATCH_SIZE};

fn tag_value<'a>(file: &'a TaggedFile, key: TagKey) -> Option<&'a str> {
    file.tags().iter().find_map(|tag| tag.get(&key))
}

fn parse_u32(value: &str) -> Option<u32> {
    let digits: String = value.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        None
    } else {
        digits.parse().ok()
    }
}

fn parse_date_tag(value: &str) -> Option<DateTime<Utc>> {
    if let Some(dt) = from_iso8601(value) {
        return Some(dt);
    }
    if let Ok(date) = chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    crate::util::parse_year_from_str(value)
        .and_then(|year| chrono::NaiveDate::from_ymd_opt(year, 1, 1))
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Split the artist names credited by `key`, honouring `artists-to-not-split`.
fn split_artist_names<'a>(file: &'a TaggedFile, key: TagKey, ctx: &ScanContext<'_>) -> Vec<&'a str> {
    let Some(value) = tag_value(file, key) else { return Vec::new() };
    let delimiters = ctx.config().scanner.artist_tag_delimiters.clone().unwrap_or_default();
    let never_split = ctx.config().scanner.artists_to_not_split.clone().unwrap_or_default();
    split_tag_value(value, &delimiters, &never_split)
}

fn split_default<'a>(file: &'a TaggedFile, key: TagKey, ctx: &ScanContext<'_>) -> Vec<&'a str> {
    let Some(value) = tag_value(file, key) else { return Vec::new() };
    let delimiters = ctx.config().scanner.default_tag_delimiters.clone().unwrap_or_default();
    split_tag_value(value, &delimiters, &[])
}

struct Extracted {
    track_number: Option<u32>,
    total_tracks: Option<u32>,
    disc_number: Option<u32>,
    total_discs: Option<u32>,
    release_date: Option<DateTime<Utc>>,
    original_release_date: Option<DateTime<Utc>>,
    mbid_recording: Option<String>,
    mbid_release: Option<String>,
    mbid_track: Option<String>,
    mbid_release_group: Option<String>,
    copyright: Option<String>,
    release_name: Option<String>,
    release_sort_name: Option<String>,
    release_year: Option<i32>,
    release_original_year: Option<i32>,
    artists: Vec<String>,
    album_artists: Vec<String>,
    composers: Vec<String>,
    genres: Vec<String>,
    replay_gain_track_gain: Option<f64>,
    replay_gain_track_peak: Option<f64>,
    replay_gain_release_gain: Option<f64>,
    replay_gain_release_peak: Option<f64>,
    lyrics: Option<String>,
}

fn extract(file: &TaggedFile, ctx: &ScanContext<'_>) -> Extracted {
    let release_date = tag_value(file, TagKey::ReleaseDate).and_then(parse_date_tag);
    let original_release_date = tag_value(file, TagKey::OriginalReleaseDate).and_then(parse_date_tag);
    Extracted {
        track_number: tag_value(file, TagKey::TrackNumber).and_then(parse_u32),
        total_tracks: tag_value(file, TagKey::TotalTracks).and_then(parse_u32),
        disc_number: tag_value(file, TagKey::DiscNumber).and_then(parse_u32),
        total_discs: tag_value(file, TagKey::TotalDiscs).and_then(parse_u32),
        mbid_recording: tag_value(file, TagKey::MusicBrainzRecordingId).map(str::to_string),
        mbid_release: tag_value(file, TagKey::MusicBrainzReleaseId).map(str::to_string),
        mbid_track: tag_value(file, TagKey::MusicBrainzTrackId).map(str::to_string),
        mbid_release_group: tag_value(file, TagKey::MusicBrainzReleaseGroupId).map(str::to_string),
        copyright: tag_value(file, TagKey::Copyright).map(str::to_string),
        release_name: tag_value(file, TagKey::Album).map(str::to_string),
        release_sort_name: tag_value(file, TagKey::AlbumSortOrder)
            .map(str::to_string)
            .or_else(|| tag_value(file, TagKey::Album).map(str::to_string)),
        release_year: release_date
            .map(|dt| dt.format("%Y").to_string().parse().unwrap_or(0))
            .or_else(|| tag_value(file, TagKey::ReleaseYear).and_then(parse_u32).map(|y| y as i32)),
        release_original_year: original_release_date
            .map(|dt| dt.format("%Y").to_string().parse().unwrap_or(0))
            .or_else(|| tag_value(file, TagKey::OriginalReleaseYear).and_then(parse_u32).map(|y| y as i32)),
        release_date,
        original_release_date,
        artists: split_artist_names(file, TagKey::Artist, ctx).into_iter().map(str::to_string).collect(),
        album_artists: split_artist_names(file, TagKey::AlbumArtist, ctx).into_iter().map(str::to_string).collect(),
        composers: split_default(file, TagKey::Composer, ctx).into_iter().map(str::to_string).collect(),
        genres: split_default(file, TagKey::Genre, ctx).into_iter().map(str::to_string).collect(),
        replay_gain_track_gain: tag_value(file, TagKey::ReplayGainTrackGain).and_then(|v| v.parse().ok()),
        replay_gain_track_peak: tag_value(file, TagKey::ReplayGainTrackPeak).and_then(|v| v.parse().ok()),
        replay_gain_release_gain: tag_value(file, TagKey::ReplayGainAlbumGain).and_then(|v| v.parse().ok()),
        replay_gain_release_peak: tag_value(file, TagKey::ReplayGainAlbumPeak).and_then(|v| v.parse().ok()),
        lyrics: tag_value(file, TagKey::Lyrics).map(str::to_string),
    }
}

fn link_type_to_i64(link_type: ArtistLinkType) -> i64 {
    link_type as i64
}

#[allow(clippy::too_many_arguments)]
fn upsert_track(
    conn: &rusqlite::Connection,
    ctx: &ScanContext<'_>,
    path: &str,
    file_size: u64,
    file_last_modified: &DateTime<Utc>,
    scan_version: u32,
    duration_ms: u64,
    extracted: &Extracted,
    analysis: &CompoundAnalyzerResult,
    release_id: Option<ReleaseId>,
    media_library_id: crate::model::ids::MediaLibraryId,
    directory_id: crate::model::ids::DirectoryId,
    artist_links: &[(ArtistId, ArtistLinkType)],
    cluster_ids: &[ClusterId],
) -> Result<(TrackId, bool), ScanError> {
    let acoustic_fingerprint: Option<String> = analysis
        .chromaprint_fingerprint
        .as_ref()
        .and_then(|r| r.as_ref().ok())
        .map(|fp| fp.fingerprint_string());

    let (replay_gain_track_gain, replay_gain_track_peak) = match analysis.ebur128.as_ref().and_then(|r| r.as_ref().ok()) {
        Some(ebur128) => (
            extracted.replay_gain_track_gain.or(Some(ebur128.replaygain_track_gain())),
            extracted.replay_gain_track_peak.or(Some(ebur128.peak)),
        ),
        None => (extracted.replay_gain_track_gain, extracted.replay_gain_track_peak),
    };

    let existing_id: Option<i64> = conn.query_row("SELECT id FROM track WHERE path = ?1", [path], |row| row.get(0)).optional()?;
    let is_new = existing_id.is_none();
    let now_ms = Utc::now().timestamp_millis();

    let track_id = if let Some(id) = existing_id {
        conn.execute(
            "UPDATE track SET file_size=?1, file_last_modified=?2, scan_version=?3, duration_ms=?4, \
             track_number=?5, total_tracks=?6, disc_number=?7, total_discs=?8, release_date=?9, \
             original_release_date=?10, mbid_recording=?11, mbid_release=?12, mbid_track=?13, \
             replay_gain_track_gain=?14, replay_gain_track_peak=?15, replay_gain_release_gain=?16, \
             replay_gain_release_peak=?17, copyright=?18, release_id=?19, media_library_id=?20, \
             directory_id=?21, acoustic_fingerprint=?22 WHERE id = ?23",
            rusqlite::params![
                file_size,
                file_last_modified.timestamp_millis(),
                scan_version,
                duration_ms,
                extracted.track_number,
                extracted.total_tracks,
                extracted.disc_number,
                extracted.total_discs,
                extracted.release_date.map(|d| d.timestamp_millis()),
                extracted.original_release_date.map(|d| d.timestamp_millis()),
                extracted.mbid_recording,
                extracted.mbid_release,
                extracted.mbid_track,
                replay_gain_track_gain,
                replay_gain_track_peak,
                extracted.replay_gain_release_gain,
                extracted.replay_gain_release_peak,
                extracted.copyright,
                release_id.map(ReleaseId::get),
                media_library_id,
                directory_id,
                acoustic_fingerprint,
                id,
            ],
        )?;
        TrackId::new(id)
    } else {
        conn.execute(
            "INSERT INTO track (path, file_size, file_last_modified, scan_imported_time, scan_version, \
             duration_ms, track_number, total_tracks, disc_number, total_discs, release_date, \
             original_release_date, mbid_recording, mbid_release, mbid_track, replay_gain_track_gain, \
             replay_gain_track_peak, replay_gain_release_gain, replay_gain_release_peak, copyright, \
             release_id, media_library_id, directory_id, acoustic_fingerprint) \
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17,?18,?19,?20,?21,?22,?23)",
            rusqlite::params![
                path,
                file_size,
                file_last_modified.timestamp_millis(),
                now_ms,
                scan_version,
                duration_ms,
                extracted.track_number,
                extracted.total_tracks,
                extracted.disc_number,
                extracted.total_discs,
                extracted.release_date.map(|d| d.timestamp_millis()),
                extracted.original_release_date.map(|d| d.timestamp_millis()),
                extracted.mbid_recording,
                extracted.mbid_release,
                extracted.mbid_track,
                replay_gain_track_gain,
                replay_gain_track_peak,
                extracted.replay_gain_release_gain,
                extracted.replay_gain_release_peak,
                extracted.copyright,
                release_id.map(ReleaseId::get),
                media_library_id,
                directory_id,
                acoustic_fingerprint,
            ],
        )?;
        TrackId::new(conn.last_insert_rowid())
    };
    let _ = ctx; // config access already consumed before this call

    conn.execute("DELETE FROM track_artist_link WHERE track_id = ?1", [track_id.get()])?;
    for (artist_id, link_type) in artist_links {
        conn.execute(
            "INSERT INTO track_artist_link (track_id, artist_id, link_type) VALUES (?1, ?2, ?3)",
            rusqlite::params![track_id, *artist_id, link_type_to_i64(*link_type)],
        )?;
    }

    conn.execute("DELETE FROM track_cluster WHERE track_id = ?1", [track_id.get()])?;
    for cluster_id in cluster_ids {
        conn.execute(
            "INSERT OR IGNORE INTO track_cluster (track_id, cluster_id) VALUES (?1, ?2)",
            rusqlite::params![track_id, *cluster_id],
        )?;
    }

    Ok((track_id, is_new))
}

fn upsert_embedded_lyrics(conn: &rusqlite::Connection, track_id: TrackId, text: &str) -> Result<(), ScanError> {
    let parsed = crate::scanner::lyrics::parse(text);
    let body_json = match &parsed.body {
        crate::model::LyricsBody::Synchronized(lines) => serde_json::to_string(
            &lines.iter().map(|l| (l.timestamp_ms, l.text.clone())).collect::<Vec<_>>(),
        )
        .unwrap_or_else(|_| "[]".to_string()),
        crate::model::LyricsBody::Unsynchronized(lines) => serde_json::to_string(lines).unwrap_or_else(|_| "[]".to_string()),
    };
    conn.execute("DELETE FROM track_lyrics WHERE track_id = ?1 AND external_path IS NULL", [track_id.get()])?;
    conn.execute(
        "INSERT INTO track_lyrics (track_id, external_path, synchronized, body_json, language, \
         display_artist, display_album, display_title, offset_ms) VALUES (?1, NULL, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            track_id,
            parsed.body.is_synchronized(),
            body_json,
            parsed.language,
            parsed.display_artist,
            parsed.display_album,
            parsed.display_title,
            parsed.offset_ms,
        ],
    )?;
    Ok(())
}

pub(super) fn run(
    ctx: &mut ScanContext<'_>,
    abort: &AtomicBool,
    on_batch: &mut dyn FnMut(StepStats),
) -> Result<(), ScanError> {
    let audio_files: Vec<_> = ctx
        .discovered()
        .iter()
        .filter(|f| f.kind == DiscoveredKind::Audio)
        .cloned()
        .collect();

    let mut total = StepStats { total_elems: audio_files.len() as u64, processed_elems: 0 };
    let scan_version = ctx.scan_settings().audio_scan_version;
    let kind = ctx.kind();
    let mut seen_mbids: std::collections::HashSet<String> = std::collections::HashSet::new();

    for batch in audio_files.chunks(SCAN_FILES_BATCH_SIZE) {
        if abort.load(Ordering::SeqCst) {
            return Ok(());
        }

        let tx = ctx.session().write()?;
        for file in batch {
            let path_str = file.path.to_string_lossy().into_owned();
            let metadata = match std::fs::metadata(&file.path) {
                Ok(m) => m,
                Err(err) => {
                    log::warn!(target: "lms::scanner", "{}: {err}", file.path.display());
                    ctx.stats_mut().errors += 1;
                    continue;
                }
            };
            let file_size = metadata.len();
            let file_last_modified: DateTime<Utc> = metadata.modified().map(DateTime::from).unwrap_or_else(|_| Utc::now());

            if kind == ScanKind::Incremental {
                let existing: Option<(i64, i64, u32)> = tx
                    .query_row(
                        "SELECT file_size, file_last_modified, scan_version FROM track WHERE path = ?1",
                        [&path_str],
                        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                    )
                    .optional()?;
                if let Some((existing_size, existing_mtime_ms, existing_version)) = existing {
                    if existing_size as u64 == file_size
                        && existing_mtime_ms == file_last_modified.timestamp_millis()
                        && existing_version == scan_version
                    {
                        ctx.stats_mut().skipped += 1;
                        continue;
                    }
                }
            }

            let tagged_file = match TaggedFile::read_from_path(&file.path) {
                Ok(tagged) => tagged,
                Err(err) => {
                    log::warn!(target: "lms::scanner", "{}: tag parse failed: {err}", file.path.display());
                    ctx.stats_mut().errors += 1;
                    continue;
                }
            };
            let extracted = extract(&tagged_file, ctx);

            if ctx.config().scanner.skip_duplicate_track_mbid.unwrap_or(false) {
                if let Some(mbid) = &extracted.mbid_recording {
                    let already_known = seen_mbids.contains(mbid)
                        || tx
                            .query_row(
                                "SELECT 1 FROM track WHERE mbid_recording = ?1 AND path != ?2",
                                rusqlite::params![mbid, path_str],
                                |_| Ok(()),
                            )
                            .optional()?
                            .is_some();
                    if already_known {
                        ctx.stats_mut().skipped += 1;
                        continue;
                    }
                    seen_mbids.insert(mbid.clone());
                }
            }

            let analysis = match analyzer::analyze(ctx.config(), &file.path) {
                Ok(result) => result,
                Err(err) => {
                    log::warn!(target: "lms::scanner", "{}: analysis failed: {err}", file.path.display());
                    ctx.stats_mut().errors += 1;
                    CompoundAnalyzerResult::default()
                }
            };
            let duration_ms = analysis
                .track_length
                .as_ref()
                .and_then(|r| r.as_ref().ok())
                .map(|d| d.num_milliseconds().max(0) as u64)
                .unwrap_or(0);

            let release_id = extracted.release_name.as_deref().map(|name| {
                db_helpers::ensure_release(
                    tx.connection(),
                    name,
                    extracted.release_sort_name.as_deref().unwrap_or(name),
                    extracted.mbid_release_group.as_deref(),
                    extracted.release_year,
                    extracted.release_original_year,
                    extracted.total_discs,
                )
            });
            let release_id = match release_id {
                Some(Ok(id)) => Some(id),
                Some(Err(err)) => return Err(err),
                None => None,
            };

            let mut artist_links = Vec::new();
            for name in &extracted.artists {
                let id = db_helpers::ensure_artist(tx.connection(), name, name, None)?;
                artist_links.push((id, ArtistLinkType::Artist));
            }
            for name in &extracted.album_artists {
                let id = db_helpers::ensure_artist(tx.connection(), name, name, None)?;
                artist_links.push((id, ArtistLinkType::ReleaseArtist));
            }
            for name in &extracted.composers {
                let id = db_helpers::ensure_artist(tx.connection(), name, name, None)?;
                artist_links.push((id, ArtistLinkType::Composer));
            }

            let mut cluster_ids = Vec::new();
            if !extracted.genres.is_empty() {
                let cluster_type_id = db_helpers::ensure_cluster_type(tx.connection(), "genre")?;
                for genre in &extracted.genres {
                    cluster_ids.push(db_helpers::ensure_cluster(tx.connection(), cluster_type_id, genre)?);
                }
            }

            let (track_id, is_new) = upsert_track(
                tx.connection(),
                ctx,
                &path_str,
                file_size,
                &file_last_modified,
                scan_version,
                duration_ms,
                &extracted,
                &analysis,
                release_id,
                file.media_library_id,
                file.directory_id,
                &artist_links,
                &cluster_ids,
            )?;

            if let Some(lyrics_text) = &extracted.lyrics {
                upsert_embedded_lyrics(tx.connection(), track_id, lyrics_text)?;
            }

            if is_new {
                ctx.stats_mut().additions += 1;
            } else {
                ctx.stats_mut().updates += 1;
            }
        }
        tx.commit()?;

        total.processed_elems += batch.len() as u64;
        on_batch(total);
    }

    Ok(())
}
