// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! The five `Associate*` steps (§4.3 steps 5-9): match sidecar files `DiscoverFiles` found but
//! didn't yet attach to anything — external lyrics, playlists, and artist/release/track cover
//! art — to the catalog rows they belong to.
//!
//! Every step works purely from [`ScanContext::discovered`], never re-reading a directory from
//! disk: [`crate::util::walk_dir`] already yields a directory's files in sorted order, so
//! iterating the in-memory list reproduces the same "first match wins, sorted order" rule
//! `DiscoverFiles` observed (DESIGN.md Open Question 1).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use rusqlite::OptionalExtension;

use crate::model::ids::{DirectoryId, ImageId, TrackId, TrackListId, UserId};
use crate::model::{LyricsBody, TrackListType, TrackListVisibility, UserType};

use super::super::{DiscoveredFile, DiscoveredKind, ScanContext, ScanError, StepStats};
use super::{db_helpers, SCAN_FILES_BATCH_SIZE};

fn stem_lower(path: &std::path::Path) -> Option<String> {
    path.file_stem().and_then(|s| s.to_str()).map(str::to_ascii_lowercase)
}

fn group_by_directory(files: &[DiscoveredFile], kind: DiscoveredKind) -> HashMap<DirectoryId, Vec<&DiscoveredFile>> {
    let mut map: HashMap<DirectoryId, Vec<&DiscoveredFile>> = HashMap::new();
    for file in files.iter().filter(|f| f.kind == kind) {
        map.entry(file.directory_id).or_default().push(file);
    }
    map
}

/// `AssociateExternalLyrics` (§4.3 step 5): for each audio file, find the first `.lrc`/`.txt`
/// sidecar in the same directory whose file stem matches (case-insensitive), and attach it to the
/// track's row as an external `TrackLyrics` entry.
pub(super) fn run_external_lyrics(
    ctx: &mut ScanContext<'_>,
    abort: &AtomicBool,
    on_batch: &mut dyn FnMut(StepStats),
) -> Result<(), ScanError> {
    let discovered = ctx.discovered().to_vec();
    let audio_files: Vec<&DiscoveredFile> = discovered.iter().filter(|f| f.kind == DiscoveredKind::Audio).collect();
    let lyrics_by_dir = group_by_directory(&discovered, DiscoveredKind::Lyrics);

    let mut total = StepStats { total_elems: audio_files.len() as u64, processed_elems: 0 };
    for batch in audio_files.chunks(SCAN_FILES_BATCH_SIZE) {
        if abort.load(Ordering::SeqCst) {
            return Ok(());
        }
        let tx = ctx.session().write()?;
        for file in batch {
            let Some(audio_stem) = stem_lower(&file.path) else { continue };
            let Some(candidates) = lyrics_by_dir.get(&file.directory_id) else { continue };
            let Some(lyrics_file) = candidates.iter().find(|l| stem_lower(&l.path).as_deref() == Some(audio_stem.as_str())) else {
                continue;
            };

            let audio_path_str = file.path.to_string_lossy().into_owned();
            let track_id: Option<i64> = tx
                .query_row("SELECT id FROM track WHERE path = ?1", [&audio_path_str], |row| row.get(0))
                .optional()?;
            let Some(track_id) = track_id.map(TrackId::new) else { continue };

            let lyrics_path = lyrics_file.path.to_string_lossy().into_owned();
            let already_linked: Option<i64> = tx
                .query_row(
                    "SELECT id FROM track_lyrics WHERE track_id = ?1 AND external_path = ?2",
                    rusqlite::params![track_id, lyrics_path],
                    |row| row.get(0),
                )
                .optional()?;
            if already_linked.is_some() {
                continue;
            }

            let text = match std::fs::read_to_string(&lyrics_file.path) {
                Ok(text) => text,
                Err(err) => {
                    log::warn!(target: "lms::scanner", "{}: {err}", lyrics_file.path.display());
                    ctx.stats_mut().errors += 1;
                    continue;
                }
            };
            let parsed = crate::scanner::lyrics::parse(&text);
            let body_json = match &parsed.body {
                LyricsBody::Synchronized(lines) => {
                    serde_json::to_string(&lines.iter().map(|l| (l.timestamp_ms, l.text.clone())).collect::<Vec<_>>())
                        .unwrap_or_else(|_| "[]".to_string())
                }
                LyricsBody::Unsynchronized(lines) => serde_json::to_string(lines).unwrap_or_else(|_| "[]".to_string()),
            };

            tx.execute("DELETE FROM track_lyrics WHERE track_id = ?1 AND external_path IS NOT NULL", [track_id.get()])?;
            tx.execute(
                "INSERT INTO track_lyrics (track_id, external_path, synchronized, body_json, language, \
                 display_artist, display_album, display_title, offset_ms) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                rusqlite::params![
                    track_id,
                    lyrics_path,
                    parsed.body.is_synchronized(),
                    body_json,
                    parsed.language,
                    parsed.display_artist,
                    parsed.display_album,
                    parsed.display_title,
                    parsed.offset_ms,
                ],
            )?;
            ctx.stats_mut().additions += 1;
        }
        tx.commit()?;
        total.processed_elems += batch.len() as u64;
        on_batch(total);
    }
    Ok(())
}

/// Parse an `.m3u`/`.m3u8` body into the list of entries it references, resolving any relative
/// entry against `base_dir` (§4.3 "playlist entries may be relative to the playlist's own
/// directory"). Comment lines (`#...`, including extended-M3U directives) and blank lines are
/// skipped; this is a path list, not a player.
fn parse_m3u(content: &str, base_dir: &std::path::Path) -> Vec<std::path::PathBuf> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| {
            let path = std::path::Path::new(line);
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                base_dir.join(path)
            }
        })
        .collect()
}

fn lowest_admin_user(tx: &crate::db::ReadTransaction<'_>) -> Result<Option<UserId>, ScanError> {
    Ok(tx
        .query_row(
            "SELECT id FROM user WHERE user_type = ?1 ORDER BY id ASC LIMIT 1",
            [UserType::Admin as i64],
            |row| row.get::<_, i64>(0),
        )
        .optional()?
        .map(UserId::new))
}

/// `AssociatePlayListFiles` (§4.3 step 6): parse every discovered playlist file and materialise it
/// as an `Internal` `TrackList`, resolving each entry to a `Track` row by path where possible.
///
/// Playlists are owned by the lowest-id `Admin` user (DESIGN.md Open Question 5), since the
/// schema requires every `TrackList` to have an owner but a filesystem playlist has none
/// naturally. If no admin exists yet, the step defers: the same files are picked up again on the
/// next scan once one does.
pub(super) fn run_playlist_files(
    ctx: &mut ScanContext<'_>,
    abort: &AtomicBool,
    on_batch: &mut dyn FnMut(StepStats),
) -> Result<(), ScanError> {
    let playlists: Vec<DiscoveredFile> = ctx.discovered().iter().filter(|f| f.kind == DiscoveredKind::PlayList).cloned().collect();
    let mut total = StepStats { total_elems: playlists.len() as u64, processed_elems: 0 };

    let owner_id = {
        let tx = ctx.session().read()?;
        let owner = lowest_admin_user(&tx)?;
        tx.commit()?;
        owner
    };
    let Some(owner_id) = owner_id else {
        log::warn!(target: "lms::scanner", "no admin user yet; deferring playlist association");
        return Ok(());
    };

    for batch in playlists.chunks(SCAN_FILES_BATCH_SIZE) {
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
            let content = match std::fs::read_to_string(&file.path) {
                Ok(content) => content,
                Err(err) => {
                    log::warn!(target: "lms::scanner", "{}: {err}", file.path.display());
                    ctx.stats_mut().errors += 1;
                    continue;
                }
            };
            let base_dir = file.path.parent().unwrap_or(&file.path);
            let entries = parse_m3u(&content, base_dir);
            let entries_json = crate::model::PlayListFile::encode_files(&entries);
            let stem = file.path.file_stem().and_then(|s| s.to_str()).unwrap_or("playlist").to_string();
            let file_last_modified_ms = metadata.modified().map(chrono::DateTime::<chrono::Utc>::from).unwrap_or_else(|_| chrono::Utc::now()).timestamp_millis();

            let existing: Option<(i64, i64)> = tx
                .query_row("SELECT id, track_list_id FROM playlist_file WHERE path = ?1", [&path_str], |row| Ok((row.get(0)?, row.get(1)?)))
                .optional()?;

            let (playlist_file_id, track_list_id, is_new) = if let Some((id, track_list_id)) = existing {
                tx.execute(
                    "UPDATE playlist_file SET file_size = ?1, file_last_modified = ?2, name = ?3, \
                     media_library_id = ?4, directory_id = ?5, entries_json = ?6 WHERE id = ?7",
                    rusqlite::params![metadata.len(), file_last_modified_ms, stem, file.media_library_id, file.directory_id, entries_json, id],
                )?;
                (id, TrackListId::new(track_list_id), false)
            } else {
                let track_list_id = match tx.execute(
                    "INSERT INTO track_list (name, list_type, visibility, owner_id, created, last_modified) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                    rusqlite::params![
                        stem,
                        TrackListType::Internal as i64,
                        TrackListVisibility::Public as i64,
                        owner_id,
                        chrono::Utc::now().timestamp_millis(),
                    ],
                ) {
                    Ok(_) => tx.connection().last_insert_rowid(),
                    Err(_) => {
                        // Name collides with another playlist owned by this admin; disambiguate with
                        // the containing directory's id, which is always unique.
                        let disambiguated = format!("{stem} [{}]", file.directory_id);
                        tx.execute(
                            "INSERT INTO track_list (name, list_type, visibility, owner_id, created, last_modified) \
                             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                            rusqlite::params![
                                disambiguated,
                                TrackListType::Internal as i64,
                                TrackListVisibility::Public as i64,
                                owner_id,
                                chrono::Utc::now().timestamp_millis(),
                            ],
                        )?;
                        tx.connection().last_insert_rowid()
                    }
                };
                tx.execute(
                    "INSERT INTO playlist_file (path, file_size, file_last_modified, name, media_library_id, \
                     directory_id, track_list_id, entries_json) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    rusqlite::params![path_str, metadata.len(), file_last_modified_ms, stem, file.media_library_id, file.directory_id, track_list_id, entries_json],
                )?;
                (tx.connection().last_insert_rowid(), TrackListId::new(track_list_id), true)
            };
            let _ = playlist_file_id;

            tx.execute("DELETE FROM track_list_entry WHERE track_list_id = ?1", [track_list_id.get()])?;
            for entry in &entries {
                let entry_str = entry.to_string_lossy().into_owned();
                let track_id: Option<i64> = tx
                    .query_row("SELECT id FROM track WHERE path = ?1", [&entry_str], |row| row.get(0))
                    .optional()?;
                if let Some(track_id) = track_id {
                    tx.execute(
                        "INSERT INTO track_list_entry (track_list_id, track_id, played_at) VALUES (?1, ?2, NULL)",
                        rusqlite::params![track_list_id, track_id],
                    )?;
                }
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

/// `AssociateArtistImages` (§4.3 step 7): for every discovered image whose stem matches an
/// artist credited on a track in the same directory, set that artist's portrait if it doesn't
/// have one yet.
pub(super) fn run_artist_images(
    ctx: &mut ScanContext<'_>,
    abort: &AtomicBool,
    on_batch: &mut dyn FnMut(StepStats),
) -> Result<(), ScanError> {
    let images: Vec<DiscoveredFile> = ctx.discovered().iter().filter(|f| f.kind == DiscoveredKind::Image).cloned().collect();
    let mut total = StepStats { total_elems: images.len() as u64, processed_elems: 0 };

    for batch in images.chunks(SCAN_FILES_BATCH_SIZE) {
        if abort.load(Ordering::SeqCst) {
            return Ok(());
        }
        let tx = ctx.session().write()?;
        for file in batch {
            let Some(stem) = stem_lower(&file.path) else { continue };
            let mut stmt = tx.prepare(
                "SELECT DISTINCT a.id FROM artist a \
                 JOIN track_artist_link tal ON tal.artist_id = a.id \
                 JOIN track t ON t.id = tal.track_id \
                 WHERE t.directory_id = ?1 AND a.image_id IS NULL AND lower(a.name) = ?2",
            )?;
            let artist_id: Option<i64> = stmt.query_row(rusqlite::params![file.directory_id, stem], |row| row.get(0)).optional()?;
            drop(stmt);
            let Some(artist_id) = artist_id else { continue };

            let metadata = match std::fs::metadata(&file.path) {
                Ok(m) => m,
                Err(err) => {
                    log::warn!(target: "lms::scanner", "{}: {err}", file.path.display());
                    ctx.stats_mut().errors += 1;
                    continue;
                }
            };
            let mtime_ms = metadata.modified().map(chrono::DateTime::<chrono::Utc>::from).unwrap_or_else(|_| chrono::Utc::now()).timestamp_millis();
            let image_id = db_helpers::ensure_image(tx.connection(), &file.path.to_string_lossy(), metadata.len(), mtime_ms)?;
            tx.execute("UPDATE artist SET image_id = ?1 WHERE id = ?2", rusqlite::params![image_id, artist_id])?;
            ctx.stats_mut().updates += 1;
        }
        tx.commit()?;
        total.processed_elems += batch.len() as u64;
        on_batch(total);
    }
    Ok(())
}

const COVER_LIKE_STEMS: &[&str] = &["cover", "folder", "front", "album", "albumart"];

/// `AssociateReleaseImages` (§4.3 step 8): for every discovered image whose stem is a
/// conventional cover-art name (or matches the release's own name) and sits in a directory
/// holding tracks of a release without a cover yet, set that release's cover.
pub(super) fn run_release_images(
    ctx: &mut ScanContext<'_>,
    abort: &AtomicBool,
    on_batch: &mut dyn FnMut(StepStats),
) -> Result<(), ScanError> {
    let images: Vec<DiscoveredFile> = ctx.discovered().iter().filter(|f| f.kind == DiscoveredKind::Image).cloned().collect();
    let mut total = StepStats { total_elems: images.len() as u64, processed_elems: 0 };

    for batch in images.chunks(SCAN_FILES_BATCH_SIZE) {
        if abort.load(Ordering::SeqCst) {
            return Ok(());
        }
        let tx = ctx.session().write()?;
        for file in batch {
            let Some(stem) = stem_lower(&file.path) else { continue };
            let is_cover_like = COVER_LIKE_STEMS.contains(&stem.as_str());
            let release_id: Option<i64> = if is_cover_like {
                tx.query_row(
                    "SELECT DISTINCT r.id FROM release r JOIN track t ON t.release_id = r.id \
                     WHERE t.directory_id = ?1 AND r.cover_image_id IS NULL",
                    [file.directory_id],
                    |row| row.get(0),
                )
                .optional()?
            } else {
                tx.query_row(
                    "SELECT DISTINCT r.id FROM release r JOIN track t ON t.release_id = r.id \
                     WHERE t.directory_id = ?1 AND r.cover_image_id IS NULL AND lower(r.name) = ?2",
                    rusqlite::params![file.directory_id, stem],
                    |row| row.get(0),
                )
                .optional()?
            };
            let Some(release_id) = release_id else { continue };

            let metadata = match std::fs::metadata(&file.path) {
                Ok(m) => m,
                Err(err) => {
                    log::warn!(target: "lms::scanner", "{}: {err}", file.path.display());
                    ctx.stats_mut().errors += 1;
                    continue;
                }
            };
            let mtime_ms = metadata.modified().map(chrono::DateTime::<chrono::Utc>::from).unwrap_or_else(|_| chrono::Utc::now()).timestamp_millis();
            let image_id = db_helpers::ensure_image(tx.connection(), &file.path.to_string_lossy(), metadata.len(), mtime_ms)?;
            tx.execute("UPDATE release SET cover_image_id = ?1 WHERE id = ?2", rusqlite::params![image_id, release_id])?;
            ctx.stats_mut().updates += 1;
        }
        tx.commit()?;
        total.processed_elems += batch.len() as u64;
        on_batch(total);
    }
    Ok(())
}

/// `AssociateTrackImages` (§4.3 step 9): the model has no per-track cover column (a release's
/// cover is its only artwork slot — DESIGN.md Open Question 5), so this step handles the layout
/// `AssociateReleaseImages` can't: a release whose tracks are scattered one-per-directory (a
/// singles/compilation layout with no shared folder-level cover). For each directory holding
/// exactly one track of a release that still has no cover, any image found there is assumed to be
/// that track's own artwork and is promoted to the release's cover.
pub(super) fn run_track_images(
    ctx: &mut ScanContext<'_>,
    abort: &AtomicBool,
    on_batch: &mut dyn FnMut(StepStats),
) -> Result<(), ScanError> {
    let images: Vec<DiscoveredFile> = ctx.discovered().iter().filter(|f| f.kind == DiscoveredKind::Image).cloned().collect();
    let mut total = StepStats { total_elems: images.len() as u64, processed_elems: 0 };

    for batch in images.chunks(SCAN_FILES_BATCH_SIZE) {
        if abort.load(Ordering::SeqCst) {
            return Ok(());
        }
        let tx = ctx.session().write()?;
        for file in batch {
            let track_count: i64 = tx
                .query_row("SELECT COUNT(*) FROM track WHERE directory_id = ?1", [file.directory_id], |row| row.get(0))?;
            if track_count != 1 {
                continue;
            }
            let release_id: Option<i64> = tx
                .query_row(
                    "SELECT r.id FROM release r JOIN track t ON t.release_id = r.id \
                     WHERE t.directory_id = ?1 AND r.cover_image_id IS NULL",
                    [file.directory_id],
                    |row| row.get(0),
                )
                .optional()?;
            let Some(release_id) = release_id else { continue };

            let metadata = match std::fs::metadata(&file.path) {
                Ok(m) => m,
                Err(err) => {
                    log::warn!(target: "lms::scanner", "{}: {err}", file.path.display());
                    ctx.stats_mut().errors += 1;
                    continue;
                }
            };
            let mtime_ms = metadata.modified().map(chrono::DateTime::<chrono::Utc>::from).unwrap_or_else(|_| chrono::Utc::now()).timestamp_millis();
            let image_id: ImageId = db_helpers::ensure_image(tx.connection(), &file.path.to_string_lossy(), metadata.len(), mtime_ms)?;
            tx.execute("UPDATE release SET cover_image_id = ?1 WHERE id = ?2", rusqlite::params![image_id, release_id])?;
            ctx.stats_mut().updates += 1;
        }
        tx.commit()?;
        total.processed_elems += batch.len() as u64;
        on_batch(total);
    }
    Ok(())
}
