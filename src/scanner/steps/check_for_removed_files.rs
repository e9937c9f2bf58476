// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! `CheckForRemovedFiles` (§4.3 step 2), grounded on `ScanStepCheckForRemovedFiles.cpp`: for each
//! object type backed by a file on disk, page through it in a read transaction and remove the
//! rows whose file is gone (or no longer under a configured library, or no longer a recognised
//! extension) in a separate write transaction, one batch at a time.
//!
//! The original template also checks an `ArtistInfo` object type; this model has no standalone
//! `ArtistInfo` entity (artist metadata lives directly on the `Artist` row), so that sub-case is
//! dropped — see `DESIGN.md`.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use rusqlite::OptionalExtension;

use super::super::{ScanContext, ScanError, StepStats};
use super::discover_files::{IMAGE_EXTENSIONS, PLAYLIST_EXTENSIONS};
use super::REMOVED_FILES_BATCH_SIZE;

/// One object type the step pages through, described entirely by SQL so the batch loop below is
/// generic.
struct RemovableObject {
    /// `SELECT COUNT(*) FROM ...` for the up-front total.
    count_sql: &'static str,
    /// `SELECT id, <path column> FROM ... WHERE id > ?1 ORDER BY id LIMIT ?2`.
    page_sql: &'static str,
    /// `DELETE FROM ... WHERE id = ?1`.
    delete_sql: &'static str,
    /// Extensions still recognised for this type, or empty to skip the extension check
    /// (external lyrics/playlist sidecars accept any extension their own discovery step does).
    extensions: &'static [&'static str],
}

fn track_object() -> RemovableObject {
    RemovableObject {
        count_sql: "SELECT COUNT(*) FROM track",
        page_sql: "SELECT id, path FROM track WHERE id > ?1 ORDER BY id LIMIT ?2",
        delete_sql: "DELETE FROM track WHERE id = ?1",
        extensions: crate::tag::TaggedFile::recognised_extensions(),
    }
}

fn image_object() -> RemovableObject {
    RemovableObject {
        count_sql: "SELECT COUNT(*) FROM image",
        page_sql: "SELECT id, path FROM image WHERE id > ?1 ORDER BY id LIMIT ?2",
        delete_sql: "DELETE FROM image WHERE id = ?1",
        extensions: IMAGE_EXTENSIONS,
    }
}

fn external_lyrics_object() -> RemovableObject {
    RemovableObject {
        count_sql: "SELECT COUNT(*) FROM track_lyrics WHERE external_path IS NOT NULL",
        page_sql: "SELECT id, external_path FROM track_lyrics WHERE external_path IS NOT NULL AND id > ?1 ORDER BY id LIMIT ?2",
        delete_sql: "DELETE FROM track_lyrics WHERE id = ?1",
        extensions: &[],
    }
}

fn playlist_file_object() -> RemovableObject {
    RemovableObject {
        count_sql: "SELECT COUNT(*) FROM playlist_file",
        page_sql: "SELECT id, path FROM playlist_file WHERE id > ?1 ORDER BY id LIMIT ?2",
        delete_sql: "DELETE FROM playlist_file WHERE id = ?1",
        extensions: PLAYLIST_EXTENSIONS,
    }
}

fn file_is_removed(path: &str, object: &RemovableObject, ctx: &ScanContext<'_>) -> bool {
    let path = Path::new(path);
    if !path.is_file() {
        return true;
    }
    if !object.extensions.is_empty() {
        let recognised = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| object.extensions.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if !recognised {
            return true;
        }
    }
    let under_any_library = ctx.libraries().keys().any(|root| crate::util::is_under_root(path, root));
    !under_any_library
}

fn check_object(
    ctx: &mut ScanContext<'_>,
    abort: &AtomicBool,
    object: &RemovableObject,
    total: &mut StepStats,
    on_batch: &mut dyn FnMut(StepStats),
) -> Result<(), ScanError> {
    let mut last_id = 0i64;
    loop {
        if abort.load(Ordering::SeqCst) {
            return Ok(());
        }

        let rows: Vec<(i64, String)> = {
            let tx = ctx.session().read()?;
            let mut stmt = tx.prepare(object.page_sql)?;
            let rows = stmt
                .query_map(rusqlite::params![last_id, REMOVED_FILES_BATCH_SIZE], |row| {
                    Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            drop(stmt);
            tx.commit()?;
            rows
        };

        if rows.is_empty() {
            break;
        }
        last_id = rows.last().map(|(id, _)| *id).unwrap_or(last_id);

        let to_remove: Vec<i64> = rows
            .iter()
            .filter(|(_, path)| file_is_removed(path, object, ctx))
            .map(|(id, _)| *id)
            .collect();

        if !to_remove.is_empty() {
            let tx = ctx.session().write()?;
            for id in &to_remove {
                tx.execute(object.delete_sql, [id])?;
            }
            tx.commit()?;
            ctx.stats_mut().deletions += to_remove.len() as u64;
        }

        total.processed_elems += rows.len() as u64;
        on_batch(*total);

        if rows.len() < REMOVED_FILES_BATCH_SIZE {
            break;
        }
    }
    Ok(())
}

pub(super) fn run(
    ctx: &mut ScanContext<'_>,
    abort: &AtomicBool,
    on_batch: &mut dyn FnMut(StepStats),
) -> Result<(), ScanError> {
    let objects = [
        track_object(),
        image_object(),
        external_lyrics_object(),
        playlist_file_object(),
    ];

    let mut total = StepStats::default();
    {
        let tx = ctx.session().read()?;
        for object in &objects {
            let count: i64 = tx.query_row(object.count_sql, [], |row| row.get(0)).optional()?.unwrap_or(0);
            total.total_elems += count.max(0) as u64;
        }
        tx.commit()?;
    }

    for object in &objects {
        if abort.load(Ordering::SeqCst) {
            break;
        }
        check_object(ctx, abort, object, &mut total, on_batch)?;
    }
    Ok(())
}
