// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! `UpdateLibraryFields` (§4.3 step 3), grounded on `ScanStepUpdateLibraryFields.cpp`: after a
//! `MediaLibrary`'s configured root changes, fix up every `Directory` row under that root whose
//! recorded `media_library_id` is stale.
//!
//! Each pass re-queries the same `Range{0, batchSize}` window: once a batch of mismatches is
//! fixed, those rows no longer match the query, so the next iteration naturally sees the next
//! batch at offset zero. A library that's gone by the time its write transaction opens (a
//! concurrent removal) is skipped rather than treated as an error.

use std::sync::atomic::{AtomicBool, Ordering};

use super::super::{ScanContext, ScanError, StepStats};
use super::LIBRARY_FIELDS_BATCH_SIZE;

pub(super) fn run(
    ctx: &mut ScanContext<'_>,
    abort: &AtomicBool,
    on_batch: &mut dyn FnMut(StepStats),
) -> Result<(), ScanError> {
    let libraries: Vec<(std::path::PathBuf, crate::model::ids::MediaLibraryId)> =
        ctx.libraries().iter().map(|(path, id)| (path.clone(), *id)).collect();

    let mut total = StepStats::default();
    for (root, library_id) in libraries {
        let root_str = root.to_string_lossy().into_owned();
        loop {
            if abort.load(Ordering::SeqCst) {
                return Ok(());
            }

            let mismatched: Vec<i64> = {
                let tx = ctx.session().read()?;
                let exists: Option<i64> = tx
                    .query_row("SELECT id FROM media_library WHERE id = ?1", [library_id.get()], |row| row.get(0))
                    .ok();
                if exists.is_none() {
                    Vec::new()
                } else {
                    let mut stmt = tx.prepare(
                        "SELECT id FROM directory WHERE (path = ?1 OR path LIKE ?2) AND media_library_id != ?3 \
                         LIMIT ?4",
                    )?;
                    let like_pattern = format!("{root_str}/%");
                    let rows = stmt
                        .query_map(
                            rusqlite::params![root_str, like_pattern, library_id.get(), LIBRARY_FIELDS_BATCH_SIZE],
                            |row| row.get::<_, i64>(0),
                        )?
                        .collect::<rusqlite::Result<Vec<_>>>()?;
                    drop(stmt);
                    rows
                }
            };

            if mismatched.is_empty() {
                break;
            }

            let tx = ctx.session().write()?;
            let still_exists: Option<i64> = tx
                .query_row("SELECT id FROM media_library WHERE id = ?1", [library_id.get()], |row| row.get(0))
                .ok();
            if still_exists.is_none() {
                // Removed concurrently between the read above and this write; legitimate, skip.
                break;
            }
            for directory_id in &mismatched {
                tx.execute(
                    "UPDATE directory SET media_library_id = ?1 WHERE id = ?2",
                    rusqlite::params![library_id.get(), directory_id],
                )?;
            }
            tx.commit()?;

            total.processed_elems += mismatched.len() as u64;
            on_batch(total);
        }
    }
    Ok(())
}
