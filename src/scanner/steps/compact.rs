// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! `Compact` (§4.3 step 11): garbage-collect `Artist`/`Release`/`ClusterType`/`Cluster`/`Label`/
//! `ReleaseType` rows with zero inbound references (§3 invariants 3-5, §8 `GCCorrectness`).
//!
//! Releases and artists are reachable only through a `Track`; clusters only through `track_cluster`
//! membership. Labels and release types are reachable only through a `Release`, so they must be
//! swept *after* orphan releases are removed (`ON DELETE CASCADE` on `release_label`/
//! `release_release_type` already drops the join rows when their release goes). Cluster types
//! follow clusters the same way. The whole pass runs as one write transaction: it only ever
//! deletes rows that are already unreachable, so there's nothing to commit incrementally.

use std::sync::atomic::{AtomicBool, Ordering};

use super::super::{ScanContext, ScanError, StepStats};

/// One `DELETE ... WHERE NOT EXISTS (...)` sweep, run in dependency order (each entry must not
/// depend on an entity removed by a sweep that runs after it).
const SWEEPS: &[(&str, &str)] = &[
    (
        "release",
        "DELETE FROM release WHERE NOT EXISTS (SELECT 1 FROM track WHERE track.release_id = release.id)",
    ),
    (
        "label",
        "DELETE FROM label WHERE NOT EXISTS (SELECT 1 FROM release_label WHERE release_label.label_id = label.id)",
    ),
    (
        "release_type",
        "DELETE FROM release_type WHERE NOT EXISTS \
         (SELECT 1 FROM release_release_type WHERE release_release_type.release_type_id = release_type.id)",
    ),
    (
        "artist",
        "DELETE FROM artist WHERE NOT EXISTS (SELECT 1 FROM track_artist_link WHERE track_artist_link.artist_id = artist.id)",
    ),
    (
        "cluster",
        "DELETE FROM cluster WHERE NOT EXISTS (SELECT 1 FROM track_cluster WHERE track_cluster.cluster_id = cluster.id)",
    ),
    (
        "cluster_type",
        "DELETE FROM cluster_type WHERE NOT EXISTS (SELECT 1 FROM cluster WHERE cluster.cluster_type_id = cluster_type.id)",
    ),
];

pub(super) fn run(
    ctx: &mut ScanContext<'_>,
    abort: &AtomicBool,
    on_batch: &mut dyn FnMut(StepStats),
) -> Result<(), ScanError> {
    let mut total = StepStats { total_elems: SWEEPS.len() as u64, processed_elems: 0 };

    for (kind, sql) in SWEEPS {
        if abort.load(Ordering::SeqCst) {
            return Ok(());
        }
        let tx = ctx.session().write()?;
        let removed = tx.execute(sql, [])?;
        tx.commit()?;
        if removed > 0 {
            log::info!(target: "lms::scanner", "Compact: removed {removed} orphan {kind} row(s)");
        }
        ctx.stats_mut().deletions += removed as u64;
        total.processed_elems += 1;
        on_batch(total);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::Db;
    use crate::scanner::ScanKind;
    use std::sync::Arc;

    #[test]
    fn removes_artist_with_no_track_links_but_keeps_referenced_one() {
        let db_path = std::env::temp_dir().join(format!("lms-compact-test-{}.db", std::process::id()));
        let db = Arc::new(Db::open(&db_path, 1, crate::config::IntegrityCheck::None, false).unwrap());
        {
            let session = db.session();
            let tx = session.write().unwrap();
            tx.connection()
                .execute("INSERT INTO artist (name, sort_name) VALUES ('Orphan', 'Orphan')", [])
                .unwrap();
            tx.connection()
                .execute("INSERT INTO artist (name, sort_name) VALUES ('Kept', 'Kept')", [])
                .unwrap();
            let kept_artist_id = tx.connection().last_insert_rowid();
            tx.connection()
                .execute("INSERT INTO media_library (name, root_path) VALUES ('lib', '/music')", [])
                .unwrap();
            let library_id = tx.connection().last_insert_rowid();
            tx.connection()
                .execute("INSERT INTO directory (path, media_library_id) VALUES ('/music', ?1)", [library_id])
                .unwrap();
            let directory_id = tx.connection().last_insert_rowid();
            tx.connection()
                .execute(
                    "INSERT INTO track (path, file_size, file_last_modified, scan_imported_time, scan_version, \
                     duration_ms, media_library_id, directory_id) VALUES ('/music/a.flac', 1, 1, 1, 1, 1000, ?1, ?2)",
                    rusqlite::params![library_id, directory_id],
                )
                .unwrap();
            let track_id = tx.connection().last_insert_rowid();
            tx.connection()
                .execute(
                    "INSERT INTO track_artist_link (track_id, artist_id, link_type) VALUES (?1, ?2, 0)",
                    rusqlite::params![track_id, kept_artist_id],
                )
                .unwrap();
            tx.commit().unwrap();
        }

        let config = Config::default();
        let session = db.session();
        let mut ctx = ScanContext::new(&session, &config, ScanKind::Incremental);
        let abort = AtomicBool::new(false);
        run(&mut ctx, &abort, &mut |_| {}).unwrap();
        assert_eq!(ctx.stats().deletions, 1);

        let remaining: i64 = session.read().unwrap().connection().query_row("SELECT COUNT(*) FROM artist", [], |row| row.get(0)).unwrap();
        assert_eq!(remaining, 1);
        let _ = std::fs::remove_file(&db_path);
    }
}
