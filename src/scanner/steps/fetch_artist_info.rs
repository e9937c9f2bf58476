// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! `FetchArtistInfo` (§4.3 step 7): optional remote enrichment. For every `Artist` with a known
//! MBID but no biography yet, look the artist up on MusicBrainz and fill in its disambiguation
//! comment as a short biography. Grounded on the `Fetch`-trait usage in the teacher's
//! `musicbrainz.rs` (trimmed from this workspace — see `DESIGN.md`), adapted from an async release
//! lookup to a blocking, batch-paged artist lookup since the scan pipeline itself is synchronous.
//!
//! Disabled unless both the `musicbrainz` cargo feature is compiled in and
//! `scanner.fetch-artist-info` is set; either way the step is a no-op rather than an error, since
//! §4.3 describes it as strictly optional.

use std::sync::atomic::{AtomicBool, Ordering};

use super::super::{ScanContext, ScanError, ScanKind, StepStats};
use super::SCAN_FILES_BATCH_SIZE;

pub(super) fn run(
    ctx: &mut ScanContext<'_>,
    abort: &AtomicBool,
    on_batch: &mut dyn FnMut(StepStats),
) -> Result<(), ScanError> {
    if !ctx.config().scanner.fetch_artist_info.unwrap_or(false) {
        on_batch(StepStats::default());
        return Ok(());
    }

    let artist_ids: Vec<(i64, String)> = {
        let tx = ctx.session().read()?;
        let mut stmt = tx.prepare(
            "SELECT id, mbid FROM artist WHERE mbid IS NOT NULL AND biography IS NULL ORDER BY id",
        )?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        drop(stmt);
        tx.commit()?;
        rows
    };

    let mut total = StepStats { total_elems: artist_ids.len() as u64, processed_elems: 0 };

    for batch in artist_ids.chunks(SCAN_FILES_BATCH_SIZE) {
        if abort.load(Ordering::SeqCst) {
            return Ok(());
        }

        let fetched: Vec<(i64, Option<String>)> = batch
            .iter()
            .map(|(id, mbid)| (*id, fetch_biography(mbid)))
            .collect();

        let tx = ctx.session().write()?;
        for (id, biography) in &fetched {
            let Some(biography) = biography else { continue };
            tx.execute("UPDATE artist SET biography = ?1 WHERE id = ?2", rusqlite::params![biography, id])?;
            ctx.stats_mut().updates += 1;
        }
        tx.commit()?;

        total.processed_elems += batch.len() as u64;
        on_batch(total);
    }

    Ok(())
}

/// Look up `mbid` on MusicBrainz and return its disambiguation comment, if any and non-empty.
/// Network or lookup failures are logged and recovered locally (§7 "per-file errors ... are always
/// recovered locally"): a single artist's lookup failing never aborts the step.
#[cfg(feature = "musicbrainz")]
fn fetch_biography(mbid: &str) -> Option<String> {
    use musicbrainz_rs_nova::{entity::artist::Artist as MusicBrainzArtist, Fetch};

    let result = futures::executor::block_on(MusicBrainzArtist::fetch().id(mbid).execute());
    match result {
        Ok(artist) if !artist.disambiguation.is_empty() => Some(artist.disambiguation),
        Ok(_) => None,
        Err(err) => {
            log::warn!(target: "lms::scanner", "MusicBrainz artist lookup for {mbid} failed: {err}");
            None
        }
    }
}

#[cfg(not(feature = "musicbrainz"))]
fn fetch_biography(_mbid: &str) -> Option<String> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::Db;
    use std::sync::Arc;

    #[test]
    fn disabled_by_default_is_a_noop() {
        let db_path = std::env::temp_dir().join(format!("lms-fetch-artist-info-test-{}.db", std::process::id()));
        let db = Arc::new(Db::open(&db_path, 1, crate::config::IntegrityCheck::None, false).unwrap());
        let config = Config::default();
        assert!(!config.scanner.fetch_artist_info.unwrap_or(false));
        let session = db.session();
        let mut ctx = ScanContext::new(&session, &config, ScanKind::Incremental);
        let abort = AtomicBool::new(false);
        let mut calls = 0;
        run(&mut ctx, &abort, &mut |_| calls += 1).unwrap();
        assert_eq!(calls, 1);
        assert_eq!(ctx.stats().updates, 0);
        let _ = std::fs::remove_file(&db_path);
    }
}
