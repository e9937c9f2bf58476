// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! `ComputeClusterStats` (§4.3 step 10): refresh `Cluster.track_count` from `track_cluster`, which
//! `ScanFiles` keeps accurate per-track but never aggregates.

use std::sync::atomic::{AtomicBool, Ordering};

use super::super::{ScanContext, ScanError, StepStats};
use super::SCAN_FILES_BATCH_SIZE;

pub(super) fn run(
    ctx: &mut ScanContext<'_>,
    abort: &AtomicBool,
    on_batch: &mut dyn FnMut(StepStats),
) -> Result<(), ScanError> {
    let cluster_ids: Vec<i64> = {
        let tx = ctx.session().read()?;
        let mut stmt = tx.prepare("SELECT id FROM cluster ORDER BY id")?;
        let ids = stmt.query_map([], |row| row.get(0))?.collect::<rusqlite::Result<Vec<_>>>()?;
        drop(stmt);
        tx.commit()?;
        ids
    };

    let mut total = StepStats { total_elems: cluster_ids.len() as u64, processed_elems: 0 };
    for batch in cluster_ids.chunks(SCAN_FILES_BATCH_SIZE) {
        if abort.load(Ordering::SeqCst) {
            return Ok(());
        }
        let tx = ctx.session().write()?;
        for &cluster_id in batch {
            tx.execute(
                "UPDATE cluster SET track_count = (SELECT COUNT(*) FROM track_cluster WHERE cluster_id = ?1) WHERE id = ?1",
                [cluster_id],
            )?;
        }
        tx.commit()?;
        total.processed_elems += batch.len() as u64;
        on_batch(total);
    }
    ctx.stats_mut().updates += total.total_elems;
    Ok(())
}
