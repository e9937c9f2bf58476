// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! `Optimize` (§4.3 step 12): run `ANALYZE` / `PRAGMA optimize` on the persistence layer so the
//! query planner has fresh statistics after a scan that may have touched a large fraction of the
//! catalog. No rows are produced or consumed, so there's exactly one batch.

use std::sync::atomic::AtomicBool;

use super::super::{ScanContext, ScanError, StepStats};

pub(super) fn run(
    ctx: &mut ScanContext<'_>,
    _abort: &AtomicBool,
    on_batch: &mut dyn FnMut(StepStats),
) -> Result<(), ScanError> {
    let tx = ctx.session().write()?;
    tx.connection().execute_batch("ANALYZE; PRAGMA optimize;")?;
    tx.commit()?;
    on_batch(StepStats { total_elems: 1, processed_elems: 1 });
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
    fn runs_without_error_against_an_empty_database() {
        let db_path = std::env::temp_dir().join(format!("lms-optimize-test-{}.db", std::process::id()));
        let db = Arc::new(Db::open(&db_path, 1, crate::config::IntegrityCheck::None, false).unwrap());
        let config = Config::default();
        let session = db.session();
        let mut ctx = ScanContext::new(&session, &config, ScanKind::Incremental);
        let abort = AtomicBool::new(false);
        let mut batches = 0;
        run(&mut ctx, &abort, &mut |_| batches += 1).unwrap();
        assert_eq!(batches, 1);
        let _ = std::fs::remove_file(&db_path);
    }
}
