// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! The persistence layer (§4.1, §4.2): a pooled SQLite database plus the migration and
//! transaction machinery built on top of it.
//!
//! Grounded on `libs/database/impl/Db.cpp` and `libs/services/database/include/services/database/
//! {Db,Session}.hpp`. The original pools `Wt::Dbo` connections behind a `RecursiveSharedMutex` so
//! that readers run concurrently while a writer gets exclusive access to the whole session; this
//! module reproduces that split using [`crate::util::RecursiveSharedMutex`] directly over a
//! `rusqlite`/`r2d2_sqlite` pool, since `rusqlite` connections are not `Sync` on their own.

mod migrations;
mod pool;
mod query_plan;
mod session;

use std::path::{Path, PathBuf};

use r2d2_sqlite::SqliteConnectionManager;
use thiserror::Error;

use crate::config::IntegrityCheck;
use crate::util::RecursiveSharedMutex;

pub use query_plan::QueryPlanRecorder;
pub use session::{ReadTransaction, Session, WriteTransaction};

/// Errors raised by the persistence layer.
#[derive(Debug, Error)]
pub enum DbError {
    /// A `rusqlite` call failed.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// The connection pool could not be built or an acquisition timed out.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
    /// `PRAGMA quick_check`/`PRAGMA integrity_check` reported corruption.
    #[error("database integrity check failed, see log for details")]
    IntegrityCheckFailed,
    /// `PRAGMA foreign_key_check` reported a dangling reference.
    #[error("foreign key constraints check failed, please restore from a backup or recreate the database")]
    ForeignKeyConstraintsFailed,
    /// The database's `version_info.version` is newer than this build knows how to read.
    #[error("database schema version {found} is newer than the {supported} this build supports")]
    SchemaTooNew {
        /// Version stored in the database.
        found: i64,
        /// Highest version this build knows about.
        supported: i64,
    },
}

/// The pooled SQLite database (§4.1). Cheap to clone: internally an `Arc` around the connection
/// pool and the cross-session [`RecursiveSharedMutex`] that arbitrates readers against writers.
#[derive(Debug, Clone)]
pub struct Db {
    inner: std::sync::Arc<DbInner>,
}

#[derive(Debug)]
pub(crate) struct DbInner {
    pub(crate) pool: r2d2::Pool<SqliteConnectionManager>,
    pub(crate) lock: RecursiveSharedMutex,
    pub(crate) query_plan_recorder: Option<QueryPlanRecorder>,
    path: PathBuf,
}

impl Db {
    /// Open (creating if absent) the database at `path`, applying every pending migration and
    /// then the configured startup integrity check (§4.1).
    ///
    /// `connection_count` sizes the pool; a local player and a handful of concurrent HTTP
    /// requests rarely need more than a few connections since SQLite serializes writers anyway.
    /// `show_queries` turns on the [`QueryPlanRecorder`] (`database.show-queries`): every distinct
    /// SQL string a [`Session`] transaction runs then has its `EXPLAIN QUERY PLAN` captured on
    /// first execution.
    pub fn open(
        path: &Path,
        connection_count: u32,
        integrity_check: IntegrityCheck,
        show_queries: bool,
    ) -> Result<Self, DbError> {
        log::info!("Creating connection pool on file {}", path.display());
        let pool = pool::build_pool(path, connection_count)?;

        {
            let mut conn = pool.get()?;
            migrations::run(&mut conn)?;
            log_pragma_diagnostics(&conn);

            match integrity_check {
                IntegrityCheck::Quick => perform_quick_check(&conn)?,
                IntegrityCheck::Full => {
                    perform_full_integrity_check(&conn)?;
                    perform_foreign_key_check(&conn)?;
                }
                IntegrityCheck::None => {}
            }
        }

        Ok(Self {
            inner: std::sync::Arc::new(DbInner {
                pool,
                lock: RecursiveSharedMutex::new(),
                query_plan_recorder: show_queries.then(QueryPlanRecorder::new),
                path: path.to_path_buf(),
            }),
        })
    }

    /// Path this database was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Open a new [`Session`] bound to this database. Cheap; callers typically keep one per
    /// worker thread (the original's thread-local `Db::getTLSSession`).
    #[must_use]
    pub fn session(&self) -> Session {
        Session::new(std::sync::Arc::clone(&self.inner))
    }
}

fn log_pragma_diagnostics(conn: &rusqlite::Connection) {
    if let Ok(page_size) = conn.pragma_query_value(None, "page_size", |row| row.get::<_, i64>(0)) {
        log::info!("Page size set to {page_size}");
    }
    if let Ok(cache_size) = conn.pragma_query_value(None, "cache_size", |row| row.get::<_, i64>(0)) {
        log::info!("Cache size set to {cache_size}");
    }
}

fn quick_check_rows(conn: &rusqlite::Connection, full: bool) -> Result<Vec<String>, DbError> {
    let sql = if full { "PRAGMA integrity_check" } else { "PRAGMA quick_check" };
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    let mut errors = Vec::new();
    for row in rows {
        let result = row?;
        if result == "ok" {
            return Ok(Vec::new());
        }
        errors.push(result);
    }
    Ok(errors)
}

fn perform_quick_check(conn: &rusqlite::Connection) -> Result<(), DbError> {
    log::info!("Performing quick database check...");
    let errors = quick_check_rows(conn, false)?;
    if errors.is_empty() {
        log::info!("Quick database check passed!");
        Ok(())
    } else {
        for error in &errors {
            log::error!("Quick check error: {error}");
        }
        log::error!("Quick database check done with errors!");
        Err(DbError::IntegrityCheckFailed)
    }
}

fn perform_full_integrity_check(conn: &rusqlite::Connection) -> Result<(), DbError> {
    log::info!("Checking database integrity...");
    let errors = quick_check_rows(conn, true)?;
    if errors.is_empty() {
        log::info!("Database integrity check passed!");
        Ok(())
    } else {
        for error in &errors {
            log::error!("Integrity check error: {error}");
        }
        log::error!("Database integrity check done with errors!");
        Err(DbError::IntegrityCheckFailed)
    }
}

fn perform_foreign_key_check(conn: &rusqlite::Connection) -> Result<(), DbError> {
    log::info!("Checking foreign key constraints...");
    let mut stmt = conn.prepare("PRAGMA foreign_key_check")?;
    let mut rows = stmt.query([])?;
    let mut passed = true;
    while let Some(row) = rows.next()? {
        passed = false;
        let table: String = row.get(0)?;
        let rowid: i64 = row.get(1)?;
        let foreign_table: String = row.get(2)?;
        log::error!("Foreign key constraint failed in table '{table}', rowid = {rowid}, referred table = '{foreign_table}'");
    }
    if passed {
        log::info!("Foreign key constraints check passed!");
        Ok(())
    } else {
        Err(DbError::ForeignKeyConstraintsFailed)
    }
}
