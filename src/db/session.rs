// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! [`Session`] and its two transaction kinds, grounded on
//! `libs/services/database/include/services/database/Session.hpp`: a writer takes the
//! [`RecursiveSharedMutex`]'s exclusive side and a `BEGIN IMMEDIATE` SQL transaction together, a
//! reader takes the shared side and a plain `BEGIN DEFERRED` transaction. Any number of readers
//! run concurrently; a writer waits for every reader (and any other writer) to finish first.

use std::sync::Arc;

use r2d2::PooledConnection;
use r2d2_sqlite::SqliteConnectionManager;

use super::DbInner;
use crate::util::lock::{ExclusiveGuard, SharedGuard};
use crate::util::RecursiveSharedMutex;

/// A handle callers keep around (typically one per worker thread) to start transactions against
/// a [`super::Db`].
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<DbInner>,
}

impl Session {
    pub(super) fn new(inner: Arc<DbInner>) -> Self {
        Self { inner }
    }

    /// Begin a read-only transaction. Blocks only behind a writer, never behind other readers.
    pub fn read(&self) -> Result<ReadTransaction<'_>, super::DbError> {
        let guard = self.inner.lock.lock_shared();
        let conn = self.inner.pool.get()?;
        conn.execute_batch("BEGIN DEFERRED")?;
        Ok(ReadTransaction { conn, _guard: guard, committed: false, inner: Arc::clone(&self.inner) })
    }

    /// Begin a read/write transaction. Blocks behind any reader or writer already in progress.
    pub fn write(&self) -> Result<WriteTransaction<'_>, super::DbError> {
        let guard = self.inner.lock.lock();
        let conn = self.inner.pool.get()?;
        conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(WriteTransaction { conn, _guard: guard, committed: false, inner: Arc::clone(&self.inner) })
    }

    /// Access to the underlying mutex, for callers (e.g. a scan step) that need to assert they
    /// are holding the write lock before touching a connection directly.
    pub(crate) fn lock(&self) -> &RecursiveSharedMutex {
        &self.inner.lock
    }
}

/// A read-only transaction. Rolled back (a no-op for a read-only transaction) if dropped without
/// calling [`ReadTransaction::commit`].
pub struct ReadTransaction<'a> {
    conn: PooledConnection<SqliteConnectionManager>,
    _guard: SharedGuard<'a>,
    committed: bool,
    inner: Arc<DbInner>,
}

impl ReadTransaction<'_> {
    /// Borrow the underlying connection to run queries against.
    #[must_use]
    pub fn connection(&self) -> &rusqlite::Connection {
        &self.conn
    }

    /// Prepare `sql`, recording its query plan first if `database.show-queries` is enabled and
    /// this is the first time this exact string has been seen.
    pub fn prepare(&self, sql: &str) -> rusqlite::Result<rusqlite::Statement<'_>> {
        record_query(&self.inner, &self.conn, sql);
        self.conn.prepare(sql)
    }

    /// Execute `sql`, recording its query plan first under the same rule as [`Self::prepare`].
    pub fn execute<P: rusqlite::Params>(&self, sql: &str, params: P) -> rusqlite::Result<usize> {
        record_query(&self.inner, &self.conn, sql);
        self.conn.execute(sql, params)
    }

    /// Run `sql` and map its single result row, recording its query plan first under the same
    /// rule as [`Self::prepare`].
    pub fn query_row<T, P, F>(&self, sql: &str, params: P, f: F) -> rusqlite::Result<T>
    where
        P: rusqlite::Params,
        F: FnOnce(&rusqlite::Row<'_>) -> rusqlite::Result<T>,
    {
        record_query(&self.inner, &self.conn, sql);
        self.conn.query_row(sql, params, f)
    }

    /// Commit (releases the underlying `BEGIN DEFERRED` transaction).
    pub fn commit(mut self) -> Result<(), super::DbError> {
        self.conn.execute_batch("COMMIT")?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for ReadTransaction<'_> {
    fn drop(&mut self) {
        if !self.committed {
            let _ = self.conn.execute_batch("ROLLBACK");
        }
    }
}

/// A read/write transaction. Rolled back if dropped without calling
/// [`WriteTransaction::commit`], so an early return via `?` is always safe.
pub struct WriteTransaction<'a> {
    conn: PooledConnection<SqliteConnectionManager>,
    _guard: ExclusiveGuard<'a>,
    committed: bool,
    inner: Arc<DbInner>,
}

impl WriteTransaction<'_> {
    /// Borrow the underlying connection to run statements against.
    #[must_use]
    pub fn connection(&self) -> &rusqlite::Connection {
        &self.conn
    }

    /// Prepare `sql`, recording its query plan first under the same rule as
    /// [`ReadTransaction::prepare`].
    pub fn prepare(&self, sql: &str) -> rusqlite::Result<rusqlite::Statement<'_>> {
        record_query(&self.inner, &self.conn, sql);
        self.conn.prepare(sql)
    }

    /// Execute `sql`, recording its query plan first under the same rule as
    /// [`ReadTransaction::prepare`].
    pub fn execute<P: rusqlite::Params>(&self, sql: &str, params: P) -> rusqlite::Result<usize> {
        record_query(&self.inner, &self.conn, sql);
        self.conn.execute(sql, params)
    }

    /// Run `sql` and map its single result row, recording its query plan first under the same
    /// rule as [`ReadTransaction::prepare`].
    pub fn query_row<T, P, F>(&self, sql: &str, params: P, f: F) -> rusqlite::Result<T>
    where
        P: rusqlite::Params,
        F: FnOnce(&rusqlite::Row<'_>) -> rusqlite::Result<T>,
    {
        record_query(&self.inner, &self.conn, sql);
        self.conn.query_row(sql, params, f)
    }

    /// Commit the transaction.
    pub fn commit(mut self) -> Result<(), super::DbError> {
        self.conn.execute_batch("COMMIT")?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for WriteTransaction<'_> {
    fn drop(&mut self) {
        if !self.committed {
            let _ = self.conn.execute_batch("ROLLBACK");
        }
    }
}

/// Record `sql`'s query plan via `inner`'s recorder, if `database.show-queries` turned it on.
/// Failures are logged and otherwise ignored: a plan-recording error must never fail the query
/// it was trying to describe.
fn record_query(inner: &DbInner, conn: &rusqlite::Connection, sql: &str) {
    if let Some(recorder) = &inner.query_plan_recorder {
        if let Err(err) = recorder.record_if_needed(conn, sql) {
            log::debug!(target: "lms::db", "failed to record query plan for {sql:?}: {err}");
        }
    }
}
