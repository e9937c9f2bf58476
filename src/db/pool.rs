// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! The fixed-size connection pool (§4.1), grounded on `libs/database/impl/Db.cpp`'s
//! per-connection `PRAGMA` setup. `rusqlite` + `r2d2`/`r2d2_sqlite` stand in for the original's
//! `Wt::Dbo` connection pool, which has no Rust equivalent in this stack.

use std::path::Path;
use std::time::Duration;

use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

/// Pool acquisition timeout (§4.1: "times out individual acquisitions after 10 seconds").
pub const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// Applies the non-negotiable per-connection `PRAGMA`s (§4.1) to every connection the pool hands
/// out, including ones opened lazily after the pool was built.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionCustomizer;

impl r2d2::CustomizeConnection<Connection, rusqlite::Error> for ConnectionCustomizer {
    fn on_acquire(&self, conn: &mut Connection) -> Result<(), rusqlite::Error> {
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;\
             PRAGMA synchronous=normal;\
             PRAGMA temp_store=MEMORY;\
             PRAGMA cache_size=-8000;\
             PRAGMA automatic_index=0;\
             PRAGMA foreign_keys=ON;",
        )
    }
}

/// Build the connection pool for `path` with `connection_count` connections.
pub fn build_pool(
    path: &Path,
    connection_count: u32,
) -> Result<r2d2::Pool<SqliteConnectionManager>, r2d2::Error> {
    let manager = SqliteConnectionManager::file(path);
    r2d2::Pool::builder()
        .max_size(connection_count.max(1))
        .connection_timeout(ACQUIRE_TIMEOUT)
        .connection_customizer(Box::new(ConnectionCustomizer))
        .build(manager)
}
