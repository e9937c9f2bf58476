// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Query plan recording (§4.1 `db-show-queries`), grounded on `libs/database/impl/
//! QueryPlanRecorder.{hpp,cpp}`: the first time a distinct SQL string is seen, its
//! `EXPLAIN QUERY PLAN` output is captured and kept around for inspection (e.g. by an
//! administrative endpoint), so operators can see whether a query hit the expected index without
//! reaching for `sqlite3` directly.

use std::collections::HashMap;
use std::sync::RwLock;

/// Captures and caches `EXPLAIN QUERY PLAN` output per distinct query string.
#[derive(Debug, Default)]
pub struct QueryPlanRecorder {
    plans: RwLock<HashMap<String, String>>,
}

impl QueryPlanRecorder {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        log::info!("Recording database query plans");
        Self::default()
    }

    /// Record the query plan for `sql` if it hasn't been seen yet.
    pub fn record_if_needed(&self, conn: &rusqlite::Connection, sql: &str) -> rusqlite::Result<()> {
        if self.plans.read().expect("lock poisoned").contains_key(sql) {
            return Ok(());
        }

        let mut stmt = conn.prepare(&format!("EXPLAIN QUERY PLAN {sql}"))?;
        let mut rows = stmt.query([])?;

        let mut details: HashMap<i64, String> = HashMap::new();
        let mut children: HashMap<i64, Vec<i64>> = HashMap::new();
        while let Some(row) = rows.next()? {
            let id: i64 = row.get(0)?;
            let parent: i64 = row.get(1)?;
            let detail: String = row.get(3)?;
            details.insert(id, detail);
            children.entry(parent).or_default().push(id);
        }

        let mut formatted = String::new();
        format_node(0, 0, &details, &children, &mut formatted);

        self.plans.write().expect("lock poisoned").entry(sql.to_string()).or_insert(formatted);
        Ok(())
    }

    /// Visit every recorded `(query, plan)` pair.
    pub fn visit_query_plans(&self, mut visitor: impl FnMut(&str, &str)) {
        for (query, plan) in self.plans.read().expect("lock poisoned").iter() {
            visitor(query, plan);
        }
    }
}

fn format_node(id: i64, level: usize, details: &HashMap<i64, String>, children: &HashMap<i64, Vec<i64>>, out: &mut String) {
    if let Some(detail) = details.get(&id) {
        for _ in 0..level {
            out.push('\t');
        }
        out.push_str(detail);
        out.push('\n');
    }
    if let Some(kids) = children.get(&id) {
        for &child in kids {
            format_node(child, level + 1, details, children, out);
        }
    }
}
