// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! `TrackList` finder (§4.2). Unlike the catalog finders, this one is always user-scoped: a
//! `TrackList` is only ever browsed within its owner's collection (or, for `Public` lists, by
//! any user, which out-of-scope API layers may allow explicitly).

use rusqlite::ToSql;

use super::params::{push_keyword_conditions, FindParameters, SortMethod};
use crate::db::{DbError, ReadTransaction};
use crate::model::ids::TrackListId;
use crate::util::RangeResults;

/// Find `TrackList` ids owned by `params.user_id` (§4.2).
pub fn find_tracklist_ids(tx: &ReadTransaction<'_>, params: &FindParameters) -> Result<RangeResults<TrackListId>, DbError> {
    let mut sql = String::from("SELECT tl.id FROM track_list tl");
    let mut conditions: Vec<String> = Vec::new();
    let mut args: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(user_id) = params.user_id {
        conditions.push("tl.owner_id = ?".to_string());
        args.push(Box::new(user_id.get()));
    }

    push_keyword_conditions(&params.search_keywords, "tl.name", &mut conditions, &mut args);

    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }

    match params.sort_method {
        SortMethod::Random => {
            let seed = params.random_seed.unwrap_or(0);
            sql.push_str(&format!(" ORDER BY ((tl.id + {seed}) * 2654435761) % 4294967296"));
        }
        SortMethod::Name => sql.push_str(" ORDER BY tl.name ASC"),
        SortMethod::LastWritten | SortMethod::StarredDateDesc | SortMethod::PlayCountDesc => {
            sql.push_str(" ORDER BY tl.last_modified DESC");
        }
    }

    sql.push_str(&format!(" LIMIT {}", params.range.size + 1));
    sql.push_str(&format!(" OFFSET {}", params.range.offset));

    let mut stmt = tx.prepare(&sql)?;
    let params_ref: Vec<&dyn ToSql> = args.iter().map(|boxed| boxed.as_ref()).collect();
    let rows = stmt
        .query_map(params_ref.as_slice(), |row| row.get::<_, i64>(0).map(TrackListId::new))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RangeResults::from_overfetched(params.range, rows))
}
