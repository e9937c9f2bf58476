// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! `Artist` finder (§4.2).

use rusqlite::ToSql;

use super::params::{push_keyword_conditions, FindParameters, SortMethod};
use crate::db::{DbError, ReadTransaction};
use crate::model::ids::ArtistId;
use crate::util::RangeResults;

/// Find `Artist` ids matching `params` (§4.2).
pub fn find_artist_ids(tx: &ReadTransaction<'_>, params: &FindParameters) -> Result<RangeResults<ArtistId>, DbError> {
    let mut sql = String::from("SELECT a.id FROM artist a");
    let mut conditions: Vec<String> = Vec::new();
    let mut args: Vec<Box<dyn ToSql>> = Vec::new();

    if !params.filters.clusters.is_empty()
        || params.filters.media_library.is_some()
        || params.filters.label.is_some()
        || params.filters.release_type.is_some()
    {
        sql.push_str(
            " JOIN track_artist_link tal ON tal.artist_id = a.id \
              JOIN track t ON t.id = tal.track_id \
              JOIN release r ON r.id = t.release_id",
        );
    }
    if !params.filters.clusters.is_empty() {
        sql.push_str(" JOIN track_cluster tc ON tc.track_id = t.id");
        let placeholders = params.filters.clusters.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        conditions.push(format!("tc.cluster_id IN ({placeholders})"));
        for cluster in &params.filters.clusters {
            args.push(Box::new(cluster.get()));
        }
    }
    if let Some(library) = params.filters.media_library {
        conditions.push("t.media_library_id = ?".to_string());
        args.push(Box::new(library.get()));
    }
    if let Some(label) = params.filters.label {
        sql.push_str(" JOIN release_label rl ON rl.release_id = r.id");
        conditions.push("rl.label_id = ?".to_string());
        args.push(Box::new(label.get()));
    }
    if let Some(release_type) = params.filters.release_type {
        sql.push_str(" JOIN release_release_type rrt ON rrt.release_id = r.id");
        conditions.push("rrt.release_type_id = ?".to_string());
        args.push(Box::new(release_type.get()));
    }
    if matches!(params.sort_method, SortMethod::StarredDateDesc) {
        sql.push_str(" JOIN starred_artist sa ON sa.artist_id = a.id");
        if let Some(user_id) = params.user_id {
            conditions.push("sa.user_id = ?".to_string());
            args.push(Box::new(user_id.get()));
        }
    }

    push_keyword_conditions(&params.search_keywords, "a.name", &mut conditions, &mut args);

    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }

    sql.push_str(" GROUP BY a.id");
    if !params.filters.clusters.is_empty() {
        sql.push_str(" HAVING COUNT(DISTINCT tc.cluster_id) = ?");
        args.push(Box::new(params.filters.clusters.len() as i64));
    }

    match params.sort_method {
        SortMethod::Random => {
            let seed = params.random_seed.unwrap_or(0);
            sql.push_str(&format!(" ORDER BY ((a.id + {seed}) * 2654435761) % 4294967296"));
        }
        SortMethod::Name => sql.push_str(" ORDER BY a.sort_name ASC"),
        SortMethod::LastWritten => sql.push_str(" ORDER BY a.id DESC"),
        SortMethod::StarredDateDesc => sql.push_str(" ORDER BY sa.starred_at DESC"),
        SortMethod::PlayCountDesc => {
            sql.push_str(
                " ORDER BY (SELECT COUNT(*) FROM track_list_entry tle \
                   JOIN track_artist_link tal2 ON tal2.track_id = tle.track_id \
                   JOIN track_list tl ON tl.id = tle.track_list_id \
                   WHERE tal2.artist_id = a.id AND tl.list_type = 2) DESC",
            );
        }
    }

    sql.push_str(&format!(" LIMIT {}", params.range.size + 1));
    sql.push_str(&format!(" OFFSET {}", params.range.offset));

    let mut stmt = tx.prepare(&sql)?;
    let params_ref: Vec<&dyn ToSql> = args.iter().map(|boxed| boxed.as_ref()).collect();
    let rows = stmt
        .query_map(params_ref.as_slice(), |row| row.get::<_, i64>(0).map(ArtistId::new))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RangeResults::from_overfetched(params.range, rows))
}
