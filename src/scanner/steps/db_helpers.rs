// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! `get-or-create` helpers shared by several steps, each a tiny `SELECT` then `INSERT` against an
//! already-open [`rusqlite::Connection`] (never its own transaction: callers decide batching).

use rusqlite::{Connection, OptionalExtension};

use crate::model::ids::{ArtistId, ClusterId, ClusterTypeId, DirectoryId, ImageId, LabelId, MediaLibraryId, ReleaseId, ReleaseTypeId};

use super::super::ScanError;

/// Look up a `Directory` row's id by its exact path.
pub(super) fn find_directory(conn: &Connection, path: &str) -> Result<Option<DirectoryId>, ScanError> {
    Ok(conn
        .query_row("SELECT id FROM directory WHERE path = ?1", [path], |row| row.get(0))
        .optional()?)
}

/// Create a `Directory` row, or return the id of an existing one with the same path.
pub(super) fn ensure_directory(
    conn: &Connection,
    path: &str,
    parent_id: Option<DirectoryId>,
    media_library_id: MediaLibraryId,
) -> Result<DirectoryId, ScanError> {
    if let Some(id) = find_directory(conn, path)? {
        return Ok(id);
    }
    conn.execute(
        "INSERT INTO directory (path, parent_id, media_library_id) VALUES (?1, ?2, ?3)",
        rusqlite::params![path, parent_id.map(DirectoryId::get), media_library_id],
    )?;
    Ok(DirectoryId::new(conn.last_insert_rowid()))
}

/// Create a `MediaLibrary` row, or return the id of an existing one with the same root path.
pub(super) fn ensure_media_library(conn: &Connection, name: &str, root_path: &str) -> Result<MediaLibraryId, ScanError> {
    if let Some(id) = conn
        .query_row("SELECT id FROM media_library WHERE root_path = ?1", [root_path], |row| row.get::<_, i64>(0))
        .optional()?
    {
        conn.execute("UPDATE media_library SET name = ?1 WHERE id = ?2", rusqlite::params![name, id])?;
        return Ok(MediaLibraryId::new(id));
    }
    conn.execute(
        "INSERT INTO media_library (name, root_path) VALUES (?1, ?2)",
        [name, root_path],
    )?;
    Ok(MediaLibraryId::new(conn.last_insert_rowid()))
}

/// Create a `ClusterType` row, or return the id of an existing one with the same name.
pub(super) fn ensure_cluster_type(conn: &Connection, name: &str) -> Result<ClusterTypeId, ScanError> {
    if let Some(id) = conn
        .query_row("SELECT id FROM cluster_type WHERE name = ?1", [name], |row| row.get::<_, i64>(0))
        .optional()?
    {
        return Ok(ClusterTypeId::new(id));
    }
    conn.execute("INSERT INTO cluster_type (name) VALUES (?1)", [name])?;
    Ok(ClusterTypeId::new(conn.last_insert_rowid()))
}

/// Create a `Cluster` row within `cluster_type_id`, or return the id of an existing one with the
/// same name.
pub(super) fn ensure_cluster(conn: &Connection, cluster_type_id: ClusterTypeId, name: &str) -> Result<ClusterId, ScanError> {
    if let Some(id) = conn
        .query_row(
            "SELECT id FROM cluster WHERE cluster_type_id = ?1 AND name = ?2",
            rusqlite::params![cluster_type_id, name],
            |row| row.get::<_, i64>(0),
        )
        .optional()?
    {
        return Ok(ClusterId::new(id));
    }
    conn.execute(
        "INSERT INTO cluster (cluster_type_id, name) VALUES (?1, ?2)",
        rusqlite::params![cluster_type_id, name],
    )?;
    Ok(ClusterId::new(conn.last_insert_rowid()))
}

/// Create an `Artist` row by `(name, mbid)`, matching by mbid first (when present) and falling
/// back to an exact name match (§6 `allow-artist-mbid-fallback`), or return an existing one.
pub(super) fn ensure_artist(conn: &Connection, name: &str, sort_name: &str, mbid: Option<&str>) -> Result<ArtistId, ScanError> {
    if let Some(mbid) = mbid {
        if let Some(id) = conn
            .query_row("SELECT id FROM artist WHERE mbid = ?1", [mbid], |row| row.get::<_, i64>(0))
            .optional()?
        {
            return Ok(ArtistId::new(id));
        }
    }
    if let Some(id) = conn
        .query_row("SELECT id FROM artist WHERE name = ?1 AND mbid IS NULL", [name], |row| row.get::<_, i64>(0))
        .optional()?
    {
        if let Some(mbid) = mbid {
            conn.execute("UPDATE artist SET mbid = ?1 WHERE id = ?2", rusqlite::params![mbid, id])?;
        }
        return Ok(ArtistId::new(id));
    }
    conn.execute(
        "INSERT INTO artist (name, sort_name, mbid) VALUES (?1, ?2, ?3)",
        rusqlite::params![name, sort_name, mbid],
    )?;
    Ok(ArtistId::new(conn.last_insert_rowid()))
}

/// Create a `Release` row matched by mbid first (when present), falling back to an exact
/// `(name, sort_name)` match, or return an existing one; existing rows have their year fields
/// refreshed from the newest scan.
#[allow(clippy::too_many_arguments)]
pub(super) fn ensure_release(
    conn: &Connection,
    name: &str,
    sort_name: &str,
    mbid: Option<&str>,
    year: Option<i32>,
    original_year: Option<i32>,
    total_discs: Option<u32>,
) -> Result<ReleaseId, ScanError> {
    if let Some(mbid) = mbid {
        if let Some(id) = conn
            .query_row("SELECT id FROM release WHERE mbid = ?1", [mbid], |row| row.get::<_, i64>(0))
            .optional()?
        {
            conn.execute(
                "UPDATE release SET year = ?1, original_year = ?2, total_discs = ?3 WHERE id = ?4",
                rusqlite::params![year, original_year, total_discs, id],
            )?;
            return Ok(ReleaseId::new(id));
        }
    }
    if let Some(id) = conn
        .query_row(
            "SELECT id FROM release WHERE name = ?1 AND mbid IS NULL",
            [name],
            |row| row.get::<_, i64>(0),
        )
        .optional()?
    {
        conn.execute(
            "UPDATE release SET mbid = ?1, year = ?2, original_year = ?3, total_discs = ?4 WHERE id = ?5",
            rusqlite::params![mbid, year, original_year, total_discs, id],
        )?;
        return Ok(ReleaseId::new(id));
    }
    conn.execute(
        "INSERT INTO release (name, sort_name, mbid, year, original_year, total_discs) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![name, sort_name, mbid, year, original_year, total_discs],
    )?;
    Ok(ReleaseId::new(conn.last_insert_rowid()))
}

/// Create a `Label` row, or return the id of an existing one with the same name.
pub(super) fn ensure_label(conn: &Connection, name: &str) -> Result<LabelId, ScanError> {
    if let Some(id) = conn
        .query_row("SELECT id FROM label WHERE name = ?1", [name], |row| row.get::<_, i64>(0))
        .optional()?
    {
        return Ok(LabelId::new(id));
    }
    conn.execute("INSERT INTO label (name) VALUES (?1)", [name])?;
    Ok(LabelId::new(conn.last_insert_rowid()))
}

/// Create a `ReleaseType` row, or return the id of an existing one with the same name.
pub(super) fn ensure_release_type(conn: &Connection, name: &str) -> Result<ReleaseTypeId, ScanError> {
    if let Some(id) = conn
        .query_row("SELECT id FROM release_type WHERE name = ?1", [name], |row| row.get::<_, i64>(0))
        .optional()?
    {
        return Ok(ReleaseTypeId::new(id));
    }
    conn.execute("INSERT INTO release_type (name) VALUES (?1)", [name])?;
    Ok(ReleaseTypeId::new(conn.last_insert_rowid()))
}

/// Create an `Image` row by path, or return the id of an existing one, refreshing its recorded
/// size/mtime.
pub(super) fn ensure_image(conn: &Connection, path: &str, file_size: u64, file_last_modified_ms: i64) -> Result<ImageId, ScanError> {
    if let Some(id) = conn
        .query_row("SELECT id FROM image WHERE path = ?1", [path], |row| row.get::<_, i64>(0))
        .optional()?
    {
        conn.execute(
            "UPDATE image SET file_size = ?1, file_last_modified = ?2 WHERE id = ?3",
            rusqlite::params![file_size, file_last_modified_ms, id],
        )?;
        return Ok(ImageId::new(id));
    }
    conn.execute(
        "INSERT INTO image (path, file_size, file_last_modified) VALUES (?1, ?2, ?3)",
        rusqlite::params![path, file_size, file_last_modified_ms],
    )?;
    Ok(ImageId::new(conn.last_insert_rowid()))
}
