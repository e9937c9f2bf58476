// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Schema migrations, grounded on `libs/database/impl/Migration.cpp`: a `version_info` table
//! holding a single integer `version` row drives an ordered list of up-only steps, applied inside
//! one write transaction per `Db::open` call.

use rusqlite::{Connection, Transaction};

use super::DbError;

/// The current schema version. Bump alongside adding a new entry to [`MIGRATIONS`].
pub const CURRENT_VERSION: i64 = 1;

type MigrationFn = fn(&Transaction<'_>) -> rusqlite::Result<()>;

/// Ordered migration steps, indexed by `(version - 1)`. Each step brings the schema from
/// `version` to `version + 1`.
const MIGRATIONS: &[MigrationFn] = &[migrate_to_v1];

/// Apply every migration the database is behind on, inside a single transaction. A fresh database
/// (no `version_info` table) starts from version 0.
pub fn run(conn: &mut Connection) -> Result<(), DbError> {
    let tx = conn.transaction()?;
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS version_info (\
            id integer PRIMARY KEY CHECK (id = 1),\
            version integer NOT NULL\
        )",
    )?;
    let current: i64 = tx
        .query_row("SELECT version FROM version_info WHERE id = 1", [], |row| row.get(0))
        .unwrap_or(0);

    if current > CURRENT_VERSION {
        return Err(DbError::SchemaTooNew { found: current, supported: CURRENT_VERSION });
    }

    for step in &MIGRATIONS[usize::try_from(current).unwrap_or(0)..] {
        step(&tx)?;
    }

    tx.execute(
        "INSERT INTO version_info (id, version) VALUES (1, ?1)\
         ON CONFLICT (id) DO UPDATE SET version = excluded.version",
        [CURRENT_VERSION],
    )?;
    tx.commit()?;
    Ok(())
}

/// The baseline schema (§3 entity model, in full).
fn migrate_to_v1(tx: &Transaction<'_>) -> rusqlite::Result<()> {
    tx.execute_batch(
        "
        CREATE TABLE media_library (
            id integer PRIMARY KEY AUTOINCREMENT,
            name text NOT NULL,
            root_path text NOT NULL UNIQUE
        );

        CREATE TABLE directory (
            id integer PRIMARY KEY AUTOINCREMENT,
            path text NOT NULL UNIQUE,
            parent_id integer REFERENCES directory(id) ON DELETE CASCADE,
            media_library_id integer NOT NULL REFERENCES media_library(id) ON DELETE CASCADE
        );
        CREATE INDEX directory_parent_id_idx ON directory(parent_id);
        CREATE INDEX directory_media_library_id_idx ON directory(media_library_id);

        CREATE TABLE artist (
            id integer PRIMARY KEY AUTOINCREMENT,
            name text NOT NULL,
            sort_name text NOT NULL,
            mbid text,
            biography text,
            image_id integer REFERENCES image(id) ON DELETE SET NULL
        );
        CREATE INDEX artist_mbid_idx ON artist(mbid);
        CREATE INDEX artist_sort_name_idx ON artist(sort_name);

        CREATE TABLE image (
            id integer PRIMARY KEY AUTOINCREMENT,
            path text NOT NULL UNIQUE,
            file_size integer NOT NULL,
            file_last_modified integer NOT NULL
        );

        CREATE TABLE label (
            id integer PRIMARY KEY AUTOINCREMENT,
            name text NOT NULL UNIQUE
        );

        CREATE TABLE release_type (
            id integer PRIMARY KEY AUTOINCREMENT,
            name text NOT NULL UNIQUE
        );

        CREATE TABLE release (
            id integer PRIMARY KEY AUTOINCREMENT,
            name text NOT NULL,
            sort_name text NOT NULL,
            mbid text,
            year integer,
            original_year integer,
            total_discs integer,
            cover_image_id integer REFERENCES image(id) ON DELETE SET NULL
        );
        CREATE INDEX release_mbid_idx ON release(mbid);
        CREATE INDEX release_name_idx ON release(name);

        CREATE TABLE release_label (
            release_id integer NOT NULL REFERENCES release(id) ON DELETE CASCADE,
            label_id integer NOT NULL REFERENCES label(id) ON DELETE CASCADE,
            PRIMARY KEY (release_id, label_id)
        );

        CREATE TABLE release_release_type (
            release_id integer NOT NULL REFERENCES release(id) ON DELETE CASCADE,
            release_type_id integer NOT NULL REFERENCES release_type(id) ON DELETE CASCADE,
            PRIMARY KEY (release_id, release_type_id)
        );

        CREATE TABLE track (
            id integer PRIMARY KEY AUTOINCREMENT,
            path text NOT NULL UNIQUE,
            file_size integer NOT NULL,
            file_last_modified integer NOT NULL,
            scan_imported_time integer NOT NULL,
            scan_version integer NOT NULL,
            duration_ms integer NOT NULL,
            track_number integer,
            total_tracks integer,
            disc_number integer,
            total_discs integer,
            release_date integer,
            original_release_date integer,
            mbid_recording text,
            mbid_release text,
            mbid_track text,
            replay_gain_track_gain real,
            replay_gain_track_peak real,
            replay_gain_release_gain real,
            replay_gain_release_peak real,
            copyright text,
            copyright_url text,
            encoding text,
            bits_per_sample integer,
            channels integer,
            sample_rate integer,
            release_id integer REFERENCES release(id) ON DELETE SET NULL,
            media_library_id integer NOT NULL REFERENCES media_library(id) ON DELETE CASCADE,
            directory_id integer NOT NULL REFERENCES directory(id) ON DELETE CASCADE,
            acoustic_fingerprint text
        );
        CREATE INDEX track_release_id_idx ON track(release_id);
        CREATE INDEX track_directory_id_idx ON track(directory_id);
        CREATE INDEX track_media_library_id_idx ON track(media_library_id);
        CREATE INDEX track_mbid_recording_idx ON track(mbid_recording);

        CREATE TABLE track_artist_link (
            id integer PRIMARY KEY AUTOINCREMENT,
            track_id integer NOT NULL REFERENCES track(id) ON DELETE CASCADE,
            artist_id integer NOT NULL REFERENCES artist(id) ON DELETE CASCADE,
            link_type integer NOT NULL,
            sub_type text
        );
        CREATE INDEX track_artist_link_track_id_idx ON track_artist_link(track_id);
        CREATE INDEX track_artist_link_artist_id_idx ON track_artist_link(artist_id);

        CREATE TABLE cluster_type (
            id integer PRIMARY KEY AUTOINCREMENT,
            name text NOT NULL UNIQUE
        );

        CREATE TABLE cluster (
            id integer PRIMARY KEY AUTOINCREMENT,
            cluster_type_id integer NOT NULL REFERENCES cluster_type(id) ON DELETE CASCADE,
            name text NOT NULL,
            track_count integer NOT NULL DEFAULT 0,
            UNIQUE (cluster_type_id, name)
        );

        CREATE TABLE track_cluster (
            track_id integer NOT NULL REFERENCES track(id) ON DELETE CASCADE,
            cluster_id integer NOT NULL REFERENCES cluster(id) ON DELETE CASCADE,
            PRIMARY KEY (track_id, cluster_id)
        );
        CREATE INDEX track_cluster_cluster_id_idx ON track_cluster(cluster_id);

        CREATE TABLE track_lyrics (
            id integer PRIMARY KEY AUTOINCREMENT,
            track_id integer NOT NULL REFERENCES track(id) ON DELETE CASCADE,
            external_path text,
            synchronized integer NOT NULL,
            body_json text NOT NULL,
            language text,
            display_artist text,
            display_album text,
            display_title text,
            offset_ms integer NOT NULL DEFAULT 0
        );
        CREATE INDEX track_lyrics_track_id_idx ON track_lyrics(track_id);

        CREATE TABLE playlist_file (
            id integer PRIMARY KEY AUTOINCREMENT,
            path text NOT NULL UNIQUE,
            file_size integer NOT NULL,
            file_last_modified integer NOT NULL,
            name text NOT NULL,
            media_library_id integer NOT NULL REFERENCES media_library(id) ON DELETE CASCADE,
            directory_id integer NOT NULL REFERENCES directory(id) ON DELETE CASCADE,
            track_list_id integer NOT NULL REFERENCES track_list(id) ON DELETE CASCADE,
            entries_json text NOT NULL
        );

        CREATE TABLE user (
            id integer PRIMARY KEY AUTOINCREMENT,
            login_name text NOT NULL UNIQUE,
            user_type integer NOT NULL,
            password_hash text,
            password_salt text,
            last_login integer,
            subsonic_transcode_mode integer NOT NULL DEFAULT 1,
            subsonic_format text NOT NULL DEFAULT 'opus',
            subsonic_bitrate_kbps integer NOT NULL DEFAULT 128,
            artist_list_mode integer NOT NULL DEFAULT 0,
            ui_theme text NOT NULL DEFAULT 'default',
            played_tracks_list_id integer REFERENCES track_list(id) ON DELETE SET NULL,
            queue_list_id integer REFERENCES track_list(id) ON DELETE SET NULL
        );

        CREATE TABLE track_list (
            id integer PRIMARY KEY AUTOINCREMENT,
            name text NOT NULL,
            list_type integer NOT NULL,
            visibility integer NOT NULL,
            owner_id integer NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            created integer NOT NULL,
            last_modified integer NOT NULL,
            UNIQUE (owner_id, list_type, name)
        );

        CREATE TABLE track_list_entry (
            id integer PRIMARY KEY AUTOINCREMENT,
            track_list_id integer NOT NULL REFERENCES track_list(id) ON DELETE CASCADE,
            track_id integer NOT NULL REFERENCES track(id) ON DELETE CASCADE,
            played_at integer
        );
        CREATE INDEX track_list_entry_track_list_id_idx ON track_list_entry(track_list_id);
        CREATE INDEX track_list_entry_track_id_idx ON track_list_entry(track_id);

        CREATE TABLE auth_token (
            id integer PRIMARY KEY AUTOINCREMENT,
            user_id integer NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            domain text NOT NULL,
            value text NOT NULL,
            expiry integer,
            max_use_count integer,
            use_count integer NOT NULL DEFAULT 0,
            last_used integer,
            UNIQUE (domain, value)
        );
        CREATE INDEX auth_token_user_id_idx ON auth_token(user_id);

        CREATE TABLE starred_artist (
            id integer PRIMARY KEY AUTOINCREMENT,
            user_id integer NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            artist_id integer NOT NULL REFERENCES artist(id) ON DELETE CASCADE,
            backend integer NOT NULL,
            starred_at integer NOT NULL,
            sync_state integer NOT NULL,
            UNIQUE (user_id, artist_id)
        );

        CREATE TABLE starred_release (
            id integer PRIMARY KEY AUTOINCREMENT,
            user_id integer NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            release_id integer NOT NULL REFERENCES release(id) ON DELETE CASCADE,
            backend integer NOT NULL,
            starred_at integer NOT NULL,
            sync_state integer NOT NULL,
            UNIQUE (user_id, release_id)
        );

        CREATE TABLE starred_track (
            id integer PRIMARY KEY AUTOINCREMENT,
            user_id integer NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            track_id integer NOT NULL REFERENCES track(id) ON DELETE CASCADE,
            backend integer NOT NULL,
            starred_at integer NOT NULL,
            sync_state integer NOT NULL,
            UNIQUE (user_id, track_id)
        );

        CREATE TABLE ui_state (
            id integer PRIMARY KEY AUTOINCREMENT,
            user_id integer NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            item text NOT NULL,
            value text NOT NULL,
            UNIQUE (user_id, item)
        );

        CREATE TABLE scan_settings (
            id integer PRIMARY KEY CHECK (id = 1),
            audio_scan_version integer NOT NULL,
            artist_info_scan_version integer NOT NULL,
            last_scan_completed integer,
            update_period_hours integer NOT NULL,
            daily_start_time_minutes integer
        );
        INSERT INTO scan_settings (id, audio_scan_version, artist_info_scan_version, update_period_hours)
            VALUES (1, 1, 1, 24);
        ",
    )
}
