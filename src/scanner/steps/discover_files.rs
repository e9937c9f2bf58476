// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! `DiscoverFiles` (§4.3 step 1), grounded on `ScanStepDiscoverFiles.cpp`: walk every configured
//! `MediaLibrary` root, creating a `Directory` row for each visited directory and classifying
//! every file by extension, so every later step works from an in-memory index instead of
//! re-walking the filesystem.
//!
//! [`crate::util::fs::walk_dir`] guarantees a directory is yielded before any of its
//! subdirectories, so a directory's row always exists by the time its children are visited.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use super::super::context::{DiscoveredFile, DiscoveredKind};
use super::super::{ScanContext, ScanError, StepStats};
use super::{db_helpers, SCAN_FILES_BATCH_SIZE};

pub(super) const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp"];
pub(super) const LYRICS_EXTENSIONS: &[&str] = &["lrc", "txt"];
pub(super) const PLAYLIST_EXTENSIONS: &[&str] = &["m3u", "m3u8"];

fn classify(path: &Path) -> Option<DiscoveredKind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    if crate::tag::TaggedFile::recognised_extensions().contains(&ext.as_str()) {
        Some(DiscoveredKind::Audio)
    } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Some(DiscoveredKind::Image)
    } else if LYRICS_EXTENSIONS.contains(&ext.as_str()) {
        Some(DiscoveredKind::Lyrics)
    } else if PLAYLIST_EXTENSIONS.contains(&ext.as_str()) {
        Some(DiscoveredKind::PlayList)
    } else {
        None
    }
}

pub(super) fn run(
    ctx: &mut ScanContext<'_>,
    abort: &AtomicBool,
    on_batch: &mut dyn FnMut(StepStats),
) -> Result<(), ScanError> {
    let libraries = ctx.config().media_libraries.clone();
    let mut discovered: Vec<DiscoveredFile> = Vec::new();
    let mut total = StepStats::default();

    for entry in &libraries {
        let root = Path::new(&entry.path);
        if !root.is_dir() {
            return Err(ScanError::InvalidMediaLibraryRoot(root.to_path_buf()));
        }
        let canonical_root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());

        let media_library_id = {
            let tx = ctx.session().write()?;
            let id = db_helpers::ensure_media_library(
                tx.connection(),
                &entry.name,
                &canonical_root.to_string_lossy(),
            )?;
            tx.commit()?;
            id
        };
        ctx.libraries_mut().insert(canonical_root.clone(), media_library_id);

        let mut dirs_since_last_report = 0u64;
        for dir_entry in crate::util::walk_dir(canonical_root.clone()) {
            if abort.load(Ordering::SeqCst) {
                ctx.stats_mut().discovered = discovered.len() as u64;
                ctx.set_discovered(discovered);
                return Ok(());
            }
            let (dir_path, _dirs, files) = dir_entry.map_err(ScanError::Io)?;

            let parent_id = dir_path.parent().and_then(|p| ctx.directories().get(p).copied());
            let directory_id = {
                let tx = ctx.session().write()?;
                let id = db_helpers::ensure_directory(
                    tx.connection(),
                    &dir_path.to_string_lossy(),
                    parent_id,
                    media_library_id,
                )?;
                tx.commit()?;
                id
            };
            ctx.directories_mut().insert(dir_path, directory_id);

            for file in files {
                if let Some(kind) = classify(&file) {
                    discovered.push(DiscoveredFile { path: file, kind, directory_id, media_library_id });
                    total.total_elems += 1;
                }
            }

            dirs_since_last_report += 1;
            if dirs_since_last_report >= SCAN_FILES_BATCH_SIZE as u64 {
                total.processed_elems = total.total_elems;
                on_batch(total);
                dirs_since_last_report = 0;
            }
        }
    }

    total.processed_elems = total.total_elems;
    ctx.stats_mut().discovered = discovered.len() as u64;
    ctx.set_discovered(discovered);
    on_batch(total);
    Ok(())
}
