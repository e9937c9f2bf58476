// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! The `MediaLibrary` and `Directory` entities (§3).

use std::path::PathBuf;

use super::ids::{DirectoryId, MediaLibraryId};

/// A named root directory configured by the operator (§3 "MediaLibrary").
#[derive(Debug, Clone)]
pub struct MediaLibrary {
    /// Surrogate primary key.
    pub id: MediaLibraryId,
    /// Operator-visible name.
    pub name: String,
    /// Absolute root path.
    pub root_path: PathBuf,
}

/// A filesystem directory, forming a tree rooted at each [`MediaLibrary`]'s root (§3
/// "Directory").
#[derive(Debug, Clone)]
pub struct Directory {
    /// Surrogate primary key.
    pub id: DirectoryId,
    /// Absolute path, unique.
    pub path: PathBuf,
    /// Parent directory, `None` for a `MediaLibrary` root.
    pub parent_id: Option<DirectoryId>,
    /// Owning media library (invariant 2: must equal the library of the root ancestor).
    pub media_library_id: MediaLibraryId,
}
