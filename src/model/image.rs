// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! The `Image` entity (§3): on-disk cover art / portraits, resized on demand by the (out-of-scope)
//! image façade.

use chrono::{DateTime, Utc};
use std::path::PathBuf;

use super::ids::ImageId;

/// An on-disk image file referenced by a [`crate::model::Release`] cover or
/// [`crate::model::Artist`] portrait.
#[derive(Debug, Clone)]
pub struct Image {
    /// Surrogate primary key.
    pub id: ImageId,
    /// Absolute path, unique.
    pub path: PathBuf,
    /// File size in bytes, as of the last scan.
    pub file_size: u64,
    /// File modification time, as of the last scan.
    pub file_last_modified: DateTime<Utc>,
}
