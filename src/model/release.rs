// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! The `Release` entity and its `Label`/`ReleaseType` attributes (§3).

use super::ids::{ImageId, LabelId, ReleaseId, ReleaseTypeId};

/// An album-like grouping of tracks (§3 "Release").
#[derive(Debug, Clone)]
pub struct Release {
    /// Surrogate primary key.
    pub id: ReleaseId,
    /// Display name.
    pub name: String,
    /// Sort name (e.g. leading articles moved to the end).
    pub sort_name: String,
    /// MusicBrainz release-group id.
    pub mbid: Option<String>,
    /// Release year, if known.
    pub year: Option<i32>,
    /// Original release year, if known (may predate `year` for reissues).
    pub original_year: Option<i32>,
    /// Total number of discs.
    pub total_discs: Option<u32>,
    /// Release-type tags (album/EP/compilation/...), a release may carry more than one.
    pub release_types: Vec<ReleaseTypeId>,
    /// Record labels this release was issued under.
    pub labels: Vec<LabelId>,
    /// Cover art, if one was found during scanning.
    pub cover_image_id: Option<ImageId>,
}

/// A named record label (§3 "Label").
#[derive(Debug, Clone)]
pub struct Label {
    /// Surrogate primary key.
    pub id: LabelId,
    /// Label name, unique.
    pub name: String,
}

/// A named release-type tag, e.g. `"album"`, `"ep"`, `"compilation"` (§3 "ReleaseType").
#[derive(Debug, Clone)]
pub struct ReleaseType {
    /// Surrogate primary key.
    pub id: ReleaseTypeId,
    /// Type name, unique.
    pub name: String,
}
