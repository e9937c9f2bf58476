// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! The `Artist` entity (§3).

use super::ids::{ArtistId, ImageId};

/// A named contributor (§3 "Artist").
#[derive(Debug, Clone)]
pub struct Artist {
    /// Surrogate primary key.
    pub id: ArtistId,
    /// Display name.
    pub name: String,
    /// Sort name (e.g. `"Beatles, The"`).
    pub sort_name: String,
    /// MusicBrainz artist id.
    pub mbid: Option<String>,
    /// Biography, fetched by the optional `FetchArtistInfo` scan step.
    pub biography: Option<String>,
    /// Portrait image, fetched by `FetchArtistInfo` or associated from a sidecar file.
    pub image_id: Option<ImageId>,
}
