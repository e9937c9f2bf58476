// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! [`Filters`], grounded on
//! `libs/database/include/database/objects/Filters.hpp`.

use crate::model::ids::{ClusterId, LabelId, MediaLibraryId, ReleaseTypeId};

/// Optional, AND-intersected constraints applied by a finder (§4.2 "Find parameter objects").
///
/// Every field defaults to "unset", meaning that constraint is not applied. When several fields
/// are set simultaneously the query intersects all of them.
#[derive(Debug, Clone, Default)]
pub struct Filters {
    /// Restrict to tracks belonging to this media library.
    pub media_library: Option<MediaLibraryId>,
    /// Restrict to tracks that are a member of every one of these clusters simultaneously (§4.2
    /// "Cluster intersection").
    pub clusters: Vec<ClusterId>,
    /// Restrict to tracks whose release carries this label.
    pub label: Option<LabelId>,
    /// Restrict to tracks whose release carries this release-type.
    pub release_type: Option<ReleaseTypeId>,
}

impl Filters {
    /// Set the cluster-intersection list.
    #[must_use]
    pub fn with_clusters(mut self, clusters: impl Into<Vec<ClusterId>>) -> Self {
        self.clusters = clusters.into();
        self
    }

    /// Set the media library constraint.
    #[must_use]
    pub fn with_media_library(mut self, media_library: MediaLibraryId) -> Self {
        self.media_library = Some(media_library);
        self
    }

    /// Set the label constraint.
    #[must_use]
    pub fn with_label(mut self, label: LabelId) -> Self {
        self.label = Some(label);
        self
    }

    /// Set the release-type constraint.
    #[must_use]
    pub fn with_release_type(mut self, release_type: ReleaseTypeId) -> Self {
        self.release_type = Some(release_type);
        self
    }
}
