// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! The `Cluster`/`ClusterType` tag taxonomy (§3).

use super::ids::{ClusterId, ClusterTypeId};

/// A named tag namespace, e.g. `"genre"`, `"mood"` (§3 "ClusterType").
#[derive(Debug, Clone)]
pub struct ClusterType {
    /// Surrogate primary key.
    pub id: ClusterTypeId,
    /// Namespace name, unique.
    pub name: String,
}

/// A tag within a [`ClusterType`] namespace, e.g. `("genre", "Ambient")` (§3 "Cluster").
#[derive(Debug, Clone)]
pub struct Cluster {
    /// Surrogate primary key.
    pub id: ClusterId,
    /// Owning namespace.
    pub cluster_type_id: ClusterTypeId,
    /// Tag name, unique within `cluster_type_id`.
    pub name: String,
    /// Number of tracks that are a member of this cluster, refreshed by `ComputeClusterStats`.
    pub track_count: u64,
}
