// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Typed query builders for the finders used across the system (§4.2).
//!
//! Grounded on the `Filters`/`FindParameters`/`RangeResults` shape implied by
//! `database/include/database/objects/Filters.hpp`: a single parameter bag per entity, with a
//! shared pagination contract (`RangeResults<T>`, see [`crate::util::RangeResults`]).

mod artist_finder;
mod filters;
mod params;
mod release_finder;
mod track_finder;
mod tracklist_finder;

pub use artist_finder::find_artist_ids;
pub use filters::Filters;
pub use params::{FindParameters, SortMethod};
pub use release_finder::find_release_ids;
pub use track_finder::find_track_ids;
pub use tracklist_finder::find_tracklist_ids;
