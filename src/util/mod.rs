// Copyright (c) 2024 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Utility functions

mod fs;
mod keyed_binheap;
pub(crate) mod lock;
mod net_address;
mod range;
pub mod string;
#[cfg(any(test, feature = "dev"))]
mod testing;
mod time;

pub use fs::{is_under_root, move_file, walk_dir, IGNORE_SENTINEL};
pub use keyed_binheap::KeyedBinaryHeap;
pub use lock::RecursiveSharedMutex;
pub use net_address::hash_address;
pub use range::{Range, RangeResults};
#[cfg(any(test, feature = "dev"))]
pub use testing::{FakeArtist, FakeRelease, FakeTrack};
pub use time::{parse_year_from_str, FormattedDuration};
