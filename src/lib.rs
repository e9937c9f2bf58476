// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! LMS: a personal music server core — incremental library scanner, SOM-based similarity engine,
//! local PulseAudio player and the SQLite catalog they share.

#![deny(clippy::all)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::module_name_repetitions)]
#![deny(absolute_paths_not_starting_with_crate)]
#![deny(keyword_idents)]
#![deny(macro_use_extern_crate)]
#![deny(missing_abi)]
#![deny(missing_debug_implementations)]
#![deny(non_ascii_idents)]
#![deny(noop_method_call)]
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]
#![deny(unsafe_op_in_unsafe_fn)]
#![deny(unused_extern_crates)]
#![deny(unused_import_braces)]

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod db;
mod error;
pub mod model;
pub mod player;
pub mod query;
pub mod recommender;
pub mod scanner;
mod tag;
pub mod util;

pub use config::Config;
pub use error::{Error, Result};

/// Package name, used for the PulseAudio stream's application name and in startup log lines.
pub const PKG_NAME: &str = "lms";
/// Package version, logged once at startup.
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");
