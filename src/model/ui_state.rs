// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! The `UIState` entity (§3), grounded on
//! `libs/database/include/database/objects/UIState.hpp`: an opaque per-`(User, item)` string blob
//! the UI uses to persist widget state across sessions. The core only stores and cascades it.

use super::ids::{UiStateId, UserId};

/// Opaque per-user UI element state (§3 "UIState").
#[derive(Debug, Clone)]
pub struct UiState {
    /// Surrogate primary key.
    pub id: UiStateId,
    /// Owning user.
    pub user_id: UserId,
    /// Caller-chosen item key (e.g. a widget id).
    pub item: String,
    /// Opaque value, interpreted only by the UI.
    pub value: String,
}
