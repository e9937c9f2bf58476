// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! The `AuthToken` entity (§3) and the `processAuthToken` contract (§8 `TokenExpiry`).

use chrono::{DateTime, Utc};

use super::ids::{AuthTokenId, UserId};

/// An opaque per-`(User, domain)` token (§3 "AuthToken").
#[derive(Debug, Clone)]
pub struct AuthToken {
    /// Surrogate primary key.
    pub id: AuthTokenId,
    /// Owning user.
    pub user_id: UserId,
    /// Domain this token is scoped to (e.g. `"subsonic"`, `"ui-remember-me"`).
    pub domain: String,
    /// Opaque token value.
    pub value: String,
    /// Expiry, if any. A token past its expiry is always `Denied` even if still present in
    /// storage (§8 `TokenExpiry`).
    pub expiry: Option<DateTime<Utc>>,
    /// Maximum number of times this token may be used, if bounded.
    pub max_use_count: Option<u32>,
    /// Number of times this token has been used so far.
    pub use_count: u32,
    /// When this token was last used.
    pub last_used: Option<DateTime<Utc>>,
}

/// Outcome of validating an [`AuthToken`] against a presented value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenOutcome {
    /// Token is valid; the caller should record a use.
    Granted,
    /// Token is expired, exhausted, or does not exist.
    Denied,
}

impl AuthToken {
    /// Validate this token at `now`, per §8 `TokenExpiry`: a token whose `expiry` is in the past
    /// is denied even though the row is still present, and a token that has reached
    /// `max_use_count` is denied as exhausted.
    #[must_use]
    pub fn check(&self, now: DateTime<Utc>) -> TokenOutcome {
        if self.expiry.is_some_and(|expiry| expiry <= now) {
            return TokenOutcome::Denied;
        }
        if self.max_use_count.is_some_and(|max| self.use_count >= max) {
            return TokenOutcome::Denied;
        }
        TokenOutcome::Granted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample(expiry: Option<DateTime<Utc>>) -> AuthToken {
        AuthToken {
            id: AuthTokenId::new(1),
            user_id: UserId::new(1),
            domain: "subsonic".to_string(),
            value: "tok".to_string(),
            expiry,
            max_use_count: None,
            use_count: 0,
            last_used: None,
        }
    }

    #[test]
    fn expired_token_is_denied_even_if_present() {
        let now = Utc::now();
        let token = sample(Some(now - Duration::seconds(1)));
        assert_eq!(token.check(now), TokenOutcome::Denied);
    }

    #[test]
    fn future_expiry_is_granted() {
        let now = Utc::now();
        let token = sample(Some(now + Duration::seconds(60)));
        assert_eq!(token.check(now), TokenOutcome::Granted);
    }

    #[test]
    fn no_expiry_is_granted() {
        let now = Utc::now();
        assert_eq!(sample(None).check(now), TokenOutcome::Granted);
    }

    #[test]
    fn exhausted_use_count_is_denied() {
        let now = Utc::now();
        let mut token = sample(None);
        token.max_use_count = Some(2);
        token.use_count = 2;
        assert_eq!(token.check(now), TokenOutcome::Denied);
    }
}
