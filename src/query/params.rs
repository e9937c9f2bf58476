// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! [`FindParameters`] and [`SortMethod`] (§4.2).

use super::filters::Filters;
use crate::model::ids::UserId;
use crate::util::Range;

/// Escape `%`, `_` and `\` in a user-supplied keyword so it can be safely embedded in a
/// `LIKE ... ESCAPE '\'` pattern (§4.2 "search-keywords").
#[must_use]
pub fn escape_like_keyword(keyword: &str) -> String {
    let mut escaped = String::with_capacity(keyword.len());
    for ch in keyword.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Append one `column LIKE ? ESCAPE '\'` condition per keyword token (required conjuncts) to
/// `conditions`/`args`.
pub(super) fn push_keyword_conditions(
    keywords: &[String],
    column: &str,
    conditions: &mut Vec<String>,
    args: &mut Vec<Box<dyn rusqlite::ToSql>>,
) {
    for keyword in keywords {
        conditions.push(format!("{column} LIKE ? ESCAPE '\\'"));
        args.push(Box::new(format!("%{}%", escape_like_keyword(keyword))));
    }
}

/// How a finder should order its results (§4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortMethod {
    /// A reproducible pseudo-random order, keyed by [`FindParameters::random_seed`] (§4.2
    /// "Random mode").
    Random,
    /// Alphabetical by name/sort-name.
    Name,
    /// Most recently created/modified first.
    LastWritten,
    /// Most recently starred first. Requires [`FindParameters::user_id`].
    StarredDateDesc,
    /// Most played first. Requires [`FindParameters::user_id`].
    PlayCountDesc,
}

/// The parameter bag every finder accepts (§4.2 "Find parameter objects").
#[derive(Debug, Clone)]
pub struct FindParameters {
    /// AND-intersected constraints.
    pub filters: Filters,
    /// Space-separated tokens, every one of which must match (as a case-insensitive substring of
    /// the entity's primary name) for a row to be returned. Tokens are matched as required
    /// conjuncts, not a phrase (§4.2).
    pub search_keywords: Vec<String>,
    /// Sort order.
    pub sort_method: SortMethod,
    /// The page to return.
    pub range: Range,
    /// Scopes user-relative sort methods (`StarredDateDesc`, `PlayCountDesc`) and user-owned
    /// entities (e.g. a user's own `TrackList`s); `None` for sort methods that don't need it.
    pub user_id: Option<UserId>,
    /// Seed for [`SortMethod::Random`]. The same seed reproduces the same ordering across
    /// paginated calls within a session (§4.2 "Random mode" — the caller, not the finder, is
    /// responsible for memoising the seed across a sequence of paginated requests).
    pub random_seed: Option<i64>,
}

impl FindParameters {
    /// Construct parameters for the first page (offset 0) of `size` rows, with no filters and
    /// [`SortMethod::Name`] order.
    #[must_use]
    pub fn first_page(size: usize) -> Self {
        Self {
            filters: Filters::default(),
            search_keywords: Vec::new(),
            sort_method: SortMethod::Name,
            range: Range::first(size),
            user_id: None,
            random_seed: None,
        }
    }

    /// Builder: set the filters.
    #[must_use]
    pub fn with_filters(mut self, filters: Filters) -> Self {
        self.filters = filters;
        self
    }

    /// Builder: set the search-keywords list (split on whitespace; each token is matched as a
    /// required conjunct).
    #[must_use]
    pub fn with_search_keywords(mut self, query: &str) -> Self {
        self.search_keywords = query.split_whitespace().map(str::to_string).collect();
        self
    }

    /// Builder: set the sort method.
    #[must_use]
    pub fn with_sort_method(mut self, sort_method: SortMethod) -> Self {
        self.sort_method = sort_method;
        self
    }

    /// Builder: set the range.
    #[must_use]
    pub fn with_range(mut self, range: Range) -> Self {
        self.range = range;
        self
    }

    /// Builder: set the user scope.
    #[must_use]
    pub fn with_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Builder: set the random seed.
    #[must_use]
    pub fn with_random_seed(mut self, seed: i64) -> Self {
        self.random_seed = Some(seed);
        self
    }
}
