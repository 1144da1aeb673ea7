// Copyright 2026 foyer Project Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use serde::{Deserialize, Serialize};

use crate::{criteria::Criteria, filter::Filter};

/// A search over cached values.
///
/// Keys are selected by the criteria (all keys if none), then narrowed by the filter, then cut to the limit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    criteria: Option<Criteria>,
    filter: Option<Filter>,
    limit: Option<usize>,
}

impl Query {
    /// A query that selects every cached value.
    pub fn new() -> Self {
        Self::default()
    }

    /// Select keys with `criteria`.
    pub fn with_criteria(mut self, criteria: Criteria) -> Self {
        self.criteria = Some(criteria);
        self
    }

    /// Narrow the selected values with `filter`.
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Return at most `limit` results.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Key selection.
    pub fn criteria(&self) -> Option<&Criteria> {
        self.criteria.as_ref()
    }

    /// Value filter.
    pub fn filter(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    /// Result limit.
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }
}

impl From<Criteria> for Query {
    fn from(criteria: Criteria) -> Self {
        Query::new().with_criteria(criteria)
    }
}
