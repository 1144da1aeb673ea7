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

use std::collections::HashMap;

use offcache_common::error::Result;
use serde::{Deserialize, Serialize};

use crate::{handler::Accessor, predicate::Predicate, value::AttributeValue};

/// Predicate applied to materialized values after the keys have been resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Filter {
    /// Test on one attribute.
    Attribute {
        /// Attribute name.
        attribute: String,
        /// Test applied to the attribute value.
        predicate: Predicate,
    },
    /// Both sides match.
    And(Box<Filter>, Box<Filter>),
    /// Either side matches.
    Or(Box<Filter>, Box<Filter>),
    /// The left side matches and the right side does not.
    Diff(Box<Filter>, Box<Filter>),
}

impl Filter {
    fn attribute(attribute: impl Into<String>, predicate: Predicate) -> Self {
        Filter::Attribute {
            attribute: attribute.into(),
            predicate,
        }
    }

    /// `attribute == value`
    pub fn equals(attribute: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        Self::attribute(attribute, Predicate::Eq(value.into()))
    }

    /// `attribute > value`
    pub fn greater_than(attribute: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        Self::attribute(attribute, Predicate::Gt(value.into()))
    }

    /// `attribute < value`
    pub fn less_than(attribute: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        Self::attribute(attribute, Predicate::Lt(value.into()))
    }

    /// `lower <= attribute <= upper`
    pub fn between(
        attribute: impl Into<String>,
        lower: impl Into<AttributeValue>,
        upper: impl Into<AttributeValue>,
    ) -> Self {
        Self::attribute(attribute, Predicate::Between(lower.into(), upper.into()))
    }

    /// Both must match.
    pub fn and(self, other: Filter) -> Self {
        Filter::And(Box::new(self), Box::new(other))
    }

    /// Either must match.
    pub fn or(self, other: Filter) -> Self {
        Filter::Or(Box::new(self), Box::new(other))
    }

    /// `self` must match and `other` must not.
    pub fn diff(self, other: Filter) -> Self {
        Filter::Diff(Box::new(self), Box::new(other))
    }

    /// Visit every leaf, left to right.
    pub fn try_for_each_leaf<F>(&self, f: &mut F) -> Result<()>
    where
        F: FnMut(&str, &Predicate) -> Result<()>,
    {
        match self {
            Filter::Attribute { attribute, predicate } => f(attribute, predicate),
            Filter::And(l, r) | Filter::Or(l, r) | Filter::Diff(l, r) => {
                l.try_for_each_leaf(f)?;
                r.try_for_each_leaf(f)
            }
        }
    }

    /// Evaluate against a value.
    ///
    /// Every attribute of the filter must have an accessor in `accessors`, and every predicate must be validated.
    /// A missing accessor never matches. Fails with
    /// [`ErrorKind::NotComparable`](offcache_common::error::ErrorKind::NotComparable) if a range test meets a value
    /// of another kind than its bound.
    pub fn matches<V>(&self, value: &V, accessors: &HashMap<String, Accessor<V>>) -> Result<bool> {
        match self {
            Filter::Attribute { attribute, predicate } => match accessors.get(attribute) {
                Some(accessor) => predicate.evaluate(attribute, &accessor(value)),
                None => Ok(false),
            },
            Filter::And(l, r) => Ok(l.matches(value, accessors)? && r.matches(value, accessors)?),
            Filter::Or(l, r) => Ok(l.matches(value, accessors)? || r.matches(value, accessors)?),
            Filter::Diff(l, r) => Ok(l.matches(value, accessors)? && !r.matches(value, accessors)?),
        }
    }
}
