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

use offcache_common::error::Result;
use serde::{Deserialize, Serialize};

use crate::{predicate::Predicate, value::AttributeValue};

/// Index-assisted selection of keys.
///
/// Leaves on indexed attributes are answered by the index. Leaves on attributes without an index fall back to
/// scanning all cached values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Criteria {
    /// Test on one attribute.
    Attribute {
        /// Attribute name.
        attribute: String,
        /// Test applied to the attribute value.
        predicate: Predicate,
    },
    /// Keys selected by both sides.
    And(Box<Criteria>, Box<Criteria>),
    /// Keys selected by either side.
    Or(Box<Criteria>, Box<Criteria>),
    /// Keys selected by the left side but not by the right side.
    Diff(Box<Criteria>, Box<Criteria>),
}

impl Criteria {
    fn attribute(attribute: impl Into<String>, predicate: Predicate) -> Self {
        Criteria::Attribute {
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

    /// Intersect with `other`.
    pub fn and(self, other: Criteria) -> Self {
        Criteria::And(Box::new(self), Box::new(other))
    }

    /// Union with `other`.
    pub fn or(self, other: Criteria) -> Self {
        Criteria::Or(Box::new(self), Box::new(other))
    }

    /// Remove the keys selected by `other`.
    pub fn diff(self, other: Criteria) -> Self {
        Criteria::Diff(Box::new(self), Box::new(other))
    }

    /// Visit every leaf, left to right.
    pub fn try_for_each_leaf<F>(&self, f: &mut F) -> Result<()>
    where
        F: FnMut(&str, &Predicate) -> Result<()>,
    {
        match self {
            Criteria::Attribute { attribute, predicate } => f(attribute, predicate),
            Criteria::And(l, r) | Criteria::Or(l, r) | Criteria::Diff(l, r) => {
                l.try_for_each_leaf(f)?;
                r.try_for_each_leaf(f)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaves_in_order() {
        let criteria = Criteria::equals("city", "Paris")
            .and(Criteria::between("age", 20i64, 40i64))
            .diff(Criteria::less_than("score", 1.5f64));

        let mut leaves = vec![];
        criteria
            .try_for_each_leaf(&mut |attribute, _| {
                leaves.push(attribute.to_string());
                Ok(())
            })
            .unwrap();
        assert_eq!(leaves, vec!["city", "age", "score"]);
    }
}
