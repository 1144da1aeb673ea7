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

use std::cmp::Ordering;

use offcache_common::error::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::value::AttributeValue;

/// A test on a single attribute value.
///
/// Range tests require stored values of the same kind as their bounds, see [`Predicate::evaluate`]. `Gt` and `Lt`
/// are strict, `Between` is inclusive on both bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Predicate {
    /// `value == expected`
    Eq(AttributeValue),
    /// `value > bound`
    Gt(AttributeValue),
    /// `value < bound`
    Lt(AttributeValue),
    /// `lower <= value <= upper`
    Between(AttributeValue, AttributeValue),
}

impl Predicate {
    /// Check the bounds before evaluation.
    ///
    /// Fails with [`ErrorKind::NotComparable`](offcache_common::error::ErrorKind::NotComparable) if a range
    /// bound does not support ordering, or if the two bounds of `Between` are of different kinds.
    pub fn validate(&self, attribute: &str) -> Result<()> {
        match self {
            Predicate::Eq(_) => Ok(()),
            Predicate::Gt(bound) | Predicate::Lt(bound) => {
                if bound.is_orderable() {
                    Ok(())
                } else {
                    Err(Error::not_comparable(attribute, bound))
                }
            }
            Predicate::Between(lower, upper) => {
                if !lower.is_orderable() {
                    return Err(Error::not_comparable(attribute, lower));
                }
                if !upper.is_orderable() || !lower.same_kind(upper) {
                    return Err(Error::not_comparable(attribute, upper));
                }
                Ok(())
            }
        }
    }

    /// Bound of a range test, `None` for `Eq`.
    pub fn bound(&self) -> Option<&AttributeValue> {
        match self {
            Predicate::Eq(_) => None,
            Predicate::Gt(bound) | Predicate::Lt(bound) | Predicate::Between(bound, _) => Some(bound),
        }
    }

    /// Check a stored value before a range test.
    ///
    /// A [`AttributeValue::Null`] value is a missing attribute and never matches. Any other value must be of the
    /// bound's kind, or the test fails with
    /// [`ErrorKind::NotComparable`](offcache_common::error::ErrorKind::NotComparable).
    pub fn check(&self, attribute: &str, value: &AttributeValue) -> Result<()> {
        match self.bound() {
            Some(bound) if !matches!(value, AttributeValue::Null) && !value.same_kind(bound) => {
                Err(Error::not_comparable(attribute, value))
            }
            _ => Ok(()),
        }
    }

    /// Evaluate against a stored value, checking it first with [`Predicate::check`].
    pub fn evaluate(&self, attribute: &str, value: &AttributeValue) -> Result<bool> {
        self.check(attribute, value)?;
        Ok(self.matches(value))
    }

    /// Evaluate against a stored value without checking it. The predicate must have passed
    /// [`Predicate::validate`]. Values of another kind than the bound never match.
    pub fn matches(&self, value: &AttributeValue) -> bool {
        match self {
            Predicate::Eq(expected) => value == expected,
            Predicate::Gt(bound) => value.same_kind(bound) && value.cmp(bound) == Ordering::Greater,
            Predicate::Lt(bound) => value.same_kind(bound) && value.cmp(bound) == Ordering::Less,
            Predicate::Between(lower, upper) => value.same_kind(lower) && lower <= value && value <= upper,
        }
    }
}

#[cfg(test)]
mod tests {
    use offcache_common::error::ErrorKind;

    use super::*;

    #[test]
    fn test_strict_and_inclusive() {
        let gt = Predicate::Gt(AttributeValue::Int(10));
        let lt = Predicate::Lt(AttributeValue::Int(10));
        let between = Predicate::Between(AttributeValue::Int(10), AttributeValue::Int(20));

        assert!(!gt.matches(&AttributeValue::Int(10)));
        assert!(gt.matches(&AttributeValue::Int(11)));
        assert!(!lt.matches(&AttributeValue::Int(10)));
        assert!(lt.matches(&AttributeValue::Int(9)));
        assert!(between.matches(&AttributeValue::Int(10)));
        assert!(between.matches(&AttributeValue::Int(20)));
        assert!(!between.matches(&AttributeValue::Int(21)));
    }

    #[test]
    fn test_kind_mismatch_never_matches() {
        let gt = Predicate::Gt(AttributeValue::Int(10));
        assert!(!gt.matches(&AttributeValue::from("zzz")));
        assert!(!gt.matches(&AttributeValue::Float(100.0)));
        assert!(!gt.matches(&AttributeValue::Null));
    }

    #[test]
    fn test_evaluate_stored_kind() {
        let gt = Predicate::Gt(AttributeValue::Int(10));
        assert!(gt.evaluate("age", &AttributeValue::Int(11)).unwrap());
        assert!(!gt.evaluate("age", &AttributeValue::Null).unwrap());

        let err = gt.evaluate("age", &AttributeValue::Bool(true)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotComparable);
        let err = gt.evaluate("age", &AttributeValue::Float(11.0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotComparable);

        // Equality accepts any kind.
        let eq = Predicate::Eq(AttributeValue::Int(10));
        assert!(!eq.evaluate("age", &AttributeValue::Bool(true)).unwrap());
    }

    #[test]
    fn test_validate() {
        assert!(Predicate::Eq(AttributeValue::Bool(true)).validate("flag").is_ok());
        assert!(Predicate::Gt(AttributeValue::from("a")).validate("name").is_ok());

        let err = Predicate::Gt(AttributeValue::Bool(true)).validate("flag").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotComparable);
        let err = Predicate::Between(AttributeValue::Int(1), AttributeValue::from("b")).validate("age").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotComparable);
        let err = Predicate::Lt(AttributeValue::Null).validate("age").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotComparable);
    }
}
