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

use std::{
    cmp::Ordering,
    hash::{Hash, Hasher},
};

use serde::{Deserialize, Serialize};

/// The value of a named attribute, as extracted from a cached value by an accessor.
///
/// Values of different kinds never compare equal. Only [`AttributeValue::Int`], [`AttributeValue::Float`] and
/// [`AttributeValue::Str`] support ordering in queries. Floats are compared with [`f64::total_cmp`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AttributeValue {
    /// Missing attribute.
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// UTF-8 string.
    Str(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
}

impl AttributeValue {
    fn rank(&self) -> u8 {
        match self {
            AttributeValue::Null => 0,
            AttributeValue::Bool(_) => 1,
            AttributeValue::Int(_) => 2,
            AttributeValue::Float(_) => 3,
            AttributeValue::Str(_) => 4,
            AttributeValue::Bytes(_) => 5,
        }
    }

    /// Returns `true` if the value can bound a range comparison.
    pub fn is_orderable(&self) -> bool {
        matches!(
            self,
            AttributeValue::Int(_) | AttributeValue::Float(_) | AttributeValue::Str(_)
        )
    }

    /// Returns `true` if both values are of the same kind.
    pub fn same_kind(&self, other: &Self) -> bool {
        self.rank() == other.rank()
    }
}

impl PartialEq for AttributeValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for AttributeValue {}

impl PartialOrd for AttributeValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Total order: by kind first, then by value within a kind.
impl Ord for AttributeValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (AttributeValue::Null, AttributeValue::Null) => Ordering::Equal,
            (AttributeValue::Bool(a), AttributeValue::Bool(b)) => a.cmp(b),
            (AttributeValue::Int(a), AttributeValue::Int(b)) => a.cmp(b),
            (AttributeValue::Float(a), AttributeValue::Float(b)) => a.total_cmp(b),
            (AttributeValue::Str(a), AttributeValue::Str(b)) => a.cmp(b),
            (AttributeValue::Bytes(a), AttributeValue::Bytes(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl Hash for AttributeValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            AttributeValue::Null => {}
            AttributeValue::Bool(v) => v.hash(state),
            AttributeValue::Int(v) => v.hash(state),
            AttributeValue::Float(v) => v.to_bits().hash(state),
            AttributeValue::Str(v) => v.hash(state),
            AttributeValue::Bytes(v) => v.hash(state),
        }
    }
}

macro_rules! impl_from {
    ($($t:ty => |$v:ident| $variant:ident($conv:expr)),* $(,)?) => {
        $(
            impl From<$t> for AttributeValue {
                fn from($v: $t) -> Self {
                    AttributeValue::$variant($conv)
                }
            }
        )*
    };
}

impl_from! {
    bool => |v| Bool(v),
    i8 => |v| Int(v.into()),
    i16 => |v| Int(v.into()),
    i32 => |v| Int(v.into()),
    i64 => |v| Int(v),
    u8 => |v| Int(v.into()),
    u16 => |v| Int(v.into()),
    u32 => |v| Int(v.into()),
    f32 => |v| Float(v.into()),
    f64 => |v| Float(v),
    String => |v| Str(v),
    &str => |v| Str(v.to_string()),
    &String => |v| Str(v.clone()),
    Vec<u8> => |v| Bytes(v),
    &[u8] => |v| Bytes(v.to_vec()),
}

impl<T> From<Option<T>> for AttributeValue
where
    T: Into<AttributeValue>,
{
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(AttributeValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeSet, HashSet};

    use super::*;

    #[test]
    fn test_kinds_never_equal() {
        assert_ne!(AttributeValue::from(1i64), AttributeValue::from(1.0f64));
        assert_ne!(AttributeValue::from("1"), AttributeValue::from(1i64));
        assert_eq!(AttributeValue::from(Option::<i32>::None), AttributeValue::Null);
        assert_eq!(AttributeValue::from(Some(7u8)), AttributeValue::Int(7));
    }

    #[test]
    fn test_float_total_order() {
        let set = [f64::NAN, 1.0, -0.0, 0.0, f64::NEG_INFINITY]
            .into_iter()
            .map(AttributeValue::from)
            .collect::<BTreeSet<_>>();
        assert_eq!(set.len(), 5);
        assert_eq!(set.first(), Some(&AttributeValue::Float(f64::NEG_INFINITY)));

        let set = [f64::NAN, f64::NAN].into_iter().map(AttributeValue::from).collect::<HashSet<_>>();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_orderable() {
        assert!(AttributeValue::from(1i64).is_orderable());
        assert!(AttributeValue::from(1.5f64).is_orderable());
        assert!(AttributeValue::from("a").is_orderable());
        assert!(!AttributeValue::from(true).is_orderable());
        assert!(!AttributeValue::Null.is_orderable());
        assert!(!AttributeValue::from(vec![1u8]).is_orderable());
    }

    #[test]
    fn test_kind_grouping() {
        let values = vec![
            AttributeValue::from("b"),
            AttributeValue::from(3i64),
            AttributeValue::Null,
            AttributeValue::from(-1i64),
            AttributeValue::from("a"),
        ];
        let sorted = values.into_iter().collect::<BTreeSet<_>>().into_iter().collect::<Vec<_>>();
        assert_eq!(
            sorted,
            vec![
                AttributeValue::Null,
                AttributeValue::from(-1i64),
                AttributeValue::from(3i64),
                AttributeValue::from("a"),
                AttributeValue::from("b"),
            ]
        );
    }
}
