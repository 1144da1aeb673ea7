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

//! Secondary indices and queries over cached values.

mod criteria;
mod filter;
mod handler;
mod index;
mod predicate;
mod query;
mod value;

pub use criteria::Criteria;
pub use filter::Filter;
pub use handler::{accessor, Accessor, CacheIndexHandler, IndexHandler, NoopIndexHandler, Scanner};
pub use index::{CacheIndex, IndexType, NonUniqueHashIndex, RangeIndex, UniqueHashIndex};
pub use predicate::Predicate;
pub use query::Query;
pub use value::AttributeValue;
