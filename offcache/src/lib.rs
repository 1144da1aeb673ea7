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

//! offcache - off-heap cache for Rust.
//!
//! Values are serialized into slab buffers outside the managed heap and addressed by pointer from an in-memory
//! directory. On top of the off-heap cache, offcache provides a versioned decorator with optimistic version checks,
//! a secondary attribute index with a composable query engine, and a remote store backend with the same cache
//! contract.
//!
//! Start with [`OffHeapCacheBuilder`].

pub use offcache_common as common;
pub use offcache_search as search;
pub use offcache_storage as storage;

/// The off-heap cache.
pub mod offheap;
/// Types re-exported for convenience.
pub mod prelude;
/// Remote store backed cache.
pub mod remote;
/// Cache contracts shared by all backends.
pub mod traits;
/// Versioned cache decorator.
pub mod versioned;

pub use prelude::*;
