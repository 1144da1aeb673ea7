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

//! Shared components for offcache.

/// Allow to enable debug assertions in release profile with feature "strict_assertion".
pub mod assert;
/// Key and value bounds, and the payload serializer contract.
pub mod code;
/// The error model shared by all offcache crates.
pub mod error;
/// Eviction listener contract.
pub mod event;
/// Deterministic hashing for lock striping.
pub mod hasher;
/// Cache loader contract.
pub mod loader;
/// Background runtime and periodic tasks.
pub mod runtime;
/// Lock-free cache operation counters.
pub mod stats;
/// Striped read/write locks.
pub mod striped;
