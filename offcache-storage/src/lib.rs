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

//! Byte store for offcache.
//!
//! Serialized payloads live in a fixed pool of anonymous memory mappings. Callers hold [`Pointer`]s into the
//! pool and must apply [`Relocation`]s after compaction.

mod buffer;
mod pointer;
mod store;

pub use buffer::{Buffer, BufferUsage};
pub use pointer::{BufferId, Pointer, Relocation};
pub use store::{ByteStore, ByteStoreConfig};
