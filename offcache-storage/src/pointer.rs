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

/// Index of a buffer within the byte store pool.
pub type BufferId = u32;

/// Handle of a serialized payload inside a buffer.
///
/// A pointer stays valid until its range is freed or relocated by compaction. Each allocation gets a fresh
/// `generation` from its buffer, so a stale pointer is detected even if its range has been handed out again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pointer {
    pub(crate) buffer: BufferId,
    pub(crate) offset: usize,
    pub(crate) len: usize,
    pub(crate) generation: u64,
}

impl Pointer {
    /// The buffer that holds the payload.
    pub fn buffer(&self) -> BufferId {
        self.buffer
    }

    /// Start of the payload within the buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Allocation generation within the buffer.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// A pointer moved by compaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relocation {
    /// The pointer before compaction. It is invalid after compaction.
    pub from: Pointer,
    /// The pointer to the same bytes after compaction.
    pub to: Pointer,
}
