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

use std::sync::atomic::{AtomicUsize, Ordering};

use offcache_common::error::{Error, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::{
    buffer::{Buffer, BufferUsage},
    pointer::{BufferId, Pointer, Relocation},
};

/// Byte store shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByteStoreConfig {
    /// Count of buffers.
    pub buffer_count: usize,
    /// Capacity of each buffer in bytes.
    pub buffer_capacity: usize,
}

impl Default for ByteStoreConfig {
    fn default() -> Self {
        Self {
            buffer_count: 1,
            buffer_capacity: 64 * 1024 * 1024,
        }
    }
}

impl ByteStoreConfig {
    /// Total capacity in bytes.
    pub fn total_capacity(&self) -> usize {
        self.buffer_count.saturating_mul(self.buffer_capacity)
    }
}

/// A pool of fixed-capacity buffers that holds serialized payloads outside the managed heap.
///
/// Each buffer is guarded by its own mutex. Allocation starts at a round-robin buffer and falls through the rest,
/// so a single full buffer never fails an allocation that another buffer could serve.
#[derive(Debug)]
pub struct ByteStore {
    buffers: Vec<Mutex<Buffer>>,
    buffer_capacity: usize,
    cursor: AtomicUsize,
}

impl ByteStore {
    /// Reserve all buffers up front.
    pub fn new(config: &ByteStoreConfig) -> Result<Self> {
        if config.buffer_count == 0 {
            return Err(Error::config("byte store needs at least one buffer"));
        }
        if config.buffer_capacity == 0 {
            return Err(Error::config("byte store buffer capacity must be positive"));
        }
        if config.buffer_count > BufferId::MAX as usize {
            return Err(Error::config("too many byte store buffers").with_context("buffers", config.buffer_count));
        }

        let buffers = (0..config.buffer_count)
            .map(|id| Buffer::new(id as BufferId, config.buffer_capacity).map(Mutex::new))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            buffers = config.buffer_count,
            capacity = config.buffer_capacity,
            "[byte store]: buffers reserved"
        );

        Ok(Self {
            buffers,
            buffer_capacity: config.buffer_capacity,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Count of buffers.
    pub fn buffers(&self) -> usize {
        self.buffers.len()
    }

    /// Capacity of each buffer in bytes.
    pub fn buffer_capacity(&self) -> usize {
        self.buffer_capacity
    }

    fn buffer(&self, pointer: &Pointer) -> Result<&Mutex<Buffer>> {
        self.buffers
            .get(pointer.buffer() as usize)
            .ok_or_else(|| Error::invalid_pointer(pointer))
    }

    /// Allocate a range for a `len`-byte payload.
    ///
    /// Fails with [`ErrorKind::NoSpace`](offcache_common::error::ErrorKind::NoSpace) if no buffer has a large
    /// enough hole or tail left. Compaction may still make room, see [`ByteStore::compactable_for`].
    pub fn allocate(&self, len: usize) -> Result<Pointer> {
        let n = self.buffers.len();
        let start = self.cursor.fetch_add(1, Ordering::Relaxed) % n;
        for i in 0..n {
            let id = (start + i) % n;
            if let Some(pointer) = self.buffers[id].lock().allocate(len) {
                return Ok(pointer);
            }
        }
        Err(Error::no_space(n, self.buffer_capacity, len))
    }

    /// Allocate a range and copy `bytes` into it.
    pub fn store(&self, bytes: &[u8]) -> Result<Pointer> {
        let pointer = self.allocate(bytes.len())?;
        let mut buffer = self.buffer(&pointer)?.lock();
        if let Err(e) = buffer.write(&pointer, bytes) {
            buffer.free(&pointer)?;
            return Err(e);
        }
        Ok(pointer)
    }

    /// Copy `bytes` into an allocated range.
    pub fn write(&self, pointer: &Pointer, bytes: &[u8]) -> Result<()> {
        self.buffer(pointer)?.lock().write(pointer, bytes)
    }

    /// Copy the payload of a range out of the store.
    pub fn read(&self, pointer: &Pointer) -> Result<Vec<u8>> {
        self.buffer(pointer)?.lock().read(pointer)
    }

    /// Return a range to its buffer.
    pub fn free(&self, pointer: &Pointer) -> Result<()> {
        self.buffer(pointer)?.lock().free(pointer)
    }

    /// Buffers whose fragmentation ratio exceeds `threshold`.
    pub fn fragmented_buffers(&self, threshold: f64) -> Vec<BufferId> {
        self.buffers
            .iter()
            .map(|buffer| buffer.lock())
            .filter(|buffer| buffer.fragmentation() > threshold)
            .map(|buffer| buffer.id())
            .collect()
    }

    /// The first buffer that would fit a `len`-byte payload after compaction.
    pub fn compactable_for(&self, len: usize) -> Option<BufferId> {
        self.buffers
            .iter()
            .map(|buffer| buffer.lock())
            .find(|buffer| buffer.fits_after_compaction(len))
            .map(|buffer| buffer.id())
    }

    /// Compact a buffer and return the moves.
    ///
    /// The caller must hold off every reader of the buffer's old pointers until it has applied the relocations.
    pub fn compact(&self, buffer: BufferId) -> Result<Vec<Relocation>> {
        let mutex = self
            .buffers
            .get(buffer as usize)
            .ok_or_else(|| Error::config("buffer out of range").with_context("buffer", buffer))?;
        let mut guard = mutex.lock();
        let before = guard.usage();
        let relocations = guard.compact();
        tracing::debug!(
            buffer,
            moved = relocations.len(),
            reclaimed = before.free,
            "[byte store]: buffer compacted"
        );
        Ok(relocations)
    }

    /// Drop every range in every buffer.
    pub fn clear(&self) {
        for buffer in &self.buffers {
            buffer.lock().reset();
        }
    }

    /// Per-buffer space accounting.
    pub fn usage(&self) -> Vec<BufferUsage> {
        self.buffers.iter().map(|buffer| buffer.lock().usage()).collect()
    }

    /// Check the layout invariants of every buffer.
    pub fn verify(&self) -> Result<()> {
        self.buffers.iter().try_for_each(|buffer| buffer.lock().verify())
    }
}

#[cfg(test)]
mod tests {
    use offcache_common::error::ErrorKind;

    use super::*;

    fn store(buffer_count: usize, buffer_capacity: usize) -> ByteStore {
        ByteStore::new(&ByteStoreConfig {
            buffer_count,
            buffer_capacity,
        })
        .unwrap()
    }

    #[test]
    fn test_invalid_config() {
        for (count, capacity) in [(0, 1024), (1, 0)] {
            let err = ByteStore::new(&ByteStoreConfig {
                buffer_count: count,
                buffer_capacity: capacity,
            })
            .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Config);
        }
    }

    #[test]
    fn test_round_robin() {
        let store = store(4, 1024);
        let buffers = (0..8)
            .map(|i| store.store(&[i; 16]).unwrap().buffer())
            .collect::<Vec<_>>();
        assert_eq!(buffers, vec![0, 1, 2, 3, 0, 1, 2, 3]);
    }

    #[test]
    fn test_fall_through_full_buffer() {
        let store = store(2, 100);
        let p1 = store.store(&[1; 100]).unwrap();
        // The cursor points at the full buffer, but the other one still has room.
        let p2 = store.store(&[2; 50]).unwrap();
        let p3 = store.store(&[3; 50]).unwrap();
        assert_ne!(p1.buffer(), p2.buffer());
        assert_eq!(p2.buffer(), p3.buffer());

        let err = store.store(&[4; 1]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoSpace);
    }

    #[test]
    fn test_oversized_payload() {
        let store = store(1, 1024);
        let err = store.store(&[0; 2048]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoSpace);
        assert!(store.compactable_for(2048).is_none());
    }

    #[test]
    fn test_foreign_pointer() {
        let a = store(1, 1024);
        let b = store(2, 1024);
        b.store(&[0; 8]).unwrap();
        let pointer = b.store(&[0; 8]).unwrap();
        assert_eq!(pointer.buffer(), 1);
        assert_eq!(a.read(&pointer).unwrap_err().kind(), ErrorKind::InvalidPointer);
    }

    #[test]
    fn test_compact_makes_room() {
        let store = store(1, 1000);
        let pointers = (0..10).map(|i| store.store(&[i; 100]).unwrap()).collect::<Vec<_>>();
        for pointer in pointers.iter().step_by(2) {
            store.free(pointer).unwrap();
        }

        assert_eq!(store.allocate(200).unwrap_err().kind(), ErrorKind::NoSpace);
        assert_eq!(store.fragmented_buffers(0.3), vec![0]);
        assert!(store.fragmented_buffers(0.5).is_empty());

        let buffer = store.compactable_for(200).unwrap();
        let relocations = store.compact(buffer).unwrap();
        for relocation in &relocations {
            let expected = store.read(&relocation.to).unwrap();
            assert_eq!(expected.len(), 100);
            assert_eq!(store.read(&relocation.from).unwrap_err().kind(), ErrorKind::InvalidPointer);
        }
        store.verify().unwrap();
        store.store(&[0; 500]).unwrap();
    }

    #[test]
    fn test_clear() {
        let store = store(2, 128);
        let pointers = (0..4).map(|i| store.store(&[i; 64]).unwrap()).collect::<Vec<_>>();
        store.clear();
        for pointer in &pointers {
            assert_eq!(store.read(pointer).unwrap_err().kind(), ErrorKind::InvalidPointer);
        }
        assert!(store.usage().iter().all(|usage| usage.live == 0 && usage.watermark == 0));
    }
}
