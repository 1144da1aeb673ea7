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

use std::{collections::BTreeMap, fmt::Debug};

use memmap2::MmapMut;
use offcache_common::{
    error::{Error, ErrorKind, Result},
    strict_assert_eq,
};
use serde::{Deserialize, Serialize};

use crate::pointer::{BufferId, Pointer, Relocation};

#[derive(Debug, Clone, Copy)]
struct Slot {
    /// Bytes held by the slot. At least 1, so every slot owns a distinct offset.
    reserved: usize,
    /// Payload length.
    len: usize,
    generation: u64,
}

/// Space accounting of a single buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferUsage {
    /// Buffer index.
    pub id: BufferId,
    /// Fixed capacity in bytes.
    pub capacity: usize,
    /// End of the highest range ever handed out since the last reset or compaction.
    pub watermark: usize,
    /// Bytes held by live ranges.
    pub live: usize,
    /// Bytes in reclaimed ranges below the watermark.
    pub free: usize,
    /// Count of live ranges.
    pub entries: usize,
}

/// A fixed-capacity region of anonymous mapped memory, carved into ranges.
///
/// # Layout
///
/// ```plain
/// 0                                watermark                 capacity
/// | live | hole | live | live | hole |        untouched        |
/// ```
///
/// Live ranges and holes tile `[0, watermark)` exactly. Adjacent holes are always coalesced, and a hole never
/// touches the watermark: freeing the last range lowers the watermark instead.
pub struct Buffer {
    id: BufferId,
    memory: MmapMut,

    watermark: usize,

    /// `offset -> length`
    holes: BTreeMap<usize, usize>,
    hole_bytes: usize,

    /// `offset -> slot`
    slots: BTreeMap<usize, Slot>,
    live_bytes: usize,

    next_generation: u64,
}

impl Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("id", &self.id)
            .field("capacity", &self.capacity())
            .field("watermark", &self.watermark)
            .field("holes", &self.holes.len())
            .field("hole_bytes", &self.hole_bytes)
            .field("slots", &self.slots.len())
            .field("live_bytes", &self.live_bytes)
            .finish()
    }
}

impl Buffer {
    /// Reserve `capacity` bytes of anonymous memory.
    pub fn new(id: BufferId, capacity: usize) -> Result<Self> {
        let memory = MmapMut::map_anon(capacity).map_err(|e| {
            Error::new(ErrorKind::External, "reserve buffer memory failed")
                .with_context("buffer", id)
                .with_context("capacity", capacity)
                .with_source(e)
        })?;
        Ok(Self {
            id,
            memory,
            watermark: 0,
            holes: BTreeMap::new(),
            hole_bytes: 0,
            slots: BTreeMap::new(),
            live_bytes: 0,
            next_generation: 0,
        })
    }

    /// Buffer index.
    pub fn id(&self) -> BufferId {
        self.id
    }

    /// Fixed capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.memory.len()
    }

    fn reserved_len(len: usize) -> usize {
        len.max(1)
    }

    fn next_generation(&mut self) -> u64 {
        let generation = self.next_generation;
        self.next_generation += 1;
        generation
    }

    /// Allocate a range for a `len`-byte payload.
    ///
    /// The first hole that fits is used, otherwise the watermark grows. Returns `None` if neither has room.
    pub fn allocate(&mut self, len: usize) -> Option<Pointer> {
        let reserved = Self::reserved_len(len);

        let fit = self
            .holes
            .iter()
            .find(|(_, hole)| **hole >= reserved)
            .map(|(offset, hole)| (*offset, *hole));

        let offset = match fit {
            Some((offset, hole)) => {
                self.holes.remove(&offset);
                if hole > reserved {
                    self.holes.insert(offset + reserved, hole - reserved);
                }
                self.hole_bytes -= reserved;
                offset
            }
            None => {
                if self.capacity() - self.watermark < reserved {
                    return None;
                }
                let offset = self.watermark;
                self.watermark += reserved;
                offset
            }
        };

        let generation = self.next_generation();
        self.slots.insert(
            offset,
            Slot {
                reserved,
                len,
                generation,
            },
        );
        self.live_bytes += reserved;

        Some(Pointer {
            buffer: self.id,
            offset,
            len,
            generation,
        })
    }

    fn slot(&self, pointer: &Pointer) -> Result<Slot> {
        let slot = match self.slots.get(&pointer.offset) {
            Some(slot) if pointer.buffer == self.id && slot.generation == pointer.generation && slot.len == pointer.len => {
                *slot
            }
            _ => return Err(Error::invalid_pointer(pointer)),
        };
        match pointer.offset.checked_add(slot.reserved) {
            Some(end) if end <= self.watermark && self.watermark <= self.capacity() => Ok(slot),
            _ => Err(Error::corrupt_store("range overflows buffer")
                .with_context("buffer", self.id)
                .with_context("offset", pointer.offset)
                .with_context("reserved", slot.reserved)
                .with_context("watermark", self.watermark)
                .with_context("capacity", self.capacity())),
        }
    }

    /// Copy the payload out of the buffer.
    pub fn read(&self, pointer: &Pointer) -> Result<Vec<u8>> {
        self.slot(pointer)?;
        Ok(self.memory[pointer.offset..pointer.offset + pointer.len].to_vec())
    }

    /// Copy `bytes` into the range. The payload length must match the allocated length exactly.
    pub fn write(&mut self, pointer: &Pointer, bytes: &[u8]) -> Result<()> {
        self.slot(pointer)?;
        if bytes.len() != pointer.len {
            return Err(Error::corrupt_store("payload length mismatch")
                .with_context("pointer", format!("{pointer:?}"))
                .with_context("payload", bytes.len()));
        }
        self.memory[pointer.offset..pointer.offset + pointer.len].copy_from_slice(bytes);
        Ok(())
    }

    /// Return the range to the buffer, coalescing it with adjacent holes.
    pub fn free(&mut self, pointer: &Pointer) -> Result<()> {
        let slot = self.slot(pointer)?;
        self.slots.remove(&pointer.offset);
        self.live_bytes -= slot.reserved;

        let mut start = pointer.offset;
        let mut len = slot.reserved;

        if let Some((&prev, &prev_len)) = self.holes.range(..start).next_back() {
            if prev + prev_len == start {
                self.holes.remove(&prev);
                self.hole_bytes -= prev_len;
                start = prev;
                len += prev_len;
            }
        }

        if let Some(next_len) = self.holes.remove(&(start + len)) {
            self.hole_bytes -= next_len;
            len += next_len;
        }

        if start + len == self.watermark {
            self.watermark = start;
        } else {
            self.holes.insert(start, len);
            self.hole_bytes += len;
        }

        Ok(())
    }

    /// Ratio of reclaimed hole bytes over the capacity.
    pub fn fragmentation(&self) -> f64 {
        self.hole_bytes as f64 / self.capacity() as f64
    }

    /// Returns `true` if a `len`-byte payload would fit once all holes are squeezed out.
    pub fn fits_after_compaction(&self, len: usize) -> bool {
        self.capacity() - self.live_bytes >= Self::reserved_len(len)
    }

    /// Slide all live ranges toward the start of the buffer, in offset order.
    ///
    /// Every moved range gets a new pointer. The old pointers of moved ranges are invalid afterwards.
    pub fn compact(&mut self) -> Vec<Relocation> {
        let mut relocations = vec![];
        let mut cursor = 0;

        let slots = std::mem::take(&mut self.slots);
        for (offset, slot) in slots {
            if offset == cursor {
                self.slots.insert(offset, slot);
            } else {
                self.memory.copy_within(offset..offset + slot.reserved, cursor);
                let generation = self.next_generation();
                let from = Pointer {
                    buffer: self.id,
                    offset,
                    len: slot.len,
                    generation: slot.generation,
                };
                let to = Pointer {
                    offset: cursor,
                    generation,
                    ..from
                };
                relocations.push(Relocation { from, to });
                self.slots.insert(cursor, Slot { generation, ..slot });
            }
            cursor += slot.reserved;
        }

        strict_assert_eq!(cursor, self.live_bytes);

        self.holes.clear();
        self.hole_bytes = 0;
        self.watermark = cursor;

        relocations
    }

    /// Drop all ranges. Pointers handed out before stay invalid forever.
    pub fn reset(&mut self) {
        self.slots.clear();
        self.holes.clear();
        self.hole_bytes = 0;
        self.live_bytes = 0;
        self.watermark = 0;
    }

    /// Space accounting snapshot.
    pub fn usage(&self) -> BufferUsage {
        BufferUsage {
            id: self.id,
            capacity: self.capacity(),
            watermark: self.watermark,
            live: self.live_bytes,
            free: self.hole_bytes,
            entries: self.slots.len(),
        }
    }

    /// Check that live ranges and holes tile `[0, watermark)` without overlapping.
    pub fn verify(&self) -> Result<()> {
        let mut ranges = self
            .slots
            .iter()
            .map(|(offset, slot)| (*offset, slot.reserved))
            .chain(self.holes.iter().map(|(offset, len)| (*offset, *len)))
            .collect::<Vec<_>>();
        ranges.sort_unstable();

        let mut cursor = 0;
        for (offset, len) in ranges {
            if offset != cursor {
                return Err(Error::corrupt_store("ranges overlap or leave a gap")
                    .with_context("buffer", self.id)
                    .with_context("expected", cursor)
                    .with_context("offset", offset));
            }
            cursor += len;
        }
        if cursor != self.watermark || self.watermark > self.capacity() {
            return Err(Error::corrupt_store("ranges do not end at the watermark")
                .with_context("buffer", self.id)
                .with_context("end", cursor)
                .with_context("watermark", self.watermark));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_new(buffer: &mut Buffer, bytes: &[u8]) -> Pointer {
        let pointer = buffer.allocate(bytes.len()).unwrap();
        buffer.write(&pointer, bytes).unwrap();
        pointer
    }

    #[test]
    fn test_allocate_read_write() {
        let mut buffer = Buffer::new(0, 1024).unwrap();

        let p1 = write_new(&mut buffer, &[1; 100]);
        let p2 = write_new(&mut buffer, &[2; 200]);

        assert_eq!(p1.offset(), 0);
        assert_eq!(p2.offset(), 100);
        assert_eq!(buffer.read(&p1).unwrap(), vec![1; 100]);
        assert_eq!(buffer.read(&p2).unwrap(), vec![2; 200]);
        assert_eq!(buffer.usage().watermark, 300);
        assert_eq!(buffer.usage().live, 300);
        buffer.verify().unwrap();

        assert!(buffer.allocate(725).is_none());
        assert!(buffer.allocate(724).is_some());
    }

    #[test]
    fn test_write_length_mismatch() {
        let mut buffer = Buffer::new(0, 64).unwrap();
        let pointer = buffer.allocate(8).unwrap();
        let err = buffer.write(&pointer, &[0; 7]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptStore);
    }

    #[test]
    fn test_free_reuse_and_coalesce() {
        let mut buffer = Buffer::new(0, 1024).unwrap();

        let p1 = write_new(&mut buffer, &[1; 100]);
        let p2 = write_new(&mut buffer, &[2; 100]);
        let p3 = write_new(&mut buffer, &[3; 100]);
        let _p4 = write_new(&mut buffer, &[4; 100]);

        buffer.free(&p1).unwrap();
        buffer.free(&p3).unwrap();
        assert_eq!(buffer.usage().free, 200);
        buffer.verify().unwrap();

        // p1 + p2 + p3 coalesce into a single hole.
        buffer.free(&p2).unwrap();
        assert_eq!(buffer.holes.len(), 1);
        assert_eq!(buffer.holes.get(&0), Some(&300));
        buffer.verify().unwrap();

        // First fit reuses the hole start.
        let p5 = write_new(&mut buffer, &[5; 150]);
        assert_eq!(p5.offset(), 0);
        assert_eq!(buffer.holes.get(&150), Some(&150));
        assert_eq!(buffer.usage().watermark, 400);
        buffer.verify().unwrap();
    }

    #[test]
    fn test_free_tail_lowers_watermark() {
        let mut buffer = Buffer::new(0, 1024).unwrap();

        let p1 = write_new(&mut buffer, &[1; 100]);
        let p2 = write_new(&mut buffer, &[2; 100]);
        buffer.free(&p1).unwrap();
        buffer.free(&p2).unwrap();

        assert_eq!(buffer.usage().watermark, 0);
        assert_eq!(buffer.usage().free, 0);
        assert!(buffer.holes.is_empty());
        buffer.verify().unwrap();
    }

    #[test]
    fn test_stale_pointer() {
        let mut buffer = Buffer::new(0, 1024).unwrap();

        let p1 = write_new(&mut buffer, &[1; 100]);
        buffer.free(&p1).unwrap();
        assert_eq!(buffer.read(&p1).unwrap_err().kind(), ErrorKind::InvalidPointer);
        assert_eq!(buffer.free(&p1).unwrap_err().kind(), ErrorKind::InvalidPointer);

        // Same range, new generation.
        let p2 = write_new(&mut buffer, &[2; 100]);
        assert_eq!(p2.offset(), p1.offset());
        assert_ne!(p2.generation(), p1.generation());
        assert_eq!(buffer.read(&p1).unwrap_err().kind(), ErrorKind::InvalidPointer);
        assert_eq!(buffer.read(&p2).unwrap(), vec![2; 100]);
    }

    #[test]
    fn test_zero_length_payload() {
        let mut buffer = Buffer::new(0, 16).unwrap();

        let p1 = write_new(&mut buffer, &[]);
        let p2 = write_new(&mut buffer, &[]);
        assert_ne!(p1.offset(), p2.offset());
        assert!(buffer.read(&p1).unwrap().is_empty());
        buffer.free(&p1).unwrap();
        buffer.free(&p2).unwrap();
        buffer.verify().unwrap();
    }

    #[test]
    fn test_compact() {
        let mut buffer = Buffer::new(0, 1000).unwrap();

        let pointers = (0..10u8).map(|i| write_new(&mut buffer, &[i; 100])).collect::<Vec<_>>();
        for i in (0..10).step_by(2) {
            buffer.free(&pointers[i]).unwrap();
        }
        assert_eq!(buffer.usage().free, 500);
        assert!((buffer.fragmentation() - 0.5).abs() < f64::EPSILON);
        assert!(buffer.allocate(101).is_none());
        assert!(buffer.fits_after_compaction(500));

        let relocations = buffer.compact();
        assert_eq!(relocations.len(), 5);
        assert_eq!(buffer.usage().watermark, 500);
        assert_eq!(buffer.usage().free, 0);
        buffer.verify().unwrap();

        for (n, relocation) in relocations.iter().enumerate() {
            let i = n * 2 + 1;
            assert_eq!(relocation.from, pointers[i]);
            assert_eq!(relocation.to.offset(), n * 100);
            assert_eq!(buffer.read(&relocation.to).unwrap(), vec![i as u8; 100]);
            assert_eq!(
                buffer.read(&relocation.from).unwrap_err().kind(),
                ErrorKind::InvalidPointer
            );
        }

        assert!(buffer.allocate(500).is_some());
    }

    #[test]
    fn test_reset() {
        let mut buffer = Buffer::new(0, 100).unwrap();
        let p = write_new(&mut buffer, &[7; 100]);
        buffer.reset();
        assert_eq!(buffer.read(&p).unwrap_err().kind(), ErrorKind::InvalidPointer);
        assert_eq!(buffer.usage().entries, 0);
        assert!(buffer.allocate(100).is_some());
    }
}
