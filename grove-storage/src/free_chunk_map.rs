//! Size-classed free list of reclaimed page ranges.
//!
//! Checkpoints retire column-chunk page ranges when tables or columns are
//! dropped and when node groups are rewritten. The [`FreeChunkMap`] keeps
//! those ranges in eight geometric size classes so a later allocation can
//! be served from recycled space instead of growing the data file.
//!
//! The map carries no lock. Only the checkpoint path mutates it, and the
//! transaction manager quiesces every other actor for the duration of a
//! checkpoint, so a range freed by this checkpoint is safe to hand out
//! within the same checkpoint.

use std::array;
use std::io::{Read, Write};

use grove_result::{Error, Result};
use rustc_hash::FxHashSet;

use crate::constants::INVALID_PAGE_IDX;
use crate::serialization::{Deserializer, Serializer};
use crate::types::{ChunkDescriptor, PageIdx};

/// Number of size classes. The last one is a catch-all.
pub const NUM_CHUNK_LEVELS: usize = 8;

/// Exclusive upper bound on `num_pages` for each size class. A range of
/// `k` pages lands in the smallest class whose bound strictly exceeds
/// `k`, so small ranges fragment at most up to the next bound.
pub const CHUNK_LEVEL_PAGE_LIMITS: [PageIdx; NUM_CHUNK_LEVELS] =
    [2, 4, 8, 16, 32, 64, 128, PageIdx::MAX];

/// One contiguous run of free pages, linked into its size-class chain.
///
/// `next` exclusively owns the tail of the chain; entries within a chain
/// are unordered beyond append-to-tail insertion.
#[derive(Debug, PartialEq, Eq)]
pub struct FreeChunkEntry {
    pub page_idx: PageIdx,
    pub num_pages: PageIdx,
    next: Option<Box<FreeChunkEntry>>,
}

impl FreeChunkEntry {
    fn new(page_idx: PageIdx, num_pages: PageIdx) -> Box<Self> {
        Box::new(Self {
            page_idx,
            num_pages,
            next: None,
        })
    }

    /// The descriptor form of this entry.
    pub fn descriptor(&self) -> ChunkDescriptor {
        ChunkDescriptor::new(self.page_idx, self.num_pages)
    }
}

/// Free-space map over reclaimed page ranges.
///
/// Invariants, holding whenever a public method returns:
/// - every `page_idx` in any chain is in `existing` and vice versa;
/// - a chain at level `c` only holds entries whose `num_pages` classifies
///   to `c`;
/// - `max_avail_level` is the largest non-empty level, `None` if all are
///   empty;
/// - no two entries describe overlapping ranges;
/// - no entry has `num_pages == 0`.
#[derive(Debug, PartialEq, Eq)]
pub struct FreeChunkMap {
    free_lists: [Option<Box<FreeChunkEntry>>; NUM_CHUNK_LEVELS],
    existing: FxHashSet<PageIdx>,
    max_avail_level: Option<usize>,
}

impl Default for FreeChunkMap {
    fn default() -> Self {
        Self::new()
    }
}

impl FreeChunkMap {
    pub fn new() -> Self {
        Self {
            free_lists: array::from_fn(|_| None),
            existing: FxHashSet::default(),
            max_avail_level: None,
        }
    }

    /// Smallest size class whose upper bound strictly exceeds `num_pages`.
    pub fn chunk_level(num_pages: PageIdx) -> usize {
        for (level, limit) in CHUNK_LEVEL_PAGE_LIMITS.iter().enumerate() {
            if num_pages < *limit {
                return level;
            }
        }
        // The final limit is PageIdx::MAX, so only num_pages == u32::MAX
        // falls through; it still belongs to the catch-all class.
        NUM_CHUNK_LEVELS - 1
    }

    pub fn max_avail_level(&self) -> Option<usize> {
        self.max_avail_level
    }

    pub fn is_empty(&self) -> bool {
        self.existing.is_empty()
    }

    pub fn contains(&self, page_idx: PageIdx) -> bool {
        self.existing.contains(&page_idx)
    }

    /// Every live entry as `(level, descriptor)` in chain order.
    pub fn entries(&self) -> Vec<(usize, ChunkDescriptor)> {
        let mut out = Vec::with_capacity(self.existing.len());
        for (level, head) in self.free_lists.iter().enumerate() {
            let mut cursor = head.as_deref();
            while let Some(entry) = cursor {
                out.push((level, entry.descriptor()));
                cursor = entry.next.as_deref();
            }
        }
        out
    }

    /// Sum of `num_pages` over all live entries.
    pub fn total_free_pages(&self) -> u64 {
        self.entries()
            .iter()
            .map(|(_, desc)| u64::from(desc.num_pages))
            .sum()
    }

    /// Records a reclaimed range at the tail of its size class.
    ///
    /// Misuse (zero pages, the invalid sentinel, or a start page already
    /// tracked) trips an assertion in debug builds and is ignored with a
    /// warning in release builds.
    pub fn insert(&mut self, page_idx: PageIdx, num_pages: PageIdx) {
        if page_idx == INVALID_PAGE_IDX || num_pages == 0 {
            debug_assert!(
                false,
                "free chunk insert rejected: page_idx={page_idx} num_pages={num_pages}"
            );
            tracing::warn!(page_idx, num_pages, "ignoring invalid free chunk insert");
            return;
        }
        if self.existing.contains(&page_idx) {
            debug_assert!(false, "duplicate free chunk insert at page {page_idx}");
            tracing::warn!(page_idx, "ignoring duplicate free chunk insert");
            return;
        }

        let level = Self::chunk_level(num_pages);
        let entry = FreeChunkEntry::new(page_idx, num_pages);

        let mut slot = &mut self.free_lists[level];
        loop {
            match slot {
                Some(existing) => slot = &mut existing.next,
                None => break,
            }
        }
        *slot = Some(entry);

        self.existing.insert(page_idx);
        if self.max_avail_level.is_none_or(|max| max < level) {
            self.max_avail_level = Some(level);
        }
        debug_assert!(self.is_consistent());
    }

    /// Removes and returns the first entry large enough for `num_pages`,
    /// searching from the request's own size class upward.
    ///
    /// The entry is returned whole; the caller owns the leftover tail and
    /// is expected to re-insert it. `take(0)` returns `None` with no side
    /// effects.
    pub fn take(&mut self, num_pages: PageIdx) -> Option<FreeChunkEntry> {
        if num_pages == 0 {
            return None;
        }
        let max_avail = self.max_avail_level?;
        let mut level = Self::chunk_level(num_pages);
        if level > max_avail {
            return None;
        }

        while level <= max_avail {
            if let Some(entry) = Self::unlink_first_fit(&mut self.free_lists[level], num_pages) {
                self.existing.remove(&entry.page_idx);
                if level == max_avail && self.free_lists[level].is_none() {
                    self.update_max_avail_level();
                }
                debug_assert!(self.is_consistent());
                return Some(entry);
            }
            level += 1;
        }
        None
    }

    /// First-fit scan of one chain. Unlinks by rewiring boxes, so the hot
    /// path performs no allocation.
    fn unlink_first_fit(
        list: &mut Option<Box<FreeChunkEntry>>,
        num_pages: PageIdx,
    ) -> Option<FreeChunkEntry> {
        let mut slot = list;
        loop {
            let fits = match slot.as_deref() {
                Some(entry) => entry.num_pages >= num_pages,
                None => return None,
            };
            if fits {
                let mut entry = slot.take()?;
                *slot = entry.next.take();
                return Some(*entry);
            }
            slot = match slot {
                Some(entry) => &mut entry.next,
                None => return None,
            };
        }
    }

    /// Rescans downward from the cached maximum after its chain drained.
    fn update_max_avail_level(&mut self) {
        let previous = match self.max_avail_level {
            Some(level) => level,
            None => return,
        };
        self.max_avail_level = (0..=previous)
            .rev()
            .find(|&level| self.free_lists[level].is_some());
    }

    pub fn serialize<W: Write>(&self, serializer: &mut Serializer<W>) -> Result<()> {
        serializer.write_debugging_info("maxAvailLevel")?;
        let raw_level = match self.max_avail_level {
            Some(level) => level as i32,
            None => -1,
        };
        serializer.write_i32(raw_level)?;

        serializer.write_debugging_info("freeChunkList")?;
        serializer.write_u64(NUM_CHUNK_LEVELS as u64)?;
        for head in &self.free_lists {
            match head {
                Some(entry) => {
                    serializer.write_u8(1)?;
                    Self::serialize_chain(entry, serializer)?;
                }
                None => serializer.write_u8(0)?,
            }
        }

        serializer.write_debugging_info("existingFreeChunks")?;
        serializer.write_u32_set(&self.existing)?;
        Ok(())
    }

    fn serialize_chain<W: Write>(
        head: &FreeChunkEntry,
        serializer: &mut Serializer<W>,
    ) -> Result<()> {
        let mut cursor = Some(head);
        while let Some(entry) = cursor {
            serializer.write_debugging_info("pageIdx")?;
            serializer.write_u32(entry.page_idx)?;
            serializer.write_debugging_info("numPages")?;
            serializer.write_u32(entry.num_pages)?;
            serializer.write_debugging_info("nextEntry")?;
            match entry.next.as_deref() {
                Some(next) => {
                    serializer.write_u8(1)?;
                    cursor = Some(next);
                }
                None => {
                    serializer.write_u8(0)?;
                    cursor = None;
                }
            }
        }
        Ok(())
    }

    /// Rebuilds this map in place from serialized bytes. The map keeps
    /// its identity across close/open cycles; a validation failure leaves
    /// it untouched and refuses the open.
    pub fn deserialize<R: Read>(&mut self, deserializer: &mut Deserializer<R>) -> Result<()> {
        deserializer.validate_debugging_info("maxAvailLevel")?;
        let raw_level = deserializer.read_i32()?;
        let max_avail_level = match raw_level {
            -1 => None,
            level if (0..NUM_CHUNK_LEVELS as i32).contains(&level) => Some(level as usize),
            other => {
                return Err(Error::CorruptedMetadata(format!(
                    "free chunk size class {other} out of range"
                )));
            }
        };

        deserializer.validate_debugging_info("freeChunkList")?;
        let num_lists = deserializer.read_u64()?;
        if num_lists != NUM_CHUNK_LEVELS as u64 {
            return Err(Error::CorruptedMetadata(format!(
                "free chunk list count {num_lists}, expected {NUM_CHUNK_LEVELS}"
            )));
        }
        let mut free_lists: [Option<Box<FreeChunkEntry>>; NUM_CHUNK_LEVELS] =
            array::from_fn(|_| None);
        for slot in &mut free_lists {
            if Self::read_presence(deserializer)? {
                *slot = Some(Self::deserialize_chain(deserializer)?);
            }
        }

        deserializer.validate_debugging_info("existingFreeChunks")?;
        let existing = deserializer.read_u32_set()?;

        self.free_lists = free_lists;
        self.existing = existing;
        self.max_avail_level = max_avail_level;
        debug_assert!(self.is_consistent());
        Ok(())
    }

    fn read_presence<R: Read>(deserializer: &mut Deserializer<R>) -> Result<bool> {
        match deserializer.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(Error::CorruptedMetadata(format!(
                "presence flag {other} is neither 0 nor 1"
            ))),
        }
    }

    fn deserialize_chain<R: Read>(
        deserializer: &mut Deserializer<R>,
    ) -> Result<Box<FreeChunkEntry>> {
        let mut fields = Vec::new();
        loop {
            deserializer.validate_debugging_info("pageIdx")?;
            let page_idx = deserializer.read_u32()?;
            deserializer.validate_debugging_info("numPages")?;
            let num_pages = deserializer.read_u32()?;
            fields.push((page_idx, num_pages));
            deserializer.validate_debugging_info("nextEntry")?;
            if !Self::read_presence(deserializer)? {
                break;
            }
        }
        let mut head: Option<Box<FreeChunkEntry>> = None;
        for (page_idx, num_pages) in fields.into_iter().rev() {
            head = Some(Box::new(FreeChunkEntry {
                page_idx,
                num_pages,
                next: head.take(),
            }));
        }
        head.ok_or_else(|| Error::Internal("deserialized an empty free chunk chain".to_string()))
    }

    fn is_consistent(&self) -> bool {
        let entries = self.entries();
        if entries.len() != self.existing.len() {
            return false;
        }
        let mut observed_max = None;
        for (level, desc) in &entries {
            if desc.num_pages == 0
                || Self::chunk_level(desc.num_pages) != *level
                || !self.existing.contains(&desc.start_page_idx)
            {
                return false;
            }
            observed_max = Some(observed_max.map_or(*level, |max: usize| max.max(*level)));
        }
        observed_max == self.max_avail_level
    }
}
