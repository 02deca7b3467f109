//! Page-range allocation on top of the free chunk map.
//!
//! The allocator arbitrates between two sources of pages: ranges recycled
//! by earlier checkpoints (via [`FreeChunkMap`]) and fresh space past the
//! data file's high-water mark. With the `free-chunk-map` feature
//! disabled it degrades to a bump allocator, which is the baseline the
//! workload driver compares against.

use grove_result::{Error, Result};

use crate::free_chunk_map::FreeChunkMap;
use crate::types::{ChunkDescriptor, PageIdx};

/// Hands out contiguous page ranges and accepts retired ones back.
///
/// Ranges returned by [`allocate`](Self::allocate) are exclusively owned
/// by the requesting chunk until that chunk is released; the allocator
/// never hands out overlapping ranges and never overlaps a live free
/// entry.
#[derive(Debug, Default)]
pub struct PageRangeAllocator {
    free_chunk_map: FreeChunkMap,
    end_page_idx: PageIdx,
}

impl PageRangeAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds an allocator from persisted state: the deserialized map
    /// and the page high-water mark recorded in the data-file trailer.
    pub fn from_parts(free_chunk_map: FreeChunkMap, end_page_idx: PageIdx) -> Self {
        Self {
            free_chunk_map,
            end_page_idx,
        }
    }

    /// Smallest page index no chunk has ever occupied.
    pub fn end_page_idx(&self) -> PageIdx {
        self.end_page_idx
    }

    pub fn free_chunk_map(&self) -> &FreeChunkMap {
        &self.free_chunk_map
    }

    pub fn free_chunk_map_mut(&mut self) -> &mut FreeChunkMap {
        &mut self.free_chunk_map
    }

    /// Whether checkpoint-time page reuse is compiled in.
    pub fn reuse_enabled() -> bool {
        cfg!(feature = "free-chunk-map")
    }

    /// Returns a physical range of exactly `num_pages` pages, reusing
    /// recycled space when possible and growing the file otherwise.
    ///
    /// A recycled entry larger than the request is split: the head is
    /// returned and the unused tail goes straight back into the map.
    pub fn allocate(&mut self, num_pages: PageIdx) -> Result<ChunkDescriptor> {
        if num_pages == 0 {
            return Err(Error::InvalidArgumentError(
                "cannot allocate a page range of zero pages".to_string(),
            ));
        }

        if Self::reuse_enabled() {
            if let Some(entry) = self.free_chunk_map.take(num_pages) {
                if entry.num_pages > num_pages {
                    self.free_chunk_map
                        .insert(entry.page_idx + num_pages, entry.num_pages - num_pages);
                }
                tracing::debug!(
                    start_page_idx = entry.page_idx,
                    num_pages,
                    recycled_from = entry.num_pages,
                    "allocated page range from free chunk map"
                );
                return Ok(ChunkDescriptor::new(entry.page_idx, num_pages));
            }
        }

        let start = self.end_page_idx;
        let end = start.checked_add(num_pages).ok_or_else(|| {
            Error::AllocationFailure(format!(
                "page range of {num_pages} pages at {start} exceeds the addressable file size"
            ))
        })?;
        self.end_page_idx = end;
        tracing::debug!(
            start_page_idx = start,
            num_pages,
            "allocated page range past the high-water mark"
        );
        Ok(ChunkDescriptor::new(start, num_pages))
    }

    /// Accepts a range whose owning chunk became unreachable at a
    /// checkpoint boundary. A no-op when reuse is compiled out.
    pub fn release(&mut self, descriptor: ChunkDescriptor) {
        if !Self::reuse_enabled() {
            return;
        }
        tracing::debug!(
            start_page_idx = descriptor.start_page_idx,
            num_pages = descriptor.num_pages,
            "released page range"
        );
        self.free_chunk_map
            .insert(descriptor.start_page_idx, descriptor.num_pages);
    }
}
