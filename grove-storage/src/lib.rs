//! Page-level storage primitives for grove.
//!
//! This crate owns the physical side of the engine: page and chunk
//! addressing ([`types`]), the little-endian metadata codec
//! ([`serialization`]), the size-classed free list that recycles page
//! ranges across checkpoints ([`free_chunk_map`]), the allocator that
//! arbitrates between reuse and file growth ([`page_allocator`]), and
//! the data file itself ([`data_file`]).
//!
//! Everything here is single-threaded by contract: mutations happen on
//! the checkpoint path while the rest of the engine is quiesced, so none
//! of these structures carry locks.

#![forbid(unsafe_code)]

pub mod constants;
pub mod data_file;
pub mod free_chunk_map;
pub mod page_allocator;
pub mod serialization;
pub mod types;

pub use data_file::DataFile;
pub use free_chunk_map::{FreeChunkEntry, FreeChunkMap, NUM_CHUNK_LEVELS};
pub use page_allocator::PageRangeAllocator;
pub use serialization::{Deserializer, Serializer};
pub use types::{ChunkDescriptor, PageIdx, RowIdx};
