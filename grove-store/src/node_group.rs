//! Chunked node groups: the unit of columnar flushing.
//!
//! A node group holds up to [`NODE_GROUP_SIZE`] rows. Each column is
//! either still in memory (appended since the last checkpoint) or
//! resident on a page range of the data file. Deletions are tracked as a
//! row-offset bitmap and resolved at checkpoint time by rewriting the
//! group compacted; the old page ranges are handed back to the allocator
//! by the coordinator once the replacement is durable.

use croaring::Treemap;
use grove_result::{Error, Result};
use grove_storage::constants::PAGE_SIZE;
use grove_storage::types::ChunkDescriptor;
use grove_storage::{DataFile, PageRangeAllocator};

use crate::column_chunk::ColumnChunk;
use crate::schema::ColumnSchema;

/// Maximum number of rows per node group.
pub const NODE_GROUP_SIZE: usize = 2048;

/// Where a column's values currently live.
#[derive(Debug, Clone)]
pub enum ChunkState {
    InMemory(ColumnChunk),
    OnDisk(ChunkDescriptor),
}

/// A horizontal partition of a node table.
#[derive(Clone)]
pub struct ChunkedNodeGroup {
    num_rows: u64,
    chunks: Vec<ChunkState>,
    deleted: Treemap,
    dirty: bool,
}

impl ChunkedNodeGroup {
    /// Builds a fresh, unflushed group from in-memory columns.
    pub fn from_chunks(chunks: Vec<ColumnChunk>) -> Result<Self> {
        let num_rows = chunks
            .first()
            .map(ColumnChunk::len)
            .ok_or_else(|| Error::Internal("node group needs at least one column".to_string()))?;
        if chunks.iter().any(|chunk| chunk.len() != num_rows) {
            return Err(Error::Internal(
                "node group columns disagree on row count".to_string(),
            ));
        }
        Ok(Self {
            num_rows: num_rows as u64,
            chunks: chunks.into_iter().map(ChunkState::InMemory).collect(),
            deleted: Treemap::new(),
            dirty: true,
        })
    }

    /// Rebuilds a flushed group from its persisted descriptors.
    pub fn from_descriptors(num_rows: u64, descriptors: Vec<ChunkDescriptor>) -> Self {
        Self {
            num_rows,
            chunks: descriptors.into_iter().map(ChunkState::OnDisk).collect(),
            deleted: Treemap::new(),
            dirty: false,
        }
    }

    pub fn num_rows(&self) -> u64 {
        self.num_rows
    }

    pub fn num_deleted(&self) -> u64 {
        self.deleted.cardinality()
    }

    pub fn live_rows(&self) -> u64 {
        self.num_rows - self.deleted.cardinality()
    }

    pub fn needs_flush(&self) -> bool {
        self.dirty
    }

    /// Marks one row offset deleted. Returns false if it already was.
    pub fn mark_deleted(&mut self, offset: u64) -> bool {
        debug_assert!(offset < self.num_rows);
        if self.deleted.contains(offset) {
            return false;
        }
        self.deleted.add(offset);
        self.dirty = true;
        true
    }

    pub fn is_deleted(&self, offset: u64) -> bool {
        self.deleted.contains(offset)
    }

    /// Detaches one column. Returns its descriptor when the values were
    /// on disk, so the caller can retire the range.
    pub fn remove_column(&mut self, column_idx: usize) -> Option<ChunkDescriptor> {
        match self.chunks.remove(column_idx) {
            ChunkState::OnDisk(descriptor) => Some(descriptor),
            ChunkState::InMemory(_) => None,
        }
    }

    /// Materializes one column, reading it back from the data file when
    /// it has already been flushed.
    pub fn read_column(
        &self,
        column_idx: usize,
        schema: &[ColumnSchema],
        data_file: &mut DataFile,
    ) -> Result<ColumnChunk> {
        match &self.chunks[column_idx] {
            ChunkState::InMemory(chunk) => Ok(chunk.clone()),
            ChunkState::OnDisk(descriptor) => {
                let bytes = data_file.read_pages(*descriptor)?;
                ColumnChunk::from_bytes(
                    schema[column_idx].data_type,
                    self.num_rows as usize,
                    &bytes,
                )
            }
        }
    }

    /// Writes the group's current contents to freshly allocated page
    /// ranges, compacting away deleted rows.
    ///
    /// Returns the descriptors this flush replaced. The caller must not
    /// release them into the allocator until the new pages are durable.
    pub fn flush(
        &mut self,
        schema: &[ColumnSchema],
        allocator: &mut PageRangeAllocator,
        data_file: &mut DataFile,
    ) -> Result<Vec<ChunkDescriptor>> {
        if !self.dirty {
            return Ok(Vec::new());
        }
        let has_deletions = !self.deleted.is_empty();
        let mut replaced = Vec::new();
        let mut new_states = Vec::with_capacity(self.chunks.len());

        for (column_idx, state) in self.chunks.iter().enumerate() {
            let chunk = match state {
                ChunkState::InMemory(chunk) => chunk.clone(),
                ChunkState::OnDisk(descriptor) => {
                    // A flushed column only re-enters flush() through a
                    // deletion: dirty is set by from_chunks (all columns
                    // in memory) or by mark_deleted.
                    debug_assert!(has_deletions);
                    let bytes = data_file.read_pages(*descriptor)?;
                    replaced.push(*descriptor);
                    ColumnChunk::from_bytes(
                        schema[column_idx].data_type,
                        self.num_rows as usize,
                        &bytes,
                    )?
                }
            };
            let compacted = if has_deletions {
                chunk.filter_deleted(&self.deleted)
            } else {
                chunk
            };

            let bytes = compacted.to_bytes();
            let num_pages = bytes.len().div_ceil(PAGE_SIZE) as u32;
            let descriptor = allocator.allocate(num_pages.max(1))?;
            data_file.write_pages(descriptor.start_page_idx, &bytes)?;
            tracing::debug!(
                column = %schema[column_idx].name,
                start_page_idx = descriptor.start_page_idx,
                num_pages = descriptor.num_pages,
                "flushed column chunk"
            );
            new_states.push(ChunkState::OnDisk(descriptor));
        }

        self.num_rows = self.live_rows();
        self.chunks = new_states;
        self.deleted = Treemap::new();
        self.dirty = false;
        Ok(replaced)
    }

    /// Descriptors of every on-disk column, regardless of dirtiness.
    pub fn on_disk_descriptors(&self) -> Vec<ChunkDescriptor> {
        self.chunks
            .iter()
            .filter_map(|state| match state {
                ChunkState::OnDisk(descriptor) => Some(*descriptor),
                ChunkState::InMemory(_) => None,
            })
            .collect()
    }

    /// Descriptors for the catalog snapshot. Errors if the group still
    /// holds unflushed columns; the checkpoint must flush first.
    pub fn snapshot_descriptors(&self) -> Result<Vec<ChunkDescriptor>> {
        self.chunks
            .iter()
            .map(|state| match state {
                ChunkState::OnDisk(descriptor) => Ok(*descriptor),
                ChunkState::InMemory(_) => Err(Error::Internal(
                    "cannot snapshot a node group with unflushed columns".to_string(),
                )),
            })
            .collect()
    }
}
