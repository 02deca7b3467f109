//! The checkpoint coordinator.
//!
//! A checkpoint makes every in-memory change durable and recycles page
//! ranges that DDL and deletes have orphaned. The protocol, in order:
//!
//! 1. Ranges orphaned by already-executed DDL (`DROP TABLE`,
//!    `ALTER ... DROP COLUMN`) go back to the allocator. They have no
//!    replacement chunk; the atomic metadata update in step 4 keeps the
//!    previous catalog authoritative if this checkpoint dies early.
//! 2. Dirty node groups are flushed table by table: allocate, write,
//!    sync, and only then release the descriptors the rewrite replaced.
//!    A replaced range is never released before its replacement is
//!    durable, otherwise a crash could resurrect a chunk whose pages now
//!    belong to someone else. Ranges released here may be reused by
//!    later flushes within the same checkpoint.
//! 3. The free chunk map is serialized into the data-file footer along
//!    with the page high-water mark.
//! 4. The catalog snapshot is written to the metadata file via
//!    write-then-rename.
//!
//! The whole path runs on one thread while the rest of the engine is
//! quiesced; on abort, reopen rebuilds from the last durable footer and
//! snapshot.

use std::fs;
use std::path::Path;

use grove_result::{Error, Result};
use grove_storage::{DataFile, PageRangeAllocator, Serializer};

use crate::catalog::Catalog;

/// Runs one checkpoint over the database's storage state.
pub struct CheckpointCoordinator<'a> {
    catalog: &'a mut Catalog,
    allocator: &'a mut PageRangeAllocator,
    data_file: &'a mut DataFile,
    metadata_path: &'a Path,
}

impl<'a> CheckpointCoordinator<'a> {
    pub fn new(
        catalog: &'a mut Catalog,
        allocator: &'a mut PageRangeAllocator,
        data_file: &'a mut DataFile,
        metadata_path: &'a Path,
    ) -> Self {
        Self {
            catalog,
            allocator,
            data_file,
            metadata_path,
        }
    }

    pub fn run(self) -> Result<()> {
        tracing::debug!("checkpoint started");

        // 1. Recycle ranges orphaned by DDL since the last checkpoint.
        let retired = self.catalog.take_retired();
        if !retired.is_empty() {
            tracing::debug!(ranges = retired.len(), "recycling ranges orphaned by DDL");
            for descriptor in retired {
                self.allocator.release(descriptor);
            }
        }

        // 2. Flush dirty groups; release replaced ranges only once the
        //    new pages are durable.
        for name in self.catalog.table_names() {
            let table = self.catalog.table_mut(&name)?;
            let replaced = table.flush(self.allocator, self.data_file)?;
            if !replaced.is_empty() {
                self.data_file.sync_all()?;
                for descriptor in replaced {
                    self.allocator.release(descriptor);
                }
            }
        }
        self.data_file.sync_all()?;

        // 3. Footer: free chunk map plus the high-water mark.
        let mut footer = Vec::new();
        let mut serializer = Serializer::new(&mut footer);
        self.allocator
            .free_chunk_map()
            .serialize(&mut serializer)?;
        self.data_file
            .write_footer(self.allocator.end_page_idx(), &footer)?;

        // 4. Catalog snapshot, write-then-rename.
        let snapshot = self.catalog.snapshot()?;
        let bytes = bitcode::encode(&snapshot);
        let tmp_path = self.metadata_path.with_extension("meta.tmp");
        {
            let mut tmp = fs::File::create(&tmp_path)?;
            use std::io::Write;
            tmp.write_all(&bytes)?;
            tmp.sync_all()?;
        }
        fs::rename(&tmp_path, self.metadata_path).map_err(Error::Io)?;

        tracing::debug!(
            end_page_idx = self.allocator.end_page_idx(),
            free_pages = self.allocator.free_chunk_map().total_free_pages(),
            "checkpoint finished"
        );
        Ok(())
    }
}
