//! grove: an embedded graph-table storage engine with checkpoint-time
//! page reclamation.
//!
//! This crate is the primary entrypoint for the grove workspace. It
//! re-exports the statement surface and the storage abstractions from
//! the underlying `grove-*` crates so applications see a single
//! surface.
//!
//! # Crate topology
//!
//! - **Statement surface**: [`Database`] and [`Connection`] from
//!   `grove-store` accept the engine's DDL/DML forms and run the
//!   checkpoint protocol.
//! - **Storage core**: [`storage`] re-exports the page-level machinery,
//!   most notably the free chunk map that recycles page ranges orphaned
//!   by `DROP TABLE`, `ALTER TABLE ... DROP COLUMN`, and node-group
//!   deletes.
//! - **Ingestion**: [`csv`] parses the files that `COPY ... FROM`
//!   loads.
//!
//! # Storage reclamation in one paragraph
//!
//! Column chunks live on contiguous page ranges of a single data file.
//! When a checkpoint replaces or abandons a chunk, its range enters a
//! size-classed free list (the free chunk map) that later allocations
//! consult before growing the file. The map itself is persisted in the
//! data file's footer, so reclaimed space survives restarts. The
//! `grove-bench` workload driver measures the effect as checkpoint
//! latency and file-size drift.

#![forbid(unsafe_code)]

pub use grove_result::{Error, Result};
pub use grove_store::{
    Catalog, ChunkedNodeGroup, ColumnChunk, Connection, Database, NodeTable, QueryOutcome,
    Statement,
};

/// Page-level storage primitives.
pub mod storage {
    pub use grove_storage::{
        ChunkDescriptor, DataFile, Deserializer, FreeChunkEntry, FreeChunkMap, PageIdx,
        PageRangeAllocator, RowIdx, Serializer,
    };
}

/// CSV ingestion helpers.
pub mod csv {
    pub use grove_csv::{CsvFile, CsvReadOptions, CsvReader};
}
