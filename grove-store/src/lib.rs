//! Tables, node groups, and the checkpoint protocol.
//!
//! This crate layers the logical storage model on top of
//! `grove-storage`: node tables hold chunked node groups, node groups
//! hold column chunks, and the [`checkpoint`] module makes the whole
//! arrangement durable while recycling page ranges that DDL and deletes
//! have orphaned.
//!
//! The public entry points are [`Database`] and [`Connection`], which
//! accept the engine's statement surface (`CREATE NODE TABLE`, `COPY`,
//! `CHECKPOINT`, `DROP TABLE`, `ALTER TABLE ... DROP COLUMN`, and the
//! `MATCH ... DELETE` form).

#![forbid(unsafe_code)]

pub mod catalog;
pub mod checkpoint;
pub mod column_chunk;
pub mod connection;
pub mod database;
pub mod node_group;
pub mod schema;
pub mod statement;
pub mod table;

pub use catalog::Catalog;
pub use column_chunk::ColumnChunk;
pub use connection::{Connection, QueryOutcome};
pub use database::{Database, DATA_FILE_NAME, METADATA_FILE_NAME};
pub use node_group::{ChunkedNodeGroup, NODE_GROUP_SIZE};
pub use schema::{ColumnSchema, LogicalType};
pub use statement::Statement;
pub use table::NodeTable;
