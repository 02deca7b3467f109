//! CSV reading for grove's `COPY <table> FROM '<file>'` path.
//!
//! The reader is deliberately small: RFC-4180 quoting, configurable
//! delimiter, optional header row. Field values come back as strings;
//! typed parsing happens at the table layer, which knows the column
//! schema.

#![forbid(unsafe_code)]

pub mod reader;

pub use reader::{CsvFile, CsvReadOptions, CsvReader};
