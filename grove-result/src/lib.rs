//! Error types and result definitions for the grove storage engine.
//!
//! Every grove crate returns the unified [`Error`] enum through the
//! [`Result<T>`] alias so failures propagate naturally with the `?`
//! operator across crate boundaries. Callers that need programmatic
//! handling match on the variant; everything else bubbles up to the
//! binary, which reports the display form.

#![forbid(unsafe_code)]

pub mod error;
pub mod result;

pub use error::Error;
pub use result::Result;
