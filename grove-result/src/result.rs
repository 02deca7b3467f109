use crate::error::Error;

/// Result type alias used throughout grove.
///
/// All grove operations that can fail return this type so errors flow
/// through the workspace without per-crate conversion glue.
pub type Result<T> = std::result::Result<T, Error>;
