use crate::types::PageIdx;

/// Size of one data-file page in bytes.
pub const PAGE_SIZE: usize = 4096;

/// Sentinel for "no page". Never a valid chunk start.
pub const INVALID_PAGE_IDX: PageIdx = PageIdx::MAX;

/// Magic value terminating the data-file trailer.
pub const DATA_FILE_MAGIC: u64 = 0x4752_4F56_4544_4154; // "GROVEDAT"
