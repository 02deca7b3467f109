use bitcode::{Decode, Encode};

/// Index of a fixed-size page within the data file.
pub type PageIdx = u32;

/// Row position within a node table.
pub type RowIdx = u64;

/// Physical location of a column chunk: a contiguous run of pages on the
/// data file. Immutable once issued; a chunk is relocated by allocating
/// a new descriptor and releasing the old one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Encode, Decode)]
pub struct ChunkDescriptor {
    pub start_page_idx: PageIdx,
    pub num_pages: PageIdx,
}

impl ChunkDescriptor {
    pub fn new(start_page_idx: PageIdx, num_pages: PageIdx) -> Self {
        Self {
            start_page_idx,
            num_pages,
        }
    }

    /// First page index past the described range.
    pub fn end_page_idx(&self) -> PageIdx {
        self.start_page_idx + self.num_pages
    }
}
