//! The on-disk data file: a page region followed by a metadata footer.
//!
//! Layout after a successful checkpoint:
//!
//! ```text
//! [ pages: end_page_idx * PAGE_SIZE bytes ]
//! [ footer: serialized free chunk map     ]
//! [ trailer: end_page_idx u32 | footer_len u32 | magic u64 ]
//! ```
//!
//! The trailer is fixed-size and sits at the very end of the file, so
//! open can locate the footer without any out-of-band state. A trailer
//! that fails validation refuses the open rather than guessing.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use grove_result::{Error, Result};

use crate::constants::{DATA_FILE_MAGIC, PAGE_SIZE};
use crate::types::{ChunkDescriptor, PageIdx};

const TRAILER_SIZE: u64 = 16;

/// Owns the data file handle and performs page-granular I/O.
#[derive(Debug)]
pub struct DataFile {
    file: File,
    path: PathBuf,
}

impl DataFile {
    /// Opens the data file, creating it empty if it does not exist.
    pub fn open_or_create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes `bytes` starting at page `start_page_idx`, zero-padding the
    /// final page.
    pub fn write_pages(&mut self, start_page_idx: PageIdx, bytes: &[u8]) -> Result<()> {
        self.file
            .seek(SeekFrom::Start(u64::from(start_page_idx) * PAGE_SIZE as u64))?;
        self.file.write_all(bytes)?;
        let remainder = bytes.len() % PAGE_SIZE;
        if remainder != 0 {
            let padding = vec![0u8; PAGE_SIZE - remainder];
            self.file.write_all(&padding)?;
        }
        Ok(())
    }

    /// Reads the raw bytes of a chunk's page range.
    pub fn read_pages(&mut self, descriptor: ChunkDescriptor) -> Result<Vec<u8>> {
        let offset = u64::from(descriptor.start_page_idx) * PAGE_SIZE as u64;
        let len = descriptor.num_pages as usize * PAGE_SIZE;
        self.file.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; len];
        self.file.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Truncates the file to the page region, then appends the footer
    /// bytes and the trailer, and syncs.
    pub fn write_footer(&mut self, end_page_idx: PageIdx, footer: &[u8]) -> Result<()> {
        let page_region = u64::from(end_page_idx) * PAGE_SIZE as u64;
        self.file.set_len(page_region)?;
        self.file.seek(SeekFrom::Start(page_region))?;
        self.file.write_all(footer)?;

        let mut trailer = [0u8; TRAILER_SIZE as usize];
        trailer[0..4].copy_from_slice(&end_page_idx.to_le_bytes());
        trailer[4..8].copy_from_slice(&(footer.len() as u32).to_le_bytes());
        trailer[8..16].copy_from_slice(&DATA_FILE_MAGIC.to_le_bytes());
        self.file.write_all(&trailer)?;
        self.file.sync_all()?;
        Ok(())
    }

    /// Locates and returns `(end_page_idx, footer_bytes)`, or `None` for
    /// a freshly created empty file.
    pub fn read_footer(&mut self) -> Result<Option<(PageIdx, Vec<u8>)>> {
        let file_len = self.file.metadata()?.len();
        if file_len == 0 {
            return Ok(None);
        }
        if file_len < TRAILER_SIZE {
            return Err(Error::CorruptedMetadata(format!(
                "data file is {file_len} bytes, too short for a trailer"
            )));
        }

        self.file.seek(SeekFrom::End(-(TRAILER_SIZE as i64)))?;
        let mut trailer = [0u8; TRAILER_SIZE as usize];
        self.file.read_exact(&mut trailer)?;

        let magic = u64::from_le_bytes(trailer[8..16].try_into().map_err(|_| {
            Error::Internal("trailer slice length mismatch".to_string())
        })?);
        if magic != DATA_FILE_MAGIC {
            return Err(Error::CorruptedMetadata(
                "data file trailer magic mismatch".to_string(),
            ));
        }
        let end_page_idx = u32::from_le_bytes(
            trailer[0..4]
                .try_into()
                .map_err(|_| Error::Internal("trailer slice length mismatch".to_string()))?,
        );
        let footer_len = u32::from_le_bytes(
            trailer[4..8]
                .try_into()
                .map_err(|_| Error::Internal("trailer slice length mismatch".to_string()))?,
        );

        let page_region = u64::from(end_page_idx) * PAGE_SIZE as u64;
        if page_region + u64::from(footer_len) + TRAILER_SIZE != file_len {
            return Err(Error::CorruptedMetadata(format!(
                "data file length {file_len} does not match trailer ({end_page_idx} pages, {footer_len} footer bytes)"
            )));
        }

        self.file.seek(SeekFrom::Start(page_region))?;
        let mut footer = vec![0u8; footer_len as usize];
        self.file.read_exact(&mut footer)?;
        Ok(Some((end_page_idx, footer)))
    }

    pub fn sync_all(&self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    pub fn size_on_disk(&self) -> Result<u64> {
        Ok(self.file.metadata()?.len())
    }
}
