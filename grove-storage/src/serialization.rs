//! Little-endian streaming codec for the data-file footer.
//!
//! The footer format interleaves length-prefixed ASCII breadcrumbs with
//! the values they label. Breadcrumbs cost a few bytes per field and turn
//! a corrupted footer into an immediate, named validation failure instead
//! of a silently misparsed map.

use std::io::{Read, Write};

use grove_result::{Error, Result};
use rustc_hash::FxHashSet;

/// Writes primitives, breadcrumbs, and collections in the footer layout.
pub struct Serializer<W: Write> {
    writer: W,
}

impl<W: Write> Serializer<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.writer.write_all(&[value])?;
        Ok(())
    }

    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.writer.write_all(&value.to_le_bytes())?;
        Ok(())
    }

    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        self.writer.write_all(&value.to_le_bytes())?;
        Ok(())
    }

    pub fn write_u64(&mut self, value: u64) -> Result<()> {
        self.writer.write_all(&value.to_le_bytes())?;
        Ok(())
    }

    /// Length-prefixed ASCII label identifying the field that follows.
    pub fn write_debugging_info(&mut self, label: &str) -> Result<()> {
        self.write_u64(label.len() as u64)?;
        self.writer.write_all(label.as_bytes())?;
        Ok(())
    }

    /// u64 length prefix followed by raw little-endian elements.
    pub fn write_u32_set(&mut self, set: &FxHashSet<u32>) -> Result<()> {
        self.write_u64(set.len() as u64)?;
        for value in set {
            self.write_u32(*value)?;
        }
        Ok(())
    }
}

/// Reads the layout produced by [`Serializer`], validating breadcrumbs.
pub struct Deserializer<R: Read> {
    reader: R,
}

impl<R: Read> Deserializer<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.reader.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.reader.read_exact(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let mut buf = [0u8; 4];
        self.reader.read_exact(&mut buf)?;
        Ok(i32::from_le_bytes(buf))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        let mut buf = [0u8; 8];
        self.reader.read_exact(&mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }

    /// Reads a breadcrumb and errors if it does not match `expected`.
    pub fn validate_debugging_info(&mut self, expected: &str) -> Result<()> {
        let len = self.read_u64()? as usize;
        if len != expected.len() {
            return Err(Error::CorruptedMetadata(format!(
                "expected breadcrumb {expected:?}, found a label of {len} bytes"
            )));
        }
        let mut buf = vec![0u8; len];
        self.reader.read_exact(&mut buf)?;
        if buf != expected.as_bytes() {
            return Err(Error::CorruptedMetadata(format!(
                "expected breadcrumb {expected:?}, found {:?}",
                String::from_utf8_lossy(&buf)
            )));
        }
        Ok(())
    }

    pub fn read_u32_set(&mut self) -> Result<FxHashSet<u32>> {
        let len = self.read_u64()? as usize;
        let mut set = FxHashSet::default();
        set.reserve(len);
        for _ in 0..len {
            set.insert(self.read_u32()?);
        }
        Ok(set)
    }
}
