//! In-memory column slices and their page-resident byte layout.
//!
//! A chunk serializes to a dense little-endian layout: fixed-width
//! values back to back, text as a u32 length prefix plus UTF-8 bytes per
//! value. The byte image is padded to whole pages by the data file, so a
//! chunk of `n` bytes occupies `ceil(n / PAGE_SIZE)` pages.

use croaring::Treemap;
use grove_result::{Error, Result};

use crate::schema::LogicalType;

/// One column's values for one node group.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnChunk {
    Bool(Vec<bool>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Text(Vec<String>),
}

impl ColumnChunk {
    pub fn new(data_type: LogicalType) -> Self {
        match data_type {
            LogicalType::Bool => Self::Bool(Vec::new()),
            LogicalType::Int16 => Self::Int16(Vec::new()),
            LogicalType::Int32 => Self::Int32(Vec::new()),
            LogicalType::Int64 => Self::Int64(Vec::new()),
            LogicalType::Text => Self::Text(Vec::new()),
        }
    }

    pub fn data_type(&self) -> LogicalType {
        match self {
            Self::Bool(_) => LogicalType::Bool,
            Self::Int16(_) => LogicalType::Int16,
            Self::Int32(_) => LogicalType::Int32,
            Self::Int64(_) => LogicalType::Int64,
            Self::Text(_) => LogicalType::Text,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Bool(values) => values.len(),
            Self::Int16(values) => values.len(),
            Self::Int32(values) => values.len(),
            Self::Int64(values) => values.len(),
            Self::Text(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Parses one CSV field into this chunk's type and appends it.
    pub fn push_parsed(&mut self, raw: &str) -> Result<()> {
        match self {
            Self::Bool(values) => {
                let value = match raw.trim().to_ascii_lowercase().as_str() {
                    "true" | "1" => true,
                    "false" | "0" => false,
                    _ => {
                        return Err(Error::Csv(format!(
                            "cannot parse {raw:?} as {}",
                            LogicalType::Bool.name()
                        )));
                    }
                };
                values.push(value);
            }
            Self::Int16(values) => values.push(parse_number(raw, LogicalType::Int16)?),
            Self::Int32(values) => values.push(parse_number(raw, LogicalType::Int32)?),
            Self::Int64(values) => values.push(parse_number(raw, LogicalType::Int64)?),
            Self::Text(values) => values.push(raw.to_string()),
        }
        Ok(())
    }

    /// Numeric value widened to i64, for predicate evaluation.
    pub fn value_as_i64(&self, idx: usize) -> Option<i64> {
        match self {
            Self::Int16(values) => values.get(idx).map(|v| i64::from(*v)),
            Self::Int32(values) => values.get(idx).map(|v| i64::from(*v)),
            Self::Int64(values) => values.get(idx).copied(),
            Self::Bool(_) | Self::Text(_) => None,
        }
    }

    /// Copy of this chunk with the rows in `deleted` removed.
    pub fn filter_deleted(&self, deleted: &Treemap) -> ColumnChunk {
        fn keep<T: Clone>(values: &[T], deleted: &Treemap) -> Vec<T> {
            values
                .iter()
                .enumerate()
                .filter(|(idx, _)| !deleted.contains(*idx as u64))
                .map(|(_, value)| value.clone())
                .collect()
        }
        match self {
            Self::Bool(values) => Self::Bool(keep(values, deleted)),
            Self::Int16(values) => Self::Int16(keep(values, deleted)),
            Self::Int32(values) => Self::Int32(keep(values, deleted)),
            Self::Int64(values) => Self::Int64(keep(values, deleted)),
            Self::Text(values) => Self::Text(keep(values, deleted)),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Bool(values) => values.iter().map(|v| u8::from(*v)).collect(),
            Self::Int16(values) => values.iter().flat_map(|v| v.to_le_bytes()).collect(),
            Self::Int32(values) => values.iter().flat_map(|v| v.to_le_bytes()).collect(),
            Self::Int64(values) => values.iter().flat_map(|v| v.to_le_bytes()).collect(),
            Self::Text(values) => {
                let mut buf = Vec::new();
                for value in values {
                    buf.extend_from_slice(&(value.len() as u32).to_le_bytes());
                    buf.extend_from_slice(value.as_bytes());
                }
                buf
            }
        }
    }

    /// Decodes `num_values` values of `data_type` from a page image.
    pub fn from_bytes(data_type: LogicalType, num_values: usize, bytes: &[u8]) -> Result<Self> {
        fn fixed<const W: usize, T>(
            num_values: usize,
            bytes: &[u8],
            decode: impl Fn([u8; W]) -> T,
        ) -> Result<Vec<T>> {
            if bytes.len() < num_values * W {
                return Err(Error::CorruptedMetadata(format!(
                    "column chunk truncated: need {} bytes, have {}",
                    num_values * W,
                    bytes.len()
                )));
            }
            Ok(bytes[..num_values * W]
                .chunks_exact(W)
                .map(|chunk| {
                    let mut raw = [0u8; W];
                    raw.copy_from_slice(chunk);
                    decode(raw)
                })
                .collect())
        }

        match data_type {
            LogicalType::Bool => {
                if bytes.len() < num_values {
                    return Err(Error::CorruptedMetadata(
                        "bool column chunk truncated".to_string(),
                    ));
                }
                let mut values = Vec::with_capacity(num_values);
                for byte in &bytes[..num_values] {
                    match byte {
                        0 => values.push(false),
                        1 => values.push(true),
                        other => {
                            return Err(Error::CorruptedMetadata(format!(
                                "bool column byte {other} is neither 0 nor 1"
                            )));
                        }
                    }
                }
                Ok(Self::Bool(values))
            }
            LogicalType::Int16 => Ok(Self::Int16(fixed(num_values, bytes, i16::from_le_bytes)?)),
            LogicalType::Int32 => Ok(Self::Int32(fixed(num_values, bytes, i32::from_le_bytes)?)),
            LogicalType::Int64 => Ok(Self::Int64(fixed(num_values, bytes, i64::from_le_bytes)?)),
            LogicalType::Text => {
                let mut values = Vec::with_capacity(num_values);
                let mut offset = 0usize;
                for _ in 0..num_values {
                    let len_end = offset + 4;
                    if bytes.len() < len_end {
                        return Err(Error::CorruptedMetadata(
                            "text column chunk truncated".to_string(),
                        ));
                    }
                    let len = u32::from_le_bytes(
                        bytes[offset..len_end]
                            .try_into()
                            .map_err(|_| Error::Internal("slice length mismatch".to_string()))?,
                    ) as usize;
                    let value_end = len_end + len;
                    if bytes.len() < value_end {
                        return Err(Error::CorruptedMetadata(
                            "text column chunk truncated".to_string(),
                        ));
                    }
                    let value = String::from_utf8(bytes[len_end..value_end].to_vec()).map_err(
                        |err| Error::CorruptedMetadata(format!("text column not UTF-8: {err}")),
                    )?;
                    values.push(value);
                    offset = value_end;
                }
                Ok(Self::Text(values))
            }
        }
    }
}

fn parse_number<T: std::str::FromStr>(raw: &str, data_type: LogicalType) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|err| {
        Error::Csv(format!(
            "cannot parse {raw:?} as {}: {err}",
            data_type.name()
        ))
    })
}
