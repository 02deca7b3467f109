use bitcode::{Decode, Encode};
use grove_result::{Error, Result};

/// Column value types the engine stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum LogicalType {
    Bool,
    Int16,
    Int32,
    Int64,
    Text,
}

impl LogicalType {
    /// Parses a DDL type name.
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.to_ascii_uppercase().as_str() {
            "BOOL" | "BOOLEAN" => Ok(Self::Bool),
            "INT16" => Ok(Self::Int16),
            "INT32" => Ok(Self::Int32),
            "INT64" => Ok(Self::Int64),
            "STRING" => Ok(Self::Text),
            other => Err(Error::InvalidArgumentError(format!(
                "unsupported column type {other}"
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Bool => "BOOL",
            Self::Int16 => "INT16",
            Self::Int32 => "INT32",
            Self::Int64 => "INT64",
            Self::Text => "STRING",
        }
    }
}

/// Name and type of one table column.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct ColumnSchema {
    pub name: String,
    pub data_type: LogicalType,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, data_type: LogicalType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}
