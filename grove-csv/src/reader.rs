use std::fs;
use std::path::Path;

use grove_result::{Error, Result};

#[derive(Debug, Clone)]
pub struct CsvReadOptions {
    pub has_header: bool,
    pub delimiter: u8,
}

impl Default for CsvReadOptions {
    fn default() -> Self {
        Self {
            has_header: true,
            delimiter: b',',
        }
    }
}

/// A fully parsed CSV file. `header` is empty when the options say the
/// file carries none.
#[derive(Debug, Clone)]
pub struct CsvFile {
    pub header: Vec<String>,
    pub records: Vec<Vec<String>>,
}

impl CsvFile {
    pub fn num_columns(&self) -> usize {
        if !self.header.is_empty() {
            self.header.len()
        } else {
            self.records.first().map_or(0, Vec::len)
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CsvReader {
    options: CsvReadOptions,
}

impl CsvReader {
    pub fn new(options: CsvReadOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CsvReadOptions {
        &self.options
    }

    /// Reads and parses the whole file, enforcing a rectangular shape.
    pub fn read_file(&self, path: impl AsRef<Path>) -> Result<CsvFile> {
        let path = path.as_ref();
        let content = fs::read(path)
            .map_err(|err| Error::Csv(format!("cannot read {}: {err}", path.display())))?;
        let mut rows = parse(&content, self.options.delimiter)?;

        let header = if self.options.has_header && !rows.is_empty() {
            rows.remove(0)
        } else {
            Vec::new()
        };

        let expected = if !header.is_empty() {
            header.len()
        } else {
            rows.first().map_or(0, Vec::len)
        };
        for (idx, row) in rows.iter().enumerate() {
            if row.len() != expected {
                return Err(Error::Csv(format!(
                    "{}: record {} has {} fields, expected {expected}",
                    path.display(),
                    idx + 1,
                    row.len()
                )));
            }
        }

        Ok(CsvFile {
            header,
            records: rows,
        })
    }
}

/// Byte-level CSV parser with RFC-4180 quoting: quoted fields may embed
/// delimiters, newlines, and doubled quotes.
fn parse(content: &[u8], delimiter: u8) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = Vec::new();
    let mut in_quotes = false;
    let mut i = 0;

    while i < content.len() {
        let byte = content[i];
        if in_quotes {
            if byte == b'"' {
                if content.get(i + 1) == Some(&b'"') {
                    field.push(b'"');
                    i += 1;
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(byte);
            }
        } else if byte == b'"' && field.is_empty() {
            in_quotes = true;
        } else if byte == delimiter {
            row.push(finish_field(&mut field)?);
        } else if byte == b'\n' {
            if field.last() == Some(&b'\r') {
                field.pop();
            }
            row.push(finish_field(&mut field)?);
            rows.push(std::mem::take(&mut row));
        } else {
            field.push(byte);
        }
        i += 1;
    }

    if in_quotes {
        return Err(Error::Csv("unterminated quoted field".to_string()));
    }
    if !field.is_empty() || !row.is_empty() {
        row.push(finish_field(&mut field)?);
        rows.push(row);
    }
    Ok(rows)
}

fn finish_field(field: &mut Vec<u8>) -> Result<String> {
    String::from_utf8(std::mem::take(field))
        .map_err(|err| Error::Csv(format!("invalid UTF-8 in field: {err}")))
}
