//! The statement surface the engine accepts.
//!
//! Only the forms the storage core needs are parsed; anything else is an
//! invalid-argument error. Keywords are case-insensitive, a trailing
//! semicolon is optional.

use std::path::PathBuf;
use std::sync::OnceLock;

use grove_result::{Error, Result};
use regex::Regex;

use crate::schema::{ColumnSchema, LogicalType};

static CREATE_TABLE_RE: OnceLock<Regex> = OnceLock::new();
static COPY_RE: OnceLock<Regex> = OnceLock::new();
static DROP_TABLE_RE: OnceLock<Regex> = OnceLock::new();
static ALTER_DROP_COLUMN_RE: OnceLock<Regex> = OnceLock::new();
static MATCH_DELETE_RE: OnceLock<Regex> = OnceLock::new();
static PRIMARY_KEY_RE: OnceLock<Regex> = OnceLock::new();

fn create_table_re() -> &'static Regex {
    CREATE_TABLE_RE.get_or_init(|| {
        Regex::new(r"(?is)^CREATE\s+NODE\s+TABLE\s+(\w+)\s*\((.*)\)$").expect("static regex")
    })
}

fn copy_re() -> &'static Regex {
    COPY_RE.get_or_init(|| {
        Regex::new(r"(?i)^COPY\s+(\w+)\s+FROM\s+'([^']+)'$").expect("static regex")
    })
}

fn drop_table_re() -> &'static Regex {
    DROP_TABLE_RE.get_or_init(|| Regex::new(r"(?i)^DROP\s+TABLE\s+(\w+)$").expect("static regex"))
}

fn alter_drop_column_re() -> &'static Regex {
    ALTER_DROP_COLUMN_RE.get_or_init(|| {
        Regex::new(r"(?i)^ALTER\s+TABLE\s+(\w+)\s+DROP\s+COLUMN\s+(\w+)$").expect("static regex")
    })
}

fn match_delete_re() -> &'static Regex {
    MATCH_DELETE_RE.get_or_init(|| {
        Regex::new(
            r"(?i)^MATCH\s*\(\s*(\w+)\s*:\s*(\w+)\s*\)\s*WHERE\s+(\w+)\.id\s*>\s*(-?\d+)\s+AND\s+(\w+)\.id\s*<\s*(-?\d+)\s+DELETE\s+(\w+)\s+RETURN\s+(\w+)\.\*$",
        )
        .expect("static regex")
    })
}

fn primary_key_re() -> &'static Regex {
    PRIMARY_KEY_RE.get_or_init(|| {
        Regex::new(r"(?i)^PRIMARY\s+KEY\s*\(\s*(\w+)\s*\)$").expect("static regex")
    })
}

/// One parsed statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    CreateNodeTable {
        table: String,
        columns: Vec<ColumnSchema>,
        primary_key: String,
    },
    Copy {
        table: String,
        source: PathBuf,
    },
    Checkpoint,
    DropTable {
        table: String,
    },
    AlterDropColumn {
        table: String,
        column: String,
    },
    MatchDelete {
        table: String,
        lower: i64,
        upper: i64,
    },
}

impl Statement {
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim().trim_end_matches(';').trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidArgumentError("empty statement".to_string()));
        }

        if trimmed.eq_ignore_ascii_case("CHECKPOINT") {
            return Ok(Self::Checkpoint);
        }
        if let Some(captures) = create_table_re().captures(trimmed) {
            return parse_create(&captures[1], &captures[2]);
        }
        if let Some(captures) = copy_re().captures(trimmed) {
            return Ok(Self::Copy {
                table: captures[1].to_string(),
                source: PathBuf::from(&captures[2]),
            });
        }
        if let Some(captures) = drop_table_re().captures(trimmed) {
            return Ok(Self::DropTable {
                table: captures[1].to_string(),
            });
        }
        if let Some(captures) = alter_drop_column_re().captures(trimmed) {
            return Ok(Self::AlterDropColumn {
                table: captures[1].to_string(),
                column: captures[2].to_string(),
            });
        }
        if let Some(captures) = match_delete_re().captures(trimmed) {
            return parse_match_delete(&captures);
        }

        Err(Error::InvalidArgumentError(format!(
            "cannot parse statement: {trimmed}"
        )))
    }
}

fn parse_create(table: &str, column_list: &str) -> Result<Statement> {
    let mut columns = Vec::new();
    let mut primary_key: Option<String> = None;

    for item in split_top_level(column_list) {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        if let Some(captures) = primary_key_re().captures(item) {
            if primary_key.replace(captures[1].to_string()).is_some() {
                return Err(Error::InvalidArgumentError(format!(
                    "table {table} declares more than one primary key"
                )));
            }
            continue;
        }
        let mut parts = item.split_whitespace();
        let (name, type_name) = match (parts.next(), parts.next(), parts.next()) {
            (Some(name), Some(type_name), None) => (name, type_name),
            _ => {
                return Err(Error::InvalidArgumentError(format!(
                    "cannot parse column definition: {item}"
                )));
            }
        };
        columns.push(ColumnSchema::new(name, LogicalType::parse(type_name)?));
    }

    let primary_key = primary_key.ok_or_else(|| {
        Error::InvalidArgumentError(format!("table {table} declares no primary key"))
    })?;
    Ok(Statement::CreateNodeTable {
        table: table.to_string(),
        columns,
        primary_key,
    })
}

fn parse_match_delete(captures: &regex::Captures<'_>) -> Result<Statement> {
    let variable = &captures[1];
    for reference in [&captures[3], &captures[5], &captures[7], &captures[8]] {
        if !reference.eq_ignore_ascii_case(variable) {
            return Err(Error::InvalidArgumentError(format!(
                "node variable {reference} does not match pattern variable {variable}"
            )));
        }
    }
    let lower: i64 = captures[4]
        .parse()
        .map_err(|err| Error::InvalidArgumentError(format!("bad lower bound: {err}")))?;
    let upper: i64 = captures[6]
        .parse()
        .map_err(|err| Error::InvalidArgumentError(format!("bad upper bound: {err}")))?;
    Ok(Statement::MatchDelete {
        table: captures[2].to_string(),
        lower,
        upper,
    })
}

/// Splits on commas that sit outside parentheses, so `PRIMARY KEY(id)`
/// survives as one item.
fn split_top_level(input: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for ch in input.chars() {
        match ch {
            '(' => {
                depth += 1;
                current.push(ch);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            ',' if depth == 0 => items.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    if !current.trim().is_empty() {
        items.push(current);
    }
    items
}
