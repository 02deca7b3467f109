//! Statement-level entry point.

use std::sync::Arc;

use grove_result::Result;

use crate::database::Database;
use crate::statement::Statement;

/// Result summary of one executed statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryOutcome {
    pub rows_affected: u64,
}

/// A handle for issuing statements against one [`Database`].
///
/// Connections are cheap to clone; they share the database instance.
#[derive(Clone)]
pub struct Connection {
    database: Arc<Database>,
}

impl Connection {
    pub fn new(database: Arc<Database>) -> Self {
        Self { database }
    }

    pub fn database(&self) -> &Arc<Database> {
        &self.database
    }

    /// Parses and executes one statement.
    pub fn query(&self, text: &str) -> Result<QueryOutcome> {
        let statement = Statement::parse(text)?;
        tracing::debug!(statement = text, "executing statement");
        self.database.execute(statement)
    }
}
