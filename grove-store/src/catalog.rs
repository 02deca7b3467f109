//! Table catalog and its persisted snapshot form.

use bitcode::{Decode, Encode};
use grove_result::{Error, Result};
use grove_storage::types::ChunkDescriptor;
use rustc_hash::FxHashMap;

use crate::node_group::ChunkedNodeGroup;
use crate::schema::ColumnSchema;
use crate::table::NodeTable;

/// Per-database table registry. Also collects page ranges orphaned by
/// `DROP TABLE` until the next checkpoint recycles them.
#[derive(Default)]
pub struct Catalog {
    tables: FxHashMap<String, NodeTable>,
    retired: Vec<ChunkDescriptor>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_table(&mut self, table: NodeTable) -> Result<()> {
        let name = table.name().to_string();
        if self.tables.contains_key(&name) {
            return Err(Error::InvalidArgumentError(format!(
                "table {name} already exists"
            )));
        }
        self.tables.insert(name, table);
        Ok(())
    }

    /// Removes a table, retiring every page range it referenced.
    pub fn drop_table(&mut self, name: &str) -> Result<()> {
        let table = self
            .tables
            .remove(name)
            .ok_or_else(|| Error::NotFound(format!("table {name}")))?;
        let descriptors = table.all_descriptors();
        tracing::debug!(table = name, ranges = descriptors.len(), "dropped table");
        self.retired.extend(descriptors);
        Ok(())
    }

    pub fn table(&self, name: &str) -> Result<&NodeTable> {
        self.tables
            .get(name)
            .ok_or_else(|| Error::NotFound(format!("table {name}")))
    }

    pub fn table_mut(&mut self, name: &str) -> Result<&mut NodeTable> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| Error::NotFound(format!("table {name}")))
    }

    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.keys().cloned().collect();
        names.sort();
        names
    }

    /// Drains every range orphaned since the last checkpoint: the
    /// catalog-level list from dropped tables plus each live table's
    /// dropped-column list.
    pub fn take_retired(&mut self) -> Vec<ChunkDescriptor> {
        let mut retired = std::mem::take(&mut self.retired);
        for table in self.tables.values_mut() {
            retired.extend(table.take_retired());
        }
        retired
    }

    /// Builds the persisted form. Every group must be flushed already.
    pub fn snapshot(&self) -> Result<CatalogSnapshot> {
        let mut tables = Vec::with_capacity(self.tables.len());
        for name in self.table_names() {
            let table = self.table(&name)?;
            let mut groups = Vec::with_capacity(table.groups().len());
            for group in table.groups() {
                groups.push(GroupSnapshot {
                    num_rows: group.num_rows(),
                    chunks: group.snapshot_descriptors()?,
                });
            }
            tables.push(TableSnapshot {
                name: table.name().to_string(),
                primary_key: table.primary_key().to_string(),
                columns: table.columns().to_vec(),
                groups,
            });
        }
        Ok(CatalogSnapshot { tables })
    }

    pub fn from_snapshot(snapshot: CatalogSnapshot) -> Self {
        let mut catalog = Self::new();
        for table in snapshot.tables {
            let groups = table
                .groups
                .into_iter()
                .map(|group| ChunkedNodeGroup::from_descriptors(group.num_rows, group.chunks))
                .collect();
            let rebuilt =
                NodeTable::from_parts(table.name.clone(), table.primary_key, table.columns, groups);
            catalog.tables.insert(table.name, rebuilt);
        }
        catalog
    }
}

/// Catalog as written to the metadata file.
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct CatalogSnapshot {
    pub tables: Vec<TableSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct TableSnapshot {
    pub name: String,
    pub primary_key: String,
    pub columns: Vec<ColumnSchema>,
    pub groups: Vec<GroupSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct GroupSnapshot {
    pub num_rows: u64,
    pub chunks: Vec<ChunkDescriptor>,
}
