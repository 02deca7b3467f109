//! Node tables: schema plus a vector of chunked node groups.

use grove_csv::CsvFile;
use grove_result::{Error, Result};
use grove_storage::types::ChunkDescriptor;
use grove_storage::{DataFile, PageRangeAllocator};

use crate::column_chunk::ColumnChunk;
use crate::node_group::{ChunkedNodeGroup, NODE_GROUP_SIZE};
use crate::schema::ColumnSchema;

/// A node table. Rows are identified positionally inside their group;
/// the `id` property is an ordinary column that the delete path filters
/// on.
pub struct NodeTable {
    name: String,
    primary_key: String,
    columns: Vec<ColumnSchema>,
    groups: Vec<ChunkedNodeGroup>,
    /// Ranges orphaned by DDL against this table since the last
    /// checkpoint, waiting to be recycled.
    retired: Vec<ChunkDescriptor>,
}

impl NodeTable {
    pub fn new(
        name: impl Into<String>,
        columns: Vec<ColumnSchema>,
        primary_key: impl Into<String>,
    ) -> Result<Self> {
        let name = name.into();
        let primary_key = primary_key.into();
        if columns.is_empty() {
            return Err(Error::InvalidArgumentError(format!(
                "table {name} needs at least one column"
            )));
        }
        if !columns.iter().any(|column| column.name == primary_key) {
            return Err(Error::InvalidArgumentError(format!(
                "primary key {primary_key} is not a column of table {name}"
            )));
        }
        Ok(Self {
            name,
            primary_key,
            columns,
            groups: Vec::new(),
            retired: Vec::new(),
        })
    }

    /// Rebuilds a table from persisted parts.
    pub fn from_parts(
        name: String,
        primary_key: String,
        columns: Vec<ColumnSchema>,
        groups: Vec<ChunkedNodeGroup>,
    ) -> Self {
        Self {
            name,
            primary_key,
            columns,
            groups,
            retired: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    pub fn columns(&self) -> &[ColumnSchema] {
        &self.columns
    }

    pub fn groups(&self) -> &[ChunkedNodeGroup] {
        &self.groups
    }

    pub fn live_rows(&self) -> u64 {
        self.groups.iter().map(ChunkedNodeGroup::live_rows).sum()
    }

    /// Appends a parsed CSV file, batching rows into node groups.
    pub fn append_csv(&mut self, file: &CsvFile) -> Result<u64> {
        if file.num_columns() != self.columns.len() {
            return Err(Error::Csv(format!(
                "table {} has {} columns, file has {}",
                self.name,
                self.columns.len(),
                file.num_columns()
            )));
        }

        for batch in file.records.chunks(NODE_GROUP_SIZE) {
            let mut chunks: Vec<ColumnChunk> = self
                .columns
                .iter()
                .map(|column| ColumnChunk::new(column.data_type))
                .collect();
            for record in batch {
                for (chunk, field) in chunks.iter_mut().zip(record) {
                    chunk.push_parsed(field)?;
                }
            }
            self.groups.push(ChunkedNodeGroup::from_chunks(chunks)?);
        }
        Ok(file.records.len() as u64)
    }

    /// Drops one column, retiring the page ranges its flushed chunks
    /// occupied. The primary key cannot be dropped.
    pub fn drop_column(&mut self, column_name: &str) -> Result<()> {
        if column_name == self.primary_key {
            return Err(Error::InvalidArgumentError(format!(
                "cannot drop primary key column {column_name} of table {}",
                self.name
            )));
        }
        let column_idx = self
            .columns
            .iter()
            .position(|column| column.name == column_name)
            .ok_or_else(|| Error::NotFound(format!("column {column_name}")))?;

        self.columns.remove(column_idx);
        for group in &mut self.groups {
            if let Some(descriptor) = group.remove_column(column_idx) {
                self.retired.push(descriptor);
            }
        }
        tracing::debug!(table = %self.name, column = column_name, "dropped column");
        Ok(())
    }

    /// Marks every live row with `lower < id < upper` deleted and
    /// returns how many matched.
    pub fn delete_where_id_between(
        &mut self,
        lower: i64,
        upper: i64,
        data_file: &mut DataFile,
    ) -> Result<u64> {
        let id_idx = self
            .columns
            .iter()
            .position(|column| column.name == "id")
            .ok_or_else(|| Error::NotFound(format!("column id of table {}", self.name)))?;

        let mut deleted = 0u64;
        for group in &mut self.groups {
            let ids = group.read_column(id_idx, &self.columns, data_file)?;
            for offset in 0..group.num_rows() {
                if group.is_deleted(offset) {
                    continue;
                }
                let id = ids.value_as_i64(offset as usize).ok_or_else(|| {
                    Error::InvalidArgumentError(format!(
                        "id column of table {} is not numeric",
                        self.name
                    ))
                })?;
                if id > lower && id < upper && group.mark_deleted(offset) {
                    deleted += 1;
                }
            }
        }
        Ok(deleted)
    }

    /// Flushes every dirty group. Groups whose rows were all deleted are
    /// removed outright; their ranges join the replaced list, which the
    /// coordinator releases after the data file is synced.
    pub fn flush(
        &mut self,
        allocator: &mut PageRangeAllocator,
        data_file: &mut DataFile,
    ) -> Result<Vec<ChunkDescriptor>> {
        let mut replaced = Vec::new();
        let mut kept = Vec::with_capacity(self.groups.len());

        for mut group in self.groups.drain(..) {
            if group.live_rows() == 0 {
                replaced.extend(group.on_disk_descriptors());
                tracing::debug!(table = %self.name, "removed fully deleted node group");
                continue;
            }
            if group.needs_flush() {
                replaced.extend(group.flush(&self.columns, allocator, data_file)?);
            }
            kept.push(group);
        }

        self.groups = kept;
        Ok(replaced)
    }

    /// Hands over ranges orphaned by DDL since the last checkpoint.
    pub fn take_retired(&mut self) -> Vec<ChunkDescriptor> {
        std::mem::take(&mut self.retired)
    }

    /// Every on-disk range this table still references, plus its retired
    /// list. Used when the whole table is dropped.
    pub fn all_descriptors(mut self) -> Vec<ChunkDescriptor> {
        let mut descriptors = std::mem::take(&mut self.retired);
        for group in &self.groups {
            descriptors.extend(group.on_disk_descriptors());
        }
        descriptors
    }
}
