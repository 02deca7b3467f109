//! Database lifecycle: open, execute, checkpoint, introspect.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use grove_csv::CsvReader;
use grove_result::{Error, Result};
use grove_storage::serialization::Deserializer;
use grove_storage::{DataFile, FreeChunkMap, PageRangeAllocator};

use crate::catalog::{Catalog, CatalogSnapshot};
use crate::checkpoint::CheckpointCoordinator;
use crate::connection::QueryOutcome;
use crate::statement::Statement;
use crate::table::NodeTable;

/// File names inside the database home directory.
pub const DATA_FILE_NAME: &str = "grove.data";
pub const METADATA_FILE_NAME: &str = "grove.meta";

struct DatabaseState {
    catalog: Catalog,
    allocator: PageRangeAllocator,
    data_file: DataFile,
    metadata_path: PathBuf,
}

/// One database instance. State is per instance, constructed on open and
/// dropped on close; nothing is process-global.
///
/// The mutex serializes statement execution. The storage structures
/// themselves are lock-free by contract: only the checkpoint path
/// mutates them, with everything else quiesced.
pub struct Database {
    state: Mutex<DatabaseState>,
    home: PathBuf,
}

impl Database {
    /// Opens the database in `home`, creating it when empty. A footer or
    /// metadata snapshot that fails validation refuses the open.
    pub fn open(home: impl AsRef<Path>) -> Result<Self> {
        let home = home.as_ref().to_path_buf();
        fs::create_dir_all(&home)?;

        let mut data_file = DataFile::open_or_create(home.join(DATA_FILE_NAME))?;
        let metadata_path = home.join(METADATA_FILE_NAME);

        let footer = data_file.read_footer()?;
        let allocator = match &footer {
            Some((end_page_idx, footer_bytes)) => {
                let mut free_chunk_map = FreeChunkMap::new();
                let mut deserializer = Deserializer::new(footer_bytes.as_slice());
                free_chunk_map.deserialize(&mut deserializer)?;
                PageRangeAllocator::from_parts(free_chunk_map, *end_page_idx)
            }
            None => PageRangeAllocator::new(),
        };

        let catalog = match (footer.is_some(), metadata_path.exists()) {
            (false, false) => Catalog::new(),
            (true, true) => {
                let bytes = fs::read(&metadata_path)?;
                let snapshot: CatalogSnapshot = bitcode::decode(&bytes).map_err(|err| {
                    Error::CorruptedMetadata(format!("catalog snapshot: {err}"))
                })?;
                Catalog::from_snapshot(snapshot)
            }
            (true, false) => {
                return Err(Error::CorruptedMetadata(
                    "data file has a footer but the metadata file is missing".to_string(),
                ));
            }
            (false, true) => {
                return Err(Error::CorruptedMetadata(
                    "metadata file exists but the data file has no footer".to_string(),
                ));
            }
        };

        tracing::debug!(
            home = %home.display(),
            end_page_idx = allocator.end_page_idx(),
            free_pages = allocator.free_chunk_map().total_free_pages(),
            "database opened"
        );
        Ok(Self {
            state: Mutex::new(DatabaseState {
                catalog,
                allocator,
                data_file,
                metadata_path,
            }),
            home,
        })
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Executes one parsed statement.
    pub fn execute(&self, statement: Statement) -> Result<QueryOutcome> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| Error::Internal("database state lock poisoned".to_string()))?;

        match statement {
            Statement::CreateNodeTable {
                table,
                columns,
                primary_key,
            } => {
                state
                    .catalog
                    .create_table(NodeTable::new(table, columns, primary_key)?)?;
                Ok(QueryOutcome::default())
            }
            Statement::Copy { table, source } => {
                let file = CsvReader::default().read_file(&source)?;
                let rows = state.catalog.table_mut(&table)?.append_csv(&file)?;
                Ok(QueryOutcome {
                    rows_affected: rows,
                })
            }
            Statement::Checkpoint => {
                let DatabaseState {
                    catalog,
                    allocator,
                    data_file,
                    metadata_path,
                } = &mut *state;
                CheckpointCoordinator::new(catalog, allocator, data_file, metadata_path).run()?;
                Ok(QueryOutcome::default())
            }
            Statement::DropTable { table } => {
                state.catalog.drop_table(&table)?;
                Ok(QueryOutcome::default())
            }
            Statement::AlterDropColumn { table, column } => {
                state.catalog.table_mut(&table)?.drop_column(&column)?;
                Ok(QueryOutcome::default())
            }
            Statement::MatchDelete {
                table,
                lower,
                upper,
            } => {
                let DatabaseState {
                    catalog, data_file, ..
                } = &mut *state;
                let deleted = catalog
                    .table_mut(&table)?
                    .delete_where_id_between(lower, upper, data_file)?;
                Ok(QueryOutcome {
                    rows_affected: deleted,
                })
            }
        }
    }

    pub fn data_file_size(&self) -> Result<u64> {
        let state = self
            .state
            .lock()
            .map_err(|_| Error::Internal("database state lock poisoned".to_string()))?;
        state.data_file.size_on_disk()
    }

    pub fn metadata_file_size(&self) -> Result<u64> {
        let state = self
            .state
            .lock()
            .map_err(|_| Error::Internal("database state lock poisoned".to_string()))?;
        match fs::metadata(&state.metadata_path) {
            Ok(metadata) => Ok(metadata.len()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(0),
            Err(err) => Err(err.into()),
        }
    }

    pub fn table_names(&self) -> Result<Vec<String>> {
        let state = self
            .state
            .lock()
            .map_err(|_| Error::Internal("database state lock poisoned".to_string()))?;
        Ok(state.catalog.table_names())
    }

    /// Live (non-deleted) row count of one table.
    pub fn table_row_count(&self, name: &str) -> Result<u64> {
        let state = self
            .state
            .lock()
            .map_err(|_| Error::Internal("database state lock poisoned".to_string()))?;
        Ok(state.catalog.table(name)?.live_rows())
    }

    /// Pages currently tracked as reusable, for observability.
    pub fn free_page_count(&self) -> Result<u64> {
        let state = self
            .state
            .lock()
            .map_err(|_| Error::Internal("database state lock poisoned".to_string()))?;
        Ok(state.allocator.free_chunk_map().total_free_pages())
    }
}
