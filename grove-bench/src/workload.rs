//! The three test cases and the per-iteration loop.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use grove_store::{Connection, Database, QueryOutcome};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::stats::TestCaseStat;
use crate::{
    SelectionStrategy, TestKind, NUM_ROWS, NUM_TESTS, TABLE_COLUMNS, TABLE_CREATE_STATEMENTS,
    TABLE_CSV_FILES, TABLE_NAMES,
};

/// Issues randomized DDL/DML against one database and records
/// per-iteration metrics.
pub struct WorkloadDriver {
    database: Arc<Database>,
    connection: Connection,
    csv_dir: PathBuf,
    strategy: SelectionStrategy,
    rng: StdRng,
    round_state: usize,
}

impl WorkloadDriver {
    pub fn new(database: Arc<Database>, csv_dir: PathBuf, strategy: SelectionStrategy) -> Self {
        let connection = Connection::new(Arc::clone(&database));
        let round_state = match strategy {
            SelectionStrategy::Round(start) => start,
            _ => 0,
        };
        Self {
            database,
            connection,
            csv_dir,
            strategy,
            rng: StdRng::seed_from_u64(strategy.rng_seed()),
            round_state,
        }
    }

    pub fn strategy(&self) -> SelectionStrategy {
        self.strategy
    }

    fn choose_test(&mut self) -> TestKind {
        let index = match self.strategy {
            SelectionStrategy::Auto | SelectionStrategy::Seed(_) => {
                self.rng.random_range(0..NUM_TESTS)
            }
            SelectionStrategy::Fixed(index) => index,
            SelectionStrategy::Round(_) => {
                let index = self.round_state;
                self.round_state = (self.round_state + 1) % NUM_TESTS;
                index
            }
        };
        TestKind::from_index(index).unwrap_or(TestKind::DropTable)
    }

    fn random_table(&mut self, avoid: Option<usize>) -> usize {
        loop {
            let index = self.rng.random_range(0..TABLE_NAMES.len());
            if Some(index) != avoid {
                return index;
            }
        }
    }

    /// A random droppable column of the table (the primary key cannot
    /// be dropped).
    fn random_column(&mut self, table_idx: usize) -> &'static str {
        let columns = TABLE_COLUMNS[table_idx];
        loop {
            let column = columns[self.rng.random_range(0..columns.len())];
            if column != "id" {
                return column;
            }
        }
    }

    /// Executes one statement; a failure goes to stderr and the
    /// benchmark continues so aggregate numbers stay interpretable.
    fn exec(&self, statement: &str) -> Option<QueryOutcome> {
        match self.connection.query(statement) {
            Ok(outcome) => {
                tracing::debug!(statement, rows = outcome.rows_affected, "statement ok");
                Some(outcome)
            }
            Err(err) => {
                eprintln!("query failed: {err} ({statement})");
                None
            }
        }
    }

    fn create_table(&self, table_idx: usize) {
        self.exec(TABLE_CREATE_STATEMENTS[table_idx]);
        let csv = self.csv_dir.join(TABLE_CSV_FILES[table_idx]);
        self.exec(&format!(
            "COPY {} FROM '{}';",
            TABLE_NAMES[table_idx],
            csv.display()
        ));
    }

    fn drop_table(&self, table_idx: usize) {
        self.exec(&format!("DROP TABLE {};", TABLE_NAMES[table_idx]));
    }

    /// A checkpoint whose latency and resulting file sizes count toward
    /// the iteration's metrics.
    fn checkpoint_counted(&self, stat: &mut TestCaseStat) {
        let started = Instant::now();
        self.exec("CHECKPOINT;");
        stat.checkpoint_time += started.elapsed();
        stat.num_checkpoints += 1;
        stat.data_file_size = self.database.data_file_size().unwrap_or(0);
        stat.metadata_file_size = self.database.metadata_file_size().unwrap_or(0);
    }

    /// Cleanup checkpoint between iterations, excluded from the stats.
    fn checkpoint_uncounted(&self) {
        self.exec("CHECKPOINT;");
    }

    /// Runs one randomly selected test case.
    pub fn run_iteration(&mut self) -> TestCaseStat {
        let test = self.choose_test();
        let mut stat = TestCaseStat {
            test_name: test.name().to_string(),
            ..TestCaseStat::default()
        };
        let started = Instant::now();
        match test {
            TestKind::DropTable => self.run_drop_table_test(&mut stat),
            TestKind::AlterTable => self.run_alter_table_test(&mut stat),
            TestKind::DeleteNodeGroup => self.run_delete_node_group_test(&mut stat),
        }
        stat.running_duration = started.elapsed();
        stat
    }

    /// Create a table, checkpoint, drop it, create another, checkpoint.
    /// The second checkpoint materializes the new table inside the
    /// dropped one's pages.
    fn run_drop_table_test(&mut self, stat: &mut TestCaseStat) {
        let table = self.random_table(None);
        let next_table = self.random_table(Some(table));
        stat.table_name = TABLE_NAMES[table].to_string();

        self.create_table(table);
        self.checkpoint_counted(stat);

        self.drop_table(table);
        self.create_table(next_table);
        self.checkpoint_counted(stat);

        self.drop_table(next_table);
        self.checkpoint_uncounted();
    }

    /// Create, checkpoint, drop one column, create another table,
    /// checkpoint. The dropped column's chunks are the recycled ranges.
    fn run_alter_table_test(&mut self, stat: &mut TestCaseStat) {
        let table = self.random_table(None);
        let next_table = self.random_table(Some(table));
        let column = self.random_column(table);
        stat.table_name = TABLE_NAMES[table].to_string();
        stat.column_name = column.to_string();

        self.create_table(table);
        self.checkpoint_counted(stat);

        self.exec(&format!(
            "ALTER TABLE {} DROP COLUMN {column};",
            TABLE_NAMES[table]
        ));
        self.create_table(next_table);
        self.checkpoint_counted(stat);

        self.drop_table(table);
        self.drop_table(next_table);
        self.checkpoint_uncounted();
    }

    /// Create, checkpoint, delete an id slice that starts in the first
    /// half and ends in the second, checkpoint, create another table,
    /// checkpoint.
    fn run_delete_node_group_test(&mut self, stat: &mut TestCaseStat) {
        let table = self.random_table(None);
        let next_table = self.random_table(Some(table));
        stat.table_name = TABLE_NAMES[table].to_string();

        self.create_table(table);
        self.checkpoint_counted(stat);

        let begin_id = self.rng.random_range(0..50) * NUM_ROWS / 100;
        let end_id = (self.rng.random_range(0..50) + 50) * NUM_ROWS / 100;
        if let Some(outcome) = self.exec(&format!(
            "MATCH (n:{}) WHERE n.id > {begin_id} AND n.id < {end_id} DELETE n RETURN n.*;",
            TABLE_NAMES[table]
        )) {
            stat.records_deleted += outcome.rows_affected;
        }
        self.checkpoint_counted(stat);

        self.create_table(next_table);
        self.checkpoint_counted(stat);

        self.drop_table(table);
        self.drop_table(next_table);
        self.checkpoint_uncounted();
    }
}
