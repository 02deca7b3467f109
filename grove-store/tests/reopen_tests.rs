#![forbid(unsafe_code)]

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use grove_result::Error;
use grove_storage::PageRangeAllocator;
use grove_store::{Connection, Database, METADATA_FILE_NAME};
use tempfile::TempDir;

fn write_people_csv(dir: &Path, num_rows: usize) -> PathBuf {
    let mut content = String::from("id,name\n");
    for row in 0..num_rows {
        writeln!(content, "{row},person-{row:0>40}").expect("format");
    }
    let path = dir.join("people.csv");
    fs::write(&path, content).expect("write csv");
    path
}

#[test]
fn tables_survive_a_restart() {
    let tmp = TempDir::new().expect("tempdir");
    let csv = write_people_csv(tmp.path(), 3_000);
    let home = tmp.path().join("db");

    {
        let database = Arc::new(Database::open(&home).expect("open"));
        let connection = Connection::new(Arc::clone(&database));
        connection
            .query("CREATE NODE TABLE People (id INT32, name STRING, PRIMARY KEY(id));")
            .expect("create");
        connection
            .query(&format!("COPY People FROM '{}';", csv.display()))
            .expect("copy");
        connection.query("CHECKPOINT;").expect("checkpoint");
    }

    let database = Database::open(&home).expect("reopen");
    assert_eq!(database.table_names().expect("names"), vec!["People"]);
    assert_eq!(database.table_row_count("People").expect("rows"), 3_000);
}

#[test]
fn free_space_survives_a_restart_and_is_reused() {
    let tmp = TempDir::new().expect("tempdir");
    let csv = write_people_csv(tmp.path(), 3_000);
    let home = tmp.path().join("db");

    let (free_before, size_with_one_table) = {
        let database = Arc::new(Database::open(&home).expect("open"));
        let connection = Connection::new(Arc::clone(&database));
        connection
            .query("CREATE NODE TABLE People (id INT32, name STRING, PRIMARY KEY(id));")
            .expect("create");
        connection
            .query(&format!("COPY People FROM '{}';", csv.display()))
            .expect("copy");
        connection.query("CHECKPOINT;").expect("checkpoint");
        let size_with_one_table = database.data_file_size().expect("size");
        connection.query("DROP TABLE People;").expect("drop");
        connection.query("CHECKPOINT;").expect("checkpoint");
        (
            database.free_page_count().expect("free"),
            size_with_one_table,
        )
    };

    let database = Arc::new(Database::open(&home).expect("reopen"));
    assert_eq!(database.free_page_count().expect("free"), free_before);
    assert!(database.table_names().expect("names").is_empty());

    if PageRangeAllocator::reuse_enabled() {
        assert!(free_before > 0);
        // A new identical table fits into the persisted free space.
        let connection = Connection::new(Arc::clone(&database));
        connection
            .query("CREATE NODE TABLE Fresh (id INT32, name STRING, PRIMARY KEY(id));")
            .expect("create");
        connection
            .query(&format!("COPY Fresh FROM '{}';", csv.display()))
            .expect("copy");
        connection.query("CHECKPOINT;").expect("checkpoint");
        assert_eq!(
            database.data_file_size().expect("size"),
            size_with_one_table
        );
    }
}

#[test]
fn uncheckpointed_work_is_discarded_on_restart() {
    let tmp = TempDir::new().expect("tempdir");
    let home = tmp.path().join("db");

    {
        let database = Arc::new(Database::open(&home).expect("open"));
        let connection = Connection::new(Arc::clone(&database));
        connection
            .query("CREATE NODE TABLE Ephemeral (id INT32, PRIMARY KEY(id));")
            .expect("create");
        // No checkpoint: the catalog change never becomes durable.
    }

    let database = Database::open(&home).expect("reopen");
    assert!(database.table_names().expect("names").is_empty());
}

#[test]
fn corrupt_metadata_refuses_to_open() {
    let tmp = TempDir::new().expect("tempdir");
    let csv = write_people_csv(tmp.path(), 100);
    let home = tmp.path().join("db");

    {
        let database = Arc::new(Database::open(&home).expect("open"));
        let connection = Connection::new(Arc::clone(&database));
        connection
            .query("CREATE NODE TABLE People (id INT32, name STRING, PRIMARY KEY(id));")
            .expect("create");
        connection
            .query(&format!("COPY People FROM '{}';", csv.display()))
            .expect("copy");
        connection.query("CHECKPOINT;").expect("checkpoint");
    }

    fs::write(home.join(METADATA_FILE_NAME), b"not a snapshot").expect("corrupt");
    match Database::open(&home) {
        Err(Error::CorruptedMetadata(_)) => {}
        Err(other) => panic!("expected CorruptedMetadata, got {other:?}"),
        Ok(_) => panic!("expected CorruptedMetadata, got a successful open"),
    }
}

#[test]
fn missing_metadata_with_footer_refuses_to_open() {
    let tmp = TempDir::new().expect("tempdir");
    let csv = write_people_csv(tmp.path(), 100);
    let home = tmp.path().join("db");

    {
        let database = Arc::new(Database::open(&home).expect("open"));
        let connection = Connection::new(Arc::clone(&database));
        connection
            .query("CREATE NODE TABLE People (id INT32, name STRING, PRIMARY KEY(id));")
            .expect("create");
        connection
            .query(&format!("COPY People FROM '{}';", csv.display()))
            .expect("copy");
        connection.query("CHECKPOINT;").expect("checkpoint");
    }

    fs::remove_file(home.join(METADATA_FILE_NAME)).expect("remove");
    match Database::open(&home) {
        Err(Error::CorruptedMetadata(_)) => {}
        Err(other) => panic!("expected CorruptedMetadata, got {other:?}"),
        Ok(_) => panic!("expected CorruptedMetadata, got a successful open"),
    }
}
