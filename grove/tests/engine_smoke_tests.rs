#![forbid(unsafe_code)]

use std::fmt::Write as _;
use std::fs;
use std::sync::Arc;

use grove::{Connection, Database};
use tempfile::TempDir;

#[test]
fn full_statement_surface_round_trip() {
    let tmp = TempDir::new().expect("tempdir");
    let mut csv = String::from("id,name,foundYear\n");
    for row in 0..4_000 {
        writeln!(csv, "{row},org-{row:0>32},{}", 1900 + (row % 120)).expect("format");
    }
    let csv_path = tmp.path().join("orgs.csv");
    fs::write(&csv_path, csv).expect("write csv");
    let home = tmp.path().join("db");

    {
        let database = Arc::new(Database::open(&home).expect("open"));
        let connection = Connection::new(Arc::clone(&database));
        connection
            .query(
                "CREATE NODE TABLE Organization (id INT32, name STRING, foundYear INT16, \
                 PRIMARY KEY(id));",
            )
            .expect("create");
        let outcome = connection
            .query(&format!("COPY Organization FROM '{}';", csv_path.display()))
            .expect("copy");
        assert_eq!(outcome.rows_affected, 4_000);
        connection.query("CHECKPOINT;").expect("checkpoint");

        connection
            .query("ALTER TABLE Organization DROP COLUMN name;")
            .expect("alter");
        let outcome = connection
            .query("MATCH (n:Organization) WHERE n.id > 999 AND n.id < 3000 DELETE n RETURN n.*;")
            .expect("delete");
        assert_eq!(outcome.rows_affected, 2_000);
        connection.query("CHECKPOINT;").expect("checkpoint");
        assert_eq!(database.table_row_count("Organization").expect("rows"), 2_000);
    }

    let database = Database::open(&home).expect("reopen");
    assert_eq!(database.table_row_count("Organization").expect("rows"), 2_000);
}
