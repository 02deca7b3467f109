#![forbid(unsafe_code)]

use std::path::PathBuf;

use grove_result::Error;
use grove_store::schema::{ColumnSchema, LogicalType};
use grove_store::Statement;

#[test]
fn parses_create_node_table() {
    let statement = Statement::parse(
        "CREATE NODE TABLE People (id INT32, firstName STRING, foundYear INT16, PRIMARY KEY(id));",
    )
    .expect("parse");
    assert_eq!(
        statement,
        Statement::CreateNodeTable {
            table: "People".to_string(),
            columns: vec![
                ColumnSchema::new("id", LogicalType::Int32),
                ColumnSchema::new("firstName", LogicalType::Text),
                ColumnSchema::new("foundYear", LogicalType::Int16),
            ],
            primary_key: "id".to_string(),
        }
    );
}

#[test]
fn parses_copy() {
    let statement =
        Statement::parse("COPY People FROM '/data/people-100000.csv';").expect("parse");
    assert_eq!(
        statement,
        Statement::Copy {
            table: "People".to_string(),
            source: PathBuf::from("/data/people-100000.csv"),
        }
    );
}

#[test]
fn parses_checkpoint_and_drop() {
    assert_eq!(Statement::parse("CHECKPOINT;").expect("parse"), Statement::Checkpoint);
    assert_eq!(
        Statement::parse("checkpoint").expect("parse"),
        Statement::Checkpoint
    );
    assert_eq!(
        Statement::parse("DROP TABLE Customer;").expect("parse"),
        Statement::DropTable {
            table: "Customer".to_string()
        }
    );
}

#[test]
fn parses_alter_drop_column() {
    assert_eq!(
        Statement::parse("ALTER TABLE Organization DROP COLUMN website;").expect("parse"),
        Statement::AlterDropColumn {
            table: "Organization".to_string(),
            column: "website".to_string(),
        }
    );
}

#[test]
fn parses_match_delete() {
    let statement = Statement::parse(
        "MATCH (n:People) WHERE n.id > 2500 AND n.id < 75000 DELETE n RETURN n.*;",
    )
    .expect("parse");
    assert_eq!(
        statement,
        Statement::MatchDelete {
            table: "People".to_string(),
            lower: 2500,
            upper: 75000,
        }
    );
}

#[test]
fn match_delete_rejects_mismatched_variables() {
    let result =
        Statement::parse("MATCH (n:People) WHERE m.id > 1 AND n.id < 9 DELETE n RETURN n.*");
    assert!(matches!(result, Err(Error::InvalidArgumentError(_))));
}

#[test]
fn create_without_primary_key_is_rejected() {
    let result = Statement::parse("CREATE NODE TABLE T (id INT32, name STRING)");
    assert!(matches!(result, Err(Error::InvalidArgumentError(_))));
}

#[test]
fn create_with_unknown_type_is_rejected() {
    let result = Statement::parse("CREATE NODE TABLE T (id UUID, PRIMARY KEY(id))");
    assert!(matches!(result, Err(Error::InvalidArgumentError(_))));
}

#[test]
fn unknown_statements_are_rejected() {
    for text in [
        "SELECT * FROM People",
        "ALTER TABLE People ADD COLUMN x INT32",
        "",
        "DROP People",
    ] {
        let result = Statement::parse(text);
        assert!(
            matches!(result, Err(Error::InvalidArgumentError(_))),
            "statement {text:?} should be rejected"
        );
    }
}
