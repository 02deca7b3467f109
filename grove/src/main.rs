use std::io::{self, Write};
use std::sync::Arc;

use grove::{Connection, Database};

fn print_banner() {
    // Use Cargo package metadata baked into the binary at compile time
    const NAME: &str = env!("CARGO_PKG_NAME");
    const VER: &str = env!("CARGO_PKG_VERSION");
    println!("{} version {}", NAME, VER);
    println!("Enter \".help\" for usage hints.");
    println!("Not connected to a database.");
    println!("Use \".open DIR\" to open or create a database home.");
}

fn print_help() {
    println!(".help           Show this message");
    println!(".open DIR       Open or create a database home directory");
    println!(".tables         List tables with their live row counts");
    println!(".exit/.quit     Exit the REPL");
    println!("Any other line is executed as a statement");
}

fn print_tables(connection: &Connection) {
    let database = connection.database();
    match database.table_names() {
        Ok(names) if names.is_empty() => println!("(no tables)"),
        Ok(names) => {
            for name in names {
                let rows = database.table_row_count(&name).unwrap_or(0);
                println!("{name} ({rows} rows)");
            }
        }
        Err(err) => println!("Error: {err}"),
    }
}

fn repl() -> io::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut line = String::new();
    let mut connection: Option<Connection> = None;

    loop {
        line.clear();
        print!("grove> ");
        stdout.flush()?;
        if stdin.read_line(&mut line)? == 0 {
            // EOF
            println!();
            break;
        }
        let input = line.trim_end().trim();
        if input.is_empty() {
            continue;
        }
        if input.starts_with('.') {
            let mut parts = input.split_whitespace();
            let cmd = parts.next().unwrap_or("");
            match cmd {
                ".help" => print_help(),
                ".open" => {
                    if let Some(dir) = parts.next() {
                        match Database::open(dir) {
                            Ok(database) => {
                                println!("Opened database home: {dir}");
                                connection = Some(Connection::new(Arc::new(database)));
                            }
                            Err(err) => println!("Error: {err}"),
                        }
                    } else {
                        println!(".open requires a directory");
                    }
                }
                ".tables" => match &connection {
                    Some(connection) => print_tables(connection),
                    None => println!("Not connected. Use .open DIR first."),
                },
                ".exit" | ".quit" => break,
                _ => println!("Unknown command: {}", cmd),
            }
        } else {
            match &connection {
                Some(connection) => match connection.query(input) {
                    Ok(outcome) => println!("OK ({} rows affected)", outcome.rows_affected),
                    Err(err) => println!("Error: {err}"),
                },
                None => println!("Not connected. Use .open DIR first."),
            }
        }
    }

    Ok(())
}

fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    print_banner();
    repl()
}
