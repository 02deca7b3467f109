use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::{CommandFactory, Parser};
use grove_bench::{SelectionStrategy, StatRollup, WorkloadDriver, write_report};
use grove_result::Result;
use grove_store::Database;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let strategy = match SelectionStrategy::from_flags(&cli.strategy, cli.value) {
        Ok(strategy) => strategy,
        Err(err) => {
            eprintln!("{err}\n");
            let _ = Cli::command().print_help();
            process::exit(2);
        }
    };

    if let Err(err) = run(&cli, strategy) {
        eprintln!("benchmark failed: {err}");
        process::exit(1);
    }
}

#[derive(Parser)]
#[command(
    name = "grove-bench",
    about = "Checkpoint latency and file-size benchmark for grove's storage reclamation"
)]
struct Cli {
    /// Number of iterations to run.
    #[arg(short = 'N', value_name = "ITERATIONS")]
    iterations: u64,

    /// Directory holding people-100000.csv, customers-100000.csv, and
    /// organizations-100000.csv.
    #[arg(short = 'D', value_name = "CSV_DIR")]
    csv_dir: PathBuf,

    /// Database home directory (data file and metadata file live here).
    #[arg(short = 'B', value_name = "DB_HOME")]
    db_home: PathBuf,

    /// Test selection strategy: auto, seed, fixed, or round.
    #[arg(short = 'S', value_name = "STRATEGY")]
    strategy: String,

    /// Strategy value: the seed for 'seed', the test index in 0..=2 for
    /// 'fixed' and 'round'. Not needed for 'auto'.
    #[arg(short = 'V', value_name = "VALUE")]
    value: Option<i64>,
}

fn run(cli: &Cli, strategy: SelectionStrategy) -> Result<()> {
    println!("User parameters:");
    println!("    CSV source directory: {}", cli.csv_dir.display());
    println!("    Database home:        {}", cli.db_home.display());
    println!("    Max test iterations:  {}", cli.iterations);
    println!("    Selection strategy:   {strategy:?}");

    let database = Arc::new(Database::open(&cli.db_home)?);
    let mut driver = WorkloadDriver::new(database, cli.csv_dir.clone(), strategy);

    let mut stats = Vec::with_capacity(cli.iterations as usize);
    let mut rollup = StatRollup::default();
    for iteration in 0..cli.iterations {
        println!("---------------------------");
        println!("Begin iteration {iteration}");
        println!("---------------------------");
        let stat = driver.run_iteration();
        println!(
            "{}: {} checkpoints in {} us",
            stat.test_name,
            stat.num_checkpoints,
            stat.checkpoint_time.as_micros()
        );
        rollup.add(&stat);
        stats.push(stat);
    }

    println!("---------------------------");
    print!("{}", rollup.summary());

    let report_path = strategy.report_file_name();
    write_report(&report_path, &stats)?;
    println!("Report written to {report_path}");
    Ok(())
}
