use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{debug, error};

use gristmill::engine::{self, artifact, JobResult, JobSpec};
use gristmill::tasks::{
    LetterCountAggregate, LetterCountTransform, WordFindAggregate, WordFindTransform,
};

/// Split a file, transform the pieces in parallel, merge the results
#[derive(Parser)]
#[command(name = "gristmill")]
#[command(about = "Single-host split/transform/aggregate pipeline engine", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Count letter frequencies across the input file
    LetterCount {
        /// Input data file
        input: PathBuf,

        /// Number of splits / parallel transform workers
        #[arg(short = 'n', long, default_value_t = 4)]
        splits: usize,

        /// Print the job record as JSON
        #[arg(long)]
        json: bool,
    },
    /// Find lines containing a word as a whole token
    WordFind {
        /// Input data file
        input: PathBuf,

        /// Word to search for
        word: String,

        /// Number of splits / parallel transform workers
        #[arg(short = 'n', long, default_value_t = 4)]
        splits: usize,

        /// Print the job record as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(cli.verbose >= 2)
        .init();

    debug!("gristmill started with verbosity level: {}", cli.verbose);

    let result = match cli.command {
        Commands::LetterCount {
            input,
            splits,
            json,
        } => {
            let spec = JobSpec::new(
                input,
                splits,
                Arc::new(LetterCountTransform),
                Arc::new(LetterCountAggregate),
                (),
            );
            run_job(spec, json).await
        }
        Commands::WordFind {
            input,
            word,
            splits,
            json,
        } => {
            let spec = JobSpec::new(
                input,
                splits,
                Arc::new(WordFindTransform),
                Arc::new(WordFindAggregate),
                word,
            );
            run_job(spec, json).await
        }
    };

    if let Err(e) = result {
        error!("Fatal error: {}", e);
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run_job<C: Send + Sync + 'static>(spec: JobSpec<C>, json: bool) -> anyhow::Result<()> {
    let mut result = JobResult::new();
    engine::run(&spec, &mut result).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!(
            "Processed {} splits in {} us",
            result.transform_workers.len(),
            result.processing_time_us
        );
        println!(
            "Result written to {}",
            artifact::result_path(&spec.working_dir).display()
        );
    }
    Ok(())
}
