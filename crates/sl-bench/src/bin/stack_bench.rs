//! stack-bench: timed push/pop throughput for the stack variants.
//!
//! # Usage
//!
//! ```bash
//! stack-bench --stack lock-free --pushers 4 --poppers 4 --duration-ms 5000
//! stack-bench --stack all --json
//! ```
//!
//! Exits non-zero when a run fails or a post-run check does not hold.

use std::process;
use std::time::Duration;

use clap::{ArgAction, Parser, ValueEnum};
use tracing::Level;

use sl_bench::{format_table, run_all, BenchConfig, BenchReport, StackKind};

/// Longest window the CLI accepts (one hour).
const DURATION_MS_MAX: u64 = 3_600_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StackChoice {
    Coarse,
    Fine,
    LockFree,
    /// Every strategy, one after another.
    All,
}

/// Benchmark concurrent stacks with dedicated pusher and popper threads.
#[derive(Parser, Debug)]
#[command(name = "stack-bench")]
#[command(about = "Throughput benchmark for coarse, fine and lock-free stacks")]
struct Cli {
    /// Stack strategy to benchmark.
    #[arg(long, value_enum, default_value = "all")]
    stack: StackChoice,

    /// Number of pusher threads.
    #[arg(long, default_value_t = 2)]
    pushers: usize,

    /// Number of popper threads.
    #[arg(long, default_value_t = 2)]
    poppers: usize,

    /// Length of the timed window in milliseconds.
    #[arg(long, default_value_t = 10_000)]
    duration_ms: u64,

    /// Values pushed before the window opens.
    #[arg(long, default_value_t = 100_000)]
    prefill: u64,

    /// Seed for pushed values (random if not set).
    #[arg(long)]
    seed: Option<u64>,

    /// Print reports as JSON instead of text.
    #[arg(long)]
    json: bool,

    /// More logging (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn config(&self) -> BenchConfig {
        BenchConfig {
            pushers: self.pushers,
            poppers: self.poppers,
            duration: Duration::from_millis(self.duration_ms.min(DURATION_MS_MAX)),
            prefill: self.prefill,
            seed: self.seed,
        }
    }

    fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}

fn print_reports(reports: &[BenchReport], json: bool) -> Result<(), serde_json::Error> {
    if json {
        let out = match reports {
            [single] => serde_json::to_string_pretty(single)?,
            _ => serde_json::to_string_pretty(reports)?,
        };
        println!("{out}");
        return Ok(());
    }

    for report in reports {
        println!("{report}\n");
    }
    if reports.len() > 1 {
        print!("{}", format_table(reports));
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level())
        .with_writer(std::io::stderr)
        .with_thread_names(true)
        .init();

    let config = cli.config();
    let outcome = match cli.stack {
        StackChoice::Coarse => StackKind::Coarse.run(&config).map(|r| vec![r]),
        StackChoice::Fine => StackKind::Fine.run(&config).map(|r| vec![r]),
        StackChoice::LockFree => StackKind::LockFree.run(&config).map(|r| vec![r]),
        StackChoice::All => run_all(&config),
    };

    let reports = match outcome {
        Ok(reports) => reports,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = print_reports(&reports, cli.json) {
        eprintln!("Error: failed to encode report: {e}");
        process::exit(1);
    }

    if !reports.iter().all(BenchReport::passed) {
        eprintln!("Error: post-run checks failed");
        process::exit(2);
    }
}
