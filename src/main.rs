//! Memory Management Simulator - Main Entry Point
//!
//! Usage: memsim [OPTIONS]
//!
//! Options:
//!   -s, --strategy <STRATEGY>  Initial placement strategy (first, best, worst)
//!   -p, --policy <POLICY>      Initial replacement policy (fifo, lru)
//!       --heap <SIZE>          Initialize the heap at start-up
//!       --script <FILE>        Read commands from a file instead of stdin
//!   -q, --quiet                No banner or prompt
//!   -v, --verbose              Log more detail to stderr (repeatable)
//!   -h, --help                 Print help information

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process;

use clap::Parser;
use log::error;

use memsim::console::{Console, ConsoleOptions};
use memsim::eviction::ReplacementPolicy;
use memsim::heap::AllocationStrategy;
use memsim::io::read_script;
use memsim::{logging, SimConfig, Simulator};

/// Interactive model of a heap allocator, paged virtual memory and a
/// two-level cache hierarchy
#[derive(Parser, Debug)]
#[command(name = "memsim", version, about, long_about = None)]
struct Cli {
    /// Initial placement strategy: first, best or worst
    #[arg(short, long, default_value = "first")]
    strategy: AllocationStrategy,

    /// Initial page replacement policy: fifo or lru
    #[arg(short, long, default_value = "fifo")]
    policy: ReplacementPolicy,

    /// Initialize the heap with this many bytes at start-up
    #[arg(long, value_name = "SIZE", allow_negative_numbers = true)]
    heap: Option<i64>,

    /// Run commands from FILE instead of standard input
    #[arg(long, value_name = "FILE")]
    script: Option<PathBuf>,

    /// Suppress the banner and prompt
    #[arg(short, long)]
    quiet: bool,

    /// Log more detail to stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    if let Err(e) = run(&cli) {
        error!("{}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Main logic separated from main() for cleaner error handling
fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = SimConfig {
        strategy: cli.strategy,
        policy: cli.policy,
        heap_size: cli.heap,
    };
    let sim = Simulator::new(&config)?;

    let options = ConsoleOptions {
        echo: cli.script.is_some(),
        quiet: cli.quiet,
    };
    let mut console = Console::new(sim, options);
    let mut stdout = io::stdout().lock();

    match &cli.script {
        Some(path) => {
            let lines = read_script(path)?;
            console.run(lines.into_iter().map(Ok), &mut stdout)?;
        }
        None => {
            let stdin = io::stdin();
            console.run(stdin.lock().lines(), &mut stdout)?;
        }
    }

    Ok(())
}
