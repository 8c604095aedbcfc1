//! pmsolve - solve recorded path constraints into a candidate payload.
//!
//! Reads the taint analyzer's JSON document from stdin and writes the
//! assignment JSON to stdout. Everything else (the `no solution` line for
//! unsatisfiable traces, debug diagnostics, infeasible-modelling errors)
//! goes to stderr, so stdout stays machine-readable.
//!
//! ## Usage
//!
//! ```bash
//! echo '{"constraints": [...], "types": {...}}' | pmsolve
//! pmsolve --verbose < trace.json
//! pmsolve --split-segments 6 < trace.json
//! ```

use std::io::Read;
use std::process;

use clap::Parser;

use pmsolve::solver::{solve, SolveOutcome, SolverConfig};
use pmsolve::SolveRequest;

/// Constraint solver for postMessage exploit generation
#[derive(Parser)]
#[command(name = "pmsolve")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug diagnostics on stderr
    #[arg(short, long)]
    verbose: bool,

    /// Number of segments split() calls are unrolled into
    #[arg(long, default_value_t = 4)]
    split_segments: usize,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_level),
    )
    .format_timestamp(None)
    .init();

    let mut input = String::new();
    if let Err(err) = std::io::stdin().read_to_string(&mut input) {
        eprintln!("failed to read stdin: {err}");
        process::exit(1);
    }
    let request: SolveRequest = match serde_json::from_str(&input) {
        Ok(request) => request,
        Err(err) => {
            eprintln!("invalid input: {err}");
            process::exit(1);
        }
    };

    let config = SolverConfig {
        split_segments: cli.split_segments.max(1),
    };
    match solve(&request.constraints, &request.types, config) {
        Ok(SolveOutcome::Solution(solution)) => match serde_json::to_string(&solution) {
            Ok(json) => println!("{json}"),
            Err(err) => {
                eprintln!("failed to serialize solution: {err}");
                process::exit(1);
            }
        },
        Ok(SolveOutcome::NoSolution) => eprintln!("no solution"),
        Err(err) => {
            eprintln!("{err}");
            process::exit(1);
        }
    }
}
