//! CLI tool for inspecting Weft execution traces.
//!
//! Reads JSON Lines event journals captured from a graph run and turns
//! them into aggregated traces, verbatim logs, or latency summaries.

mod commands;

use anyhow::Result;
use clap::Parser;

use commands::BuildMode;

#[derive(Parser)]
#[command(name = "weft-trace")]
#[command(about = "Weft execution trace inspector", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser)]
enum Commands {
    /// Build an aggregated trace (one record per invocation)
    Trace {
        /// Path to a JSON Lines event journal
        input: String,

        /// Window start, microseconds since the epoch (default: first event)
        #[arg(long)]
        begin: Option<i64>,

        /// Window end, exclusive (default: one past the last event)
        #[arg(long)]
        end: Option<i64>,

        /// Split the range into windows of this many microseconds and
        /// emit one trace per window
        #[arg(long)]
        window: Option<i64>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,

        /// Output file (default: stdout)
        #[arg(long, short)]
        output: Option<String>,
    },

    /// Build a verbatim log (one record per raw event)
    Log {
        /// Path to a JSON Lines event journal
        input: String,

        /// Window start, microseconds since the epoch (default: first event)
        #[arg(long)]
        begin: Option<i64>,

        /// Window end, exclusive (default: one past the last event)
        #[arg(long)]
        end: Option<i64>,

        /// Split the range into windows of this many microseconds and
        /// emit one log per window
        #[arg(long)]
        window: Option<i64>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,

        /// Output file (default: stdout)
        #[arg(long, short)]
        output: Option<String>,
    },

    /// Summarize per-node runtimes and per-stream hop latencies
    Summary {
        /// Path to a JSON Lines event journal
        input: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Trace {
            input,
            begin,
            end,
            window,
            pretty,
            output,
        } => commands::build(
            &input,
            begin,
            end,
            window,
            pretty,
            output.as_deref(),
            BuildMode::Aggregated,
        ),
        Commands::Log {
            input,
            begin,
            end,
            window,
            pretty,
            output,
        } => commands::build(
            &input,
            begin,
            end,
            window,
            pretty,
            output.as_deref(),
            BuildMode::Verbatim,
        ),
        Commands::Summary { input } => commands::summary(&input),
    }
}
