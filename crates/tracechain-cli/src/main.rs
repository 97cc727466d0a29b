//! tracechain CLI - run the evidence service and inspect evidence journals.

use clap::{Parser, Subcommand};
use tracechain_canonical::CanonicalProfile;
use tracechain_server::ServeConfig;

mod commands;
mod output;
mod records;

use commands::{hash, list, serve, validate, verify};

#[derive(Parser)]
#[command(name = "tracechain")]
#[command(about = "Supply-chain batch evidence service and journal tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP ingestion service
    Serve(ServeConfig),
    /// Show the canonical string and content hash of a JSON object
    Hash {
        /// Input JSON file (or stdin if not provided)
        input: Option<String>,
        /// Canonicalization profile (legacy or sorted)
        #[arg(long, default_value = "legacy")]
        profile: CanonicalProfile,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check an upload request body without submitting it
    Validate {
        /// Request body file (or stdin if not provided)
        input: Option<String>,
    },
    /// List evidence records in a journal
    List {
        /// Path to journal file
        journal: String,
        /// Only show records for this shipment
        #[arg(long)]
        shipment: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Recompute every record's hash from its normalized data
    Verify {
        /// Path to journal file
        journal: String,
        /// Exit with error code if any record fails verification
        #[arg(long)]
        strict: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve(config) => serve::run(config),
        Commands::Hash {
            input,
            profile,
            json,
        } => hash::run(input, profile, json),
        Commands::Validate { input } => validate::run(input),
        Commands::List {
            journal,
            shipment,
            json,
        } => list::run(journal, shipment, json),
        Commands::Verify {
            journal,
            strict,
            json,
        } => verify::run(journal, strict, json),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
