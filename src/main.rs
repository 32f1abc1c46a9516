use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use episodic::SearchMode;

mod commands;

#[derive(Parser)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about = "Semantic search over recorded conversation exchanges", long_about = None)]
struct Cli {
    /// Config file (default: <config dir>/episodic-memory/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Archive directory, overrides [storage].path
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search archived exchanges
    Search {
        /// Query text
        query: String,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,

        /// Search mode (vector, keyword, hybrid)
        #[arg(short, long, default_value = "vector")]
        mode: SearchMode,

        /// Only exchanges at or after this date (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        after: Option<String>,

        /// Only exchanges at or before this date (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        before: Option<String>,

        /// Output results as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Find exchanges relevant to several concepts at once
    Concepts {
        /// Concepts to search for (two or more work best)
        #[arg(required = true)]
        concepts: Vec<String>,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,

        /// Only exchanges at or after this date
        #[arg(long)]
        after: Option<String>,

        /// Only exchanges at or before this date
        #[arg(long)]
        before: Option<String>,

        /// Output results as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Import exchanges from a JSONL file or a directory of JSONL files
    Import {
        /// File or directory
        path: PathBuf,
    },

    /// Manage the vector index
    Index {
        #[command(subcommand)]
        command: IndexCommands,
    },
}

#[derive(Subcommand)]
enum IndexCommands {
    /// Rebuild the vector index from stored embeddings
    Rebuild,

    /// Show archive and index status
    Status {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let ctx = commands::Context::load(cli.config.as_deref(), cli.db)?;

    match cli.command {
        Commands::Search {
            query,
            limit,
            mode,
            after,
            before,
            json,
        } => commands::search::execute(&ctx, &query, limit, mode, after, before, json),
        Commands::Concepts {
            concepts,
            limit,
            after,
            before,
            json,
        } => commands::concepts::execute(&ctx, &concepts, limit, after, before, json),
        Commands::Import { path } => commands::import::execute(&ctx, &path),
        Commands::Index { command } => match command {
            IndexCommands::Rebuild => commands::index::rebuild(&ctx),
            IndexCommands::Status { json } => commands::index::status(&ctx, json),
        },
    }
}
