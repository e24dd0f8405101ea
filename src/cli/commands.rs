//! CLI command definitions and argument parsing

use std::path::PathBuf;

use clap::Args;
use clap::Parser;
use clap::Subcommand;

#[derive(Parser)]
#[command(name = "teachrag")]
#[command(about = "Per-user PDF question answering over Pinecone and Google Gemini")]
#[command(version)]
pub struct Cli {
    /// Enable verbose debug logging (default: info level)
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file (default: config.toml, then config.example.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
        /// Enable CORS
        #[arg(long)]
        cors: bool,
        /// Run the pipeline behind the endpoints instead of fixed responses
        #[arg(long)]
        live: bool,
    },
    /// Chunk, embed and index PDFs for a user
    Ingest {
        /// User identifier; the index is teacher-user-<id>
        #[arg(short, long)]
        user: String,
        #[command(flatten)]
        source: IngestSource,
    },
    /// Ask a question against a user's indexed documents
    Ask {
        /// User identifier
        #[arg(short, long)]
        user: String,
        /// The question
        question: String,
        /// Print the retrieved context chunks
        #[arg(long)]
        show_context: bool,
    },
    /// Print the index name used for a user
    IndexName {
        /// User identifier
        user: String,
    },
    /// Show current configuration
    Config,
}

/// Where to load PDFs from
#[derive(Args)]
#[group(required = true, multiple = false)]
pub struct IngestSource {
    /// Directory containing *.pdf files (non-recursive)
    #[arg(long)]
    pub dir: Option<PathBuf>,
    /// URL of a single PDF
    #[arg(long)]
    pub url: Option<String>,
}
