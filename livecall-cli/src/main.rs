//! # livecall CLI
//!
//! Command-line interface for livecall notebooks: evaluate and display
//! kernel values, render notebook files, and serve them over HTTP.

mod commands;
mod notebook;

use anyhow::Context;
use clap::{Parser, Subcommand};
use livecall_runtime::Config;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "livecall")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, global = true, default_value = "livecall.yml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate source and print the result as plain text
    Eval {
        /// Kernel source
        source: String,
    },

    /// Render one value into an HTML page
    Display {
        /// Kernel source
        source: String,

        /// Force a MIME type (e.g. text/html)
        #[arg(long)]
        mime: Option<String>,

        /// Output file (defaults to stdout)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Render a notebook into an HTML page
    Render {
        /// Notebook markdown file
        notebook: PathBuf,

        /// Output file (defaults to stdout)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Serve a notebook over HTTP
    Serve {
        /// Notebook markdown file
        notebook: PathBuf,

        /// Server port (defaults to server.port from the config)
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so page output on stdout stays clean
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::INFO.into()
            }),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = Config::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load configuration from {:?}", cli.config))?;

    match cli.command {
        Commands::Eval { source } => commands::eval_source(&config, &source),
        Commands::Display {
            source,
            mime,
            output,
        } => commands::display_value(&config, &source, mime.as_deref(), output.as_deref()),
        Commands::Render { notebook, output } => {
            commands::render_notebook(&config, &notebook, output.as_deref())
        }
        Commands::Serve { notebook, port } => {
            commands::serve_notebook(&config, &notebook, port).await
        }
    }
}
