use anyhow::Result;
use clap::{Parser, Subcommand};
use ps_cli::commands::{self, CreateArgs, EditArgs};
use ps_cli::config::Config;
use ps_proof::{Category, FileStore};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// ProofStamp: tamper-evident evidence records kept on this device.
#[derive(Parser, Debug)]
#[command(name = "proofstamp", version)]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Path to the proof store (JSON)
    #[arg(long, global = true)]
    store: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Bundle files into a new proof
    Create(CreateArgs),
    /// Edit a proof; its id and creation time are kept, the commitment is renewed
    Edit(EditArgs),
    /// List proofs, newest first
    List {
        #[arg(long)]
        category: Option<Category>,
        /// Case-insensitive match on title and description
        #[arg(long)]
        search: Option<String>,
    },
    /// Show one proof with all its hashes
    Show { id: String },
    /// Check a file against the digest stored for one file of a proof
    Verify {
        id: String,
        /// Index of the file within the proof (see `show`)
        index: usize,
        /// The file to check
        file: PathBuf,
    },
    /// Re-derive every stored digest and the combined hash of a proof
    Audit { id: String },
    /// Delete one proof
    Delete { id: String },
    /// Delete every proof
    Clear {
        #[arg(long)]
        yes: bool,
    },
    /// Write all proofs to a JSON backup
    Export { output: PathBuf },
    /// Restore proofs from a JSON backup (all or nothing)
    Import { input: PathBuf },
    /// Show dashboard counts
    Stats,
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    let store_path = config.store_path(cli.store);
    debug!(store = %store_path.display(), "opening proof store");
    let mut store = FileStore::open(store_path);

    let ok = match cli.command {
        Commands::Create(args) => commands::cmd_create(&mut store, &config, args).map(|_| true),
        Commands::Edit(args) => commands::cmd_edit(&mut store, args).map(|_| true),
        Commands::List { category, search } => {
            commands::cmd_list(&store, category, search).map(|_| true)
        }
        Commands::Show { id } => commands::cmd_show(&store, &id).map(|_| true),
        Commands::Verify { id, index, file } => commands::cmd_verify(&store, &id, index, &file),
        Commands::Audit { id } => commands::cmd_audit(&store, &id),
        Commands::Delete { id } => commands::cmd_delete(&mut store, &id).map(|_| true),
        Commands::Clear { yes } => commands::cmd_clear(&mut store, yes).map(|_| true),
        Commands::Export { output } => commands::cmd_export(&store, &output).map(|_| true),
        Commands::Import { input } => commands::cmd_import(&mut store, &input).map(|_| true),
        Commands::Stats => commands::cmd_stats(&store).map(|_| true),
    }?;

    Ok(if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
