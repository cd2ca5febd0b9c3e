//! ghtree - materialize a remote repository tree as local files
//!
//! Usage:
//!   ghtree repos <owner>                          # List an owner's repositories
//!   ghtree tree <owner> <repo>                    # Print the tree listing
//!   ghtree download <owner> <repo> --root <dir>   # Write blobs under <dir>

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ghtree_core::client::GitHubClient;
use ghtree_core::config::{Settings, SettingsSources};
use ghtree_core::repository::{DEFAULT_REF, DownloadOptions};

#[derive(Parser)]
#[command(name = "ghtree")]
#[command(about = "Fetch a repository tree and write its files locally", long_about = None)]
struct Cli {
    /// Path to ghtree.toml (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List repositories owned by a user
    Repos {
        /// Owner account name
        owner: String,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Print a repository's tree listing
    Tree(TreeArgs),

    /// Download a repository's files
    Download(Box<DownloadArgs>),
}

#[derive(Args)]
struct TreeArgs {
    /// Owner account name
    owner: String,
    /// Repository name
    repo: String,

    /// Branch, tag or commit SHA
    #[arg(long = "ref", default_value = DEFAULT_REF)]
    reference: String,

    /// Only list the top level
    #[arg(long)]
    no_recursive: bool,

    /// Output format
    #[arg(short, long, default_value = "table")]
    format: OutputFormat,
}

#[derive(Args)]
struct DownloadArgs {
    /// Owner account name
    owner: String,
    /// Repository name
    repo: String,

    /// Directory to write files into
    #[arg(long)]
    root: PathBuf,

    /// Branch, tag or commit SHA
    #[arg(long = "ref", default_value = DEFAULT_REF)]
    reference: String,

    /// Create the root and any missing parent directories
    #[arg(long)]
    makedirs: bool,

    /// Replace existing files
    #[arg(long)]
    overwrite: bool,

    /// Download with a worker pool
    #[arg(long)]
    threads: bool,

    /// Maximum number of workers (implies --threads)
    #[arg(long)]
    max_threads: Option<usize>,
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ghtree=debug,ghtree_core=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut sources = SettingsSources::default();
    if let Some(path) = cli.config {
        sources = sources.with_config_path(path);
    }
    let settings = Settings::load_from(&sources, |key| std::env::var(key).ok())
        .context("Failed to load settings")?;
    let client = GitHubClient::from_settings(&settings).context("Failed to build API client")?;

    match cli.command {
        Commands::Repos { owner, format } => run_repos(&client, &owner, format),
        Commands::Tree(args) => run_tree(&client, args),
        Commands::Download(args) => run_download(&client, *args),
    }
}

fn run_repos(client: &GitHubClient, owner: &str, format: OutputFormat) -> Result<()> {
    let repos = client
        .list_repositories(owner)
        .with_context(|| format!("Failed to list repositories for {owner}"))?;

    match format {
        OutputFormat::Json => {
            let items: Vec<_> = repos
                .iter()
                .map(|r| serde_json::json!({ "owner": r.owner(), "name": r.name(), "url": r.url() }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&items)?);
        }
        OutputFormat::Table => {
            if repos.is_empty() {
                println!("No repositories found for {owner}");
            }
            for repo in &repos {
                println!("{}", repo.name());
            }
        }
    }
    Ok(())
}

fn run_tree(client: &GitHubClient, args: TreeArgs) -> Result<()> {
    let repo = client.repository(&args.owner, &args.repo)?;
    let tree = repo
        .get_tree(&args.reference, !args.no_recursive)
        .with_context(|| {
            format!(
                "Failed to fetch tree for {}/{} at {}",
                args.owner, args.repo, args.reference
            )
        })?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(tree)?),
        OutputFormat::Table => {
            for entry in tree {
                let size = entry.size.map(|s| s.to_string()).unwrap_or_default();
                println!(
                    "{:<6} {:<6} {:>10}  {}",
                    entry.mode,
                    entry.kind.as_str(),
                    size,
                    entry.path
                );
            }
        }
    }
    Ok(())
}

fn run_download(client: &GitHubClient, args: DownloadArgs) -> Result<()> {
    let repo = client.repository(&args.owner, &args.repo)?;

    // Populate the tree cache at the requested ref before blobs are derived.
    repo.get_tree(&args.reference, true).with_context(|| {
        format!(
            "Failed to fetch tree for {}/{} at {}",
            args.owner, args.repo, args.reference
        )
    })?;

    let options = DownloadOptions::new(&args.root)
        .with_makedirs(args.makedirs)
        .with_overwrite(args.overwrite);

    let report = repo
        .download_blobs(&options, args.threads, args.max_threads)
        .with_context(|| {
            format!(
                "Failed to download {}/{} into {}",
                args.owner,
                args.repo,
                args.root.display()
            )
        })?;

    println!(
        "Downloaded {}/{}: {} files written, {} skipped",
        args.owner, args.repo, report.written, report.skipped
    );
    Ok(())
}
