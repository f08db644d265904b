use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use context_indexer::{
    find_common_workspace_root, DiscoveryRequest, DiscoveryStats, FileScanner,
    ProjectContextController,
};
use context_protocol::{
    serialize_json, serialize_json_pretty, ContextConfiguration, QueryVectorIndexParams,
    RelevantDocument, WorkspaceFolder,
};
use context_search::ChunkAggregator;
use context_vector_store::{MemoryVectorEngine, DEFAULT_QUERY_LIMIT};
use serde::Serialize;
use std::io;
use std::path::PathBuf;

mod config;

pub use config::{load_configuration, ConfigArgs};

const CLIENT_NAME: &str = "context-index";

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let text = if pretty {
        serialize_json_pretty(value)?
    } else {
        serialize_json(value)?
    };
    print_stdout(&text)
}

#[derive(Parser)]
#[command(name = "context-index")]
#[command(about = "Discover and query the local project context of a workspace", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the deepest directory shared by the workspace folders
    Roots(RootsArgs),

    /// List the files that would be indexed, with discovery stats
    Scan(ScanArgs),

    /// Index the workspace in memory and print the documents matching a query
    Query(QueryArgs),

    /// Print the JSON schema of the configuration file
    Schema,
}

#[derive(Args)]
struct RootsArgs {
    /// Workspace folders (paths or file:// URIs)
    #[arg(required = true)]
    folders: Vec<String>,
}

#[derive(Args)]
struct ScanArgs {
    /// Workspace folders (paths or file:// URIs)
    #[arg(required = true)]
    folders: Vec<String>,

    #[command(flatten)]
    config: ConfigArgs,

    /// Walker threads per folder (overrides CONTEXT_DISCOVERY_THREADS)
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Args)]
struct QueryArgs {
    /// Workspace folders (paths or file:// URIs)
    #[arg(required = true)]
    folders: Vec<String>,

    /// Search query
    #[arg(short = 'Q', long)]
    query: String,

    /// Maximum number of chunks to retrieve
    #[arg(short, long, default_value_t = DEFAULT_QUERY_LIMIT)]
    limit: usize,

    /// Only report these languages (repeatable)
    #[arg(long = "language", value_name = "LANGUAGE")]
    languages: Vec<String>,

    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RootsOutput {
    root: PathBuf,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ScanOutput {
    files: Vec<PathBuf>,
    stats: DiscoveryStats,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryOutput {
    query: String,
    documents: Vec<RelevantDocument>,
}

pub async fn main_entry() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    match cli.command {
        Commands::Roots(args) => run_roots(args, cli.pretty)?,
        Commands::Scan(args) => run_scan(args, cli.pretty).await?,
        Commands::Query(args) => run_query(args, cli.pretty).await?,
        Commands::Schema => {
            let schema = schemars::schema_for!(ContextConfiguration);
            print_json(&schema, true)?;
        }
    }

    Ok(())
}

fn run_roots(args: RootsArgs, pretty: bool) -> Result<()> {
    let folders = workspace_folders(&args.folders)?;
    let root = find_common_workspace_root(&folders).context("Failed to resolve workspace root")?;
    print_json(&RootsOutput { root }, pretty)
}

async fn run_scan(args: ScanArgs, pretty: bool) -> Result<()> {
    let folders = workspace_folders(&args.folders)?;
    let config = args.config.resolve()?;
    let scanner = args
        .threads
        .map_or_else(FileScanner::new, FileScanner::with_threads);

    let request = DiscoveryRequest::from_configuration(&folders, &config);
    let (files, stats) = tokio::task::spawn_blocking(move || scanner.discover_with_stats(&request))
        .await
        .context("Discovery task failed")?;

    print_json(&ScanOutput { files, stats }, pretty)
}

async fn run_query(args: QueryArgs, pretty: bool) -> Result<()> {
    let folders = workspace_folders(&args.folders)?;
    let config = args.config.resolve()?;

    let mut controller =
        ProjectContextController::new(CLIENT_NAME, folders).with_configuration(config);
    if !args.languages.is_empty() {
        controller = controller.with_aggregator(ChunkAggregator::with_languages(args.languages));
    }

    controller
        .init(Box::new(MemoryVectorEngine::new().with_limit(args.limit)))
        .await;
    if !controller.is_enabled() {
        anyhow::bail!("Project context could not be started; see the log for details");
    }

    let documents = controller
        .query_relevant_documents(&QueryVectorIndexParams {
            query: args.query.clone(),
        })
        .await;
    controller.dispose().await;

    print_json(
        &QueryOutput {
            query: args.query,
            documents,
        },
        pretty,
    )
}

/// Workspace folders from command-line arguments. URIs are taken as-is;
/// anything else is a path, made absolute against the current directory.
fn workspace_folders(raw: &[String]) -> Result<Vec<WorkspaceFolder>> {
    raw.iter()
        .map(|value| {
            if value.contains("://") {
                return Ok(WorkspaceFolder::new(value.clone()));
            }
            let path = std::path::absolute(value)
                .with_context(|| format!("Invalid workspace folder {value}"))?;
            Ok(WorkspaceFolder::from_path(path))
        })
        .collect()
}
