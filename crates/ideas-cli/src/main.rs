//! 10000Ideas CLI
//!
//! - `migrate`: replace the static ideas with the two legacy JSON files,
//! - `serve`: JSON API over the store,
//! - `list`: query the catalogue from the terminal,
//! - `users create-admin`: bootstrap an administrator account.
//!
//! Exit status: 0 on success, 1 when the store cannot be opened,
//! 2 for everything else.

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::env;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use ideas_auth::{check_password_strength, Argon2Hasher, PasswordHasher, TokenIssuer};
use ideas_ingest_legacy::{run_migration, LegacyFiles, MigrationError, MigrationReport};
use ideas_model::{
    BusinessModel, Category, IdeaStatus, InvestmentRange, MarketSize, NewUser, Role, TimeToStart,
};
use ideas_storage::{IdeaQuery, IdeaStore, SortOrder, StoreConfig, StoreError};

mod api;
mod server;

const DATA_DIR_ENV: &str = "IDEAS_DATA_DIR";
const JWT_SECRET_ENV: &str = "IDEAS_JWT_SECRET";
const DEFAULT_DATA_DIR: &str = "data";

#[derive(Parser)]
#[command(name = "ideas")]
#[command(
    author,
    version,
    about = "10000Ideas: idea catalogue store, legacy migration and JSON API"
)]
struct Cli {
    /// Directory holding the store snapshot (default: $IDEAS_DATA_DIR, then ./data)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace every static idea with the records from the legacy files.
    ///
    /// Community-submitted ideas are left alone. Running it twice with the
    /// same files leaves the same set of static ideas.
    Migrate(MigrateArgs),

    /// Serve the JSON API.
    Serve(ServeArgs),

    /// List ideas matching a filter.
    List(ListArgs),

    /// Account administration.
    Users {
        #[command(subcommand)]
        command: UserCommands,
    },
}

#[derive(Args)]
struct MigrateArgs {
    /// Summary-shaped legacy file (keyed object or array)
    #[arg(long)]
    summary: PathBuf,
    /// Detailed-shaped legacy file (array)
    #[arg(long)]
    detailed: PathBuf,
    /// Print the migration report as JSON on stdout
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ServeArgs {
    /// Listen address
    #[arg(long, default_value = "127.0.0.1:8080")]
    listen: SocketAddr,
    /// Token signing secret (falls back to $IDEAS_JWT_SECRET)
    #[arg(long)]
    jwt_secret: Option<String>,
    /// Token lifetime in days
    #[arg(long, default_value_t = ideas_auth::DEFAULT_TOKEN_LIFETIME_DAYS)]
    token_days: i64,
}

#[derive(Clone, Copy, ValueEnum)]
enum Source {
    All,
    Static,
    Community,
}

#[derive(Args)]
struct ListArgs {
    /// Case-insensitive text search over title, description and tags
    #[arg(long)]
    search: Option<String>,
    #[arg(long)]
    category: Option<Category>,
    #[arg(long)]
    investment_range: Option<InvestmentRange>,
    #[arg(long)]
    time_to_start: Option<TimeToStart>,
    #[arg(long)]
    business_model: Option<BusinessModel>,
    #[arg(long)]
    market_size: Option<MarketSize>,
    #[arg(long)]
    status: Option<IdeaStatus>,
    #[arg(long, value_enum, default_value = "all")]
    source: Source,
    /// newest, oldest, most_viewed, most_liked, title
    #[arg(long, default_value = "newest")]
    sort: SortOrder,
    #[arg(long, default_value_t = 1)]
    page: usize,
    #[arg(long, default_value_t = ideas_storage::query::DEFAULT_PER_PAGE)]
    per_page: usize,
    /// Print the page as JSON on stdout
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum UserCommands {
    /// Create an account with the admin role.
    CreateAdmin {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e:#}", "error:".red().bold());
            ExitCode::from(exit_code(&e))
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// 1 for store connection failures anywhere in the chain, 2 otherwise.
fn exit_code(err: &anyhow::Error) -> u8 {
    let connection = err.chain().any(|cause| {
        cause
            .downcast_ref::<StoreError>()
            .is_some_and(StoreError::is_connection)
            || cause
                .downcast_ref::<MigrationError>()
                .is_some_and(MigrationError::is_connection)
    });
    if connection {
        1
    } else {
        2
    }
}

fn resolve_data_dir(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| env::var_os(DATA_DIR_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

fn run(cli: Cli) -> Result<()> {
    let data_dir = resolve_data_dir(cli.data_dir);

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| anyhow!("failed to initialize tokio runtime: {e}"))?;

    rt.block_on(async move {
        match cli.command {
            Commands::Migrate(args) => cmd_migrate(&data_dir, args).await,
            Commands::Serve(args) => cmd_serve(&data_dir, args).await,
            Commands::List(args) => cmd_list(&data_dir, args).await,
            Commands::Users { command } => match command {
                UserCommands::CreateAdmin {
                    name,
                    email,
                    password,
                } => cmd_create_admin(&data_dir, name, email, password).await,
            },
        }
    })
}

async fn connect(data_dir: &Path) -> Result<IdeaStore> {
    IdeaStore::connect(StoreConfig::on_disk(data_dir))
        .await
        .with_context(|| format!("failed to open store in {}", data_dir.display()))
}

/// Close `store` whatever `outcome` is; the command's own error wins.
async fn finish<T>(store: IdeaStore, outcome: Result<T>) -> Result<T> {
    let closed = store.close().await;
    let value = outcome?;
    closed.context("failed to close store")?;
    Ok(value)
}

// ============================================================================
// migrate
// ============================================================================

async fn cmd_migrate(data_dir: &Path, args: MigrateArgs) -> Result<()> {
    let source = LegacyFiles::new(args.summary, args.detailed);
    let store = connect(data_dir).await?;
    let outcome = run_migration(&store, &source)
        .await
        .context("migration failed");
    let report = finish(store, outcome).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &MigrationReport) {
    println!(
        "{} migrated {} legacy records ({} summary, {} detailed)",
        "ok".green().bold(),
        report.summary_records + report.detailed_records,
        report.summary_records,
        report.detailed_records
    );
    println!(
        "   removed {} static ideas, inserted {}",
        report.deleted, report.inserted
    );

    let f = &report.fallbacks;
    if f.total() > 0 {
        println!(
            "   {} defaults used: category {}, investment {}, timeline {}, market {}, model {}",
            "note:".yellow().bold(),
            f.category,
            f.investment_range,
            f.time_to_start,
            f.market_size,
            f.business_model
        );
    }
}

// ============================================================================
// serve
// ============================================================================

async fn cmd_serve(data_dir: &Path, args: ServeArgs) -> Result<()> {
    let secret = args
        .jwt_secret
        .or_else(|| env::var(JWT_SECRET_ENV).ok())
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| {
            anyhow!("serve: no token secret; pass --jwt-secret or set {JWT_SECRET_ENV}")
        })?;
    let lifetime = token_lifetime(args.token_days)?;

    let store = connect(data_dir).await?;
    let state = Arc::new(api::AppState {
        store,
        tokens: TokenIssuer::new(secret.as_bytes()).with_lifetime(lifetime),
        hasher: Arc::new(Argon2Hasher::new()),
    });

    let outcome = server::serve(args.listen, state.clone()).await;
    match Arc::try_unwrap(state) {
        Ok(state) => finish(state.store, outcome).await,
        // Connection tasks still hold the state; `serve` flushed before returning.
        Err(_) => outcome,
    }
}

fn token_lifetime(days: i64) -> Result<chrono::Duration> {
    if days <= 0 {
        return Err(anyhow!("serve: --token-days must be positive"));
    }
    chrono::Duration::try_days(days)
        .ok_or_else(|| anyhow!("serve: --token-days {days} is out of range"))
}

// ============================================================================
// list
// ============================================================================

async fn cmd_list(data_dir: &Path, args: ListArgs) -> Result<()> {
    let mut query = IdeaQuery {
        sort: args.sort,
        page: args.page,
        per_page: args.per_page,
        ..Default::default()
    };
    let filter = &mut query.filter;
    filter.search = args.search;
    filter.category = args.category;
    filter.investment_range = args.investment_range;
    filter.time_to_start = args.time_to_start;
    filter.business_model = args.business_model;
    filter.market_size = args.market_size;
    filter.status = args.status;
    filter.is_static_idea = match args.source {
        Source::All => None,
        Source::Static => Some(true),
        Source::Community => Some(false),
    };

    let store = connect(data_dir).await?;
    let page = store.query_ideas(&query);
    store.release();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }

    let first = rows_before(page.page, page.per_page);
    for (i, idea) in page.items.iter().enumerate() {
        let c = &idea.content;
        println!(
            "{:>5}  {}  {}",
            first.saturating_add(i + 1),
            c.title.bold(),
            format!("[{} | {} | {}]", c.category, c.investment_range, c.status).dimmed()
        );
    }
    println!(
        "page {}/{} ({} ideas)",
        page.page,
        page.total_pages.max(1),
        page.total
    );
    Ok(())
}

/// Rows on the pages before `page` (1-based).
fn rows_before(page: usize, per_page: usize) -> usize {
    page.saturating_sub(1).saturating_mul(per_page)
}

// ============================================================================
// users
// ============================================================================

async fn cmd_create_admin(
    data_dir: &Path,
    name: String,
    email: String,
    password: String,
) -> Result<()> {
    check_password_strength(&password)?;
    let password_hash = Argon2Hasher::new().hash(&password)?;

    let store = connect(data_dir).await?;
    let outcome = store
        .create_user(NewUser {
            name,
            email,
            password_hash,
            role: Role::Admin,
        })
        .await
        .context("failed to create admin");
    let admin = finish(store, outcome).await?;

    println!(
        "{} created admin {} ({})",
        "ok".green().bold(),
        admin.email,
        admin.id
    );
    Ok(())
}
