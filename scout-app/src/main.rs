use anyhow::{Context, Result};
use chrono::Datelike;
use clap::{Args, Parser, Subcommand};
use scout_common::observability::{LogConfig, init_logging};
use scout_common::{CandidateEvent, ScoutError, VendorProfile};
use scout_config::{ScoutConfig, ScoutConfigLoader};
use scout_discovery::{DEFAULT_RADIUS_KM, FoundEvents, stored_events, synthesize_queries};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tether::{build_discovery, build_from_config, open_store};
use tokio_util::sync::CancellationToken;
mod tether;

#[derive(Parser, Debug)]
#[command(name = "vendor-scout", author, version, about, long_about = None)]
struct Cli {
    /// YAML config; missing file is fine, `SCOUT__*` env vars still apply.
    #[arg(long, short, global = true, default_value = "vendor-scout.yaml", env = "SCOUT_CONFIG")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Find events for a vendor, serving stored results when they match.
    Discover(DiscoverArgs),
    /// Print the search queries a vendor would generate.
    Queries(VendorArgs),
    /// List stored events for a vendor.
    Cached {
        #[arg(long)]
        vendor_id: String,
        /// Only events whose location contains this text.
        #[arg(long)]
        location: Option<String>,
    },
    /// Print the effective config with secrets masked.
    ShowConfig,
}

#[derive(Args, Debug)]
struct VendorArgs {
    #[arg(long, default_value = "cli")]
    vendor_id: String,
    #[arg(long)]
    location: String,
    #[arg(long)]
    business: String,
    #[arg(long, default_value_t = DEFAULT_RADIUS_KM)]
    radius_km: u32,
}

#[derive(Args, Debug)]
struct DiscoverArgs {
    #[command(flatten)]
    vendor: VendorArgs,
    #[arg(long, default_value_t = 10)]
    max_results: usize,
    /// Skip the cache and always search.
    #[arg(long)]
    refresh: bool,
    /// Search without reading or writing the event store.
    #[arg(long, conflicts_with = "refresh")]
    no_store: bool,
    /// Abort the run after this many seconds.
    #[arg(long)]
    deadline_secs: Option<u64>,
    /// Write JSON here instead of stdout.
    #[arg(long, short)]
    output: Option<PathBuf>,
}

impl VendorArgs {
    fn profile(&self) -> VendorProfile {
        VendorProfile::new(&self.vendor_id, &self.location, &self.business)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) Load config (env wins over file)
    let cfg: ScoutConfig = ScoutConfigLoader::new()
        .with_optional_file(&cli.config)
        .load()
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    init_logging(LogConfig {
        app_name: "vendor-scout",
        log_dir: cfg.logging.dir.clone(),
        file: cfg.logging.dir.is_some(),
        emit_stderr: cfg.logging.stderr,
        format: cfg.logging.log_format()?,
        default_filter: cfg.logging.filter.clone(),
    })?;

    match cli.command {
        Command::Discover(args) => discover(&cfg, args).await,
        Command::Queries(args) => {
            let year = chrono::Local::now().year();
            for query in synthesize_queries(&args.profile(), args.radius_km, year) {
                println!("{query}");
            }
            Ok(())
        }
        Command::Cached {
            vendor_id,
            location,
        } => {
            let store = open_store(&cfg).await?;
            let rows = stored_events(store.as_ref(), &vendor_id, location.as_deref()).await?;
            println!("{}", serde_json::to_string_pretty(&rows)?);
            Ok(())
        }
        Command::ShowConfig => {
            print!("{}", cfg.to_redacted_yaml()?);
            Ok(())
        }
    }
}

async fn discover(cfg: &ScoutConfig, args: DiscoverArgs) -> Result<()> {
    let vendor = args.vendor.profile();
    let radius = args.vendor.radius_km;

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("app.interrupted");
                cancel.cancel();
            }
        });
    }

    // The store is opened only when it will be used.
    if args.no_store {
        let discovery = build_discovery(cfg)?;
        let run = discovery.discover(&vendor, radius, args.max_results, &cancel);
        let events = with_deadline(args.deadline_secs, run).await?;
        return write_events(&events, args.output.as_deref());
    }

    let tether = build_from_config(cfg).await?;
    let run = async {
        let found: FoundEvents = if args.refresh {
            tether
                .service
                .refresh(&vendor, radius, args.max_results, &cancel)
                .await?
        } else {
            tether
                .service
                .find_events(&vendor, radius, args.max_results, &cancel)
                .await?
        };
        tracing::info!(
            vendor_id = %vendor.id,
            source = ?found.source,
            inserted = found.inserted,
            "app.discover.done"
        );
        Ok::<_, ScoutError>(found.events)
    };
    let events = with_deadline(args.deadline_secs, run).await?;
    write_events(&events, args.output.as_deref())
}

async fn with_deadline<F>(deadline_secs: Option<u64>, run: F) -> Result<Vec<CandidateEvent>>
where
    F: Future<Output = Result<Vec<CandidateEvent>, ScoutError>>,
{
    let events = match deadline_secs {
        Some(secs) => tokio::time::timeout(Duration::from_secs(secs), run)
            .await
            .map_err(|_| ScoutError::Timeout)??,
        None => run.await?,
    };
    Ok(events)
}

fn write_events(events: &[CandidateEvent], output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(events)?;
    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("writing results to {}", path.display()))?;
            tracing::info!(path = %path.display(), events = events.len(), "app.output.written");
        }
        None => println!("{json}"),
    }
    Ok(())
}
