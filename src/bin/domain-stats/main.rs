//! Domain Stats command-line tool
//!
//! Records and aggregates per-domain response counters in Redis.
//!
//! # CLI Commands
//!
//! - `add` - Record a snapshot of counters for a domain
//! - `series` - Total counters of one domain over a time range
//! - `all` - Total counters of every configured domain over a time range
//! - `days` - List the UTC days covered by a time range
//! - `get` / `set` - Read or write a raw value
//! - `check-config` - Validate configuration and print a summary
//!
//! # Configuration
//!
//! Read from `--config`, then the `DOMAIN_STATS_CONFIG` environment
//! variable, then `./domain-stats.toml`, falling back to defaults.
//! Environment overrides (`DOMAIN_STATS_REDIS_URL`, ...) apply last.

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use domain_stats::{
    calendar::enumerate_days,
    config::Config,
    redis::RedisStore,
    store::{get_string, set_string},
    CallContext, CounterSet, DomainRangeAggregator, Expiration, KeyValueStore, TimeSeriesStore,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const DEFAULT_CONFIG_FILE: &str = "domain-stats.toml";

#[derive(Parser)]
#[command(name = "domain-stats")]
#[command(version)]
#[command(about = "Per-domain HTTP status counters stored in Redis", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file (overrides DOMAIN_STATS_CONFIG env var)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the Redis URL
    #[arg(long, global = true)]
    redis_url: Option<String>,

    /// Give up on the command after this many milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a snapshot of counters for a domain
    Add {
        /// Domain the counters belong to
        domain: String,

        /// 2xx responses
        #[arg(long, default_value_t = 0)]
        ok: u64,

        /// 3xx responses
        #[arg(long, default_value_t = 0)]
        redirect: u64,

        /// 4xx responses
        #[arg(long, default_value_t = 0)]
        client_error: u64,

        /// 5xx responses
        #[arg(long, default_value_t = 0)]
        server_error: u64,

        /// Observation time (RFC 3339), defaults to now
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },

    /// Total counters of one domain over [start, stop]
    Series {
        /// Domain to aggregate
        domain: String,

        /// Range start (RFC 3339, inclusive)
        #[arg(long)]
        start: DateTime<Utc>,

        /// Range stop (RFC 3339, inclusive)
        #[arg(long)]
        stop: DateTime<Utc>,
    },

    /// Total counters of every configured domain over [start, stop]
    All {
        /// Range start (RFC 3339, inclusive)
        #[arg(long)]
        start: DateTime<Utc>,

        /// Range stop (RFC 3339, inclusive)
        #[arg(long)]
        stop: DateTime<Utc>,
    },

    /// List the UTC days between two instants
    Days {
        /// First instant (RFC 3339)
        #[arg(long)]
        start: DateTime<Utc>,

        /// Last instant (RFC 3339)
        #[arg(long)]
        end: DateTime<Utc>,
    },

    /// Read a raw value
    Get {
        /// Key to read
        key: String,
    },

    /// Write a raw value
    Set {
        /// Key to write
        key: String,

        /// Value to store
        value: String,

        /// Expire the value after this many milliseconds (0 = never)
        #[arg(long, default_value_t = 0)]
        ttl_ms: u64,
    },

    /// Validate configuration and print a summary
    CheckConfig,
}

/// Resolve and load configuration
fn load_config(cli: &Cli) -> Result<Config, Box<dyn std::error::Error>> {
    let path = cli
        .config
        .clone()
        .or_else(|| std::env::var_os("DOMAIN_STATS_CONFIG").map(PathBuf::from))
        .or_else(|| {
            let default = Path::new(DEFAULT_CONFIG_FILE);
            default.exists().then(|| default.to_path_buf())
        });

    let mut config = match path {
        Some(path) => Config::from_file_with_env(&path)?,
        None => Config::from_env(),
    };

    if let Some(url) = &cli.redis_url {
        config.redis.url = url.clone();
    }
    config.validate()?;
    Ok(config)
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_tracing(&config);

    let ctx = match cli.timeout_ms {
        Some(ms) => CallContext::background().with_timeout(Duration::from_millis(ms)),
        None => CallContext::background(),
    };

    // Commands that never touch Redis
    match &cli.command {
        Commands::Days { start, end } => {
            let days: Vec<String> = enumerate_days(*start, *end)?
                .into_iter()
                .map(|d| d.to_rfc3339())
                .collect();
            print_json(&days)?;
            return Ok(ExitCode::SUCCESS);
        },
        Commands::CheckConfig => {
            println!("Configuration is valid!");
            println!("  Redis URL:  {}", domain_stats::redis::util::redact_url(&config.redis.url));
            println!("  Key prefix: {}", config.series.key_prefix);
            println!("  Domains:    {}", config.registry.domains.join(", "));
            return Ok(ExitCode::SUCCESS);
        },
        _ => {},
    }

    let redis = Arc::new(RedisStore::connect(config.redis_config()).await?);
    let store: Arc<dyn KeyValueStore> = redis.clone();
    debug!("Connected to {}", store.backend_id());

    let series = TimeSeriesStore::new(store.clone(), config.series.key_prefix.clone());
    let aggregator = DomainRangeAggregator::new(series.clone(), Arc::new(config.registry()));

    let mut status = ExitCode::SUCCESS;
    match cli.command {
        Commands::Add {
            domain,
            ok,
            redirect,
            client_error,
            server_error,
            at,
        } => {
            let value = CounterSet::new(ok, redirect, client_error, server_error);
            let at = at.unwrap_or_else(Utc::now);
            series.add_snapshot(&ctx, &domain, &value, at).await?;
            info!("Recorded {} for {} at {}", value, domain, at);
        },
        Commands::Series {
            domain,
            start,
            stop,
        } => {
            let total = aggregator.get_series(&ctx, &domain, start, stop).await?;
            print_json(&total)?;
        },
        Commands::All { start, stop } => {
            let totals = aggregator.get_all_series(&ctx, start, stop).await?;
            print_json(&totals)?;
        },
        Commands::Get { key } => match get_string(store.as_ref(), &ctx, &key).await? {
            Some(value) => println!("{}", value),
            None => {
                eprintln!("(nil)");
                status = ExitCode::FAILURE;
            },
        },
        Commands::Set { key, value, ttl_ms } => {
            let expiration = Expiration::from_duration(Duration::from_millis(ttl_ms));
            set_string(store.as_ref(), &ctx, &key, &value, expiration).await?;
        },
        Commands::Days { .. } | Commands::CheckConfig => {},
    }

    debug!("Redis command stats: {:?}", redis.stats());
    Ok(status)
}
