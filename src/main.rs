use anyhow::Result;
use sqlx::sqlite::SqlitePoolOptions;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tonboard::backend::{AppLeaderboardBackend, BackendRegistry};
use tonboard::config::{FilterConfig, SeasonFile};

struct CliArgs {
    season_path: String,
    filters_path: Option<String>,
    dry_run: bool,
}

fn parse_args() -> Result<CliArgs> {
    let mut season_path = None;
    let mut filters_path = None;
    let mut dry_run = false;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--dry-run" => dry_run = true,
            "--filters" => {
                filters_path = Some(
                    args.next()
                        .ok_or_else(|| anyhow::anyhow!("--filters requires a path"))?,
                )
            }
            other if season_path.is_none() => season_path = Some(other.to_string()),
            other => anyhow::bail!("unexpected argument: {}", other),
        }
    }

    Ok(CliArgs {
        season_path: season_path.ok_or_else(|| {
            anyhow::anyhow!("usage: tonboard <season.toml> [--filters <filters.toml>] [--dry-run]")
        })?,
        filters_path,
        dry_run,
    })
}

fn init_tracing() {
    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_level(true)
        .compact();

    tracing_subscriber::registry()
        .with(console_layer)
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    info!("🏆 Tonboard - Season Leaderboard Calculator");

    let args = parse_args()?;
    let config = SeasonFile::load_from_file(&args.season_path)?;
    let filters = match &args.filters_path {
        Some(path) => FilterConfig::load_from_file(path)?,
        None => FilterConfig::default(),
    };

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite:data/tonboard.db".to_string());
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await?;

    let mut registry = BackendRegistry::new();
    registry.register(Box::new(AppLeaderboardBackend::new(filters)));

    let all_results = registry.run(&pool, &config, args.dry_run).await?;
    for results in &all_results {
        println!("{}", serde_json::to_string_pretty(results)?);
    }

    info!("Season {} calculation finished", config.name);
    Ok(())
}
