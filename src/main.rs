use anyhow::{bail, Result};
use futscraper::{
    config::Config,
    fetch::{self, extract_market_values, extract_team_statistics},
    load::{send_to_warehouse, LocalWarehouse},
    seeds::write_seeds,
};
use std::{collections::BTreeMap, env, time::Instant};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()))
    });
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    // ─── 2) configuration ────────────────────────────────────────────
    let cfg = Config::from_env()?;
    info!(
        project = %cfg.project_id,
        dataset = %cfg.dataset_id,
        output = ?cfg.output,
        "config loaded"
    );
    let client = fetch::build_client(&cfg.user_agent, cfg.timeout())?;
    let start = Instant::now();

    // ─── 3) extract ──────────────────────────────────────────────────
    info!("extracting football statistics");
    let stats = extract_team_statistics(&client, &cfg.statistics).await;
    info!(count = stats.len(), "statistics tables extracted");

    info!("extracting market values");
    let market = extract_market_values(&client, &cfg.market_values).await;
    info!(count = market.len(), "market value tables extracted");

    let mut all = BTreeMap::new();
    all.extend(stats);
    all.extend(market);

    if all.is_empty() {
        error!("no tables extracted from any source");
        bail!("no tables extracted");
    }
    info!(count = all.len(), "tables ready");

    // ─── 4) outputs ──────────────────────────────────────────────────
    if cfg.output.seeds() {
        let written = write_seeds(&all, &cfg.seeds_dir)?;
        info!(count = written.len(), dir = %cfg.seeds_dir.display(), "seeds written");
    }

    if cfg.output.warehouse() {
        let warehouse = LocalWarehouse::new(&cfg.warehouse_dir, &cfg.project_id);
        let summary = send_to_warehouse(&warehouse, &all, &cfg.load_options())?;
        if !summary.failed.is_empty() {
            warn!(failed = ?summary.failed, "some tables were not loaded");
        }
    }

    info!(elapsed = ?start.elapsed(), "done");
    Ok(())
}
