use anyhow::{bail, Result};
use chrono::Utc;
use futscraper::{
    config::{self, Config},
    freshness,
};
use std::env;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()))
    });
    fmt::Subscriber::builder().with_env_filter(env_filter).init();

    let cfg = Config::from_env()?;
    let threshold = config::freshness_threshold_hours()?;
    let dir = cfg.warehouse_dir.join(&cfg.project_id).join(&cfg.dataset_id);
    info!(dir = %dir.display(), threshold_hours = threshold, "checking table freshness");

    let ages = freshness::scan(&dir, Utc::now())?;
    if ages.is_empty() {
        bail!("no tables found in {}", dir.display());
    }

    let mut stale = Vec::new();
    for age in &ages {
        let hours = format!("{:.1}", age.age_hours);
        if age.is_stale(threshold) {
            warn!(table = %age.table, age_hours = %hours, "table is stale");
            stale.push(age.table.as_str());
        } else {
            info!(table = %age.table, age_hours = %hours, "table is fresh");
        }
    }

    if !stale.is_empty() {
        bail!(
            "{} of {} tables older than {}h: {:?}",
            stale.len(),
            ages.len(),
            threshold,
            stale
        );
    }
    info!(count = ages.len(), "all tables fresh");
    Ok(())
}
