// src/fetch/sources.rs
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

use super::{fetch_tables, FetchOutcome};
use crate::table::NormalizedTable;

/// Suffix that keeps market-value keys apart from statistics keys.
pub const MARKET_SUFFIX: &str = "_mercado";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamSource {
    pub name: String,
    pub url: String,
}

impl TeamSource {
    pub fn new(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
        }
    }
}

/// A roster of team pages plus the table positions to pull from each.
/// Teams are visited in the order listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSet {
    pub table_indices: Vec<usize>,
    pub teams: Vec<TeamSource>,
}

impl SourceSet {
    /// Squad statistics from fbref, first table only.
    pub fn fbref_statistics() -> Self {
        Self {
            table_indices: vec![0],
            teams: vec![
                TeamSource::new(
                    "palmeiras",
                    "https://fbref.com/en/squads/abdce579/Palmeiras-Stats",
                ),
                TeamSource::new("flamengo", "https://fbref.com/en/squads/639950ae/Flamengo-Stats"),
                TeamSource::new(
                    "corinthians",
                    "https://fbref.com/en/squads/bf4acd28/Corinthians-Stats",
                ),
            ],
        }
    }

    /// Squad statistics from fbref for five clubs, several tables each.
    pub fn fbref_extended_statistics() -> Self {
        let mut set = Self::fbref_statistics();
        set.table_indices = vec![0, 1, 4, 5, 6, 10];
        set.teams.extend([
            TeamSource::new("sao_paulo", "https://fbref.com/en/squads/5f232eb1/Sao-Paulo-Stats"),
            TeamSource::new(
                "internacional",
                "https://fbref.com/en/squads/6f7e1f03/Internacional-Stats",
            ),
        ]);
        set
    }

    /// Player market values from ogol.
    pub fn ogol_market_values() -> Self {
        Self {
            table_indices: vec![0],
            teams: vec![
                TeamSource::new(
                    "corinthians",
                    "https://www.ogol.com.br/equipe/corinthians/valor-de-mercado",
                ),
                TeamSource::new(
                    "palmeiras",
                    "https://www.ogol.com.br/equipe/palmeiras/valor-de-mercado",
                ),
                TeamSource::new(
                    "flamengo",
                    "https://www.ogol.com.br/equipe/flamengo/valor-de-mercado",
                ),
            ],
        }
    }
}

async fn extract_all(
    client: &Client,
    sources: &SourceSet,
    what: &str,
) -> BTreeMap<String, NormalizedTable> {
    let mut out = BTreeMap::new();

    for team in &sources.teams {
        info!(team = %team.name, url = %team.url, "extracting {}", what);
        match fetch_tables(client, &team.url, &team.name, &sources.table_indices).await {
            FetchOutcome::Tables(tables) => out.extend(tables),
            FetchOutcome::Empty(reason) => {
                warn!(team = %team.name, %reason, "no {} extracted", what);
            }
        }
    }

    out
}

/// Pull the statistics tables of every team in `sources`.
/// A team whose page fails is logged and skipped.
pub async fn extract_team_statistics(
    client: &Client,
    sources: &SourceSet,
) -> BTreeMap<String, NormalizedTable> {
    extract_all(client, sources, "statistics").await
}

/// Pull market-value tables; keys carry the `_mercado` suffix.
pub async fn extract_market_values(
    client: &Client,
    sources: &SourceSet,
) -> BTreeMap<String, NormalizedTable> {
    extract_all(client, sources, "market values")
        .await
        .into_iter()
        .map(|(key, table)| {
            let key = format!("{}{}", key, MARKET_SUFFIX);
            let table = table.with_name(key.clone());
            (key, table)
        })
        .collect()
}
