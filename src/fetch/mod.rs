// src/fetch/mod.rs

pub mod sources;

use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::Client;
use std::{collections::BTreeMap, fmt, time::Duration};
use thiserror::Error;
use tracing::{debug, error, info, instrument};
use url::Url;

use crate::process::{normalize_table, parse_tables, table_key};
use crate::table::NormalizedTable;

pub use sources::{extract_market_values, extract_team_statistics, SourceSet, TeamSource};

/// Desktop browser user agent; several football sites refuse obvious bots.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the HTTP client used for every page fetch.
pub fn build_client(user_agent: &str, timeout: Duration) -> Result<Client> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .gzip(true)
        .build()
        .context("failed to build http client")
}

/// Why a page could not be turned into HTML.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("invalid url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("GET {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("GET {url} returned status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("reading body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Why a source produced no tables.
#[derive(Debug)]
pub enum EmptyReason {
    SourceUnavailable(SourceError),
    NoTablesFound,
    /// Tables were found but none of the requested indices exist.
    NoRequestedTables { available: usize },
}

impl fmt::Display for EmptyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmptyReason::SourceUnavailable(e) => write!(f, "source unavailable: {}", e),
            EmptyReason::NoTablesFound => write!(f, "no tables found"),
            EmptyReason::NoRequestedTables { available } => {
                write!(f, "none of the requested tables exist ({} available)", available)
            }
        }
    }
}

/// Result of extracting one source. Never an error: a failing source just
/// comes back empty with the reason attached.
#[derive(Debug)]
pub enum FetchOutcome {
    Tables(BTreeMap<String, NormalizedTable>),
    Empty(EmptyReason),
}

impl FetchOutcome {
    pub fn is_empty(&self) -> bool {
        match self {
            FetchOutcome::Tables(t) => t.is_empty(),
            FetchOutcome::Empty(_) => true,
        }
    }

    pub fn empty_reason(&self) -> Option<&EmptyReason> {
        match self {
            FetchOutcome::Empty(reason) => Some(reason),
            FetchOutcome::Tables(_) => None,
        }
    }

    pub fn into_tables(self) -> BTreeMap<String, NormalizedTable> {
        match self {
            FetchOutcome::Tables(t) => t,
            FetchOutcome::Empty(_) => BTreeMap::new(),
        }
    }
}

/// GET `url` and return its body, failing on any non-2xx status.
pub async fn get_html(client: &Client, url: &str) -> Result<String, SourceError> {
    let parsed = Url::parse(url).map_err(|source| SourceError::InvalidUrl {
        url: url.to_string(),
        source,
    })?;

    debug!(%url, "fetching page");
    let resp = client
        .get(parsed)
        .send()
        .await
        .map_err(|source| SourceError::Request {
            url: url.to_string(),
            source,
        })?;

    let status = resp.status();
    if !status.is_success() {
        return Err(SourceError::Status {
            url: url.to_string(),
            status,
        });
    }

    resp.text().await.map_err(|source| SourceError::Body {
        url: url.to_string(),
        source,
    })
}

/// Extract the tables at `indices` from an already downloaded page.
pub fn tables_from_html(html: &str, url: &str, team: &str, indices: &[usize]) -> FetchOutcome {
    let raw_tables = parse_tables(html);
    if raw_tables.is_empty() {
        return FetchOutcome::Empty(EmptyReason::NoTablesFound);
    }

    let mut out = BTreeMap::new();
    for &idx in indices {
        let Some(raw) = raw_tables.get(idx) else {
            debug!(%url, index = idx, available = raw_tables.len(), "table index out of range");
            continue;
        };
        let key = table_key(team, idx);
        let table = normalize_table(raw, &key, team, url, Utc::now());
        out.insert(key, table);
    }

    if out.is_empty() {
        FetchOutcome::Empty(EmptyReason::NoRequestedTables {
            available: raw_tables.len(),
        })
    } else {
        FetchOutcome::Tables(out)
    }
}

/// Fetch `url` and extract the tables at `indices`, keyed `{team}_tabela_{i}`.
///
/// Network, status and parse problems are logged and returned as
/// [`FetchOutcome::Empty`] so that one broken site never aborts a batch.
#[instrument(level = "info", skip(client, indices))]
pub async fn fetch_tables(
    client: &Client,
    url: &str,
    team: &str,
    indices: &[usize],
) -> FetchOutcome {
    let html = match get_html(client, url).await {
        Ok(html) => html,
        Err(e) => {
            error!(%url, error = %e, "error accessing source");
            return FetchOutcome::Empty(EmptyReason::SourceUnavailable(e));
        }
    };

    let outcome = tables_from_html(&html, url, team, indices);
    match &outcome {
        FetchOutcome::Tables(t) => info!(%url, tables = t.len(), "extracted tables"),
        FetchOutcome::Empty(reason) => error!(%url, %reason, "no tables extracted"),
    }
    outcome
}
