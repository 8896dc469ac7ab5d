//! Market data lookup for the `/stock` command.

use std::time::Duration;

use async_trait::async_trait;

use crate::{FinchatError, Result};

/// Source of raw CSV quotes.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Fetch the CSV quote document for `symbol`.
    async fn fetch_csv(&self, symbol: &str) -> Result<String>;
}

/// Quote provider backed by the stooq.com CSV endpoint.
pub struct StooqClient {
    client: reqwest::Client,
    base_url: String,
}

impl StooqClient {
    /// Create a client for `base_url` with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FinchatError::Quote(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl QuoteProvider for StooqClient {
    async fn fetch_csv(&self, symbol: &str) -> Result<String> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("s", symbol), ("f", "sd2t2ohlcv"), ("h", ""), ("e", "csv")])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| FinchatError::Quote(format!("request for {symbol} failed: {e}")))?;

        response
            .text()
            .await
            .map_err(|e| FinchatError::Quote(format!("failed to read quote body: {e}")))
    }
}

/// Turn a stooq CSV document into the reply text.
///
/// The first line is a header. The first following row with at least eight
/// columns is used: column 0 is the symbol and column 6 the close price.
/// Stooq never quotes fields, so quoted input is refused rather than split
/// into shifted columns.
pub fn format_quote(csv: &str) -> Result<String> {
    if csv.contains('"') {
        return Err(FinchatError::Quote("quoted CSV fields are not supported".to_string()));
    }

    let mut lines = csv.lines().filter(|line| !line.trim().is_empty());
    if lines.next().is_none() {
        return Err(FinchatError::Quote("unexpected CSV format".to_string()));
    }

    let row: Vec<&str> = lines
        .map(|line| line.split(',').map(str::trim).collect::<Vec<_>>())
        .find(|columns| columns.len() >= 8)
        .ok_or_else(|| FinchatError::Quote("unexpected CSV format".to_string()))?;

    let symbol = row[0];
    let close = row[6];
    if close.is_empty() || close == "N/D" {
        return Err(FinchatError::Quote("quote not available".to_string()));
    }

    Ok(format!("{symbol} quote is ${close} per share"))
}
