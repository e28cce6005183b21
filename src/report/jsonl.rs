//! Append-only JSON lines output.

use std::path::{Path, PathBuf};

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::info;

use super::record::{BestMarketRecord, MarketRecord};
use crate::arbitrage::{BestOpportunity, MarketMetrics};
use crate::error::Result;

/// Appends cycle records to a file, creating it if needed. Never truncates.
#[derive(Debug, Clone)]
pub struct JsonlWriter {
    path: PathBuf,
}

impl JsonlWriter {
    /// Writer for `path`. Nothing is opened until the first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Output path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one line per result plus a `best_market` line when `best` is set.
    ///
    /// Returns the number of lines written.
    pub async fn append_cycle(
        &self,
        results: &[MarketMetrics],
        best: Option<&BestOpportunity>,
    ) -> Result<usize> {
        let mut buf = Vec::new();
        let mut lines = 0;

        for metrics in results {
            serde_json::to_writer(&mut buf, &MarketRecord::from(metrics))?;
            buf.push(b'\n');
            lines += 1;
        }
        if let Some(best) = best {
            serde_json::to_writer(&mut buf, &BestMarketRecord::from(best))?;
            buf.push(b'\n');
            lines += 1;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&buf).await?;
        file.flush().await?;

        info!(
            records = results.len(),
            best = best.is_some(),
            path = %self.path.display(),
            "Wrote cycle records"
        );

        Ok(lines)
    }
}
