//! Pieces shared by the node and edge stages.

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::time::Duration;

/// Batch size used when none is given: one million rows.
pub const DEFAULT_BATCH_SIZE: usize = 1_000_000;

/// What to do with a row that lacks a required field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum MissingFieldPolicy {
    /// Leave the row out of the output and keep going.
    #[default]
    Drop,
    /// Abort the run.
    Fail,
}

#[derive(Debug, Clone, Copy)]
pub struct StageOptions {
    pub batch_size: usize,
    pub on_missing: MissingFieldPolicy,
}

impl Default for StageOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            on_missing: MissingFieldPolicy::Drop,
        }
    }
}

// ====== STAGE STATISTICS ======
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StageStats {
    pub rows_read: u64,
    pub rows_written: u64,
    pub rows_dropped: u64,
    pub batches: u64,
}

impl MissingFieldPolicy {
    /// Report a row whose required `column` is absent: an error under
    /// `Fail`, a debug log under `Drop` after which the caller skips it.
    pub fn reject_row(self, column: &str, line: u64) -> Result<()> {
        match self {
            MissingFieldPolicy::Drop => {
                tracing::debug!("dropping line {}: `{}` is missing", line, column);
                Ok(())
            }
            MissingFieldPolicy::Fail => {
                bail!("line {}: required field `{}` is missing", line, column)
            }
        }
    }
}

/// Parse a present index column as a 64-bit integer.
pub fn parse_index(raw: &str, column: &str, line: u64) -> Result<i64> {
    raw.trim()
        .parse()
        .with_context(|| format!("line {}: `{}` is not an integer: {:?}", line, column, raw))
}

/// Spinner counting rows for one stage.
pub fn stage_progress(what: &str) -> Result<ProgressBar> {
    let progress = ProgressBar::new_spinner();
    progress.set_style(ProgressStyle::with_template(
        "[{elapsed_precise}] {spinner} {pos:>10} rows | {msg}",
    )?);
    progress.set_message(format!("Processing/writing PrimeKG {}...", what));
    progress.enable_steady_tick(Duration::from_millis(200));
    Ok(progress)
}
