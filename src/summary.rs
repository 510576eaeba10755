use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::stage::StageStats;

/// Distinct sanitized tokens seen so far by one stage.
pub type TokenSet = BTreeSet<String>;

#[derive(Debug, Clone, Serialize)]
pub struct StageSummary {
    pub output: PathBuf,
    #[serde(flatten)]
    pub stats: StageStats,
    pub tokens: TokenSet,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub nodes: StageSummary,
    pub rels: StageSummary,
}

impl RunSummary {
    pub fn distinct_labels(&self) -> usize {
        self.nodes.tokens.len()
    }

    pub fn distinct_types(&self) -> usize {
        self.rels.tokens.len()
    }

    pub fn log(&self) {
        info!(
            "Wrote {} and {}",
            self.nodes.output.display(),
            self.rels.output.display()
        );
        info!("Unique base node labels (node_type): {}", self.distinct_labels());
        info!("Unique Neo4j relationship types: {}", self.distinct_types());
        info!(
            "  Nodes written: {} (dropped {}, {} batches)",
            self.nodes.stats.rows_written, self.nodes.stats.rows_dropped, self.nodes.stats.batches
        );
        info!(
            "  Relationships written: {} (dropped {}, {} batches)",
            self.rels.stats.rows_written, self.rels.stats.rows_dropped, self.rels.stats.batches
        );
        info!("All nodes also have :Node label and 'primekg_key' for easy matching.");
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }
}
