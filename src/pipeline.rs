use anyhow::{Context, Result};
use indicatif::ProgressBar;
use std::fs::{create_dir_all, File};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::batch::open_source;
use crate::edges::{edge_reader, transform_edges};
use crate::nodes::{node_reader, transform_nodes};
use crate::stage::{stage_progress, StageOptions};
use crate::summary::{RunSummary, StageSummary, TokenSet};

pub const DEFAULT_NODES_OUT: &str = "primekg_nodes_neo.csv";
pub const DEFAULT_RELS_OUT: &str = "primekg_rels_neo.csv";

#[derive(Debug, Clone)]
pub struct Config {
    pub nodes_path: PathBuf,
    pub edges_path: PathBuf,
    pub output_dir: PathBuf,
    pub nodes_out: String,
    pub rels_out: String,
    pub stage: StageOptions,
    pub show_progress: bool,
}

impl Config {
    pub fn new(nodes_path: impl Into<PathBuf>, edges_path: impl Into<PathBuf>) -> Self {
        Self {
            nodes_path: nodes_path.into(),
            edges_path: edges_path.into(),
            output_dir: PathBuf::from("."),
            nodes_out: DEFAULT_NODES_OUT.to_string(),
            rels_out: DEFAULT_RELS_OUT.to_string(),
            stage: StageOptions::default(),
            show_progress: false,
        }
    }

    pub fn nodes_output(&self) -> PathBuf {
        self.output_dir.join(&self.nodes_out)
    }

    pub fn rels_output(&self) -> PathBuf {
        self.output_dir.join(&self.rels_out)
    }
}

// ====== MEMORY MONITORING ======
fn get_memory_usage() -> String {
    if let Ok(status) = std::fs::read_to_string("/proc/self/status") {
        for line in status.lines() {
            if line.starts_with("VmRSS:") {
                return line.to_string();
            }
        }
    }
    "Memory info unavailable".to_string()
}

fn progress_for(config: &Config, what: &str) -> Result<ProgressBar> {
    if config.show_progress {
        stage_progress(what)
    } else {
        Ok(ProgressBar::hidden())
    }
}

fn create_output(path: &Path) -> Result<File> {
    File::create(path).with_context(|| format!("failed to create {}", path.display()))
}

/// Convert both source files. Both inputs are opened and their headers
/// checked before any output file is created.
pub fn run(config: &Config) -> Result<RunSummary> {
    let batch_size = config.stage.batch_size;
    let nodes_in = node_reader(open_source(&config.nodes_path)?, batch_size)
        .with_context(|| format!("invalid node source {}", config.nodes_path.display()))?;
    let edges_in = edge_reader(open_source(&config.edges_path)?, batch_size)
        .with_context(|| format!("invalid edge source {}", config.edges_path.display()))?;

    create_dir_all(&config.output_dir)?;
    info!("Output directory: {}", config.output_dir.display());

    let mut labels = TokenSet::new();
    let nodes_path = config.nodes_output();
    let progress = progress_for(config, "nodes")?;
    let node_stats = {
        let out = create_output(&nodes_path)?;
        transform_nodes(nodes_in, out, &config.stage, &mut labels, &progress)
            .with_context(|| format!("node stage failed on {}", config.nodes_path.display()))?
    };
    progress.finish_with_message("Nodes processing complete");
    info!("Memory after nodes: {}", get_memory_usage());

    let mut types = TokenSet::new();
    let rels_path = config.rels_output();
    let progress = progress_for(config, "rels")?;
    let edge_stats = {
        let out = create_output(&rels_path)?;
        transform_edges(edges_in, out, &config.stage, &mut types, &progress)
            .with_context(|| format!("edge stage failed on {}", config.edges_path.display()))?
    };
    progress.finish_with_message("Relationships processing complete");
    info!("Memory after relationships: {}", get_memory_usage());

    Ok(RunSummary {
        nodes: StageSummary {
            output: nodes_path,
            stats: node_stats,
            tokens: labels,
        },
        rels: StageSummary {
            output: rels_path,
            stats: edge_stats,
            tokens: types,
        },
    })
}
