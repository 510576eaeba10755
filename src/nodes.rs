//! Node stage: PrimeKG node table to the neo4j-admin node file.
//!
//! `node_index` becomes `node_index:ID` (the import-internal id). `node_id`
//! and `node_source` are kept for lookups, `primekg_key` for matching from
//! spreadsheets, and every node gets the generic `:Node` label.

use anyhow::Result;
use indicatif::ProgressBar;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use tracing::{debug, info, warn};

use crate::batch::{output_writer, BatchReader, Row};
use crate::stage::{parse_index, StageOptions, StageStats};
use crate::summary::TokenSet;
use crate::token::{build_key, present, sanitize};

/// Node sources are tab-delimited.
pub const NODE_DELIMITER: u8 = b'\t';

pub const NODE_COLUMNS: [&str; 5] = [
    "node_index",
    "node_id",
    "node_source",
    "node_type",
    "node_name",
];

pub const NODE_HEADER: [&str; 7] = [
    "node_index:ID",
    "node_id",
    "node_source",
    "node_type",
    "node_name",
    "primekg_key",
    ":LABEL",
];

/// Label every node carries next to its type label.
pub const GENERIC_LABEL: &str = "Node";

#[derive(Debug, Deserialize)]
pub struct RawNode {
    node_index: Option<String>,
    node_id: Option<String>,
    node_source: Option<String>,
    node_type: Option<String>,
    node_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NodeRecord<'a> {
    pub node_index: i64,
    pub node_id: &'a str,
    pub node_source: Option<&'a str>,
    pub node_type: &'a str,
    pub node_name: Option<&'a str>,
    pub primekg_key: String,
    pub label: String,
}

/// Turn one source row into an output record, or `None` if it lacks a
/// required field and the policy says to drop it.
fn to_record<'a>(
    row: &'a Row<RawNode>,
    opts: &StageOptions,
) -> Result<Option<(NodeRecord<'a>, String)>> {
    let raw = &row.value;
    let index = present(raw.node_index.as_deref());
    let id = present(raw.node_id.as_deref());
    let node_type = present(raw.node_type.as_deref());

    let (index, id, node_type) = match (index, id, node_type) {
        (Some(index), Some(id), Some(node_type)) => (index, id, node_type),
        (index, id, _) => {
            let column = if index.is_none() {
                "node_index"
            } else if id.is_none() {
                "node_id"
            } else {
                "node_type"
            };
            opts.on_missing.reject_row(column, row.line)?;
            return Ok(None);
        }
    };

    let node_source = present(raw.node_source.as_deref());
    let base_label = sanitize(Some(node_type));
    let record = NodeRecord {
        node_index: parse_index(index, "node_index", row.line)?,
        node_id: id,
        node_source,
        node_type,
        node_name: present(raw.node_name.as_deref()),
        primekg_key: build_key(node_source, Some(id)),
        label: format!("{};{}", base_label, GENERIC_LABEL),
    };
    Ok(Some((record, base_label)))
}

/// Stream node rows from `input` to `output` in batches, recording every
/// distinct base label into `labels`.
pub fn transform_nodes<R: Read, W: Write>(
    input: BatchReader<R>,
    output: W,
    opts: &StageOptions,
    labels: &mut TokenSet,
    progress: &ProgressBar,
) -> Result<StageStats> {
    let mut reader = input;
    info!("Processing nodes with batch size {}", reader.batch_size());

    let mut writer = output_writer(output);
    writer.write_record(NODE_HEADER)?;

    let mut stats = StageStats::default();
    let mut batch: Vec<Row<RawNode>> = Vec::with_capacity(reader.batch_size().min(65_536));

    while reader.next_batch(&mut batch)? {
        for row in &batch {
            stats.rows_read += 1;
            match to_record(row, opts)? {
                Some((record, base_label)) => {
                    writer.serialize(&record)?;
                    labels.insert(base_label);
                    stats.rows_written += 1;
                }
                None => stats.rows_dropped += 1,
            }
        }
        writer.flush()?;
        stats.batches += 1;
        progress.inc(batch.len() as u64);
        debug!("Flushed node batch {} ({} rows)", stats.batches, batch.len());
    }
    writer.flush()?;

    if stats.rows_written == 0 {
        warn!("No node rows were written");
    }
    info!(
        "Processed {} nodes ({} dropped) into {} batches",
        stats.rows_written, stats.rows_dropped, stats.batches
    );
    Ok(stats)
}

/// Open a node source for batched reading.
pub fn node_reader<R: Read>(input: R, batch_size: usize) -> Result<BatchReader<R>> {
    BatchReader::new(input, NODE_DELIMITER, batch_size, &NODE_COLUMNS)
}
