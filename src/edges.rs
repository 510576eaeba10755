//! Edge stage: PrimeKG edge table to the neo4j-admin relationship file.
//!
//! `:TYPE` is the sanitized relation; the raw `relation` and
//! `display_relation` stay on the relationship as properties.

use anyhow::Result;
use indicatif::ProgressBar;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use tracing::{debug, info, warn};

use crate::batch::{output_writer, BatchReader, Row};
use crate::stage::{parse_index, StageOptions, StageStats};
use crate::summary::TokenSet;
use crate::token::{present, sanitize};

pub const EDGE_DELIMITER: u8 = b',';

pub const EDGE_COLUMNS: [&str; 4] = ["x_index", "y_index", "relation", "display_relation"];

pub const EDGE_HEADER: [&str; 5] = [
    ":START_ID",
    ":END_ID",
    ":TYPE",
    "relation",
    "display_relation",
];

#[derive(Debug, Deserialize)]
pub struct RawEdge {
    x_index: Option<String>,
    y_index: Option<String>,
    relation: Option<String>,
    display_relation: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EdgeRecord<'a> {
    pub start_id: i64,
    pub end_id: i64,
    pub rel_type: String,
    pub relation: &'a str,
    pub display_relation: Option<&'a str>,
}

fn to_record<'a>(row: &'a Row<RawEdge>, opts: &StageOptions) -> Result<Option<EdgeRecord<'a>>> {
    let raw = &row.value;
    let x = present(raw.x_index.as_deref());
    let y = present(raw.y_index.as_deref());
    let relation = present(raw.relation.as_deref());

    let (x, y, relation) = match (x, y, relation) {
        (Some(x), Some(y), Some(relation)) => (x, y, relation),
        (x, y, _) => {
            let column = match (x, y) {
                (None, _) => "x_index",
                (_, None) => "y_index",
                _ => "relation",
            };
            opts.on_missing.reject_row(column, row.line)?;
            return Ok(None);
        }
    };

    Ok(Some(EdgeRecord {
        start_id: parse_index(x, "x_index", row.line)?,
        end_id: parse_index(y, "y_index", row.line)?,
        rel_type: sanitize(Some(relation)),
        relation,
        display_relation: present(raw.display_relation.as_deref()),
    }))
}

/// Stream edge rows from `input` to `output` in batches, recording every
/// distinct relationship type into `types`.
pub fn transform_edges<R: Read, W: Write>(
    input: BatchReader<R>,
    output: W,
    opts: &StageOptions,
    types: &mut TokenSet,
    progress: &ProgressBar,
) -> Result<StageStats> {
    let mut reader = input;
    info!("Processing relationships with batch size {}", reader.batch_size());

    let mut writer = output_writer(output);
    writer.write_record(EDGE_HEADER)?;

    let mut stats = StageStats::default();
    let mut batch: Vec<Row<RawEdge>> = Vec::with_capacity(reader.batch_size().min(65_536));

    while reader.next_batch(&mut batch)? {
        for row in &batch {
            stats.rows_read += 1;
            let Some(record) = to_record(row, opts)? else {
                stats.rows_dropped += 1;
                continue;
            };
            writer.serialize(&record)?;
            types.insert(record.rel_type);
            stats.rows_written += 1;
        }
        writer.flush()?;
        stats.batches += 1;
        progress.inc(batch.len() as u64);
        debug!("Flushed relationship batch {} ({} rows)", stats.batches, batch.len());
    }
    writer.flush()?;

    if stats.rows_written == 0 {
        warn!("No relationship rows were written");
    }
    info!(
        "Processed {} relationships ({} dropped) into {} batches",
        stats.rows_written, stats.rows_dropped, stats.batches
    );
    Ok(stats)
}

/// Open an edge source for batched reading.
pub fn edge_reader<R: Read>(input: R, batch_size: usize) -> Result<BatchReader<R>> {
    BatchReader::new(input, EDGE_DELIMITER, batch_size, &EDGE_COLUMNS)
}
