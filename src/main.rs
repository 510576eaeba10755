use anyhow::Result;
use clap::builder::RangedU64ValueParser;
use clap::Parser;
use primekg_import::pipeline::{DEFAULT_NODES_OUT, DEFAULT_RELS_OUT};
use primekg_import::stage::DEFAULT_BATCH_SIZE;
use primekg_import::{run, Config, MissingFieldPolicy, StageOptions};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "primekg_import")]
#[command(about = "PrimeKG -> Neo4j bulk import preprocessing")]
struct Cli {
    /// PrimeKG node table (tab-delimited, optionally .gz)
    #[arg(long, default_value = "nodes.tab")]
    nodes: PathBuf,

    /// PrimeKG edge table (comma-delimited, optionally .gz)
    #[arg(long, default_value = "edges.csv")]
    edges: PathBuf,

    /// Directory the import files are written to
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// File name of the node import file
    #[arg(long, default_value = DEFAULT_NODES_OUT)]
    nodes_out: String,

    /// File name of the relationship import file
    #[arg(long, default_value = DEFAULT_RELS_OUT)]
    rels_out: String,

    /// Rows held in memory per batch
    #[arg(
        short,
        long,
        default_value_t = DEFAULT_BATCH_SIZE,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    batch_size: usize,

    /// Rows missing a required field are dropped or abort the run
    #[arg(long, value_enum, default_value_t = MissingFieldPolicy::Drop)]
    on_missing: MissingFieldPolicy,

    /// Also write the run summary as JSON to this path
    #[arg(long)]
    summary_json: Option<PathBuf>,

    /// Disable progress spinners
    #[arg(long)]
    no_progress: bool,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let args = Cli::parse();

    let config = Config {
        nodes_path: args.nodes,
        edges_path: args.edges,
        output_dir: args.output_dir,
        nodes_out: args.nodes_out,
        rels_out: args.rels_out,
        stage: StageOptions {
            batch_size: args.batch_size,
            on_missing: args.on_missing,
        },
        show_progress: !args.no_progress,
    };
    info!("Batch size: {} rows per batch", config.stage.batch_size);

    let summary = run(&config)?;
    summary.log();

    if let Some(path) = &args.summary_json {
        summary.write_json(path)?;
        info!("Summary written to {}", path.display());
    }

    Ok(())
}
