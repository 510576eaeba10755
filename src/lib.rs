//! PrimeKG -> Neo4j bulk-import preprocessing.
//!
//! Reads the PrimeKG node table (tab-delimited) and edge table
//! (comma-delimited) in bounded batches and writes the two CSV files that
//! `neo4j-admin database import` expects.

pub mod batch;
pub mod edges;
pub mod nodes;
pub mod pipeline;
pub mod stage;
pub mod summary;
pub mod token;

pub use pipeline::{run, Config};
pub use stage::{MissingFieldPolicy, StageOptions, StageStats};
pub use summary::{RunSummary, TokenSet};
pub use token::{build_key, present, sanitize};
