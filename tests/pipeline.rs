use flate2::write::GzEncoder;
use flate2::Compression;
use primekg_import::{run, Config, MissingFieldPolicy, StageOptions};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

const NODES_TAB: &str = "node_index\tnode_id\tnode_type\tnode_name\tnode_source\n\
    0\t9796\tgene/protein\tPHYHIP\tNCBI\n\
    1\t7918\tgene/protein\tGPANK1\tNCBI\n\
    2\tDB01050\tdrug\tIbuprofen\tDrugBank\n\
    3\tSBO:0000185\tbiological_process\tkinetic\tSBO\n\
    4\t12\t\tno type\tMONDO\n\
    5\t5\t123abc\tdigits\t\n";

const EDGES_CSV: &str = "relation,display_relation,x_index,x_id,x_type,y_index,y_id\n\
    protein_protein,ppi,0,9796,gene/protein,1,7918\n\
    drug_protein,target,2,DB01050,drug,0,9796\n\
    drug_protein,target,2,DB01050,drug,1,7918\n\
    ,unknown,3,x,x,2,y\n\
    bioprocess_protein,interacts with,3,x,x,0,9796\n";

fn write_inputs(dir: &Path) -> Config {
    let nodes = dir.join("nodes.tab");
    let edges = dir.join("edges.csv");
    fs::write(&nodes, NODES_TAB).unwrap();
    fs::write(&edges, EDGES_CSV).unwrap();

    let mut config = Config::new(nodes, edges);
    config.output_dir = dir.join("out");
    config
}

fn outputs(config: &Config) -> (String, String) {
    (
        fs::read_to_string(config.nodes_output()).unwrap(),
        fs::read_to_string(config.rels_output()).unwrap(),
    )
}

#[test]
fn converts_both_tables() {
    let dir = TempDir::new().unwrap();
    let config = write_inputs(dir.path());

    let summary = run(&config).unwrap();
    let (nodes, rels) = outputs(&config);

    assert_eq!(
        nodes,
        "node_index:ID,node_id,node_source,node_type,node_name,primekg_key,:LABEL\n\
         0,9796,NCBI,gene/protein,PHYHIP,NCBI:9796,gene_protein;Node\n\
         1,7918,NCBI,gene/protein,GPANK1,NCBI:7918,gene_protein;Node\n\
         2,DB01050,DrugBank,drug,Ibuprofen,DrugBank:DB01050,drug;Node\n\
         3,SBO:0000185,SBO,biological_process,kinetic,SBO:0000185,biological_process;Node\n\
         5,5,,123abc,digits,5,T_123abc;Node\n"
    );
    assert_eq!(
        rels,
        ":START_ID,:END_ID,:TYPE,relation,display_relation\n\
         0,1,protein_protein,protein_protein,ppi\n\
         2,0,drug_protein,drug_protein,target\n\
         2,1,drug_protein,drug_protein,target\n\
         3,0,bioprocess_protein,bioprocess_protein,interacts with\n"
    );

    assert_eq!(summary.distinct_labels(), 4);
    assert_eq!(summary.distinct_types(), 3);
    assert_eq!(summary.nodes.stats.rows_dropped, 1);
    assert_eq!(summary.rels.stats.rows_written, 4);
}

#[test]
fn reruns_are_byte_identical() {
    let dir = TempDir::new().unwrap();
    let config = write_inputs(dir.path());

    run(&config).unwrap();
    let first = outputs(&config);
    run(&config).unwrap();
    assert_eq!(outputs(&config), first);
}

#[test]
fn batch_size_only_changes_batch_count() {
    let dir = TempDir::new().unwrap();
    let mut config = write_inputs(dir.path());

    config.stage.batch_size = 100_000;
    let big = run(&config).unwrap();
    let big_out = outputs(&config);

    config.stage.batch_size = 1;
    let small = run(&config).unwrap();

    assert_eq!(outputs(&config), big_out);
    assert_eq!(big.nodes.tokens, small.nodes.tokens);
    assert_eq!(big.rels.tokens, small.rels.tokens);
    assert_eq!(big.nodes.stats.batches, 1);
    assert_eq!(small.nodes.stats.batches, 6);
}

#[test]
fn missing_edge_source_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let mut config = write_inputs(dir.path());
    config.edges_path = dir.path().join("does_not_exist.csv");

    assert!(run(&config).is_err());
    assert!(!config.nodes_output().exists());
    assert!(!config.rels_output().exists());
}

#[test]
fn gzipped_sources_are_read_transparently() {
    let dir = TempDir::new().unwrap();
    let plain = write_inputs(dir.path());
    run(&plain).unwrap();
    let expected = outputs(&plain);

    for (name, data) in [("nodes.tab.gz", NODES_TAB), ("edges.csv.gz", EDGES_CSV)] {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data.as_bytes()).unwrap();
        fs::write(dir.path().join(name), encoder.finish().unwrap()).unwrap();
    }
    let mut gz = Config::new(dir.path().join("nodes.tab.gz"), dir.path().join("edges.csv.gz"));
    gz.output_dir = dir.path().join("out_gz");
    run(&gz).unwrap();

    assert_eq!(outputs(&gz), expected);
}

#[test]
fn fail_policy_keeps_the_partial_output() {
    let dir = TempDir::new().unwrap();
    let mut config = write_inputs(dir.path());
    config.stage = StageOptions {
        batch_size: 2,
        on_missing: MissingFieldPolicy::Fail,
    };

    let err = run(&config).unwrap_err();
    assert!(format!("{:#}", err).contains("node_type"));

    // Batches flushed before the bad row stay on disk; no edge file yet.
    let nodes = fs::read_to_string(config.nodes_output()).unwrap();
    assert_eq!(nodes.lines().count(), 5);
    assert!(!config.rels_output().exists());
}

#[test]
fn summary_json_round_trips_counts() {
    let dir = TempDir::new().unwrap();
    let config = write_inputs(dir.path());
    let summary = run(&config).unwrap();

    let path = dir.path().join("summary.json");
    summary.write_json(&path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();

    assert_eq!(json["nodes"]["rows_written"], 5);
    assert_eq!(json["rels"]["tokens"].as_array().unwrap().len(), 3);
}

#[test]
fn edge_failure_keeps_the_finished_node_file() {
    let dir = TempDir::new().unwrap();
    let good = write_inputs(dir.path());
    run(&good).unwrap();
    let expected_nodes = fs::read_to_string(good.nodes_output()).unwrap();

    let edges = dir.path().join("bad_edges.csv");
    fs::write(&edges, "x_index,y_index,relation,display_relation\nabc,1,drug_drug,d\n").unwrap();
    let mut config = Config::new(good.nodes_path.clone(), edges);
    config.output_dir = dir.path().join("out_bad");

    assert!(run(&config).is_err());
    assert_eq!(fs::read_to_string(config.nodes_output()).unwrap(), expected_nodes);
    let rels = fs::read_to_string(config.rels_output()).unwrap();
    assert_eq!(rels, ":START_ID,:END_ID,:TYPE,relation,display_relation\n");
}
