use super::*;

use crate::{DecodeError, DecodeParams, GraphMapping};

use gbz::support;

use flate2::Compression;
use flate2::write::GzEncoder;

use std::fs;
use std::io::Write;

//-----------------------------------------------------------------------------

const GFA: &[u8] = b"H\tVN:Z:1.1
S\t1\tACGTACGT
S\t2\tGATTACA
S\t3\tTTTT
L\t1\t+\t2\t+\t0M
L\t2\t+\t3\t+\t0M
L\t1\t+\t3\t-\t0M
P\tref\t1+,2+,3+\t*
";

fn check_graph(graph: &Graph) {
    assert_eq!(graph.nodes(), 3, "Wrong number of nodes");
    assert_eq!(graph.edges(), 2, "Wrong number of edges");
    assert_eq!(graph.node_iter().collect::<Vec<_>>(), vec![1, 2, 3], "Wrong node identifiers");
    assert_eq!(graph.sequence(1), Some(&b"ACGTACGT"[..]), "Wrong sequence for node 1");
    assert_eq!(graph.sequence(2), Some(&b"GATTACA"[..]), "Wrong sequence for node 2");
    assert_eq!(graph.sequence(3), Some(&b"TTTT"[..]), "Wrong sequence for node 3");
    assert_eq!(graph.sequence(4), None, "Found a sequence for a missing node");
    assert!(graph.has_node(2), "Missing node 2");
    assert!(!graph.has_node(0), "Found node 0");
    assert!(graph.has_edge(1, 2), "Missing edge (1, 2)");
    assert!(graph.has_edge(2, 3), "Missing edge (2, 3)");
    assert!(!graph.has_edge(1, 3), "Found an edge between different orientations");
    assert!(!graph.has_edge(2, 1), "Found a reverse edge");
}

#[test]
fn build_graph() {
    let mut graph = Graph::new();
    assert_eq!(graph.nodes(), 0, "Empty graph has nodes");
    let nodes: [(usize, &[u8]); 3] = [(1, b"ACGTACGT"), (2, b"GATTACA"), (3, b"TTTT")];
    for (node_id, sequence) in nodes {
        let result = graph.add_node(node_id, sequence);
        assert!(result.is_ok(), "Failed to add node {}: {}", node_id, result.unwrap_err());
    }
    for (from, to) in [(1, 2), (2, 3)] {
        let result = graph.add_edge(from, to);
        assert!(result.is_ok(), "Failed to add edge ({}, {}): {}", from, to, result.unwrap_err());
    }
    check_graph(&graph);
    assert_eq!(graph.successors(1).collect::<Vec<_>>(), vec![2], "Wrong successors for node 1");
    assert_eq!(graph.successors(3).count(), 0, "Node 3 has successors");

    assert!(graph.add_node(2, b"A").is_err(), "Added a duplicate node");
    assert!(graph.add_edge(3, 4).is_err(), "Added an edge to a missing node");
    assert!(graph.add_edge(4, 1).is_err(), "Added an edge from a missing node");
}

#[test]
fn graph_from_gfa() {
    let graph = Graph::from_gfa(GFA);
    assert!(graph.is_ok(), "Failed to read the graph: {}", graph.unwrap_err());
    check_graph(&graph.unwrap());
}

#[test]
fn graph_from_gfa_variants() {
    // Windows line endings.
    let crlf: Vec<u8> = GFA.split(|&c| c == b'\n').filter(|line| !line.is_empty()).flat_map(|line| {
        let mut line = line.to_vec();
        line.extend_from_slice(b"\r\n");
        line
    }).collect();
    let graph = Graph::from_gfa(&crlf[..]);
    assert!(graph.is_ok(), "Failed to read the graph with CRLF line endings: {}", graph.unwrap_err());
    check_graph(&graph.unwrap());

    // Links before segments.
    let links_first = b"L\t1\t+\t2\t+\t0M\nS\t1\tAC\nS\t2\tGT\n";
    let graph = Graph::from_gfa(&links_first[..]);
    assert!(graph.is_ok(), "Failed to read the graph with links first: {}", graph.unwrap_err());
    assert!(graph.unwrap().has_edge(1, 2), "Missing an edge listed before the segments");
}

#[test]
fn graph_from_gfa_invalid() {
    let cases: [(&[u8], &str); 5] = [
        (b"S\tnode1\tACGT\n", "non-numerical segment name"),
        (b"S\t1\n", "segment without a sequence"),
        (b"S\t1\tA\nS\t1\tC\n", "duplicate segment"),
        (b"S\t1\tA\nL\t1\t+\t2\t+\t0M\n", "link to a missing segment"),
        (b"S\t1\tA\nS\t2\tC\nL\t1\t+\t2\n", "link with too few fields"),
    ];
    for (gfa, name) in cases {
        let graph = Graph::from_gfa(gfa);
        assert!(graph.is_err(), "Read an invalid graph: {}", name);
    }
}

#[test]
fn load_gfa_files() {
    let plain_file = serialize::temp_file_name("graph-cigar");
    fs::write(&plain_file, GFA).unwrap();
    let graph = Graph::load_gfa(&plain_file);
    assert!(graph.is_ok(), "Failed to load the GFA file: {}", graph.unwrap_err());
    check_graph(&graph.unwrap());
    fs::remove_file(&plain_file).unwrap();

    let gz_file = serialize::temp_file_name("graph-cigar");
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(GFA).unwrap();
    fs::write(&gz_file, encoder.finish().unwrap()).unwrap();
    assert!(utils::is_gzipped(&gz_file), "The file is not gzip-compressed");
    let graph = Graph::load_gfa(&gz_file);
    assert!(graph.is_ok(), "Failed to load the compressed GFA file: {}", graph.unwrap_err());
    check_graph(&graph.unwrap());
    fs::remove_file(&gz_file).unwrap();

    let missing = serialize::temp_file_name("graph-cigar");
    assert!(Graph::load_gfa(&missing).is_err(), "Loaded a missing GFA file");
}

#[test]
fn gbz_graph() {
    let filename = support::get_test_data("example.gbz");
    let graph = load_gbz(&filename);
    assert!(graph.is_ok(), "Failed to load the GBZ graph: {}", graph.unwrap_err());
    let graph = graph.unwrap();

    assert!(SequenceGraph::has_node(&graph, 13), "Missing node 13");
    assert!(!SequenceGraph::has_node(&graph, 18), "Found node 18");
    assert_eq!(SequenceGraph::sequence(&graph, 13), Some(&b"T"[..]), "Wrong sequence for node 13");
    assert_eq!(SequenceGraph::sequence(&graph, 18), None, "Found a sequence for a missing node");

    // Node 24 has successors 25 (forward) and 23 (reverse).
    assert!(graph.has_edge(24, 25), "Missing edge (24, 25)");
    assert!(!graph.has_edge(24, 23), "Found an edge between different orientations");
    assert!(!graph.has_edge(18, 19), "Found an edge from a missing node");

    let params = DecodeParams { check_edges: true, ..DecodeParams::default() };
    let result = GraphMapping::new(0, b"13[1M]", b"t", &graph, &params);
    assert!(result.is_ok(), "Failed to decode an alignment to the GBZ graph: {}", result.unwrap_err());
    assert_eq!(result.unwrap().reference(), b"T".to_vec(), "Wrong reference for node 13");

    let result = GraphMapping::new(0, b"24[1D]23[1D]", b"", &graph, &params);
    assert_eq!(result, Err(DecodeError::MissingEdge { from: 24, to: 23 }), "Decoded an alignment over a reverse edge");
}

#[test]
fn load_missing_gbz() {
    let missing = serialize::temp_file_name("graph-cigar");
    assert!(load_gbz(&missing).is_err(), "Loaded a missing GBZ file");
}

//-----------------------------------------------------------------------------
