//! Sequence graphs used as alignment targets.
//!
//! Decoding needs only read access to the graph: node sequences and, optionally, edges.
//! This is captured by trait [`SequenceGraph`], which is implemented for [`GBZ`] graphs and for the in-memory [`Graph`].
//!
//! Nodes are identified by their identifiers in the original graph, and edges are between the forward orientations of the nodes.

use crate::utils;

use std::collections::{BTreeMap, BTreeSet};
use std::io::BufRead;
use std::path::Path;

use gbz::{GBZ, Orientation};

use log::{debug, warn};

use simple_sds::serialize;

#[cfg(test)]
mod tests;

//-----------------------------------------------------------------------------

/// Read-only access to the nodes and edges of a sequence graph.
///
/// All methods take an immutable reference, so a graph can be shared between threads that decode alignments concurrently.
pub trait SequenceGraph {
    /// Returns the sequence of the node, or [`None`] if there is no such node.
    fn sequence(&self, node_id: usize) -> Option<&[u8]>;

    /// Returns `true` if the graph contains the node.
    fn has_node(&self, node_id: usize) -> bool {
        self.sequence(node_id).is_some()
    }

    /// Returns `true` if the graph contains an edge from the end of node `from` to the start of node `to`.
    fn has_edge(&self, from: usize, to: usize) -> bool;
}

impl SequenceGraph for GBZ {
    fn sequence(&self, node_id: usize) -> Option<&[u8]> {
        GBZ::sequence(self, node_id)
    }

    fn has_node(&self, node_id: usize) -> bool {
        GBZ::has_node(self, node_id)
    }

    fn has_edge(&self, from: usize, to: usize) -> bool {
        match self.successors(from, Orientation::Forward) {
            Some(mut iter) => iter.any(|(id, orientation)| id == to && orientation == Orientation::Forward),
            None => false,
        }
    }
}

/// Loads a GBZ graph from the file.
///
/// Returns an error if the file does not exist or cannot be loaded.
pub fn load_gbz<P: AsRef<Path>>(filename: P) -> Result<GBZ, String> {
    if !utils::file_exists(&filename) {
        return Err(format!("Graph file {} does not exist", filename.as_ref().display()));
    }
    serialize::load_from(&filename).map_err(|x| x.to_string())
}

//-----------------------------------------------------------------------------

/// A small in-memory sequence graph.
///
/// The graph can be built node by node or read from a GFA file.
/// Only forward-to-forward edges are stored.
///
/// # Examples
///
/// ```
/// use graph_cigar::{Graph, SequenceGraph};
///
/// let gfa = b"H\tVN:Z:1.1\nS\t1\tGAT\nS\t2\tTACA\nL\t1\t+\t2\t+\t0M\n";
/// let graph = Graph::from_gfa(&gfa[..]).unwrap();
/// assert_eq!(graph.nodes(), 2);
/// assert_eq!(graph.sequence(2), Some(&b"TACA"[..]));
/// assert!(graph.has_edge(1, 2));
/// assert!(!graph.has_edge(2, 1));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Graph {
    nodes: BTreeMap<usize, Vec<u8>>,
    edges: BTreeSet<(usize, usize)>,
}

impl Graph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of nodes.
    #[inline]
    pub fn nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of edges.
    #[inline]
    pub fn edges(&self) -> usize {
        self.edges.len()
    }

    /// Returns an iterator over the node identifiers in increasing order.
    pub fn node_iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.nodes.keys().copied()
    }

    /// Returns an iterator over the successors of the node.
    pub fn successors(&self, node_id: usize) -> impl Iterator<Item = usize> + '_ {
        self.edges.range((node_id, 0)..=(node_id, usize::MAX)).map(|&(_, to)| to)
    }

    /// Adds a node with the given sequence.
    ///
    /// Returns an error if the node already exists.
    pub fn add_node(&mut self, node_id: usize, sequence: &[u8]) -> Result<(), String> {
        if self.nodes.contains_key(&node_id) {
            return Err(format!("Duplicate node {}", node_id));
        }
        self.nodes.insert(node_id, sequence.to_vec());
        Ok(())
    }

    /// Adds an edge from the end of node `from` to the start of node `to`.
    ///
    /// Returns an error if either node does not exist.
    pub fn add_edge(&mut self, from: usize, to: usize) -> Result<(), String> {
        for node_id in [from, to] {
            if !self.nodes.contains_key(&node_id) {
                return Err(format!("Edge ({}, {}) refers to a missing node {}", from, to, node_id));
            }
        }
        self.edges.insert((from, to));
        Ok(())
    }

    /// Reads the graph from GFA lines.
    ///
    /// Segment names must be integers, which are used as node identifiers.
    /// Only segment (`S`) and link (`L`) lines are used, and links that are not between forward orientations are skipped.
    /// Links may appear before the segments they refer to.
    ///
    /// Returns an error if the input cannot be read or if a line is invalid.
    pub fn from_gfa<R: BufRead>(reader: R) -> Result<Self, String> {
        let mut result = Graph::new();
        let mut links: Vec<(usize, usize, usize)> = Vec::new();
        let mut skipped = 0;

        for (i, line) in reader.split(b'\n').enumerate() {
            let line_num = i + 1;
            let line = line.map_err(|x| format!("Failed to read line {}: {}", line_num, x))?;
            let line = line.strip_suffix(b"\r").unwrap_or(&line[..]);
            let fields: Vec<&[u8]> = line.split(|&c| c == b'\t').collect();
            match fields[0] {
                b"S" => {
                    if fields.len() < 3 {
                        return Err(format!("Segment line {} has fewer than 3 fields", line_num));
                    }
                    let node_id = Self::parse_segment_name(fields[1], line_num)?;
                    result.add_node(node_id, fields[2]).map_err(|x| format!("Line {}: {}", line_num, x))?;
                },
                b"L" => {
                    if fields.len() < 5 {
                        return Err(format!("Link line {} has fewer than 5 fields", line_num));
                    }
                    let from = Self::parse_segment_name(fields[1], line_num)?;
                    let to = Self::parse_segment_name(fields[3], line_num)?;
                    if fields[2] == b"+" && fields[4] == b"+" {
                        links.push((from, to, line_num));
                    } else {
                        skipped += 1;
                    }
                },
                _ => {},
            }
        }

        for (from, to, line_num) in links {
            result.add_edge(from, to).map_err(|x| format!("Line {}: {}", line_num, x))?;
        }
        if skipped > 0 {
            warn!("Skipped {} links that are not between forward orientations", skipped);
        }
        debug!("Read a graph with {} nodes and {} edges", result.nodes(), result.edges());

        Ok(result)
    }

    /// Reads the graph from a GFA file, which may be gzip-compressed.
    ///
    /// See [`Graph::from_gfa`] for details.
    pub fn load_gfa<P: AsRef<Path>>(filename: P) -> Result<Self, String> {
        let reader = utils::open_file(&filename)?;
        Self::from_gfa(reader).map_err(|x| format!("{}: {}", filename.as_ref().display(), x))
    }

    fn parse_segment_name(field: &[u8], line_num: usize) -> Result<usize, String> {
        utils::parse_usize(field).ok_or_else(|| {
            format!("Line {}: only numerical segment names are supported: {}", line_num, String::from_utf8_lossy(field))
        })
    }
}

impl SequenceGraph for Graph {
    fn sequence(&self, node_id: usize) -> Option<&[u8]> {
        self.nodes.get(&node_id).map(|sequence| sequence.as_slice())
    }

    fn has_edge(&self, from: usize, to: usize) -> bool {
        self.edges.contains(&(from, to))
    }
}

//-----------------------------------------------------------------------------
