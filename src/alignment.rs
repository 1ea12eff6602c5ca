//! Structures for representing sequence to graph alignments.
//!
//! Alignments are decoded from a CIGAR-like encoding.
//! A linear encoding such as `5M2I3M` is a sequence of runs, each consisting of a positive length and an operation symbol.
//! See [`OpType`] for the supported operations.
//! A graph encoding such as `0[4M]1[2M1X]` concatenates node segments of the form `node_id[encoding]` in path order.
//!
//! The alignment is built bottom-up:
//!
//! * [`Operation`]: A single run together with the query and reference bases it consumes.
//! * [`Mapping`]: A list of operations aligning a query sequence to a linear reference sequence.
//! * [`NodeMapping`]: A mapping to the sequence of a graph node.
//! * [`GraphMapping`]: A list of node mappings aligning a query sequence to a path in the graph.
//!
//! All structures are validated and fully built at construction.
//! The graph is only borrowed for the duration of the constructor call.
//! Decoding is exact: the structures reproduce the query sequence, the aligned reference sequence, and the encoding.

use crate::error::DecodeError;
use crate::graph::SequenceGraph;

use std::fmt::{self, Display};
use std::ops::Index;
use std::slice;

use log::debug;

pub mod mapping;
pub mod operation;

pub use mapping::{Mapping, NodeMapping};
pub use operation::{Operation, OpType};


//-----------------------------------------------------------------------------

/// Parameters for decoding alignments.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodeParams {
    /// Verify the bases of mismatch and missing base operations.
    ///
    /// If `true`, every position of a mismatch must have different query and reference bases, and every position of a missing base operation must have `N` in the query or the reference.
    /// If `false`, the operation symbol is trusted and the bases are not compared.
    /// Match operations are always verified.
    pub verify_mismatches: bool,

    /// Require an edge between consecutive nodes on the path.
    pub check_edges: bool,
}

impl DecodeParams {
    /// Default value for `verify_mismatches`.
    pub const VERIFY_MISMATCHES: bool = true;

    /// Default value for `check_edges`.
    pub const CHECK_EDGES: bool = false;
}

impl Default for DecodeParams {
    fn default() -> Self {
        DecodeParams {
            verify_mismatches: Self::VERIFY_MISMATCHES,
            check_edges: Self::CHECK_EDGES,
        }
    }
}

//-----------------------------------------------------------------------------

/// An alignment of a query sequence to a path in a graph.
///
/// The alignment consists of a [`NodeMapping`] for each node on the path.
/// The first mapping starts at the given offset in the first node, and the remaining mappings start at the beginning of their nodes.
/// Every query base is aligned by exactly one node mapping.
///
/// # Examples
///
/// ```
/// use graph_cigar::{DecodeParams, Graph, GraphMapping};
///
/// let mut graph = Graph::new();
/// graph.add_node(1, b"ACGT").unwrap();
/// graph.add_node(2, b"GATTACA").unwrap();
/// graph.add_edge(1, 2).unwrap();
/// let params = DecodeParams::default();
///
/// let alignment = GraphMapping::new(2, b"1[2M]2[3M2I]", b"GTGATCC", &graph, &params).unwrap();
/// assert_eq!(alignment.len(), 2);
/// assert_eq!(alignment.path(), vec![1, 2]);
/// assert_eq!(alignment.query(), b"GTGATCC");
/// assert_eq!(alignment.reference(), b"GTGAT");
/// assert_eq!(alignment.query_span(), 7);
/// assert_eq!(alignment.reference_span(), 5);
/// assert_eq!(alignment.to_string(), "1[2M]2[3M2I]");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphMapping {
    reference_start: usize,
    node_mappings: Vec<NodeMapping>,
}

impl GraphMapping {
    /// Decodes an alignment from a graph encoding.
    ///
    /// # Arguments
    ///
    /// * `reference_start`: Offset of the alignment in the first node.
    /// * `graph_encoding`: Node segments of the form `node_id[encoding]` in path order.
    /// * `query`: The entire query sequence.
    /// * `graph`: Graph containing the nodes.
    /// * `params`: Decoding parameters.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::MalformedEncoding`] if the encoding cannot be parsed or the query length it implies does not fit in `usize`.
    /// Returns [`DecodeError::UnknownNode`] if a segment refers to a node that is not in the graph.
    /// Returns [`DecodeError::MissingEdge`] if edges are checked and consecutive nodes are not connected.
    /// Returns [`DecodeError::ConsumedLengthMismatch`] if the segments do not consume exactly the query sequence.
    /// Passes through any errors from [`NodeMapping::new`].
    pub fn new<G: SequenceGraph + ?Sized>(
        reference_start: usize, graph_encoding: &[u8], query: &[u8],
        graph: &G, params: &DecodeParams
    ) -> Result<Self, DecodeError> {
        let result = Self::decode(reference_start, graph_encoding, query, graph, params);
        if let Err(err) = &result {
            debug!("Rejected alignment {}: {}", String::from_utf8_lossy(graph_encoding), err);
        }
        result
    }

    fn decode<G: SequenceGraph + ?Sized>(
        reference_start: usize, graph_encoding: &[u8], query: &[u8],
        graph: &G, params: &DecodeParams
    ) -> Result<Self, DecodeError> {
        let segments = Self::parse_segments(graph_encoding)?;

        // Check the path and determine how the query is split between the nodes.
        let mut query_lens = Vec::with_capacity(segments.len());
        let mut prev: Option<usize> = None;
        for (node_id, encoding) in segments.iter() {
            if !graph.has_node(*node_id) {
                return Err(DecodeError::UnknownNode(*node_id));
            }
            if let Some(from) = prev {
                if params.check_edges && !graph.has_edge(from, *node_id) {
                    return Err(DecodeError::MissingEdge { from, to: *node_id });
                }
            }
            prev = Some(*node_id);
            let runs = OpType::parse_runs(encoding)?;
            let len = runs.iter()
                .filter(|(op_type, _)| op_type.consumes_query())
                .try_fold(0usize, |acc, (_, len)| acc.checked_add(*len))
                .ok_or_else(|| DecodeError::malformed(graph_encoding, format!("query length for node {} overflows", node_id)))?;
            query_lens.push(len);
        }
        let consumed = query_lens.iter().try_fold(0usize, |acc, len| acc.checked_add(*len))
            .ok_or_else(|| DecodeError::malformed(graph_encoding, "total query length overflows"))?;
        if consumed != query.len() {
            return Err(DecodeError::ConsumedLengthMismatch { consumed, expected: query.len() });
        }

        let mut node_mappings = Vec::with_capacity(segments.len());
        let mut query_offset = 0;
        for (i, ((node_id, encoding), query_len)) in segments.into_iter().zip(query_lens).enumerate() {
            let node_start = if i == 0 { reference_start } else { 0 };
            let node_query = &query[query_offset..query_offset + query_len];
            node_mappings.push(NodeMapping::new(node_id, node_start, encoding, node_query, graph, params)?);
            query_offset += query_len;
        }

        Ok(GraphMapping { reference_start, node_mappings })
    }

    /// Splits a graph encoding into `(node_id, encoding)` segments.
    ///
    /// The encodings of the segments are not validated.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::MalformedEncoding`] if the encoding is empty or does not consist of node segments.
    pub fn parse_segments(graph_encoding: &[u8]) -> Result<Vec<(usize, &[u8])>, DecodeError> {
        if graph_encoding.is_empty() {
            return Err(DecodeError::malformed(graph_encoding, "empty encoding"));
        }
        let mut result = Vec::new();
        let mut offset = 0;
        while offset < graph_encoding.len() {
            let (node_id, encoding, next) = mapping::parse_segment(graph_encoding, offset)?;
            result.push((node_id, encoding));
            offset = next;
        }
        Ok(result)
    }

    /// Returns the offset of the alignment in the first node.
    #[inline]
    pub fn reference_start(&self) -> usize {
        self.reference_start
    }

    /// Returns the number of nodes on the path.
    #[inline]
    pub fn len(&self) -> usize {
        self.node_mappings.len()
    }

    /// Returns `true` if the path is empty.
    ///
    /// This is always `false` for a decoded alignment.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.node_mappings.is_empty()
    }

    /// Returns the node mappings in path order.
    #[inline]
    pub fn node_mappings(&self) -> &[NodeMapping] {
        &self.node_mappings
    }

    /// Returns an iterator over the node mappings in path order.
    pub fn iter(&self) -> slice::Iter<'_, NodeMapping> {
        self.node_mappings.iter()
    }

    /// Returns the node identifiers on the path.
    pub fn path(&self) -> Vec<usize> {
        self.node_mappings.iter().map(|node| node.node_id()).collect()
    }

    /// Returns the query sequence.
    pub fn query(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(self.query_span());
        for node in self.node_mappings.iter() {
            result.extend(node.query());
        }
        result
    }

    /// Returns the aligned reference sequence along the path.
    pub fn reference(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(self.reference_span());
        for node in self.node_mappings.iter() {
            result.extend(node.reference());
        }
        result
    }

    /// Returns the number of query positions consumed by the alignment.
    pub fn query_span(&self) -> usize {
        self.node_mappings.iter().map(|node| node.query_span()).sum()
    }

    /// Returns the number of reference positions consumed by the alignment.
    pub fn reference_span(&self) -> usize {
        self.node_mappings.iter().map(|node| node.reference_span()).sum()
    }

    fn total(&self, count: impl Fn(&Mapping) -> usize) -> usize {
        self.node_mappings.iter().map(|node| count(node.mapping())).sum()
    }

    /// Returns the total length of match operations.
    pub fn matched(&self) -> usize {
        self.total(Mapping::matched)
    }

    /// Returns the total length of mismatch operations.
    pub fn mismatched(&self) -> usize {
        self.total(Mapping::mismatched)
    }

    /// Returns the total length of soft clips.
    pub fn clipped(&self) -> usize {
        self.total(Mapping::clipped)
    }

    /// Returns the total length of insertions.
    pub fn inserted(&self) -> usize {
        self.total(Mapping::inserted)
    }

    /// Returns the total length of deletions.
    pub fn deleted(&self) -> usize {
        self.total(Mapping::deleted)
    }

    /// Returns the total length of missing base operations.
    pub fn missing(&self) -> usize {
        self.total(Mapping::missing)
    }

    /// Returns the graph encoding of the alignment as a `Vec<u8>` string.
    pub fn to_encoding(&self) -> Vec<u8> {
        let mut result = Vec::new();
        for node in self.node_mappings.iter() {
            node.append_encoding(&mut result);
        }
        result
    }
}

impl Index<usize> for GraphMapping {
    type Output = NodeMapping;

    fn index(&self, index: usize) -> &Self::Output {
        &self.node_mappings[index]
    }
}

impl<'a> IntoIterator for &'a GraphMapping {
    type Item = &'a NodeMapping;
    type IntoIter = slice::Iter<'a, NodeMapping>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Display for GraphMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in self.node_mappings.iter() {
            write!(f, "{}", node)?;
        }
        Ok(())
    }
}

//-----------------------------------------------------------------------------
