//! Alignments to a single linear sequence and to a single graph node.

use crate::alignment::{DecodeParams, Operation, OpType};
use crate::error::DecodeError;
use crate::graph::SequenceGraph;
use crate::utils;

use std::fmt::{self, Display};
use std::ops::Index;
use std::slice;

//-----------------------------------------------------------------------------

/// An alignment of a query sequence to a linear reference sequence as a list of operations.
///
/// The mapping stores the bases consumed by each operation, which makes it self-contained.
/// Operation counts are computed once at construction.
/// Equality compares the operations.
///
/// # Examples
///
/// ```
/// use graph_cigar::{DecodeParams, Mapping};
///
/// let params = DecodeParams::default();
/// let mapping = Mapping::decode(0, b"5M2I3M", b"AAAAAGGAAA", b"AAAAAAAA", &params).unwrap();
/// assert_eq!(mapping.len(), 3);
/// assert_eq!(mapping.matched(), 8);
/// assert_eq!(mapping.inserted(), 2);
/// assert_eq!(mapping.query_span(), 10);
/// assert_eq!(mapping.reference_span(), 8);
/// assert_eq!(mapping.to_string(), "5M2I3M");
/// ```
#[derive(Clone, Debug, Default)]
pub struct Mapping {
    reference_start: usize,
    operations: Vec<Operation>,
    matched: usize,
    mismatched: usize,
    clipped: usize,
    inserted: usize,
    deleted: usize,
    missing: usize,
}

impl Mapping {
    /// Creates a mapping from a list of validated operations.
    ///
    /// `reference_start` is the reference offset of the first operation.
    pub fn new(reference_start: usize, operations: Vec<Operation>) -> Self {
        let mut result = Mapping {
            reference_start,
            operations,
            ..Default::default()
        };
        result.update_counts();
        result
    }

    /// Decodes a mapping from a linear encoding.
    ///
    /// The encoding must consume the entire query sequence.
    /// Reference bases are consumed from `reference[reference_start..]`, and the mapping may end before the end of the reference.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::MalformedEncoding`] if the encoding cannot be parsed.
    /// Returns [`DecodeError::SequenceOverrun`] if an operation would read past the end of the query or the reference.
    /// Returns [`DecodeError::ConsumedLengthMismatch`] if query bases remain after the last operation.
    /// Passes through validation errors from [`Operation::new`].
    pub fn decode(reference_start: usize, encoding: &[u8], query: &[u8], reference: &[u8], params: &DecodeParams) -> Result<Self, DecodeError> {
        if reference_start > reference.len() {
            return Err(DecodeError::SequenceOverrun {
                operation: String::from_utf8_lossy(encoding).into_owned(),
                frame: "reference",
                offset: 0,
                needed: reference_start,
                available: reference.len(),
            });
        }

        let runs = OpType::parse_runs(encoding)?;
        let mut operations = Vec::with_capacity(runs.len());
        let mut query_offset = 0;
        let mut ref_offset = reference_start;
        for (op_type, length) in runs {
            let query_bases = Operation::consume(op_type, length, op_type.consumes_query(), "query", query, query_offset)?;
            let ref_bases = Operation::consume(op_type, length, op_type.consumes_reference(), "reference", reference, ref_offset)?;
            let op = Operation::new(op_type, length, query_bases, ref_bases, params)?;
            query_offset += op.query_span();
            ref_offset += op.reference_span();
            operations.push(op);
        }

        if query_offset != query.len() {
            return Err(DecodeError::ConsumedLengthMismatch {
                consumed: query_offset,
                expected: query.len(),
            });
        }

        Ok(Self::new(reference_start, operations))
    }

    fn update_counts(&mut self) {
        for op in self.operations.iter() {
            let counter = match op.op_type() {
                OpType::Match => &mut self.matched,
                OpType::Mismatch => &mut self.mismatched,
                OpType::InsertionToRef => &mut self.inserted,
                OpType::DeletionFromRef => &mut self.deleted,
                OpType::SoftClip => &mut self.clipped,
                OpType::MissingBases => &mut self.missing,
            };
            *counter += op.len();
        }
    }

    /// Returns the number of operations.
    #[inline]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Returns `true` if the mapping has no operations.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Returns the operations.
    #[inline]
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Returns an iterator over the operations.
    pub fn iter(&self) -> slice::Iter<'_, Operation> {
        self.operations.iter()
    }

    /// Returns the reference offset of the first operation.
    #[inline]
    pub fn reference_start(&self) -> usize {
        self.reference_start
    }

    /// Returns the aligned query sequence.
    pub fn query(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(self.query_span());
        for op in self.operations.iter() {
            result.extend_from_slice(op.query());
        }
        result
    }

    /// Returns the aligned reference sequence.
    pub fn reference(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(self.reference_span());
        for op in self.operations.iter() {
            result.extend_from_slice(op.reference());
        }
        result
    }

    /// Returns the number of query positions consumed by the mapping.
    pub fn query_span(&self) -> usize {
        self.operations.iter().map(|op| op.query_span()).sum()
    }

    /// Returns the number of reference positions consumed by the mapping.
    pub fn reference_span(&self) -> usize {
        self.operations.iter().map(|op| op.reference_span()).sum()
    }

    /// Returns the total length of match operations.
    #[inline]
    pub fn matched(&self) -> usize {
        self.matched
    }

    /// Returns the total length of mismatch operations.
    #[inline]
    pub fn mismatched(&self) -> usize {
        self.mismatched
    }

    /// Returns the total length of soft clips.
    #[inline]
    pub fn clipped(&self) -> usize {
        self.clipped
    }

    /// Returns the total length of insertions.
    #[inline]
    pub fn inserted(&self) -> usize {
        self.inserted
    }

    /// Returns the total length of deletions.
    #[inline]
    pub fn deleted(&self) -> usize {
        self.deleted
    }

    /// Returns the total length of missing base operations.
    #[inline]
    pub fn missing(&self) -> usize {
        self.missing
    }

    /// Appends the encoding of the mapping to the buffer.
    pub fn append_encoding(&self, buffer: &mut Vec<u8>) {
        for op in self.operations.iter() {
            op.append_encoding(buffer);
        }
    }

    /// Returns the encoding of the mapping as a `Vec<u8>` string.
    pub fn to_encoding(&self) -> Vec<u8> {
        let mut result = Vec::new();
        self.append_encoding(&mut result);
        result
    }
}

impl PartialEq for Mapping {
    fn eq(&self, other: &Self) -> bool {
        self.operations == other.operations
    }
}

impl Eq for Mapping {}

impl Index<usize> for Mapping {
    type Output = Operation;

    fn index(&self, index: usize) -> &Self::Output {
        &self.operations[index]
    }
}

impl<'a> IntoIterator for &'a Mapping {
    type Item = &'a Operation;
    type IntoIter = slice::Iter<'a, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Display for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for op in self.operations.iter() {
            write!(f, "{}", op)?;
        }
        Ok(())
    }
}

//-----------------------------------------------------------------------------

/// A [`Mapping`] to the sequence of a single graph node.
///
/// The node is identified by its identifier in the graph.
/// The graph is only needed during construction, as the mapping stores the aligned bases.
/// Equality compares the node identifiers and the mappings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeMapping {
    node_id: usize,
    mapping: Mapping,
}

impl NodeMapping {
    /// Decodes a mapping to the given node.
    ///
    /// See [`Mapping::decode`] for the semantics of the arguments.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::UnknownNode`] if the graph does not contain the node.
    /// Passes through any errors from [`Mapping::decode`].
    pub fn new<G: SequenceGraph + ?Sized>(
        node_id: usize, reference_start: usize,
        encoding: &[u8], query: &[u8],
        graph: &G, params: &DecodeParams
    ) -> Result<Self, DecodeError> {
        let sequence = graph.sequence(node_id).ok_or(DecodeError::UnknownNode(node_id))?;
        let mapping = Mapping::decode(reference_start, encoding, query, sequence, params)?;
        Ok(NodeMapping { node_id, mapping })
    }

    /// Decodes a mapping from a single node segment of the form `node_id[encoding]`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::MalformedEncoding`] if the input is not a single node segment.
    /// Passes through any errors from [`NodeMapping::new`].
    ///
    /// # Examples
    ///
    /// ```
    /// use graph_cigar::{DecodeParams, Graph, NodeMapping};
    ///
    /// let mut graph = Graph::new();
    /// graph.add_node(4, b"GATTACA").unwrap();
    /// let params = DecodeParams::default();
    ///
    /// let mapping = NodeMapping::parse(1, b"4[3M1X]", b"ATTT", &graph, &params).unwrap();
    /// assert_eq!(mapping.node_id(), 4);
    /// assert_eq!(mapping.reference(), b"ATTA");
    /// assert_eq!(mapping.to_string(), "4[3M1X]");
    /// ```
    pub fn parse<G: SequenceGraph + ?Sized>(
        reference_start: usize, node_encoding: &[u8], query: &[u8],
        graph: &G, params: &DecodeParams
    ) -> Result<Self, DecodeError> {
        let (node_id, encoding, end) = parse_segment(node_encoding, 0)?;
        if end != node_encoding.len() {
            return Err(DecodeError::malformed(node_encoding, "expected a single node segment"));
        }
        Self::new(node_id, reference_start, encoding, query, graph, params)
    }

    /// Returns the identifier of the node.
    #[inline]
    pub fn node_id(&self) -> usize {
        self.node_id
    }

    /// Returns the mapping to the node sequence.
    #[inline]
    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    /// Returns the aligned query sequence.
    pub fn query(&self) -> Vec<u8> {
        self.mapping.query()
    }

    /// Returns the aligned part of the node sequence.
    pub fn reference(&self) -> Vec<u8> {
        self.mapping.reference()
    }

    /// Returns the number of query positions consumed by the mapping.
    pub fn query_span(&self) -> usize {
        self.mapping.query_span()
    }

    /// Returns the number of node positions consumed by the mapping.
    pub fn reference_span(&self) -> usize {
        self.mapping.reference_span()
    }

    /// Returns the offset of the mapping in the node.
    pub fn reference_start(&self) -> usize {
        self.mapping.reference_start()
    }

    /// Appends the node segment to the buffer.
    pub fn append_encoding(&self, buffer: &mut Vec<u8>) {
        utils::append_usize(buffer, self.node_id);
        buffer.push(b'[');
        self.mapping.append_encoding(buffer);
        buffer.push(b']');
    }
}

impl AsRef<Mapping> for NodeMapping {
    fn as_ref(&self) -> &Mapping {
        &self.mapping
    }
}

impl Display for NodeMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.node_id, self.mapping)
    }
}

//-----------------------------------------------------------------------------

/// Parses the node segment `node_id[encoding]` starting at `offset`.
///
/// Returns the node identifier, the encoding, and the offset after the segment.
/// The encoding itself is not validated.
pub(crate) fn parse_segment(graph_encoding: &[u8], offset: usize) -> Result<(usize, &[u8], usize), DecodeError> {
    let digits = graph_encoding[offset..].iter().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        let reason = match graph_encoding.get(offset) {
            Some(c) => format!("expected a node identifier at offset {}, found '{}'", offset, *c as char),
            None => format!("expected a node identifier at offset {}", offset),
        };
        return Err(DecodeError::malformed(graph_encoding, reason));
    }
    if digits > 1 && graph_encoding[offset] == b'0' {
        let reason = format!("node identifier at offset {} has a leading zero", offset);
        return Err(DecodeError::malformed(graph_encoding, reason));
    }
    let open = offset + digits;
    let node_id = utils::parse_usize(&graph_encoding[offset..open]).ok_or_else(|| {
        DecodeError::malformed(graph_encoding, format!("node identifier at offset {} is too large", offset))
    })?;
    if graph_encoding.get(open) != Some(&b'[') {
        return Err(DecodeError::malformed(graph_encoding, format!("expected '[' at offset {}", open)));
    }
    let close = graph_encoding[open + 1..].iter().position(|&c| c == b']').map(|x| open + 1 + x).ok_or_else(|| {
        DecodeError::malformed(graph_encoding, format!("unterminated segment for node {}", node_id))
    })?;
    let encoding = &graph_encoding[open + 1..close];
    if encoding.is_empty() {
        return Err(DecodeError::malformed(graph_encoding, format!("empty segment for node {}", node_id)));
    }
    Ok((node_id, encoding, close + 1))
}

//-----------------------------------------------------------------------------
