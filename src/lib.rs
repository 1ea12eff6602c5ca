//! # graph-cigar: CIGAR-like alignments to sequence graphs.
//!
//! This crate decodes and validates alignments of query sequences to paths in a sequence graph.
//! It does not compute alignments; it only interprets alignments produced elsewhere.
//!
//! # Encoding
//!
//! An alignment to a linear sequence is encoded as a sequence of runs such as `5M2I3M`.
//! Each run consists of a positive length and an operation symbol:
//!
//! * `M`: match,
//! * `X`: mismatch,
//! * `I`: insertion to the reference,
//! * `D`: deletion from the reference,
//! * `S`: soft clip,
//! * `N`: missing bases.
//!
//! An alignment to a graph concatenates node segments of the form `node_id[encoding]` in path order, such as `0[4M]1[2M1X]2[3M2S]`.
//! The first segment may start at any offset in its node, while the remaining segments start at the beginning of their nodes.
//!
//! # Decoding
//!
//! See [`alignment`] for the structures:
//!
//! * [`Operation`] for a single run,
//! * [`Mapping`] for an alignment to a linear sequence,
//! * [`NodeMapping`] for an alignment to a single node,
//! * [`GraphMapping`] for an alignment to a path.
//!
//! Decoding is all-or-nothing.
//! Each failure is reported as a [`DecodeError`], and no partially decoded structure is returned.
//! The behavior can be adjusted using [`DecodeParams`].
//!
//! # Graphs
//!
//! The graph is accessed through trait [`SequenceGraph`], which is implemented for [`gbz::GBZ`] and the in-memory [`Graph`].
//! See [`graph`] for details.
//! The decoded structures store the aligned bases, and they do not refer to the graph after construction.

pub mod alignment;
pub mod error;
pub mod graph;
pub mod utils;

pub use alignment::{DecodeParams, GraphMapping};
pub use alignment::mapping::{Mapping, NodeMapping};
pub use alignment::operation::{Operation, OpType};
pub use error::DecodeError;
pub use graph::{Graph, SequenceGraph};
