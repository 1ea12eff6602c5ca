//! Errors from decoding alignment encodings.

use thiserror::Error;

//-----------------------------------------------------------------------------

/// An error encountered while decoding an alignment.
///
/// Decoding is all-or-nothing: a failed record produces no value.
/// The input is deterministic, so retrying without changes reproduces the same error.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The encoding does not follow the grammar.
    #[error("Malformed encoding {encoding}: {reason}")]
    MalformedEncoding {
        encoding: String,
        reason: String,
    },

    /// The declared length of an operation disagrees with its sequences or its type.
    #[error("Invalid operation {operation}: {reason}")]
    LengthMismatch {
        operation: String,
        reason: String,
    },

    /// Decoding would read past the end of a sequence.
    #[error("Operation {operation} needs {needed} {frame} bases at offset {offset}, but only {available} are available")]
    SequenceOverrun {
        operation: String,
        frame: &'static str,
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// The graph does not contain the node.
    #[error("The graph does not contain node {0}")]
    UnknownNode(usize),

    /// The encoding consumes a different number of query bases than there are in the query.
    #[error("The encoding consumes {consumed} query bases, but the query has {expected}")]
    ConsumedLengthMismatch {
        consumed: usize,
        expected: usize,
    },

    /// Consecutive nodes on the path are not connected in the graph.
    #[error("The graph does not contain an edge from node {from} to node {to}")]
    MissingEdge {
        from: usize,
        to: usize,
    },
}

impl DecodeError {
    pub(crate) fn malformed(encoding: &[u8], reason: impl Into<String>) -> Self {
        DecodeError::MalformedEncoding {
            encoding: String::from_utf8_lossy(encoding).into_owned(),
            reason: reason.into(),
        }
    }
}

//-----------------------------------------------------------------------------
