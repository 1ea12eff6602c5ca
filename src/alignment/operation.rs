//! Atomic alignment operations and the run-length grammar.

use crate::alignment::DecodeParams;
use crate::error::DecodeError;
use crate::utils;

use std::fmt::{self, Display};

//-----------------------------------------------------------------------------

/// Type of an alignment operation.
///
/// Each type is encoded as a single symbol in the alignment encoding:
///
/// * `M`: Match. Consumes query and reference; the bases must be equal.
/// * `X`: Mismatch. Consumes query and reference.
/// * `I`: Insertion to the reference. Consumes query.
/// * `D`: Deletion from the reference. Consumes reference.
/// * `S`: Soft clip. Consumes query, which is not aligned.
/// * `N`: Missing bases. Consumes query and reference; either base is unknown (`N`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpType {
    /// Aligned bases that are equal.
    Match,
    /// Aligned bases that differ.
    Mismatch,
    /// Query bases absent from the reference.
    InsertionToRef,
    /// Reference bases absent from the query.
    DeletionFromRef,
    /// Unaligned query bases at either end.
    SoftClip,
    /// Aligned positions where the query or the reference base is unknown.
    MissingBases,
}

impl OpType {
    /// All operation types in symbol order.
    pub const ALL: [OpType; 6] = [
        OpType::Match, OpType::Mismatch,
        OpType::InsertionToRef, OpType::DeletionFromRef,
        OpType::SoftClip, OpType::MissingBases,
    ];

    /// Decodes an operation symbol.
    ///
    /// Returns [`None`] if the symbol is not recognized.
    pub fn from_symbol(symbol: u8) -> Option<Self> {
        match symbol {
            b'M' => Some(OpType::Match),
            b'X' => Some(OpType::Mismatch),
            b'I' => Some(OpType::InsertionToRef),
            b'D' => Some(OpType::DeletionFromRef),
            b'S' => Some(OpType::SoftClip),
            b'N' => Some(OpType::MissingBases),
            _ => None,
        }
    }

    /// Returns the symbol encoding this type.
    ///
    /// This is the inverse of [`OpType::from_symbol`].
    pub fn symbol(&self) -> u8 {
        match self {
            OpType::Match => b'M',
            OpType::Mismatch => b'X',
            OpType::InsertionToRef => b'I',
            OpType::DeletionFromRef => b'D',
            OpType::SoftClip => b'S',
            OpType::MissingBases => b'N',
        }
    }

    /// Returns `true` if operations of this type consume query bases.
    pub fn consumes_query(&self) -> bool {
        match self {
            OpType::Match | OpType::Mismatch | OpType::InsertionToRef | OpType::SoftClip | OpType::MissingBases => true,
            OpType::DeletionFromRef => false,
        }
    }

    /// Returns `true` if operations of this type consume reference bases.
    pub fn consumes_reference(&self) -> bool {
        match self {
            OpType::Match | OpType::Mismatch | OpType::DeletionFromRef | OpType::MissingBases => true,
            OpType::InsertionToRef | OpType::SoftClip => false,
        }
    }

    /// Parses a linear encoding into a sequence of `(type, length)` runs.
    ///
    /// The encoding must consist of one or more runs, each a positive decimal length followed by a symbol.
    /// Parsing is based on bytes rather than characters to avoid unnecessary UTF-8 validation.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::MalformedEncoding`] if the encoding is empty, a run has no length, no symbol, an unknown symbol, or a zero length, or a length has a leading zero or does not fit in `usize`.
    ///
    /// # Examples
    ///
    /// ```
    /// use graph_cigar::OpType;
    ///
    /// let runs = OpType::parse_runs(b"5M2I3M").unwrap();
    /// assert_eq!(runs, vec![(OpType::Match, 5), (OpType::InsertionToRef, 2), (OpType::Match, 3)]);
    /// assert!(OpType::parse_runs(b"5Z").is_err());
    /// ```
    pub fn parse_runs(encoding: &[u8]) -> Result<Vec<(OpType, usize)>, DecodeError> {
        if encoding.is_empty() {
            return Err(DecodeError::malformed(encoding, "empty encoding"));
        }

        let mut result = Vec::new();
        let mut offset = 0;
        while offset < encoding.len() {
            let (op_type, length, next) = Self::parse_run(encoding, offset)?;
            result.push((op_type, length));
            offset = next;
        }

        Ok(result)
    }

    // Parses the run starting at `offset`.
    // Returns the type, the length, and the offset after the run.
    fn parse_run(encoding: &[u8], offset: usize) -> Result<(OpType, usize, usize), DecodeError> {
        let digits = encoding[offset..].iter().take_while(|c| c.is_ascii_digit()).count();
        if digits == 0 {
            let reason = format!("expected a length at offset {}, found '{}'", offset, encoding[offset] as char);
            return Err(DecodeError::malformed(encoding, reason));
        }
        if digits > 1 && encoding[offset] == b'0' {
            return Err(DecodeError::malformed(encoding, format!("length at offset {} has a leading zero", offset)));
        }
        let end = offset + digits;
        let length = utils::parse_usize(&encoding[offset..end]).ok_or_else(|| {
            DecodeError::malformed(encoding, format!("length at offset {} is too large", offset))
        })?;
        if end >= encoding.len() {
            return Err(DecodeError::malformed(encoding, "missing operation symbol at the end"));
        }
        let op_type = Self::from_symbol(encoding[end]).ok_or_else(|| {
            DecodeError::malformed(encoding, format!("unknown operation symbol '{}'", encoding[end] as char))
        })?;
        if length == 0 {
            return Err(DecodeError::malformed(encoding, format!("zero-length run at offset {}", offset)));
        }
        Ok((op_type, length, end + 1))
    }
}

//-----------------------------------------------------------------------------

/// A single alignment operation together with the bases it consumes.
///
/// The operation stores the query bases if the type consumes the query and the reference bases if the type consumes the reference.
/// The other sequence is empty.
/// Validation happens at construction, and the operation cannot be modified afterwards.
///
/// # Examples
///
/// ```
/// use graph_cigar::{DecodeParams, Operation, OpType};
///
/// let params = DecodeParams::default();
/// let op = Operation::from_fragment(b"3M", b"ACGTT", b"ACGAA", &params).unwrap();
/// assert_eq!(op.op_type(), OpType::Match);
/// assert_eq!(op.query(), b"ACG");
/// assert_eq!(op.reference(), b"ACG");
/// assert_eq!(op.to_string(), "3M");
///
/// let op = Operation::from_symbol(b'I', 2, b"TT".to_vec(), Vec::new(), &params).unwrap();
/// assert_eq!(op.query_span(), 2);
/// assert_eq!(op.reference_span(), 0);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Operation {
    op_type: OpType,
    length: usize,
    query: Vec<u8>,
    reference: Vec<u8>,
}

impl Operation {
    /// Creates a new operation and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::LengthMismatch`] if the length is zero, if the sequence lengths disagree with the length and the type, or if the bases violate the rules of the type.
    /// See [`DecodeParams::verify_mismatches`] for the rules applied to mismatches and missing bases.
    pub fn new(op_type: OpType, length: usize, query: Vec<u8>, reference: Vec<u8>, params: &DecodeParams) -> Result<Self, DecodeError> {
        let result = Operation { op_type, length, query, reference };
        result.validate(params)?;
        Ok(result)
    }

    /// Creates a new operation from an operation symbol.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::MalformedEncoding`] if the symbol is not recognized.
    /// Passes through validation errors from [`Operation::new`].
    pub fn from_symbol(symbol: u8, length: usize, query: Vec<u8>, reference: Vec<u8>, params: &DecodeParams) -> Result<Self, DecodeError> {
        let op_type = OpType::from_symbol(symbol).ok_or_else(|| {
            DecodeError::malformed(&[symbol], format!("unknown operation symbol '{}'", symbol as char))
        })?;
        Self::new(op_type, length, query, reference, params)
    }

    /// Creates a new operation from a single run such as `3M`.
    ///
    /// The query and reference sequences start at the position of the operation.
    /// The operation consumes a prefix of each sequence it consumes; the rest is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::MalformedEncoding`] if the fragment is not a single valid run.
    /// Returns [`DecodeError::SequenceOverrun`] if a consumed sequence is too short.
    /// Passes through validation errors from [`Operation::new`].
    pub fn from_fragment(fragment: &[u8], query: &[u8], reference: &[u8], params: &DecodeParams) -> Result<Self, DecodeError> {
        let runs = OpType::parse_runs(fragment)?;
        if runs.len() != 1 {
            return Err(DecodeError::malformed(fragment, format!("expected a single operation, found {}", runs.len())));
        }
        let (op_type, length) = runs[0];
        let query = Self::consume(op_type, length, op_type.consumes_query(), "query", query, 0)?;
        let reference = Self::consume(op_type, length, op_type.consumes_reference(), "reference", reference, 0)?;
        Self::new(op_type, length, query, reference, params)
    }

    // Returns the bases consumed from `sequence[offset..]`, or an empty vector if the frame is not consumed.
    pub(crate) fn consume(
        op_type: OpType, length: usize,
        consumes: bool, frame: &'static str,
        sequence: &[u8], offset: usize
    ) -> Result<Vec<u8>, DecodeError> {
        if !consumes {
            return Ok(Vec::new());
        }
        let available = sequence.len().saturating_sub(offset);
        if length > available {
            return Err(DecodeError::SequenceOverrun {
                operation: format!("{}{}", length, op_type.symbol() as char),
                frame, offset,
                needed: length,
                available,
            });
        }
        Ok(sequence[offset..offset + length].to_vec())
    }

    fn validate(&self, params: &DecodeParams) -> Result<(), DecodeError> {
        if self.length == 0 {
            return Err(self.invalid("the length must be positive"));
        }
        self.check_frame(self.op_type.consumes_query(), "query", &self.query)?;
        self.check_frame(self.op_type.consumes_reference(), "reference", &self.reference)?;

        match self.op_type {
            OpType::Match => {
                if let Some(i) = self.pairs().position(|(q, r)| !q.eq_ignore_ascii_case(&r)) {
                    return Err(self.invalid(format!("bases differ at position {}", i)));
                }
            },
            OpType::Mismatch => {
                if params.verify_mismatches {
                    if let Some(i) = self.pairs().position(|(q, r)| q.eq_ignore_ascii_case(&r)) {
                        return Err(self.invalid(format!("bases are equal at position {}", i)));
                    }
                }
            },
            OpType::MissingBases => {
                if params.verify_mismatches {
                    if let Some(i) = self.pairs().position(|(q, r)| !Self::is_unknown(q) && !Self::is_unknown(r)) {
                        return Err(self.invalid(format!("both bases are known at position {}", i)));
                    }
                }
            },
            OpType::InsertionToRef | OpType::DeletionFromRef | OpType::SoftClip => {},
        }

        Ok(())
    }

    fn check_frame(&self, consumes: bool, frame: &str, sequence: &[u8]) -> Result<(), DecodeError> {
        if consumes && sequence.len() != self.length {
            return Err(self.invalid(format!("{} has {} bases", frame, sequence.len())));
        }
        if !consumes && !sequence.is_empty() {
            return Err(self.invalid(format!("{} has {} bases but the operation does not consume it", frame, sequence.len())));
        }
        Ok(())
    }

    fn pairs(&self) -> impl Iterator<Item = (u8, u8)> + '_ {
        self.query.iter().copied().zip(self.reference.iter().copied())
    }

    fn is_unknown(base: u8) -> bool {
        base == b'N' || base == b'n'
    }

    fn invalid(&self, reason: impl Into<String>) -> DecodeError {
        DecodeError::LengthMismatch {
            operation: self.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns the type of the operation.
    #[inline]
    pub fn op_type(&self) -> OpType {
        self.op_type
    }

    /// Returns the length of the operation.
    #[inline]
    pub fn len(&self) -> usize {
        self.length
    }

    /// Returns `true` if the operation is empty.
    ///
    /// This is always `false` for a validated operation.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Returns the query bases consumed by the operation.
    #[inline]
    pub fn query(&self) -> &[u8] {
        &self.query
    }

    /// Returns the reference bases consumed by the operation.
    #[inline]
    pub fn reference(&self) -> &[u8] {
        &self.reference
    }

    /// Returns the number of query positions consumed by the operation.
    pub fn query_span(&self) -> usize {
        if self.op_type.consumes_query() { self.length } else { 0 }
    }

    /// Returns the number of reference positions consumed by the operation.
    pub fn reference_span(&self) -> usize {
        if self.op_type.consumes_reference() { self.length } else { 0 }
    }

    /// Returns the symbol for the type of the operation.
    #[inline]
    pub fn symbol(&self) -> u8 {
        self.op_type.symbol()
    }

    /// Appends the encoding of the operation to the buffer.
    pub fn append_encoding(&self, buffer: &mut Vec<u8>) {
        utils::append_usize(buffer, self.length);
        buffer.push(self.symbol());
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.length, self.symbol() as char)
    }
}

//-----------------------------------------------------------------------------
