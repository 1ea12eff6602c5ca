//! Utility functions and structures.

use std::fs::{self, File};
use std::path::Path;
use std::io::{BufRead, BufReader, Read};
use std::str;

use flate2::read::MultiGzDecoder;

//-----------------------------------------------------------------------------

// Utilities for working with files.

/// Returns `true` if the file exists.
pub fn file_exists<P: AsRef<Path>>(filename: P) -> bool {
    fs::metadata(filename).is_ok()
}

/// Returns `true` if the file appears to be gzip-compressed.
pub fn is_gzipped<P: AsRef<Path>>(filename: P) -> bool {
    let file = File::open(filename).ok();
    if file.is_none() {
        return false;
    }
    let mut reader = BufReader::new(file.unwrap());
    let mut magic = [0; 2];
    let len = reader.read(&mut magic).ok();
    len == Some(2) && magic == [0x1F, 0x8B]
}

/// Returns a buffered reader for the file, which may be gzip-compressed.
pub fn open_file<P: AsRef<Path>>(filename: P) -> Result<Box<dyn BufRead>, String> {
    let file = File::open(&filename).map_err(|x| x.to_string())?;
    let inner = BufReader::new(file);
    if is_gzipped(&filename) {
        let inner = MultiGzDecoder::new(inner);
        Ok(Box::new(BufReader::new(inner)))
    } else {
        Ok(Box::new(inner))
    }
}

//-----------------------------------------------------------------------------

// Utilities for byte strings.

/// Appends the decimal representation of an integer to a string represented as `Vec<u8>`.
pub fn append_usize(buffer: &mut Vec<u8>, value: usize) {
    buffer.extend_from_slice(value.to_string().as_bytes());
}

/// Parses a decimal integer from a byte string.
///
/// Returns [`None`] if the string is empty, contains anything other than ASCII digits, or the value overflows.
pub fn parse_usize(value: &[u8]) -> Option<usize> {
    if value.is_empty() || !value.iter().all(|c| c.is_ascii_digit()) {
        return None;
    }
    str::from_utf8(value).ok()?.parse::<usize>().ok()
}

//-----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers() {
        let values = [0, 1, 42, 1234567, usize::MAX];
        for value in values {
            let mut buffer = Vec::new();
            append_usize(&mut buffer, value);
            assert_eq!(parse_usize(&buffer), Some(value), "Wrong value for {}", value);
        }
    }

    #[test]
    fn invalid_integers() {
        assert_eq!(parse_usize(b""), None, "Parsed an empty string");
        assert_eq!(parse_usize(b"+5"), None, "Parsed a signed integer");
        assert_eq!(parse_usize(b"12a"), None, "Parsed a string with a letter");
        assert_eq!(parse_usize(b"99999999999999999999999"), None, "Parsed an overflowing integer");
    }
}

//-----------------------------------------------------------------------------
