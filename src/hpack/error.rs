//! HPACK-specific error types.

use thiserror::Error;

/// HPACK encoding/decoding errors.
///
/// Any decoding failure leaves the peer's compression state undefined, so
/// callers must treat these as fatal for the connection (RFC 7541 Section 2.2).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HpackError {
    #[error("header block ends inside a representation")]
    TruncatedBlock,

    #[error("prefixed integer has too many continuation bytes")]
    InvalidIntegerEncoding,

    #[error("invalid Huffman code in string literal")]
    InvalidHuffmanEncoding,

    #[error("string literal is not valid UTF-8")]
    InvalidStringEncoding,

    #[error("indexed header field with invalid index {0}")]
    InvalidIndexedHeader(usize),

    #[error("indexed header field {0} has no value")]
    IndexedHeaderWithNoValue(usize),

    #[error("index {index} out of range for table of length {length}")]
    IndexOutOfRange { index: usize, length: usize },

    #[error("invalid header field representation: 0x{0:02x}")]
    InvalidRepresentation(u8),
}
