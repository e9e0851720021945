//! Error types for frame encoding and decoding.

use thiserror::Error;

use crate::frame::ErrorCode;
use crate::hpack::HpackError;

/// Result type alias for codec operations.
pub type Result<T> = std::result::Result<T, FrameError>;

/// Errors produced while decoding or encoding a frame.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// Not enough bytes for a whole frame. Recoverable: the input buffer is
    /// left untouched and the caller retries once more bytes arrive.
    #[error("incomplete frame")]
    Incomplete,

    /// Frame type outside 0..=9. RFC 9113 requires receivers to ignore
    /// these; the frame's bytes have been consumed so the caller can simply
    /// continue.
    #[error("unknown frame type 0x{0:02x}")]
    UnknownType(u8),

    /// A bit pattern violating RFC 9113. Fatal for the connection: the
    /// caller should emit GOAWAY with the carried error code.
    #[error("{reason}")]
    Protocol {
        code: ErrorCode,
        reason: &'static str,
    },

    /// Header-block decompression failed. Fatal for the connection: the
    /// peer's compression state is no longer in sync.
    #[error("header compression: {0}")]
    Hpack(#[from] HpackError),

    /// The frame references a stream whose bookkeeping was evicted, and the
    /// codec was configured to treat that as fatal.
    #[error("no such stream {0}")]
    NoSuchStream(u32),
}

impl FrameError {
    pub(crate) fn protocol(code: ErrorCode, reason: &'static str) -> Self {
        Self::Protocol { code, reason }
    }

    /// The HTTP/2 error code a GOAWAY for this error should carry, if the
    /// error is connection-fatal.
    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            Self::Protocol { code, .. } => Some(*code),
            Self::Hpack(_) => Some(ErrorCode::CompressionError),
            Self::NoSuchStream(_) => Some(ErrorCode::ProtocolError),
            Self::Incomplete | Self::UnknownType(_) => None,
        }
    }
}
