//! # h2core
//!
//! The protocol core of an HTTP/2 stack: an HPACK header-compression codec
//! (RFC 7541) and a frame codec for the nine RFC 9113 frame types.
//!
//! The crate does no I/O. A transport feeds [`codec::FrameCodec`] bytes and
//! writes the bytes it produces; everything here is synchronous and runs to
//! completion on the calling thread. One codec serves one connection: it
//! owns the connection's HPACK state, so frames must be encoded in the
//! order they will be delivered.
//!
//! ```
//! use bytes::BytesMut;
//! use h2core::{Frame, FrameCodec, StreamId};
//!
//! let mut codec = FrameCodec::new();
//! let mut wire = BytesMut::new();
//!
//! let frame = Frame::headers(
//!     StreamId::new(1),
//!     vec![(b":method".to_vec(), b"GET".to_vec()),
//!          (b":path".to_vec(), b"/".to_vec())],
//! );
//! codec.encode(&frame, &mut wire).unwrap();
//!
//! let decoded = codec.decode(&mut wire).unwrap();
//! assert_eq!(decoded, frame);
//! ```

pub mod codec;
pub mod error;
pub mod frame;
pub mod hpack;
pub mod stream;

// Re-exports for convenient access
pub use codec::FrameCodec;
pub use error::{FrameError, Result};
pub use frame::{
    flags, ErrorCode, Frame, FrameHeader, FramePayload, FrameType, HeaderList, PriorityData,
    SettingsId, CONNECTION_PREFACE, DEFAULT_MAX_FRAME_SIZE, FRAME_HEADER_SIZE,
};
pub use hpack::{Decoder as HpackDecoder, Encoder as HpackEncoder, HpackError};
pub use stream::{StreamId, StreamMap};
