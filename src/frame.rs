//! HTTP/2 frame model and wire header (RFC 9113 Section 4).
//!
//! Frames are value types: a stream identifier, a flag byte, and a tagged
//! payload. The [`crate::codec::FrameCodec`] turns them into bytes and back.

use bytes::{BufMut, Bytes, BytesMut};

use crate::stream::StreamId;

/// Frame header size (9 bytes per RFC 9113).
pub const FRAME_HEADER_SIZE: usize = 9;

/// Default maximum frame size (16KB per RFC 9113).
pub const DEFAULT_MAX_FRAME_SIZE: u32 = 16_384;

/// Largest SETTINGS_MAX_FRAME_SIZE value, 2^24 - 1.
pub const MAX_FRAME_SIZE_LIMIT: u32 = (1 << 24) - 1;

/// HTTP/2 connection preface (client must send this first).
pub const CONNECTION_PREFACE: &[u8] = b"PRI * HTTP/2.0\r\n\r\nSM\r\n\r\n";

/// Frame type identifiers per RFC 9113.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameType {
    Data,
    Headers,
    Priority,
    RstStream,
    Settings,
    PushPromise,
    Ping,
    GoAway,
    WindowUpdate,
    Continuation,
    Unknown(u8),
}

impl From<u8> for FrameType {
    fn from(v: u8) -> Self {
        match v {
            0x0 => Self::Data,
            0x1 => Self::Headers,
            0x2 => Self::Priority,
            0x3 => Self::RstStream,
            0x4 => Self::Settings,
            0x5 => Self::PushPromise,
            0x6 => Self::Ping,
            0x7 => Self::GoAway,
            0x8 => Self::WindowUpdate,
            0x9 => Self::Continuation,
            other => Self::Unknown(other),
        }
    }
}

impl From<FrameType> for u8 {
    fn from(ft: FrameType) -> u8 {
        match ft {
            FrameType::Data => 0x0,
            FrameType::Headers => 0x1,
            FrameType::Priority => 0x2,
            FrameType::RstStream => 0x3,
            FrameType::Settings => 0x4,
            FrameType::PushPromise => 0x5,
            FrameType::Ping => 0x6,
            FrameType::GoAway => 0x7,
            FrameType::WindowUpdate => 0x8,
            FrameType::Continuation => 0x9,
            FrameType::Unknown(v) => v,
        }
    }
}

/// Frame flags.
pub mod flags {
    pub const END_STREAM: u8 = 0x1;
    pub const ACK: u8 = 0x1; // Same value, different context (SETTINGS/PING)
    pub const END_HEADERS: u8 = 0x4;
    pub const PADDED: u8 = 0x8;
    pub const PRIORITY: u8 = 0x20;
}

/// SETTINGS frame parameter identifiers, including the two draft
/// identifiers beyond RFC 9113.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsId {
    HeaderTableSize,
    EnablePush,
    MaxConcurrentStreams,
    InitialWindowSize,
    MaxFrameSize,
    MaxHeaderListSize,
    AcceptCacheDigest,
    EnableConnectProtocol,
    /// Identifier this implementation does not know. Ignored per RFC 9113,
    /// never an error.
    Unknown(u16),
}

impl From<u16> for SettingsId {
    fn from(v: u16) -> Self {
        match v {
            0x1 => Self::HeaderTableSize,
            0x2 => Self::EnablePush,
            0x3 => Self::MaxConcurrentStreams,
            0x4 => Self::InitialWindowSize,
            0x5 => Self::MaxFrameSize,
            0x6 => Self::MaxHeaderListSize,
            0x7 => Self::AcceptCacheDigest,
            0x8 => Self::EnableConnectProtocol,
            other => Self::Unknown(other),
        }
    }
}

impl From<SettingsId> for u16 {
    fn from(id: SettingsId) -> u16 {
        match id {
            SettingsId::HeaderTableSize => 0x1,
            SettingsId::EnablePush => 0x2,
            SettingsId::MaxConcurrentStreams => 0x3,
            SettingsId::InitialWindowSize => 0x4,
            SettingsId::MaxFrameSize => 0x5,
            SettingsId::MaxHeaderListSize => 0x6,
            SettingsId::AcceptCacheDigest => 0x7,
            SettingsId::EnableConnectProtocol => 0x8,
            SettingsId::Unknown(v) => v,
        }
    }
}

/// HTTP/2 error codes per RFC 9113 Section 7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    NoError = 0x0,
    ProtocolError = 0x1,
    InternalError = 0x2,
    FlowControlError = 0x3,
    SettingsTimeout = 0x4,
    StreamClosed = 0x5,
    FrameSizeError = 0x6,
    RefusedStream = 0x7,
    Cancel = 0x8,
    CompressionError = 0x9,
    ConnectError = 0xa,
    EnhanceYourCalm = 0xb,
    InadequateSecurity = 0xc,
    Http11Required = 0xd,
}

impl From<u32> for ErrorCode {
    fn from(v: u32) -> Self {
        match v {
            0x0 => Self::NoError,
            0x1 => Self::ProtocolError,
            0x2 => Self::InternalError,
            0x3 => Self::FlowControlError,
            0x4 => Self::SettingsTimeout,
            0x5 => Self::StreamClosed,
            0x6 => Self::FrameSizeError,
            0x7 => Self::RefusedStream,
            0x8 => Self::Cancel,
            0x9 => Self::CompressionError,
            0xa => Self::ConnectError,
            0xb => Self::EnhanceYourCalm,
            0xc => Self::InadequateSecurity,
            0xd => Self::Http11Required,
            // RFC 9113 Section 7: unknown codes may be treated as any error.
            _ => Self::InternalError,
        }
    }
}

impl From<ErrorCode> for u32 {
    fn from(code: ErrorCode) -> u32 {
        code as u32
    }
}

/// Parsed frame header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameHeader {
    pub length: u32,
    pub frame_type: FrameType,
    pub flags: u8,
    pub stream_id: StreamId,
}

impl FrameHeader {
    /// Parse a frame header from the first 9 bytes of `buf`.
    ///
    /// The reserved high bit of the stream identifier is ignored, as RFC
    /// 9113 Section 4.1 requires. Returns `None` with fewer than 9 bytes.
    pub fn parse(buf: &[u8]) -> Option<Self> {
        if buf.len() < FRAME_HEADER_SIZE {
            return None;
        }

        let length = ((buf[0] as u32) << 16) | ((buf[1] as u32) << 8) | (buf[2] as u32);
        let frame_type = FrameType::from(buf[3]);
        let flags = buf[4];
        let stream_id = StreamId::new(u32::from_be_bytes([buf[5], buf[6], buf[7], buf[8]]));

        Some(Self {
            length,
            frame_type,
            flags,
            stream_id,
        })
    }

    /// Serialize the 9-byte header, reserved bit always zero.
    pub fn serialize(&self, buf: &mut BytesMut) {
        buf.put_u8((self.length >> 16) as u8);
        buf.put_u8((self.length >> 8) as u8);
        buf.put_u8(self.length as u8);
        buf.put_u8(self.frame_type.into());
        buf.put_u8(self.flags);
        buf.put_u32(self.stream_id.value());
    }
}

/// Stream dependency data carried by PRIORITY frames and the optional
/// priority section of HEADERS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorityData {
    pub exclusive: bool,
    pub dependency: StreamId,
    /// Raw wire byte; the effective weight is this plus one (1..=256).
    pub weight: u8,
}

/// Header fields as (name, value) octet strings, in wire order.
pub type HeaderList = Vec<(Vec<u8>, Vec<u8>)>;

/// Frame payload, tagged by frame type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FramePayload {
    Data {
        data: Bytes,
    },
    Headers {
        priority: Option<PriorityData>,
        headers: HeaderList,
    },
    Priority(PriorityData),
    RstStream(ErrorCode),
    Settings(Vec<(SettingsId, u32)>),
    PushPromise {
        promised: StreamId,
        headers: HeaderList,
    },
    Ping([u8; 8]),
    GoAway {
        last_stream: StreamId,
        error: ErrorCode,
        debug_data: Bytes,
    },
    WindowUpdate(u32),
    Continuation {
        headers: HeaderList,
    },
}

impl FramePayload {
    pub fn frame_type(&self) -> FrameType {
        match self {
            Self::Data { .. } => FrameType::Data,
            Self::Headers { .. } => FrameType::Headers,
            Self::Priority(_) => FrameType::Priority,
            Self::RstStream(_) => FrameType::RstStream,
            Self::Settings(_) => FrameType::Settings,
            Self::PushPromise { .. } => FrameType::PushPromise,
            Self::Ping(_) => FrameType::Ping,
            Self::GoAway { .. } => FrameType::GoAway,
            Self::WindowUpdate(_) => FrameType::WindowUpdate,
            Self::Continuation { .. } => FrameType::Continuation,
        }
    }

    /// Flag bits defined for this frame type. Decoding clears everything
    /// else so undefined bits never surface.
    pub fn allowed_flags(&self) -> u8 {
        match self {
            Self::Data { .. } => flags::END_STREAM | flags::PADDED,
            Self::Headers { .. } => {
                flags::END_STREAM | flags::END_HEADERS | flags::PADDED | flags::PRIORITY
            }
            Self::Priority(_) => 0,
            Self::RstStream(_) => 0,
            Self::Settings(_) => flags::ACK,
            Self::PushPromise { .. } => flags::END_HEADERS | flags::PADDED,
            Self::Ping(_) => flags::ACK,
            Self::GoAway { .. } => 0,
            Self::WindowUpdate(_) => 0,
            Self::Continuation { .. } => flags::END_HEADERS,
        }
    }
}

/// One HTTP/2 frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub stream_id: StreamId,
    pub flags: u8,
    pub payload: FramePayload,
}

impl Frame {
    pub fn new(stream_id: StreamId, payload: FramePayload) -> Self {
        Self {
            stream_id,
            flags: 0,
            payload,
        }
    }

    pub fn with_flags(mut self, flags: u8) -> Self {
        self.flags = flags & self.payload.allowed_flags();
        self
    }

    pub fn frame_type(&self) -> FrameType {
        self.payload.frame_type()
    }

    pub fn flag(&self, bit: u8) -> bool {
        self.flags & bit != 0
    }

    pub fn data(stream_id: StreamId, data: Bytes) -> Self {
        Self::new(stream_id, FramePayload::Data { data })
    }

    pub fn headers(stream_id: StreamId, headers: HeaderList) -> Self {
        Self::new(
            stream_id,
            FramePayload::Headers {
                priority: None,
                headers,
            },
        )
        .with_flags(flags::END_HEADERS)
    }

    pub fn rst_stream(stream_id: StreamId, error: ErrorCode) -> Self {
        Self::new(stream_id, FramePayload::RstStream(error))
    }

    pub fn settings(settings: Vec<(SettingsId, u32)>) -> Self {
        Self::new(StreamId::ROOT, FramePayload::Settings(settings))
    }

    pub fn settings_ack() -> Self {
        Self::new(StreamId::ROOT, FramePayload::Settings(Vec::new())).with_flags(flags::ACK)
    }

    pub fn ping(data: [u8; 8]) -> Self {
        Self::new(StreamId::ROOT, FramePayload::Ping(data))
    }

    pub fn ping_ack(data: [u8; 8]) -> Self {
        Self::ping(data).with_flags(flags::ACK)
    }

    pub fn goaway(last_stream: StreamId, error: ErrorCode, debug_data: Bytes) -> Self {
        Self::new(
            StreamId::ROOT,
            FramePayload::GoAway {
                last_stream,
                error,
                debug_data,
            },
        )
    }

    pub fn window_update(stream_id: StreamId, increment: u32) -> Self {
        Self::new(stream_id, FramePayload::WindowUpdate(increment))
    }
}
