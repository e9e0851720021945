//! Stateful frame codec: bytes in, frames out, and the reverse.
//!
//! One codec per connection. It owns the connection's HPACK encoder and
//! decoder (RFC 7541 defines one compression context per direction) and the
//! bounded map of streams it has seen.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::FrameError;
use crate::frame::{
    flags, ErrorCode, Frame, FrameHeader, FramePayload, FrameType, HeaderList, PriorityData,
    SettingsId, FRAME_HEADER_SIZE, MAX_FRAME_SIZE_LIMIT,
};
use crate::hpack;
use crate::stream::{StreamId, StreamMap, DEFAULT_MAX_TRACKED_STREAMS};

/// Smallest legal SETTINGS_MAX_FRAME_SIZE value, 2^14.
const MIN_MAX_FRAME_SIZE: u32 = 1 << 14;

pub struct FrameCodec {
    hpack_encoder: hpack::Encoder,
    hpack_decoder: hpack::Decoder,
    streams: StreamMap,
    strict_streams: bool,
}

impl FrameCodec {
    pub fn new() -> Self {
        Self::with_max_streams(DEFAULT_MAX_TRACKED_STREAMS)
    }

    pub fn with_max_streams(max_streams: usize) -> Self {
        Self {
            hpack_encoder: hpack::Encoder::new(),
            hpack_decoder: hpack::Decoder::new(),
            streams: StreamMap::new(max_streams),
            strict_streams: false,
        }
    }

    /// Make frames that reference an evicted stream fail with
    /// [`FrameError::NoSuchStream`] instead of recreating the entry.
    pub fn strict_streams(mut self, strict: bool) -> Self {
        self.strict_streams = strict;
        self
    }

    /// Apply our announced SETTINGS_HEADER_TABLE_SIZE to the decode side.
    pub fn set_decoder_table_size(&mut self, size: usize) {
        self.hpack_decoder.set_max_table_size(size);
    }

    /// Apply the peer's SETTINGS_HEADER_TABLE_SIZE to the encode side. The
    /// required size-update representation is queued for the next header
    /// block we emit.
    pub fn set_encoder_table_size(&mut self, size: usize) {
        self.hpack_encoder.set_max_dynamic_table_size(size, true);
    }

    /// Caller's notification that a stream closed; its bookkeeping becomes
    /// evictable.
    pub fn stream_closed(&mut self, id: StreamId) {
        self.streams.mark_inactive(id);
    }

    /// Decode one frame from the front of `src`.
    ///
    /// With too few bytes for the whole frame this returns
    /// [`FrameError::Incomplete`] and leaves `src` untouched. In every other
    /// case (success, protocol error, unknown type) the frame's bytes are
    /// consumed.
    pub fn decode(&mut self, src: &mut BytesMut) -> Result<Frame, FrameError> {
        let header = FrameHeader::parse(&src[..]).ok_or(FrameError::Incomplete)?;
        let total = FRAME_HEADER_SIZE + header.length as usize;
        if src.len() < total {
            return Err(FrameError::Incomplete);
        }

        let result = self.decode_payload(&header, &src[FRAME_HEADER_SIZE..total]);
        src.advance(total);

        if let Err(FrameError::Protocol { code, reason }) = &result {
            tracing::debug!(code = ?code, reason = %reason, "rejecting malformed frame");
        }
        result
    }

    fn decode_payload(
        &mut self,
        header: &FrameHeader,
        payload: &[u8],
    ) -> Result<Frame, FrameError> {
        if let FrameType::Unknown(ty) = header.frame_type {
            tracing::trace!(frame_type = ty, "skipping frame of unknown type");
            return Err(FrameError::UnknownType(ty));
        }

        self.streams.touch(header.stream_id, self.strict_streams)?;
        tracing::trace!(
            frame_type = ?header.frame_type,
            stream = header.stream_id.value(),
            len = header.length,
            "decoding frame"
        );

        let payload = match header.frame_type {
            FrameType::Data => Self::decode_data(header, payload)?,
            FrameType::Headers => self.decode_headers(header, payload)?,
            FrameType::Priority => Self::decode_priority(header, payload)?,
            FrameType::RstStream => Self::decode_rst_stream(header, payload)?,
            FrameType::Settings => Self::decode_settings(header, payload)?,
            FrameType::PushPromise => self.decode_push_promise(header, payload)?,
            FrameType::Ping => Self::decode_ping(header, payload)?,
            FrameType::GoAway => Self::decode_goaway(header, payload)?,
            FrameType::WindowUpdate => Self::decode_window_update(header, payload)?,
            FrameType::Continuation => self.decode_continuation(header, payload)?,
            FrameType::Unknown(_) => unreachable!("handled above"),
        };

        Ok(Frame {
            stream_id: header.stream_id,
            flags: header.flags & payload.allowed_flags(),
            payload,
        })
    }

    fn decode_data(header: &FrameHeader, payload: &[u8]) -> Result<FramePayload, FrameError> {
        require_stream(header, "DATA frame on stream 0")?;
        let data = split_padding(payload, header.flags)?;
        Ok(FramePayload::Data {
            data: Bytes::copy_from_slice(data),
        })
    }

    fn decode_headers(
        &mut self,
        header: &FrameHeader,
        payload: &[u8],
    ) -> Result<FramePayload, FrameError> {
        require_stream(header, "HEADERS frame on stream 0")?;
        let mut rest = split_padding(payload, header.flags)?;

        let priority = if header.flags & flags::PRIORITY != 0 {
            if rest.len() < 5 {
                return Err(FrameError::protocol(
                    ErrorCode::FrameSizeError,
                    "HEADERS too short for priority section",
                ));
            }
            let (priority, tail) = parse_priority(rest);
            rest = tail;
            Some(priority)
        } else {
            None
        };

        let headers = self.hpack_decoder.decode(rest)?;
        Ok(FramePayload::Headers { priority, headers })
    }

    fn decode_priority(header: &FrameHeader, payload: &[u8]) -> Result<FramePayload, FrameError> {
        require_stream(header, "PRIORITY frame on stream 0")?;
        if payload.len() != 5 {
            return Err(FrameError::protocol(
                ErrorCode::FrameSizeError,
                "PRIORITY payload must be 5 bytes",
            ));
        }
        let (priority, _) = parse_priority(payload);
        if priority.dependency == header.stream_id {
            return Err(FrameError::protocol(
                ErrorCode::ProtocolError,
                "stream cannot depend on itself",
            ));
        }
        Ok(FramePayload::Priority(priority))
    }

    fn decode_rst_stream(header: &FrameHeader, payload: &[u8]) -> Result<FramePayload, FrameError> {
        require_stream(header, "RST_STREAM frame on stream 0")?;
        if payload.len() != 4 {
            return Err(FrameError::protocol(
                ErrorCode::FrameSizeError,
                "RST_STREAM payload must be 4 bytes",
            ));
        }
        let code = u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]);
        Ok(FramePayload::RstStream(ErrorCode::from(code)))
    }

    fn decode_settings(header: &FrameHeader, payload: &[u8]) -> Result<FramePayload, FrameError> {
        require_root(header, "SETTINGS frame on a stream")?;
        if header.flags & flags::ACK != 0 && !payload.is_empty() {
            return Err(FrameError::protocol(
                ErrorCode::FrameSizeError,
                "SETTINGS ACK with payload",
            ));
        }
        if payload.len() % 6 != 0 {
            return Err(FrameError::protocol(
                ErrorCode::FrameSizeError,
                "SETTINGS payload not a multiple of 6",
            ));
        }

        let mut settings = Vec::with_capacity(payload.len() / 6);
        for chunk in payload.chunks_exact(6) {
            let id = SettingsId::from(u16::from_be_bytes([chunk[0], chunk[1]]));
            let value = u32::from_be_bytes([chunk[2], chunk[3], chunk[4], chunk[5]]);
            validate_setting(id, value)?;
            settings.push((id, value));
        }
        Ok(FramePayload::Settings(settings))
    }

    fn decode_push_promise(
        &mut self,
        header: &FrameHeader,
        payload: &[u8],
    ) -> Result<FramePayload, FrameError> {
        require_stream(header, "PUSH_PROMISE frame on stream 0")?;
        let rest = split_padding(payload, header.flags)?;
        if rest.len() < 4 {
            return Err(FrameError::protocol(
                ErrorCode::FrameSizeError,
                "PUSH_PROMISE too short for promised stream",
            ));
        }
        let promised = StreamId::new(u32::from_be_bytes([rest[0], rest[1], rest[2], rest[3]]));
        if promised.is_root() || promised.value() <= header.stream_id.value() {
            return Err(FrameError::protocol(
                ErrorCode::ProtocolError,
                "promised stream must be newer than its parent",
            ));
        }
        self.streams.touch(promised, false)?;

        let headers = self.hpack_decoder.decode(&rest[4..])?;
        Ok(FramePayload::PushPromise { promised, headers })
    }

    fn decode_ping(header: &FrameHeader, payload: &[u8]) -> Result<FramePayload, FrameError> {
        require_root(header, "PING frame on a stream")?;
        if payload.len() != 8 {
            return Err(FrameError::protocol(
                ErrorCode::FrameSizeError,
                "PING payload must be 8 bytes",
            ));
        }
        let mut data = [0u8; 8];
        data.copy_from_slice(payload);
        Ok(FramePayload::Ping(data))
    }

    fn decode_goaway(header: &FrameHeader, payload: &[u8]) -> Result<FramePayload, FrameError> {
        require_root(header, "GOAWAY frame on a stream")?;
        if payload.len() < 8 {
            return Err(FrameError::protocol(
                ErrorCode::FrameSizeError,
                "GOAWAY too short for last stream and error code",
            ));
        }
        let last_stream =
            StreamId::new(u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]));
        let error =
            ErrorCode::from(u32::from_be_bytes([payload[4], payload[5], payload[6], payload[7]]));
        Ok(FramePayload::GoAway {
            last_stream,
            error,
            debug_data: Bytes::copy_from_slice(&payload[8..]),
        })
    }

    fn decode_window_update(
        header: &FrameHeader,
        payload: &[u8],
    ) -> Result<FramePayload, FrameError> {
        if payload.len() != 4 {
            return Err(FrameError::protocol(
                ErrorCode::FrameSizeError,
                "WINDOW_UPDATE payload must be 4 bytes",
            ));
        }
        let increment =
            u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]) & 0x7fff_ffff;
        if increment == 0 {
            return Err(FrameError::protocol(
                ErrorCode::ProtocolError,
                "WINDOW_UPDATE increment of zero",
            ));
        }
        Ok(FramePayload::WindowUpdate(increment))
    }

    fn decode_continuation(
        &mut self,
        header: &FrameHeader,
        payload: &[u8],
    ) -> Result<FramePayload, FrameError> {
        require_stream(header, "CONTINUATION frame on stream 0")?;
        let headers = self.hpack_decoder.decode(payload)?;
        Ok(FramePayload::Continuation { headers })
    }

    /// Encode one frame onto the end of `dst`.
    ///
    /// DATA bytes and GOAWAY debug data are not copied into `dst`; they come
    /// back as the returned tail for the transport to write after it. The
    /// back-filled length field already accounts for them.
    pub fn encode(&mut self, frame: &Frame, dst: &mut BytesMut) -> Result<Option<Bytes>, FrameError> {
        let start = dst.len();
        dst.reserve(FRAME_HEADER_SIZE);
        dst.put_bytes(0, 3); // length, back-filled below
        dst.put_u8(frame.frame_type().into());
        dst.put_u8(effective_flags(frame));
        dst.put_u32(frame.stream_id.value());

        self.streams.touch(frame.stream_id, false)?;

        let mut tail: Option<Bytes> = None;
        match &frame.payload {
            FramePayload::Data { data } => {
                debug_assert!(!frame.stream_id.is_root(), "DATA on stream 0");
                tail = Some(data.clone());
            }
            FramePayload::Headers { priority, headers } => {
                debug_assert!(!frame.stream_id.is_root(), "HEADERS on stream 0");
                if let Some(priority) = priority {
                    put_priority(dst, priority);
                }
                let block = self.encode_header_block(headers);
                dst.extend_from_slice(&block);
            }
            FramePayload::Priority(priority) => {
                debug_assert!(!frame.stream_id.is_root(), "PRIORITY on stream 0");
                put_priority(dst, priority);
            }
            FramePayload::RstStream(code) => {
                debug_assert!(!frame.stream_id.is_root(), "RST_STREAM on stream 0");
                dst.put_u32((*code).into());
            }
            FramePayload::Settings(settings) => {
                debug_assert!(frame.stream_id.is_root(), "SETTINGS on a stream");
                debug_assert!(
                    settings.is_empty() || frame.flags & flags::ACK == 0,
                    "SETTINGS ACK carrying values"
                );
                for &(id, value) in settings {
                    validate_setting(id, value)?;
                    dst.put_u16(id.into());
                    dst.put_u32(value);
                }
            }
            FramePayload::PushPromise { promised, headers } => {
                debug_assert!(!frame.stream_id.is_root(), "PUSH_PROMISE on stream 0");
                debug_assert!(
                    promised.value() > frame.stream_id.value(),
                    "promised stream must be newer than its parent"
                );
                dst.put_u32(promised.value());
                let block = self.encode_header_block(headers);
                dst.extend_from_slice(&block);
            }
            FramePayload::Ping(data) => {
                debug_assert!(frame.stream_id.is_root(), "PING on a stream");
                dst.extend_from_slice(data);
            }
            FramePayload::GoAway {
                last_stream,
                error,
                debug_data,
            } => {
                debug_assert!(frame.stream_id.is_root(), "GOAWAY on a stream");
                dst.put_u32(last_stream.value());
                dst.put_u32((*error).into());
                tail = Some(debug_data.clone());
            }
            FramePayload::WindowUpdate(increment) => {
                if *increment == 0 {
                    return Err(FrameError::protocol(
                        ErrorCode::ProtocolError,
                        "WINDOW_UPDATE increment of zero",
                    ));
                }
                dst.put_u32(increment & 0x7fff_ffff);
            }
            FramePayload::Continuation { headers } => {
                debug_assert!(!frame.stream_id.is_root(), "CONTINUATION on stream 0");
                let block = self.encode_header_block(headers);
                dst.extend_from_slice(&block);
            }
        }

        let length =
            dst.len() - start - FRAME_HEADER_SIZE + tail.as_ref().map_or(0, |t| t.len());
        debug_assert!(length <= MAX_FRAME_SIZE_LIMIT as usize, "oversized frame");
        dst[start] = (length >> 16) as u8;
        dst[start + 1] = (length >> 8) as u8;
        dst[start + 2] = length as u8;

        Ok(tail)
    }

    fn encode_header_block(&mut self, headers: &HeaderList) -> Vec<u8> {
        for (name, value) in headers {
            self.hpack_encoder.append(name, value);
        }
        self.hpack_encoder.take_block()
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

/// Outbound flags: the PRIORITY bit follows the payload, and PADDED is
/// cleared because this codec never emits padding.
fn effective_flags(frame: &Frame) -> u8 {
    let mut f = frame.flags & frame.payload.allowed_flags() & !flags::PADDED;
    if let FramePayload::Headers { priority, .. } = &frame.payload {
        if priority.is_some() {
            f |= flags::PRIORITY;
        } else {
            f &= !flags::PRIORITY;
        }
    }
    f
}

fn require_stream(header: &FrameHeader, reason: &'static str) -> Result<(), FrameError> {
    if header.stream_id.is_root() {
        return Err(FrameError::protocol(ErrorCode::ProtocolError, reason));
    }
    Ok(())
}

fn require_root(header: &FrameHeader, reason: &'static str) -> Result<(), FrameError> {
    if !header.stream_id.is_root() {
        return Err(FrameError::protocol(ErrorCode::ProtocolError, reason));
    }
    Ok(())
}

/// Strip the pad-length octet and trailing padding when PADDED is set.
fn split_padding(payload: &[u8], frame_flags: u8) -> Result<&[u8], FrameError> {
    if frame_flags & flags::PADDED == 0 {
        return Ok(payload);
    }
    let (&pad_len, rest) = payload
        .split_first()
        .ok_or_else(|| FrameError::protocol(ErrorCode::ProtocolError, "padded frame missing pad length"))?;
    let pad_len = pad_len as usize;
    if pad_len > rest.len() {
        return Err(FrameError::protocol(
            ErrorCode::ProtocolError,
            "padding exceeds frame payload",
        ));
    }
    Ok(&rest[..rest.len() - pad_len])
}

/// Read a 5-byte priority section; the caller has checked the length.
fn parse_priority(payload: &[u8]) -> (PriorityData, &[u8]) {
    let word = u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]);
    let priority = PriorityData {
        exclusive: word & 0x8000_0000 != 0,
        dependency: StreamId::new(word),
        weight: payload[4],
    };
    (priority, &payload[5..])
}

fn put_priority(dst: &mut BytesMut, priority: &PriorityData) {
    let mut word = priority.dependency.value();
    if priority.exclusive {
        word |= 0x8000_0000;
    }
    dst.put_u32(word);
    dst.put_u8(priority.weight);
}

fn validate_setting(id: SettingsId, value: u32) -> Result<(), FrameError> {
    match id {
        SettingsId::InitialWindowSize if value > 0x7fff_ffff => Err(FrameError::protocol(
            ErrorCode::FlowControlError,
            "SETTINGS_INITIAL_WINDOW_SIZE above 2^31-1",
        )),
        SettingsId::MaxFrameSize if !(MIN_MAX_FRAME_SIZE..=MAX_FRAME_SIZE_LIMIT).contains(&value) => {
            Err(FrameError::protocol(
                ErrorCode::ProtocolError,
                "SETTINGS_MAX_FRAME_SIZE out of range",
            ))
        }
        SettingsId::EnablePush if value > 1 => Err(FrameError::protocol(
            ErrorCode::ProtocolError,
            "SETTINGS_ENABLE_PUSH must be 0 or 1",
        )),
        _ => Ok(()),
    }
}
