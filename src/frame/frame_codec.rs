use crate::{
    constants::{
        FRAME_API_VERSION, FRAME_BODY_LENGTH_OFFSET, FRAME_HEADER_SIZE, FRAME_REQUEST_ID_OFFSET,
        FRAME_START_MARKER, FRAME_START_MARKER_OFFSET, FRAME_STATUS_OFFSET, FRAME_TYPE_OFFSET,
        FRAME_VERSION_OFFSET, MAX_FRAME_BODY_LEN, REQUEST_BODY_PREFIX_SIZE, STATUS_OK,
    },
    frame::{FrameDecodeError, FrameHeader, MalformedFrame, RawRequest, RawResponse},
};

/// Provides encoding and decoding functionality for monitor frames.
///
/// Every frame is a 12-byte header followed by `body_length` body bytes:
///
/// ```text
/// u8   start marker (0x02)
/// u8   protocol version
/// u32  body length
/// u32  request id
/// u8   command / response type
/// u8   status (0 = success)
/// ```
///
/// Request bodies additionally repeat the request ID and command type in
/// their first five bytes, ahead of the command payload. All integers are
/// little-endian with no padding.
pub struct FrameCodec;

impl FrameCodec {
    /// Encodes a request frame.
    ///
    /// The declared body length covers the ID + command type prefix as well as
    /// `payload`, so a MemoryGet request (8 payload bytes) declares 13.
    pub fn encode(request_id: u32, command_type: u8, payload: &[u8]) -> Vec<u8> {
        let body_length = REQUEST_BODY_PREFIX_SIZE + payload.len();
        let mut buf = Vec::with_capacity(FRAME_HEADER_SIZE + body_length);

        Self::write_header(
            &mut buf,
            FrameHeader {
                version: FRAME_API_VERSION,
                body_length: body_length as u32,
                request_id,
                kind: command_type,
                status: STATUS_OK,
            },
        );

        buf.extend(&request_id.to_le_bytes());
        buf.push(command_type);
        buf.extend(payload);

        buf
    }

    /// Encodes a response frame, the way a monitor would send it.
    pub fn encode_response(request_id: u32, response_type: u8, status: u8, body: &[u8]) -> Vec<u8> {
        let mut buf = Vec::with_capacity(FRAME_HEADER_SIZE + body.len());

        Self::write_header(
            &mut buf,
            FrameHeader {
                version: FRAME_API_VERSION,
                body_length: body.len() as u32,
                request_id,
                kind: response_type,
                status,
            },
        );

        buf.extend(body);

        buf
    }

    fn write_header(buf: &mut Vec<u8>, header: FrameHeader) {
        buf.push(FRAME_START_MARKER);
        buf.push(header.version);
        buf.extend(&header.body_length.to_le_bytes());
        buf.extend(&header.request_id.to_le_bytes());
        buf.push(header.kind);
        buf.push(header.status);
    }

    /// Decodes the fixed-size header.
    ///
    /// Fails with `MalformedFrame` if the start marker is wrong, the version is
    /// not the one this client speaks, or the declared body is absurdly large.
    pub fn decode_header(buf: &[u8; FRAME_HEADER_SIZE]) -> Result<FrameHeader, FrameDecodeError> {
        let marker = buf[FRAME_START_MARKER_OFFSET];
        if marker != FRAME_START_MARKER {
            return Err(MalformedFrame::BadStartMarker(marker).into());
        }

        let version = buf[FRAME_VERSION_OFFSET];
        if version != FRAME_API_VERSION {
            return Err(MalformedFrame::UnsupportedVersion(version).into());
        }

        let body_length = u32::from_le_bytes([
            buf[FRAME_BODY_LENGTH_OFFSET],
            buf[FRAME_BODY_LENGTH_OFFSET + 1],
            buf[FRAME_BODY_LENGTH_OFFSET + 2],
            buf[FRAME_BODY_LENGTH_OFFSET + 3],
        ]);
        if body_length > MAX_FRAME_BODY_LEN {
            return Err(MalformedFrame::BodyTooLarge(body_length).into());
        }

        let request_id = u32::from_le_bytes([
            buf[FRAME_REQUEST_ID_OFFSET],
            buf[FRAME_REQUEST_ID_OFFSET + 1],
            buf[FRAME_REQUEST_ID_OFFSET + 2],
            buf[FRAME_REQUEST_ID_OFFSET + 3],
        ]);

        Ok(FrameHeader {
            version,
            body_length,
            request_id,
            kind: buf[FRAME_TYPE_OFFSET],
            status: buf[FRAME_STATUS_OFFSET],
        })
    }

    /// Pairs a decoded header with its body.
    ///
    /// The body must be exactly as long as the header declares; short or
    /// excess data is a `FrameLengthMismatch`.
    pub fn decode_body(header: FrameHeader, body: Vec<u8>) -> Result<RawResponse, FrameDecodeError> {
        Self::check_length(&header, &body)?;
        Ok(RawResponse::new(header, body))
    }

    /// Decodes a request body, verifying that its ID + command type prefix
    /// matches the copy in the header.
    pub fn decode_request(header: FrameHeader, body: Vec<u8>) -> Result<RawRequest, FrameDecodeError> {
        Self::check_length(&header, &body)?;

        if body.len() < REQUEST_BODY_PREFIX_SIZE {
            return Err(MalformedFrame::RequestPrefixMismatch.into());
        }

        let request_id = u32::from_le_bytes([body[0], body[1], body[2], body[3]]);
        let command_type = body[4];
        if request_id != header.request_id || command_type != header.kind {
            return Err(MalformedFrame::RequestPrefixMismatch.into());
        }

        Ok(RawRequest {
            request_id,
            command_type,
            payload: body[REQUEST_BODY_PREFIX_SIZE..].to_vec(),
        })
    }

    fn check_length(header: &FrameHeader, body: &[u8]) -> Result<(), FrameDecodeError> {
        if body.len() != header.body_length as usize {
            return Err(FrameDecodeError::FrameLengthMismatch {
                declared: header.body_length,
                actual: body.len(),
            });
        }
        Ok(())
    }
}
