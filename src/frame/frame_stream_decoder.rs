use crate::constants::FRAME_HEADER_SIZE;
use crate::frame::{FrameCodec, FrameDecodeError, MalformedFrame, RawResponse};
use std::collections::VecDeque;

/// An incremental decoder for a continuous stream of response frames.
///
/// `FrameStreamDecoder` accepts bytes in whatever chunk sizes the transport
/// delivers them and emits complete frames in arrival order. A frame split
/// across reads is held back until its last byte arrives; several frames in a
/// single read are all emitted.
///
/// ### Faults
/// A header that fails to decode poisons the decoder. The error is emitted
/// once, buffered bytes are dropped, and every later call yields
/// `MalformedFrame(StreamFaulted)`. There is no attempt to scan for the next
/// start marker: body bytes can contain the marker value, so any
/// resynchronization would be a guess.
pub struct FrameStreamDecoder {
    buffer: Vec<u8>, // Holds partial frame data
    is_faulted: bool,
}

pub struct FrameDecoderIterator {
    queue: VecDeque<Result<RawResponse, FrameDecodeError>>,
}

impl Iterator for FrameDecoderIterator {
    type Item = Result<RawResponse, FrameDecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.queue.pop_front()
    }
}

impl Default for FrameStreamDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameStreamDecoder {
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            is_faulted: false,
        }
    }

    pub fn is_faulted(&self) -> bool {
        self.is_faulted
    }

    /// Bytes received but not yet part of an emitted frame.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Reads new bytes and attempts to decode them into frames.
    pub fn read_bytes(&mut self, data: &[u8]) -> FrameDecoderIterator {
        let mut queue = VecDeque::new();

        if self.is_faulted {
            queue.push_back(Err(MalformedFrame::StreamFaulted.into()));
            return FrameDecoderIterator { queue };
        }

        self.buffer.extend_from_slice(data);

        while self.buffer.len() >= FRAME_HEADER_SIZE {
            let header_bytes: [u8; FRAME_HEADER_SIZE] = match self.buffer[..FRAME_HEADER_SIZE]
                .try_into()
            {
                Ok(bytes) => bytes,
                Err(_) => break,
            };

            let header = match FrameCodec::decode_header(&header_bytes) {
                Ok(header) => header,
                Err(e) => {
                    tracing::error!(error = %e, "Undecodable frame header; stream faulted");
                    self.is_faulted = true;
                    self.buffer.clear();
                    queue.push_back(Err(e));
                    break;
                }
            };

            let total = FRAME_HEADER_SIZE + header.body_length as usize;
            if self.buffer.len() < total {
                break;
            }

            let body = self.buffer[FRAME_HEADER_SIZE..total].to_vec();
            self.buffer.drain(..total);

            queue.push_back(FrameCodec::decode_body(header, body));
        }

        FrameDecoderIterator { queue }
    }
}
