mod frame_codec;
mod frame_error;
mod frame_header;
mod frame_stream_decoder;
mod raw_frame;

pub use frame_codec::FrameCodec;
pub use frame_error::{FrameDecodeError, MalformedFrame};
pub use frame_header::FrameHeader;
pub use frame_stream_decoder::{FrameDecoderIterator, FrameStreamDecoder};
pub use raw_frame::{RawRequest, RawResponse};
