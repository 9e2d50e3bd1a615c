//! Reply framing for the emulated camera protocol.
//!
//! Requests go out as raw NUL-terminated ASCII with no surrounding framing.
//! Replies come back as:
//! - 8 ASCII hexadecimal digits giving the payload length (no `0x`, no terminator)
//! - exactly that many opaque payload bytes
//!
//! Partial reads and partial writes are absorbed here; callers always get a
//! complete reply or an error.

pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{
    decode_size_header, encode_query, encode_size_header, FrameConfig, DEFAULT_MAX_PAYLOAD,
    HEADER_SIZE,
};
pub use error::{FrameError, Result};
pub use reader::ReplyReader;
pub use writer::MessageWriter;
