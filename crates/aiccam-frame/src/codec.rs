use bytes::{BufMut, BytesMut};

use crate::error::{FrameError, Result};

/// Reply header: payload length as 8 ASCII hex digits.
pub const HEADER_SIZE: usize = 8;

/// Default maximum payload size accepted from the service: 128 MiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 128 * 1024 * 1024;

/// Encode a payload length as the 8-digit uppercase hex size header.
pub fn encode_size_header(size: u32) -> [u8; HEADER_SIZE] {
    const DIGITS: &[u8; 16] = b"0123456789ABCDEF";

    let mut header = [b'0'; HEADER_SIZE];
    let mut value = size;
    for slot in header.iter_mut().rev() {
        *slot = DIGITS[(value & 0xF) as usize];
        value >>= 4;
    }
    header
}

/// Decode the 8-digit hex size header.
///
/// Accepts upper and lower case digits. Anything else, including signs,
/// whitespace or a `0x` prefix, is rejected.
pub fn decode_size_header(header: &[u8; HEADER_SIZE]) -> Result<u32> {
    let mut size = 0u32;
    for &byte in header {
        let digit = match byte {
            b'0'..=b'9' => byte - b'0',
            b'a'..=b'f' => byte - b'a' + 10,
            b'A'..=b'F' => byte - b'A' + 10,
            _ => {
                return Err(FrameError::InvalidSizeHeader {
                    header: String::from_utf8_lossy(header).into_owned(),
                })
            }
        };
        size = (size << 4) | u32::from(digit);
    }
    Ok(size)
}

/// Encode a query command into its wire form: the ASCII text followed by a
/// single NUL terminator.
///
/// Wire format:
/// ```text
/// ┌──────────────────────────────┬──────┐
/// │ Command text (ASCII)         │ 0x00 │
/// └──────────────────────────────┴──────┘
/// ```
pub fn encode_query(command: &str, dst: &mut BytesMut) {
    dst.reserve(command.len() + 1);
    dst.put_slice(command.as_bytes());
    dst.put_u8(0);
}

/// Configuration for reply framing.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload size in bytes. Default: 128 MiB.
    pub max_payload_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
        }
    }
}
