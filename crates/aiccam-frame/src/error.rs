/// Errors that can occur while framing requests and replies.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The stream ended before the 8-byte size header was complete.
    #[error("connection closed after {received} of 8 size header bytes")]
    TruncatedHeader { received: usize },

    /// The size header is not 8 hexadecimal digits.
    #[error("invalid reply size header {header:?}")]
    InvalidSizeHeader { header: String },

    /// The declared payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The stream ended before the declared payload was complete.
    #[error("read size {received} doesn't match expected payload size {expected}")]
    TruncatedPayload { expected: usize, received: usize },

    /// The reply buffer could not be reserved.
    #[error("unable to allocate {size} bytes payload buffer")]
    Allocation { size: usize },

    /// The peer stopped accepting bytes before the whole message was written.
    #[error("short write ({written} of {expected} bytes)")]
    ShortWrite { written: usize, expected: usize },

    /// An I/O error occurred while reading or writing.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FrameError>;
