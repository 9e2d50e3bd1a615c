use std::fmt;

use aiccam_frame::FrameError;
use aiccam_transport::TransportError;

/// Errors that can occur in camera client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// No connection to the camera service is open.
    #[error("camera client is not connected")]
    NotConnected,

    /// A connection to the camera service is already open.
    #[error("camera client is already connected")]
    AlreadyConnected,

    /// The command does not fit the query buffer.
    #[error("query too long ({len} bytes with terminator, max {max})")]
    QueryTooLong { len: usize, max: usize },

    /// A caller-supplied value cannot be sent to the service.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The query already ran to completion.
    #[error("query {0:?} already completed")]
    QueryCompleted(String),

    /// The service returned no data where data was required.
    #[error("no data returned for query {0:?}")]
    EmptyReply(String),

    /// The reply is too small for a requested output buffer.
    #[error("reply {available} bytes is too small to contain {requested} bytes {target} frame")]
    BufferTooSmall {
        target: &'static str,
        available: usize,
        requested: usize,
    },

    /// An output buffer could not be allocated.
    #[error("unable to allocate {0} bytes output buffer")]
    Allocation(usize),

    /// The service answered the query with a failure status.
    #[error("query rejected by camera service: {0}")]
    Rejected(String),

    /// The reply does not follow the expected envelope.
    #[error("malformed reply: {0}")]
    MalformedReply(String),
}

impl ClientError {
    /// Flat status code for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Transport(_) => ErrorKind::SocketError,
            ClientError::Frame(err) => match err {
                FrameError::Io(_) => ErrorKind::SocketError,
                FrameError::ShortWrite { .. } => ErrorKind::ShortWrite,
                FrameError::Allocation { .. } => ErrorKind::AllocationFailure,
                FrameError::TruncatedHeader { .. }
                | FrameError::InvalidSizeHeader { .. }
                | FrameError::PayloadTooLarge { .. }
                | FrameError::TruncatedPayload { .. } => ErrorKind::FramingError,
            },
            ClientError::NotConnected => ErrorKind::NotConnected,
            ClientError::AlreadyConnected => ErrorKind::AlreadyConnected,
            ClientError::QueryTooLong { .. }
            | ClientError::InvalidArgument(_)
            | ClientError::QueryCompleted(_)
            | ClientError::Rejected(_) => ErrorKind::InvalidArgument,
            ClientError::EmptyReply(_) => ErrorKind::EmptyReply,
            ClientError::BufferTooSmall { .. } => ErrorKind::BufferTooSmall,
            ClientError::Allocation(_) => ErrorKind::AllocationFailure,
            ClientError::MalformedReply(_) => ErrorKind::FramingError,
        }
    }

    /// The OS-level error underneath this failure, if there is one.
    pub fn io_error(&self) -> Option<&std::io::Error> {
        match self {
            ClientError::Transport(err) => Some(err.io_error()),
            ClientError::Frame(FrameError::Io(err)) => Some(err),
            _ => None,
        }
    }
}

/// Status codes surfaced by every client operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotConnected,
    AlreadyConnected,
    /// Socket creation, connect, read or write failed at the OS level.
    SocketError,
    ShortWrite,
    /// Malformed or short size header, or incomplete payload.
    FramingError,
    EmptyReply,
    BufferTooSmall,
    AllocationFailure,
    InvalidArgument,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NotConnected => "not-connected",
            ErrorKind::AlreadyConnected => "already-connected",
            ErrorKind::SocketError => "socket-error",
            ErrorKind::ShortWrite => "short-write",
            ErrorKind::FramingError => "framing-error",
            ErrorKind::EmptyReply => "empty-reply",
            ErrorKind::BufferTooSmall => "buffer-too-small",
            ErrorKind::AllocationFailure => "allocation-failure",
            ErrorKind::InvalidArgument => "invalid-argument",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_errors_map_to_status_codes() {
        let cases = [
            (
                FrameError::TruncatedHeader { received: 3 },
                ErrorKind::FramingError,
            ),
            (
                FrameError::TruncatedPayload {
                    expected: 10,
                    received: 2,
                },
                ErrorKind::FramingError,
            ),
            (
                FrameError::ShortWrite {
                    written: 1,
                    expected: 6,
                },
                ErrorKind::ShortWrite,
            ),
            (FrameError::Allocation { size: 8 }, ErrorKind::AllocationFailure),
            (
                FrameError::Io(std::io::Error::from(std::io::ErrorKind::TimedOut)),
                ErrorKind::SocketError,
            ),
        ];
        for (err, kind) in cases {
            assert_eq!(ClientError::from(err).kind(), kind);
        }
    }

    #[test]
    fn transport_error_keeps_os_error() {
        let err = ClientError::from(TransportError::Connect {
            port: 5556,
            source: std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
        });
        assert_eq!(err.kind(), ErrorKind::SocketError);
        assert_eq!(
            err.io_error().map(std::io::Error::kind),
            Some(std::io::ErrorKind::ConnectionRefused)
        );
    }

    #[test]
    fn buffer_too_small_message_names_target() {
        let err = ClientError::BufferTooSmall {
            target: "preview",
            available: 49,
            requested: 50,
        };
        assert_eq!(
            err.to_string(),
            "reply 49 bytes is too small to contain 50 bytes preview frame"
        );
        assert_eq!(err.kind().to_string(), "buffer-too-small");
    }
}
