use std::fmt;
use std::io;

use aiccam_client::{ClientError, ErrorKind};

// Process exit codes.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: &io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::ConnectionRefused => FAILURE,
        _ => TRANSPORT_ERROR,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn client_error(context: &str, err: ClientError) -> CliError {
    if let Some(source) = err.io_error() {
        let mapped = io_error(context, source);
        return CliError::new(mapped.code, format!("{context}: {err}"));
    }

    let code = match err {
        ClientError::Rejected(_) => FAILURE,
        _ => match err.kind() {
            ErrorKind::NotConnected
            | ErrorKind::AlreadyConnected
            | ErrorKind::SocketError
            | ErrorKind::ShortWrite => TRANSPORT_ERROR,
            ErrorKind::FramingError | ErrorKind::EmptyReply | ErrorKind::BufferTooSmall => {
                DATA_INVALID
            }
            ErrorKind::InvalidArgument => USAGE,
            ErrorKind::AllocationFailure => INTERNAL,
        },
    };
    CliError::new(code, format!("{context}: {err}"))
}
