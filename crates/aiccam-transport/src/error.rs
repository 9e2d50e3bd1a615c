/// Errors that can occur in camera transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to connect to the camera service port.
    #[error("failed to connect to camera service on port {port}: {source}")]
    Connect { port: u16, source: std::io::Error },

    /// Failed to apply a socket option after connecting.
    #[error("failed to set socket option {option}: {source}")]
    SocketOption {
        option: &'static str,
        source: std::io::Error,
    },

    /// An I/O error occurred on the transport stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// The OS-level error underneath this transport failure.
    pub fn io_error(&self) -> &std::io::Error {
        match self {
            TransportError::Connect { source, .. } | TransportError::SocketOption { source, .. } => {
                source
            }
            TransportError::Io(source) => source,
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
