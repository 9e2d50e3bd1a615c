use aiccam_frame::{FrameConfig, MessageWriter, ReplyReader};
use aiccam_transport::{CameraStream, LoopbackSocket, SocketConfig};
use bytes::Bytes;
use tracing::{debug, error};

use crate::error::{ClientError, Result};

/// Configuration for a camera service connection.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// Socket options applied on connect.
    pub socket: SocketConfig,
    /// Reply framing limits.
    pub frame: FrameConfig,
}

struct Link {
    port: u16,
    reader: ReplyReader<CameraStream>,
    writer: MessageWriter<CameraStream>,
}

/// The single connection to the camera service.
///
/// Either fully connected or fully closed. The socket is closed by
/// [`disconnect`](Connection::disconnect) or when the connection is dropped.
pub struct Connection {
    link: Option<Link>,
    config: ClientConfig,
}

impl Connection {
    /// Create a closed connection with default configuration.
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    /// Create a closed connection with explicit configuration.
    pub fn with_config(config: ClientConfig) -> Self {
        Self { link: None, config }
    }

    /// Connect to the camera service on the loopback `port`.
    ///
    /// A single attempt; retrying is up to the caller. Fails with
    /// [`ClientError::AlreadyConnected`] and leaves the open connection
    /// untouched if one exists.
    pub fn connect(&mut self, port: u16) -> Result<()> {
        if let Some(link) = &self.link {
            error!(port, open_port = link.port, "camera client is already connected");
            return Err(ClientError::AlreadyConnected);
        }

        let stream = LoopbackSocket::connect_with_config(port, &self.config.socket)
            .inspect_err(|err| error!(port, %err, "unable to connect to the camera service"))?;
        let reader_stream = stream.try_clone()?;

        self.link = Some(Link {
            port,
            reader: ReplyReader::with_config(reader_stream, self.config.frame.clone()),
            writer: MessageWriter::new(stream),
        });
        debug!(port, "camera client connected");
        Ok(())
    }

    /// Close the connection. A no-op when nothing is open.
    pub fn disconnect(&mut self) {
        if let Some(link) = self.link.take() {
            if let Err(err) = link.writer.get_ref().shutdown() {
                debug!(port = link.port, %err, "socket shutdown failed");
            }
            debug!(port = link.port, "camera client disconnected");
        }
    }

    /// Whether a connection is open.
    pub fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    /// Port of the open connection.
    pub fn port(&self) -> Option<u16> {
        self.link.as_ref().map(|link| link.port)
    }

    /// Current configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send raw message bytes in full.
    pub fn send(&mut self, data: &[u8]) -> Result<()> {
        let link = self.link_mut()?;
        link.writer.send(data).map_err(|err| {
            error!(size = data.len(), %err, "unable to write message");
            err.into()
        })
    }

    /// Send a command as NUL-terminated text.
    pub fn send_query(&mut self, command: &str) -> Result<()> {
        let link = self.link_mut()?;
        link.writer.send_query(command).map_err(|err| {
            error!(query = command, %err, "unable to write query");
            err.into()
        })
    }

    /// Receive one size-prefixed reply.
    pub fn receive(&mut self) -> Result<Bytes> {
        let link = self.link_mut()?;
        link.reader.read_reply().map_err(|err| {
            error!(%err, "unable to receive reply");
            err.into()
        })
    }

    fn link_mut(&mut self) -> Result<&mut Link> {
        self.link.as_mut().ok_or_else(|| {
            error!("camera client is not connected");
            ClientError::NotConnected
        })
    }
}

impl Default for Connection {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("port", &self.port())
            .field("config", &self.config)
            .finish()
    }
}
