use std::net::{Ipv4Addr, SocketAddrV4, TcpStream};
use std::time::Duration;

use tracing::debug;

use crate::error::{Result, TransportError};
use crate::stream::CameraStream;

/// Receive timeout applied to every connection unless overridden.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Socket options applied right after connecting.
#[derive(Debug, Clone)]
pub struct SocketConfig {
    /// Receive timeout. Default: 10 seconds.
    pub read_timeout: Option<Duration>,
    /// Send timeout. Default: none.
    pub write_timeout: Option<Duration>,
    /// Disable small-packet coalescing. Default: true.
    pub nodelay: bool,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            read_timeout: Some(DEFAULT_READ_TIMEOUT),
            write_timeout: None,
            nodelay: true,
        }
    }
}

/// Loopback TCP transport to the camera service.
///
/// The service only ever listens on the local host, so the address is fixed
/// to `127.0.0.1` and only the port varies.
pub struct LoopbackSocket;

impl LoopbackSocket {
    /// Connect to the camera service on `port` with default socket options.
    pub fn connect(port: u16) -> Result<CameraStream> {
        Self::connect_with_config(port, &SocketConfig::default())
    }

    /// Connect to the camera service on `port` (blocking, single attempt).
    pub fn connect_with_config(port: u16, config: &SocketConfig) -> Result<CameraStream> {
        let addr = SocketAddrV4::new(Ipv4Addr::LOCALHOST, port);
        let stream =
            TcpStream::connect(addr).map_err(|source| TransportError::Connect { port, source })?;

        stream
            .set_read_timeout(config.read_timeout)
            .map_err(|source| TransportError::SocketOption {
                option: "SO_RCVTIMEO",
                source,
            })?;
        stream
            .set_write_timeout(config.write_timeout)
            .map_err(|source| TransportError::SocketOption {
                option: "SO_SNDTIMEO",
                source,
            })?;
        stream
            .set_nodelay(config.nodelay)
            .map_err(|source| TransportError::SocketOption {
                option: "TCP_NODELAY",
                source,
            })?;

        debug!(port, "connected to camera service");
        Ok(CameraStream::from_tcp(stream))
    }

    /// Transport name for diagnostics.
    pub fn transport_name() -> &'static str {
        "loopback-tcp"
    }
}
