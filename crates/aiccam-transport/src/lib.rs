//! Loopback TCP transport for the emulated camera service.
//!
//! This is the lowest layer of aiccam. It opens a single stream socket to
//! the camera service on `127.0.0.1:<port>` and applies the socket options
//! the request/response protocol relies on:
//! - a bounded receive timeout (10 seconds by default)
//! - `TCP_NODELAY`, so short command strings are not coalesced
//!
//! Everything else builds on top of the [`CameraStream`] type provided here.

pub mod error;
pub mod stream;
pub mod tcp;

pub use error::{Result, TransportError};
pub use stream::CameraStream;
pub use tcp::{LoopbackSocket, SocketConfig, DEFAULT_READ_TIMEOUT};
