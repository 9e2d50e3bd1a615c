//! Client for the emulated camera service.
//!
//! aiccam speaks the camera service's request/response protocol over a
//! loopback TCP socket: short NUL-terminated text commands out, hex
//! size-prefixed binary replies back.
//!
//! # Crate Structure
//!
//! - [`transport`]: Loopback TCP connect with the protocol's socket options
//! - [`frame`]: Size header codec, reply reader and message writer
//! - [`client`]: Connection lifecycle, queries, completion hooks and the
//!   [`CameraClient`](client::CameraClient) command façade

/// Re-export transport types.
pub mod transport {
    pub use aiccam_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use aiccam_frame::*;
}

/// Re-export client types.
pub mod client {
    pub use aiccam_client::*;
}

pub use aiccam_client::{CameraClient, ClientError, ErrorKind, FrameParams};
