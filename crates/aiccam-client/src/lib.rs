//! Query/response client for the emulated camera service.
//!
//! This is the "just works" layer. Open one connection to the local camera
//! service, then drive it with named commands (`connect`, `infos`, `start`,
//! `frame`, `stop`, `disconnect`). Each command is one [`Query`]: a command
//! string, its completion status and the reply bytes.
//!
//! The client is synchronous and holds a single connection with at most one
//! query in flight. Sharing a [`CameraClient`] across threads requires
//! external synchronization.

pub mod camera;
pub mod connection;
pub mod error;
pub mod hook;
pub mod query;

#[cfg(test)]
mod test_support;

pub use camera::{
    CameraClient, CameraState, FrameParams, QUERY_CONNECT, QUERY_DISCONNECT, QUERY_FRAME,
    QUERY_INFO, QUERY_START, QUERY_STOP,
};
pub use connection::{ClientConfig, Connection};
pub use error::{ClientError, ErrorKind, Result};
pub use hook::{CompletionHook, RecordStatus, StatusPrefix};
pub use query::{Query, MAX_QUERY_LEN};
