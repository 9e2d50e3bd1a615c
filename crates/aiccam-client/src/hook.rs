//! Completion hooks: the last step of every query.
//!
//! After the transport step a query hands the status it obtained, plus the
//! reply bytes, to a [`CompletionHook`]. Whatever the hook returns becomes the
//! query's final completion status.

use bytes::Bytes;

use crate::error::{ClientError, Result};

/// Finalizes a query.
///
/// `reply` is empty unless a reply was received. A hook may narrow it to the
/// data the caller should see.
pub trait CompletionHook {
    fn complete(&self, reply: &mut Bytes, status: Result<()>) -> Result<()>;
}

impl<F> CompletionHook for F
where
    F: Fn(&mut Bytes, Result<()>) -> Result<()>,
{
    fn complete(&self, reply: &mut Bytes, status: Result<()>) -> Result<()> {
        self(reply, status)
    }
}

/// Records the transport status as-is and leaves the reply untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordStatus;

impl CompletionHook for RecordStatus {
    fn complete(&self, _reply: &mut Bytes, status: Result<()>) -> Result<()> {
        status
    }
}

/// Status-prefixed replies, as sent by older camera services.
///
/// Every reply starts with `ok` or `ko`. Extra data follows a `:`
/// separator; a bare status is NUL-terminated, so the shortest valid reply
/// is 3 bytes. The reply is narrowed to the data after the separator, and a
/// `ko` status fails the query with [`ClientError::Rejected`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusPrefix;

impl StatusPrefix {
    const PREFIX_LEN: usize = 3;
}

impl CompletionHook for StatusPrefix {
    fn complete(&self, reply: &mut Bytes, status: Result<()>) -> Result<()> {
        status?;

        if reply.len() < Self::PREFIX_LEN {
            return Err(ClientError::MalformedReply(format!(
                "reply of {} bytes has no status",
                reply.len()
            )));
        }

        let accepted = match &reply[..2] {
            b"ok" => true,
            b"ko" => false,
            _ => return Err(ClientError::MalformedReply(lossy(reply))),
        };

        let separator = reply[2];
        if reply.len() > Self::PREFIX_LEN {
            if separator != b':' {
                return Err(ClientError::MalformedReply(lossy(reply)));
            }
            *reply = reply.slice(Self::PREFIX_LEN..);
        } else {
            if separator != 0 {
                return Err(ClientError::MalformedReply(lossy(reply)));
            }
            *reply = Bytes::new();
        }

        if accepted {
            Ok(())
        } else {
            Err(ClientError::Rejected(lossy(reply)))
        }
    }
}

fn lossy(bytes: &[u8]) -> String {
    let text = bytes.split(|b| *b == 0).next().unwrap_or_default();
    String::from_utf8_lossy(text).into_owned()
}
