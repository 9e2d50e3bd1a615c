use std::borrow::Cow;

use bytes::Bytes;
use tracing::{debug, error, error_span, warn};

use crate::connection::Connection;
use crate::error::{ClientError, ErrorKind, Result};
use crate::hook::CompletionHook;

/// Maximum query length in bytes, NUL terminator included.
pub const MAX_QUERY_LEN: usize = 256;

/// One request/response exchange with the camera service.
///
/// Holds the command, then, once executed, the completion status and the
/// reply bytes. A query runs at most once.
#[derive(Debug)]
pub struct Query {
    command: String,
    reply: Bytes,
    status: Option<std::result::Result<(), ErrorKind>>,
}

impl Query {
    /// Build a query for `command`.
    ///
    /// Fails with [`ClientError::QueryTooLong`] when the command plus its
    /// terminator exceeds [`MAX_QUERY_LEN`], and with
    /// [`ClientError::InvalidArgument`] when it contains a NUL byte.
    pub fn new(command: impl Into<String>) -> Result<Self> {
        let command = command.into();
        if command.as_bytes().contains(&0) {
            return Err(ClientError::InvalidArgument(format!(
                "query {command:?} contains a NUL byte"
            )));
        }
        let len = command.len() + 1;
        if len > MAX_QUERY_LEN {
            return Err(ClientError::QueryTooLong {
                len,
                max: MAX_QUERY_LEN,
            });
        }

        Ok(Self {
            command,
            reply: Bytes::new(),
            status: None,
        })
    }

    /// The command text, without terminator.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Send the command, wait for the reply and finalize through `hook`.
    ///
    /// The receive step is skipped if sending fails. The hook always runs,
    /// and its result is both returned and recorded as the completion
    /// status.
    pub fn execute<H>(&mut self, conn: &mut Connection, hook: &H) -> Result<()>
    where
        H: CompletionHook + ?Sized,
    {
        // Enabled at every level so failures logged below keep their command.
        let _span = error_span!("query", command = %self.command, port = conn.port()).entered();

        if self.status.is_some() {
            error!("query already completed");
            return Err(ClientError::QueryCompleted(self.command.clone()));
        }

        debug!("sending query");
        let status = match conn.send_query(&self.command) {
            Ok(()) => match conn.receive() {
                Ok(reply) => {
                    debug!(size = reply.len(), "query answered");
                    self.reply = reply;
                    Ok(())
                }
                Err(err) => {
                    error!(%err, "response to query has failed");
                    Err(err)
                }
            },
            Err(err) => {
                error!(%err, "send query failed");
                Err(err)
            }
        };

        let driver_kind = status.as_ref().err().map(ClientError::kind);
        let completed = hook.complete(&mut self.reply, status);
        let final_kind = completed.as_ref().err().map(ClientError::kind);
        if final_kind != driver_kind {
            warn!(
                driver = ?driver_kind,
                completion = ?final_kind,
                "query completion changed status"
            );
        }

        self.status = Some(match final_kind {
            Some(kind) => Err(kind),
            None => Ok(()),
        });
        completed
    }

    /// Final completion status; `None` until executed.
    pub fn completion_status(&self) -> Option<std::result::Result<(), ErrorKind>> {
        self.status
    }

    /// True iff the query completed without error.
    pub fn is_succeeded(&self) -> bool {
        matches!(self.status, Some(Ok(())))
    }

    /// Reply bytes; empty unless a reply was received.
    pub fn reply(&self) -> &[u8] {
        &self.reply
    }

    pub fn reply_size(&self) -> usize {
        self.reply.len()
    }

    /// Take the reply bytes, releasing the query.
    pub fn into_reply(self) -> Bytes {
        self.reply
    }

    /// Reply text for log lines, up to the first NUL.
    pub fn diagnostic(&self) -> Cow<'_, str> {
        let text = self.reply[..].split(|b| *b == 0).next().unwrap_or_default();
        if text.is_empty() {
            Cow::Borrowed("No error message")
        } else {
            String::from_utf8_lossy(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hook::{RecordStatus, StatusPrefix};
    use crate::test_support::{FakeService, Reply};

    #[test]
    fn construction_limits() {
        let longest = "x".repeat(MAX_QUERY_LEN - 1);
        assert!(Query::new(longest).is_ok());

        let too_long = "x".repeat(MAX_QUERY_LEN);
        let err = Query::new(too_long).unwrap_err();
        assert!(matches!(
            err,
            ClientError::QueryTooLong {
                len: 257,
                max: MAX_QUERY_LEN
            }
        ));
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let err = Query::new("stop\0start").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn fresh_query_has_no_status_or_reply() {
        let query = Query::new("infos").unwrap();
        assert_eq!(query.command(), "infos");
        assert_eq!(query.completion_status(), None);
        assert!(!query.is_succeeded());
        assert_eq!(query.reply_size(), 0);
        assert_eq!(query.diagnostic(), "No error message");
    }

    #[test]
    fn execute_stores_reply() {
        let service = FakeService::spawn(|_| Reply::text("W=640;H=480"));
        let mut conn = Connection::new();
        conn.connect(service.port).unwrap();

        let mut query = Query::new("infos").unwrap();
        query.execute(&mut conn, &RecordStatus).unwrap();
        assert!(query.is_succeeded());
        assert_eq!(query.completion_status(), Some(Ok(())));
        assert_eq!(query.reply(), b"W=640;H=480");
        assert_eq!(query.diagnostic(), "W=640;H=480");

        drop(conn);
        assert_eq!(service.join(), vec!["infos".to_string()]);
    }

    #[test]
    fn execute_without_connection_records_not_connected() {
        let mut conn = Connection::new();
        let mut query = Query::new("connect").unwrap();

        let err = query.execute(&mut conn, &RecordStatus).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotConnected);
        assert_eq!(
            query.completion_status(),
            Some(Err(ErrorKind::NotConnected))
        );
        assert!(!query.is_succeeded());
        assert!(query.reply().is_empty());
    }

    #[test]
    fn hook_runs_even_when_send_fails() {
        let mut conn = Connection::new();
        let mut query = Query::new("stop").unwrap();
        let calls = std::cell::Cell::new(0);
        let hook = |_: &mut Bytes, status: Result<()>| -> Result<()> {
            calls.set(calls.get() + 1);
            status
        };

        assert!(query.execute(&mut conn, &hook).is_err());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn failed_receive_leaves_reply_empty() {
        let service = FakeService::spawn(|_| Reply::RawThenClose(b"00000100partial".to_vec()));
        let mut conn = Connection::new();
        conn.connect(service.port).unwrap();

        let mut query = Query::new("frame video=256 preview=0 whiteb=1,1,1 expcomp=1").unwrap();
        let err = query.execute(&mut conn, &RecordStatus).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FramingError);
        assert_eq!(
            query.completion_status(),
            Some(Err(ErrorKind::FramingError))
        );
        assert_eq!(query.reply_size(), 0);

        drop(conn);
        service.join();
    }

    #[test]
    fn hook_result_wins() {
        let service = FakeService::spawn(|_| Reply::text("fine"));
        let mut conn = Connection::new();
        conn.connect(service.port).unwrap();

        let veto = |_: &mut Bytes, status: Result<()>| -> Result<()> {
            status?;
            Err(ClientError::InvalidArgument("vetoed by hook".to_string()))
        };
        let mut query = Query::new("connect").unwrap();
        let err = query.execute(&mut conn, &veto).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(
            query.completion_status(),
            Some(Err(ErrorKind::InvalidArgument))
        );
        assert_eq!(query.reply(), b"fine");

        drop(conn);
        service.join();
    }

    #[test]
    fn hook_can_clear_a_failure() {
        let mut conn = Connection::new();
        let forgive = |_: &mut Bytes, _: Result<()>| -> Result<()> { Ok(()) };

        let mut query = Query::new("disconnect").unwrap();
        query.execute(&mut conn, &forgive).unwrap();
        assert!(query.is_succeeded());
    }

    #[test]
    fn status_prefix_hook_narrows_reply() {
        let service = FakeService::spawn(|command| match command {
            "infos" => Reply::text("ok:name=webcam0 pix=842094169\0"),
            _ => Reply::text("ko:unknown query\0"),
        });
        let mut conn = Connection::new();
        conn.connect(service.port).unwrap();

        let mut query = Query::new("infos").unwrap();
        query.execute(&mut conn, &StatusPrefix).unwrap();
        assert_eq!(query.reply(), b"name=webcam0 pix=842094169\0");

        let mut query = Query::new("zoom").unwrap();
        let err = query.execute(&mut conn, &StatusPrefix).unwrap_err();
        assert!(matches!(err, ClientError::Rejected(ref m) if m == "unknown query"));
        assert_eq!(query.diagnostic(), "unknown query");

        drop(conn);
        service.join();
    }

    #[test]
    fn executed_query_cannot_run_again() {
        let service = FakeService::spawn(|_| Reply::empty());
        let mut conn = Connection::new();
        conn.connect(service.port).unwrap();

        let mut query = Query::new("stop").unwrap();
        query.execute(&mut conn, &RecordStatus).unwrap();
        let err = query.execute(&mut conn, &RecordStatus).unwrap_err();
        assert!(matches!(err, ClientError::QueryCompleted(_)));
        assert!(query.is_succeeded());

        drop(conn);
        assert_eq!(service.join(), vec!["stop".to_string()]);
    }
}
