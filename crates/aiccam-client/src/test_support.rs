//! In-process stand-in for the camera service, for tests.

use std::io::{BufRead, BufReader, Write};
use std::net::{Ipv4Addr, TcpListener};
use std::thread::{self, JoinHandle};

use aiccam_frame::encode_size_header;

/// What the fake service does in answer to one command.
pub(crate) enum Reply {
    /// Send a well-formed reply carrying this payload.
    Payload(Vec<u8>),
    /// Send these bytes verbatim, then close the connection.
    RawThenClose(Vec<u8>),
    /// Close the connection without answering.
    Close,
}

impl Reply {
    pub(crate) fn text(text: &str) -> Self {
        Reply::Payload(text.as_bytes().to_vec())
    }

    pub(crate) fn empty() -> Self {
        Reply::Payload(Vec::new())
    }
}

/// A single-connection service running on a background thread.
pub(crate) struct FakeService {
    pub(crate) port: u16,
    handle: JoinHandle<Vec<String>>,
}

impl FakeService {
    /// Accept one connection and answer each NUL-terminated command with
    /// `respond`. The thread ends when the client hangs up or a reply
    /// closes the connection.
    pub(crate) fn spawn<F>(mut respond: F) -> Self
    where
        F: FnMut(&str) -> Reply + Send + 'static,
    {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).expect("bind should succeed");
        let port = listener
            .local_addr()
            .expect("listener should have an address")
            .port();

        let handle = thread::spawn(move || {
            let mut seen = Vec::new();
            let (stream, _) = match listener.accept() {
                Ok(accepted) => accepted,
                Err(_) => return seen,
            };
            let mut writer = stream.try_clone().expect("stream should clone");
            let mut reader = BufReader::new(stream);

            loop {
                let mut raw = Vec::new();
                match reader.read_until(0, &mut raw) {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {}
                }
                if raw.last() != Some(&0) {
                    break;
                }
                raw.pop();
                let command = String::from_utf8_lossy(&raw).into_owned();
                let reply = respond(&command);
                seen.push(command);

                match reply {
                    Reply::Payload(payload) => {
                        let mut wire = encode_size_header(payload.len() as u32).to_vec();
                        wire.extend_from_slice(&payload);
                        if writer.write_all(&wire).is_err() {
                            break;
                        }
                    }
                    Reply::RawThenClose(bytes) => {
                        let _ = writer.write_all(&bytes);
                        break;
                    }
                    Reply::Close => break,
                }
            }
            seen
        });

        Self { port, handle }
    }

    /// Answer every command with an empty reply.
    pub(crate) fn spawn_silent() -> Self {
        Self::spawn(|_| Reply::empty())
    }

    /// Wait for the service thread and return the commands it received.
    pub(crate) fn join(self) -> Vec<String> {
        self.handle.join().expect("service thread should not panic")
    }
}
