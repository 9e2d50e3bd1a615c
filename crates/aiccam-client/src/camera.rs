use std::ffi::CString;

use tracing::{debug, error};

use crate::connection::{ClientConfig, Connection};
use crate::error::{ClientError, Result};
use crate::hook::{CompletionHook, RecordStatus};
use crate::query::Query;

/// Connect to the camera device.
pub const QUERY_CONNECT: &str = "connect";
/// Disconnect from the camera device.
pub const QUERY_DISCONNECT: &str = "disconnect";
/// Query info from the camera.
pub const QUERY_INFO: &str = "infos";
/// Start capturing video from the camera device.
pub const QUERY_START: &str = "start";
/// Stop capturing video from the camera device.
pub const QUERY_STOP: &str = "stop";
/// Get the next video frame from the camera device.
pub const QUERY_FRAME: &str = "frame";

/// Camera device state as seen through this client.
///
/// Advisory only: the service decides whether a command is valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraState {
    Disconnected,
    Connected,
    Streaming,
}

/// White balance and exposure compensation applied to a fetched frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameParams {
    pub r_scale: f32,
    pub g_scale: f32,
    pub b_scale: f32,
    pub exposure_comp: f32,
}

impl Default for FrameParams {
    fn default() -> Self {
        Self {
            r_scale: 1.0,
            g_scale: 1.0,
            b_scale: 1.0,
            exposure_comp: 1.0,
        }
    }
}

/// Command façade over one camera service connection.
///
/// Each `query_*` method formats one command, runs it as a [`Query`] and
/// decodes the reply. Output parameters are left untouched on failure.
pub struct CameraClient {
    conn: Connection,
    hook: Box<dyn CompletionHook + Send + Sync>,
    state: CameraState,
}

impl CameraClient {
    /// Create a disconnected client with default configuration.
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    /// Create a disconnected client with explicit configuration.
    pub fn with_config(config: ClientConfig) -> Self {
        Self {
            conn: Connection::with_config(config),
            hook: Box::new(RecordStatus),
            state: CameraState::Disconnected,
        }
    }

    /// Replace the completion hook used to finalize every query.
    pub fn with_hook<H>(mut self, hook: H) -> Self
    where
        H: CompletionHook + Send + Sync + 'static,
    {
        self.hook = Box::new(hook);
        self
    }

    /// Open the connection to the camera service on the loopback `port`.
    pub fn connect(&mut self, port: u16) -> Result<()> {
        self.conn.connect(port)
    }

    /// Close the connection. A no-op when nothing is open.
    pub fn disconnect(&mut self) {
        self.conn.disconnect();
        self.state = CameraState::Disconnected;
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_connected()
    }

    pub fn state(&self) -> CameraState {
        self.state
    }

    /// The underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Connect to the camera device.
    pub fn query_connect(&mut self) -> Result<()> {
        self.run("query_connect", QUERY_CONNECT.to_string())?;
        self.state = CameraState::Connected;
        Ok(())
    }

    /// Disconnect from the camera device. The socket stays open.
    pub fn query_disconnect(&mut self) -> Result<()> {
        self.run("query_disconnect", QUERY_DISCONNECT.to_string())?;
        self.state = CameraState::Disconnected;
        Ok(())
    }

    /// Fetch the camera info text.
    ///
    /// The reply is cut at its first NUL and returned as an owned,
    /// NUL-terminated string.
    pub fn query_info(&mut self) -> Result<CString> {
        let query = self.run("query_info", QUERY_INFO.to_string())?;

        let reply = query.reply();
        if reply.is_empty() {
            error!("no camera info returned");
            return Err(ClientError::EmptyReply(QUERY_INFO.to_string()));
        }

        let text = reply.split(|b| *b == 0).next().unwrap_or_default();
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(text.len() + 1)
            .map_err(|_| ClientError::Allocation(text.len() + 1))?;
        bytes.extend_from_slice(text);
        CString::new(bytes).map_err(|err| ClientError::InvalidArgument(err.to_string()))
    }

    /// Start capturing `width`x`height` frames in `pixel_format` (a FourCC).
    pub fn query_start(&mut self, pixel_format: u32, width: u32, height: u32) -> Result<()> {
        let command = format!("{QUERY_START} dim={width}x{height} pix={pixel_format}");
        self.run("query_start", command)?;
        self.state = CameraState::Streaming;
        Ok(())
    }

    /// Stop capturing.
    pub fn query_stop(&mut self) -> Result<()> {
        self.run("query_stop", QUERY_STOP.to_string())?;
        self.state = CameraState::Connected;
        Ok(())
    }

    /// Fetch the next frame into the caller's buffers.
    ///
    /// The service sends the video frame followed by the preview frame with
    /// no separator. A buffer that is `None` or empty is not requested.
    /// Both slices are checked against the reply before anything is copied,
    /// so on failure neither buffer is modified.
    pub fn query_frame(
        &mut self,
        video: Option<&mut [u8]>,
        preview: Option<&mut [u8]>,
        params: &FrameParams,
    ) -> Result<()> {
        let video = video.filter(|buf| !buf.is_empty());
        let preview = preview.filter(|buf| !buf.is_empty());
        let video_size = video.as_ref().map_or(0, |buf| buf.len());
        let preview_size = preview.as_ref().map_or(0, |buf| buf.len());

        let command = format!(
            "{QUERY_FRAME} video={video_size} preview={preview_size} whiteb={},{},{} expcomp={}",
            scale("r_scale", params.r_scale)?,
            scale("g_scale", params.g_scale)?,
            scale("b_scale", params.b_scale)?,
            scale("exposure_comp", params.exposure_comp)?,
        );
        let query = self.run("query_frame", command)?;
        let reply = query.reply();

        if reply.len() < video_size {
            error!(
                reply_size = reply.len(),
                video_size, "reply is too small to contain video frame"
            );
            return Err(ClientError::BufferTooSmall {
                target: "video",
                available: reply.len(),
                requested: video_size,
            });
        }
        let remaining = reply.len() - video_size;
        if remaining < preview_size {
            error!(
                remaining,
                preview_size, "reply is too small to contain preview frame"
            );
            return Err(ClientError::BufferTooSmall {
                target: "preview",
                available: remaining,
                requested: preview_size,
            });
        }

        if let Some(buf) = video {
            buf.copy_from_slice(&reply[..video_size]);
        }
        if let Some(buf) = preview {
            buf.copy_from_slice(&reply[video_size..video_size + preview_size]);
        }
        debug!(
            video_size,
            preview_size,
            reply_size = reply.len(),
            "frame copied"
        );
        Ok(())
    }

    fn run(&mut self, op: &'static str, command: String) -> Result<Query> {
        debug!(op, "running camera query");
        let mut query = Query::new(command)?;
        match query.execute(&mut self.conn, &*self.hook) {
            Ok(()) => Ok(query),
            Err(err) => {
                error!(op, reply = %query.diagnostic(), %err, "query failed");
                Err(err)
            }
        }
    }
}

impl Default for CameraClient {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CameraClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraClient")
            .field("connection", &self.conn)
            .field("state", &self.state)
            .finish()
    }
}

/// Format a scale factor for the wire. Non-finite values have no textual
/// form the service can parse.
fn scale(name: &str, value: f32) -> Result<String> {
    if !value.is_finite() {
        return Err(ClientError::InvalidArgument(format!(
            "{name} must be finite, got {value}"
        )));
    }
    Ok(format_general(f64::from(value)))
}

/// Significant digits the service expects for scale factors.
const SCALE_PRECISION: i32 = 6;

/// Shortest general-notation rendering of `value` with six significant
/// digits: fixed notation for decimal exponents in `-4..6`, otherwise
/// `<mantissa>e<sign><at least two digits>`. Trailing zeros are dropped.
fn format_general(value: f64) -> String {
    let scientific = format!("{:.*e}", (SCALE_PRECISION - 1) as usize, value);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((mantissa, exponent)) => (mantissa, exponent.parse::<i32>().unwrap_or(0)),
        None => (scientific.as_str(), 0),
    };

    if exponent < -4 || exponent >= SCALE_PRECISION {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}e{sign}{:02}",
            trim_fraction(mantissa),
            exponent.unsigned_abs()
        )
    } else {
        let decimals = (SCALE_PRECISION - 1 - exponent) as usize;
        trim_fraction(&format!("{value:.decimals$}")).to_string()
    }
}

fn trim_fraction(digits: &str) -> &str {
    if digits.contains('.') {
        digits.trim_end_matches('0').trim_end_matches('.')
    } else {
        digits
    }
}
