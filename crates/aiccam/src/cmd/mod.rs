use std::path::PathBuf;
use std::time::Duration;

use aiccam_client::{CameraClient, ClientConfig, StatusPrefix};
use clap::{Args, Subcommand};

use crate::exit::{client_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod capture;
pub mod info;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Query the camera info text.
    Info(InfoArgs),
    /// Start streaming, fetch frames, then stop.
    Capture(CaptureArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Info(args) => info::run(args, format),
        Command::Capture(args) => capture::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ConnectArgs {
    /// Camera service port on 127.0.0.1.
    #[arg(long, env = "AICCAM_PORT")]
    pub port: u16,
    /// Reply timeout (e.g. 10s, 500ms).
    #[arg(long, default_value = "10s")]
    pub timeout: String,
    /// Expect `ok:`/`ko:` status-prefixed replies.
    #[arg(long)]
    pub status_prefix: bool,
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
}

#[derive(Args, Debug)]
pub struct CaptureArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
    /// Frame width in pixels.
    #[arg(long)]
    pub width: u32,
    /// Frame height in pixels.
    #[arg(long)]
    pub height: u32,
    /// Pixel format: a FourCC such as YV12, or its numeric value.
    #[arg(long)]
    pub pix: String,
    /// Bytes of video frame to request per frame.
    #[arg(long, default_value = "0")]
    pub video_size: usize,
    /// Bytes of preview frame to request per frame.
    #[arg(long, default_value = "0")]
    pub preview_size: usize,
    /// Number of frames to fetch.
    #[arg(long, default_value = "1")]
    pub count: usize,
    /// Append frame bytes to this file.
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,
    /// White balance scales as r,g,b.
    #[arg(long, value_delimiter = ',', value_name = "R,G,B")]
    pub white_balance: Option<Vec<f32>>,
    /// Exposure compensation scale.
    #[arg(long, default_value = "1.0")]
    pub exposure: f32,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Connect the socket and the camera device.
pub fn open_camera(args: &ConnectArgs) -> CliResult<CameraClient> {
    let timeout = parse_duration(&args.timeout)?;
    let mut config = ClientConfig::default();
    config.socket.read_timeout = Some(timeout);

    let mut client = CameraClient::with_config(config);
    if args.status_prefix {
        client = client.with_hook(StatusPrefix);
    }

    client
        .connect(args.port)
        .map_err(|err| client_error("connect failed", err))?;
    client
        .query_connect()
        .map_err(|err| client_error("camera connect failed", err))?;
    Ok(client)
}

/// Disconnect the camera device, then the socket. Teardown errors are
/// logged, not returned: the command's own outcome stands.
pub fn close_camera(mut client: CameraClient) {
    if let Err(err) = client.query_disconnect() {
        tracing::warn!(%err, "camera disconnect failed");
    }
    client.disconnect();
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}
