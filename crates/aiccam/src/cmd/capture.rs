use std::fs::{File, OpenOptions};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use aiccam_client::{CameraClient, FrameParams};

use crate::cmd::{close_camera, open_camera, CaptureArgs};
use crate::exit::{client_error, io_error, CliError, CliResult, INTERNAL, SUCCESS, USAGE};
use crate::output::{print_frame, FrameOutput, OutputFormat};

pub fn run(args: CaptureArgs, format: OutputFormat) -> CliResult<i32> {
    let pixel_format = parse_pixel_format(&args.pix)?;
    let params = frame_params(args.white_balance.as_deref(), args.exposure)?;
    if args.video_size == 0 && args.preview_size == 0 {
        return Err(CliError::new(
            USAGE,
            "at least one of --video-size or --preview-size must be non-zero",
        ));
    }

    let mut sink = match &args.output {
        Some(path) => Some(
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|err| io_error(&format!("failed opening {}", path.display()), &err))?,
        ),
        None => None,
    };

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut client = open_camera(&args.connect)?;
    if let Err(err) = client.query_start(pixel_format, args.width, args.height) {
        close_camera(client);
        return Err(client_error("start failed", err));
    }

    let result = capture_frames(&mut client, &args, &params, sink.as_mut(), &running, format);

    if let Err(err) = client.query_stop() {
        tracing::warn!(%err, "stop failed");
    }
    close_camera(client);
    result.map(|_| SUCCESS)
}

fn capture_frames(
    client: &mut CameraClient,
    args: &CaptureArgs,
    params: &FrameParams,
    mut sink: Option<&mut File>,
    running: &AtomicBool,
    format: OutputFormat,
) -> CliResult<usize> {
    let mut video = vec![0u8; args.video_size];
    let mut preview = vec![0u8; args.preview_size];
    let mut captured = 0usize;

    while captured < args.count && running.load(Ordering::SeqCst) {
        client
            .query_frame(Some(&mut video[..]), Some(&mut preview[..]), params)
            .map_err(|err| client_error("frame failed", err))?;

        if let Some(file) = sink.as_deref_mut() {
            file.write_all(&video)
                .and_then(|()| file.write_all(&preview))
                .map_err(|err| io_error("failed writing frame", &err))?;
        }

        let out = FrameOutput::new(captured, video.len(), preview.len());
        print_frame(&out, &video, &preview, format);
        captured += 1;
    }

    tracing::info!(captured, requested = args.count, "capture finished");
    Ok(captured)
}

fn frame_params(white_balance: Option<&[f32]>, exposure: f32) -> CliResult<FrameParams> {
    let mut params = FrameParams {
        exposure_comp: exposure,
        ..FrameParams::default()
    };
    match white_balance {
        None => {}
        Some(&[r, g, b]) => {
            params.r_scale = r;
            params.g_scale = g;
            params.b_scale = b;
        }
        Some(other) => {
            return Err(CliError::new(
                USAGE,
                format!(
                    "--white-balance takes exactly 3 values, got {}",
                    other.len()
                ),
            ))
        }
    }
    Ok(params)
}

/// Parse a pixel format given as a FourCC (`YV12`, `NV21`) or a number.
fn parse_pixel_format(input: &str) -> CliResult<u32> {
    let input = input.trim();
    if let Ok(value) = input.parse::<u32>() {
        return Ok(value);
    }
    if let Some(hex) = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        return u32::from_str_radix(hex, 16)
            .map_err(|_| CliError::new(USAGE, format!("invalid pixel format: {input}")));
    }

    let bytes = input.as_bytes();
    if bytes.len() != 4 || !bytes.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
        return Err(CliError::new(
            USAGE,
            format!("pixel format must be a 4-character FourCC or a number: {input}"),
        ));
    }
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
