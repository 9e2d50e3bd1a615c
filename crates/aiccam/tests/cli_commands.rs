#![cfg(feature = "cli")]

use std::io::{BufRead, BufReader, Write};
use std::net::{Ipv4Addr, TcpListener};
use std::path::PathBuf;
use std::process::{Command, Output};
use std::thread::{self, JoinHandle};

use aiccam_frame::encode_size_header;

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "aiccam-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

/// One-connection camera service answering each command with `respond`.
fn spawn_service<F>(mut respond: F) -> (u16, JoinHandle<Vec<String>>)
where
    F: FnMut(&str) -> Vec<u8> + Send + 'static,
{
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).expect("bind should succeed");
    let port = listener.local_addr().expect("local addr").port();

    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept should succeed");
        let mut writer = stream.try_clone().expect("stream should clone");
        let mut reader = BufReader::new(stream);
        let mut seen = Vec::new();

        loop {
            let mut raw = Vec::new();
            match reader.read_until(0, &mut raw) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            raw.pop();
            let command = String::from_utf8_lossy(&raw).into_owned();
            let payload = respond(&command);
            seen.push(command);

            let mut wire = encode_size_header(payload.len() as u32).to_vec();
            wire.extend_from_slice(&payload);
            if writer.write_all(&wire).is_err() {
                break;
            }
        }
        seen
    });

    (port, handle)
}

fn aiccam(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_aiccam"))
        .env_remove("AICCAM_PORT")
        .arg("--log-level")
        .arg("off")
        .args(args)
        .output()
        .expect("aiccam should run")
}

#[test]
fn info_prints_json() {
    let (port, service) = spawn_service(|command| match command {
        "infos" => b"name=webcam0 framedims=640x480\0".to_vec(),
        _ => Vec::new(),
    });

    let port = port.to_string();
    let output = aiccam(&["--format", "json", "info", "--port", &port]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(json["info"], "name=webcam0 framedims=640x480");
    assert_eq!(json["fields"][0][0], "name");
    assert_eq!(json["fields"][1][1], "640x480");

    assert_eq!(
        service.join().expect("service thread"),
        vec!["connect", "infos", "disconnect"]
    );
}

#[test]
fn capture_writes_frames_to_file() {
    let (port, service) = spawn_service(|command| {
        if command.starts_with("frame") {
            let mut payload = vec![0xAA; 8];
            payload.extend(vec![0xBB; 4]);
            payload
        } else {
            Vec::new()
        }
    });
    let dir = unique_temp_dir("capture");
    let out_path = dir.join("frames.raw");

    let port = port.to_string();
    let out_arg = out_path.to_string_lossy().into_owned();
    let output = aiccam(&[
        "--format",
        "pretty",
        "capture",
        "--port",
        &port,
        "--width",
        "4",
        "--height",
        "2",
        "--pix",
        "YV12",
        "--video-size",
        "8",
        "--preview-size",
        "4",
        "--count",
        "2",
        "--white-balance",
        "1.5,1,0.5",
        "--output",
        &out_arg,
    ]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("frame=0 video=8 preview=4"));
    assert!(stdout.contains("frame=1 video=8 preview=4"));

    let written = std::fs::read(&out_path).expect("output file should exist");
    let mut expected = Vec::new();
    for _ in 0..2 {
        expected.extend(vec![0xAA; 8]);
        expected.extend(vec![0xBB; 4]);
    }
    assert_eq!(written, expected);

    assert_eq!(
        service.join().expect("service thread"),
        vec![
            "connect",
            "start dim=4x2 pix=842094169",
            "frame video=8 preview=4 whiteb=1.5,1,0.5 expcomp=1",
            "frame video=8 preview=4 whiteb=1.5,1,0.5 expcomp=1",
            "stop",
            "disconnect",
        ]
    );
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn short_frame_reply_fails_with_data_invalid() {
    let (port, service) = spawn_service(|command| {
        if command.starts_with("frame") {
            vec![0u8; 5]
        } else {
            Vec::new()
        }
    });

    let port = port.to_string();
    let output = aiccam(&[
        "capture",
        "--port",
        &port,
        "--width",
        "4",
        "--height",
        "2",
        "--pix",
        "1",
        "--video-size",
        "8",
    ]);
    assert_eq!(output.status.code(), Some(60));
    assert!(String::from_utf8_lossy(&output.stderr).contains("too small"));

    // Streaming is still stopped and the device disconnected.
    let seen = service.join().expect("service thread");
    assert_eq!(seen.last().map(String::as_str), Some("disconnect"));
    assert!(seen.iter().any(|c| c == "stop"));
}

#[test]
fn rejected_query_with_status_prefix() {
    let (port, service) = spawn_service(|command| match command {
        "infos" => b"ko:no camera attached\0".to_vec(),
        _ => b"ok\0".to_vec(),
    });

    let port = port.to_string();
    let output = aiccam(&["info", "--port", &port, "--status-prefix"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("no camera attached"));

    service.join().expect("service thread");
}

#[test]
fn connection_refused_exits_with_failure() {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).expect("bind should succeed");
    let port = listener.local_addr().expect("local addr").port().to_string();
    drop(listener);

    let output = aiccam(&["info", "--port", &port]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("connect failed"));
}

#[test]
fn version_prints_package_version() {
    let output = aiccam(&["version"]);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        format!("aiccam {}", env!("CARGO_PKG_VERSION"))
    );
}
