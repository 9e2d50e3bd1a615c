use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
pub struct InfoOutput {
    pub port: u16,
    pub info: String,
    pub fields: Vec<(String, String)>,
}

impl InfoOutput {
    pub fn new(port: u16, info: String) -> Self {
        let fields = info_fields(&info);
        Self { port, info, fields }
    }
}

pub fn print_info(out: &InfoOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"]);
            for (key, value) in &out.fields {
                table.add_row(vec![key.clone(), value.clone()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("Camera Info (port {}):", out.port);
            for (key, value) in &out.fields {
                println!("  {key:<16} {value}");
            }
        }
        OutputFormat::Raw => {
            println!("{}", out.info);
        }
    }
}

#[derive(Serialize)]
pub struct FrameOutput {
    pub index: usize,
    pub video_size: usize,
    pub preview_size: usize,
    pub timestamp: String,
}

impl FrameOutput {
    pub fn new(index: usize, video_size: usize, preview_size: usize) -> Self {
        Self {
            index,
            video_size,
            preview_size,
            timestamp: now_unix_seconds(),
        }
    }
}

/// Print one captured frame. `Raw` writes the frame bytes themselves.
pub fn print_frame(out: &FrameOutput, video: &[u8], preview: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FRAME", "VIDEO", "PREVIEW", "TIMESTAMP"])
                .add_row(vec![
                    out.index.to_string(),
                    out.video_size.to_string(),
                    out.preview_size.to_string(),
                    out.timestamp.clone(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "frame={} video={} preview={} at={}",
                out.index, out.video_size, out.preview_size, out.timestamp
            );
        }
        OutputFormat::Raw => {
            print_raw(video);
            print_raw(preview);
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

/// Split an info blob into `key=value` pairs. Separators are whitespace
/// and `;`; tokens without `=` are kept with an empty value.
pub fn info_fields(info: &str) -> Vec<(String, String)> {
    info.split(|c: char| c.is_whitespace() || c == ';')
        .filter(|token| !token.is_empty())
        .map(|token| match token.split_once('=') {
            Some((key, value)) => (key.to_string(), value.to_string()),
            None => (token.to_string(), String::new()),
        })
        .collect()
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
