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
struct PacketOutput<'a> {
    port: &'a str,
    id: u8,
    payload_size: usize,
    payload: String,
    payload_hex: String,
    timestamp: String,
}

pub fn print_packet(port: &str, id: u8, payload: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = PacketOutput {
                port,
                id,
                payload_size: payload.len(),
                payload: payload_preview(payload),
                payload_hex: hex(payload),
                timestamp: now_unix_seconds(),
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ID", "SIZE", "PORT", "PAYLOAD"])
                .add_row(vec![
                    id.to_string(),
                    payload.len().to_string(),
                    port.to_string(),
                    payload_preview(payload),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "id={} size={} port={} payload={}",
                id,
                payload.len(),
                port,
                payload_preview(payload)
            );
        }
        OutputFormat::Raw => print_raw(payload),
    }
}

#[derive(Serialize)]
struct SendOutput<'a> {
    port: &'a str,
    id: u8,
    payload_size: usize,
    bytes_written: usize,
}

pub fn print_sent(port: &str, id: u8, payload_size: usize, written: usize, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&SendOutput {
            port,
            id,
            payload_size,
            bytes_written: written,
        }),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_header(vec!["PORT", "ID", "PAYLOAD", "WRITTEN"])
                .add_row(vec![
                    port.to_string(),
                    id.to_string(),
                    payload_size.to_string(),
                    written.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("sent id={id} payload={payload_size} written={written} port={port}");
        }
        OutputFormat::Raw => println!("{written}"),
    }
}

#[derive(Serialize)]
struct PortsOutput<'a> {
    ports: &'a [String],
}

pub fn print_ports(ports: &[String], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&PortsOutput { ports }),
        OutputFormat::Table => {
            let mut table = Table::new();
            table.load_preset(UTF8_FULL).set_header(vec!["PORT"]);
            for port in ports {
                table.add_row(vec![port.as_str()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            for port in ports {
                println!("{port}");
            }
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn payload_preview(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) if !text.chars().any(char::is_control) => text.to_string(),
        _ => format!("<binary {} bytes>", payload.len()),
    }
}

fn hex(payload: &[u8]) -> String {
    payload.iter().map(|b| format!("{b:02x}")).collect()
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
