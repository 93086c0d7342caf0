//! protoc-gen-setter - A protoc plugin for generating Go setter methods
//!
//! This binary reads a CodeGeneratorRequest from stdin and writes a
//! CodeGeneratorResponse to stdout, following the protoc plugin protocol.
//! Logs go to stderr and are filtered by `PROTOC_GEN_SETTER_LOG`.

use prost::Message;
use prost_types::compiler::CodeGeneratorResponse;
use std::io::{self, Read, Write};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the `tracing` filter directives
const LOG_ENV: &str = "PROTOC_GEN_SETTER_LOG";

fn main() {
    init_logging();

    if let Err(e) = run() {
        eprintln!("protoc-gen-setter: {}", e);
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    // stdout carries the CodeGeneratorResponse
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut buf = Vec::new();
    io::stdin().read_to_end(&mut buf)?;
    tracing::debug!(bytes = buf.len(), "read CodeGeneratorRequest");

    // Generation failures are reported to protoc through the response so the
    // whole batch fails without any files being written
    let response =
        protoc_gen_setter::generate_from_bytes(&buf).unwrap_or_else(|e| CodeGeneratorResponse {
            error: Some(e.to_string()),
            ..Default::default()
        });

    tracing::info!(files = response.file.len(), "generated setter files");
    for f in &response.file {
        let name = f.name.as_deref().unwrap_or("<unnamed>");
        tracing::debug!(name, "output file");
    }
    if let Some(ref err) = response.error {
        tracing::error!(error = %err, "code generation failed");
    }

    let mut out = Vec::new();
    response.encode(&mut out)?;
    io::stdout().write_all(&out)?;

    Ok(())
}
