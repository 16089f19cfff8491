//! Process-facing entry points for hosts embedding the RPC surface.
//!
//! # Responsibility
//! - Expose health-check, version and logging setup with string-friendly results.
//! - Drive a line-oriented request/response loop over any reader and writer.
//!
//! # Invariants
//! - Functions never panic on bad input.
//! - One request line yields exactly one response line.

use crate::handler::RpcHandler;
use crate::protocol::{RpcError, RpcErrorCode, RpcRequest, RpcResponse, Session};
use log::{error, info};
use notekeeper_core::db::open_db;
use notekeeper_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};
use std::path::Path;

/// Minimal health-check.
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Core crate version.
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes core logging once per process.
///
/// Returns an empty string on success and the error message on failure.
/// Repeating the call with the same `level + log_dir` is a no-op.
pub fn init_logging(level: &str, log_dir: &str) -> String {
    match init_logging_inner(level, log_dir) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Opens and migrates the note store at `db_path`.
pub fn open_store(db_path: impl AsRef<Path>) -> Result<Connection, RpcError> {
    open_db(db_path).map_err(|err| {
        error!("event=store_open module=rpc status=error error={err}");
        RpcError::new(RpcErrorCode::InternalServerError, "failed to open note store")
    })
}

/// One line of the serve loop: the caller's session plus the call itself.
///
/// `{"session": {"userId": "...", "role": "member"}, "method": "notes.list"}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRequest {
    #[serde(default)]
    pub session: Option<Session>,
    #[serde(flatten)]
    pub request: RpcRequest,
}

/// Serves newline-delimited JSON requests until `input` is exhausted.
///
/// Blank lines are skipped. Returns the number of requests answered.
pub fn serve_lines<R: BufRead, W: Write>(
    conn: &Connection,
    input: R,
    mut output: W,
) -> std::io::Result<usize> {
    let handler = RpcHandler::new(conn);
    let mut served = 0usize;
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let response = match serde_json::from_str::<SessionRequest>(&line) {
            Ok(call) => handler.handle(call.session.as_ref(), &call.request),
            Err(err) => RpcResponse::failure(RpcError::bad_request(
                "request",
                format!("malformed request: {err}"),
            )),
        };
        let encoded = serde_json::to_string(&response)
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;
        writeln!(output, "{encoded}")?;
        output.flush()?;
        served += 1;
    }
    info!("event=serve_done module=rpc status=ok served={served}");
    Ok(served)
}
