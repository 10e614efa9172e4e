//! Newline-delimited JSON bridge for host applications.
//!
//! Each input line is a [`CommandEnvelope`]; each output line is the
//! matching [`ResponseEnvelope`]. Commands are offline and provider-free:
//! the host supplies the search results, chapter lists or layout, and the
//! bridge runs the matching core over them.
//!
//! Stdout is reserved for the protocol; diagnostics go to stderr.

use folio_match::chapters::match_sorted;
use folio_match::{
    Chapter, Layout, MatchConfig, SearchResult, compute_position, deduplicate,
    match_imported_chapter, rank_results, sort_chapters,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::error::{FolioError, Result};

/// Protocol version for command and response envelopes.
pub const PROTOCOL_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandName {
    Ping,
    /// Score, filter and deduplicate host-supplied search results.
    Rank,
    /// Pick a chapter from a host-supplied list.
    MatchChapter,
    /// Derive page and scroll position from a layout snapshot.
    Position,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    pub v: u32,
    pub request_id: String,
    pub command: CommandName,
    #[serde(default)]
    pub payload: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub v: u32,
    pub request_id: String,
    pub ok: bool,
    pub payload: Value,
    pub error: Option<String>,
}

impl ResponseEnvelope {
    #[must_use]
    pub fn ok(request_id: impl Into<String>, payload: Value) -> Self {
        Self {
            v: PROTOCOL_VERSION,
            request_id: request_id.into(),
            ok: true,
            payload,
            error: None,
        }
    }

    #[must_use]
    pub fn error(request_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            v: PROTOCOL_VERSION,
            request_id: request_id.into(),
            ok: false,
            payload: Value::Null,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RankPayload {
    query: String,
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct MatchChapterPayload {
    target: f64,
    chapters: Vec<Chapter>,
    /// Apply the import window instead of always returning a chapter.
    #[serde(default)]
    imported: bool,
}

#[derive(Debug, Deserialize)]
struct PositionPayload {
    layout: Layout,
}

/// Handle one command.
pub fn handle(config: &MatchConfig, envelope: CommandEnvelope) -> ResponseEnvelope {
    let request_id = envelope.request_id.clone();
    if envelope.v != PROTOCOL_VERSION {
        return ResponseEnvelope::error(
            request_id,
            format!(
                "unsupported protocol version {}; expected {PROTOCOL_VERSION}",
                envelope.v
            ),
        );
    }
    match dispatch(config, envelope) {
        Ok(payload) => ResponseEnvelope::ok(request_id, payload),
        Err(e) => {
            tracing::debug!(request_id = %request_id, error = %e, "command failed");
            ResponseEnvelope::error(request_id, e.to_string())
        }
    }
}

fn dispatch(config: &MatchConfig, envelope: CommandEnvelope) -> Result<Value> {
    match envelope.command {
        CommandName::Ping => Ok(json!({ "pong": true, "version": env!("CARGO_PKG_VERSION") })),
        CommandName::Rank => {
            let payload: RankPayload = parse_payload(envelope.payload)?;
            let ranked = deduplicate(rank_results(payload.results, &payload.query, config));
            to_value(&ranked)
        }
        CommandName::MatchChapter => {
            let payload: MatchChapterPayload = parse_payload(envelope.payload)?;
            if payload.imported {
                let found = match_imported_chapter(payload.target, payload.chapters, config);
                to_value(&found)
            } else {
                let sorted = sort_chapters(payload.chapters);
                let found = match_sorted(payload.target, &sorted, config)?;
                to_value(&found)
            }
        }
        CommandName::Position => {
            let payload: PositionPayload = parse_payload(envelope.payload)?;
            let position = compute_position(&payload.layout);
            let completed = position.is_some_and(|p| {
                p.page_number >= p.total_pages
                    && p.scroll_fraction >= config.progress.completion_threshold
            });
            Ok(json!({ "position": position, "completed": completed }))
        }
    }
}

fn parse_payload<T: serde::de::DeserializeOwned>(payload: Value) -> Result<T> {
    serde_json::from_value(payload)
        .map_err(|e| FolioError::Bridge(format!("invalid payload: {e}")))
}

fn to_value<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value)
        .map_err(|e| FolioError::Bridge(format!("cannot encode payload: {e}")))
}

/// Serve commands from `reader` until EOF, writing responses to `writer`.
pub async fn run_bridge<R, W>(config: &MatchConfig, mut reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut line = String::new();
    loop {
        line.clear();
        let bytes_read = reader
            .read_line(&mut line)
            .await
            .map_err(|e| FolioError::Bridge(format!("failed to read input: {e}")))?;
        if bytes_read == 0 {
            tracing::info!("input closed (EOF); shutting down bridge");
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<CommandEnvelope>(trimmed) {
            Ok(envelope) => handle(config, envelope),
            Err(e) => {
                tracing::warn!(error = %e, "failed to parse command envelope");
                ResponseEnvelope::error(
                    "parse-error",
                    format!("failed to parse command envelope: {e}"),
                )
            }
        };

        let json = serde_json::to_string(&response)
            .map_err(|e| FolioError::Bridge(format!("failed to serialize response: {e}")))?;
        write_line(&mut writer, &json).await?;
    }
    Ok(())
}

/// Serve commands on stdin/stdout.
pub async fn run_stdio_bridge(config: &MatchConfig) -> Result<()> {
    run_bridge(config, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await
}

async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, json: &str) -> Result<()> {
    writer
        .write_all(json.as_bytes())
        .await
        .map_err(|e| FolioError::Bridge(format!("failed to write output: {e}")))?;
    writer
        .write_all(b"\n")
        .await
        .map_err(|e| FolioError::Bridge(format!("failed to write newline: {e}")))?;
    writer
        .flush()
        .await
        .map_err(|e| FolioError::Bridge(format!("failed to flush output: {e}")))?;
    Ok(())
}
