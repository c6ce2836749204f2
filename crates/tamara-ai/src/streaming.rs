//! Newline-delimited JSON (NDJSON) streaming parser.
//!
//! Ollama streams a chat reply as one JSON object per line:
//! `{"message":{"content":"..."},"done":false}`. This module turns such a
//! body into a lazy stream of text tokens.

use futures_util::stream::{self, StreamExt};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::io::StreamReader;

use crate::{AiError, TokenStream};

/// Token stream over the body of a streaming reqwest response.
pub fn ndjson_token_stream(response: reqwest::Response) -> TokenStream {
    let byte_stream = response
        .bytes_stream()
        .map(|result| result.map_err(std::io::Error::other));
    let reader = tokio::io::BufReader::new(StreamReader::new(byte_stream));
    ndjson_tokens(reader)
}

/// Token stream over any buffered NDJSON reader.
///
/// Empty tokens are skipped. The stream ends at the `"done": true` chunk or
/// at EOF, and ends after yielding the first error.
pub fn ndjson_tokens<R>(reader: R) -> TokenStream
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    stream::unfold(Some(reader.lines()), |state| async move {
        let mut lines = state?;
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => return None,
                Err(e) => return Some((Err(AiError::NetworkError(e.to_string())), None)),
            };
            match parse_chunk_line(&line) {
                Ok(Chunk::Token(token)) => return Some((Ok(token), Some(lines))),
                Ok(Chunk::Skip) => continue,
                Ok(Chunk::Done) => return None,
                Err(e) => return Some((Err(e), None)),
            }
        }
    })
    .boxed()
}

#[derive(Debug, PartialEq)]
enum Chunk {
    Token(String),
    Skip,
    Done,
}

fn parse_chunk_line(line: &str) -> Result<Chunk, AiError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Chunk::Skip);
    }

    let json: Value =
        serde_json::from_str(line).map_err(|e| AiError::ParseError(format!("bad chunk: {e}")))?;

    if let Some(err) = json.get("error").and_then(Value::as_str) {
        return Err(AiError::ApiError(err.to_string()));
    }

    let content = json["message"]["content"].as_str().unwrap_or_default();
    if !content.is_empty() {
        return Ok(Chunk::Token(content.to_string()));
    }
    if json["done"].as_bool().unwrap_or(false) {
        return Ok(Chunk::Done);
    }
    Ok(Chunk::Skip)
}
