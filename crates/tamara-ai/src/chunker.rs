//! Sentence segmentation of a token stream for speech synthesis.

/// Tokens that close a sentence unit when they arrive on their own.
pub const TERMINATORS: [&str; 5] = [".", "!", "?", "\n", ":"];

/// Accumulates streamed tokens into sentence units.
///
/// A unit is emitted when a token equal to one of [`TERMINATORS`] arrives
/// and the buffer holds non-whitespace text. Buffers that start with `[`
/// (after leading whitespace) are control text and are dropped instead.
#[derive(Debug, Default)]
pub struct AudioChunker {
    buffer: String,
}

impl AudioChunker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a token. Returns a finished sentence unit, if any.
    pub fn push(&mut self, token: &str) -> Option<String> {
        self.buffer.push_str(token);
        if !TERMINATORS.contains(&token) || self.buffer.trim().is_empty() {
            return None;
        }
        let unit = std::mem::take(&mut self.buffer);
        (!is_control(&unit)).then_some(unit)
    }

    /// Flush the remainder at end of stream.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        (!rest.trim().is_empty() && !is_control(&rest)).then_some(rest)
    }

    pub fn pending(&self) -> &str {
        &self.buffer
    }
}

fn is_control(text: &str) -> bool {
    text.trim_start().starts_with('[')
}

/// Prepare a unit for synthesis: drop brackets and trim.
///
/// Returns `None` when nothing speakable remains.
pub fn clean_for_speech(text: &str) -> Option<String> {
    let cleaned: String = text.chars().filter(|c| *c != '[' && *c != ']').collect();
    let cleaned = cleaned.trim();
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

/// Run a complete token sequence through a fresh chunker.
pub fn chunk_tokens<'a>(tokens: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut chunker = AudioChunker::new();
    let mut units: Vec<String> = tokens.into_iter().filter_map(|t| chunker.push(t)).collect();
    units.extend(chunker.finish());
    units
}
