//! LRC rendering
//!
//! Produces synchronized lyrics in LRC format, one timestamp per line:
//! [mm:ss.xx]Lyrics text
//!
//! Example:
//! [00:12.34]Hello
//! [01:01.00]world

use crate::catalog::TimedSentence;
use std::fmt;

/// A single line of lyrics with timestamp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LrcLine {
    /// Timestamp in milliseconds from start
    pub time_ms: u64,
    /// The lyrics text
    pub text: String,
}

impl LrcLine {
    pub fn new(time_ms: u64, text: String) -> Self {
        Self { time_ms, text }
    }
}

impl fmt::Display for LrcLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]{}", format_timestamp(self.time_ms), self.text)
    }
}

/// Format milliseconds as `mm:ss.xx`, truncating to centiseconds.
pub fn format_timestamp(ms: u64) -> String {
    let minutes = ms / 60_000;
    let seconds = (ms % 60_000) / 1000;
    let centis = (ms % 1000) / 10;
    format!("{minutes:02}:{seconds:02}.{centis:02}")
}

/// One line per word, in sentence then word order. Words are never merged.
pub fn word_lines(sentences: &[TimedSentence]) -> Vec<LrcLine> {
    sentences
        .iter()
        .flat_map(|s| s.words.iter())
        .map(|w| LrcLine::new(w.start_ms, w.text.clone()))
        .collect()
}

/// Render word-timed sentences as an LRC document, each line `\n`-terminated.
pub fn render(sentences: &[TimedSentence]) -> String {
    word_lines(sentences)
        .iter()
        .map(|line| format!("{line}\n"))
        .collect()
}
