/// One search hit from the catalog. Every field may be missing upstream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Candidate {
    pub id: Option<String>,
    pub title: Option<String>,
    pub artists: Option<String>,
    pub thumbnail: Option<String>,
    pub duration_seconds: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimedWord {
    pub start_ms: u64,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimedSentence {
    pub words: Vec<TimedWord>,
}

/// What the catalog knows about a song's lyrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LyricSource {
    /// URL of a ready-made LRC document.
    File(String),
    /// Word-level timing only; needs rendering.
    TimedSentences(Vec<TimedSentence>),
    Unavailable,
}
