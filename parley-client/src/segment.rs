//! Message segmentation
//!
//! Splits raw message text into plain-text and formula-block segments. A
//! formula block is the shortest run bounded by a pair of `$$` markers, so
//! several blocks in one message stay separate. Inline math inside either
//! kind is left for the typesetter.

use std::sync::OnceLock;

use regex::Regex;

/// Delimiter opening and closing a formula block
pub const FORMULA_MARKER: &str = "$$";

/// Kind of a message segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    PlainText,
    FormulaBlock,
}

/// A contiguous slice of message text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub kind: SegmentKind,
    /// Raw text; formula blocks keep their `$$` markers
    pub text: String,
}

impl Segment {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            kind: SegmentKind::PlainText,
            text: text.into(),
        }
    }

    pub fn formula(text: impl Into<String>) -> Self {
        Self {
            kind: SegmentKind::FormulaBlock,
            text: text.into(),
        }
    }

    pub fn is_formula(&self) -> bool {
        self.kind == SegmentKind::FormulaBlock
    }
}

fn formula_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?s)\$\$.*?\$\$").expect("formula pattern is valid"))
}

/// Split message text into ordered segments
///
/// Surrounding whitespace of the whole message and whitespace-only chunks
/// between blocks are dropped. Blank input yields no segments; callers must
/// not render an entry for it.
pub fn segment(text: &str) -> Vec<Segment> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let body = text.trim();
    let mut segments = Vec::new();
    let mut cursor = 0;

    for found in formula_pattern().find_iter(body) {
        push_plain(&mut segments, &body[cursor..found.start()]);
        segments.push(Segment::formula(found.as_str()));
        cursor = found.end();
    }
    push_plain(&mut segments, &body[cursor..]);

    if segments.is_empty() {
        // Nothing survived filtering; keep the original rather than lose it
        segments.push(Segment::plain(text));
    }

    segments
}

fn push_plain(segments: &mut Vec<Segment>, chunk: &str) {
    if !chunk.trim().is_empty() {
        segments.push(Segment::plain(chunk));
    }
}
