//! Message rendering
//!
//! Turns a [`Message`] into a [`TimelineEntry`]: an author lane, one rendered
//! sub-element per segment tagged with its kind, and a formatted timestamp.
//! Typesetting failures never escape; the affected segment shows its raw
//! text.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use chrono::{DateTime, Local};

use crate::segment::{segment, Segment, SegmentKind};
use crate::typeset::Typesetter;

/// Timestamp format shown next to every entry
const TIMESTAMP_FORMAT: &str = "%H:%M";

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Author {
    User,
    Bot,
    /// Local notices such as a cancellation marker
    System,
}

impl Author {
    pub fn label(&self) -> &'static str {
        match self {
            Self::User => "You",
            Self::Bot => "Bot",
            Self::System => "Notice",
        }
    }

    pub fn lane(&self) -> Lane {
        match self {
            Self::User => Lane::Right,
            Self::Bot | Self::System => Lane::Left,
        }
    }
}

/// Visual side of the timeline an entry sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lane {
    Left,
    Right,
}

/// A single utterance
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub author: Author,
    pub raw_text: String,
    pub timestamp: DateTime<Local>,
}

impl Message {
    pub fn new(author: Author, raw_text: impl Into<String>) -> Self {
        Self::at(author, raw_text, Local::now())
    }

    pub fn at(author: Author, raw_text: impl Into<String>, timestamp: DateTime<Local>) -> Self {
        Self {
            author,
            raw_text: raw_text.into(),
            timestamp,
        }
    }

    pub fn user(raw_text: impl Into<String>) -> Self {
        Self::new(Author::User, raw_text)
    }

    pub fn bot(raw_text: impl Into<String>) -> Self {
        Self::new(Author::Bot, raw_text)
    }

    pub fn notice(raw_text: impl Into<String>) -> Self {
        Self::new(Author::System, raw_text)
    }
}

/// One segment as it will be displayed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedSegment {
    pub kind: SegmentKind,
    /// Source text, delimiters included
    pub raw: String,
    /// Text to show
    pub display: String,
    /// False when display fell back to the raw text
    pub typeset: bool,
}

impl RenderedSegment {
    fn raw(segment: Segment) -> Self {
        Self {
            kind: segment.kind,
            display: segment.text.clone(),
            raw: segment.text,
            typeset: false,
        }
    }
}

/// A rendered timeline row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineEntry {
    pub author: Author,
    pub lane: Lane,
    pub segments: Vec<RenderedSegment>,
    pub timestamp: String,
}

impl TimelineEntry {
    /// Raw text of all segments joined
    pub fn raw_text(&self) -> String {
        self.segments.iter().map(|s| s.raw.as_str()).collect()
    }
}

/// Builds timeline entries from messages
#[derive(Clone, Default)]
pub struct Renderer {
    typesetter: Option<Arc<dyn Typesetter>>,
}

impl Renderer {
    /// Renderer without a typesetter; every segment shows its raw text
    pub fn new() -> Self {
        Self { typesetter: None }
    }

    pub fn with_typesetter(typesetter: Arc<dyn Typesetter>) -> Self {
        Self {
            typesetter: Some(typesetter),
        }
    }

    /// Render a message, or `None` when it has nothing to show
    pub fn render(&self, message: &Message) -> Option<TimelineEntry> {
        let segments = segment(&message.raw_text);
        if segments.is_empty() {
            tracing::debug!(author = ?message.author, "Suppressing blank message");
            return None;
        }

        let segments = segments
            .into_iter()
            .map(|segment| self.render_segment(segment))
            .collect();

        Some(TimelineEntry {
            author: message.author,
            lane: message.author.lane(),
            segments,
            timestamp: message.timestamp.format(TIMESTAMP_FORMAT).to_string(),
        })
    }

    fn render_segment(&self, segment: Segment) -> RenderedSegment {
        let Some(typesetter) = self.typesetter.as_ref() else {
            tracing::debug!("No typesetter available, showing raw segment");
            return RenderedSegment::raw(segment);
        };

        let attempt = panic::catch_unwind(AssertUnwindSafe(|| {
            typesetter.typeset(segment.kind, &segment.text)
        }));

        match attempt {
            Ok(Ok(display)) => RenderedSegment {
                kind: segment.kind,
                raw: segment.text,
                display,
                typeset: true,
            },
            Ok(Err(e)) => {
                tracing::warn!(kind = ?segment.kind, "Typesetting failed for segment: {}", e);
                RenderedSegment::raw(segment)
            }
            Err(_) => {
                tracing::warn!(kind = ?segment.kind, "Typesetter panicked for segment");
                RenderedSegment::raw(segment)
            }
        }
    }
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("typesetter", &self.typesetter.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::typeset::{DelimiterTypesetter, TypesetError};

    struct FailingTypesetter;

    impl Typesetter for FailingTypesetter {
        fn typeset(&self, _kind: SegmentKind, _source: &str) -> Result<String, TypesetError> {
            Err(TypesetError::EmptyFormula)
        }
    }

    struct PanickingTypesetter;

    impl Typesetter for PanickingTypesetter {
        fn typeset(&self, kind: SegmentKind, source: &str) -> Result<String, TypesetError> {
            if kind == SegmentKind::FormulaBlock {
                panic!("malformed math");
            }
            Ok(source.to_uppercase())
        }
    }

    fn fixed_message(author: Author, text: &str) -> Message {
        let ts = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 0).unwrap();
        Message::at(author, text, ts)
    }

    // ==================== Entry Shape Tests ====================

    #[test]
    fn test_render_user_entry() {
        let entry = Renderer::new().render(&fixed_message(Author::User, "2+2?")).unwrap();
        assert_eq!(entry.author, Author::User);
        assert_eq!(entry.lane, Lane::Right);
        assert_eq!(entry.timestamp, "07:05");
        assert_eq!(entry.segments.len(), 1);
        assert_eq!(entry.raw_text(), "2+2?");
    }

    #[test]
    fn test_bot_and_notice_use_left_lane() {
        let renderer = Renderer::new();
        assert_eq!(renderer.render(&fixed_message(Author::Bot, "4")).unwrap().lane, Lane::Left);
        assert_eq!(
            renderer.render(&fixed_message(Author::System, "cancelled")).unwrap().lane,
            Lane::Left
        );
    }

    #[test]
    fn test_blank_message_not_rendered() {
        assert!(Renderer::new().render(&fixed_message(Author::Bot, "   \n ")).is_none());
    }

    #[test]
    fn test_segments_tagged_in_order() {
        let entry = Renderer::new()
            .render(&fixed_message(Author::Bot, "a $$x^2$$ b"))
            .unwrap();
        let kinds: Vec<_> = entry.segments.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![SegmentKind::PlainText, SegmentKind::FormulaBlock, SegmentKind::PlainText]
        );
    }

    // ==================== Typesetting Tests ====================

    #[test]
    fn test_without_typesetter_shows_raw() {
        let entry = Renderer::new()
            .render(&fixed_message(Author::Bot, "$$x$$"))
            .unwrap();
        assert_eq!(entry.segments[0].display, "$$x$$");
        assert!(!entry.segments[0].typeset);
    }

    #[test]
    fn test_typesetter_applied() {
        let renderer = Renderer::with_typesetter(Arc::new(DelimiterTypesetter::new()));
        let entry = renderer
            .render(&fixed_message(Author::Bot, "area $$\\pi r^2$$"))
            .unwrap();
        assert_eq!(entry.segments[1].display, "\\pi r^2");
        assert_eq!(entry.segments[1].raw, "$$\\pi r^2$$");
        assert!(entry.segments.iter().all(|s| s.typeset));
    }

    #[test]
    fn test_typeset_error_falls_back_to_raw() {
        let renderer = Renderer::with_typesetter(Arc::new(FailingTypesetter));
        let entry = renderer.render(&fixed_message(Author::Bot, "$$x$$")).unwrap();
        assert_eq!(entry.segments[0].display, "$$x$$");
        assert!(!entry.segments[0].typeset);
    }

    #[test]
    fn test_typeset_panic_falls_back_to_raw() {
        let renderer = Renderer::with_typesetter(Arc::new(PanickingTypesetter));
        let entry = renderer
            .render(&fixed_message(Author::Bot, "ok $$bad$$"))
            .unwrap();
        assert_eq!(entry.segments[0].display, "OK ");
        assert!(entry.segments[0].typeset);
        assert_eq!(entry.segments[1].display, "$$bad$$");
        assert!(!entry.segments[1].typeset);
    }

    #[test]
    fn test_malformed_inline_math_only_affects_its_segment() {
        let renderer = Renderer::with_typesetter(Arc::new(DelimiterTypesetter::new()));
        let entry = renderer
            .render(&fixed_message(Author::Bot, "pay $5 $$y$$"))
            .unwrap();
        assert_eq!(entry.segments[0].display, "pay $5 ");
        assert!(!entry.segments[0].typeset);
        assert_eq!(entry.segments[1].display, "y");
    }

    #[test]
    fn test_author_labels() {
        assert_eq!(Author::User.label(), "You");
        assert_eq!(Author::Bot.label(), "Bot");
        assert_eq!(Author::System.label(), "Notice");
    }
}
