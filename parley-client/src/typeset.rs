//! Math typesetting collaborators
//!
//! The renderer hands every segment to a [`Typesetter`] together with its
//! kind. Typesetters may refuse malformed input; the renderer then shows the
//! raw text instead.

use crate::segment::{SegmentKind, FORMULA_MARKER};

/// Errors a typesetter can report for a single segment
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypesetError {
    #[error("unbalanced `{delimiter}` delimiter at byte {offset}")]
    Unbalanced { delimiter: &'static str, offset: usize },

    #[error("empty formula")]
    EmptyFormula,

    #[error("segment is not a formula block")]
    NotAFormula,
}

/// Turns the raw text of a segment into display text
pub trait Typesetter: Send + Sync {
    fn typeset(&self, kind: SegmentKind, source: &str) -> Result<String, TypesetError>;
}

/// Terminal typesetter that strips math delimiters
///
/// Formula blocks show their inner formula. Plain text keeps its wording
/// with inline `$..$`, `\(..\)` and `\[..\]` delimiters removed; `\$` is a
/// literal dollar sign.
#[derive(Debug, Clone, Copy, Default)]
pub struct DelimiterTypesetter;

impl DelimiterTypesetter {
    pub fn new() -> Self {
        Self
    }

    fn formula(&self, source: &str) -> Result<String, TypesetError> {
        let inner = source
            .strip_prefix(FORMULA_MARKER)
            .and_then(|s| s.strip_suffix(FORMULA_MARKER))
            .ok_or(TypesetError::NotAFormula)?;
        let inner = inner.trim();
        if inner.is_empty() {
            return Err(TypesetError::EmptyFormula);
        }
        Ok(inner.to_string())
    }

    fn inline(&self, source: &str) -> Result<String, TypesetError> {
        let mut out = String::with_capacity(source.len());
        let mut rest = source;
        let mut offset = 0;

        while let Some(pos) = rest.find(['$', '\\']) {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos..];

            let (open, close) = if tail.starts_with("\\$") {
                out.push('$');
                advance(&mut rest, &mut offset, pos + 2);
                continue;
            } else if tail.starts_with("\\(") {
                ("\\(", "\\)")
            } else if tail.starts_with("\\[") {
                ("\\[", "\\]")
            } else if tail.starts_with(FORMULA_MARKER) {
                // A display marker the segmenter left behind has no partner
                return Err(TypesetError::Unbalanced {
                    delimiter: FORMULA_MARKER,
                    offset: offset + pos,
                });
            } else if tail.starts_with('$') {
                ("$", "$")
            } else {
                out.push('\\');
                advance(&mut rest, &mut offset, pos + 1);
                continue;
            };

            let body_start = pos + open.len();
            let Some(len) = rest[body_start..].find(close) else {
                return Err(TypesetError::Unbalanced {
                    delimiter: open,
                    offset: offset + pos,
                });
            };
            let body = rest[body_start..body_start + len].trim();
            if body.is_empty() {
                return Err(TypesetError::EmptyFormula);
            }
            out.push_str(body);
            advance(&mut rest, &mut offset, body_start + len + close.len());
        }

        out.push_str(rest);
        Ok(out)
    }
}

fn advance(rest: &mut &str, offset: &mut usize, by: usize) {
    *rest = &rest[by..];
    *offset += by;
}

impl Typesetter for DelimiterTypesetter {
    fn typeset(&self, kind: SegmentKind, source: &str) -> Result<String, TypesetError> {
        match kind {
            SegmentKind::FormulaBlock => self.formula(source),
            SegmentKind::PlainText => self.inline(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(source: &str) -> Result<String, TypesetError> {
        DelimiterTypesetter::new().typeset(SegmentKind::PlainText, source)
    }

    fn block(source: &str) -> Result<String, TypesetError> {
        DelimiterTypesetter::new().typeset(SegmentKind::FormulaBlock, source)
    }

    // ==================== Formula Block Tests ====================

    #[test]
    fn test_block_strips_markers() {
        assert_eq!(block("$$ x^2 + 1 $$").unwrap(), "x^2 + 1");
    }

    #[test]
    fn test_block_multiline() {
        assert_eq!(block("$$\na + b\n$$").unwrap(), "a + b");
    }

    #[test]
    fn test_block_empty() {
        assert_eq!(block("$$  $$"), Err(TypesetError::EmptyFormula));
    }

    #[test]
    fn test_block_without_markers() {
        assert_eq!(block("x^2"), Err(TypesetError::NotAFormula));
    }

    // ==================== Inline Tests ====================

    #[test]
    fn test_plain_without_math_unchanged() {
        assert_eq!(plain("just words").unwrap(), "just words");
    }

    #[test]
    fn test_inline_dollar() {
        assert_eq!(plain("area is $\\pi r^2$ units").unwrap(), "area is \\pi r^2 units");
    }

    #[test]
    fn test_inline_paren_and_bracket() {
        assert_eq!(plain("see \\(a+b\\) and \\[c\\]").unwrap(), "see a+b and c");
    }

    #[test]
    fn test_escaped_dollar_is_literal() {
        assert_eq!(plain("costs \\$5").unwrap(), "costs $5");
    }

    #[test]
    fn test_other_backslashes_kept() {
        assert_eq!(plain("path C:\\temp").unwrap(), "path C:\\temp");
    }

    #[test]
    fn test_unbalanced_inline_dollar() {
        assert_eq!(
            plain("price $5 only"),
            Err(TypesetError::Unbalanced { delimiter: "$", offset: 6 })
        );
    }

    #[test]
    fn test_stray_display_marker_rejected() {
        assert!(matches!(
            plain("open $$x forever"),
            Err(TypesetError::Unbalanced { delimiter: "$$", .. })
        ));
    }

    #[test]
    fn test_unbalanced_paren() {
        assert!(matches!(
            plain("start \\(x"),
            Err(TypesetError::Unbalanced { delimiter: "\\(", .. })
        ));
    }

    #[test]
    fn test_error_display() {
        let err = TypesetError::Unbalanced { delimiter: "$", offset: 3 };
        assert_eq!(err.to_string(), "unbalanced `$` delimiter at byte 3");
    }
}
