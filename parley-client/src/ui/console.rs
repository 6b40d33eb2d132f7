//! Line-oriented console presenter
//!
//! Prints timeline entries, control hints and status lines to any writer,
//! colored by the current theme.

use std::io::{self, Write};

use crossterm::queue;
use crossterm::style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor};

use crate::render::{Author, Lane, TimelineEntry};
use crate::segment::SegmentKind;
use crate::session::{Controls, Presenter, StatusLevel, TransientStatus};
use crate::timeline::Timeline;

use super::theme::{Palette, Theme};

/// Indent applied to entries in the right lane
const RIGHT_LANE_INDENT: &str = "        ";

/// Extra indent for formula blocks
const FORMULA_INDENT: &str = "    ";

/// Presenter writing to a terminal or any other writer
pub struct ConsolePresenter<W: Write> {
    out: W,
    theme: Theme,
    timeline: Timeline,
    controls: Option<Controls>,
    status: Option<TransientStatus>,
}

impl<W: Write> ConsolePresenter<W> {
    pub fn new(out: W, theme: Theme) -> Self {
        Self {
            out,
            theme,
            timeline: Timeline::new(),
            controls: None,
            status: None,
        }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
        let palette = self.palette();
        self.report(|out| {
            queue!(
                out,
                SetForegroundColor(palette.info),
                Print(format!("Theme: {}\n", theme.as_str())),
                ResetColor
            )
        });
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn controls(&self) -> Option<Controls> {
        self.controls
    }

    /// Currently shown status
    pub fn status(&self) -> Option<&TransientStatus> {
        self.status.as_ref()
    }

    /// Print a block of plain informational text
    pub fn print_info(&mut self, text: &str) {
        self.report(|out| queue!(out, Print(text), Print("\n")));
    }

    /// Print a local error that is not part of the conversation
    pub fn print_error(&mut self, text: &str) {
        let color = self.palette().error;
        self.report(|out| {
            queue!(
                out,
                SetForegroundColor(color),
                Print(format!("! {}\n", text)),
                ResetColor
            )
        });
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn palette(&self) -> Palette {
        self.theme.palette()
    }

    /// Run a write and flush, logging instead of failing
    fn report<F>(&mut self, write: F)
    where
        F: FnOnce(&mut W) -> io::Result<()>,
    {
        let result = write(&mut self.out).and_then(|_| self.out.flush());
        if let Err(e) = result {
            tracing::warn!("Failed to write to console: {}", e);
        }
    }

    fn write_entry(&mut self, entry: &TimelineEntry) -> io::Result<()> {
        let palette = self.palette();
        let indent = match entry.lane {
            Lane::Left => "",
            Lane::Right => RIGHT_LANE_INDENT,
        };
        let author_color = match entry.author {
            Author::User => palette.user,
            Author::Bot => palette.bot,
            Author::System => palette.notice,
        };

        queue!(
            self.out,
            Print(indent),
            SetForegroundColor(author_color),
            SetAttribute(Attribute::Bold),
            Print(entry.author.label()),
            SetAttribute(Attribute::Reset),
            SetForegroundColor(palette.timestamp),
            Print(format!(" {}\n", entry.timestamp)),
            ResetColor
        )?;

        for (kind, line) in entry_lines(entry) {
            let (color, extra) = match kind {
                SegmentKind::FormulaBlock => (palette.formula, FORMULA_INDENT),
                SegmentKind::PlainText if entry.author == Author::System => (palette.notice, ""),
                SegmentKind::PlainText => (Color::Reset, ""),
            };
            queue!(
                self.out,
                Print(indent),
                Print("  "),
                Print(extra),
                SetForegroundColor(color),
                Print(line),
                ResetColor,
                Print("\n")
            )?;
        }

        Ok(())
    }
}

/// Lay out an entry's segments as console lines
///
/// Plain text flows together; every formula block gets its own lines.
fn entry_lines(entry: &TimelineEntry) -> Vec<(SegmentKind, String)> {
    let mut lines = Vec::new();
    let mut pending = String::new();

    for segment in &entry.segments {
        match segment.kind {
            SegmentKind::PlainText => pending.push_str(&segment.display),
            SegmentKind::FormulaBlock => {
                flush_plain(&mut pending, &mut lines);
                for line in segment.display.trim().lines() {
                    lines.push((SegmentKind::FormulaBlock, line.trim().to_string()));
                }
            }
        }
    }
    flush_plain(&mut pending, &mut lines);
    lines
}

fn flush_plain(pending: &mut String, lines: &mut Vec<(SegmentKind, String)>) {
    if !pending.trim().is_empty() {
        for line in pending.trim().lines() {
            lines.push((SegmentKind::PlainText, line.to_string()));
        }
    }
    pending.clear();
}

fn controls_hint(controls: Controls) -> &'static str {
    if controls.cancel_visible {
        "Waiting for an answer. Type /cancel to stop waiting."
    } else if controls.send_enabled {
        "Ready."
    } else {
        "Input is paused."
    }
}

impl<W: Write> Presenter for ConsolePresenter<W> {
    fn append_entry(&mut self, entry: TimelineEntry) {
        let result = self.write_entry(&entry).and_then(|_| self.out.flush());
        if let Err(e) = result {
            tracing::warn!("Failed to print entry: {}", e);
        }
        self.timeline.append(entry);
    }

    fn set_controls(&mut self, controls: Controls) {
        if self.controls == Some(controls) {
            return;
        }
        self.controls = Some(controls);

        let color = self.palette().timestamp;
        let hint = controls_hint(controls);
        self.report(|out| {
            queue!(
                out,
                SetForegroundColor(color),
                Print(format!("-- {}\n", hint)),
                ResetColor
            )
        });
    }

    fn show_status(&mut self, status: &TransientStatus) {
        let palette = self.palette();
        let (color, tag) = match status.level {
            StatusLevel::Info => (palette.info, "info"),
            StatusLevel::Success => (palette.success, "ok"),
            StatusLevel::Error => (palette.error, "error"),
        };
        self.status = Some(status.clone());
        self.report(|out| {
            queue!(
                out,
                SetForegroundColor(color),
                Print(format!("[{}] {}\n", tag, status.text)),
                ResetColor
            )
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }
}

impl<W: Write> std::fmt::Debug for ConsolePresenter<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsolePresenter")
            .field("theme", &self.theme)
            .field("entries", &self.timeline.len())
            .field("status", &self.status)
            .finish()
    }
}
