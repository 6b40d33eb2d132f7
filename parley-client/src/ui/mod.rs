//! Console front end
//!
//! Line-based terminal interface: a composer for input, a presenter for the
//! timeline and a persisted theme preference.

mod console;
mod input;
mod theme;

pub use console::ConsolePresenter;
pub use input::{is_command, parse_command, Composer, InputCommand, ParseError, HELP_TEXT};
pub use theme::{Palette, Theme, ThemeStore};
