pub mod buffer;
pub mod cache;
pub mod message;
pub mod mode;
pub mod pane;
pub mod replace;
pub mod search;
pub mod selection;
pub mod split;
pub mod undo;
pub mod wrap;

pub use buffer::{LoadError, TextBuffer};
pub use mode::Mode;
pub use pane::Pane;

/// A buffer location addressed by line and rune column (both 0-based).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl Position {
    pub fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}
