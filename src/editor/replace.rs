use tracing::debug;

use super::buffer::TextBuffer;
use super::search::{find_matches, SearchMatch};
use super::Position;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReplaceState {
    #[default]
    Inactive,
    SearchInput,
    ReplaceInput,
    Confirm,
}

/// Confirm-per-match find and replace.
///
/// The match list is frozen when the search term is committed; each
/// replacement then shifts the remaining matches on its line.
#[derive(Debug, Clone, Default)]
pub struct ReplaceEngine {
    state: ReplaceState,
    search_term: String,
    replace_term: String,
    matches: Vec<SearchMatch>,
    index: usize,
    replaced: usize,
}

impl ReplaceEngine {
    pub fn start(&mut self) {
        *self = Self {
            state: ReplaceState::SearchInput,
            ..Self::default()
        };
    }

    pub fn state(&self) -> ReplaceState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state != ReplaceState::Inactive
    }

    pub fn push_char(&mut self, c: char) {
        match self.state {
            ReplaceState::SearchInput => self.search_term.push(c),
            ReplaceState::ReplaceInput => self.replace_term.push(c),
            _ => {}
        }
    }

    pub fn pop_char(&mut self) {
        match self.state {
            ReplaceState::SearchInput => {
                self.search_term.pop();
            }
            ReplaceState::ReplaceInput => {
                self.replace_term.pop();
            }
            _ => {}
        }
    }

    /// Freeze the matches for the search term. Returns the match count;
    /// with none the engine goes straight back to inactive.
    pub fn confirm_search(&mut self, buffer: &TextBuffer) -> usize {
        if self.state != ReplaceState::SearchInput {
            return 0;
        }
        self.matches = find_matches(buffer, &self.search_term);
        self.state = if self.matches.is_empty() {
            ReplaceState::Inactive
        } else {
            ReplaceState::ReplaceInput
        };
        debug!(term = %self.search_term, matches = self.matches.len(), "replace search");
        self.matches.len()
    }

    /// Start confirming, positioned on the first match.
    pub fn confirm_replace(&mut self) -> Option<SearchMatch> {
        if self.state != ReplaceState::ReplaceInput {
            return None;
        }
        self.state = ReplaceState::Confirm;
        self.index = 0;
        self.current()
    }

    pub fn current(&self) -> Option<SearchMatch> {
        if self.state == ReplaceState::Confirm {
            self.matches.get(self.index).copied()
        } else {
            None
        }
    }

    /// Replace the current match rune by rune, then advance.
    /// Returns the cursor position just past the inserted text.
    pub fn replace_current(&mut self, buffer: &mut TextBuffer) -> Option<Position> {
        let m = self.current()?;
        for _ in 0..m.len {
            buffer.delete_rune(m.line, m.col + 1);
        }
        let mut col = m.col;
        for ch in self.replace_term.chars() {
            buffer.insert_rune(m.line, col, ch);
            col += 1;
        }
        self.replaced += 1;

        // Later matches on the same line moved; overlapping ones are gone
        let inserted = col - m.col;
        let end = m.col + m.len;
        let mut rest: Vec<SearchMatch> = self.matches.split_off(self.index + 1);
        rest.retain(|other| other.line != m.line || other.col >= end);
        for other in rest.iter_mut().filter(|o| o.line == m.line) {
            other.col = other.col + inserted - m.len;
        }
        self.matches.extend(rest);

        self.advance();
        Some(Position::new(m.line, col))
    }

    /// Skip the current match. Returns false once the engine finishes.
    pub fn advance(&mut self) -> bool {
        if self.state != ReplaceState::Confirm {
            return false;
        }
        self.index += 1;
        if self.index >= self.matches.len() {
            self.state = ReplaceState::Inactive;
            return false;
        }
        true
    }

    pub fn cancel(&mut self) {
        self.state = ReplaceState::Inactive;
    }

    pub fn replaced(&self) -> usize {
        self.replaced
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    /// Prompt text for the status line in the current state.
    pub fn prompt(&self) -> String {
        match self.state {
            ReplaceState::SearchInput => format!("Find: {}", self.search_term),
            ReplaceState::ReplaceInput => {
                format!("Find: {} | Replace: {}", self.search_term, self.replace_term)
            }
            ReplaceState::Confirm => format!(
                "Replace? [y/n/q] ({}/{})",
                self.index + 1,
                self.matches.len()
            ),
            ReplaceState::Inactive => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(search: &str, replace: &str, buffer: &TextBuffer) -> ReplaceEngine {
        let mut engine = ReplaceEngine::default();
        engine.start();
        search.chars().for_each(|c| engine.push_char(c));
        engine.confirm_search(buffer);
        replace.chars().for_each(|c| engine.push_char(c));
        engine.confirm_replace();
        engine
    }

    #[test]
    fn test_state_flow() {
        let buf = TextBuffer::from_text("cat hat");
        let mut engine = ReplaceEngine::default();
        assert_eq!(engine.state(), ReplaceState::Inactive);

        engine.start();
        engine.push_char('a');
        engine.push_char('x');
        engine.pop_char();
        assert_eq!(engine.prompt(), "Find: a");
        assert_eq!(engine.confirm_search(&buf), 2);
        assert_eq!(engine.state(), ReplaceState::ReplaceInput);

        engine.push_char('o');
        assert_eq!(engine.prompt(), "Find: a | Replace: o");
        let first = engine.confirm_replace().unwrap();
        assert_eq!((first.line, first.col), (0, 1));
        assert_eq!(engine.prompt(), "Replace? [y/n/q] (1/2)");
    }

    #[test]
    fn test_no_matches_goes_inactive() {
        let buf = TextBuffer::from_text("abc");
        let mut engine = ReplaceEngine::default();
        engine.start();
        engine.push_char('z');
        assert_eq!(engine.confirm_search(&buf), 0);
        assert!(!engine.is_active());
    }

    #[test]
    fn test_replace_yes_and_no() {
        let mut buf = TextBuffer::from_text("cat hat\nbat");
        let mut engine = engine("at", "ow", &buf);

        engine.replace_current(&mut buf);
        assert!(engine.advance()); // skip "hat"
        engine.replace_current(&mut buf);

        assert_eq!(buf.line(0), "cow hat");
        assert_eq!(buf.line(1), "bow");
        assert!(!engine.is_active());
        assert_eq!(engine.replaced(), 2);
    }

    #[test]
    fn test_longer_replacement_shifts_same_line_matches() {
        let mut buf = TextBuffer::from_text("a-a-a");
        let mut engine = engine("a", "xyz", &buf);
        while engine.current().is_some() {
            engine.replace_current(&mut buf);
        }
        assert_eq!(buf.line(0), "xyz-xyz-xyz");
    }

    #[test]
    fn test_overlapping_matches_are_dropped() {
        let mut buf = TextBuffer::from_text("aaa");
        let mut engine = engine("aa", "b", &buf);
        let pos = engine.replace_current(&mut buf);
        assert_eq!(pos, Some(Position::new(0, 1)));
        assert_eq!(buf.line(0), "ba");
        assert!(!engine.is_active());
    }

    #[test]
    fn test_replacement_is_undoable() {
        let mut buf = TextBuffer::from_text("héllo");
        let mut engine = engine("é", "e", &buf);
        engine.replace_current(&mut buf);
        assert_eq!(buf.line(0), "hello");
        while buf.undo() {}
        assert_eq!(buf.line(0), "héllo");
    }

    #[test]
    fn test_cancel() {
        let buf = TextBuffer::from_text("aaa");
        let mut engine = engine("a", "b", &buf);
        engine.cancel();
        assert_eq!(engine.current(), None);
        assert_eq!(engine.prompt(), "");
    }
}
