use std::collections::VecDeque;

use super::Position;

/// A single reversible buffer edit.
///
/// Each variant describes the edit in its forward direction and carries
/// enough data to reverse it exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoAction {
    InsertRune {
        line: usize,
        col: usize,
        ch: char,
    },
    /// `col` is the column of the removed rune, not the cursor column.
    DeleteRune {
        line: usize,
        col: usize,
        ch: char,
    },
    InsertLine {
        line: usize,
    },
    DeleteLine {
        line: usize,
        content: String,
    },
    SplitLine {
        line: usize,
        col: usize,
    },
    /// `col` is the length of `line` before the merge.
    JoinLine {
        line: usize,
        col: usize,
    },
}

impl UndoAction {
    /// Where the cursor belongs once this action has been reversed.
    pub fn undo_position(&self) -> Position {
        match *self {
            UndoAction::InsertRune { line, col, .. } => Position::new(line, col),
            UndoAction::DeleteRune { line, col, .. } => Position::new(line, col + 1),
            UndoAction::InsertLine { line } => Position::new(line, 0),
            UndoAction::DeleteLine { line, .. } => Position::new(line, 0),
            UndoAction::SplitLine { line, col } => Position::new(line, col),
            UndoAction::JoinLine { line, .. } => Position::new(line + 1, 0),
        }
    }

    /// Where the cursor belongs once this action has been re-applied.
    pub fn redo_position(&self) -> Position {
        match *self {
            UndoAction::InsertRune { line, col, .. } => Position::new(line, col + 1),
            UndoAction::DeleteRune { line, col, .. } => Position::new(line, col),
            UndoAction::InsertLine { line } => Position::new(line, 0),
            UndoAction::DeleteLine { line, .. } => Position::new(line, 0),
            UndoAction::SplitLine { line, .. } => Position::new(line + 1, 0),
            UndoAction::JoinLine { line, col } => Position::new(line, col),
        }
    }
}

/// Linear undo history with a cursor.
///
/// Actions before the cursor can be undone, actions at or after it can be
/// redone. Pushing truncates the redo side.
#[derive(Debug, Clone)]
pub struct UndoStack {
    actions: VecDeque<UndoAction>,
    cursor: usize,
    max_size: usize,
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new(10_000)
    }
}

impl UndoStack {
    pub fn new(max_size: usize) -> Self {
        Self {
            actions: VecDeque::new(),
            cursor: 0,
            max_size: max_size.max(1),
        }
    }

    pub fn push(&mut self, action: UndoAction) {
        self.actions.truncate(self.cursor);
        self.actions.push_back(action);

        // Oldest history goes first once the limit is hit
        while self.actions.len() > self.max_size {
            self.actions.pop_front();
        }
        self.cursor = self.actions.len();
    }

    /// Step back, returning the action to reverse.
    pub fn undo(&mut self) -> Option<UndoAction> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        self.actions.get(self.cursor).cloned()
    }

    /// Step forward, returning the action to re-apply.
    pub fn redo(&mut self) -> Option<UndoAction> {
        let action = self.actions.get(self.cursor).cloned()?;
        self.cursor += 1;
        Some(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ins(col: usize) -> UndoAction {
        UndoAction::InsertRune {
            line: 0,
            col,
            ch: 'a',
        }
    }

    #[test]
    fn test_undo_redo_walks_cursor() {
        let mut stack = UndoStack::default();
        stack.push(ins(0));
        stack.push(ins(1));

        assert_eq!(stack.undo(), Some(ins(1)));
        assert_eq!(stack.undo(), Some(ins(0)));
        assert_eq!(stack.undo(), None);
        assert_eq!(stack.redo(), Some(ins(0)));
        assert_eq!(stack.redo(), Some(ins(1)));
        assert_eq!(stack.redo(), None);
    }

    #[test]
    fn test_push_discards_redo() {
        let mut stack = UndoStack::default();
        stack.push(ins(0));
        stack.push(ins(1));
        stack.undo();
        stack.undo();
        stack.push(ins(5));

        assert_eq!(stack.redo(), None);
        assert_eq!(stack.actions.len(), 1);
        assert_eq!(stack.undo(), Some(ins(5)));
    }

    #[test]
    fn test_limit_drops_oldest() {
        let mut stack = UndoStack::new(2);
        stack.push(ins(0));
        stack.push(ins(1));
        stack.push(ins(2));

        assert_eq!(stack.actions.len(), 2);
        assert_eq!(stack.undo(), Some(ins(2)));
        assert_eq!(stack.undo(), Some(ins(1)));
        assert_eq!(stack.undo(), None);
    }

    #[test]
    fn test_positions() {
        let split = UndoAction::SplitLine { line: 2, col: 4 };
        assert_eq!(split.undo_position(), Position::new(2, 4));
        assert_eq!(split.redo_position(), Position::new(3, 0));

        let del = UndoAction::DeleteRune {
            line: 0,
            col: 3,
            ch: 'x',
        };
        assert_eq!(del.undo_position(), Position::new(0, 4));
        assert_eq!(del.redo_position(), Position::new(0, 3));
    }
}
