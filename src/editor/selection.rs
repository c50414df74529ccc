use super::buffer::TextBuffer;
use super::Position;

/// Visual selection between an anchor and a moving cursor end.
///
/// The pair is stored as dragged and only normalized on read, so the
/// anchor keeps its meaning while the cursor end moves past it.
///
/// Ranges are head-inclusive and tail-exclusive: `start.col` to the end
/// of the first line, every line in between, then column 0 up to (not
/// including) `end.col` on the last line.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    anchor: Position,
    cursor: Position,
    active: bool,
}

impl Selection {
    pub fn start(&mut self, line: usize, col: usize) {
        self.anchor = Position::new(line, col);
        self.cursor = self.anchor;
        self.active = true;
    }

    /// Move the cursor end; ignored while inactive.
    pub fn update(&mut self, line: usize, col: usize) {
        if self.active {
            self.cursor = Position::new(line, col);
        }
    }

    pub fn clear(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Normalized `(start, end)` with `start <= end`, or `None` when inactive.
    pub fn range(&self) -> Option<(Position, Position)> {
        if !self.active {
            return None;
        }
        if self.anchor <= self.cursor {
            Some((self.anchor, self.cursor))
        } else {
            Some((self.cursor, self.anchor))
        }
    }

    /// Column span selected on `line`, `None` if the line is outside the range.
    /// The end is `usize::MAX` for lines selected through their end.
    pub fn columns_on(&self, line: usize) -> Option<(usize, usize)> {
        let (start, end) = self.range()?;
        if line < start.line || line > end.line {
            return None;
        }
        let from = if line == start.line { start.col } else { 0 };
        let to = if line == end.line { end.col } else { usize::MAX };
        Some((from, to))
    }

    pub fn selected_text(&self, buffer: &TextBuffer) -> Option<String> {
        let (start, end) = self.clamped_range(buffer)?;
        let first = buffer.line_slice(start.line)?;

        if start.line == end.line {
            return Some(first.slice(start.col..end.col).to_string());
        }

        let mut text = first.slice(start.col..).to_string();
        for line in start.line + 1..end.line {
            text.push('\n');
            text.push_str(&buffer.line(line));
        }
        text.push('\n');
        if let Some(last) = buffer.line_slice(end.line) {
            text.push_str(&last.slice(..end.col).to_string());
        }
        Some(text)
    }

    /// Delete the selected text through buffer primitives so every step
    /// lands in the undo log. Clears the selection and returns where the
    /// cursor belongs.
    pub fn delete_selected_text(&mut self, buffer: &mut TextBuffer) -> Option<Position> {
        let (start, end) = self.clamped_range(buffer)?;
        self.clear();

        if start.line == end.line {
            for _ in start.col..end.col {
                buffer.delete_rune(start.line, start.col + 1);
            }
            return Some(start);
        }

        // Head: from start.col to the end of the first line
        let head_len = buffer.line_len(start.line);
        for col in (start.col + 1..=head_len).rev() {
            buffer.delete_rune(start.line, col);
        }
        for _ in start.line + 1..end.line {
            buffer.delete_line(start.line + 1);
        }
        // Tail: column 0 up to end.col on what is now the next line
        for _ in 0..end.col {
            buffer.delete_rune(start.line + 1, 1);
        }
        buffer.join_line(start.line);
        Some(start)
    }

    /// `VISUAL - 5 chars` or `VISUAL - 3 lines, 42 chars`.
    pub fn status(&self, buffer: &TextBuffer) -> Option<String> {
        let (start, end) = self.range()?;
        let chars = self
            .selected_text(buffer)
            .map(|t| t.chars().count())
            .unwrap_or(0);
        if start.line == end.line {
            Some(format!("VISUAL - {chars} chars"))
        } else {
            Some(format!(
                "VISUAL - {} lines, {chars} chars",
                end.line - start.line + 1
            ))
        }
    }

    fn clamped_range(&self, buffer: &TextBuffer) -> Option<(Position, Position)> {
        let (mut start, mut end) = self.range()?;
        let last = buffer.line_count() - 1;
        if start.line > last {
            return None;
        }
        end.line = end.line.min(last);
        start.col = start.col.min(buffer.line_len(start.line));
        end.col = end.col.min(buffer.line_len(end.line));
        if start.line == end.line && end.col < start.col {
            end.col = start.col;
        }
        Some((start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(buf: &TextBuffer) -> Vec<String> {
        (0..buf.line_count()).map(|i| buf.line(i)).collect()
    }

    #[test]
    fn test_range_is_normalized_both_directions() {
        let mut sel = Selection::default();
        sel.start(3, 2);
        sel.update(1, 5);
        assert_eq!(sel.range(), Some((Position::new(1, 5), Position::new(3, 2))));

        sel.start(1, 5);
        sel.update(3, 2);
        assert_eq!(sel.range(), Some((Position::new(1, 5), Position::new(3, 2))));
    }

    #[test]
    fn test_inactive_selection() {
        let mut sel = Selection::default();
        assert_eq!(sel.range(), None);
        sel.update(1, 1);
        assert!(!sel.is_active());
        sel.start(0, 0);
        sel.clear();
        assert_eq!(sel.columns_on(0), None);
    }

    #[test]
    fn test_selected_text_across_lines() {
        let buf = TextBuffer::from_text("abcd\nefgh");
        let mut sel = Selection::default();
        sel.start(0, 1);
        sel.update(1, 2);
        assert_eq!(sel.selected_text(&buf).as_deref(), Some("bcd\nef"));
    }

    #[test]
    fn test_selected_text_keeps_middle_lines() {
        let buf = TextBuffer::from_text("one\ntwo\nthree");
        let mut sel = Selection::default();
        sel.start(2, 3);
        sel.update(0, 1);
        assert_eq!(sel.selected_text(&buf).as_deref(), Some("ne\ntwo\nthr"));
    }

    #[test]
    fn test_columns_are_tail_exclusive() {
        let mut sel = Selection::default();
        sel.start(0, 1);
        sel.update(1, 2);
        assert_eq!(sel.columns_on(0), Some((1, usize::MAX)));
        assert_eq!(sel.columns_on(1), Some((0, 2)));
        assert_eq!(sel.columns_on(2), None);
    }

    #[test]
    fn test_delete_single_line() {
        let mut buf = TextBuffer::from_text("héllo");
        let mut sel = Selection::default();
        sel.start(0, 1);
        sel.update(0, 3);
        assert_eq!(sel.delete_selected_text(&mut buf), Some(Position::new(0, 1)));
        assert_eq!(buf.line(0), "hlo");
        assert!(!sel.is_active());
    }

    #[test]
    fn test_delete_across_lines_and_undo() {
        let mut buf = TextBuffer::from_text("abcd\nmiddle\nefgh\ntail");
        let mut sel = Selection::default();
        sel.start(0, 1);
        sel.update(2, 2);
        sel.delete_selected_text(&mut buf);
        assert_eq!(lines(&buf), vec!["agh", "tail"]);

        while buf.undo() {}
        assert_eq!(lines(&buf), vec!["abcd", "middle", "efgh", "tail"]);
    }

    #[test]
    fn test_status() {
        let buf = TextBuffer::from_text("abcd\nefgh");
        let mut sel = Selection::default();
        sel.start(0, 0);
        sel.update(0, 3);
        assert_eq!(sel.status(&buf).as_deref(), Some("VISUAL - 3 chars"));
        sel.update(1, 2);
        assert_eq!(
            sel.status(&buf).as_deref(),
            Some("VISUAL - 2 lines, 7 chars")
        );
    }
}
