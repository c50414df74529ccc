use ratatui::layout::Rect;
use std::ops::Range;
use std::time::Duration;
use tracing::debug;

use super::buffer::TextBuffer;
use super::cache::{RenderCache, ViewState};
use super::message::MessageManager;
use super::mode::Mode;
use super::replace::ReplaceEngine;
use super::search::{SearchEngine, SearchMatch};
use super::selection::Selection;
use super::{wrap, Position};
use crate::config::Config;
use crate::preview::Preview;
use crate::syntax::SyntaxHighlighter;

/// Click-versus-drag tracking for the left mouse button.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    /// Pressed at screen `(x, y)`, which mapped to buffer position `at`.
    ArmedAt { x: u16, y: u16, at: Position },
    Dragging,
}

impl DragState {
    /// A press turns into a drag once the pointer moves more than one
    /// column or to another row.
    pub fn exceeds_threshold(from: (u16, u16), to: (u16, u16)) -> bool {
        from.0.abs_diff(to.0) > 1 || from.1 != to.1
    }
}

/// What `x` cuts once the clipboard has accepted the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutTarget {
    Selection,
    Line(usize),
}

#[derive(Debug, Clone)]
struct PaneOptions {
    wrap: bool,
    auto_indent: bool,
    show_line_numbers: bool,
}

/// One editable view over one buffer.
pub struct Pane {
    pub buffer: TextBuffer,
    pub cursor: Position,
    /// Buffer line shown in the top row.
    pub offset_y: usize,
    pub offset_x: usize,
    /// Wrapped rows above the top of the viewport.
    pub visual_offset_y: usize,
    /// Wrapped rows of `offset_y` hidden above the viewport.
    top_skip: usize,
    /// Text width `visual_offset_y` was computed for.
    wrap_width: usize,
    pub mode: Mode,
    pub selection: Selection,
    pub search: SearchEngine,
    pub replace: ReplaceEngine,
    pub cache: RenderCache,
    pub messages: MessageManager,
    pub command_line: String,
    pub search_line: String,
    /// First key of a two-key sequence (`gg`, `dd`).
    pub pending: Option<char>,
    pub drag: DragState,
    pub area: Rect,
    pub highlighter: SyntaxHighlighter,
    pub preview: Option<Preview>,
    options: PaneOptions,
}

impl Pane {
    pub fn new(mut buffer: TextBuffer, config: &Config) -> Self {
        buffer.set_undo_limit(config.editor.undo_limit);
        let highlighter = SyntaxHighlighter::for_path(buffer.filename(), &config.theme.syntax);
        debug!(
            language = highlighter.language_name().unwrap_or("plain"),
            "pane opened"
        );
        Self {
            buffer,
            cursor: Position::default(),
            offset_y: 0,
            offset_x: 0,
            visual_offset_y: 0,
            top_skip: 0,
            wrap_width: 0,
            mode: Mode::Normal,
            selection: Selection::default(),
            search: SearchEngine::default(),
            replace: ReplaceEngine::default(),
            cache: RenderCache::default(),
            messages: MessageManager::new(Duration::from_millis(
                config.editor.message_timeout_ms,
            )),
            command_line: String::new(),
            search_line: String::new(),
            pending: None,
            drag: DragState::Idle,
            area: Rect::default(),
            highlighter,
            preview: None,
            options: PaneOptions {
                wrap: config.editor.wrap,
                auto_indent: config.editor.auto_indent,
                show_line_numbers: config.editor.show_line_numbers,
            },
        }
    }

    /// Swap in a freshly loaded buffer, resetting view state.
    pub fn replace_buffer(&mut self, mut buffer: TextBuffer, config: &Config) {
        buffer.set_undo_limit(config.editor.undo_limit);
        self.highlighter = SyntaxHighlighter::for_path(buffer.filename(), &config.theme.syntax);
        self.buffer = buffer;
        self.cursor = Position::default();
        self.offset_y = 0;
        self.offset_x = 0;
        self.visual_offset_y = 0;
        self.top_skip = 0;
        self.selection.clear();
        self.search.clear();
        self.replace.cancel();
        self.preview = None;
        self.pending = None;
        self.cache.invalidate();
    }

    pub fn wraps(&self) -> bool {
        self.options.wrap
    }

    pub fn is_markdown(&self) -> bool {
        self.buffer
            .filename()
            .and_then(|p| p.extension())
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("md") || e.eq_ignore_ascii_case("markdown"))
    }

    // ========== Geometry ==========

    pub fn set_area(&mut self, area: Rect) {
        self.area = area;
        self.adjust_scroll();
    }

    /// Line-number column width: digits of the line count plus a space.
    pub fn gutter_width(&self) -> u16 {
        if !self.options.show_line_numbers {
            return 0;
        }
        let digits = self.buffer.line_count().to_string().len() as u16;
        (digits + 1).min(self.area.width)
    }

    pub fn text_width(&self) -> usize {
        self.area.width.saturating_sub(self.gutter_width()) as usize
    }

    pub fn content_height(&self) -> usize {
        (self.area.height as usize).max(1)
    }

    /// Visual rows occupied by `line`.
    pub fn rows(&self, line: usize) -> usize {
        if self.options.wrap {
            wrap::visual_line_count(self.buffer.line_len(line), self.text_width())
        } else {
            1
        }
    }

    fn segment_of(&self, pos: Position) -> usize {
        if self.options.wrap {
            wrap::segment_index(pos.col, self.buffer.line_len(pos.line), self.text_width())
        } else {
            0
        }
    }

    /// The wrapped row hidden count of the top line.
    pub fn top_skip(&self) -> usize {
        self.top_skip
    }

    pub fn view_state(&self) -> ViewState {
        ViewState {
            cursor: self.cursor,
            offset_y: self.offset_y,
            offset_x: self.offset_x,
            visual_offset_y: self.visual_offset_y,
            width: self.area.width,
            height: self.area.height,
        }
    }

    /// Terminal cell of the cursor, `None` when it is scrolled out of view.
    /// A cursor just past a full wrapped row stays on that row's last cell.
    pub fn cursor_screen(&self) -> Option<(u16, u16)> {
        let seg = self.segment_of(self.cursor);
        if (self.cursor.line, seg) < (self.offset_y, self.top_skip) {
            return None;
        }
        let row = self.rows_between((self.offset_y, self.top_skip), (self.cursor.line, seg));
        if row >= self.area.height as usize {
            return None;
        }
        let width = self.text_width();
        let col = if self.options.wrap {
            self.cursor.col - seg * width
        } else {
            self.cursor.col.checked_sub(self.offset_x)?
        };
        if width == 0 || (!self.options.wrap && col >= width) {
            return None;
        }
        let col = col.min(width - 1) as u16;
        Some((self.area.x + self.gutter_width() + col, self.area.y + row as u16))
    }

    // ========== Cursor ==========

    /// Keep the cursor on a real line and within the mode's column limit.
    pub fn clamp_cursor(&mut self) {
        let last = self.buffer.line_count() - 1;
        self.cursor.line = self.cursor.line.min(last);
        let len = self.buffer.line_len(self.cursor.line);
        let max = if self.mode.allows_past_end() {
            len
        } else {
            len.saturating_sub(1)
        };
        self.cursor.col = self.cursor.col.min(max);
    }

    /// Place the cursor, clamp it and scroll it into view.
    pub fn set_cursor(&mut self, pos: Position) {
        self.cursor = pos;
        self.clamp_cursor();
        self.adjust_scroll();
    }

    pub fn move_left(&mut self) {
        self.cursor.col = self.cursor.col.saturating_sub(1);
        self.after_motion();
    }

    pub fn move_right(&mut self) {
        self.cursor.col += 1;
        self.after_motion();
    }

    pub fn move_up(&mut self) {
        if self.cursor.line == 0 {
            self.messages.set_transient("Top of file");
        } else {
            self.cursor.line -= 1;
        }
        self.after_motion();
    }

    pub fn move_down(&mut self) {
        if self.cursor.line + 1 >= self.buffer.line_count() {
            self.messages.set_transient("End of file");
        } else {
            self.cursor.line += 1;
        }
        self.after_motion();
    }

    pub fn move_to_top(&mut self) {
        self.cursor = Position::default();
        self.after_motion();
    }

    pub fn move_to_bottom(&mut self) {
        self.cursor = Position::new(self.buffer.line_count() - 1, 0);
        self.after_motion();
    }

    /// Jump to 1-based `line`.
    pub fn goto_line(&mut self, line: usize) {
        self.cursor = Position::new(line.saturating_sub(1), 0);
        self.after_motion();
    }

    fn line_chars(&self, line: usize) -> Vec<char> {
        self.buffer
            .line_slice(line)
            .map(|s| s.chars().collect())
            .unwrap_or_default()
    }

    /// Start of the next whitespace-separated word, crossing lines.
    pub fn word_forward(&mut self) {
        let count = self.buffer.line_count();
        let mut line = self.cursor.line;
        let mut chars = self.line_chars(line);
        let mut col = self.cursor.col.min(chars.len());

        while col < chars.len() && !chars[col].is_whitespace() {
            col += 1;
        }
        loop {
            while col < chars.len() && chars[col].is_whitespace() {
                col += 1;
            }
            if col < chars.len() || line + 1 >= count {
                break;
            }
            line += 1;
            col = 0;
            chars = self.line_chars(line);
            if chars.is_empty() {
                break;
            }
        }
        self.cursor = Position::new(line, col);
        self.after_motion();
    }

    /// Start of the current or previous word, crossing lines.
    pub fn word_backward(&mut self) {
        let mut line = self.cursor.line;
        let mut chars = self.line_chars(line);
        let mut col = self.cursor.col.min(chars.len());

        loop {
            while col > 0 && chars[col - 1].is_whitespace() {
                col -= 1;
            }
            if col > 0 || line == 0 {
                break;
            }
            line -= 1;
            chars = self.line_chars(line);
            col = chars.len();
            if chars.is_empty() {
                break;
            }
        }
        while col > 0 && !chars[col - 1].is_whitespace() {
            col -= 1;
        }
        self.cursor = Position::new(line, col);
        self.after_motion();
    }

    /// Jump to the bracket matching the one under the cursor.
    pub fn match_bracket(&mut self) -> bool {
        let Some(ch) = self.buffer.char_at(self.cursor.line, self.cursor.col) else {
            return false;
        };
        let (open, close, forward) = match ch {
            '(' => ('(', ')', true),
            '[' => ('[', ']', true),
            '{' => ('{', '}', true),
            ')' => ('(', ')', false),
            ']' => ('[', ']', false),
            '}' => ('{', '}', false),
            _ => return false,
        };

        let mut depth = 0usize;
        let mut line = self.cursor.line;
        let mut chars = self.line_chars(line);
        let mut col = self.cursor.col as isize;
        loop {
            while col >= 0 && (col as usize) < chars.len() {
                let c = chars[col as usize];
                if c == open || c == close {
                    let opening = (c == open) == forward;
                    if opening {
                        depth += 1;
                    } else {
                        depth -= 1;
                        if depth == 0 {
                            self.cursor = Position::new(line, col as usize);
                            self.after_motion();
                            return true;
                        }
                    }
                }
                col += if forward { 1 } else { -1 };
            }
            if forward {
                if line + 1 >= self.buffer.line_count() {
                    return false;
                }
                line += 1;
                chars = self.line_chars(line);
                col = 0;
            } else {
                if line == 0 {
                    return false;
                }
                line -= 1;
                chars = self.line_chars(line);
                col = chars.len() as isize - 1;
            }
        }
    }

    fn after_motion(&mut self) {
        self.selection.clear();
        self.clamp_cursor();
        self.adjust_scroll();
    }

    // ========== Editing ==========

    pub fn insert_char(&mut self, ch: char) {
        self.buffer.insert_rune(self.cursor.line, self.cursor.col, ch);
        self.cursor.col += 1;
        self.after_edit();
    }

    /// Split at the cursor, carrying the line's leading whitespace over
    /// when auto-indent is on.
    pub fn insert_newline(&mut self) {
        let Position { line, col } = self.cursor;
        let indent: Vec<char> = if self.options.auto_indent {
            self.line_chars(line)
                .into_iter()
                .take(col)
                .take_while(|c| *c == ' ' || *c == '\t')
                .collect()
        } else {
            Vec::new()
        };

        self.buffer.split_line(line, col);
        for (i, ch) in indent.iter().enumerate() {
            self.buffer.insert_rune(line + 1, i, *ch);
        }
        self.cursor = Position::new(line + 1, indent.len());
        self.after_edit();
    }

    /// Delete before the cursor, joining onto the previous line at column 0.
    pub fn backspace(&mut self) {
        let Position { line, col } = self.cursor;
        if col > 0 {
            if self.buffer.delete_rune(line, col) {
                self.cursor.col -= 1;
            }
        } else if line > 0 {
            let join_col = self.buffer.line_len(line - 1);
            self.buffer.join_line(line - 1);
            self.cursor = Position::new(line - 1, join_col);
        }
        self.after_edit();
    }

    /// Delete under the cursor, joining the next line at end of line.
    pub fn delete_forward(&mut self) {
        let Position { line, col } = self.cursor;
        if col < self.buffer.line_len(line) {
            self.buffer.delete_rune(line, col + 1);
        } else {
            self.buffer.join_line(line);
        }
        self.after_edit();
    }

    /// `dd`: remove the line, or empty it when it is the only one.
    pub fn delete_current_line(&mut self) {
        let line = self.cursor.line;
        if !self.buffer.delete_line(line) {
            for col in (1..=self.buffer.line_len(line)).rev() {
                self.buffer.delete_rune(line, col);
            }
        }
        self.cursor.col = 0;
        self.after_edit();
    }

    /// Insert `text` at the cursor. Text ending in a newline was copied
    /// line-wise and goes in as whole lines below the cursor.
    pub fn paste(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(body) = text.strip_suffix('\n') {
            let line = self.cursor.line + 1;
            self.buffer.insert_line(line);
            self.insert_text_at(Position::new(line, 0), body);
            self.cursor = Position::new(line, 0);
        } else {
            self.cursor = self.insert_text_at(self.cursor, text);
        }
        self.after_edit();
    }

    fn insert_text_at(&mut self, mut pos: Position, text: &str) -> Position {
        for ch in text.chars() {
            match ch {
                '\r' => {}
                '\n' => {
                    self.buffer.split_line(pos.line, pos.col);
                    pos = Position::new(pos.line + 1, 0);
                }
                _ => {
                    self.buffer.insert_rune(pos.line, pos.col, ch);
                    pos.col += 1;
                }
            }
        }
        pos
    }

    /// Text `c`/`x` act on: the selection, or the cursor line with its newline.
    pub fn yank_target(&self) -> (String, CutTarget) {
        match self.selection.selected_text(&self.buffer) {
            Some(text) => (text, CutTarget::Selection),
            None => (
                format!("{}\n", self.buffer.line(self.cursor.line)),
                CutTarget::Line(self.cursor.line),
            ),
        }
    }

    pub fn apply_cut(&mut self, target: CutTarget) {
        match target {
            CutTarget::Selection => {
                if let Some(pos) = self.selection.delete_selected_text(&mut self.buffer) {
                    self.cursor = pos;
                }
                self.sync_visual_offset();
            }
            CutTarget::Line(line) => {
                self.cursor.line = line;
                self.delete_current_line();
            }
        }
        self.after_edit();
    }

    pub fn undo(&mut self) -> bool {
        let done = self.buffer.undo();
        self.after_history(done);
        done
    }

    pub fn redo(&mut self) -> bool {
        let done = self.buffer.redo();
        self.after_history(done);
        done
    }

    fn after_history(&mut self, done: bool) {
        if !done {
            return;
        }
        if let Some(pos) = self.buffer.last_change() {
            self.cursor = pos;
        }
        self.selection.clear();
        self.sync_visual_offset();
        self.after_edit();
    }

    fn after_edit(&mut self) {
        self.clamp_cursor();
        self.adjust_scroll();
    }

    // ========== Search ==========

    /// Re-run the search for the typed query and jump to its first match.
    pub fn update_search(&mut self) {
        self.search.search(&self.buffer, &self.search_line);
        if let Some(m) = self.search.current() {
            self.jump_to(m);
        }
        let status = self.search.status().unwrap_or_else(|| String::from("/"));
        self.messages.set_persistent(status);
    }

    pub fn search_next(&mut self) {
        match self.search.next() {
            Some(m) => self.jump_to_match(m),
            None => self.messages.set_transient("No search results"),
        }
    }

    pub fn search_previous(&mut self) {
        match self.search.previous() {
            Some(m) => self.jump_to_match(m),
            None => self.messages.set_transient("No search results"),
        }
    }

    fn jump_to_match(&mut self, m: SearchMatch) {
        self.jump_to(m);
        if let Some(status) = self.search.status() {
            self.messages.set_transient(status);
        }
    }

    pub fn jump_to(&mut self, m: SearchMatch) {
        self.selection.clear();
        self.set_cursor(Position::new(m.line, m.col));
    }

    // ========== Scrolling ==========

    /// Keep the cursor's visual row inside the viewport, moving the top by
    /// the smallest amount.
    pub fn adjust_scroll(&mut self) {
        // Resizes and gutter growth both change how lines above wrap
        let width = self.text_width();
        if width != self.wrap_width {
            self.wrap_width = width;
            self.sync_visual_offset();
        }

        let height = self.content_height();
        let last = self.buffer.line_count() - 1;
        self.offset_y = self.offset_y.min(last);

        if !self.options.wrap {
            if self.cursor.line < self.offset_y {
                self.offset_y = self.cursor.line;
            } else if self.cursor.line >= self.offset_y + height {
                self.offset_y = self.cursor.line + 1 - height;
            }
            self.visual_offset_y = self.offset_y;
            self.top_skip = 0;

            let width = self.text_width().max(1);
            if self.cursor.col < self.offset_x {
                self.offset_x = self.cursor.col;
            } else if self.cursor.col >= self.offset_x + width {
                self.offset_x = self.cursor.col + 1 - width;
            }
            return;
        }

        self.offset_x = 0;
        let top_rows = self.rows(self.offset_y);
        if self.top_skip >= top_rows {
            let excess = self.top_skip - (top_rows - 1);
            self.top_skip = top_rows - 1;
            self.visual_offset_y = self.visual_offset_y.saturating_sub(excess);
        }

        let seg = self.segment_of(self.cursor);
        if (self.cursor.line, seg) < (self.offset_y, self.top_skip) {
            let moved = self.rows_between((self.cursor.line, seg), (self.offset_y, self.top_skip));
            self.offset_y = self.cursor.line;
            self.top_skip = seg;
            self.visual_offset_y = self.visual_offset_y.saturating_sub(moved);
            return;
        }

        let dist = self.rows_between((self.offset_y, self.top_skip), (self.cursor.line, seg));
        if dist >= height {
            let moved = self.advance_top(dist + 1 - height);
            self.visual_offset_y += moved;
        }
    }

    /// Visual rows from `from` down to `to`, both given as (line, segment).
    fn rows_between(&self, from: (usize, usize), to: (usize, usize)) -> usize {
        if from.0 == to.0 {
            return to.1.saturating_sub(from.1);
        }
        let mut rows = self.rows(from.0) - from.1;
        for line in from.0 + 1..to.0 {
            rows += self.rows(line);
        }
        rows + to.1
    }

    /// Move the top of the viewport down by up to `n` rows.
    fn advance_top(&mut self, mut n: usize) -> usize {
        let last = self.buffer.line_count() - 1;
        let mut moved = 0;
        while n > 0 {
            let remaining = self.rows(self.offset_y) - self.top_skip;
            if n < remaining {
                self.top_skip += n;
                moved += n;
                break;
            }
            if self.offset_y == last {
                // Stop on the final row of the final line
                let step = remaining - 1;
                self.top_skip += step;
                moved += step;
                break;
            }
            n -= remaining;
            moved += remaining;
            self.offset_y += 1;
            self.top_skip = 0;
        }
        moved
    }

    /// Move the top of the viewport up by up to `n` rows.
    fn retreat_top(&mut self, mut n: usize) -> usize {
        let mut moved = 0;
        while n > 0 {
            if n <= self.top_skip {
                self.top_skip -= n;
                moved += n;
                break;
            }
            n -= self.top_skip;
            moved += self.top_skip;
            if self.offset_y == 0 {
                self.top_skip = 0;
                break;
            }
            self.offset_y -= 1;
            // Land on the last row of the previous line
            self.top_skip = self.rows(self.offset_y) - 1;
            n -= 1;
            moved += 1;
        }
        moved
    }

    /// Recompute `visual_offset_y` from scratch after widths or history changed.
    fn sync_visual_offset(&mut self) {
        if !self.options.wrap {
            self.visual_offset_y = self.offset_y;
            return;
        }
        let last = self.buffer.line_count() - 1;
        self.offset_y = self.offset_y.min(last);
        self.top_skip = self.top_skip.min(self.rows(self.offset_y) - 1);
        self.visual_offset_y = (0..self.offset_y).map(|l| self.rows(l)).sum::<usize>() + self.top_skip;
    }

    /// Mouse wheel: move the viewport by `delta` visual rows, dragging the
    /// cursor along when it would leave the screen.
    pub fn scroll_view(&mut self, delta: isize) {
        if let Some(preview) = &mut self.preview {
            preview.scroll_by(delta);
            return;
        }

        let rows = delta.unsigned_abs();
        if delta > 0 {
            let moved = self.advance_top(rows);
            self.visual_offset_y += moved;
        } else {
            let moved = self.retreat_top(rows);
            self.visual_offset_y = self.visual_offset_y.saturating_sub(moved);
        }

        let width = self.text_width();
        let seg = self.segment_of(self.cursor);
        if (self.cursor.line, seg) < (self.offset_y, self.top_skip) {
            self.cursor = Position::new(self.offset_y, self.top_skip * width);
        } else {
            let height = self.content_height();
            let dist = self.rows_between((self.offset_y, self.top_skip), (self.cursor.line, seg));
            if dist >= height {
                let (line, seg) = self.row_at(height - 1);
                self.cursor = Position::new(line, seg * width);
            }
        }
        self.clamp_cursor();
    }

    /// (line, segment) shown on viewport row `row`; rows past the end map
    /// to the last row of the last line.
    fn row_at(&self, row: usize) -> (usize, usize) {
        let count = self.buffer.line_count();
        let mut line = self.offset_y;
        let mut skip = self.top_skip;
        let mut remaining = row;
        loop {
            let available = self.rows(line) - skip;
            if remaining < available {
                return (line, skip + remaining);
            }
            if line + 1 >= count {
                return (line, self.rows(line) - 1);
            }
            remaining -= available;
            line += 1;
            skip = 0;
        }
    }

    // ========== Mouse ==========

    /// Map a screen cell to a buffer position; `None` outside the pane.
    pub fn screen_to_buffer(&self, x: u16, y: u16) -> Option<Position> {
        let area = self.area;
        if x < area.x || y < area.y || x >= area.x + area.width || y >= area.y + area.height {
            return None;
        }
        let row = (y - area.y) as usize;
        let text_x = (x - area.x).saturating_sub(self.gutter_width()) as usize;

        let (line, seg) = self.row_at(row);
        let col = if self.options.wrap {
            seg * self.text_width() + text_x
        } else {
            self.offset_x + text_x
        };
        Some(Position::new(line, col.min(self.buffer.line_len(line))))
    }

    pub fn mouse_down(&mut self, x: u16, y: u16) {
        self.selection.clear();
        let Some(pos) = self.screen_to_buffer(x, y) else {
            return;
        };
        self.set_cursor(pos);
        self.drag = DragState::ArmedAt { x, y, at: pos };
    }

    pub fn mouse_drag(&mut self, x: u16, y: u16) {
        match self.drag {
            DragState::Idle => {}
            DragState::ArmedAt { x: x0, y: y0, at } => {
                if DragState::exceeds_threshold((x0, y0), (x, y)) {
                    debug!(line = at.line, col = at.col, "drag selection started");
                    self.selection.start(at.line, at.col);
                    self.drag = DragState::Dragging;
                    self.extend_drag(x, y);
                }
            }
            DragState::Dragging => self.extend_drag(x, y),
        }
    }

    fn extend_drag(&mut self, x: u16, y: u16) {
        let area = self.area;
        if area.width == 0 || area.height == 0 {
            return;
        }
        // Dragging past the top or bottom edge scrolls
        if y < area.y {
            self.scroll_view(-1);
        } else if y >= area.y + area.height {
            self.scroll_view(1);
        }
        let x = x.clamp(area.x, area.x + area.width - 1);
        let y = y.clamp(area.y, area.y + area.height - 1);
        if let Some(pos) = self.screen_to_buffer(x, y) {
            // Only the rows the selection edge crossed need repainting
            let from = self.cursor.line.min(pos.line);
            let to = self.cursor.line.max(pos.line);
            for line in from..=to {
                self.cache.invalidate_line(line);
            }
            self.selection.update(pos.line, pos.col);
            self.cursor = pos;
            self.clamp_cursor();
        }
    }

    pub fn mouse_up(&mut self) {
        self.drag = DragState::Idle;
    }

    // ========== Preview & caches ==========

    /// Toggle the markdown preview. Returns false for non-markdown buffers.
    pub fn toggle_preview(&mut self) -> bool {
        if !self.is_markdown() {
            return false;
        }
        self.preview = match self.preview {
            Some(_) => None,
            None => Some(Preview::new(&self.buffer)),
        };
        self.cache.invalidate();
        true
    }

    /// Drop everything derived from an older buffer version.
    pub fn sync_caches(&mut self) {
        let version = self.buffer.mod_version();
        self.cache.sync_version(version);
        self.highlighter.sync_version(version);
        if let Some(preview) = &mut self.preview {
            preview.sync(&self.buffer);
        }
    }

    /// Buffer lines with at least one row on screen.
    pub fn visible_lines(&self) -> Range<usize> {
        let height = self.area.height as usize;
        let count = self.buffer.line_count();
        let mut end = self.offset_y;
        let mut rows = 0;
        let mut skip = self.top_skip;
        while rows < height && end < count {
            rows += self.rows(end) - skip;
            skip = 0;
            end += 1;
        }
        self.offset_y..end
    }

    pub fn needs_redraw(&mut self) -> bool {
        self.sync_caches();
        if self.messages.expire() {
            self.cache.invalidate();
        }
        if self.cache.needs_redraw() || self.cache.has_changed(&self.view_state()) {
            return true;
        }
        // The preview does not draw buffer lines
        self.preview.is_none()
            && self
                .visible_lines()
                .any(|line| self.cache.line_changed(line, &self.buffer.line(line)))
    }
}
