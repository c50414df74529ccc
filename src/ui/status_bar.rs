use ratatui::{prelude::*, text::Span, widgets::Paragraph};

use crate::app::Editor;
use crate::editor::message::MessageKind;
use crate::editor::{Mode, Pane};
use crate::theme::Theme;

/// Text pieces of the status line, before styling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusParts {
    pub badge: String,
    pub file: String,
    pub message: String,
    pub is_error: bool,
    /// Rune offset into `message` where typed input ends, while the pane
    /// is reading a command, a search query or a replace prompt.
    pub input: Option<usize>,
    pub right: String,
}

impl StatusParts {
    pub fn for_pane(pane: &Pane, index: usize, count: usize) -> Self {
        let badge = if pane.preview.is_some() {
            String::from(" PREVIEW ")
        } else {
            format!(" {} ", pane.mode.label())
        };

        let modified = if pane.buffer.is_modified() { " [+]" } else { "" };
        let file = format!(" {}{} ", pane.buffer.display_name(), modified);

        let (message, is_error) = if pane.mode == Mode::Command {
            (format!(":{}", pane.command_line), false)
        } else if let Some(msg) = pane.messages.get() {
            (msg.text.clone(), msg.kind == MessageKind::Error)
        } else {
            (pane.selection.status(&pane.buffer).unwrap_or_default(), false)
        };

        let input = match pane.mode {
            Mode::Command => Some(message.chars().count()),
            // `Pattern not found: q` has no `/` prefix to anchor to
            Mode::Search if message.starts_with('/') => Some(1 + pane.search_line.chars().count()),
            Mode::Search => Some(message.chars().count()),
            Mode::Replace if pane.replace.is_active() && pane.replace.current().is_none() => {
                Some(message.chars().count())
            }
            _ => None,
        };

        let position = format!("{},{}", pane.cursor.line + 1, pane.cursor.col + 1);
        let right = if count > 1 {
            format!(" Pane {}/{}  {} ", index + 1, count, position)
        } else {
            format!(" {} ", position)
        };

        Self {
            badge,
            file,
            message,
            is_error,
            input,
            right,
        }
    }

    /// Plain text of the whole line, padded to `width`.
    pub fn text(&self, width: usize) -> String {
        let left = format!("{}{} {}", self.badge, self.file, self.message);
        let padding = width.saturating_sub(left.chars().count() + self.right.chars().count());
        format!("{}{}{}", left, " ".repeat(padding.max(1)), self.right)
    }

    /// Column just after the typed input, for the terminal cursor.
    fn input_column(&self) -> Option<usize> {
        let offset = self.input?;
        Some(self.badge.chars().count() + self.file.chars().count() + 1 + offset)
    }
}

/// Draw the status line for the active pane. Returns the plain text that
/// was drawn and, while input is being typed, the cursor column.
pub fn render(frame: &mut Frame, area: Rect, editor: &Editor, theme: &Theme) -> (String, Option<u16>) {
    let pane = editor.active_pane();
    let parts = StatusParts::for_pane(pane, editor.active, editor.panes.len());

    let badge_bg = if pane.preview.is_some() {
        theme.ui.mode_preview_bg.to_color()
    } else {
        theme.mode_bg(pane.mode)
    };
    let badge_span = Span::styled(
        parts.badge.clone(),
        Style::default()
            .bg(badge_bg)
            .fg(theme.ui.mode_fg.to_color())
            .add_modifier(Modifier::BOLD),
    );
    let file_span = Span::styled(
        parts.file.clone(),
        Style::default()
            .fg(theme.ui.status_bar_fg.to_color())
            .add_modifier(Modifier::BOLD),
    );
    let msg_fg = if parts.is_error {
        theme.ui.message_error.to_color()
    } else {
        theme.ui.status_bar_fg.to_color()
    };
    let msg_span = Span::styled(format!(" {}", parts.message), Style::default().fg(msg_fg));

    let left_len =
        parts.badge.chars().count() + parts.file.chars().count() + 1 + parts.message.chars().count();
    let right_len = parts.right.chars().count();
    let padding = (area.width as usize).saturating_sub(left_len + right_len).max(1);
    let padding_span = Span::raw(" ".repeat(padding));
    let right_span = Span::styled(
        parts.right.clone(),
        Style::default().fg(theme.ui.status_bar_fg.to_color()),
    );

    let line = Line::from(vec![badge_span, file_span, msg_span, padding_span, right_span]);
    let paragraph =
        Paragraph::new(line).style(Style::default().bg(theme.ui.status_bar_bg.to_color()));
    frame.render_widget(paragraph, area);

    let cursor = parts
        .input_column()
        .filter(|&col| col < area.width as usize)
        .map(|col| area.x + col as u16);
    (parts.text(area.width as usize), cursor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::editor::TextBuffer;

    fn pane(text: &str) -> Pane {
        Pane::new(TextBuffer::from_text(text), &Config::default())
    }

    #[test]
    fn test_badge_file_and_position() {
        let mut p = pane("one\ntwo");
        p.buffer.insert_rune(1, 0, 'x');
        p.cursor.line = 1;
        p.cursor.col = 2;
        let parts = StatusParts::for_pane(&p, 0, 1);
        assert_eq!(parts.badge, " NORMAL ");
        assert_eq!(parts.file, " [No Name] [+] ");
        assert_eq!(parts.right, " 2,3 ");
        assert!(parts.text(60).ends_with(" 2,3 "));
        assert_eq!(parts.text(60).chars().count(), 60);
    }

    #[test]
    fn test_pane_indicator_only_with_splits() {
        let p = pane("");
        assert_eq!(StatusParts::for_pane(&p, 1, 2).right, " Pane 2/2  1,1 ");
        assert!(!StatusParts::for_pane(&p, 0, 1).right.contains("Pane"));
    }

    #[test]
    fn test_command_line_shown_while_typing() {
        let mut p = pane("");
        p.mode = Mode::Command;
        p.command_line = String::from("wq");
        p.messages.set_error("old error");
        let parts = StatusParts::for_pane(&p, 0, 1);
        assert_eq!(parts.badge, " COMMAND ");
        assert_eq!(parts.message, ":wq");
        assert!(!parts.is_error);
    }

    #[test]
    fn test_input_cursor_follows_typed_text() {
        let mut p = pane("alpha");
        p.mode = Mode::Command;
        p.command_line = String::from("wq");
        // " COMMAND " + " [No Name] " + " " + ":wq"
        assert_eq!(StatusParts::for_pane(&p, 0, 1).input_column(), Some(9 + 11 + 1 + 3));

        p.mode = Mode::Search;
        p.search_line = String::from("al");
        p.update_search();
        let parts = StatusParts::for_pane(&p, 0, 1);
        assert_eq!(parts.message, "/al [1/1]");
        assert_eq!(parts.input, Some(3));

        p.mode = Mode::Replace;
        p.replace.start();
        p.replace.push_char('x');
        p.messages.set_persistent(p.replace.prompt());
        let parts = StatusParts::for_pane(&p, 0, 1);
        assert_eq!(parts.message, "Find: x");
        assert_eq!(parts.input, Some(7));

        p.mode = Mode::Normal;
        assert_eq!(StatusParts::for_pane(&p, 0, 1).input_column(), None);
    }

    #[test]
    fn test_message_wins_over_selection_status() {
        let mut p = pane("hello");
        p.selection.start(0, 0);
        p.selection.update(0, 3);
        assert_eq!(StatusParts::for_pane(&p, 0, 1).message, "VISUAL - 3 chars");

        p.messages.set_error("boom");
        let parts = StatusParts::for_pane(&p, 0, 1);
        assert_eq!(parts.message, "boom");
        assert!(parts.is_error);
    }

    #[test]
    fn test_preview_badge() {
        let mut p = Pane::new(TextBuffer::named("notes.md"), &Config::default());
        assert!(p.toggle_preview());
        assert_eq!(StatusParts::for_pane(&p, 0, 1).badge, " PREVIEW ");
    }
}
