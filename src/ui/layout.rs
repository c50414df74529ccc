use ratatui::{prelude::*, widgets::Paragraph};

use crate::app::Editor;

pub fn render(frame: &mut Frame, editor: &mut Editor) {
    let size = frame.area();
    if editor.screen() != size {
        editor.resize(size.width, size.height);
    }

    // Clone theme to avoid borrowing the editor while panes are mutated
    let theme = editor.config.theme.clone();
    let layout = editor.layout();
    let active = editor.active;

    let mut cursor = None;
    for (i, pane) in editor.panes.iter_mut().enumerate() {
        let at = super::pane::render(frame, pane, &theme);
        if i == active {
            cursor = at;
        }
    }

    let content_height = size.height.saturating_sub(1);
    let divider_style = Style::default()
        .fg(theme.ui.divider.to_color())
        .bg(theme.ui.background.to_color());
    for &x in &layout.dividers {
        let lines: Vec<Line> = (0..content_height)
            .map(|_| Line::from(Span::styled("│", divider_style)))
            .collect();
        frame.render_widget(Paragraph::new(lines), Rect::new(x, 0, 1, content_height));
    }

    if size.height == 0 {
        return;
    }
    let status_area = Rect::new(0, content_height, size.width, 1);
    let (status, input_cursor) = super::status_bar::render(frame, status_area, editor, &theme);

    match input_cursor {
        Some(x) => frame.set_cursor_position((x, status_area.y)),
        None => {
            if let Some(at) = cursor {
                frame.set_cursor_position(at);
            }
        }
    }

    for (i, pane) in editor.panes.iter_mut().enumerate() {
        let view = pane.view_state();
        pane.cache.update(view, if i == active { &status } else { "" });
    }
}
