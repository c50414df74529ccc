use ratatui::{
    prelude::*,
    widgets::{Paragraph, Wrap},
};
use tracing::trace;

use crate::editor::{wrap, Pane};
use crate::preview::{PreviewSpan, SpanKind};
use crate::syntax::Highlight;
use crate::theme::Theme;

/// Draw one pane into its area. Returns the terminal cell of the cursor
/// when it is visible.
pub fn render(frame: &mut Frame, pane: &mut Pane, theme: &Theme) -> Option<(u16, u16)> {
    let area = pane.area;
    if area.width == 0 || area.height == 0 {
        return None;
    }
    let base = Style::default()
        .bg(theme.ui.background.to_color())
        .fg(theme.ui.foreground.to_color());

    pane.sync_caches();
    if let Some(preview) = &pane.preview {
        let lines: Vec<Line> = preview
            .lines()
            .iter()
            .skip(preview.scroll)
            .take(area.height as usize)
            .map(|l| preview_line(l, theme))
            .collect();
        let paragraph = Paragraph::new(lines)
            .style(base)
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
        return None;
    }

    let gutter = pane.gutter_width() as usize;
    let gutter_style = Style::default().fg(theme.ui.line_numbers.to_color());
    let width = pane.text_width();
    let height = area.height as usize;

    let mut rows: Vec<Line> = Vec::with_capacity(height);
    let mut line = pane.offset_y;
    let mut skip = pane.top_skip();
    let mut repainted = 0;

    while rows.len() < height && line < pane.buffer.line_count() {
        let text = pane.buffer.line(line);
        if pane.cache.line_changed(line, &text) {
            pane.cache.update_line(line, &text);
            repainted += 1;
        }
        let cells = style_line(pane, line, &text, theme);

        let segments: Vec<(usize, usize, bool)> = if pane.wraps() {
            wrap::wrap(&text, width)
                .into_iter()
                .map(|s| {
                    let end = s.start_col + s.text.chars().count();
                    (s.start_col, end, s.is_continuation)
                })
                .collect()
        } else {
            let start = pane.offset_x.min(cells.len());
            vec![(start, (start + width).min(cells.len()), false)]
        };

        for (start, end, continuation) in segments.into_iter().skip(skip) {
            if rows.len() >= height {
                break;
            }
            let mut spans = Vec::new();
            if gutter > 0 {
                let number = if continuation {
                    " ".repeat(gutter)
                } else {
                    format!("{:>width$} ", line + 1, width = gutter - 1)
                };
                spans.push(Span::styled(number, gutter_style));
            }
            spans.extend(group_spans(&cells[start..end]));
            rows.push(Line::from(spans));
        }
        skip = 0;
        line += 1;
    }
    while rows.len() < height {
        rows.push(Line::from(Span::styled("~", gutter_style)));
    }
    trace!(repainted, cached = pane.cache.cached_lines(), "pane lines");

    frame.render_widget(Paragraph::new(rows).style(base), area);
    pane.cursor_screen()
}

/// Per-rune styles for one line: syntax first, then search matches, then
/// the selection on top.
fn style_line(pane: &mut Pane, line: usize, text: &str, theme: &Theme) -> Vec<(char, Style)> {
    let version = pane.buffer.mod_version();
    let mut cells = pane
        .highlighter
        .highlight(line, text, version)
        .unwrap_or_else(|| text.chars().map(|c| (c, Style::default())).collect());

    // Every rune takes one cell
    for (c, _) in cells.iter_mut() {
        if c.is_control() {
            *c = ' ';
        }
    }

    let match_bg = theme.ui.search_match.to_color();
    let current_bg = theme.ui.search_match_current.to_color();
    let matches = pane.search.matches();
    let current = pane.search.current();
    let first = matches.partition_point(|m| m.line < line);
    for m in matches[first..].iter().take_while(|m| m.line == line) {
        let bg = if Some(*m) == current { current_bg } else { match_bg };
        paint(&mut cells, m.col, m.col + m.len, Style::default().bg(bg));
    }
    if let Some(m) = pane.replace.current().filter(|m| m.line == line) {
        paint(&mut cells, m.col, m.col + m.len, Style::default().bg(current_bg));
    }

    if let Some((from, to)) = pane.selection.columns_on(line) {
        let style = Style::default()
            .bg(theme.ui.selection.to_color())
            .fg(theme.ui.selection_fg.to_color());
        paint(&mut cells, from, to, style);
    }
    cells
}

fn paint(cells: &mut [(char, Style)], from: usize, to: usize, style: Style) {
    let to = to.min(cells.len());
    if from >= to {
        return;
    }
    for (_, s) in &mut cells[from..to] {
        *s = s.patch(style);
    }
}

/// Merge runs of equally styled runes into spans.
fn group_spans(cells: &[(char, Style)]) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    let mut text = String::new();
    let mut style: Option<Style> = None;
    for &(c, s) in cells {
        if style != Some(s) {
            if let Some(prev) = style {
                spans.push(Span::styled(std::mem::take(&mut text), prev));
            }
            style = Some(s);
        }
        text.push(c);
    }
    if let Some(s) = style {
        spans.push(Span::styled(text, s));
    }
    spans
}

fn preview_line(line: &[PreviewSpan], theme: &Theme) -> Line<'static> {
    let md = &theme.markdown;
    let spans: Vec<Span> = line
        .iter()
        .map(|span| {
            let style = match span.kind {
                SpanKind::Text => Style::default(),
                SpanKind::Heading(_) => Style::default()
                    .fg(md.heading.to_color())
                    .add_modifier(Modifier::BOLD),
                SpanKind::Emphasis => Style::default().add_modifier(Modifier::ITALIC),
                SpanKind::Strong => Style::default().add_modifier(Modifier::BOLD),
                SpanKind::Code | SpanKind::CodeBlock => Style::default().fg(md.code.to_color()),
                SpanKind::Link => Style::default()
                    .fg(md.link.to_color())
                    .add_modifier(Modifier::UNDERLINED),
                SpanKind::Marker => Style::default().fg(md.list_marker.to_color()),
                SpanKind::Quote => Style::default().fg(md.quote.to_color()),
                SpanKind::Rule => Style::default().fg(md.rule.to_color()),
            };
            Span::styled(span.text.clone(), style)
        })
        .collect();
    Line::from(spans)
}
