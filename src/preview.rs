//! Read-only markdown preview.
//!
//! The buffer is parsed with pulldown-cmark into lines of semantically
//! tagged spans; colors are applied at render time from the theme.

use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use tracing::debug;

use crate::editor::TextBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    Text,
    Heading(u8),
    Emphasis,
    Strong,
    Code,
    CodeBlock,
    Link,
    /// List bullets and numbers.
    Marker,
    Quote,
    Rule,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewSpan {
    pub text: String,
    pub kind: SpanKind,
}

pub type PreviewLine = Vec<PreviewSpan>;

#[derive(Debug, Clone)]
pub struct Preview {
    lines: Vec<PreviewLine>,
    pub scroll: usize,
    version: u64,
}

impl Preview {
    pub fn new(buffer: &TextBuffer) -> Self {
        Self {
            lines: render_markdown(&buffer.contents()),
            scroll: 0,
            version: buffer.mod_version(),
        }
    }

    /// Re-parse if the buffer changed since the last parse.
    pub fn sync(&mut self, buffer: &TextBuffer) -> bool {
        if buffer.mod_version() == self.version {
            return false;
        }
        self.lines = render_markdown(&buffer.contents());
        self.version = buffer.mod_version();
        self.scroll = self.scroll.min(self.lines.len().saturating_sub(1));
        debug!(lines = self.lines.len(), "preview re-parsed");
        true
    }

    pub fn lines(&self) -> &[PreviewLine] {
        &self.lines
    }

    pub fn scroll_by(&mut self, delta: isize) {
        let max = self.lines.len().saturating_sub(1);
        self.scroll = self.scroll.saturating_add_signed(delta).min(max);
    }
}

#[derive(Default)]
struct Renderer {
    lines: Vec<PreviewLine>,
    current: PreviewLine,
    heading: Option<u8>,
    emphasis: usize,
    strong: usize,
    link: usize,
    quote: usize,
    code_block: bool,
    /// Next number for ordered lists, `None` for bullets.
    lists: Vec<Option<u64>>,
}

impl Renderer {
    fn kind(&self) -> SpanKind {
        if let Some(level) = self.heading {
            SpanKind::Heading(level)
        } else if self.link > 0 {
            SpanKind::Link
        } else if self.strong > 0 {
            SpanKind::Strong
        } else if self.emphasis > 0 {
            SpanKind::Emphasis
        } else if self.quote > 0 {
            SpanKind::Quote
        } else {
            SpanKind::Text
        }
    }

    fn push(&mut self, text: &str, kind: SpanKind) {
        if self.current.is_empty() && self.quote > 0 {
            self.current.push(PreviewSpan {
                text: "│ ".repeat(self.quote),
                kind: SpanKind::Quote,
            });
        }
        self.current.push(PreviewSpan {
            text: text.to_string(),
            kind,
        });
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.lines.push(std::mem::take(&mut self.current));
        }
    }

    fn blank(&mut self) {
        self.flush();
        if self.lines.last().is_some_and(|l| !l.is_empty()) {
            self.lines.push(Vec::new());
        }
    }

    fn event(&mut self, event: Event) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) if self.code_block => {
                for line in text.lines() {
                    self.push(&format!("    {line}"), SpanKind::CodeBlock);
                    self.flush();
                }
            }
            Event::Text(text) | Event::Html(text) | Event::InlineHtml(text) => {
                let kind = self.kind();
                self.push(&text, kind);
            }
            Event::Code(code) => self.push(&code, SpanKind::Code),
            Event::SoftBreak => {
                let kind = self.kind();
                self.push(" ", kind);
            }
            Event::HardBreak => self.flush(),
            Event::Rule => {
                self.flush();
                self.push(&"─".repeat(40), SpanKind::Rule);
                self.blank();
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag) {
        match tag {
            Tag::Heading { level, .. } => {
                self.flush();
                let level = level as u8;
                self.heading = Some(level);
                let marker = format!("{} ", "#".repeat(level as usize));
                self.push(&marker, SpanKind::Heading(level));
            }
            Tag::BlockQuote(_) => {
                self.flush();
                self.quote += 1;
            }
            Tag::CodeBlock(_) => {
                self.flush();
                self.code_block = true;
            }
            Tag::List(start) => {
                self.flush();
                self.lists.push(start);
            }
            Tag::Item => {
                self.flush();
                let depth = self.lists.len().saturating_sub(1);
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{n}. ");
                        *n += 1;
                        marker
                    }
                    _ => String::from("• "),
                };
                self.push(&format!("{}{marker}", "  ".repeat(depth)), SpanKind::Marker);
            }
            Tag::Emphasis => self.emphasis += 1,
            Tag::Strong => self.strong += 1,
            Tag::Link { .. } => self.link += 1,
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Heading(_) => {
                self.heading = None;
                self.blank();
            }
            TagEnd::Paragraph => self.blank(),
            TagEnd::BlockQuote(_) => {
                self.flush();
                self.quote = self.quote.saturating_sub(1);
                if self.quote == 0 {
                    self.blank();
                }
            }
            TagEnd::CodeBlock => {
                self.code_block = false;
                self.blank();
            }
            TagEnd::List(_) => {
                self.lists.pop();
                if self.lists.is_empty() {
                    self.blank();
                }
            }
            TagEnd::Item => self.flush(),
            TagEnd::Emphasis => self.emphasis = self.emphasis.saturating_sub(1),
            TagEnd::Strong => self.strong = self.strong.saturating_sub(1),
            TagEnd::Link => self.link = self.link.saturating_sub(1),
            _ => {}
        }
    }
}

pub fn render_markdown(text: &str) -> Vec<PreviewLine> {
    let mut renderer = Renderer::default();
    for event in Parser::new(text) {
        renderer.event(event);
    }
    renderer.flush();
    while renderer.lines.last().is_some_and(|l| l.is_empty()) {
        renderer.lines.pop();
    }
    renderer.lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_text(line: &[PreviewSpan]) -> String {
        line.iter().map(|s| s.text.as_str()).collect()
    }

    fn texts(lines: &[PreviewLine]) -> Vec<String> {
        lines.iter().map(|l| line_text(l)).collect()
    }

    #[test]
    fn test_heading_and_paragraph() {
        let lines = render_markdown("# Title\n\nSome *soft*\ntext.\n");
        assert_eq!(texts(&lines), vec!["# Title", "", "Some soft text."]);
        assert_eq!(lines[0][1].kind, SpanKind::Heading(1));
        assert!(lines[2].iter().any(|s| s.kind == SpanKind::Emphasis && s.text == "soft"));
    }

    #[test]
    fn test_lists() {
        let lines = render_markdown("- a\n- b\n");
        assert_eq!(texts(&lines), vec!["• a", "• b"]);
        assert_eq!(lines[0][0].kind, SpanKind::Marker);

        let lines = render_markdown("3. x\n4. y\n");
        assert_eq!(texts(&lines), vec!["3. x", "4. y"]);
    }

    #[test]
    fn test_nested_list_indents() {
        let lines = render_markdown("- outer\n  - inner\n");
        assert_eq!(texts(&lines), vec!["• outer", "  • inner"]);
    }

    #[test]
    fn test_code_block_and_rule() {
        let lines = render_markdown("```\nfn main() {}\nlet x;\n```\n\n---\n\nafter `code`\n");
        let t = texts(&lines);
        assert_eq!(t[0], "    fn main() {}");
        assert_eq!(t[1], "    let x;");
        assert_eq!(lines[0][0].kind, SpanKind::CodeBlock);
        assert!(t.contains(&"─".repeat(40)));
        let last = lines.last().unwrap();
        assert!(last.iter().any(|s| s.kind == SpanKind::Code && s.text == "code"));
    }

    #[test]
    fn test_block_quote_prefix() {
        let lines = render_markdown("> quoted\n");
        assert_eq!(texts(&lines), vec!["│ quoted"]);
        assert_eq!(lines[0][1].kind, SpanKind::Quote);
    }

    #[test]
    fn test_preview_tracks_buffer_version() {
        let mut buffer = TextBuffer::from_text("# A");
        let mut preview = Preview::new(&buffer);
        assert!(!preview.sync(&buffer));

        buffer.insert_rune(0, 3, 'B');
        assert!(preview.sync(&buffer));
        assert_eq!(line_text(&preview.lines()[0]), "# AB");
    }

    #[test]
    fn test_scroll_is_bounded() {
        let buffer = TextBuffer::from_text("a\n\nb\n\nc");
        let mut preview = Preview::new(&buffer);
        preview.scroll_by(-3);
        assert_eq!(preview.scroll, 0);
        preview.scroll_by(100);
        assert_eq!(preview.scroll, preview.lines().len() - 1);
    }
}
