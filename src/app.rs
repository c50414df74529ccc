use crossterm::event::{KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::clipboard::{ClipboardError, ClipboardProvider};
use crate::command::{self, Command};
use crate::config::Config;
use crate::editor::split::{self, SplitLayout};
use crate::editor::{LoadError, Mode, Pane, TextBuffer};
use crate::input::{self, Effect};
use crate::ui::status_bar::StatusParts;

const UNSAVED: &str = "no write since last change (use :q! to override)";

/// All panes, the active index and the split between them.
///
/// Each pane owns exactly one buffer; only this type changes which pane
/// is active.
pub struct Editor {
    pub panes: Vec<Pane>,
    pub active: usize,
    pub split_ratio: f64,
    dragging_divider: bool,
    clipboard: Box<dyn ClipboardProvider>,
    pub config: Config,
    pub should_quit: bool,
    screen: Rect,
}

impl Editor {
    pub fn new(config: Config, clipboard: Box<dyn ClipboardProvider>) -> Self {
        let pane = Pane::new(TextBuffer::new(), &config);
        Self {
            panes: vec![pane],
            active: 0,
            split_ratio: config.layout.split_ratio,
            dragging_divider: false,
            clipboard,
            config,
            should_quit: false,
            screen: Rect::default(),
        }
    }

    /// Load the file named on the command line into the first pane.
    /// Resource errors are returned; a partial read becomes a warning.
    pub fn open_initial(&mut self, path: &Path) -> Result<(), LoadError> {
        let loaded = TextBuffer::load(path, &self.config.limits)?;
        let pane = &mut self.panes[self.active];
        pane.replace_buffer(loaded.buffer, &self.config);
        announce_load(pane, path, loaded.warning);
        Ok(())
    }

    pub fn active_pane(&self) -> &Pane {
        &self.panes[self.active]
    }

    pub fn active_pane_mut(&mut self) -> &mut Pane {
        &mut self.panes[self.active]
    }

    pub fn any_modified(&self) -> bool {
        self.panes.iter().any(|p| p.buffer.is_modified())
    }

    // ========== Layout ==========

    pub fn screen(&self) -> Rect {
        self.screen
    }

    /// Pane rectangles above the one-row status line.
    pub fn layout(&self) -> SplitLayout {
        split::side_by_side(
            self.screen.width,
            self.screen.height.saturating_sub(1),
            self.panes.len(),
            self.split_ratio,
        )
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        debug!(width, height, "resize");
        self.screen = Rect::new(0, 0, width, height);
        self.relayout();
    }

    fn relayout(&mut self) {
        let layout = self.layout();
        for (pane, area) in self.panes.iter_mut().zip(layout.panes) {
            pane.set_area(area);
            pane.cache.invalidate();
        }
    }

    fn pane_at(&self, x: u16, y: u16) -> Option<usize> {
        self.panes.iter().position(|p| {
            let a = p.area;
            x >= a.x && x < a.x + a.width && y >= a.y && y < a.y + a.height
        })
    }

    /// Whether any pane or the status line differs from the last frame.
    pub fn needs_redraw(&mut self) -> bool {
        let mut redraw = false;
        for pane in &mut self.panes {
            redraw |= pane.needs_redraw();
        }
        let pane = self.active_pane();
        let status = StatusParts::for_pane(pane, self.active, self.panes.len())
            .text(self.screen.width as usize);
        redraw || pane.cache.status_changed(&status)
    }

    // ========== Keys ==========

    pub fn handle_key(&mut self, key: KeyEvent) {
        let pane = &mut self.panes[self.active];
        pane.messages.clear_if_transient();
        if let Some(effect) = input::handle_key(pane, key) {
            self.apply(effect);
        }
        if let Some(pane) = self.panes.get_mut(self.active) {
            pane.cache.invalidate();
        }
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::Quit => self.quit(false),
            Effect::ForceQuit => self.quit(true),
            Effect::Save => {
                self.save_active(None);
            }
            Effect::Copy(text) => match self.clipboard.copy(&text) {
                Ok(()) => self.active_pane_mut().messages.set_transient("Copied to clipboard"),
                Err(e) => self.clipboard_failed("Copy", e),
            },
            Effect::Cut(text, target) => match self.clipboard.copy(&text) {
                Ok(()) => {
                    let pane = self.active_pane_mut();
                    pane.apply_cut(target);
                    pane.messages.set_transient("Cut to clipboard");
                }
                Err(e) => self.clipboard_failed("Cut", e),
            },
            Effect::Paste => match self.clipboard.paste() {
                Ok(text) => self.active_pane_mut().paste(&text),
                Err(ClipboardError::Empty) => {
                    self.active_pane_mut().messages.set_transient("Clipboard empty")
                }
                Err(e) => self.clipboard_failed("Paste", e),
            },
            Effect::Execute(line) => self.execute(&line),
            Effect::NextPane => self.focus(self.active + 1),
            Effect::PrevPane => self.focus(self.active + self.panes.len() - 1),
            Effect::ClosePane => self.request_close(),
            Effect::CloseConfirmed { save } => {
                if save && !self.save_active(None) {
                    self.active_pane_mut().mode = Mode::Normal;
                    return;
                }
                self.close_active();
            }
        }
    }

    fn clipboard_failed(&mut self, what: &str, e: ClipboardError) {
        warn!(error = %e, "{what} failed");
        self.active_pane_mut()
            .messages
            .set_error(format!("{what} failed: {e}"));
    }

    /// Run a `:` command line against the active pane.
    pub fn execute(&mut self, line: &str) {
        let command = match command::parse(line) {
            Ok(Some(command)) => command,
            Ok(None) => return,
            Err(e) => {
                self.active_pane_mut().messages.set_error(e.to_string());
                return;
            }
        };
        info!(?command, "execute");

        match command {
            Command::Quit { force } => self.quit(force),
            Command::Write(path) => {
                self.save_active(path);
            }
            Command::WriteQuit(path) => {
                if self.save_active(path) {
                    self.quit(false);
                }
            }
            Command::Edit { path, force } => self.edit(&path, force),
            Command::VSplit(path) => self.vsplit(path.as_deref()),
            Command::Close => self.request_close(),
            Command::NextPane => self.focus(self.active + 1),
            Command::PrevPane => self.focus(self.active + self.panes.len() - 1),
            Command::Goto(line) => self.active_pane_mut().goto_line(line),
        }
    }

    fn quit(&mut self, force: bool) {
        if !force && self.any_modified() {
            self.active_pane_mut().messages.set_error(UNSAVED);
            return;
        }
        info!(force, "quit");
        self.should_quit = true;
    }

    /// Save the active buffer, optionally under a new name. Reports the
    /// outcome on the status line and returns whether it succeeded.
    fn save_active(&mut self, path: Option<PathBuf>) -> bool {
        let pane = &mut self.panes[self.active];
        let result = match path {
            Some(path) => pane.buffer.save_as(path),
            None => pane.buffer.save(),
        };
        match result {
            Ok(bytes) => {
                let info = pane.buffer.file_info(bytes);
                pane.messages.set_transient(info);
                true
            }
            Err(e) => {
                warn!(error = %e, "save failed");
                pane.messages.set_error(format!("{e:#}"));
                false
            }
        }
    }

    fn edit(&mut self, path: &Path, force: bool) {
        if !force && self.active_pane().buffer.is_modified() {
            self.active_pane_mut()
                .messages
                .set_error("no write since last change (add ! to override)");
            return;
        }
        match TextBuffer::load(path, &self.config.limits) {
            Ok(loaded) => {
                let pane = &mut self.panes[self.active];
                pane.replace_buffer(loaded.buffer, &self.config);
                pane.mode = Mode::Normal;
                announce_load(pane, path, loaded.warning);
            }
            Err(e) => self
                .active_pane_mut()
                .messages
                .set_error(format!("Cannot open {}: {e}", path.display())),
        }
    }

    /// Open a pane right of the active one and focus it.
    fn vsplit(&mut self, path: Option<&Path>) {
        let mut pane = match path {
            Some(path) => match TextBuffer::load(path, &self.config.limits) {
                Ok(loaded) => {
                    let mut pane = Pane::new(loaded.buffer, &self.config);
                    announce_load(&mut pane, path, loaded.warning);
                    pane
                }
                Err(e) => {
                    self.active_pane_mut()
                        .messages
                        .set_error(format!("Cannot open {}: {e}", path.display()));
                    return;
                }
            },
            None => Pane::new(TextBuffer::new(), &self.config),
        };
        pane.cache.invalidate();
        self.active += 1;
        self.panes.insert(self.active, pane);
        info!(panes = self.panes.len(), "pane opened");
        self.relayout();
    }

    fn focus(&mut self, index: usize) {
        let index = index % self.panes.len();
        if index != self.active {
            self.active = index;
            self.panes[index].cache.invalidate();
        }
    }

    fn request_close(&mut self) {
        if self.panes.len() == 1 {
            self.active_pane_mut()
                .messages
                .set_error("Cannot close last buffer");
            return;
        }
        let pane = self.active_pane_mut();
        if pane.buffer.is_modified() {
            let prompt = format!("Save changes to {}? [y/n]", pane.buffer.display_name());
            pane.messages.set_persistent(prompt);
            pane.mode = Mode::BufferClosePrompt;
            return;
        }
        self.close_active();
    }

    fn close_active(&mut self) {
        if self.panes.len() == 1 {
            return;
        }
        self.panes.remove(self.active);
        if self.active >= self.panes.len() {
            self.active = self.panes.len() - 1;
        }
        info!(panes = self.panes.len(), "pane closed");
        self.relayout();
    }

    // ========== Mouse ==========

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        let (x, y) = (mouse.column, mouse.row);
        let pane_rows = self.screen.height.saturating_sub(1);

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if self.panes.len() == 2 && y < pane_rows && self.layout().divider_at(x).is_some() {
                    self.dragging_divider = true;
                    return;
                }
                if let Some(index) = self.pane_at(x, y) {
                    self.focus(index);
                    self.panes[index].mouse_down(x, y);
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                if self.dragging_divider {
                    self.split_ratio = split::ratio_for_x(x, self.screen.width);
                    self.relayout();
                } else {
                    // The pane invalidates the lines the selection crossed
                    self.active_pane_mut().mouse_drag(x, y);
                    return;
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                self.dragging_divider = false;
                self.active_pane_mut().mouse_up();
            }
            MouseEventKind::ScrollDown => {
                let index = self.pane_at(x, y).unwrap_or(self.active);
                self.panes[index].scroll_view(1);
            }
            MouseEventKind::ScrollUp => {
                let index = self.pane_at(x, y).unwrap_or(self.active);
                self.panes[index].scroll_view(-1);
            }
            _ => return,
        }
        for pane in &mut self.panes {
            pane.cache.invalidate();
        }
    }
}

/// File info after a clean load, or the warning after a partial one.
fn announce_load(pane: &mut Pane, path: &Path, warning: Option<LoadError>) {
    if let Some(warning) = warning {
        warn!(path = %path.display(), error = %warning, "partial load");
        pane.messages.set_error(format!("Warning: {warning}"));
        return;
    }
    match fs::metadata(path) {
        Ok(meta) => {
            let info = pane.buffer.file_info(meta.len());
            pane.messages.set_transient(info);
        }
        Err(_) => pane
            .messages
            .set_transient(format!("\"{}\" [New File]", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::MemoryClipboard;
    use crate::editor::Position;
    use crate::ui;
    use crossterm::event::{KeyCode, KeyModifiers};
    use ratatui::{backend::TestBackend, Terminal};

    fn editor() -> Editor {
        let mut editor = Editor::new(Config::default(), Box::new(MemoryClipboard::default()));
        editor.resize(81, 25);
        editor
    }

    fn failing_editor() -> Editor {
        let clipboard = MemoryClipboard {
            fail: true,
            ..MemoryClipboard::default()
        };
        let mut editor = Editor::new(Config::default(), Box::new(clipboard));
        editor.resize(81, 25);
        editor
    }

    fn key(editor: &mut Editor, code: KeyCode) {
        editor.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn typed(editor: &mut Editor, text: &str) {
        for c in text.chars() {
            key(editor, KeyCode::Char(c));
        }
    }

    fn message(editor: &Editor) -> Option<String> {
        editor.active_pane().messages.get().map(|m| m.text.clone())
    }

    fn mouse(editor: &mut Editor, kind: MouseEventKind, column: u16, row: u16) {
        editor.handle_mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        });
    }

    #[test]
    fn test_quit_refused_while_modified() {
        let mut e = editor();
        typed(&mut e, "ix");
        key(&mut e, KeyCode::Esc);
        key(&mut e, KeyCode::Char('q'));
        assert!(!e.should_quit);
        assert_eq!(message(&e).as_deref(), Some(UNSAVED));

        e.execute("q!");
        assert!(e.should_quit);
    }

    #[test]
    fn test_write_without_name() {
        let mut e = editor();
        e.execute("w");
        assert_eq!(message(&e).as_deref(), Some("no file name"));
    }

    #[test]
    fn test_write_names_buffer_and_reports_info() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let mut e = editor();
        typed(&mut e, "ihello");
        key(&mut e, KeyCode::Esc);

        e.execute(&format!("w {}", path.display()));
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello");
        assert!(!e.active_pane().buffer.is_modified());
        assert_eq!(message(&e).as_deref(), Some("\"out.txt\" 5 B, 1 line"));

        e.execute("wq");
        assert!(e.should_quit);
    }

    #[test]
    fn test_edit_guard_and_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("other.txt");
        fs::write(&path, "one\ntwo\n").unwrap();

        let mut e = editor();
        typed(&mut e, "ix");
        key(&mut e, KeyCode::Esc);
        e.execute(&format!("e {}", path.display()));
        assert_eq!(e.active_pane().buffer.line(0), "x");

        e.execute(&format!("e! {}", path.display()));
        assert_eq!(e.active_pane().buffer.line(1), "two");
        assert_eq!(message(&e).as_deref(), Some("\"other.txt\" 8 B, 2 lines"));
    }

    #[test]
    fn test_edit_failure_keeps_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let mut e = editor();
        e.execute(&format!("e {}", dir.path().display()));
        assert_eq!(e.active_pane().buffer.display_name(), "[No Name]");
        assert!(message(&e).unwrap().ends_with("is a directory"));
    }

    #[test]
    fn test_unknown_command() {
        let mut e = editor();
        typed(&mut e, ":nope");
        key(&mut e, KeyCode::Enter);
        assert_eq!(message(&e).as_deref(), Some("not an editor command: nope"));
    }

    #[test]
    fn test_goto_line_command() {
        let mut e = editor();
        e.active_pane_mut().paste("a\nb\nc\n");
        e.execute("3");
        assert_eq!(e.active_pane().cursor.line, 2);
    }

    #[test]
    fn test_vsplit_and_cycle() {
        let mut e = editor();
        e.execute("vs");
        assert_eq!(e.panes.len(), 2);
        assert_eq!(e.active, 1);
        assert_eq!(e.panes[0].area, Rect::new(0, 0, 40, 24));
        assert_eq!(e.panes[1].area, Rect::new(41, 0, 40, 24));

        e.handle_key(KeyEvent::new(KeyCode::Char('n'), KeyModifiers::CONTROL));
        assert_eq!(e.active, 0);
        e.handle_key(KeyEvent::new(KeyCode::Char('p'), KeyModifiers::CONTROL));
        assert_eq!(e.active, 1);
        e.execute("bn");
        assert_eq!(e.active, 0);
    }

    #[test]
    fn test_close_last_pane_refused() {
        let mut e = editor();
        e.execute("close");
        assert_eq!(e.panes.len(), 1);
        assert_eq!(message(&e).as_deref(), Some("Cannot close last buffer"));
    }

    #[test]
    fn test_close_modified_prompts() {
        let mut e = editor();
        e.execute("vs");
        typed(&mut e, "iz");
        key(&mut e, KeyCode::Esc);

        e.handle_key(KeyEvent::new(KeyCode::Char('w'), KeyModifiers::CONTROL));
        assert_eq!(e.panes.len(), 2);
        assert_eq!(e.active_pane().mode, Mode::BufferClosePrompt);

        key(&mut e, KeyCode::Esc);
        assert_eq!(e.active_pane().mode, Mode::Normal);

        e.execute("bd");
        key(&mut e, KeyCode::Char('n'));
        assert_eq!(e.panes.len(), 1);
        assert_eq!(e.active, 0);
        assert_eq!(e.panes[0].area.width, 81);
    }

    #[test]
    fn test_close_prompt_save_needs_name() {
        let mut e = editor();
        e.execute("vs");
        typed(&mut e, "iz");
        key(&mut e, KeyCode::Esc);
        e.execute("close");
        key(&mut e, KeyCode::Char('y'));
        assert_eq!(e.panes.len(), 2);
        assert_eq!(e.active_pane().mode, Mode::Normal);
        assert_eq!(message(&e).as_deref(), Some("no file name"));
    }

    #[test]
    fn test_copy_then_paste_line() {
        let mut e = editor();
        e.active_pane_mut().paste("first\n");
        key(&mut e, KeyCode::Char('c'));
        assert_eq!(e.clipboard.paste().unwrap(), "first\n");
        key(&mut e, KeyCode::Char('p'));
        let pane = e.active_pane();
        assert_eq!(pane.buffer.line_count(), 3);
        assert_eq!(pane.buffer.line(2), "first");
    }

    #[test]
    fn test_cut_selection() {
        let mut e = editor();
        e.active_pane_mut().paste("hello world");
        let pane = e.active_pane_mut();
        pane.selection.start(0, 0);
        pane.selection.update(0, 6);
        key(&mut e, KeyCode::Char('x'));
        assert_eq!(e.active_pane().buffer.line(0), "world");
        assert_eq!(e.active_pane().cursor, Position::new(0, 0));
        assert_eq!(e.clipboard.paste().unwrap(), "hello ");
    }

    #[test]
    fn test_failed_cut_keeps_text() {
        let mut e = failing_editor();
        e.active_pane_mut().paste("keep\n");
        key(&mut e, KeyCode::Char('x'));
        assert_eq!(e.active_pane().buffer.line(1), "keep");
        assert_eq!(
            message(&e).as_deref(),
            Some("Cut failed: clipboard unavailable")
        );
    }

    #[test]
    fn test_divider_drag_resizes() {
        let mut e = editor();
        e.execute("vs");
        mouse(&mut e, MouseEventKind::Down(MouseButton::Left), 40, 5);
        mouse(&mut e, MouseEventKind::Drag(MouseButton::Left), 20, 5);
        mouse(&mut e, MouseEventKind::Up(MouseButton::Left), 20, 5);
        assert!((e.split_ratio - 20.0 / 81.0).abs() < 1e-9);
        assert_eq!(e.panes[0].area.width, 19);
        assert_eq!(e.panes[1].area.x, 20);
    }

    #[test]
    fn test_redraw_settles_after_frame() {
        let mut e = editor();
        e.active_pane_mut().paste("one\ntwo\n");
        let mut terminal = Terminal::new(TestBackend::new(81, 25)).unwrap();
        terminal.draw(|frame| ui::render(frame, &mut e)).unwrap();
        assert!(!e.needs_redraw());

        // A message set outside key handling still shows up
        e.active_pane_mut().messages.set_persistent("hello");
        assert!(e.needs_redraw());
        terminal.draw(|frame| ui::render(frame, &mut e)).unwrap();
        assert!(!e.needs_redraw());
    }

    #[test]
    fn test_click_focuses_pane() {
        let mut e = editor();
        e.execute("vs");
        assert_eq!(e.active, 1);
        mouse(&mut e, MouseEventKind::Down(MouseButton::Left), 10, 3);
        assert_eq!(e.active, 0);
    }
}
