use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::Duration;
use tracing::debug;

use crate::app::Editor;
use crate::editor::pane::CutTarget;
use crate::editor::replace::ReplaceState;
use crate::editor::{Mode, Pane};

/// What a key asks of the editor beyond its own pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Quit,
    ForceQuit,
    Save,
    Copy(String),
    Cut(String, CutTarget),
    Paste,
    Execute(String),
    NextPane,
    PrevPane,
    ClosePane,
    /// Answer to the close prompt: save first, or discard.
    CloseConfirmed { save: bool },
}

/// Wait briefly for one terminal event and apply it. Returns true when
/// something was handled.
pub fn handle_event(editor: &mut Editor) -> Result<bool> {
    if !event::poll(Duration::from_millis(100))? {
        return Ok(false);
    }

    match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => editor.handle_key(key),
        Event::Mouse(mouse) => editor.handle_mouse(mouse),
        Event::Resize(width, height) => editor.resize(width, height),
        _ => return Ok(false),
    }
    Ok(true)
}

/// Route a key to the handler for the pane's mode. Unbound keys do nothing.
pub fn handle_key(pane: &mut Pane, key: KeyEvent) -> Option<Effect> {
    match pane.mode {
        Mode::Normal => handle_normal_mode(pane, key),
        Mode::Insert => handle_insert_mode(pane, key),
        Mode::Command => handle_command_mode(pane, key),
        Mode::Search => handle_search_mode(pane, key),
        Mode::Replace => handle_replace_mode(pane, key),
        Mode::BufferClosePrompt => handle_close_prompt(pane, key),
    }
}

fn set_mode(pane: &mut Pane, mode: Mode) {
    if pane.mode != mode {
        debug!(from = ?pane.mode, to = ?mode, "mode change");
        pane.mode = mode;
        pane.clamp_cursor();
        pane.cache.invalidate();
    }
}

fn handle_normal_mode(pane: &mut Pane, key: KeyEvent) -> Option<Effect> {
    let pending = pane.pending.take();

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(Effect::ForceQuit),
            KeyCode::Char('s') => Some(Effect::Save),
            KeyCode::Char('n') => Some(Effect::NextPane),
            KeyCode::Char('p') => Some(Effect::PrevPane),
            KeyCode::Char('w') => Some(Effect::ClosePane),
            KeyCode::Char('f') => {
                start_search(pane);
                None
            }
            _ => None,
        };
    }

    if pane.preview.is_some() {
        return handle_preview(pane, key);
    }

    match key.code {
        KeyCode::Char('h') | KeyCode::Left => pane.move_left(),
        KeyCode::Char('j') | KeyCode::Down => pane.move_down(),
        KeyCode::Char('k') | KeyCode::Up => pane.move_up(),
        KeyCode::Char('l') | KeyCode::Right => pane.move_right(),
        KeyCode::Char('w') => pane.word_forward(),
        KeyCode::Char('b') => pane.word_backward(),
        KeyCode::Char('g') => {
            if pending == Some('g') {
                pane.move_to_top();
            } else {
                pane.pending = Some('g');
            }
        }
        KeyCode::Char('G') => pane.move_to_bottom(),
        KeyCode::Char('%') => {
            if !pane.match_bracket() {
                pane.messages.set_transient("No matching bracket");
            }
        }

        KeyCode::Char('i') => {
            pane.selection.clear();
            set_mode(pane, Mode::Insert);
        }
        KeyCode::Char(':') => {
            pane.command_line.clear();
            set_mode(pane, Mode::Command);
        }
        KeyCode::Char('/') => start_search(pane),
        KeyCode::Char('H') => {
            pane.replace.start();
            pane.messages.set_persistent(pane.replace.prompt());
            set_mode(pane, Mode::Replace);
        }

        KeyCode::Char('c') => {
            let (text, _) = pane.yank_target();
            return Some(Effect::Copy(text));
        }
        KeyCode::Char('x') => {
            let (text, target) = pane.yank_target();
            return Some(Effect::Cut(text, target));
        }
        KeyCode::Char('p') => {
            if !pane.toggle_preview() {
                return Some(Effect::Paste);
            }
        }
        KeyCode::Char('d') => {
            if pending == Some('d') {
                pane.delete_current_line();
            } else {
                pane.pending = Some('d');
            }
        }
        KeyCode::Char('u') => {
            if !pane.undo() {
                pane.messages.set_transient("Already at oldest change");
            }
        }
        KeyCode::Char('r') => {
            if !pane.redo() {
                pane.messages.set_transient("Already at newest change");
            }
        }

        KeyCode::Char('n') => pane.search_next(),
        KeyCode::Char('N') => pane.search_previous(),
        // First Esc drops the selection, the next one the search highlights
        KeyCode::Esc => {
            if pane.selection.is_active() {
                pane.selection.clear();
            } else {
                pane.search.clear();
            }
        }
        KeyCode::Char('q') => return Some(Effect::Quit),
        _ => {}
    }
    None
}

/// Keys while the markdown preview covers the pane.
fn handle_preview(pane: &mut Pane, key: KeyEvent) -> Option<Effect> {
    match key.code {
        KeyCode::Char('p') | KeyCode::Esc => {
            pane.toggle_preview();
        }
        KeyCode::Char('j') | KeyCode::Down => pane.scroll_view(1),
        KeyCode::Char('k') | KeyCode::Up => pane.scroll_view(-1),
        KeyCode::PageDown => pane.scroll_view(pane.content_height() as isize),
        KeyCode::PageUp => pane.scroll_view(-(pane.content_height() as isize)),
        KeyCode::Char('q') => return Some(Effect::Quit),
        _ => {}
    }
    None
}

fn start_search(pane: &mut Pane) {
    pane.search_line.clear();
    pane.search.clear();
    pane.messages.set_persistent("/");
    set_mode(pane, Mode::Search);
}

fn handle_insert_mode(pane: &mut Pane, key: KeyEvent) -> Option<Effect> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(Effect::ForceQuit),
            KeyCode::Char('s') => Some(Effect::Save),
            KeyCode::Char('v') => Some(Effect::Paste),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Esc => {
            // Step back onto the last rune typed
            pane.cursor.col = pane.cursor.col.saturating_sub(1);
            set_mode(pane, Mode::Normal);
        }
        KeyCode::Enter => pane.insert_newline(),
        KeyCode::Backspace => pane.backspace(),
        KeyCode::Delete => pane.delete_forward(),
        KeyCode::Tab => pane.insert_char('\t'),
        KeyCode::Left => pane.move_left(),
        KeyCode::Right => pane.move_right(),
        KeyCode::Up => pane.move_up(),
        KeyCode::Down => pane.move_down(),
        KeyCode::Home => {
            pane.cursor.col = 0;
            pane.clamp_cursor();
            pane.adjust_scroll();
        }
        KeyCode::End => {
            pane.cursor.col = pane.buffer.line_len(pane.cursor.line);
            pane.clamp_cursor();
            pane.adjust_scroll();
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::ALT) => pane.insert_char(c),
        _ => {}
    }
    None
}

fn handle_command_mode(pane: &mut Pane, key: KeyEvent) -> Option<Effect> {
    match key.code {
        KeyCode::Esc => {
            pane.command_line.clear();
            set_mode(pane, Mode::Normal);
        }
        KeyCode::Enter => {
            let line = std::mem::take(&mut pane.command_line);
            set_mode(pane, Mode::Normal);
            return Some(Effect::Execute(line));
        }
        KeyCode::Backspace => {
            if pane.command_line.pop().is_none() {
                set_mode(pane, Mode::Normal);
            }
        }
        KeyCode::Char(c) => pane.command_line.push(c),
        _ => {}
    }
    None
}

fn handle_search_mode(pane: &mut Pane, key: KeyEvent) -> Option<Effect> {
    match key.code {
        KeyCode::Esc => {
            pane.search.clear();
            pane.search_line.clear();
            pane.messages.clear();
            set_mode(pane, Mode::Normal);
        }
        KeyCode::Enter => {
            // Matches stay highlighted for n/N
            match pane.search.status() {
                Some(status) => pane.messages.set_transient(status),
                None => pane.messages.clear(),
            }
            set_mode(pane, Mode::Normal);
        }
        KeyCode::Backspace => {
            pane.search_line.pop();
            pane.update_search();
        }
        KeyCode::Char(c) => {
            pane.search_line.push(c);
            pane.update_search();
        }
        _ => {}
    }
    None
}

fn handle_replace_mode(pane: &mut Pane, key: KeyEvent) -> Option<Effect> {
    if key.code == KeyCode::Esc {
        finish_replace(pane, "Replace cancelled");
        return None;
    }

    match pane.replace.state() {
        ReplaceState::SearchInput | ReplaceState::ReplaceInput => match key.code {
            KeyCode::Char(c) => pane.replace.push_char(c),
            KeyCode::Backspace => pane.replace.pop_char(),
            KeyCode::Enter => {
                if pane.replace.state() == ReplaceState::SearchInput {
                    if pane.replace.confirm_search(&pane.buffer) == 0 {
                        let term = pane.replace.search_term().to_string();
                        pane.messages.set_error(format!("No matches for: {term}"));
                        set_mode(pane, Mode::Normal);
                        return None;
                    }
                } else if let Some(m) = pane.replace.confirm_replace() {
                    pane.jump_to(m);
                }
            }
            _ => {}
        },
        ReplaceState::Confirm => match key.code {
            KeyCode::Char('y') => {
                if let Some(pos) = pane.replace.replace_current(&mut pane.buffer) {
                    pane.set_cursor(pos);
                }
                if !next_replace_match(pane) {
                    return None;
                }
            }
            KeyCode::Char('n') => {
                pane.replace.advance();
                if !next_replace_match(pane) {
                    return None;
                }
            }
            KeyCode::Char('q') => {
                finish_replace(pane, "Replace cancelled");
                return None;
            }
            _ => {}
        },
        ReplaceState::Inactive => {
            set_mode(pane, Mode::Normal);
            return None;
        }
    }

    pane.messages.set_persistent(pane.replace.prompt());
    None
}

/// Move to the engine's current match, or wrap up when it has finished.
fn next_replace_match(pane: &mut Pane) -> bool {
    match pane.replace.current() {
        Some(m) => {
            pane.jump_to(m);
            true
        }
        None => {
            let done = format!("Replace complete: {} replaced", pane.replace.replaced());
            finish_replace(pane, &done);
            false
        }
    }
}

fn finish_replace(pane: &mut Pane, message: &str) {
    pane.replace.cancel();
    pane.messages.set_transient(message);
    set_mode(pane, Mode::Normal);
}

fn handle_close_prompt(pane: &mut Pane, key: KeyEvent) -> Option<Effect> {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => Some(Effect::CloseConfirmed { save: true }),
        KeyCode::Char('n') | KeyCode::Char('N') => Some(Effect::CloseConfirmed { save: false }),
        KeyCode::Esc => {
            pane.messages.clear();
            set_mode(pane, Mode::Normal);
            None
        }
        _ => None,
    }
}
