use anyhow::{Context, Result};
use ropey::{Rope, RopeBuilder, RopeSlice};
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use super::undo::{UndoAction, UndoStack};
use super::Position;
use crate::config::LimitsConfig;

/// Line terminator detected on load and written back on save.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineEnding {
    #[default]
    Lf,
    Crlf,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::Crlf => "\r\n",
        }
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("file too large ({size} bytes, limit {max})")]
    TooLarge { size: u64, max: u64 },
    #[error("too many lines (limit {max})")]
    TooManyLines { max: usize },
    #[error("is a directory")]
    IsDirectory,
    #[error(transparent)]
    Io(#[from] io::Error),
    /// Some lines were read before the error; the buffer holds what was read.
    #[error("read error after {lines} lines: {source}")]
    Partial {
        lines: usize,
        #[source]
        source: io::Error,
    },
}

/// Result of a load that did not fail outright.
#[derive(Debug)]
pub struct Loaded {
    pub buffer: TextBuffer,
    /// Set for a partial read; the buffer is marked modified in that case.
    pub warning: Option<LoadError>,
}

/// Rune-addressed line storage backed by a rope.
///
/// Lines are joined by `\n` inside the rope with no terminator after the
/// last line, so `len_lines()` is the line count and an empty rope is one
/// empty line. Every mutation goes through the undo log and bumps
/// `mod_version`.
#[derive(Debug, Clone)]
pub struct TextBuffer {
    text: Rope,
    undo: UndoStack,
    mod_version: u64,
    modified: bool,
    filename: Option<PathBuf>,
    line_ending: LineEnding,
    trailing_newline: bool,
    last_change: Option<Position>,
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextBuffer {
    pub fn new() -> Self {
        Self {
            text: Rope::new(),
            undo: UndoStack::default(),
            mod_version: 0,
            modified: false,
            filename: None,
            line_ending: LineEnding::Lf,
            trailing_newline: false,
            last_change: None,
        }
    }

    /// An empty, unmodified buffer that will be saved to `path`.
    pub fn named(path: impl Into<PathBuf>) -> Self {
        Self {
            filename: Some(path.into()),
            ..Self::new()
        }
    }

    /// Build a buffer from `\n`-separated text without touching history.
    pub fn from_text(text: &str) -> Self {
        Self {
            text: Rope::from_str(text),
            ..Self::new()
        }
    }

    pub fn set_undo_limit(&mut self, limit: usize) {
        self.undo = UndoStack::new(limit);
    }

    // ========== Reading ==========

    pub fn line_count(&self) -> usize {
        self.text.len_lines()
    }

    /// Rune count of `line`, 0 when out of range.
    pub fn line_len(&self, line: usize) -> usize {
        if line >= self.line_count() {
            return 0;
        }
        let len = self.text.line(line).len_chars();
        if line + 1 < self.line_count() {
            len - 1
        } else {
            len
        }
    }

    /// The runes of `line` without its terminator.
    pub fn line_slice(&self, line: usize) -> Option<RopeSlice<'_>> {
        if line >= self.line_count() {
            return None;
        }
        Some(self.text.line(line).slice(..self.line_len(line)))
    }

    pub fn line(&self, line: usize) -> String {
        self.line_slice(line)
            .map(|s| s.to_string())
            .unwrap_or_default()
    }

    pub fn char_at(&self, line: usize, col: usize) -> Option<char> {
        if col < self.line_len(line) {
            Some(self.text.char(self.char_index(line, col)))
        } else {
            None
        }
    }

    pub fn mod_version(&self) -> u64 {
        self.mod_version
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    /// File name for the status line.
    pub fn display_name(&self) -> String {
        self.filename
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| String::from("[No Name]"))
    }

    /// Cursor target recorded by the most recent edit, undo or redo.
    pub fn last_change(&self) -> Option<Position> {
        self.last_change
    }

    /// The file contents as they would be written by `save`.
    pub fn contents(&self) -> String {
        let mut out = self.text.to_string();
        if self.trailing_newline {
            out.push('\n');
        }
        match self.line_ending {
            LineEnding::Lf => out,
            ending => out.replace('\n', ending.as_str()),
        }
    }

    // ========== Editing ==========

    /// Insert `ch` before column `col`. A newline splits the line instead.
    pub fn insert_rune(&mut self, line: usize, col: usize, ch: char) {
        if ch == '\n' {
            self.split_line(line, col);
            return;
        }
        if line >= self.line_count() {
            return;
        }
        let col = col.min(self.line_len(line));
        self.record(UndoAction::InsertRune { line, col, ch });
    }

    /// Delete the rune immediately before column `col` (backspace).
    pub fn delete_rune(&mut self, line: usize, col: usize) -> bool {
        if line >= self.line_count() {
            return false;
        }
        let col = col.min(self.line_len(line));
        if col == 0 {
            return false;
        }
        let Some(ch) = self.char_at(line, col - 1) else {
            return false;
        };
        self.record(UndoAction::DeleteRune {
            line,
            col: col - 1,
            ch,
        });
        true
    }

    /// Insert an empty line before index `line` (`line == line_count()` appends).
    pub fn insert_line(&mut self, line: usize) {
        if line > self.line_count() {
            return;
        }
        self.record(UndoAction::InsertLine { line });
    }

    /// Remove `line`; the buffer's only line is never removed.
    pub fn delete_line(&mut self, line: usize) -> bool {
        if self.line_count() == 1 || line >= self.line_count() {
            return false;
        }
        let content = self.line(line);
        self.record(UndoAction::DeleteLine { line, content });
        true
    }

    pub fn split_line(&mut self, line: usize, col: usize) {
        if line >= self.line_count() {
            return;
        }
        let col = col.min(self.line_len(line));
        self.record(UndoAction::SplitLine { line, col });
    }

    /// Merge `line + 1` onto the end of `line`.
    pub fn join_line(&mut self, line: usize) -> bool {
        if line + 1 >= self.line_count() {
            return false;
        }
        let col = self.line_len(line);
        self.record(UndoAction::JoinLine { line, col });
        true
    }

    pub fn undo(&mut self) -> bool {
        let Some(action) = self.undo.undo() else {
            return false;
        };
        self.reverse(&action);
        self.last_change = Some(action.undo_position());
        self.touch();
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(action) = self.undo.redo() else {
            return false;
        };
        self.apply(&action);
        self.last_change = Some(action.redo_position());
        self.touch();
        true
    }

    fn record(&mut self, action: UndoAction) {
        self.undo.push(action.clone());
        self.apply(&action);
        self.last_change = Some(action.redo_position());
        self.touch();
    }

    fn touch(&mut self) {
        self.mod_version += 1;
        self.modified = true;
    }

    fn apply(&mut self, action: &UndoAction) {
        match action {
            UndoAction::InsertRune { line, col, ch } => {
                let idx = self.char_index(*line, *col);
                self.text.insert_char(idx, *ch);
            }
            UndoAction::DeleteRune { line, col, .. } => self.remove_rune(*line, *col),
            UndoAction::InsertLine { line } => self.insert_raw_line(*line, ""),
            UndoAction::DeleteLine { line, .. } => self.remove_raw_line(*line),
            UndoAction::SplitLine { line, col } => {
                let idx = self.char_index(*line, *col);
                self.text.insert_char(idx, '\n');
            }
            UndoAction::JoinLine { line, .. } => self.remove_line_break(*line),
        }
    }

    fn reverse(&mut self, action: &UndoAction) {
        match action {
            UndoAction::InsertRune { line, col, .. } => self.remove_rune(*line, *col),
            UndoAction::DeleteRune { line, col, ch } => {
                let idx = self.char_index(*line, *col);
                self.text.insert_char(idx, *ch);
            }
            UndoAction::InsertLine { line } => self.remove_raw_line(*line),
            UndoAction::DeleteLine { line, content } => self.insert_raw_line(*line, content),
            UndoAction::SplitLine { line, .. } => self.remove_line_break(*line),
            UndoAction::JoinLine { line, col } => {
                let idx = self.char_index(*line, *col);
                self.text.insert_char(idx, '\n');
            }
        }
    }

    fn char_index(&self, line: usize, col: usize) -> usize {
        self.text.line_to_char(line) + col
    }

    fn remove_rune(&mut self, line: usize, col: usize) {
        let idx = self.char_index(line, col);
        self.text.remove(idx..idx + 1);
    }

    fn insert_raw_line(&mut self, line: usize, content: &str) {
        if line < self.line_count() {
            let idx = self.text.line_to_char(line);
            self.text.insert(idx, &format!("{content}\n"));
        } else {
            let end = self.text.len_chars();
            self.text.insert(end, &format!("\n{content}"));
        }
    }

    fn remove_raw_line(&mut self, line: usize) {
        let start = self.text.line_to_char(line);
        if line + 1 < self.line_count() {
            let end = self.text.line_to_char(line + 1);
            self.text.remove(start..end);
        } else if start > 0 {
            // Last line: take the break in front of it
            let end = self.text.len_chars();
            self.text.remove(start - 1..end);
        } else {
            self.text = Rope::new();
        }
    }

    fn remove_line_break(&mut self, line: usize) {
        let idx = self.text.line_to_char(line + 1) - 1;
        self.text.remove(idx..idx + 1);
    }

    // ========== File I/O ==========

    /// Load `path`, enforcing the size and line ceilings.
    ///
    /// A missing file yields an empty buffer carrying that name. Invalid
    /// UTF-8 is replaced with U+FFFD.
    pub fn load(path: &Path, limits: &LimitsConfig) -> Result<Loaded, LoadError> {
        let metadata = match fs::metadata(path) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "new file");
                return Ok(Loaded {
                    buffer: TextBuffer::named(path),
                    warning: None,
                });
            }
            Err(e) => return Err(e.into()),
        };

        if metadata.is_dir() {
            return Err(LoadError::IsDirectory);
        }
        if metadata.len() > limits.max_file_size {
            return Err(LoadError::TooLarge {
                size: metadata.len(),
                max: limits.max_file_size,
            });
        }

        let reader = BufReader::new(File::open(path)?);
        let mut loaded = Self::read_from(reader, limits.max_lines)?;
        loaded.buffer.filename = Some(path.to_path_buf());
        info!(
            path = %path.display(),
            lines = loaded.buffer.line_count(),
            partial = loaded.warning.is_some(),
            "loaded file"
        );
        Ok(loaded)
    }

    fn read_from<R: BufRead>(mut reader: R, max_lines: usize) -> Result<Loaded, LoadError> {
        let mut builder = RopeBuilder::new();
        let mut raw = Vec::new();
        let mut lines = 0usize;
        let mut line_ending = None;
        let mut trailing_newline = false;
        let mut failure = None;

        loop {
            raw.clear();
            match reader.read_until(b'\n', &mut raw) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if lines == 0 => return Err(LoadError::Io(e)),
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }

            trailing_newline = raw.last() == Some(&b'\n');
            if trailing_newline {
                raw.pop();
                let crlf = raw.last() == Some(&b'\r');
                if crlf {
                    raw.pop();
                }
                line_ending.get_or_insert(if crlf {
                    LineEnding::Crlf
                } else {
                    LineEnding::Lf
                });
            }

            lines += 1;
            if lines > max_lines {
                return Err(LoadError::TooManyLines { max: max_lines });
            }
            if lines > 1 {
                builder.append("\n");
            }
            builder.append(&String::from_utf8_lossy(&raw));
        }

        let mut buffer = Self {
            text: builder.finish(),
            line_ending: line_ending.unwrap_or_default(),
            trailing_newline,
            ..Self::new()
        };
        let warning = failure.map(|source| {
            buffer.modified = true;
            LoadError::Partial { lines, source }
        });
        Ok(Loaded { buffer, warning })
    }

    /// Write to the buffer's own file name.
    pub fn save(&mut self) -> Result<u64> {
        let path = self.filename.clone().context("no file name")?;
        self.write_to(&path)
    }

    /// Write to `path` and adopt it as the buffer's file name.
    pub fn save_as(&mut self, path: impl Into<PathBuf>) -> Result<u64> {
        let path = path.into();
        let written = self.write_to(&path)?;
        self.filename = Some(path);
        Ok(written)
    }

    fn write_to(&mut self, path: &Path) -> Result<u64> {
        let data = self.contents();
        fs::write(path, &data).with_context(|| format!("Failed to write {}", path.display()))?;
        self.modified = false;
        info!(path = %path.display(), bytes = data.len(), "saved file");
        Ok(data.len() as u64)
    }

    /// `"name" 1.2 KB, 10 lines`
    pub fn file_info(&self, bytes: u64) -> String {
        let lines = self.line_count();
        format!(
            "\"{}\" {}, {} {}",
            self.display_name(),
            human_size(bytes),
            lines,
            if lines == 1 { "line" } else { "lines" }
        )
    }
}

fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{size:.1} {}", UNITS[unit])
}
