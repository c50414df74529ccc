use std::io::Write;
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("clipboard unavailable")]
    Unavailable,
    #[error("clipboard is empty")]
    Empty,
    #[error("clipboard error: {0}")]
    Backend(String),
}

/// System clipboard boundary. Failures are reported, never fatal.
pub trait ClipboardProvider {
    fn copy(&mut self, text: &str) -> Result<(), ClipboardError>;
    fn paste(&mut self) -> Result<String, ClipboardError>;
}

/// `wl-copy`/`xclip` when installed, since they keep the selection alive
/// after we exit; `arboard` otherwise.
pub struct SystemClipboard {
    system: Option<arboard::Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        let system = match arboard::Clipboard::new() {
            Ok(cb) => Some(cb),
            Err(e) => {
                debug!(error = %e, "arboard unavailable");
                None
            }
        };
        Self { system }
    }

    fn copy_with_cli(text: &str) -> bool {
        let commands: &[&[&str]] = &[&["wl-copy"], &["xclip", "-selection", "clipboard"]];

        for cmd in commands {
            let Ok(mut child) = Command::new(cmd[0])
                .args(&cmd[1..])
                .stdin(Stdio::piped())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn()
            else {
                continue;
            };
            if let Some(stdin) = child.stdin.as_mut() {
                if stdin.write_all(text.as_bytes()).is_err() {
                    continue;
                }
            }
            // Close stdin so the tool sees EOF
            drop(child.stdin.take());
            if child.wait().is_ok_and(|status| status.success()) {
                return true;
            }
        }
        false
    }

    fn paste_with_cli() -> Option<String> {
        let commands: &[&[&str]] = &[
            &["wl-paste", "--no-newline"],
            &["xclip", "-selection", "clipboard", "-o"],
        ];

        for cmd in commands {
            let Ok(output) = Command::new(cmd[0])
                .args(&cmd[1..])
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::null())
                .output()
            else {
                continue;
            };
            if output.status.success() {
                if let Ok(text) = String::from_utf8(output.stdout) {
                    return Some(text);
                }
            }
        }
        None
    }
}

impl Default for SystemClipboard {
    fn default() -> Self {
        Self::new()
    }
}

impl ClipboardProvider for SystemClipboard {
    fn copy(&mut self, text: &str) -> Result<(), ClipboardError> {
        if Self::copy_with_cli(text) {
            return Ok(());
        }
        let cb = self.system.as_mut().ok_or(ClipboardError::Unavailable)?;
        cb.set_text(text.to_string()).map_err(|e| {
            warn!(error = %e, "clipboard copy failed");
            ClipboardError::Backend(e.to_string())
        })
    }

    fn paste(&mut self) -> Result<String, ClipboardError> {
        let text = match Self::paste_with_cli() {
            Some(text) => text,
            None => {
                let cb = self.system.as_mut().ok_or(ClipboardError::Unavailable)?;
                cb.get_text().map_err(|e| {
                    warn!(error = %e, "clipboard paste failed");
                    ClipboardError::Backend(e.to_string())
                })?
            }
        };
        if text.is_empty() {
            return Err(ClipboardError::Empty);
        }
        Ok(text)
    }
}

/// In-process clipboard for tests.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryClipboard {
    pub text: Option<String>,
    pub fail: bool,
}

#[cfg(test)]
impl ClipboardProvider for MemoryClipboard {
    fn copy(&mut self, text: &str) -> Result<(), ClipboardError> {
        if self.fail {
            return Err(ClipboardError::Unavailable);
        }
        self.text = Some(text.to_string());
        Ok(())
    }

    fn paste(&mut self) -> Result<String, ClipboardError> {
        if self.fail {
            return Err(ClipboardError::Unavailable);
        }
        self.text.clone().ok_or(ClipboardError::Empty)
    }
}
