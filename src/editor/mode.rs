/// Input mode of a pane.
///
/// Visual selection is not a mode of its own: it is active whenever the
/// pane's selection is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Normal,
    Insert,
    /// Typing after `:`.
    Command,
    /// Typing after `/`; every keystroke re-runs the search.
    Search,
    /// Driving the find/replace prompts.
    Replace,
    /// Waiting for y/n/Esc before closing a modified pane.
    BufferClosePrompt,
}

impl Mode {
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Normal => "NORMAL",
            Mode::Insert => "INSERT",
            Mode::Command => "COMMAND",
            Mode::Search => "SEARCH",
            Mode::Replace => "REPLACE",
            Mode::BufferClosePrompt => "PROMPT",
        }
    }

    /// Whether the cursor may rest one past the last rune.
    pub fn allows_past_end(&self) -> bool {
        matches!(self, Mode::Insert)
    }
}
