use ratatui::style::Color;
use serde::{Deserialize, Serialize};

use crate::editor::Mode;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    pub ui: UiColors,
    pub syntax: SyntaxColors,
    pub markdown: MarkdownColors,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiColors {
    pub background: ThemeColor,
    pub foreground: ThemeColor,
    pub line_numbers: ThemeColor,
    pub selection: ThemeColor,
    pub selection_fg: ThemeColor,
    pub search_match: ThemeColor,
    pub search_match_current: ThemeColor,
    pub divider: ThemeColor,

    // Status bar
    pub status_bar_bg: ThemeColor,
    pub status_bar_fg: ThemeColor,
    pub message_error: ThemeColor,
    pub mode_normal_bg: ThemeColor,
    pub mode_insert_bg: ThemeColor,
    pub mode_command_bg: ThemeColor,
    pub mode_search_bg: ThemeColor,
    pub mode_replace_bg: ThemeColor,
    pub mode_prompt_bg: ThemeColor,
    pub mode_preview_bg: ThemeColor,
    pub mode_fg: ThemeColor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntaxColors {
    pub keyword: ThemeColor,
    pub type_kw: ThemeColor,
    pub string: ThemeColor,
    pub number: ThemeColor,
    pub comment: ThemeColor,
    pub operator: ThemeColor,
    pub function: ThemeColor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkdownColors {
    pub heading: ThemeColor,
    pub code: ThemeColor,
    pub quote: ThemeColor,
    pub list_marker: ThemeColor,
    pub rule: ThemeColor,
    pub link: ThemeColor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ThemeColor {
    Rgb { r: u8, g: u8, b: u8 },
    Named(String),
}

impl ThemeColor {
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::Rgb { r, g, b }
    }

    pub fn to_color(&self) -> Color {
        match self {
            ThemeColor::Rgb { r, g, b } => Color::Rgb(*r, *g, *b),
            ThemeColor::Named(name) => match name.to_lowercase().as_str() {
                "black" => Color::Black,
                "red" => Color::Red,
                "green" => Color::Green,
                "yellow" => Color::Yellow,
                "blue" => Color::Blue,
                "magenta" => Color::Magenta,
                "cyan" => Color::Cyan,
                "white" => Color::White,
                "gray" | "grey" => Color::Gray,
                "darkgray" | "darkgrey" => Color::DarkGray,
                "reset" | "default" => Color::Reset,
                hex => parse_hex(hex).unwrap_or(Color::White),
            },
        }
    }
}

/// `#rrggbb`
fn parse_hex(s: &str) -> Option<Color> {
    let digits = s.strip_prefix('#')?;
    if digits.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok();
    Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            name: String::from("dark"),
            ui: UiColors {
                background: ThemeColor::rgb(30, 30, 30),
                foreground: ThemeColor::rgb(212, 212, 212),
                line_numbers: ThemeColor::rgb(90, 90, 90),
                selection: ThemeColor::rgb(70, 70, 120),
                selection_fg: ThemeColor::rgb(255, 255, 255),
                search_match: ThemeColor::rgb(100, 80, 0),
                search_match_current: ThemeColor::rgb(150, 120, 0),
                divider: ThemeColor::rgb(60, 60, 60),

                status_bar_bg: ThemeColor::rgb(25, 25, 25),
                status_bar_fg: ThemeColor::rgb(150, 150, 150),
                message_error: ThemeColor::rgb(244, 71, 71),
                mode_normal_bg: ThemeColor::rgb(86, 156, 214),
                mode_insert_bg: ThemeColor::rgb(78, 201, 176),
                mode_command_bg: ThemeColor::rgb(220, 220, 170),
                mode_search_bg: ThemeColor::rgb(214, 157, 86),
                mode_replace_bg: ThemeColor::rgb(197, 134, 192),
                mode_prompt_bg: ThemeColor::rgb(244, 135, 113),
                mode_preview_bg: ThemeColor::rgb(181, 206, 168),
                mode_fg: ThemeColor::rgb(30, 30, 30),
            },
            syntax: SyntaxColors {
                keyword: ThemeColor::rgb(86, 156, 214),
                type_kw: ThemeColor::rgb(78, 201, 176),
                string: ThemeColor::rgb(206, 145, 120),
                number: ThemeColor::rgb(181, 206, 168),
                comment: ThemeColor::rgb(106, 153, 85),
                operator: ThemeColor::rgb(212, 212, 212),
                function: ThemeColor::rgb(220, 220, 170),
            },
            markdown: MarkdownColors {
                heading: ThemeColor::rgb(86, 156, 214),
                code: ThemeColor::rgb(206, 145, 120),
                quote: ThemeColor::rgb(106, 153, 85),
                list_marker: ThemeColor::rgb(214, 157, 86),
                rule: ThemeColor::rgb(90, 90, 90),
                link: ThemeColor::rgb(78, 201, 176),
            },
        }
    }

    pub fn light() -> Self {
        Self {
            name: String::from("light"),
            ui: UiColors {
                background: ThemeColor::rgb(255, 255, 255),
                foreground: ThemeColor::rgb(36, 41, 46),
                line_numbers: ThemeColor::rgb(160, 160, 160),
                selection: ThemeColor::rgb(173, 214, 255),
                selection_fg: ThemeColor::rgb(0, 0, 0),
                search_match: ThemeColor::rgb(255, 235, 150),
                search_match_current: ThemeColor::rgb(255, 200, 60),
                divider: ThemeColor::rgb(200, 200, 200),

                status_bar_bg: ThemeColor::rgb(235, 235, 235),
                status_bar_fg: ThemeColor::rgb(80, 80, 80),
                message_error: ThemeColor::rgb(203, 36, 49),
                mode_normal_bg: ThemeColor::rgb(3, 102, 214),
                mode_insert_bg: ThemeColor::rgb(34, 134, 58),
                mode_command_bg: ThemeColor::rgb(176, 136, 0),
                mode_search_bg: ThemeColor::rgb(227, 98, 9),
                mode_replace_bg: ThemeColor::rgb(111, 66, 193),
                mode_prompt_bg: ThemeColor::rgb(203, 36, 49),
                mode_preview_bg: ThemeColor::rgb(0, 92, 197),
                mode_fg: ThemeColor::rgb(255, 255, 255),
            },
            syntax: SyntaxColors {
                keyword: ThemeColor::rgb(215, 58, 73),
                type_kw: ThemeColor::rgb(111, 66, 193),
                string: ThemeColor::rgb(3, 47, 98),
                number: ThemeColor::rgb(0, 92, 197),
                comment: ThemeColor::rgb(106, 115, 125),
                operator: ThemeColor::rgb(36, 41, 46),
                function: ThemeColor::rgb(111, 66, 193),
            },
            markdown: MarkdownColors {
                heading: ThemeColor::rgb(3, 102, 214),
                code: ThemeColor::rgb(3, 47, 98),
                quote: ThemeColor::rgb(106, 115, 125),
                list_marker: ThemeColor::rgb(227, 98, 9),
                rule: ThemeColor::rgb(200, 200, 200),
                link: ThemeColor::rgb(34, 134, 58),
            },
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "light" => Self::light(),
            _ => Self::dark(),
        }
    }

    pub fn available_themes() -> Vec<&'static str> {
        vec!["dark", "light"]
    }

    /// Badge background for a mode; foreground is shared.
    pub fn mode_bg(&self, mode: Mode) -> Color {
        let ui = &self.ui;
        match mode {
            Mode::Normal => ui.mode_normal_bg.to_color(),
            Mode::Insert => ui.mode_insert_bg.to_color(),
            Mode::Command => ui.mode_command_bg.to_color(),
            Mode::Search => ui.mode_search_bg.to_color(),
            Mode::Replace => ui.mode_replace_bg.to_color(),
            Mode::BufferClosePrompt => ui.mode_prompt_bg.to_color(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}
