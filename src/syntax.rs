use ratatui::style::Style;
use std::collections::HashMap;
use std::path::Path;

use crate::theme::SyntaxColors;

/// Per-line styling collaborator. `None` renders the line as plain text.
pub trait Highlight {
    fn highlight(&mut self, line: usize, text: &str, mod_version: u64)
        -> Option<Vec<(char, Style)>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    Keyword,
    Type,
    Number,
    String,
    Comment,
    Operator,
    Function,
    Plain,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub text: String,
    pub token_type: TokenType,
}

impl Token {
    pub fn new(text: impl Into<String>, token_type: TokenType) -> Self {
        Self {
            text: text.into(),
            token_type,
        }
    }
}

#[derive(Debug)]
pub struct Language {
    pub name: &'static str,
    extensions: &'static [&'static str],
    keywords: &'static [&'static str],
    types: &'static [&'static str],
    line_comment: &'static str,
}

static LANGUAGES: &[Language] = &[
    Language {
        name: "rust",
        extensions: &["rs"],
        keywords: &[
            "as", "async", "await", "break", "const", "continue", "crate", "else", "enum",
            "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod",
            "move", "mut", "pub", "ref", "return", "self", "Self", "static", "struct", "super",
            "trait", "true", "type", "unsafe", "use", "where", "while", "dyn",
        ],
        types: &[
            "bool", "char", "str", "u8", "u16", "u32", "u64", "u128", "usize", "i8", "i16",
            "i32", "i64", "i128", "isize", "f32", "f64", "String", "Vec", "Option", "Result",
            "Box",
        ],
        line_comment: "//",
    },
    Language {
        name: "go",
        extensions: &["go"],
        keywords: &[
            "break", "case", "chan", "const", "continue", "default", "defer", "else",
            "fallthrough", "for", "func", "go", "goto", "if", "import", "interface", "map",
            "package", "range", "return", "select", "struct", "switch", "type", "var", "nil",
            "true", "false",
        ],
        types: &[
            "bool", "byte", "error", "float32", "float64", "int", "int8", "int16", "int32",
            "int64", "rune", "string", "uint", "uint8", "uint16", "uint32", "uint64", "uintptr",
        ],
        line_comment: "//",
    },
    Language {
        name: "c",
        extensions: &["c", "h", "cc", "cpp", "hpp", "js", "ts", "java"],
        keywords: &[
            "break", "case", "class", "const", "continue", "default", "do", "else", "enum",
            "export", "extern", "for", "function", "if", "import", "let", "new", "return",
            "static", "struct", "switch", "this", "typedef", "var", "while", "true", "false",
            "null", "NULL",
        ],
        types: &[
            "char", "double", "float", "int", "long", "short", "signed", "unsigned", "void",
            "boolean", "string", "number",
        ],
        line_comment: "//",
    },
    Language {
        name: "python",
        extensions: &["py"],
        keywords: &[
            "and", "as", "assert", "async", "await", "break", "class", "continue", "def", "del",
            "elif", "else", "except", "finally", "for", "from", "global", "if", "import", "in",
            "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try", "while",
            "with", "yield", "None", "True", "False",
        ],
        types: &["int", "float", "str", "bytes", "list", "dict", "set", "tuple", "bool"],
        line_comment: "#",
    },
    Language {
        name: "shell",
        extensions: &["sh", "bash", "zsh"],
        keywords: &[
            "if", "then", "else", "elif", "fi", "for", "while", "until", "do", "done", "case",
            "esac", "function", "return", "in", "local", "export",
        ],
        types: &[],
        line_comment: "#",
    },
    Language {
        name: "toml",
        extensions: &["toml"],
        keywords: &["true", "false"],
        types: &[],
        line_comment: "#",
    },
];

impl Language {
    pub fn for_path(path: &Path) -> Option<&'static Language> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        LANGUAGES.iter().find(|l| l.extensions.contains(&ext.as_str()))
    }

    pub fn tokenize_line(&self, line: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        let chars: Vec<char> = line.chars().collect();
        let comment: Vec<char> = self.line_comment.chars().collect();
        let mut pos = 0;

        while pos < chars.len() {
            let ch = chars[pos];

            if chars[pos..].starts_with(&comment) {
                let text: String = chars[pos..].iter().collect();
                tokens.push(Token::new(text, TokenType::Comment));
                break;
            }

            if ch == '"' || ch == '\'' || ch == '`' {
                let start = pos;
                pos += 1;
                while pos < chars.len() && chars[pos] != ch {
                    if chars[pos] == '\\' && pos + 1 < chars.len() {
                        pos += 1;
                    }
                    pos += 1;
                }
                if pos < chars.len() {
                    pos += 1;
                }
                let text: String = chars[start..pos].iter().collect();
                tokens.push(Token::new(text, TokenType::String));
                continue;
            }

            if ch.is_whitespace() {
                let start = pos;
                while pos < chars.len() && chars[pos].is_whitespace() {
                    pos += 1;
                }
                let text: String = chars[start..pos].iter().collect();
                tokens.push(Token::new(text, TokenType::Plain));
                continue;
            }

            if ch.is_ascii_digit() {
                let start = pos;
                // Covers 0x.., 1_000, 2.5 and suffixed literals like 10u8
                while pos < chars.len()
                    && (chars[pos].is_ascii_alphanumeric() || chars[pos] == '_' || chars[pos] == '.')
                {
                    pos += 1;
                }
                let text: String = chars[start..pos].iter().collect();
                tokens.push(Token::new(text, TokenType::Number));
                continue;
            }

            if ch.is_alphabetic() || ch == '_' {
                let start = pos;
                while pos < chars.len() && (chars[pos].is_alphanumeric() || chars[pos] == '_') {
                    pos += 1;
                }
                let word: String = chars[start..pos].iter().collect();
                let token_type = if self.keywords.contains(&word.as_str()) {
                    TokenType::Keyword
                } else if self.types.contains(&word.as_str()) {
                    TokenType::Type
                } else if chars.get(pos) == Some(&'(') {
                    TokenType::Function
                } else {
                    TokenType::Plain
                };
                tokens.push(Token::new(word, token_type));
                continue;
            }

            let op_chars = [
                '+', '-', '*', '/', '%', '=', '<', '>', '!', '&', '|', '^', '~', '?', ':', ',',
                ';', '.',
            ];
            let token_type = if op_chars.contains(&ch) {
                TokenType::Operator
            } else {
                TokenType::Plain
            };
            tokens.push(Token::new(ch.to_string(), token_type));
            pos += 1;
        }

        tokens
    }
}

/// Keyword highlighter picked by file extension, memoizing styled lines
/// until the buffer version moves.
#[derive(Debug)]
pub struct SyntaxHighlighter {
    language: Option<&'static Language>,
    colors: SyntaxColors,
    cache: HashMap<usize, Vec<(char, Style)>>,
    version: u64,
}

impl SyntaxHighlighter {
    pub fn for_path(path: Option<&Path>, colors: &SyntaxColors) -> Self {
        Self {
            language: path.and_then(Language::for_path),
            colors: colors.clone(),
            cache: HashMap::new(),
            version: 0,
        }
    }

    pub fn language_name(&self) -> Option<&'static str> {
        self.language.map(|l| l.name)
    }

    pub fn sync_version(&mut self, mod_version: u64) {
        if self.version != mod_version {
            self.version = mod_version;
            self.cache.clear();
        }
    }

    fn style_for(&self, token_type: TokenType) -> Style {
        let color = match token_type {
            TokenType::Keyword => &self.colors.keyword,
            TokenType::Type => &self.colors.type_kw,
            TokenType::Number => &self.colors.number,
            TokenType::String => &self.colors.string,
            TokenType::Comment => &self.colors.comment,
            TokenType::Operator => &self.colors.operator,
            TokenType::Function => &self.colors.function,
            TokenType::Plain => return Style::default(),
        };
        Style::default().fg(color.to_color())
    }
}

impl Highlight for SyntaxHighlighter {
    fn highlight(
        &mut self,
        line: usize,
        text: &str,
        mod_version: u64,
    ) -> Option<Vec<(char, Style)>> {
        let language = self.language?;
        self.sync_version(mod_version);
        if let Some(runs) = self.cache.get(&line) {
            return Some(runs.clone());
        }

        let runs: Vec<(char, Style)> = language
            .tokenize_line(text)
            .into_iter()
            .flat_map(|token| {
                let style = self.style_for(token.token_type);
                token.text.chars().map(move |c| (c, style)).collect::<Vec<_>>()
            })
            .collect();
        self.cache.insert(line, runs.clone());
        Some(runs)
    }
}
