use std::path::PathBuf;
use thiserror::Error;

/// A parsed `:` command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit { force: bool },
    Write(Option<PathBuf>),
    WriteQuit(Option<PathBuf>),
    Edit { path: PathBuf, force: bool },
    VSplit(Option<PathBuf>),
    Close,
    NextPane,
    PrevPane,
    /// 1-based line number.
    Goto(usize),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("not an editor command: {0}")]
    Unknown(String),
    #[error("argument required: :{0} <file>")]
    MissingFile(&'static str),
}

/// Parse a command line. An empty line parses to `None`.
pub fn parse(input: &str) -> Result<Option<Command>, CommandError> {
    let input = input.trim();
    let mut parts = input.splitn(2, char::is_whitespace);
    let Some(base) = parts.next().filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let arg = parts
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from);

    let command = match base {
        "q" | "quit" => Command::Quit { force: false },
        "q!" | "quit!" => Command::Quit { force: true },
        "w" | "write" => Command::Write(arg),
        "wq" | "x" => Command::WriteQuit(arg),
        "e" | "edit" => Command::Edit {
            path: arg.ok_or(CommandError::MissingFile("e"))?,
            force: false,
        },
        "e!" | "edit!" => Command::Edit {
            path: arg.ok_or(CommandError::MissingFile("e!"))?,
            force: true,
        },
        "vs" | "vsplit" => Command::VSplit(arg),
        "close" | "bd" | "bdelete" => Command::Close,
        "bn" | "bnext" => Command::NextPane,
        "bp" | "bprev" => Command::PrevPane,
        other => match other.parse::<usize>() {
            Ok(line) if arg.is_none() => Command::Goto(line),
            _ => return Err(CommandError::Unknown(input.to_string())),
        },
    };
    Ok(Some(command))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(input: &str) -> Command {
        parse(input).unwrap().unwrap()
    }

    #[test]
    fn test_quit_variants() {
        assert_eq!(ok("q"), Command::Quit { force: false });
        assert_eq!(ok(" q! "), Command::Quit { force: true });
    }

    #[test]
    fn test_write_with_and_without_file() {
        assert_eq!(ok("w"), Command::Write(None));
        assert_eq!(
            ok("w notes/my file.txt"),
            Command::Write(Some(PathBuf::from("notes/my file.txt")))
        );
        assert_eq!(ok("wq out.txt"), Command::WriteQuit(Some(PathBuf::from("out.txt"))));
    }

    #[test]
    fn test_edit_requires_file() {
        assert_eq!(
            ok("e! a.rs"),
            Command::Edit {
                path: PathBuf::from("a.rs"),
                force: true
            }
        );
        assert_eq!(parse("e"), Err(CommandError::MissingFile("e")));
    }

    #[test]
    fn test_pane_commands_and_goto() {
        assert_eq!(ok("vs"), Command::VSplit(None));
        assert_eq!(ok("vsplit b.txt"), Command::VSplit(Some(PathBuf::from("b.txt"))));
        assert_eq!(ok("bd"), Command::Close);
        assert_eq!(ok("bn"), Command::NextPane);
        assert_eq!(ok("42"), Command::Goto(42));
    }

    #[test]
    fn test_unknown_and_empty() {
        assert_eq!(parse("   "), Ok(None));
        let err = parse("frobnicate now").unwrap_err();
        assert_eq!(err.to_string(), "not an editor command: frobnicate now");
        assert!(parse("12 13").is_err());
    }
}
