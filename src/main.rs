mod app;
mod clipboard;
mod command;
mod config;
mod editor;
mod input;
mod logging;
mod preview;
mod syntax;
mod theme;
mod ui;

use anyhow::{bail, Result};
use app::Editor;
use clap::{ArgAction, Parser};
use clipboard::SystemClipboard;
use config::Config;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use std::io::stdout;
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "vx")]
#[command(author, version, about = "A small modal text editor", long_about = None)]
#[command(disable_version_flag = true)]
struct Args {
    /// File to open; created on first save if it does not exist
    file: Option<PathBuf>,

    /// Print version
    #[arg(short = 'v', long, short_alias = 'V', action = ArgAction::Version)]
    version: Option<bool>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(path) = &args.file {
        if let Err(e) = check_file_arg(path) {
            eprintln!("Error: {e}");
            eprintln!("Usage: vx [FILE]");
            std::process::exit(1);
        }
    }

    logging::init();
    info!(version = env!("CARGO_PKG_VERSION"), "vx starting");

    let config = Config::load()?;
    let mut editor = Editor::new(config, Box::new(SystemClipboard::new()));
    if let Some(path) = &args.file {
        if let Err(e) = editor.open_initial(path) {
            error!(path = %path.display(), error = %e, "initial load failed");
            eprintln!("Error: {}: {e}", path.display());
            std::process::exit(1);
        }
    }

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &mut editor);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        error!(error = %e, "event loop failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    info!("vx exiting");
    Ok(())
}

/// Reject paths that cannot be opened as a buffer. A missing file is fine,
/// it is created on first save.
fn check_file_arg(path: &Path) -> Result<()> {
    if path.is_dir() {
        bail!("'{}' is a directory", path.display());
    }
    Ok(())
}

fn run<B: Backend>(terminal: &mut Terminal<B>, editor: &mut Editor) -> Result<()> {
    let size = terminal.size()?;
    editor.resize(size.width, size.height);

    loop {
        if editor.needs_redraw() {
            terminal.draw(|frame| ui::render(frame, editor))?;
        }
        input::handle_event(editor)?;
        if editor.should_quit {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_argument_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = check_file_arg(dir.path()).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("'{}' is a directory", dir.path().display())
        );
    }

    #[test]
    fn test_file_arguments_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("new.txt");
        assert!(check_file_arg(&missing).is_ok());

        let existing = dir.path().join("notes.md");
        std::fs::write(&existing, "# hi\n").unwrap();
        assert!(check_file_arg(&existing).is_ok());
    }
}
