pub mod layout;
pub mod pane;
pub mod status_bar;

use crate::app::Editor;
use ratatui::Frame;

pub fn render(frame: &mut Frame, editor: &mut Editor) {
    layout::render(frame, editor);
}
