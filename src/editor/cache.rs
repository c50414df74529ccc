use std::collections::HashMap;

use super::Position;

/// The view parameters a frame was drawn with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewState {
    pub cursor: Position,
    pub offset_y: usize,
    pub offset_x: usize,
    pub visual_offset_y: usize,
    pub width: u16,
    pub height: u16,
}

/// Per-pane memo of the last drawn frame.
///
/// Anything that changes the buffer invalidates the whole line map; the
/// frame loop only repaints when this reports a difference.
#[derive(Debug, Clone)]
pub struct RenderCache {
    lines: HashMap<usize, String>,
    view: Option<ViewState>,
    status_line: String,
    mod_version: u64,
    needs_redraw: bool,
}

impl Default for RenderCache {
    fn default() -> Self {
        Self {
            lines: HashMap::new(),
            view: None,
            status_line: String::new(),
            mod_version: 0,
            needs_redraw: true,
        }
    }
}

impl RenderCache {
    pub fn needs_redraw(&self) -> bool {
        self.needs_redraw
    }

    /// True when the view moved, resized or was never drawn.
    pub fn has_changed(&self, view: &ViewState) -> bool {
        self.needs_redraw || self.view.as_ref() != Some(view)
    }

    pub fn line_changed(&self, line: usize, content: &str) -> bool {
        self.lines.get(&line).map(String::as_str) != Some(content)
    }

    pub fn update_line(&mut self, line: usize, content: &str) {
        self.lines.insert(line, content.to_string());
    }

    pub fn status_changed(&self, status: &str) -> bool {
        self.status_line != status
    }

    /// Record a completed frame.
    pub fn update(&mut self, view: ViewState, status: &str) {
        self.view = Some(view);
        self.status_line = status.to_string();
        self.needs_redraw = false;
    }

    /// Invalidate everything when the buffer moved past the recorded version.
    pub fn sync_version(&mut self, mod_version: u64) {
        if self.mod_version != mod_version {
            self.mod_version = mod_version;
            self.invalidate();
        }
    }

    pub fn invalidate(&mut self) {
        self.lines.clear();
        self.needs_redraw = true;
    }

    pub fn invalidate_line(&mut self, line: usize) {
        if self.lines.remove(&line).is_some() {
            self.needs_redraw = true;
        }
    }

    pub fn cached_lines(&self) -> usize {
        self.lines.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(line: usize) -> ViewState {
        ViewState {
            cursor: Position::new(line, 0),
            width: 80,
            height: 24,
            ..ViewState::default()
        }
    }

    #[test]
    fn test_fresh_cache_needs_redraw() {
        let cache = RenderCache::default();
        assert!(cache.has_changed(&view(0)));
    }

    #[test]
    fn test_update_settles_until_view_moves() {
        let mut cache = RenderCache::default();
        cache.update(view(0), "status");
        assert!(!cache.has_changed(&view(0)));
        assert!(cache.has_changed(&view(1)));
        assert!(!cache.status_changed("status"));
        assert!(cache.status_changed("other"));
    }

    #[test]
    fn test_line_tracking() {
        let mut cache = RenderCache::default();
        assert!(cache.line_changed(3, "abc"));
        cache.update_line(3, "abc");
        assert!(!cache.line_changed(3, "abc"));
        assert!(cache.line_changed(3, "abd"));

        cache.update(view(0), "");
        cache.invalidate_line(3);
        assert!(cache.needs_redraw());
        assert!(cache.line_changed(3, "abc"));
    }

    #[test]
    fn test_version_change_drops_lines() {
        let mut cache = RenderCache::default();
        cache.update_line(0, "x");
        cache.update(view(0), "");
        cache.sync_version(0);
        assert!(!cache.needs_redraw());

        cache.sync_version(1);
        assert!(cache.needs_redraw());
        assert_eq!(cache.cached_lines(), 0);
    }
}
