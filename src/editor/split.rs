use ratatui::layout::Rect;

/// Pane rectangles plus the x of each one-column divider between them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitLayout {
    pub panes: Vec<Rect>,
    pub dividers: Vec<u16>,
}

impl SplitLayout {
    /// Divider within one column of `x`, if any.
    pub fn divider_at(&self, x: u16) -> Option<usize> {
        self.dividers.iter().position(|&d| d.abs_diff(x) <= 1)
    }
}

pub const MIN_RATIO: f64 = 0.1;
pub const MAX_RATIO: f64 = 0.9;

/// Lay `pane_count` panes out left to right.
///
/// Two panes split by `ratio` (clamped to `[0.1, 0.9]`), each at least one
/// column wide. More than two share the width equally.
pub fn side_by_side(width: u16, height: u16, pane_count: usize, ratio: f64) -> SplitLayout {
    if pane_count <= 1 {
        return SplitLayout {
            panes: vec![Rect::new(0, 0, width, height)],
            dividers: Vec::new(),
        };
    }

    if pane_count == 2 {
        let usable = width.saturating_sub(1);
        let ratio = ratio.clamp(MIN_RATIO, MAX_RATIO);
        let mut left = (f64::from(usable) * ratio).floor() as u16;
        left = left.max(1).min(usable.saturating_sub(1));
        let right = usable.saturating_sub(left);
        return SplitLayout {
            panes: vec![
                Rect::new(0, 0, left, height),
                Rect::new(left + 1, 0, right, height),
            ],
            dividers: vec![left],
        };
    }

    let count = pane_count as u16;
    let usable = width.saturating_sub(count - 1);
    let each = usable / count;
    let mut panes = Vec::with_capacity(pane_count);
    let mut dividers = Vec::with_capacity(pane_count - 1);
    let mut x = 0;
    for i in 0..count {
        // The last pane absorbs the rounding remainder
        let w = if i == count - 1 {
            usable.saturating_sub(each * (count - 1))
        } else {
            each
        };
        panes.push(Rect::new(x, 0, w, height));
        x += w;
        if i < count - 1 {
            dividers.push(x);
            x += 1;
        }
    }
    SplitLayout { panes, dividers }
}

/// Split ratio that puts the divider under mouse column `x`.
pub fn ratio_for_x(x: u16, width: u16) -> f64 {
    if width == 0 {
        return 0.5;
    }
    (f64::from(x) / f64::from(width)).clamp(MIN_RATIO, MAX_RATIO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_pane_fills_screen() {
        let layout = side_by_side(80, 24, 1, 0.5);
        assert_eq!(layout.panes, vec![Rect::new(0, 0, 80, 24)]);
        assert!(layout.dividers.is_empty());
    }

    #[test]
    fn test_two_panes_even_split() {
        let layout = side_by_side(21, 10, 2, 0.5);
        assert_eq!(layout.panes[0], Rect::new(0, 0, 10, 10));
        assert_eq!(layout.panes[1], Rect::new(11, 0, 10, 10));
        assert_eq!(layout.dividers, vec![10]);
    }

    #[test]
    fn test_ratio_is_clamped_and_sides_stay_visible() {
        let layout = side_by_side(21, 10, 2, 0.0);
        assert_eq!(layout.panes[0].width, 2);

        let layout = side_by_side(4, 1, 2, 0.99);
        assert!(layout.panes[0].width >= 1);
        assert!(layout.panes[1].width >= 1);
        assert_eq!(layout.panes[0].width + layout.panes[1].width + 1, 4);
    }

    #[test]
    fn test_three_panes_share_width() {
        let layout = side_by_side(32, 5, 3, 0.5);
        let widths: Vec<u16> = layout.panes.iter().map(|r| r.width).collect();
        assert_eq!(widths, vec![10, 10, 10]);
        assert_eq!(layout.dividers, vec![10, 21]);
        assert_eq!(layout.panes[2].x, 22);
    }

    #[test]
    fn test_divider_hit_testing() {
        let layout = side_by_side(21, 10, 2, 0.5);
        assert_eq!(layout.divider_at(9), Some(0));
        assert_eq!(layout.divider_at(11), Some(0));
        assert_eq!(layout.divider_at(5), None);
    }

    #[test]
    fn test_ratio_for_x() {
        assert_eq!(ratio_for_x(40, 80), 0.5);
        assert_eq!(ratio_for_x(0, 80), MIN_RATIO);
        assert_eq!(ratio_for_x(80, 80), MAX_RATIO);
    }
}
