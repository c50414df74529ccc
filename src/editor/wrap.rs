//! Character wrapping of one logical line into visual rows.
//!
//! Every rune occupies one cell, so segment boundaries fall every
//! `max_width` runes.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapSegment {
    pub text: String,
    /// Rune column of the first rune within the logical line.
    pub start_col: usize,
    pub is_continuation: bool,
}

/// Split `text` into rows of at most `max_width` runes.
///
/// A zero width yields the whole line as a single segment, as does an
/// empty line.
pub fn wrap(text: &str, max_width: usize) -> Vec<WrapSegment> {
    let chars: Vec<char> = text.chars().collect();
    if max_width == 0 || chars.len() <= max_width {
        return vec![WrapSegment {
            text: text.to_string(),
            start_col: 0,
            is_continuation: false,
        }];
    }

    chars
        .chunks(max_width)
        .enumerate()
        .map(|(i, chunk)| WrapSegment {
            text: chunk.iter().collect(),
            start_col: i * max_width,
            is_continuation: i > 0,
        })
        .collect()
}

/// Visual row count for a line of `len` runes, without building the
/// segments. Callers pass the rope's rune count so no text is copied.
pub fn visual_line_count(len: usize, max_width: usize) -> usize {
    if max_width == 0 || len == 0 {
        1
    } else {
        len.div_ceil(max_width)
    }
}

/// Index of the row holding `col` in a line of `len` runes.
///
/// A column one past the end of a line that exactly fills its last row
/// stays on that row.
pub fn segment_index(col: usize, len: usize, max_width: usize) -> usize {
    if max_width == 0 {
        return 0;
    }
    (col / max_width).min(visual_line_count(len, max_width) - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_splits_every_width_runes() {
        let segs = wrap("abcdefgh", 3);
        let texts: Vec<&str> = segs.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["abc", "def", "gh"]);
        assert_eq!(segs[2].start_col, 6);
        assert!(!segs[0].is_continuation);
        assert!(segs[1].is_continuation);
    }

    #[test]
    fn test_zero_width_is_one_segment() {
        let segs = wrap("hello", 0);
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].text, "hello");
    }

    #[test]
    fn test_wrap_round_trips() {
        let line = "größer → kleiner, 日本語テキスト and ascii";
        for width in 1..=line.chars().count() + 1 {
            let joined: String = wrap(line, width).into_iter().map(|s| s.text).collect();
            assert_eq!(joined, line, "width {width}");
        }
    }

    #[test]
    fn test_visual_line_count_matches_wrap() {
        for (text, width) in [("", 4), ("abcd", 4), ("abcde", 4), ("ééééé", 2)] {
            assert_eq!(
                visual_line_count(text.chars().count(), width),
                wrap(text, width).len()
            );
        }
    }

    #[test]
    fn test_segment_index_clamps_end_of_line() {
        assert_eq!(segment_index(0, 8, 4), 0);
        assert_eq!(segment_index(5, 8, 4), 1);
        // One past the end of a full row stays on it
        assert_eq!(segment_index(8, 8, 4), 1);
        assert_eq!(segment_index(3, 0, 4), 0);
    }
}
