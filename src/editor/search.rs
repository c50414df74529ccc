use super::buffer::TextBuffer;

/// A match in rune coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchMatch {
    pub line: usize,
    pub col: usize,
    pub len: usize,
}

/// Incremental, case-insensitive substring search over one buffer.
#[derive(Debug, Clone, Default)]
pub struct SearchEngine {
    query: String,
    matches: Vec<SearchMatch>,
    current: usize,
}

impl SearchEngine {
    /// Re-run the search from scratch. An empty query clears all matches.
    pub fn search(&mut self, buffer: &TextBuffer, query: &str) -> usize {
        self.query = query.to_string();
        self.matches = find_matches(buffer, query);
        self.current = 0;
        self.matches.len()
    }

    pub fn next(&mut self) -> Option<SearchMatch> {
        if !self.has_matches() {
            return None;
        }
        self.current = (self.current + 1) % self.matches.len();
        self.current()
    }

    pub fn previous(&mut self) -> Option<SearchMatch> {
        if !self.has_matches() {
            return None;
        }
        self.current = if self.current == 0 {
            self.matches.len() - 1
        } else {
            self.current - 1
        };
        self.current()
    }

    pub fn current(&self) -> Option<SearchMatch> {
        self.matches.get(self.current).copied()
    }

    pub fn matches(&self) -> &[SearchMatch] {
        &self.matches
    }

    pub fn has_matches(&self) -> bool {
        !self.matches.is_empty()
    }

    pub fn clear(&mut self) {
        self.query.clear();
        self.matches.clear();
        self.current = 0;
    }

    /// `/<query> [i/n]`, or `Pattern not found: <query>`.
    pub fn status(&self) -> Option<String> {
        if self.query.is_empty() {
            return None;
        }
        if !self.has_matches() {
            Some(format!("Pattern not found: {}", self.query))
        } else {
            Some(format!(
                "/{} [{}/{}]",
                self.query,
                self.current + 1,
                self.matches.len()
            ))
        }
    }
}

/// Case-folded comparison keeps one rune per rune so columns stay aligned.
fn fold(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

/// Every case-insensitive occurrence of `query`, line-major.
///
/// The scan restarts one rune past each match start, so overlapping
/// occurrences are all reported.
pub fn find_matches(buffer: &TextBuffer, query: &str) -> Vec<SearchMatch> {
    let needle: Vec<char> = query.chars().map(fold).collect();
    if needle.is_empty() {
        return Vec::new();
    }

    let mut matches = Vec::new();
    for line in 0..buffer.line_count() {
        let Some(slice) = buffer.line_slice(line) else {
            continue;
        };
        let hay: Vec<char> = slice.chars().map(fold).collect();
        if hay.len() < needle.len() {
            continue;
        }
        for col in 0..=hay.len() - needle.len() {
            if hay[col..col + needle.len()] == needle[..] {
                matches.push(SearchMatch {
                    line,
                    col,
                    len: needle.len(),
                });
            }
        }
    }
    matches
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(line: usize, col: usize, len: usize) -> SearchMatch {
        SearchMatch { line, col, len }
    }

    #[test]
    fn test_search_finds_each_occurrence() {
        let buf = TextBuffer::from_text("foo\nbar");
        let mut search = SearchEngine::default();
        assert_eq!(search.search(&buf, "o"), 2);
        assert_eq!(search.matches(), &[m(0, 1, 1), m(0, 2, 1)]);
    }

    #[test]
    fn test_next_cycles() {
        let buf = TextBuffer::from_text("foo\nbar");
        let mut search = SearchEngine::default();
        search.search(&buf, "o");
        assert_eq!(search.current(), Some(m(0, 1, 1)));
        assert_eq!(search.next(), Some(m(0, 2, 1)));
        assert_eq!(search.next(), Some(m(0, 1, 1)));
        assert_eq!(search.previous(), Some(m(0, 2, 1)));
    }

    #[test]
    fn test_overlapping_matches() {
        let buf = TextBuffer::from_text("aaaa");
        assert_eq!(find_matches(&buf, "aa").len(), 3);
    }

    #[test]
    fn test_case_insensitive_and_rune_columns() {
        let buf = TextBuffer::from_text("Ärger ÄRGER\nnope");
        let found = find_matches(&buf, "ärg");
        assert_eq!(found, vec![m(0, 0, 3), m(0, 6, 3)]);
    }

    #[test]
    fn test_empty_query_and_no_matches() {
        let buf = TextBuffer::from_text("text");
        let mut search = SearchEngine::default();
        assert_eq!(search.search(&buf, ""), 0);
        assert_eq!(search.next(), None);
        assert_eq!(search.previous(), None);
        assert_eq!(search.status(), None);

        search.search(&buf, "zz");
        assert_eq!(search.status().as_deref(), Some("Pattern not found: zz"));
    }

    #[test]
    fn test_status_counts() {
        let buf = TextBuffer::from_text("ab ab ab");
        let mut search = SearchEngine::default();
        search.search(&buf, "ab");
        search.next();
        assert_eq!(search.status().as_deref(), Some("/ab [2/3]"));
    }
}
