use sheets_engine::MAX_CELL_TEXT;

/// Line editor backing Edit mode.
///
/// `caret` is a byte offset into `text` and always sits on a char boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditBuffer {
    text: String,
    caret: usize,
}

impl EditBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer holding `text` (truncated to the cell limit), caret at the end.
    pub fn with_text(text: &str) -> Self {
        let text: String = text.chars().take(MAX_CELL_TEXT).collect();
        let caret = text.len();
        Self { text, caret }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    /// Caret position in characters.
    pub fn caret(&self) -> usize {
        self.text[..self.caret].chars().count()
    }

    /// Text before and after the caret.
    pub fn split_at_caret(&self) -> (&str, &str) {
        self.text.split_at(self.caret)
    }

    /// Insert at the caret. Returns false if the buffer is full.
    pub fn insert(&mut self, c: char) -> bool {
        if self.text.chars().count() >= MAX_CELL_TEXT {
            return false;
        }
        self.text.insert(self.caret, c);
        self.caret += c.len_utf8();
        true
    }

    /// Remove the char before the caret.
    pub fn backspace(&mut self) {
        if let Some(c) = self.text[..self.caret].chars().next_back() {
            self.caret -= c.len_utf8();
            self.text.remove(self.caret);
        }
    }

    /// Remove the char at the caret.
    pub fn delete(&mut self) {
        if self.caret < self.text.len() {
            self.text.remove(self.caret);
        }
    }

    pub fn left(&mut self) {
        if let Some(c) = self.text[..self.caret].chars().next_back() {
            self.caret -= c.len_utf8();
        }
    }

    pub fn right(&mut self) {
        if let Some(c) = self.text[self.caret..].chars().next() {
            self.caret += c.len_utf8();
        }
    }

    pub fn home(&mut self) {
        self.caret = 0;
    }

    pub fn end(&mut self) {
        self.caret = self.text.len();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.caret = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_at_caret() {
        let mut b = EditBuffer::with_text("ac");
        b.left();
        assert!(b.insert('b'));
        assert_eq!(b.text(), "abc");
        assert_eq!(b.caret(), 2);
        assert_eq!(b.split_at_caret(), ("ab", "c"));
    }

    #[test]
    fn test_backspace_and_delete() {
        let mut b = EditBuffer::with_text("abcd");
        b.left();
        b.left();
        b.backspace();
        assert_eq!(b.text(), "acd");
        b.delete();
        assert_eq!(b.text(), "ad");
        assert_eq!(b.caret(), 1);

        b.home();
        b.backspace();
        assert_eq!(b.text(), "ad");
        b.end();
        b.delete();
        assert_eq!(b.text(), "ad");
    }

    #[test]
    fn test_caret_stays_on_char_boundaries() {
        let mut b = EditBuffer::with_text("né");
        b.left();
        assert_eq!(b.caret(), 1);
        b.delete();
        assert_eq!(b.text(), "n");
        b.insert('ü');
        b.left();
        b.right();
        b.right();
        assert_eq!(b.caret(), 2);
        b.backspace();
        assert_eq!(b.text(), "n");
    }

    #[test]
    fn test_clear_line() {
        let mut b = EditBuffer::with_text("=A1+5");
        b.clear();
        assert_eq!(b.text(), "");
        assert_eq!(b.caret(), 0);
    }

    #[test]
    fn test_insert_refused_when_full() {
        let mut b = EditBuffer::with_text(&"x".repeat(MAX_CELL_TEXT + 10));
        assert_eq!(b.text().chars().count(), MAX_CELL_TEXT);
        assert!(!b.insert('y'));
        b.backspace();
        assert!(b.insert('y'));
        assert!(b.text().ends_with('y'));
    }
}
