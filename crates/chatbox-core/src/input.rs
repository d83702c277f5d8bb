//! Multi-line input box state
//!
//! The buffer tracks its own visual height: every edit or cursor move
//! re-measures the text at the last known width, so the box always fits its
//! content with no cap.

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// A key press, already decoded from whatever terminal or toolkit produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKey {
    Char(char),
    /// Enter. `newline` is set when a modifier asks for a line break instead of a send.
    Enter { newline: bool },
    Backspace,
    Delete,
    Left,
    Right,
    Home,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// The buffer changed.
    Edited,
    /// Bare Enter: the caller should submit. The buffer is untouched.
    Submit,
    /// Nothing to do (cursor already at an edge, etc.).
    Ignored,
}

pub const DEFAULT_WIDTH: usize = 50;

#[derive(Debug, Clone)]
pub struct InputBuffer {
    text: String,
    cursor: usize, // char index into text
    width: usize,
    height: u16,
}

impl Default for InputBuffer {
    fn default() -> Self {
        Self {
            text: String::new(),
            cursor: 0,
            width: DEFAULT_WIDTH,
            height: 1,
        }
    }
}

impl InputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Rows the box needs to show all of its text.
    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Update the wrap width (e.g. after a terminal resize) and re-measure.
    pub fn set_width(&mut self, width: usize) {
        self.width = width.max(1);
        self.resize_to_fit();
    }

    /// Replace the whole buffer, placing the cursor at the end.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.cursor = self.text.chars().count();
        self.resize_to_fit();
    }

    /// Empty the buffer and shrink back to a single row.
    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
        self.resize_to_fit();
    }

    pub fn handle_key(&mut self, key: EditKey) -> KeyOutcome {
        let outcome = match key {
            EditKey::Enter { newline: false } => return KeyOutcome::Submit,
            EditKey::Enter { newline: true } => {
                self.insert('\n');
                KeyOutcome::Edited
            }
            EditKey::Char(c) => {
                self.insert(c);
                KeyOutcome::Edited
            }
            EditKey::Backspace => {
                if self.cursor == 0 {
                    return KeyOutcome::Ignored;
                }
                self.cursor -= 1;
                let byte_pos = char_to_byte_index(&self.text, self.cursor);
                self.text.remove(byte_pos);
                KeyOutcome::Edited
            }
            EditKey::Delete => {
                if self.cursor >= self.text.chars().count() {
                    return KeyOutcome::Ignored;
                }
                let byte_pos = char_to_byte_index(&self.text, self.cursor);
                self.text.remove(byte_pos);
                KeyOutcome::Edited
            }
            EditKey::Left => {
                self.cursor = self.cursor.saturating_sub(1);
                KeyOutcome::Ignored
            }
            EditKey::Right => {
                let char_count = self.text.chars().count();
                self.cursor = (self.cursor + 1).min(char_count);
                KeyOutcome::Ignored
            }
            EditKey::Home => {
                self.cursor = 0;
                KeyOutcome::Ignored
            }
            EditKey::End => {
                self.cursor = self.text.chars().count();
                KeyOutcome::Ignored
            }
        };

        // Cursor moves can add or drop the row after a full line
        self.resize_to_fit();
        outcome
    }

    fn insert(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.text, self.cursor);
        self.text.insert(byte_pos, c);
        self.cursor += 1;
    }

    fn resize_to_fit(&mut self) {
        let rows = self.visual_lines().len();
        self.height = u16::try_from(rows).unwrap_or(u16::MAX);
    }

    /// Logical line index and column (in chars) of the cursor.
    fn cursor_line_col(&self) -> (usize, usize) {
        let before = &self.text[..char_to_byte_index(&self.text, self.cursor)];
        let line = before.matches('\n').count();
        let col = before.rsplit('\n').next().map_or(0, |l| l.chars().count());
        (line, col)
    }

    /// Screen rows a logical line of `chars` characters wraps to.
    fn rows_for(&self, chars: usize) -> usize {
        chars.div_ceil(self.width).max(1)
    }

    /// The text hard-wrapped at the current width, one entry per screen row.
    ///
    /// A line that exactly fills its last row only gets an extra empty row
    /// when the cursor sits at its end.
    pub fn visual_lines(&self) -> Vec<String> {
        let (cursor_line, cursor_col) = self.cursor_line_col();
        let mut rows = Vec::new();
        for (idx, line) in self.text.split('\n').enumerate() {
            let chars: Vec<char> = line.chars().collect();
            if chars.is_empty() {
                rows.push(String::new());
                continue;
            }
            rows.extend(chars.chunks(self.width).map(|c| c.iter().collect::<String>()));
            if idx == cursor_line && cursor_col == chars.len() && chars.len() % self.width == 0 {
                rows.push(String::new());
            }
        }
        rows
    }

    /// Cursor location as (row, column) within [`visual_lines`](Self::visual_lines).
    pub fn cursor_position(&self) -> (u16, u16) {
        let (cursor_line, col) = self.cursor_line_col();
        let rows_above: usize = self
            .text
            .split('\n')
            .take(cursor_line)
            .map(|line| self.rows_for(line.chars().count()))
            .sum();
        let row = rows_above + col / self.width;
        (clamp_u16(row), clamp_u16(col % self.width))
    }
}

fn clamp_u16(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(text: &str) -> InputBuffer {
        let mut input = InputBuffer::new();
        for c in text.chars() {
            input.handle_key(EditKey::Char(c));
        }
        input
    }

    #[test]
    fn test_plain_enter_requests_submit_without_editing() {
        let mut input = typed("hello");
        assert_eq!(input.handle_key(EditKey::Enter { newline: false }), KeyOutcome::Submit);
        assert_eq!(input.text(), "hello");
    }

    #[test]
    fn test_modified_enter_inserts_newline() {
        let mut input = typed("hello");
        assert_eq!(input.handle_key(EditKey::Enter { newline: true }), KeyOutcome::Edited);
        assert_eq!(input.text(), "hello\n");
        assert_eq!(input.height(), 2);
    }

    #[test]
    fn test_height_grows_with_wrapped_text() {
        let mut input = InputBuffer::new();
        input.set_width(4);
        input.set_text("abcdefghij");
        // 10 chars at width 4: rows "abcd", "efgh", "ij"
        assert_eq!(input.height(), 3);
        assert_eq!(input.visual_lines(), vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_height_has_no_cap() {
        let mut input = InputBuffer::new();
        input.set_text("x\n".repeat(100));
        assert_eq!(input.height(), 101);
    }

    #[test]
    fn test_full_row_leaves_room_for_cursor() {
        let mut input = InputBuffer::new();
        input.set_width(3);
        input.set_text("abc");
        assert_eq!(input.visual_lines(), vec!["abc", ""]);
        assert_eq!(input.cursor_position(), (1, 0));
    }

    #[test]
    fn test_full_line_away_from_cursor_has_no_spare_row() {
        let mut input = InputBuffer::new();
        input.set_width(3);
        input.set_text("abc\nd");
        assert_eq!(input.height(), 2);
        assert_eq!(input.visual_lines(), vec!["abc", "d"]);
        assert_eq!(input.cursor_position(), (1, 1));
    }

    #[test]
    fn test_spare_row_follows_the_cursor() {
        let mut input = InputBuffer::new();
        input.set_width(3);
        input.set_text("abc");
        assert_eq!(input.height(), 2);

        input.handle_key(EditKey::Left);
        assert_eq!(input.height(), 1);
        assert_eq!(input.cursor_position(), (0, 2));

        input.handle_key(EditKey::End);
        assert_eq!(input.height(), 2);
    }

    #[test]
    fn test_cursor_inside_wrapped_line() {
        let mut input = InputBuffer::new();
        input.set_width(3);
        input.set_text("abcdef\nx");
        for _ in 0..5 {
            input.handle_key(EditKey::Left);
        }
        // Cursor before 'd': second row of the first line
        assert_eq!(input.cursor_position(), (1, 0));
        assert_eq!(input.visual_lines(), vec!["abc", "def", "x"]);
    }

    #[test]
    fn test_clear_resets_height() {
        let mut input = InputBuffer::new();
        input.set_text("a\nb\nc");
        assert_eq!(input.height(), 3);
        input.clear();
        assert_eq!(input.text(), "");
        assert_eq!(input.cursor(), 0);
        assert_eq!(input.height(), 1);
    }

    #[test]
    fn test_utf8_editing() {
        let mut input = typed("Привет");
        input.handle_key(EditKey::Left);
        input.handle_key(EditKey::Backspace);
        assert_eq!(input.text(), "Привт");
        input.handle_key(EditKey::Home);
        input.handle_key(EditKey::Delete);
        assert_eq!(input.text(), "ривт");
    }

    #[test]
    fn test_backspace_at_start_is_ignored() {
        let mut input = InputBuffer::new();
        assert_eq!(input.handle_key(EditKey::Backspace), KeyOutcome::Ignored);
    }

    #[test]
    fn test_cursor_position_on_second_line() {
        let mut input = InputBuffer::new();
        input.set_width(10);
        input.set_text("ab\ncde");
        assert_eq!(input.cursor_position(), (1, 3));
    }

    #[test]
    fn test_is_blank() {
        assert!(typed("  \n ").is_blank());
        assert!(!typed(" a ").is_blank());
    }
}
