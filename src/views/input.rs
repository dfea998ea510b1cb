/// Single-line text field with a character cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInput {
    value: String,
    cursor: usize,
}

impl TextInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: impl Into<String>) -> Self {
        let value = value.into();
        let cursor = value.chars().count();
        Self { value, cursor }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn trimmed(&self) -> &str {
        self.value.trim()
    }

    pub fn is_blank(&self) -> bool {
        self.value.trim().is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn set(&mut self, value: impl Into<String>) {
        *self = Self::with_value(value);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn byte_offset(&self, chars: usize) -> usize {
        self.value
            .char_indices()
            .nth(chars)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    pub fn insert(&mut self, c: char) {
        let at = self.byte_offset(self.cursor);
        self.value.insert(at, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_offset(self.cursor);
        self.value.remove(at);
    }

    pub fn delete(&mut self) {
        if self.cursor < self.value.chars().count() {
            let at = self.byte_offset(self.cursor);
            self.value.remove(at);
        }
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.value.chars().count());
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.value.chars().count();
    }

    /// The value with every character replaced, for password fields.
    pub fn masked(&self) -> String {
        "•".repeat(self.value.chars().count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edits_at_cursor() {
        let mut input = TextInput::with_value("rst");
        input.left();
        input.left();
        input.insert('u');
        assert_eq!(input.value(), "rust");
        assert_eq!(input.cursor(), 2);
        input.end();
        input.backspace();
        assert_eq!(input.value(), "rus");
        input.home();
        input.delete();
        assert_eq!(input.value(), "us");
    }

    #[test]
    fn handles_multibyte_chars() {
        let mut input = TextInput::new();
        for c in "héllo".chars() {
            input.insert(c);
        }
        input.left();
        input.left();
        input.left();
        input.backspace();
        assert_eq!(input.value(), "hllo");
        assert_eq!(input.masked(), "••••");
    }

    #[test]
    fn clear_resets() {
        let mut input = TextInput::with_value(" tag ");
        assert_eq!(input.trimmed(), "tag");
        input.clear();
        assert!(input.is_blank());
        assert_eq!(input.cursor(), 0);
        input.backspace();
        input.right();
        assert_eq!(input.cursor(), 0);
    }
}
