use crossterm::event::KeyCode;

/// Single-line text input. `cursor` counts chars, not bytes.
#[derive(Default, Clone)]
pub struct LineEdit {
    pub value: String,
    pub cursor: usize,
    pub password: bool,
}

impl LineEdit {
    pub fn masked() -> Self {
        Self {
            password: true,
            ..Self::default()
        }
    }

    pub fn with(s: impl Into<String>) -> Self {
        let mut e = Self::default();
        e.set(s);
        e
    }

    fn byte_at(&self, idx: usize) -> usize {
        self.value
            .char_indices()
            .nth(idx)
            .map_or(self.value.len(), |(b, _)| b)
    }

    fn len(&self) -> usize {
        self.value.chars().count()
    }

    pub fn set(&mut self, s: impl Into<String>) {
        self.value = s.into();
        self.cursor = self.len();
    }

    pub fn push(&mut self, ch: char) {
        let at = self.byte_at(self.cursor);
        self.value.insert(at, ch);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_at(self.cursor);
            self.value.remove(at);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.len() {
            let at = self.byte_at(self.cursor);
            self.value.remove(at);
        }
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        if self.cursor < self.len() {
            self.cursor += 1;
        }
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    /// Apply an editing key. Returns false when the key is not an edit.
    pub fn handle(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char(c) => self.push(c),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left => self.left(),
            KeyCode::Right => self.right(),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.len(),
            _ => return false,
        }
        true
    }

    pub fn rendered(&self) -> String {
        if self.password {
            "*".repeat(self.len())
        } else {
            self.value.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edits_at_cursor() {
        let mut e = LineEdit::with("ac");
        e.left();
        e.push('b');
        assert_eq!(e.value, "abc");
        e.backspace();
        assert_eq!(e.value, "ac");
        e.clear();
        assert_eq!(e.cursor, 0);
    }

    #[test]
    fn handles_multibyte_text() {
        let mut e = LineEdit::with("නම");
        e.backspace();
        e.push('x');
        assert_eq!(e.value.chars().count(), 2);
        assert!(e.value.ends_with('x'));
    }

    #[test]
    fn password_is_masked() {
        let mut e = LineEdit::masked();
        e.set("secret");
        assert_eq!(e.rendered(), "******");
    }
}
