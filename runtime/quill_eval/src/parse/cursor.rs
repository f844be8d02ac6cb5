/// A position in source text.
///
/// Byte-oriented: every delimiter in the grammar is ASCII, so advancing over
/// ASCII bytes or over whole scanned tokens always lands on a char boundary.
#[derive(Clone, Copy, Debug)]
pub struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(text: &'a str) -> Self {
        Cursor { text, pos: 0 }
    }

    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn set_pos(&mut self, pos: usize) {
        debug_assert!(self.text.is_char_boundary(pos));
        self.pos = pos;
    }

    /// The full source text.
    #[inline]
    pub fn text(&self) -> &'a str {
        self.text
    }

    /// Text from the current position to the end.
    #[inline]
    pub fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    /// Text between `start` and the current position.
    pub fn since(&self, start: usize) -> &'a str {
        &self.text[start..self.pos]
    }

    #[inline]
    pub fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.text.as_bytes().get(self.pos).copied()
    }

    #[inline]
    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.text.as_bytes().get(self.pos + offset).copied()
    }

    /// The byte just before the current position.
    pub fn prev(&self) -> Option<u8> {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.text.as_bytes().get(i).copied())
    }

    /// Advance by `n` bytes, stopping at the end.
    #[inline]
    pub fn bump(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.text.len());
    }

    /// Skip spaces and tabs.
    pub fn skip_white(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t')) {
            self.pos += 1;
        }
    }

    #[inline]
    pub fn starts_with(&self, s: &str) -> bool {
        self.rest().starts_with(s)
    }

    /// Consume `b` if it is next.
    pub fn eat(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Consume `s` if it comes next.
    pub fn eat_str(&mut self, s: &str) -> bool {
        if self.starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    /// Consume the longest run of ASCII bytes matching `pred`.
    pub fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if !b.is_ascii() || !pred(b) {
                break;
            }
            self.pos += 1;
        }
        &self.text[start..self.pos]
    }

    /// Consume the next char, whatever its width.
    pub fn next_char(&mut self) -> Option<char> {
        let c = self.rest().chars().next()?;
        self.pos += c.len_utf8();
        Some(c)
    }
}
