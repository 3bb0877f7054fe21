use regex::Regex;

/// Cursor over a template string.
///
/// The only state is the byte position; every scan either consumes a prefix
/// of the remaining text or leaves the position untouched.
pub struct Scanner<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    #[must_use]
    pub fn new(source: &'a str) -> Self {
        Scanner { source, pos: 0 }
    }

    #[inline]
    #[must_use]
    pub fn pos(&self) -> usize {
        self.pos
    }

    #[inline]
    #[must_use]
    pub fn tail(&self) -> &'a str {
        &self.source[self.pos..]
    }

    #[inline]
    #[must_use]
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    /// Consume the match of `pattern` when it starts exactly at the cursor.
    ///
    /// Returns `""` when the pattern does not match at the cursor.
    pub fn scan(&mut self, pattern: &Regex) -> &'a str {
        let tail = self.tail();
        match pattern.find(tail) {
            Some(m) if m.start() == 0 => {
                self.pos += m.end();
                &tail[..m.end()]
            }
            _ => "",
        }
    }

    /// Consume everything before the first match of `pattern`, or the whole
    /// remainder when there is none.
    pub fn scan_until(&mut self, pattern: &Regex) -> &'a str {
        let tail = self.tail();
        let end = pattern.find(tail).map_or(tail.len(), |m| m.start());
        self.pos += end;
        &tail[..end]
    }
}
