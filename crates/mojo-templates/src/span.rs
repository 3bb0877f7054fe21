use serde::Serialize;

/// Byte range within a template source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    pub start: u32,
    pub length: u32,
}

impl Span {
    #[must_use]
    pub fn new(start: u32, length: u32) -> Self {
        Self { start, length }
    }

    /// Build a span from two byte offsets, clamping at `u32::MAX`.
    #[must_use]
    pub fn from_bounds(start: usize, end: usize) -> Self {
        let start = usize_to_u32(start);
        let end = usize_to_u32(end).max(start);
        Self::new(start, end - start)
    }

    #[must_use]
    pub fn end(self) -> u32 {
        self.start.saturating_add(self.length)
    }

    #[must_use]
    pub fn start_usize(self) -> usize {
        self.start as usize
    }

    #[must_use]
    pub fn end_usize(self) -> usize {
        self.end() as usize
    }

    /// Slice `source` by this span, or `""` if the span falls outside it.
    #[must_use]
    pub fn slice(self, source: &str) -> &str {
        source
            .get(self.start_usize()..self.end_usize())
            .unwrap_or_default()
    }
}

/// Saturating conversion from `usize` to `u32`, clamping at `u32::MAX`.
pub(crate) fn usize_to_u32(val: usize) -> u32 {
    u32::try_from(val).unwrap_or(u32::MAX)
}
