//! Line/column and byte-offset conversion over a source buffer.
//!
//! Parsers report positions as `(row, column)` pairs plus byte offsets; the
//! chunker works in whole lines. `LineIndex` bridges the two so callers can
//! slice exact source text for any line window.

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Normalized source location.
///
/// Lines are 1-indexed, columns and byte offsets are 0-indexed, and
/// `byte_end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Location {
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
    pub byte_start: usize,
    pub byte_end: usize,
}

impl Location {
    /// Number of lines covered, counting both ends.
    pub fn line_span(&self) -> usize {
        self.end_line.saturating_sub(self.start_line) + 1
    }

    /// Compact `sl:sc:el:ec:bs:be` form used when hashing node identities.
    pub fn fingerprint(&self) -> String {
        format!(
            "{}:{}:{}:{}:{}:{}",
            self.start_line,
            self.start_col,
            self.end_line,
            self.end_col,
            self.byte_start,
            self.byte_end
        )
    }

    /// Whether `other` lies entirely within this location.
    pub fn encloses(&self, other: &Location) -> bool {
        self.byte_start <= other.byte_start && other.byte_end <= self.byte_end
    }
}

/// Precomputed line starts for a source buffer.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self {
            line_starts,
            len: source.len(),
        }
    }

    /// Number of lines, where a trailing newline does not open a new line.
    pub fn line_count(&self) -> usize {
        match self.line_starts.last() {
            Some(&last) if last == self.len && self.line_starts.len() > 1 => {
                self.line_starts.len() - 1
            }
            _ => self.line_starts.len(),
        }
    }

    /// Byte offset where a 1-indexed line starts.
    pub fn line_start(&self, line: usize) -> Option<usize> {
        line.checked_sub(1)
            .and_then(|idx| self.line_starts.get(idx))
            .copied()
    }

    /// Byte offset of the end of a 1-indexed line, excluding its newline.
    pub fn line_end(&self, line: usize) -> Option<usize> {
        self.line_start(line)?;
        let end = match self.line_starts.get(line) {
            Some(&next) => next - 1,
            None => self.len,
        };
        Some(end)
    }

    /// Byte offset for a 1-indexed line and 0-indexed column.
    ///
    /// Returns `None` when the column runs past the end of the line.
    pub fn offset(&self, line: usize, col: usize) -> Option<usize> {
        let start = self.line_start(line)?;
        let end = self.line_end(line)?;
        let offset = start + col;
        (offset <= end).then_some(offset)
    }

    /// 1-indexed line and 0-indexed column for a byte offset.
    pub fn position(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.len);
        let idx = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        (idx + 1, offset - self.line_starts[idx])
    }

    /// Build a `Location` from a byte range.
    pub fn location(&self, range: Range<usize>) -> Location {
        let (start_line, start_col) = self.position(range.start);
        let (end_line, end_col) = self.position(range.end);
        Location {
            start_line,
            start_col,
            end_line,
            end_col,
            byte_start: range.start,
            byte_end: range.end,
        }
    }

    /// Byte range covering whole lines `start..=end`, without the final newline.
    pub fn lines_range(&self, start: usize, end: usize) -> Option<Range<usize>> {
        Some(self.line_start(start)?..self.line_end(end)?)
    }
}

/// Slice `source` at a location, returning an empty string on bad bounds.
pub fn slice<'a>(source: &'a str, loc: &Location) -> &'a str {
    source.get(loc.byte_start..loc.byte_end).unwrap_or("")
}

/// First non-empty line of `text`, trimmed and cut to `max_chars`.
pub fn first_line(text: &str, max_chars: usize) -> String {
    let line = text
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("");
    truncate(line, max_chars)
}

/// Cut `text` to at most `max_chars` characters on a char boundary.
pub fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Identifier-like tokens (`[A-Za-z_][A-Za-z0-9_]*`) in source order.
pub fn identifier_tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| t.chars().next().is_some_and(|c| c.is_alphabetic() || c == '_'))
}
