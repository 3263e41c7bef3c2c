use crate::text::{LineIndex, Location};

/// Default maximum lines per chunk.
pub const DEFAULT_MAX_LINES: usize = 60;

/// One line window of a symbol's source.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// 0-based position within the symbol
    pub index: usize,
    /// Number of chunks the symbol was split into
    pub total: usize,
    pub loc: Location,
    pub code: String,
}

impl Chunk {
    pub fn start_line(&self) -> usize {
        self.loc.start_line
    }

    pub fn end_line(&self) -> usize {
        self.loc.end_line
    }
}

/// Splits symbol definitions into bounded, contiguous line windows.
#[derive(Debug, Clone, Copy)]
pub struct SymbolChunker {
    max_lines: usize,
}

impl SymbolChunker {
    /// Create a chunker emitting at most `max_lines` lines per chunk.
    /// A limit of zero is treated as one.
    pub fn new(max_lines: usize) -> Self {
        Self {
            max_lines: max_lines.max(1),
        }
    }

    pub fn max_lines(&self) -> usize {
        self.max_lines
    }

    /// Number of chunks a span of `lines` lines produces.
    pub fn chunk_count(&self, lines: usize) -> usize {
        lines.max(1).div_ceil(self.max_lines)
    }

    /// Split the symbol at `loc` into `ceil(N / max_lines)` windows.
    ///
    /// A symbol that fits is returned whole. Otherwise every window but the
    /// last covers exactly `max_lines` lines; the first and last are clipped
    /// to the symbol's byte range so no text outside the definition leaks in.
    pub fn chunk_symbol(&self, source: &str, lines: &LineIndex, loc: &Location) -> Vec<Chunk> {
        let span = loc.line_span();
        if span <= self.max_lines {
            return vec![Chunk {
                index: 0,
                total: 1,
                loc: *loc,
                code: crate::text::slice(source, loc).to_string(),
            }];
        }

        let total = self.chunk_count(span);
        let mut chunks = Vec::with_capacity(total);
        let mut start = loc.start_line;
        while start <= loc.end_line {
            let end = (start + self.max_lines - 1).min(loc.end_line);
            let Some(range) = lines.lines_range(start, end) else {
                break;
            };
            let byte_start = range.start.max(loc.byte_start);
            let byte_end = range.end.min(loc.byte_end).max(byte_start);
            let chunk_loc = lines.location(byte_start..byte_end);
            chunks.push(Chunk {
                index: chunks.len(),
                total,
                code: source.get(byte_start..byte_end).unwrap_or("").to_string(),
                loc: Location {
                    start_line: start,
                    end_line: end,
                    ..chunk_loc
                },
            });
            start = end + 1;
        }
        chunks
    }
}

impl Default for SymbolChunker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(n: usize) -> String {
        (1..=n).map(|i| format!("line{i}")).collect::<Vec<_>>().join("\n") + "\n"
    }

    fn whole(lines: &LineIndex, first: usize, last: usize) -> Location {
        lines.location(lines.lines_range(first, last).unwrap())
    }

    #[test]
    fn test_small_symbol_is_single_chunk() {
        let source = numbered(10);
        let lines = LineIndex::new(&source);
        let loc = whole(&lines, 2, 5);

        let chunks = SymbolChunker::new(60).chunk_symbol(&source, &lines, &loc);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].loc, loc);
        assert_eq!(chunks[0].code, "line2\nline3\nline4\nline5");
        assert_eq!(chunks[0].total, 1);
    }

    #[test]
    fn test_chunk_count_is_ceiling() {
        let source = numbered(100);
        let lines = LineIndex::new(&source);
        let chunker = SymbolChunker::new(7);

        for n in [1usize, 6, 7, 8, 14, 15, 50, 100] {
            let loc = whole(&lines, 1, n);
            let chunks = chunker.chunk_symbol(&source, &lines, &loc);
            assert_eq!(chunks.len(), n.div_ceil(7), "span of {n} lines");
        }
    }

    #[test]
    fn test_windows_are_contiguous_and_ordered() {
        let source = numbered(25);
        let lines = LineIndex::new(&source);
        let loc = whole(&lines, 3, 25);

        let chunks = SymbolChunker::new(10).chunk_symbol(&source, &lines, &loc);
        let ranges: Vec<_> = chunks.iter().map(|c| (c.start_line(), c.end_line())).collect();
        assert_eq!(ranges, vec![(3, 12), (13, 22), (23, 25)]);

        for pair in chunks.windows(2) {
            assert_eq!(pair[0].end_line() + 1, pair[1].start_line());
            assert!(pair[0].loc.byte_end < pair[1].loc.byte_start);
        }
        assert_eq!(chunks[0].code.lines().next(), Some("line3"));
        assert_eq!(chunks[2].code, "line23\nline24\nline25");
        assert!(chunks.iter().all(|c| c.total == 3));
        assert_eq!(chunks.iter().map(|c| c.index).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn test_partial_first_line_is_clipped() {
        let source = "x = 1; def big():\n a\n b\n c\n";
        let lines = LineIndex::new(source);
        let start = source.find("def").unwrap();
        let loc = lines.location(start..source.len() - 1);

        let chunks = SymbolChunker::new(2).chunk_symbol(source, &lines, &loc);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].code, "def big():\n a");
        assert_eq!(chunks[0].loc.start_col, 7);
        assert_eq!(chunks[1].code, " b\n c");
    }

    #[test]
    fn test_zero_limit_is_one_line_per_chunk() {
        let source = numbered(3);
        let lines = LineIndex::new(&source);
        let loc = whole(&lines, 1, 3);
        let chunks = SymbolChunker::new(0).chunk_symbol(&source, &lines, &loc);
        assert_eq!(chunks.len(), 3);
    }
}
