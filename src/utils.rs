/// A utility struct to convert byte offsets to line numbers.
///
/// The tokenizer works with byte offsets into the whole file, but the scanner
/// reasons about lines, so every span has to be mapped back onto a line.
pub struct LineIndex {
    /// Stores the byte index of the start of each line.
    line_starts: Vec<usize>,
}

impl LineIndex {
    /// Creates a new `LineIndex` by scanning the source code for newlines.
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, ch) in source.char_indices() {
            if ch == '\n' {
                // Record the start of the next line (current newline index + 1)
                line_starts.push(i + 1);
            }
        }
        Self { line_starts }
    }

    /// Converts a byte offset to a 0-indexed line.
    pub fn line_of(&self, offset: usize) -> usize {
        // Binary search to find which line range the offset falls into.
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(line) => line - 1,
        }
    }

    /// Byte offset of the first character of a 0-indexed line.
    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.line_starts.get(line).copied()
    }

    /// Number of lines, counting a trailing empty line after a final newline.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

/// Collapses every run of whitespace into a single space and trims the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
