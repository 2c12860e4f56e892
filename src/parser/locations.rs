/// Where a token starts in the source it was lexed from.
///
/// Both counts are in characters, not bytes. `offset` is absolute, `column`
/// is relative to the first character after the last line break, so it is
/// 0-based on every line.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct Position {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub(crate) fn new(offset: usize, line: usize, line_start: usize) -> Self {
        Self {
            offset,
            line,
            column: offset - line_start,
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}
