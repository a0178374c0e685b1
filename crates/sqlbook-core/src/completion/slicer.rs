//! Cursor-to-statement slicing.
//!
//! Statements are delimited by `;` only. Semicolons inside string literals
//! and comments are not special; a cursor inside `'a;b'` slices the literal.

use serde::Serialize;

use crate::types::{CursorPosition, ReplaceRange};

/// The statement surrounding a cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementSlice<'a> {
    pub text: &'a str,
    /// Byte offset of `text` within the full buffer.
    pub offset: usize,
}

impl StatementSlice<'_> {
    pub fn end(&self) -> usize {
        self.offset + self.text.len()
    }

    /// Whether a buffer offset falls inside this statement (end inclusive).
    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.offset && offset <= self.end()
    }
}

/// Convert a 1-based line/column cursor to a byte offset.
///
/// Lines past the end clamp to the end of the text; columns past the end of
/// their line clamp to the line end. Line 0 and column 0 are treated as 1.
pub fn cursor_to_offset(text: &str, position: CursorPosition) -> usize {
    let target_line = position.line.max(1);
    let target_column = position.column.max(1);

    let mut line_start = 0;
    for _ in 1..target_line {
        match text[line_start..].find('\n') {
            Some(newline) => line_start += newline + 1,
            None => return text.len(),
        }
    }

    let line_end = text[line_start..]
        .find('\n')
        .map_or(text.len(), |newline| line_start + newline);
    let line = &text[line_start..line_end];

    line.char_indices()
        .nth(target_column - 1)
        .map_or(line_end, |(idx, _)| line_start + idx)
}

/// Slice the statement containing a byte offset.
///
/// The statement runs from just after the nearest `;` before `offset` to the
/// nearest `;` at or after it. An offset past the end clamps to the end.
pub fn slice_statement_at_offset(text: &str, offset: usize) -> StatementSlice<'_> {
    let mut offset = offset.min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }

    let start = text[..offset].rfind(';').map_or(0, |idx| idx + 1);
    let end = text[offset..]
        .find(';')
        .map_or(text.len(), |idx| offset + idx);

    StatementSlice {
        text: &text[start..end],
        offset: start,
    }
}

pub fn slice_statement_at_cursor(text: &str, position: CursorPosition) -> StatementSlice<'_> {
    slice_statement_at_offset(text, cursor_to_offset(text, position))
}

pub(crate) fn is_identifier_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$'
}

/// The partially typed word ending at the cursor, as a range on the cursor's
/// line. Empty (start == end) when the cursor does not follow an identifier
/// character.
pub fn word_range_at_cursor(text: &str, position: CursorPosition) -> ReplaceRange {
    let offset = cursor_to_offset(text, position);
    let line_start = text[..offset].rfind('\n').map_or(0, |idx| idx + 1);
    let before = &text[line_start..offset];

    let end_column = before.chars().count() + 1;
    let word_len = before
        .chars()
        .rev()
        .take_while(|ch| is_identifier_char(*ch))
        .count();

    ReplaceRange {
        line: text[..line_start].matches('\n').count() + 1,
        start_column: end_column - word_len,
        end_column,
    }
}
