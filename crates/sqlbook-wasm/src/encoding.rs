//! Column and offset conversion between UTF-16 and the core's units.
//!
//! JavaScript editors (Monaco included) count columns and offsets in UTF-16
//! code units. The core counts columns in characters and offsets in UTF-8
//! bytes. Conversion happens here, at the WASM boundary, so the core never
//! has to know which host it serves.

use serde::{Deserialize, Serialize};
use sqlbook_core::{CursorPosition, ReplaceRange};

/// Unit in which the host counts columns and offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Characters for columns, UTF-8 bytes for offsets.
    #[default]
    Utf8,
    /// UTF-16 code units for both.
    Utf16,
}

/// Text of a 1-based line, without its newline. Missing lines are empty.
fn line_text(text: &str, line: usize) -> &str {
    text.split('\n').nth(line.saturating_sub(1)).unwrap_or("")
}

/// 1-based UTF-16 column on `line` to a 1-based character column.
///
/// A column inside a surrogate pair moves past the pair. Columns beyond the
/// end of the line keep their overshoot so the core clamps them as usual.
pub fn utf16_to_char_column(line: &str, utf16_column: usize) -> usize {
    let target = utf16_column.saturating_sub(1);
    let mut units = 0;
    for (chars, ch) in line.chars().enumerate() {
        if units >= target {
            return chars + 1;
        }
        units += ch.len_utf16();
    }
    line.chars().count() + 1 + target.saturating_sub(units)
}

/// 1-based character column on `line` to a 1-based UTF-16 column.
pub fn char_to_utf16_column(line: &str, char_column: usize) -> usize {
    let chars = char_column.saturating_sub(1);
    let units: usize = line.chars().take(chars).map(char::len_utf16).sum();
    let overshoot = chars.saturating_sub(line.chars().count());
    units + overshoot + 1
}

/// Host cursor to core cursor.
pub fn position_from_host(
    text: &str,
    position: CursorPosition,
    encoding: Encoding,
) -> CursorPosition {
    match encoding {
        Encoding::Utf8 => position,
        Encoding::Utf16 => CursorPosition::new(
            position.line,
            utf16_to_char_column(line_text(text, position.line), position.column),
        ),
    }
}

/// Core replace range to host columns.
pub fn range_to_host(text: &str, range: ReplaceRange, encoding: Encoding) -> ReplaceRange {
    match encoding {
        Encoding::Utf8 => range,
        Encoding::Utf16 => {
            let line = line_text(text, range.line);
            ReplaceRange {
                line: range.line,
                start_column: char_to_utf16_column(line, range.start_column),
                end_column: char_to_utf16_column(line, range.end_column),
            }
        }
    }
}

/// UTF-8 byte offset to a UTF-16 offset. Offsets past the end clamp to the
/// end; offsets inside a character count that character as passed.
pub fn utf8_to_utf16_offset(text: &str, utf8_offset: usize) -> usize {
    text.char_indices()
        .take_while(|(idx, _)| *idx < utf8_offset)
        .map(|(_, ch)| ch.len_utf16())
        .sum()
}

/// Byte offset in the host's encoding.
pub fn offset_to_host(text: &str, utf8_offset: usize, encoding: Encoding) -> usize {
    match encoding {
        Encoding::Utf8 => utf8_offset.min(text.len()),
        Encoding::Utf16 => utf8_to_utf16_offset(text, utf8_offset),
    }
}
