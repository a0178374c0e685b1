use crate::error::ParseError;
use sqlparser::ast::Statement;
use sqlparser::dialect::SQLiteDialect;
use sqlparser::keywords::Keyword;
use sqlparser::parser::Parser;
use sqlparser::tokenizer::{Location, Token, TokenWithSpan, Tokenizer};

/// Parse SQL with the SQLite dialect.
pub fn parse_sql(sql: &str) -> Result<Vec<Statement>, ParseError> {
    Ok(Parser::parse_sql(&SQLiteDialect {}, sql)?)
}

/// Whether a script contains a statement that changes the schema
/// (`CREATE`, `DROP` or `ALTER`).
///
/// Looks at the first word of every statement so scripts that do not parse
/// in full still count. Falls back to a plain `;` split when the script
/// cannot even be tokenized (e.g. an unterminated string).
pub fn changes_schema(sql: &str) -> bool {
    let dialect = SQLiteDialect {};
    let Ok(tokens) = Tokenizer::new(&dialect, sql).tokenize() else {
        return sql.split(';').any(|statement| {
            statement
                .split_whitespace()
                .next()
                .is_some_and(is_schema_keyword_text)
        });
    };

    let mut at_statement_start = true;
    for token in tokens {
        match token {
            Token::Whitespace(_) => {}
            Token::SemiColon => at_statement_start = true,
            Token::Word(word) if at_statement_start => {
                if matches!(word.keyword, Keyword::CREATE | Keyword::DROP | Keyword::ALTER) {
                    return true;
                }
                at_statement_start = false;
            }
            _ => at_statement_start = false,
        }
    }
    false
}

/// Split a script into statements on top-level `;`.
///
/// Semicolons inside literals, quoted names and comments do not split.
/// Statements are cut from the original text, so quoting and escapes come
/// back exactly as written. Statements holding only whitespace and comments
/// are skipped. A script that cannot be tokenized comes back whole.
pub fn split_statements(sql: &str) -> Vec<String> {
    let dialect = SQLiteDialect {};
    let Ok(tokens) = Tokenizer::new(&dialect, sql).tokenize_with_location() else {
        let whole = sql.trim();
        return if whole.is_empty() {
            Vec::new()
        } else {
            vec![whole.to_string()]
        };
    };

    let line_starts = line_start_offsets(sql);
    let mut statements = Vec::new();
    let mut start = 0;
    let mut has_code = false;
    for TokenWithSpan { token, span } in tokens {
        match token {
            Token::SemiColon => {
                let end = location_to_offset(sql, &line_starts, span.start).max(start);
                if has_code {
                    statements.push(sql[start..end].trim().to_string());
                }
                start = (end + 1).min(sql.len());
                has_code = false;
            }
            Token::Whitespace(_) | Token::EOF => {}
            _ => has_code = true,
        }
    }
    if has_code {
        statements.push(sql[start..].trim().to_string());
    }
    statements
}

/// Byte offset of the first character of every line.
fn line_start_offsets(sql: &str) -> Vec<usize> {
    std::iter::once(0)
        .chain(sql.match_indices('\n').map(|(idx, _)| idx + 1))
        .collect()
}

/// Byte offset of a tokenizer location (1-based line, 1-based column in
/// characters). Clamped to the end of the text.
fn location_to_offset(sql: &str, line_starts: &[usize], location: Location) -> usize {
    let line = usize::try_from(location.line).unwrap_or(usize::MAX);
    let Some(&line_start) = line.checked_sub(1).and_then(|idx| line_starts.get(idx)) else {
        return sql.len();
    };
    let column = usize::try_from(location.column).unwrap_or(usize::MAX);
    sql[line_start..]
        .char_indices()
        .nth(column.saturating_sub(1))
        .map_or(sql.len(), |(idx, _)| line_start + idx)
}

fn is_schema_keyword_text(word: &str) -> bool {
    ["CREATE", "DROP", "ALTER"]
        .iter()
        .any(|keyword| word.eq_ignore_ascii_case(keyword))
}
