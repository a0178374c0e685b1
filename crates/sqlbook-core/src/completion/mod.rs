//! SQL completion.
//!
//! Pipeline: slice the statement under the cursor, parse it tolerantly,
//! reduce the tree to a [`StatementShape`](ast_extractor::StatementShape),
//! analyze the cursor context and build ranked suggestions.

pub mod ast_extractor;
pub mod context;
pub mod functions;
pub mod parse_strategies;
pub mod slicer;
pub mod suggestions;

#[cfg(feature = "tracing")]
use tracing::debug;

use crate::catalog::SchemaCatalog;
use crate::types::{CompletionContext, CompletionList, CompletionRequest};
use ast_extractor::{extract_statement_shape, scan_statement_shape, StatementShape};
use context::analyze_context;
use parse_strategies::parse_tolerant;
use slicer::{slice_statement_at_cursor, word_range_at_cursor};
use suggestions::build_suggestions;

/// Maximum SQL input size (10MB) to prevent memory exhaustion.
const MAX_SQL_LENGTH: usize = 10 * 1024 * 1024;

/// Relations of a statement: from the tree when it parses (raw or patched),
/// from a token scan otherwise.
pub(crate) fn statement_shape(statement: &str) -> StatementShape {
    match parse_tolerant(statement) {
        Some(parsed) => {
            #[cfg(feature = "tracing")]
            debug!(strategy = ?parsed.strategy, "statement parsed for completion");
            extract_statement_shape(&parsed.statements)
        }
        None => scan_statement_shape(statement),
    }
}

/// Analyze the cursor context of a completion request.
pub fn completion_context(
    request: &CompletionRequest,
    catalog: &SchemaCatalog,
) -> CompletionContext {
    if request.text.len() > MAX_SQL_LENGTH {
        return CompletionContext::empty();
    }

    let slice = slice_statement_at_cursor(&request.text, request.position);
    let shape = statement_shape(slice.text);
    analyze_context(
        &request.text,
        request.position,
        &slice,
        Some(&shape),
        catalog,
    )
}

/// Ranked completion items for a request, with the range they replace.
pub fn completion_items(request: &CompletionRequest, catalog: &SchemaCatalog) -> CompletionList {
    if request.text.len() > MAX_SQL_LENGTH {
        return CompletionList::from_error(
            request.position,
            format!(
                "SQL exceeds maximum length of {} bytes ({} bytes provided)",
                MAX_SQL_LENGTH,
                request.text.len()
            ),
        );
    }

    let ctx = completion_context(request, catalog);
    #[cfg(feature = "tracing")]
    debug!(zone = ?ctx.clause_zone, target = ?ctx.dot_access_target, "completion context");

    CompletionList {
        items: build_suggestions(&ctx, catalog),
        replace: word_range_at_cursor(&request.text, request.position),
        error: None,
    }
}
