//! Types for the sqlbook completion and engine APIs.
//!
//! The completion types describe what the analyzer derives from the editor
//! buffer; the protocol types describe the messages exchanged with the SQL
//! engine worker.

mod common;
mod completion;
mod protocol;

pub use common::CursorPosition;
pub use completion::{
    ClauseZone, CompletionContext, CompletionList, CompletionRequest, ReplaceRange,
    SuggestionItem, SuggestionKind,
};
pub use protocol::{EngineRequest, EngineResponse, QueryResult, RequestBody, ResponseBody, Seed};
