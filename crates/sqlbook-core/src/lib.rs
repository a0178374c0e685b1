pub mod catalog;
pub mod completion;
pub mod error;
pub mod parser;
pub mod types;

// Re-export main types and functions
pub use catalog::{
    ColumnDetail, ColumnInfo, ForeignKey, ObjectDetails, ObjectKind, SchemaCatalog, SchemaObject,
};
pub use completion::{completion_context, completion_items};
pub use error::ParseError;
pub use parser::{changes_schema, parse_sql, split_statements};

// Re-export types explicitly
pub use types::{
    // Completion types
    ClauseZone,
    CompletionContext,
    CompletionList,
    CompletionRequest,
    CursorPosition,
    // Engine protocol
    EngineRequest,
    EngineResponse,
    QueryResult,
    ReplaceRange,
    RequestBody,
    ResponseBody,
    Seed,
    SuggestionItem,
    SuggestionKind,
};
