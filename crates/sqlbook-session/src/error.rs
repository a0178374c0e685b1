use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Engine did not answer the {kind} request within {timeout_ms} ms")]
    Timeout { kind: &'static str, timeout_ms: u64 },

    /// The engine answered with an `error` response.
    #[error("{0}")]
    Engine(String),

    #[error("Engine is no longer running")]
    Disconnected,

    #[error("Expected a {expected} response to the {request} request, got {got}")]
    UnexpectedResponse {
        request: &'static str,
        expected: &'static str,
        got: &'static str,
    },

    #[error("No such table or view: {0}")]
    UnknownObject(String),

    #[error("Invalid session configuration: {0}")]
    Config(String),
}
