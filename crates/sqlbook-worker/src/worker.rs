//! Request dispatch over the session table.

use std::collections::HashMap;
use std::thread;

use sqlbook_core::{EngineRequest, EngineResponse, QueryResult, RequestBody, ResponseBody};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, trace, warn};

use crate::error::WorkerError;
use crate::exec::{execute_script, list_objects, DEFAULT_ROW_LIMIT};
use crate::session::Session;

/// Owns every session's connection. Not shared: one worker per thread.
#[derive(Default)]
pub struct Worker {
    sessions: HashMap<String, Session>,
}

impl Worker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_session(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
    }

    /// Serve one request. Failures become `error` responses; the response
    /// always echoes the request's session id and token.
    pub fn handle(&mut self, request: &EngineRequest) -> EngineResponse {
        let body = match self.dispatch(request) {
            Ok(body) => body,
            Err(err) => {
                warn!(
                    session = %request.id,
                    kind = request.body.kind(),
                    error = %err,
                    "request failed"
                );
                ResponseBody::Error {
                    message: err.to_string(),
                }
            }
        };
        EngineResponse::reply(request, body)
    }

    fn dispatch(&mut self, request: &EngineRequest) -> Result<ResponseBody, WorkerError> {
        let id = request.id.as_str();
        match &request.body {
            RequestBody::Init { seed } => {
                let session = Session::open(seed.as_ref())?;
                self.sessions.insert(id.to_string(), session);
                debug!(session = id, seeded = seed.is_some(), "init: database created");
                Ok(ResponseBody::Result(QueryResult::status("ready")))
            }
            RequestBody::Reset { seed } => {
                // Close the old connection before opening the new one.
                self.sessions.remove(id);
                let session = Session::open(seed.as_ref())?;
                self.sessions.insert(id.to_string(), session);
                debug!(session = id, seeded = seed.is_some(), "reset: database recreated");
                Ok(ResponseBody::Result(QueryResult::status("reset")))
            }
            RequestBody::Schema => {
                let session = self.session(id)?;
                let objects = list_objects(session.conn())?;
                debug!(session = id, count = objects.len(), "schema: listed objects");
                Ok(ResponseBody::Schema { objects })
            }
            RequestBody::Exec { sql, limit } => {
                let session = self.session(id)?;
                debug!(
                    session = id,
                    len = sql.len(),
                    preview = %sql.chars().take(120).collect::<String>(),
                    "exec: received SQL"
                );
                let limit = limit.unwrap_or(DEFAULT_ROW_LIMIT);
                let result = execute_script(session.conn(), sql, limit)?;
                Ok(ResponseBody::Result(result))
            }
        }
    }

    fn session(&self, id: &str) -> Result<&Session, WorkerError> {
        self.sessions.get(id).ok_or(WorkerError::NoSession)
    }
}

/// Both ends of a running engine thread.
///
/// Dropping `requests` stops the thread once queued requests are served.
pub struct EngineHandle {
    pub requests: UnboundedSender<EngineRequest>,
    pub responses: UnboundedReceiver<EngineResponse>,
}

/// Start a worker on its own OS thread.
///
/// Requests are served strictly in arrival order. The thread exits when the
/// request channel closes or nobody is listening for responses any more.
pub fn spawn() -> Result<EngineHandle, WorkerError> {
    let (req_tx, mut req_rx) = mpsc::unbounded_channel::<EngineRequest>();
    let (resp_tx, resp_rx) = mpsc::unbounded_channel::<EngineResponse>();

    thread::Builder::new()
        .name("sqlbook-worker".to_string())
        .spawn(move || {
            let mut worker = Worker::new();
            while let Some(request) = req_rx.blocking_recv() {
                trace!(
                    session = %request.id,
                    client = %request.client,
                    kind = request.body.kind(),
                    "request received"
                );
                let response = worker.handle(&request);
                if resp_tx.send(response).is_err() {
                    debug!("response channel closed; stopping worker");
                    break;
                }
            }
            debug!(sessions = worker.sessions.len(), "worker stopped");
        })?;

    Ok(EngineHandle {
        requests: req_tx,
        responses: resp_rx,
    })
}
