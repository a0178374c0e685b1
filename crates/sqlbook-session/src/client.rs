//! Request/response correlation over an engine's channel pair.
//!
//! Every outbound request gets a fresh token. The token is registered in a
//! pending table together with a one-shot reply slot before the request is
//! sent; a dispatcher task routes each inbound response to the slot its token
//! names. Responses with an unknown token (timed out, or meant for another
//! client) are dropped.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use sqlbook_core::{
    EngineRequest, EngineResponse, QueryResult, RequestBody, ResponseBody, SchemaObject, Seed,
};
use sqlbook_worker::EngineHandle;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::error::SessionError;

type Pending = Arc<Mutex<HashMap<String, oneshot::Sender<ResponseBody>>>>;

fn lock(pending: &Pending) -> MutexGuard<'_, HashMap<String, oneshot::Sender<ResponseBody>>> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Deregisters a token when its request finishes, times out or is dropped.
struct PendingSlot<'a> {
    pending: &'a Pending,
    token: &'a str,
}

impl Drop for PendingSlot<'_> {
    fn drop(&mut self) {
        lock(self.pending).remove(self.token);
    }
}

/// Cloneable handle for talking to one engine.
#[derive(Clone)]
pub struct EngineClient {
    requests: UnboundedSender<EngineRequest>,
    pending: Pending,
    timeout: Duration,
}

impl EngineClient {
    /// Take over an engine's channels and start routing its responses.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn connect(handle: EngineHandle, timeout: Duration) -> Self {
        let EngineHandle {
            requests,
            responses,
        } = handle;
        let pending = Pending::default();
        tokio::spawn(dispatch(responses, Arc::clone(&pending)));
        Self {
            requests,
            pending,
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Requests sent and not yet answered or timed out.
    pub fn pending_requests(&self) -> usize {
        lock(&self.pending).len()
    }

    /// Send one request and wait for the response carrying its token.
    pub async fn request(
        &self,
        session: &str,
        body: RequestBody,
    ) -> Result<ResponseBody, SessionError> {
        let kind = body.kind();
        let token = format!("{kind}-{}", Uuid::new_v4());
        let (reply_tx, reply_rx) = oneshot::channel();
        lock(&self.pending).insert(token.clone(), reply_tx);
        let _slot = PendingSlot {
            pending: &self.pending,
            token: &token,
        };

        let request = EngineRequest {
            id: session.to_string(),
            client: token.clone(),
            body,
        };
        if self.requests.send(request).is_err() {
            return Err(SessionError::Disconnected);
        }

        match tokio::time::timeout(self.timeout, reply_rx).await {
            Ok(Ok(body)) => Ok(body),
            Ok(Err(_)) => Err(SessionError::Disconnected),
            Err(_) => {
                let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
                warn!(session, client = %token, timeout_ms, "engine request timed out");
                Err(SessionError::Timeout { kind, timeout_ms })
            }
        }
    }

    pub async fn init(&self, session: &str, seed: Option<Seed>) -> Result<(), SessionError> {
        self.expect_result(session, RequestBody::Init { seed }).await.map(drop)
    }

    pub async fn reset(&self, session: &str, seed: Option<Seed>) -> Result<(), SessionError> {
        self.expect_result(session, RequestBody::Reset { seed }).await.map(drop)
    }

    pub async fn exec(
        &self,
        session: &str,
        sql: &str,
        limit: Option<usize>,
    ) -> Result<QueryResult, SessionError> {
        let body = RequestBody::Exec {
            sql: sql.to_string(),
            limit,
        };
        self.expect_result(session, body).await
    }

    /// User tables and views of the session's database.
    pub async fn schema(&self, session: &str) -> Result<Vec<SchemaObject>, SessionError> {
        match self.request(session, RequestBody::Schema).await? {
            ResponseBody::Schema { objects } => Ok(objects),
            ResponseBody::Error { message } => Err(SessionError::Engine(message)),
            other => Err(SessionError::UnexpectedResponse {
                request: "schema",
                expected: "schema",
                got: other.kind(),
            }),
        }
    }

    async fn expect_result(
        &self,
        session: &str,
        body: RequestBody,
    ) -> Result<QueryResult, SessionError> {
        let request = body.kind();
        match self.request(session, body).await? {
            ResponseBody::Result(result) => Ok(result),
            ResponseBody::Error { message } => Err(SessionError::Engine(message)),
            other => Err(SessionError::UnexpectedResponse {
                request,
                expected: "result",
                got: other.kind(),
            }),
        }
    }
}

async fn dispatch(mut responses: UnboundedReceiver<EngineResponse>, pending: Pending) {
    while let Some(response) = responses.recv().await {
        let slot = lock(&pending).remove(&response.client);
        match slot {
            // The waiter may have timed out between lookup and send.
            Some(reply) => {
                let _ = reply.send(response.body);
            }
            None => trace!(
                session = %response.id,
                client = %response.client,
                "dropping response with unknown token"
            ),
        }
    }
    // Wake every waiter with a closed slot.
    lock(&pending).clear();
    debug!("engine response channel closed");
}
