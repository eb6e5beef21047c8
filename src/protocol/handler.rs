//! # Query Handler
//!
//! Per-datagram state machine:
//!
//! ```text
//! bytes -> decode -+-> Handshake -> issue token ------------------------> Reply::Handshake
//!                  +-> Stat -> validate token -> assemble -> hook -----> Reply::Stat
//!                  (any failure) -> rejected, no reply
//! ```
//!
//! [`QueryHandler::handle`] does every synchronous step immediately and
//! returns the remaining work as a [`PendingReply`] future. The only await
//! point inside it is the [`QueryHook`]. The transport polls pending replies
//! from the socket's own loop, in arrival order, so the hook's continuation
//! runs back on the channel that received the datagram.

use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};
use tracing::{debug, trace};

use crate::core::packet::{self, QueryRequest};
use crate::error::{QueryError, Result};
use crate::protocol::assembler::ResponseAssembler;
use crate::protocol::response::{QueryKind, QueryResponse};
use crate::protocol::session::ChallengeStore;
use crate::utils::metrics::QueryMetrics;

/// A reply ready for encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Handshake {
        session_id: i32,
        challenge_token: i32,
    },
    Stat {
        session_id: i32,
        kind: QueryKind,
        response: QueryResponse,
    },
}

/// Remaining work for an accepted request
pub type PendingReply = BoxFuture<'static, Reply>;

/// Asynchronous extension point that may replace a stat response.
///
/// The hook cannot change whether the reply is basic or full.
pub trait QueryHook: Send + Sync {
    fn on_query(
        &self,
        kind: QueryKind,
        peer: IpAddr,
        response: QueryResponse,
    ) -> BoxFuture<'static, QueryResponse>;
}

/// Hook that returns the response unchanged
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHook;

impl QueryHook for NoopHook {
    fn on_query(
        &self,
        _kind: QueryKind,
        _peer: IpAddr,
        response: QueryResponse,
    ) -> BoxFuture<'static, QueryResponse> {
        future::ready(response).boxed()
    }
}

impl<F, Fut> QueryHook for F
where
    F: Fn(QueryKind, IpAddr, QueryResponse) -> Fut + Send + Sync,
    Fut: Future<Output = QueryResponse> + Send + 'static,
{
    fn on_query(
        &self,
        kind: QueryKind,
        peer: IpAddr,
        response: QueryResponse,
    ) -> BoxFuture<'static, QueryResponse> {
        self(kind, peer, response).boxed()
    }
}

/// Ties decoding, the session store, assembly and the hook together
pub struct QueryHandler {
    sessions: ChallengeStore,
    assembler: ResponseAssembler,
    hook: Arc<dyn QueryHook>,
    metrics: Arc<QueryMetrics>,
}

impl QueryHandler {
    pub fn new(sessions: ChallengeStore, assembler: ResponseAssembler) -> Self {
        Self {
            sessions,
            assembler,
            hook: Arc::new(NoopHook),
            metrics: Arc::new(QueryMetrics::new()),
        }
    }

    /// Install the mutation hook
    pub fn with_hook(mut self, hook: Arc<dyn QueryHook>) -> Self {
        self.hook = hook;
        self
    }

    /// Share a metrics collector with the transport
    pub fn with_metrics(mut self, metrics: Arc<QueryMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Arc<QueryMetrics> {
        &self.metrics
    }

    pub fn sessions(&self) -> &ChallengeStore {
        &self.sessions
    }

    /// Process one datagram from `sender`.
    ///
    /// Errors are rejections (or a poisoned session store); the caller logs
    /// them and sends nothing.
    pub fn handle(&self, datagram: &[u8], sender: SocketAddr) -> Result<PendingReply> {
        let result = packet::decode(datagram).and_then(|request| self.dispatch(request, sender.ip()));

        match &result {
            Ok(_) => {}
            Err(QueryError::MalformedPacket(_)) => self.metrics.malformed(),
            Err(QueryError::InvalidChallenge) => self.metrics.invalid_challenge(),
            Err(_) => self.metrics.internal_error(),
        }
        result
    }

    fn dispatch(&self, request: QueryRequest, peer: IpAddr) -> Result<PendingReply> {
        match request {
            QueryRequest::Handshake { session_id } => {
                let challenge_token = self.sessions.issue(peer)?;
                self.metrics.handshake();
                trace!(%peer, session_id, "Handshake accepted");

                Ok(future::ready(Reply::Handshake {
                    session_id,
                    challenge_token,
                })
                .boxed())
            }
            QueryRequest::Stat {
                session_id,
                challenge_token,
                kind,
            } => {
                if !self.sessions.validate(peer, challenge_token)? {
                    return Err(QueryError::InvalidChallenge);
                }
                self.metrics.stat(kind);

                let response = self.assembler.build(kind, peer);
                let metrics = self.metrics.clone();
                let original = response.clone();
                let hooked = self.hook.on_query(kind, peer, response);

                Ok(async move {
                    let response = hooked.await;
                    if response != original {
                        metrics.hook_replaced();
                        debug!(%peer, ?kind, "Query response replaced by hook");
                    }
                    Reply::Stat {
                        session_id,
                        kind,
                        response,
                    }
                }
                .boxed())
            }
        }
    }
}
