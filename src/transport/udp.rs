//! # UDP Query Listener
//!
//! One task owns the socket and runs every datagram through the
//! [`QueryHandler`]. Accepted requests become pending replies queued in
//! arrival order; hooks of later requests may make progress while an earlier
//! one is still waiting, but replies leave the socket strictly in the order
//! their requests arrived. Rejected datagrams never enter the queue.
//!
//! ## Failure isolation
//! Each reply is encoded into its own buffer and sent as one datagram, so a
//! failed send (an oversized full reply, an unreachable peer) costs only that
//! reply. A panic while handling a request or inside a hook drops that reply
//! and the listener keeps serving.
//!
//! ## Backpressure
//! At most `max_pending` replies may be in flight; datagrams arriving beyond
//! that are dropped like any other unanswered query.

use std::any::Any;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use bytes::BytesMut;
use futures::future::BoxFuture;
use futures::stream::FuturesOrdered;
use futures::{FutureExt, StreamExt};
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio_util::codec::Encoder;
use tokio_util::udp::UdpFramed;
use tracing::{debug, error, info, instrument, warn};

use crate::config::QueryConfig;
use crate::core::codec::QueryCodec;
use crate::error::Result;
use crate::protocol::handler::{QueryHandler, Reply};

type PanicPayload = Box<dyn Any + Send>;
type OrderedReply = BoxFuture<'static, (std::result::Result<Reply, PanicPayload>, SocketAddr)>;

/// Bind the configured query address and serve until Ctrl-C
#[instrument(skip(config, handler), fields(address = %config.server.address))]
pub async fn start_server(config: &QueryConfig, handler: Arc<QueryHandler>) -> Result<()> {
    let socket = UdpSocket::bind(&config.server.address).await?;

    // Create internal shutdown channel
    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);

    // Held until the listener returns; only an explicit send shuts it down
    let shutdown_tx_clone = shutdown_tx.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received CTRL+C signal, shutting down");
                let _ = shutdown_tx_clone.send(()).await;
            }
            Err(e) => warn!(error = %e, "Unable to listen for CTRL+C"),
        }
    });

    let result = start_server_with_shutdown(
        socket,
        handler,
        shutdown_rx,
        config.server.max_pending_replies,
    )
    .await;
    drop(shutdown_tx);
    result
}

/// Serve queries on an already-bound socket until `shutdown_rx` receives.
///
/// Dropping every sender does not stop the listener.
#[instrument(skip_all)]
pub async fn start_server_with_shutdown(
    socket: UdpSocket,
    handler: Arc<QueryHandler>,
    mut shutdown_rx: mpsc::Receiver<()>,
    max_pending: usize,
) -> Result<()> {
    let local_addr = socket.local_addr()?;
    info!(address = %local_addr, "Listening for GS4 queries");

    let metrics = handler.metrics().clone();
    let socket = Arc::new(socket);
    let mut inbound = UdpFramed::new(socket.clone(), QueryCodec);
    let mut pending: FuturesOrdered<OrderedReply> = FuturesOrdered::new();
    let mut shutdown_open = true;

    loop {
        tokio::select! {
            signal = shutdown_rx.recv(), if shutdown_open => match signal {
                Some(()) => {
                    info!(in_flight = pending.len(), "Query listener shutting down");
                    metrics.log_metrics();
                    return Ok(());
                }
                None => {
                    shutdown_open = false;
                    debug!("Shutdown channel closed, listener keeps running");
                }
            },

            Some((outcome, peer)) = pending.next(), if !pending.is_empty() => match outcome {
                Ok(reply) => match send_reply(&socket, reply, peer).await {
                    Ok(len) => {
                        metrics.reply_sent();
                        debug!(%peer, bytes = len, "Query reply sent");
                    }
                    Err(e) => {
                        metrics.send_error();
                        warn!(%peer, error = %e, "Failed to send query reply");
                    }
                },
                Err(panic) => {
                    metrics.panicked();
                    error!(%peer, panic = panic_message(&panic), "Query hook panicked, reply dropped");
                }
            },

            frame = inbound.next() => match frame {
                Some(Ok((datagram, peer))) => {
                    metrics.datagram_received(datagram.len() as u64);

                    if pending.len() >= max_pending {
                        metrics.dropped_backpressure();
                        warn!(%peer, in_flight = pending.len(), "Query dropped, too many replies in flight");
                        continue;
                    }

                    let handled = std::panic::catch_unwind(AssertUnwindSafe(|| handler.handle(&datagram, peer)));
                    match handled {
                        Ok(Ok(reply)) => pending.push_back(
                            AssertUnwindSafe(reply)
                                .catch_unwind()
                                .map(move |outcome| (outcome, peer))
                                .boxed(),
                        ),
                        Ok(Err(e)) if e.is_rejection() => warn!(%peer, error = %e, "Query packet rejected"),
                        Ok(Err(e)) => error!(%peer, error = %e, "Query handling failed"),
                        Err(panic) => {
                            metrics.panicked();
                            error!(%peer, panic = panic_message(&panic), "Query handling panicked, request dropped");
                        }
                    }
                }
                Some(Err(e)) => {
                    error!(error = %e, "Error receiving query datagram");
                }
                None => {
                    info!("Query socket closed");
                    return Ok(());
                }
            }
        }
    }
}

/// Encode `reply` into a fresh buffer and send it as one datagram
async fn send_reply(socket: &UdpSocket, reply: Reply, peer: SocketAddr) -> Result<usize> {
    let mut buf = BytesMut::new();
    QueryCodec.encode(reply, &mut buf)?;
    Ok(socket.send_to(&buf, peer).await?)
}

fn panic_message(panic: &PanicPayload) -> &str {
    let literal: Option<&str> = panic.downcast_ref::<&'static str>().copied();
    literal
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
