// SPDX-License-Identifier: MIT
//! WebSocket command transport.
//!
//! One task per connection reads frames off the socket; one worker task per
//! connection owns the `Session` and drains a command queue in arrival
//! order, which is what makes per-session serialization structural rather
//! than lock-based. Results travel back over an outbound channel so the
//! worker never touches the socket. Different connections are fully
//! independent.

pub mod dispatch;
pub mod handlers;
pub mod results;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use anyhow::Result;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::cancel::CancelSignal;
use crate::ipc::results::{ChannelSink, ServerResult};
use crate::AppContext;

/// Frames queued per connection before the reader applies backpressure.
const COMMAND_QUEUE_DEPTH: usize = 256;

// ─── Server ──────────────────────────────────────────────────────────────────

pub async fn run(ctx: Arc<AppContext>) -> Result<()> {
    let addr = format!("{}:{}", ctx.config.bind_address, ctx.config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!(addr = %addr, "glassd listening (WebSocket + HTTP health on same port)");

    // Graceful shutdown: resolve on SIGTERM (Unix) or Ctrl-C (all platforms).
    // Pinned so we can use it in the select! loop without moving.
    let shutdown = make_shutdown_future();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown => {
                info!("shutdown signal received — stopping server");
                break;
            }

            conn = listener.accept() => {
                let (stream, peer) = match conn {
                    Ok(c) => c,
                    Err(e) => {
                        error!(err = %e, "accept error");
                        continue;
                    }
                };
                debug!(peer = %peer, "new connection");
                let ctx = ctx.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, ctx).await {
                        warn!(peer = %peer, err = %e, "connection error");
                    }
                });
            }
        }
    }

    info!("server stopped");
    Ok(())
}

/// Respond to an HTTP `GET /health` request with a JSON status document.
///
/// The daemon shares its port for both WebSocket and a plain HTTP health
/// endpoint so clients can check liveness without a WS library.
async fn handle_health_check(mut stream: tokio::net::TcpStream, ctx: &AppContext) -> Result<()> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    // Consume the request (we don't inspect it — any GET /health is fine).
    let mut req_buf = vec![0u8; 2048];
    let _ = stream.read(&mut req_buf).await;

    let uptime_secs = ctx.started_at.elapsed().as_secs();
    let body = serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime": uptime_secs,
        "activeSessions": ctx.active_session_count(),
        "port": ctx.config.port,
    });
    let body_str = body.to_string();
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body_str.len(),
        body_str
    );
    stream.write_all(response.as_bytes()).await?;
    Ok(())
}

/// Returns a future that resolves when a shutdown signal is received.
///
/// On Unix we listen for SIGTERM *and* Ctrl-C.
/// On other platforms we listen for Ctrl-C only.
async fn make_shutdown_future() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("failed to register SIGTERM");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.ok();
    }
}

// ─── Connection ──────────────────────────────────────────────────────────────

async fn handle_connection(stream: tokio::net::TcpStream, ctx: Arc<AppContext>) -> Result<()> {
    // Peek at the first bytes to distinguish HTTP health checks from
    // WebSocket upgrades — both share the same port. All other GET requests
    // (including WS upgrades) fall through to the handshake as normal.
    let mut peek_buf = [0u8; 12];
    let n = stream.peek(&mut peek_buf).await.unwrap_or(0);
    if n >= 11 && &peek_buf[..11] == b"GET /health" {
        return handle_health_check(stream, &ctx).await;
    }

    let limit = ctx.config.max_sessions;
    if limit > 0 && ctx.active_session_count() >= limit {
        warn!(limit, "session limit reached, rejecting connection");
        return Ok(());
    }

    let ws = accept_async(stream).await?;
    let (mut ws_sink, mut ws_stream) = ws.split();

    let connection_id = Uuid::new_v4();
    let session = match ctx.create_session().await {
        Ok(session) => session,
        Err(e) => {
            // Session construction is configuration-scoped; tell the client
            // and drop the connection.
            error!(connection = %connection_id, err = %e, "session creation failed");
            let result = ServerResult::Error {
                message: "session creation failed".to_string(),
            };
            let _ = ws_sink
                .send(Message::Text(serde_json::to_string(&result)?))
                .await;
            return Ok(());
        }
    };

    ctx.active_sessions.fetch_add(1, Ordering::SeqCst);
    info!(
        connection = %connection_id,
        language = %session.language().name(),
        "session started"
    );

    let (cmd_tx, cmd_rx) = mpsc::channel::<String>(COMMAND_QUEUE_DEPTH);
    let (out_tx, mut out_rx) = mpsc::channel::<String>(COMMAND_QUEUE_DEPTH);
    let cancel = CancelSignal::new();

    let worker = tokio::spawn(run_session_worker(
        ctx.clone(),
        session,
        cmd_rx,
        out_tx,
        cancel.clone(),
    ));

    loop {
        tokio::select! {
            // Incoming command frame from the client.
            msg = ws_stream.next() => {
                match msg {
                    Some(Ok(Message::Text(frame))) => {
                        if cmd_tx.send(frame).await.is_err() {
                            warn!(connection = %connection_id, "session worker gone");
                            break;
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = ws_sink.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        warn!(connection = %connection_id, err = %e, "ws error");
                        break;
                    }
                    _ => {}
                }
            }
            // Outgoing result from the session worker.
            result = out_rx.recv() => {
                match result {
                    Some(json) => {
                        if let Err(e) = ws_sink.send(Message::Text(json)).await {
                            warn!(connection = %connection_id, err = %e, "send error");
                            break;
                        }
                    }
                    None => break,
                }
            }
        }
    }

    // Connection is gone: cancel whatever command is mid-flight and let the
    // worker drain out.
    cancel.cancel();
    drop(cmd_tx);
    drop(out_rx);
    let _ = worker.await;

    ctx.active_sessions.fetch_sub(1, Ordering::SeqCst);
    info!(connection = %connection_id, "session ended");
    Ok(())
}

/// Owns the session and processes its commands strictly one at a time, in
/// arrival order.
async fn run_session_worker(
    ctx: Arc<AppContext>,
    mut session: crate::session::Session,
    mut cmd_rx: mpsc::Receiver<String>,
    out_tx: mpsc::Sender<String>,
    cancel: CancelSignal,
) {
    let mut sink = ChannelSink::new(out_tx);
    while let Some(frame) = cmd_rx.recv().await {
        if let Err(error) = ctx
            .dispatcher
            .execute(&frame, &mut session, &mut sink, &cancel)
            .await
        {
            // Only sink failures surface here — the connection is gone.
            debug!(err = %error, "session worker stopping");
            break;
        }
    }
}
