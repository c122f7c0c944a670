//! TCP accept loop and per-controller session.
//!
//! The engine is borrowed mutably for the whole session, so commands never
//! overlap and no lock guards the simulation. A `close` command ends the
//! server; a dropped connection waits for the next controller.

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::time::Duration;
use tokio_util::codec::Framed;
use tracing::Instrument;

use super::{TraciCodec, TransportError};
use crate::config::ServerSection;
use crate::engine::Engine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The controller sent `close`.
    Closed,
    /// The peer went away without closing.
    Disconnected,
}

pub async fn serve(
    listener: TcpListener,
    engine: &mut Engine,
    cfg: &ServerSection,
) -> Result<(), TransportError> {
    loop {
        let (stream, peer) = listener.accept().await?;
        stream.set_nodelay(true)?;
        let span = tracing::info_span!("session", %peer);
        tracing::info!(parent: &span, "controller connected");

        engine.metrics().sessions_active.inc(&[]);
        let outcome = run_session(stream, engine, cfg).instrument(span.clone()).await;
        engine.metrics().sessions_active.dec(&[]);

        let _enter = span.enter();
        tracing::debug!(metrics = %engine.metrics().render(), "metrics snapshot");
        match outcome {
            Ok(SessionEnd::Closed) => {
                tracing::info!("close requested, shutting down");
                return Ok(());
            }
            Ok(SessionEnd::Disconnected) => tracing::info!("controller disconnected"),
            Err(e) => tracing::warn!(error = %e, "session aborted"),
        }
    }
}

/// Serve one controller until it closes, disconnects or fails.
pub async fn run_session<S>(
    io: S,
    engine: &mut Engine,
    cfg: &ServerSection,
) -> Result<SessionEnd, TransportError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut framed = Framed::new(io, TraciCodec::new(cfg.max_message_bytes));
    let read_timeout = Duration::from_millis(cfg.read_timeout_ms);

    loop {
        let next = match tokio::time::timeout(read_timeout, framed.next()).await {
            Ok(next) => next,
            Err(_) => {
                engine
                    .metrics()
                    .protocol_errors
                    .inc(&[("reason", "timeout")]);
                return Err(TransportError::Timeout(cfg.read_timeout_ms));
            }
        };
        let Some(msg) = next else {
            return Ok(SessionEnd::Disconnected);
        };
        let body = match msg {
            Ok(body) => body,
            Err(e) => {
                engine
                    .metrics()
                    .protocol_errors
                    .inc(&[("reason", e.reason())]);
                return Err(e);
            }
        };

        let reply = engine.handle_message(body);
        framed.send(reply.body).await?;
        if reply.close {
            return Ok(SessionEnd::Closed);
        }
    }
}
