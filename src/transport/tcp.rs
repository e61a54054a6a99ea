//! Async stream adapter for proxied TCP connections.
//!
//! [`PreambleStream`] wraps the accepted socket, drives the per-connection
//! [`PreambleStage`] on the first reads, and exposes the residual byte
//! stream through plain `AsyncRead`/`AsyncWrite`. Once the stage settles
//! and its released bytes are drained, reads go straight to the socket.
//!
//! The discovered client address is not patched into the socket; it lands
//! on an explicit [`ConnectionContext`] field that application code queries
//! instead of `TcpStream::peer_addr`.

use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use crate::config::PreambleConfig;
use crate::core::addr::ProxyAddr;
use crate::core::Preamble;
use crate::error::{RejectReason, Result};
use crate::protocol::stage::{PreambleStage, Progress};
use crate::utils::metrics;

/// Per-connection context owned by the transport layer.
///
/// `effective_remote` starts as the socket peer and is overwritten exactly
/// once if a preamble is decoded. Everything upstream that wants "who is
/// this client" reads it from here.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionContext {
    peer_addr: SocketAddr,
    effective_remote: SocketAddr,
}

impl ConnectionContext {
    pub fn new(peer_addr: SocketAddr) -> Self {
        Self {
            peer_addr,
            effective_remote: peer_addr,
        }
    }

    /// Address the socket was accepted from (the proxy, when one is present).
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Address upstream code should treat as the connection's remote
    /// endpoint.
    pub fn effective_remote_addr(&self) -> SocketAddr {
        self.effective_remote
    }

    /// Adopt `addr` as the connection's effective remote endpoint.
    pub fn set_effective_remote_addr(&mut self, addr: SocketAddr) {
        self.effective_remote = addr;
    }

    /// True once a preamble has rebound the effective address away from the
    /// socket peer.
    pub fn is_rebound(&self) -> bool {
        self.effective_remote != self.peer_addr
    }
}

/// AsyncRead/AsyncWrite adapter running one preamble stage at the front of
/// a connection.
#[derive(Debug)]
pub struct PreambleStream<S> {
    inner: S,
    stage: PreambleStage,
    /// Bytes the stage has released but the caller has not read yet.
    pending: Bytes,
    context: ConnectionContext,
    preamble: Option<Preamble>,
    settle_timeout: Duration,
}

impl PreambleStream<TcpStream> {
    /// Wrap a freshly accepted TCP connection.
    pub fn accept(stream: TcpStream, config: &PreambleConfig) -> Result<Self> {
        let peer_addr = stream.peer_addr()?;
        debug!(peer = %peer_addr, "connection accepted, awaiting preamble");
        Ok(Self::new(stream, peer_addr, config))
    }
}

impl<S> PreambleStream<S> {
    /// Wrap any byte stream, with `peer_addr` as the pre-rebind remote.
    pub fn new(inner: S, peer_addr: SocketAddr, config: &PreambleConfig) -> Self {
        metrics::global().record_connection();
        Self {
            inner,
            stage: PreambleStage::with_max_len(config.max_preamble_len),
            pending: Bytes::new(),
            context: ConnectionContext::new(peer_addr),
            preamble: None,
            settle_timeout: config.settle_timeout,
        }
    }

    pub fn context(&self) -> &ConnectionContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut ConnectionContext {
        &mut self.context
    }

    /// The decoded preamble, if this connection carried one.
    pub fn preamble(&self) -> Option<&Preamble> {
        self.preamble.as_ref()
    }

    /// True once the stage has reached a terminal verdict.
    pub fn is_settled(&self) -> bool {
        self.stage.is_settled()
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Unwrap the inner stream. Bytes already released by the stage but not
    /// yet read are returned alongside it.
    pub fn into_parts(self) -> (S, Bytes, ConnectionContext) {
        (self.inner, self.pending, self.context)
    }

    fn apply(&mut self, progress: Progress) {
        if self.pending.is_empty() {
            self.pending = progress.forward;
        } else if !progress.forward.is_empty() {
            let mut merged = BytesMut::with_capacity(self.pending.len() + progress.forward.len());
            merged.extend_from_slice(&self.pending);
            merged.extend_from_slice(&progress.forward);
            self.pending = merged.freeze();
        }
        if let Some(preamble) = progress.preamble {
            self.context.set_effective_remote_addr(preamble.addr.src_addr);
            info!(
                client = %preamble.addr.src_addr,
                proxy = %self.context.peer_addr(),
                "adopted proxied client address"
            );
            self.preamble = Some(preamble);
        }
    }
}

impl<S: AsyncRead + Unpin> PreambleStream<S> {
    /// Read until the stage settles, under the configured timeout.
    ///
    /// Returns the discovered address pair, or `None` for a plain
    /// connection. Timeout and EOF both degrade to pass-through; neither
    /// fails the connection, and bytes read along the way stay queued for
    /// the next read.
    pub async fn settle(&mut self) -> Result<Option<ProxyAddr>> {
        match tokio::time::timeout(self.settle_timeout, self.drive_to_settled()).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(
                    peer = %self.context.peer_addr(),
                    timeout = ?self.settle_timeout,
                    "preamble did not settle in time; treating connection as plain"
                );
                let progress = self.stage.settle_inert(RejectReason::Truncated);
                self.apply(progress);
            }
        }
        Ok(self.preamble.map(|p| p.addr))
    }

    async fn drive_to_settled(&mut self) -> io::Result<()> {
        let mut chunk = [0u8; 256];
        while !self.stage.is_settled() {
            let n = self.inner.read(&mut chunk).await?;
            if n == 0 {
                let progress = self.stage.settle_inert(RejectReason::Truncated);
                self.apply(progress);
                break;
            }
            let progress = self.stage.advance(Bytes::copy_from_slice(&chunk[..n]));
            self.apply(progress);
        }
        Ok(())
    }
}

impl<S: AsyncRead + Unpin> AsyncRead for PreambleStream<S> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        loop {
            if !this.pending.is_empty() {
                let n = this.pending.len().min(buf.remaining());
                buf.put_slice(&this.pending.split_to(n));
                return Poll::Ready(Ok(()));
            }

            if this.stage.is_settled() {
                // Drained and settled: the adapter is inert from here on.
                return Pin::new(&mut this.inner).poll_read(cx, buf);
            }

            let mut chunk = [0u8; 256];
            let mut chunk_buf = ReadBuf::new(&mut chunk);
            match Pin::new(&mut this.inner).poll_read(cx, &mut chunk_buf) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Err(e)) => return Poll::Ready(Err(e)),
                Poll::Ready(Ok(())) => {
                    let filled = chunk_buf.filled();
                    let progress = if filled.is_empty() {
                        // EOF mid-preamble: release what was buffered.
                        this.stage.settle_inert(RejectReason::Truncated)
                    } else {
                        this.stage.advance(Bytes::copy_from_slice(filled))
                    };
                    this.apply(progress);
                    // Loop: drain pending, or keep reading while unsettled.
                }
            }
        }
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for PreambleStream<S> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.get_mut().inner).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}
