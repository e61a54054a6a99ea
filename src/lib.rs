//! # proxy-preamble
//!
//! Detection and decoding of HAProxy PROXY protocol preambles (v1 text and
//! v2 binary) on the first bytes of an accepted TCP connection.
//!
//! A service behind a layer-4 proxy sees the proxy's address on every
//! socket; the proxy prepends a preamble carrying the real client address.
//! This crate classifies the first bytes of each connection, decodes the
//! address pair when a preamble is present, and hands every remaining byte
//! through untouched. Any ambiguity fails open to plain traffic: a
//! malformed preamble never becomes a trusted address, only bytes the
//! application sees as-is.
//!
//! ## Layers
//! - [`core`]: pure parsers (detection, v1 text, v2 binary, address codec)
//! - [`protocol`]: the per-connection settle-once state machine
//! - [`transport`]: async stream adapter and the rebindable connection
//!   context
//!
//! ## Example
//! ```no_run
//! use proxy_preamble::config::PreambleConfig;
//! use proxy_preamble::transport::PreambleStream;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> proxy_preamble::Result<()> {
//!     let config = PreambleConfig::default();
//!     let listener = TcpListener::bind("0.0.0.0:9000").await?;
//!     loop {
//!         let (socket, _) = listener.accept().await?;
//!         let mut conn = PreambleStream::accept(socket, &config)?;
//!         conn.settle().await?;
//!         // Everything upstream asks the context, not the socket.
//!         let client = conn.context().effective_remote_addr();
//!         tracing::info!(%client, "serving connection");
//!     }
//! }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod transport;
pub mod utils;

pub use crate::config::PreambleConfig;
pub use crate::core::addr::ProxyAddr;
pub use crate::core::detect::Detection;
pub use crate::core::{ParseOutcome, Preamble};
pub use crate::error::{PreambleError, RejectReason, Result};
pub use crate::protocol::stage::{PreambleStage, Progress, StageState};
pub use crate::transport::{ConnectionContext, PreambleStream};
