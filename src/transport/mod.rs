//! # Transport Adapters
//!
//! Splices the preamble stage into an async accept path and owns the
//! per-connection context whose effective remote address the stage rebinds.

pub mod tcp;

pub use tcp::{ConnectionContext, PreambleStream};
