//! # Connection Preamble Protocol
//!
//! The per-connection state machine that owns a single detect-then-parse
//! attempt and the pass-through contract toward the application protocol.

pub mod stage;


pub use stage::{PreambleStage, Progress, StageState};
