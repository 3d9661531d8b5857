//! # daybook-core
//!
//! Core types, errors, and shared defaults for daybook, the service that turns
//! an optional photo and note into a generated daily report.
//!
//! ## Log Level Contract
//!
//! All crates log through `tracing` with `subsystem` and `op` fields.
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | No response from an upstream, requires operator attention |
//! | WARN  | Recoverable issue or degraded fallback applied |
//! | INFO  | Lifecycle events (startup, endpoint published), completions |
//! | DEBUG | Decision points, intermediate values, config choices |

pub mod defaults;
pub mod error;
pub mod models;
pub mod traits;

pub use error::{Error, Result};
pub use models::*;
pub use traits::*;
