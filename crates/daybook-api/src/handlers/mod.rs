//! HTTP handlers.

pub mod completion;
pub mod system;
pub mod uploads;
