//! Service layer: endpoint resolution and tunnelling.

pub mod endpoint;
pub mod tunnel;

pub use endpoint::EndpointResolver;
pub use tunnel::{NgrokAgentTunnel, TunnelProvider};
