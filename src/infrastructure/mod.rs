//! Infrastructure layer - External service integrations
//!
//! This layer contains:
//! - the `MultisigClient` capability and its alloy implementation
//! - the Tokio runtime bridge that runs reads, writes and refreshes

pub mod ethereum;
pub mod runtime;
