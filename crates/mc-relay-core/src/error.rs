//! Translation-layer error taxonomy.

use mc_relay_proto::{ProtoError, ProtocolVersion};
use thiserror::Error;

/// Errors a translator or pipeline hop can produce. Decode failures are
/// contained to the packet that caused them; only [`Self::NoBridgeChain`]
/// is a connection-level failure, raised at setup before any packet
/// flows.
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error(transparent)]
    Proto(#[from] ProtoError),

    #[error("malformed status payload: {0}")]
    Status(#[from] serde_json::Error),

    #[error("no bridge chain connects {client} to {server}")]
    NoBridgeChain {
        client: ProtocolVersion,
        server: ProtocolVersion,
    },
}
