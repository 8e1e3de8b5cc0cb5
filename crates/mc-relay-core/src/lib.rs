//! Translation engine for the protocol relay: dispatch tables, version
//! bridges and bridge chains, per-connection session state, the world
//! cache, and the stateful fixups that reconstruct fields one protocol
//! carries and the other does not.
//!
//! The crate performs no I/O. The transport hands in one length-framed
//! packet at a time per direction and forwards (or drops) whatever the
//! pipeline returns, plus any out-of-band packets queued on the session.

pub mod bridge;
pub mod chat;
pub mod dispatch;
pub mod error;
pub mod ping;
pub mod registry;
pub mod session;
pub mod trackers;
pub mod versions;
pub mod world;

pub use bridge::VersionBridge;
pub use dispatch::{PacketTranslator, TranslatorTable};
pub use error::TranslateError;
pub use registry::{BridgeRegistry, Pipeline};
pub use session::{ServerInfo, Session, SessionStore};
pub use world::BlockStorage;
