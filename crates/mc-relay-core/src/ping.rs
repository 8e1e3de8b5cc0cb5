//! Status-ping payload rewriting.
//!
//! The proxy only touches the `version` object of the status JSON so the
//! client believes the server speaks its protocol; every other field is
//! carried through byte-for-byte semantically (unknown fields included).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use mc_relay_proto::ProtocolVersion;

use crate::chat::strip_color;
use crate::session::ServerInfo;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusVersion {
    pub name: String,
    pub protocol: i32,
}

/// A status response with the fields the proxy rewrites made explicit
/// and everything else preserved through `flatten`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub version: StatusVersion,
    #[serde(flatten)]
    pub rest: serde_json::Map<String, Value>,
}

/// Rewrite the version object so `client` sees itself as compatible.
pub fn rewrite_status(raw: &str, client: ProtocolVersion) -> Result<String, serde_json::Error> {
    let mut status: StatusResponse = serde_json::from_str(raw)?;
    status.version = StatusVersion {
        name: client.to_string(),
        protocol: client.protocol_id(),
    };
    serde_json::to_string(&status)
}

/// The beta list-ping reply line: motd, online count and player cap
/// joined by the legacy escape character.
pub fn beta_ping_line(info: &ServerInfo) -> String {
    format!(
        "{}\u{a7}{}\u{a7}{}",
        strip_color(&info.motd),
        info.online_players,
        info.max_players
    )
}
