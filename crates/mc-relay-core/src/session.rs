//! Per-connection state: identity, protocol versions, connection phase,
//! the out-of-band send queue and the tracker store.

use std::collections::VecDeque;

use mc_relay_proto::{Direction, PacketData, ProtocolEra, ProtocolState, ProtocolVersion};

use crate::trackers::{
    MiningTracker, OnGroundTracker, QuickBarTracker, TabListCache, WindowTypeTracker,
};
use crate::world::BlockStorage;

/// Proxy-side list-ping data, used when answering pings on behalf of a
/// server whose own status format the client cannot read.
#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub motd: String,
    pub max_players: i32,
    pub online_players: i32,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            motd: "A Minecraft Server".to_owned(),
            max_players: 20,
            online_players: 0,
        }
    }
}

/// One tracker slot per kind. Entries are seeded by bridge connect hooks
/// and dropped wholesale with the session.
#[derive(Debug, Default)]
pub struct SessionStore {
    pub on_ground: Option<OnGroundTracker>,
    pub window_types: Option<WindowTypeTracker>,
    pub quick_bar: Option<QuickBarTracker>,
    pub mining: Option<MiningTracker>,
    pub tab_list: Option<TabListCache>,
    pub blocks: Option<BlockStorage>,
}

/// The core's view of one proxied connection.
///
/// Mutable only from the task handling this connection's packets; the
/// core itself never blocks or performs I/O on it.
#[derive(Debug)]
pub struct Session {
    pub username: Option<String>,
    pub client_version: ProtocolVersion,
    pub server_version: ProtocolVersion,
    pub state: ProtocolState,
    pub info: ServerInfo,
    pub store: SessionStore,
    outgoing: VecDeque<(Direction, PacketData)>,
}

impl Session {
    pub fn new(client_version: ProtocolVersion, server_version: ProtocolVersion) -> Self {
        // Beta has no handshake or status phase.
        let state = if client_version.era() == ProtocolEra::Beta {
            ProtocolState::Play
        } else {
            ProtocolState::Handshake
        };
        Self {
            username: None,
            client_version,
            server_version,
            state,
            info: ServerInfo::default(),
            store: SessionStore::default(),
            outgoing: VecDeque::new(),
        }
    }

    /// Queue an out-of-band packet. The transport drains the queue after
    /// each translation and sends in queue order.
    pub fn send_packet(&mut self, direction: Direction, packet: PacketData) {
        self.outgoing.push_back((direction, packet));
    }

    pub fn drain_outgoing(&mut self) -> Vec<(Direction, PacketData)> {
        self.outgoing.drain(..).collect()
    }

    /// The connection-phase change this packet causes, if any. Applied
    /// after the packet is re-encoded, since the packet itself is still
    /// framed under the phase it was sent in.
    pub fn transition_after(
        &self,
        direction: Direction,
        packet: &PacketData,
    ) -> Option<ProtocolState> {
        if self.client_version.era() == ProtocolEra::Beta {
            return None;
        }
        match (self.state, direction, packet.opcode) {
            (ProtocolState::Handshake, Direction::ClientToServer, 0x00) => {
                match packet.var_int(3).ok()? {
                    1 => Some(ProtocolState::Status),
                    2 => Some(ProtocolState::Login),
                    _ => None,
                }
            }
            (ProtocolState::Login, Direction::ServerToClient, 0x02) => Some(ProtocolState::Play),
            _ => None,
        }
    }
}
