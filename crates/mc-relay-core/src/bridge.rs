//! One version bridge: a dispatch table between two adjacent protocol
//! versions plus the connect hooks that seed its session state.

use mc_relay_proto::{Direction, PacketData, ProtocolVersion};

use crate::dispatch::{TranslateOutcome, TranslatorTable};
use crate::session::Session;

type ConnectHook = Box<dyn Fn(&mut Session) + Send + Sync>;

/// Translates between exactly one adjacent version pair. `from` is the
/// newer, client-facing version; `to` the older, server-facing one.
pub struct VersionBridge {
    from: ProtocolVersion,
    to: ProtocolVersion,
    table: TranslatorTable,
    connect_hooks: Vec<ConnectHook>,
    conditional_hooks: Vec<(ProtocolVersion, ConnectHook)>,
}

impl VersionBridge {
    pub fn new(from: ProtocolVersion, to: ProtocolVersion) -> Self {
        Self {
            from,
            to,
            table: TranslatorTable::new(),
            connect_hooks: Vec::new(),
            conditional_hooks: Vec::new(),
        }
    }

    pub fn from_version(&self) -> ProtocolVersion {
        self.from
    }

    pub fn to_version(&self) -> ProtocolVersion {
        self.to
    }

    /// The bridge's dispatch table, for registration at construction.
    pub fn table_mut(&mut self) -> &mut TranslatorTable {
        &mut self.table
    }

    /// Merge a named translator group's registrations; later groups (and
    /// direct registrations made afterwards) override earlier ones.
    pub fn add_group(&mut self, group: TranslatorTable) {
        self.table.merge(group);
    }

    /// Run on every connection using this bridge.
    pub fn on_connect(&mut self, hook: impl Fn(&mut Session) + Send + Sync + 'static) {
        self.connect_hooks.push(Box::new(hook));
    }

    /// Run only when the connection's final server version matches, so a
    /// bridge can install fixups specific to one downstream version.
    pub fn on_connect_to(
        &mut self,
        server: ProtocolVersion,
        hook: impl Fn(&mut Session) + Send + Sync + 'static,
    ) {
        self.conditional_hooks.push((server, Box::new(hook)));
    }

    pub fn establish(&self, session: &mut Session) {
        for hook in &self.connect_hooks {
            hook(session);
        }
        for (server, hook) in &self.conditional_hooks {
            if session.server_version == *server {
                hook(session);
            }
        }
    }

    /// Version whose layouts the packet arrives in for this direction.
    pub fn source_version(&self, direction: Direction) -> ProtocolVersion {
        match direction {
            Direction::ClientToServer => self.from,
            Direction::ServerToClient => self.to,
        }
    }

    /// Version whose layouts the packet leaves in for this direction.
    pub fn target_version(&self, direction: Direction) -> ProtocolVersion {
        match direction {
            Direction::ClientToServer => self.to,
            Direction::ServerToClient => self.from,
        }
    }

    pub fn translate(
        &self,
        session: &mut Session,
        direction: Direction,
        packet: PacketData,
    ) -> TranslateOutcome {
        self.table.dispatch(session, direction, packet)
    }
}
