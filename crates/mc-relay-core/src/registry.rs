//! Bridge registry and the per-connection translation pipeline.

use bytes::{Bytes, BytesMut};
use mc_relay_proto::{read_packet, write_packet, Direction, PacketData, ProtocolVersion};
use tracing::{debug, warn};

use crate::bridge::VersionBridge;
use crate::dispatch::TranslateOutcome;
use crate::error::TranslateError;
use crate::session::Session;
use crate::versions;

/// All known bridges. Built once at startup and shared read-only.
#[derive(Default)]
pub struct BridgeRegistry {
    bridges: Vec<VersionBridge>,
}

impl BridgeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the shipped bridges.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(versions::beta17_to_14::bridge());
        registry.register(versions::r47_to_5::bridge());
        registry
    }

    pub fn register(&mut self, bridge: VersionBridge) {
        self.bridges.push(bridge);
    }

    /// Resolve the ordered chain from the client's version down to the
    /// server's. Versions form a line, so at most one path exists.
    pub fn resolve(
        &self,
        client: ProtocolVersion,
        server: ProtocolVersion,
    ) -> Result<Pipeline<'_>, TranslateError> {
        let no_chain = || TranslateError::NoBridgeChain { client, server };
        let mut chain = Vec::new();
        let mut current = client;
        while current != server {
            let bridge = self
                .bridges
                .iter()
                .find(|bridge| bridge.from_version() == current)
                .ok_or_else(no_chain)?;
            chain.push(bridge);
            current = bridge.to_version();
            if chain.len() > self.bridges.len() {
                return Err(no_chain());
            }
        }
        Ok(Pipeline {
            chain,
            client,
            server,
        })
    }
}

/// The ordered bridge chain for one connection. An empty chain is a pure
/// passthrough between equal versions.
pub struct Pipeline<'a> {
    chain: Vec<&'a VersionBridge>,
    client: ProtocolVersion,
    server: ProtocolVersion,
}

impl Pipeline<'_> {
    pub fn client_version(&self) -> ProtocolVersion {
        self.client
    }

    pub fn server_version(&self) -> ProtocolVersion {
        self.server
    }

    pub fn hops(&self) -> usize {
        self.chain.len()
    }

    /// Run every hop's connect hooks, client side first.
    pub fn establish(&self, session: &mut Session) {
        for bridge in &self.chain {
            bridge.establish(session);
        }
    }

    pub fn source_version(&self, direction: Direction) -> ProtocolVersion {
        match direction {
            Direction::ClientToServer => self.client,
            Direction::ServerToClient => self.server,
        }
    }

    pub fn target_version(&self, direction: Direction) -> ProtocolVersion {
        match direction {
            Direction::ClientToServer => self.server,
            Direction::ServerToClient => self.client,
        }
    }

    /// Pipe one decoded envelope through every hop. A hop returning the
    /// suppress sentinel short-circuits the rest of the chain.
    pub fn translate(
        &self,
        session: &mut Session,
        direction: Direction,
        mut packet: PacketData,
    ) -> TranslateOutcome {
        let hops: Vec<&VersionBridge> = match direction {
            Direction::ClientToServer => self.chain.iter().copied().collect(),
            Direction::ServerToClient => self.chain.iter().rev().copied().collect(),
        };
        for bridge in hops {
            packet = bridge.translate(session, direction, packet)?;
            if packet.is_suppressed() {
                debug!(?direction, "packet suppressed mid-chain");
                return Ok(packet);
            }
        }
        Ok(packet)
    }

    /// Decode, translate and re-encode one packet's raw bytes. `None`
    /// means nothing is forwarded.
    pub fn run(
        &self,
        session: &mut Session,
        direction: Direction,
        raw: &[u8],
    ) -> Result<Option<Vec<u8>>, TranslateError> {
        let mut bytes = Bytes::copy_from_slice(raw);
        let source = self.source_version(direction);
        let packet = read_packet(source, session.state, direction, &mut bytes)?;
        let transition = session.transition_after(direction, &packet);

        let out = self.translate(session, direction, packet)?;
        let forwarded = if out.is_suppressed() {
            None
        } else {
            let mut buf = BytesMut::new();
            write_packet(
                self.target_version(direction),
                session.state,
                direction,
                &out,
                &mut buf,
            )?;
            Some(buf.to_vec())
        };
        if let Some(next) = transition {
            session.state = next;
        }
        Ok(forwarded)
    }

    /// [`Self::run`] with per-packet containment: failures are logged
    /// and the packet is dropped, never the connection.
    pub fn process(
        &self,
        session: &mut Session,
        direction: Direction,
        raw: &[u8],
    ) -> Option<Vec<u8>> {
        match self.run(session, direction, raw) {
            Ok(out) => out,
            Err(error) => {
                warn!(%error, ?direction, "dropping untranslatable packet");
                None
            }
        }
    }

    /// Encode the session's queued out-of-band packets for sending.
    /// Undecodable queue entries are logged and skipped.
    pub fn encode_outgoing(&self, session: &mut Session) -> Vec<(Direction, Vec<u8>)> {
        let mut encoded = Vec::new();
        for (direction, packet) in session.drain_outgoing() {
            let mut buf = BytesMut::new();
            match write_packet(
                self.target_version(direction),
                session.state,
                direction,
                &packet,
                &mut buf,
            ) {
                Ok(_) => encoded.push((direction, buf.to_vec())),
                Err(error) => {
                    warn!(%error, opcode = packet.opcode, "dropping unencodable queued packet");
                }
            }
        }
        encoded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mc_relay_proto::{FieldValue, ProtocolState, SUPPRESS_OPCODE};
    use ProtocolVersion::{B1_7_3, B1_8_1, R1_7_6, R1_8};

    fn remap_bridge(from: ProtocolVersion, to: ProtocolVersion) -> VersionBridge {
        VersionBridge::new(from, to)
    }

    #[test]
    fn resolves_single_hop_and_identity() {
        let registry = BridgeRegistry::standard();
        assert_eq!(registry.resolve(R1_8, R1_7_6).unwrap().hops(), 1);
        assert_eq!(registry.resolve(B1_8_1, B1_7_3).unwrap().hops(), 1);
        assert_eq!(registry.resolve(R1_8, R1_8).unwrap().hops(), 0);
    }

    #[test]
    fn unconnected_pair_is_refused_at_setup() {
        let registry = BridgeRegistry::standard();
        assert!(matches!(
            registry.resolve(R1_8, B1_7_3),
            Err(TranslateError::NoBridgeChain { .. })
        ));
        assert!(matches!(
            registry.resolve(R1_7_6, R1_8),
            Err(TranslateError::NoBridgeChain { .. })
        ));
    }

    #[test]
    fn multi_hop_chain_runs_every_bridge_in_order() {
        // Synthetic line R1_8 -> R1_7_6 -> B1_8_1, tagging each hop.
        let mut registry = BridgeRegistry::new();
        let mut first = remap_bridge(R1_8, R1_7_6);
        first.table_mut().register(
            ProtocolState::Play,
            Direction::ClientToServer,
            0x40,
            |_: &mut Session, mut packet: PacketData| {
                packet.fields.push(FieldValue::Byte(1));
                Ok(packet)
            },
        );
        first.table_mut().register(
            ProtocolState::Play,
            Direction::ServerToClient,
            0x40,
            |_: &mut Session, mut packet: PacketData| {
                packet.fields.push(FieldValue::Byte(1));
                Ok(packet)
            },
        );
        let mut second = remap_bridge(R1_7_6, B1_8_1);
        second.table_mut().register(
            ProtocolState::Play,
            Direction::ClientToServer,
            0x40,
            |_: &mut Session, mut packet: PacketData| {
                packet.fields.push(FieldValue::Byte(2));
                Ok(packet)
            },
        );
        second.table_mut().register(
            ProtocolState::Play,
            Direction::ServerToClient,
            0x40,
            |_: &mut Session, mut packet: PacketData| {
                packet.fields.push(FieldValue::Byte(2));
                Ok(packet)
            },
        );
        registry.register(first);
        registry.register(second);

        let pipeline = registry.resolve(R1_8, B1_8_1).unwrap();
        assert_eq!(pipeline.hops(), 2);

        let mut session = Session::new(R1_8, B1_8_1);
        session.state = ProtocolState::Play;
        let out = pipeline
            .translate(
                &mut session,
                Direction::ClientToServer,
                PacketData::new(0x40, vec![]),
            )
            .unwrap();
        assert_eq!(out.fields, vec![FieldValue::Byte(1), FieldValue::Byte(2)]);

        // Server-to-client visits the chain in reverse.
        let out = pipeline
            .translate(
                &mut session,
                Direction::ServerToClient,
                PacketData::new(0x40, vec![]),
            )
            .unwrap();
        assert_eq!(out.fields, vec![FieldValue::Byte(2), FieldValue::Byte(1)]);
    }

    #[test]
    fn suppression_short_circuits_later_hops() {
        let mut registry = BridgeRegistry::new();
        let mut first = remap_bridge(R1_8, R1_7_6);
        first.table_mut().register_remap(
            ProtocolState::Play,
            Direction::ClientToServer,
            0x40,
            SUPPRESS_OPCODE,
        );
        let mut second = remap_bridge(R1_7_6, B1_8_1);
        second.table_mut().register(
            ProtocolState::Play,
            Direction::ClientToServer,
            0x40,
            |_: &mut Session, _| panic!("hop after suppression must not run"),
        );
        registry.register(first);
        registry.register(second);

        let pipeline = registry.resolve(R1_8, B1_8_1).unwrap();
        let mut session = Session::new(R1_8, B1_8_1);
        session.state = ProtocolState::Play;
        let out = pipeline
            .translate(
                &mut session,
                Direction::ClientToServer,
                PacketData::new(0x40, vec![]),
            )
            .unwrap();
        assert!(out.is_suppressed());
    }

    #[test]
    fn run_drops_malformed_packets_without_error_escape() {
        let registry = BridgeRegistry::standard();
        let pipeline = registry.resolve(R1_8, R1_7_6).unwrap();
        let mut session = Session::new(R1_8, R1_7_6);
        session.state = ProtocolState::Play;
        // Opcode 0x04 declares doubles but the body is empty.
        assert!(pipeline
            .run(&mut session, Direction::ClientToServer, &[0x04])
            .is_err());
        assert!(pipeline
            .process(&mut session, Direction::ClientToServer, &[0x04])
            .is_none());
    }
}
