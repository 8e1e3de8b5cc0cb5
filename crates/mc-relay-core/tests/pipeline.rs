//! End-to-end pipeline runs: raw bytes in one version's framing, out in
//! the other's, through the shipped bridge registry.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use mc_relay_core::{BridgeRegistry, Session};
use mc_relay_proto::{Direction, ProtocolState, ProtocolVersion, VarInt};

fn var_int(buf: &mut BytesMut, value: i32) {
    VarInt(value).encode(buf);
}

fn modern_string(buf: &mut BytesMut, s: &str) {
    var_int(buf, s.len() as i32);
    buf.put_slice(s.as_bytes());
}

#[test]
fn modern_handshake_status_login_sequence() {
    let registry = BridgeRegistry::standard();
    let pipeline = registry
        .resolve(ProtocolVersion::R1_8, ProtocolVersion::R1_7_6)
        .unwrap();
    let mut session = Session::new(ProtocolVersion::R1_8, ProtocolVersion::R1_7_6);
    pipeline.establish(&mut session);

    // Handshake with next-state = status.
    let mut raw = BytesMut::new();
    var_int(&mut raw, 0x00);
    var_int(&mut raw, 47);
    modern_string(&mut raw, "localhost");
    raw.put_u16(25565);
    var_int(&mut raw, 1);

    let out = pipeline
        .run(&mut session, Direction::ClientToServer, &raw)
        .unwrap()
        .expect("handshake forwarded");
    assert_eq!(session.state, ProtocolState::Status);

    // The re-encoded handshake advertises protocol 5.
    let mut bytes = Bytes::copy_from_slice(&out);
    assert_eq!(VarInt::decode(&mut bytes).unwrap().0, 0x00);
    assert_eq!(VarInt::decode(&mut bytes).unwrap().0, 5);

    // Status response travels back rewritten.
    let mut raw = BytesMut::new();
    var_int(&mut raw, 0x00);
    modern_string(
        &mut raw,
        r#"{"version":{"name":"1.7.10","protocol":5},"players":{"max":20,"online":1}}"#,
    );
    let out = pipeline
        .run(&mut session, Direction::ServerToClient, &raw)
        .unwrap()
        .expect("status forwarded");
    let mut bytes = Bytes::copy_from_slice(&out);
    assert_eq!(VarInt::decode(&mut bytes).unwrap().0, 0x00);
    let len = VarInt::decode(&mut bytes).unwrap().0 as usize;
    let json = std::str::from_utf8(&bytes.chunk()[..len]).unwrap();
    let value: serde_json::Value = serde_json::from_str(json).unwrap();
    assert_eq!(value["version"]["protocol"], 47);
    assert_eq!(value["version"]["name"], "1.8");
}

#[test]
fn play_block_change_repacks_position() {
    let registry = BridgeRegistry::standard();
    let pipeline = registry
        .resolve(ProtocolVersion::R1_8, ProtocolVersion::R1_7_6)
        .unwrap();
    let mut session = Session::new(ProtocolVersion::R1_8, ProtocolVersion::R1_7_6);
    pipeline.establish(&mut session);
    session.state = ProtocolState::Play;

    // 1.7 block change: x, y, z, block id VarInt, meta.
    let mut raw = BytesMut::new();
    var_int(&mut raw, 0x23);
    raw.put_i32(100);
    raw.put_u8(64);
    raw.put_i32(-100);
    var_int(&mut raw, 54);
    raw.put_u8(2);

    let out = pipeline
        .run(&mut session, Direction::ServerToClient, &raw)
        .unwrap()
        .expect("block change forwarded");

    let mut bytes = Bytes::copy_from_slice(&out);
    assert_eq!(VarInt::decode(&mut bytes).unwrap().0, 0x23);
    let packed = bytes.get_i64();
    assert_eq!(packed >> 38, 100);
    assert_eq!((packed >> 26) & 4095, 64);
    assert_eq!((packed << 38) >> 38, -100);
    assert_eq!(VarInt::decode(&mut bytes).unwrap().0, 54 << 4 | 2);
}

#[test]
fn identity_pipeline_forwards_use_entity_intact() {
    let registry = BridgeRegistry::standard();
    let pipeline = registry
        .resolve(ProtocolVersion::R1_8, ProtocolVersion::R1_8)
        .unwrap();
    assert_eq!(pipeline.hops(), 0);
    let mut session = Session::new(ProtocolVersion::R1_8, ProtocolVersion::R1_8);
    session.state = ProtocolState::Play;

    // 1.8 use-entity, interact-at: target, action, hit vector.
    let mut raw = BytesMut::new();
    var_int(&mut raw, 0x02);
    var_int(&mut raw, 77);
    var_int(&mut raw, 2);
    raw.put_f32(0.5);
    raw.put_f32(1.0);
    raw.put_f32(-0.25);

    let out = pipeline
        .run(&mut session, Direction::ClientToServer, &raw)
        .unwrap()
        .expect("use entity forwarded");
    assert_eq!(&out[..], &raw[..]);
}

#[test]
fn play_unknown_opcode_errors_and_process_contains_it() {
    let registry = BridgeRegistry::standard();
    let pipeline = registry
        .resolve(ProtocolVersion::R1_8, ProtocolVersion::R1_7_6)
        .unwrap();
    let mut session = Session::new(ProtocolVersion::R1_8, ProtocolVersion::R1_7_6);
    session.state = ProtocolState::Play;

    let mut raw = BytesMut::new();
    var_int(&mut raw, 0x7E);
    assert!(pipeline
        .run(&mut session, Direction::ClientToServer, &raw)
        .is_err());
    assert!(pipeline
        .process(&mut session, Direction::ClientToServer, &raw)
        .is_none());
}

#[test]
fn beta_login_roundtrip_with_queued_tab_entry() {
    let registry = BridgeRegistry::standard();
    let pipeline = registry
        .resolve(ProtocolVersion::B1_8_1, ProtocolVersion::B1_7_3)
        .unwrap();
    let mut session = Session::new(ProtocolVersion::B1_8_1, ProtocolVersion::B1_7_3);
    pipeline.establish(&mut session);
    assert_eq!(session.state, ProtocolState::Play);

    // Beta 1.8.1 login request: UTF-16 string, extra mode/dim/difficulty
    // fields the 1.7.3 server does not know.
    let mut raw = BytesMut::new();
    raw.put_u8(0x01);
    raw.put_i32(17);
    raw.put_i16(5);
    for c in "Steve".encode_utf16() {
        raw.put_u16(c);
    }
    raw.put_i64(0); // seed
    raw.put_i32(0); // mode
    raw.put_i8(0); // dimension
    raw.put_i8(1); // difficulty
    raw.put_i8(-128); // world height
    raw.put_i8(8); // max players

    let out = pipeline
        .run(&mut session, Direction::ClientToServer, &raw)
        .unwrap()
        .expect("login forwarded");
    assert_eq!(session.username.as_deref(), Some("Steve"));

    let mut bytes = Bytes::copy_from_slice(&out);
    assert_eq!(bytes.get_u8(), 0x01);
    assert_eq!(bytes.get_i32(), 14); // downstream protocol pin

    // Server accepts: the response grows back and queues the player's
    // own tab row out of band.
    let mut raw = BytesMut::new();
    raw.put_u8(0x01);
    raw.put_i32(42); // entity id
    raw.put_i16(0); // empty string
    raw.put_i64(999); // seed
    raw.put_i8(0); // dimension

    let out = pipeline
        .run(&mut session, Direction::ServerToClient, &raw)
        .unwrap()
        .expect("login response forwarded");
    let mut bytes = Bytes::copy_from_slice(&out);
    assert_eq!(bytes.get_u8(), 0x01);
    assert_eq!(bytes.get_i32(), 42);

    let queued = pipeline.encode_outgoing(&mut session);
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].0, Direction::ServerToClient);
    assert_eq!(queued[0].1[0], 0xC9);
}

#[test]
fn beta_ping_is_answered_without_forwarding() {
    let registry = BridgeRegistry::standard();
    let pipeline = registry
        .resolve(ProtocolVersion::B1_8_1, ProtocolVersion::B1_7_3)
        .unwrap();
    let mut session = Session::new(ProtocolVersion::B1_8_1, ProtocolVersion::B1_7_3);
    pipeline.establish(&mut session);

    let raw = [0xFEu8];
    let forwarded = pipeline
        .run(&mut session, Direction::ClientToServer, &raw)
        .unwrap();
    assert!(forwarded.is_none());

    let queued = pipeline.encode_outgoing(&mut session);
    assert_eq!(queued.len(), 1);
    let mut bytes = Bytes::copy_from_slice(&queued[0].1);
    assert_eq!(bytes.get_u8(), 0xFF);
    let chars = bytes.get_i16();
    assert!(chars > 0);
}
