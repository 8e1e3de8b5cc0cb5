//! 1.8 player-list (tab list) entries and offline game profiles.

use bytes::{Buf, BufMut};
use uuid::Uuid;

use crate::codec::{read_string, write_string};
use crate::error::ProtoError;
use crate::types::{ensure, ProtocolEra, VarInt};

/// Identity shown in the tab list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameProfile {
    pub uuid: Uuid,
    pub name: String,
}

impl GameProfile {
    /// Deterministic offline-mode profile for a username. Derived from
    /// `"OfflinePlayer:" + name` the way offline servers do, so the same
    /// player always maps to the same uuid within and across connections.
    pub fn offline(name: &str) -> Self {
        let uuid = Uuid::new_v3(
            &Uuid::NAMESPACE_OID,
            format!("OfflinePlayer:{name}").as_bytes(),
        );
        Self {
            uuid,
            name: name.to_owned(),
        }
    }
}

/// Signed profile property (skin textures and the like).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileProperty {
    pub name: String,
    pub value: String,
    pub signature: Option<String>,
}

/// What a tab-list packet does with its entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabListAction {
    AddPlayer,
    UpdateGameMode,
    UpdateLatency,
    UpdateDisplayName,
    RemovePlayer,
}

impl TabListAction {
    fn id(self) -> i32 {
        match self {
            Self::AddPlayer => 0,
            Self::UpdateGameMode => 1,
            Self::UpdateLatency => 2,
            Self::UpdateDisplayName => 3,
            Self::RemovePlayer => 4,
        }
    }

    fn from_id(id: i32) -> Result<Self, ProtoError> {
        Ok(match id {
            0 => Self::AddPlayer,
            1 => Self::UpdateGameMode,
            2 => Self::UpdateLatency,
            3 => Self::UpdateDisplayName,
            4 => Self::RemovePlayer,
            other => return Err(ProtoError::UnknownTabListAction(other)),
        })
    }
}

/// One per-player entry; fields beyond the profile only travel for the
/// actions that carry them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerListEntry {
    pub profile: GameProfile,
    pub properties: Vec<ProfileProperty>,
    pub game_mode: i32,
    pub ping: i32,
    pub display_name: Option<String>,
}

impl PlayerListEntry {
    pub fn bare(profile: GameProfile) -> Self {
        Self {
            profile,
            properties: Vec::new(),
            game_mode: 0,
            ping: 0,
            display_name: None,
        }
    }
}

/// A decoded 1.8 player-list packet body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabListEntry {
    pub action: TabListAction,
    pub entries: Vec<PlayerListEntry>,
}

impl TabListEntry {
    pub fn add(entries: Vec<PlayerListEntry>) -> Self {
        Self {
            action: TabListAction::AddPlayer,
            entries,
        }
    }

    pub fn remove(entries: Vec<PlayerListEntry>) -> Self {
        Self {
            action: TabListAction::RemovePlayer,
            entries,
        }
    }

    pub(crate) fn decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        let action = TabListAction::from_id(VarInt::decode(buf)?.0)?;
        let count = VarInt::decode(buf)?.0;
        if count < 0 {
            return Err(ProtoError::NegativeLength(count));
        }
        // Wire-controlled count; cap the reservation.
        let mut entries = Vec::with_capacity(count.min(256) as usize);
        for _ in 0..count {
            ensure(buf, 16)?;
            let mut raw = [0u8; 16];
            buf.copy_to_slice(&mut raw);
            let uuid = Uuid::from_bytes(raw);
            let entry = match action {
                TabListAction::AddPlayer => {
                    let name = read_string(ProtocolEra::V1_8, buf)?;
                    let prop_count = VarInt::decode(buf)?.0;
                    if prop_count < 0 {
                        return Err(ProtoError::NegativeLength(prop_count));
                    }
                    let mut properties = Vec::with_capacity(prop_count.min(16) as usize);
                    for _ in 0..prop_count {
                        let name = read_string(ProtocolEra::V1_8, buf)?;
                        let value = read_string(ProtocolEra::V1_8, buf)?;
                        ensure(buf, 1)?;
                        let signature = if buf.get_u8() != 0 {
                            Some(read_string(ProtocolEra::V1_8, buf)?)
                        } else {
                            None
                        };
                        properties.push(ProfileProperty {
                            name,
                            value,
                            signature,
                        });
                    }
                    let game_mode = VarInt::decode(buf)?.0;
                    let ping = VarInt::decode(buf)?.0;
                    ensure(buf, 1)?;
                    let display_name = if buf.get_u8() != 0 {
                        Some(read_string(ProtocolEra::V1_8, buf)?)
                    } else {
                        None
                    };
                    PlayerListEntry {
                        profile: GameProfile {
                            uuid,
                            name,
                        },
                        properties,
                        game_mode,
                        ping,
                        display_name,
                    }
                }
                TabListAction::UpdateGameMode => {
                    let game_mode = VarInt::decode(buf)?.0;
                    let mut entry = PlayerListEntry::bare(GameProfile {
                        uuid,
                        name: String::new(),
                    });
                    entry.game_mode = game_mode;
                    entry
                }
                TabListAction::UpdateLatency => {
                    let ping = VarInt::decode(buf)?.0;
                    let mut entry = PlayerListEntry::bare(GameProfile {
                        uuid,
                        name: String::new(),
                    });
                    entry.ping = ping;
                    entry
                }
                TabListAction::UpdateDisplayName => {
                    ensure(buf, 1)?;
                    let display_name = if buf.get_u8() != 0 {
                        Some(read_string(ProtocolEra::V1_8, buf)?)
                    } else {
                        None
                    };
                    let mut entry = PlayerListEntry::bare(GameProfile {
                        uuid,
                        name: String::new(),
                    });
                    entry.display_name = display_name;
                    entry
                }
                TabListAction::RemovePlayer => PlayerListEntry::bare(GameProfile {
                    uuid,
                    name: String::new(),
                }),
            };
            entries.push(entry);
        }
        Ok(Self { action, entries })
    }

    pub(crate) fn encode(&self, buf: &mut impl BufMut) -> Result<(), ProtoError> {
        VarInt(self.action.id()).encode(buf);
        VarInt(self.entries.len() as i32).encode(buf);
        for entry in &self.entries {
            buf.put_slice(entry.profile.uuid.as_bytes());
            match self.action {
                TabListAction::AddPlayer => {
                    write_string(ProtocolEra::V1_8, &entry.profile.name, buf)?;
                    VarInt(entry.properties.len() as i32).encode(buf);
                    for property in &entry.properties {
                        write_string(ProtocolEra::V1_8, &property.name, buf)?;
                        write_string(ProtocolEra::V1_8, &property.value, buf)?;
                        match &property.signature {
                            Some(signature) => {
                                buf.put_u8(1);
                                write_string(ProtocolEra::V1_8, signature, buf)?;
                            }
                            None => buf.put_u8(0),
                        }
                    }
                    VarInt(entry.game_mode).encode(buf);
                    VarInt(entry.ping).encode(buf);
                    match &entry.display_name {
                        Some(name) => {
                            buf.put_u8(1);
                            write_string(ProtocolEra::V1_8, name, buf)?;
                        }
                        None => buf.put_u8(0),
                    }
                }
                TabListAction::UpdateGameMode => {
                    VarInt(entry.game_mode).encode(buf);
                }
                TabListAction::UpdateLatency => {
                    VarInt(entry.ping).encode(buf);
                }
                TabListAction::UpdateDisplayName => match &entry.display_name {
                    Some(name) => {
                        buf.put_u8(1);
                        write_string(ProtocolEra::V1_8, name, buf)?;
                    }
                    None => buf.put_u8(0),
                },
                TabListAction::RemovePlayer => {}
            }
        }
        Ok(())
    }
}
