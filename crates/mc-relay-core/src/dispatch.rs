//! Translator dispatch: (opcode, state, direction) to translation
//! function, passthrough by default.

use std::collections::HashMap;

use mc_relay_proto::{Direction, PacketData, ProtocolState, SUPPRESS_OPCODE};
use tracing::trace;

use crate::error::TranslateError;
use crate::session::Session;

/// What a translator produces: the envelope to forward (possibly the
/// suppress sentinel) or a contained per-packet error.
pub type TranslateOutcome = Result<PacketData, TranslateError>;

/// One packet translation. State changes go through the session; the
/// table itself is never mutated after construction.
pub trait PacketTranslator: Send + Sync {
    fn translate(&self, session: &mut Session, packet: PacketData) -> TranslateOutcome;
}

impl<F> PacketTranslator for F
where
    F: Fn(&mut Session, PacketData) -> TranslateOutcome + Send + Sync,
{
    fn translate(&self, session: &mut Session, packet: PacketData) -> TranslateOutcome {
        self(session, packet)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct DispatchKey {
    opcode: i32,
    state: ProtocolState,
    direction: Direction,
}

/// Dispatch table for one version bridge. Registration happens at bridge
/// construction only; a later registration for the same key overrides an
/// earlier one, which is how translator groups specialize each other.
#[derive(Default)]
pub struct TranslatorTable {
    entries: HashMap<DispatchKey, Box<dyn PacketTranslator>>,
}

impl TranslatorTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        state: ProtocolState,
        direction: Direction,
        opcode: i32,
        translator: impl PacketTranslator + 'static,
    ) {
        let key = DispatchKey {
            opcode,
            state,
            direction,
        };
        self.entries.insert(key, Box::new(translator));
    }

    /// Register an opcode rewrite that keeps the fields untouched.
    /// A `new_opcode` of [`SUPPRESS_OPCODE`] drops the packet outright.
    pub fn register_remap(
        &mut self,
        state: ProtocolState,
        direction: Direction,
        opcode: i32,
        new_opcode: i32,
    ) {
        self.register(state, direction, opcode, move |_: &mut Session, packet: PacketData| {
            if new_opcode == SUPPRESS_OPCODE {
                Ok(PacketData::suppress())
            } else {
                Ok(PacketData::new(new_opcode, packet.fields))
            }
        });
    }

    /// Fold another table's registrations into this one; the other
    /// table's entries win on key collision.
    pub fn merge(&mut self, other: TranslatorTable) {
        self.entries.extend(other.entries);
    }

    /// Resolve and run the translator for the packet under the session's
    /// current state. A miss forwards the packet unchanged.
    pub fn dispatch(
        &self,
        session: &mut Session,
        direction: Direction,
        packet: PacketData,
    ) -> TranslateOutcome {
        let key = DispatchKey {
            opcode: packet.opcode,
            state: session.state,
            direction,
        };
        match self.entries.get(&key) {
            Some(translator) => {
                trace!(opcode = packet.opcode, ?direction, "dispatching translator");
                translator.translate(session, packet)
            }
            None => Ok(packet),
        }
    }
}
