//! Vaelheim protocol family.
//!
//! The mainline Vael lineage. Unlike its frozen fork, Vaelheim keeps
//! evolving: layouts change under date-coded epochs and newer request
//! packets replace older ones, negotiated per session via the protocol
//! version and the advertised feature set.

#[allow(missing_docs)]
pub mod protocol;

mod handlers;

use riftmere_core::BeingId;

use crate::buffer::ByteOrder;
use crate::config::NetConfig;
use crate::dispatch::PacketHandler;
use crate::envelope::MessageOut;
use crate::error::NetError;
use crate::family::{FamilyModule, FrameDecision, ProtocolFamily, ServerFamily, ServerFeatures};
use crate::vael;
use crate::vael::coords::{write_coords, Coords};
use crate::vael::protocol::CMSG_PLAYER_MOVE;
use crate::vael::session::{fixed, ForkSession};

use protocol::{packet_length, CMSG_PLAYER_MOVE_EXT, EPOCH_EXTENDED_MOVE};

/// Framing for the Vaelheim family.
pub struct VaelheimProtocol;

impl ProtocolFamily for VaelheimProtocol {
    fn name(&self) -> &'static str {
        "vaelheim"
    }

    fn byte_order(&self) -> ByteOrder {
        ByteOrder::LittleEndian
    }

    fn supported_features(&self) -> ServerFeatures {
        ServerFeatures::WHISPER_ACK | ServerFeatures::EXTENDED_MOVE | ServerFeatures::WIDE_LOOKS
    }

    fn next_frame(&self, buffered: &[u8], version: u32) -> Result<FrameDecision, NetError> {
        vael::next_frame(buffered, version, packet_length)
    }
}

/// Session state and encoders for a Vaelheim connection.
pub struct VaelheimModule {
    session: ForkSession,
    version: u32,
}

impl VaelheimModule {
    /// Fresh module with no conversation state.
    pub fn new(config: &NetConfig) -> Self {
        Self {
            session: ForkSession::new(config),
            version: 0,
        }
    }
}

impl FamilyModule for VaelheimModule {
    fn family(&self) -> ServerFamily {
        ServerFamily::Vaelheim
    }

    fn session_handlers(&self) -> Vec<Box<dyn PacketHandler>> {
        self.session.session_handlers()
    }

    fn game_handlers(&self) -> Vec<Box<dyn PacketHandler>> {
        let mut groups = self.session.game_handlers();
        groups.push(Box::new(handlers::BeingHandler));
        groups
    }

    fn sync_request(&self) -> Option<MessageOut> {
        self.session.sync_request()
    }

    fn apply_features(&mut self, features: ServerFeatures) {
        self.session.features = features & VaelheimProtocol.supported_features();
    }

    fn features(&self) -> ServerFeatures {
        self.session.features
    }

    fn set_version(&mut self, version: u32) {
        self.version = version;
    }

    fn apply_config(&mut self, config: &NetConfig) {
        self.session.apply_config(config);
    }

    fn game_ended(&mut self) {
        self.session.game_ended();
    }

    fn chat(&self, text: &str) -> Option<MessageOut> {
        self.session.chat(text)
    }

    fn whisper(&mut self, nick: &str, text: &str) -> Option<MessageOut> {
        self.session.whisper(nick, text)
    }

    /// The unpacked move request needs both the server's support (feature)
    /// and a protocol date that understands it; otherwise fall back to the
    /// bit-packed request.
    fn walk(&self, x: u16, y: u16, direction: u8) -> Option<MessageOut> {
        if self.session.features.contains(ServerFeatures::EXTENDED_MOVE)
            && self.version >= EPOCH_EXTENDED_MOVE
        {
            let mut msg = fixed(CMSG_PLAYER_MOVE_EXT);
            msg.write_u16(x, "x");
            msg.write_u16(y, "y");
            msg.write_u8(direction, "direction");
            return Some(msg);
        }
        let mut msg = fixed(CMSG_PLAYER_MOVE);
        write_coords(&mut msg, Coords { x, y }, direction, "destination");
        Some(msg)
    }

    fn sit(&self, down: bool) -> Option<MessageOut> {
        self.session.sit(down)
    }

    fn attack(&self, target: BeingId) -> Option<MessageOut> {
        self.session.attack(target)
    }

    fn npc_talk(&mut self, npc: BeingId) -> Option<MessageOut> {
        self.session.npc_talk(npc)
    }

    fn npc_next(&mut self, npc: BeingId) -> Option<MessageOut> {
        self.session.npc_next(npc)
    }

    fn npc_choose(&mut self, npc: BeingId, choice: u8) -> Option<MessageOut> {
        self.session.npc_choose(npc, choice)
    }

    fn npc_number(&mut self, npc: BeingId, value: i32) -> Option<MessageOut> {
        self.session.npc_number(npc, value)
    }

    fn npc_text_reply(&mut self, npc: BeingId, text: &str) -> Option<MessageOut> {
        self.session.npc_text_reply(npc, text)
    }

    fn npc_dismiss(&mut self, npc: BeingId) -> Option<MessageOut> {
        self.session.npc_dismiss(npc)
    }
}
