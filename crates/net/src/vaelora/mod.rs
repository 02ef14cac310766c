//! Vaelora protocol family.
//!
//! The community fork of the Vael lineage. Its wire format froze years ago:
//! the length catalog is static and the negotiated version never changes a
//! layout, so everything here is the shared fork base plus the frozen spawn
//! message.

mod handlers;

use riftmere_core::BeingId;

use crate::buffer::ByteOrder;
use crate::config::NetConfig;
use crate::dispatch::PacketHandler;
use crate::envelope::MessageOut;
use crate::error::NetError;
use crate::family::{
    FamilyModule, FrameDecision, PacketLength, ProtocolFamily, ServerFamily, ServerFeatures,
};
use crate::vael;
use crate::vael::coords::{write_coords, Coords};
use crate::vael::protocol::{base_packet_length, CMSG_PLAYER_MOVE, SMSG_BEING_VISIBLE};
use crate::vael::session::{fixed, ForkSession};

/// Being-spawn frame size; frozen since the fork.
const SPAWN_LEN: usize = 54;

fn packet_length(id: u16) -> Option<PacketLength> {
    if id == SMSG_BEING_VISIBLE {
        return Some(PacketLength::Fixed(SPAWN_LEN));
    }
    base_packet_length(id)
}

/// Framing for the Vaelora family.
pub struct VaeloraProtocol;

impl ProtocolFamily for VaeloraProtocol {
    fn name(&self) -> &'static str {
        "vaelora"
    }

    fn byte_order(&self) -> ByteOrder {
        ByteOrder::LittleEndian
    }

    fn supported_features(&self) -> ServerFeatures {
        ServerFeatures::WHISPER_ACK | ServerFeatures::WIDE_LOOKS
    }

    fn next_frame(&self, buffered: &[u8], version: u32) -> Result<FrameDecision, NetError> {
        vael::next_frame(buffered, version, |id, _version| packet_length(id))
    }
}

/// Session state and encoders for a Vaelora connection.
pub struct VaeloraModule {
    session: ForkSession,
}

impl VaeloraModule {
    /// Fresh module with no conversation state.
    pub fn new(config: &NetConfig) -> Self {
        Self {
            session: ForkSession::new(config),
        }
    }
}

impl FamilyModule for VaeloraModule {
    fn family(&self) -> ServerFamily {
        ServerFamily::Vaelora
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
        self.session.features = features & VaeloraProtocol.supported_features();
    }

    fn features(&self) -> ServerFeatures {
        self.session.features
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

    fn walk(&self, x: u16, y: u16, direction: u8) -> Option<MessageOut> {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::family::FrameInfo;
    use crate::vael::protocol::SMSG_WHISPER_RESPONSE;

    #[test]
    fn framing_uses_the_static_catalog() {
        // Whisper result: fixed 3 bytes.
        let frame = [0x98, 0x00, 0x00];
        assert_eq!(
            VaeloraProtocol.next_frame(&frame, 0).unwrap(),
            FrameDecision::Frame(FrameInfo {
                id: SMSG_WHISPER_RESPONSE,
                header_len: 2,
                total_len: 3
            })
        );
    }

    #[test]
    fn spawn_length_ignores_version() {
        let mut frame = vec![0x78, 0x00];
        frame.resize(SPAWN_LEN, 0);
        for version in [0, 20240215, 20991231] {
            assert_eq!(
                VaeloraProtocol.next_frame(&frame, version).unwrap(),
                FrameDecision::Frame(FrameInfo {
                    id: SMSG_BEING_VISIBLE,
                    header_len: 2,
                    total_len: SPAWN_LEN
                })
            );
        }
    }

    #[test]
    fn unsupported_features_are_masked() {
        let mut module = VaeloraModule::new(&NetConfig::default());
        module.apply_features(ServerFeatures::all());
        assert!(!module.features().contains(ServerFeatures::EXTENDED_MOVE));
        assert!(module.features().contains(ServerFeatures::WHISPER_ACK));
    }
}
