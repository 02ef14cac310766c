//! Solmara protocol family.
//!
//! Unrelated server software: big-endian fields and a `[len][id]` header on
//! every frame. Because each frame declares its own length there is no
//! catalog, and an unknown id is always skippable; framing errors are
//! limited to a length word below the 4-byte header minimum.

#[allow(missing_docs)]
pub mod protocol;

mod handlers;

use riftmere_core::BeingId;

use crate::buffer::ByteOrder;
use crate::config::NetConfig;
use crate::dispatch::PacketHandler;
use crate::envelope::{FramePrefix, MessageOut};
use crate::error::NetError;
use crate::family::{
    header_u16, FamilyModule, FrameDecision, FrameInfo, ProtocolFamily, ServerFamily,
    ServerFeatures, MAX_FRAME_LEN,
};

use protocol::*;

/// Length-first header: length word, then type id, both big-endian.
const HEADER_LEN: usize = 4;

/// Framing for the Solmara family.
pub struct SolmaraProtocol;

impl ProtocolFamily for SolmaraProtocol {
    fn name(&self) -> &'static str {
        "solmara"
    }

    fn byte_order(&self) -> ByteOrder {
        ByteOrder::BigEndian
    }

    fn supported_features(&self) -> ServerFeatures {
        ServerFeatures::empty()
    }

    fn next_frame(&self, buffered: &[u8], _version: u32) -> Result<FrameDecision, NetError> {
        if buffered.len() < HEADER_LEN {
            return Ok(FrameDecision::Incomplete);
        }
        let total_len = header_u16(buffered, 0, ByteOrder::BigEndian) as usize;
        let id = header_u16(buffered, 2, ByteOrder::BigEndian);
        if total_len < HEADER_LEN {
            return Err(NetError::MalformedMessage {
                id,
                length: total_len,
            });
        }
        let info = FrameInfo {
            id,
            header_len: HEADER_LEN,
            total_len,
        };
        if total_len > MAX_FRAME_LEN {
            return Ok(FrameDecision::Malformed(info));
        }
        if buffered.len() < total_len {
            return Ok(FrameDecision::Incomplete);
        }
        Ok(FrameDecision::Frame(info))
    }
}

fn frame(id: u16) -> MessageOut {
    MessageOut::new(id, ByteOrder::BigEndian, FramePrefix::LengthThenId)
}

fn npc_frame(id: u16, npc: BeingId) -> MessageOut {
    let mut msg = frame(id);
    msg.write_u32(npc.0, "npc id");
    msg
}

/// Encoders for a Solmara connection. Receipts and dialog pacing are server
/// concerns in this family, so the module itself is stateless.
pub struct SolmaraModule;

impl SolmaraModule {
    /// Fresh module; Solmara sessions carry no client-side protocol state.
    pub fn new(_config: &NetConfig) -> Self {
        Self
    }
}

impl FamilyModule for SolmaraModule {
    fn family(&self) -> ServerFamily {
        ServerFamily::Solmara
    }

    fn session_handlers(&self) -> Vec<Box<dyn PacketHandler>> {
        vec![Box::new(handlers::GeneralHandler)]
    }

    fn game_handlers(&self) -> Vec<Box<dyn PacketHandler>> {
        vec![
            Box::new(handlers::BeingHandler),
            Box::new(handlers::ChatHandler),
            Box::new(handlers::NpcHandler),
            Box::new(handlers::PlayerHandler),
        ]
    }

    fn apply_features(&mut self, _features: ServerFeatures) {}

    fn features(&self) -> ServerFeatures {
        ServerFeatures::empty()
    }

    fn apply_config(&mut self, _config: &NetConfig) {}

    fn game_ended(&mut self) {}

    fn chat(&self, text: &str) -> Option<MessageOut> {
        let mut msg = frame(CMSG_CHAT);
        msg.write_rest_string(text, "chat text");
        Some(msg)
    }

    fn whisper(&mut self, nick: &str, text: &str) -> Option<MessageOut> {
        let mut msg = frame(CMSG_WHISPER);
        msg.write_u16(nick.len() as u16, "addressee length");
        msg.write_bytes(nick.as_bytes(), "addressee");
        msg.write_rest_string(text, "whisper text");
        Some(msg)
    }

    fn walk(&self, x: u16, y: u16, direction: u8) -> Option<MessageOut> {
        let mut msg = frame(CMSG_WALK);
        msg.write_u16(x, "x");
        msg.write_u16(y, "y");
        msg.write_u8(direction, "direction");
        Some(msg)
    }

    fn sit(&self, down: bool) -> Option<MessageOut> {
        let mut msg = frame(CMSG_SIT);
        msg.write_u8(u8::from(down), "sit down");
        Some(msg)
    }

    fn attack(&self, target: BeingId) -> Option<MessageOut> {
        let mut msg = frame(CMSG_ATTACK);
        msg.write_u32(target.0, "target");
        Some(msg)
    }

    fn npc_talk(&mut self, npc: BeingId) -> Option<MessageOut> {
        Some(npc_frame(CMSG_NPC_TALK, npc))
    }

    fn npc_next(&mut self, npc: BeingId) -> Option<MessageOut> {
        Some(npc_frame(CMSG_NPC_NEXT, npc))
    }

    fn npc_choose(&mut self, npc: BeingId, choice: u8) -> Option<MessageOut> {
        let mut msg = npc_frame(CMSG_NPC_CHOOSE, npc);
        msg.write_u8(choice, "choice");
        Some(msg)
    }

    fn npc_number(&mut self, npc: BeingId, value: i32) -> Option<MessageOut> {
        let mut msg = npc_frame(CMSG_NPC_NUMBER, npc);
        msg.write_i32(value, "value");
        Some(msg)
    }

    fn npc_text_reply(&mut self, npc: BeingId, text: &str) -> Option<MessageOut> {
        let mut msg = npc_frame(CMSG_NPC_TEXT, npc);
        msg.write_rest_string(text, "reply text");
        Some(msg)
    }

    fn npc_dismiss(&mut self, npc: BeingId) -> Option<MessageOut> {
        Some(npc_frame(CMSG_NPC_DISMISS, npc))
    }
}
