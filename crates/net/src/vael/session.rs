//! Per-session state and the outgoing encoders shared by the Vael forks.

use std::cell::RefCell;
use std::rc::Rc;

use riftmere_core::BeingId;
use tracing::warn;

use crate::buffer::ByteOrder;
use crate::config::NetConfig;
use crate::dispatch::PacketHandler;
use crate::envelope::{FramePrefix, MessageOut};
use crate::family::ServerFeatures;

use super::chat::WhisperQueue;
use super::handlers;
use super::npc::{DialogState, NpcDialog};
use super::protocol::*;

/// Start a fixed-length outgoing frame in the forks' byte order.
pub fn fixed(id: u16) -> MessageOut {
    MessageOut::new(id, ByteOrder::LittleEndian, FramePrefix::IdOnly)
}

/// Start a variable-length outgoing frame in the forks' byte order.
pub fn variable(id: u16) -> MessageOut {
    MessageOut::new(id, ByteOrder::LittleEndian, FramePrefix::IdThenLength)
}

/// Conversation state of one fork session: the active NPC dialog and the
/// outstanding-whisper queue, shared between the installed handlers and the
/// outgoing encoders.
pub struct ForkSession {
    pub(crate) dialog: Rc<RefCell<NpcDialog>>,
    pub(crate) whispers: Rc<RefCell<WhisperQueue>>,
    pub(crate) features: ServerFeatures,
}

impl ForkSession {
    /// Fresh session with no conversation state.
    pub fn new(config: &NetConfig) -> Self {
        Self {
            dialog: Rc::new(RefCell::new(NpcDialog::new())),
            whispers: Rc::new(RefCell::new(WhisperQueue::new(config.whisper_queue_limit))),
            features: ServerFeatures::empty(),
        }
    }

    /// Session-level handler group: map entry and connection problems.
    pub fn session_handlers(&self) -> Vec<Box<dyn PacketHandler>> {
        vec![Box::new(handlers::GeneralHandler)]
    }

    /// In-game handler groups both forks arm unchanged; the fork appends
    /// its own being handler.
    pub fn game_handlers(&self) -> Vec<Box<dyn PacketHandler>> {
        vec![
            Box::new(handlers::ChatHandler {
                whispers: Rc::clone(&self.whispers),
            }),
            Box::new(handlers::NpcHandler {
                dialog: Rc::clone(&self.dialog),
            }),
            Box::new(handlers::PlayerHandler),
        ]
    }

    /// Being-movement sync request sent once at map start. The tick field
    /// is echoed back by the server; its value is not interpreted.
    pub fn sync_request(&self) -> Option<MessageOut> {
        let mut msg = fixed(CMSG_SYNC_REQUEST);
        msg.write_u32(0, "client tick");
        Some(msg)
    }

    /// Re-apply protocol-affecting settings.
    pub fn apply_config(&mut self, config: &NetConfig) {
        self.whispers
            .borrow_mut()
            .set_limit(config.whisper_queue_limit);
    }

    /// Drop all conversation state at end of a map session.
    pub fn game_ended(&mut self) {
        self.dialog.borrow_mut().dismissed();
        self.whispers.borrow_mut().clear();
    }

    /// Public chat line.
    pub fn chat(&self, text: &str) -> Option<MessageOut> {
        let mut msg = variable(CMSG_CHAT_MESSAGE);
        msg.write_rest_string(text, "chat text");
        Some(msg)
    }

    /// With delivery receipts negotiated, the addressee is queued so the
    /// receipt can name them; a full queue refuses the whisper.
    pub fn whisper(&mut self, nick: &str, text: &str) -> Option<MessageOut> {
        if self.features.contains(ServerFeatures::WHISPER_ACK)
            && !self.whispers.borrow_mut().push(nick)
        {
            return None;
        }
        let mut msg = variable(CMSG_CHAT_WHISPER);
        msg.write_string(nick, NAME_LEN, "addressee");
        msg.write_rest_string(text, "whisper text");
        Some(msg)
    }

    /// Sit down or stand up; self-targeted action request.
    pub fn sit(&self, down: bool) -> Option<MessageOut> {
        let mut msg = fixed(CMSG_PLAYER_ACTION);
        msg.write_u32(0, "target");
        msg.write_u8(if down { ACTION_SIT } else { ACTION_STAND }, "action");
        Some(msg)
    }

    /// Attack request against a being.
    pub fn attack(&self, target: BeingId) -> Option<MessageOut> {
        let mut msg = fixed(CMSG_PLAYER_ACTION);
        msg.write_u32(target.0, "target");
        msg.write_u8(ACTION_ATTACK, "action");
        Some(msg)
    }

    /// Open a conversation; refused while another dialog is active.
    pub fn npc_talk(&mut self, npc: BeingId) -> Option<MessageOut> {
        if self.dialog.borrow().state() != DialogState::Idle {
            warn!("npc talk refused: a dialog is already active");
            return None;
        }
        let mut msg = fixed(CMSG_NPC_TALK);
        msg.write_u32(npc.0, "npc id");
        msg.write_u8(0, "talk type");
        Some(msg)
    }

    /// "Next" click; only valid mid-dialog.
    pub fn npc_next(&mut self, npc: BeingId) -> Option<MessageOut> {
        let dialog = self.dialog.borrow();
        if dialog.npc() != npc || dialog.state() != DialogState::Talking {
            warn!(state = ?dialog.state(), "npc next refused");
            return None;
        }
        let mut msg = fixed(CMSG_NPC_NEXT_REQUEST);
        msg.write_u32(npc.0, "npc id");
        Some(msg)
    }

    /// One-based menu choice reply.
    pub fn npc_choose(&mut self, npc: BeingId, choice: u8) -> Option<MessageOut> {
        self.npc_reply(npc, DialogState::ChoiceInput, || {
            let mut msg = fixed(CMSG_NPC_CHOICE_RESPONSE);
            msg.write_u32(npc.0, "npc id");
            msg.write_u8(choice, "choice");
            msg
        })
    }

    /// Integer input reply.
    pub fn npc_number(&mut self, npc: BeingId, value: i32) -> Option<MessageOut> {
        self.npc_reply(npc, DialogState::NumberInput, || {
            let mut msg = fixed(CMSG_NPC_INT_RESPONSE);
            msg.write_u32(npc.0, "npc id");
            msg.write_i32(value, "value");
            msg
        })
    }

    /// Text input reply.
    pub fn npc_text_reply(&mut self, npc: BeingId, text: &str) -> Option<MessageOut> {
        self.npc_reply(npc, DialogState::TextInput, || {
            let mut msg = variable(CMSG_NPC_STR_RESPONSE);
            msg.write_u32(npc.0, "npc id");
            msg.write_rest_string(text, "reply text");
            msg
        })
    }

    /// Player dismissed the window; tell the server and go idle.
    pub fn npc_dismiss(&mut self, npc: BeingId) -> Option<MessageOut> {
        let mut dialog = self.dialog.borrow_mut();
        if dialog.state() == DialogState::Idle || dialog.npc() != npc {
            return None;
        }
        dialog.dismissed();
        let mut msg = fixed(CMSG_NPC_CLOSE_REQUEST);
        msg.write_u32(npc.0, "npc id");
        Some(msg)
    }

    fn npc_reply(
        &self,
        npc: BeingId,
        expected: DialogState,
        build: impl FnOnce() -> MessageOut,
    ) -> Option<MessageOut> {
        let mut dialog = self.dialog.borrow_mut();
        if dialog.npc() != npc || !dialog.may_reply(expected) {
            warn!(state = ?dialog.state(), "npc reply refused");
            return None;
        }
        let msg = build();
        dialog.replied();
        Some(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whisper_tracking_gated_by_feature() {
        let config = NetConfig::default();
        let mut session = ForkSession::new(&config);
        // Without the receipt extension nothing is queued.
        assert!(session.whisper("Alice", "hi").is_some());
        assert!(session.whispers.borrow().is_empty());

        session.features = ServerFeatures::WHISPER_ACK;
        assert!(session.whisper("Alice", "hi").is_some());
        assert_eq!(session.whispers.borrow().len(), 1);
    }

    #[test]
    fn npc_replies_follow_dialog_state() {
        let config = NetConfig::default();
        let mut session = ForkSession::new(&config);
        let npc = BeingId(42);
        assert!(session.npc_choose(npc, 1).is_none());

        session.dialog.borrow_mut().on_text(npc);
        session.dialog.borrow_mut().on_choices(npc);
        let msg = session.npc_choose(npc, 2).expect("choice reply");
        let bytes = msg.finish();
        assert_eq!(&bytes[..2], &[0xB8, 0x00]);
        assert_eq!(bytes[6], 2);
        // Second reply without a new request is refused.
        assert!(session.npc_choose(npc, 2).is_none());
    }

    #[test]
    fn game_ended_resets_conversation_state() {
        let config = NetConfig::default();
        let mut session = ForkSession::new(&config);
        session.features = ServerFeatures::WHISPER_ACK;
        session.whisper("Alice", "hi");
        session.dialog.borrow_mut().on_text(BeingId(7));
        session.game_ended();
        assert!(session.whispers.borrow().is_empty());
        assert_eq!(session.dialog.borrow().state(), DialogState::Idle);
    }
}
