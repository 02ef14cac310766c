//! Solmara inbound handler groups.
//!
//! Solmara servers drive the NPC dialog UI directly and attach the
//! addressee to every whisper receipt, so unlike the Vael forks the
//! handlers here keep no conversation state at all.

use riftmere_core::{BeingAction, BeingId, ChatKind, PlayerStat};
use tracing::debug;

use crate::context::GameContext;
use crate::dispatch::PacketHandler;
use crate::envelope::MessageIn;
use crate::error::NetError;

use super::protocol::*;

/// Read a u16-length-prefixed interior string.
fn read_prefixed_string(msg: &mut MessageIn<'_>, label: &'static str) -> Result<String, NetError> {
    let len = msg.read_u16(label)? as usize;
    msg.read_string(len, label)
}

/// Session-level messages.
pub struct GeneralHandler;

impl PacketHandler for GeneralHandler {
    fn handled(&self) -> &'static [u16] {
        &[SMSG_CONNECTION_PROBLEM]
    }

    fn handle(&mut self, msg: &mut MessageIn<'_>, ctx: &mut GameContext<'_>) -> Result<(), NetError> {
        let code = msg.read_u8("error code")?;
        let message = msg.read_rest_string("error text")?;
        ctx.client.connection_problem(code, message);
        Ok(())
    }
}

/// Visible-actor messages.
pub struct BeingHandler;

impl PacketHandler for BeingHandler {
    fn handled(&self) -> &'static [u16] {
        &[
            SMSG_BEING_ENTER,
            SMSG_BEING_LEAVE,
            SMSG_BEING_MOVE,
            SMSG_BEING_ACTION,
            SMSG_BEING_LOOKS,
        ]
    }

    fn handle(&mut self, msg: &mut MessageIn<'_>, ctx: &mut GameContext<'_>) -> Result<(), NetError> {
        let id = BeingId(msg.read_u32("being id")?);
        match msg.id() {
            SMSG_BEING_ENTER => {
                let job = msg.read_u16("job")?;
                let x = msg.read_u16("x")?;
                let y = msg.read_u16("y")?;
                ctx.beings.spawn(id, job, x, y);
            }
            SMSG_BEING_LEAVE => ctx.beings.despawn(id),
            SMSG_BEING_MOVE => {
                let sx = msg.read_u16("source x")?;
                let sy = msg.read_u16("source y")?;
                let dx = msg.read_u16("dest x")?;
                let dy = msg.read_u16("dest y")?;
                ctx.beings.walk(id, sx, sy, dx, dy);
            }
            SMSG_BEING_ACTION => {
                let action = match msg.read_u8("action")? {
                    ACTION_STAND => Some(BeingAction::Stand),
                    ACTION_MOVE => Some(BeingAction::Move),
                    ACTION_SIT => Some(BeingAction::Sit),
                    ACTION_DEAD => Some(BeingAction::Dead),
                    other => {
                        debug!(action = other, "unhandled being action");
                        None
                    }
                };
                if let Some(action) = action {
                    ctx.beings.set_action(id, action);
                }
            }
            SMSG_BEING_LOOKS => {
                let slot = msg.read_u8("look slot")?;
                let value = msg.read_u16("look value")?;
                ctx.beings.set_look(id, slot, value);
            }
            _ => {}
        }
        Ok(())
    }
}

/// Chat messages. Whisper receipts name their addressee on the wire, so no
/// send-side bookkeeping is involved.
pub struct ChatHandler;

impl PacketHandler for ChatHandler {
    fn handled(&self) -> &'static [u16] {
        &[SMSG_CHAT, SMSG_WHISPER, SMSG_ANNOUNCEMENT, SMSG_WHISPER_RESULT]
    }

    fn handle(&mut self, msg: &mut MessageIn<'_>, ctx: &mut GameContext<'_>) -> Result<(), NetError> {
        match msg.id() {
            SMSG_CHAT => {
                let sender = read_prefixed_string(msg, "sender")?;
                let text = msg.read_rest_string("chat text")?;
                let sender = (!sender.is_empty()).then_some(sender);
                ctx.chat.message(ChatKind::Public, sender, text);
            }
            SMSG_WHISPER => {
                let sender = read_prefixed_string(msg, "sender")?;
                let text = msg.read_rest_string("whisper text")?;
                ctx.chat.message(ChatKind::Whisper, Some(sender), text);
            }
            SMSG_ANNOUNCEMENT => {
                let text = msg.read_rest_string("announcement")?;
                ctx.chat.message(ChatKind::Announcement, None, text);
            }
            SMSG_WHISPER_RESULT => {
                let code = msg.read_u8("delivery code")?;
                let nick = msg.read_rest_string("addressee")?;
                ctx.chat.whisper_result(nick, code == 0);
            }
            _ => {}
        }
        Ok(())
    }
}

/// NPC dialog messages, forwarded straight to the UI.
pub struct NpcHandler;

impl PacketHandler for NpcHandler {
    fn handled(&self) -> &'static [u16] {
        &[
            SMSG_NPC_TEXT,
            SMSG_NPC_NEXT,
            SMSG_NPC_CHOICES,
            SMSG_NPC_NUMBER_REQUEST,
            SMSG_NPC_TEXT_REQUEST,
            SMSG_NPC_CLOSE,
        ]
    }

    fn handle(&mut self, msg: &mut MessageIn<'_>, ctx: &mut GameContext<'_>) -> Result<(), NetError> {
        let npc = BeingId(msg.read_u32("npc id")?);
        match msg.id() {
            SMSG_NPC_TEXT => {
                let text = msg.read_rest_string("dialog text")?;
                ctx.npc.show_text(npc, text);
            }
            SMSG_NPC_NEXT => ctx.npc.show_next(npc),
            SMSG_NPC_CHOICES => {
                let count = msg.read_u8("choice count")?;
                let mut choices = Vec::with_capacity(usize::from(count));
                for _ in 0..count {
                    choices.push(read_prefixed_string(msg, "choice")?);
                }
                ctx.npc.show_choices(npc, choices);
            }
            SMSG_NPC_NUMBER_REQUEST => ctx.npc.request_number(npc),
            SMSG_NPC_TEXT_REQUEST => ctx.npc.request_text(npc),
            SMSG_NPC_CLOSE => ctx.npc.close(npc),
            _ => {}
        }
        Ok(())
    }
}

/// Player-state messages.
pub struct PlayerHandler;

impl PacketHandler for PlayerHandler {
    fn handled(&self) -> &'static [u16] {
        &[SMSG_PLAYER_STAT, SMSG_PLAYER_WARP]
    }

    fn handle(&mut self, msg: &mut MessageIn<'_>, ctx: &mut GameContext<'_>) -> Result<(), NetError> {
        match msg.id() {
            SMSG_PLAYER_STAT => {
                let raw = msg.read_u16("stat id")?;
                let value = msg.read_i32("stat value")?;
                match PlayerStat::from_u16(raw) {
                    Some(stat) => ctx.player.stat_changed(stat, value),
                    None => debug!(stat = raw, "unhandled stat update"),
                }
            }
            SMSG_PLAYER_WARP => {
                let map = read_prefixed_string(msg, "map name")?;
                let x = msg.read_u16("x")?;
                let y = msg.read_u16("y")?;
                ctx.player.warped(map, x, y);
            }
            _ => {}
        }
        Ok(())
    }
}
