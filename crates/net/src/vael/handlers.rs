//! Handler groups shared by the Vael forks.
//!
//! Both forks decode these messages identically; only the being-spawn
//! message differs, so each fork supplies its own being handler built on the
//! shared decode helpers at the bottom of this module.

use std::cell::RefCell;
use std::rc::Rc;

use riftmere_core::{BeingAction, BeingId, ChatKind, PlayerStat};
use tracing::debug;

use crate::context::GameContext;
use crate::dispatch::PacketHandler;
use crate::envelope::MessageIn;
use crate::error::NetError;

use super::chat::WhisperQueue;
use super::coords::{read_coords, read_move_coords};
use super::npc::NpcDialog;
use super::protocol::*;

/// Session-level messages: map entry and server-reported problems.
pub struct GeneralHandler;

impl PacketHandler for GeneralHandler {
    fn handled(&self) -> &'static [u16] {
        &[SMSG_MAP_LOADED, SMSG_CONNECTION_PROBLEM]
    }

    fn handle(&mut self, msg: &mut MessageIn<'_>, ctx: &mut GameContext<'_>) -> Result<(), NetError> {
        match msg.id() {
            SMSG_MAP_LOADED => {
                msg.read_u32("server tick")?;
                let pos = read_coords(msg, "start position")?;
                // An empty map name means "the map already being loaded".
                ctx.player.warped(String::new(), pos.x, pos.y);
            }
            SMSG_CONNECTION_PROBLEM => {
                let code = msg.read_u8("error code")?;
                ctx.client
                    .connection_problem(code, connection_problem_text(code).to_owned());
            }
            _ => {}
        }
        Ok(())
    }
}

fn connection_problem_text(code: u8) -> &'static str {
    match code {
        0 => "Authentication failed.",
        1 => "No servers available.",
        2 => "This account is already logged in.",
        3 => "Speed hack detected.",
        4 => "Server full.",
        5 => "Sorry, you are underaged.",
        _ => "Unknown connection error.",
    }
}

/// Chat and whisper messages. Shares the outstanding-whisper queue with the
/// outgoing encoder so delivery receipts can be matched to an addressee.
pub struct ChatHandler {
    pub(crate) whispers: Rc<RefCell<WhisperQueue>>,
}

impl PacketHandler for ChatHandler {
    fn handled(&self) -> &'static [u16] {
        &[
            SMSG_BEING_CHAT,
            SMSG_PLAYER_CHAT,
            SMSG_WHISPER,
            SMSG_WHISPER_RESPONSE,
            SMSG_GM_ANNOUNCEMENT,
        ]
    }

    fn handle(&mut self, msg: &mut MessageIn<'_>, ctx: &mut GameContext<'_>) -> Result<(), NetError> {
        match msg.id() {
            SMSG_BEING_CHAT => {
                msg.read_u32("being id")?;
                let line = msg.read_rest_string("chat line")?;
                // The sender's name travels embedded as "Name : text".
                match line.split_once(" : ") {
                    Some((name, text)) => {
                        ctx.chat
                            .message(ChatKind::Public, Some(name.to_owned()), text.to_owned());
                    }
                    None => ctx.chat.message(ChatKind::Public, None, line),
                }
            }
            SMSG_PLAYER_CHAT => {
                let text = msg.read_rest_string("chat text")?;
                ctx.chat.message(ChatKind::Public, None, text);
            }
            SMSG_WHISPER => {
                let nick = msg.read_string(NAME_LEN, "sender")?;
                let text = msg.read_rest_string("whisper text")?;
                ctx.chat.message(ChatKind::Whisper, Some(nick), text);
            }
            SMSG_WHISPER_RESPONSE => {
                let code = msg.read_u8("delivery code")?;
                if let Some(nick) = self.whispers.borrow_mut().pop() {
                    ctx.chat.whisper_result(nick, code == 0);
                }
            }
            SMSG_GM_ANNOUNCEMENT => {
                let text = msg.read_rest_string("announcement")?;
                ctx.chat.message(ChatKind::Announcement, None, text);
            }
            _ => {}
        }
        Ok(())
    }
}

/// NPC dialog messages. Shares the dialog state machine with the outgoing
/// reply encoders; out-of-order events are dropped without touching the UI.
pub struct NpcHandler {
    pub(crate) dialog: Rc<RefCell<NpcDialog>>,
}

impl PacketHandler for NpcHandler {
    fn handled(&self) -> &'static [u16] {
        &[
            SMSG_NPC_MESSAGE,
            SMSG_NPC_NEXT,
            SMSG_NPC_CHOICE,
            SMSG_NPC_INT_INPUT,
            SMSG_NPC_STR_INPUT,
            SMSG_NPC_CLOSE,
        ]
    }

    fn handle(&mut self, msg: &mut MessageIn<'_>, ctx: &mut GameContext<'_>) -> Result<(), NetError> {
        let npc = BeingId(msg.read_u32("npc id")?);
        let mut dialog = self.dialog.borrow_mut();
        match msg.id() {
            SMSG_NPC_MESSAGE => {
                let text = msg.read_rest_string("dialog text")?;
                if dialog.on_text(npc) {
                    ctx.npc.show_text(npc, text);
                }
            }
            SMSG_NPC_NEXT => {
                if dialog.on_next(npc) {
                    ctx.npc.show_next(npc);
                }
            }
            SMSG_NPC_CHOICE => {
                let menu = msg.read_rest_string("choice menu")?;
                if dialog.on_choices(npc) {
                    let choices: Vec<String> = menu
                        .split(':')
                        .filter(|entry| !entry.is_empty())
                        .map(str::to_owned)
                        .collect();
                    ctx.npc.show_choices(npc, choices);
                }
            }
            SMSG_NPC_INT_INPUT => {
                if dialog.on_number_request(npc) {
                    ctx.npc.request_number(npc);
                }
            }
            SMSG_NPC_STR_INPUT => {
                if dialog.on_text_request(npc) {
                    ctx.npc.request_text(npc);
                }
            }
            SMSG_NPC_CLOSE => {
                if dialog.on_close(npc) {
                    ctx.npc.close(npc);
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// Messages about the player's own state.
pub struct PlayerHandler;

impl PacketHandler for PlayerHandler {
    fn handled(&self) -> &'static [u16] {
        &[SMSG_PLAYER_STAT_1, SMSG_PLAYER_STAT_2, SMSG_PLAYER_WARP]
    }

    fn handle(&mut self, msg: &mut MessageIn<'_>, ctx: &mut GameContext<'_>) -> Result<(), NetError> {
        match msg.id() {
            SMSG_PLAYER_STAT_1 | SMSG_PLAYER_STAT_2 => {
                let raw = msg.read_u16("stat id")?;
                let value = msg.read_u32("stat value")?;
                match PlayerStat::from_u16(raw) {
                    Some(stat) => ctx.player.stat_changed(stat, value as i32),
                    None => debug!(stat = raw, "unhandled stat update"),
                }
            }
            SMSG_PLAYER_WARP => {
                let map = msg.read_string(MAP_NAME_LEN, "map name")?;
                let x = msg.read_u16("x")?;
                let y = msg.read_u16("y")?;
                ctx.player.warped(map, x, y);
            }
            _ => {}
        }
        Ok(())
    }
}

// Being decode helpers shared by the fork being handlers.

/// [`SMSG_BEING_MOVE`]: extract the path and apply it.
pub fn handle_being_move(msg: &mut MessageIn<'_>, ctx: &mut GameContext<'_>) -> Result<(), NetError> {
    let id = BeingId(msg.read_u32("being id")?);
    msg.skip(44, "appearance block and tick")?;
    let (src, dst) = read_move_coords(msg, "path")?;
    ctx.beings.walk(id, src.x, src.y, dst.x, dst.y);
    Ok(())
}

/// [`SMSG_BEING_REMOVE`]: despawn, or keep the corpse on a death.
pub fn handle_being_remove(
    msg: &mut MessageIn<'_>,
    ctx: &mut GameContext<'_>,
) -> Result<(), NetError> {
    let id = BeingId(msg.read_u32("being id")?);
    let dead = msg.read_u8("remove reason")? == 1;
    if dead {
        ctx.beings.set_action(id, BeingAction::Dead);
    } else {
        ctx.beings.despawn(id);
    }
    Ok(())
}

/// [`SMSG_BEING_ACTION`]: only the posture changes matter here; combat
/// presentation is driven elsewhere.
pub fn handle_being_action(
    msg: &mut MessageIn<'_>,
    ctx: &mut GameContext<'_>,
) -> Result<(), NetError> {
    let src = BeingId(msg.read_u32("source being")?);
    msg.skip(20, "target, tick, speeds, damage")?;
    let action = msg.read_u8("action type")?;
    match action {
        ACTION_SIT => ctx.beings.set_action(src, BeingAction::Sit),
        ACTION_STAND => ctx.beings.set_action(src, BeingAction::Stand),
        other => debug!(action = other, "unhandled being action"),
    }
    Ok(())
}

/// [`SMSG_BEING_LOOKS`]: narrow single-byte look value.
pub fn handle_being_looks(
    msg: &mut MessageIn<'_>,
    ctx: &mut GameContext<'_>,
) -> Result<(), NetError> {
    let id = BeingId(msg.read_u32("being id")?);
    let slot = msg.read_u8("look slot")?;
    let value = msg.read_u8("look value")?;
    ctx.beings.set_look(id, slot, u16::from(value));
    Ok(())
}

/// [`SMSG_BEING_LOOKS_WIDE`]: 16-bit look value plus a color word.
pub fn handle_being_looks_wide(
    msg: &mut MessageIn<'_>,
    ctx: &mut GameContext<'_>,
) -> Result<(), NetError> {
    let id = BeingId(msg.read_u32("being id")?);
    let slot = msg.read_u8("look slot")?;
    let value = msg.read_u16("look value")?;
    msg.read_u16("look color")?;
    ctx.beings.set_look(id, slot, value);
    Ok(())
}
