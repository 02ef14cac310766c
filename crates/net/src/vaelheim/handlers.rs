//! Vaelheim being handler: version-gated spawn layout plus the shared being
//! messages.

use riftmere_core::BeingId;

use crate::context::GameContext;
use crate::dispatch::PacketHandler;
use crate::envelope::MessageIn;
use crate::error::NetError;
use crate::vael::coords::read_coords;
use crate::vael::handlers::{
    handle_being_action, handle_being_looks, handle_being_looks_wide, handle_being_move,
    handle_being_remove,
};
use crate::vael::protocol::*;

use super::protocol::EPOCH_WIDE_SPAWN;

/// Visible-actor messages.
pub struct BeingHandler;

impl PacketHandler for BeingHandler {
    fn handled(&self) -> &'static [u16] {
        &[
            SMSG_BEING_VISIBLE,
            SMSG_BEING_MOVE,
            SMSG_BEING_REMOVE,
            SMSG_BEING_ACTION,
            SMSG_BEING_LOOKS,
            SMSG_BEING_LOOKS_WIDE,
        ]
    }

    fn handle(&mut self, msg: &mut MessageIn<'_>, ctx: &mut GameContext<'_>) -> Result<(), NetError> {
        match msg.id() {
            SMSG_BEING_VISIBLE => {
                let id = BeingId(msg.read_u32("being id")?);
                msg.skip(10, "speed and option flags")?;
                let job = msg.read_u16("job")?;
                msg.skip(32, "appearance block")?;
                if msg.version() >= EPOCH_WIDE_SPAWN {
                    msg.skip(4, "wide looks block")?;
                }
                let pos = read_coords(msg, "position")?;
                ctx.beings.spawn(id, job, pos.x, pos.y);
            }
            SMSG_BEING_MOVE => handle_being_move(msg, ctx)?,
            SMSG_BEING_REMOVE => handle_being_remove(msg, ctx)?,
            SMSG_BEING_ACTION => handle_being_action(msg, ctx)?,
            SMSG_BEING_LOOKS => handle_being_looks(msg, ctx)?,
            SMSG_BEING_LOOKS_WIDE => handle_being_looks_wide(msg, ctx)?,
            _ => {}
        }
        Ok(())
    }
}
