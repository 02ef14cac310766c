//! Mutation interfaces the protocol handlers call after decoding a message.
//!
//! These are the seams between the network layer and the rest of the client:
//! the being registry, the chat UI, the NPC dialog UI, and the player state.
//! Handlers call them synchronously from the dispatch loop and never retain
//! references across messages. Implementations live with the game simulation
//! (or, in tests, in `riftmere-testkit`).

use crate::{BeingAction, BeingId, ChatKind, PlayerStat};

/// Registry of visible actors.
pub trait BeingStore {
    /// A being entered visible range.
    fn spawn(&mut self, id: BeingId, job: u16, x: u16, y: u16);

    /// A being left visible range or died off-screen.
    fn despawn(&mut self, id: BeingId);

    /// A being started walking from `(sx, sy)` to `(dx, dy)`.
    fn walk(&mut self, id: BeingId, sx: u16, sy: u16, dx: u16, dy: u16);

    /// A being changed its coarse action state.
    fn set_action(&mut self, id: BeingId, action: BeingAction);

    /// A being changed its displayed look (hair, clothes, mount).
    fn set_look(&mut self, id: BeingId, slot: u8, value: u16);
}

/// Chat presentation sink.
pub trait ChatSink {
    /// Append a chat line.
    fn message(&mut self, kind: ChatKind, sender: Option<String>, text: String);

    /// Outcome of a previously sent whisper. `nick` is the addressee the
    /// client remembered when it sent the whisper.
    fn whisper_result(&mut self, nick: String, delivered: bool);
}

/// NPC dialog presentation. Drives the dialog window through the states of
/// the NPC interaction state machine.
pub trait NpcUi {
    /// Show (or append to) the dialog text for `npc`.
    fn show_text(&mut self, npc: BeingId, text: String);

    /// Show the "next" continuation button.
    fn show_next(&mut self, npc: BeingId);

    /// Present a list of choices.
    fn show_choices(&mut self, npc: BeingId, choices: Vec<String>);

    /// Request an integer input from the player.
    fn request_number(&mut self, npc: BeingId);

    /// Request a text input from the player.
    fn request_text(&mut self, npc: BeingId);

    /// Close the dialog window.
    fn close(&mut self, npc: BeingId);
}

/// Hooks into the player's own state.
pub trait PlayerHooks {
    /// A stat value changed.
    fn stat_changed(&mut self, stat: PlayerStat, value: i32);

    /// The player was warped to another map position.
    fn warped(&mut self, map: String, x: u16, y: u16);
}

/// Hooks into top-level client state (connection screens, error dialogs).
pub trait ClientHooks {
    /// The server reported a session-level problem; `message` is already
    /// localized for display.
    fn connection_problem(&mut self, code: u8, message: String);

    /// The transport dropped; the client should enter its reconnect flow.
    fn disconnected(&mut self, reason: String);
}
