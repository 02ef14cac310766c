//! The collaborator bundle handed to every handler invocation.

use riftmere_core::collaborators::{BeingStore, ChatSink, ClientHooks, NpcUi, PlayerHooks};

/// Builds this crate's [`GameContext`] from a testkit `RecordingWorld`.
///
/// Unit tests cannot use `RecordingWorld::context()` directly: the testkit
/// links the externally built `riftmere_net`, whose `GameContext` is a
/// distinct type from the one in this (test-cfg) build of the crate. The
/// recorder fields implement the shared `riftmere_core` traits, so borrowing
/// them here produces the local type.
#[cfg(test)]
pub(crate) fn recording_context(
    world: &mut riftmere_testkit::RecordingWorld,
) -> GameContext<'_> {
    GameContext {
        beings: &mut world.beings,
        chat: &mut world.chat,
        npc: &mut world.npc,
        player: &mut world.player,
        client: &mut world.client,
    }
}

/// Mutable borrows of the game-state collaborators a handler may touch.
///
/// The frame loop assembles this once per pump from whatever owns the actual
/// state; handlers never store these references.
pub struct GameContext<'a> {
    /// Visible-actor registry.
    pub beings: &'a mut dyn BeingStore,
    /// Chat presentation.
    pub chat: &'a mut dyn ChatSink,
    /// NPC dialog presentation.
    pub npc: &'a mut dyn NpcUi,
    /// Player-state hooks.
    pub player: &'a mut dyn PlayerHooks,
    /// Top-level client state hooks.
    pub client: &'a mut dyn ClientHooks,
}
