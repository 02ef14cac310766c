//! The network manager: owns the connection, the dispatch table, the rate
//! limiter, and whichever family module is loaded.
//!
//! Lifecycle mirrors the client's screens: `load` when a server is chosen,
//! `connect` once the transport is up, `game_started` on map entry,
//! `flush_network` every client frame, `game_ended`/`unload` on the way
//! back out. `load` after `load` and `unload` after `unload` are both safe;
//! the second call is a no-op or an implicit reload rather than an error.
//!
//! Only the session-level handler group is installed outside a map session;
//! the in-game groups are armed by `game_started` and disarmed again by
//! `game_ended`, so map messages arriving on a connection that has not
//! entered the game yet are skipped as unknown rather than applied to a
//! world that does not exist.

use anyhow::{bail, Result};
use tracing::{debug, info, warn};

use riftmere_core::BeingId;

use crate::config::NetConfig;
use crate::connection::{Connection, PacketCounters};
use crate::context::GameContext;
use crate::dispatch::DispatchTable;
use crate::envelope::MessageOut;
use crate::error::NetError;
use crate::family::{FamilyModule, ServerFamily, ServerFeatures};
use crate::limiter::{PacketAction, PacketLimiter};
use crate::solmara::SolmaraModule;
use crate::transport::Transport;
use crate::vaelheim::VaelheimModule;
use crate::vaelora::VaeloraModule;

/// Owner of all per-session protocol state.
pub struct NetworkManager {
    config: NetConfig,
    limiter: PacketLimiter,
    table: DispatchTable,
    module: Option<Box<dyn FamilyModule>>,
    connection: Option<Connection>,
    features: ServerFeatures,
    in_game: bool,
}

impl NetworkManager {
    /// Manager with no family loaded.
    pub fn new(config: NetConfig) -> Self {
        let limiter = PacketLimiter::new(&config.limits);
        Self {
            config,
            limiter,
            table: DispatchTable::new(),
            module: None,
            connection: None,
            features: ServerFeatures::empty(),
            in_game: false,
        }
    }

    /// The loaded family, if any.
    pub fn family(&self) -> Option<ServerFamily> {
        self.module.as_ref().map(|m| m.family())
    }

    /// Build and install the module for `family`. Loading over an existing
    /// module unloads it first, conversation state included.
    pub fn load(&mut self, family: ServerFamily) {
        if self.module.is_some() {
            self.unload();
        }
        info!(family = family.protocol().name(), "loading protocol family");
        let mut module: Box<dyn FamilyModule> = match family {
            ServerFamily::Vaelora => Box::new(VaeloraModule::new(&self.config)),
            ServerFamily::Vaelheim => Box::new(VaelheimModule::new(&self.config)),
            ServerFamily::Solmara => Box::new(SolmaraModule::new(&self.config)),
        };
        module.apply_features(self.features);
        if let Some(conn) = &self.connection {
            module.set_version(conn.version());
        }
        self.module = Some(module);
        self.install_handlers();
    }

    /// Drop the loaded module and clear the dispatch table. Safe to call
    /// when nothing is loaded.
    pub fn unload(&mut self) {
        if let Some(module) = self.module.take() {
            debug!(family = module.family().protocol().name(), "unloading protocol family");
        }
        self.in_game = false;
        self.table.clear();
    }

    /// Install the session-level groups, plus the in-game groups when a map
    /// session is active.
    fn install_handlers(&mut self) {
        let Some(module) = &self.module else {
            return;
        };
        let mut groups = module.session_handlers();
        if self.in_game {
            groups.extend(module.game_handlers());
        }
        self.table.install(groups);
    }

    /// Tear the module down and rebuild it from scratch, e.g. after a
    /// character switch. The advertised features survive; conversation
    /// state does not, and the in-game groups stay disarmed until the next
    /// `game_started`.
    pub fn reload(&mut self) {
        if let Some(family) = self.family() {
            self.load(family);
        }
    }

    /// Re-apply settings that affect the protocol layer without touching
    /// the handler set or any conversation state.
    pub fn reload_partially(&mut self, config: NetConfig) {
        self.limiter.apply(&config.limits);
        if let Some(module) = &mut self.module {
            module.apply_config(&config);
        }
        self.config = config;
    }

    /// Record the extensions the server advertised during session setup and
    /// push them into the loaded module.
    pub fn apply_features(&mut self, features: ServerFeatures) {
        self.features = features;
        if let Some(module) = &mut self.module {
            module.apply_features(features);
        }
    }

    /// Adopt an established transport. Requires a loaded family, which
    /// fixes the connection's byte order.
    pub fn connect(&mut self, transport: Box<dyn Transport>) -> Result<()> {
        let Some(module) = &self.module else {
            bail!("no protocol family loaded");
        };
        let order = module.family().protocol().byte_order();
        self.connection = Some(Connection::new(transport, order));
        self.limiter.reset();
        Ok(())
    }

    /// Record the negotiated protocol version on the connection and the
    /// loaded module.
    pub fn set_version(&mut self, version: u32) {
        if let Some(conn) = &mut self.connection {
            conn.set_version(version);
        }
        if let Some(module) = &mut self.module {
            module.set_version(version);
        }
    }

    /// Close the link, if one is up. Idempotent.
    pub fn disconnect(&mut self) {
        if let Some(conn) = &mut self.connection {
            conn.disconnect();
        }
    }

    /// Whether a usable link is up.
    pub fn is_connected(&self) -> bool {
        self.connection.as_ref().is_some_and(Connection::is_connected)
    }

    /// Traffic counters of the current connection.
    pub fn counters(&self) -> PacketCounters {
        self.connection
            .as_ref()
            .map(Connection::counters)
            .unwrap_or_default()
    }

    /// The map session began: arm the in-game handler groups, forget stale
    /// rate-limit history, and request being-movement sync if configured.
    pub fn game_started(&mut self) {
        self.in_game = true;
        self.install_handlers();
        self.limiter.reset();
        if self.config.sync_beings {
            let msg = self.module.as_ref().and_then(|m| m.sync_request());
            self.send(msg);
        }
    }

    /// The map session ended; the in-game groups disarm and conversation
    /// state and send history reset.
    pub fn game_ended(&mut self) {
        self.in_game = false;
        if let Some(module) = &mut self.module {
            module.game_ended();
        }
        self.install_handlers();
        self.limiter.reset();
    }

    /// One per-frame pump: flush queued sends, then receive and dispatch up
    /// to the configured budget. A dead link surfaces through
    /// [`ClientHooks::disconnected`](riftmere_core::collaborators::ClientHooks::disconnected)
    /// as well as the returned error.
    pub fn flush_network(&mut self, ctx: &mut GameContext<'_>) -> Result<usize, NetError> {
        let Some(module) = &self.module else {
            return Ok(0);
        };
        let Some(conn) = &mut self.connection else {
            return Ok(0);
        };
        let protocol = module.family().protocol();
        let pumped = conn
            .pump_send()
            .and_then(|()| conn.pump_receive(protocol, &mut self.table, ctx, self.config.dispatch_budget));
        match pumped {
            Ok(count) => Ok(count),
            Err(err) => {
                ctx.client.disconnected(err.to_string());
                Err(err)
            }
        }
    }

    fn send(&mut self, msg: Option<MessageOut>) -> bool {
        let Some(msg) = msg else {
            return false;
        };
        match &mut self.connection {
            Some(conn) if conn.is_connected() => {
                conn.send(msg);
                true
            }
            _ => {
                warn!(id = format_args!("{:#06x}", msg.id()), "not connected; message dropped");
                false
            }
        }
    }

    fn action(
        &mut self,
        kind: PacketAction,
        encode: impl FnOnce(&mut dyn FamilyModule) -> Option<MessageOut>,
    ) -> bool {
        let Some(module) = &mut self.module else {
            return false;
        };
        if !self.limiter.allow(kind) {
            return false;
        }
        let msg = encode(module.as_mut());
        self.send(msg)
    }

    /// Say a line in public chat.
    pub fn chat(&mut self, text: &str) -> bool {
        self.action(PacketAction::Chat, |m| m.chat(text))
    }

    /// Whisper `text` to `nick`.
    pub fn whisper(&mut self, nick: &str, text: &str) -> bool {
        self.action(PacketAction::Whisper, |m| m.whisper(nick, text))
    }

    /// Walk toward a tile.
    pub fn walk(&mut self, x: u16, y: u16, direction: u8) -> bool {
        self.action(PacketAction::Move, |m| m.walk(x, y, direction))
    }

    /// Sit down or stand up.
    pub fn sit(&mut self, down: bool) -> bool {
        self.action(PacketAction::Sit, |m| m.sit(down))
    }

    /// Attack a being.
    pub fn attack(&mut self, target: BeingId) -> bool {
        self.action(PacketAction::Attack, |m| m.attack(target))
    }

    /// Open a conversation with an NPC.
    pub fn npc_talk(&mut self, npc: BeingId) -> bool {
        self.action(PacketAction::NpcInput, |m| m.npc_talk(npc))
    }

    /// "Next" click in the active NPC dialog.
    pub fn npc_next(&mut self, npc: BeingId) -> bool {
        self.action(PacketAction::NpcInput, |m| m.npc_next(npc))
    }

    /// Reply to an NPC choice menu (one-based).
    pub fn npc_choose(&mut self, npc: BeingId, choice: u8) -> bool {
        self.action(PacketAction::NpcInput, |m| m.npc_choose(npc, choice))
    }

    /// Reply to an NPC integer request.
    pub fn npc_number(&mut self, npc: BeingId, value: i32) -> bool {
        self.action(PacketAction::NpcInput, |m| m.npc_number(npc, value))
    }

    /// Reply to an NPC text request.
    pub fn npc_text_reply(&mut self, npc: BeingId, text: &str) -> bool {
        self.action(PacketAction::NpcInput, |m| m.npc_text_reply(npc, text))
    }

    /// Dismiss the NPC dialog window.
    pub fn npc_dismiss(&mut self, npc: BeingId) -> bool {
        // Closing a window is not a floodable action.
        let Some(module) = &mut self.module else {
            return false;
        };
        let msg = module.npc_dismiss(npc);
        self.send(msg)
    }
}
