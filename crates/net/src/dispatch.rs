//! Type-id to handler routing.
//!
//! The table is repopulated wholesale when the active protocol family
//! changes: `install` replaces the entire handler set in one step, so a
//! partially-installed state is never observable from the dispatch loop.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::context::GameContext;
use crate::envelope::MessageIn;
use crate::error::NetError;

/// One handler group. A group advertises the message ids it covers and is
/// invoked with the decoded envelope for each of them.
pub trait PacketHandler {
    /// Message ids this handler covers.
    fn handled(&self) -> &'static [u16];

    /// Apply one message's effects to the game-state collaborators.
    ///
    /// A payload shorter than the declared layout surfaces as
    /// [`NetError::BufferUnderrun`]; the dispatch loop treats that as a
    /// corrupt message and keeps the stream aligned via the frame's
    /// declared length.
    fn handle(&mut self, msg: &mut MessageIn<'_>, ctx: &mut GameContext<'_>) -> Result<(), NetError>;
}

/// What the table did with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A handler consumed the message.
    Handled,
    /// No handler is registered for the id; the frame is skipped.
    Unknown,
    /// A handler failed on the payload; the frame is skipped.
    Corrupt,
}

/// Runtime mapping from message type id to handler group.
#[derive(Default)]
pub struct DispatchTable {
    handlers: Vec<Box<dyn PacketHandler>>,
    by_id: HashMap<u16, usize>,
    warned_unknown: HashSet<u16>,
    unhandled: u64,
}

impl DispatchTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole handler set with a family's groups.
    ///
    /// If two groups claim the same id the later one wins; families keep
    /// their catalogs disjoint, so this only matters when a family module
    /// deliberately overrides a shared-base group.
    pub fn install(&mut self, handlers: Vec<Box<dyn PacketHandler>>) {
        self.clear();
        for (index, handler) in handlers.iter().enumerate() {
            for &id in handler.handled() {
                self.by_id.insert(id, index);
            }
        }
        self.handlers = handlers;
        debug!(
            groups = self.handlers.len(),
            ids = self.by_id.len(),
            "installed handler set"
        );
    }

    /// Remove all entries and reset the unhandled count. Safe to call when
    /// already empty.
    pub fn clear(&mut self) {
        self.handlers.clear();
        self.by_id.clear();
        self.warned_unknown.clear();
        self.unhandled = 0;
    }

    /// True if no handlers are installed.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// True if some handler covers `id`.
    pub fn covers(&self, id: u16) -> bool {
        self.by_id.contains_key(&id)
    }

    /// Messages that arrived with no registered handler since the last
    /// `install`.
    pub fn unhandled_count(&self) -> u64 {
        self.unhandled
    }

    /// Route one decoded message.
    pub fn dispatch(
        &mut self,
        msg: &mut MessageIn<'_>,
        ctx: &mut GameContext<'_>,
    ) -> DispatchOutcome {
        let id = msg.id();
        match self.by_id.get(&id) {
            Some(&index) => match self.handlers[index].handle(msg, ctx) {
                Ok(()) => DispatchOutcome::Handled,
                Err(err) => {
                    warn!(id = format_args!("{id:#06x}"), %err, "handler rejected payload");
                    DispatchOutcome::Corrupt
                }
            },
            None => {
                self.unhandled += 1;
                // Servers ship experimental packets; complain once per id.
                if self.warned_unknown.insert(id) {
                    let err = NetError::UnknownType(id);
                    warn!(%err, len = msg.length(), "packet not implemented");
                }
                DispatchOutcome::Unknown
            }
        }
    }
}
