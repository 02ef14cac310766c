#![warn(missing_docs)]
//! Deterministic test surfaces for the protocol core.
//!
//! [`RecordingWorld`] implements every collaborator trait from
//! `riftmere-core` and records each call as a typed [`NetEvent`], so tests
//! can assert on the exact sequence of game-state effects a byte stream
//! produced. [`JsonlSink`] dumps event logs as newline-delimited JSON for
//! golden-file comparisons.

use std::cell::RefCell;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::rc::Rc;

use anyhow::Result;
use riftmere_core::collaborators::{BeingStore, ChatSink, ClientHooks, NpcUi, PlayerHooks};
use riftmere_core::{BeingAction, BeingId, ChatKind, PlayerStat};
use riftmere_net::GameContext;
use serde::Serialize;

/// One recorded collaborator call, in arrival order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum NetEvent {
    /// `BeingStore::spawn`.
    Spawn {
        /// Being id.
        id: BeingId,
        /// Job/class code.
        job: u16,
        /// Map x.
        x: u16,
        /// Map y.
        y: u16,
    },
    /// `BeingStore::despawn`.
    Despawn {
        /// Being id.
        id: BeingId,
    },
    /// `BeingStore::walk`.
    Walk {
        /// Being id.
        id: BeingId,
        /// Source x.
        sx: u16,
        /// Source y.
        sy: u16,
        /// Destination x.
        dx: u16,
        /// Destination y.
        dy: u16,
    },
    /// `BeingStore::set_action`.
    Action {
        /// Being id.
        id: BeingId,
        /// New action.
        action: BeingAction,
    },
    /// `BeingStore::set_look`.
    Look {
        /// Being id.
        id: BeingId,
        /// Look slot.
        slot: u8,
        /// New value.
        value: u16,
    },
    /// `ChatSink::message`.
    Chat {
        /// Presentation kind.
        kind: ChatKind,
        /// Sender, if attributed.
        sender: Option<String>,
        /// Line text.
        text: String,
    },
    /// `ChatSink::whisper_result`.
    WhisperResult {
        /// Remembered addressee.
        nick: String,
        /// Whether the server delivered it.
        delivered: bool,
    },
    /// `NpcUi::show_text`.
    NpcText {
        /// Dialog owner.
        npc: BeingId,
        /// Text shown.
        text: String,
    },
    /// `NpcUi::show_next`.
    NpcNext {
        /// Dialog owner.
        npc: BeingId,
    },
    /// `NpcUi::show_choices`.
    NpcChoices {
        /// Dialog owner.
        npc: BeingId,
        /// Menu entries.
        choices: Vec<String>,
    },
    /// `NpcUi::request_number`.
    NpcNumber {
        /// Dialog owner.
        npc: BeingId,
    },
    /// `NpcUi::request_text`.
    NpcTextInput {
        /// Dialog owner.
        npc: BeingId,
    },
    /// `NpcUi::close`.
    NpcClose {
        /// Dialog owner.
        npc: BeingId,
    },
    /// `PlayerHooks::stat_changed`.
    Stat {
        /// Which stat.
        stat: PlayerStat,
        /// New value.
        value: i32,
    },
    /// `PlayerHooks::warped`.
    Warp {
        /// Destination map.
        map: String,
        /// Destination x.
        x: u16,
        /// Destination y.
        y: u16,
    },
    /// `ClientHooks::connection_problem`.
    ConnectionProblem {
        /// Server-reported code.
        code: u8,
        /// Display message.
        message: String,
    },
    /// `ClientHooks::disconnected`.
    Disconnected {
        /// Reason text.
        reason: String,
    },
}

type EventLog = Rc<RefCell<Vec<NetEvent>>>;

macro_rules! recorder {
    ($name:ident) => {
        /// Recording implementation of one collaborator trait; shares the
        /// owning [`RecordingWorld`]'s event log.
        pub struct $name {
            log: EventLog,
        }

        impl $name {
            fn push(&mut self, event: NetEvent) {
                self.log.borrow_mut().push(event);
            }
        }
    };
}

recorder!(RecordingBeings);
recorder!(RecordingChat);
recorder!(RecordingNpc);
recorder!(RecordingPlayer);
recorder!(RecordingClient);

impl BeingStore for RecordingBeings {
    fn spawn(&mut self, id: BeingId, job: u16, x: u16, y: u16) {
        self.push(NetEvent::Spawn { id, job, x, y });
    }

    fn despawn(&mut self, id: BeingId) {
        self.push(NetEvent::Despawn { id });
    }

    fn walk(&mut self, id: BeingId, sx: u16, sy: u16, dx: u16, dy: u16) {
        self.push(NetEvent::Walk { id, sx, sy, dx, dy });
    }

    fn set_action(&mut self, id: BeingId, action: BeingAction) {
        self.push(NetEvent::Action { id, action });
    }

    fn set_look(&mut self, id: BeingId, slot: u8, value: u16) {
        self.push(NetEvent::Look { id, slot, value });
    }
}

impl ChatSink for RecordingChat {
    fn message(&mut self, kind: ChatKind, sender: Option<String>, text: String) {
        self.push(NetEvent::Chat { kind, sender, text });
    }

    fn whisper_result(&mut self, nick: String, delivered: bool) {
        self.push(NetEvent::WhisperResult { nick, delivered });
    }
}

impl NpcUi for RecordingNpc {
    fn show_text(&mut self, npc: BeingId, text: String) {
        self.push(NetEvent::NpcText { npc, text });
    }

    fn show_next(&mut self, npc: BeingId) {
        self.push(NetEvent::NpcNext { npc });
    }

    fn show_choices(&mut self, npc: BeingId, choices: Vec<String>) {
        self.push(NetEvent::NpcChoices { npc, choices });
    }

    fn request_number(&mut self, npc: BeingId) {
        self.push(NetEvent::NpcNumber { npc });
    }

    fn request_text(&mut self, npc: BeingId) {
        self.push(NetEvent::NpcTextInput { npc });
    }

    fn close(&mut self, npc: BeingId) {
        self.push(NetEvent::NpcClose { npc });
    }
}

impl PlayerHooks for RecordingPlayer {
    fn stat_changed(&mut self, stat: PlayerStat, value: i32) {
        self.push(NetEvent::Stat { stat, value });
    }

    fn warped(&mut self, map: String, x: u16, y: u16) {
        self.push(NetEvent::Warp { map, x, y });
    }
}

impl ClientHooks for RecordingClient {
    fn connection_problem(&mut self, code: u8, message: String) {
        self.push(NetEvent::ConnectionProblem { code, message });
    }

    fn disconnected(&mut self, reason: String) {
        self.push(NetEvent::Disconnected { reason });
    }
}

/// A full set of recording collaborators sharing one ordered event log.
pub struct RecordingWorld {
    log: EventLog,
    /// Being registry recorder.
    pub beings: RecordingBeings,
    /// Chat sink recorder.
    pub chat: RecordingChat,
    /// NPC dialog recorder.
    pub npc: RecordingNpc,
    /// Player hooks recorder.
    pub player: RecordingPlayer,
    /// Client hooks recorder.
    pub client: RecordingClient,
}

impl RecordingWorld {
    /// Fresh world with an empty log.
    pub fn new() -> Self {
        let log: EventLog = Rc::new(RefCell::new(Vec::new()));
        Self {
            beings: RecordingBeings {
                log: Rc::clone(&log),
            },
            chat: RecordingChat {
                log: Rc::clone(&log),
            },
            npc: RecordingNpc {
                log: Rc::clone(&log),
            },
            player: RecordingPlayer {
                log: Rc::clone(&log),
            },
            client: RecordingClient {
                log: Rc::clone(&log),
            },
            log,
        }
    }

    /// Borrow the recorders as a dispatch context.
    pub fn context(&mut self) -> GameContext<'_> {
        GameContext {
            beings: &mut self.beings,
            chat: &mut self.chat,
            npc: &mut self.npc,
            player: &mut self.player,
            client: &mut self.client,
        }
    }

    /// Snapshot of all recorded events, in arrival order.
    pub fn events(&self) -> Vec<NetEvent> {
        self.log.borrow().clone()
    }

    /// Drop all recorded events.
    pub fn clear(&mut self) {
        self.log.borrow_mut().clear();
    }
}

impl Default for RecordingWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Newline-delimited JSON sink for event logs.
pub struct JsonlSink {
    file: File,
}

impl JsonlSink {
    /// Create a new sink at `path`.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self { file })
    }

    /// Append one event to the log.
    pub fn write(&mut self, event: &NetEvent) -> Result<()> {
        let line = serde_json::to_string(event)?;
        self.file.write_all(line.as_bytes())?;
        self.file.write_all(b"\n")?;
        Ok(())
    }
}

/// Install a TRACE-capable subscriber honoring `RUST_LOG`. Safe to call from
/// every test; only the first call wins.
pub fn init_test_logging() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
