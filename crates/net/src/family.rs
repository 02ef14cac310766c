//! Protocol family identities and the framing capability they implement.
//!
//! Exactly one family is active per connection. The old design expressed
//! this with an inheritance chain of handler classes; here a family is a
//! [`ServerFamily`] tag resolved once at connect time to a static
//! [`ProtocolFamily`] implementation, so "one family active" is enforced by
//! construction rather than convention.

use bitflags::bitflags;
use riftmere_core::BeingId;

use crate::buffer::ByteOrder;
use crate::config::NetConfig;
use crate::dispatch::PacketHandler;
use crate::envelope::MessageOut;
use crate::error::NetError;

/// Hard sanity cap on a single frame. A declared length past this is
/// treated as malformed even when self-consistent.
pub const MAX_FRAME_LEN: usize = 16 * 1024;

/// Which server software the client is connected to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerFamily {
    /// Vaelora: community fork of the Vael server lineage.
    Vaelora,
    /// Vaelheim: mainline Vael lineage with date-coded protocol epochs.
    Vaelheim,
    /// Solmara: unrelated server software with its own wire format.
    Solmara,
}

impl ServerFamily {
    /// Resolve the family's framing implementation.
    pub fn protocol(self) -> &'static dyn ProtocolFamily {
        match self {
            ServerFamily::Vaelora => &crate::vaelora::VaeloraProtocol,
            ServerFamily::Vaelheim => &crate::vaelheim::VaelheimProtocol,
            ServerFamily::Solmara => &crate::solmara::SolmaraProtocol,
        }
    }
}

bitflags! {
    /// Optional protocol extensions a server can advertise during session
    /// setup. Pushed into the loaded family via
    /// [`NetworkManager::apply_features`](crate::manager::NetworkManager::apply_features)
    /// and re-applied to every freshly built module.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ServerFeatures: u32 {
        /// Whisper delivery receipts are sent back to the client.
        const WHISPER_ACK = 1 << 0;
        /// The widened move-request packet is understood.
        const EXTENDED_MOVE = 1 << 1;
        /// Being look changes are broadcast with 16-bit values.
        const WIDE_LOOKS = 1 << 2;
    }
}

/// Catalog entry for a message type's length rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketLength {
    /// Fixed on-wire length, header included.
    Fixed(usize),
    /// A u16 length word follows the type id and counts the whole frame.
    Variable,
}

/// A complete frame located in the inbound buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameInfo {
    /// Message type id.
    pub id: u16,
    /// Leading bytes (id plus any length word) the payload cursor starts
    /// past.
    pub header_len: usize,
    /// Total frame length, header included.
    pub total_len: usize,
}

/// Outcome of inspecting the inbound buffer for the next frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameDecision {
    /// A complete frame is buffered.
    Frame(FrameInfo),
    /// Not enough bytes buffered; leave the buffer untouched.
    Incomplete,
    /// Self-consistent but implausible frame (declared length past
    /// [`MAX_FRAME_LEN`]). The pump skips it by its declared length and
    /// logs at error severity.
    Malformed(FrameInfo),
}

/// The framing capability set each family implements.
///
/// Implementations are stateless statics; all per-session state lives in the
/// family's handler module instances.
pub trait ProtocolFamily {
    /// Family name for logs.
    fn name(&self) -> &'static str;

    /// On-wire byte order.
    fn byte_order(&self) -> ByteOrder;

    /// Extensions this family can negotiate at all. The subset actually
    /// advertised by the server arrives at session setup.
    fn supported_features(&self) -> ServerFeatures;

    /// Locate the next frame in `buffered` without committing anything.
    ///
    /// Errors are fatal for the stream: a type id with no length rule, or a
    /// declared length below the header minimum, leaves no way to
    /// resynchronize.
    fn next_frame(&self, buffered: &[u8], version: u32) -> Result<FrameDecision, NetError>;
}

/// One loaded family's session module: the handler set plus the encoders
/// for outgoing player actions.
///
/// A module is constructed fresh on every `load` and dropped on `unload`, so
/// all conversation state (active NPC dialog, outstanding whispers) has
/// module lifetime and never leaks across sessions. Encoders return `None`
/// when the action is not sendable right now, e.g. an NPC reply the dialog
/// state does not expect, or a whisper the bookkeeping cannot track; the
/// caller treats that as a no-op.
pub trait FamilyModule {
    /// Which family this module speaks.
    fn family(&self) -> ServerFamily;

    /// Handler groups that live for the whole session (map entry,
    /// connection problems). Installed on `load`.
    fn session_handlers(&self) -> Vec<Box<dyn PacketHandler>>;

    /// Handler groups armed between `game_started` and `game_ended`; map
    /// messages arriving outside that window are skipped as unknown.
    /// Handlers share this module's conversation state, so a rebuilt set
    /// observes the same dialogs.
    fn game_handlers(&self) -> Vec<Box<dyn PacketHandler>>;

    /// Being-movement sync request sent at map start when the client has
    /// it enabled. `None` where the family has no such request.
    fn sync_request(&self) -> Option<MessageOut> {
        None
    }

    /// Record the extensions the server advertised; silently drops anything
    /// the family cannot negotiate.
    fn apply_features(&mut self, features: ServerFeatures);

    /// Extensions currently in effect.
    fn features(&self) -> ServerFeatures;

    /// Record the negotiated protocol version for encoders whose layout
    /// depends on it. Families with version-independent layouts ignore it.
    fn set_version(&mut self, _version: u32) {}

    /// Re-apply protocol-affecting settings mid-session.
    fn apply_config(&mut self, config: &NetConfig);

    /// The map session ended; conversation state resets.
    fn game_ended(&mut self);

    /// Public chat line.
    fn chat(&self, text: &str) -> Option<MessageOut>;

    /// Private message to `nick`.
    fn whisper(&mut self, nick: &str, text: &str) -> Option<MessageOut>;

    /// Walk request toward a tile.
    fn walk(&self, x: u16, y: u16, direction: u8) -> Option<MessageOut>;

    /// Sit down or stand up.
    fn sit(&self, down: bool) -> Option<MessageOut>;

    /// Attack a being.
    fn attack(&self, target: BeingId) -> Option<MessageOut>;

    /// Open a conversation with an NPC.
    fn npc_talk(&mut self, npc: BeingId) -> Option<MessageOut>;

    /// "Next" click in the active dialog.
    fn npc_next(&mut self, npc: BeingId) -> Option<MessageOut>;

    /// One-based menu choice reply.
    fn npc_choose(&mut self, npc: BeingId, choice: u8) -> Option<MessageOut>;

    /// Integer input reply.
    fn npc_number(&mut self, npc: BeingId, value: i32) -> Option<MessageOut>;

    /// Text input reply.
    fn npc_text_reply(&mut self, npc: BeingId, text: &str) -> Option<MessageOut>;

    /// Player dismissed the dialog window.
    fn npc_dismiss(&mut self, npc: BeingId) -> Option<MessageOut>;
}

/// Shared helper: read a u16 out of raw header bytes in the family's order.
pub(crate) fn header_u16(bytes: &[u8], at: usize, order: ByteOrder) -> u16 {
    let raw = [bytes[at], bytes[at + 1]];
    match order {
        ByteOrder::LittleEndian => u16::from_le_bytes(raw),
        ByteOrder::BigEndian => u16::from_be_bytes(raw),
    }
}
