//! Vaelheim additions to the shared id space, and the protocol epochs.
//!
//! Vaelheim still evolves its wire format. A layout change ships under a
//! date-coded epoch: the session-setup exchange yields the server's protocol
//! date, and every gated decode or length compares `version >= EPOCH_*`.

use crate::family::PacketLength;
use crate::vael::protocol::{base_packet_length, SMSG_BEING_VISIBLE};

/// Spawn message grew a wide-looks block (4 extra bytes).
pub const EPOCH_WIDE_SPAWN: u32 = 20240215;

/// The unpacked move request replaced the bit-packed one.
pub const EPOCH_EXTENDED_MOVE: u32 = 20231007;

/// Unpacked move request: x u16, y u16, direction u8.
pub const CMSG_PLAYER_MOVE_EXT: u16 = 0x0440;

/// Spawn frame size on either side of [`EPOCH_WIDE_SPAWN`].
pub const SPAWN_LEN: usize = 54;
pub const SPAWN_LEN_WIDE: usize = 58;

/// Length rule for an inbound id at the given protocol date.
pub fn packet_length(id: u16, version: u32) -> Option<PacketLength> {
    if id == SMSG_BEING_VISIBLE {
        let len = if version >= EPOCH_WIDE_SPAWN {
            SPAWN_LEN_WIDE
        } else {
            SPAWN_LEN
        };
        return Some(PacketLength::Fixed(len));
    }
    base_packet_length(id)
}
