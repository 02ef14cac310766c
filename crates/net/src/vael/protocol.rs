//! Message ids shared by the Vael forks.
//!
//! Both forks inherited this id space; ids added after the split live with
//! the fork that added them. The base catalog covers every shared inbound id
//! except the being-spawn message, whose length is a fork matter.

use crate::family::PacketLength;

// Inbound.
pub const SMSG_MAP_LOADED: u16 = 0x0073;
pub const SMSG_BEING_VISIBLE: u16 = 0x0078;
pub const SMSG_BEING_MOVE: u16 = 0x007B;
pub const SMSG_BEING_REMOVE: u16 = 0x0080;
pub const SMSG_CONNECTION_PROBLEM: u16 = 0x0081;
pub const SMSG_BEING_ACTION: u16 = 0x008A;
pub const SMSG_BEING_CHAT: u16 = 0x008D;
pub const SMSG_PLAYER_CHAT: u16 = 0x008E;
pub const SMSG_PLAYER_WARP: u16 = 0x0091;
pub const SMSG_WHISPER: u16 = 0x0097;
pub const SMSG_WHISPER_RESPONSE: u16 = 0x0098;
pub const SMSG_GM_ANNOUNCEMENT: u16 = 0x009A;
pub const SMSG_PLAYER_STAT_1: u16 = 0x00B0;
pub const SMSG_PLAYER_STAT_2: u16 = 0x00B1;
pub const SMSG_NPC_MESSAGE: u16 = 0x00B4;
pub const SMSG_NPC_NEXT: u16 = 0x00B5;
pub const SMSG_NPC_CLOSE: u16 = 0x00B6;
pub const SMSG_NPC_CHOICE: u16 = 0x00B7;
pub const SMSG_BEING_LOOKS: u16 = 0x00C3;
pub const SMSG_NPC_INT_INPUT: u16 = 0x0142;
pub const SMSG_NPC_STR_INPUT: u16 = 0x01D4;
pub const SMSG_BEING_LOOKS_WIDE: u16 = 0x01D7;

// Outbound.
pub const CMSG_SYNC_REQUEST: u16 = 0x007E;
pub const CMSG_PLAYER_MOVE: u16 = 0x0085;
pub const CMSG_PLAYER_ACTION: u16 = 0x0089;
pub const CMSG_CHAT_MESSAGE: u16 = 0x008C;
pub const CMSG_NPC_TALK: u16 = 0x0090;
pub const CMSG_CHAT_WHISPER: u16 = 0x0096;
pub const CMSG_NPC_CHOICE_RESPONSE: u16 = 0x00B8;
pub const CMSG_NPC_NEXT_REQUEST: u16 = 0x00B9;
pub const CMSG_NPC_INT_RESPONSE: u16 = 0x0143;
pub const CMSG_NPC_CLOSE_REQUEST: u16 = 0x0146;
pub const CMSG_NPC_STR_RESPONSE: u16 = 0x01D5;

/// Action codes carried by [`CMSG_PLAYER_ACTION`] and echoed back in
/// [`SMSG_BEING_ACTION`].
pub const ACTION_SIT: u8 = 2;
pub const ACTION_STAND: u8 = 3;
pub const ACTION_ATTACK: u8 = 7;

/// On-wire size of fixed name fields (whisper addressee).
pub const NAME_LEN: usize = 24;

/// On-wire size of map name fields.
pub const MAP_NAME_LEN: usize = 16;

/// Length rule for the shared inbound ids. The being-spawn id is absent;
/// each fork sizes it itself.
pub fn base_packet_length(id: u16) -> Option<PacketLength> {
    use PacketLength::{Fixed, Variable};
    let rule = match id {
        SMSG_MAP_LOADED => Fixed(11),
        SMSG_BEING_MOVE => Fixed(60),
        SMSG_BEING_REMOVE => Fixed(7),
        SMSG_CONNECTION_PROBLEM => Fixed(3),
        SMSG_BEING_ACTION => Fixed(29),
        SMSG_BEING_CHAT => Variable,
        SMSG_PLAYER_CHAT => Variable,
        SMSG_PLAYER_WARP => Fixed(22),
        SMSG_WHISPER => Variable,
        SMSG_WHISPER_RESPONSE => Fixed(3),
        SMSG_GM_ANNOUNCEMENT => Variable,
        SMSG_PLAYER_STAT_1 | SMSG_PLAYER_STAT_2 => Fixed(8),
        SMSG_NPC_MESSAGE => Variable,
        SMSG_NPC_NEXT | SMSG_NPC_CLOSE => Fixed(6),
        SMSG_NPC_CHOICE => Variable,
        SMSG_BEING_LOOKS => Fixed(8),
        SMSG_NPC_INT_INPUT | SMSG_NPC_STR_INPUT => Fixed(6),
        SMSG_BEING_LOOKS_WIDE => Fixed(11),
        _ => return None,
    };
    Some(rule)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_fixed_length_covers_its_header() {
        for id in 0x0070..0x0200u16 {
            if let Some(PacketLength::Fixed(len)) = base_packet_length(id) {
                assert!(len >= 2, "id {id:#06x} shorter than its header");
            }
        }
    }

    #[test]
    fn spawn_and_unlisted_ids_have_no_base_rule() {
        assert_eq!(base_packet_length(SMSG_BEING_VISIBLE), None);
        assert_eq!(base_packet_length(0x7FFF), None);
    }
}
