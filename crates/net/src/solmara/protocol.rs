//! Solmara message ids.
//!
//! Solmara shares no lineage with the Vael forks: big-endian fields, every
//! frame prefixed with its own length, and interior strings carried with a
//! u16 length prefix instead of fixed NUL-padded fields.

// Inbound.
pub const SMSG_BEING_ENTER: u16 = 0x0100;
pub const SMSG_BEING_LEAVE: u16 = 0x0101;
pub const SMSG_BEING_MOVE: u16 = 0x0102;
pub const SMSG_BEING_ACTION: u16 = 0x0103;
pub const SMSG_BEING_LOOKS: u16 = 0x0104;
pub const SMSG_CHAT: u16 = 0x0110;
pub const SMSG_WHISPER: u16 = 0x0111;
pub const SMSG_ANNOUNCEMENT: u16 = 0x0112;
pub const SMSG_WHISPER_RESULT: u16 = 0x0118;
pub const SMSG_NPC_TEXT: u16 = 0x0120;
pub const SMSG_NPC_NEXT: u16 = 0x0121;
pub const SMSG_NPC_CHOICES: u16 = 0x0122;
pub const SMSG_NPC_NUMBER_REQUEST: u16 = 0x0123;
pub const SMSG_NPC_TEXT_REQUEST: u16 = 0x0124;
pub const SMSG_NPC_CLOSE: u16 = 0x0125;
pub const SMSG_PLAYER_STAT: u16 = 0x0130;
pub const SMSG_PLAYER_WARP: u16 = 0x0131;
pub const SMSG_CONNECTION_PROBLEM: u16 = 0x0140;

// Outbound.
pub const CMSG_CHAT: u16 = 0x0200;
pub const CMSG_WHISPER: u16 = 0x0201;
pub const CMSG_WALK: u16 = 0x0202;
pub const CMSG_SIT: u16 = 0x0203;
pub const CMSG_ATTACK: u16 = 0x0204;
pub const CMSG_NPC_TALK: u16 = 0x0210;
pub const CMSG_NPC_NEXT: u16 = 0x0211;
pub const CMSG_NPC_CHOOSE: u16 = 0x0212;
pub const CMSG_NPC_NUMBER: u16 = 0x0213;
pub const CMSG_NPC_TEXT: u16 = 0x0214;
pub const CMSG_NPC_DISMISS: u16 = 0x0215;

/// Action codes carried by [`SMSG_BEING_ACTION`].
pub const ACTION_STAND: u8 = 0;
pub const ACTION_MOVE: u8 = 1;
pub const ACTION_SIT: u8 = 2;
pub const ACTION_DEAD: u8 = 3;
