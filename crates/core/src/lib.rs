#![warn(missing_docs)]
//! Core identifiers and collaborator interfaces shared across the client.
//!
//! The protocol layer decodes server messages and applies their effects
//! through the traits in [`collaborators`]; the game simulation owns the
//! actual state and implements those traits. Keeping the surface here, in a
//! leaf crate, lets the net crate and the simulation evolve independently.

pub mod collaborators;

use serde::{Deserialize, Serialize};

/// Stable identifier for an actor (player, monster, NPC) on the server.
///
/// Server families disagree on how ids are allocated, but all of them fit in
/// 32 bits on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BeingId(pub u32);

impl BeingId {
    /// Id the server uses for "no being" in optional fields.
    pub const NONE: Self = Self(0);
}

/// Player stats updated by the stat-update message group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum PlayerStat {
    /// Walk speed in server units.
    Speed = 0,
    /// Current hit points.
    Hp = 5,
    /// Maximum hit points.
    MaxHp = 6,
    /// Current mana.
    Mp = 7,
    /// Maximum mana.
    MaxMp = 8,
    /// Character level.
    Level = 11,
    /// Money carried.
    Money = 20,
}

impl PlayerStat {
    /// Try to convert from the on-wire stat code.
    pub const fn from_u16(value: u16) -> Option<Self> {
        match value {
            0 => Some(Self::Speed),
            5 => Some(Self::Hp),
            6 => Some(Self::MaxHp),
            7 => Some(Self::Mp),
            8 => Some(Self::MaxMp),
            11 => Some(Self::Level),
            20 => Some(Self::Money),
            _ => None,
        }
    }

    /// On-wire stat code.
    pub const fn as_u16(self) -> u16 {
        self as u16
    }
}

/// Where a chat line should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatKind {
    /// Spoken nearby, attributed to a being.
    Public,
    /// Private message addressed to the player.
    Whisper,
    /// Server-wide announcement.
    Announcement,
}

/// Coarse action state of a being, as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BeingAction {
    /// Standing idle.
    Stand,
    /// Walking toward a destination.
    Move,
    /// Sitting.
    Sit,
    /// Playing the death animation.
    Dead,
}
