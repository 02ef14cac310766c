//! Protocol-affecting client configuration.
//!
//! Settings that change how the protocol layer behaves mid-session live
//! here; the network manager re-applies them to the loaded family on
//! `reload`/`reload_partially` so an in-game settings change takes effect
//! without reconnecting.

use anyhow::{Context, Result};
use serde::Deserialize;

/// Minimum intervals, in milliseconds, between sends of each flood-prone
/// action.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RateLimits {
    /// Public chat lines.
    pub chat_ms: u64,
    /// Whispers.
    pub whisper_ms: u64,
    /// Walk requests.
    pub move_ms: u64,
    /// Sit/stand toggles.
    pub sit_ms: u64,
    /// Attack requests.
    pub attack_ms: u64,
    /// NPC dialog replies.
    pub npc_ms: u64,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            chat_ms: 300,
            whisper_ms: 300,
            move_ms: 100,
            sit_ms: 500,
            attack_ms: 0,
            npc_ms: 100,
        }
    }
}

/// Network-layer configuration.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NetConfig {
    /// Request per-being movement synchronization where the family supports
    /// it (extra correction messages from the server).
    pub sync_beings: bool,
    /// Upper bound on messages dispatched per pump; excess messages wait
    /// for the next frame.
    pub dispatch_budget: usize,
    /// Cap on remembered outstanding whisper addressees.
    pub whisper_queue_limit: usize,
    /// Outgoing rate limits.
    pub limits: RateLimits,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            sync_beings: false,
            dispatch_budget: 100,
            whisper_queue_limit: 20,
            limits: RateLimits::default(),
        }
    }
}

impl NetConfig {
    /// Parse from the client's TOML settings fragment.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("failed to parse network configuration")
    }
}
