//! Outgoing packet rate limiting.
//!
//! Servers kick clients that flood chat, movement, or sit requests. The
//! limiter enforces a minimum interval per action kind before
//! the message is ever encoded; a denied action is simply not sent and the
//! UI treats it as a no-op.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::RateLimits;

/// Outgoing player action kinds subject to rate limiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketAction {
    /// Public chat line.
    Chat,
    /// Private message.
    Whisper,
    /// Walk request.
    Move,
    /// Sit/stand toggle.
    Sit,
    /// Attack request.
    Attack,
    /// NPC dialog reply of any kind.
    NpcInput,
}

const ACTION_COUNT: usize = 6;

impl PacketAction {
    fn index(self) -> usize {
        match self {
            PacketAction::Chat => 0,
            PacketAction::Whisper => 1,
            PacketAction::Move => 2,
            PacketAction::Sit => 3,
            PacketAction::Attack => 4,
            PacketAction::NpcInput => 5,
        }
    }
}

/// Minimum-interval limiter over all action kinds.
pub struct PacketLimiter {
    intervals: [Duration; ACTION_COUNT],
    last_sent: [Option<Instant>; ACTION_COUNT],
}

impl PacketLimiter {
    /// Build from configured intervals.
    pub fn new(limits: &RateLimits) -> Self {
        Self {
            intervals: [
                Duration::from_millis(limits.chat_ms),
                Duration::from_millis(limits.whisper_ms),
                Duration::from_millis(limits.move_ms),
                Duration::from_millis(limits.sit_ms),
                Duration::from_millis(limits.attack_ms),
                Duration::from_millis(limits.npc_ms),
            ],
            last_sent: [None; ACTION_COUNT],
        }
    }

    /// Re-apply configured intervals without resetting send history.
    pub fn apply(&mut self, limits: &RateLimits) {
        self.intervals = [
            Duration::from_millis(limits.chat_ms),
            Duration::from_millis(limits.whisper_ms),
            Duration::from_millis(limits.move_ms),
            Duration::from_millis(limits.sit_ms),
            Duration::from_millis(limits.attack_ms),
            Duration::from_millis(limits.npc_ms),
        ];
    }

    /// Whether `action` may be sent at `now`; records the send when allowed.
    pub fn allow_at(&mut self, action: PacketAction, now: Instant) -> bool {
        let idx = action.index();
        let allowed = match self.last_sent[idx] {
            Some(last) => now.duration_since(last) >= self.intervals[idx],
            None => true,
        };
        if allowed {
            self.last_sent[idx] = Some(now);
        } else {
            debug!(?action, "rate limited");
        }
        allowed
    }

    /// [`allow_at`](Self::allow_at) with the current time.
    pub fn allow(&mut self, action: PacketAction) -> bool {
        self.allow_at(action, Instant::now())
    }

    /// Forget send history, e.g. on reconnect.
    pub fn reset(&mut self) {
        self.last_sent = [None; ACTION_COUNT];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enforces_minimum_interval_per_action() {
        let mut limiter = PacketLimiter::new(&RateLimits::default());
        let t0 = Instant::now();
        assert!(limiter.allow_at(PacketAction::Chat, t0));
        assert!(!limiter.allow_at(PacketAction::Chat, t0 + Duration::from_millis(10)));
        // A different action is not affected.
        assert!(limiter.allow_at(PacketAction::Move, t0 + Duration::from_millis(10)));
        assert!(limiter.allow_at(PacketAction::Chat, t0 + Duration::from_millis(1000)));
    }

    #[test]
    fn reset_forgets_history() {
        let mut limiter = PacketLimiter::new(&RateLimits::default());
        let t0 = Instant::now();
        assert!(limiter.allow_at(PacketAction::Sit, t0));
        assert!(!limiter.allow_at(PacketAction::Sit, t0));
        limiter.reset();
        assert!(limiter.allow_at(PacketAction::Sit, t0));
    }
}
