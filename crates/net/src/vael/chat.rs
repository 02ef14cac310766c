//! Whisper bookkeeping shared between the outgoing encoder and the inbound
//! handler.
//!
//! The whisper-result message carries no addressee, only a status byte; the
//! client must remember, in send order, who each outstanding whisper went to.
//! Results arrive in the same order the whispers were sent.

use std::collections::VecDeque;

use tracing::warn;

/// Queue of addressees of whispers still awaiting a server verdict.
pub struct WhisperQueue {
    nicks: VecDeque<String>,
    limit: usize,
}

impl WhisperQueue {
    /// Queue holding at most `limit` outstanding addressees.
    pub fn new(limit: usize) -> Self {
        Self {
            nicks: VecDeque::new(),
            limit,
        }
    }

    /// Remember the addressee of a whisper about to be sent. Returns `false`
    /// without queueing when the cap is reached; the caller should hold the
    /// whisper rather than lose track of its result.
    pub fn push(&mut self, nick: &str) -> bool {
        if self.nicks.len() >= self.limit {
            warn!(limit = self.limit, "too many unanswered whispers");
            return false;
        }
        self.nicks.push_back(nick.to_owned());
        true
    }

    /// Take the addressee the next whisper result belongs to. `None` means
    /// the server sent a result we never asked about.
    pub fn pop(&mut self) -> Option<String> {
        let nick = self.nicks.pop_front();
        if nick.is_none() {
            warn!("whisper result with no outstanding whisper");
        }
        nick
    }

    /// Outstanding count.
    pub fn len(&self) -> usize {
        self.nicks.len()
    }

    /// True when nothing is outstanding.
    pub fn is_empty(&self) -> bool {
        self.nicks.is_empty()
    }

    /// Drop all outstanding addressees, e.g. on disconnect.
    pub fn clear(&mut self) {
        self.nicks.clear();
    }

    /// Adjust the cap; already-queued addressees are kept even when the new
    /// cap is lower.
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn results_match_send_order() {
        let mut queue = WhisperQueue::new(4);
        assert!(queue.push("Alice"));
        assert!(queue.push("Bob"));
        assert_eq!(queue.pop().as_deref(), Some("Alice"));
        assert_eq!(queue.pop().as_deref(), Some("Bob"));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn cap_refuses_further_whispers() {
        let mut queue = WhisperQueue::new(2);
        assert!(queue.push("a"));
        assert!(queue.push("b"));
        assert!(!queue.push("c"));
        assert_eq!(queue.len(), 2);
        queue.pop();
        assert!(queue.push("c"));
    }

    #[test]
    fn clear_drops_everything() {
        let mut queue = WhisperQueue::new(4);
        queue.push("a");
        queue.clear();
        assert!(queue.is_empty());
    }
}
