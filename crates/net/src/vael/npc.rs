//! NPC dialog state machine.
//!
//! The server drives the dialog: text, a continuation prompt, a choice menu,
//! or an input request arrive as messages, and the player's replies are only
//! valid in the matching state. Tracking the state client-side lets the
//! outgoing side refuse replies the server would reject (or worse, misread),
//! which stock servers are known to do when a laggy client double-clicks.
//!
//! ```text
//! Idle -> Talking -> (ChoiceInput | NumberInput | TextInput) -> Closed -> Idle
//! ```
//!
//! Each loaded family owns one dialog instance; only one NPC conversation is
//! ever active at a time.

use riftmere_core::BeingId;
use tracing::warn;

/// Where the single active NPC conversation currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogState {
    /// No conversation.
    Idle,
    /// Dialog text is showing; a "next" or an input request may follow.
    Talking,
    /// The server presented a menu and awaits a one-based choice.
    ChoiceInput,
    /// The server awaits an integer.
    NumberInput,
    /// The server awaits a line of text.
    TextInput,
    /// The server ended the dialog; the window is still on screen until the
    /// player dismisses it.
    Closed,
}

/// State machine for the active NPC conversation.
pub struct NpcDialog {
    state: DialogState,
    npc: BeingId,
}

impl Default for NpcDialog {
    fn default() -> Self {
        Self::new()
    }
}

impl NpcDialog {
    /// Fresh machine in [`DialogState::Idle`].
    pub fn new() -> Self {
        Self {
            state: DialogState::Idle,
            npc: BeingId::NONE,
        }
    }

    /// Current state.
    pub fn state(&self) -> DialogState {
        self.state
    }

    /// The NPC of the active conversation, or [`BeingId::NONE`].
    pub fn npc(&self) -> BeingId {
        self.npc
    }

    fn reject(&self, event: &'static str) {
        warn!(?event, state = ?self.state, "npc dialog event out of order");
    }

    /// Dialog text arrived. Starts a conversation from `Idle` (or from a
    /// `Closed` window the server reuses) and appends while `Talking`.
    pub fn on_text(&mut self, npc: BeingId) -> bool {
        match self.state {
            DialogState::Idle | DialogState::Closed => {
                self.state = DialogState::Talking;
                self.npc = npc;
                true
            }
            DialogState::Talking if self.npc == npc => true,
            _ => {
                self.reject("text");
                false
            }
        }
    }

    /// The server asked for a "next" click. Only meaningful mid-dialog.
    pub fn on_next(&mut self, npc: BeingId) -> bool {
        if self.state == DialogState::Talking && self.npc == npc {
            true
        } else {
            self.reject("next");
            false
        }
    }

    /// A choice menu arrived.
    pub fn on_choices(&mut self, npc: BeingId) -> bool {
        self.enter_input(npc, DialogState::ChoiceInput, "choices")
    }

    /// An integer input request arrived.
    pub fn on_number_request(&mut self, npc: BeingId) -> bool {
        self.enter_input(npc, DialogState::NumberInput, "number request")
    }

    /// A text input request arrived.
    pub fn on_text_request(&mut self, npc: BeingId) -> bool {
        self.enter_input(npc, DialogState::TextInput, "text request")
    }

    fn enter_input(&mut self, npc: BeingId, next: DialogState, event: &'static str) -> bool {
        if self.state == DialogState::Talking && self.npc == npc {
            self.state = next;
            true
        } else {
            self.reject(event);
            false
        }
    }

    /// The server closed the dialog.
    pub fn on_close(&mut self, npc: BeingId) -> bool {
        if self.state == DialogState::Idle || self.npc != npc {
            self.reject("close");
            return false;
        }
        self.state = DialogState::Closed;
        true
    }

    /// Whether a reply of the given input kind may be sent right now; used
    /// by the outgoing encoders before building the reply frame. `expected`
    /// is the input state the reply belongs to.
    pub fn may_reply(&self, expected: DialogState) -> bool {
        self.state == expected
    }

    /// A reply was sent; input states fall back to `Talking` until the
    /// server speaks again.
    pub fn replied(&mut self) {
        if matches!(
            self.state,
            DialogState::ChoiceInput | DialogState::NumberInput | DialogState::TextInput
        ) {
            self.state = DialogState::Talking;
        }
    }

    /// The player dismissed the window; the conversation is over regardless
    /// of what state the server left it in.
    pub fn dismissed(&mut self) {
        self.state = DialogState::Idle;
        self.npc = BeingId::NONE;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NPC: BeingId = BeingId(900);
    const OTHER: BeingId = BeingId(901);

    #[test]
    fn full_conversation_cycle() {
        let mut dialog = NpcDialog::new();
        assert!(dialog.on_text(NPC));
        assert_eq!(dialog.state(), DialogState::Talking);
        assert!(dialog.on_next(NPC));
        assert!(dialog.on_choices(NPC));
        assert!(dialog.may_reply(DialogState::ChoiceInput));
        dialog.replied();
        assert_eq!(dialog.state(), DialogState::Talking);
        assert!(dialog.on_close(NPC));
        assert_eq!(dialog.state(), DialogState::Closed);
        dialog.dismissed();
        assert_eq!(dialog.state(), DialogState::Idle);
        assert_eq!(dialog.npc(), BeingId::NONE);
    }

    #[test]
    fn out_of_order_events_keep_state() {
        let mut dialog = NpcDialog::new();
        assert!(!dialog.on_next(NPC));
        assert!(!dialog.on_choices(NPC));
        assert_eq!(dialog.state(), DialogState::Idle);

        assert!(dialog.on_text(NPC));
        assert!(dialog.on_number_request(NPC));
        // A second input request without a reply in between is bogus.
        assert!(!dialog.on_text_request(NPC));
        assert_eq!(dialog.state(), DialogState::NumberInput);
    }

    #[test]
    fn events_for_another_npc_are_rejected() {
        let mut dialog = NpcDialog::new();
        assert!(dialog.on_text(NPC));
        assert!(!dialog.on_choices(OTHER));
        assert!(!dialog.on_close(OTHER));
        assert_eq!(dialog.state(), DialogState::Talking);
        assert_eq!(dialog.npc(), NPC);
    }

    #[test]
    fn closed_window_can_host_a_new_conversation() {
        let mut dialog = NpcDialog::new();
        assert!(dialog.on_text(NPC));
        assert!(dialog.on_close(NPC));
        assert!(dialog.on_text(OTHER));
        assert_eq!(dialog.state(), DialogState::Talking);
        assert_eq!(dialog.npc(), OTHER);
    }

    #[test]
    fn replies_outside_their_input_state_are_refused() {
        let mut dialog = NpcDialog::new();
        dialog.on_text(NPC);
        assert!(!dialog.may_reply(DialogState::NumberInput));
        dialog.on_number_request(NPC);
        assert!(dialog.may_reply(DialogState::NumberInput));
        assert!(!dialog.may_reply(DialogState::TextInput));
    }
}
