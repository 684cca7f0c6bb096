//! Debounced gesture state machine.
//!
//! Holds the single active gesture and the deadline at which it reverts to
//! [`GestureKind::None`]. Expiry is derived lazily from the stored deadline
//! on every observation or poll, so a newer gesture can never be cleared by
//! an older gesture's deadline.

use handsign_core::{GestureKind, Timestamp};
use serde::{Deserialize, Serialize};

/// How long a detected gesture stays active without being re-detected.
pub const DEFAULT_DEBOUNCE_SECS: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum GestureState {
    #[default]
    Idle,
    Active {
        kind: GestureKind,
        expires_at: Timestamp,
    },
}

/// State change produced by an observation or an expiry poll.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum GestureTransition {
    /// Idle to active.
    Detected { gesture: GestureKind },
    /// Active gesture overwritten by a different one.
    Replaced { from: GestureKind, to: GestureKind },
    /// Same gesture re-detected; deadline pushed out.
    Refreshed { gesture: GestureKind },
    /// Deadline passed; back to idle.
    Cleared { gesture: GestureKind },
}

/// What subscribers receive once per processed frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GestureUpdate {
    pub timestamp: Timestamp,
    pub gesture: GestureKind,
    pub transition: Option<GestureTransition>,
}

#[derive(Debug, Clone)]
pub struct GestureStateMachine {
    state: GestureState,
    debounce_secs: f64,
}

impl GestureStateMachine {
    pub fn new(debounce_secs: f64) -> Self {
        Self {
            state: GestureState::Idle,
            debounce_secs,
        }
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn debounce_secs(&self) -> f64 {
        self.debounce_secs
    }

    /// Gesture as seen at `now`, without mutating state.
    pub fn current(&self, now: Timestamp) -> GestureKind {
        match self.state {
            GestureState::Active { kind, expires_at } if now < expires_at => kind,
            _ => GestureKind::None,
        }
    }

    /// Drop the active gesture if its deadline has passed.
    pub fn expire(&mut self, now: Timestamp) -> Option<GestureTransition> {
        match self.state {
            GestureState::Active { kind, expires_at } if now >= expires_at => {
                self.state = GestureState::Idle;
                Some(GestureTransition::Cleared { gesture: kind })
            }
            _ => None,
        }
    }

    /// Feed one frame's classification result.
    ///
    /// Any non-`None` kind overwrites the active gesture and resets its
    /// deadline. `None` leaves an unexpired gesture in place.
    pub fn observe(&mut self, kind: GestureKind, now: Timestamp) -> Option<GestureTransition> {
        let expired = self.expire(now);
        if kind.is_none() {
            return expired;
        }

        let transition = match self.state {
            GestureState::Idle => GestureTransition::Detected { gesture: kind },
            GestureState::Active { kind: prior, .. } if prior == kind => {
                GestureTransition::Refreshed { gesture: kind }
            }
            GestureState::Active { kind: prior, .. } => GestureTransition::Replaced {
                from: prior,
                to: kind,
            },
        };

        self.state = GestureState::Active {
            kind,
            expires_at: now.offset(self.debounce_secs),
        };
        Some(transition)
    }

    pub fn reset(&mut self) {
        self.state = GestureState::Idle;
    }
}

impl Default for GestureStateMachine {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_SECS)
    }
}
