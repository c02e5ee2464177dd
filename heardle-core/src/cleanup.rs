use crate::Lobby;
use chrono::Duration;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupReason {
    Idle,
    ExceededMaxDuration,
}

impl fmt::Display for CleanupReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CleanupReason::Idle => write!(f, "Inactivity timeout"),
            CleanupReason::ExceededMaxDuration => write!(f, "Lobby exceeded maximum duration"),
        }
    }
}

pub struct LobbyCleanup {
    pub idle_threshold: Duration, // no announcements, joins or guesses
    pub max_duration: Duration,   // hard cap on lobby lifetime
}

impl Default for LobbyCleanup {
    fn default() -> Self {
        Self {
            idle_threshold: Duration::minutes(30),
            max_duration: Duration::hours(4),
        }
    }
}

impl LobbyCleanup {
    pub fn new(idle_threshold: Duration, max_duration: Duration) -> Self {
        Self {
            idle_threshold,
            max_duration,
        }
    }

    /// Why `lobby` should be torn down, if it should.
    pub fn evaluate(&self, lobby: &Lobby) -> Option<CleanupReason> {
        if lobby.age() > self.max_duration {
            return Some(CleanupReason::ExceededMaxDuration);
        }

        if lobby.is_idle(self.idle_threshold) {
            return Some(CleanupReason::Idle);
        }

        None
    }
}
