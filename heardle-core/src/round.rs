use crate::{GuessMatcher, ScoringEngine, SharedClock, is_blank};
use chrono::{DateTime, Utc};
use heardle_types::{EngineError, RoundSnapshot, RoundStatus, ScoredGuess, TrackReference};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct GuessSubmission {
    pub raw_text: String,
    pub submitted_at: DateTime<Utc>,
}

impl GuessSubmission {
    pub fn new(raw_text: impl Into<String>, submitted_at: DateTime<Utc>) -> Self {
        Self {
            raw_text: raw_text.into(),
            submitted_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Round {
    pub number: u32,
    pub track: TrackReference,
    pub started_at: DateTime<Utc>,
    pub locked: bool,
}

impl Round {
    /// Seconds between round start and `at`, never negative.
    pub fn elapsed_seconds(&self, at: DateTime<Utc>) -> f64 {
        let millis = (at - self.started_at).num_milliseconds();
        (millis as f64 / 1000.0).max(0.0)
    }
}

/// Owns the single active round of a game session and its lockout flag.
///
/// Announcements and guesses are applied in arrival order. A guess meant for the
/// previous track that lands after `start_round` is judged against the new track
/// (last applied wins) and will almost always miss. When a tracker is shared
/// between threads the caller must hold one lock across each whole call.
#[derive(Debug)]
pub struct RoundTracker {
    clock: SharedClock,
    current: Option<Round>,
    rounds_started: u32,
}

impl RoundTracker {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            clock,
            current: None,
            rounds_started: 0,
        }
    }

    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    pub fn status(&self) -> RoundStatus {
        match &self.current {
            None => RoundStatus::NoRound,
            Some(round) if round.locked => RoundStatus::Locked,
            Some(_) => RoundStatus::Unlocked,
        }
    }

    pub fn is_locked(&self) -> bool {
        self.status() == RoundStatus::Locked
    }

    pub fn current_round(&self) -> Option<&Round> {
        self.current.as_ref()
    }

    /// Replace whatever round is active with a fresh, unlocked one for `track`.
    /// Returns the new round number.
    pub fn start_round(&mut self, track: TrackReference) -> Result<u32, EngineError> {
        if !track.is_complete() {
            return Err(EngineError::InvalidTrackReference);
        }

        self.rounds_started += 1;
        self.current = Some(Round {
            number: self.rounds_started,
            track,
            started_at: self.clock.now(),
            locked: false,
        });

        debug!("Round {} started", self.rounds_started);
        Ok(self.rounds_started)
    }

    pub fn submit_guess(&mut self, submission: &GuessSubmission) -> Result<ScoredGuess, EngineError> {
        if self.is_locked() {
            return Err(EngineError::AlreadyLocked);
        }

        if is_blank(&submission.raw_text) {
            return Err(EngineError::EmptyGuess);
        }

        // No track announced yet: nothing to match against
        let Some(round) = self.current.as_mut() else {
            return Ok(ScoredGuess::miss());
        };

        let match_class = GuessMatcher::evaluate(&submission.raw_text, &round.track);
        let elapsed = round.elapsed_seconds(submission.submitted_at);
        let scored = ScoringEngine::scored(match_class, elapsed);

        if match_class.is_match() {
            round.locked = true;
            debug!(
                "Round {} locked by {:?} match after {:.1}s ({} points)",
                round.number, match_class, elapsed, scored.points
            );
        }

        Ok(scored)
    }

    /// Submit `raw_text` timestamped by the tracker's own clock.
    pub fn guess_now(&mut self, raw_text: &str) -> Result<ScoredGuess, EngineError> {
        let submission = GuessSubmission::new(raw_text, self.clock.now());
        self.submit_guess(&submission)
    }

    pub fn snapshot(&self) -> RoundSnapshot {
        match &self.current {
            None => RoundSnapshot::no_round(),
            Some(round) => RoundSnapshot {
                status: self.status(),
                round_number: round.number,
                started_at: Some(round.started_at.to_rfc3339()),
                revealed_track: round.locked.then(|| round.track.clone()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Clock, ManualClock};
    use heardle_types::MatchClass;

    fn tracker() -> (RoundTracker, ManualClock) {
        let clock = ManualClock::starting_now();
        (RoundTracker::new(clock.shared()), clock)
    }

    fn track() -> TrackReference {
        TrackReference::new("Blinding Lights", "The Weeknd")
    }

    #[test]
    fn test_initial_state() {
        let (tracker, _) = tracker();
        assert_eq!(tracker.status(), RoundStatus::NoRound);
        assert!(tracker.current_round().is_none());
        assert_eq!(tracker.snapshot(), RoundSnapshot::no_round());
    }

    #[test]
    fn test_start_round_records_start_time() {
        let (mut tracker, clock) = tracker();
        let number = tracker.start_round(track()).unwrap();

        assert_eq!(number, 1);
        assert_eq!(tracker.status(), RoundStatus::Unlocked);
        let round = tracker.current_round().unwrap();
        assert_eq!(round.started_at, clock.now());
        assert!(!round.locked);
    }

    #[test]
    fn test_miss_keeps_round_open() {
        let (mut tracker, _) = tracker();
        tracker.start_round(track()).unwrap();

        let scored = tracker.guess_now("blinding lights").unwrap();
        assert_eq!(scored, ScoredGuess::miss());
        assert_eq!(tracker.status(), RoundStatus::Unlocked);
    }

    #[test]
    fn test_match_locks_round() {
        let (mut tracker, clock) = tracker();
        tracker.start_round(track()).unwrap();
        clock.advance_secs(10.0);

        let scored = tracker.guess_now("the weeknd").unwrap();
        assert_eq!(scored.match_class, MatchClass::ArtistOnly);
        assert_eq!(scored.points, 8);
        assert!(tracker.is_locked());
    }

    #[test]
    fn test_locked_rejects_before_empty_check() {
        let (mut tracker, _) = tracker();
        tracker.start_round(track()).unwrap();
        tracker.guess_now("blinding lights the weeknd").unwrap();

        assert_eq!(tracker.guess_now(""), Err(EngineError::AlreadyLocked));
        assert_eq!(tracker.guess_now("the weeknd"), Err(EngineError::AlreadyLocked));
    }

    #[test]
    fn test_empty_guess_rejected_without_state_change() {
        let (mut tracker, _) = tracker();
        tracker.start_round(track()).unwrap();

        assert_eq!(tracker.guess_now(""), Err(EngineError::EmptyGuess));
        assert_eq!(tracker.guess_now(" \t "), Err(EngineError::EmptyGuess));
        assert_eq!(tracker.status(), RoundStatus::Unlocked);
    }

    #[test]
    fn test_guess_without_round_scores_nothing() {
        let (mut tracker, _) = tracker();
        let scored = tracker.guess_now("the weeknd").unwrap();
        assert_eq!(scored, ScoredGuess::miss());
        assert_eq!(tracker.status(), RoundStatus::NoRound);

        // Empty guesses are still rejected
        assert_eq!(tracker.guess_now(""), Err(EngineError::EmptyGuess));
    }

    #[test]
    fn test_invalid_track_leaves_previous_round() {
        let (mut tracker, _) = tracker();
        tracker.start_round(track()).unwrap();
        tracker.guess_now("the weeknd").unwrap();

        let result = tracker.start_round(TrackReference::new("Levitating", "  "));
        assert_eq!(result, Err(EngineError::InvalidTrackReference));
        assert!(tracker.is_locked());
        assert_eq!(tracker.current_round().unwrap().track, track());
        assert_eq!(tracker.current_round().unwrap().number, 1);
    }

    #[test]
    fn test_new_round_unlocks_and_resets_clock() {
        let (mut tracker, clock) = tracker();
        tracker.start_round(track()).unwrap();
        tracker.guess_now("the weeknd").unwrap();
        assert!(tracker.is_locked());

        clock.advance_secs(60.0);
        let number = tracker
            .start_round(TrackReference::new("Levitating", "Dua Lipa"))
            .unwrap();
        assert_eq!(number, 2);
        assert_eq!(tracker.status(), RoundStatus::Unlocked);

        // Decay restarts from the new round's start
        let scored = tracker.guess_now("levitating dua lipa").unwrap();
        assert_eq!(scored.points, 25);
    }

    #[test]
    fn test_restarting_unlocked_round() {
        let (mut tracker, _) = tracker();
        tracker.start_round(track()).unwrap();
        tracker.start_round(track()).unwrap();
        assert_eq!(tracker.status(), RoundStatus::Unlocked);
        assert_eq!(tracker.current_round().unwrap().number, 2);
    }

    #[test]
    fn test_stale_guess_is_judged_against_new_track() {
        let (mut tracker, clock) = tracker();
        tracker.start_round(track()).unwrap();
        let stale = GuessSubmission::new("blinding lights the weeknd", clock.now());

        tracker
            .start_round(TrackReference::new("Levitating", "Dua Lipa"))
            .unwrap();
        let scored = tracker.submit_guess(&stale).unwrap();
        assert_eq!(scored, ScoredGuess::miss());
    }

    #[test]
    fn test_submission_before_round_start_counts_as_instant() {
        let (mut tracker, clock) = tracker();
        let early = GuessSubmission::new("blinding lights the weeknd", clock.now());
        clock.advance_secs(5.0);
        tracker.start_round(track()).unwrap();

        let scored = tracker.submit_guess(&early).unwrap();
        assert_eq!(scored.points, 25);
    }

    #[test]
    fn test_snapshot_reveals_track_only_after_lock() {
        let (mut tracker, _) = tracker();
        tracker.start_round(track()).unwrap();

        let open = tracker.snapshot();
        assert_eq!(open.status, RoundStatus::Unlocked);
        assert_eq!(open.round_number, 1);
        assert!(open.started_at.is_some());
        assert!(open.revealed_track.is_none());

        tracker.guess_now("blinding lights the weeknd").unwrap();
        let locked = tracker.snapshot();
        assert_eq!(locked.status, RoundStatus::Locked);
        assert_eq!(locked.revealed_track, Some(track()));
    }
}
