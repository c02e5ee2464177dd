use crate::{GuessSubmission, LobbyEvent, RoundTracker, SharedClock, normalize};
use chrono::{DateTime, Duration, Utc};
use heardle_types::{
    LobbyError, LobbyId, LobbyState, PersonalGuess, Player, PlayerId, RoundStatus, ScoredGuess,
    TrackReference,
};
use uuid::Uuid;

pub const MAX_DISPLAY_NAME_CHARS: usize = 32;
pub const DEFAULT_MAX_PLAYERS: u32 = 16;

/// Result of one accepted guess, including the player's new running total.
#[derive(Debug, Clone, PartialEq)]
pub struct GuessOutcome {
    pub player_id: PlayerId,
    pub display_name: String,
    pub text: String,
    pub round_number: u32,
    pub scored: ScoredGuess,
    pub total_points: i32,
    pub submitted_at: DateTime<Utc>,
    /// Set when this guess locked the round
    pub solved_track: Option<TrackReference>,
}

impl GuessOutcome {
    pub fn events(&self, lobby_id: LobbyId) -> Vec<LobbyEvent> {
        let mut events = vec![LobbyEvent::GuessScored {
            lobby_id,
            player_id: self.player_id,
            round_number: self.round_number,
            scored: self.scored,
        }];

        if let Some(track) = &self.solved_track {
            events.push(LobbyEvent::RoundLocked {
                lobby_id,
                round_number: self.round_number,
                solver: self.player_id,
                track: track.clone(),
            });
        }

        events
    }
}

/// One host's game: the roster, their scores and the single active round.
#[derive(Debug)]
pub struct Lobby {
    id: LobbyId,
    host_id: String,
    host_key: Uuid,
    max_players: u32,
    players: Vec<Player>,
    tracker: RoundTracker,
    created_at: DateTime<Utc>,
    last_activity: DateTime<Utc>,
}

impl Lobby {
    pub fn new(host_id: impl Into<String>, max_players: u32, clock: SharedClock) -> Self {
        let now = clock.now();
        Self {
            id: Uuid::new_v4(),
            host_id: host_id.into(),
            host_key: Uuid::new_v4(),
            max_players,
            players: Vec::new(),
            tracker: RoundTracker::new(clock),
            created_at: now,
            last_activity: now,
        }
    }

    pub fn id(&self) -> LobbyId {
        self.id
    }

    pub fn host_id(&self) -> &str {
        &self.host_id
    }

    /// Secret handed to the creator; required for host-only actions.
    pub fn host_key(&self) -> Uuid {
        self.host_key
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, player_id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.player_id == player_id)
    }

    pub fn round_status(&self) -> RoundStatus {
        self.tracker.status()
    }

    pub fn tracker(&self) -> &RoundTracker {
        &self.tracker
    }

    pub fn verify_host(&self, host_key: Uuid) -> Result<(), LobbyError> {
        if host_key == self.host_key {
            Ok(())
        } else {
            Err(LobbyError::NotHost)
        }
    }

    pub fn add_player(&mut self, display_name: &str) -> Result<PlayerId, LobbyError> {
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(LobbyError::InvalidDisplayName {
                reason: "display name is empty".to_string(),
            });
        }
        if display_name.chars().count() > MAX_DISPLAY_NAME_CHARS {
            return Err(LobbyError::InvalidDisplayName {
                reason: format!("display name is longer than {} characters", MAX_DISPLAY_NAME_CHARS),
            });
        }

        let wanted = normalize(display_name);
        if self.players.iter().any(|p| normalize(&p.display_name) == wanted) {
            return Err(LobbyError::DuplicateDisplayName {
                display_name: display_name.to_string(),
            });
        }

        if self.players.len() as u32 >= self.max_players {
            return Err(LobbyError::LobbyFull {
                max_players: self.max_players,
            });
        }

        let player_id = Uuid::new_v4();
        self.players.push(Player {
            player_id,
            display_name: display_name.to_string(),
            points: 0,
            guess_history: Vec::new(),
        });
        self.touch();

        Ok(player_id)
    }

    pub fn remove_player(&mut self, player_id: PlayerId) -> Result<Player, LobbyError> {
        let index = self.player_index(player_id)?;
        self.touch();
        Ok(self.players.remove(index))
    }

    /// The host moved playback to a new track.
    pub fn announce_track(&mut self, track: TrackReference) -> Result<u32, LobbyError> {
        let round_number = self.tracker.start_round(track)?;
        self.touch();
        Ok(round_number)
    }

    pub fn submit_guess(&mut self, player_id: PlayerId, text: &str) -> Result<GuessOutcome, LobbyError> {
        let index = self.player_index(player_id)?;
        let submission = GuessSubmission::new(text.trim(), self.tracker.clock().now());
        self.touch();

        let scored = self.tracker.submit_guess(&submission)?;
        let round = self.tracker.current_round();
        let round_number = round.map(|r| r.number).unwrap_or(0);
        let solved_track = round
            .filter(|_| scored.match_class.is_match())
            .map(|r| r.track.clone());

        let player = &mut self.players[index];
        player.points += scored.points;
        player.guess_history.push(PersonalGuess {
            text: submission.raw_text.clone(),
            round_number,
            match_class: scored.match_class,
            points_earned: scored.points,
            submitted_at: submission.submitted_at.to_rfc3339(),
        });

        Ok(GuessOutcome {
            player_id,
            display_name: player.display_name.clone(),
            text: submission.raw_text,
            round_number,
            scored,
            total_points: player.points,
            submitted_at: submission.submitted_at,
            solved_track,
        })
    }

    pub fn state(&self) -> LobbyState {
        LobbyState {
            id: self.id,
            host_id: self.host_id.clone(),
            created_at: self.created_at.to_rfc3339(),
            max_players: self.max_players,
            players: self.players.clone(),
            round: self.tracker.snapshot(),
        }
    }

    pub fn is_idle(&self, timeout: Duration) -> bool {
        self.tracker.clock().now() - self.last_activity > timeout
    }

    pub fn age(&self) -> Duration {
        self.tracker.clock().now() - self.created_at
    }

    fn player_index(&self, player_id: PlayerId) -> Result<usize, LobbyError> {
        self.players
            .iter()
            .position(|p| p.player_id == player_id)
            .ok_or_else(|| LobbyError::PlayerNotFound {
                player_id: player_id.to_string(),
            })
    }

    fn touch(&mut self) {
        self.last_activity = self.tracker.clock().now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Clock, ManualClock};
    use heardle_types::{EngineError, MatchClass};

    fn create_test_lobby() -> (Lobby, ManualClock) {
        let clock = ManualClock::starting_now();
        (Lobby::new("host-123", 4, clock.shared()), clock)
    }

    fn blinding_lights() -> TrackReference {
        TrackReference::new("Blinding Lights", "The Weeknd")
    }

    #[test]
    fn test_lobby_creation() {
        let (lobby, clock) = create_test_lobby();
        assert_eq!(lobby.host_id(), "host-123");
        assert_eq!(lobby.created_at(), clock.now());
        assert!(lobby.players().is_empty());
        assert_eq!(lobby.round_status(), RoundStatus::NoRound);
        assert_ne!(lobby.id(), lobby.host_key());
    }

    #[test]
    fn test_host_verification() {
        let (lobby, _) = create_test_lobby();
        assert!(lobby.verify_host(lobby.host_key()).is_ok());
        assert_eq!(lobby.verify_host(Uuid::new_v4()), Err(LobbyError::NotHost));
    }

    #[test]
    fn test_display_name_validation() {
        let (mut lobby, _) = create_test_lobby();

        assert!(matches!(
            lobby.add_player("   "),
            Err(LobbyError::InvalidDisplayName { .. })
        ));
        assert!(matches!(
            lobby.add_player(&"x".repeat(MAX_DISPLAY_NAME_CHARS + 1)),
            Err(LobbyError::InvalidDisplayName { .. })
        ));
        assert!(lobby.add_player(&"x".repeat(MAX_DISPLAY_NAME_CHARS)).is_ok());

        lobby.add_player("  Alice ").unwrap();
        assert_eq!(lobby.players()[1].display_name, "Alice");
        assert!(matches!(
            lobby.add_player("ALICE"),
            Err(LobbyError::DuplicateDisplayName { .. })
        ));
    }

    #[test]
    fn test_lobby_capacity() {
        let (mut lobby, _) = create_test_lobby();
        for name in ["Alice", "Bob", "Carol", "Dave"] {
            lobby.add_player(name).unwrap();
        }
        assert_eq!(
            lobby.add_player("Eve"),
            Err(LobbyError::LobbyFull { max_players: 4 })
        );
    }

    #[test]
    fn test_remove_player() {
        let (mut lobby, _) = create_test_lobby();
        let alice = lobby.add_player("Alice").unwrap();

        let removed = lobby.remove_player(alice).unwrap();
        assert_eq!(removed.display_name, "Alice");
        assert!(matches!(
            lobby.remove_player(alice),
            Err(LobbyError::PlayerNotFound { .. })
        ));
        // Name is free again
        assert!(lobby.add_player("alice").is_ok());
    }

    #[test]
    fn test_first_correct_guess_wins_round() {
        let (mut lobby, clock) = create_test_lobby();
        let alice = lobby.add_player("Alice").unwrap();
        let bob = lobby.add_player("Bob").unwrap();
        lobby.announce_track(blinding_lights()).unwrap();

        clock.advance_secs(4.0);
        let miss = lobby.submit_guess(bob, "starboy").unwrap();
        assert_eq!(miss.scored, ScoredGuess::miss());
        assert!(miss.solved_track.is_none());

        let hit = lobby.submit_guess(alice, "Blinding Lights - The Weeknd").unwrap();
        assert_eq!(hit.scored.match_class, MatchClass::Full);
        assert_eq!(hit.scored.points, 23);
        assert_eq!(hit.total_points, 23);
        assert_eq!(hit.solved_track, Some(blinding_lights()));

        // Bob is locked out for the rest of the round
        assert_eq!(
            lobby.submit_guess(bob, "blinding lights the weeknd"),
            Err(LobbyError::Engine(EngineError::AlreadyLocked))
        );

        let state = lobby.state();
        assert_eq!(state.player(alice).unwrap().points, 23);
        assert_eq!(state.player(bob).unwrap().points, 0);
        assert_eq!(state.player(bob).unwrap().guess_history.len(), 1);
        assert_eq!(state.round.revealed_track, Some(blinding_lights()));
    }

    #[test]
    fn test_points_accumulate_across_rounds() {
        let (mut lobby, clock) = create_test_lobby();
        let alice = lobby.add_player("Alice").unwrap();

        lobby.announce_track(blinding_lights()).unwrap();
        lobby.submit_guess(alice, "the weeknd").unwrap();

        clock.advance_secs(30.0);
        let round = lobby
            .announce_track(TrackReference::new("Levitating", "Dua Lipa"))
            .unwrap();
        assert_eq!(round, 2);
        let outcome = lobby.submit_guess(alice, "levitating by dua lipa").unwrap();

        assert_eq!(outcome.round_number, 2);
        assert_eq!(outcome.total_points, 10 + 25);
        let history = &lobby.player(alice).unwrap().guess_history;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].round_number, 1);
        assert_eq!(history[0].match_class, MatchClass::ArtistOnly);
        assert_eq!(history[1].points_earned, 25);
    }

    #[test]
    fn test_rejected_guesses_are_not_recorded() {
        let (mut lobby, _) = create_test_lobby();
        let alice = lobby.add_player("Alice").unwrap();
        lobby.announce_track(blinding_lights()).unwrap();

        assert_eq!(
            lobby.submit_guess(alice, "  "),
            Err(LobbyError::Engine(EngineError::EmptyGuess))
        );
        assert!(lobby.player(alice).unwrap().guess_history.is_empty());

        assert!(matches!(
            lobby.submit_guess(Uuid::new_v4(), "the weeknd"),
            Err(LobbyError::PlayerNotFound { .. })
        ));
    }

    #[test]
    fn test_guess_before_any_track() {
        let (mut lobby, _) = create_test_lobby();
        let alice = lobby.add_player("Alice").unwrap();

        let outcome = lobby.submit_guess(alice, "the weeknd").unwrap();
        assert_eq!(outcome.round_number, 0);
        assert_eq!(outcome.scored, ScoredGuess::miss());
    }

    #[test]
    fn test_invalid_announcement() {
        let (mut lobby, _) = create_test_lobby();
        assert_eq!(
            lobby.announce_track(TrackReference::new("", "X")),
            Err(LobbyError::Engine(EngineError::InvalidTrackReference))
        );
        assert_eq!(lobby.round_status(), RoundStatus::NoRound);
    }

    #[test]
    fn test_outcome_events() {
        let (mut lobby, _) = create_test_lobby();
        let alice = lobby.add_player("Alice").unwrap();
        lobby.announce_track(blinding_lights()).unwrap();

        let miss = lobby.submit_guess(alice, "blinding lights").unwrap();
        assert_eq!(miss.events(lobby.id()).len(), 1);

        let hit = lobby.submit_guess(alice, "the weeknd").unwrap();
        let events = hit.events(lobby.id());
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[1],
            LobbyEvent::RoundLocked { solver, round_number: 1, .. } if *solver == alice
        ));
    }

    #[test]
    fn test_idle_and_age() {
        let (mut lobby, clock) = create_test_lobby();
        clock.advance(Duration::minutes(20));
        assert!(lobby.is_idle(Duration::minutes(10)));

        lobby.add_player("Alice").unwrap();
        assert!(!lobby.is_idle(Duration::minutes(10)));
        assert_eq!(lobby.age(), Duration::minutes(20));
    }
}
