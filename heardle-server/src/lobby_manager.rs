use chrono::Duration;
use dashmap::DashMap;
use std::collections::HashMap;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::rate_limiter::GuessRateLimiter;
use heardle_core::{
    CleanupReason, GuessOutcome, Lobby, LobbyCleanup, LobbyEvent, LobbyEventBus,
    LobbyEventHandler, SharedClock, TracingEventHandler, system_clock,
};
use heardle_types::{
    CreateLobbyResponse, JoinLobbyResponse, LobbyError, LobbyId, LobbyState, PlayerId,
    RoundSnapshot, RoundStatus, TrackReference,
};

/// An accepted guess together with the round view after it was applied.
#[derive(Debug, Clone)]
pub struct SubmittedGuess {
    pub outcome: GuessOutcome,
    pub round: RoundSnapshot,
}

pub struct LobbyManager {
    lobbies: RwLock<HashMap<LobbyId, Lobby>>,
    event_bus: Mutex<LobbyEventBus>,
    rate_limiters: DashMap<PlayerId, GuessRateLimiter>,
    clock: SharedClock,
    cleanup: LobbyCleanup,
    max_players: u32,
    guess_burst: u32,
    guess_refill: Duration,
}

impl LobbyManager {
    pub fn new(config: &Config) -> Self {
        Self::with_clock(config, system_clock())
    }

    pub fn with_clock(config: &Config, clock: SharedClock) -> Self {
        let mut event_bus = LobbyEventBus::new();
        event_bus.add_handler(Box::new(TracingEventHandler));

        Self {
            lobbies: RwLock::new(HashMap::new()),
            event_bus: Mutex::new(event_bus),
            rate_limiters: DashMap::new(),
            clock,
            cleanup: config.lobby_cleanup(),
            max_players: config.max_players_per_lobby,
            guess_burst: config.guess_burst,
            guess_refill: config.guess_refill(),
        }
    }

    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    pub async fn add_event_handler(&self, handler: Box<dyn LobbyEventHandler>) {
        self.event_bus.lock().await.add_handler(handler);
    }

    /// Callers hold the lobbies write guard while publishing so handlers see
    /// events in the same order the lobby state changed.
    async fn publish(&self, events: impl IntoIterator<Item = LobbyEvent>) {
        self.event_bus.lock().await.publish_all(events);
    }

    pub async fn create_lobby(&self, host_id: String) -> CreateLobbyResponse {
        let lobby = Lobby::new(host_id.trim(), self.max_players, self.clock.clone());
        let response = CreateLobbyResponse {
            lobby_id: lobby.id(),
            host_key: lobby.host_key(),
        };
        let event = LobbyEvent::LobbyCreated {
            lobby_id: lobby.id(),
            host_id: lobby.host_id().to_string(),
        };

        let mut lobbies = self.lobbies.write().await;
        lobbies.insert(lobby.id(), lobby);
        self.publish([event]).await;

        response
    }

    /// Lobby state as seen by `viewer`; only the viewer's own guess history is included.
    pub async fn get_state(
        &self,
        lobby_id: LobbyId,
        viewer: Option<PlayerId>,
    ) -> Result<LobbyState, LobbyError> {
        let lobbies = self.lobbies.read().await;
        let lobby = lobbies.get(&lobby_id).ok_or_else(|| not_found(lobby_id))?;
        Ok(lobby.state().personalized_for_player(viewer))
    }

    pub async fn close_lobby(&self, lobby_id: LobbyId, host_key: Uuid) -> Result<(), LobbyError> {
        let mut lobbies = self.lobbies.write().await;
        let lobby = lobbies.get(&lobby_id).ok_or_else(|| not_found(lobby_id))?;
        lobby.verify_host(host_key)?;
        let lobby = lobbies.remove(&lobby_id).ok_or_else(|| not_found(lobby_id))?;

        self.forget_players(&lobby);
        self.publish([LobbyEvent::LobbyClosed {
            lobby_id,
            reason: "Closed by host".to_string(),
        }])
        .await;

        Ok(())
    }

    pub async fn join_lobby(
        &self,
        lobby_id: LobbyId,
        display_name: &str,
    ) -> Result<JoinLobbyResponse, LobbyError> {
        let mut lobbies = self.lobbies.write().await;
        let lobby = lobbies.get_mut(&lobby_id).ok_or_else(|| not_found(lobby_id))?;
        let player_id = lobby.add_player(display_name)?;
        let state = lobby.state().personalized_for_player(Some(player_id));

        let display_name = state
            .player(player_id)
            .map(|p| p.display_name.clone())
            .unwrap_or_default();
        self.publish([LobbyEvent::PlayerJoined {
            lobby_id,
            player_id,
            display_name,
        }])
        .await;

        Ok(JoinLobbyResponse {
            player_id,
            lobby: state,
        })
    }

    pub async fn leave_lobby(&self, lobby_id: LobbyId, player_id: PlayerId) -> Result<(), LobbyError> {
        let mut lobbies = self.lobbies.write().await;
        let lobby = lobbies.get_mut(&lobby_id).ok_or_else(|| not_found(lobby_id))?;
        lobby.remove_player(player_id)?;

        self.rate_limiters.remove(&player_id);
        self.publish([LobbyEvent::PlayerLeft {
            lobby_id,
            player_id,
        }])
        .await;

        Ok(())
    }

    /// Host moved playback to `track`; opens a fresh round for every player.
    pub async fn announce_track(
        &self,
        lobby_id: LobbyId,
        host_key: Uuid,
        track: TrackReference,
    ) -> Result<RoundSnapshot, LobbyError> {
        let mut lobbies = self.lobbies.write().await;
        let lobby = lobbies.get_mut(&lobby_id).ok_or_else(|| not_found(lobby_id))?;
        lobby.verify_host(host_key)?;
        let round_number = lobby.announce_track(track)?;
        let snapshot = lobby.tracker().snapshot();

        self.publish([LobbyEvent::RoundStarted {
            lobby_id,
            round_number,
        }])
        .await;

        Ok(snapshot)
    }

    /// Score one guess. The lobby stays write-locked from the rate check until the
    /// resulting events are published, so concurrent guesses are applied one at a time.
    pub async fn submit_guess(
        &self,
        lobby_id: LobbyId,
        player_id: PlayerId,
        text: &str,
    ) -> Result<SubmittedGuess, LobbyError> {
        let mut lobbies = self.lobbies.write().await;
        let lobby = lobbies.get_mut(&lobby_id).ok_or_else(|| not_found(lobby_id))?;

        if lobby.player(player_id).is_none() {
            return Err(LobbyError::PlayerNotFound {
                player_id: player_id.to_string(),
            });
        }

        if !self.acquire_guess_token(player_id) {
            warn!("Player {} in lobby {} is guessing too fast", player_id, lobby_id);
            return Err(LobbyError::RateLimited);
        }

        let outcome = lobby.submit_guess(player_id, text)?;
        debug!(
            "Guess '{}' by {} in lobby {} round {} -> {:?}",
            outcome.text, player_id, lobby_id, outcome.round_number, outcome.scored
        );

        let submitted = SubmittedGuess {
            round: lobby.tracker().snapshot(),
            outcome,
        };

        self.publish(submitted.outcome.events(lobby_id)).await;
        Ok(submitted)
    }

    fn acquire_guess_token(&self, player_id: PlayerId) -> bool {
        let now = self.clock.now();
        let mut limiter = self
            .rate_limiters
            .entry(player_id)
            .or_insert_with(|| GuessRateLimiter::new(self.guess_burst, self.guess_refill, now));
        limiter.try_acquire(now)
    }

    fn forget_players(&self, lobby: &Lobby) {
        for player in lobby.players() {
            self.rate_limiters.remove(&player.player_id);
        }
    }

    /// Remove idle and overlong lobbies, returning what was closed and why.
    pub async fn cleanup_abandoned_lobbies(&self) -> Vec<(LobbyId, CleanupReason)> {
        let mut lobbies = self.lobbies.write().await;
        let expired: Vec<(LobbyId, CleanupReason)> = lobbies
            .iter()
            .filter_map(|(id, lobby)| self.cleanup.evaluate(lobby).map(|reason| (*id, reason)))
            .collect();
        let removed: Vec<(Lobby, CleanupReason)> = expired
            .into_iter()
            .filter_map(|(id, reason)| lobbies.remove(&id).map(|lobby| (lobby, reason)))
            .collect();

        if removed.is_empty() {
            return Vec::new();
        }

        let mut closed = Vec::with_capacity(removed.len());
        let mut events = Vec::with_capacity(removed.len());
        for (lobby, reason) in &removed {
            self.forget_players(lobby);
            closed.push((lobby.id(), *reason));
            events.push(LobbyEvent::LobbyClosed {
                lobby_id: lobby.id(),
                reason: reason.to_string(),
            });
        }

        info!("Cleaned up {} abandoned lobbies", closed.len());
        self.publish(events).await;
        closed
    }

    /// Number of the round still open for guesses, if any. Guesses from that
    /// round must not be shown to other players yet.
    pub async fn open_round_number(&self, lobby_id: LobbyId) -> Result<Option<u32>, LobbyError> {
        let lobbies = self.lobbies.read().await;
        let lobby = lobbies.get(&lobby_id).ok_or_else(|| not_found(lobby_id))?;
        let snapshot = lobby.tracker().snapshot();
        Ok((snapshot.status == RoundStatus::Unlocked).then_some(snapshot.round_number))
    }

    pub async fn active_lobby_count(&self) -> usize {
        self.lobbies.read().await.len()
    }
}

fn not_found(lobby_id: LobbyId) -> LobbyError {
    LobbyError::LobbyNotFound {
        lobby_id: lobby_id.to_string(),
    }
}
