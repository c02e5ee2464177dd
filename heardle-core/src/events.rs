use heardle_types::{LobbyId, PlayerId, ScoredGuess, TrackReference};
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub enum LobbyEvent {
    LobbyCreated {
        lobby_id: LobbyId,
        host_id: String,
    },
    PlayerJoined {
        lobby_id: LobbyId,
        player_id: PlayerId,
        display_name: String,
    },
    PlayerLeft {
        lobby_id: LobbyId,
        player_id: PlayerId,
    },
    RoundStarted {
        lobby_id: LobbyId,
        round_number: u32,
    },
    GuessScored {
        lobby_id: LobbyId,
        player_id: PlayerId,
        round_number: u32,
        scored: ScoredGuess,
    },
    RoundLocked {
        lobby_id: LobbyId,
        round_number: u32,
        solver: PlayerId,
        track: TrackReference,
    },
    LobbyClosed {
        lobby_id: LobbyId,
        reason: String,
    },
}

impl LobbyEvent {
    pub fn lobby_id(&self) -> LobbyId {
        match self {
            LobbyEvent::LobbyCreated { lobby_id, .. }
            | LobbyEvent::PlayerJoined { lobby_id, .. }
            | LobbyEvent::PlayerLeft { lobby_id, .. }
            | LobbyEvent::RoundStarted { lobby_id, .. }
            | LobbyEvent::GuessScored { lobby_id, .. }
            | LobbyEvent::RoundLocked { lobby_id, .. }
            | LobbyEvent::LobbyClosed { lobby_id, .. } => *lobby_id,
        }
    }
}

/// Event handler trait for processing lobby events
pub trait LobbyEventHandler: Send + Sync {
    fn handle_event(&mut self, event: &LobbyEvent);
}

/// Simple event bus for distributing lobby events
#[derive(Default)]
pub struct LobbyEventBus {
    handlers: Vec<Box<dyn LobbyEventHandler>>,
}

impl LobbyEventBus {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    pub fn add_handler(&mut self, handler: Box<dyn LobbyEventHandler>) {
        self.handlers.push(handler);
    }

    pub fn publish(&mut self, event: LobbyEvent) {
        for handler in &mut self.handlers {
            handler.handle_event(&event);
        }
    }

    pub fn publish_all(&mut self, events: impl IntoIterator<Item = LobbyEvent>) {
        for event in events {
            self.publish(event);
        }
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

/// Writes every event to the tracing log.
#[derive(Debug, Default)]
pub struct TracingEventHandler;

impl LobbyEventHandler for TracingEventHandler {
    fn handle_event(&mut self, event: &LobbyEvent) {
        match event {
            LobbyEvent::LobbyCreated { lobby_id, host_id } => {
                info!("Lobby {} created by host {}", lobby_id, host_id);
            }
            LobbyEvent::PlayerJoined {
                lobby_id,
                player_id,
                display_name,
            } => {
                info!("{} ({}) joined lobby {}", display_name, player_id, lobby_id);
            }
            LobbyEvent::PlayerLeft {
                lobby_id,
                player_id,
            } => {
                info!("Player {} left lobby {}", player_id, lobby_id);
            }
            LobbyEvent::RoundStarted {
                lobby_id,
                round_number,
            } => {
                info!("Lobby {} started round {}", lobby_id, round_number);
            }
            LobbyEvent::GuessScored {
                lobby_id,
                player_id,
                round_number,
                scored,
            } => {
                tracing::debug!(
                    "Lobby {} round {}: player {} scored {:?} for {} points",
                    lobby_id,
                    round_number,
                    player_id,
                    scored.match_class,
                    scored.points
                );
            }
            LobbyEvent::RoundLocked {
                lobby_id,
                round_number,
                solver,
                track,
            } => {
                info!(
                    "Lobby {} round {} solved by {}: {} - {}",
                    lobby_id, round_number, solver, track.track_title, track.artist_name
                );
            }
            LobbyEvent::LobbyClosed { lobby_id, reason } => {
                info!("Lobby {} closed: {}", lobby_id, reason);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heardle_types::MatchClass;
    use std::sync::{Arc, Mutex};
    use uuid::Uuid;

    #[derive(Clone, Default)]
    struct Recorder {
        events: Arc<Mutex<Vec<LobbyEvent>>>,
    }

    impl LobbyEventHandler for Recorder {
        fn handle_event(&mut self, event: &LobbyEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    #[test]
    fn test_event_bus_fans_out_to_every_handler() {
        let mut bus = LobbyEventBus::new();
        let first = Recorder::default();
        let second = Recorder::default();
        bus.add_handler(Box::new(first.clone()));
        bus.add_handler(Box::new(second.clone()));
        bus.add_handler(Box::new(TracingEventHandler));
        assert_eq!(bus.handler_count(), 3);

        let lobby_id = Uuid::new_v4();
        bus.publish_all([
            LobbyEvent::RoundStarted {
                lobby_id,
                round_number: 1,
            },
            LobbyEvent::GuessScored {
                lobby_id,
                player_id: Uuid::new_v4(),
                round_number: 1,
                scored: ScoredGuess {
                    match_class: MatchClass::Full,
                    points: 25,
                },
            },
        ]);

        assert_eq!(first.events.lock().unwrap().len(), 2);
        assert_eq!(second.events.lock().unwrap().len(), 2);
        assert!(
            first
                .events
                .lock()
                .unwrap()
                .iter()
                .all(|e| e.lobby_id() == lobby_id)
        );
    }
}
