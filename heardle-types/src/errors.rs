use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

/// Rejections raised by the guess evaluation engine. None of them change round state.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum EngineError {
    #[error("track reference needs a non-empty title and artist")]
    InvalidTrackReference,
    #[error("guess is empty")]
    EmptyGuess,
    #[error("round is already locked")]
    AlreadyLocked,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum LobbyError {
    #[error("lobby {lobby_id} not found")]
    LobbyNotFound { lobby_id: String },
    #[error("player {player_id} not found")]
    PlayerNotFound { player_id: String },
    #[error("invalid display name: {reason}")]
    InvalidDisplayName { reason: String },
    #[error("display name {display_name} is already taken")]
    DuplicateDisplayName { display_name: String },
    #[error("lobby is full ({max_players} players)")]
    LobbyFull { max_players: u32 },
    #[error("host key does not match")]
    NotHost,
    #[error("too many guesses, slow down")]
    RateLimited,
    #[error(transparent)]
    Engine(#[from] EngineError),
}
