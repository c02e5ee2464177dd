use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::{LobbyError, LobbyId, LobbyState, MatchClass, PlayerId, RoundSnapshot, ScoredGuess};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateLobbyRequest {
    pub host_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateLobbyResponse {
    pub lobby_id: LobbyId,
    pub host_key: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct JoinLobbyRequest {
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct JoinLobbyResponse {
    pub player_id: PlayerId,
    pub lobby: LobbyState,
}

/// Sent by the host whenever playback moves to a new track.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AnnounceTrackRequest {
    pub track_title: String,
    pub artists: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SubmitGuessRequest {
    pub player_id: PlayerId,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GuessResponse {
    pub scored: ScoredGuess,
    pub total_points: i32,
    pub round: RoundSnapshot,
    pub persisted: bool,
}

/// One row of a lobby's persisted guess log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GuessRecord {
    pub id: Uuid,
    pub lobby_id: LobbyId,
    pub player_id: PlayerId,
    pub display_name: String,
    pub text: String,
    pub round_number: u32,
    pub match_class: MatchClass,
    pub points: i32,
    pub submitted_at: String, // ISO 8601 string
}

/// A player's summed points across every persisted guess in a lobby.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LeaderboardEntry {
    pub player_id: PlayerId,
    pub display_name: String,
    pub points: i32,
    pub guesses: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ErrorResponse {
    pub error: String,
    pub details: Option<LobbyError>,
}

impl From<&LobbyError> for ErrorResponse {
    fn from(err: &LobbyError) -> Self {
        ErrorResponse {
            error: err.to_string(),
            details: Some(err.clone()),
        }
    }
}

impl ErrorResponse {
    pub fn message(error: impl Into<String>) -> Self {
        ErrorResponse {
            error: error.into(),
            details: None,
        }
    }
}
