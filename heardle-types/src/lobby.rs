use crate::{LobbyId, MatchClass, PlayerId, RoundSnapshot};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Player {
    pub player_id: PlayerId,
    pub display_name: String,
    pub points: i32,
    pub guess_history: Vec<PersonalGuess>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PersonalGuess {
    pub text: String,
    pub round_number: u32,
    pub match_class: MatchClass,
    pub points_earned: i32,
    pub submitted_at: String, // ISO 8601 string
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LobbyState {
    pub id: LobbyId,
    pub host_id: String,
    pub created_at: String, // ISO 8601 string
    pub max_players: u32,
    pub players: Vec<Player>,
    pub round: RoundSnapshot,
}

impl LobbyState {
    /// Create a personalized version of the lobby state for a specific player.
    /// Other players' guess texts would give the answer away, so their histories are cleared.
    pub fn personalized_for_player(&self, player_id: Option<PlayerId>) -> Self {
        let players = self
            .players
            .iter()
            .map(|player| {
                if Some(player.player_id) == player_id {
                    player.clone()
                } else {
                    Player {
                        guess_history: Vec::new(),
                        ..player.clone()
                    }
                }
            })
            .collect();

        LobbyState {
            players,
            ..self.clone()
        }
    }

    pub fn player(&self, player_id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.player_id == player_id)
    }
}
