use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Identity of the song currently playing in a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TrackReference {
    pub track_title: String,
    pub artist_name: String,
}

impl TrackReference {
    pub fn new(track_title: impl Into<String>, artist_name: impl Into<String>) -> Self {
        Self {
            track_title: track_title.into(),
            artist_name: artist_name.into(),
        }
    }

    /// Build a reference from a playback item's credited artists.
    /// The lead (first non-blank) artist is the one players have to name.
    pub fn from_credits<S: AsRef<str>>(track_title: impl Into<String>, artists: &[S]) -> Self {
        let artist_name = artists
            .iter()
            .map(|a| a.as_ref().trim())
            .find(|a| !a.is_empty())
            .unwrap_or_default()
            .to_string();

        Self {
            track_title: track_title.into(),
            artist_name,
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.track_title.trim().is_empty() && !self.artist_name.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum MatchClass {
    None,
    ArtistOnly,
    Full,
}

impl MatchClass {
    pub fn is_match(self) -> bool {
        !matches!(self, MatchClass::None)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MatchClass::None => "none",
            MatchClass::ArtistOnly => "artist_only",
            MatchClass::Full => "full",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "none" => Some(MatchClass::None),
            "artist_only" => Some(MatchClass::ArtistOnly),
            "full" => Some(MatchClass::Full),
            _ => None,
        }
    }
}

/// A guess together with the points it earned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ScoredGuess {
    pub match_class: MatchClass,
    pub points: i32,
}

impl ScoredGuess {
    pub fn miss() -> Self {
        Self {
            match_class: MatchClass::None,
            points: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum RoundStatus {
    NoRound,  // No track announced yet
    Unlocked, // Accepting guesses
    Locked,   // Someone already named the track or artist
}

/// Client-facing view of the current round.
/// The track stays hidden until the round locks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RoundSnapshot {
    pub status: RoundStatus,
    pub round_number: u32,
    pub started_at: Option<String>, // ISO 8601 string
    pub revealed_track: Option<TrackReference>,
}

impl RoundSnapshot {
    pub fn no_round() -> Self {
        Self {
            status: RoundStatus::NoRound,
            round_number: 0,
            started_at: None,
            revealed_track: None,
        }
    }
}
