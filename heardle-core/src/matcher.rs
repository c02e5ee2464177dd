use crate::normalize;
use heardle_types::{MatchClass, TrackReference};

pub struct GuessMatcher;

impl GuessMatcher {
    /// Classify a free-text guess against the playing track.
    ///
    /// Both title and artist must appear (as substrings of the normalized guess) for a
    /// full match. The artist alone is worth partial credit; the title alone is not.
    pub fn evaluate(guess: &str, track: &TrackReference) -> MatchClass {
        let title = normalize(&track.track_title);
        let artist = normalize(&track.artist_name);

        // An incomplete reference would match every guess via contains("")
        if title.is_empty() || artist.is_empty() {
            return MatchClass::None;
        }

        let guess = normalize(guess);
        let has_title = guess.contains(&title);
        let has_artist = guess.contains(&artist);

        match (has_title, has_artist) {
            (true, true) => MatchClass::Full,
            (false, true) => MatchClass::ArtistOnly,
            _ => MatchClass::None,
        }
    }
}
