#![allow(dead_code)]

use heardle_core::{Lobby, ManualClock, RoundTracker};
use heardle_types::{PlayerId, TrackReference};

pub fn blinding_lights() -> TrackReference {
    TrackReference::new("Blinding Lights", "The Weeknd")
}

pub fn levitating() -> TrackReference {
    TrackReference::new("Levitating", "Dua Lipa")
}

/// Tracker driven by a manual clock so elapsed times are exact
pub fn create_test_tracker() -> (RoundTracker, ManualClock) {
    let clock = ManualClock::starting_now();
    (RoundTracker::new(clock.shared()), clock)
}

/// Tracker with `track` already announced
pub fn tracker_with_round(track: TrackReference) -> (RoundTracker, ManualClock) {
    let (mut tracker, clock) = create_test_tracker();
    tracker.start_round(track).unwrap();
    (tracker, clock)
}

/// Lobby with the named players already joined
pub fn create_lobby_with_players(names: &[&str]) -> (Lobby, ManualClock, Vec<PlayerId>) {
    let clock = ManualClock::starting_now();
    let mut lobby = Lobby::new("test-host", 16, clock.shared());
    let ids = names
        .iter()
        .map(|name| lobby.add_player(name).unwrap())
        .collect();
    (lobby, clock, ids)
}

/// Guesses that deliberately exercise casing, spacing and substring edges
pub fn guess_corpus() -> Vec<&'static str> {
    vec![
        "",
        "   ",
        "blinding lights",
        "the weeknd",
        "The Weeknd",
        "blinding lights the weeknd",
        "THE WEEKND BLINDING LIGHTS",
        "weeknd",
        "blinding",
        "the weekend blinding lights",
        "levitating dua lipa",
        "dua lipa",
        "  Levitating  ",
        "blinding lights by the weeknd and dua lipa levitating",
    ]
}
