use heardle_types::{MatchClass, ScoredGuess};

/// Linear point decay with a floor: `max(floor, round(base - elapsed / seconds_per_point))`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreCurve {
    pub base: f64,
    pub seconds_per_point: f64,
    pub floor: i32,
}

impl ScoreCurve {
    /// Rounds half away from zero (`f64::round`), so 24.5 scores 25.
    pub fn points_at(&self, elapsed_seconds: f64) -> i32 {
        let raw = (self.base - elapsed_seconds / self.seconds_per_point).round();
        // `as` saturates, so an enormous elapsed time still lands on the floor
        (raw as i32).max(self.floor)
    }
}

pub const FULL_MATCH_CURVE: ScoreCurve = ScoreCurve {
    base: 25.0,
    seconds_per_point: 2.0,
    floor: 5,
};

pub const ARTIST_MATCH_CURVE: ScoreCurve = ScoreCurve {
    base: 10.0,
    seconds_per_point: 5.0,
    floor: 2,
};

pub struct ScoringEngine;

impl ScoringEngine {
    pub fn curve_for(match_class: MatchClass) -> Option<ScoreCurve> {
        match match_class {
            MatchClass::Full => Some(FULL_MATCH_CURVE),
            MatchClass::ArtistOnly => Some(ARTIST_MATCH_CURVE),
            MatchClass::None => None,
        }
    }

    /// Points for a guess of the given class made `elapsed_seconds` into the round.
    /// Negative or NaN elapsed times count as an instant guess.
    pub fn score(match_class: MatchClass, elapsed_seconds: f64) -> i32 {
        let elapsed = if elapsed_seconds.is_nan() || elapsed_seconds < 0.0 {
            0.0
        } else {
            elapsed_seconds
        };

        Self::curve_for(match_class)
            .map(|curve| curve.points_at(elapsed))
            .unwrap_or(0)
    }

    pub fn scored(match_class: MatchClass, elapsed_seconds: f64) -> ScoredGuess {
        ScoredGuess {
            match_class,
            points: Self::score(match_class, elapsed_seconds),
        }
    }
}
