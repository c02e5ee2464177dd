pub mod prelude;

pub mod guesses;
