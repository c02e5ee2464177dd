pub mod guess_repository;

pub use guess_repository::*;
