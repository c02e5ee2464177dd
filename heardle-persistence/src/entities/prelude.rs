pub use super::guesses::Entity as Guesses;
