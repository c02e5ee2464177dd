pub mod errors;
pub mod lobby;
pub mod messages;
pub mod track;

use uuid::Uuid;

pub type LobbyId = Uuid;
pub type PlayerId = Uuid;

// Re-export all types
pub use errors::*;
pub use lobby::*;
pub use messages::*;
pub use track::*;
