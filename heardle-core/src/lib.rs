pub mod cleanup;
pub mod clock;
pub mod events;
pub mod lobby;
pub mod matcher;
pub mod normalize;
pub mod round;
pub mod scoring;

// Re-export main components
pub use cleanup::*;
pub use clock::*;
pub use events::*;
pub use lobby::*;
pub use matcher::*;
pub use normalize::*;
pub use round::*;
pub use scoring::*;
