//! Game rules: board generation, reveal and chord engines, and the state
//! machine that ties them together. Nothing here is synchronized; the actor
//! owning a [`GameState`] is the only writer.

pub mod chord;
pub mod game;
pub mod generator;
pub mod reveal;

pub use chord::chord;
pub use game::{GameState, MoveOutcome};
pub use generator::{MinePlacement, generate, validate_config};
pub use reveal::{RevealOutcome, reveal};
