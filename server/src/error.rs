use minesweeper_common::models::Config;
use thiserror::Error;

/// Move that is well-formed but not allowed against the current cell.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IllegalMove {
    #[error("flagged cells cannot be revealed")]
    RevealFlagged,
    #[error("revealed cells cannot be flagged")]
    FlagRevealed,
    #[error("revealed cells cannot be unflagged")]
    UnflagRevealed,
    #[error("only revealed cells can be chorded")]
    ChordUnrevealed,
    #[error("cells without adjacent mines cannot be chorded")]
    ChordZero,
    #[error("mine cells cannot be chorded")]
    ChordMine,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameError {
    #[error("invalid game configuration: {0}")]
    InvalidConfig(Config),
    #[error("position ({row}, {col}) is outside the board")]
    OutOfBounds { row: usize, col: usize },
    #[error("illegal move: {0}")]
    IllegalMove(#[from] IllegalMove),
}

pub type Result<T> = std::result::Result<T, GameError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JournalError {
    #[error("journal for game {id} expected entry {expected}, got {got}")]
    OutOfOrder { id: String, expected: u64, got: u64 },
    #[error("journal for game {id} is unavailable: {reason}")]
    Unavailable { id: String, reason: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActorError {
    #[error(transparent)]
    Game(#[from] GameError),
    /// The actor stopped before the command was queued.
    #[error("game {id} is unavailable")]
    Unavailable { id: String },
    /// The actor stopped after the command was queued but before replying.
    #[error("game {id} terminated before replying")]
    Terminated { id: String },
    #[error("game {id} could not be replayed at entry {seq}: {source}")]
    Replay {
        id: String,
        seq: u64,
        #[source]
        source: GameError,
    },
    #[error("game {id} has a corrupt journal: {reason}")]
    CorruptJournal { id: String, reason: String },
    #[error(transparent)]
    Journal(#[from] JournalError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("game {id} not found")]
    NotFound { id: String },
    #[error(transparent)]
    Actor(#[from] ActorError),
}

impl From<GameError> for RegistryError {
    fn from(error: GameError) -> Self {
        Self::Actor(ActorError::Game(error))
    }
}

impl From<JournalError> for RegistryError {
    fn from(error: JournalError) -> Self {
        Self::Actor(ActorError::Journal(error))
    }
}
