//! Append-only event log each game actor writes to, and replay from it.
//!
//! Entries carry the seed and timestamp the actor used, so replaying a log
//! rebuilds the exact same state without touching a clock or entropy source.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use minesweeper_common::models::{Config, Move};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    error::{ActorError, JournalError},
    logic::{GameState, MinePlacement},
};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Event {
    Created {
        config: Config,
        seed: u64,
        placement: MinePlacement,
    },
    Restarted {
        config: Config,
        seed: u64,
    },
    Moved {
        #[serde(rename = "move")]
        mv: Move,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub seq: u64,
    pub command_id: Option<Uuid>,
    pub at: DateTime<Utc>,
    pub event: Event,
}

/// Durable log contract provided by whatever hosts the actors.
pub trait EventLog: Send + Sync {
    /// Appends `entry`; its `seq` must equal the number of entries already
    /// stored for `id`.
    fn append(&self, id: &str, entry: LogEntry) -> Result<(), JournalError>;

    fn load(&self, id: &str) -> Result<Vec<LogEntry>, JournalError>;

    fn truncate(&self, id: &str) -> Result<(), JournalError>;

    fn contains(&self, id: &str) -> Result<bool, JournalError> {
        Ok(!self.load(id)?.is_empty())
    }
}

#[derive(Debug, Default)]
pub struct MemoryJournal {
    entries: DashMap<String, Vec<LogEntry>>,
}

impl MemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventLog for MemoryJournal {
    fn append(&self, id: &str, entry: LogEntry) -> Result<(), JournalError> {
        let mut entries = self.entries.entry(id.to_string()).or_default();
        let expected = entries.len() as u64;
        if entry.seq != expected {
            warn!(
                "Rejected out-of-order journal entry for {}: expected {}, got {}",
                id, expected, entry.seq
            );
            return Err(JournalError::OutOfOrder {
                id: id.to_string(),
                expected,
                got: entry.seq,
            });
        }
        entries.push(entry);
        Ok(())
    }

    fn load(&self, id: &str) -> Result<Vec<LogEntry>, JournalError> {
        Ok(self
            .entries
            .get(id)
            .map(|entries| entries.clone())
            .unwrap_or_default())
    }

    fn truncate(&self, id: &str) -> Result<(), JournalError> {
        if self.entries.remove(id).is_some() {
            debug!("Truncated journal for {}", id);
        }
        Ok(())
    }

    fn contains(&self, id: &str) -> Result<bool, JournalError> {
        Ok(self
            .entries
            .get(id)
            .is_some_and(|entries| !entries.is_empty()))
    }
}

/// State rebuilt from a log.
#[derive(Debug)]
pub struct Replayed {
    pub state: GameState,
    /// Move and restart command ids in the order they were applied. The
    /// creation key belongs to the registry and is left out.
    pub command_ids: Vec<Uuid>,
    pub next_seq: u64,
}

/// Re-applies `entries` from scratch. The first entry must be `Created`.
pub fn replay(id: &str, entries: &[LogEntry]) -> Result<Replayed, ActorError> {
    let corrupt = |reason: String| ActorError::CorruptJournal {
        id: id.to_string(),
        reason,
    };

    let (first, rest) = entries
        .split_first()
        .ok_or_else(|| corrupt("journal is empty".to_string()))?;
    let Event::Created {
        config,
        seed,
        placement,
    } = &first.event
    else {
        return Err(corrupt(format!(
            "entry {} is not a creation event",
            first.seq
        )));
    };

    let replay_error = |seq: u64| {
        move |source| ActorError::Replay {
            id: id.to_string(),
            seq,
            source,
        }
    };

    let mut state =
        GameState::new(id, config, *seed, *placement).map_err(replay_error(first.seq))?;
    let mut command_ids = Vec::new();

    for (expected, entry) in (1..).zip(rest) {
        if entry.seq != expected {
            return Err(corrupt(format!(
                "expected entry {}, found {}",
                expected, entry.seq
            )));
        }

        match &entry.event {
            Event::Created { .. } => {
                return Err(corrupt(format!(
                    "entry {} re-creates the game",
                    entry.seq
                )));
            }
            Event::Restarted { config, seed } => {
                state
                    .restart(config, *seed)
                    .map_err(replay_error(entry.seq))?;
            }
            Event::Moved { mv } => {
                state
                    .apply_move(*mv, entry.at)
                    .map_err(replay_error(entry.seq))?;
            }
        }
        command_ids.extend(entry.command_id);
    }

    debug!("Replayed {} journal entries for {}", entries.len(), id);

    Ok(Replayed {
        state,
        command_ids,
        next_seq: entries.len() as u64,
    })
}
