//! Routes commands to game actors by id, spawning or reviving actors as
//! needed.

use std::{
    collections::VecDeque,
    future::Future,
    sync::{Arc, Mutex},
};

use dashmap::{DashMap, Entry};
use minesweeper_common::models::{Config, GameSnapshot, Move};
use nanoid::nanoid;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::{
    actor::{ActorContext, GameActor, GameHandle},
    error::{ActorError, RegistryError},
    logic::validate_config,
};

pub type Games = Arc<Registry>;

pub struct Registry {
    games: DashMap<String, GameHandle>,
    /// Creation keys mapped to the game they created.
    creations: DashMap<Uuid, String>,
    creation_order: Mutex<VecDeque<Uuid>>,
    /// Evicted games whose journal is kept for a later restore.
    retired: DashMap<String, Instant>,
    context: ActorContext,
}

enum Creation {
    Fresh(GameSnapshot),
    Existing(String),
}

/// Whether a missing actor may be started from scratch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Activation {
    Mutation,
    Query,
}

impl Registry {
    pub fn new(context: ActorContext) -> Self {
        Self {
            games: DashMap::new(),
            creations: DashMap::new(),
            creation_order: Mutex::new(VecDeque::new()),
            retired: DashMap::new(),
            context,
        }
    }

    pub fn context(&self) -> &ActorContext {
        &self.context
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    /// Live handle for `id`, if one is registered.
    pub fn handle(&self, id: &str) -> Option<GameHandle> {
        self.games.get(id).map(|handle| handle.clone())
    }

    /// Creates a game under a fresh id and returns its initial state. A
    /// redelivered `command_id` returns the current state of the game it
    /// created instead.
    #[instrument(level = "trace", skip(self))]
    pub async fn create(
        &self,
        config: &Config,
        command_id: Option<Uuid>,
    ) -> Result<GameSnapshot, RegistryError> {
        validate_config(config)?;

        let Some(key) = command_id else {
            return self.spawn_game(config, None);
        };

        loop {
            let id = match self.claim_creation(key, config)? {
                Creation::Fresh(snapshot) => {
                    self.remember_creation(key);
                    return Ok(snapshot);
                }
                Creation::Existing(id) => id,
            };

            debug!("Create request {} already produced game {}", key, id);
            match self.get_state(&id).await {
                Err(RegistryError::NotFound { .. }) => {
                    // the game is gone, so the key may create a new one
                    self.creations.remove_if(&key, |_, created| *created == id);
                }
                result => return result,
            }
        }
    }

    fn claim_creation(&self, key: Uuid, config: &Config) -> Result<Creation, RegistryError> {
        match self.creations.entry(key) {
            Entry::Occupied(entry) => Ok(Creation::Existing(entry.get().clone())),
            Entry::Vacant(entry) => {
                let snapshot = self.spawn_game(config, Some(key))?;
                entry.insert(snapshot.id.clone());
                Ok(Creation::Fresh(snapshot))
            }
        }
    }

    /// Records `key` and forgets the oldest keys beyond the dedup window.
    fn remember_creation(&self, key: Uuid) {
        let mut order = self
            .creation_order
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        order.push_back(key);
        while order.len() > self.context.settings.dedup_window {
            if let Some(oldest) = order.pop_front() {
                self.creations.remove(&oldest);
            }
        }
    }

    fn spawn_game(
        &self,
        config: &Config,
        command_id: Option<Uuid>,
    ) -> Result<GameSnapshot, RegistryError> {
        let mut id_length = 5;
        let max_attempts_per_length = 10;

        loop {
            for _ in 0..max_attempts_per_length {
                let id = nanoid!(id_length);
                match self.games.entry(id.clone()) {
                    Entry::Occupied(_) => {
                        debug!("Game ID collision, trying another: {}", id);
                    }
                    Entry::Vacant(_) if self.context.journal.contains(&id)? => {
                        debug!("Game ID {} has a journal, trying another", id);
                    }
                    Entry::Vacant(entry) => {
                        let (handle, snapshot) =
                            GameActor::create(&id, config, command_id, self.context.clone())?;
                        entry.insert(handle);
                        info!("Created new game with ID: {}", id);
                        return Ok(snapshot);
                    }
                }
            }

            warn!(
                "Exhausted ID attempts at length {}, increasing to {}",
                id_length,
                id_length + 1
            );
            id_length += 1;
        }
    }

    pub async fn get_state(&self, id: &str) -> Result<GameSnapshot, RegistryError> {
        self.with_actor(id, Activation::Query, |handle| async move {
            handle.get_state().await
        })
        .await
    }

    pub async fn move_update(
        &self,
        id: &str,
        mv: Move,
        command_id: Option<Uuid>,
    ) -> Result<GameSnapshot, RegistryError> {
        self.with_actor(id, Activation::Mutation, |handle| async move {
            handle.move_update(mv, command_id).await
        })
        .await
    }

    pub async fn move_signal(
        &self,
        id: &str,
        mv: Move,
        command_id: Option<Uuid>,
    ) -> Result<(), RegistryError> {
        self.with_actor(id, Activation::Mutation, |handle| async move {
            handle.move_signal(mv, command_id)
        })
        .await
    }

    pub async fn restart_update(
        &self,
        id: &str,
        config: Config,
        command_id: Option<Uuid>,
    ) -> Result<GameSnapshot, RegistryError> {
        self.with_actor(id, Activation::Mutation, |handle| async move {
            handle.restart_update(config, command_id).await
        })
        .await
    }

    pub async fn restart_signal(
        &self,
        id: &str,
        config: Config,
        command_id: Option<Uuid>,
    ) -> Result<(), RegistryError> {
        self.with_actor(id, Activation::Mutation, |handle| async move {
            handle.restart_signal(config, command_id)
        })
        .await
    }

    /// Closes every actor and waits for each to finish its queue.
    pub async fn close_all(&self) {
        let handles: Vec<GameHandle> = self.games.iter().map(|e| e.value().clone()).collect();
        for handle in &handles {
            handle.close();
        }
        for handle in &handles {
            handle.stopped().await;
        }
        info!("Closed {} games", handles.len());
    }

    /// Drops handles whose actors have fully stopped.
    pub(crate) fn remove_stopped(&self) -> usize {
        let stopped: Vec<GameHandle> = self
            .games
            .iter()
            .filter(|entry| entry.value().is_stopped())
            .map(|entry| entry.value().clone())
            .collect();

        let restorable = self.context.settings.restore_on_reactivation;
        let mut removed = 0;
        for handle in stopped {
            if self.evict(&handle) {
                debug!("Cleaned up game: {}", handle.id());
                if restorable {
                    self.retired.insert(handle.id().to_string(), Instant::now());
                }
                removed += 1;
            }
        }
        removed
    }

    /// Truncates the journals of games evicted longer than the retention
    /// period ago. A game revived in the meantime keeps its journal.
    pub(crate) fn purge_retired(&self) -> usize {
        let retention = self.context.settings.journal_retention;
        let expired: Vec<String> = self
            .retired
            .iter()
            .filter(|entry| entry.value().elapsed() >= retention)
            .map(|entry| entry.key().clone())
            .collect();

        let mut purged = 0;
        for id in expired {
            self.retired.remove(&id);
            // holding the slot keeps `activate` from reviving the id while
            // its journal is being dropped
            let slot = self.games.entry(id.clone());
            if matches!(slot, Entry::Vacant(_)) {
                match self.context.journal.truncate(&id) {
                    Ok(()) => {
                        debug!("Purged journal of game {}", id);
                        purged += 1;
                    }
                    Err(e) => warn!("Failed to purge journal of game {}: {}", id, e),
                }
            }
        }
        purged
    }

    /// Removes `handle` unless it has already been replaced.
    fn evict(&self, handle: &GameHandle) -> bool {
        self.games
            .remove_if(handle.id(), |_, current| current.same_actor(handle))
            .is_some()
    }

    /// Runs `op` against the actor for `id`. A command that could not even be
    /// queued is retried once against a freshly activated actor.
    async fn with_actor<T, F, Fut>(
        &self,
        id: &str,
        activation: Activation,
        op: F,
    ) -> Result<T, RegistryError>
    where
        F: Fn(GameHandle) -> Fut,
        Fut: Future<Output = Result<T, ActorError>>,
    {
        let handle = self.activate(id, activation).await?;
        match op(handle).await {
            Err(ActorError::Unavailable { .. }) => {
                debug!("Game {} stopped before accepting command, retrying", id);
                let handle = self.activate(id, activation).await?;
                Ok(op(handle).await?)
            }
            result => Ok(result?),
        }
    }

    /// Returns a live handle for `id`, reviving the game from its journal or
    /// starting a default one when allowed.
    #[instrument(level = "trace", skip(self))]
    async fn activate(&self, id: &str, activation: Activation) -> Result<GameHandle, RegistryError> {
        loop {
            match self.handle(id) {
                Some(handle) if !handle.is_closed() => return Ok(handle),
                Some(stale) => {
                    // the old actor may still be draining into the journal
                    stale.stopped().await;
                    self.evict(&stale);
                }
                None => {}
            }

            match self.games.entry(id.to_string()) {
                Entry::Occupied(entry) if !entry.get().is_closed() => {
                    return Ok(entry.get().clone());
                }
                Entry::Occupied(_) => continue,
                Entry::Vacant(entry) => {
                    let handle = self.revive(id, activation)?;
                    entry.insert(handle.clone());
                    return Ok(handle);
                }
            }
        }
    }

    fn revive(&self, id: &str, activation: Activation) -> Result<GameHandle, RegistryError> {
        let journal = &self.context.journal;
        let has_history = journal.contains(id)?;

        if has_history && self.context.settings.restore_on_reactivation {
            return Ok(GameActor::restore(id, self.context.clone())?);
        }

        if activation == Activation::Query {
            return Err(RegistryError::NotFound { id: id.to_string() });
        }

        if has_history {
            journal.truncate(id)?;
        }
        info!("Starting game {} with default configuration", id);
        let (handle, _) = GameActor::create(id, &Config::default(), None, self.context.clone())?;
        Ok(handle)
    }
}
