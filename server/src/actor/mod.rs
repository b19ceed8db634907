//! Per-game actor: the single writer of one [`GameState`].
//!
//! Commands arrive over an unbounded queue and run one at a time in receipt
//! order. Queries travel through the same queue, so a query always observes
//! every command queued before it. The actor stops itself after a period
//! without commands or when closed, finishing whatever is already queued.

mod capabilities;
mod handle;

use std::{
    collections::{HashSet, VecDeque},
    sync::Arc,
    time::Duration,
};

use minesweeper_common::models::{Config, GameSnapshot, Move};
use tokio::{
    sync::{mpsc, watch},
    time,
};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

pub use capabilities::{Clock, EntropySeeds, FixedClock, FixedSeeds, SeedSource, SystemClock};
pub use handle::GameHandle;

use handle::{Command, Reply};

use crate::{
    config::Settings,
    error::ActorError,
    journal::{self, Event, EventLog, LogEntry, MemoryJournal},
    logic::GameState,
};

/// Runtime services shared by every actor.
#[derive(Clone)]
pub struct ActorContext {
    pub clock: Arc<dyn Clock>,
    pub seeds: Arc<dyn SeedSource>,
    pub journal: Arc<dyn EventLog>,
    pub settings: Arc<Settings>,
}

impl ActorContext {
    /// System clock, entropy seeds and an in-memory journal.
    pub fn new(settings: Settings) -> Self {
        Self {
            clock: Arc::new(SystemClock),
            seeds: Arc::new(EntropySeeds),
            journal: Arc::new(MemoryJournal::new()),
            settings: Arc::new(settings),
        }
    }
}

/// Bounded set of recently applied command ids, oldest evicted first.
#[derive(Debug)]
struct RecentCommands {
    order: VecDeque<Uuid>,
    seen: HashSet<Uuid>,
    capacity: usize,
}

impl RecentCommands {
    fn new(capacity: usize) -> Self {
        Self {
            order: VecDeque::with_capacity(capacity.min(64)),
            seen: HashSet::new(),
            capacity,
        }
    }

    fn contains(&self, id: &Uuid) -> bool {
        self.seen.contains(id)
    }

    fn insert(&mut self, id: Uuid) {
        if self.capacity == 0 || !self.seen.insert(id) {
            return;
        }
        self.order.push_back(id);
        if self.order.len() > self.capacity
            && let Some(oldest) = self.order.pop_front()
        {
            self.seen.remove(&oldest);
        }
    }
}

enum Mutation {
    Move(Move),
    Restart(Config),
}

enum Flow {
    Continue,
    Stop,
    /// The actor can no longer make progress.
    Fatal,
}

pub struct GameActor {
    state: GameState,
    recent: RecentCommands,
    next_seq: u64,
    context: ActorContext,
}

impl GameActor {
    /// Starts a brand new game. The creation is journaled before the actor
    /// accepts any command.
    #[instrument(level = "trace", skip(context))]
    pub fn create(
        id: &str,
        config: &Config,
        command_id: Option<Uuid>,
        context: ActorContext,
    ) -> Result<(GameHandle, GameSnapshot), ActorError> {
        let seed = context.seeds.next_seed();
        let placement = context.settings.mine_placement;
        let state = GameState::new(id, config, seed, placement)?;

        context.journal.append(
            id,
            LogEntry {
                seq: 0,
                command_id,
                at: context.clock.now(),
                event: Event::Created {
                    config: *config,
                    seed,
                    placement,
                },
            },
        )?;

        let recent = RecentCommands::new(context.settings.dedup_window);

        info!("Created game {}: {}", id, config);
        let snapshot = state.snapshot();
        let actor = Self {
            state,
            recent,
            next_seq: 1,
            context,
        };
        Ok((actor.spawn(), snapshot))
    }

    /// Rebuilds a game from its journal. Any entry that cannot be re-applied
    /// makes the game unavailable rather than diverging from its history.
    #[instrument(level = "trace", skip(context))]
    pub fn restore(id: &str, context: ActorContext) -> Result<GameHandle, ActorError> {
        let entries = context.journal.load(id)?;
        let replayed = journal::replay(id, &entries).inspect_err(|e| {
            error!("Failed to restore game {}: {}", id, e);
        })?;

        let mut recent = RecentCommands::new(context.settings.dedup_window);
        for command_id in replayed.command_ids {
            recent.insert(command_id);
        }

        info!(
            "Restored game {} from {} journal entries",
            id, replayed.next_seq
        );
        let actor = Self {
            state: replayed.state,
            recent,
            next_seq: replayed.next_seq,
            context,
        };
        Ok(actor.spawn())
    }

    fn spawn(self) -> GameHandle {
        let (sender, receiver) = mpsc::unbounded_channel();
        let (stopped_tx, stopped_rx) = watch::channel(());
        let handle = GameHandle::new(self.state.id(), sender, stopped_rx);

        tokio::spawn(async move {
            self.run(receiver).await;
            drop(stopped_tx);
        });

        handle
    }

    async fn run(mut self, mut receiver: mpsc::UnboundedReceiver<Command>) {
        let idle_timeout: Duration = self.context.settings.inactivity_timeout;
        let mut fatal = false;

        loop {
            let command = match time::timeout(idle_timeout, receiver.recv()).await {
                Ok(Some(command)) => command,
                Ok(None) => {
                    debug!("All handles to game {} dropped", self.state.id());
                    break;
                }
                Err(_) => {
                    info!(
                        "Game {} inactive for {}s, shutting down",
                        self.state.id(),
                        idle_timeout.as_secs()
                    );
                    break;
                }
            };

            match self.handle(command) {
                Flow::Continue => {}
                Flow::Stop => break,
                Flow::Fatal => {
                    fatal = true;
                    break;
                }
            }
        }

        receiver.close();
        if !fatal {
            // commands accepted before the queue closed still run
            while let Ok(command) = receiver.try_recv() {
                if let Flow::Fatal = self.handle(command) {
                    break;
                }
            }
        }

        if !self.context.settings.restore_on_reactivation
            && let Err(e) = self.context.journal.truncate(self.state.id())
        {
            warn!("Failed to truncate journal for {}: {}", self.state.id(), e);
        }
        info!("Game actor {} stopped", self.state.id());
    }

    fn handle(&mut self, command: Command) -> Flow {
        match command {
            Command::Move {
                mv,
                command_id,
                reply,
            } => self.mutate(Mutation::Move(mv), command_id, reply),
            Command::Restart {
                config,
                command_id,
                reply,
            } => self.mutate(Mutation::Restart(config), command_id, reply),
            Command::Query { reply } => {
                let _ = reply.send(self.state.snapshot());
                Flow::Continue
            }
            Command::Close => {
                info!("Closing game {}", self.state.id());
                Flow::Stop
            }
        }
    }

    fn mutate(
        &mut self,
        mutation: Mutation,
        command_id: Option<Uuid>,
        reply: Option<Reply>,
    ) -> Flow {
        let result = self.apply(mutation, command_id);
        let fatal = matches!(result, Err(ActorError::Journal(_)));

        match (&result, reply) {
            (Ok(()), Some(reply)) => {
                let _ = reply.send(Ok(self.state.snapshot()));
            }
            (Err(e), Some(reply)) => {
                let _ = reply.send(Err(e.clone()));
            }
            (Ok(()), None) => {}
            (Err(e), None) => {
                debug!("Dropped signal for game {}: {}", self.state.id(), e);
            }
        }

        if fatal { Flow::Fatal } else { Flow::Continue }
    }

    /// Applies one mutation to a copy of the state and commits it once the
    /// journal has accepted it.
    fn apply(&mut self, mutation: Mutation, command_id: Option<Uuid>) -> Result<(), ActorError> {
        let id = self.state.id().to_string();

        if let Some(command_id) = command_id
            && self.recent.contains(&command_id)
        {
            debug!("Skipping duplicate command {} for game {}", command_id, id);
            return Ok(());
        }

        let at = self.context.clock.now();
        let mut next = self.state.clone();
        let event = match mutation {
            Mutation::Move(mv) => {
                next.apply_move(mv, at).inspect_err(|e| {
                    warn!(
                        "Rejected {:?} at ({}, {}) in game {}: {}",
                        mv.action, mv.row, mv.col, id, e
                    );
                })?;
                Event::Moved { mv }
            }
            Mutation::Restart(config) => {
                let seed = self.context.seeds.next_seed();
                next.restart(&config, seed).inspect_err(|e| {
                    warn!("Rejected restart of game {}: {}", id, e);
                })?;
                Event::Restarted { config, seed }
            }
        };

        let entry = LogEntry {
            seq: self.next_seq,
            command_id,
            at,
            event,
        };
        if let Err(e) = self.context.journal.append(&id, entry) {
            error!("Journal append failed for game {}: {}", id, e);
            return Err(e.into());
        }

        self.next_seq += 1;
        self.state = next;
        self.recent.extend(command_id);
        Ok(())
    }
}

impl Extend<Uuid> for RecentCommands {
    fn extend<I: IntoIterator<Item = Uuid>>(&mut self, ids: I) {
        for id in ids {
            self.insert(id);
        }
    }
}
