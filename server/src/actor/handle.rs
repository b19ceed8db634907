use std::sync::Arc;

use minesweeper_common::models::{Config, GameSnapshot, Move};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::error::ActorError;

pub(crate) type Reply = oneshot::Sender<Result<GameSnapshot, ActorError>>;

#[derive(Debug)]
pub(crate) enum Command {
    Move {
        mv: Move,
        command_id: Option<Uuid>,
        /// `None` for fire-and-forget.
        reply: Option<Reply>,
    },
    Restart {
        config: Config,
        command_id: Option<Uuid>,
        reply: Option<Reply>,
    },
    Query {
        reply: oneshot::Sender<GameSnapshot>,
    },
    Close,
}

/// Cheap, cloneable address of one running game actor.
#[derive(Debug, Clone)]
pub struct GameHandle {
    id: Arc<str>,
    sender: mpsc::UnboundedSender<Command>,
    /// Sender half is dropped when the actor task finishes.
    stopped: watch::Receiver<()>,
}

impl GameHandle {
    pub(crate) fn new(
        id: &str,
        sender: mpsc::UnboundedSender<Command>,
        stopped: watch::Receiver<()>,
    ) -> Self {
        Self {
            id: id.into(),
            sender,
            stopped,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    fn send(&self, command: Command) -> Result<(), ActorError> {
        self.sender
            .send(command)
            .map_err(|_| ActorError::Unavailable {
                id: self.id.to_string(),
            })
    }

    async fn request(
        &self,
        command: impl FnOnce(Reply) -> Command,
    ) -> Result<GameSnapshot, ActorError> {
        let (reply, response) = oneshot::channel();
        self.send(command(reply))?;
        response.await.map_err(|_| ActorError::Terminated {
            id: self.id.to_string(),
        })?
    }

    /// Queues a move without waiting for it to be applied.
    #[instrument(level = "trace", skip(self), fields(game_id = %self.id))]
    pub fn move_signal(&self, mv: Move, command_id: Option<Uuid>) -> Result<(), ActorError> {
        self.send(Command::Move {
            mv,
            command_id,
            reply: None,
        })
    }

    /// Applies a move and returns the state right after it.
    #[instrument(level = "trace", skip(self), fields(game_id = %self.id))]
    pub async fn move_update(
        &self,
        mv: Move,
        command_id: Option<Uuid>,
    ) -> Result<GameSnapshot, ActorError> {
        self.request(|reply| Command::Move {
            mv,
            command_id,
            reply: Some(reply),
        })
        .await
    }

    #[instrument(level = "trace", skip(self), fields(game_id = %self.id))]
    pub fn restart_signal(
        &self,
        config: Config,
        command_id: Option<Uuid>,
    ) -> Result<(), ActorError> {
        self.send(Command::Restart {
            config,
            command_id,
            reply: None,
        })
    }

    #[instrument(level = "trace", skip(self), fields(game_id = %self.id))]
    pub async fn restart_update(
        &self,
        config: Config,
        command_id: Option<Uuid>,
    ) -> Result<GameSnapshot, ActorError> {
        self.request(|reply| Command::Restart {
            config,
            command_id,
            reply: Some(reply),
        })
        .await
    }

    /// Current state, ordered after every command queued before it.
    #[instrument(level = "trace", skip(self), fields(game_id = %self.id))]
    pub async fn get_state(&self) -> Result<GameSnapshot, ActorError> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Query { reply })?;
        response.await.map_err(|_| ActorError::Terminated {
            id: self.id.to_string(),
        })
    }

    /// Asks the actor to stop once everything queued so far has run.
    pub fn close(&self) {
        if self.send(Command::Close).is_err() {
            debug!("Game {} already closed", self.id);
        }
    }

    /// No new commands are accepted.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// The actor task has finished, including draining its queue.
    pub fn is_stopped(&self) -> bool {
        self.stopped.has_changed().is_err()
    }

    pub async fn stopped(&self) {
        let mut stopped = self.stopped.clone();
        while stopped.changed().await.is_ok() {}
    }

    pub fn same_actor(&self, other: &GameHandle) -> bool {
        self.sender.same_channel(&other.sender)
    }
}
