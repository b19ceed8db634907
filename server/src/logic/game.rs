use chrono::{DateTime, Utc};
use minesweeper_common::models::{
    BoardView, CellView, Config, GameSnapshot, GameStatus, Move, MoveAction, Pos,
};
use tracing::{debug, info, instrument};

use crate::{
    data::{Board, Cell, RevealedState},
    error::{GameError, IllegalMove, Result},
    logic::{
        chord::chord,
        generator::{MinePlacement, generate},
        reveal::{RevealOutcome, reveal},
    },
};

/// Whether a move changed anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Applied,
    /// Terminal game or ineffective move; the state is untouched.
    Ignored,
}

/// One game: the board plus status and timing.
///
/// Every mutating method either succeeds or leaves the state exactly as it
/// was. Time and randomness come in as arguments, so applying the same
/// commands with the same seeds and timestamps always yields the same state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    id: String,
    config: Config,
    seed: u64,
    placement: MinePlacement,
    board: Board,
    status: GameStatus,
    flags_used: usize,
    cells_revealed: usize,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
}

impl GameState {
    #[instrument(level = "trace", skip(id))]
    pub fn new(
        id: impl AsRef<str>,
        config: &Config,
        seed: u64,
        placement: MinePlacement,
    ) -> Result<Self> {
        let board = generate(config, seed, None)?;
        Ok(Self::with_board(id.as_ref(), board, seed, placement))
    }

    /// Starts a game on a fixed layout. The board must leave at least one
    /// safe cell.
    pub fn from_board(id: impl AsRef<str>, board: Board) -> Result<Self> {
        let config = board.config();
        if !config.is_valid() {
            return Err(GameError::InvalidConfig(config));
        }
        Ok(Self::with_board(
            id.as_ref(),
            board,
            0,
            MinePlacement::Anywhere,
        ))
    }

    fn with_board(id: &str, board: Board, seed: u64, placement: MinePlacement) -> Self {
        Self {
            id: id.to_string(),
            config: board.config(),
            seed,
            placement,
            flags_used: board.count_flagged(),
            cells_revealed: board.count_revealed_safe(),
            board,
            status: GameStatus::NotStarted,
            start_time: None,
            end_time: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn placement(&self) -> MinePlacement {
        self.placement
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn flags_used(&self) -> usize {
        self.flags_used
    }

    pub fn cells_revealed(&self) -> usize {
        self.cells_revealed
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    /// Replaces the board with a fresh one. Valid in any status.
    #[instrument(level = "trace", skip(self), fields(game_id = %self.id))]
    pub fn restart(&mut self, config: &Config, seed: u64) -> Result<()> {
        let board = generate(config, seed, None)?;
        info!("Restarting game {} with {}", self.id, config);
        *self = Self::with_board(&self.id, board, seed, self.placement);
        Ok(())
    }

    #[instrument(level = "trace", skip(self), fields(game_id = %self.id))]
    pub fn apply_move(&mut self, mv: Move, now: DateTime<Utc>) -> Result<MoveOutcome> {
        if self.status.is_terminal() {
            debug!("Ignoring {:?} on finished game {}", mv.action, self.id);
            return Ok(MoveOutcome::Ignored);
        }

        let pos = self.board.validate_pos(mv.pos())?;
        match mv.action {
            MoveAction::Flag => self.set_flag(pos, true),
            MoveAction::Unflag => self.set_flag(pos, false),
            MoveAction::Reveal => {
                self.prepare_first_reveal(pos)?;
                let outcome = reveal(&mut self.board, pos)?;
                Ok(self.settle(outcome, now))
            }
            MoveAction::Chord => {
                let outcome = chord(&mut self.board, pos)?;
                Ok(self.settle(outcome, now))
            }
        }
    }

    /// Under [`MinePlacement::SafeFirstClick`], re-draws the board from the
    /// game's seed with `pos` kept safe. Flags placed so far are kept.
    fn prepare_first_reveal(&mut self, pos: Pos) -> Result<()> {
        if self.placement != MinePlacement::SafeFirstClick
            || self.status != GameStatus::NotStarted
        {
            return Ok(());
        }
        if self.board.cell(pos).is_some_and(Cell::is_flagged) {
            return Err(IllegalMove::RevealFlagged.into());
        }

        let mut board = generate(&self.config, self.seed, Some(pos))?;
        board.carry_flags_from(&self.board);
        self.board = board;
        debug!(
            "Re-drew board for game {} keeping ({}, {}) safe",
            self.id, pos.row, pos.col
        );
        Ok(())
    }

    fn set_flag(&mut self, pos: Pos, flagged: bool) -> Result<MoveOutcome> {
        let cell = self
            .board
            .cell_mut(pos)
            .ok_or(GameError::OutOfBounds {
                row: pos.row,
                col: pos.col,
            })?;

        match (cell.revealed, flagged) {
            (RevealedState::Revealed, true) => Err(IllegalMove::FlagRevealed.into()),
            (RevealedState::Revealed, false) => Err(IllegalMove::UnflagRevealed.into()),
            (RevealedState::Hidden, true) => {
                cell.revealed = RevealedState::Flagged;
                self.flags_used += 1;
                debug!("Cell ({}, {}) flagged", pos.row, pos.col);
                Ok(MoveOutcome::Applied)
            }
            (RevealedState::Flagged, false) => {
                cell.revealed = RevealedState::Hidden;
                self.flags_used -= 1;
                debug!("Cell ({}, {}) unflagged", pos.row, pos.col);
                Ok(MoveOutcome::Applied)
            }
            (RevealedState::Flagged, true) | (RevealedState::Hidden, false) => {
                Ok(MoveOutcome::Ignored)
            }
        }
    }

    /// Folds a reveal or chord result into status and timing.
    fn settle(&mut self, outcome: RevealOutcome, now: DateTime<Utc>) -> MoveOutcome {
        if !outcome.has_update() {
            return MoveOutcome::Ignored;
        }

        if self.status == GameStatus::NotStarted {
            self.status = GameStatus::InProgress;
            self.start_time = Some(now);
        }
        self.cells_revealed += outcome.revealed;

        if outcome.hit_mine {
            self.reveal_mines();
            self.finish(GameStatus::Lost, now);
            info!("Game {} lost", self.id);
        } else if self.cells_revealed == self.board.safe_cell_count() {
            self.finish(GameStatus::Won, now);
            info!("Game {} won, all safe cells revealed", self.id);
        } else {
            debug!(
                "Revealed {} cells in game {}, game continues",
                outcome.revealed, self.id
            );
        }

        MoveOutcome::Applied
    }

    /// Shows every mine the player did not flag.
    fn reveal_mines(&mut self) {
        for cell in self.board.iter_mut() {
            if cell.mine && cell.is_hidden() {
                cell.revealed = RevealedState::Revealed;
            }
        }
    }

    fn finish(&mut self, status: GameStatus, now: DateTime<Utc>) {
        self.status = status;
        self.end_time = Some(now);
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let finished = self.status.is_terminal();
        let cells = self
            .board
            .rows()
            .enumerate()
            .map(|(row, cells)| {
                cells
                    .iter()
                    .enumerate()
                    .map(|(col, cell)| cell_view(Pos { row, col }, cell, finished))
                    .collect()
            })
            .collect();

        GameSnapshot {
            id: self.id.clone(),
            status: self.status,
            board: BoardView {
                width: self.board.width(),
                height: self.board.height(),
                mine_count: self.board.mine_count(),
                cells,
            },
            flags_used: self.flags_used,
            cells_revealed: self.cells_revealed,
            start_time: self.start_time,
            end_time: self.end_time,
        }
    }
}

/// Mine identity and counts stay hidden until a cell is revealed or the game
/// is over.
fn cell_view(pos: Pos, cell: &Cell, finished: bool) -> CellView {
    let visible = finished || cell.is_revealed();
    CellView {
        row: pos.row,
        col: pos.col,
        is_revealed: cell.is_revealed(),
        is_flagged: cell.is_flagged(),
        is_mine: visible && cell.mine,
        neighbor_mines: if visible { cell.adjacent } else { 0 },
    }
}
