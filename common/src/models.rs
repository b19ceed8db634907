use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Board dimensions and mine count a game is generated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub width: usize,
    pub height: usize,
    pub mine_count: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: 9,
            height: 9,
            mine_count: 10,
        }
    }
}

impl Config {
    /// Largest board a game may use.
    pub const MAX_CELLS: usize = 250_000;

    pub const fn total_cells(&self) -> usize {
        self.width.saturating_mul(self.height)
    }

    /// A config is usable when both dimensions are positive, the board has at
    /// most [`Config::MAX_CELLS`] cells and at least one cell is left free of
    /// mines.
    pub const fn is_valid(&self) -> bool {
        let total = self.total_cells();
        self.width > 0 && self.height > 0 && total <= Self::MAX_CELLS && self.mine_count < total
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{} with {} mines",
            self.width, self.height, self.mine_count
        )
    }
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pos {
    pub row: usize,
    pub col: usize,
}

impl Pos {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MoveAction {
    Reveal,
    Flag,
    Unflag,
    Chord,
}

impl MoveAction {
    /// Reveal-type moves are the ones that can start or end a game.
    pub const fn is_reveal_type(self) -> bool {
        matches!(self, Self::Reveal | Self::Chord)
    }
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Move {
    pub row: usize,
    pub col: usize,
    pub action: MoveAction,
}

impl Move {
    pub const fn new(row: usize, col: usize, action: MoveAction) -> Self {
        Self { row, col, action }
    }

    pub const fn pos(&self) -> Pos {
        Pos::new(self.row, self.col)
    }
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameStatus {
    #[default]
    NotStarted,
    InProgress,
    Won,
    Lost,
}

impl GameStatus {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

/// Player-visible view of a single cell.
///
/// `is_mine` and `neighbor_mines` are only populated for revealed cells, or
/// for every cell once the game is over.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CellView {
    pub row: usize,
    pub col: usize,
    pub is_revealed: bool,
    pub is_flagged: bool,
    pub is_mine: bool,
    pub neighbor_mines: u8,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BoardView {
    pub width: usize,
    pub height: usize,
    pub mine_count: usize,
    pub cells: Vec<Vec<CellView>>,
}

impl BoardView {
    pub fn cell(&self, pos: Pos) -> Option<&CellView> {
        self.cells.get(pos.row)?.get(pos.col)
    }
}

/// Complete value snapshot of one game. Never aliases live actor state.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub id: String,
    pub status: GameStatus,
    pub board: BoardView,
    pub flags_used: usize,
    pub cells_revealed: usize,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl GameSnapshot {
    /// Mines not yet accounted for by flags. Goes negative when over-flagged.
    pub fn mines_left(&self) -> i64 {
        self.board.mine_count as i64 - self.flags_used as i64
    }
}
