use minesweeper_common::models::{Config, Pos};

use crate::error::{GameError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RevealedState {
    #[default]
    Hidden,
    Flagged,
    Revealed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cell {
    pub mine: bool,
    /// Fixed at generation time.
    pub adjacent: u8,
    pub revealed: RevealedState,
}

impl Cell {
    pub fn is_revealed(&self) -> bool {
        self.revealed == RevealedState::Revealed
    }

    pub fn is_flagged(&self) -> bool {
        self.revealed == RevealedState::Flagged
    }

    pub fn is_hidden(&self) -> bool {
        self.revealed == RevealedState::Hidden
    }
}

/// Fixed-shape grid of cells stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    width: usize,
    height: usize,
    mine_count: usize,
    cells: Vec<Cell>,
}

const DISPLACEMENTS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// In-bounds neighbors of a cell, up to eight.
#[derive(Debug)]
pub struct Neighbors {
    center: Pos,
    width: usize,
    height: usize,
    index: usize,
}

impl Iterator for Neighbors {
    type Item = Pos;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(&(dr, dc)) = DISPLACEMENTS.get(self.index) {
            self.index += 1;

            let Some(row) = self.center.row.checked_add_signed(dr) else {
                continue;
            };
            let Some(col) = self.center.col.checked_add_signed(dc) else {
                continue;
            };
            if row < self.height && col < self.width {
                return Some(Pos { row, col });
            }
        }
        None
    }
}

impl Board {
    /// Builds a board from a mine mask laid out row-major, computing every
    /// cell's adjacent mine count.
    pub(crate) fn from_mask(width: usize, height: usize, mask: &[bool]) -> Self {
        debug_assert_eq!(mask.len(), width * height);

        let mut board = Self {
            width,
            height,
            mine_count: mask.iter().filter(|&&mine| mine).count(),
            cells: mask
                .iter()
                .map(|&mine| Cell {
                    mine,
                    ..Cell::default()
                })
                .collect(),
        };

        for index in 0..board.cells.len() {
            let pos = board.pos_of(index);
            let adjacent = board
                .neighbors(pos)
                .filter(|&neighbor| board.cells[board.index_of(neighbor)].mine)
                .count() as u8;
            board.cells[index].adjacent = adjacent;
        }

        board
    }

    /// Builds a board with mines at exactly the given positions.
    pub fn with_mines(width: usize, height: usize, mines: &[Pos]) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(GameError::InvalidConfig(Config {
                width,
                height,
                mine_count: mines.len(),
            }));
        }

        let mut mask = vec![false; width * height];
        for &pos in mines {
            if pos.row >= height || pos.col >= width {
                return Err(GameError::OutOfBounds {
                    row: pos.row,
                    col: pos.col,
                });
            }
            mask[pos.col + pos.row * width] = true;
        }

        Ok(Self::from_mask(width, height, &mask))
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn mine_count(&self) -> usize {
        self.mine_count
    }

    pub fn config(&self) -> Config {
        Config {
            width: self.width,
            height: self.height,
            mine_count: self.mine_count,
        }
    }

    pub fn safe_cell_count(&self) -> usize {
        self.cells.len() - self.mine_count
    }

    pub fn contains(&self, pos: Pos) -> bool {
        pos.row < self.height && pos.col < self.width
    }

    pub fn validate_pos(&self, pos: Pos) -> Result<Pos> {
        if self.contains(pos) {
            Ok(pos)
        } else {
            Err(GameError::OutOfBounds {
                row: pos.row,
                col: pos.col,
            })
        }
    }

    pub fn cell(&self, pos: Pos) -> Option<&Cell> {
        if self.contains(pos) {
            self.cells.get(self.index_of(pos))
        } else {
            None
        }
    }

    pub(crate) fn cell_mut(&mut self, pos: Pos) -> Option<&mut Cell> {
        if self.contains(pos) {
            let index = self.index_of(pos);
            self.cells.get_mut(index)
        } else {
            None
        }
    }

    pub fn neighbors(&self, center: Pos) -> Neighbors {
        Neighbors {
            center,
            width: self.width,
            height: self.height,
            index: 0,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Pos, &Cell)> {
        self.cells
            .iter()
            .enumerate()
            .map(move |(index, cell)| (self.pos_of(index), cell))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Cell> {
        self.cells.iter_mut()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(self.width)
    }

    /// Copies flags from a board of the same shape.
    pub(crate) fn carry_flags_from(&mut self, other: &Board) {
        debug_assert_eq!((self.width, self.height), (other.width, other.height));

        for (cell, old) in self.cells.iter_mut().zip(&other.cells) {
            if old.is_flagged() && cell.is_hidden() {
                cell.revealed = RevealedState::Flagged;
            }
        }
    }

    pub fn count_flagged(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_flagged()).count()
    }

    pub fn count_revealed_safe(&self) -> usize {
        self.cells
            .iter()
            .filter(|cell| cell.is_revealed() && !cell.mine)
            .count()
    }

    pub fn count_flagged_neighbors(&self, pos: Pos) -> usize {
        self.neighbors(pos)
            .filter(|&neighbor| self.cells[self.index_of(neighbor)].is_flagged())
            .count()
    }

    fn index_of(&self, pos: Pos) -> usize {
        pos.col + pos.row * self.width
    }

    fn pos_of(&self, index: usize) -> Pos {
        Pos {
            row: index / self.width,
            col: index % self.width,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neighbors_respect_edges() {
        let board = Board::with_mines(3, 3, &[]).unwrap();

        assert_eq!(board.neighbors(Pos::new(0, 0)).count(), 3);
        assert_eq!(board.neighbors(Pos::new(0, 1)).count(), 5);
        assert_eq!(board.neighbors(Pos::new(1, 1)).count(), 8);
        assert_eq!(board.neighbors(Pos::new(2, 2)).count(), 3);
    }

    #[test]
    fn single_row_board_has_horizontal_neighbors_only() {
        let board = Board::with_mines(4, 1, &[]).unwrap();
        let neighbors: Vec<_> = board.neighbors(Pos::new(0, 1)).collect();

        assert_eq!(neighbors, vec![Pos::new(0, 0), Pos::new(0, 2)]);
    }

    #[test]
    fn adjacent_counts_match_mines() {
        // * . .
        // . . .
        // . . *
        let board = Board::with_mines(3, 3, &[Pos::new(0, 0), Pos::new(2, 2)]).unwrap();

        assert_eq!(board.mine_count(), 2);
        assert_eq!(board.cell(Pos::new(1, 1)).unwrap().adjacent, 2);
        assert_eq!(board.cell(Pos::new(0, 1)).unwrap().adjacent, 1);
        assert_eq!(board.cell(Pos::new(0, 2)).unwrap().adjacent, 0);
        assert_eq!(board.cell(Pos::new(2, 1)).unwrap().adjacent, 1);
    }

    #[test]
    fn duplicate_mine_positions_count_once() {
        let board = Board::with_mines(2, 2, &[Pos::new(1, 1), Pos::new(1, 1)]).unwrap();
        assert_eq!(board.mine_count(), 1);
    }

    #[test]
    fn with_mines_rejects_out_of_bounds() {
        assert_eq!(
            Board::with_mines(2, 2, &[Pos::new(2, 0)]),
            Err(GameError::OutOfBounds { row: 2, col: 0 })
        );
    }

    #[test]
    fn validate_pos_reports_coordinates() {
        let board = Board::with_mines(2, 3, &[]).unwrap();

        assert_eq!(board.validate_pos(Pos::new(2, 1)), Ok(Pos::new(2, 1)));
        assert_eq!(
            board.validate_pos(Pos::new(3, 0)),
            Err(GameError::OutOfBounds { row: 3, col: 0 })
        );
        assert!(board.cell(Pos::new(0, 2)).is_none());
    }

    #[test]
    fn rows_are_width_sized() {
        let board = Board::with_mines(4, 2, &[]).unwrap();
        let rows: Vec<_> = board.rows().collect();

        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|row| row.len() == 4));
    }
}
