use std::collections::VecDeque;

use minesweeper_common::models::Pos;

use crate::{
    data::{Board, RevealedState},
    error::{IllegalMove, Result},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RevealOutcome {
    pub hit_mine: bool,
    /// Safe cells newly revealed by this call.
    pub revealed: usize,
}

impl RevealOutcome {
    pub const NO_CHANGE: Self = Self {
        hit_mine: false,
        revealed: 0,
    };

    pub const fn has_update(&self) -> bool {
        self.hit_mine || self.revealed > 0
    }
}

/// Reveals `pos`, cascading through zero-count cells.
///
/// Revealing an already revealed cell is a no-op. Flagged cells are not
/// revealable directly.
pub fn reveal(board: &mut Board, pos: Pos) -> Result<RevealOutcome> {
    let pos = board.validate_pos(pos)?;
    let Some(cell) = board.cell(pos) else {
        return Ok(RevealOutcome::NO_CHANGE);
    };

    match cell.revealed {
        RevealedState::Revealed => Ok(RevealOutcome::NO_CHANGE),
        RevealedState::Flagged => Err(IllegalMove::RevealFlagged.into()),
        RevealedState::Hidden => Ok(flood(board, pos)),
    }
}

/// Cascading reveal from a hidden cell. Mines are revealed alone; flagged
/// cells stop the cascade and keep their flag.
pub(crate) fn flood(board: &mut Board, start: Pos) -> RevealOutcome {
    let Some(cell) = board.cell_mut(start) else {
        return RevealOutcome::NO_CHANGE;
    };
    if !cell.is_hidden() {
        return RevealOutcome::NO_CHANGE;
    }

    if cell.mine {
        cell.revealed = RevealedState::Revealed;
        return RevealOutcome {
            hit_mine: true,
            revealed: 0,
        };
    }

    let mut revealed = 0;
    let mut to_visit = VecDeque::from([start]);

    while let Some(pos) = to_visit.pop_front() {
        let Some(cell) = board.cell_mut(pos) else {
            continue;
        };
        if !cell.is_hidden() || cell.mine {
            continue;
        }

        cell.revealed = RevealedState::Revealed;
        revealed += 1;

        if cell.adjacent == 0 {
            let next: Vec<Pos> = board
                .neighbors(pos)
                .filter(|&neighbor| board.cell(neighbor).is_some_and(|c| c.is_hidden()))
                .collect();
            to_visit.extend(next);
        }
    }

    RevealOutcome {
        hit_mine: false,
        revealed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GameError;

    fn board(width: usize, height: usize, mines: &[(usize, usize)]) -> Board {
        let mines: Vec<_> = mines.iter().map(|&(r, c)| Pos::new(r, c)).collect();
        Board::with_mines(width, height, &mines).unwrap()
    }

    fn revealed(board: &Board) -> Vec<Pos> {
        board
            .iter()
            .filter(|(_, cell)| cell.is_revealed())
            .map(|(pos, _)| pos)
            .collect()
    }

    #[test]
    fn mine_is_revealed_without_cascade() {
        let mut board = board(2, 2, &[(0, 0)]);

        let outcome = reveal(&mut board, Pos::new(0, 0)).unwrap();

        assert!(outcome.hit_mine);
        assert_eq!(revealed(&board), vec![Pos::new(0, 0)]);
    }

    #[test]
    fn numbered_cell_reveals_only_itself() {
        let mut board = board(3, 3, &[(0, 0)]);

        let outcome = reveal(&mut board, Pos::new(1, 1)).unwrap();

        assert_eq!(
            outcome,
            RevealOutcome {
                hit_mine: false,
                revealed: 1
            }
        );
        assert_eq!(revealed(&board), vec![Pos::new(1, 1)]);
    }

    #[test]
    fn zero_region_opens_to_numbered_border() {
        // . . . . *
        // . . . . .
        // . . . . .
        // * . . . .
        let mut board = board(5, 4, &[(0, 4), (3, 0)]);

        let outcome = reveal(&mut board, Pos::new(0, 0)).unwrap();

        // everything except the two mines
        assert_eq!(outcome.revealed, 18);
        assert!(!board.cell(Pos::new(0, 4)).unwrap().is_revealed());
        assert!(!board.cell(Pos::new(3, 0)).unwrap().is_revealed());
        assert!(board.cell(Pos::new(2, 1)).unwrap().is_revealed());
    }

    #[test]
    fn open_nine_by_nine_stops_at_numbers() {
        // Mine wall down column 4 splits the board; the cascade from the
        // left side must stop at column 3.
        let wall: Vec<_> = (0..9).map(|row| (row, 4)).collect();
        let mut board = board(9, 9, &wall);

        let outcome = reveal(&mut board, Pos::new(0, 0)).unwrap();

        assert!(!outcome.hit_mine);
        assert_eq!(outcome.revealed, 9 * 4);
        for (pos, cell) in board.iter() {
            assert_eq!(cell.is_revealed(), pos.col < 4, "{pos:?}");
        }
        assert_eq!(board.cell(Pos::new(4, 3)).unwrap().adjacent, 3);
        assert_eq!(board.cell(Pos::new(4, 2)).unwrap().adjacent, 0);
    }

    #[test]
    fn cascade_never_crosses_flags() {
        // Flags across row 1 block the zero region below them.
        let mut board = board(3, 4, &[(3, 2)]);
        for col in 0..3 {
            board.cell_mut(Pos::new(1, col)).unwrap().revealed = RevealedState::Flagged;
        }

        let outcome = reveal(&mut board, Pos::new(0, 0)).unwrap();

        assert_eq!(outcome.revealed, 3);
        assert!(board.cell(Pos::new(1, 1)).unwrap().is_flagged());
        assert!(!board.cell(Pos::new(2, 0)).unwrap().is_revealed());
    }

    #[test]
    fn flagged_cell_is_not_revealable() {
        let mut board = board(2, 2, &[]);
        board.cell_mut(Pos::new(0, 0)).unwrap().revealed = RevealedState::Flagged;

        assert_eq!(
            reveal(&mut board, Pos::new(0, 0)),
            Err(GameError::IllegalMove(IllegalMove::RevealFlagged))
        );
        assert!(revealed(&board).is_empty());
    }

    #[test]
    fn revealing_twice_is_a_no_op() {
        let mut board = board(3, 3, &[(0, 0)]);
        reveal(&mut board, Pos::new(2, 2)).unwrap();
        let before = board.clone();

        let outcome = reveal(&mut board, Pos::new(2, 2)).unwrap();

        assert_eq!(outcome, RevealOutcome::NO_CHANGE);
        assert_eq!(board, before);
    }

    #[test]
    fn revealed_mine_is_not_reported_again() {
        let mut board = board(2, 2, &[(0, 0)]);
        reveal(&mut board, Pos::new(0, 0)).unwrap();

        assert_eq!(
            reveal(&mut board, Pos::new(0, 0)).unwrap(),
            RevealOutcome::NO_CHANGE
        );
    }

    #[test]
    fn out_of_bounds_is_rejected() {
        let mut board = board(2, 2, &[]);
        assert_eq!(
            reveal(&mut board, Pos::new(0, 2)),
            Err(GameError::OutOfBounds { row: 0, col: 2 })
        );
    }
}
