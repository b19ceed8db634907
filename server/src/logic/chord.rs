use minesweeper_common::models::Pos;

use crate::{
    data::Board,
    error::{IllegalMove, Result},
    logic::reveal::{RevealOutcome, flood},
};

/// Reveals every hidden neighbor of a revealed numbered cell once the number
/// of flagged neighbors matches its count.
///
/// A mismatched flag count is an ineffective move and leaves the board
/// untouched. Revealing stops at the first mine hit.
pub fn chord(board: &mut Board, pos: Pos) -> Result<RevealOutcome> {
    let pos = board.validate_pos(pos)?;
    let Some(cell) = board.cell(pos) else {
        return Ok(RevealOutcome::NO_CHANGE);
    };

    if !cell.is_revealed() {
        return Err(IllegalMove::ChordUnrevealed.into());
    }
    if cell.mine {
        return Err(IllegalMove::ChordMine.into());
    }
    if cell.adjacent == 0 {
        return Err(IllegalMove::ChordZero.into());
    }

    if board.count_flagged_neighbors(pos) != usize::from(cell.adjacent) {
        return Ok(RevealOutcome::NO_CHANGE);
    }

    let neighbors: Vec<Pos> = board.neighbors(pos).collect();
    let mut outcome = RevealOutcome::NO_CHANGE;
    for neighbor in neighbors {
        let step = flood(board, neighbor);
        outcome.revealed += step.revealed;
        if step.hit_mine {
            outcome.hit_mine = true;
            break;
        }
    }

    Ok(outcome)
}
