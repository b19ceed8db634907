use std::{fmt, str::FromStr};

use minesweeper_common::models::{Config, Pos};
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{
    data::Board,
    error::{GameError, Result},
};

/// Where mines may land relative to the first revealed cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MinePlacement {
    /// Mines are placed when the game is created; the first click may hit one.
    #[default]
    Anywhere,
    /// The board is re-drawn from the game's seed on the first reveal with
    /// the clicked cell kept free of mines.
    SafeFirstClick,
}

impl FromStr for MinePlacement {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anywhere" => Ok(Self::Anywhere),
            "safe-first-click" | "safe_first_click" => Ok(Self::SafeFirstClick),
            other => Err(format!("unknown mine placement: {other}")),
        }
    }
}

impl fmt::Display for MinePlacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Anywhere => "anywhere",
            Self::SafeFirstClick => "safe-first-click",
        })
    }
}

/// Number of cells in `config`, as long as it is addressable by the sampler.
fn checked_total(config: &Config) -> Result<u32> {
    config
        .width
        .checked_mul(config.height)
        .and_then(|total| u32::try_from(total).ok())
        .ok_or(GameError::InvalidConfig(*config))
}

pub fn validate_config(config: &Config) -> Result<()> {
    checked_total(config)?;
    if config.is_valid() {
        Ok(())
    } else {
        Err(GameError::InvalidConfig(*config))
    }
}

/// Picks `mine_count` distinct cells uniformly with selection sampling: each
/// cell in turn becomes a mine with probability `mines_left / cells_left`.
fn generate_mines(config: &Config, seed: u64, exclude: Option<usize>) -> Result<Vec<bool>> {
    let total = checked_total(config)?;
    let mut rng = StdRng::seed_from_u64(seed);

    let mut mines_left = config.mine_count as u32;
    let mut cells_left = total - u32::from(exclude.is_some());
    let mut mines = Vec::with_capacity(total as usize);

    for index in 0..total as usize {
        if exclude == Some(index) {
            mines.push(false);
            continue;
        }

        let value = rng.random_ratio(mines_left, cells_left);
        mines.push(value);
        if value {
            mines_left -= 1;
        }
        cells_left -= 1;
    }

    Ok(mines)
}

/// Generates a board for `config` from `seed`. The same inputs always yield
/// the same board.
#[instrument(level = "trace")]
pub fn generate(config: &Config, seed: u64, exclude: Option<Pos>) -> Result<Board> {
    validate_config(config)?;

    let exclude = match exclude {
        Some(pos) if pos.row >= config.height || pos.col >= config.width => {
            return Err(GameError::OutOfBounds {
                row: pos.row,
                col: pos.col,
            });
        }
        Some(pos) => Some(pos.col + pos.row * config.width),
        None => None,
    };

    let mines = generate_mines(config, seed, exclude)?;
    let board = Board::from_mask(config.width, config.height, &mines);
    debug!("Generated {} board from seed {}", config, seed);

    Ok(board)
}
