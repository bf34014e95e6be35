use std::collections::VecDeque;

use minesweeper_common::models::Pos;
use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::{debug, info, instrument, warn};

use crate::{cell::Cell, config::BoardConfig};

/// Where a session is in its lifecycle.
///
/// `Setup` lasts until the first reveal; mines do not exist before that. `Won` and `Lost`
/// are terminal until the next [`Board::new_game`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Setup,
    Playing,
    Won,
    Lost,
}

impl Phase {
    pub fn is_over(self) -> bool {
        matches!(self, Phase::Won | Phase::Lost)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Won,
    Lost,
}

/// Result of a mutating board operation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Changes {
    /// Cells whose rendered state changed, in the order they changed.
    pub changed: Vec<Pos>,
    /// Set when this call ended the game.
    pub outcome: Option<Outcome>,
}

impl Changes {
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.outcome.is_none()
    }
}

/// Grid offsets of the eight neighbours, clipped to the board.
fn neighbours(config: BoardConfig, index: usize) -> impl Iterator<Item = usize> {
    let (rows, cols) = (config.rows(), config.cols());
    let (row, col) = (index / cols, index % cols);

    (-1isize..=1)
        .flat_map(|dr| (-1isize..=1).map(move |dc| (dr, dc)))
        .filter(|&offset| offset != (0, 0))
        .filter_map(move |(dr, dc)| {
            let r = row.checked_add_signed(dr).filter(|&r| r < rows)?;
            let c = col.checked_add_signed(dc).filter(|&c| c < cols)?;
            Some(r * cols + c)
        })
}

/// A single minesweeper session.
///
/// The board owns its cells and its random source; every mutation goes through
/// [`reveal`](Board::reveal), [`toggle_flag`](Board::toggle_flag) or
/// [`new_game`](Board::new_game).
#[derive(Debug, Clone)]
pub struct Board<R = StdRng> {
    config: BoardConfig,
    cells: Vec<Cell>,
    phase: Phase,
    flags_placed: usize,
    rng: R,
}

impl Board<StdRng> {
    pub fn new(config: BoardConfig) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }
}

impl Default for Board<StdRng> {
    fn default() -> Self {
        Self::new(BoardConfig::default())
    }
}

impl<R: Rng> Board<R> {
    pub fn with_rng(config: BoardConfig, rng: R) -> Self {
        let mut board = Self {
            config,
            cells: Vec::new(),
            phase: Phase::Setup,
            flags_placed: 0,
            rng,
        };
        board.new_game(config);
        board
    }

    /// Throws away the current session and starts over with an unrevealed, mine-free
    /// grid. The random source carries over.
    #[instrument(level = "trace", skip(self))]
    pub fn new_game(&mut self, config: BoardConfig) {
        info!(
            "Starting new game: {}x{} with {} mines",
            config.rows(),
            config.cols(),
            config.mines()
        );
        self.config = config;
        self.cells = (0..config.rows())
            .flat_map(|row| (0..config.cols()).map(move |col| Cell::new(row, col)))
            .collect();
        self.phase = Phase::Setup;
        self.flags_placed = 0;
    }

    pub fn config(&self) -> BoardConfig {
        self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_game_over(&self) -> bool {
        self.phase.is_over()
    }

    pub fn is_victory(&self) -> bool {
        self.phase == Phase::Won
    }

    pub fn flags_placed(&self) -> usize {
        self.flags_placed
    }

    /// Mines minus flags, the counter a front end shows next to the grid.
    pub fn remaining_mine_estimate(&self) -> usize {
        self.config.mines() - self.flags_placed
    }

    pub fn cell(&self, pos: Pos) -> Option<&Cell> {
        self.index(pos).map(|index| &self.cells[index])
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(self.config.cols())
    }

    fn index(&self, pos: Pos) -> Option<usize> {
        (pos.row < self.config.rows() && pos.col < self.config.cols())
            .then(|| pos.row * self.config.cols() + pos.col)
    }

    /// Reveals a cell. Placing the mines is deferred to the first call of a session so
    /// that the first revealed cell is never a mine.
    ///
    /// Revealing a cell without adjacent mines also reveals the connected region of such
    /// cells and its border. Does nothing on a finished game or on a revealed or flagged
    /// cell.
    #[instrument(level = "trace", skip(self), fields(row = pos.row, col = pos.col))]
    pub fn reveal(&mut self, pos: Pos) -> Changes {
        let Some(index) = self.index(pos) else {
            warn!("Invalid reveal position: ({}, {})", pos.row, pos.col);
            return Changes::default();
        };

        if self.phase.is_over() {
            debug!(
                "Ignoring reveal on finished game at ({}, {})",
                pos.row, pos.col
            );
            return Changes::default();
        }

        let cell = &self.cells[index];
        if cell.is_revealed || cell.is_flagged {
            debug!(
                "Ignoring reveal on {} cell ({}, {})",
                if cell.is_flagged { "flagged" } else { "revealed" },
                pos.row,
                pos.col
            );
            return Changes::default();
        }

        if self.phase == Phase::Setup {
            self.place_mines(index);
            self.compute_adjacency();
            self.phase = Phase::Playing;
        }

        let mut changes = Changes::default();
        self.cells[index].is_revealed = true;
        changes.changed.push(pos);

        if self.cells[index].is_mine {
            warn!("Mine hit at ({}, {}) - game over!", pos.row, pos.col);
            self.phase = Phase::Lost;
            self.reveal_all_mines(&mut changes.changed);
            changes.outcome = Some(Outcome::Lost);
            info!("Game ended with loss");
            return changes;
        }

        if self.cells[index].adjacent_mines == 0 {
            self.flood_fill(index, &mut changes.changed);
        }
        debug!("Revealed {} cells", changes.changed.len());

        if self.check_victory(&mut changes.changed) {
            changes.outcome = Some(Outcome::Won);
        }

        changes
    }

    /// Flags or unflags an unrevealed cell. No more flags than mines can be placed.
    #[instrument(level = "trace", skip(self), fields(row = pos.row, col = pos.col))]
    pub fn toggle_flag(&mut self, pos: Pos) -> Changes {
        let Some(index) = self.index(pos) else {
            warn!("Invalid flag position: ({}, {})", pos.row, pos.col);
            return Changes::default();
        };

        if self.phase.is_over() {
            debug!(
                "Ignoring flag on finished game at ({}, {})",
                pos.row, pos.col
            );
            return Changes::default();
        }

        let cell = &mut self.cells[index];
        if cell.is_revealed {
            debug!("Ignoring flag on revealed cell ({}, {})", pos.row, pos.col);
            return Changes::default();
        }

        if cell.is_flagged {
            cell.is_flagged = false;
            self.flags_placed -= 1;
            debug!("Cell ({}, {}) unflagged", pos.row, pos.col);
        } else if self.flags_placed < self.config.mines() {
            cell.is_flagged = true;
            self.flags_placed += 1;
            debug!("Cell ({}, {}) flagged", pos.row, pos.col);
        } else {
            debug!(
                "All {} flags placed, refusing flag at ({}, {})",
                self.flags_placed, pos.row, pos.col
            );
            return Changes::default();
        }

        Changes {
            changed: vec![pos],
            outcome: None,
        }
    }

    /// Rejection sampling over the whole grid until `mines` distinct cells other than
    /// `excluded` are hit. Terminates because the config guarantees a safe cell.
    fn place_mines(&mut self, excluded: usize) {
        let (rows, cols) = (self.config.rows(), self.config.cols());
        let mut mines_left = self.config.mines();

        while mines_left > 0 {
            let index = self.rng.random_range(0..rows) * cols + self.rng.random_range(0..cols);
            let cell = &mut self.cells[index];
            if index != excluded && !cell.is_mine {
                cell.is_mine = true;
                mines_left -= 1;
            }
        }

        debug!(
            "Placed {} mines away from ({}, {})",
            self.config.mines(),
            excluded / cols,
            excluded % cols
        );
    }

    fn compute_adjacency(&mut self) {
        for index in 0..self.cells.len() {
            if self.cells[index].is_mine {
                continue;
            }

            let count = neighbours(self.config, index)
                .filter(|&neighbour| self.cells[neighbour].is_mine)
                .count();
            self.cells[index].adjacent_mines = count as u8;
        }
    }

    /// Worklist expansion from a revealed zero cell. Cells are marked revealed before
    /// they are queued, so each one is visited at most once.
    fn flood_fill(&mut self, start: usize, changed: &mut Vec<Pos>) {
        let mut queue = VecDeque::from([start]);

        while let Some(index) = queue.pop_front() {
            for neighbour in neighbours(self.config, index) {
                let cell = &mut self.cells[neighbour];
                if cell.is_revealed || cell.is_flagged {
                    continue;
                }

                cell.is_revealed = true;
                changed.push(cell.pos());

                if cell.adjacent_mines == 0 {
                    queue.push_back(neighbour);
                }
            }
        }
    }

    /// Flagged mines stay flagged and hidden: a cell is never both revealed and flagged.
    fn reveal_all_mines(&mut self, changed: &mut Vec<Pos>) {
        for cell in &mut self.cells {
            if cell.is_mine && !cell.is_revealed && !cell.is_flagged {
                cell.is_revealed = true;
                changed.push(cell.pos());
            }
        }
    }

    fn check_victory(&mut self, changed: &mut Vec<Pos>) -> bool {
        let revealed_safe = self
            .cells
            .iter()
            .filter(|cell| cell.is_revealed && !cell.is_mine)
            .count();

        if revealed_safe != self.config.safe_cells() {
            return false;
        }

        self.phase = Phase::Won;
        self.reveal_all_mines(changed);
        info!("Game won! All {} safe cells revealed.", revealed_safe);
        true
    }
}

#[cfg(test)]
#[path = "tests/board_tests.rs"]
mod tests;

#[cfg(test)]
#[path = "tests/properties.rs"]
mod properties;
