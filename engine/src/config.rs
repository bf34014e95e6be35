use minesweeper_common::models::GameParams;

use crate::error::ConfigError;

/// Dimensions and mine count of a board, checked so that at least one cell is safe.
///
/// The one safe cell is what mine placement relies on to keep the first click clear;
/// a `Board` can only be built from a config that passed these checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardConfig {
    rows: usize,
    cols: usize,
    mines: usize,
}

impl BoardConfig {
    pub const DEFAULT_ROWS: usize = 10;
    pub const DEFAULT_COLS: usize = 10;
    pub const DEFAULT_MINES: usize = 10;
    /// Largest grid a board will allocate, 256x256.
    pub const MAX_CELLS: usize = 1 << 16;

    pub fn new(rows: usize, cols: usize, mines: usize) -> Result<Self, ConfigError> {
        if rows == 0 || cols == 0 {
            return Err(ConfigError::EmptyBoard { rows, cols });
        }

        let cells = rows
            .checked_mul(cols)
            .filter(|&cells| cells <= Self::MAX_CELLS)
            .ok_or(ConfigError::TooLarge {
                rows,
                cols,
                max: Self::MAX_CELLS,
            })?;

        if mines >= cells {
            return Err(ConfigError::TooManyMines { mines, cells });
        }

        Ok(Self { rows, cols, mines })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn mines(&self) -> usize {
        self.mines
    }

    pub fn cell_count(&self) -> usize {
        self.rows * self.cols
    }

    /// Number of cells that must be revealed to win.
    pub fn safe_cells(&self) -> usize {
        self.cell_count() - self.mines
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            rows: Self::DEFAULT_ROWS,
            cols: Self::DEFAULT_COLS,
            mines: Self::DEFAULT_MINES,
        }
    }
}

impl TryFrom<GameParams> for BoardConfig {
    type Error = ConfigError;

    fn try_from(params: GameParams) -> Result<Self, Self::Error> {
        Self::new(params.rows, params.cols, params.mines)
    }
}

impl From<BoardConfig> for GameParams {
    fn from(config: BoardConfig) -> Self {
        Self {
            rows: config.rows,
            cols: config.cols,
            mines: config.mines,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_ten_by_ten_with_ten_mines() {
        let config = BoardConfig::default();
        assert_eq!((config.rows(), config.cols(), config.mines()), (10, 10, 10));
        assert_eq!(config.safe_cells(), 90);
        assert_eq!(GameParams::from(config), GameParams::default());
    }

    #[test]
    fn rejects_boards_without_a_safe_cell() {
        assert_eq!(
            BoardConfig::new(3, 3, 9),
            Err(ConfigError::TooManyMines { mines: 9, cells: 9 })
        );
        assert!(BoardConfig::new(3, 3, 8).is_ok());
        assert!(BoardConfig::new(1, 1, 0).is_ok());
    }

    #[test]
    fn rejects_empty_and_overflowing_boards() {
        assert_eq!(
            BoardConfig::new(0, 4, 0),
            Err(ConfigError::EmptyBoard { rows: 0, cols: 4 })
        );
        assert!(matches!(
            BoardConfig::new(usize::MAX, 2, 1),
            Err(ConfigError::TooLarge { .. })
        ));
    }

    #[test]
    fn caps_the_number_of_cells() {
        assert!(BoardConfig::new(256, 256, 0).is_ok());
        assert_eq!(
            BoardConfig::new(256, 257, 0),
            Err(ConfigError::TooLarge {
                rows: 256,
                cols: 257,
                max: BoardConfig::MAX_CELLS
            })
        );
        assert!(matches!(
            BoardConfig::new(1_000_000, 1_000_000, 0),
            Err(ConfigError::TooLarge { .. })
        ));
        assert!(BoardConfig::new(1, BoardConfig::MAX_CELLS, 1).is_ok());
    }

    #[test]
    fn converts_from_game_params() {
        let params = GameParams {
            rows: 4,
            cols: 6,
            mines: 5,
        };
        let config = BoardConfig::try_from(params).unwrap();
        assert_eq!(config.cell_count(), 24);
        assert!(BoardConfig::try_from(GameParams { mines: 24, ..params }).is_err());
    }
}
