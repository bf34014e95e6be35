use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("board needs at least one row and one column, got {rows}x{cols}")]
    EmptyBoard { rows: usize, cols: usize },
    #[error("a {rows}x{cols} board exceeds the limit of {max} cells")]
    TooLarge { rows: usize, cols: usize, max: usize },
    #[error("{mines} mines leave no safe cell on a board of {cells} cells")]
    TooManyMines { mines: usize, cells: usize },
}
