use minesweeper_common::models::{self, Pos};

/// One grid position. Only the board mutates cells; callers read them through the
/// accessors below.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub(crate) row: usize,
    pub(crate) col: usize,
    pub(crate) is_mine: bool,
    pub(crate) is_revealed: bool,
    pub(crate) is_flagged: bool,
    pub(crate) adjacent_mines: u8,
}

impl Cell {
    pub(crate) fn new(row: usize, col: usize) -> Self {
        Self {
            row,
            col,
            is_mine: false,
            is_revealed: false,
            is_flagged: false,
            adjacent_mines: 0,
        }
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn col(&self) -> usize {
        self.col
    }

    pub fn pos(&self) -> Pos {
        Pos::new(self.row, self.col)
    }

    pub fn is_mine(&self) -> bool {
        self.is_mine
    }

    pub fn is_revealed(&self) -> bool {
        self.is_revealed
    }

    pub fn is_flagged(&self) -> bool {
        self.is_flagged
    }

    /// Mines among the up to eight neighbours. Always 0 on a mine.
    pub fn adjacent_mines(&self) -> u8 {
        self.adjacent_mines
    }
}

impl From<&Cell> for models::Cell {
    fn from(value: &Cell) -> Self {
        match value {
            Cell {
                is_revealed: true,
                is_mine: true,
                ..
            } => Self::Mine,
            Cell {
                is_revealed: true,
                adjacent_mines,
                ..
            } => Self::Revealed {
                adjacent: *adjacent_mines,
            },
            Cell {
                is_flagged: true, ..
            } => Self::Flagged,
            _ => Self::Hidden,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_cells_do_not_leak_mines() {
        let mut cell = Cell::new(1, 2);
        cell.is_mine = true;
        assert_eq!(models::Cell::from(&cell), models::Cell::Hidden);

        cell.is_flagged = true;
        assert_eq!(models::Cell::from(&cell), models::Cell::Flagged);
    }

    #[test]
    fn revealed_cells_render_their_content() {
        let mut cell = Cell::new(0, 0);
        cell.is_revealed = true;
        cell.adjacent_mines = 4;
        assert_eq!(
            models::Cell::from(&cell),
            models::Cell::Revealed { adjacent: 4 }
        );

        cell.is_mine = true;
        assert_eq!(models::Cell::from(&cell), models::Cell::Mine);
        assert_eq!(cell.pos(), Pos::new(0, 0));
    }
}
