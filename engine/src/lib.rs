//! Minesweeper Board Engine
//!
//! Owns every piece of state of one game session and exposes the operations a front end
//! dispatches to it: [`Board::reveal`] for the primary click and [`Board::toggle_flag`]
//! for the secondary one. Mines are placed lazily on the first reveal so that the first
//! click is always safe.
//!
//! Each mutating call returns [`Changes`]: the positions whose rendered state changed and,
//! when the call ended the game, its [`Outcome`].
//!
//! ```rust
//! use minesweeper_engine::{Board, BoardConfig, Phase, Pos};
//! use rand::{SeedableRng, rngs::StdRng};
//!
//! let config = BoardConfig::new(8, 8, 10)?;
//! let mut board = Board::with_rng(config, StdRng::seed_from_u64(42));
//! assert_eq!(board.phase(), Phase::Setup);
//!
//! let changes = board.reveal(Pos::new(3, 3));
//! assert!(changes.changed.contains(&Pos::new(3, 3)));
//! assert!(!board.cell(Pos::new(3, 3)).unwrap().is_mine());
//!
//! board.toggle_flag(Pos::new(0, 0));
//! println!("mines left: {}", board.remaining_mine_estimate());
//! # Ok::<(), minesweeper_engine::ConfigError>(())
//! ```

mod board;
mod cell;
mod config;
mod error;

pub use board::{Board, Changes, Outcome, Phase};
pub use cell::Cell;
pub use config::BoardConfig;
pub use error::ConfigError;

pub use minesweeper_common::models::Pos;
