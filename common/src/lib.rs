//! Wire types shared between the board engine and whatever renders it.

pub mod models;
pub mod protocol;
