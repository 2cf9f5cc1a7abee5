//! Logic modules: the edits the board and the opportunity page perform.
//!
//! # Modules
//!
//! - `editor`: option/operator edits on one opportunity
//! - `board`: columns, moving and creating opportunities, column rollups

pub mod board;
pub mod editor;
