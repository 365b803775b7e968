//! Command implementations

pub mod inspect;
pub mod prefs;
pub mod score;
pub mod suggest;
pub mod train;
pub mod update;
