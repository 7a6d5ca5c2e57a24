//! The simulation engine (spec §4.D).

mod engine;

pub use engine::{Game, PlayerStat};
