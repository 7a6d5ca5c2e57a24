pub mod arena;
pub mod config;
pub mod geometry;
pub mod net;
pub mod simulation;
pub mod users;
pub mod world;

pub use arena::{ArenaSlot, SnapshotArena};
pub use config::GameConfig;
pub use geometry::Point;
pub use net::{
    read_frame, write_frame, FrameError, FrameIoError, Message, WireFood, WirePoint, WireSnake,
    MAX_FRAME_SIZE,
};
pub use simulation::{Game, PlayerStat};
pub use users::{UserDirectory, UsersFileError};
pub use world::{CreateSnakeRequest, Direction, Field, Food, Player, Snake};
