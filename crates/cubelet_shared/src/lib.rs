pub mod block;
pub mod grid;
pub mod inventory;
pub mod physics;
pub mod worldgen;
