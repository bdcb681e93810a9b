pub mod brain;
pub mod config;
pub mod error;
pub mod geometry;
pub mod persistence;
pub mod simulation;
pub mod terminal;
pub mod visualizer;
