pub mod mutation;
pub mod network;

pub use mutation::{mutate, mutated};
pub use network::{Layer, Network};
