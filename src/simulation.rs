pub mod car;
pub mod population;
pub mod road;
pub mod sensor;

pub use car::Car;
pub use population::{best_index, Population, Tick};
pub use road::Road;
pub use sensor::Sensor;
