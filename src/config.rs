use std::f64::consts::PI;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Number of controls a car exposes: forward, left, right, reverse.
pub const N_CONTROLS: usize = 4;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub population_size: usize,
    pub mutation_amount: f64,
    pub hidden_layers: Vec<usize>,

    pub ray_count: usize,
    pub ray_length: f64,
    pub ray_spread: f64,

    pub road_width: f64,
    pub lane_count: usize,
    pub car_width: f64,
    pub car_height: f64,
    pub max_speed: f64,
    pub traffic_max_speed: f64,

    pub store_dir: PathBuf,

    pub diagram_width: f64,
    pub diagram_margin: f64,
    pub node_radius: f64,
    pub dash_time_divisor: f64,
    pub frame_millis: u64,

    pub seed: Option<u64>,
}

impl Settings {
    pub fn standard() -> Settings {
        Settings {
            population_size: 100,
            mutation_amount: 0.1,
            hidden_layers: vec![6],

            ray_count: 5,
            ray_length: 150.,
            ray_spread: PI / 2.,

            road_width: 180.,
            lane_count: 3,
            car_width: 30.,
            car_height: 50.,
            max_speed: 3.,
            traffic_max_speed: 2.,

            store_dir: PathBuf::from(".neuro_drive"),

            diagram_width: 300.,
            diagram_margin: 50.,
            node_radius: 18.,
            dash_time_divisor: 50.,
            frame_millis: 16,

            seed: None,
        }
    }

    /// Reads a JSON settings file; missing fields keep their standard values.
    pub fn load(path: &Path) -> anyhow::Result<Settings> {
        use anyhow::Context;
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?;
        let settings: Settings = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse settings in {}", path.display()))?;
        settings
            .validate()
            .with_context(|| format!("invalid settings in {}", path.display()))?;
        Ok(settings)
    }

    /// Rejects values the simulation cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        let amount = self.mutation_amount;
        anyhow::ensure!((0.0..=1.0).contains(&amount), "mutation amount must be within [0, 1], got {amount}");
        Ok(())
    }

    /// Sensor rays in, hidden layers, controls out.
    pub fn layer_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![self.ray_count];
        sizes.extend(self.hidden_layers.iter().copied());
        sizes.push(N_CONTROLS);
        sizes
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings::standard()
    }
}
