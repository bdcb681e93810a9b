use itertools::Itertools;
use rand::RngCore;
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::BrainError;

/// One dense map from `n` inputs to `m` outputs.
///
/// `inputs` and `outputs` hold the values of the most recent [`Network::evaluate`]
/// call. They are kept on purpose: the diagram reads them after the tick is over.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    #[serde(deserialize_with = "nullable_values")]
    pub inputs: Vec<f64>,
    #[serde(deserialize_with = "nullable_values")]
    pub outputs: Vec<f64>,
    /// `weights[i][j]` connects input `i` to output `j`.
    pub weights: Vec<Vec<f64>>,
    pub biases: Vec<f64>,
}

// A layer that was saved before it ever ran has `null` in its snapshot slots.
fn nullable_values<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
    let values: Vec<Option<f64>> = Vec::deserialize(deserializer)?;
    Ok(values.into_iter().map(|v| v.unwrap_or(0.)).collect())
}

/// Binary threshold: a unit fires when its weighted sum plus bias is above zero.
pub fn fires(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else {
        0.0
    }
}

impl Layer {
    pub fn init<R: RngCore>(rng: &mut R, n_inputs: usize, n_outputs: usize) -> Layer {
        let between = Uniform::new_inclusive(-1.0, 1.0);
        let weights = (0..n_inputs)
            .map(|_| (0..n_outputs).map(|_| between.sample(rng)).collect_vec())
            .collect_vec();
        let biases = (0..n_outputs).map(|_| between.sample(rng)).collect_vec();

        Layer {
            inputs: vec![0.; n_inputs],
            outputs: vec![0.; n_outputs],
            weights,
            biases,
        }
    }

    pub fn n_inputs(&self) -> usize {
        self.weights.len()
    }

    pub fn n_outputs(&self) -> usize {
        self.biases.len()
    }

    /// Overwrites the snapshot with `inputs` and the freshly computed outputs.
    /// The width is only checked by [`Network::evaluate`].
    pub(crate) fn feed_forward(&mut self, inputs: &[f64]) -> &[f64] {
        debug_assert!(inputs.len() == self.n_inputs(), "Tried to feed a layer with the wrong input width");
        self.inputs.clear();
        self.inputs.extend_from_slice(inputs);

        let n_outputs = self.n_outputs();
        self.outputs.resize(n_outputs, 0.);
        for j in 0..n_outputs {
            let active_sum = self
                .inputs
                .iter()
                .zip(self.weights.iter())
                .fold(self.biases[j], |acc, (input, row)| acc + input * row[j]);
            self.outputs[j] = fires(active_sum);
        }
        &self.outputs
    }

    fn check(&self, index: usize) -> Result<(), BrainError> {
        let n = self.n_inputs();
        let m = self.n_outputs();
        if n == 0 || m == 0 {
            return Err(BrainError::ShapeMismatch(format!("layer {index} is empty")));
        }
        if let Some((row, weights)) = self.weights.iter().find_position(|w| w.len() != m) {
            return Err(BrainError::ShapeMismatch(format!(
                "layer {index} weight row {row} has {} columns, expected {m}",
                weights.len()
            )));
        }
        if self.inputs.len() != n || self.outputs.len() != m {
            return Err(BrainError::ShapeMismatch(format!(
                "layer {index} snapshot is {}x{}, expected {n}x{m}",
                self.inputs.len(),
                self.outputs.len()
            )));
        }
        Ok(())
    }
}

/// A chain of layers. The topology is fixed once built; only values change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Network {
    #[serde(rename = "levels")]
    pub layers: Vec<Layer>,
}

impl Network {
    /// One layer per adjacent pair in `layer_sizes`, every parameter drawn from `[-1, 1]`.
    pub fn init<R: RngCore>(rng: &mut R, layer_sizes: &[usize]) -> Result<Network, BrainError> {
        if layer_sizes.len() < 2 || layer_sizes.contains(&0) {
            return Err(BrainError::InvalidTopology(layer_sizes.to_vec()));
        }
        let layers = layer_sizes
            .iter()
            .tuple_windows()
            .map(|(&n, &m)| Layer::init(rng, n, m))
            .collect();
        Ok(Network { layers })
    }

    pub fn n_inputs(&self) -> usize {
        self.layers.first().map_or(0, Layer::n_inputs)
    }

    pub fn n_outputs(&self) -> usize {
        self.layers.last().map_or(0, Layer::n_outputs)
    }

    /// Layer sizes in the form accepted by [`Network::init`].
    pub fn shape(&self) -> Vec<usize> {
        let mut shape = vec![self.n_inputs()];
        shape.extend(self.layers.iter().map(Layer::n_outputs));
        shape
    }

    /// Runs `inputs` through every layer and returns the last layer's outputs.
    ///
    /// Each layer keeps what it saw and produced, so after this call the whole
    /// network reflects exactly this evaluation.
    pub fn evaluate(&mut self, inputs: &[f64]) -> Result<Vec<f64>, BrainError> {
        let expected = self.n_inputs();
        if inputs.len() != expected {
            return Err(BrainError::InputWidth { expected, got: inputs.len() });
        }

        let mut values = inputs.to_vec();
        for layer in self.layers.iter_mut() {
            values = layer.feed_forward(&values).to_vec();
        }
        Ok(values)
    }

    /// Checks that every layer is rectangular and that adjacent layers chain.
    pub fn validate(&self) -> Result<(), BrainError> {
        if self.layers.is_empty() {
            return Err(BrainError::ShapeMismatch("network has no layers".to_string()));
        }
        for (index, layer) in self.layers.iter().enumerate() {
            layer.check(index)?;
        }
        for (index, (lower, upper)) in self.layers.iter().tuple_windows().enumerate() {
            if lower.n_outputs() != upper.n_inputs() {
                return Err(BrainError::ShapeMismatch(format!(
                    "layer {index} produces {} values but layer {} takes {}",
                    lower.n_outputs(),
                    index + 1,
                    upper.n_inputs()
                )));
            }
        }
        Ok(())
    }

    /// [`Network::validate`] plus the widths the caller is going to wire in and out.
    pub fn validate_for(&self, n_inputs: usize, n_outputs: usize) -> Result<(), BrainError> {
        self.validate()?;
        if self.n_inputs() != n_inputs || self.n_outputs() != n_outputs {
            return Err(BrainError::ShapeMismatch(format!(
                "network is {}->{}, expected {n_inputs}->{n_outputs}",
                self.n_inputs(),
                self.n_outputs()
            )));
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parses and validates the layer chain; widths are left to the caller.
    pub fn from_json(json: &str) -> Result<Network, crate::error::PersistError> {
        let network: Network = serde_json::from_str(json)?;
        network.validate()?;
        Ok(network)
    }
}
