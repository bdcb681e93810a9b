use rand::RngCore;
use rand_distr::{Distribution, Uniform};

use crate::geometry::lerp;

use super::network::Network;

/// Pulls every weight and bias towards a fresh draw from `[-1, 1]` by `amount`.
///
/// `amount = 0` leaves the network untouched and `amount = 1` replaces every
/// parameter outright. There is no memory between calls.
pub fn mutate<R: RngCore>(rng: &mut R, network: &mut Network, amount: f64) {
    debug_assert!((0.0..=1.0).contains(&amount), "Tried to mutate with an amount outside [0, 1]");
    let between = Uniform::new_inclusive(-1.0, 1.0);

    for layer in network.layers.iter_mut() {
        for bias in layer.biases.iter_mut() {
            *bias = lerp(*bias, between.sample(rng), amount);
        }
        for weight in layer.weights.iter_mut().flatten() {
            *weight = lerp(*weight, between.sample(rng), amount);
        }
    }
}

/// A deep copy of `network`, mutated.
pub fn mutated<R: RngCore>(rng: &mut R, network: &Network, amount: f64) -> Network {
    let mut child = network.clone();
    mutate(rng, &mut child, amount);
    child
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn parameters(network: &Network) -> Vec<f64> {
        network
            .layers
            .iter()
            .flat_map(|l| l.biases.iter().chain(l.weights.iter().flatten()))
            .copied()
            .collect_vec()
    }

    #[test]
    fn zero_amount_is_a_no_op() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(11);
        let mut network = Network::init(&mut rng, &[5, 6, 4]).unwrap();
        let before = parameters(&network);
        mutate(&mut rng, &mut network, 0.0);
        let after = parameters(&network);
        let identical = before.iter().zip(after.iter()).all(|(a, b)| a.to_bits() == b.to_bits());
        assert!(identical);
    }

    #[test]
    fn full_amount_replaces_everything() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(12);
        let mut network = Network::init(&mut rng, &[5, 6, 4]).unwrap();
        let before = parameters(&network);
        mutate(&mut rng, &mut network, 1.0);
        let after = parameters(&network);
        assert_eq!(before.len(), after.len());
        assert!(before.iter().zip(after.iter()).all(|(a, b)| a != b));
        assert!(after.iter().all(|v| (-1.0..=1.0).contains(v)));
    }

    #[test]
    fn partial_amount_stays_between_old_and_new() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(13);
        let network = Network::init(&mut rng, &[3, 2]).unwrap();
        let child = mutated(&mut rng, &network, 0.1);
        let before = parameters(&network);
        let after = parameters(&child);
        // a 10% pull towards a point in [-1, 1] moves a value by at most 0.2
        assert!(before.iter().zip(after.iter()).all(|(a, b)| (a - b).abs() <= 0.2 + 1e-12));
        assert_ne!(before, after);
        assert_eq!(child.shape(), network.shape());
    }
}
