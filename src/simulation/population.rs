use rand::RngCore;
use tracing::{debug, info, warn};

use crate::brain::{mutated, Network};
use crate::config::{Settings, N_CONTROLS};
use crate::error::{BrainError, PersistError};
use crate::persistence::EliteStore;

use super::{car::Car, road::Road, sensor::Sensor};

/// Fixed traffic layout as `(lane, y)`.
const TRAFFIC: [(usize, f64); 7] = [
    (1, -100.),
    (0, -300.),
    (2, -300.),
    (0, -500.),
    (1, -500.),
    (1, -700.),
    (2, -700.),
];

const START_LANE: usize = 1;
const START_Y: f64 = 100.;

/// What one tick hands to the renderer.
pub struct Tick<'a> {
    pub best: usize,
    pub cars: &'a [Car],
}

impl<'a> Tick<'a> {
    pub fn best_car(&self) -> &'a Car {
        &self.cars[self.best]
    }
}

/// Index of the smallest progress value. Ties go to the first one seen.
pub fn best_index<I: IntoIterator<Item = f64>>(progress: I) -> Option<usize> {
    progress
        .into_iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, p)| match best {
            Some((_, best_p)) if best_p <= p => best,
            _ => Some((i, p)),
        })
        .map(|(i, _)| i)
}

/// Elite clones plus the traffic they are racing through.
///
/// All networks are settled during [`Population::reseed`]; ticks only evaluate them.
pub struct Population<S: EliteStore> {
    pub settings: Settings,
    pub road: Road,
    pub cars: Vec<Car>,
    pub traffic: Vec<Car>,
    pub generation: usize,
    store: S,
}

impl<S: EliteStore> Population<S> {
    pub fn init<R: RngCore>(rng: &mut R, settings: Settings, store: S) -> Result<Population<S>, BrainError> {
        let road = Road::new(settings.road_width / 2., settings.road_width, settings.lane_count);
        let mut res = Population {
            settings,
            road,
            cars: Vec::new(),
            traffic: Vec::new(),
            generation: 0,
            store,
        };
        res.reseed(rng)?;
        Ok(res)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Starts a new run from whatever elite the store holds.
    ///
    /// A stored network that fails to parse or does not fit the cars is logged
    /// and ignored; the run then starts from random networks.
    pub fn reseed<R: RngCore>(&mut self, rng: &mut R) -> Result<(), BrainError> {
        let elite = match self.load_elite() {
            Ok(elite) => elite,
            Err(err) => {
                warn!(%err, "ignoring stored elite, starting from random networks");
                None
            }
        };
        if elite.is_some() {
            self.generation += 1;
        }

        let networks = seed_networks(rng, &self.settings, elite)?;
        self.cars = networks.into_iter().map(|brain| self.spawn(brain)).collect();
        self.traffic = TRAFFIC
            .iter()
            .map(|&(lane, y)| {
                Car::traffic(
                    self.road.lane_center(lane),
                    y,
                    self.settings.car_width,
                    self.settings.car_height,
                    self.settings.traffic_max_speed,
                )
            })
            .collect();

        info!(
            generation = self.generation,
            cars = self.cars.len(),
            shape = ?self.settings.layer_sizes(),
            "population reseeded"
        );
        Ok(())
    }

    fn load_elite(&self) -> Result<Option<Network>, PersistError> {
        let Some(elite) = self.store.load()? else {
            return Ok(None);
        };
        elite.validate_for(self.settings.ray_count, N_CONTROLS)?;
        Ok(Some(elite))
    }

    fn spawn(&self, brain: Network) -> Car {
        let sensor = Sensor::new(self.settings.ray_count, self.settings.ray_length, self.settings.ray_spread);
        Car::with_brain(
            self.road.lane_center(START_LANE),
            START_Y,
            self.settings.car_width,
            self.settings.car_height,
            self.settings.max_speed,
            sensor,
            brain,
        )
    }

    /// Advances traffic, then every car, then picks the furthest car.
    pub fn tick(&mut self) -> Result<Tick<'_>, BrainError> {
        let borders = self.road.borders();
        for car in self.traffic.iter_mut() {
            car.update(&borders, &[])?;
        }
        for car in self.cars.iter_mut() {
            car.update(&borders, &self.traffic)?;
        }

        let best = best_index(self.cars.iter().map(Car::progress)).unwrap_or(0);
        Ok(Tick { best, cars: &self.cars })
    }

    /// Stores a snapshot of car `index`'s brain as the elite.
    pub fn save(&mut self, index: usize) -> Result<(), PersistError> {
        let Some(brain) = self.cars.get(index).and_then(|car| car.brain.as_ref()) else {
            warn!(index, "no brain to save");
            return Ok(());
        };
        self.store.save(brain)?;
        info!(index, progress = self.cars[index].progress(), "elite saved");
        Ok(())
    }

    pub fn discard(&mut self) -> Result<(), PersistError> {
        self.store.discard()?;
        info!("elite discarded");
        Ok(())
    }
}

/// Instance 0 gets the elite as is, the rest get mutated copies of it.
/// Without an elite every instance gets its own random network.
pub fn seed_networks<R: RngCore>(rng: &mut R, settings: &Settings, elite: Option<Network>) -> Result<Vec<Network>, BrainError> {
    let n = settings.population_size.max(1);
    match elite {
        Some(elite) => {
            debug!(n, amount = settings.mutation_amount, "cloning elite");
            let mut networks = Vec::with_capacity(n);
            for _ in 1..n {
                networks.push(mutated(rng, &elite, settings.mutation_amount));
            }
            networks.insert(0, elite);
            Ok(networks)
        }
        None => (0..n).map(|_| Network::init(rng, &settings.layer_sizes())).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    #[test]
    fn best_is_smallest_progress() {
        assert_eq!(best_index([5., 2., 9.]), Some(1));
        assert_eq!(best_index([3., -1., -1., 4.]), Some(1));
        assert_eq!(best_index(Vec::<f64>::new()), None);
    }

    #[test]
    fn tick_picks_furthest_car() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(21);
        let settings = Settings { population_size: 3, ..Settings::standard() };
        let mut population = Population::init(&mut rng, settings, MemoryStore::default()).unwrap();
        for (car, y) in population.cars.iter_mut().zip([5., 2., 9.]) {
            car.y = y;
            car.damaged = true;
        }
        let tick = population.tick().unwrap();
        assert_eq!(tick.best, 1);
        assert_eq!(tick.best_car().y, 2.);
    }

    #[test]
    fn init_without_elite_is_random() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(22);
        let settings = Settings { population_size: 4, ..Settings::standard() };
        let population = Population::init(&mut rng, settings, MemoryStore::default()).unwrap();
        assert_eq!(population.cars.len(), 4);
        assert_eq!(population.traffic.len(), TRAFFIC.len());
        assert_eq!(population.generation, 0);
        let first = population.cars[0].brain.as_ref().unwrap();
        let second = population.cars[1].brain.as_ref().unwrap();
        assert_eq!(first.shape(), vec![5, 6, 4]);
        assert_ne!(first, second);
    }

    #[test]
    fn elite_seeds_the_next_run() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(23);
        let settings = Settings { population_size: 5, ..Settings::standard() };
        let mut population = Population::init(&mut rng, settings, MemoryStore::default()).unwrap();
        population.tick().unwrap();
        population.save(2).unwrap();
        let elite = population.cars[2].brain.clone().unwrap();

        population.reseed(&mut rng).unwrap();
        assert_eq!(population.generation, 1);
        assert_eq!(population.cars[0].brain.as_ref(), Some(&elite));
        for car in &population.cars[1..] {
            assert_ne!(car.brain.as_ref(), Some(&elite));
        }
    }

    #[test]
    fn mismatched_elite_falls_back_to_random() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(24);
        let mut store = MemoryStore::default();
        let wrong = Network::init(&mut rng, &[3, 4]).unwrap();
        store.save(&wrong).unwrap();

        let settings = Settings { population_size: 3, ..Settings::standard() };
        let mut population = Population::init(&mut rng, settings, store).unwrap();
        assert_eq!(population.generation, 0);
        assert!(population.cars.iter().all(|c| c.brain.as_ref().unwrap().shape() == vec![5, 6, 4]));
        assert!(population.tick().is_ok());
    }

    #[test]
    fn discard_forgets_the_elite() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(25);
        let settings = Settings { population_size: 2, ..Settings::standard() };
        let mut population = Population::init(&mut rng, settings, MemoryStore::default()).unwrap();
        population.save(0).unwrap();
        population.discard().unwrap();
        population.discard().unwrap();
        assert!(population.store().load().unwrap().is_none());
        population.reseed(&mut rng).unwrap();
        assert_eq!(population.generation, 0);
    }
}
