use std::f64::consts::PI;

use crate::brain::Network;
use crate::error::BrainError;
use crate::geometry::{polys_intersect, Point, Segment};

use super::sensor::Sensor;

const ACCELERATION: f64 = 0.2;
const FRICTION: f64 = 0.05;
const STEERING: f64 = 0.03;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Controls {
    pub forward: bool,
    pub left: bool,
    pub right: bool,
    pub reverse: bool,
}

impl Controls {
    /// Maps `[forward, left, right, reverse]` network outputs; a firing unit presses its key.
    pub fn from_outputs(outputs: &[f64]) -> Controls {
        let pressed = |i: usize| outputs.get(i).is_some_and(|&v| v > 0.0);
        Controls {
            forward: pressed(0),
            left: pressed(1),
            right: pressed(2),
            reverse: pressed(3),
        }
    }
}

/// A vehicle on the road. Learning cars carry a sensor and a brain; traffic
/// has neither and just holds the accelerator down.
#[derive(Clone, Debug)]
pub struct Car {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub speed: f64,
    pub max_speed: f64,
    pub angle: f64,
    pub damaged: bool,
    pub polygon: Vec<Point>,
    pub controls: Controls,
    pub sensor: Option<Sensor>,
    pub brain: Option<Network>,
}

impl Car {
    fn create(x: f64, y: f64, width: f64, height: f64, max_speed: f64) -> Car {
        let mut car = Car {
            x,
            y,
            width,
            height,
            speed: 0.,
            max_speed,
            angle: 0.,
            damaged: false,
            polygon: Vec::with_capacity(4),
            controls: Controls::default(),
            sensor: None,
            brain: None,
        };
        car.polygon = car.create_polygon();
        car
    }

    pub fn with_brain(x: f64, y: f64, width: f64, height: f64, max_speed: f64, sensor: Sensor, brain: Network) -> Car {
        let mut car = Car::create(x, y, width, height, max_speed);
        car.sensor = Some(sensor);
        car.brain = Some(brain);
        car
    }

    pub fn traffic(x: f64, y: f64, width: f64, height: f64, max_speed: f64) -> Car {
        let mut car = Car::create(x, y, width, height, max_speed);
        car.controls.forward = true;
        car
    }

    /// Smaller is better: the road runs towards negative `y`.
    pub fn progress(&self) -> f64 {
        self.y
    }

    /// One physical step, then sense, then let the brain pick the next controls.
    ///
    /// Fails only when the sensor width does not match the brain.
    pub fn update(&mut self, borders: &[Segment], traffic: &[Car]) -> Result<(), BrainError> {
        if !self.damaged {
            self.step();
            self.polygon = self.create_polygon();
            self.damaged = self.assess_damage(borders, traffic);
        }

        if let Some(sensor) = self.sensor.as_mut() {
            sensor.update(Point::new(self.x, self.y), self.angle, borders, traffic);
            if let Some(brain) = self.brain.as_mut() {
                let outputs = brain.evaluate(&sensor.offsets())?;
                self.controls = Controls::from_outputs(&outputs);
            }
        }
        Ok(())
    }

    fn assess_damage(&self, borders: &[Segment], traffic: &[Car]) -> bool {
        borders.iter().any(|&(a, b)| polys_intersect(&self.polygon, &[a, b]))
            || traffic.iter().any(|other| polys_intersect(&self.polygon, &other.polygon))
    }

    fn create_polygon(&self) -> Vec<Point> {
        let rad = self.width.hypot(self.height) / 2.;
        let alpha = self.width.atan2(self.height);
        [
            self.angle - alpha,
            self.angle + alpha,
            PI + self.angle - alpha,
            PI + self.angle + alpha,
        ]
        .iter()
        .map(|a| Point::new(self.x - a.sin() * rad, self.y - a.cos() * rad))
        .collect()
    }

    fn step(&mut self) {
        if self.controls.forward {
            self.speed += ACCELERATION;
        }
        if self.controls.reverse {
            self.speed -= ACCELERATION;
        }

        self.speed = self.speed.clamp(-self.max_speed / 2., self.max_speed);

        if self.speed > 0. {
            self.speed -= FRICTION;
        }
        if self.speed < 0. {
            self.speed += FRICTION;
        }
        if self.speed.abs() < FRICTION {
            self.speed = 0.;
        }

        if self.speed != 0. {
            let flip = if self.speed > 0. { 1. } else { -1. };
            if self.controls.left {
                self.angle += STEERING * flip;
            }
            if self.controls.right {
                self.angle -= STEERING * flip;
            }
        }

        self.x -= self.angle.sin() * self.speed;
        self.y -= self.angle.cos() * self.speed;
    }
}
