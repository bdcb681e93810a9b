use crate::geometry::{edges, lerp, segment_intersection, Point, Segment, Touch};

use super::car::Car;

/// A fan of rays cast forward from a car.
#[derive(Clone, Debug)]
pub struct Sensor {
    pub ray_count: usize,
    pub ray_length: f64,
    pub ray_spread: f64,
    pub rays: Vec<Segment>,
    pub readings: Vec<Option<Touch>>,
}

impl Sensor {
    pub fn new(ray_count: usize, ray_length: f64, ray_spread: f64) -> Sensor {
        Sensor {
            ray_count,
            ray_length,
            ray_spread,
            rays: Vec::with_capacity(ray_count),
            readings: vec![None; ray_count],
        }
    }

    pub fn update(&mut self, origin: Point, angle: f64, borders: &[Segment], traffic: &[Car]) {
        self.cast_rays(origin, angle);
        self.readings = self
            .rays
            .iter()
            .map(|&ray| nearest_touch(ray, borders, traffic))
            .collect();
    }

    /// `1 - offset` of each ray's nearest hit, 0 when the ray is clear.
    ///
    /// Closer obstacles give larger values.
    pub fn offsets(&self) -> Vec<f64> {
        self.readings
            .iter()
            .map(|r| r.map_or(0., |touch| 1. - touch.offset))
            .collect()
    }

    fn cast_rays(&mut self, origin: Point, angle: f64) {
        self.rays.clear();
        for i in 0..self.ray_count {
            let t = if self.ray_count == 1 {
                0.5
            } else {
                i as f64 / (self.ray_count - 1) as f64
            };
            let ray_angle = lerp(self.ray_spread / 2., -self.ray_spread / 2., t) + angle;
            let end = Point::new(
                origin.x - ray_angle.sin() * self.ray_length,
                origin.y - ray_angle.cos() * self.ray_length,
            );
            self.rays.push((origin, end));
        }
    }
}

fn nearest_touch((start, end): Segment, borders: &[Segment], traffic: &[Car]) -> Option<Touch> {
    let border_touches = borders
        .iter()
        .filter_map(|&(a, b)| segment_intersection(start, end, a, b));
    let traffic_touches = traffic
        .iter()
        .flat_map(|car| edges(&car.polygon))
        .filter_map(|(a, b)| segment_intersection(start, end, a, b));

    border_touches
        .chain(traffic_touches)
        .min_by(|a, b| a.offset.total_cmp(&b.offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn single_ray_points_straight_ahead() {
        let mut sensor = Sensor::new(1, 100., std::f64::consts::PI / 2.);
        sensor.update(Point::new(0., 0.), 0., &[], &[]);
        let (start, end) = sensor.rays[0];
        assert_eq!(start, Point::new(0., 0.));
        assert_approx_eq!(end.x, 0.);
        assert_approx_eq!(end.y, -100.);
        assert_eq!(sensor.offsets(), vec![0.]);
    }

    #[test]
    fn wall_ahead_is_sensed() {
        let mut sensor = Sensor::new(1, 100., std::f64::consts::PI / 2.);
        let wall = (Point::new(-50., -25.), Point::new(50., -25.));
        sensor.update(Point::new(0., 0.), 0., &[wall], &[]);
        assert_approx_eq!(sensor.offsets()[0], 0.75);
    }

    #[test]
    fn nearest_obstacle_wins() {
        let mut sensor = Sensor::new(1, 100., std::f64::consts::PI / 2.);
        let far = (Point::new(-50., -80.), Point::new(50., -80.));
        let near = (Point::new(-50., -40.), Point::new(50., -40.));
        sensor.update(Point::new(0., 0.), 0., &[far, near], &[]);
        assert_approx_eq!(sensor.offsets()[0], 0.6);
    }

    #[test]
    fn traffic_is_sensed() {
        let mut sensor = Sensor::new(5, 150., std::f64::consts::PI / 2.);
        let blocker = Car::traffic(0., -60., 30., 50., 2.);
        sensor.update(Point::new(0., 0.), 0., &[], &[blocker]);
        let offsets = sensor.offsets();
        assert_eq!(offsets.len(), 5);
        // middle ray hits the blocker's rear edge at y = -35
        assert_approx_eq!(offsets[2], 1. - 35. / 150.);
        assert_eq!(offsets[0], 0.);
        assert_eq!(offsets[4], 0.);
    }
}
