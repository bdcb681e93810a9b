use crate::geometry::{lerp, Point, Segment};

const INFINITY: f64 = 1_000_000.;

/// A straight vertical road; cars drive towards decreasing `y`.
#[derive(Clone, Debug)]
pub struct Road {
    pub x: f64,
    pub width: f64,
    pub lane_count: usize,
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Road {
    pub fn new(x: f64, width: f64, lane_count: usize) -> Road {
        Road {
            x,
            width,
            lane_count: lane_count.max(1),
            left: x - width / 2.,
            right: x + width / 2.,
            top: -INFINITY,
            bottom: INFINITY,
        }
    }

    /// Centre of lane `index`; indices past the last lane land on the last lane.
    pub fn lane_center(&self, index: usize) -> f64 {
        let lane_width = self.width / self.lane_count as f64;
        self.left + lane_width / 2. + index.min(self.lane_count - 1) as f64 * lane_width
    }

    pub fn borders(&self) -> [Segment; 2] {
        let top_left = Point::new(self.left, self.top);
        let top_right = Point::new(self.right, self.top);
        let bottom_left = Point::new(self.left, self.bottom);
        let bottom_right = Point::new(self.right, self.bottom);
        [(top_left, bottom_left), (top_right, bottom_right)]
    }

    /// x positions of the dashed lane dividers.
    pub fn dividers(&self) -> Vec<f64> {
        (1..self.lane_count)
            .map(|i| lerp(self.left, self.right, i as f64 / self.lane_count as f64))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn lane_centers() {
        let road = Road::new(100., 180., 3);
        assert_approx_eq!(road.lane_center(0), 40.);
        assert_approx_eq!(road.lane_center(1), 100.);
        assert_approx_eq!(road.lane_center(2), 160.);
        assert_approx_eq!(road.lane_center(7), 160.);
    }

    #[test]
    fn borders_are_the_road_edges() {
        let road = Road::new(100., 180., 3);
        let [left, right] = road.borders();
        assert_eq!(left.0.x, 10.);
        assert_eq!(left.1.x, 10.);
        assert_eq!(right.0.x, 190.);
        assert!(left.0.y < -1e5 && left.1.y > 1e5);
        assert_eq!(road.dividers().len(), 2);
    }
}
