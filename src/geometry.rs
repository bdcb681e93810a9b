//! Small planar helpers shared by the simulation, the mutation operator and the diagram.

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Point {
        Point { x, y }
    }
}

pub type Segment = (Point, Point);

/// Exact at both ends: `t = 0` gives `a`, `t = 1` gives `b`.
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a * (1.0 - t) + b * t
}

/// Where segment `ab` crosses segment `cd`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Touch {
    pub point: Point,
    /// Fraction along `ab`, in `[0, 1]`.
    pub offset: f64,
}

pub fn segment_intersection(a: Point, b: Point, c: Point, d: Point) -> Option<Touch> {
    let t_top = (d.x - c.x) * (a.y - c.y) - (d.y - c.y) * (a.x - c.x);
    let u_top = (c.y - a.y) * (a.x - b.x) - (c.x - a.x) * (a.y - b.y);
    let bottom = (d.y - c.y) * (b.x - a.x) - (d.x - c.x) * (b.y - a.y);

    if bottom == 0.0 {
        return None;
    }

    let t = t_top / bottom;
    let u = u_top / bottom;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some(Touch {
            point: Point::new(lerp(a.x, b.x, t), lerp(a.y, b.y, t)),
            offset: t,
        })
    } else {
        None
    }
}

/// Closed polygon edges, last vertex joined back to the first.
pub fn edges(poly: &[Point]) -> impl Iterator<Item = Segment> + '_ {
    (0..poly.len()).map(move |i| (poly[i], poly[(i + 1) % poly.len()]))
}

pub fn polys_intersect(poly1: &[Point], poly2: &[Point]) -> bool {
    edges(poly1).any(|(a, b)| edges(poly2).any(|(c, d)| segment_intersection(a, b, c, d).is_some()))
}
