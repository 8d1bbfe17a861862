use std::f64::consts::{FRAC_PI_2, TAU};

pub const POINTS: usize = 5;

/// Order in which the outline visits the vertices to trace a pentagram
const STAR_ORDER: [usize; POINTS] = [0, 2, 4, 1, 3];

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Five points on a circle, vertex 0 at the top, going clockwise in
/// surface coordinates (y grows downward).
#[derive(Clone, Debug, PartialEq)]
pub struct StarGeometry {
    size: f64,
    points: [Point; POINTS],
}

impl StarGeometry {
    pub fn new(size: f64, radius: f64) -> Self {
        let center = size / 2.0;
        let points = std::array::from_fn(|i| {
            let angle = TAU * i as f64 / POINTS as f64 - FRAC_PI_2;
            Point {
                x: center + radius * angle.cos(),
                y: center + radius * angle.sin(),
            }
        });
        Self { size, points }
    }

    /// Edge length of the square surface the points live on
    pub fn size(&self) -> f64 {
        self.size
    }

    pub fn points(&self) -> &[Point; POINTS] {
        &self.points
    }

    pub fn vertex(&self, step: usize) -> Point {
        self.points[step % POINTS]
    }

    /// The five edges of the star outline
    pub fn outline(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        (0..POINTS).map(|i| {
            let from = STAR_ORDER[i];
            let to = STAR_ORDER[(i + 1) % POINTS];
            (self.points[from], self.points[to])
        })
    }
}
