use glam::DVec3;

use crate::constants::JUNCTION_BCP_RATIO;

const ARC_LENGTH_DIVISIONS: usize = 100;

/// Cubic bezier with arc-length reparameterized sampling.
#[derive(Debug, Clone)]
pub struct CubicBezier3 {
    pub p0: DVec3,
    pub p1: DVec3,
    pub p2: DVec3,
    pub p3: DVec3,
    lengths: Vec<f64>,
}

impl CubicBezier3 {
    pub fn new(p0: DVec3, p1: DVec3, p2: DVec3, p3: DVec3) -> Self {
        let mut curve = Self {
            p0,
            p1,
            p2,
            p3,
            lengths: Vec::new(),
        };
        curve.update_arc_lengths();
        curve
    }

    pub fn get_point(&self, t: f64) -> DVec3 {
        let t = t.clamp(0.0, 1.0);
        let s = 1.0 - t;
        self.p0 * (s * s * s)
            + self.p1 * (3.0 * s * s * t)
            + self.p2 * (3.0 * s * t * t)
            + self.p3 * (t * t * t)
    }

    pub fn length(&self) -> f64 {
        *self.lengths.last().unwrap_or(&0.0)
    }

    /// Evaluate at the arc-length fraction `u` in [0, 1].
    pub fn point_at(&self, u: f64) -> DVec3 {
        self.get_point(self.u_to_t(u))
    }

    /// `divisions + 1` points equally spaced by arc length.
    pub fn spaced_points(&self, divisions: usize) -> Vec<DVec3> {
        let divisions = divisions.max(1);
        (0..=divisions)
            .map(|i| self.point_at(i as f64 / divisions as f64))
            .collect()
    }

    fn update_arc_lengths(&mut self) {
        let mut lengths = Vec::with_capacity(ARC_LENGTH_DIVISIONS + 1);
        let mut last = self.get_point(0.0);
        let mut sum = 0.0;
        lengths.push(0.0);
        for i in 1..=ARC_LENGTH_DIVISIONS {
            let current = self.get_point(i as f64 / ARC_LENGTH_DIVISIONS as f64);
            sum += current.distance(last);
            lengths.push(sum);
            last = current;
        }
        self.lengths = lengths;
    }

    fn u_to_t(&self, u: f64) -> f64 {
        let total = self.length();
        if total <= 0.0 {
            return u.clamp(0.0, 1.0);
        }
        let target = u.clamp(0.0, 1.0) * total;

        let mut low = 0;
        let mut high = self.lengths.len() - 1;
        while low < high {
            let mid = (low + high) / 2;
            if self.lengths[mid] < target {
                low = mid + 1;
            } else {
                high = mid;
            }
        }

        if low == 0 {
            return 0.0;
        }
        let before = self.lengths[low - 1];
        let after = self.lengths[low];
        let span = after - before;
        let frac = if span > 0.0 {
            (target - before) / span
        } else {
            0.0
        };
        ((low - 1) as f64 + frac) / (self.lengths.len() - 1) as f64
    }
}

/// A bezier built from two endpoints and their exit directions, with the
/// control points returned alongside the curve.
#[derive(Debug, Clone)]
pub struct BezierWithDirection {
    pub curve: CubicBezier3,
    pub cp1: DVec3,
    pub cp2: DVec3,
}

/// Build a cubic bezier whose control points sit along the endpoint
/// directions at `ratio × endpoint distance`. `ratio` of `None` uses the
/// junction default.
pub fn bezier_with_directions(
    point1: DVec3,
    direction1: DVec3,
    direction2: DVec3,
    point2: DVec3,
    ratio: Option<f64>,
) -> BezierWithDirection {
    let ratio = ratio.unwrap_or(JUNCTION_BCP_RATIO);
    let dist = point1.distance(point2);
    let cp1 = point1 + direction1.normalize_or_zero() * (dist * ratio);
    let cp2 = point2 + direction2.normalize_or_zero() * (dist * ratio);
    BezierWithDirection {
        curve: CubicBezier3::new(point1, cp1, cp2, point2),
        cp1,
        cp2,
    }
}
