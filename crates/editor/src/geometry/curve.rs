use glam::DVec3;

use crate::constants::CURVE_TENSION;

/// Divisions of the cached arc-length table.
const ARC_LENGTH_DIVISIONS: usize = 200;

/// Parameterization of a Catmull-Rom spline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CurveKind {
    /// Uniform cardinal spline with the given tension.
    Cardinal { tension: f64 },
    /// Nonuniform, knot spacing proportional to chord length.
    Chordal,
    /// Nonuniform, knot spacing proportional to sqrt of chord length.
    Centripetal,
}

/// Catmull-Rom spline over ordered 3D control points with arc-length
/// reparameterized evaluation.
///
/// The end segments use reflected virtual control points (`2*p0 - p1`),
/// which is the equidistant head/tail extension, so the spline covers the
/// full authored polyline. Fewer than two control points degrade to a
/// constant curve rather than panicking.
#[derive(Debug, Clone)]
pub struct CatmullRom3 {
    points: Vec<DVec3>,
    kind: CurveKind,
    lengths: Vec<f64>,
}

impl CatmullRom3 {
    pub fn new(points: Vec<DVec3>, kind: CurveKind) -> Self {
        let mut curve = Self {
            points,
            kind,
            lengths: Vec::new(),
        };
        curve.update_arc_lengths();
        curve
    }

    /// Road reference curve: cardinal spline with the project tension.
    pub fn road_curve(points: Vec<DVec3>) -> Self {
        Self::new(
            points,
            CurveKind::Cardinal {
                tension: CURVE_TENSION,
            },
        )
    }

    /// Chordal spline, used for transition tween control polylines.
    pub fn chordal(points: Vec<DVec3>) -> Self {
        Self::new(points, CurveKind::Chordal)
    }

    pub fn points(&self) -> &[DVec3] {
        &self.points
    }

    /// Total arc length.
    pub fn length(&self) -> f64 {
        *self.lengths.last().unwrap_or(&0.0)
    }

    /// Evaluate at the raw spline parameter `t` in [0, 1].
    pub fn get_point(&self, t: f64) -> DVec3 {
        let n = self.points.len();
        if n == 0 {
            return DVec3::ZERO;
        }
        if n == 1 {
            return self.points[0];
        }

        let t = t.clamp(0.0, 1.0);
        let p = (n - 1) as f64 * t;
        let mut seg = p.floor() as usize;
        let mut w = p - seg as f64;
        if seg >= n - 1 {
            seg = n - 2;
            w = 1.0;
        }

        let p1 = self.points[seg];
        let p2 = self.points[seg + 1];
        let p0 = if seg > 0 {
            self.points[seg - 1]
        } else {
            p1 * 2.0 - p2
        };
        let p3 = if seg + 2 < n {
            self.points[seg + 2]
        } else {
            p2 * 2.0 - p1
        };

        match self.kind {
            CurveKind::Cardinal { tension } => {
                let m1 = (p2 - p0) * tension;
                let m2 = (p3 - p1) * tension;
                hermite(p1, p2, m1, m2, w)
            }
            CurveKind::Chordal | CurveKind::Centripetal => {
                let alpha = if self.kind == CurveKind::Chordal {
                    1.0
                } else {
                    0.5
                };
                let mut dt0 = p0.distance(p1).powf(alpha);
                let mut dt1 = p1.distance(p2).powf(alpha);
                let mut dt2 = p2.distance(p3).powf(alpha);

                // Guard against repeated points.
                if dt1 < 1e-4 {
                    dt1 = 1.0;
                }
                if dt0 < 1e-4 {
                    dt0 = dt1;
                }
                if dt2 < 1e-4 {
                    dt2 = dt1;
                }

                let m1 = ((p1 - p0) / dt0 - (p2 - p0) / (dt0 + dt1) + (p2 - p1) / dt1) * dt1;
                let m2 = ((p2 - p1) / dt1 - (p3 - p1) / (dt1 + dt2) + (p3 - p2) / dt2) * dt1;
                hermite(p1, p2, m1, m2, w)
            }
        }
    }

    /// Evaluate at the arc-length fraction `u` in [0, 1].
    pub fn point_at(&self, u: f64) -> DVec3 {
        self.get_point(self.u_to_t(u))
    }

    /// Unit tangent at the arc-length fraction `u`, by finite difference.
    pub fn tangent_at(&self, u: f64) -> DVec3 {
        let delta = 1e-4;
        let t1 = (u - delta).max(0.0);
        let t2 = (u + delta).min(1.0);
        (self.point_at(t2) - self.point_at(t1)).normalize_or_zero()
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

    /// Map an arc-length fraction to the raw spline parameter.
    fn u_to_t(&self, u: f64) -> f64 {
        let total = self.length();
        if total <= 0.0 {
            return u.clamp(0.0, 1.0);
        }
        let target = u.clamp(0.0, 1.0) * total;

        // Binary search the cumulative length table.
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

fn hermite(p1: DVec3, p2: DVec3, m1: DVec3, m2: DVec3, w: f64) -> DVec3 {
    let w2 = w * w;
    let w3 = w2 * w;
    let c0 = p1;
    let c1 = m1;
    let c2 = p1 * -3.0 + p2 * 3.0 - m1 * 2.0 - m2;
    let c3 = p1 * 2.0 - p2 * 2.0 + m1 + m2;
    c0 + c1 * w + c2 * w2 + c3 * w3
}
