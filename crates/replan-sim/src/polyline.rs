//! Constant-speed piecewise-linear curves.

use std::sync::Arc;

use replan_kernel::Curve;
use replan_types::Vec3;

/// Vertices traversed in order at a constant speed.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    points: Vec<Vec3>,
    /// Arrival time at each vertex; `times[0] == 0`.
    times: Vec<f64>,
}

impl Polyline {
    /// `points` must not be empty; a single point gives a stationary curve.
    pub fn through(points: Vec<Vec3>, speed: f64) -> Self {
        let mut times = Vec::with_capacity(points.len());
        let mut t = 0.0;
        for (i, p) in points.iter().enumerate() {
            if i > 0 {
                t += (p - points[i - 1]).norm() / speed;
            }
            times.push(t);
        }
        Self { points, times }
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn duration(&self) -> f64 {
        self.times.last().copied().unwrap_or(0.0)
    }

    pub fn length(&self) -> f64 {
        self.points.windows(2).map(|w| (w[1] - w[0]).norm()).sum()
    }

    /// Segment index containing `t` (clamped to the curve).
    fn segment(&self, t: f64) -> Option<usize> {
        if self.points.len() < 2 {
            return None;
        }
        let t = t.clamp(0.0, self.duration());
        let idx = self.times.partition_point(|&ti| ti <= t);
        Some(idx.clamp(1, self.points.len() - 1) - 1)
    }

    pub fn position(&self, t: f64) -> Vec3 {
        let Some(i) = self.segment(t) else {
            return self.points.first().copied().unwrap_or_else(Vec3::zeros);
        };
        let (t0, t1) = (self.times[i], self.times[i + 1]);
        let span = t1 - t0;
        if span <= 0.0 {
            return self.points[i + 1];
        }
        let s = ((t.clamp(0.0, self.duration()) - t0) / span).clamp(0.0, 1.0);
        self.points[i] + (self.points[i + 1] - self.points[i]) * s
    }

    /// Velocity inside the segment containing `t`; zero past the end.
    pub fn velocity(&self, t: f64) -> Vec3 {
        if t >= self.duration() {
            return Vec3::zeros();
        }
        let Some(i) = self.segment(t) else {
            return Vec3::zeros();
        };
        let span = self.times[i + 1] - self.times[i];
        if span <= 0.0 {
            return Vec3::zeros();
        }
        (self.points[i + 1] - self.points[i]) / span
    }

    /// Clamped uniform knot vector for the vertices read as order-3 control
    /// points.
    pub fn knots(&self) -> Vec<f64> {
        let n = self.points.len();
        let order = replan_types::BSPLINE_ORDER as usize;
        let inner = n.saturating_sub(order);
        let mut knots = vec![0.0; order + 1];
        knots.extend((1..inner).map(|k| self.duration() * k as f64 / inner as f64));
        knots.extend(std::iter::repeat_n(self.duration(), n + order + 1 - knots.len()));
        knots
    }
}

#[derive(Debug)]
pub struct PositionCurve(pub Arc<Polyline>);

impl Curve for PositionCurve {
    fn evaluate(&self, t: f64) -> Vec3 {
        self.0.position(t)
    }
}

#[derive(Debug)]
pub struct VelocityCurve(pub Arc<Polyline>);

impl Curve for VelocityCurve {
    fn evaluate(&self, t: f64) -> Vec3 {
        self.0.velocity(t)
    }
}

#[derive(Debug)]
pub struct ConstantCurve(pub Vec3);

impl Curve for ConstantCurve {
    fn evaluate(&self, _t: f64) -> Vec3 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn l_shape() -> Polyline {
        Polyline::through(
            vec![Vec3::zeros(), Vec3::new(2.0, 0.0, 0.0), Vec3::new(2.0, 2.0, 0.0)],
            1.0,
        )
    }

    #[test]
    fn duration_follows_length_and_speed() {
        let line = l_shape();
        assert_eq!(line.length(), 4.0);
        assert_eq!(line.duration(), 4.0);
        assert_eq!(Polyline::through(line.points().to_vec(), 2.0).duration(), 2.0);
    }

    #[test]
    fn position_interpolates_each_segment() {
        let line = l_shape();
        assert_eq!(line.position(1.0), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(line.position(2.0), Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(line.position(3.0), Vec3::new(2.0, 1.0, 0.0));
        assert_eq!(line.position(10.0), Vec3::new(2.0, 2.0, 0.0));
        assert_eq!(line.position(-1.0), Vec3::zeros());
    }

    #[test]
    fn velocity_is_piecewise_constant() {
        let line = l_shape();
        assert_eq!(line.velocity(0.5), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(line.velocity(2.5), Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(line.velocity(4.0), Vec3::zeros());
    }

    #[test]
    fn single_point_is_stationary() {
        let line = Polyline::through(vec![Vec3::new(1.0, 1.0, 1.0)], 1.0);
        assert_eq!(line.duration(), 0.0);
        assert_eq!(line.position(3.0), Vec3::new(1.0, 1.0, 1.0));
        assert_eq!(line.velocity(0.0), Vec3::zeros());
    }

    #[test]
    fn knot_vector_is_clamped() {
        let line = Polyline::through(
            (0..6).map(|i| Vec3::new(i as f64, 0.0, 0.0)).collect(),
            1.0,
        );
        let knots = line.knots();
        assert_eq!(knots.len(), 6 + 4);
        assert_eq!(&knots[..4], &[0.0; 4]);
        assert_eq!(&knots[6..], &[5.0; 4]);
        assert!(knots.windows(2).all(|w| w[0] <= w[1]));
    }
}
