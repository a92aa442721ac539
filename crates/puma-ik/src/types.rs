//! Configuration-space and solver output types.

use std::f32::consts::{PI, TAU};
use std::ops::{Add, Mul};

use nalgebra::{Point3, Vector3};

use crate::frame::Frame;

/// Number of joint frames in the chain (F1..F5).
pub const JOINT_COUNT: usize = 5;

/// Link lengths: `x` = base to shoulder (l1), `y` = elbow link (l3),
/// `z` = wrist to effector (l4).
pub type Lengths = Vector3<f32>;

/// Wrap an angle into `(-pi, pi]`.
///
/// Angles already in range are returned unchanged (bit for bit).
#[must_use]
pub fn normalize_angle(angle: f32) -> f32 {
    if angle > -PI && angle <= PI {
        return angle;
    }
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI { wrapped + TAU } else { wrapped }
}

/// Signed shortest rotation taking `from` to `to`, in `(-pi, pi]`.
#[must_use]
pub fn shortest_angle(from: f32, to: f32) -> f32 {
    normalize_angle(to - from)
}

// ---------------------------------------------------------------------------
// ConfigurationSpace
// ---------------------------------------------------------------------------

/// Joint-level description of the arm: five revolute angles plus the
/// prismatic extension `q2` between shoulder and elbow.
///
/// Angles are kept in `(-pi, pi]`; every constructor and operator wraps them.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ConfigurationSpace {
    pub alpha1: f32,
    pub alpha2: f32,
    pub alpha3: f32,
    pub alpha4: f32,
    pub alpha5: f32,
    pub q2: f32,
}

impl ConfigurationSpace {
    /// Build from the five angles and the extension, wrapping the angles.
    #[must_use]
    pub fn new(angles: [f32; JOINT_COUNT], q2: f32) -> Self {
        let [alpha1, alpha2, alpha3, alpha4, alpha5] = angles.map(normalize_angle);
        Self {
            alpha1,
            alpha2,
            alpha3,
            alpha4,
            alpha5,
            q2,
        }
    }

    /// The five joint angles in chain order.
    #[must_use]
    pub const fn angles(&self) -> [f32; JOINT_COUNT] {
        [self.alpha1, self.alpha2, self.alpha3, self.alpha4, self.alpha5]
    }

    /// `true` if every component is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.q2.is_finite() && self.angles().iter().all(|a| a.is_finite())
    }
}

impl Add for ConfigurationSpace {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        let (a, b) = (self.angles(), rhs.angles());
        Self::new(std::array::from_fn(|i| a[i] + b[i]), self.q2 + rhs.q2)
    }
}

impl Mul<f32> for ConfigurationSpace {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.angles().map(|a| a * rhs), self.q2 * rhs)
    }
}

// ---------------------------------------------------------------------------
// Joints / IkSet
// ---------------------------------------------------------------------------

/// Joint positions in world coordinates: base, shoulder, elbow, wrist and
/// effector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Joints {
    pub p1: Point3<f32>,
    pub p2: Point3<f32>,
    pub p3: Point3<f32>,
    pub p4: Point3<f32>,
    pub p5: Point3<f32>,
}

impl Joints {
    /// Joint positions in chain order.
    #[must_use]
    pub const fn as_array(&self) -> [Point3<f32>; JOINT_COUNT] {
        [self.p1, self.p2, self.p3, self.p4, self.p5]
    }
}

/// Result of one inverse-kinematics solve.
///
/// Handed back to the solver on the next tick as the continuity hint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IkSet {
    pub joints: Joints,
    pub config: ConfigurationSpace,
    /// Joint frames F1..F5; F5 is the end effector.
    pub frames: [Frame; JOINT_COUNT],
}

impl IkSet {
    /// End-effector frame (F5).
    #[must_use]
    pub const fn effector(&self) -> &Frame {
        &self.frames[JOINT_COUNT - 1]
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn normalize_angle_in_range_is_identity() {
        for a in [0.0, 0.3, -3.0, PI, -PI + 1e-3] {
            assert_eq!(normalize_angle(a).to_bits(), a.to_bits());
        }
    }

    #[test]
    fn normalize_angle_wraps_into_half_open_interval() {
        assert_relative_eq!(normalize_angle(-PI), PI);
        assert_relative_eq!(normalize_angle(3.0 * PI - 0.25), PI - 0.25, epsilon = 1e-5);
        assert_relative_eq!(normalize_angle(TAU + 0.5), 0.5, epsilon = 1e-5);
        assert_relative_eq!(normalize_angle(-TAU - 0.5), -0.5, epsilon = 1e-5);
        assert_relative_eq!(normalize_angle(1.5 * PI), -0.5 * PI, epsilon = 1e-5);
    }

    #[test]
    fn shortest_angle_goes_the_short_way() {
        // 170 deg to -170 deg is +20 deg, not -340.
        let from = 170_f32.to_radians();
        let to = (-170_f32).to_radians();
        assert_relative_eq!(shortest_angle(from, to), 20_f32.to_radians(), epsilon = 1e-5);
        assert_relative_eq!(shortest_angle(to, from), (-20_f32).to_radians(), epsilon = 1e-5);
        assert_relative_eq!(shortest_angle(0.2, 0.5), 0.3, epsilon = 1e-6);
    }

    #[test]
    fn configuration_space_new_wraps_angles() {
        let cs = ConfigurationSpace::new([TAU + 0.1, -0.2, 0.0, 4.0, -4.0], 7.0);
        assert_relative_eq!(cs.alpha1, 0.1, epsilon = 1e-5);
        assert_relative_eq!(cs.alpha4, 4.0 - TAU, epsilon = 1e-5);
        assert_relative_eq!(cs.alpha5, TAU - 4.0, epsilon = 1e-5);
        assert_relative_eq!(cs.q2, 7.0);
    }

    #[test]
    fn configuration_space_add_and_scale() {
        let a = ConfigurationSpace::new([3.0, 0.1, 0.2, 0.3, 0.4], 2.0);
        let b = ConfigurationSpace::new([0.5, 0.1, 0.1, 0.1, 0.1], 1.0);
        let sum = a + b;
        // 3.5 rad wraps.
        assert_relative_eq!(sum.alpha1, 3.5 - TAU, epsilon = 1e-5);
        assert_relative_eq!(sum.alpha2, 0.2, epsilon = 1e-6);
        assert_relative_eq!(sum.q2, 3.0);

        let half = b * 0.5;
        assert_relative_eq!(half.alpha1, 0.25);
        assert_relative_eq!(half.q2, 0.5);
    }

    #[test]
    fn configuration_space_finite_check() {
        assert!(ConfigurationSpace::default().is_finite());
        let bad = ConfigurationSpace {
            q2: f32::NAN,
            ..ConfigurationSpace::default()
        };
        assert!(!bad.is_finite());
    }
}
