//! Forward kinematics of the 5-DOF PUMA chain.
//!
//! The chain is fixed; only the link lengths vary:
//!
//! ```text
//! F0 (base) ─rotZ(a1)─► F1 ─l1 along Z, rotY(a2)─► F2 ─q2 along X, rotY(a3)─► F3
//!    ─l3 along -Z, rotZ(a4)─► F4 ─l4 along X, rotX(a5)─► F5 (effector)
//! ```
//!
//! Each step takes the previous frame by value and returns a new one, so the
//! solver can rebuild the chain joint by joint with the same code.

use crate::frame::{Axis, Frame};
use crate::types::{ConfigurationSpace, Joints, Lengths, JOINT_COUNT};

/// Waist: F1 from the base frame.
#[must_use]
pub(crate) fn waist(base: Frame, alpha1: f32) -> Frame {
    base.rotated_about(Axis::Z, alpha1)
}

/// Shoulder: F2 sits `l1` up the waist axis.
#[must_use]
pub(crate) fn shoulder(f1: Frame, l1: f32, alpha2: f32) -> Frame {
    f1.translated_along(Axis::Z, l1).rotated_about(Axis::Y, alpha2)
}

/// Elbow: F3 sits `q2` along the extensible link.
#[must_use]
pub(crate) fn elbow(f2: Frame, q2: f32, alpha3: f32) -> Frame {
    f2.translated_along(Axis::X, q2).rotated_about(Axis::Y, alpha3)
}

/// Wrist: F4 hangs `l3` down from the elbow and rolls about that link.
#[must_use]
pub(crate) fn wrist(f3: Frame, l3: f32, alpha4: f32) -> Frame {
    f3.translated_along(Axis::Z, -l3).rotated_about(Axis::Z, alpha4)
}

/// Effector: F5 sits `l4` along the wrist X axis and turns about it.
#[must_use]
pub(crate) fn effector(f4: Frame, l4: f32, alpha5: f32) -> Frame {
    f4.translated_along(Axis::X, l4).rotated_about(Axis::X, alpha5)
}

/// PUMA arm geometry: base frame plus link lengths.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PumaChain {
    base: Frame,
    lengths: Lengths,
}

impl PumaChain {
    /// Chain rooted at the world origin.
    #[must_use]
    pub fn new(lengths: Lengths) -> Self {
        Self::with_base(Frame::identity(), lengths)
    }

    /// Chain rooted at an arbitrary base frame.
    #[must_use]
    pub const fn with_base(base: Frame, lengths: Lengths) -> Self {
        Self { base, lengths }
    }

    /// Base frame (F0).
    #[must_use]
    pub const fn base(&self) -> &Frame {
        &self.base
    }

    /// Link lengths.
    #[must_use]
    pub const fn lengths(&self) -> &Lengths {
        &self.lengths
    }

    /// Build the joint frames F1..F5 for a configuration.
    #[must_use]
    pub fn forward_kinematics(&self, config: &ConfigurationSpace) -> [Frame; JOINT_COUNT] {
        let f1 = waist(self.base, config.alpha1);
        let f2 = shoulder(f1, self.lengths.x, config.alpha2);
        let f3 = elbow(f2, config.q2, config.alpha3);
        let f4 = wrist(f3, self.lengths.y, config.alpha4);
        let f5 = effector(f4, self.lengths.z, config.alpha5);
        [f1, f2, f3, f4, f5]
    }

    /// End-effector frame (F5) for a configuration.
    #[must_use]
    pub fn end_effector(&self, config: &ConfigurationSpace) -> Frame {
        self.forward_kinematics(config)[JOINT_COUNT - 1]
    }

    /// Joint positions for a configuration (the frame origins).
    #[must_use]
    pub fn joint_positions(&self, config: &ConfigurationSpace) -> Joints {
        let [p1, p2, p3, p4, p5] = self.forward_kinematics(config).map(|f| f.origin());
        Joints { p1, p2, p3, p4, p5 }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Point3, Vector3};
    use std::f32::consts::FRAC_PI_2;

    fn reference_chain() -> PumaChain {
        PumaChain::new(Vector3::new(3.0, 2.0, 1.0))
    }

    #[test]
    fn zero_configuration_layout() {
        // q2 = 4 with all angles zero: up 3, out 4 along X, down 2, out 1.
        let chain = reference_chain();
        let config = ConfigurationSpace::new([0.0; 5], 4.0);
        let joints = chain.joint_positions(&config);
        assert_relative_eq!(joints.p1, Point3::new(0.0, 0.0, 0.0), epsilon = 1e-6);
        assert_relative_eq!(joints.p2, Point3::new(0.0, 0.0, 3.0), epsilon = 1e-6);
        assert_relative_eq!(joints.p3, Point3::new(4.0, 0.0, 3.0), epsilon = 1e-6);
        assert_relative_eq!(joints.p4, Point3::new(4.0, 0.0, 1.0), epsilon = 1e-6);
        assert_relative_eq!(joints.p5, Point3::new(5.0, 0.0, 1.0), epsilon = 1e-6);

        let f5 = chain.end_effector(&config);
        assert_relative_eq!(f5.x_axis(), Vector3::x(), epsilon = 1e-6);
        assert_relative_eq!(f5.z_axis(), Vector3::z(), epsilon = 1e-6);
    }

    #[test]
    fn waist_turns_whole_arm() {
        let chain = reference_chain();
        let config = ConfigurationSpace::new([FRAC_PI_2, 0.0, 0.0, 0.0, 0.0], 4.0);
        let joints = chain.joint_positions(&config);
        assert_relative_eq!(joints.p3, Point3::new(0.0, 4.0, 3.0), epsilon = 1e-5);
        assert_relative_eq!(joints.p5, Point3::new(0.0, 5.0, 1.0), epsilon = 1e-5);
    }

    #[test]
    fn shoulder_positive_angle_tilts_link_down() {
        let chain = reference_chain();
        let config = ConfigurationSpace::new([0.0, FRAC_PI_2, 0.0, 0.0, 0.0], 4.0);
        let joints = chain.joint_positions(&config);
        // X2 points along world -Z after a quarter turn about Y.
        assert_relative_eq!(joints.p3, Point3::new(0.0, 0.0, -1.0), epsilon = 1e-5);
    }

    #[test]
    fn effector_roll_keeps_position() {
        let chain = reference_chain();
        let a = ConfigurationSpace::new([0.3, 0.2, 0.1, -0.2, 0.0], 4.0);
        let b = ConfigurationSpace { alpha5: 1.2, ..a };
        let fa = chain.end_effector(&a);
        let fb = chain.end_effector(&b);
        assert_relative_eq!(fa.origin(), fb.origin(), epsilon = 1e-6);
        assert_relative_eq!(fa.x_axis(), fb.x_axis(), epsilon = 1e-6);
        assert!((fa.z_axis() - fb.z_axis()).norm() > 0.5);
    }

    #[test]
    fn link_lengths_are_respected() {
        let chain = reference_chain();
        let config = ConfigurationSpace::new([0.3, 0.2, 0.1, -0.2, 0.4], 4.0);
        let j = chain.joint_positions(&config);
        assert_relative_eq!((j.p2 - j.p1).norm(), 3.0, epsilon = 1e-5);
        assert_relative_eq!((j.p3 - j.p2).norm(), 4.0, epsilon = 1e-5);
        assert_relative_eq!((j.p4 - j.p3).norm(), 2.0, epsilon = 1e-5);
        assert_relative_eq!((j.p5 - j.p4).norm(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn offset_base_shifts_chain() {
        let mut base = Frame::identity();
        base.translate(&Vector3::new(1.0, 1.0, 0.0));
        let chain = PumaChain::with_base(base, Vector3::new(3.0, 2.0, 1.0));
        let config = ConfigurationSpace::new([0.0; 5], 4.0);
        let joints = chain.joint_positions(&config);
        assert_relative_eq!(joints.p5, Point3::new(6.0, 1.0, 1.0), epsilon = 1e-6);
    }
}
