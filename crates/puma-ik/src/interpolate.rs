//! Interpolation between poses and between configurations.

use nalgebra::{Point3, UnitQuaternion};

use crate::frame::Frame;
use crate::solver::DEGENERACY_EPSILON;
use crate::types::{shortest_angle, ConfigurationSpace};

/// Pose at parameter `t` between two frames.
///
/// The origin moves linearly and the orientation follows the shortest-arc
/// slerp. `t = 0` and `t = 1` return the endpoints exactly.
#[must_use]
pub fn interpolate_frames(start: &Frame, end: &Frame, t: f32) -> Frame {
    if t <= 0.0 {
        return *start;
    }
    if t >= 1.0 {
        return *end;
    }
    let origin = Point3::from(start.origin().coords.lerp(&end.origin().coords, t));
    let rotation = slerp(&start.rotation(), &end.rotation(), t);
    Frame::from_parts(&origin.coords, &rotation)
}

/// Slerp that degrades to normalised lerp when the endpoints are too close
/// for the arc to be defined.
fn slerp(from: &UnitQuaternion<f32>, to: &UnitQuaternion<f32>, t: f32) -> UnitQuaternion<f32> {
    // nalgebra's slerp already takes the short arc; flip here only so the
    // nlerp fallback agrees with it.
    let to = if from.coords.dot(&to.coords) < 0.0 {
        UnitQuaternion::new_unchecked(-to.into_inner())
    } else {
        *to
    };
    from.try_slerp(&to, t, DEGENERACY_EPSILON)
        .unwrap_or_else(|| from.nlerp(&to, t))
}

/// Per-component difference `end - start`, taking the shortest way round for
/// every angle. `q2` is a plain difference.
#[must_use]
pub fn configuration_space_delta(
    start: &ConfigurationSpace,
    end: &ConfigurationSpace,
) -> ConfigurationSpace {
    ConfigurationSpace {
        alpha1: shortest_angle(start.alpha1, end.alpha1),
        alpha2: shortest_angle(start.alpha2, end.alpha2),
        alpha3: shortest_angle(start.alpha3, end.alpha3),
        alpha4: shortest_angle(start.alpha4, end.alpha4),
        alpha5: shortest_angle(start.alpha5, end.alpha5),
        q2: end.q2 - start.q2,
    }
}

/// Configuration at parameter `t` along `start + delta * t`.
///
/// `t <= 0` returns `start` exactly. The far endpoint is only known to the
/// caller, which should substitute it for `t >= 1`.
#[must_use]
pub fn interpolate_configuration(
    start: &ConfigurationSpace,
    delta: &ConfigurationSpace,
    t: f32,
) -> ConfigurationSpace {
    if t <= 0.0 {
        return *start;
    }
    *start + *delta * t
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
