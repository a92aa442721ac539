//! Closed-form inverse kinematics for the PUMA chain.
//!
//! The solve is geometric rather than iterative. The wrist point follows
//! from the target frame, the elbow is placed in the plane spanned by the
//! base axis and the wrist, and the five angles are then read off joint by
//! joint while the chain is rebuilt with the forward-kinematics steps.
//!
//! The solver never fails. Singular targets (wrist on the base axis, wrist
//! X axis normal to the arm plane) are resolved by fixed fallback rules,
//! which are approximate close to the singularity.

use std::f32::consts::FRAC_PI_2;

use nalgebra::{Point3, Vector3};
use tracing::trace;

use crate::chain::{self, PumaChain};
use crate::frame::Frame;
use crate::types::{normalize_angle, ConfigurationSpace, IkSet, Joints};

/// Vectors shorter than this are treated as zero when normalising.
pub const DEGENERACY_EPSILON: f32 = 1e-6;

/// Configuration for the geometric solver.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Minimum length a vector must have to be normalised. Shorter vectors
    /// mark a singular configuration and trigger a fallback.
    pub degeneracy_epsilon: f32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            degeneracy_epsilon: DEGENERACY_EPSILON,
        }
    }
}

/// How the elbow point of a solve was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElbowCase {
    /// Regular solution, `p4 + v34n * l3`.
    Primary,
    /// Mirrored solution `p4 - v34n * l3`, chosen because it is closer to the
    /// previous elbow.
    Mirrored,
    /// Wrist X axis normal to the arm plane; previous elbow projected onto
    /// the arm plane.
    ProjectedHint,
    /// Elbow placed on the line from the wrist towards the shoulder, used
    /// when the arm plane is undefined or no previous elbow exists.
    TowardShoulder,
}

/// Elbow point plus the rule that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Elbow {
    pub position: Point3<f32>,
    pub case: ElbowCase,
}

/// Geometric IK solver for [`PumaChain`].
#[derive(Debug, Clone, Default)]
pub struct IkSolver {
    config: SolverConfig,
}

impl IkSolver {
    /// Create a new solver with the given configuration.
    #[must_use]
    pub const fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    /// Create a solver with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(SolverConfig::default())
    }

    /// Solve for the configuration that puts the effector frame at `target`.
    ///
    /// `previous` is the last solution along the same path, if any. It is
    /// used to keep the elbow on the same side between consecutive solves.
    #[must_use]
    pub fn solve(&self, chain: &PumaChain, target: &Frame, previous: Option<&IkSet>) -> IkSet {
        let lengths = chain.lengths();
        let base = *chain.base();
        let p1 = base.origin();
        let p2 = shoulder_point(chain);
        let p4 = wrist_point(chain, target);
        let p3 = self.locate_elbow(chain, target, previous).position;
        let p5 = target.origin();
        let q2 = nalgebra::distance(&p2, &p3);

        let to_wrist = p4 - p1;
        let alpha1 = planar_angle(to_wrist.dot(&base.y_axis()), to_wrist.dot(&base.x_axis()));
        let f1 = chain::waist(base, alpha1);

        let upper_arm = p3 - p2;
        let alpha2 = planar_angle(-upper_arm.dot(&f1.z_axis()), upper_arm.dot(&f1.x_axis()));
        let f2 = chain::shoulder(f1, lengths.x, alpha2);

        let forearm = p3 - p4;
        let alpha3 = planar_angle(forearm.dot(&f2.x_axis()), forearm.dot(&f2.z_axis()));
        let f3 = chain::elbow(f2, q2, alpha3);

        let tool_x = target.x_axis();
        let alpha4 = planar_angle(tool_x.dot(&f3.y_axis()), tool_x.dot(&f3.x_axis()));
        let f4 = chain::wrist(f3, lengths.y, alpha4);

        // Measured from the elbow-to-wrist direction, a quarter turn behind
        // the wrist bend itself.
        let elbow_to_wrist = -f4.z_axis();
        let tool_z = target.z_axis();
        let alpha5 = normalize_angle(
            tool_z.dot(&elbow_to_wrist).atan2(-tool_z.dot(&f4.y_axis())) + FRAC_PI_2,
        );
        let f5 = chain::effector(f4, lengths.z, alpha5);

        IkSet {
            joints: Joints { p1, p2, p3, p4, p5 },
            config: ConfigurationSpace::new([alpha1, alpha2, alpha3, alpha4, alpha5], q2),
            frames: [f1, f2, f3, f4, f5],
        }
    }

    /// Elbow point for `target`, with the rule that produced it.
    #[must_use]
    pub fn locate_elbow(
        &self,
        chain: &PumaChain,
        target: &Frame,
        previous: Option<&IkSet>,
    ) -> Elbow {
        let eps = self.config.degeneracy_epsilon;
        let l3 = chain.lengths().y;
        let p1 = chain.base().origin();
        let p2 = shoulder_point(chain);
        let p4 = wrist_point(chain, target);

        let toward_shoulder = || {
            // p4 == p2 leaves no direction at all; go up the base axis then.
            let direction = (p2 - p4)
                .try_normalize(eps)
                .unwrap_or_else(|| chain.base().z_axis());
            Elbow {
                position: p4 + direction * l3,
                case: ElbowCase::TowardShoulder,
            }
        };

        // Normal of the plane holding the base axis and the wrist.
        let normal = (p4 - p1)
            .try_normalize(eps)
            .zip((p2 - p1).try_normalize(eps))
            .and_then(|(wrist_dir, shoulder_dir)| wrist_dir.cross(&shoulder_dir).try_normalize(eps));
        let Some(normal) = normal else {
            trace!("wrist on the base axis, elbow placed toward shoulder");
            return toward_shoulder();
        };

        let Some(v34n) = normal.cross(&target.x_axis()).try_normalize(eps) else {
            return match previous {
                Some(prev) => {
                    trace!("wrist axis normal to arm plane, projecting previous elbow");
                    Elbow {
                        position: project_onto_plane(&prev.joints.p3, &p1, &normal),
                        case: ElbowCase::ProjectedHint,
                    }
                }
                None => {
                    trace!("wrist axis normal to arm plane, elbow placed toward shoulder");
                    toward_shoulder()
                }
            };
        };

        let primary = p4 + v34n * l3;
        let Some(prev) = previous else {
            return Elbow {
                position: primary,
                case: ElbowCase::Primary,
            };
        };
        let mirrored = p4 - v34n * l3;
        if nalgebra::distance(&mirrored, &prev.joints.p3) < nalgebra::distance(&primary, &prev.joints.p3)
        {
            Elbow {
                position: mirrored,
                case: ElbowCase::Mirrored,
            }
        } else {
            Elbow {
                position: primary,
                case: ElbowCase::Primary,
            }
        }
    }
}

/// Shoulder joint: `l1` up the base Z axis.
fn shoulder_point(chain: &PumaChain) -> Point3<f32> {
    chain.base().origin() + chain.base().z_axis() * chain.lengths().x
}

/// Wrist joint: `l4` back along the target X axis.
fn wrist_point(chain: &PumaChain, target: &Frame) -> Point3<f32> {
    target.origin() - target.x_axis() * chain.lengths().z
}

/// Orthogonal projection of `point` onto the plane through `origin` with
/// unit normal `normal`.
fn project_onto_plane(point: &Point3<f32>, origin: &Point3<f32>, normal: &Vector3<f32>) -> Point3<f32> {
    point - normal * (point - origin).dot(normal)
}

fn planar_angle(y: f32, x: f32) -> f32 {
    normalize_angle(y.atan2(x))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
