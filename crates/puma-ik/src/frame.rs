//! Coordinate frames.
//!
//! A [`Frame`] is an orthonormal right-handed basis plus an origin. Every
//! joint of the arm and the end effector is described by one. Frames are
//! plain `Copy` values: composing a chain always works on a fresh copy.

use nalgebra::{
    Isometry3, Matrix3, Matrix4, Point3, Rotation3, Translation3, Unit, UnitQuaternion, Vector3,
};

/// One of the three basis axes of a [`Frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Orthonormal basis plus origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    x: Vector3<f32>,
    y: Vector3<f32>,
    z: Vector3<f32>,
    origin: Point3<f32>,
}

impl Default for Frame {
    fn default() -> Self {
        Self::identity()
    }
}

impl Frame {
    /// World axes at the world origin.
    #[must_use]
    pub fn identity() -> Self {
        Self {
            x: Vector3::x(),
            y: Vector3::y(),
            z: Vector3::z(),
            origin: Point3::origin(),
        }
    }

    /// Frame from explicit axes and origin.
    ///
    /// The caller is responsible for passing an orthonormal basis.
    #[must_use]
    pub const fn from_axes(
        x: Vector3<f32>,
        y: Vector3<f32>,
        z: Vector3<f32>,
        origin: Point3<f32>,
    ) -> Self {
        Self { x, y, z, origin }
    }

    /// Identity frame moved by `translation`, then rotated by `rotation`.
    #[must_use]
    pub fn from_parts(translation: &Vector3<f32>, rotation: &UnitQuaternion<f32>) -> Self {
        let mut frame = Self::identity();
        frame.translate(translation);
        frame.rotate(rotation);
        frame
    }

    /// Frame equivalent to a rigid transform.
    #[must_use]
    pub fn from_isometry(isometry: &Isometry3<f32>) -> Self {
        Self::from_parts(&isometry.translation.vector, &isometry.rotation)
    }

    /// Basis X axis.
    #[must_use]
    pub const fn x_axis(&self) -> Vector3<f32> {
        self.x
    }

    /// Basis Y axis.
    #[must_use]
    pub const fn y_axis(&self) -> Vector3<f32> {
        self.y
    }

    /// Basis Z axis.
    #[must_use]
    pub const fn z_axis(&self) -> Vector3<f32> {
        self.z
    }

    /// Basis axis by name.
    #[must_use]
    pub const fn axis(&self, axis: Axis) -> Vector3<f32> {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    /// Frame origin.
    #[must_use]
    pub const fn origin(&self) -> Point3<f32> {
        self.origin
    }

    /// Rotate all three axes by `rotation` (expressed in world coordinates).
    ///
    /// Each axis is renormalised on every call. This bounds drift over long
    /// compositions but does not re-orthogonalise the basis.
    pub fn rotate(&mut self, rotation: &UnitQuaternion<f32>) {
        self.x = (rotation * self.x).normalize();
        self.y = (rotation * self.y).normalize();
        self.z = (rotation * self.z).normalize();
    }

    /// Move the origin by `translation` (world coordinates).
    pub fn translate(&mut self, translation: &Vector3<f32>) {
        self.origin += translation;
    }

    /// Copy of this frame rotated by `angle` radians about one of its own axes.
    #[must_use]
    pub fn rotated_about(mut self, axis: Axis, angle: f32) -> Self {
        let rotation = UnitQuaternion::from_axis_angle(&Unit::new_normalize(self.axis(axis)), angle);
        self.rotate(&rotation);
        self
    }

    /// Copy of this frame moved `distance` along one of its own axes.
    #[must_use]
    pub fn translated_along(mut self, axis: Axis, distance: f32) -> Self {
        let step = self.axis(axis) * distance;
        self.translate(&step);
        self
    }

    /// Orientation of the basis as a unit quaternion.
    #[must_use]
    pub fn rotation(&self) -> UnitQuaternion<f32> {
        // Shepperd extraction is exact for half turns, where the iterative
        // `from_matrix` stalls at its identity guess.
        let basis = Rotation3::from_matrix_unchecked(Matrix3::from_columns(&[self.x, self.y, self.z]));
        UnitQuaternion::new_normalize(UnitQuaternion::from_rotation_matrix(&basis).into_inner())
    }

    /// Frame as a rigid transform (rotation + translation).
    #[must_use]
    pub fn to_isometry(&self) -> Isometry3<f32> {
        Isometry3::from_parts(Translation3::from(self.origin.coords), self.rotation())
    }

    /// 4x4 homogeneous matrix with columns `[x, y, z, origin]`.
    #[must_use]
    pub fn homogeneous_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_columns(&[
            self.x.to_homogeneous(),
            self.y.to_homogeneous(),
            self.z.to_homogeneous(),
            self.origin.to_homogeneous(),
        ])
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
