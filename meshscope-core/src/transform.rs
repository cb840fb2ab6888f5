//! View transforms mapping model space onto the viewport

use crate::point::*;
use nalgebra::{Matrix4, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// An affine 4x4 transform applied to column vectors
///
/// Values are replaced wholesale whenever the camera changes; nothing
/// mutates a transform in place once it has been handed out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    pub matrix: Matrix4<f32>,
}

impl ViewTransform {
    /// Create an identity transformation
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Create a translation transformation
    pub fn translation(translation: Vector3<f32>) -> Self {
        Self {
            matrix: Matrix4::new_translation(&translation),
        }
    }

    /// Create a scaling transformation
    pub fn scaling(scale: Vector3<f32>) -> Self {
        Self {
            matrix: Matrix4::new_nonuniform_scaling(&scale),
        }
    }

    /// Create a uniform scaling transformation
    pub fn uniform_scaling(scale: f32) -> Self {
        Self {
            matrix: Matrix4::new_scaling(scale),
        }
    }

    /// Right-handed look-at transform from `eye` towards `target`
    pub fn look_at(eye: &Point3<f32>, target: &Point3<f32>, up: &Vector3<f32>) -> Self {
        Self {
            matrix: Matrix4::look_at_rh(eye, target, up),
        }
    }

    /// Orbit view: look from `location` at `target` with world +Z up, then
    /// scale uniformly by `scale_factor`
    pub fn orbit(location: &Point3f, target: &Point3f, scale_factor: f32) -> Self {
        Self::uniform_scaling(scale_factor) * Self::look_at(location, target, &Vector3::z())
    }

    /// Screen-corrected transform for a viewport of the given size
    ///
    /// Applies this transform, flips Y so that screen coordinates grow
    /// downwards, then moves the origin to the middle of the viewport.
    pub fn corrected(&self, width: f32, height: f32) -> Self {
        self.then(Self::scaling(Vector3::new(1.0, -1.0, 1.0)))
            .then(Self::translation(Vector3::new(width / 2.0, height / 2.0, 0.0)))
    }

    /// Apply the transformation to a point
    pub fn transform_point(&self, point: &Point3<f32>) -> Point3<f32> {
        let homogeneous = self.matrix * point.to_homogeneous();
        Point3::from_homogeneous(homogeneous).unwrap_or(*point)
    }

    /// Apply the transformation to a vector
    pub fn transform_vector(&self, vector: &Vector3<f32>) -> Vector3<f32> {
        self.matrix.fixed_view::<3, 3>(0, 0) * vector
    }

    /// Transform a point and drop its depth
    pub fn project(&self, point: &Point3f) -> ScreenPoint {
        let transformed = self.transform_point(point);
        ScreenPoint::new(transformed.x, transformed.y)
    }

    /// Compose this transformation with another; `other` is applied first
    pub fn compose(self, other: Self) -> Self {
        Self {
            matrix: self.matrix * other.matrix,
        }
    }

    /// Apply this transformation, then `next`
    pub fn then(self, next: Self) -> Self {
        next.compose(self)
    }

    /// Check that every matrix entry is finite
    pub fn is_finite(&self) -> bool {
        self.matrix.iter().all(|value| value.is_finite())
    }
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl std::ops::Mul for ViewTransform {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        self.compose(rhs)
    }
}

impl From<Matrix4<f32>> for ViewTransform {
    fn from(matrix: Matrix4<f32>) -> Self {
        Self { matrix }
    }
}
