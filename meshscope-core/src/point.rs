//! Point types used across model space and screen space

use nalgebra::{Point2, Point3, Vector2, Vector3};

/// A model-space vertex position
pub type Point3f = Point3<f32>;

/// A model-space direction or displacement
pub type Vector3f = Vector3<f32>;

/// A screen-space position in pixels, origin at the top-left corner
pub type ScreenPoint = Point2<f32>;

/// A screen-space displacement in pixels
pub type ScreenVector = Vector2<f32>;

/// Squared euclidean distance between two screen points
#[inline]
pub fn screen_distance_squared(a: &ScreenPoint, b: &ScreenPoint) -> f32 {
    (a - b).norm_squared()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screen_distance_squared() {
        let a = ScreenPoint::new(1.0, 2.0);
        let b = ScreenPoint::new(4.0, 6.0);
        assert_eq!(screen_distance_squared(&a, &b), 25.0);
        assert_eq!(screen_distance_squared(&b, &a), 25.0);
        assert_eq!(screen_distance_squared(&a, &a), 0.0);
    }
}
