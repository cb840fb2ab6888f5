//! Orbit camera state and controller

use crate::error::{Error, Result};
use crate::notify::{ChangeNotifier, SubscriptionId};
use crate::point::*;
use crate::transform::ViewTransform;
use nalgebra::{Point3, Rotation3, Unit, Vector3};
use serde::{Deserialize, Serialize};

/// Axes shorter than this are treated as undefined
const AXIS_EPSILON: f32 = 1e-6;

/// Orbit camera parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    /// Eye position
    pub location: Point3f,
    /// Look-at point the camera orbits around
    pub target: Point3f,
    /// Uniform scale from model units to pixels
    pub scale_factor: f32,
}

impl CameraState {
    /// Create a validated camera state
    pub fn new(location: Point3f, target: Point3f, scale_factor: f32) -> Result<Self> {
        let state = Self {
            location,
            target,
            scale_factor,
        };
        state.validate()?;
        Ok(state)
    }

    /// Check the camera invariants
    pub fn validate(&self) -> Result<()> {
        if !(self.scale_factor.is_finite() && self.scale_factor > 0.0) {
            return Err(Error::DegenerateCamera(format!(
                "scale factor must be positive, got {}",
                self.scale_factor
            )));
        }
        if !self.location.iter().chain(self.target.iter()).all(|c| c.is_finite()) {
            return Err(Error::DegenerateCamera("non-finite camera coordinates".to_string()));
        }
        if self.offset().norm() <= AXIS_EPSILON {
            return Err(Error::DegenerateCamera(
                "camera location coincides with its target".to_string(),
            ));
        }
        Ok(())
    }

    /// Vector from the target to the eye
    pub fn offset(&self) -> Vector3f {
        self.location - self.target
    }

    /// Screen-right and screen-up axes in world space
    ///
    /// Both are recomputed from the current location and target. Fails when
    /// the camera sits on the target or looks straight along world Z.
    pub fn viewport_axes(&self) -> Result<(Unit<Vector3f>, Unit<Vector3f>)> {
        let offset = self.offset();
        let x_axis = Unit::try_new(Vector3::z().cross(&offset), AXIS_EPSILON).ok_or_else(|| {
            Error::DegenerateCamera("view direction is parallel to world up".to_string())
        })?;
        let y_axis = Unit::try_new(offset.cross(&x_axis.into_inner()), AXIS_EPSILON)
            .ok_or_else(|| {
                Error::DegenerateCamera("camera location coincides with its target".to_string())
            })?;
        Ok((x_axis, y_axis))
    }

    /// The view transform for this state
    pub fn view_transform(&self) -> ViewTransform {
        ViewTransform::orbit(&self.location, &self.target, self.scale_factor)
    }
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            location: Point3::new(1.0, -1.0, 1.0),
            target: Point3::origin(),
            scale_factor: 10.0,
        }
    }
}

/// Wheel direction for zooming
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoomDirection {
    In,
    Out,
}

impl ZoomDirection {
    /// Positive wheel deltas zoom in, everything else zooms out
    pub fn from_wheel_delta(delta: f32) -> Self {
        if delta > 0.0 {
            ZoomDirection::In
        } else {
            ZoomDirection::Out
        }
    }
}

/// Tuning for camera interaction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Radians of rotation per pixel of pointer travel
    pub rotation_speed: f32,
    /// Scale multiplier for one wheel step towards the model
    pub zoom_in_factor: f32,
    /// Scale multiplier for one wheel step away from the model
    pub zoom_out_factor: f32,
    /// Smallest scale factor zooming may produce
    pub min_scale_factor: f32,
    /// Largest scale factor zooming may produce
    pub max_scale_factor: f32,
}

impl CameraConfig {
    pub fn with_rotation_speed(mut self, rotation_speed: f32) -> Self {
        self.rotation_speed = rotation_speed;
        self
    }

    pub fn with_zoom_factors(mut self, zoom_in: f32, zoom_out: f32) -> Self {
        self.zoom_in_factor = zoom_in;
        self.zoom_out_factor = zoom_out;
        self
    }

    pub fn with_min_scale_factor(mut self, min_scale_factor: f32) -> Self {
        self.min_scale_factor = min_scale_factor;
        self
    }

    pub fn with_max_scale_factor(mut self, max_scale_factor: f32) -> Self {
        self.max_scale_factor = max_scale_factor;
        self
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            rotation_speed: 0.01,
            zoom_in_factor: 1.25,
            zoom_out_factor: 0.8,
            min_scale_factor: 1e-6,
            max_scale_factor: 1e6,
        }
    }
}

/// Owns the orbit camera and publishes a new [`ViewTransform`] after every
/// mutation
#[derive(Debug)]
pub struct CameraController {
    state: CameraState,
    config: CameraConfig,
    view: ViewTransform,
    notifier: ChangeNotifier<ViewTransform>,
}

impl CameraController {
    /// Create a controller in the reset position
    pub fn new(config: CameraConfig) -> Self {
        let state = CameraState::default();
        Self {
            view: state.view_transform(),
            state,
            config,
            notifier: ChangeNotifier::new(),
        }
    }

    pub fn state(&self) -> &CameraState {
        &self.state
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    /// The transform derived from the current state
    pub fn view_transform(&self) -> ViewTransform {
        self.view
    }

    /// Get notified with the new view transform after every change
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&ViewTransform) + Send + Sync + 'static,
    {
        self.notifier.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    /// Replace the whole state, rejecting degenerate cameras
    pub fn set_state(&mut self, state: CameraState) -> Result<()> {
        state.validate()?;
        self.state = state;
        self.recalculate();
        Ok(())
    }

    /// Look at the origin from (1, -1, 1) with a scale of 10
    pub fn reset(&mut self) {
        self.state = CameraState::default();
        self.recalculate();
    }

    /// Multiply the scale factor by one zoom step
    pub fn zoom(&mut self, direction: ZoomDirection) {
        let factor = match direction {
            ZoomDirection::In => self.config.zoom_in_factor,
            ZoomDirection::Out => self.config.zoom_out_factor,
        };

        let mut scale_factor = self.state.scale_factor * factor;
        if !(scale_factor >= self.config.min_scale_factor) {
            tracing::warn!(
                scale_factor,
                min = self.config.min_scale_factor,
                "zoom clamped to minimum scale factor"
            );
            scale_factor = self.config.min_scale_factor;
        } else if !(scale_factor <= self.config.max_scale_factor) {
            tracing::warn!(
                scale_factor,
                max = self.config.max_scale_factor,
                "zoom clamped to maximum scale factor"
            );
            scale_factor = self.config.max_scale_factor;
        }
        self.state.scale_factor = scale_factor;
        self.recalculate();
    }

    /// Zoom one step in the direction of a wheel delta
    pub fn zoom_wheel(&mut self, delta: f32) {
        self.zoom(ZoomDirection::from_wheel_delta(delta));
    }

    /// Translate camera and target together by a cursor movement in pixels
    pub fn pan(&mut self, cursor_dx: f32, cursor_dy: f32) -> Result<()> {
        if cursor_dx == 0.0 && cursor_dy == 0.0 {
            return Ok(());
        }

        let (x_axis, y_axis) = self.state.viewport_axes().inspect_err(|e| {
            tracing::warn!(error = %e, "pan rejected");
        })?;
        let scale = self.state.scale_factor;
        let delta = x_axis.into_inner() * (-cursor_dx / scale) + y_axis.into_inner() * (cursor_dy / scale);

        self.state.location += delta;
        self.state.target += delta;
        self.recalculate();
        Ok(())
    }

    /// Orbit the eye around the target by a cursor movement in pixels
    ///
    /// Horizontal movement turns about world Z; vertical movement then tilts
    /// about the screen-right axis of the already turned camera.
    pub fn rotate(&mut self, cursor_dx: f32, cursor_dy: f32) -> Result<()> {
        if cursor_dx == 0.0 && cursor_dy == 0.0 {
            return Ok(());
        }

        let target = self.state.target;
        let speed = self.config.rotation_speed;

        let turn = Rotation3::from_axis_angle(&Vector3::z_axis(), cursor_dx * speed);
        let turned = CameraState {
            location: target + turn * self.state.offset(),
            ..self.state
        };

        let (x_axis, _) = turned.viewport_axes().inspect_err(|e| {
            tracing::warn!(error = %e, "rotate rejected");
        })?;
        let tilt = Rotation3::from_axis_angle(&x_axis, -cursor_dy * speed);
        let tilted = CameraState {
            location: target + tilt * turned.offset(),
            ..turned
        };

        // Tilting onto the world Z axis would leave no screen-right axis
        self.state = if tilted.viewport_axes().is_ok() {
            tilted
        } else {
            tracing::debug!("tilt would align the view with world up; keeping turn only");
            turned
        };
        self.recalculate();
        Ok(())
    }

    fn recalculate(&mut self) {
        self.view = self.state.view_transform();
        tracing::trace!(
            location = ?self.state.location,
            target = ?self.state.target,
            scale_factor = self.state.scale_factor,
            "view transform recalculated"
        );
        self.notifier.notify(&self.view);
    }
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new(CameraConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_reset_view_transform() {
        let mut camera = CameraController::default();
        camera.zoom(ZoomDirection::In);
        camera.pan(3.0, -2.0).unwrap();
        camera.reset();

        let expected = nalgebra::Matrix4::new_scaling(10.0)
            * nalgebra::Matrix4::look_at_rh(
                &Point3::new(1.0, -1.0, 1.0),
                &Point3::origin(),
                &Vector3::z(),
            );
        assert_relative_eq!(camera.view_transform().matrix, expected, epsilon = 1e-5);
        assert_eq!(*camera.state(), CameraState::default());
    }

    #[test]
    fn test_zoom_in_then_out_restores_scale() {
        let mut camera = CameraController::default();
        for _ in 0..3 {
            camera.zoom(ZoomDirection::In);
        }
        let zoomed = camera.state().scale_factor;
        camera.zoom(ZoomDirection::In);
        camera.zoom(ZoomDirection::Out);

        assert_relative_eq!(camera.state().scale_factor, zoomed, max_relative = 1e-6);
        assert_relative_eq!(zoomed, 10.0 * 1.25 * 1.25 * 1.25, max_relative = 1e-6);
    }

    #[test]
    fn test_zoom_wheel_direction() {
        let mut camera = CameraController::default();
        camera.zoom_wheel(1.0);
        assert_relative_eq!(camera.state().scale_factor, 12.5);
        camera.zoom_wheel(-1.0);
        camera.zoom_wheel(-1.0);
        assert_relative_eq!(camera.state().scale_factor, 8.0, max_relative = 1e-6);
    }

    #[test]
    fn test_zoom_never_reaches_zero() {
        let config = CameraConfig::default()
            .with_zoom_factors(1.25, 0.0)
            .with_min_scale_factor(1e-3);
        let mut camera = CameraController::new(config);
        camera.zoom(ZoomDirection::Out);

        assert_eq!(camera.state().scale_factor, 1e-3);
        assert!(camera.view_transform().is_finite());
    }

    #[test]
    fn test_repeated_zoom_in_stays_finite() {
        let mut camera = CameraController::default();
        for _ in 0..1000 {
            camera.zoom(ZoomDirection::In);
        }

        assert_eq!(camera.state().scale_factor, 1e6);
        assert!(camera.view_transform().is_finite());
        assert!(camera.view_transform().project(&Point3f::new(1.0, 2.0, 3.0)).iter().all(|c| c.is_finite()));
    }

    #[test]
    fn test_zero_pan_and_rotate_are_noops() {
        let mut camera = CameraController::default();
        camera.pan(12.0, 7.0).unwrap();
        let before = *camera.state();

        camera.pan(0.0, 0.0).unwrap();
        camera.rotate(0.0, 0.0).unwrap();

        assert_eq!(*camera.state(), before);
    }

    #[test]
    fn test_pan_moves_location_and_target_rigidly() {
        let mut camera = CameraController::default();
        let before = *camera.state();
        camera.pan(10.0, 0.0).unwrap();
        let after = *camera.state();

        let moved = after.target - before.target;
        assert_relative_eq!(after.location - before.location, moved, epsilon = 1e-6);
        assert_relative_eq!(after.offset(), before.offset(), epsilon = 1e-6);

        // Dragging right moves the camera left along the screen-right axis
        let (x_axis, _) = before.viewport_axes().unwrap();
        assert_relative_eq!(moved, x_axis.into_inner() * -1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_pan_vertical_uses_screen_up() {
        let mut camera = CameraController::default();
        let before = *camera.state();
        camera.pan(0.0, 20.0).unwrap();

        let (_, y_axis) = before.viewport_axes().unwrap();
        let moved = camera.state().target - before.target;
        assert_relative_eq!(moved, y_axis.into_inner() * 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_rotate_preserves_distance_to_target() {
        let mut camera = CameraController::default();
        let radius = camera.state().offset().norm();

        camera.rotate(40.0, 15.0).unwrap();
        camera.rotate(-13.0, -60.0).unwrap();

        assert_relative_eq!(camera.state().offset().norm(), radius, max_relative = 1e-5);
        assert_eq!(camera.state().target, Point3::origin());
    }

    #[test]
    fn test_rotate_horizontal_turns_about_world_z() {
        let mut camera = CameraController::default();
        // 0.01 rad per pixel: a quarter turn
        camera.rotate(std::f32::consts::FRAC_PI_2 * 100.0, 0.0).unwrap();

        assert_relative_eq!(camera.state().location, Point3::new(1.0, 1.0, 1.0), epsilon = 1e-5);
    }

    #[test]
    fn test_rotate_tilt_uses_turned_axis() {
        let mut camera = CameraController::default();
        camera
            .rotate(std::f32::consts::FRAC_PI_2 * 100.0, 10.0)
            .unwrap();

        // After the turn the eye is at (1, 1, 1); tilting must happen in the
        // plane spanned by that offset and world Z, so x == y stays true.
        // Dragging down raises the eye.
        let location = camera.state().location;
        assert_relative_eq!(location.x, location.y, epsilon = 1e-5);
        assert!(location.z > 1.0);
    }

    #[test]
    fn test_degenerate_state_rejected() {
        let mut camera = CameraController::default();
        let result = camera.set_state(CameraState {
            location: Point3::new(2.0, 2.0, 2.0),
            target: Point3::new(2.0, 2.0, 2.0),
            scale_factor: 1.0,
        });
        assert!(matches!(result, Err(Error::DegenerateCamera(_))));
        assert!(CameraState::new(Point3::new(0.0, 0.0, 1.0), Point3::origin(), -1.0).is_err());
        assert_eq!(*camera.state(), CameraState::default());
    }

    #[test]
    fn test_pan_looking_down_world_z_is_rejected() {
        let mut camera = CameraController::default();
        camera
            .set_state(CameraState::new(Point3::new(0.0, 0.0, 5.0), Point3::origin(), 10.0).unwrap())
            .unwrap();
        let before = *camera.state();

        assert!(matches!(camera.pan(1.0, 1.0), Err(Error::DegenerateCamera(_))));
        assert!(camera.rotate(0.0, 3.0).is_err());
        assert_eq!(*camera.state(), before);
        assert!(camera.view_transform().is_finite());
    }

    #[test]
    fn test_subscribers_see_every_change() {
        let mut camera = CameraController::default();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        camera.subscribe(move |view| {
            assert!(view.is_finite());
            counter.fetch_add(1, Ordering::SeqCst);
        });

        camera.zoom(ZoomDirection::In);
        camera.pan(1.0, 1.0).unwrap();
        camera.rotate(1.0, 1.0).unwrap();
        camera.reset();
        camera.pan(0.0, 0.0).unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 4);
    }
}
