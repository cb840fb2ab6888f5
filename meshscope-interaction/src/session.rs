//! A viewport session: camera, pipeline, picking and commands wired together
//!
//! The session is the input boundary of the viewer. Pointer events drive the
//! camera and picking; camera changes are forwarded to the transform
//! pipeline through a subscription; left-button picks fulfil whatever
//! measurement command is waiting for a point.

use crate::commands::{
    measure_angle_for, measure_distance_for, AngleMeasurement, DistanceMeasurement,
};
use crate::sequencer::{InteractionSequencer, SequencerState};
use crate::status::StatusLine;
use meshscope_core::{
    CameraConfig, CameraController, CameraState, Model, Point3f, Result, ScreenPoint, ScreenVector,
};
use meshscope_viewport::{
    build_frame, Frame, FrameConfig, PickHit, Picker, PickerConfig, PipelineConfig,
    TransformPipeline, TransformedSnapshot, Viewport,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Pointer buttons the viewer reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerButton {
    /// Picks vertices
    Left,
    /// Pans while held
    Middle,
    /// Rotates while held
    Right,
}

/// Pointer input in viewport pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Moved { position: ScreenPoint },
    Pressed { button: PointerButton, position: ScreenPoint },
    Released { button: PointerButton, position: ScreenPoint },
    /// Positive deltas zoom in
    Wheel { delta: f32 },
}

/// Session construction options
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    pub viewport: Viewport,
    pub camera: CameraConfig,
    pub pipeline: PipelineConfig,
    pub picker: PickerConfig,
    pub frame: FrameConfig,
}

impl SessionConfig {
    pub fn with_viewport(mut self, width: f32, height: f32) -> Self {
        self.viewport = Viewport::new(width, height);
        self
    }

    pub fn with_camera(mut self, camera: CameraConfig) -> Self {
        self.camera = camera;
        self
    }

    pub fn with_pipeline(mut self, pipeline: PipelineConfig) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn with_picker(mut self, picker: PickerConfig) -> Self {
        self.picker = picker;
        self
    }

    pub fn with_frame(mut self, frame: FrameConfig) -> Self {
        self.frame = frame;
        self
    }
}

/// Timing of the most recent [`ViewportSession::frame`] call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    pub generation: u64,
    pub elapsed: Duration,
    /// Infinite when the frame took no measurable time
    pub fps: f64,
}

#[derive(Debug, Default)]
struct PointerState {
    last_position: Option<ScreenPoint>,
    panning: bool,
    rotating: bool,
}

// A hovered vertex and the model it was picked from
#[derive(Debug, Clone)]
struct Highlight {
    vertex: Point3f,
    model: Arc<Model>,
}

/// One interactive view of one model
#[derive(Debug)]
pub struct ViewportSession {
    camera: Mutex<CameraController>,
    pipeline: Arc<TransformPipeline>,
    sequencer: Arc<InteractionSequencer>,
    status: Arc<StatusLine>,
    picker: Picker,
    frame_config: FrameConfig,
    pointer: Mutex<PointerState>,
    highlight: Mutex<Option<Highlight>>,
    last_frame_stats: Mutex<Option<FrameStats>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ViewportSession {
    /// Create a session with no model and the camera in its reset position
    pub fn new(config: SessionConfig) -> Self {
        let camera = CameraController::new(config.camera);
        let pipeline = Arc::new(TransformPipeline::new(
            camera.view_transform(),
            config.viewport,
            config.pipeline,
        ));

        let weak = Arc::downgrade(&pipeline);
        camera.subscribe(move |view| {
            if let Some(pipeline) = weak.upgrade() {
                pipeline.schedule(pipeline.set_view_transform(*view));
            }
        });

        Self {
            camera: Mutex::new(camera),
            pipeline,
            sequencer: Arc::new(InteractionSequencer::new()),
            status: Arc::new(StatusLine::new()),
            picker: Picker::new(config.picker),
            frame_config: config.frame,
            pointer: Mutex::new(PointerState::default()),
            highlight: Mutex::new(None),
            last_frame_stats: Mutex::new(None),
        }
    }

    /// Show `model`, replacing the current one
    pub fn load_model(&self, model: Model) -> Arc<Model> {
        let model = Arc::new(model);
        tracing::info!(
            vertices = model.vertex_count(),
            triangles = model.triangle_count(),
            "loading model into viewport"
        );

        *lock(&self.highlight) = None;
        self.pipeline
            .schedule(self.pipeline.set_model(Some(Arc::clone(&model))));
        model
    }

    /// Remove the current model
    pub fn clear_model(&self) {
        *lock(&self.highlight) = None;
        self.pipeline.schedule(self.pipeline.set_model(None));
    }

    pub fn resize(&self, width: f32, height: f32) {
        self.pipeline
            .schedule(self.pipeline.resize(Viewport::new(width, height)));
    }

    /// Process one pointer event
    ///
    /// Never waits on a measurement command. A rejected camera change is
    /// returned as an error after the rest of the event was handled.
    pub fn handle_event(&self, event: PointerEvent) -> Result<()> {
        match event {
            PointerEvent::Moved { position } => self.pointer_moved(position),
            PointerEvent::Pressed { button, position } => {
                self.pointer_pressed(button, position);
                Ok(())
            }
            PointerEvent::Released { button, .. } => {
                let mut pointer = lock(&self.pointer);
                match button {
                    PointerButton::Middle => pointer.panning = false,
                    PointerButton::Right => pointer.rotating = false,
                    PointerButton::Left => {}
                }
                Ok(())
            }
            PointerEvent::Wheel { delta } => {
                lock(&self.camera).zoom_wheel(delta);
                Ok(())
            }
        }
    }

    fn pointer_moved(&self, position: ScreenPoint) -> Result<()> {
        let (delta, panning, rotating) = {
            let mut pointer = lock(&self.pointer);
            let delta = pointer
                .last_position
                .map(|last| position - last)
                .unwrap_or_else(ScreenVector::zeros);
            pointer.last_position = Some(position);
            (delta, pointer.panning, pointer.rotating)
        };

        let mut camera_result = Ok(());
        if panning {
            camera_result = lock(&self.camera).pan(delta.x, delta.y);
        }
        if rotating && camera_result.is_ok() {
            camera_result = lock(&self.camera).rotate(-delta.x, delta.y);
        }
        if let Err(e) = &camera_result {
            tracing::warn!(error = %e, "camera change rejected");
        }

        let snapshot = self.pipeline.snapshot();
        let highlight = self.picker.pick(&snapshot, position).and_then(|hit| {
            snapshot.model().map(|model| Highlight {
                vertex: hit.vertex,
                model: Arc::clone(model),
            })
        });
        *lock(&self.highlight) = highlight;
        camera_result
    }

    fn pointer_pressed(&self, button: PointerButton, position: ScreenPoint) {
        match button {
            PointerButton::Middle | PointerButton::Right => {
                let mut pointer = lock(&self.pointer);
                pointer.last_position = Some(position);
                if button == PointerButton::Middle {
                    pointer.panning = true;
                } else {
                    pointer.rotating = true;
                }
            }
            PointerButton::Left => {
                if let Some(hit) = self.pick(position) {
                    if !self.sequencer.fulfill(hit.vertex) {
                        tracing::trace!(index = hit.index, "pick with no command waiting");
                    }
                }
            }
        }
    }

    /// Nearest vertex to `position` in the visible snapshot
    pub fn pick(&self, position: ScreenPoint) -> Option<PickHit> {
        self.picker.pick(&self.pipeline.snapshot(), position)
    }

    /// Return the camera to its initial position
    pub fn reset_view(&self) {
        lock(&self.camera).reset();
    }

    /// Start a distance measurement, abandoning any running command
    ///
    /// The returned future prompts through the status line and resolves once
    /// two vertices have been picked.
    pub fn begin_measure_distance(
        &self,
    ) -> impl Future<Output = Result<DistanceMeasurement>> + Send + 'static {
        let command = self.sequencer.begin_command();
        let sequencer = Arc::clone(&self.sequencer);
        let status = Arc::clone(&self.status);
        async move { measure_distance_for(command, &sequencer, &status).await }
    }

    /// Start an angle measurement, abandoning any running command
    pub fn begin_measure_angle(
        &self,
    ) -> impl Future<Output = Result<AngleMeasurement>> + Send + 'static {
        let command = self.sequencer.begin_command();
        let sequencer = Arc::clone(&self.sequencer);
        let status = Arc::clone(&self.status);
        async move { measure_angle_for(command, &sequencer, &status).await }
    }

    /// Abandon the running command, if any
    pub fn cancel_command(&self) -> bool {
        self.sequencer.cancel()
    }

    /// Build the lines to draw from the visible snapshot
    pub fn frame(&self) -> Frame {
        let started = Instant::now();
        let snapshot = self.pipeline.snapshot();
        let highlight = self.highlight_in(&snapshot);
        let frame = build_frame(&snapshot, highlight.as_ref(), &self.frame_config);

        let elapsed = started.elapsed();
        let fps = if elapsed.is_zero() {
            f64::INFINITY
        } else {
            1.0 / elapsed.as_secs_f64()
        };
        *lock(&self.last_frame_stats) = Some(FrameStats {
            generation: frame.generation,
            elapsed,
            fps,
        });
        frame
    }

    // A highlight picked from another model than the snapshot's is not shown
    fn highlight_in(&self, snapshot: &TransformedSnapshot) -> Option<Point3f> {
        lock(&self.highlight)
            .as_ref()
            .filter(|highlight| {
                snapshot
                    .model()
                    .is_some_and(|model| Arc::ptr_eq(model, &highlight.model))
            })
            .map(|highlight| highlight.vertex)
    }

    /// The highlighted model-space vertex, if the cursor is over one
    pub fn highlight(&self) -> Option<Point3f> {
        self.highlight_in(&self.pipeline.snapshot())
    }

    pub fn status(&self) -> String {
        self.status.get()
    }

    pub fn status_line(&self) -> &Arc<StatusLine> {
        &self.status
    }

    pub fn sequencer(&self) -> &Arc<InteractionSequencer> {
        &self.sequencer
    }

    pub fn interaction_state(&self) -> SequencerState {
        self.sequencer.state()
    }

    pub fn pipeline(&self) -> &Arc<TransformPipeline> {
        &self.pipeline
    }

    pub fn camera_state(&self) -> CameraState {
        *lock(&self.camera).state()
    }

    pub fn last_frame_stats(&self) -> Option<FrameStats> {
        *lock(&self.last_frame_stats)
    }
}
