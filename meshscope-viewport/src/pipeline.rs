//! Model-to-screen transform pipeline
//!
//! The pipeline owns the inputs of the projection (model, view transform,
//! viewport size) and the currently visible [`TransformedSnapshot`]. Every
//! input change produces a [`RecomputeJob`] tagged with a new generation.
//! Jobs compute into fresh buffers and may finish in any order; a result is
//! installed only while its generation is still the latest one requested,
//! so a slow stale job can never overwrite a newer snapshot.

use crate::parallel;
use meshscope_core::{ChangeNotifier, Model, Point3f, ScreenPoint, SubscriptionId, ViewTransform};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

/// Size of the drawing surface in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

/// Screen positions of every model vertex for one generation
///
/// `points()[i]` is the projection of `model().vertices()[i]`. Snapshots are
/// immutable and shared behind an `Arc`.
#[derive(Debug, Clone)]
pub struct TransformedSnapshot {
    generation: u64,
    model: Option<Arc<Model>>,
    transform: ViewTransform,
    viewport: Viewport,
    points: Vec<ScreenPoint>,
}

impl TransformedSnapshot {
    /// A snapshot with no model
    pub fn empty(generation: u64, transform: ViewTransform, viewport: Viewport) -> Self {
        Self {
            generation,
            model: None,
            transform,
            viewport,
            points: Vec::new(),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The model these points were projected from
    pub fn model(&self) -> Option<&Arc<Model>> {
        self.model.as_ref()
    }

    /// The corrected (screen) transform used for the projection
    pub fn transform(&self) -> &ViewTransform {
        &self.transform
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn points(&self) -> &[ScreenPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Model-space vertex behind snapshot index `index`
    pub fn vertex(&self, index: usize) -> Option<&Point3f> {
        self.model.as_ref()?.vertex(index)
    }
}

/// Tuning for the transform pipeline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Vertex count from which the transform is split across workers
    pub parallel_min_vertices: usize,
    /// Vertex count from which [`TransformPipeline::schedule`] moves work
    /// off the calling thread
    pub background_min_vertices: usize,
}

impl PipelineConfig {
    pub fn with_parallel_min_vertices(mut self, count: usize) -> Self {
        self.parallel_min_vertices = count;
        self
    }

    pub fn with_background_min_vertices(mut self, count: usize) -> Self {
        self.background_min_vertices = count;
        self
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            parallel_min_vertices: 4096,
            background_min_vertices: 100_000,
        }
    }
}

#[derive(Debug)]
struct PipelineInputs {
    model: Option<Arc<Model>>,
    view: ViewTransform,
    viewport: Viewport,
}

/// Inputs captured at trigger time for one recompute
#[derive(Debug, Clone)]
#[must_use = "a recompute job does nothing until it is run"]
pub struct RecomputeJob {
    generation: u64,
    model: Option<Arc<Model>>,
    transform: ViewTransform,
    viewport: Viewport,
    parallel_min_vertices: usize,
}

impl RecomputeJob {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn vertex_count(&self) -> usize {
        self.model.as_ref().map_or(0, |model| model.vertex_count())
    }

    /// Project every vertex into a freshly allocated buffer
    pub fn run(self) -> TransformedSnapshot {
        let points = match &self.model {
            Some(model) => {
                let parallel =
                    parallel::should_parallelize(model.vertex_count(), self.parallel_min_vertices);
                project_vertices(model.vertices(), &self.transform, parallel)
            }
            None => Vec::new(),
        };

        TransformedSnapshot {
            generation: self.generation,
            model: self.model,
            transform: self.transform,
            viewport: self.viewport,
            points,
        }
    }
}

/// Project vertices through `transform`, keeping index order
pub fn project_vertices(
    vertices: &[Point3f],
    transform: &ViewTransform,
    parallel: bool,
) -> Vec<ScreenPoint> {
    if parallel {
        parallel::execute_parallel(|| {
            vertices
                .par_iter()
                .map(|vertex| transform.project(vertex))
                .collect()
        })
    } else {
        vertices.iter().map(|vertex| transform.project(vertex)).collect()
    }
}

/// Produces and publishes screen-space snapshots of the current model
#[derive(Debug)]
pub struct TransformPipeline {
    inputs: Mutex<PipelineInputs>,
    requested: AtomicU64,
    current: RwLock<Arc<TransformedSnapshot>>,
    installed: ChangeNotifier<u64>,
    config: PipelineConfig,
}

impl TransformPipeline {
    /// Create a pipeline without a model; the initial snapshot is empty
    pub fn new(view: ViewTransform, viewport: Viewport, config: PipelineConfig) -> Self {
        let corrected = view.corrected(viewport.width, viewport.height);
        Self {
            inputs: Mutex::new(PipelineInputs {
                model: None,
                view,
                viewport,
            }),
            requested: AtomicU64::new(0),
            current: RwLock::new(Arc::new(TransformedSnapshot::empty(0, corrected, viewport))),
            installed: ChangeNotifier::new(),
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn lock_inputs(&self) -> MutexGuard<'_, PipelineInputs> {
        self.inputs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replace the model and request a recompute
    pub fn set_model(&self, model: Option<Arc<Model>>) -> RecomputeJob {
        let mut inputs = self.lock_inputs();
        inputs.model = model;
        self.capture(&inputs)
    }

    /// Replace the view transform and request a recompute
    pub fn set_view_transform(&self, view: ViewTransform) -> RecomputeJob {
        let mut inputs = self.lock_inputs();
        inputs.view = view;
        self.capture(&inputs)
    }

    /// Change the viewport size and request a recompute
    pub fn resize(&self, viewport: Viewport) -> RecomputeJob {
        let mut inputs = self.lock_inputs();
        inputs.viewport = viewport;
        self.capture(&inputs)
    }

    /// Request a recompute of the current inputs
    pub fn request_recompute(&self) -> RecomputeJob {
        let inputs = self.lock_inputs();
        self.capture(&inputs)
    }

    // Generations are issued while the inputs lock is held, so generation
    // order always matches the order of input changes.
    fn capture(&self, inputs: &PipelineInputs) -> RecomputeJob {
        let generation = self.requested.fetch_add(1, Ordering::SeqCst) + 1;
        RecomputeJob {
            generation,
            model: inputs.model.clone(),
            transform: inputs.view.corrected(inputs.viewport.width, inputs.viewport.height),
            viewport: inputs.viewport,
            parallel_min_vertices: self.config.parallel_min_vertices,
        }
    }

    /// Publish a finished snapshot if it is still the latest request
    ///
    /// Returns false when the snapshot was discarded as stale.
    pub fn install(&self, snapshot: TransformedSnapshot) -> bool {
        let generation = snapshot.generation;
        {
            let mut current = self
                .current
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let latest = self.requested.load(Ordering::SeqCst);
            if generation != latest || generation <= current.generation {
                tracing::debug!(generation, latest, "discarding stale snapshot");
                return false;
            }
            *current = Arc::new(snapshot);
        }

        tracing::trace!(generation, "snapshot installed");
        self.installed.notify(&generation);
        true
    }

    /// Run a job on the calling thread and install its result
    pub fn run(&self, job: RecomputeJob) -> bool {
        self.install(job.run())
    }

    /// Run a job on the worker pool; the result is installed when it
    /// completes unless a newer job was requested meanwhile
    pub fn spawn(self: &Arc<Self>, job: RecomputeJob) {
        let pipeline = Arc::clone(self);
        parallel::spawn(move || {
            let generation = job.generation();
            if pipeline.requested.load(Ordering::SeqCst) != generation {
                tracing::debug!(generation, "skipping superseded recompute");
                return;
            }
            pipeline.install(job.run());
        });
    }

    /// Run small jobs inline and large ones on the worker pool
    pub fn schedule(self: &Arc<Self>, job: RecomputeJob) {
        if job.vertex_count() >= self.config.background_min_vertices {
            self.spawn(job);
        } else {
            self.run(job);
        }
    }

    /// The most recently installed snapshot
    pub fn snapshot(&self) -> Arc<TransformedSnapshot> {
        Arc::clone(
            &self
                .current
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        )
    }

    /// Generation of the newest request, installed or not
    pub fn latest_generation(&self) -> u64 {
        self.requested.load(Ordering::SeqCst)
    }

    /// Whether the visible snapshot reflects the latest inputs
    pub fn is_current(&self) -> bool {
        self.snapshot().generation() == self.latest_generation()
    }

    pub fn model(&self) -> Option<Arc<Model>> {
        self.lock_inputs().model.clone()
    }

    pub fn view_transform(&self) -> ViewTransform {
        self.lock_inputs().view
    }

    pub fn viewport(&self) -> Viewport {
        self.lock_inputs().viewport
    }

    /// The corrected transform for the current inputs
    pub fn corrected_transform(&self) -> ViewTransform {
        let inputs = self.lock_inputs();
        inputs.view.corrected(inputs.viewport.width, inputs.viewport.height)
    }

    /// Get notified with the generation of every installed snapshot
    pub fn subscribe_installed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&u64) + Send + Sync + 'static,
    {
        self.installed.subscribe(callback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use meshscope_core::{CameraController, Vector3};
    use std::time::Duration;

    fn make_model() -> Arc<Model> {
        Arc::new(
            Model::new(
                vec![
                    Point3f::new(0.0, 0.0, 0.0),
                    Point3f::new(1.0, 0.0, 0.0),
                    Point3f::new(0.0, 1.0, 0.0),
                    Point3f::new(0.0, 0.0, 1.0),
                ],
                vec![[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]],
            )
            .unwrap(),
        )
    }

    fn make_grid(size: usize) -> Arc<Model> {
        let mut vertices = Vec::new();
        for y in 0..size {
            for x in 0..size {
                vertices.push(Point3f::new(x as f32, y as f32, ((x * y) % 7) as f32));
            }
        }
        let mut triangles = Vec::new();
        for y in 0..(size - 1) {
            for x in 0..(size - 1) {
                let tl = y * size + x;
                let tr = tl + 1;
                let bl = (y + 1) * size + x;
                let br = bl + 1;
                triangles.push([tl, bl, tr]);
                triangles.push([tr, bl, br]);
            }
        }
        Arc::new(Model::new(vertices, triangles).unwrap())
    }

    fn make_pipeline() -> TransformPipeline {
        TransformPipeline::new(
            CameraController::default().view_transform(),
            Viewport::new(640.0, 480.0),
            PipelineConfig::default(),
        )
    }

    #[test]
    fn test_initial_snapshot_is_empty() {
        let pipeline = make_pipeline();
        let snapshot = pipeline.snapshot();
        assert_eq!(snapshot.generation(), 0);
        assert!(snapshot.is_empty());
        assert!(snapshot.model().is_none());
        assert!(pipeline.is_current());
    }

    #[test]
    fn test_projection_matches_corrected_transform() {
        let pipeline = make_pipeline();
        let model = make_model();
        assert!(pipeline.run(pipeline.set_model(Some(Arc::clone(&model)))));

        let snapshot = pipeline.snapshot();
        let corrected = pipeline.corrected_transform();
        assert_eq!(snapshot.len(), model.vertex_count());
        for (vertex, point) in model.vertices().iter().zip(snapshot.points()) {
            assert_relative_eq!(*point, corrected.project(vertex), epsilon = 1e-4);
        }

        // The camera looks at the origin, which lands in the viewport centre
        assert_relative_eq!(snapshot.points()[0], ScreenPoint::new(320.0, 240.0), epsilon = 1e-3);
        assert_eq!(snapshot.vertex(3), Some(&Point3f::new(0.0, 0.0, 1.0)));
    }

    #[test]
    fn test_world_up_points_up_on_screen() {
        let pipeline = make_pipeline();
        assert!(pipeline.run(pipeline.set_model(Some(make_model()))));

        let snapshot = pipeline.snapshot();
        // Vertex 3 sits on +Z, so it is drawn above the origin
        assert!(snapshot.points()[3].y < snapshot.points()[0].y);
    }

    #[test]
    fn test_resize_recenters() {
        let pipeline = make_pipeline();
        let _ = pipeline.set_model(Some(make_model()));
        assert!(pipeline.run(pipeline.resize(Viewport::new(100.0, 50.0))));

        let snapshot = pipeline.snapshot();
        assert_relative_eq!(snapshot.points()[0], ScreenPoint::new(50.0, 25.0), epsilon = 1e-3);
        assert_eq!(snapshot.viewport(), Viewport::new(100.0, 50.0));
    }

    #[test]
    fn test_parallel_projection_matches_sequential() {
        let model = make_grid(80);
        let transform = CameraController::default()
            .view_transform()
            .corrected(640.0, 480.0);

        let sequential = project_vertices(model.vertices(), &transform, false);
        let parallel = project_vertices(model.vertices(), &transform, true);
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_stale_jobs_are_discarded() {
        let pipeline = make_pipeline();
        let mut camera = CameraController::default();
        let _ = pipeline.set_model(Some(make_model()));

        // Issue several camera changes without running anything
        let mut jobs = Vec::new();
        for step in 0..5 {
            camera.rotate(10.0 * step as f32 + 5.0, 3.0).unwrap();
            jobs.push(pipeline.set_view_transform(camera.view_transform()));
        }
        let final_transform = camera.view_transform().corrected(640.0, 480.0);
        let latest = pipeline.latest_generation();

        // Finish the newest first, then let the older ones complete
        let newest = jobs.pop().unwrap();
        assert_eq!(newest.generation(), latest);
        assert!(pipeline.run(newest));
        for job in jobs.into_iter().rev() {
            assert!(!pipeline.run(job));
        }

        let snapshot = pipeline.snapshot();
        assert_eq!(snapshot.generation(), latest);
        assert_eq!(*snapshot.transform(), final_transform);
    }

    #[test]
    fn test_older_job_finishing_first_is_dropped() {
        let pipeline = make_pipeline();
        let first = pipeline.set_model(Some(make_model()));
        let second = pipeline.set_view_transform(ViewTransform::uniform_scaling(3.0));

        // A superseded result never becomes visible, even if nothing newer
        // has been installed yet
        assert!(!pipeline.run(first));
        assert_eq!(pipeline.snapshot().generation(), 0);
        assert!(!pipeline.is_current());

        assert!(pipeline.run(second));
        assert!(pipeline.is_current());
    }

    #[test]
    fn test_background_recompute_installs_latest() {
        let pipeline = Arc::new(TransformPipeline::new(
            ViewTransform::identity(),
            Viewport::new(200.0, 200.0),
            PipelineConfig::default().with_background_min_vertices(0),
        ));
        let (sender, receiver) = flume::unbounded();
        pipeline.subscribe_installed(move |generation| {
            let _ = sender.send(*generation);
        });

        pipeline.schedule(pipeline.set_model(Some(make_grid(60))));
        for i in 1..=10 {
            let shift = ViewTransform::translation(Vector3::new(i as f32, 0.0, 0.0));
            pipeline.schedule(pipeline.set_view_transform(shift));
        }
        let latest = pipeline.latest_generation();

        let mut installed = Vec::new();
        while pipeline.snapshot().generation() != latest {
            let generation = receiver
                .recv_timeout(Duration::from_secs(10))
                .expect("latest snapshot was never installed");
            installed.push(generation);
        }

        assert!(installed.iter().all(|generation| *generation <= latest));
        let snapshot = pipeline.snapshot();
        assert_relative_eq!(snapshot.points()[0], ScreenPoint::new(110.0, 100.0), epsilon = 1e-4);
    }
}
