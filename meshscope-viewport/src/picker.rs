//! Nearest-vertex picking against a transformed snapshot

use crate::parallel;
use crate::pipeline::TransformedSnapshot;
use meshscope_core::{screen_distance_squared, Point3f, ScreenPoint};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Picking tolerances
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PickerConfig {
    /// Maximum cursor distance in pixels; matches must be strictly closer
    pub threshold_px: f32,
    /// Vertex count from which the scan is split across workers
    pub parallel_min_vertices: usize,
}

impl PickerConfig {
    pub fn with_threshold(mut self, threshold_px: f32) -> Self {
        self.threshold_px = threshold_px;
        self
    }

    pub fn with_parallel_min_vertices(mut self, count: usize) -> Self {
        self.parallel_min_vertices = count;
        self
    }
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            threshold_px: 10.0,
            parallel_min_vertices: 4096,
        }
    }
}

/// A vertex found under the cursor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    /// Index into the model's vertex list
    pub index: usize,
    /// Untransformed model-space position
    pub vertex: Point3f,
    /// Projected position in the snapshot the hit was found in
    pub screen: ScreenPoint,
    /// Squared pixel distance from the cursor
    pub distance_squared: f32,
    /// Generation of the snapshot that was searched
    pub generation: u64,
}

impl PickHit {
    /// Pixel distance from the cursor
    pub fn distance(&self) -> f32 {
        self.distance_squared.sqrt()
    }
}

// Lexicographic (distance, index); NaN distances were mapped to infinity
fn closer(a: (f32, usize), b: (f32, usize)) -> (f32, usize) {
    match a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)) {
        Ordering::Greater => b,
        _ => a,
    }
}

/// Index and squared distance of the point closest to `cursor`
///
/// Ties go to the lowest index, whether or not the scan runs in parallel.
pub fn nearest_point(
    points: &[ScreenPoint],
    cursor: &ScreenPoint,
    parallel: bool,
) -> Option<(usize, f32)> {
    let distance = |(index, point): (usize, &ScreenPoint)| {
        let d = screen_distance_squared(point, cursor);
        (if d.is_nan() { f32::INFINITY } else { d }, index)
    };

    let best = if parallel {
        parallel::execute_parallel(|| {
            points
                .par_iter()
                .enumerate()
                .map(distance)
                .reduce_with(closer)
        })
    } else {
        points.iter().enumerate().map(distance).reduce(closer)
    };

    best.map(|(distance_squared, index)| (index, distance_squared))
}

/// Find the vertex nearest to `cursor` within the configured threshold
pub fn pick_nearest(
    snapshot: &TransformedSnapshot,
    cursor: ScreenPoint,
    config: &PickerConfig,
) -> Option<PickHit> {
    let parallel = parallel::should_parallelize(snapshot.len(), config.parallel_min_vertices);
    let (index, distance_squared) = nearest_point(snapshot.points(), &cursor, parallel)?;

    if distance_squared >= config.threshold_px * config.threshold_px {
        return None;
    }

    Some(PickHit {
        index,
        vertex: *snapshot.vertex(index)?,
        screen: snapshot.points()[index],
        distance_squared,
        generation: snapshot.generation(),
    })
}

/// Picks vertices with a fixed configuration
#[derive(Debug, Clone, Default)]
pub struct Picker {
    config: PickerConfig,
}

impl Picker {
    pub fn new(config: PickerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PickerConfig {
        &self.config
    }

    pub fn pick(&self, snapshot: &TransformedSnapshot, cursor: ScreenPoint) -> Option<PickHit> {
        let hit = pick_nearest(snapshot, cursor, &self.config);
        tracing::trace!(?cursor, index = ?hit.map(|h| h.index), "pick");
        hit
    }
}
