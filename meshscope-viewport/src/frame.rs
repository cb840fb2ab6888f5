//! Frame assembly: the 2D line list a renderer draws for one snapshot
//!
//! A [`Frame`] is built entirely from one installed [`TransformedSnapshot`]:
//! the model wireframe, the highlighted-vertex cross and the axis indicator
//! all use that snapshot's corrected transform. Segments are `Pod` so a GPU
//! renderer can upload them with `bytemuck::cast_slice`.

use crate::pipeline::{TransformedSnapshot, Viewport};
use bytemuck::{Pod, Zeroable};
use meshscope_core::{Point3f, ScreenPoint, Vector3f, ViewTransform};
use serde::{Deserialize, Serialize};

/// How a segment should be stroked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineStyle {
    Edge,
    Highlight,
    AxisX,
    AxisY,
    AxisZ,
}

impl LineStyle {
    /// Default RGBA color for the style
    pub fn color(self) -> [f32; 4] {
        match self {
            LineStyle::Edge => [1.0, 1.0, 1.0, 1.0],
            LineStyle::Highlight => [1.0, 1.0, 0.0, 1.0],
            LineStyle::AxisX => [1.0, 0.0, 0.0, 1.0],
            LineStyle::AxisY => [0.0, 0.5, 0.0, 1.0],
            LineStyle::AxisZ => [0.0, 0.0, 1.0, 1.0],
        }
    }
}

/// A screen-space line segment
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct LineSegment {
    pub start: [f32; 2],
    pub end: [f32; 2],
}

impl LineSegment {
    pub fn new(start: ScreenPoint, end: ScreenPoint) -> Self {
        Self {
            start: [start.x, start.y],
            end: [end.x, end.y],
        }
    }

    pub fn start(&self) -> ScreenPoint {
        ScreenPoint::new(self.start[0], self.start[1])
    }

    pub fn end(&self) -> ScreenPoint {
        ScreenPoint::new(self.end[0], self.end[1])
    }
}

/// Text anchored at a screen position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLabel {
    pub text: String,
    pub position: [f32; 2],
}

/// One direction line of the axis indicator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisLine {
    pub style: LineStyle,
    pub segment: LineSegment,
}

/// Frame layout options
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameConfig {
    /// Half the width of the highlight cross in pixels
    pub highlight_half_size: f32,
    /// Length of each axis indicator line; also its inset from the corner
    pub axis_length: f32,
}

impl FrameConfig {
    pub fn with_highlight_half_size(mut self, half_size: f32) -> Self {
        self.highlight_half_size = half_size;
        self
    }

    pub fn with_axis_length(mut self, length: f32) -> Self {
        self.axis_length = length;
        self
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            highlight_half_size: 5.0,
            axis_length: 50.0,
        }
    }
}

/// Everything needed to draw one frame
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Generation of the snapshot the frame was built from
    pub generation: u64,
    pub viewport: Viewport,
    /// Three edges per triangle, in triangle order
    pub edges: Vec<LineSegment>,
    /// The two strokes of the highlight cross, if a vertex is highlighted
    pub highlight: Vec<LineSegment>,
    pub axes: Vec<AxisLine>,
    pub labels: Vec<TextLabel>,
}

impl Frame {
    /// All segments with their styles, edges first
    pub fn lines(&self) -> impl Iterator<Item = (LineStyle, &LineSegment)> + '_ {
        self.edges
            .iter()
            .map(|segment| (LineStyle::Edge, segment))
            .chain(self.highlight.iter().map(|segment| (LineStyle::Highlight, segment)))
            .chain(self.axes.iter().map(|axis| (axis.style, &axis.segment)))
    }

    pub fn line_count(&self) -> usize {
        self.edges.len() + self.highlight.len() + self.axes.len()
    }
}

/// Build the drawable frame for a snapshot
///
/// `highlight` is a model-space vertex; it is re-projected with the
/// snapshot's transform so the cross follows the camera.
pub fn build_frame(
    snapshot: &TransformedSnapshot,
    highlight: Option<&Point3f>,
    config: &FrameConfig,
) -> Frame {
    let points = snapshot.points();
    let edges = match snapshot.model() {
        Some(model) => model
            .edges()
            .map(|(a, b)| LineSegment::new(points[a], points[b]))
            .collect(),
        None => Vec::new(),
    };

    let highlight = highlight
        .map(|vertex| highlight_cross(snapshot.transform().project(vertex), config.highlight_half_size))
        .unwrap_or_default();

    let (axes, labels) = axis_indicator(snapshot.transform(), snapshot.viewport(), config.axis_length);

    tracing::trace!(
        generation = snapshot.generation(),
        edges = edges.len(),
        "frame built"
    );

    Frame {
        generation: snapshot.generation(),
        viewport: snapshot.viewport(),
        edges,
        highlight,
        axes,
        labels,
    }
}

fn highlight_cross(center: ScreenPoint, half_size: f32) -> Vec<LineSegment> {
    vec![
        LineSegment::new(
            ScreenPoint::new(center.x - half_size, center.y - half_size),
            ScreenPoint::new(center.x + half_size, center.y + half_size),
        ),
        LineSegment::new(
            ScreenPoint::new(center.x - half_size, center.y + half_size),
            ScreenPoint::new(center.x + half_size, center.y - half_size),
        ),
    ]
}

fn axis_indicator(
    transform: &ViewTransform,
    viewport: Viewport,
    length: f32,
) -> (Vec<AxisLine>, Vec<TextLabel>) {
    let anchor = ScreenPoint::new(length, viewport.height - length);
    let origin = transform.transform_point(&Point3f::origin());
    let mut axes = Vec::with_capacity(3);
    let mut labels = Vec::with_capacity(3);

    for (style, text, unit) in [
        (LineStyle::AxisX, "X", Vector3f::x()),
        (LineStyle::AxisY, "Y", Vector3f::y()),
        (LineStyle::AxisZ, "Z", Vector3f::z()),
    ] {
        // Direction keeps its depth component, so axes pointing at the
        // viewer draw shorter
        let direction = transform.transform_point(&Point3f::from(unit)) - origin;
        let Some(direction) = direction.try_normalize(f32::EPSILON) else {
            continue;
        };
        let end = ScreenPoint::new(
            anchor.x + direction.x * length,
            anchor.y + direction.y * length,
        );

        axes.push(AxisLine {
            style,
            segment: LineSegment::new(anchor, end),
        });
        labels.push(TextLabel {
            text: text.to_string(),
            position: [end.x, end.y],
        });
    }

    (axes, labels)
}
