//! Distance and angle measurement commands
//!
//! Each command prompts through the [`StatusLine`], awaits picked vertices
//! from the [`InteractionSequencer`] one at a time, and finally reports its
//! result as status text.
//!
//! A command that has been superseded or cancelled stops at its next step
//! with [`Error::PointRequestAbandoned`] and writes no more status text.

use crate::sequencer::{CommandToken, InteractionSequencer};
use crate::status::StatusLine;
use meshscope_core::{Error, Point3f, Result, Vector3f};
use serde::{Deserialize, Serialize};

/// Result of a two-point distance measurement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceMeasurement {
    pub first: Point3f,
    pub second: Point3f,
    /// Per-axis absolute difference
    pub delta: Vector3f,
    pub distance: f32,
}

impl DistanceMeasurement {
    pub fn between(first: Point3f, second: Point3f) -> Self {
        let difference = second - first;
        Self {
            first,
            second,
            delta: difference.abs(),
            distance: difference.norm(),
        }
    }

    pub fn status(&self) -> String {
        format!(
            "dx: {}, dy: {}, dz: {}, dist: {}",
            self.delta.x, self.delta.y, self.delta.z, self.distance
        )
    }
}

/// Result of a fulcrum/two-endpoint angle measurement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngleMeasurement {
    pub fulcrum: Point3f,
    pub endpoints: [Point3f; 2],
    /// `None` when an endpoint coincides with the fulcrum
    pub degrees: Option<f32>,
}

impl AngleMeasurement {
    pub fn between(fulcrum: Point3f, first: Point3f, second: Point3f) -> Self {
        let v1 = first - fulcrum;
        let v2 = second - fulcrum;
        let (length1, length2) = (v1.norm(), v2.norm());

        let degrees = if length1 == 0.0 || length2 == 0.0 {
            None
        } else {
            let cosine = (v1.dot(&v2) / (length1 * length2)).clamp(-1.0, 1.0);
            Some(cosine.acos().to_degrees())
        };

        Self {
            fulcrum,
            endpoints: [first, second],
            degrees,
        }
    }

    pub fn status(&self) -> String {
        match self.degrees {
            Some(degrees) => format!("Angle: {} degrees", degrees),
            None => "Vector cannot be zero".to_string(),
        }
    }
}

fn report(
    sequencer: &InteractionSequencer,
    status: &StatusLine,
    command: CommandToken,
    text: impl Into<String>,
) -> Result<()> {
    if !sequencer.is_active(command) {
        tracing::debug!(?command, "retired command stopped");
        return Err(Error::PointRequestAbandoned);
    }
    status.set(text);
    Ok(())
}

async fn next_point(
    sequencer: &InteractionSequencer,
    status: &StatusLine,
    command: CommandToken,
    prompt: &str,
) -> Result<Point3f> {
    report(sequencer, status, command, prompt)?;
    sequencer.request_point_for(command).wait().await
}

/// Measure the distance between two picked vertices
///
/// Starts a new command on `sequencer`, abandoning the running one.
pub async fn measure_distance(
    sequencer: &InteractionSequencer,
    status: &StatusLine,
) -> Result<DistanceMeasurement> {
    measure_distance_for(sequencer.begin_command(), sequencer, status).await
}

/// Run a distance measurement as the command holding `command`
pub async fn measure_distance_for(
    command: CommandToken,
    sequencer: &InteractionSequencer,
    status: &StatusLine,
) -> Result<DistanceMeasurement> {
    let first = next_point(sequencer, status, command, "Select first point").await?;
    let second = next_point(sequencer, status, command, "Select second point").await?;

    let measurement = DistanceMeasurement::between(first, second);
    report(sequencer, status, command, measurement.status())?;
    tracing::debug!(?measurement, "distance measured");
    Ok(measurement)
}

/// Measure the angle at a picked fulcrum between two picked endpoints
///
/// Starts a new command on `sequencer`, abandoning the running one.
pub async fn measure_angle(
    sequencer: &InteractionSequencer,
    status: &StatusLine,
) -> Result<AngleMeasurement> {
    measure_angle_for(sequencer.begin_command(), sequencer, status).await
}

/// Run an angle measurement as the command holding `command`
pub async fn measure_angle_for(
    command: CommandToken,
    sequencer: &InteractionSequencer,
    status: &StatusLine,
) -> Result<AngleMeasurement> {
    let fulcrum = next_point(sequencer, status, command, "Select angle fulcrum point").await?;
    let first = next_point(sequencer, status, command, "Select endpoint 1").await?;
    let second = next_point(sequencer, status, command, "Select endpoint 2").await?;

    let measurement = AngleMeasurement::between(fulcrum, first, second);
    report(sequencer, status, command, measurement.status())?;
    tracing::debug!(?measurement, "angle measured");
    Ok(measurement)
}
