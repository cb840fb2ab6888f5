//! Measurement demo for meshscope
//!
//! Loads a mesh (or a built-in tetrahedron), orbits the camera a little,
//! then runs a distance or angle measurement by "clicking" the requested
//! vertices through the same pointer events a UI would send.
//!
//! ```text
//! RUST_LOG=debug cargo run --bin measure_demo -- --measure angle --vertices 0 1 2
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use meshscope_core::{Model, Point3f, ScreenPoint};
use meshscope_interaction::{
    PointerButton, PointerEvent, SequencerState, SessionConfig, ViewportSession,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Measure {
    Distance,
    Angle,
}

#[derive(Debug, Parser)]
#[command(name = "measure_demo", about = "Pick vertices and measure them")]
struct Args {
    /// STL or OBJ file to load; a tetrahedron is used when omitted
    #[arg(long)]
    model: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "distance")]
    measure: Measure,

    /// Vertex indices to pick, in order
    #[arg(long, num_args = 1.., default_values_t = [0usize, 1, 2])]
    vertices: Vec<usize>,

    #[arg(long, default_value_t = 800.0)]
    width: f32,

    #[arg(long, default_value_t = 600.0)]
    height: f32,

    /// Horizontal drag in pixels applied with the rotate button before picking
    #[arg(long, default_value_t = 40.0)]
    orbit: f32,
}

fn tetrahedron() -> Result<Model> {
    Ok(Model::new(
        vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(3.0, 0.0, 0.0),
            Point3f::new(0.0, 4.0, 0.0),
            Point3f::new(0.0, 0.0, 5.0),
        ],
        vec![[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]],
    )?)
}

fn orbit(session: &ViewportSession, distance: f32) -> Result<()> {
    let start = ScreenPoint::new(0.0, 0.0);
    session.handle_event(PointerEvent::Pressed {
        button: PointerButton::Right,
        position: start,
    })?;
    session.handle_event(PointerEvent::Moved { position: start })?;
    session.handle_event(PointerEvent::Moved {
        position: ScreenPoint::new(distance, 0.0),
    })?;
    session.handle_event(PointerEvent::Released {
        button: PointerButton::Right,
        position: ScreenPoint::new(distance, 0.0),
    })?;
    Ok(())
}

async fn click_vertex(session: &ViewportSession, index: usize) -> Result<()> {
    while session.interaction_state() != SequencerState::AwaitingPoint {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    while !session.pipeline().is_current() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    let position = *session
        .pipeline()
        .snapshot()
        .points()
        .get(index)
        .with_context(|| format!("model has no vertex {}", index))?;
    tracing::info!(index, x = position.x, y = position.y, status = %session.status(), "clicking vertex");

    session.handle_event(PointerEvent::Moved { position })?;
    session.handle_event(PointerEvent::Pressed {
        button: PointerButton::Left,
        position,
    })?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let model = match &args.model {
        Some(path) => meshscope_io::read_model(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => tetrahedron()?,
    };

    let needed = match args.measure {
        Measure::Distance => 2,
        Measure::Angle => 3,
    };
    if args.vertices.len() < needed {
        bail!("{:?} needs {} vertices, got {}", args.measure, needed, args.vertices.len());
    }

    let session = ViewportSession::new(SessionConfig::default().with_viewport(args.width, args.height));
    session.load_model(model);
    orbit(&session, args.orbit)?;

    let status = match args.measure {
        Measure::Distance => {
            let command = tokio::spawn(session.begin_measure_distance());
            for &index in &args.vertices[..needed] {
                click_vertex(&session, index).await?;
            }
            let measurement = command.await??;
            tracing::info!(distance = measurement.distance, "distance measured");
            measurement.status()
        }
        Measure::Angle => {
            let command = tokio::spawn(session.begin_measure_angle());
            for &index in &args.vertices[..needed] {
                click_vertex(&session, index).await?;
            }
            command.await??.status()
        }
    };
    println!("{}", status);

    let frame = session.frame();
    if let Some(stats) = session.last_frame_stats() {
        println!(
            "frame {}: {} lines in {:?} ({:.0} fps)",
            stats.generation,
            frame.line_count(),
            stats.elapsed,
            stats.fps
        );
    }

    Ok(())
}
