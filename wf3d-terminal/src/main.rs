/// WF3D Terminal Viewer
///
/// Usage:
///   wf3d-terminal [--config viewer.json] [--scene scene.json | --stl model.stl]
///
/// Without a scene or model the built-in house scene is shown.
/// Controls:
///   - A/D: Strafe left/right
///   - W/S: Move forward/backward
///   - Left/Right Arrows: Turn
///   - Q/ESC: Quit
///
/// Logs go to stderr; set RUST_LOG (e.g. `RUST_LOG=wf3d_core=debug`) to see more.
use std::env;
use std::fs;
use std::io;

use tracing::info;
use wf3d_core::{stl, Model, Scene, Shape, ViewerConfig};
use wf3d_terminal::TerminalApp;

#[derive(Debug, Default)]
struct Args {
    config: Option<String>,
    scene: Option<String>,
    stl: Option<String>,
}

fn parse_args() -> Args {
    let mut parsed = Args::default();
    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" if i + 1 < args.len() => {
                parsed.config = Some(args[i + 1].clone());
                i += 2;
            }
            "--scene" if i + 1 < args.len() => {
                parsed.scene = Some(args[i + 1].clone());
                i += 2;
            }
            "--stl" if i + 1 < args.len() => {
                parsed.stl = Some(args[i + 1].clone());
                i += 2;
            }
            _ => i += 1,
        }
    }
    parsed
}

fn invalid(err: wf3d_core::Error) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, err.to_string())
}

fn load_scene(args: &Args) -> io::Result<Scene> {
    if let Some(path) = &args.scene {
        let data = fs::read(path)?;
        return Scene::from_json_slice(&data).map_err(invalid);
    }
    if let Some(path) = &args.stl {
        let data = fs::read(path)?;
        let mesh = stl::parse_stl(&data).map_err(invalid)?;
        info!(
            path = %path,
            vertices = mesh.vertices.len(),
            segments = mesh.segment_count(),
            "loaded STL"
        );
        let model = Model::new(Shape::Generic(mesh)).map_err(invalid)?;
        return Ok(Scene::framing(model));
    }
    Ok(Scene::house())
}

fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(io::stderr)
        .init();

    let args = parse_args();
    let config = match &args.config {
        Some(path) => ViewerConfig::from_file(path).map_err(invalid)?,
        None => ViewerConfig::default(),
    };
    let scene = load_scene(&args)?;
    info!(models = scene.models.len(), "starting terminal viewer");

    let mut app = TerminalApp::new(scene, &config)?;
    app.run()
}
