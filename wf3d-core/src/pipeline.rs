//! Per-frame orchestration: transform, clip, project, draw.

use tracing::{debug, warn};

use crate::camera::{CameraController, NavCommand};
use crate::clip::{ClipVolume, Line};
use crate::config::ViewerConfig;
use crate::error::Result;
use crate::geometry::Model;
use crate::projection::Projection;
use crate::scene::Scene;
use crate::transform::{unpack_batch, vertex_batch, Mat4, Transform, Vec4};

/// Sink for visible 2D segments, in device coordinates with the origin at
/// the bottom-left corner of the drawing surface.
pub trait LineDrawer {
    fn draw_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64);
}

/// Size of the drawing surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Maps [-1,1] x [-1,1] onto [0,width] x [0,height]
    pub fn matrix(&self) -> Mat4 {
        let (hw, hh) = (self.width / 2.0, self.height / 2.0);
        Mat4::new(
            hw, 0.0, 0.0, hw,
            0.0, hh, 0.0, hh,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }
}

/// Segment counts for one rendered frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Segments handed to the drawer
    pub drawn: usize,
    /// Drawn segments that had to be shortened first
    pub clipped: usize,
    /// Segments entirely outside the view volume
    pub rejected: usize,
    /// Segments dropped because of bad indices or numeric faults
    pub skipped: usize,
}

/// Everything a frame needs: the scene, the surface, and how the camera moves
#[derive(Debug, Clone)]
pub struct RenderContext {
    scene: Scene,
    viewport: Viewport,
    camera: CameraController,
}

impl RenderContext {
    pub fn new(scene: Scene, viewport: Viewport) -> Self {
        Self {
            scene,
            viewport,
            camera: CameraController::default(),
        }
    }

    pub fn with_config(scene: Scene, config: &ViewerConfig) -> Self {
        Self {
            scene,
            viewport: Viewport::new(config.width as f64, config.height as f64),
            camera: config.camera(),
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn camera(&self) -> &CameraController {
        &self.camera
    }

    /// Swap in a new scene wholesale
    pub fn replace_scene(&mut self, scene: Scene) -> Scene {
        std::mem::replace(&mut self.scene, scene)
    }

    /// Parse a scene document and make it current. On error the current
    /// scene is kept unchanged.
    pub fn load_scene_json(&mut self, json: &str) -> Result<()> {
        match Scene::from_json_str(json) {
            Ok(scene) => {
                self.scene = scene;
                Ok(())
            }
            Err(err) => {
                warn!("{err}; keeping the current scene");
                Err(err)
            }
        }
    }

    /// One frame: advance animations by `dt` seconds, then render
    pub fn tick(&mut self, dt: f64, drawer: &mut impl LineDrawer) -> Result<FrameStats> {
        self.scene.animate(dt);
        self.render(drawer)
    }

    /// Move the camera and render the result
    pub fn navigate(
        &mut self,
        command: NavCommand,
        drawer: &mut impl LineDrawer,
    ) -> Result<FrameStats> {
        self.camera.apply(&mut self.scene.view, command)?;
        self.render(drawer)
    }

    /// Draw every visible part of every model edge.
    ///
    /// Fails only if no projection can be built for the current view; faults
    /// in single edges skip that edge and the rest of the frame still renders.
    pub fn render(&self, drawer: &mut impl LineDrawer) -> Result<FrameStats> {
        let projection = Projection::new(&self.scene.view).map_err(|err| {
            warn!("{err}; frame not rendered");
            err
        })?;
        let volume = projection.clip_volume();
        let to_screen = self.viewport.matrix() * projection.m;

        let mut stats = FrameStats::default();
        for (index, model) in self.scene.models.iter().enumerate() {
            render_model(index, model, &projection.n, volume, &to_screen, drawer, &mut stats);
        }
        debug!(
            drawn = stats.drawn,
            clipped = stats.clipped,
            rejected = stats.rejected,
            skipped = stats.skipped,
            "frame rendered"
        );
        Ok(stats)
    }
}

fn render_model(
    index: usize,
    model: &Model,
    n: &Mat4,
    volume: ClipVolume,
    to_screen: &Mat4,
    drawer: &mut impl LineDrawer,
    stats: &mut FrameStats,
) {
    let mesh = model.mesh();
    let transform = Transform::to_dynamic(&(n * model.matrix()));
    let batch = vertex_batch(&mesh.vertices);
    let vertices = match Transform::multiply(&[&transform, &batch]) {
        Ok(product) => unpack_batch(&product),
        Err(err) => {
            warn!(model = index, "{err}; skipping model");
            stats.skipped += mesh.segment_count();
            return;
        }
    };

    for (a, b) in mesh.segments() {
        let (Some(p0), Some(p1)) = (vertices.get(a), vertices.get(b)) else {
            warn!(model = index, a, b, "edge refers to a missing vertex");
            stats.skipped += 1;
            continue;
        };
        let line = Line::new(*p0, *p1);
        match volume.try_clip(&line) {
            Ok(Some(visible)) => {
                let (Some((x1, y1)), Some((x2, y2))) =
                    (project(to_screen, &visible.pt0), project(to_screen, &visible.pt1))
                else {
                    warn!(model = index, ?visible, "segment projects to infinity");
                    stats.skipped += 1;
                    continue;
                };
                if visible != line {
                    stats.clipped += 1;
                }
                drawer.draw_line(x1, y1, x2, y2);
                stats.drawn += 1;
            }
            Ok(None) => stats.rejected += 1,
            Err(err) => {
                warn!(model = index, ?line, "{err}; dropping segment");
                stats.skipped += 1;
            }
        }
    }
}

/// Project a canonical-volume point to device coordinates
fn project(to_screen: &Mat4, p: &Vec4) -> Option<(f64, f64)> {
    let s = to_screen * p;
    (s.w.abs() > f64::EPSILON).then(|| (s.x / s.w, s.y / s.w))
}
