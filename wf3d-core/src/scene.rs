//! Scenes and the JSON scene description format.
//!
//! A scene document looks like:
//!
//! ```json
//! {
//!   "view": {
//!     "type": "perspective",
//!     "prp": [0, 10, -5], "srp": [20, 15, -40], "vup": [1, 1, 0],
//!     "clip": [-12, 6, -12, 6, 10, 100]
//!   },
//!   "models": [
//!     { "type": "generic", "vertices": [[0, 0, -30], [20, 0, -30]], "edges": [[0, 1]] },
//!     { "type": "cube", "center": [0, 0, -50], "width": 8, "height": 8, "depth": 8,
//!       "animation": { "axis": "y", "rps": 0.5 } }
//!   ]
//! }
//! ```
//!
//! Parsing is all-or-nothing: the document is fully validated before a
//! [`Scene`] is built from it.

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::geometry::{Animation, Mesh, Model, Shape};
use crate::projection::{Projection, ProjectionKind, ViewSpec};
use crate::solids::{Cone, Cube, Cylinder, Sphere};
use crate::transform::{Axis, Vec3, Vec4};

/// Camera plus models
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub view: ViewSpec,
    pub models: Vec<Model>,
}

impl Scene {
    pub fn new(view: ViewSpec) -> Self {
        Self {
            view,
            models: Vec::new(),
        }
    }

    pub fn with_model(mut self, model: Model) -> Self {
        self.models.push(model);
        self
    }

    /// Parse and validate a scene document
    pub fn from_json_str(s: &str) -> Result<Self> {
        let doc: SceneDoc = serde_json::from_str(s)?;
        let scene = Scene::try_from(doc)?;
        info!(
            models = scene.models.len(),
            kind = ?scene.view.kind,
            "loaded scene"
        );
        Ok(scene)
    }

    pub fn from_json_slice(data: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(data)
            .map_err(|e| Error::SceneFormat(format!("scene is not UTF-8: {}", e)))?;
        Self::from_json_str(text)
    }

    /// Advance every animated model by `dt` seconds
    pub fn animate(&mut self, dt: f64) {
        for model in &mut self.models {
            model.animate(dt);
        }
    }

    /// A house-shaped prism seen through an off-center perspective window
    pub fn house() -> Self {
        let view = ViewSpec {
            kind: ProjectionKind::Perspective,
            prp: Vec3::new(44.0, 20.0, -16.0),
            srp: Vec3::new(20.0, 20.0, -40.0),
            vup: Vec3::new(0.0, 1.0, 0.0),
            clip: [-19.0, 5.0, -10.0, 8.0, 12.0, 100.0].into(),
        };

        let mut mesh = Mesh::with_capacity(10, 7);
        let outline = [(0.0, 0.0), (20.0, 0.0), (20.0, 12.0), (10.0, 20.0), (0.0, 12.0)];
        let front: Vec<usize> = outline
            .iter()
            .map(|&(x, y)| mesh.add_vertex(x, y, -30.0))
            .collect();
        let back: Vec<usize> = outline
            .iter()
            .map(|&(x, y)| mesh.add_vertex(x, y, -60.0))
            .collect();
        mesh.add_loop(&front);
        mesh.add_loop(&back);
        for (f, b) in front.into_iter().zip(back) {
            mesh.add_edge(vec![f, b]);
        }

        match Model::new(Shape::Generic(mesh)) {
            Ok(model) => Scene::new(view).with_model(model),
            Err(err) => {
                warn!("{err}; house scene has no model");
                Scene::new(view)
            }
        }
    }
}

impl Scene {
    /// Perspective view looking down -z at a single model, backed off far
    /// enough that the whole mesh fits the window
    pub fn framing(model: Model) -> Self {
        let mesh = model.mesh();
        let center = mesh.centroid();
        let radius = mesh
            .vertices
            .iter()
            .map(|v| (v.xyz() - center).norm())
            .fold(0.0, f64::max)
            .max(1.0);
        let half = 0.5 * radius;
        let view = ViewSpec {
            kind: ProjectionKind::Perspective,
            prp: center + Vec3::new(0.0, 0.0, 3.0 * radius),
            srp: center,
            vup: Vec3::y(),
            clip: [-half, half, -half, half, radius, 5.0 * radius].into(),
        };
        Scene::new(view).with_model(model)
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::house()
    }
}

#[derive(Debug, Deserialize)]
struct SceneDoc {
    view: ViewDoc,
    #[serde(default)]
    models: Vec<ModelDoc>,
}

#[derive(Debug, Deserialize)]
struct ViewDoc {
    #[serde(rename = "type")]
    kind: ProjectionKind,
    prp: [f64; 3],
    srp: [f64; 3],
    vup: [f64; 3],
    clip: [f64; 6],
}

#[derive(Debug, Deserialize)]
struct AnimationDoc {
    axis: Axis,
    rps: f64,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ModelDoc {
    Generic {
        vertices: Vec<Vec<f64>>,
        edges: Vec<Vec<usize>>,
        animation: Option<AnimationDoc>,
    },
    Cube {
        center: [f64; 3],
        width: f64,
        height: f64,
        depth: f64,
        animation: Option<AnimationDoc>,
    },
    Cone {
        center: [f64; 3],
        radius: f64,
        height: f64,
        sides: usize,
        animation: Option<AnimationDoc>,
    },
    Cylinder {
        center: [f64; 3],
        radius: f64,
        height: f64,
        sides: usize,
        animation: Option<AnimationDoc>,
    },
    Sphere {
        center: [f64; 3],
        radius: f64,
        slices: usize,
        stacks: usize,
        animation: Option<AnimationDoc>,
    },
}

fn vec3(v: [f64; 3]) -> Vec3 {
    Vec3::new(v[0], v[1], v[2])
}

fn vertex(index: usize, v: &[f64]) -> Result<Vec4> {
    match *v {
        [x, y, z] => Ok(Vec4::new(x, y, z, 1.0)),
        [x, y, z, w] => Ok(Vec4::new(x, y, z, w)),
        _ => Err(Error::SceneFormat(format!(
            "vertex {} has {} components, expected 3 or 4",
            index,
            v.len()
        ))),
    }
}

impl TryFrom<ViewDoc> for ViewSpec {
    type Error = Error;

    fn try_from(doc: ViewDoc) -> Result<Self> {
        let view = ViewSpec {
            kind: doc.kind,
            prp: vec3(doc.prp),
            srp: vec3(doc.srp),
            vup: vec3(doc.vup),
            clip: doc.clip.into(),
        };
        // reject views the pipeline could never render
        Projection::new(&view)?;
        Ok(view)
    }
}

impl TryFrom<ModelDoc> for Model {
    type Error = Error;

    fn try_from(doc: ModelDoc) -> Result<Self> {
        let (shape, animation) = match doc {
            ModelDoc::Generic { vertices, edges, animation } => {
                let vertices = vertices
                    .iter()
                    .enumerate()
                    .map(|(i, v)| vertex(i, v))
                    .collect::<Result<Vec<_>>>()?;
                (Shape::Generic(Mesh { vertices, edges }), animation)
            }
            ModelDoc::Cube { center, width, height, depth, animation } => (
                Shape::Cube(Cube { center: vec3(center), width, height, depth }),
                animation,
            ),
            ModelDoc::Cone { center, radius, height, sides, animation } => (
                Shape::Cone(Cone { center: vec3(center), radius, height, sides }),
                animation,
            ),
            ModelDoc::Cylinder { center, radius, height, sides, animation } => (
                Shape::Cylinder(Cylinder { center: vec3(center), radius, height, sides }),
                animation,
            ),
            ModelDoc::Sphere { center, radius, slices, stacks, animation } => (
                Shape::Sphere(Sphere { center: vec3(center), radius, slices, stacks }),
                animation,
            ),
        };

        let mut model = Model::new(shape)?;
        if let Some(a) = animation {
            if !a.rps.is_finite() {
                return Err(Error::SceneFormat(format!(
                    "animation speed must be finite, got {}",
                    a.rps
                )));
            }
            model.set_animation(Some(Animation {
                axis: a.axis,
                revolutions_per_second: a.rps,
            }));
        }
        Ok(model)
    }
}

impl TryFrom<SceneDoc> for Scene {
    type Error = Error;

    fn try_from(doc: SceneDoc) -> Result<Self> {
        let view = ViewSpec::try_from(doc.view)?;
        let models = doc
            .models
            .into_iter()
            .enumerate()
            .map(|(i, m)| {
                Model::try_from(m).map_err(|e| Error::SceneFormat(format!("model {}: {}", i, e)))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Scene { view, models })
    }
}
