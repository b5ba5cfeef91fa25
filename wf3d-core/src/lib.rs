//! WF3D Core Library - Wireframe view pipeline
//!
//! Builds parallel and perspective normalizing transforms, clips model edges
//! against the canonical view volume and projects what survives to device
//! coordinates. Drawing itself is left to a [`LineDrawer`].

pub mod camera;
pub mod clip;
pub mod config;
pub mod error;
pub mod geometry;
pub mod pipeline;
pub mod projection;
pub mod scene;
pub mod solids;
pub mod stl;
pub mod transform;

// Re-export commonly used types
pub use camera::{CameraController, NavCommand};
pub use clip::{ClipVolume, Line, Outcode};
pub use config::ViewerConfig;
pub use error::{Error, Result};
pub use geometry::{Animation, Mesh, MeshGenerator, Model, Shape};
pub use pipeline::{FrameStats, LineDrawer, RenderContext, Viewport};
pub use projection::{ClipWindow, Projection, ProjectionKind, ViewSpec};
pub use scene::Scene;
pub use solids::{Cone, Cube, Cylinder, Sphere};
pub use transform::{Axis, Mat4, Transform, Vec3, Vec4};
