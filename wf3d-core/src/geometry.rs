/// Wireframe meshes and the models that own them
use std::f64::consts::TAU;

use crate::error::{Error, Result};
use crate::solids::{Cone, Cube, Cylinder, Sphere};
use crate::transform::{Axis, Mat4, Transform, Vec3, Vec4};

/// Vertices plus polylines over them.
///
/// Each edge list is a sequence of vertex indices; consecutive pairs form
/// line segments, and a list whose first and last index match is closed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vec4>,
    pub edges: Vec<Vec<usize>>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertices: usize, edges: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertices),
            edges: Vec::with_capacity(edges),
        }
    }

    /// Append a point and return its index
    pub fn add_vertex(&mut self, x: f64, y: f64, z: f64) -> usize {
        self.vertices.push(Vec4::new(x, y, z, 1.0));
        self.vertices.len() - 1
    }

    pub fn add_edge(&mut self, indices: Vec<usize>) {
        self.edges.push(indices);
    }

    /// Add `indices` as a closed loop
    pub fn add_loop(&mut self, indices: &[usize]) {
        let mut edge = indices.to_vec();
        if let Some(&first) = indices.first() {
            edge.push(first);
        }
        self.edges.push(edge);
    }

    /// Every segment as a pair of vertex indices
    pub fn segments(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.edges
            .iter()
            .flat_map(|edge| edge.windows(2).map(|pair| (pair[0], pair[1])))
    }

    pub fn segment_count(&self) -> usize {
        self.edges.iter().map(|e| e.len().saturating_sub(1)).sum()
    }

    /// Check that every edge index refers to an existing vertex
    pub fn validate(&self) -> Result<()> {
        let count = self.vertices.len();
        for (i, edge) in self.edges.iter().enumerate() {
            if let Some(bad) = edge.iter().find(|&&idx| idx >= count) {
                return Err(Error::InvalidModel(format!(
                    "edge {} refers to vertex {} but the mesh has {} vertices",
                    i, bad, count
                )));
            }
        }
        Ok(())
    }

    /// Average of the vertex positions
    pub fn centroid(&self) -> Vec3 {
        if self.vertices.is_empty() {
            return Vec3::zeros();
        }
        let sum = self
            .vertices
            .iter()
            .fold(Vec3::zeros(), |acc, v| acc + v.xyz());
        sum / self.vertices.len() as f64
    }
}

/// Producer of a wireframe mesh from shape parameters.
///
/// Implementations must be pure: identical parameters give identical meshes.
pub trait MeshGenerator {
    fn generate(&self) -> Mesh;

    /// Reject parameters that cannot produce a sensible mesh
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Point the model spins around when animated
    fn pivot(&self) -> Vec3;
}

/// Continuous spin of a model around a world axis through its pivot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Animation {
    pub axis: Axis,
    pub revolutions_per_second: f64,
}

impl Animation {
    /// Rotation angle covered in `dt` seconds
    pub fn angle(&self, dt: f64) -> f64 {
        TAU * self.revolutions_per_second * dt
    }
}

/// Geometry of a model
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Generic(Mesh),
    Cube(Cube),
    Cone(Cone),
    Cylinder(Cylinder),
    Sphere(Sphere),
}

impl Shape {
    pub fn name(&self) -> &'static str {
        match self {
            Shape::Generic(_) => "generic",
            Shape::Cube(_) => "cube",
            Shape::Cone(_) => "cone",
            Shape::Cylinder(_) => "cylinder",
            Shape::Sphere(_) => "sphere",
        }
    }

    fn build(&self) -> Result<(Mesh, Vec3)> {
        let generator: &dyn MeshGenerator = match self {
            Shape::Generic(mesh) => {
                mesh.validate()?;
                return Ok((mesh.clone(), mesh.centroid()));
            }
            Shape::Cube(g) => g,
            Shape::Cone(g) => g,
            Shape::Cylinder(g) => g,
            Shape::Sphere(g) => g,
        };
        generator.validate()?;
        Ok((generator.generate(), generator.pivot()))
    }
}

/// A shape, its derived mesh and its accumulated rotation
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    shape: Shape,
    mesh: Mesh,
    pivot: Vec3,
    matrix: Mat4,
    animation: Option<Animation>,
}

impl Model {
    pub fn new(shape: Shape) -> Result<Self> {
        let (mesh, pivot) = shape.build()?;
        Ok(Self {
            shape,
            mesh,
            pivot,
            matrix: Mat4::identity(),
            animation: None,
        })
    }

    pub fn with_animation(mut self, animation: Animation) -> Self {
        self.animation = Some(animation);
        self
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    #[cfg(test)]
    pub(crate) fn mesh_mut(&mut self) -> &mut Mesh {
        &mut self.mesh
    }

    /// Accumulated model transform
    pub fn matrix(&self) -> &Mat4 {
        &self.matrix
    }

    pub fn animation(&self) -> Option<&Animation> {
        self.animation.as_ref()
    }

    pub fn set_animation(&mut self, animation: Option<Animation>) {
        self.animation = animation;
    }

    /// Replace the shape and regenerate the mesh. The model is left
    /// untouched if the new shape is invalid.
    pub fn set_shape(&mut self, shape: Shape) -> Result<()> {
        let (mesh, pivot) = shape.build()?;
        self.shape = shape;
        self.mesh = mesh;
        self.pivot = pivot;
        Ok(())
    }

    pub fn reset_rotation(&mut self) {
        self.matrix = Mat4::identity();
    }

    /// Advance the animation by `dt` seconds
    pub fn animate(&mut self, dt: f64) {
        let Some(animation) = self.animation else {
            return;
        };
        let p = &self.pivot;
        let spin = Transform::chain(&[
            Transform::translation(p.x, p.y, p.z),
            Transform::rotation(animation.axis, animation.angle(dt)),
            Transform::translation(-p.x, -p.y, -p.z),
        ]);
        self.matrix = spin * self.matrix;
    }
}
