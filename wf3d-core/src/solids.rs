//! Parametric primitives: cube, cone, cylinder and sphere.
//!
//! All generators build y-up wireframes: rings lie parallel to the xz-plane
//! and every ring is a closed edge loop.

use std::f64::consts::{PI, TAU};

use crate::error::{Error, Result};
use crate::geometry::{Mesh, MeshGenerator};
use crate::transform::Vec3;

fn check_positive(shape: &str, name: &str, value: f64) -> Result<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(Error::InvalidModel(format!(
            "{} {} must be positive, got {}",
            shape, name, value
        )))
    }
}

fn check_count(shape: &str, name: &str, value: usize, min: usize) -> Result<()> {
    if value >= min {
        Ok(())
    } else {
        Err(Error::InvalidModel(format!(
            "{} needs at least {} {}, got {}",
            shape, min, name, value
        )))
    }
}

/// Points evenly spaced on a horizontal circle, starting on the +x side
fn ring(mesh: &mut Mesh, center: &Vec3, radius: f64, y: f64, sides: usize) -> Vec<usize> {
    (0..sides)
        .map(|i| {
            let theta = TAU * i as f64 / sides as f64;
            mesh.add_vertex(
                center.x + radius * theta.cos(),
                y,
                center.z + radius * theta.sin(),
            )
        })
        .collect()
}

/// Axis-aligned box centered on `center`
#[derive(Debug, Clone, PartialEq)]
pub struct Cube {
    pub center: Vec3,
    pub width: f64,
    pub height: f64,
    pub depth: f64,
}

impl MeshGenerator for Cube {
    fn generate(&self) -> Mesh {
        let (hw, hh, hd) = (self.width / 2.0, self.height / 2.0, self.depth / 2.0);
        let c = &self.center;
        let mut mesh = Mesh::with_capacity(8, 6);

        let mut face = |z: f64| {
            [(-hw, -hh), (hw, -hh), (hw, hh), (-hw, hh)]
                .map(|(dx, dy)| mesh.add_vertex(c.x + dx, c.y + dy, z))
        };
        let front = face(c.z + hd);
        let back = face(c.z - hd);

        mesh.add_loop(&front);
        mesh.add_loop(&back);
        for (f, b) in front.iter().zip(&back) {
            mesh.add_edge(vec![*f, *b]);
        }
        mesh
    }

    fn validate(&self) -> Result<()> {
        check_positive("cube", "width", self.width)?;
        check_positive("cube", "height", self.height)?;
        check_positive("cube", "depth", self.depth)
    }

    fn pivot(&self) -> Vec3 {
        self.center
    }
}

/// Cone standing on a base circle centered on `center`
#[derive(Debug, Clone, PartialEq)]
pub struct Cone {
    pub center: Vec3,
    pub radius: f64,
    pub height: f64,
    pub sides: usize,
}

impl MeshGenerator for Cone {
    fn generate(&self) -> Mesh {
        let mut mesh = Mesh::with_capacity(self.sides + 1, self.sides + 1);
        let base = ring(&mut mesh, &self.center, self.radius, self.center.y, self.sides);
        let apex = mesh.add_vertex(self.center.x, self.center.y + self.height, self.center.z);

        mesh.add_loop(&base);
        for b in base {
            mesh.add_edge(vec![b, apex]);
        }
        mesh
    }

    fn validate(&self) -> Result<()> {
        check_positive("cone", "radius", self.radius)?;
        check_positive("cone", "height", self.height)?;
        check_count("cone", "sides", self.sides, 3)
    }

    fn pivot(&self) -> Vec3 {
        self.center + Vec3::new(0.0, self.height / 2.0, 0.0)
    }
}

/// Upright cylinder centered on `center`
#[derive(Debug, Clone, PartialEq)]
pub struct Cylinder {
    pub center: Vec3,
    pub radius: f64,
    pub height: f64,
    pub sides: usize,
}

impl MeshGenerator for Cylinder {
    fn generate(&self) -> Mesh {
        let half = self.height / 2.0;
        let mut mesh = Mesh::with_capacity(2 * self.sides, self.sides + 2);
        let bottom = ring(&mut mesh, &self.center, self.radius, self.center.y - half, self.sides);
        let top = ring(&mut mesh, &self.center, self.radius, self.center.y + half, self.sides);

        mesh.add_loop(&bottom);
        mesh.add_loop(&top);
        for (b, t) in bottom.into_iter().zip(top) {
            mesh.add_edge(vec![b, t]);
        }
        mesh
    }

    fn validate(&self) -> Result<()> {
        check_positive("cylinder", "radius", self.radius)?;
        check_positive("cylinder", "height", self.height)?;
        check_count("cylinder", "sides", self.sides, 3)
    }

    fn pivot(&self) -> Vec3 {
        self.center
    }
}

/// UV sphere: `stacks` bands from pole to pole, `slices` meridians
#[derive(Debug, Clone, PartialEq)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f64,
    pub slices: usize,
    pub stacks: usize,
}

impl MeshGenerator for Sphere {
    fn generate(&self) -> Mesh {
        let c = &self.center;
        let r = self.radius;
        let rings = self.stacks.saturating_sub(1);
        let mut mesh = Mesh::with_capacity(2 + rings * self.slices, rings + self.slices);

        let north = mesh.add_vertex(c.x, c.y + r, c.z);
        let latitudes: Vec<Vec<usize>> = (1..self.stacks)
            .map(|k| {
                let phi = PI * k as f64 / self.stacks as f64;
                ring(&mut mesh, c, r * phi.sin(), c.y + r * phi.cos(), self.slices)
            })
            .collect();
        let south = mesh.add_vertex(c.x, c.y - r, c.z);

        for latitude in &latitudes {
            mesh.add_loop(latitude);
        }
        for j in 0..self.slices {
            let mut meridian = Vec::with_capacity(self.stacks + 1);
            meridian.push(north);
            meridian.extend(latitudes.iter().map(|latitude| latitude[j]));
            meridian.push(south);
            mesh.add_edge(meridian);
        }
        mesh
    }

    fn validate(&self) -> Result<()> {
        check_positive("sphere", "radius", self.radius)?;
        check_count("sphere", "slices", self.slices, 3)?;
        check_count("sphere", "stacks", self.stacks, 2)
    }

    fn pivot(&self) -> Vec3 {
        self.center
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Vec3 {
        Vec3::new(1.0, 2.0, 3.0)
    }

    #[test]
    fn test_cube_counts_and_extent() {
        let cube = Cube {
            center: origin(),
            width: 2.0,
            height: 4.0,
            depth: 6.0,
        };
        let mesh = cube.generate();
        assert_eq!(mesh.vertices.len(), 8);
        assert_eq!(mesh.segment_count(), 12);
        mesh.validate().unwrap();
        for v in &mesh.vertices {
            assert_eq!((v.x - 1.0).abs(), 1.0);
            assert_eq!((v.y - 2.0).abs(), 2.0);
            assert_eq!((v.z - 3.0).abs(), 3.0);
        }
    }

    #[test]
    fn test_cone_counts() {
        let cone = Cone {
            center: origin(),
            radius: 1.0,
            height: 3.0,
            sides: 8,
        };
        let mesh = cone.generate();
        assert_eq!(mesh.vertices.len(), 9);
        assert_eq!(mesh.segment_count(), 16);
        let apex = mesh.vertices[8];
        assert_eq!((apex.x, apex.y, apex.z), (1.0, 5.0, 3.0));
        assert!((cone.pivot() - Vec3::new(1.0, 3.5, 3.0)).norm() < 1e-12);
    }

    #[test]
    fn test_cylinder_rings_on_radius() {
        let cylinder = Cylinder {
            center: origin(),
            radius: 2.0,
            height: 1.0,
            sides: 6,
        };
        let mesh = cylinder.generate();
        assert_eq!(mesh.vertices.len(), 12);
        assert_eq!(mesh.segment_count(), 18);
        for v in &mesh.vertices {
            let d = ((v.x - 1.0).powi(2) + (v.z - 3.0).powi(2)).sqrt();
            assert!((d - 2.0).abs() < 1e-12);
            assert!(((v.y - 2.0).abs() - 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn test_sphere_vertices_on_surface() {
        let sphere = Sphere {
            center: origin(),
            radius: 2.5,
            slices: 8,
            stacks: 4,
        };
        let mesh = sphere.generate();
        assert_eq!(mesh.vertices.len(), 2 + 3 * 8);
        // three latitude loops of 8 segments, eight meridians of 4 segments
        assert_eq!(mesh.segment_count(), 3 * 8 + 8 * 4);
        mesh.validate().unwrap();
        for v in &mesh.vertices {
            assert!(((v.xyz() - origin()).norm() - 2.5).abs() < 1e-12);
        }
    }

    #[test]
    fn test_generators_are_deterministic() {
        let sphere = Sphere {
            center: origin(),
            radius: 1.0,
            slices: 5,
            stacks: 3,
        };
        assert_eq!(sphere.generate(), sphere.generate());
    }

    #[test]
    fn test_invalid_parameters() {
        let cube = Cube {
            center: origin(),
            width: 0.0,
            height: 1.0,
            depth: 1.0,
        };
        assert!(cube.validate().is_err());
        let sphere = Sphere {
            center: origin(),
            radius: 1.0,
            slices: 8,
            stacks: 1,
        };
        assert!(sphere.validate().is_err());
        let cylinder = Cylinder {
            center: origin(),
            radius: -1.0,
            height: 1.0,
            sides: 8,
        };
        assert!(cylinder.validate().is_err());
    }
}
