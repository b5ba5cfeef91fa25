/// Linear algebra kernel: homogeneous vectors, 4x4 transforms and matrix chains
use nalgebra::{DMatrix, Matrix4, Rotation3, Unit, Vector3, Vector4};
use serde::Deserialize;

use crate::error::{Error, Result};

pub type Vec3 = Vector3<f64>;
pub type Vec4 = Vector4<f64>;
pub type Mat4 = Matrix4<f64>;

/// Tolerance used for degeneracy checks and clip half-space tests.
pub const EPSILON: f64 = 1e-6;

/// Lift a point into homogeneous coordinates (w = 1)
pub fn point(v: &Vec3) -> Vec4 {
    Vec4::new(v.x, v.y, v.z, 1.0)
}

/// Lift a direction into homogeneous coordinates (w = 0)
pub fn direction(v: &Vec3) -> Vec4 {
    Vec4::new(v.x, v.y, v.z, 0.0)
}

/// Normalize a 3-vector, failing when its length is below [`EPSILON`].
pub fn normalize(v: &Vec3) -> Result<Vec3> {
    v.try_normalize(EPSILON).ok_or(Error::DegenerateVector)
}

/// Normalize the (x, y, z) part of a homogeneous vector, leaving `w` as is.
pub fn normalize_xyz(v: &Vec4) -> Result<Vec4> {
    let len = v.xyz().norm();
    if len < EPSILON {
        return Err(Error::DegenerateVector);
    }
    Ok(Vec4::new(v.x / len, v.y / len, v.z / len, v.w))
}

/// World coordinate axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn unit(self) -> Vec3 {
        match self {
            Axis::X => Vec3::x(),
            Axis::Y => Vec3::y(),
            Axis::Z => Vec3::z(),
        }
    }
}

/// Constructors for 4x4 transforms.
///
/// Every function returns a fresh matrix; nothing is written in place.
pub struct Transform;

impl Transform {
    pub fn identity() -> Mat4 {
        Mat4::identity()
    }

    pub fn translation(tx: f64, ty: f64, tz: f64) -> Mat4 {
        Mat4::new_translation(&Vec3::new(tx, ty, tz))
    }

    pub fn scale(sx: f64, sy: f64, sz: f64) -> Mat4 {
        Mat4::new_nonuniform_scaling(&Vec3::new(sx, sy, sz))
    }

    /// Rotation by `theta` radians about one of the world axes
    pub fn rotation(axis: Axis, theta: f64) -> Mat4 {
        Mat4::new_rotation(axis.unit() * theta)
    }

    /// Rotation by `theta` radians about an arbitrary axis through the origin
    pub fn rotation_about(axis: &Vec3, theta: f64) -> Result<Mat4> {
        let axis = Unit::try_new(*axis, EPSILON).ok_or(Error::DegenerateVector)?;
        Ok(Rotation3::from_axis_angle(&axis, theta).to_homogeneous())
    }

    /// Shear parallel to the xy-plane: x' = x + shx*z, y' = y + shy*z
    pub fn shear_xy(shx: f64, shy: f64) -> Mat4 {
        Mat4::new(
            1.0, 0.0, shx, 0.0,
            0.0, 1.0, shy, 0.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    /// Compose `[A, B, C, ...]` into `A * B * C * ...`, so the rightmost
    /// matrix is the first one applied to a column vector.
    pub fn chain(matrices: &[Mat4]) -> Mat4 {
        matrices
            .iter()
            .fold(Mat4::identity(), |acc, m| acc * m)
    }

    /// Dynamically sized counterpart of [`Transform::chain`].
    ///
    /// Used to push a whole 4xN vertex batch through a transform in one go.
    pub fn multiply(matrices: &[&DMatrix<f64>]) -> Result<DMatrix<f64>> {
        let (first, rest) = matrices.split_first().ok_or(Error::EmptyChain)?;
        let mut product = (*first).clone();
        for m in rest {
            if product.ncols() != m.nrows() {
                return Err(Error::DimensionMismatch {
                    left: product.shape(),
                    right: m.shape(),
                });
            }
            product = product * *m;
        }
        Ok(product)
    }

    pub fn to_dynamic(m: &Mat4) -> DMatrix<f64> {
        DMatrix::from_column_slice(4, 4, m.as_slice())
    }
}

/// Pack homogeneous vertices as the columns of a 4xN matrix
pub fn vertex_batch(vertices: &[Vec4]) -> DMatrix<f64> {
    DMatrix::from_fn(4, vertices.len(), |r, c| vertices[c][r])
}

/// Inverse of [`vertex_batch`]
pub fn unpack_batch(batch: &DMatrix<f64>) -> Vec<Vec4> {
    (0..batch.ncols())
        .map(|c| Vec4::new(batch[(0, c)], batch[(1, c)], batch[(2, c)], batch[(3, c)]))
        .collect()
}
