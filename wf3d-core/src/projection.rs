/// View specification and canonical view volume transforms
use serde::Deserialize;

use crate::clip::ClipVolume;
use crate::error::{Error, Result};
use crate::transform::{normalize, Mat4, Transform, Vec3, EPSILON};

/// Projection mode for rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionKind {
    Parallel,
    Perspective,
}

/// View window on the view plane plus the near and far clipping distances,
/// all expressed in view reference coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipWindow {
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
    pub top: f64,
    pub near: f64,
    pub far: f64,
}

impl ClipWindow {
    pub fn new(left: f64, right: f64, bottom: f64, top: f64, near: f64, far: f64) -> Self {
        Self { left, right, bottom, top, near, far }
    }

    /// Center of the window on the near plane
    pub fn center(&self) -> Vec3 {
        Vec3::new(
            (self.left + self.right) / 2.0,
            (self.bottom + self.top) / 2.0,
            -self.near,
        )
    }
}

impl From<[f64; 6]> for ClipWindow {
    fn from(c: [f64; 6]) -> Self {
        Self::new(c[0], c[1], c[2], c[3], c[4], c[5])
    }
}

/// Camera configuration: where the eye is, what it looks at, and the window
/// through which it looks.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSpec {
    pub kind: ProjectionKind,
    /// Projection reference point (eye position)
    pub prp: Vec3,
    /// Scene reference point (look-at target)
    pub srp: Vec3,
    pub vup: Vec3,
    pub clip: ClipWindow,
}

/// Orthonormal view reference coordinate axes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBasis {
    pub u: Vec3,
    pub v: Vec3,
    pub n: Vec3,
}

impl ViewBasis {
    /// Fails with [`Error::DegenerateVector`] when `prp == srp` or when `vup`
    /// is parallel to the viewing direction.
    pub fn new(prp: &Vec3, srp: &Vec3, vup: &Vec3) -> Result<Self> {
        let n = normalize(&(prp - srp))?;
        let u = normalize(&vup.cross(&n))?;
        let v = n.cross(&u);
        Ok(Self { u, v, n })
    }

    /// Rotation aligning (u, v, n) with (x, y, z)
    pub fn rotation(&self) -> Mat4 {
        let (u, v, n) = (&self.u, &self.v, &self.n);
        Mat4::new(
            u.x, u.y, u.z, 0.0,
            v.x, v.y, v.z, 0.0,
            n.x, n.y, n.z, 0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }
}

impl ViewSpec {
    pub fn basis(&self) -> Result<ViewBasis> {
        ViewBasis::new(&self.prp, &self.srp, &self.vup)
    }
}

/// Everything the pipeline needs to take world coordinates to the screen
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub kind: ProjectionKind,
    /// World coordinates to canonical view volume
    pub n: Mat4,
    /// Canonical view volume onto the view plane
    pub m: Mat4,
    /// Position of the near plane in the canonical perspective volume
    pub z_min: f64,
}

impl Projection {
    pub fn new(view: &ViewSpec) -> Result<Self> {
        let clip = &view.clip;
        match view.kind {
            ProjectionKind::Parallel => Ok(Self {
                kind: view.kind,
                n: parallel(view)?,
                m: m_par(),
                z_min: 0.0,
            }),
            ProjectionKind::Perspective => Ok(Self {
                kind: view.kind,
                n: perspective(view)?,
                m: m_per(),
                z_min: -clip.near / clip.far,
            }),
        }
    }

    pub fn clip_volume(&self) -> ClipVolume {
        match self.kind {
            ProjectionKind::Parallel => ClipVolume::Parallel,
            ProjectionKind::Perspective => ClipVolume::Perspective { z_min: self.z_min },
        }
    }
}

fn check_window(clip: &ClipWindow) -> Result<()> {
    if clip.near.abs() < EPSILON {
        return Err(Error::DegenerateProjection(
            "near plane at the projection reference point (dop.z == 0)".to_string(),
        ));
    }
    if clip.near < 0.0 {
        return Err(Error::DegenerateProjection(format!(
            "near plane {} lies behind the projection reference point",
            clip.near
        )));
    }
    if clip.far - clip.near < EPSILON {
        return Err(Error::DegenerateProjection(format!(
            "empty depth range: near {} must be less than far {}",
            clip.near, clip.far
        )));
    }
    if (clip.right - clip.left).abs() < EPSILON || (clip.top - clip.bottom).abs() < EPSILON {
        return Err(Error::DegenerateProjection("view window has zero area".to_string()));
    }
    Ok(())
}

/// T(-prp), R and the shear shared by both projections, composed as SH * R * T
fn align(view: &ViewSpec) -> Result<Mat4> {
    let basis = view.basis()?;
    let translate = Transform::translation(-view.prp.x, -view.prp.y, -view.prp.z);

    // prp sits at the origin after translation, so dop = cow - prp = cow
    let dop = view.clip.center();
    let shear = Transform::shear_xy(-dop.x / dop.z, -dop.y / dop.z);

    Ok(Transform::chain(&[shear, basis.rotation(), translate]))
}

/// Parallel normalizing transform into [-1,1] x [-1,1] x [-1,0]
pub fn parallel(view: &ViewSpec) -> Result<Mat4> {
    let clip = &view.clip;
    check_window(clip)?;
    let depth = clip.far - clip.near;

    let near_to_origin = Transform::translation(0.0, 0.0, clip.near);
    let scale = Transform::scale(
        2.0 / (clip.right - clip.left),
        2.0 / (clip.top - clip.bottom),
        1.0 / depth,
    );
    Ok(Transform::chain(&[scale, near_to_origin, align(view)?]))
}

/// Perspective normalizing transform into the frustum |x| <= -z, |y| <= -z,
/// z in [-1, -near/far]
pub fn perspective(view: &ViewSpec) -> Result<Mat4> {
    let clip = &view.clip;
    check_window(clip)?;

    let scale = Transform::scale(
        2.0 * clip.near / ((clip.right - clip.left) * clip.far),
        2.0 * clip.near / ((clip.top - clip.bottom) * clip.far),
        1.0 / clip.far,
    );
    Ok(Transform::chain(&[scale, align(view)?]))
}

/// Orthographic drop of z onto the view plane
pub fn m_par() -> Mat4 {
    Mat4::new(
        1.0, 0.0, 0.0, 0.0,
        0.0, 1.0, 0.0, 0.0,
        0.0, 0.0, 0.0, 0.0,
        0.0, 0.0, 0.0, 1.0,
    )
}

/// Perspective projection onto z = -1; the caller divides by w (= -z)
pub fn m_per() -> Mat4 {
    Mat4::new(
        1.0, 0.0, 0.0, 0.0,
        0.0, 1.0, 0.0, 0.0,
        0.0, 0.0, 1.0, 0.0,
        0.0, 0.0, -1.0, 0.0,
    )
}
