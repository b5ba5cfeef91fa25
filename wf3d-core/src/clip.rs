//! 3D Cohen-Sutherland line clipping against the canonical view volumes.
//!
//! Both volumes are convex and bounded by six planes. Each point gets an
//! outcode with one bit per plane it lies outside of, which lets whole lines
//! be accepted or rejected with two bitwise operations. Lines that are
//! neither get shortened one plane at a time until they are.
//!
//! ```text
//!         parallel                    perspective
//!    y                           y
//!    ^   +------+                ^      /
//!    |   |      |  x,y in [-1,1] |    /   |x| <= -z, |y| <= -z
//!    |   |      |  z in [-1, 0]  |  /     z in [-1, z_min]
//!  --+---+------+--> -z        --+------------> -z
//! ```

use bitflags::bitflags;
use tracing::warn;

use crate::error::{Error, Result};
use crate::transform::{Vec4, EPSILON};

/// Safety net against numeric oscillation at plane boundaries: twice the
/// number of clip planes.
pub const MAX_ITERATIONS: usize = 12;

bitflags! {
    /// Clip planes a point lies outside of.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Outcode: u8 {
        const LEFT = 1 << 5;
        const RIGHT = 1 << 4;
        const BOTTOM = 1 << 3;
        const TOP = 1 << 2;
        const NEAR = 1 << 1;
        const FAR = 1 << 0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Plane {
    Left,
    Right,
    Bottom,
    Top,
    Near,
    Far,
}

/// Order in which violated planes are resolved.
const PRIORITY: [(Outcode, Plane); 6] = [
    (Outcode::LEFT, Plane::Left),
    (Outcode::RIGHT, Plane::Right),
    (Outcode::BOTTOM, Plane::Bottom),
    (Outcode::TOP, Plane::Top),
    (Outcode::NEAR, Plane::Near),
    (Outcode::FAR, Plane::Far),
];

/// A line segment between two homogeneous points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    pub pt0: Vec4,
    pub pt1: Vec4,
}

impl Line {
    pub fn new(pt0: Vec4, pt1: Vec4) -> Self {
        Self { pt0, pt1 }
    }

    /// Point at parameter `t`, i.e. `(1 - t) * pt0 + t * pt1`
    pub fn at(&self, t: f64) -> Vec4 {
        self.pt0.lerp(&self.pt1, t)
    }
}

/// Canonical view volume a line is clipped against
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClipVolume {
    /// The box [-1,1] x [-1,1] x [-1,0]
    Parallel,
    /// The frustum |x| <= -z, |y| <= -z, z in [-1, z_min]
    Perspective { z_min: f64 },
}

impl ClipVolume {
    pub fn outcode(&self, p: &Vec4) -> Outcode {
        let mut code = Outcode::empty();
        let (x_min, x_max, y_min, y_max, z_near) = match *self {
            ClipVolume::Parallel => (-1.0, 1.0, -1.0, 1.0, 0.0),
            ClipVolume::Perspective { z_min } => (p.z, -p.z, p.z, -p.z, z_min),
        };
        // independent half-space tests: behind the eye the frustum's side
        // planes cross, so a point can be outside both LEFT and RIGHT
        code.set(Outcode::LEFT, p.x < x_min - EPSILON);
        code.set(Outcode::RIGHT, p.x > x_max + EPSILON);
        code.set(Outcode::BOTTOM, p.y < y_min - EPSILON);
        code.set(Outcode::TOP, p.y > y_max + EPSILON);
        code.set(Outcode::NEAR, p.z > z_near + EPSILON);
        code.set(Outcode::FAR, p.z < -1.0 - EPSILON);
        code
    }

    pub fn contains(&self, p: &Vec4) -> bool {
        self.outcode(p).is_empty()
    }

    /// Parameter along `line` where it meets `plane`, or `None` if the line
    /// runs parallel to it. The parameter may fall outside `[0, 1]`.
    fn intersect(&self, line: &Line, plane: Plane) -> Option<f64> {
        let (p0, p1) = (&line.pt0, &line.pt1);
        let d = p1 - p0;
        // each plane written as a*x + b*y + c*z = k, solved for t
        let (num, den) = match (*self, plane) {
            (ClipVolume::Parallel, Plane::Left) => (-1.0 - p0.x, d.x),
            (ClipVolume::Parallel, Plane::Right) => (1.0 - p0.x, d.x),
            (ClipVolume::Parallel, Plane::Bottom) => (-1.0 - p0.y, d.y),
            (ClipVolume::Parallel, Plane::Top) => (1.0 - p0.y, d.y),
            (ClipVolume::Parallel, Plane::Near) => (-p0.z, d.z),
            (ClipVolume::Perspective { .. }, Plane::Left) => (p0.z - p0.x, d.x - d.z),
            (ClipVolume::Perspective { .. }, Plane::Right) => (-p0.x - p0.z, d.x + d.z),
            (ClipVolume::Perspective { .. }, Plane::Bottom) => (p0.z - p0.y, d.y - d.z),
            (ClipVolume::Perspective { .. }, Plane::Top) => (-p0.y - p0.z, d.y + d.z),
            (ClipVolume::Perspective { z_min }, Plane::Near) => (z_min - p0.z, d.z),
            (_, Plane::Far) => (-1.0 - p0.z, d.z),
        };
        (den.abs() > f64::EPSILON).then(|| num / den)
    }

    /// Clips `line` against this volume.
    ///
    /// Returns `Ok(None)` when the line lies entirely outside. When both
    /// endpoints are outside, `pt0` is moved first; within an endpoint the
    /// violated planes are resolved in the order LEFT, RIGHT, BOTTOM, TOP,
    /// NEAR, FAR, one per iteration.
    pub fn try_clip(&self, line: &Line) -> Result<Option<Line>> {
        let mut line = *line;
        for _ in 0..MAX_ITERATIONS {
            let out0 = self.outcode(&line.pt0);
            let out1 = self.outcode(&line.pt1);

            if (out0 | out1).is_empty() {
                return Ok(Some(line));
            }
            if out0.intersects(out1) {
                return Ok(None);
            }

            let (code, moving_pt0) = if !out0.is_empty() {
                (out0, true)
            } else {
                (out1, false)
            };
            let plane = PRIORITY
                .iter()
                .find(|(bit, _)| code.contains(*bit))
                .map_or(Plane::Far, |(_, plane)| *plane);

            let t = match self.intersect(&line, plane) {
                Some(t) if (-EPSILON..=1.0 + EPSILON).contains(&t) => t.clamp(0.0, 1.0),
                _ => return Ok(None),
            };
            let clipped = line.at(t);
            line = if moving_pt0 {
                Line::new(clipped, line.pt1)
            } else {
                Line::new(line.pt0, clipped)
            };
        }
        Err(Error::ClipIterationExceeded(MAX_ITERATIONS))
    }

    /// Like [`ClipVolume::try_clip`], but treats non-convergence as rejection.
    pub fn clip(&self, line: &Line) -> Option<Line> {
        self.try_clip(line).unwrap_or_else(|err| {
            warn!(?line, "{err}; dropping segment");
            None
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: f64, y: f64, z: f64) -> Vec4 {
        Vec4::new(x, y, z, 1.0)
    }

    const FRUSTUM: ClipVolume = ClipVolume::Perspective { z_min: -0.1 };

    #[test]
    fn test_parallel_outcodes() {
        let v = ClipVolume::Parallel;
        assert_eq!(v.outcode(&pt(0.0, 0.0, -0.5)), Outcode::empty());
        assert_eq!(v.outcode(&pt(-1.5, 2.0, 0.5)), Outcode::LEFT | Outcode::TOP | Outcode::NEAR);
        assert_eq!(v.outcode(&pt(1.5, -2.0, -1.5)), Outcode::RIGHT | Outcode::BOTTOM | Outcode::FAR);
        // boundary counts as inside
        assert!(v.contains(&pt(1.0, -1.0, 0.0)));
        assert!(v.contains(&pt(-1.0 - 1e-7, 1.0, -1.0)));
    }

    #[test]
    fn test_perspective_outcodes() {
        assert!(FRUSTUM.contains(&pt(0.5, -0.5, -0.5)));
        assert!(FRUSTUM.contains(&pt(-0.5, 0.5, -0.5)));
        assert_eq!(FRUSTUM.outcode(&pt(-0.6, 0.0, -0.5)), Outcode::LEFT);
        assert_eq!(FRUSTUM.outcode(&pt(0.0, 0.6, -0.5)), Outcode::TOP);
        assert_eq!(FRUSTUM.outcode(&pt(0.0, 0.0, -0.05)), Outcode::NEAR);
        assert_eq!(FRUSTUM.outcode(&pt(0.0, 0.0, -2.0)), Outcode::FAR);
        // behind the eye
        assert!(FRUSTUM.outcode(&pt(0.0, 0.0, 1.0)).contains(Outcode::NEAR));
    }

    #[test]
    fn test_inside_line_unchanged() {
        let line = Line::new(pt(-0.5, 0.25, -0.2), pt(0.9, -1.0, -1.0));
        assert_eq!(ClipVolume::Parallel.clip(&line), Some(line));

        let line = Line::new(pt(-0.5, 0.25, -0.6), pt(0.1, 0.1, -0.2));
        assert_eq!(FRUSTUM.clip(&line), Some(line));
    }

    #[test]
    fn test_trivial_reject() {
        let line = Line::new(pt(-2.0, 0.0, -0.5), pt(-1.5, 0.5, -0.2));
        assert_eq!(ClipVolume::Parallel.clip(&line), None);

        let line = Line::new(pt(0.0, 0.0, 0.5), pt(0.1, 0.0, 2.0));
        assert_eq!(FRUSTUM.clip(&line), None);
    }

    #[test]
    fn test_clip_single_plane() {
        let line = Line::new(pt(-2.0, 0.0, -0.5), pt(0.0, 0.0, -0.5));
        let clipped = ClipVolume::Parallel.clip(&line).unwrap();
        assert!((clipped.pt0 - pt(-1.0, 0.0, -0.5)).norm() < 1e-12);
        assert_eq!(clipped.pt1, line.pt1);
    }

    #[test]
    fn test_clip_both_ends() {
        let line = Line::new(pt(-3.0, 0.5, -0.5), pt(3.0, 0.5, -0.5));
        let clipped = ClipVolume::Parallel.clip(&line).unwrap();
        assert!((clipped.pt0 - pt(-1.0, 0.5, -0.5)).norm() < 1e-12);
        assert!((clipped.pt1 - pt(1.0, 0.5, -0.5)).norm() < 1e-12);

        // crosses the near and far planes of the frustum along the axis
        let line = Line::new(pt(0.0, 0.0, 1.0), pt(0.0, 0.0, -3.0));
        let clipped = FRUSTUM.clip(&line).unwrap();
        assert!((clipped.pt0 - pt(0.0, 0.0, -0.1)).norm() < 1e-12);
        assert!((clipped.pt1 - pt(0.0, 0.0, -1.0)).norm() < 1e-12);
    }

    #[test]
    fn test_clip_perspective_side_planes() {
        let line = Line::new(pt(-1.0, 0.0, -0.5), pt(1.0, 0.0, -0.5));
        let clipped = FRUSTUM.clip(&line).unwrap();
        assert!((clipped.pt0 - pt(-0.5, 0.0, -0.5)).norm() < 1e-12);
        assert!((clipped.pt1 - pt(0.5, 0.0, -0.5)).norm() < 1e-12);

        let line = Line::new(pt(0.0, -0.5, -0.5), pt(0.0, 2.0, -0.5));
        let clipped = FRUSTUM.clip(&line).unwrap();
        assert_eq!(clipped.pt0, line.pt0);
        assert!((clipped.pt1 - pt(0.0, 0.5, -0.5)).norm() < 1e-12);
    }

    #[test]
    fn test_outside_corner_rejected_after_clipping() {
        // both endpoints outside different planes, line misses the box corner
        let line = Line::new(pt(-2.0, 0.5, -0.5), pt(0.5, 3.0, -0.5));
        assert_eq!(ClipVolume::Parallel.clip(&line), None);
    }

    #[test]
    fn test_clip_is_idempotent() {
        let line = Line::new(pt(-3.0, -2.0, 0.5), pt(0.5, 0.5, -1.5));
        let once = FRUSTUM.clip(&line);
        assert_eq!(once.and_then(|l| FRUSTUM.clip(&l)), once);

        let once = ClipVolume::Parallel.clip(&line).unwrap();
        assert!(ClipVolume::Parallel.contains(&once.pt0));
        assert!(ClipVolume::Parallel.contains(&once.pt1));
        assert_eq!(ClipVolume::Parallel.clip(&once), Some(once));
    }
    /// Accepted endpoints must be inside and on the original segment
    fn assert_on_segment(original: &Line, clipped: &Line, volume: &ClipVolume) {
        let d = original.pt1 - original.pt0;
        for p in [clipped.pt0, clipped.pt1] {
            assert!(volume.contains(&p), "{:?} outside {:?}", p, volume);
            let t = (p - original.pt0).dot(&d) / d.norm_squared();
            assert!((-1e-9..=1.0 + 1e-9).contains(&t), "t = {}", t);
            assert!((original.at(t) - p).norm() < 1e-9);
        }
    }

    #[test]
    fn test_behind_eye_both_bits() {
        // side planes cross behind the eye, so both bits of a pair are set
        let code = FRUSTUM.outcode(&pt(0.0, 0.0, 1.0));
        assert_eq!(
            code,
            Outcode::LEFT | Outcode::RIGHT | Outcode::BOTTOM | Outcode::TOP | Outcode::NEAR
        );
    }

    #[test]
    fn test_reject_through_eye_plane_outside_one_side() {
        for (x, y) in [(0.6, 0.0), (-0.6, 0.0), (0.0, 0.6), (0.0, -0.6)] {
            let line = Line::new(pt(x, y, -0.5), pt(0.0, 0.0, 1.0));
            assert_eq!(FRUSTUM.clip(&line), None, "{:?}", line);
        }
    }

    #[test]
    fn test_clip_through_eye_plane_off_axis() {
        let inside = pt(0.05, -0.02, -0.5);
        for behind in [
            pt(3.0, 0.0, 1.0),
            pt(-3.0, 0.0, 1.0),
            pt(0.0, 3.0, 1.0),
            pt(0.0, -3.0, 1.0),
            pt(2.0, -1.5, 0.2),
        ] {
            let line = Line::new(inside, behind);
            let clipped = FRUSTUM.clip(&line).unwrap();
            assert_eq!(clipped.pt0, inside);
            assert_on_segment(&line, &clipped, &FRUSTUM);

            // same line the other way round moves pt0 instead
            let reversed = Line::new(behind, inside);
            let clipped = FRUSTUM.clip(&reversed).unwrap();
            assert_eq!(clipped.pt1, inside);
            assert_on_segment(&reversed, &clipped, &FRUSTUM);
        }
    }

    #[test]
    fn test_clipped_endpoints_stay_on_segment() {
        let lines = [
            Line::new(pt(-3.0, -2.0, 0.5), pt(0.5, 0.5, -1.5)),
            Line::new(pt(1.5, 0.2, -0.9), pt(-0.8, -0.1, 0.4)),
            Line::new(pt(0.3, 2.0, -1.2), pt(-0.1, -1.0, -0.3)),
            Line::new(pt(-0.9, 0.9, -2.0), pt(0.2, -0.1, -0.05)),
        ];
        for line in &lines {
            for volume in [FRUSTUM, ClipVolume::Parallel] {
                if let Some(clipped) = volume.clip(line) {
                    assert_on_segment(line, &clipped, &volume);
                }
            }
        }
    }
}
