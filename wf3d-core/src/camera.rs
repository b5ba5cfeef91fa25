/// Camera navigation over a [`ViewSpec`]
use std::f64::consts::FRAC_PI_8;

use tracing::trace;

use crate::error::Result;
use crate::projection::ViewSpec;
use crate::transform::{point, Transform};

/// Discrete navigation commands produced by an input layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavCommand {
    StrafeLeft,
    StrafeRight,
    Forward,
    Backward,
    YawLeft,
    YawRight,
}

/// Moves the eye and look-at point in the camera's own frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraController {
    /// Distance covered by one strafe or dolly step
    pub move_step: f64,
    /// Angle in radians covered by one yaw step
    pub yaw_step: f64,
}

impl CameraController {
    pub fn new(move_step: f64, yaw_step: f64) -> Self {
        Self { move_step, yaw_step }
    }

    /// Apply `command` to `view`.
    ///
    /// The basis is rebuilt from the current prp/srp/vup on every call;
    /// `vup` itself is never changed. On error `view` is left as it was.
    pub fn apply(&self, view: &mut ViewSpec, command: NavCommand) -> Result<()> {
        let basis = view.basis()?;
        let (prp, srp) = match command {
            NavCommand::StrafeLeft | NavCommand::StrafeRight => {
                let sign = if command == NavCommand::StrafeLeft { -1.0 } else { 1.0 };
                let offset = basis.u * (sign * self.move_step);
                (view.prp + offset, view.srp + offset)
            }
            NavCommand::Forward | NavCommand::Backward => {
                // n points from the scene back towards the eye
                let sign = if command == NavCommand::Forward { -1.0 } else { 1.0 };
                let offset = basis.n * (sign * self.move_step);
                (view.prp + offset, view.srp + offset)
            }
            NavCommand::YawLeft | NavCommand::YawRight => {
                let sign = if command == NavCommand::YawLeft { 1.0 } else { -1.0 };
                let p = &view.prp;
                let yaw = Transform::chain(&[
                    Transform::translation(p.x, p.y, p.z),
                    Transform::rotation_about(&basis.v, sign * self.yaw_step)?,
                    Transform::translation(-p.x, -p.y, -p.z),
                ]);
                (view.prp, (yaw * point(&view.srp)).xyz())
            }
        };
        trace!(?command, ?prp, ?srp, "camera moved");
        view.prp = prp;
        view.srp = srp;
        Ok(())
    }
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new(1.0, FRAC_PI_8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::projection::ProjectionKind;
    use crate::transform::Vec3;

    fn view() -> ViewSpec {
        ViewSpec {
            kind: ProjectionKind::Perspective,
            prp: Vec3::new(0.0, 0.0, 5.0),
            srp: Vec3::new(0.0, 0.0, 0.0),
            vup: Vec3::new(0.0, 1.0, 0.0),
            clip: [-1.0, 1.0, -1.0, 1.0, 1.0, 10.0].into(),
        }
    }

    #[test]
    fn test_strafe_round_trip() {
        let camera = CameraController::default();
        let original = view();
        let mut v = original.clone();
        camera.apply(&mut v, NavCommand::StrafeLeft).unwrap();
        assert!((v.prp - Vec3::new(-1.0, 0.0, 5.0)).norm() < 1e-12);
        assert!((v.srp - Vec3::new(-1.0, 0.0, 0.0)).norm() < 1e-12);
        camera.apply(&mut v, NavCommand::StrafeRight).unwrap();
        assert!((v.prp - original.prp).norm() < 1e-12);
        assert!((v.srp - original.srp).norm() < 1e-12);
        assert_eq!(v.vup, original.vup);
    }

    #[test]
    fn test_forward_moves_towards_srp() {
        let camera = CameraController::new(2.0, FRAC_PI_8);
        let mut v = view();
        camera.apply(&mut v, NavCommand::Forward).unwrap();
        assert!((v.prp - Vec3::new(0.0, 0.0, 3.0)).norm() < 1e-12);
        assert!((v.srp - Vec3::new(0.0, 0.0, -2.0)).norm() < 1e-12);
        camera.apply(&mut v, NavCommand::Backward).unwrap();
        assert!((v.prp - Vec3::new(0.0, 0.0, 5.0)).norm() < 1e-12);
    }

    #[test]
    fn test_yaw_pivots_on_prp() {
        let camera = CameraController::new(1.0, std::f64::consts::FRAC_PI_2);
        let mut v = view();
        camera.apply(&mut v, NavCommand::YawLeft).unwrap();
        assert_eq!(v.prp, Vec3::new(0.0, 0.0, 5.0));
        // looking down -z, a quarter turn left looks down -x
        assert!((v.srp - Vec3::new(-5.0, 0.0, 5.0)).norm() < 1e-9);

        camera.apply(&mut v, NavCommand::YawRight).unwrap();
        assert!((v.srp - Vec3::zeros()).norm() < 1e-9);
    }

    #[test]
    fn test_yaw_keeps_distance() {
        let camera = CameraController::default();
        let mut v = view();
        v.prp = Vec3::new(3.0, 2.0, 1.0);
        let distance = (v.prp - v.srp).norm();
        for _ in 0..5 {
            camera.apply(&mut v, NavCommand::YawRight).unwrap();
            assert!(((v.prp - v.srp).norm() - distance).abs() < 1e-9);
        }
    }

    #[test]
    fn test_degenerate_view_untouched() {
        let camera = CameraController::default();
        let mut v = view();
        v.srp = v.prp;
        let before = v.clone();
        assert!(matches!(
            camera.apply(&mut v, NavCommand::StrafeLeft),
            Err(Error::DegenerateVector)
        ));
        assert_eq!(v, before);
    }
}
