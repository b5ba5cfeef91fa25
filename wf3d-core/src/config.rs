//! Viewer configuration.
//!
//! Loaded from JSON; every field has a default, so `{}` is a valid config.

use std::f64::consts::FRAC_PI_8;
use std::path::Path;

use serde::Deserialize;

use crate::camera::CameraController;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Drawing surface width in device units.
    pub width: u32,
    /// Drawing surface height in device units.
    pub height: u32,
    /// Distance covered by one strafe/dolly command.
    pub move_step: f64,
    /// Angle in radians covered by one yaw command.
    pub yaw_step: f64,
    /// Frame rate the host loop aims for.
    pub target_fps: u32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            move_step: 1.0,
            yaw_step: FRAC_PI_8,
            target_fps: 30,
        }
    }
}

impl ViewerConfig {
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn camera(&self) -> CameraController {
        CameraController::new(self.move_step, self.yaw_step)
    }
}
