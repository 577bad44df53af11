//! # Perception module
//!
//! Converts camera frames into rover-centric points for each class of terrain.
//!
//! Procedure for each frame:
//!  - Warp the frame into a top-down view of the ground ([`PerspectiveProjector`])
//!  - Threshold the warped frame on colour into one mask per terrain class ([`ColourThresh`])
//!  - Convert the set pixels of each mask into points relative to the rover ([`EgoPoints`])

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod ego;
mod thresh;
mod warp;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use image::RgbImage;
use serde::{Deserialize, Serialize};

use super::map::WorldMapParams;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use ego::{EgoPoint, EgoPoints, PolarPoint};
pub use thresh::{BinaryMask, ColourThresh, TerrainClass, TerrainThresholds};
pub use warp::{CalibParams, PerspectiveProjector};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Manages the perception algorithm.
#[derive(Debug, Clone)]
pub struct PerMgr {
    pub params: PerMgrParams,

    projector: PerspectiveProjector,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerMgrParams {
    /// Calibration of the camera warp
    pub calib: CalibParams,

    /// Colour bounds of each terrain class
    pub thresholds: TerrainThresholds,

    /// Points further than this from the rover are discarded.
    ///
    /// Units: warped image pixels
    pub radius_limit_px: f64,

    /// Half angle of the cone in front of the rover used to estimate clearance.
    ///
    /// Units: degrees
    pub clearance_half_angle_deg: f64,

    /// Parameters of the world map the perception output is accumulated into
    pub world_map: WorldMapParams,
}

/// Output of one perception cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerOutput {
    pub navigable: EgoPoints,
    pub obstacle: EgoPoints,
    pub sample: EgoPoints,

    /// Mean distance of the navigable ground straight ahead of the rover.
    ///
    /// Units: warped image pixels
    pub clearance: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, thiserror::Error)]
pub enum PerError {
    #[error("Failed to load PerMgrParams: {0}")]
    ParamLoadError(String),

    #[error("Invalid camera calibration: {0}")]
    InvalidCalibration(String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for PerMgrParams {
    fn default() -> Self {
        Self {
            calib: CalibParams::default(),
            thresholds: TerrainThresholds::default(),
            radius_limit_px: 80.0,
            clearance_half_angle_deg: 15.0,
            world_map: WorldMapParams::default(),
        }
    }
}

impl PerMgr {
    pub fn new(params: PerMgrParams) -> Result<Self, PerError> {
        let projector = PerspectiveProjector::new(&params.calib)?;

        Ok(Self { params, projector })
    }

    /// Load the parameters from the given file and build the manager.
    pub fn init(params_path: &str) -> Result<Self, PerError> {
        let params: PerMgrParams =
            util::params::load(params_path).map_err(|e| PerError::ParamLoadError(e.to_string()))?;

        Self::new(params)
    }

    /// Run perception on a single camera frame.
    ///
    /// # Panics
    /// - If the frame is not the calibrated size.
    pub fn process(&self, frame: &RgbImage) -> PerOutput {
        let warped = self.projector.warp(frame);

        let ego = |class: TerrainClass| {
            let mask = self.params.thresholds.get(class).apply(&warped);
            EgoPoints::from_mask(&mask, self.params.radius_limit_px)
        };

        let navigable = ego(TerrainClass::Navigable);
        let obstacle = ego(TerrainClass::Obstacle);
        let sample = ego(TerrainClass::Sample);

        let clearance = navigable.clearance(self.params.clearance_half_angle_deg);

        PerOutput {
            navigable,
            obstacle,
            sample,
            clearance,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_params_file() {
        let params: PerMgrParams =
            util::params::parse(include_str!("../../../../params/per_mgr.toml")).unwrap();

        assert_eq!(params, PerMgrParams::default());
    }

    #[test]
    fn test_process_open_ground() {
        let per = PerMgr::new(PerMgrParams::default()).unwrap();
        let frame = RgbImage::from_pixel(320, 160, Rgb([200, 200, 200]));

        let out = per.process(&frame);

        assert!(!out.navigable.is_empty());
        assert!(out.sample.is_empty());
        assert!(out.clearance > 0.0);
        assert!(out.navigable.polar().iter().all(|p| p.dist < 80.0));

        // Open ground is dead ahead, so the mean bearing is close to straight
        assert!(out.navigable.mean_angle_deg().unwrap().abs() < 1.0);
    }

    #[test]
    fn test_process_sample() {
        let per = PerMgr::new(PerMgrParams::default()).unwrap();
        let mut frame = RgbImage::from_pixel(320, 160, Rgb([200, 200, 200]));

        // A yellow rock just left of centre, inside the calibration square
        for col in 130..156 {
            for row in 105..125 {
                frame.put_pixel(col, row, Rgb([200, 180, 20]));
            }
        }

        let out = per.process(&frame);

        assert!(!out.sample.is_empty());
        assert!(out.sample.mean_angle_deg().unwrap() > 0.0);
    }
}
