//! # Perspective warp
//!
//! Converts the front camera frame into a top-down view of the ground in front of the rover. The
//! homography is calibrated once from a quad of points on a grid laid out on flat ground, and is
//! then applied to every frame.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use image::{Rgb, RgbImage};
use nalgebra::{DMatrix, DVector, Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use super::PerError;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Below this magnitude the homogeneous coordinate of a warped point is treated as zero, i.e. the
/// point lies on the horizon.
const HOMOG_EPSILON: f64 = 1e-12;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Calibration of the camera projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibParams {
    /// Width of the camera frame.
    ///
    /// Units: pixels
    pub frame_width: u32,

    /// Height of the camera frame.
    ///
    /// Units: pixels
    pub frame_height: u32,

    /// Corners of a one meter grid square in the camera frame, as `[col, row]`, ordered bottom
    /// left, bottom right, top right, top left.
    pub source_quad: [[f64; 2]; 4],

    /// Half the side length of the grid square in the warped image.
    ///
    /// Units: pixels
    pub dst_size: f64,

    /// Distance between the bottom of the warped image and the bottom of the grid square, which
    /// accounts for the ground hidden below the camera's field of view.
    ///
    /// Units: pixels
    pub bottom_offset: f64,
}

/// Warps camera frames into a top-down view.
#[derive(Debug, Clone)]
pub struct PerspectiveProjector {
    /// Homography from camera frame to top-down pixels
    src_to_dst: Matrix3<f64>,

    /// Homography from top-down pixels to camera frame, used to sample the input frame
    dst_to_src: Matrix3<f64>,

    width: u32,
    height: u32,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for CalibParams {
    fn default() -> Self {
        Self {
            frame_width: 320,
            frame_height: 160,
            source_quad: [[14.0, 140.0], [301.0, 140.0], [200.0, 96.0], [118.0, 96.0]],
            dst_size: 5.0,
            bottom_offset: 6.0,
        }
    }
}

impl CalibParams {
    /// The quad the source points are mapped onto, in the same order as `source_quad`.
    ///
    /// The square is centred horizontally and sits `bottom_offset` above the bottom of the image.
    pub fn destination_quad(&self) -> [[f64; 2]; 4] {
        let half_w = self.frame_width as f64 / 2.0;
        let h = self.frame_height as f64;
        let d = self.dst_size;
        let b = self.bottom_offset;

        [
            [half_w - d, h - b],
            [half_w + d, h - b],
            [half_w + d, h - 2.0 * d - b],
            [half_w - d, h - 2.0 * d - b],
        ]
    }
}

impl PerspectiveProjector {
    /// Build the projector, solving for the homography of the calibration.
    pub fn new(calib: &CalibParams) -> Result<Self, PerError> {
        if calib.frame_width == 0 || calib.frame_height == 0 {
            return Err(PerError::InvalidCalibration(format!(
                "frame size must be non-zero, found {}x{}",
                calib.frame_width, calib.frame_height
            )));
        }

        let src_to_dst = solve_homography(&calib.source_quad, &calib.destination_quad())
            .ok_or_else(|| {
                PerError::InvalidCalibration(format!(
                    "source quad {:?} is degenerate",
                    calib.source_quad
                ))
            })?;

        let dst_to_src = src_to_dst.try_inverse().ok_or_else(|| {
            PerError::InvalidCalibration("homography is not invertible".into())
        })?;

        Ok(Self {
            src_to_dst,
            dst_to_src,
            width: calib.frame_width,
            height: calib.frame_height,
        })
    }

    /// Warp a frame into the top-down view.
    ///
    /// The output has the same size as the input. Pixels which map from outside the camera frame
    /// are black.
    ///
    /// # Panics
    /// - If the frame is not the calibrated size.
    pub fn warp(&self, frame: &RgbImage) -> RgbImage {
        if frame.dimensions() != (self.width, self.height) {
            util::raise_error!(
                "Frame of size {:?} passed to a projector calibrated for {}x{}",
                frame.dimensions(),
                self.width,
                self.height
            );
        }

        RgbImage::from_fn(self.width, self.height, |u, v| {
            match apply(&self.dst_to_src, [u as f64, v as f64]) {
                Some([x, y]) => sample_bilinear(frame, x, y),
                None => Rgb([0, 0, 0]),
            }
        })
    }

    /// Map a point in the camera frame into the top-down view.
    ///
    /// Returns `None` for points on the horizon.
    pub fn project_point(&self, point: [f64; 2]) -> Option<[f64; 2]> {
        apply(&self.src_to_dst, point)
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Solve for the homography mapping each `src` point onto the matching `dst` point.
///
/// The bottom right element is fixed to 1, leaving 8 unknowns for the 8 equations given by the
/// point pairs. Returns `None` if the system is singular (three or more collinear points).
fn solve_homography(src: &[[f64; 2]; 4], dst: &[[f64; 2]; 4]) -> Option<Matrix3<f64>> {
    let mut a = DMatrix::<f64>::zeros(8, 8);
    let mut b = DVector::<f64>::zeros(8);

    for (i, (s, d)) in src.iter().zip(dst.iter()).enumerate() {
        let (x, y) = (s[0], s[1]);
        let (u, v) = (d[0], d[1]);

        let r = 2 * i;
        a[(r, 0)] = x;
        a[(r, 1)] = y;
        a[(r, 2)] = 1.0;
        a[(r, 6)] = -u * x;
        a[(r, 7)] = -u * y;
        b[r] = u;

        a[(r + 1, 3)] = x;
        a[(r + 1, 4)] = y;
        a[(r + 1, 5)] = 1.0;
        a[(r + 1, 6)] = -v * x;
        a[(r + 1, 7)] = -v * y;
        b[r + 1] = v;
    }

    let h = a.lu().solve(&b)?;

    if h.iter().any(|e| !e.is_finite()) {
        return None;
    }

    Some(Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0))
}

/// Apply a homography to a point.
fn apply(m: &Matrix3<f64>, point: [f64; 2]) -> Option<[f64; 2]> {
    let p = m * Vector3::new(point[0], point[1], 1.0);

    if p.z.abs() < HOMOG_EPSILON {
        None
    } else {
        Some([p.x / p.z, p.y / p.z])
    }
}

/// Sample the frame at a fractional pixel position, treating everything outside the frame as
/// black.
fn sample_bilinear(frame: &RgbImage, x: f64, y: f64) -> Rgb<u8> {
    if !x.is_finite() || !y.is_finite() {
        return Rgb([0, 0, 0]);
    }

    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;

    let fetch = |col: f64, row: f64| -> [f64; 3] {
        if col < 0.0 || row < 0.0 || col >= frame.width() as f64 || row >= frame.height() as f64 {
            return [0.0; 3];
        }
        let p = frame.get_pixel(col as u32, row as u32);
        [p[0] as f64, p[1] as f64, p[2] as f64]
    };

    let tl = fetch(x0, y0);
    let tr = fetch(x0 + 1.0, y0);
    let bl = fetch(x0, y0 + 1.0);
    let br = fetch(x0 + 1.0, y0 + 1.0);

    let mut out = [0u8; 3];
    for c in 0..3 {
        let top = tl[c] * (1.0 - fx) + tr[c] * fx;
        let bottom = bl[c] * (1.0 - fx) + br[c] * fx;
        let value = top * (1.0 - fy) + bottom * fy;

        out[c] = value.round().max(0.0).min(255.0) as u8;
    }

    Rgb(out)
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_calibration_points() {
        let calib = CalibParams::default();
        let proj = PerspectiveProjector::new(&calib).unwrap();

        for (src, dst) in calib.source_quad.iter().zip(calib.destination_quad().iter()) {
            let p = proj.project_point(*src).unwrap();

            assert!((p[0] - dst[0]).abs() < 1e-6, "{:?} -> {:?}, expected {:?}", src, p, dst);
            assert!((p[1] - dst[1]).abs() < 1e-6, "{:?} -> {:?}, expected {:?}", src, p, dst);
        }
    }

    #[test]
    fn test_destination_quad() {
        let quad = CalibParams::default().destination_quad();

        assert_eq!(quad[0], [155.0, 154.0]);
        assert_eq!(quad[1], [165.0, 154.0]);
        assert_eq!(quad[2], [165.0, 144.0]);
        assert_eq!(quad[3], [155.0, 144.0]);
    }

    #[test]
    fn test_degenerate_calibration() {
        let calib = CalibParams {
            source_quad: [[0.0, 0.0], [10.0, 0.0], [20.0, 0.0], [30.0, 0.0]],
            ..Default::default()
        };

        assert!(matches!(
            PerspectiveProjector::new(&calib),
            Err(PerError::InvalidCalibration(_))
        ));
    }

    #[test]
    fn test_warp() {
        let calib = CalibParams::default();
        let proj = PerspectiveProjector::new(&calib).unwrap();

        let white = RgbImage::from_pixel(320, 160, Rgb([255, 255, 255]));
        let warped = proj.warp(&white);

        assert_eq!(warped.dimensions(), (320, 160));

        // Centre of the calibration square sees the ground, the ground directly below the camera
        // is out of view
        assert_eq!(warped.get_pixel(160, 149), &Rgb([255, 255, 255]));
        assert_eq!(warped.get_pixel(0, 159), &Rgb([0, 0, 0]));
        assert_eq!(warped.get_pixel(160, 159), &Rgb([0, 0, 0]));
    }

    #[test]
    #[should_panic]
    fn test_warp_wrong_size() {
        let proj = PerspectiveProjector::new(&CalibParams::default()).unwrap();
        proj.warp(&RgbImage::new(100, 100));
    }
}
