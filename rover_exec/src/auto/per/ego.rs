//! # Rover-centric coordinates
//!
//! Set pixels of a warped mask are converted into points relative to the rover, which sits at the
//! bottom centre of the warped image facing up it. `x` points forward and `y` points to the left.
//!
//! Units are pixels of the warped image. The warp calibration places 10 pixels in one meter.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use super::thresh::BinaryMask;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A point relative to the rover.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct EgoPoint {
    /// Distance ahead of the rover
    pub x: f64,

    /// Distance to the left of the rover
    pub y: f64,
}

/// An [`EgoPoint`] in polar form.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolarPoint {
    /// Distance from the rover, never negative
    pub dist: f64,

    /// Bearing of the point, positive to the left.
    ///
    /// Units: radians
    pub angle_rad: f64,
}

/// The rover-centric points of a single terrain class.
///
/// `points` and `polar` are always the same length, the polar form of `points[i]` is `polar[i]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EgoPoints {
    points: Vec<EgoPoint>,
    polar: Vec<PolarPoint>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl EgoPoint {
    pub fn to_polar(&self) -> PolarPoint {
        PolarPoint {
            dist: self.x.hypot(self.y),
            angle_rad: self.y.atan2(self.x),
        }
    }
}

impl PolarPoint {
    pub fn angle_deg(&self) -> f64 {
        self.angle_rad.to_degrees()
    }
}

impl EgoPoints {
    /// Convert every set pixel of the mask which is closer than `radius_limit` to the rover.
    ///
    /// Points far from the rover come from the most stretched part of the warp and are discarded.
    pub fn from_mask(mask: &BinaryMask, radius_limit: f64) -> Self {
        let (rows, cols) = mask.dim();
        let half_width = cols as f64 / 2.0;

        let mut ego = Self::default();

        for (row, col) in mask.set_pixels() {
            let point = EgoPoint {
                x: rows as f64 - row as f64,
                y: half_width - col as f64,
            };

            let polar = point.to_polar();

            if polar.dist < radius_limit {
                ego.points.push(point);
                ego.polar.push(polar);
            }
        }

        ego
    }

    /// Build from cartesian points, without any radius filtering.
    pub fn from_points(points: Vec<EgoPoint>) -> Self {
        let polar = points.iter().map(EgoPoint::to_polar).collect();

        Self { points, polar }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[EgoPoint] {
        &self.points
    }

    pub fn polar(&self) -> &[PolarPoint] {
        &self.polar
    }

    /// Mean bearing of all points, `None` if there are none.
    pub fn mean_angle_deg(&self) -> Option<f64> {
        util::maths::mean(self.polar.iter().map(PolarPoint::angle_deg))
    }

    /// The closest point to the rover, `None` if there are none.
    pub fn nearest(&self) -> Option<&PolarPoint> {
        self.polar.iter().min_by_key(|p| OrderedFloat(p.dist))
    }

    /// Mean distance of the points within `half_angle_deg` either side of straight ahead.
    ///
    /// This estimates how much open ground there is directly in front of the rover. Zero if no
    /// points lie in the cone.
    pub fn clearance(&self, half_angle_deg: f64) -> f64 {
        util::maths::mean(
            self.polar
                .iter()
                .filter(|p| p.angle_deg().abs() < half_angle_deg)
                .map(|p| p.dist),
        )
        .unwrap_or(0.0)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn test_empty_mask() {
        let mask = BinaryMask(Array2::from_elem((160, 320), false));
        let ego = EgoPoints::from_mask(&mask, 80.0);

        assert!(ego.is_empty());
        assert_eq!(ego.polar().len(), 0);
        assert_eq!(ego.mean_angle_deg(), None);
        assert_eq!(ego.nearest(), None);
        assert_eq!(ego.clearance(15.0), 0.0);
    }

    #[test]
    fn test_from_mask() {
        let mut arr = Array2::from_elem((160, 320), false);

        // Straight ahead, 10 px
        arr[[150, 160]] = true;
        // To the left, 10 px ahead and 10 px left
        arr[[150, 150]] = true;
        // Too far away
        arr[[0, 160]] = true;
        // Exactly on the limit is discarded
        arr[[80, 160]] = true;

        let ego = EgoPoints::from_mask(&BinaryMask(arr), 80.0);

        assert_eq!(ego.len(), 2);
        assert_eq!(ego.polar().len(), 2);

        // Pixels are visited in row major order, so both points are on row 150
        assert_eq!(ego.points()[0], EgoPoint { x: 10.0, y: 10.0 });
        assert_eq!(ego.points()[1], EgoPoint { x: 10.0, y: 0.0 });

        assert!((ego.polar()[0].angle_deg() - 45.0).abs() < 1e-9);
        assert!((ego.polar()[1].dist - 10.0).abs() < 1e-9);

        assert!((ego.mean_angle_deg().unwrap() - 22.5).abs() < 1e-9);
        assert!((ego.nearest().unwrap().dist - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_count_matches_mask() {
        // A 3x3 block around (150, 160) is entirely within the radius
        let mut arr = Array2::from_elem((160, 320), false);
        for row in 149..152 {
            for col in 159..162 {
                arr[[row, col]] = true;
            }
        }
        let mask = BinaryMask(arr);

        let ego = EgoPoints::from_mask(&mask, 80.0);

        assert_eq!(ego.len(), mask.count());
        assert_eq!(ego.polar().len(), mask.count());
    }

    #[test]
    fn test_clearance() {
        let ego = EgoPoints::from_points(vec![
            EgoPoint { x: 40.0, y: 0.0 },
            EgoPoint { x: 20.0, y: 1.0 },
            // Well outside the cone
            EgoPoint { x: 5.0, y: 50.0 },
        ]);

        let clearance = ego.clearance(15.0);
        let expected = (40.0 + 20.0f64.hypot(1.0)) / 2.0;

        assert!((clearance - expected).abs() < 1e-9);
    }
}
