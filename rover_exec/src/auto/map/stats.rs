//! # Map statistics
//!
//! Measures how well the [`WorldMap`] matches the true layout of the world, and how many of the
//! known samples have been located.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{fmt::Display, path::Path};

use log::warn;
use ndarray::{Array2, Zip};
use serde::Serialize;

use super::{WorldMap, WorldMapLayer};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// A known sample counts as located if sample evidence lies within this distance of it.
///
/// Units: cells
const SAMPLE_LOCATED_DIST_CELLS: f64 = 3.0;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The navigable area of the world, indexed `[y, x]` in the same way as the [`WorldMap`].
#[derive(Debug, Clone, PartialEq)]
pub struct GroundTruth(pub Array2<bool>);

/// Statistics on the quality of a [`WorldMap`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MapStats {
    /// Number of cells with navigable evidence
    pub nav_cells: usize,

    /// Percentage of the truly navigable area which has been mapped as navigable.
    ///
    /// `None` without a ground truth.
    pub perc_mapped: Option<f64>,

    /// Percentage of the cells mapped as navigable which are truly navigable.
    ///
    /// `None` without a ground truth.
    pub fidelity: Option<f64>,

    /// Number of known samples which have been seen on the map
    pub samples_located: usize,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl GroundTruth {
    /// Load the ground truth from an image, in which any non-black pixel is navigable.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, image::ImageError> {
        let img = image::open(path)?.to_luma8();
        let (width, height) = img.dimensions();

        Ok(Self(Array2::from_shape_fn(
            (height as usize, width as usize),
            |(row, col)| img.get_pixel(col as u32, row as u32)[0] > 0,
        )))
    }
}

impl MapStats {
    /// Compute the statistics of the map.
    ///
    /// `samples_pos` are the known `[x, y]` positions of the samples in map cells.
    pub fn compute(
        map: &WorldMap,
        ground_truth: Option<&GroundTruth>,
        samples_pos: &[[f64; 2]],
    ) -> Self {
        let nav = map.layer(WorldMapLayer::Navigable);
        let nav_cells = nav.iter().filter(|&&v| v > 0).count();

        let (perc_mapped, fidelity) = match ground_truth {
            Some(truth) if truth.0.dim() == nav.dim() => {
                let mut good_cells = 0usize;
                Zip::from(&nav).and(&truth.0).for_each(|&n, &t| {
                    if n > 0 && t {
                        good_cells += 1;
                    }
                });

                let truth_cells = truth.0.iter().filter(|&&t| t).count();

                (
                    Some(percentage(good_cells, truth_cells)),
                    Some(percentage(good_cells, nav_cells)),
                )
            }
            Some(truth) => {
                warn!(
                    "Ground truth of shape {:?} doesn't match the world map {:?}, statistics \
                     will not be computed",
                    truth.0.dim(),
                    nav.dim()
                );
                (None, None)
            }
            None => (None, None),
        };

        // Cells holding sample evidence, as (x, y)
        let sample_cells: Vec<(f64, f64)> = map
            .layer(WorldMapLayer::Sample)
            .indexed_iter()
            .filter(|&(_, &v)| v > 0)
            .map(|((y, x), _)| (x as f64, y as f64))
            .collect();

        let samples_located = samples_pos
            .iter()
            .filter(|pos| {
                sample_cells.iter().any(|(x, y)| {
                    (pos[0].trunc() - x).hypot(pos[1].trunc() - y) < SAMPLE_LOCATED_DIST_CELLS
                })
            })
            .count();

        Self {
            nav_cells,
            perc_mapped,
            fidelity,
            samples_located,
        }
    }
}

impl Display for MapStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "navigable cells: {}", self.nav_cells)?;

        if let (Some(mapped), Some(fidelity)) = (self.perc_mapped, self.fidelity) {
            write!(f, ", mapped: {:.1} %, fidelity: {:.1} %", mapped, fidelity)?;
        }

        write!(f, ", samples located: {}", self.samples_located)
    }
}

/// `100 * num / den`, or zero if `den` is zero.
fn percentage(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        100.0 * num as f64 / den as f64
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
