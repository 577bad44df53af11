//! # Colour thresholding
//!
//! Terrain is classified purely on colour. Each terrain class has an inclusive RGB box, and a
//! pixel belongs to the class when every channel lies inside the box.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use image::{Rgb, RgbImage};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Inclusive per-channel RGB bounds.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColourThresh {
    pub low: [u8; 3],
    pub high: [u8; 3],
}

/// Thresholds for each of the terrain classes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrainThresholds {
    /// Bright ground the rover can drive on
    pub navigable: ColourThresh,

    /// Dark rock faces and mountains
    pub obstacle: ColourThresh,

    /// The yellow rock samples
    pub sample: ColourThresh,
}

/// A per-pixel classification of an image, indexed `[row, col]`.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryMask(pub Array2<bool>);

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The classes a pixel of the warped image can be assigned to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerrainClass {
    Navigable,
    Obstacle,
    Sample,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ColourThresh {
    pub fn new(low: [u8; 3], high: [u8; 3]) -> Self {
        Self { low, high }
    }

    /// Returns true if every channel of the pixel is inside the bounds.
    pub fn contains(&self, pixel: &Rgb<u8>) -> bool {
        (0..3).all(|c| pixel[c] >= self.low[c] && pixel[c] <= self.high[c])
    }

    /// Classify every pixel of the image against these bounds.
    pub fn apply(&self, image: &RgbImage) -> BinaryMask {
        let (width, height) = image.dimensions();

        BinaryMask(Array2::from_shape_fn(
            (height as usize, width as usize),
            |(row, col)| self.contains(image.get_pixel(col as u32, row as u32)),
        ))
    }
}

impl Default for TerrainThresholds {
    fn default() -> Self {
        Self {
            navigable: ColourThresh::new([160, 160, 160], [255, 255, 255]),
            obstacle: ColourThresh::new([0, 0, 0], [100, 100, 100]),
            sample: ColourThresh::new([110, 110, 0], [255, 255, 80]),
        }
    }
}

impl TerrainThresholds {
    /// Get the bounds of a particular class
    pub fn get(&self, class: TerrainClass) -> &ColourThresh {
        match class {
            TerrainClass::Navigable => &self.navigable,
            TerrainClass::Obstacle => &self.obstacle,
            TerrainClass::Sample => &self.sample,
        }
    }
}

impl BinaryMask {
    /// Number of rows and columns in the mask
    pub fn dim(&self) -> (usize, usize) {
        self.0.dim()
    }

    /// Number of set pixels
    pub fn count(&self) -> usize {
        self.0.iter().filter(|&&v| v).count()
    }

    /// Iterator over the `(row, col)` of every set pixel.
    pub fn set_pixels(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.0
            .indexed_iter()
            .filter_map(|(idx, &v)| if v { Some(idx) } else { None })
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_contains_inclusive() {
        let sample = TerrainThresholds::default().sample;

        assert!(sample.contains(&Rgb([110, 110, 0])));
        assert!(sample.contains(&Rgb([255, 255, 80])));
        assert!(sample.contains(&Rgb([200, 180, 20])));

        assert!(!sample.contains(&Rgb([109, 200, 20])));
        assert!(!sample.contains(&Rgb([200, 200, 81])));
    }

    #[test]
    fn test_apply() {
        let thresh = TerrainThresholds::default();

        let mut img = RgbImage::from_pixel(4, 3, Rgb([200, 200, 200]));
        img.put_pixel(1, 2, Rgb([20, 20, 20]));
        img.put_pixel(3, 0, Rgb([200, 180, 20]));

        let nav = thresh.get(TerrainClass::Navigable).apply(&img);
        let obs = thresh.get(TerrainClass::Obstacle).apply(&img);
        let rock = thresh.get(TerrainClass::Sample).apply(&img);

        assert_eq!(nav.dim(), (3, 4));
        assert_eq!(nav.count(), 10);
        assert_eq!(obs.set_pixels().collect::<Vec<_>>(), vec![(2, 1)]);
        assert_eq!(rock.set_pixels().collect::<Vec<_>>(), vec![(0, 3)]);

        // Rock and rock face pixels are not navigable
        assert!(!nav.0[[2, 1]]);
        assert!(!nav.0[[0, 3]]);
    }
}
