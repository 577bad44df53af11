//! # World Map
//!
//! A fixed size grid accumulating terrain evidence over the whole session. Each cell holds one
//! byte per [`WorldMapLayer`], and the grid is indexed `[y, x, layer]` so it can be viewed directly
//! as an image of the world.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::collections::HashSet;

use log::debug;
use nalgebra::Vector2;
use ndarray::{Array3, ArrayView2, Axis, Zip};
use serde::{Deserialize, Serialize};

use crate::auto::{
    loc::Pose,
    per::{EgoPoint, EgoPoints, PerOutput},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters of the [`WorldMap`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldMapParams {
    /// Number of cells along each side of the square map
    pub size_cells: usize,

    /// Number of warped image pixels per map cell
    pub scale_px_per_cell: f64,

    /// Maximum pitch and roll, either side of level, at which the map will be updated. Beyond this
    /// the warp no longer matches the ground and the projected points are wrong.
    ///
    /// Units: degrees
    pub level_tolerance_deg: f64,
}

/// Terrain evidence accumulated over the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldMap {
    pub params: WorldMapParams,

    /// Raw map data, dimension order y cell, x cell, layer
    data: Array3<u8>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Possible layers in a [`WorldMap`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorldMapLayer {
    /// Number of ticks each cell was seen as an obstacle
    Obstacle = 0,

    /// Set to the maximum once a sample has been seen in the cell
    Sample = 1,

    /// Number of ticks each cell was seen as navigable
    Navigable = 2,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for WorldMapParams {
    fn default() -> Self {
        Self {
            size_cells: 200,
            scale_px_per_cell: 10.0,
            level_tolerance_deg: 1.0,
        }
    }
}

impl WorldMap {
    /// Create a new empty map.
    pub fn new(params: WorldMapParams) -> Self {
        let data = Array3::zeros((params.size_cells, params.size_cells, 3));

        Self { params, data }
    }

    /// Number of cells along each side of the map
    pub fn size(&self) -> usize {
        self.params.size_cells
    }

    /// Raw map data, indexed `[y, x, layer]`
    pub fn data(&self) -> &Array3<u8> {
        &self.data
    }

    /// Get the value of one cell in a layer.
    ///
    /// Returns `None` if the cell is outside the map.
    pub fn get(&self, layer: WorldMapLayer, x: usize, y: usize) -> Option<u8> {
        self.data.get([y, x, layer as usize]).copied()
    }

    /// View of a single layer, indexed `[y, x]`
    pub fn layer(&self, layer: WorldMapLayer) -> ArrayView2<u8> {
        self.data.index_axis(Axis(2), layer as usize)
    }

    /// Find the `(x, y)` cell a rover-centric point lies in.
    ///
    /// Points outside the map are clamped onto its edge, so the returned cell is always valid.
    pub fn cell_of(&self, point: &EgoPoint, pose: &Pose) -> (usize, usize) {
        let world = pose.rotation() * Vector2::new(point.x, point.y) / self.params.scale_px_per_cell
            + pose.position_m;

        let max = self.size().saturating_sub(1) as i64;
        let to_cell = |v: f64| (v.trunc() as i64).max(0).min(max) as usize;

        (to_cell(world.x), to_cell(world.y))
    }

    /// Accumulate one tick of perception into the map.
    ///
    /// The update is skipped if the rover isn't level, in which case `false` is returned.
    ///
    /// Each cell seen this tick is incremented once in the navigable and obstacle layers, however
    /// many points fall into it. Afterwards every cell with navigable evidence has its obstacle
    /// evidence cleared.
    pub fn update(&mut self, per: &PerOutput, pose: &Pose) -> bool {
        if !pose.is_level(self.params.level_tolerance_deg) {
            debug!(
                "Rover not level (pitch {:.2}, roll {:.2}), world map update skipped",
                pose.pitch_deg, pose.roll_deg
            );
            return false;
        }

        for (x, y) in self.cells_of(&per.obstacle, pose) {
            let cell = &mut self.data[[y, x, WorldMapLayer::Obstacle as usize]];
            *cell = cell.saturating_add(1);
        }

        for (x, y) in self.cells_of(&per.sample, pose) {
            self.data[[y, x, WorldMapLayer::Sample as usize]] = u8::MAX;
        }

        for (x, y) in self.cells_of(&per.navigable, pose) {
            let cell = &mut self.data[[y, x, WorldMapLayer::Navigable as usize]];
            *cell = cell.saturating_add(1);
        }

        Zip::from(self.data.lanes_mut(Axis(2))).for_each(|mut cell| {
            if cell[WorldMapLayer::Navigable as usize] > 0 {
                cell[WorldMapLayer::Obstacle as usize] = 0;
            }
        });

        true
    }

    /// The set of distinct cells the points fall into.
    fn cells_of(&self, points: &EgoPoints, pose: &Pose) -> HashSet<(usize, usize)> {
        points
            .points()
            .iter()
            .map(|p| self.cell_of(p, pose))
            .collect()
    }

    /// Save the map as JSON.
    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), std::io::Error> {
        let file = std::fs::File::create(path)?;

        serde_json::to_writer(file, self).map_err(std::io::Error::from)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn per_output(nav: Vec<EgoPoint>, obs: Vec<EgoPoint>, sample: Vec<EgoPoint>) -> PerOutput {
        PerOutput {
            navigable: EgoPoints::from_points(nav),
            obstacle: EgoPoints::from_points(obs),
            sample: EgoPoints::from_points(sample),
            clearance: 0.0,
        }
    }

    fn pose_at(x: f64, y: f64, yaw_deg: f64) -> Pose {
        Pose {
            position_m: Vector2::new(x, y),
            yaw_deg,
            ..Default::default()
        }
    }

    #[test]
    fn test_cell_of() {
        let map = WorldMap::new(WorldMapParams::default());

        // 2.5 m ahead of a rover facing +y
        let p = EgoPoint { x: 25.0, y: 0.0 };
        assert_eq!(map.cell_of(&p, &pose_at(100.0, 100.0, 90.0)), (100, 102));

        // 1.5 m to the left of a rover facing +x
        let p = EgoPoint { x: 0.0, y: 15.0 };
        assert_eq!(map.cell_of(&p, &pose_at(100.0, 100.0, 0.0)), (100, 101));

        // Off the edges of the map
        let p = EgoPoint { x: 80.0, y: 0.0 };
        assert_eq!(map.cell_of(&p, &pose_at(199.5, 0.0, 0.0)), (199, 0));
        assert_eq!(map.cell_of(&p, &pose_at(2.0, 2.0, 180.0)), (0, 2));
    }

    #[test]
    fn test_indices_in_bounds() {
        let map = WorldMap::new(WorldMapParams::default());
        let p = EgoPoint { x: 79.0, y: -40.0 };

        for &(x, y) in &[(-1000.0, 50.0), (1e9, -1e9), (0.0, 0.0), (199.999, 199.999)] {
            for yaw in (0..360).step_by(15) {
                let (cx, cy) = map.cell_of(&p, &pose_at(x, y, yaw as f64));
                assert!(cx < 200 && cy < 200);
            }
        }
    }

    #[test]
    fn test_update() {
        let mut map = WorldMap::new(WorldMapParams::default());
        let pose = pose_at(50.0, 50.0, 0.0);

        // Two navigable points in the same cell count as one visit
        let per = per_output(
            vec![EgoPoint { x: 10.0, y: 0.0 }, EgoPoint { x: 12.0, y: 1.0 }],
            vec![EgoPoint { x: 30.0, y: 0.0 }],
            vec![EgoPoint { x: 50.0, y: 0.0 }],
        );

        assert!(map.update(&per, &pose));
        assert!(map.update(&per, &pose));

        assert_eq!(map.get(WorldMapLayer::Navigable, 51, 50), Some(2));
        assert_eq!(map.get(WorldMapLayer::Obstacle, 53, 50), Some(2));
        assert_eq!(map.get(WorldMapLayer::Sample, 55, 50), Some(255));
        assert_eq!(map.get(WorldMapLayer::Navigable, 0, 0), Some(0));
    }

    #[test]
    fn test_navigable_clears_obstacle() {
        let mut map = WorldMap::new(WorldMapParams::default());
        let pose = pose_at(50.0, 50.0, 0.0);

        let obs = per_output(vec![], vec![EgoPoint { x: 10.0, y: 0.0 }], vec![]);
        map.update(&obs, &pose);
        assert_eq!(map.get(WorldMapLayer::Obstacle, 51, 50), Some(1));

        let nav = per_output(vec![EgoPoint { x: 10.0, y: 0.0 }], vec![], vec![]);
        map.update(&nav, &pose);
        map.update(&obs, &pose);

        assert_eq!(map.get(WorldMapLayer::Obstacle, 51, 50), Some(0));

        Zip::from(map.layer(WorldMapLayer::Navigable))
            .and(map.layer(WorldMapLayer::Obstacle))
            .for_each(|&n, &o| assert!(n == 0 || o == 0));
    }

    #[test]
    fn test_saturation() {
        let mut map = WorldMap::new(WorldMapParams::default());
        let pose = pose_at(50.0, 50.0, 0.0);
        let per = per_output(vec![EgoPoint { x: 10.0, y: 0.0 }], vec![], vec![]);

        for _ in 0..300 {
            map.update(&per, &pose);
        }

        assert_eq!(map.get(WorldMapLayer::Navigable, 51, 50), Some(255));
    }

    #[test]
    fn test_not_level() {
        let mut map = WorldMap::new(WorldMapParams::default());
        let pose = Pose {
            pitch_deg: 3.0,
            ..pose_at(50.0, 50.0, 0.0)
        };
        let per = per_output(vec![EgoPoint { x: 10.0, y: 0.0 }], vec![], vec![]);

        assert!(!map.update(&per, &pose));
        assert!(map.data().iter().all(|&v| v == 0));
    }
}
