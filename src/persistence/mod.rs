//! Level save data
//!
//! Features:
//! - Versioned logical save shape, serde encoded
//! - JSON helpers for callers without their own encoding
//! - Version check on load
//!
//! The data is only checked for shape here; whether it fits a level is
//! decided by [`crate::MovablePassageLevel::from_save`].

use anyhow::{Context, ensure};
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::RowCol;
use crate::renderer::ObjReference;

/// Current save format version
pub const SAVE_VERSION: u32 = 1;

/// Where one placement sits and how far it is turned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementSaveData {
    pub row: u32,
    pub col: u32,
    pub nbr_90_degree_rotations: u32,
}

impl PlacementSaveData {
    pub fn rc(&self) -> RowCol {
        RowCol::new(self.row, self.col)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSaveData {
    pub version: u32,

    /// Every placement of each playable type, in creation order
    pub straight_positions: Vec<PlacementSaveData>,
    pub tjunction_positions: Vec<PlacementSaveData>,
    pub crossjunction_positions: Vec<PlacementSaveData>,
    pub turn_positions: Vec<PlacementSaveData>,

    /// Cells of the locked path, from the tunnel cell under the building area
    pub path_locked_in_place: Vec<RowCol>,

    /// Draw object of each cell's primary occupant, `[row][col]`, end rows excluded
    pub game_board_obj_references: Vec<Vec<Option<ObjReference>>>,

    pub ball_rc: RowCol,
    /// Ball x, y in world space; z follows from the ball's cell
    pub ball_position: Vec2,
}

impl LevelSaveData {
    pub fn to_json(&self) -> anyhow::Result<String> {
        serde_json::to_string(self).context("failed to encode level save data")
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let data: Self = serde_json::from_str(json).context("level save data is not valid JSON")?;
        ensure!(
            data.version == SAVE_VERSION,
            "unsupported save version {} (expected {})",
            data.version,
            SAVE_VERSION
        );
        Ok(data)
    }
}
