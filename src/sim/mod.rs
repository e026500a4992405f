//! Board simulation module
//!
//! Everything the ball and the player's edits touch lives here:
//! - Walls and component shapes
//! - Per-cell ball movement in the component's own frame
//! - The board grid and its drag/drop/tap gestures
//! - The locked path the ball has validated
//!
//! Nothing here renders or reads input devices.

pub mod board;
pub mod component;
pub mod movement;
pub mod path;
pub mod placement;
pub mod wall;

pub use board::{BlockType, GameBoard, GameBoardBlock};
pub use component::{Component, ComponentSet, ComponentType};
pub use movement::{LocalMove, NextWallCheck, Shape};
pub use path::{block_unblock_placements, path_locked_in_place, restore_path_locked_in_place};
pub use placement::{Placement, PlacementRef};
pub use wall::{CellWall, NO_WALLS, WallMask, WallPair};
