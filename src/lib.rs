//! Movable Passage - a tilt maze where the player builds the tunnel
//!
//! Core modules:
//! - `sim`: Board model, per-cell ball movement and the locked-path graph
//! - `renderer`: Draw-object selection and transforms handed to a rendering backend
//! - `config`: Level configuration (board size, component counts, asset names)
//! - `persistence`: Logical save data for restoring a level
//! - `level`: Level glue tying the board, the ball and the gestures together

pub mod config;
pub mod level;
pub mod persistence;
pub mod renderer;
pub mod sim;

pub use config::{ComponentConfig, LevelConfig};
pub use level::MovablePassageLevel;
pub use persistence::LevelSaveData;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Game configuration constants
pub mod consts {
    /// Tolerance used for "zero" velocities and for nudging the ball past a cell border
    pub const FLOAT_ERROR: f32 = 0.0001;
    /// Vectors shorter than this are not normalized
    pub const LENGTH_TOO_SMALL_TO_NORMALIZE: f32 = 0.001;
    /// Maximum in-cell movement steps per frame
    pub const MAX_MOVE_ITERATIONS: u32 = 200;

    /// Ball model diameter in model space
    pub const ORIGINAL_BALL_DIAMETER: f32 = 2.0;
    /// Edge length of every component model in model space
    pub const MODEL_SIZE: f32 = 2.0;

    /// Quadratic drag coefficient applied against the ball velocity
    pub const DRAG_CONSTANT: f32 = 0.2;
    /// Scale from tilt sensor readings to ball acceleration
    pub const ACCELERATION_ADJUSTMENT: f32 = 0.25;
    /// Visual roll speed multiplier
    pub const ROLL_SCALE_FACTOR: f32 = 10.0;

    /// Rows of fixed corridor the ball starts in
    pub const TILE_ROWS_FOR_START: u32 = 3;
    /// Rows used by the goal band at the top
    pub const TILE_ROWS_FOR_END: u32 = 2;

    /// Components parked off board are drawn smaller, on top of their rock
    pub const OFF_BOARD_SCALE: f32 = 2.0 / 3.0;
}

/// A grid cell address. Row 0 is the bottom row, column 0 the leftmost column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RowCol {
    pub row: u32,
    pub col: u32,
}

impl RowCol {
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

impl From<(u32, u32)> for RowCol {
    fn from((row, col): (u32, u32)) -> Self {
        Self { row, col }
    }
}

/// Rotate a vector counter-clockwise by whole quarter turns.
///
/// Exact for any input: quarter turns only swap and negate components.
#[inline]
pub fn rotate_quarter_turns(v: Vec2, quarter_turns: u32) -> Vec2 {
    match quarter_turns % 4 {
        0 => v,
        1 => Vec2::new(-v.y, v.x),
        2 => Vec2::new(-v.x, -v.y),
        _ => Vec2::new(v.y, -v.x),
    }
}

/// Angle in radians for a number of quarter turns
#[inline]
pub fn quarter_turn_angle(quarter_turns: u32) -> f32 {
    (quarter_turns % 4) as f32 * std::f32::consts::FRAC_PI_2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotate_quarter_turns() {
        let v = Vec2::new(1.0, 2.0);
        assert_eq!(rotate_quarter_turns(v, 0), v);
        assert_eq!(rotate_quarter_turns(v, 1), Vec2::new(-2.0, 1.0));
        assert_eq!(rotate_quarter_turns(v, 2), Vec2::new(-1.0, -2.0));
        assert_eq!(rotate_quarter_turns(v, 3), Vec2::new(2.0, -1.0));
        assert_eq!(rotate_quarter_turns(v, 4), v);
    }

    #[test]
    fn test_quarter_turns_match_float_rotation() {
        let v = Vec2::new(0.3, -0.7);
        for n in 0..4 {
            let expected = Vec2::from_angle(quarter_turn_angle(n)).rotate(v);
            assert!((rotate_quarter_turns(v, n) - expected).length() < 1e-5);
        }
    }

    #[test]
    fn test_row_col_from_tuple() {
        assert_eq!(RowCol::from((3, 4)), RowCol::new(3, 4));
    }
}
