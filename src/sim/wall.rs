//! Cell walls and the quarter-turn arithmetic used to rotate them
//!
//! Walls are numbered counter-clockwise starting at +x, so rotating a wall
//! forward by one quarter turn is just `+1 mod 4`.

use serde::{Deserialize, Serialize};

/// One side of a grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellWall {
    Right = 0,
    Up = 1,
    Left = 2,
    Down = 3,
}

/// The walls (if any) the ball crossed during one movement step.
///
/// Two walls are reported when the ball leaves through a corner.
pub type WallPair = (Option<CellWall>, Option<CellWall>);

/// Nothing crossed
pub const NO_WALLS: WallPair = (None, None);

impl CellWall {
    pub const ALL: [CellWall; 4] = [CellWall::Right, CellWall::Up, CellWall::Left, CellWall::Down];

    #[inline]
    pub fn index(self) -> u32 {
        self as u32
    }

    #[inline]
    pub fn from_index(index: u32) -> Self {
        match index % 4 {
            0 => CellWall::Right,
            1 => CellWall::Up,
            2 => CellWall::Left,
            _ => CellWall::Down,
        }
    }

    /// Rotate counter-clockwise by `quarter_turns`
    #[inline]
    pub fn rotated(self, quarter_turns: u32) -> Self {
        Self::from_index(self.index() + quarter_turns % 4)
    }

    /// Rotate clockwise by `quarter_turns` (the inverse of [`CellWall::rotated`])
    #[inline]
    pub fn rotated_back(self, quarter_turns: u32) -> Self {
        Self::from_index(self.index() + 4 - quarter_turns % 4)
    }

    /// The same wall seen from the neighbouring cell
    #[inline]
    pub fn opposite(self) -> Self {
        self.rotated(2)
    }

    pub fn is_horizontal_exit(self) -> bool {
        matches!(self, CellWall::Left | CellWall::Right)
    }

    /// Row and column delta for stepping through this wall
    pub fn step(self) -> (i32, i32) {
        match self {
            CellWall::Right => (0, 1),
            CellWall::Up => (1, 0),
            CellWall::Left => (0, -1),
            CellWall::Down => (-1, 0),
        }
    }
}

/// Fixed set of solid walls for a component shape, in its unrotated frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WallMask(u8);

impl WallMask {
    pub const NONE: WallMask = WallMask(0);
    pub const ALL: WallMask = WallMask(0b1111);

    pub const fn of(walls: &[CellWall]) -> Self {
        let mut bits = 0u8;
        let mut i = 0;
        while i < walls.len() {
            bits |= 1 << walls[i] as u8;
            i += 1;
        }
        WallMask(bits)
    }

    #[inline]
    pub fn contains(self, wall: CellWall) -> bool {
        self.0 & (1 << wall.index()) != 0
    }

    pub fn count(self) -> u32 {
        self.0.count_ones()
    }
}
