//! Ball movement inside a single cell, in the component's unrotated frame
//!
//! Every shape the ball can roll through is either a corridor (straight,
//! T-junction, cross-junction, turn, dead end) handled by the junction helper,
//! or an open area (open, closed bottom, closed corner) handled by the
//! bounding-box helper. Positions are relative to the cell center.

use glam::Vec2;

use super::wall::{CellWall, NO_WALLS, WallPair};
use crate::consts::FLOAT_ERROR;

/// Asks the board whether the ball may leave through the given walls.
///
/// Walls are in the component's local frame; the answer is one flag per wall.
pub type NextWallCheck<'a> = dyn FnMut(Option<CellWall>, Option<CellWall>) -> (bool, bool) + 'a;

/// Result of moving the ball within one cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalMove {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Time left over after the ball reached a wall (0 when fully consumed)
    pub time_diff: f32,
    /// Walls the ball passed through into a neighbouring cell
    pub walls: WallPair,
}

/// Shapes the ball can move through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Straight,
    TJunction,
    CrossJunction,
    Turn,
    DeadEnd,
    Open,
    ClosedBottom,
    ClosedCorner,
}

impl Shape {
    /// Advance the ball through a cell of edge length `size`.
    pub fn move_local(
        self,
        size: f32,
        mut position: Vec2,
        mut velocity: Vec2,
        time_diff: f32,
        ball_radius: f32,
        check: &mut NextWallCheck<'_>,
    ) -> LocalMove {
        let half = size / 2.0;
        match self {
            Shape::Straight => {
                position.x = 0.0;
                velocity.x = 0.0;
                if velocity.y == 0.0 {
                    return LocalMove { position, velocity, time_diff, walls: NO_WALLS };
                }
                move_in_junction(size, position, velocity, time_diff, ball_radius, check)
            }
            Shape::TJunction => {
                let next = position + velocity * time_diff;
                block_positive(&mut position.y, &mut velocity.y, next.y);
                move_in_junction(size, position, velocity, time_diff, ball_radius, check)
            }
            Shape::CrossJunction => {
                move_in_junction(size, position, velocity, time_diff, ball_radius, check)
            }
            Shape::Turn => {
                let next = position + velocity * time_diff;
                block_positive(&mut position.y, &mut velocity.y, next.y);
                block_positive(&mut position.x, &mut velocity.x, next.x);
                move_in_junction(size, position, velocity, time_diff, ball_radius, check)
            }
            Shape::DeadEnd => {
                let next = position + velocity * time_diff;
                block_positive(&mut position.y, &mut velocity.y, next.y);
                position.x = 0.0;
                velocity.x = 0.0;
                move_in_junction(size, position, velocity, time_diff, ball_radius, check)
            }
            Shape::Open => {
                let bounds = OpenBounds {
                    left: Boundary::exit(-half),
                    right: Boundary::exit(half),
                    bottom: Boundary::exit(-half),
                    top: Boundary::exit(half),
                };
                move_in_open_area(&bounds, position, velocity, time_diff, ball_radius, check)
            }
            Shape::ClosedBottom => {
                let bounds = OpenBounds {
                    left: Boundary::exit(-half),
                    right: Boundary::exit(half),
                    bottom: Boundary::barrier(0.0),
                    top: Boundary::exit(half),
                };
                move_in_open_area(&bounds, position, velocity, time_diff, ball_radius, check)
            }
            Shape::ClosedCorner => {
                let bounds = OpenBounds {
                    left: Boundary::barrier(0.0),
                    right: Boundary::exit(half),
                    bottom: Boundary::barrier(0.0),
                    top: Boundary::exit(half),
                };
                move_in_open_area(&bounds, position, velocity, time_diff, ball_radius, check)
            }
        }
    }
}

/// Keep the ball out of the positive half of an axis
fn block_positive(p: &mut f32, speed: &mut f32, next: f32) {
    if next > 0.0 || *p > 0.0 {
        *p = 0.0;
        if *speed > 0.0 {
            *speed = 0.0;
        }
    }
}

/// Move the ball along whichever axis it is travelling fastest on, as if the
/// cell were a one-dimensional corridor.
fn move_in_junction(
    size: f32,
    position: Vec2,
    mut velocity: Vec2,
    time_diff: f32,
    ball_radius: f32,
    check: &mut NextWallCheck<'_>,
) -> LocalMove {
    if velocity == Vec2::ZERO {
        return LocalMove { position, velocity, time_diff, walls: NO_WALLS };
    }

    let half = size / 2.0;
    let mut next = position + velocity * time_diff;

    let walls = if (next.x - position.x).abs() > (next.y - position.y).abs() {
        let corridor = Corridor {
            low_wall: CellWall::Left,
            high_wall: CellWall::Right,
            half,
            ball_radius,
        };
        let walls = corridor.advance(&mut next.x, &mut velocity.x, check);
        if next.x.abs() > ball_radius / 4.0 {
            next.y = 0.0;
            velocity.y = 0.0;
        }
        walls
    } else {
        let corridor = Corridor {
            low_wall: CellWall::Down,
            high_wall: CellWall::Up,
            half,
            ball_radius,
        };
        let walls = corridor.advance(&mut next.y, &mut velocity.y, check);
        if next.y.abs() > ball_radius / 4.0 {
            next.x = 0.0;
            velocity.x = 0.0;
        }
        walls
    };

    LocalMove { position: next, velocity, time_diff: 0.0, walls }
}

struct Corridor {
    low_wall: CellWall,
    high_wall: CellWall,
    half: f32,
    ball_radius: f32,
}

impl Corridor {
    fn advance(&self, p: &mut f32, speed: &mut f32, check: &mut NextWallCheck<'_>) -> WallPair {
        let low = -self.half;
        let high = self.half;
        if *p <= low {
            self.cross(p, speed, self.low_wall, low, -1.0, check)
        } else if *p < low + self.ball_radius {
            self.approach(p, speed, self.low_wall, low, -1.0, check);
            NO_WALLS
        } else if *p >= high {
            self.cross(p, speed, self.high_wall, high, 1.0, check)
        } else if *p > high - self.ball_radius {
            self.approach(p, speed, self.high_wall, high, 1.0, check);
            NO_WALLS
        } else {
            NO_WALLS
        }
    }

    /// The ball reached the border: pass into the next cell or stop short of it.
    fn cross(
        &self,
        p: &mut f32,
        speed: &mut f32,
        wall: CellWall,
        border: f32,
        sign: f32,
        check: &mut NextWallCheck<'_>,
    ) -> WallPair {
        let (passable, _) = check(Some(wall), None);
        if passable {
            *p = border + sign * FLOAT_ERROR;
            (Some(wall), None)
        } else {
            *p = border - sign * self.ball_radius;
            *speed = 0.0;
            NO_WALLS
        }
    }

    /// The ball is touching the border region: stop it if the way is closed.
    fn approach(
        &self,
        p: &mut f32,
        speed: &mut f32,
        wall: CellWall,
        border: f32,
        sign: f32,
        check: &mut NextWallCheck<'_>,
    ) {
        let (passable, _) = check(Some(wall), None);
        if !passable {
            *p = border - sign * self.ball_radius;
            *speed = 0.0;
        }
    }
}

/// One side of an open area
#[derive(Debug, Clone, Copy)]
struct Boundary {
    pos: f32,
    /// True for a cell edge the ball may leave through, false for a barrier
    /// inside the cell that always stops it.
    is_cell_edge: bool,
}

impl Boundary {
    fn exit(pos: f32) -> Self {
        Self { pos, is_cell_edge: true }
    }

    fn barrier(pos: f32) -> Self {
        Self { pos, is_cell_edge: false }
    }
}

struct OpenBounds {
    left: Boundary,
    right: Boundary,
    bottom: Boundary,
    top: Boundary,
}

fn time_to(boundary: f32, p: f32, v: f32) -> f32 {
    if v.abs() < FLOAT_ERROR { -1.0 } else { (boundary - p) / v }
}

/// Bounding-box movement for the open shapes. Finds the first side the ball
/// reaches within `time_diff`, plus a second side when it leaves through a corner.
fn move_in_open_area(
    bounds: &OpenBounds,
    position: Vec2,
    mut velocity: Vec2,
    time_diff: f32,
    ball_radius: f32,
    check: &mut NextWallCheck<'_>,
) -> LocalMove {
    let candidates = [
        (time_to(bounds.right.pos, position.x, velocity.x), CellWall::Right),
        (time_to(bounds.left.pos, position.x, velocity.x), CellWall::Left),
        (time_to(bounds.top.pos, position.y, velocity.y), CellWall::Up),
        (time_to(bounds.bottom.pos, position.y, velocity.y), CellWall::Down),
    ];

    let first = candidates
        .iter()
        .filter(|(t, _)| *t >= FLOAT_ERROR)
        .fold(None::<(f32, CellWall)>, |best, &(t, wall)| match best {
            Some((best_t, _)) if best_t <= t => best,
            _ => Some((t, wall)),
        });

    let (consumed, mut wall1) = match first {
        Some((t, wall)) if t <= time_diff => (t, Some(wall)),
        _ => (time_diff, None),
    };

    let mut next = position + velocity * consumed;
    let remaining = time_diff - consumed;

    let vertical_overshoot = if next.y > bounds.top.pos {
        Some(CellWall::Up)
    } else if next.y < bounds.bottom.pos {
        Some(CellWall::Down)
    } else {
        None
    };
    let horizontal_overshoot = if next.x > bounds.right.pos {
        Some(CellWall::Right)
    } else if next.x < bounds.left.pos {
        Some(CellWall::Left)
    } else {
        None
    };

    let mut wall2 = match wall1 {
        None => {
            wall1 = vertical_overshoot;
            horizontal_overshoot
        }
        Some(first_wall) => {
            // Reaching both sides at the same instant means leaving through a corner.
            let simultaneous = candidates
                .iter()
                .find(|(t, wall)| {
                    wall.is_horizontal_exit() != first_wall.is_horizontal_exit()
                        && *t >= FLOAT_ERROR
                        && (*t - consumed).abs() <= FLOAT_ERROR
                })
                .map(|&(_, wall)| wall);
            let overshoot = if first_wall.is_horizontal_exit() {
                vertical_overshoot
            } else {
                horizontal_overshoot
            };
            overshoot.or(simultaneous)
        }
    };

    // Barriers inside the cell stop the ball where it touches them.
    let mut stop_at_barrier = |boundary: Boundary, wall: CellWall, p: &mut f32, v: &mut f32| {
        if boundary.is_cell_edge {
            return;
        }
        if wall1 == Some(wall) {
            wall1 = None;
        } else if wall2 == Some(wall) {
            wall2 = None;
        } else {
            return;
        }
        *p = boundary.pos;
        *v = 0.0;
    };
    stop_at_barrier(bounds.left, CellWall::Left, &mut next.x, &mut velocity.x);
    stop_at_barrier(bounds.right, CellWall::Right, &mut next.x, &mut velocity.x);
    stop_at_barrier(bounds.top, CellWall::Up, &mut next.y, &mut velocity.y);
    stop_at_barrier(bounds.bottom, CellWall::Down, &mut next.y, &mut velocity.y);

    if wall1.is_none() && wall2.is_none() {
        return LocalMove { position: next, velocity, time_diff: remaining, walls: NO_WALLS };
    }

    let (pass1, pass2) = check(wall1, wall2);
    let settle = |wall: CellWall, border: f32, sign: f32, p: &mut f32, v: &mut f32| {
        let hit1 = wall1 == Some(wall);
        let hit2 = wall2 == Some(wall);
        if (pass1 && hit1) || (pass2 && hit2) {
            *p = border + sign * FLOAT_ERROR;
        } else if hit1 || hit2 {
            *p = border - sign * ball_radius;
            *v = 0.0;
        }
    };
    settle(CellWall::Left, bounds.left.pos, -1.0, &mut next.x, &mut velocity.x);
    settle(CellWall::Right, bounds.right.pos, 1.0, &mut next.x, &mut velocity.x);
    settle(CellWall::Down, bounds.bottom.pos, -1.0, &mut next.y, &mut velocity.y);
    settle(CellWall::Up, bounds.top.pos, 1.0, &mut next.y, &mut velocity.y);

    let walls = (wall1.filter(|_| pass1), wall2.filter(|_| pass2));
    LocalMove { position: next, velocity, time_diff: remaining, walls }
}
