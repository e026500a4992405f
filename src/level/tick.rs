//! Per-frame ball update

use super::MovablePassageLevel;
use crate::RowCol;
use crate::consts::*;
use crate::sim::{BlockType, CellWall, NO_WALLS, WallPair, block_unblock_placements};

/// The cell entered by leaving `rc` through the given walls
fn cell_across(rc: RowCol, (wall1, wall2): WallPair) -> RowCol {
    let crossed = |wall: CellWall| wall1 == Some(wall) || wall2 == Some(wall);
    let mut next = rc;
    if crossed(CellWall::Left) {
        next.col -= 1;
    } else if crossed(CellWall::Right) {
        next.col += 1;
    }
    if crossed(CellWall::Down) {
        next.row -= 1;
    } else if crossed(CellWall::Up) {
        next.row += 1;
    }
    next
}

impl MovablePassageLevel {
    /// Advance the ball by `time_diff` seconds. Returns true if a redraw is needed.
    ///
    /// The ball moves cell by cell until the time is used up, it comes to
    /// rest or it reaches the End cell. Entering a cell outside the start area
    /// updates the locked path.
    pub fn update_data(&mut self, time_diff: f32) -> bool {
        if self.finished || time_diff < FLOAT_ERROR {
            return false;
        }

        self.ball.velocity = self.ball.updated_velocity(time_diff);
        if self.ball.velocity.length() < FLOAT_ERROR {
            return false;
        }

        let ball_radius = self.ball_radius();
        let mut remaining = time_diff;
        let mut path_changed = false;
        let mut iterations = 0;
        loop {
            if iterations == MAX_MOVE_ITERATIONS {
                log::warn!(
                    "ball still moving after {} cell steps, {:.4}s left this frame",
                    iterations,
                    remaining
                );
                break;
            }
            iterations += 1;

            let cell_center = self.board.position(self.ball_rc).truncate();
            let mut offset = self.ball.position.truncate() - cell_center;
            let walls = self
                .board
                .move_ball_in_cell(
                    self.ball_rc,
                    &mut offset,
                    &mut remaining,
                    &mut self.ball.velocity,
                    ball_radius,
                )
                .unwrap_or_else(|| {
                    panic!("ball is in cell {:?}, which it cannot roll in", self.ball_rc)
                });
            let position = cell_center + offset;
            self.ball.position.x = position.x;
            self.ball.position.y = position.y;

            if walls == NO_WALLS {
                break;
            }

            let from = self.ball_rc;
            let to = cell_across(from, walls);
            self.ball_rc = to;
            let from_block = *self.board.block(from);
            let to_block = *self.board.block(to);

            if to_block.block_type() == BlockType::End {
                self.finished = true;
                log::info!("ball reached the end at {:?}", to);
                break;
            }

            if from_block.block_type() != BlockType::Begin
                || to_block.block_type() != BlockType::Begin
            {
                let (Some(old), Some(new)) = (from_block.component(), to_block.component()) else {
                    panic!("ball moved from {from:?} to {to:?} but one of them is empty");
                };
                block_unblock_placements(self.board.components_mut(), old, new);
                path_changed = true;
                log::debug!("ball moved from {:?} to {:?}", from, to);
            }

            if remaining < FLOAT_ERROR || self.ball.velocity.length() < FLOAT_ERROR {
                break;
            }
        }

        self.ball.update_rotation(time_diff);
        let moved = self.ball.drawing_necessary(self.diagonal);
        path_changed || self.finished || moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LevelConfig;
    use crate::level::Ball;
    use glam::Vec2;

    fn level_with_ball_at(rc: RowCol) -> MovablePassageLevel {
        let mut level = MovablePassageLevel::new(&LevelConfig::default()).unwrap();
        level.ball_rc = rc;
        level.ball = Ball::new(level.board.position(rc));
        level
    }

    fn run(level: &mut MovablePassageLevel, frames: usize) {
        for _ in 0..frames {
            level.update_data(0.05);
        }
    }

    #[test]
    fn test_cell_across() {
        let rc = RowCol::new(4, 4);
        assert_eq!(cell_across(rc, (Some(CellWall::Right), None)), RowCol::new(4, 5));
        assert_eq!(cell_across(rc, (None, Some(CellWall::Down))), RowCol::new(3, 4));
        assert_eq!(
            cell_across(rc, (Some(CellWall::Up), Some(CellWall::Left))),
            RowCol::new(5, 3)
        );
    }

    #[test]
    fn test_no_update_without_time_or_speed() {
        let mut level = level_with_ball_at(RowCol::new(0, 3));
        assert!(!level.update_data(0.0));
        assert!(!level.update_data(0.05));
        assert_eq!(level.ball().position, level.board.position(RowCol::new(0, 3)));
    }

    #[test]
    fn test_start_area_is_not_tracked() {
        let mut level = level_with_ball_at(RowCol::new(0, 3));
        level.update_acceleration(0.0, -4.0, 0.0);
        assert!(level.update_data(0.05));
        run(&mut level, 100);
        // The top of the start area is closed above column 3.
        assert_eq!(level.ball_rc(), RowCol::new(2, 3));
        assert!(level.path_locked_in_place().is_empty());
        let cell = level.board.position(RowCol::new(2, 3));
        assert!((level.ball().position.y - cell.y).abs() <= level.layout().tile_size / 2.0);
    }

    #[test]
    fn test_ball_enters_start_tunnel_through_opening() {
        let mut level = level_with_ball_at(RowCol::new(2, 2));
        level.update_acceleration(0.0, -4.0, 0.0);
        run(&mut level, 100);
        // Tunnel, then dirt above the empty first cell.
        assert_eq!(level.ball_rc(), RowCol::new(3, 2));
        assert!(level.path_locked_in_place().is_empty());
    }

    #[test]
    fn test_backing_up_unlocks() {
        let mut level = level_with_ball_at(RowCol::new(3, 2));
        let straight = level.board.block(RowCol::new(3, 0)).component().unwrap();
        let start = level.board.position(RowCol::new(3, 0)).truncate();
        let target = level.board.position(RowCol::new(4, 2)).truncate();
        assert!(level.drag(start, Vec2::ZERO));
        assert!(level.drag_ended(target));

        level.update_acceleration(0.0, -4.0, 0.0);
        run(&mut level, 100);
        assert_eq!(level.ball_rc(), RowCol::new(4, 2));
        assert!(!level.board.components().placement(straight).movement_allowed());
        assert!(!level.drag(target, Vec2::ZERO));

        level.update_acceleration(0.0, 4.0, 0.0);
        run(&mut level, 100);
        // Back through the tunnel and down to the floor of the start area.
        assert_eq!(level.ball_rc(), RowCol::new(0, 2));
        assert!(level.path_locked_in_place().is_empty());
        assert!(level.board.components().placement(straight).movement_allowed());
    }

    #[test]
    fn test_reaching_end_finishes_level() {
        let mut level = level_with_ball_at(RowCol::new(9, 3));
        level.update_acceleration(0.0, -4.0, 0.0);
        let mut redraws = 0;
        for _ in 0..100 {
            if level.update_data(0.05) {
                redraws += 1;
            }
            if level.is_finished() {
                break;
            }
        }
        assert!(level.is_finished());
        assert!(redraws > 0);
        assert_eq!(level.ball_rc(), level.layout().end_rc());
        // Nothing moves once the level is won.
        let position = level.ball().position;
        assert!(!level.update_data(0.05));
        assert_eq!(level.ball().position, position);
    }

    #[test]
    fn test_ball_stays_in_its_cell_bounds() {
        let mut level = level_with_ball_at(RowCol::new(1, 3));
        let tilts = [(1.0, 0.3), (-0.2, -1.0), (-1.0, 0.7), (0.5, 1.0), (0.0, -2.0)];
        for (x, y) in tilts {
            level.update_acceleration(x, y, 0.0);
            for _ in 0..40 {
                level.update_data(0.05);
                let cell = level.board.position(level.ball_rc()).truncate();
                let offset = level.ball().position.truncate() - cell;
                let half = level.layout().tile_size / 2.0 + 2.0 * FLOAT_ERROR;
                assert!(offset.x.abs() <= half && offset.y.abs() <= half, "{offset:?}");
            }
        }
    }
}
