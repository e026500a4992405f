//! The movable passage level
//!
//! Ties the board, the ball and the player's gestures together:
//! - Lays the board out from a [`LevelConfig`] and stages the playable pieces
//! - Restores a level from [`LevelSaveData`]
//! - Integrates the ball each frame and tracks the locked path
//! - Produces the draw list for a rendering backend
//!
//! Draw object references index into the model and texture lists the config
//! gives for each component type. Locked-in-place references pair the same
//! models with `placement_locked_in_place_texture`.

mod ball;
mod draw;
mod layout;
mod tick;

pub use ball::Ball;
pub use layout::Layout;

use anyhow::ensure;
use glam::{Vec2, Vec3};
use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::RowCol;
use crate::config::LevelConfig;
use crate::consts::*;
use crate::persistence::{LevelSaveData, PlacementSaveData, SAVE_VERSION};
use crate::renderer::{DrawItem, ObjReference, build_obj_references, obj_candidates};
use crate::sim::{
    BlockType, ComponentSet, ComponentType, GameBoard, PlacementRef, path_locked_in_place,
    restore_path_locked_in_place,
};

pub struct MovablePassageLevel {
    board: GameBoard,
    layout: Layout,
    ball: Ball,
    ball_rc: RowCol,
    /// Surface diagonal; the ball must move a fraction of it to need a redraw
    diagonal: f32,
    maze_floor_z: f32,
    rng: Pcg32,
    /// Goal band and border rocks, fixed for the life of the level
    scenery: Vec<DrawItem>,
    finished: bool,
}

impl MovablePassageLevel {
    /// Fresh level with every playable piece in the staging area
    pub fn new(config: &LevelConfig) -> anyhow::Result<Self> {
        Self::build(config, None)
    }

    /// Level as it was when `save` was taken
    pub fn from_save(config: &LevelConfig, save: &LevelSaveData) -> anyhow::Result<Self> {
        Self::build(config, Some(save))
    }

    fn build(config: &LevelConfig, save: Option<&LevelSaveData>) -> anyhow::Result<Self> {
        config.validate()?;
        let layout = Layout::compute(config);
        let mut board = layout.build_board(config);
        assign_obj_references(board.components_mut(), config);

        let (ball_rc, ball_position) = match save {
            Some(save) => {
                ensure!(
                    save.version == SAVE_VERSION,
                    "unsupported save version {} (expected {})",
                    save.version,
                    SAVE_VERSION
                );
                restore_placements(&mut board, save)?;
                let rc = save.ball_rc;
                ensure!(
                    rc.row < layout.rows && rc.col < layout.cols,
                    "ball cell ({}, {}) is outside the {}x{} board",
                    rc.row,
                    rc.col,
                    layout.rows,
                    layout.cols
                );
                check_path_leads_to_ball(&layout, &save.path_locked_in_place, rc)?;
                restore_path_locked_in_place(&mut board, &save.path_locked_in_place)?;
                (rc, save.ball_position.extend(board.position(rc).z))
            }
            None => {
                layout.stage_playable(&mut board)?;
                let rc = RowCol::new(0, layout.cols / 2);
                (rc, board.position(rc))
            }
        };

        layout.add_rocks_and_fillers(&mut board, &config.rock_placements)?;
        if let Some(save) = save {
            restore_obj_references(&mut board, &layout, &save.game_board_obj_references)?;
        }
        // A level saved after the win keeps the ball in the End cell.
        let finished = ball_rc == layout.end_rc();
        ensure!(
            finished || board.block(ball_rc).component_type().is_some_and(|t| !t.is_filler()),
            "ball cell ({}, {}) is not one the ball can roll in",
            ball_rc.row,
            ball_rc.col
        );

        let mut level = Self {
            board,
            layout,
            ball: Ball::new(ball_position),
            ball_rc,
            diagonal: (config.surface_width.powi(2) + config.surface_height.powi(2)).sqrt(),
            maze_floor_z: config.maze_floor_z,
            rng: Pcg32::seed_from_u64(config.seed),
            scenery: Vec::new(),
            finished,
        };
        level.scenery = level.build_scenery();

        log::info!(
            "movable passage level {}: {}x{} board, tile {:.3}, {} playable pieces",
            if save.is_some() { "restored" } else { "created" },
            layout.rows,
            layout.cols,
            layout.tile_size,
            config.number_playable()
        );
        Ok(level)
    }

    pub fn board(&self) -> &GameBoard {
        &self.board
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn ball(&self) -> &Ball {
        &self.ball
    }

    pub fn ball_rc(&self) -> RowCol {
        self.ball_rc
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Ball model scale: half a tile across
    pub fn scale_ball(&self) -> f32 {
        self.layout.tile_size / 2.0 / ORIGINAL_BALL_DIAMETER
    }

    pub fn ball_radius(&self) -> f32 {
        ORIGINAL_BALL_DIAMETER * self.scale_ball() / 2.0
    }

    /// Take a tilt sensor reading
    pub fn update_acceleration(&mut self, x: f32, y: f32, z: f32) {
        self.ball.update_acceleration(x, y, z);
    }

    /// Start or continue dragging a piece. Positions are world space on the
    /// maze floor. Returns true if a redraw is needed.
    pub fn drag(&mut self, start_position: Vec2, distance: Vec2) -> bool {
        self.board.drag(start_position, distance)
    }

    /// Drop the dragged piece. Returns true if a redraw is needed.
    pub fn drag_ended(&mut self, end_position: Vec2) -> bool {
        self.board.drag_ended(end_position)
    }

    /// Turn the piece under `position` a quarter turn
    pub fn tap(&mut self, position: Vec2) -> bool {
        let rotated = self.board.tap(position);
        if rotated {
            log::debug!("rotated piece at {:?}", self.board.find_rc(position));
        }
        rotated
    }

    /// Where the level-finished effect should be centered: the End cell
    pub fn level_finisher_center(&self) -> Vec3 {
        self.board.end_band_position(self.layout.end_column)
    }

    /// Cells of the locked path, from the fixed cell under the building area
    pub fn path_locked_in_place(&self) -> Vec<RowCol> {
        path_locked_in_place(&self.board, self.layout.path_start())
    }

    pub fn save_data(&self) -> LevelSaveData {
        let components = self.board.components();
        let positions = |component_type: ComponentType| {
            components
                .get(component_type)
                .placements()
                .iter()
                .map(|p| PlacementSaveData {
                    row: p.row(),
                    col: p.col(),
                    nbr_90_degree_rotations: p.rotation_count(),
                })
                .collect::<Vec<_>>()
        };

        let game_board_obj_references = (0..self.layout.end_row())
            .map(|row| {
                (0..self.layout.cols)
                    .map(|col| {
                        self.board
                            .block(RowCol::new(row, col))
                            .component()
                            .and_then(|r| components.placement(r).obj_reference())
                    })
                    .collect()
            })
            .collect();

        LevelSaveData {
            version: SAVE_VERSION,
            straight_positions: positions(ComponentType::Straight),
            tjunction_positions: positions(ComponentType::TJunction),
            crossjunction_positions: positions(ComponentType::CrossJunction),
            turn_positions: positions(ComponentType::Turn),
            path_locked_in_place: self.path_locked_in_place(),
            game_board_obj_references,
            ball_rc: self.ball_rc,
            ball_position: self.ball.position.truncate(),
        }
    }
}

/// Give every drawn component its model/texture variants
fn assign_obj_references(components: &mut ComponentSet, config: &LevelConfig) {
    // One model and one texture per playable type
    for component_type in ComponentType::PLAYABLE {
        let component = components.get_mut(component_type);
        component.set_obj_references(build_obj_references(false, 1, 1));
        component.set_obj_references_locked(build_obj_references(true, 1, 1));
    }

    // Fillers and the start area look the same whether or not they can move.
    let fixed = [
        (ComponentType::NoMovementDirt, &config.dirt_models, &config.dirt_textures),
        (ComponentType::NoMovementRock, &config.rock_models, &config.rock_textures),
        (
            ComponentType::ClosedBottom,
            &config.beginning_side_models,
            &config.beginning_side_textures,
        ),
        (
            ComponentType::Open,
            &config.beginning_open_models,
            &config.beginning_open_textures,
        ),
        (
            ComponentType::ClosedCorner,
            &config.beginning_corner_models,
            &config.beginning_corner_textures,
        ),
    ];
    for (component_type, models, textures) in fixed {
        components
            .get_mut(component_type)
            .set_obj_references(build_obj_references(false, models.len(), textures.len()));
    }
}

/// The locked path starts at the fixed cell under the building area and ends
/// where the ball is, or at the exit when the ball has rolled on into the top
/// tunnel. Without a path the ball has not left the start area.
fn check_path_leads_to_ball(
    layout: &Layout,
    path: &[RowCol],
    ball_rc: RowCol,
) -> anyhow::Result<()> {
    let (Some(&first), Some(&last)) = (path.first(), path.last()) else {
        ensure!(
            ball_rc.row < layout.building_start.row,
            "ball cell ({}, {}) is past the start area but no path is locked",
            ball_rc.row,
            ball_rc.col
        );
        return Ok(());
    };

    ensure!(path.len() > 1, "locked path of a single cell");
    let start = layout.path_start();
    ensure!(
        first == start,
        "locked path starts at ({}, {}) instead of ({}, {})",
        first.row,
        first.col,
        start.row,
        start.col
    );
    let exit = RowCol::new(layout.building_end.row, layout.end_column);
    let past_exit = ball_rc.col == layout.end_column && ball_rc.row > exit.row;
    ensure!(
        ball_rc == last || (past_exit && last == exit),
        "locked path ends at ({}, {}) but the ball is at ({}, {})",
        last.row,
        last.col,
        ball_rc.row,
        ball_rc.col
    );
    Ok(())
}

/// Put the playable pieces (and the tunnel pieces) back where they were saved
fn restore_placements(board: &mut GameBoard, save: &LevelSaveData) -> anyhow::Result<()> {
    let rows = board.height_in_tiles();
    let cols = board.width_in_tiles();
    let saved = [
        (ComponentType::Straight, &save.straight_positions),
        (ComponentType::TJunction, &save.tjunction_positions),
        (ComponentType::CrossJunction, &save.crossjunction_positions),
        (ComponentType::Turn, &save.turn_positions),
    ];

    for (component_type, positions) in saved {
        let expected = board.components().get(component_type).nbr_placements();
        ensure!(
            positions.len() == expected,
            "save has {} {:?} placements, the level has {}",
            positions.len(),
            component_type,
            expected
        );

        for (index, saved) in positions.iter().enumerate() {
            let rc = saved.rc();
            ensure!(
                rc.row < rows && rc.col < cols,
                "{:?} {} saved at ({}, {}) is outside the board",
                component_type,
                index,
                rc.row,
                rc.col
            );
            let r = PlacementRef::new(component_type, index);
            let block = board.block(rc);
            ensure!(
                matches!(block.block_type(), BlockType::OnBoard | BlockType::OffBoard),
                "{:?} {} saved at ({}, {}) in the {:?} area",
                component_type,
                index,
                rc.row,
                rc.col,
                block.block_type()
            );
            ensure!(
                block.component().is_none_or(|other| other == r),
                "{:?} {} saved at ({}, {}) on top of {:?}",
                component_type,
                index,
                rc.row,
                rc.col,
                block.component_type()
            );

            let placement = board.components_mut().placement_mut(r);
            ensure!(
                !placement.locked_into_place() || placement.rc() == rc,
                "fixed {:?} {} saved away from ({}, {})",
                component_type,
                index,
                placement.row(),
                placement.col()
            );
            for _ in 0..saved.nbr_90_degree_rotations % 4 {
                placement.rotate();
            }
            placement.set_rc(rc);
            board.block_mut(rc).set_component(Some(r));
        }
    }
    Ok(())
}

fn restore_obj_references(
    board: &mut GameBoard,
    layout: &Layout,
    grid: &[Vec<Option<ObjReference>>],
) -> anyhow::Result<()> {
    ensure!(
        grid.len() == layout.end_row() as usize
            && grid.iter().all(|row| row.len() == layout.cols as usize),
        "saved draw objects do not cover the {}x{} board",
        layout.end_row(),
        layout.cols
    );
    for (row, cells) in grid.iter().enumerate() {
        for (col, obj) in cells.iter().enumerate() {
            let Some(obj) = obj else {
                continue;
            };
            let rc = RowCol::new(row as u32, col as u32);
            let Some(r) = board.block(rc).component() else {
                continue;
            };
            // Unknown variants are dropped and chosen afresh on the next draw.
            if obj_candidates(board.components(), r).contains(obj) {
                board.components_mut().placement_mut(r).set_obj_reference(*obj);
            } else {
                log::debug!(
                    "dropping saved draw object {:?} for {:?} at {:?}",
                    obj,
                    r.component,
                    rc
                );
            }
        }
    }
    Ok(())
}
