//! The game board: a grid of cells, world <-> cell mapping and the drag, drop
//! and tap gestures that rearrange placements

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::component::{ComponentSet, ComponentType};
use super::movement::NextWallCheck;
use super::placement::PlacementRef;
use super::wall::{CellWall, WallPair};
use crate::RowCol;

/// Which area of the board a cell belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BlockType {
    /// Fixed starting corridor
    Begin,
    /// Where the ball rolls and the player builds the path
    OnBoard,
    /// Staging area for components not yet placed
    #[default]
    OffBoard,
    /// Goal band filler
    EndOffBoard,
    /// The one exit cell
    End,
}

/// One grid cell and its occupants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GameBoardBlock {
    block_type: BlockType,
    component: Option<PlacementRef>,
    /// Filler kept under a movable component, or the displaced occupant during a swap
    secondary: Option<PlacementRef>,
}

impl GameBoardBlock {
    pub fn block_type(&self) -> BlockType {
        self.block_type
    }

    pub fn component(&self) -> Option<PlacementRef> {
        self.component
    }

    pub fn secondary(&self) -> Option<PlacementRef> {
        self.secondary
    }

    pub fn set_block_type(&mut self, block_type: BlockType) {
        self.block_type = block_type;
    }

    pub fn set_component(&mut self, component: Option<PlacementRef>) {
        self.component = component;
    }

    pub fn set_secondary(&mut self, secondary: Option<PlacementRef>) {
        self.secondary = secondary;
    }

    /// Primary occupant's type
    pub fn component_type(&self) -> Option<ComponentType> {
        self.component.map(|c| c.component)
    }

    pub fn secondary_type(&self) -> Option<ComponentType> {
        self.secondary.map(|c| c.component)
    }
}

#[derive(Debug, Clone)]
pub struct GameBoard {
    nbr_tile_rows_for_start: u32,
    nbr_tile_rows_for_end: u32,
    width: f32,
    height: f32,
    /// x, y center of the board; z is where the tops of the components go
    center_pos: Vec3,
    block_size: f32,
    blocks: Vec<Vec<GameBoardBlock>>,
    components: ComponentSet,
    /// Cell the in-progress drag started from
    moving_from: Option<RowCol>,
}

impl Default for GameBoard {
    fn default() -> Self {
        Self {
            nbr_tile_rows_for_start: 0,
            nbr_tile_rows_for_end: 0,
            width: 0.0,
            height: 0.0,
            center_pos: Vec3::ZERO,
            block_size: 0.0,
            blocks: Vec::new(),
            components: ComponentSet::new(0.0),
            moving_from: None,
        }
    }
}

impl GameBoard {
    /// Size the grid. Every cell starts off board and empty.
    pub fn initialize(
        &mut self,
        tile_size: f32,
        center_pos: Vec3,
        rows: u32,
        cols: u32,
        nbr_tile_rows_for_start: u32,
        nbr_tile_rows_for_end: u32,
    ) {
        self.nbr_tile_rows_for_start = nbr_tile_rows_for_start;
        self.nbr_tile_rows_for_end = nbr_tile_rows_for_end;
        self.block_size = tile_size;
        self.width = cols as f32 * tile_size;
        self.height = rows as f32 * tile_size;
        self.center_pos = center_pos;
        self.blocks = vec![vec![GameBoardBlock::default(); cols as usize]; rows as usize];
        self.components.set_size(tile_size);
        self.moving_from = None;
    }

    pub fn width_in_tiles(&self) -> u32 {
        self.blocks.first().map_or(0, |r| r.len() as u32)
    }

    pub fn height_in_tiles(&self) -> u32 {
        self.blocks.len() as u32
    }

    pub fn block_size(&self) -> f32 {
        self.block_size
    }

    pub fn center_pos(&self) -> Vec3 {
        self.center_pos
    }

    pub fn set_center_pos(&mut self, pos: Vec3) {
        self.center_pos = pos;
    }

    pub fn nbr_tile_rows_for_start(&self) -> u32 {
        self.nbr_tile_rows_for_start
    }

    pub fn nbr_tile_rows_for_end(&self) -> u32 {
        self.nbr_tile_rows_for_end
    }

    pub fn block(&self, rc: RowCol) -> &GameBoardBlock {
        &self.blocks[rc.row as usize][rc.col as usize]
    }

    pub fn block_mut(&mut self, rc: RowCol) -> &mut GameBoardBlock {
        &mut self.blocks[rc.row as usize][rc.col as usize]
    }

    pub fn components(&self) -> &ComponentSet {
        &self.components
    }

    pub fn components_mut(&mut self) -> &mut ComponentSet {
        &mut self.components
    }

    /// Every cell address, row-major from the bottom left
    pub fn cells(&self) -> impl Iterator<Item = RowCol> + use<> {
        let rows = self.height_in_tiles();
        let cols = self.width_in_tiles();
        (0..rows).flat_map(move |row| (0..cols).map(move |col| RowCol::new(row, col)))
    }

    /// Add a placement and make it the primary occupant of its cell
    pub fn place(
        &mut self,
        component_type: ComponentType,
        rc: RowCol,
        nbr_90_degree_rotations: u32,
        locked_into_place: bool,
    ) -> PlacementRef {
        let r = self
            .components
            .add(component_type, rc.row, rc.col, nbr_90_degree_rotations, locked_into_place);
        self.block_mut(rc).set_component(Some(r));
        r
    }

    /// Cell containing a world-space point, clamped to the grid
    pub fn find_rc(&self, position: Vec2) -> RowCol {
        let rows = self.height_in_tiles();
        let cols = self.width_in_tiles();
        let row = ((position.y - self.center_pos.y) / self.height + 0.5) * rows as f32;
        let col = ((position.x - self.center_pos.x) / self.width + 0.5) * cols as f32;
        RowCol::new(clamp_index(row, rows), clamp_index(col, cols))
    }

    /// World-space center of a cell, at the height its component is drawn
    pub fn position(&self, rc: RowCol) -> Vec3 {
        let x = self.block_size * (rc.col as f32 + 0.5) - self.width / 2.0 + self.center_pos.x;
        let y = self.block_size * (rc.row as f32 + 0.5) - self.height / 2.0 + self.center_pos.y;
        let z = match self.block(rc).block_type() {
            BlockType::End | BlockType::EndOffBoard => self.z_pos_end_tile(),
            _ => self.center_pos.z - self.block_size / 2.0,
        };
        Vec3::new(x, y, z)
    }

    /// Center of the goal band in a column; the band is drawn as one tall tile
    pub fn end_band_position(&self, col: u32) -> Vec3 {
        let x = self.block_size * (col as f32 + 0.5) - self.width / 2.0 + self.center_pos.x;
        let band_middle = self.height_in_tiles() as f32 - self.nbr_tile_rows_for_end as f32 / 2.0;
        let y = self.block_size * band_middle - self.height / 2.0
            + self.center_pos.y;
        Vec3::new(x, y, self.z_pos_end_tile())
    }

    pub fn scale_end_object(&self) -> Vec3 {
        Vec3::new(self.block_size, self.block_size * self.nbr_tile_rows_for_end as f32, 1.0)
    }

    pub fn z_pos_end_tile(&self) -> f32 {
        self.center_pos.z - 3.0 * self.block_size / 4.0
    }

    pub fn is_move_in_progress(&self) -> bool {
        self.moving_from.is_some()
    }

    pub fn move_rc(&self) -> Option<RowCol> {
        self.moving_from
    }

    /// The cell holds a component the player could pick up
    pub fn has_movable_component(&self, rc: RowCol) -> bool {
        let b = self.block(rc);
        matches!(b.block_type(), BlockType::OffBoard | BlockType::OnBoard)
            && b.component_type().is_some_and(|t| !t.is_filler())
    }

    /// Begin or continue dragging. Returns true if a redraw is needed.
    ///
    /// `distance` is relative to the previous drag position; the first call of
    /// a move anchors the placement at `start_position + distance`.
    pub fn drag(&mut self, start_position: Vec2, distance: Vec2) -> bool {
        let rc = self.find_rc(start_position);
        if let Some(from) = self.moving_from.filter(|&from| from != rc) {
            log::debug!("abandoning drag from {:?} for a new drag at {:?}", from, rc);
            self.finish_move(from);
        }

        let mut total_distance = distance;
        if self.moving_from.is_none() {
            if !self.has_movable_component(rc) {
                return false;
            }
            let Some(r) = self.block(rc).component() else {
                return false;
            };
            if !self.components.placement(r).movement_allowed() {
                return false;
            }
            self.moving_from = Some(rc);
            total_distance += start_position;
        }

        if let Some(r) = self.block(rc).component() {
            self.components.placement_mut(r).move_placement(total_distance);
        }
        true
    }

    /// Drop the dragged placement. Returns true if a redraw is needed.
    ///
    /// The drop only succeeds onto filler: dirt on board or rock off board.
    /// Anything else snaps the placement back to where it started.
    pub fn drag_ended(&mut self, end_position: Vec2) -> bool {
        let Some(from) = self.moving_from else {
            return false;
        };

        let rc = self.find_rc(end_position);
        if rc == from {
            self.finish_move(from);
            return true;
        }

        let end_block = *self.block(rc);
        let accepts_drop = match (end_block.component_type(), end_block.block_type()) {
            (Some(ComponentType::NoMovementDirt), BlockType::OnBoard) => true,
            (Some(ComponentType::NoMovementRock), BlockType::OffBoard) => true,
            _ => false,
        };
        if !accepts_drop {
            log::debug!("drop at {:?} rejected, returning to {:?}", rc, from);
            self.finish_move(from);
            return true;
        }

        let start_block = *self.block(from);
        let Some(moving) = start_block.component() else {
            self.moving_from = None;
            return true;
        };

        let placement = self.components.placement_mut(moving);
        placement.move_done();
        placement.set_rc(rc);

        let end = self.block_mut(rc);
        end.set_component(Some(moving));
        end.set_secondary(end_block.component());

        let start = self.block_mut(from);
        start.set_component(start_block.secondary());
        start.set_secondary(None);

        self.moving_from = None;
        log::debug!("moved {:?} from {:?} to {:?}", moving.component, from, rc);
        true
    }

    fn finish_move(&mut self, from: RowCol) {
        if let Some(r) = self.block(from).component() {
            self.components.placement_mut(r).move_done();
        }
        self.moving_from = None;
    }

    /// Rotate the placement under `position` a quarter turn if the player may
    pub fn tap(&mut self, position: Vec2) -> bool {
        let rc = self.find_rc(position);
        if !self.has_movable_component(rc) {
            return false;
        }
        let Some(r) = self.block(rc).component() else {
            return false;
        };
        let placement = self.components.placement_mut(r);
        if !placement.movement_allowed() {
            return false;
        }
        placement.rotate();
        true
    }

    /// Whether the neighbour in the given direction blocks the ball
    fn cell_has_wall(&self, rc: RowCol, wall: CellWall) -> bool {
        let b = self.block(rc);
        match b.block_type() {
            BlockType::End => false,
            BlockType::OffBoard | BlockType::EndOffBoard => true,
            BlockType::Begin | BlockType::OnBoard => match b.component() {
                Some(r) => self.components.get(r.component).has_wall_at(wall, r.index),
                None => true,
            },
        }
    }

    /// Neighbouring cell through `wall`, or the same cell at the grid edge
    fn next_rc(&self, wall: CellWall, rc: RowCol) -> RowCol {
        let (dr, dc) = wall.step();
        let row = rc.row as i64 + dr as i64;
        let col = rc.col as i64 + dc as i64;
        if row < 0
            || col < 0
            || row >= self.height_in_tiles() as i64
            || col >= self.width_in_tiles() as i64
        {
            rc
        } else {
            RowCol::new(row as u32, col as u32)
        }
    }

    /// The cell the ball reaches by leaving `from` through `wall`, if it can
    fn step_through(&self, from: RowCol, wall: CellWall) -> Option<RowCol> {
        let to = self.next_rc(wall, from);
        if to == from || self.cell_has_wall(from, wall) || self.cell_has_wall(to, wall.opposite()) {
            None
        } else {
            Some(to)
        }
    }

    /// Decide which of two walls the ball may pass through.
    ///
    /// Walls are given in the local frame of the placement in the ball's cell.
    /// When both are given the ball is at a corner: it may cut across if
    /// either order of crossing the two walls is open. Otherwise at most one
    /// wall is reported passable, the horizontal one if both are.
    pub fn check_for_next_wall(
        &self,
        wall1: Option<CellWall>,
        wall2: Option<CellWall>,
        ball_row: u32,
        ball_col: u32,
    ) -> (bool, bool) {
        let ball_rc = RowCol::new(ball_row, ball_col);
        let Some(r) = self.block(ball_rc).component() else {
            return (false, false);
        };
        let component = self.components.get(r.component);
        let actual1 = component.actual_wall(wall1, r.index);
        let actual2 = component.actual_wall(wall2, r.index);

        if let (Some(w1), Some(w2)) = (actual1, actual2) {
            let through = |first: CellWall, second: CellWall| {
                self.step_through(ball_rc, first)
                    .and_then(|mid| self.step_through(mid, second))
                    .is_some()
            };
            if through(w1, w2) || through(w2, w1) {
                return (true, true);
            }
        }

        let pass1 = actual1.is_some_and(|w| self.step_through(ball_rc, w).is_some());
        let pass2 = actual2.is_some_and(|w| self.step_through(ball_rc, w).is_some());
        match (pass1, actual1, pass2, actual2) {
            (true, Some(w1), true, Some(w2)) if w1 != w2 => {
                if exit_priority(w2) < exit_priority(w1) {
                    (false, true)
                } else {
                    (true, false)
                }
            }
            _ => (pass1, pass2),
        }
    }

    /// Move the ball inside cell `rc`, consulting this board about the
    /// neighbours. Position is relative to the cell center.
    pub fn move_ball_in_cell(
        &self,
        rc: RowCol,
        position: &mut Vec2,
        time_diff: &mut f32,
        velocity: &mut Vec2,
        ball_radius: f32,
    ) -> Option<WallPair> {
        let r = self.block(rc).component()?;
        if r.component.is_filler() {
            return None;
        }
        let mut check = |w1: Option<CellWall>, w2: Option<CellWall>| {
            self.check_for_next_wall(w1, w2, rc.row, rc.col)
        };
        let check: &mut NextWallCheck<'_> = &mut check;
        Some(
            self.components
                .get(r.component)
                .move_ball_in_cell(r.index, position, time_diff, velocity, ball_radius, check),
        )
    }
}

/// Horizontal exits win when only one of two walls can be taken
fn exit_priority(wall: CellWall) -> (bool, u32) {
    (!wall.is_horizontal_exit(), wall.index())
}

fn clamp_index(value: f32, count: u32) -> u32 {
    if count == 0 || value.is_nan() || value < 0.0 {
        return 0;
    }
    (value.floor() as u32).min(count - 1)
}
