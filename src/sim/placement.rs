//! Placements: one instance of a component type sitting in a grid cell

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::component::ComponentType;
use crate::renderer::ObjReference;
use crate::{RowCol, quarter_turn_angle};

/// Non-owning handle to a placement: component type plus index into that
/// component's placement list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlacementRef {
    pub component: ComponentType,
    pub index: usize,
}

impl PlacementRef {
    pub const fn new(component: ComponentType, index: usize) -> Self {
        Self { component, index }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    row: u32,
    col: u32,
    nbr_90_degree_rotations: u32,
    locked_into_place: bool,
    prev: Option<PlacementRef>,
    next: Option<PlacementRef>,
    move_in_progress: bool,
    /// World-space xy of the placement while it is being dragged
    move_position_so_far: Vec2,
    obj_reference: Option<ObjReference>,
}

impl Placement {
    pub fn new(row: u32, col: u32, nbr_90_degree_rotations: u32, locked_into_place: bool) -> Self {
        Self {
            row,
            col,
            nbr_90_degree_rotations: nbr_90_degree_rotations % 4,
            locked_into_place,
            prev: None,
            next: None,
            move_in_progress: false,
            move_position_so_far: Vec2::ZERO,
            obj_reference: None,
        }
    }

    /// The user may drag or rotate this placement: it is not locked and the
    /// ball has not validated a path through it.
    #[inline]
    pub fn movement_allowed(&self) -> bool {
        !self.locked_into_place && self.prev.is_none()
    }

    /// Turn a quarter counter-clockwise
    pub fn rotate(&mut self) {
        self.nbr_90_degree_rotations = (self.nbr_90_degree_rotations + 1) % 4;
    }

    pub fn rotation_angle(&self) -> f32 {
        quarter_turn_angle(self.nbr_90_degree_rotations)
    }

    /// The first call of a move sets the drag position, later calls add to it.
    pub fn move_placement(&mut self, fractional_move: Vec2) {
        if self.move_in_progress {
            self.move_position_so_far += fractional_move;
        } else {
            self.move_in_progress = true;
            self.move_position_so_far = fractional_move;
        }
    }

    /// Stop dragging; the placement is drawn at its recorded cell again
    pub fn move_done(&mut self) {
        self.move_in_progress = false;
    }

    pub fn row(&self) -> u32 {
        self.row
    }

    pub fn col(&self) -> u32 {
        self.col
    }

    pub fn rc(&self) -> RowCol {
        RowCol::new(self.row, self.col)
    }

    pub fn set_rc(&mut self, rc: RowCol) {
        self.row = rc.row;
        self.col = rc.col;
    }

    pub fn rotation_count(&self) -> u32 {
        self.nbr_90_degree_rotations
    }

    pub fn locked_into_place(&self) -> bool {
        self.locked_into_place
    }

    pub fn prev(&self) -> Option<PlacementRef> {
        self.prev
    }

    pub fn next(&self) -> Option<PlacementRef> {
        self.next
    }

    pub fn set_prev(&mut self, prev: Option<PlacementRef>) {
        self.prev = prev;
    }

    pub fn set_next(&mut self, next: Option<PlacementRef>) {
        self.next = next;
    }

    pub fn is_move_in_progress(&self) -> bool {
        self.move_in_progress
    }

    pub fn move_position_so_far(&self) -> Vec2 {
        self.move_position_so_far
    }

    pub fn obj_reference(&self) -> Option<ObjReference> {
        self.obj_reference
    }

    pub fn set_obj_reference(&mut self, obj_reference: ObjReference) {
        self.obj_reference = Some(obj_reference);
    }

    pub fn clear_obj_reference(&mut self) {
        self.obj_reference = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movement_allowed() {
        let mut placement = Placement::new(0, 0, 0, false);
        assert!(placement.movement_allowed());

        placement.set_prev(Some(PlacementRef::new(ComponentType::Straight, 0)));
        assert!(!placement.movement_allowed());

        let locked = Placement::new(0, 0, 0, true);
        assert!(!locked.movement_allowed());
    }

    #[test]
    fn test_rotate_wraps() {
        let mut placement = Placement::new(0, 0, 3, false);
        placement.rotate();
        assert_eq!(placement.rotation_count(), 0);
        placement.rotate();
        assert!((placement.rotation_angle() - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_move_accumulates_until_done() {
        let mut placement = Placement::new(2, 1, 0, false);
        placement.move_placement(Vec2::new(0.5, 0.0));
        placement.move_placement(Vec2::new(0.25, -0.5));
        assert!(placement.is_move_in_progress());
        assert_eq!(placement.move_position_so_far(), Vec2::new(0.75, -0.5));

        placement.move_done();
        assert!(!placement.is_move_in_progress());
        assert_eq!(placement.rc(), RowCol::new(2, 1));

        // A new move starts from the new anchor, not from the old offset.
        placement.move_placement(Vec2::new(-1.0, 1.0));
        assert_eq!(placement.move_position_so_far(), Vec2::new(-1.0, 1.0));
    }
}
