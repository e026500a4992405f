//! Component types, their fixed wall masks and the placements of each type

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::movement::{NextWallCheck, Shape};
use super::placement::{Placement, PlacementRef};
use super::wall::{CellWall, WallMask, WallPair};
use crate::renderer::ObjReference;
use crate::rotate_quarter_turns;

/// Corridor segment shapes plus the two immovable fillers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComponentType {
    Straight,
    TJunction,
    CrossJunction,
    Turn,
    DeadEnd,
    Open,
    ClosedBottom,
    ClosedCorner,
    NoMovementDirt,
    NoMovementRock,
}

impl ComponentType {
    pub const COUNT: usize = 10;

    pub const ALL: [ComponentType; Self::COUNT] = [
        ComponentType::Straight,
        ComponentType::TJunction,
        ComponentType::CrossJunction,
        ComponentType::Turn,
        ComponentType::DeadEnd,
        ComponentType::Open,
        ComponentType::ClosedBottom,
        ComponentType::ClosedCorner,
        ComponentType::NoMovementDirt,
        ComponentType::NoMovementRock,
    ];

    /// Types the player is handed to build the tunnel with
    pub const PLAYABLE: [ComponentType; 4] = [
        ComponentType::Straight,
        ComponentType::TJunction,
        ComponentType::CrossJunction,
        ComponentType::Turn,
    ];

    /// Solid walls in the unrotated orientation
    pub const fn wall_mask(self) -> WallMask {
        match self {
            ComponentType::Straight => WallMask::of(&[CellWall::Left, CellWall::Right]),
            ComponentType::TJunction => WallMask::of(&[CellWall::Up]),
            ComponentType::CrossJunction | ComponentType::Open => WallMask::NONE,
            ComponentType::Turn => WallMask::of(&[CellWall::Right, CellWall::Up]),
            ComponentType::DeadEnd => {
                WallMask::of(&[CellWall::Left, CellWall::Right, CellWall::Up])
            }
            ComponentType::ClosedBottom => WallMask::of(&[CellWall::Down]),
            ComponentType::ClosedCorner => WallMask::of(&[CellWall::Down, CellWall::Left]),
            ComponentType::NoMovementDirt | ComponentType::NoMovementRock => WallMask::ALL,
        }
    }

    /// Movement shape, or `None` for the fillers the ball can never enter
    pub fn shape(self) -> Option<Shape> {
        match self {
            ComponentType::Straight => Some(Shape::Straight),
            ComponentType::TJunction => Some(Shape::TJunction),
            ComponentType::CrossJunction => Some(Shape::CrossJunction),
            ComponentType::Turn => Some(Shape::Turn),
            ComponentType::DeadEnd => Some(Shape::DeadEnd),
            ComponentType::Open => Some(Shape::Open),
            ComponentType::ClosedBottom => Some(Shape::ClosedBottom),
            ComponentType::ClosedCorner => Some(Shape::ClosedCorner),
            ComponentType::NoMovementDirt | ComponentType::NoMovementRock => None,
        }
    }

    pub fn is_filler(self) -> bool {
        matches!(self, ComponentType::NoMovementDirt | ComponentType::NoMovementRock)
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// One component type and every placement of it on the board
#[derive(Debug, Clone)]
pub struct Component {
    component_type: ComponentType,
    /// Edge length of the cell in world units
    component_size: f32,
    walls: WallMask,
    placements: Vec<Placement>,
    obj_references: Vec<ObjReference>,
    obj_references_locked: Vec<ObjReference>,
}

impl Component {
    pub fn new(component_type: ComponentType, component_size: f32) -> Self {
        Self {
            component_type,
            component_size,
            walls: component_type.wall_mask(),
            placements: Vec::new(),
            obj_references: Vec::new(),
            obj_references_locked: Vec::new(),
        }
    }

    /// Add a placement, returning its index
    pub fn add(
        &mut self,
        row: u32,
        col: u32,
        nbr_90_degree_rotations: u32,
        locked_into_place: bool,
    ) -> usize {
        self.placements.push(Placement::new(row, col, nbr_90_degree_rotations, locked_into_place));
        self.placements.len() - 1
    }

    /// Whether `wall` is solid for the placement at its current rotation
    pub fn has_wall_at(&self, wall: CellWall, placement_index: usize) -> bool {
        let rotations = self.placements[placement_index].rotation_count();
        self.walls.contains(wall.rotated_back(rotations))
    }

    /// Convert a wall in the component's local frame to the world-aligned wall
    pub fn actual_wall(&self, wall: Option<CellWall>, placement_index: usize) -> Option<CellWall> {
        let rotations = self.placements[placement_index].rotation_count();
        wall.map(|w| w.rotated(rotations))
    }

    /// Move the ball through the cell holding `placement_index`.
    ///
    /// Position and velocity are relative to the cell center in world
    /// orientation and are updated in place, as is the remaining time. The
    /// returned walls are world-aligned. `check` is asked about walls in the
    /// component's local frame.
    ///
    /// # Panics
    ///
    /// Panics if called on a dirt or rock filler; the ball can never be inside one.
    pub fn move_ball_in_cell(
        &self,
        placement_index: usize,
        position: &mut Vec2,
        time_diff: &mut f32,
        velocity: &mut Vec2,
        ball_radius: f32,
        check: &mut NextWallCheck<'_>,
    ) -> WallPair {
        let Some(shape) = self.component_type.shape() else {
            panic!("ball cannot move inside a {:?} filler", self.component_type);
        };
        let rotations = self.placements[placement_index].rotation_count();
        let back = (4 - rotations) % 4;

        let local = shape.move_local(
            self.component_size,
            rotate_quarter_turns(*position, back),
            rotate_quarter_turns(*velocity, back),
            *time_diff,
            ball_radius,
            check,
        );

        *position = rotate_quarter_turns(local.position, rotations);
        *velocity = rotate_quarter_turns(local.velocity, rotations);
        *time_diff = local.time_diff;
        (
            local.walls.0.map(|w| w.rotated(rotations)),
            local.walls.1.map(|w| w.rotated(rotations)),
        )
    }

    pub fn component_type(&self) -> ComponentType {
        self.component_type
    }

    pub fn component_size(&self) -> f32 {
        self.component_size
    }

    pub fn set_size(&mut self, tile_size: f32) {
        self.component_size = tile_size;
    }

    pub fn placement(&self, index: usize) -> &Placement {
        &self.placements[index]
    }

    pub fn placement_mut(&mut self, index: usize) -> &mut Placement {
        &mut self.placements[index]
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    pub fn nbr_placements(&self) -> usize {
        self.placements.len()
    }

    pub fn obj_references(&self) -> &[ObjReference] {
        &self.obj_references
    }

    pub fn obj_references_locked(&self) -> &[ObjReference] {
        &self.obj_references_locked
    }

    pub fn set_obj_references(&mut self, refs: Vec<ObjReference>) {
        self.obj_references = refs;
    }

    pub fn set_obj_references_locked(&mut self, refs: Vec<ObjReference>) {
        self.obj_references_locked = refs;
    }
}

/// Arena holding one [`Component`] per [`ComponentType`]
#[derive(Debug, Clone)]
pub struct ComponentSet {
    components: Vec<Component>,
}

impl ComponentSet {
    pub fn new(component_size: f32) -> Self {
        Self {
            components: ComponentType::ALL
                .iter()
                .map(|&t| Component::new(t, component_size))
                .collect(),
        }
    }

    pub fn get(&self, component_type: ComponentType) -> &Component {
        &self.components[component_type.index()]
    }

    pub fn get_mut(&mut self, component_type: ComponentType) -> &mut Component {
        &mut self.components[component_type.index()]
    }

    pub fn placement(&self, r: PlacementRef) -> &Placement {
        self.get(r.component).placement(r.index)
    }

    pub fn placement_mut(&mut self, r: PlacementRef) -> &mut Placement {
        self.get_mut(r.component).placement_mut(r.index)
    }

    /// Add a placement and return a handle to it
    pub fn add(
        &mut self,
        component_type: ComponentType,
        row: u32,
        col: u32,
        nbr_90_degree_rotations: u32,
        locked_into_place: bool,
    ) -> PlacementRef {
        let index = self
            .get_mut(component_type)
            .add(row, col, nbr_90_degree_rotations, locked_into_place);
        PlacementRef::new(component_type, index)
    }

    pub fn set_size(&mut self, tile_size: f32) {
        for component in &mut self.components {
            component.set_size(tile_size);
        }
    }

    pub fn total_placements(&self) -> usize {
        self.components.iter().map(Component::nbr_placements).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Component> {
        self.components.iter()
    }

    /// Handles to every placement of every type
    pub fn placement_refs(&self) -> impl Iterator<Item = PlacementRef> + '_ {
        self.components.iter().flat_map(|c| {
            (0..c.nbr_placements()).map(move |i| PlacementRef::new(c.component_type(), i))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn component_type() -> impl Strategy<Value = ComponentType> {
        (0..ComponentType::COUNT).prop_map(|i| ComponentType::ALL[i])
    }

    fn wall() -> impl Strategy<Value = CellWall> {
        (0u32..4).prop_map(CellWall::from_index)
    }

    #[test]
    fn test_wall_masks() {
        let straight = ComponentType::Straight.wall_mask();
        assert!(straight.contains(CellWall::Left) && straight.contains(CellWall::Right));
        assert_eq!(straight.count(), 2);
        assert_eq!(ComponentType::CrossJunction.wall_mask().count(), 0);
        assert_eq!(ComponentType::DeadEnd.wall_mask().count(), 3);
        assert!(!ComponentType::DeadEnd.wall_mask().contains(CellWall::Down));
        assert_eq!(ComponentType::NoMovementRock.wall_mask(), WallMask::ALL);
    }

    #[test]
    fn test_rotated_turn_walls() {
        let mut component = Component::new(ComponentType::Turn, 2.0);
        let i = component.add(0, 0, 1, false);
        // Walls {Right, Up} rotated a quarter turn become {Up, Left}.
        assert!(component.has_wall_at(CellWall::Up, i));
        assert!(component.has_wall_at(CellWall::Left, i));
        assert!(!component.has_wall_at(CellWall::Right, i));
        assert!(!component.has_wall_at(CellWall::Down, i));
    }

    #[test]
    fn test_actual_wall_passes_none_through() {
        let mut component = Component::new(ComponentType::Straight, 2.0);
        let i = component.add(0, 0, 3, false);
        assert_eq!(component.actual_wall(None, i), None);
        assert_eq!(component.actual_wall(Some(CellWall::Right), i), Some(CellWall::Down));
    }

    #[test]
    fn test_rotated_straight_moves_horizontally() {
        let mut component = Component::new(ComponentType::Straight, 2.0);
        let i = component.add(0, 0, 1, false);
        let mut position = Vec2::new(0.0, 0.3);
        let mut velocity = Vec2::new(-3.0, 0.5);
        let mut time_diff = 1.0;
        let mut check = |_: Option<CellWall>, _: Option<CellWall>| (true, true);
        let walls = component.move_ball_in_cell(
            i,
            &mut position,
            &mut time_diff,
            &mut velocity,
            0.2,
            &mut check,
        );
        assert_eq!(walls, (Some(CellWall::Left), None));
        assert_eq!(position.y, 0.0);
        assert_eq!(velocity.y, 0.0);
        assert!(position.x < -1.0);
    }

    #[test]
    fn test_check_receives_local_walls() {
        let mut component = Component::new(ComponentType::CrossJunction, 2.0);
        let i = component.add(0, 0, 2, false);
        let mut asked = Vec::new();
        let mut check = |w1: Option<CellWall>, w2: Option<CellWall>| {
            asked.push((w1, w2));
            (false, false)
        };
        let mut position = Vec2::ZERO;
        let mut velocity = Vec2::new(5.0, 0.0);
        let mut time_diff = 1.0;
        component.move_ball_in_cell(
            i,
            &mut position,
            &mut time_diff,
            &mut velocity,
            0.2,
            &mut check,
        );
        // World +x is local -x at a half turn.
        assert_eq!(asked, vec![(Some(CellWall::Left), None)]);
        assert!((position.x - 0.8).abs() < 1e-6);
        assert_eq!(velocity, Vec2::ZERO);
    }

    #[test]
    #[should_panic]
    fn test_ball_cannot_enter_filler() {
        let mut component = Component::new(ComponentType::NoMovementDirt, 2.0);
        let i = component.add(0, 0, 0, true);
        let mut check = |_: Option<CellWall>, _: Option<CellWall>| (true, true);
        component.move_ball_in_cell(i, &mut Vec2::ZERO, &mut 1.0, &mut Vec2::X, 0.2, &mut check);
    }

    #[test]
    fn test_component_set_handles() {
        let mut set = ComponentSet::new(1.0);
        let a = set.add(ComponentType::Turn, 1, 2, 3, false);
        let b = set.add(ComponentType::Turn, 4, 5, 0, true);
        let c = set.add(ComponentType::NoMovementDirt, 0, 0, 0, true);
        assert_eq!(a, PlacementRef::new(ComponentType::Turn, 0));
        assert_eq!(b.index, 1);
        assert_eq!(set.placement(a).rotation_count(), 3);
        assert!(set.placement(b).locked_into_place());
        assert_eq!(set.total_placements(), 3);
        assert_eq!(set.placement_refs().collect::<Vec<_>>(), vec![a, b, c]);
    }

    proptest! {
        #[test]
        fn prop_has_wall_at_matches_unrotated_mask(
            component_type in component_type(),
            rotations in 0u32..4,
            wall in wall(),
        ) {
            let mut component = Component::new(component_type, 2.0);
            let i = component.add(0, 0, rotations, false);
            let expected = component_type
                .wall_mask()
                .contains(CellWall::from_index(wall.index() + (4 - rotations) % 4));
            prop_assert_eq!(component.has_wall_at(wall, i), expected);
        }

        #[test]
        fn prop_actual_wall_inverts_has_wall_rotation(
            component_type in component_type(),
            rotations in 0u32..4,
            wall in wall(),
        ) {
            let mut component = Component::new(component_type, 2.0);
            let i = component.add(0, 0, rotations, false);
            let local_solid = component_type.wall_mask().contains(wall);
            let actual = component.actual_wall(Some(wall), i);
            prop_assert!(actual.is_some());
            prop_assert_eq!(actual.map(|w| component.has_wall_at(w, i)), Some(local_solid));
        }
    }
}
