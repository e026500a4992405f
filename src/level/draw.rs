//! Per-frame draw list

use glam::{Mat4, Vec3};

use super::MovablePassageLevel;
use crate::RowCol;
use crate::consts::*;
use crate::renderer::{
    DrawInstance, DrawItem, DrawKind, choose_obj, choose_variant, instance, model_matrix,
};
use crate::sim::{BlockType, ComponentType, PlacementRef};

impl MovablePassageLevel {
    /// Everything to draw this frame: the scenery, every cell below the goal
    /// band, the dragged piece and finally the ball
    pub fn draw_items(&mut self) -> Vec<DrawItem> {
        let mut items = self.scenery.clone();
        let tile = self.layout.tile_size;
        let scale = tile / MODEL_SIZE;
        let moving_from = self.board.move_rc();
        let end_row = self.layout.end_row();

        for rc in self.board.cells().filter(move |rc| rc.row < end_row) {
            let block = *self.board.block(rc);
            let position = self.board.position(rc);
            if moving_from == Some(rc) {
                // The piece itself is drawn at the drag position below.
                if let Some(under) = block.secondary() {
                    items.extend(self.placement_item(under, position, scale));
                }
            } else if block.block_type() == BlockType::OffBoard && block.secondary().is_some() {
                // Staged pieces sit shrunk on top of their rock.
                if let Some(piece) = block.component() {
                    let raised = position + Vec3::Z * (3.0 * tile / 4.0);
                    items.extend(self.placement_item(piece, raised, OFF_BOARD_SCALE * scale));
                }
                if let Some(rock) = block.secondary() {
                    items.extend(self.placement_item(rock, position, scale));
                }
            } else if let Some(primary) = block.component() {
                items.extend(self.placement_item(primary, position, scale));
            }
        }

        if let Some(piece) = moving_from.and_then(|rc| self.board.block(rc).component()) {
            let placement = self.board.components().placement(piece);
            if placement.is_move_in_progress() {
                let position = placement
                    .move_position_so_far()
                    .extend(self.maze_floor_z + self.scale_ball());
                let size =
                    self.board.components().get(piece.component).component_size() / MODEL_SIZE;
                items.extend(self.placement_item(piece, position, size));
            }
        }

        items.push(DrawItem {
            kind: DrawKind::Ball,
            transform: Mat4::from_translation(self.ball.position)
                * Mat4::from_quat(self.ball.total_rotated)
                * Mat4::from_scale(Vec3::splat(tile / MODEL_SIZE / 2.0)),
        });
        items
    }

    /// [`Self::draw_items`] packed for upload
    pub fn draw_instances(&mut self) -> Vec<DrawInstance> {
        instance::pack(&self.draw_items())
    }

    fn placement_item(
        &mut self,
        piece: PlacementRef,
        position: Vec3,
        scale: f32,
    ) -> Option<DrawItem> {
        let obj = choose_obj(&mut self.rng, self.board.components_mut(), piece)?;
        let angle = self.board.components().placement(piece).rotation_angle();
        Some(DrawItem {
            kind: DrawKind::Placement {
                component: piece.component,
                obj,
            },
            transform: model_matrix(position, angle, scale),
        })
    }

    /// The goal band plus a ring of rocks around the rest of the board so
    /// nothing behind it shows through
    pub(super) fn build_scenery(&mut self) -> Vec<DrawItem> {
        let tile = self.layout.tile_size;
        let cols = self.layout.cols;
        let mut items = Vec::new();

        let band_scale = self.board.scale_end_object() / Vec3::new(MODEL_SIZE, MODEL_SIZE, 1.0);
        let band = |position: Vec3| Mat4::from_translation(position) * Mat4::from_scale(band_scale);
        for col in 0..cols {
            let kind = if col == self.layout.end_column {
                DrawKind::End
            } else {
                DrawKind::EndOffBoard
            };
            items.push(DrawItem {
                kind,
                transform: band(self.board.end_band_position(col)),
            });
        }
        for position in [
            self.board.end_band_position(0) - Vec3::X * tile,
            self.board.end_band_position(cols - 1) + Vec3::X * tile,
        ] {
            items.push(DrawItem {
                kind: DrawKind::EndOffBoard,
                transform: band(position),
            });
        }

        let cell = |row: u32, col: u32| self.board.position(RowCol::new(row, col));
        let mut rock_positions = Vec::new();
        for row in 0..self.layout.end_row() {
            rock_positions.push(cell(row, 0) - Vec3::X * tile);
            rock_positions.push(cell(row, cols - 1) + Vec3::X * tile);
        }
        for col in 0..cols {
            rock_positions.push(cell(0, col) - Vec3::Y * tile);
        }
        rock_positions.push(cell(0, 0) - Vec3::new(tile, tile, 0.0));
        rock_positions.push(cell(0, cols - 1) + Vec3::new(tile, -tile, 0.0));

        let rocks = self
            .board
            .components()
            .get(ComponentType::NoMovementRock)
            .obj_references()
            .to_vec();
        let scale = tile / MODEL_SIZE;
        for position in rock_positions {
            if let Some(obj) = choose_variant(&mut self.rng, &rocks) {
                items.push(DrawItem {
                    kind: DrawKind::Placement {
                        component: ComponentType::NoMovementRock,
                        obj,
                    },
                    transform: model_matrix(position, 0.0, scale),
                });
            }
        }
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LevelConfig;
    use crate::renderer::instance::kinds;
    use glam::Vec2;

    fn level() -> MovablePassageLevel {
        MovablePassageLevel::new(&LevelConfig::default()).unwrap()
    }

    fn translation(item: &DrawItem) -> Vec3 {
        item.transform.w_axis.truncate()
    }

    fn items_at(items: &[DrawItem], xy: Vec2) -> Vec<DrawItem> {
        items
            .iter()
            .filter(|item| (translation(item).truncate() - xy).length() < 1e-5)
            .copied()
            .collect()
    }

    #[test]
    fn test_scenery() {
        let level = level();
        // Goal band (6 + 2 edge tiles), side rocks (2 x 10), bottom rocks (6), corners (2).
        assert_eq!(level.scenery.len(), 8 + 20 + 6 + 2);
        let ends = level.scenery.iter().filter(|i| i.kind == DrawKind::End).count();
        assert_eq!(ends, 1);
        let end = level.scenery.iter().find(|i| i.kind == DrawKind::End).unwrap();
        assert!((translation(end) - level.level_finisher_center()).length() < 1e-5);
    }

    #[test]
    fn test_fresh_level_draw_list() {
        let mut level = level();
        let items = level.draw_items();
        // Scenery, one item per cell below the goal band, a rock under each
        // staged piece, the ball.
        assert_eq!(items.len(), 36 + 60 + 10 + 1);
        assert_eq!(items.last().unwrap().kind, DrawKind::Ball);

        let tile = level.layout().tile_size;
        let staged = level.board.position(RowCol::new(3, 0));
        let here = items_at(&items, staged.truncate());
        assert_eq!(here.len(), 2);
        let piece = here
            .iter()
            .find(|i| {
                matches!(
                    i.kind,
                    DrawKind::Placement {
                        component: ComponentType::Straight,
                        ..
                    }
                )
            })
            .unwrap();
        assert!((translation(piece).z - (staged.z + 3.0 * tile / 4.0)).abs() < 1e-5);
        let piece_scale = piece.transform.x_axis.truncate().length();
        assert!((piece_scale - OFF_BOARD_SCALE * tile / MODEL_SIZE).abs() < 1e-5);
    }

    #[test]
    fn test_choices_are_stable_across_frames() {
        let mut level = level();
        let first = level.draw_items();
        let second = level.draw_items();
        assert_eq!(first, second);
    }

    #[test]
    fn test_tunnel_uses_locked_look() {
        let mut level = level();
        let items = level.draw_items();
        let tunnel = level.board.position(RowCol::new(3, 2)).truncate();
        let here = items_at(&items, tunnel);
        assert_eq!(here.len(), 1);
        match here[0].kind {
            DrawKind::Placement { component, obj } => {
                assert_eq!(component, ComponentType::Straight);
                assert!(obj.locked_in_place);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_dragged_piece_follows_the_drag() {
        let mut level = level();
        let start = level.board.position(RowCol::new(3, 0)).truncate();
        assert!(level.drag(start, Vec2::new(0.1, 0.0)));
        let items = level.draw_items();
        assert_eq!(items.len(), 36 + 60 + 10 + 1);

        // Only the rock is left in the start cell.
        let here = items_at(&items, start);
        assert_eq!(here.len(), 1);
        assert!(matches!(
            here[0].kind,
            DrawKind::Placement { component: ComponentType::NoMovementRock, .. }
        ));

        let dragged = items_at(&items, start + Vec2::new(0.1, 0.0));
        assert_eq!(dragged.len(), 1);
        let dragged_z = level.maze_floor_z + level.scale_ball();
        assert!((translation(&dragged[0]).z - dragged_z).abs() < 1e-6);
    }

    #[test]
    fn test_instances_match_items() {
        let mut level = level();
        let instances = level.draw_instances();
        assert_eq!(instances.len(), 36 + 60 + 10 + 1);
        assert_eq!(instances[0].kind, kinds::END_OFF_BOARD);
        assert_eq!(instances.last().unwrap().kind, kinds::BALL);
    }
}
