//! Board layout: tile size, the building area, the fixed start area, the
//! tunnels and the goal band
//!
//! ```text
//!   row H-1  ┌──────────────────────┐
//!            │ goal band  (End cell)│  TILE_ROWS_FOR_END
//!            ├──────────────────────┤
//!            │ staging    ║ tunnel  │
//!            │   ┌──────────────┐   │
//!            │   │ building area│   │  number_tiles_y
//!            │   └──────────────┘   │
//!            │ staging    ║ tunnel  │
//!            ├──────────────────────┤
//!            │ start area           │  TILE_ROWS_FOR_START
//!   row 0    └──────────────────────┘
//! ```

use anyhow::{bail, ensure};
use glam::Vec3;

use crate::RowCol;
use crate::config::LevelConfig;
use crate::consts::*;
use crate::sim::{BlockType, ComponentType, GameBoard, PlacementRef};

/// Grid geometry derived from a level config and the surface size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub tile_size: f32,
    pub rows: u32,
    pub cols: u32,
    /// Bottom left cell of the building area
    pub building_start: RowCol,
    /// Top right cell of the building area
    pub building_end: RowCol,
    /// Board column of the start tunnel
    pub start_column: u32,
    /// Board column of the end tunnel and the End cell
    pub end_column: u32,
}

/// Whole tiles that fit in `tiles`, forgiving float error just below an integer
fn whole_tiles(tiles: f32) -> u32 {
    (tiles + FLOAT_ERROR).floor().max(0.0) as u32
}

impl Layout {
    /// Fit the building area on the surface, leaving spare tiles around it
    /// for staging. If the spare tiles cannot hold every playable placement
    /// the tiles shrink to add whole perimeters of staging space.
    pub fn compute(config: &LevelConfig) -> Self {
        let (width, height) = (config.surface_width, config.surface_height);
        let nx = config.number_tiles_x;
        let ny = config.number_tiles_y;
        let fixed_rows = ny + TILE_ROWS_FOR_START + TILE_ROWS_FOR_END;

        let mut tile_size = (width / nx as f32).min(height / fixed_rows as f32);
        let mut extra_cols = whole_tiles((width - tile_size * nx as f32) / tile_size);
        let mut extra_rows = whole_tiles((height - tile_size * fixed_rows as f32) / tile_size);

        // The tunnels take one tile per extra row.
        let staging_capacity = extra_cols * ny + (extra_rows * nx).saturating_sub(2 * extra_rows);
        let needed = config.number_playable();
        if staging_capacity < needed {
            let missing = needed - staging_capacity;
            let perimeters = missing / (2 * nx + 2 * ny) + 1;
            tile_size = (width / (nx + 2 * perimeters) as f32)
                .min(height / (fixed_rows + 2 * perimeters) as f32);
            extra_cols = whole_tiles(width / tile_size - nx as f32);
            extra_rows = whole_tiles(height / tile_size - fixed_rows as f32);
        }

        let building_start = RowCol::new(TILE_ROWS_FOR_START + extra_rows / 2, extra_cols / 2);
        let building_end = RowCol::new(
            TILE_ROWS_FOR_START + ny + extra_rows / 2 - 1,
            nx + extra_cols / 2 - 1,
        );

        Self {
            tile_size,
            rows: fixed_rows + extra_rows,
            cols: nx + extra_cols,
            building_start,
            building_end,
            start_column: building_start.col + config.start_column,
            end_column: building_start.col + config.end_column,
        }
    }

    /// First cell the player can build on, directly above the start tunnel
    pub fn first_placeable(&self) -> RowCol {
        RowCol::new(self.building_start.row, self.start_column)
    }

    /// Fixed cell the locked path hangs off: the top of the start tunnel, or
    /// the opening of the start area when there is no tunnel
    pub fn path_start(&self) -> RowCol {
        RowCol::new(self.building_start.row - 1, self.start_column)
    }

    /// First row of the goal band
    pub fn end_row(&self) -> u32 {
        self.rows - TILE_ROWS_FOR_END
    }

    pub fn end_rc(&self) -> RowCol {
        RowCol::new(self.end_row(), self.end_column)
    }

    /// Board with the start area, tunnels and goal band in place and the
    /// playable placements created but not yet on any cell
    pub fn build_board(&self, config: &LevelConfig) -> GameBoard {
        let mut board = GameBoard::default();
        board.initialize(
            self.tile_size,
            Vec3::new(0.0, 0.0, config.maze_floor_z),
            self.rows,
            self.cols,
            TILE_ROWS_FOR_START,
            TILE_ROWS_FOR_END,
        );

        let counts = [
            (ComponentType::Straight, config.straight.number_placements),
            (ComponentType::Turn, config.turn.number_placements),
            (ComponentType::TJunction, config.tjunction.number_placements),
            (ComponentType::CrossJunction, config.crossjunction.number_placements),
        ];
        for (component_type, count) in counts {
            for _ in 0..count {
                board.components_mut().add(component_type, 0, 0, 0, false);
            }
        }

        for row in self.building_start.row..=self.building_end.row {
            for col in self.building_start.col..=self.building_end.col {
                board.block_mut(RowCol::new(row, col)).set_block_type(BlockType::OnBoard);
            }
        }

        let tunnel_rows = (TILE_ROWS_FOR_START..self.building_start.row)
            .map(|row| RowCol::new(row, self.start_column))
            .chain(
                (self.building_end.row + 1..self.end_row())
                    .map(|row| RowCol::new(row, self.end_column)),
            );
        for rc in tunnel_rows {
            board.place(ComponentType::Straight, rc, 0, true);
            board.block_mut(rc).set_block_type(BlockType::OnBoard);
        }

        for row in 0..TILE_ROWS_FOR_START {
            for col in 0..self.cols {
                let (component_type, rotations) = self.start_piece(row, col);
                let rc = RowCol::new(row, col);
                board.place(component_type, rc, rotations, true);
                board.block_mut(rc).set_block_type(BlockType::Begin);
            }
        }

        // The goal band has no components; the ball wins by entering the End cell.
        for row in self.end_row()..self.rows {
            for col in 0..self.cols {
                let rc = RowCol::new(row, col);
                let block_type = if rc == self.end_rc() {
                    BlockType::End
                } else {
                    BlockType::EndOffBoard
                };
                board.block_mut(rc).set_block_type(block_type);
            }
        }

        board
    }

    /// Piece and rotation of a start area cell: a walled pen open only
    /// towards the start tunnel
    fn start_piece(&self, row: u32, col: u32) -> (ComponentType, u32) {
        let last_col = self.cols - 1;
        if row == 0 {
            match col {
                0 => (ComponentType::ClosedCorner, 0),
                c if c == last_col => (ComponentType::ClosedCorner, 1),
                _ => (ComponentType::ClosedBottom, 0),
            }
        } else if row == TILE_ROWS_FOR_START - 1 {
            match col {
                0 => (ComponentType::ClosedCorner, 3),
                c if c == last_col => (ComponentType::ClosedCorner, 2),
                c if c == self.start_column => (ComponentType::Open, 0),
                _ => (ComponentType::ClosedBottom, 2),
            }
        } else {
            match col {
                0 => (ComponentType::ClosedBottom, 3),
                c if c == last_col => (ComponentType::ClosedBottom, 1),
                _ => (ComponentType::Open, 0),
            }
        }
    }

    /// Put every unlocked playable placement on an empty staging cell,
    /// filling rows from the bottom left
    pub fn stage_playable(&self, board: &mut GameBoard) -> anyhow::Result<()> {
        let mut free_cells = board
            .cells()
            .filter(|&rc| {
                let block = board.block(rc);
                block.block_type() == BlockType::OffBoard && block.component().is_none()
            })
            .collect::<Vec<_>>()
            .into_iter();

        for component_type in ComponentType::PLAYABLE {
            let unlocked = board
                .components()
                .get(component_type)
                .placements()
                .iter()
                .enumerate()
                .filter(|(_, p)| !p.locked_into_place())
                .map(|(index, _)| index)
                .collect::<Vec<_>>();

            for index in unlocked {
                let Some(rc) = free_cells.next() else {
                    bail!("staging area is too small for the playable components");
                };
                let r = PlacementRef::new(component_type, index);
                board.components_mut().placement_mut(r).set_rc(rc);
                board.block_mut(rc).set_component(Some(r));
            }
        }
        Ok(())
    }

    /// Add the configured rocks, then a filler under every cell between the
    /// start area and the goal band: dirt on board, rock off board.
    pub fn add_rocks_and_fillers(
        &self,
        board: &mut GameBoard,
        rocks: &[RowCol],
    ) -> anyhow::Result<()> {
        for rock in rocks {
            let rc = RowCol::new(
                rock.row + self.building_start.row,
                rock.col + self.building_start.col,
            );
            ensure!(
                board.block(rc).component().is_none(),
                "rock at ({}, {}) overlaps another component",
                rock.row,
                rock.col
            );
            board.place(ComponentType::NoMovementRock, rc, 0, true);
        }

        for row in TILE_ROWS_FOR_START..self.end_row() {
            for col in 0..self.cols {
                let rc = RowCol::new(row, col);
                let filler = if board.block(rc).block_type() == BlockType::OnBoard {
                    ComponentType::NoMovementDirt
                } else {
                    ComponentType::NoMovementRock
                };
                // Fillers are never picked up, so they stay unlocked and keep their own look.
                let r = board.components_mut().add(filler, row, col, 0, false);
                let block = board.block_mut(rc);
                if block.component().is_none() {
                    block.set_component(Some(r));
                } else {
                    block.set_secondary(Some(r));
                }
            }
        }
        Ok(())
    }
}
