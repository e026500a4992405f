//! The locked path: `prev`/`next` links between the placements the ball has
//! rolled through
//!
//! A placement with a `prev` link can no longer be moved by the player. Rolling
//! back along the path releases placements one at a time, and rolling into a
//! cell that is already on the path releases the whole loop in between.

use anyhow::{Context, bail, ensure};

use super::board::GameBoard;
use super::component::{ComponentSet, ComponentType};
use super::placement::PlacementRef;
use crate::RowCol;

/// Update the path after the ball moved from `old` to `new`.
///
/// # Panics
///
/// Panics if a loop is detected but walking back from `old` never reaches
/// `new`; the links are corrupt at that point.
pub fn block_unblock_placements(
    components: &mut ComponentSet,
    old: PlacementRef,
    new: PlacementRef,
) {
    let new_placement = components.placement(new);
    match new_placement.next() {
        Some(next) if next == old => {
            // Backing up
            components.placement_mut(new).set_next(None);
            let old_placement = components.placement_mut(old);
            old_placement.set_prev(None);
            old_placement.clear_obj_reference();
            log::debug!("ball backed up from {:?} to {:?}", old, new);
        }
        Some(_) => unwind_loop(components, old, new),
        None => {
            if new_placement.locked_into_place() || new_placement.prev().is_some() {
                return;
            }
            let new_placement = components.placement_mut(new);
            new_placement.set_prev(Some(old));
            new_placement.clear_obj_reference();
            components.placement_mut(old).set_next(Some(new));
        }
    }
}

fn unwind_loop(components: &mut ComponentSet, old: PlacementRef, new: PlacementRef) {
    let bound = components.total_placements();
    let mut current = old;
    let mut steps = 0;
    while current != new {
        assert!(steps < bound, "loop walk from {old:?} did not return to {new:?}");
        let placement = components.placement_mut(current);
        let prev = placement.prev();
        placement.set_prev(None);
        placement.set_next(None);
        placement.clear_obj_reference();
        current = prev.unwrap_or_else(|| {
            panic!("loop walk from {old:?} ran off the path before {new:?}")
        });
        steps += 1;
    }
    components.placement_mut(new).set_next(None);
    log::debug!("ball closed a loop at {:?}, released {} placements", new, steps);
}

/// Cells along the locked path, following `next` links from `start`.
///
/// Empty when the ball has not yet entered a placeable cell.
pub fn path_locked_in_place(board: &GameBoard, start: RowCol) -> Vec<RowCol> {
    let components = board.components();
    let mut path = Vec::new();
    let Some(mut current) = board.block(start).component() else {
        return path;
    };

    // Each placement appears at most once on a well formed path.
    for _ in 0..=components.total_placements() {
        let placement = components.placement(current);
        if placement.prev().is_none() && placement.next().is_none() {
            break;
        }
        path.push(placement.rc());
        match placement.next() {
            Some(next) => current = next,
            None => break,
        }
    }
    path
}

/// Re-link the path saved by [`path_locked_in_place`].
///
/// The cells must be distinct grid neighbours in order, and every cell after
/// the first must hold a playable placement the player could still move.
pub fn restore_path_locked_in_place(board: &mut GameBoard, path: &[RowCol]) -> anyhow::Result<()> {
    // A single cell carries no link.
    if path.len() <= 1 {
        return Ok(());
    }

    let rows = board.height_in_tiles();
    let cols = board.width_in_tiles();
    let mut refs: Vec<PlacementRef> = Vec::with_capacity(path.len());
    for (i, &rc) in path.iter().enumerate() {
        if rc.row >= rows || rc.col >= cols {
            bail!(
                "locked path cell ({}, {}) is outside the {}x{} board",
                rc.row,
                rc.col,
                rows,
                cols
            );
        }
        let r = board
            .block(rc)
            .component()
            .with_context(|| format!("locked path cell ({}, {}) is empty", rc.row, rc.col))?;
        ensure!(!refs.contains(&r), "locked path visits ({}, {}) twice", rc.row, rc.col);
        if i > 0 {
            let prev = path[i - 1];
            ensure!(
                prev.row.abs_diff(rc.row) + prev.col.abs_diff(rc.col) == 1,
                "locked path jumps from ({}, {}) to ({}, {})",
                prev.row,
                prev.col,
                rc.row,
                rc.col
            );
            ensure!(
                ComponentType::PLAYABLE.contains(&r.component)
                    && !board.components().placement(r).locked_into_place(),
                "locked path cell ({}, {}) holds a fixed {:?}",
                rc.row,
                rc.col,
                r.component
            );
        }
        refs.push(r);
    }

    let components = board.components_mut();
    for pair in refs.windows(2) {
        let (prev, next) = (pair[0], pair[1]);
        components.placement_mut(prev).set_next(Some(next));
        components.placement_mut(next).set_prev(Some(prev));
    }
    log::info!("restored locked path of {} cells", refs.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::board::BlockType;
    use crate::sim::test_support::{CellSpec, board_from_rows};
    use proptest::prelude::*;

    const ENTRY: CellSpec = CellSpec::Locked(BlockType::OnBoard, ComponentType::Straight, 0);
    const CELL: CellSpec = CellSpec::Movable(BlockType::OnBoard, ComponentType::CrossJunction, 0);

    /// A locked entry cell at the bottom left with a 3x3 field of junctions above it.
    fn field() -> GameBoard {
        board_from_rows(&[
            &[ENTRY, CellSpec::Empty(BlockType::Begin), CellSpec::Empty(BlockType::Begin)],
            &[CELL, CELL, CELL],
            &[CELL, CELL, CELL],
            &[CELL, CELL, CELL],
        ])
    }

    fn at(board: &GameBoard, row: u32, col: u32) -> PlacementRef {
        board.block(RowCol::new(row, col)).component().unwrap()
    }

    /// Roll the ball along `cells`, updating the path at every step.
    fn roll(board: &mut GameBoard, cells: &[(u32, u32)]) {
        for pair in cells.windows(2) {
            let old = at(board, pair[0].0, pair[0].1);
            let new = at(board, pair[1].0, pair[1].1);
            block_unblock_placements(board.components_mut(), old, new);
        }
    }

    fn locked_cells(board: &GameBoard) -> Vec<RowCol> {
        path_locked_in_place(board, RowCol::new(0, 0))
    }

    #[test]
    fn test_fresh_board_has_no_path() {
        let board = field();
        assert!(locked_cells(&board).is_empty());
    }

    #[test]
    fn test_forward_travel_locks_cells() {
        let mut board = field();
        roll(&mut board, &[(0, 0), (1, 0), (2, 0), (2, 1)]);
        assert_eq!(
            locked_cells(&board),
            vec![RowCol::new(0, 0), RowCol::new(1, 0), RowCol::new(2, 0), RowCol::new(2, 1)]
        );
        for (row, col) in [(1, 0), (2, 0), (2, 1)] {
            assert!(!board.components().placement(at(&board, row, col)).movement_allowed());
        }
        assert!(board.components().placement(at(&board, 1, 1)).movement_allowed());
    }

    #[test]
    fn test_backing_up_releases_cells() {
        let mut board = field();
        roll(&mut board, &[(0, 0), (1, 0), (2, 0), (2, 1), (2, 0), (1, 0)]);
        assert_eq!(locked_cells(&board), vec![RowCol::new(0, 0), RowCol::new(1, 0)]);
        assert!(board.components().placement(at(&board, 2, 0)).movement_allowed());
        assert!(board.components().placement(at(&board, 2, 1)).movement_allowed());

        roll(&mut board, &[(1, 0), (0, 0)]);
        assert!(locked_cells(&board).is_empty());
    }

    #[test]
    fn test_loop_releases_every_cell_in_it() {
        let mut board = field();
        roll(&mut board, &[(0, 0), (1, 0), (2, 0), (2, 1), (1, 1), (1, 0)]);
        assert_eq!(locked_cells(&board), vec![RowCol::new(0, 0), RowCol::new(1, 0)]);
        for (row, col) in [(2, 0), (2, 1), (1, 1)] {
            let placement = board.components().placement(at(&board, row, col));
            assert_eq!(placement.prev(), None);
            assert_eq!(placement.next(), None);
        }
        // The loop entry stays locked behind the entry cell.
        let entry = board.components().placement(at(&board, 1, 0));
        assert_eq!(entry.prev(), Some(at(&board, 0, 0)));
        assert_eq!(entry.next(), None);
    }

    #[test]
    fn test_entering_locked_cell_does_not_link() {
        let mut board = board_from_rows(&[&[ENTRY, ENTRY]]);
        let a = at(&board, 0, 0);
        let b = at(&board, 0, 1);
        block_unblock_placements(board.components_mut(), a, b);
        assert_eq!(board.components().placement(a).next(), None);
        assert_eq!(board.components().placement(b).prev(), None);
    }

    #[test]
    fn test_linking_clears_cached_visual() {
        let mut board = field();
        let cell = at(&board, 1, 0);
        board
            .components_mut()
            .placement_mut(cell)
            .set_obj_reference(crate::renderer::ObjReference::new(false, 0, 0));
        roll(&mut board, &[(0, 0), (1, 0)]);
        assert_eq!(board.components().placement(cell).obj_reference(), None);
    }

    #[test]
    fn test_restore_round_trip() {
        let mut board = field();
        roll(&mut board, &[(0, 0), (1, 0), (1, 1), (2, 1), (3, 1), (3, 2)]);
        let saved = locked_cells(&board);
        assert_eq!(saved.len(), 6);

        let mut restored = field();
        restore_path_locked_in_place(&mut restored, &saved).unwrap();
        assert_eq!(locked_cells(&restored), saved);
        for rc in &saved[1..] {
            let r = restored.block(*rc).component().unwrap();
            let placement = restored.components().placement(r);
            assert!(!placement.movement_allowed());
        }
    }

    #[test]
    fn test_restore_short_paths_is_noop() {
        let mut board = field();
        restore_path_locked_in_place(&mut board, &[]).unwrap();
        restore_path_locked_in_place(&mut board, &[RowCol::new(0, 0)]).unwrap();
        assert!(locked_cells(&board).is_empty());
    }

    #[test]
    fn test_restore_rejects_bad_cells() {
        let mut board = field();
        let off_board = [RowCol::new(0, 0), RowCol::new(9, 0)];
        assert!(restore_path_locked_in_place(&mut board, &off_board).is_err());
        let empty = [RowCol::new(0, 0), RowCol::new(0, 1)];
        assert!(restore_path_locked_in_place(&mut board, &empty).is_err());
    }

    #[test]
    fn test_restore_rejects_broken_paths() {
        let cells = |list: &[(u32, u32)]| {
            list.iter().map(|&(r, c)| RowCol::new(r, c)).collect::<Vec<_>>()
        };
        let rejected = |path: &[(u32, u32)]| {
            let mut board = field();
            let refused = restore_path_locked_in_place(&mut board, &cells(path)).is_err();
            if refused {
                // Nothing is linked when the path is refused.
                assert!(locked_cells(&board).is_empty());
            }
            refused
        };

        // Skips a cell
        assert!(rejected(&[(0, 0), (1, 0), (3, 0)]));
        // Diagonal step
        assert!(rejected(&[(0, 0), (1, 0), (2, 1)]));
        // Revisits a cell
        assert!(rejected(&[(0, 0), (1, 0), (1, 1), (1, 0)]));
        // Runs back through the fixed entry
        assert!(rejected(&[(1, 0), (0, 0)]));
        assert!(!rejected(&[(0, 0), (1, 0), (1, 1)]));
    }

    #[test]
    #[should_panic]
    fn test_corrupt_loop_panics() {
        let mut board = field();
        let a = at(&board, 1, 0);
        let b = at(&board, 1, 1);
        let c = at(&board, 2, 1);
        // b claims a successor but walking back from a never reaches b.
        board.components_mut().placement_mut(b).set_next(Some(c));
        block_unblock_placements(board.components_mut(), a, b);
    }

    fn neighbours(rc: (u32, u32)) -> Vec<(u32, u32)> {
        let (r, c) = rc;
        let mut out = Vec::new();
        if r > 1 {
            out.push((r - 1, c));
        }
        if r < 3 {
            out.push((r + 1, c));
        }
        if c > 0 {
            out.push((r, c - 1));
        }
        if c < 2 {
            out.push((r, c + 1));
        }
        out
    }

    proptest! {
        #[test]
        fn prop_path_is_simple_and_ends_at_ball(
            choices in proptest::collection::vec(0usize..4, 1..40),
        ) {
            let mut board = field();
            let mut ball = (1u32, 0u32);
            roll(&mut board, &[(0, 0), ball]);
            for choice in choices {
                let options = neighbours(ball);
                let next = options[choice % options.len()];
                roll(&mut board, &[ball, next]);
                ball = next;
            }

            let path = locked_cells(&board);
            prop_assert_eq!(path.first(), Some(&RowCol::new(0, 0)));
            prop_assert_eq!(path.last(), Some(&RowCol::new(ball.0, ball.1)));
            let mut seen = std::collections::HashSet::new();
            prop_assert!(path.iter().all(|rc| seen.insert(*rc)));

            // Exactly the path cells after the entry hold a prev link.
            let with_prev: std::collections::HashSet<_> = board
                .cells()
                .filter(|rc| {
                    board
                        .block(*rc)
                        .component()
                        .is_some_and(|r| board.components().placement(r).prev().is_some())
                })
                .collect();
            let expected: std::collections::HashSet<_> = path[1..].iter().copied().collect();
            prop_assert_eq!(with_prev, expected);
        }
    }
}
