//! Draw-object selection and transforms
//!
//! Nothing here talks to a graphics API. The level produces a list of
//! [`DrawItem`]s each frame and a backend turns them into draw calls, using
//! [`instance::DrawInstance`] when it wants a GPU-ready record.

pub mod instance;

pub use instance::DrawInstance;

use glam::{Mat4, Quat, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::sim::{ComponentSet, ComponentType, PlacementRef};

/// Model/texture pair a placement is drawn with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjReference {
    /// Drawn with the locked-in-place look
    pub locked_in_place: bool,
    pub model_index: usize,
    pub texture_index: usize,
}

impl ObjReference {
    pub const fn new(locked_in_place: bool, model_index: usize, texture_index: usize) -> Self {
        Self {
            locked_in_place,
            model_index,
            texture_index,
        }
    }
}

/// Pair models with textures, cycling the shorter list.
///
/// A count of zero means the backend's default model or texture and is treated as one.
pub fn build_obj_references(
    locked_in_place: bool,
    nbr_models: usize,
    nbr_textures: usize,
) -> Vec<ObjReference> {
    let nbr_models = nbr_models.max(1);
    let nbr_textures = nbr_textures.max(1);
    (0..nbr_models.max(nbr_textures))
        .map(|i| ObjReference::new(locked_in_place, i % nbr_models, i % nbr_textures))
        .collect()
}

/// Pick one of several equally valid variants
pub fn choose_variant<R: Rng + ?Sized>(
    rng: &mut R,
    candidates: &[ObjReference],
) -> Option<ObjReference> {
    match candidates.len() {
        0 => None,
        1 => Some(candidates[0]),
        n => Some(candidates[rng.random_range(0..n)]),
    }
}

/// The draw objects a placement may use as it stands. Placements the player
/// can no longer move use the locked-in-place set when their component has one.
pub fn obj_candidates(components: &ComponentSet, placement: PlacementRef) -> &[ObjReference] {
    let component = components.get(placement.component);
    let locked = component.obj_references_locked();
    if !component.placement(placement.index).movement_allowed() && !locked.is_empty() {
        locked
    } else {
        component.obj_references()
    }
}

/// The draw object for a placement, choosing and caching one if it has none
/// or if the cached one is not among its candidates.
pub fn choose_obj<R: Rng + ?Sized>(
    rng: &mut R,
    components: &mut ComponentSet,
    placement: PlacementRef,
) -> Option<ObjReference> {
    let candidates = obj_candidates(components, placement);
    let cached = components.placement(placement).obj_reference();
    if let Some(cached) = cached.filter(|c| candidates.contains(c)) {
        return Some(cached);
    }

    let chosen = choose_variant(rng, candidates)?;
    components.placement_mut(placement).set_obj_reference(chosen);
    Some(chosen)
}

/// Translate, then rotate about z, then scale uniformly
pub fn model_matrix(position: Vec3, angle: f32, scale: f32) -> Mat4 {
    Mat4::from_scale_rotation_translation(
        Vec3::splat(scale),
        Quat::from_rotation_z(angle),
        position,
    )
}

/// What a draw item shows
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawKind {
    Placement {
        component: ComponentType,
        obj: ObjReference,
    },
    Ball,
    /// The exit tile of the goal band
    End,
    /// Goal band filler
    EndOffBoard,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawItem {
    pub kind: DrawKind,
    pub transform: Mat4,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_build_obj_references_cycles_shorter_list() {
        let refs = build_obj_references(true, 2, 3);
        assert_eq!(
            refs,
            vec![
                ObjReference::new(true, 0, 0),
                ObjReference::new(true, 1, 1),
                ObjReference::new(true, 0, 2),
            ]
        );
        assert_eq!(build_obj_references(false, 0, 0), vec![ObjReference::new(false, 0, 0)]);
    }

    #[test]
    fn test_choose_variant() {
        let mut rng = Pcg32::seed_from_u64(7);
        assert_eq!(choose_variant(&mut rng, &[]), None);
        let one = [ObjReference::new(false, 3, 4)];
        assert_eq!(choose_variant(&mut rng, &one), Some(one[0]));
        let many = build_obj_references(false, 4, 1);
        for _ in 0..20 {
            let chosen = choose_variant(&mut rng, &many).unwrap();
            assert!(many.contains(&chosen));
        }
    }

    #[test]
    fn test_choose_obj_caches_and_prefers_locked_set() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut components = ComponentSet::new(1.0);
        let straight = components.get_mut(ComponentType::Straight);
        straight.set_obj_references(build_obj_references(false, 3, 1));
        straight.set_obj_references_locked(build_obj_references(true, 1, 1));
        let free = components.add(ComponentType::Straight, 0, 0, 0, false);
        let fixed = components.add(ComponentType::Straight, 0, 1, 0, true);

        let first = choose_obj(&mut rng, &mut components, free).unwrap();
        assert!(!first.locked_in_place);
        for _ in 0..10 {
            assert_eq!(choose_obj(&mut rng, &mut components, free), Some(first));
        }
        assert_eq!(
            choose_obj(&mut rng, &mut components, fixed),
            Some(ObjReference::new(true, 0, 0))
        );
    }

    #[test]
    fn test_choose_obj_falls_back_to_unlocked_set() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut components = ComponentSet::new(1.0);
        components
            .get_mut(ComponentType::NoMovementRock)
            .set_obj_references(build_obj_references(false, 1, 1));
        let rock = components.add(ComponentType::NoMovementRock, 0, 0, 0, true);
        assert_eq!(
            choose_obj(&mut rng, &mut components, rock),
            Some(ObjReference::new(false, 0, 0))
        );

        let nothing = components.add(ComponentType::Open, 0, 0, 0, false);
        assert_eq!(choose_obj(&mut rng, &mut components, nothing), None);
    }

    #[test]
    fn test_choose_obj_replaces_unknown_cached_obj() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut components = ComponentSet::new(1.0);
        components
            .get_mut(ComponentType::Turn)
            .set_obj_references(build_obj_references(false, 2, 1));
        let turn = components.add(ComponentType::Turn, 0, 0, 0, false);
        components
            .placement_mut(turn)
            .set_obj_reference(ObjReference::new(true, 99, 42));

        let chosen = choose_obj(&mut rng, &mut components, turn).unwrap();
        assert!(build_obj_references(false, 2, 1).contains(&chosen));
        assert_eq!(components.placement(turn).obj_reference(), Some(chosen));
        assert_eq!(obj_candidates(&components, turn), build_obj_references(false, 2, 1).as_slice());
    }

    #[test]
    fn test_model_matrix() {
        let m = model_matrix(Vec3::new(1.0, 2.0, 3.0), std::f32::consts::FRAC_PI_2, 0.5);
        let p = m.transform_point3(Vec3::new(2.0, 0.0, 0.0));
        assert!((p - Vec3::new(1.0, 3.0, 3.0)).length() < 1e-5);
    }
}
