//! GPU-ready per-instance records

use bytemuck::{Pod, Zeroable};

use super::{DrawItem, DrawKind};

/// One drawn object: a model matrix plus the handles the backend needs
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct DrawInstance {
    pub model: [[f32; 4]; 4],
    pub kind: u32,
    pub model_index: u32,
    pub texture_index: u32,
    pub locked: u32,
}

/// Values of [`DrawInstance::kind`]
pub mod kinds {
    pub const PLACEMENT: u32 = 0;
    pub const BALL: u32 = 1;
    pub const END: u32 = 2;
    pub const END_OFF_BOARD: u32 = 3;
}

impl From<&DrawItem> for DrawInstance {
    fn from(item: &DrawItem) -> Self {
        let (kind, model_index, texture_index, locked) = match item.kind {
            DrawKind::Placement { obj, .. } => (
                kinds::PLACEMENT,
                obj.model_index as u32,
                obj.texture_index as u32,
                obj.locked_in_place as u32,
            ),
            DrawKind::Ball => (kinds::BALL, 0, 0, 0),
            DrawKind::End => (kinds::END, 0, 0, 0),
            DrawKind::EndOffBoard => (kinds::END_OFF_BOARD, 0, 0, 0),
        };
        Self {
            model: item.transform.to_cols_array_2d(),
            kind,
            model_index,
            texture_index,
            locked,
        }
    }
}

/// Pack a frame's draw list for upload
pub fn pack(items: &[DrawItem]) -> Vec<DrawInstance> {
    items.iter().map(DrawInstance::from).collect()
}
