//! Level configuration
//!
//! Loaded from JSON by the caller. Every field has a default, so a config
//! file only needs to name what it changes.

use anyhow::{Context, ensure};
use serde::{Deserialize, Serialize};

use crate::RowCol;
use crate::renderer::DrawKind;
use crate::sim::ComponentType;

/// A component type the player gets to place
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ComponentConfig {
    pub model: String,
    pub texture: String,
    /// How many of this component the level hands out
    pub number_placements: u32,
}

impl ComponentConfig {
    fn new(model: &str, texture: &str, number_placements: u32) -> Self {
        Self {
            model: model.to_owned(),
            texture: texture.to_owned(),
            number_placements,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    // === Surface ===
    /// Width of the visible maze floor in world units
    pub surface_width: f32,
    /// Height of the visible maze floor in world units
    pub surface_height: f32,
    /// z of the maze floor; the board is centered on (0, 0, maze_floor_z)
    pub maze_floor_z: f32,

    // === Building area ===
    pub number_tiles_x: u32,
    pub number_tiles_y: u32,
    /// Column of the building area the start tunnel enters through
    pub start_column: u32,
    /// Column of the building area the end tunnel leaves through
    pub end_column: u32,
    /// Immovable rocks, relative to the bottom left of the building area
    pub rock_placements: Vec<RowCol>,

    // === Playable components ===
    pub straight: ComponentConfig,
    pub turn: ComponentConfig,
    pub crossjunction: ComponentConfig,
    pub tjunction: ComponentConfig,

    // === Fixed scenery ===
    pub rock_models: Vec<String>,
    pub rock_textures: Vec<String>,
    pub dirt_models: Vec<String>,
    pub dirt_textures: Vec<String>,
    /// Closed-bottom pieces along the sides of the start area
    pub beginning_side_models: Vec<String>,
    pub beginning_side_textures: Vec<String>,
    /// Open pieces inside the start area
    pub beginning_open_models: Vec<String>,
    pub beginning_open_textures: Vec<String>,
    /// Closed-corner pieces at the corners of the start area
    pub beginning_corner_models: Vec<String>,
    pub beginning_corner_textures: Vec<String>,
    pub end_texture: String,
    pub end_off_board_texture: String,
    /// Texture for placements the ball has already rolled through
    pub placement_locked_in_place_texture: String,

    // === Ball ===
    pub ball_model: String,
    pub ball_texture: String,

    /// Seed for picking model/texture variants
    pub seed: u64,
}

impl Default for LevelConfig {
    fn default() -> Self {
        let names = |list: &[&str]| list.iter().map(|s| (*s).to_owned()).collect::<Vec<_>>();
        Self {
            surface_width: 2.0,
            surface_height: 4.0,
            maze_floor_z: -1.0,

            number_tiles_x: 4,
            number_tiles_y: 4,
            start_column: 1,
            end_column: 2,
            rock_placements: Vec::new(),

            straight: ComponentConfig::new("models/straight.obj", "textures/straight.png", 3),
            turn: ComponentConfig::new("models/turn.obj", "textures/turn.png", 4),
            crossjunction: ComponentConfig::new(
                "models/crossjunction.obj",
                "textures/crossjunction.png",
                1,
            ),
            tjunction: ComponentConfig::new("models/tjunction.obj", "textures/tjunction.png", 2),

            rock_models: names(&["models/rock1.obj", "models/rock2.obj"]),
            rock_textures: names(&[
                "textures/rock1.png",
                "textures/rock2.png",
                "textures/rock3.png",
            ]),
            dirt_models: names(&["models/dirt.obj"]),
            dirt_textures: names(&["textures/dirt1.png", "textures/dirt2.png"]),
            beginning_side_models: names(&["models/closedBottom.obj"]),
            beginning_side_textures: names(&["textures/beginning.png"]),
            beginning_open_models: names(&["models/open.obj"]),
            beginning_open_textures: names(&["textures/beginning.png"]),
            beginning_corner_models: names(&["models/closedCorner.obj"]),
            beginning_corner_textures: names(&["textures/beginning.png"]),
            end_texture: "textures/end.png".to_owned(),
            end_off_board_texture: "textures/endOffBoard.png".to_owned(),
            placement_locked_in_place_texture: "textures/lockedInPlace.png".to_owned(),

            ball_model: "models/ball.obj".to_owned(),
            ball_texture: "textures/ball.png".to_owned(),

            seed: 0,
        }
    }
}

impl LevelConfig {
    /// Parse and validate a JSON level config
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(json).context("level config is not valid JSON")?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        serde_json::to_string_pretty(self).context("failed to encode level config")
    }

    /// Check the values a level cannot be built without
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.surface_width > 0.0 && self.surface_height > 0.0,
            "surface must have a positive size, got {}x{}",
            self.surface_width,
            self.surface_height
        );
        ensure!(
            self.number_tiles_x > 0 && self.number_tiles_y > 0,
            "building area must be at least one tile, got {}x{}",
            self.number_tiles_x,
            self.number_tiles_y
        );
        ensure!(
            self.start_column < self.number_tiles_x,
            "start column {} is outside the {} wide building area",
            self.start_column,
            self.number_tiles_x
        );
        ensure!(
            self.end_column < self.number_tiles_x,
            "end column {} is outside the {} wide building area",
            self.end_column,
            self.number_tiles_x
        );
        ensure!(self.number_playable() > 0, "level hands out no playable components");

        for rock in &self.rock_placements {
            ensure!(
                rock.row < self.number_tiles_y && rock.col < self.number_tiles_x,
                "rock at ({}, {}) is outside the {}x{} building area",
                rock.row,
                rock.col,
                self.number_tiles_y,
                self.number_tiles_x
            );
        }
        Ok(())
    }

    /// Model and texture names for a draw item, for the backend to resolve.
    /// An empty name stands for the backend's default asset.
    pub fn asset_names(&self, kind: DrawKind) -> (&str, &str) {
        fn pick(list: &[String], index: usize) -> &str {
            list.get(index).map_or("", String::as_str)
        }

        match kind {
            DrawKind::Ball => (self.ball_model.as_str(), self.ball_texture.as_str()),
            DrawKind::End => ("", self.end_texture.as_str()),
            DrawKind::EndOffBoard => ("", self.end_off_board_texture.as_str()),
            DrawKind::Placement { component, obj } => {
                let playable = match component {
                    ComponentType::Straight => Some(&self.straight),
                    ComponentType::Turn => Some(&self.turn),
                    ComponentType::CrossJunction => Some(&self.crossjunction),
                    ComponentType::TJunction => Some(&self.tjunction),
                    _ => None,
                };
                if let Some(config) = playable {
                    let texture = if obj.locked_in_place {
                        &self.placement_locked_in_place_texture
                    } else {
                        &config.texture
                    };
                    return (config.model.as_str(), texture.as_str());
                }

                let (models, textures) = match component {
                    ComponentType::NoMovementRock => (&self.rock_models, &self.rock_textures),
                    ComponentType::NoMovementDirt => (&self.dirt_models, &self.dirt_textures),
                    ComponentType::ClosedBottom => {
                        (&self.beginning_side_models, &self.beginning_side_textures)
                    }
                    ComponentType::Open => {
                        (&self.beginning_open_models, &self.beginning_open_textures)
                    }
                    ComponentType::ClosedCorner => {
                        (&self.beginning_corner_models, &self.beginning_corner_textures)
                    }
                    _ => return ("", ""),
                };
                (pick(models, obj.model_index), pick(textures, obj.texture_index))
            }
        }
    }

    /// Total placements of the four playable types
    pub fn number_playable(&self) -> u32 {
        [&self.straight, &self.turn, &self.crossjunction, &self.tjunction]
            .iter()
            .map(|c| c.number_placements)
            .sum()
    }
}
