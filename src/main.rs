//! Movable Passage headless runner
//!
//! Builds a level from an optional JSON config, places a piece, tilts the
//! board and simulates a few seconds, then round-trips the level through its
//! save data.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    if let Err(e) = native::run() {
        log::error!("{e:#}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Embedders drive the level directly through the library
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use anyhow::Context;
    use glam::Vec2;

    use movable_passage::renderer::DrawKind;
    use movable_passage::{LevelConfig, LevelSaveData, MovablePassageLevel, RowCol};

    const FRAME_TIME: f32 = 1.0 / 60.0;
    const FRAMES: usize = 600;

    fn load_config() -> anyhow::Result<LevelConfig> {
        match std::env::args().nth(1) {
            Some(path) => {
                let json = std::fs::read_to_string(&path)
                    .with_context(|| format!("reading level config {path}"))?;
                LevelConfig::from_json(&json)
            }
            None => Ok(LevelConfig::default()),
        }
    }

    pub fn run() -> anyhow::Result<()> {
        log::info!("Movable Passage (native) starting...");
        let config = load_config()?;
        let mut level = MovablePassageLevel::new(&config)?;
        let (model, texture) = config.asset_names(DrawKind::Ball);
        log::debug!("ball drawn with {model} and {texture}");

        // Move the first staged piece into the bottom cell of the building area
        let target = level.layout().first_placeable();
        let staged = level
            .board()
            .cells()
            .find(|&rc| {
                rc.row < target.row
                    && level
                        .board()
                        .block(rc)
                        .component()
                        .is_some_and(|r| level.board().components().placement(r).movement_allowed())
            })
            .context("no staged piece to place")?;
        let from = level.board().position(staged).truncate();
        let to = level.board().position(target).truncate();
        level.drag(from, Vec2::ZERO);
        level.drag_ended(to);
        log::info!("placed piece from {:?} at {:?}", staged, target);

        // Tilt towards the goal
        level.update_acceleration(0.0, -4.0, 0.0);
        let mut redraws = 0;
        for _ in 0..FRAMES {
            if level.update_data(FRAME_TIME) {
                redraws += 1;
                level.draw_instances();
            }
            if level.is_finished() {
                break;
            }
        }
        log::info!(
            "ball at {:?} after {} redraws, locked path {:?}",
            level.ball_rc(),
            redraws,
            level.path_locked_in_place()
        );

        let json = level.save_data().to_json()?;
        let save = LevelSaveData::from_json(&json)?;
        let restored = MovablePassageLevel::from_save(&config, &save)?;
        anyhow::ensure!(
            restored.ball_rc() == level.ball_rc()
                && restored.path_locked_in_place() == level.path_locked_in_place(),
            "restored level differs from the saved one"
        );
        log::info!("save round trip ok ({} bytes)", json.len());
        log_summary(&restored, level.layout().end_rc());
        Ok(())
    }

    fn log_summary(level: &MovablePassageLevel, end: RowCol) {
        if level.is_finished() {
            log::info!("level finished at {:?}", end);
        } else {
            log::info!("level not finished; the goal is at {:?}", end);
        }
    }
}
