//! 围绕移动观察者增量生成的无限体素地形。
//!
//! 生成工作被拆分到多个 tick 中，每次 tick 受方块预算限制，避免单帧卡顿。

use bevy::prelude::*;

pub mod config;
pub mod controller;
pub mod error;
pub mod rendering;
pub mod ui;
pub mod world;

pub use config::{LaunchOptions, RecenterPolicy, TerrainSettings};
pub use error::ConfigError;
pub use rendering::batch::{BatchPool, GeometryBatch};
pub use world::generator::{GenerationState, TerrainGenerator, TickOutcome};
pub use world::noise::NoiseField;
pub use world::spiral::SpiralTraversal;
pub use world::storage::OccupancyStore;

/// 组合所有游戏插件
pub struct TerrainAppPlugin;

impl Plugin for TerrainAppPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(world::WorldPlugin)
            .add_plugins(rendering::RenderingPlugin)
            .add_plugins(controller::ControllerPlugin)
            .add_plugins(ui::UiPlugin);
    }
}
