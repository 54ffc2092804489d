use bevy::prelude::*;

use self::generator::{TerrainGenerator, TickOutcome};
use crate::config::TerrainSettings;
use crate::controller::FirstPersonController;

pub mod generator;
pub mod noise;
pub mod spiral;
pub mod storage;

pub struct WorldPlugin;

impl Plugin for WorldPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TerrainSettings>()
            .add_systems(PreStartup, setup_terrain_generator)
            .add_systems(
                Update,
                terrain_generation_system.run_if(resource_exists::<TerrainGenerator>()),
            );
    }
}

/// 每隔若干帧执行一次生成
#[derive(Resource, Debug, Clone)]
pub struct GenerationSchedule {
    pub frame_interval: u32,
    pub frame_count: u64,
}

impl GenerationSchedule {
    pub fn new(frame_interval: u32) -> Self {
        Self {
            frame_interval: frame_interval.max(1),
            frame_count: 0,
        }
    }

    /// 推进一帧，返回本帧是否需要生成
    pub fn step(&mut self) -> bool {
        self.frame_count += 1;
        self.frame_count % self.frame_interval as u64 == 0
    }
}

fn setup_terrain_generator(mut commands: Commands, mut settings: ResMut<TerrainSettings>) {
    let seed = settings.pin_seed();
    let generator = TerrainGenerator::from_settings(&settings, seed);

    info!(
        "Terrain generator ready: seed {}, {} octaves, {} batches, window {}x{}, {} blocks per tick",
        seed,
        generator.noise().octaves(),
        generator.batches().len(),
        settings.generation.window_half_width * 2,
        settings.generation.window_half_width * 2,
        settings.generation.blocks_per_tick,
    );

    commands.insert_resource(GenerationSchedule::new(settings.generation.frame_interval));
    commands.insert_resource(generator);
}

/// 地形生成系统 - 以玩家当前位置为中心执行一次 tick
pub fn terrain_generation_system(
    player_query: Query<&Transform, With<FirstPersonController>>,
    mut terrain: ResMut<TerrainGenerator>,
    mut schedule: ResMut<GenerationSchedule>,
) {
    if !schedule.step() {
        return;
    }

    let player_transform = match player_query.get_single() {
        Ok(transform) => transform,
        Err(_) => return,
    };

    let observer = player_transform.translation.xz();
    match terrain.tick(observer) {
        TickOutcome::Disabled => {}
        TickOutcome::BudgetExhausted { emitted, .. } => {
            trace!("Frame {}: {} blocks generated, budget reached", schedule.frame_count, emitted);
        }
        TickOutcome::WindowCompleted { next_batch, .. } => {
            trace!("Frame {}: moved to batch {}", schedule.frame_count, next_batch);
        }
    }
}
