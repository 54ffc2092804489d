use bevy::diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiPlugin};

use crate::controller::{ControlMode, FirstPersonController};
use crate::world::generator::TerrainGenerator;

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(EguiPlugin)
            .insert_resource(DebugState::default())
            .add_systems(Update, debug_ui_system);
    }
}

#[derive(Resource, Default)]
pub struct DebugState {
    pub fps: f32,
    pub blocks_generated: usize,
    pub current_batch: usize,
    pub spiral_ring: u32,
}

fn debug_ui_system(
    mut contexts: EguiContexts,
    mut state: ResMut<DebugState>,
    diagnostics: Res<DiagnosticsStore>,
    terrain: Option<Res<TerrainGenerator>>,
    controller_query: Query<&FirstPersonController>,
) {
    if let Some(fps_diagnostic) = diagnostics.get(FrameTimeDiagnosticsPlugin::FPS) {
        if let Some(fps) = fps_diagnostic.smoothed() { state.fps = fps as f32; }
    }

    if let Some(terrain) = &terrain {
        state.blocks_generated = terrain.occupancy().len();
        state.current_batch = terrain.batches().current_index();
        state.spiral_ring = terrain.spiral().ring();
    }

    let flying = controller_query
        .get_single()
        .map(|c| c.mode == ControlMode::Flying)
        .unwrap_or(false);

    egui::Window::new("Terrain").show(contexts.ctx_mut(), |ui| {
        ui.label(format!("FPS: {:.1}", state.fps));
        ui.label(format!("Blocks generated: {}", state.blocks_generated));
        ui.label(format!("Current batch: {}", state.current_batch));
        ui.label(format!("Spiral ring: {}", state.spiral_ring));
        if let Some(terrain) = &terrain {
            ui.label(format!("Seed: {}", terrain.noise().seed()));
            ui.label(format!("Generation: {}", if terrain.is_enabled() { "on" } else { "off" }));
        }
        ui.label(format!("Flying: {}", if flying { "yes" } else { "no" }));
        ui.separator();
        ui.label("WASD move, P toggle flight, H toggle generation, Esc release cursor");
    });
}
