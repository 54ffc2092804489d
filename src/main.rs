use bevy::diagnostic::{FrameTimeDiagnosticsPlugin, LogDiagnosticsPlugin};
use bevy::prelude::*;
use bevy::render::texture::ImagePlugin;
use std::env;

use swirl_terrain::controller::FirstPersonController;
use swirl_terrain::world::generator::TerrainGenerator;
use swirl_terrain::{LaunchOptions, TerrainAppPlugin, TerrainSettings};

/// 在原点上方找到出生高度
fn setup_player(mut commands: Commands, terrain: Res<TerrainGenerator>) {
    let surface_height = terrain.height_at(0, 0);
    let spawn_y = surface_height as f32 + 3.0; // 在地面上方3格出生

    info!("Player spawning at surface height: {} (world pos: 0, {}, 0)", surface_height, spawn_y);

    let player = commands
        .spawn((
            SpatialBundle {
                transform: Transform::from_xyz(0.5, spawn_y, 0.5),
                ..default()
            },
            FirstPersonController::default(),
        ))
        .id();

    commands.entity(player).with_children(|parent| {
        parent.spawn(Camera3dBundle {
            transform: Transform::from_xyz(0.0, 1.62, 0.0),
            ..default()
        });
    });
}

fn load_settings() -> TerrainSettings {
    let options = match LaunchOptions::from_args(env::args().skip(1)) {
        Ok(options) => options,
        Err(e) => {
            error!("{e}");
            LaunchOptions::default()
        }
    };

    match options.resolve_settings() {
        Ok(settings) => settings,
        Err(e) => {
            error!("Failed to load settings, using defaults: {e}");
            let mut settings = TerrainSettings::default();
            settings.noise.seed = options.seed;
            settings
        }
    }
}

fn main() {
    let mut app = App::new();
    app.insert_resource(ClearColor(Color::rgb_u8(0, 200, 211)))
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Swirl Terrain".into(),
                        resolution: (1280.0, 720.0).into(),
                        resizable: true,
                        ..default()
                    }),
                    ..default()
                })
                .set(ImagePlugin::default_nearest()),
        )
        .add_plugins(LogDiagnosticsPlugin::default())
        .add_plugins(FrameTimeDiagnosticsPlugin::default());

    // 日志插件就绪后再读取设置，保证错误能被记录
    let settings = load_settings();

    app.insert_resource(settings)
        .add_plugins(TerrainAppPlugin)
        .add_systems(Startup, setup_player)
        .run();
}
