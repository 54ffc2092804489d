use bevy::prelude::*;

pub mod batch;
pub mod voxel_mesh;

use crate::world::generator::TerrainGenerator;
use crate::world::terrain_generation_system;

/// 方块纹理路径
pub const BLOCK_TEXTURE_PATH: &str = "textures/grass.png";

pub struct RenderingPlugin;

impl Plugin for RenderingPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, (setup_lighting, setup_batch_entities))
            .add_systems(
                Update,
                upload_dirty_batches
                    .after(terrain_generation_system)
                    .run_if(resource_exists::<TerrainGenerator>()),
            );
    }
}

/// 批次实体标记，对应 BatchPool 中的下标
#[derive(Component, Debug, Clone, Copy)]
pub struct TerrainBatch {
    pub index: usize,
}

fn setup_lighting(mut commands: Commands) {
    commands.insert_resource(AmbientLight {
        color: Color::rgb(0.8, 0.8, 0.85),
        brightness: 0.6,
    });

    commands.spawn(DirectionalLightBundle {
        directional_light: DirectionalLight {
            color: Color::rgb(1.0, 0.95, 0.8),
            illuminance: 10000.0,
            shadows_enabled: true,
            ..default()
        },
        transform: Transform::from_rotation(Quat::from_euler(EulerRot::XYZ, -0.5, 0.5, 0.0)),
        ..default()
    });
}

/// 为每个批次预先创建一个网格实体，共用同一材质
fn setup_batch_entities(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    terrain: Option<Res<TerrainGenerator>>,
) {
    let Some(terrain) = terrain else {
        warn!("No terrain generator available, skipping batch setup");
        return;
    };

    let texture = asset_server.load(BLOCK_TEXTURE_PATH);
    let material = materials.add(StandardMaterial {
        base_color_texture: Some(texture),
        alpha_mode: AlphaMode::Opaque,
        ..default()
    });

    for (index, batch) in terrain.batches().iter().enumerate() {
        commands.spawn((
            PbrBundle {
                mesh: meshes.add(batch.mesh().to_mesh()),
                material: material.clone(),
                // 批次为空时不参与绘制
                visibility: Visibility::Hidden,
                ..default()
            },
            TerrainBatch { index },
        ));
    }

    info!("Created {} terrain batch entities", terrain.batches().len());
}

/// 只重新上传内容有变化的批次
fn upload_dirty_batches(
    mut terrain: ResMut<TerrainGenerator>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut batch_query: Query<(&TerrainBatch, &Handle<Mesh>, &mut Visibility)>,
) {
    for (marker, handle, mut visibility) in batch_query.iter_mut() {
        let Some(batch) = terrain.batches_mut().get_mut(marker.index) else {
            continue;
        };
        if !batch.is_dirty() {
            continue;
        }

        if let Some(mesh) = meshes.get_mut(handle) {
            *mesh = batch.mesh().to_mesh();
            *visibility = Visibility::Inherited;
            batch.mark_clean();
            debug!("Uploaded batch {} ({} blocks)", marker.index, batch.cell_count());
        }
    }
}
