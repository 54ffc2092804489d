use bevy::input::mouse::MouseMotion;
use bevy::prelude::*;
use bevy::window::{CursorGrabMode, PrimaryWindow};

use crate::world::generator::TerrainGenerator;
use crate::world::storage::OccupancyStore;

/// 飞行模式下的升降速度
const FLY_VERTICAL_SPEED: f32 = 5.0;
const PLAYER_HALF_WIDTH: f32 = 0.3;

pub struct ControllerPlugin;

impl Plugin for ControllerPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (
                handle_toggles,
                handle_mouse_look,
                handle_movement,
                handle_cursor_grab,
            ),
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMode {
    Flying,
    Walking,
}

/// 观察者（玩家）控制器
#[derive(Component)]
pub struct FirstPersonController {
    pub speed: f32,
    pub sensitivity: f32,
    pub yaw: f32,
    pub pitch: f32,
    pub mode: ControlMode,
    pub velocity: Vec3,
    pub gravity: f32,
}

impl Default for FirstPersonController {
    fn default() -> Self {
        Self {
            speed: 5.0,
            sensitivity: 0.002,
            yaw: 0.0,
            pitch: 0.0,
            mode: ControlMode::Walking,
            velocity: Vec3::ZERO,
            gravity: 9.8,
        }
    }
}

impl FirstPersonController {
    /// 切换飞行/行走，返回切换后是否在飞行
    pub fn toggle_flight(&mut self) -> bool {
        self.mode = match self.mode {
            ControlMode::Flying => ControlMode::Walking,
            ControlMode::Walking => ControlMode::Flying,
        };
        self.velocity = Vec3::ZERO;
        self.mode == ControlMode::Flying
    }
}

/// 脚下已生成地形的顶面高度（考虑玩家碰撞盒四角）
pub fn ground_height(position: Vec3, occupancy: &OccupancyStore) -> Option<f32> {
    let corners = [
        Vec2::new(-PLAYER_HALF_WIDTH, -PLAYER_HALF_WIDTH),
        Vec2::new(PLAYER_HALF_WIDTH, -PLAYER_HALF_WIDTH),
        Vec2::new(-PLAYER_HALF_WIDTH, PLAYER_HALF_WIDTH),
        Vec2::new(PLAYER_HALF_WIDTH, PLAYER_HALF_WIDTH),
    ];

    corners
        .iter()
        .filter_map(|corner| {
            let column = (position.xz() + *corner).floor().as_ivec2();
            occupancy.surface_height(column.x, column.y)
        })
        .max()
        .map(|top| top as f32 + 1.0)
}

/// P 切换飞行，H 切换地形生成
fn handle_toggles(
    keyboard: Res<Input<KeyCode>>,
    mut controller_query: Query<&mut FirstPersonController>,
    terrain: Option<ResMut<TerrainGenerator>>,
) {
    if keyboard.just_pressed(KeyCode::P) {
        for mut controller in controller_query.iter_mut() {
            let flying = controller.toggle_flight();
            info!("Flight mode: {}", if flying { "on" } else { "off" });
        }
    }

    if keyboard.just_pressed(KeyCode::H) {
        if let Some(mut terrain) = terrain {
            let enabled = terrain.toggle();
            info!("Terrain generation toggled: {}", enabled);
        }
    }
}

fn handle_mouse_look(
    mut mouse_motion: EventReader<MouseMotion>,
    mut controller_query: Query<(&mut FirstPersonController, &mut Transform, &Children)>,
    mut camera_query: Query<&mut Transform, (With<Camera3d>, Without<FirstPersonController>)>,
    primary_window: Query<&Window, With<PrimaryWindow>>,
) {
    let Ok(window) = primary_window.get_single() else {
        return;
    };
    if window.cursor.grab_mode != CursorGrabMode::Locked {
        mouse_motion.clear();
        return;
    }

    for (mut controller, mut player_transform, children) in controller_query.iter_mut() {
        for motion in mouse_motion.read() {
            controller.yaw -= motion.delta.x * controller.sensitivity;
            controller.pitch -= motion.delta.y * controller.sensitivity;
            controller.pitch = controller.pitch.clamp(-1.54, 1.54); // ~88度

            // yaw 转动身体，pitch 只影响摄像机
            player_transform.rotation = Quat::from_axis_angle(Vec3::Y, controller.yaw);
            for &child in children.iter() {
                if let Ok(mut camera_transform) = camera_query.get_mut(child) {
                    camera_transform.rotation = Quat::from_axis_angle(Vec3::X, controller.pitch);
                }
            }
        }
    }
}

fn handle_movement(
    mut query: Query<(&mut Transform, &mut FirstPersonController)>,
    keyboard: Res<Input<KeyCode>>,
    time: Res<Time>,
    terrain: Option<Res<TerrainGenerator>>,
) {
    let delta_time = time.delta_seconds();

    for (mut transform, mut controller) in query.iter_mut() {
        let forward = -transform.local_z();
        let right = transform.local_x();

        let mut input_direction = Vec3::ZERO;
        if keyboard.pressed(KeyCode::W) { input_direction += forward; }
        if keyboard.pressed(KeyCode::S) { input_direction -= forward; }
        if keyboard.pressed(KeyCode::A) { input_direction -= right; }
        if keyboard.pressed(KeyCode::D) { input_direction += right; }

        input_direction.y = 0.0;
        let horizontal = input_direction.normalize_or_zero() * controller.speed;
        controller.velocity.x = horizontal.x;
        controller.velocity.z = horizontal.z;

        match controller.mode {
            ControlMode::Flying => {
                controller.velocity.y = 0.0;
                if keyboard.pressed(KeyCode::Space) { controller.velocity.y += FLY_VERTICAL_SPEED; }
                if keyboard.pressed(KeyCode::ShiftLeft) { controller.velocity.y -= FLY_VERTICAL_SPEED; }
                transform.translation += controller.velocity * delta_time;
            }
            ControlMode::Walking => {
                let ground = terrain
                    .as_ref()
                    .and_then(|terrain| ground_height(transform.translation, terrain.occupancy()));

                // 脚下还没有生成地形时悬停等待
                let Some(ground) = ground else {
                    controller.velocity.y = 0.0;
                    transform.translation += controller.velocity * delta_time;
                    continue;
                };

                let on_ground = transform.translation.y <= ground + 0.01;
                if on_ground && keyboard.just_pressed(KeyCode::Space) {
                    controller.velocity.y = 5.0;
                } else if !on_ground {
                    controller.velocity.y -= controller.gravity * delta_time;
                } else {
                    controller.velocity.y = controller.velocity.y.max(0.0);
                }

                let mut proposed = transform.translation + controller.velocity * delta_time;
                if proposed.y < ground {
                    proposed.y = ground;
                    controller.velocity.y = 0.0;
                }
                transform.translation = proposed;
            }
        }
    }
}

fn handle_cursor_grab(
    mouse_buttons: Res<Input<MouseButton>>,
    keyboard: Res<Input<KeyCode>>,
    mut primary_window: Query<&mut Window, With<PrimaryWindow>>,
) {
    let Ok(mut window) = primary_window.get_single_mut() else {
        return;
    };

    if mouse_buttons.just_pressed(MouseButton::Left) {
        window.cursor.grab_mode = CursorGrabMode::Locked;
        window.cursor.visible = false;
    }

    if keyboard.just_pressed(KeyCode::Escape) {
        window.cursor.grab_mode = CursorGrabMode::None;
        window.cursor.visible = true;
    }
}
