use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{GenerationSettings, RecenterPolicy, TerrainSettings};
use crate::rendering::batch::BatchPool;
use crate::world::noise::NoiseField;
use crate::world::spiral::SpiralTraversal;
use crate::world::storage::OccupancyStore;

/// 生成器状态，由外部输入切换
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenerationState {
    #[default]
    Enabled,
    Disabled,
}

/// 一次 tick 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// 已禁用，什么都没做
    Disabled,
    /// 达到预算，窗口剩余部分留给之后的 tick
    BudgetExhausted { center: IVec2, emitted: usize },
    /// 窗口扫描完毕，螺旋与批次均已前进
    WindowCompleted {
        center: IVec2,
        emitted: usize,
        next_center: IVec2,
        next_batch: usize,
    },
}

impl TickOutcome {
    pub fn emitted(&self) -> usize {
        match *self {
            TickOutcome::Disabled => 0,
            TickOutcome::BudgetExhausted { emitted, .. }
            | TickOutcome::WindowCompleted { emitted, .. } => emitted,
        }
    }
}

/// 地形生成器：每次 tick 执行一份有界的工作
#[derive(Resource)]
pub struct TerrainGenerator {
    noise: NoiseField,
    occupancy: OccupancyStore,
    batches: BatchPool,
    spiral: SpiralTraversal,
    config: GenerationSettings,
    state: GenerationState,
    /// 上一次螺旋重置时观察者所在格
    last_origin: Option<IVec2>,
    windows_completed: u64,
    jitter_rng: StdRng,
}

impl TerrainGenerator {
    pub fn new(noise: NoiseField, mut config: GenerationSettings) -> Self {
        debug_assert!(config.blocks_per_tick > 0, "block budget must be positive");
        config.blocks_per_tick = config.blocks_per_tick.max(1);

        let state = if config.enabled {
            GenerationState::Enabled
        } else {
            GenerationState::Disabled
        };
        let jitter_rng = StdRng::seed_from_u64(noise.seed() ^ 0x9E37_79B9_7F4A_7C15);

        Self {
            occupancy: OccupancyStore::new(),
            batches: BatchPool::new(config.batch_count),
            spiral: SpiralTraversal::new(config.spiral_step),
            noise,
            config,
            state,
            last_origin: None,
            windows_completed: 0,
            jitter_rng,
        }
    }

    pub fn from_settings(settings: &TerrainSettings, seed: u64) -> Self {
        Self::new(
            NoiseField::from_settings(&settings.noise, seed),
            settings.generation.clone(),
        )
    }

    pub fn noise(&self) -> &NoiseField {
        &self.noise
    }

    pub fn occupancy(&self) -> &OccupancyStore {
        &self.occupancy
    }

    pub fn batches(&self) -> &BatchPool {
        &self.batches
    }

    pub fn batches_mut(&mut self) -> &mut BatchPool {
        &mut self.batches
    }

    pub fn spiral(&self) -> &SpiralTraversal {
        &self.spiral
    }

    pub fn config(&self) -> &GenerationSettings {
        &self.config
    }

    pub fn state(&self) -> GenerationState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.state == GenerationState::Enabled
    }

    pub fn windows_completed(&self) -> u64 {
        self.windows_completed
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.state = if enabled {
            GenerationState::Enabled
        } else {
            GenerationState::Disabled
        };
    }

    /// 切换启用状态，返回切换后是否启用
    pub fn toggle(&mut self) -> bool {
        self.set_enabled(!self.is_enabled());
        self.is_enabled()
    }

    /// 某一列的地形高度
    pub fn height_at(&self, wx: i32, wz: i32) -> i32 {
        let frequency = self.config.frequency;
        let value = self.noise.sample2(wx as f64 / frequency, wz as f64 / frequency);
        (value * self.config.height_scale).floor() as i32
    }

    /// 某一列对应的方块坐标
    pub fn cell_at(&self, wx: i32, wz: i32) -> IVec3 {
        IVec3::new(wx, self.height_at(wx, wz), wz)
    }

    /// 在当前批次中生成一个方块；已存在时跳过并返回 false
    pub fn emit_cell(&mut self, cell: IVec3) -> bool {
        if self.occupancy.contains(cell) {
            return false;
        }

        let rng = &mut self.jitter_rng;
        self.batches.current_mut().push_cube(cell, || jitter_color(rng));
        let inserted = self.occupancy.insert(cell);
        debug_assert!(inserted, "cell {cell:?} emitted twice");

        trace!("Generated block at {:?} in batch {}", cell, self.batches.current_index());
        true
    }

    /// 执行一次有界的生成工作，`observer` 为观察者水平位置 (x, z)
    pub fn tick(&mut self, observer: Vec2) -> TickOutcome {
        if !self.is_enabled() {
            return TickOutcome::Disabled;
        }

        let origin = observer.floor().as_ivec2();
        let should_reset = match self.config.recenter {
            RecenterPolicy::EveryTick => true,
            RecenterPolicy::OnObserverMove => self.last_origin != Some(origin),
        };
        if should_reset {
            self.spiral.reset(origin);
            // 第一次前进返回原点本身
            self.spiral.advance();
            self.last_origin = Some(origin);
        }

        let center = self.spiral.current();
        let d = self.config.window_half_width;
        let budget = self.config.blocks_per_tick;
        let mut emitted = 0;

        // 坐标接近 i32 边界时窗口被截断
        let (x_start, x_end) = (center.x.saturating_sub(d), center.x.saturating_add(d));
        let (z_start, z_end) = (center.y.saturating_sub(d), center.y.saturating_add(d));

        for wx in x_start..x_end {
            for wz in z_start..z_end {
                let cell = self.cell_at(wx, wz);
                if !self.emit_cell(cell) {
                    continue;
                }
                emitted += 1;
                if emitted >= budget {
                    debug!(
                        "Block budget of {} reached in window centered at {:?}",
                        budget, center
                    );
                    return TickOutcome::BudgetExhausted { center, emitted };
                }
            }
        }

        let next_center = self.spiral.advance();
        let next_batch = self.batches.advance();
        self.windows_completed += 1;
        debug!(
            "Window at {:?} complete ({} new blocks), moving to {:?} with batch {}",
            center, emitted, next_center, next_batch
        );

        TickOutcome::WindowCompleted {
            center,
            emitted,
            next_center,
            next_batch,
        }
    }
}

/// 白色到灰色之间的随机亮度扰动
fn jitter_color(rng: &mut StdRng) -> Color {
    let t = rng.gen::<f32>() * 0.3;
    let shade = 1.0 + t * (0.5 - 1.0);
    Color::rgb(shade, shade, shade)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::voxel_mesh::VERTICES_PER_CUBE;

    fn settings(half_width: i32, budget: usize) -> GenerationSettings {
        GenerationSettings {
            window_half_width: half_width,
            blocks_per_tick: budget,
            ..GenerationSettings::default()
        }
    }

    fn generator(half_width: i32, budget: usize) -> TerrainGenerator {
        TerrainGenerator::new(NoiseField::new(42, 4), settings(half_width, budget))
    }

    #[test]
    fn emitting_same_cell_twice_adds_geometry_once() {
        let mut terrain = generator(2, 100);
        let cell = IVec3::new(3, 7, -2);
        assert!(terrain.emit_cell(cell));
        assert!(!terrain.emit_cell(cell));
        assert_eq!(terrain.occupancy().len(), 1);
        assert_eq!(terrain.batches().total_cells(), 1);
        assert_eq!(terrain.batches().current().mesh().vertex_count(), VERTICES_PER_CUBE);
    }

    #[test]
    fn budget_stops_scan_early() {
        // 20x20 窗口，400 个候选
        let mut terrain = generator(10, 10);
        let outcome = terrain.tick(Vec2::ZERO);
        assert_eq!(outcome, TickOutcome::BudgetExhausted { center: IVec2::ZERO, emitted: 10 });
        assert_eq!(terrain.occupancy().len(), 10);
        assert_eq!(terrain.batches().current_index(), 0);
        assert_eq!(terrain.spiral().current(), IVec2::ZERO);
    }

    #[test]
    fn unfinished_window_is_rescanned_with_skips() {
        let mut terrain = generator(10, 10);
        terrain.tick(Vec2::ZERO);
        let first: Vec<IVec3> = terrain.occupancy().iter().copied().collect();

        let outcome = terrain.tick(Vec2::ZERO);
        assert_eq!(outcome.emitted(), 10);
        assert_eq!(terrain.occupancy().len(), 20);
        for cell in first {
            assert!(terrain.occupancy().contains(cell));
        }

        // 40 次 tick 之后整个窗口完成
        let mut ticks = 2;
        loop {
            ticks += 1;
            if let TickOutcome::WindowCompleted { emitted, .. } = terrain.tick(Vec2::ZERO) {
                assert_eq!(emitted, 0);
                break;
            }
            assert!(ticks < 100, "window never completed");
        }
        assert_eq!(terrain.occupancy().len(), 400);
        assert_eq!(terrain.batches().total_cells(), 400);
    }

    #[test]
    fn completed_window_rotates_batch_and_spiral() {
        let mut terrain = generator(2, 1000);
        let outcome = terrain.tick(Vec2::new(0.4, 0.9));
        assert_eq!(
            outcome,
            TickOutcome::WindowCompleted {
                center: IVec2::ZERO,
                emitted: 16,
                next_center: IVec2::new(16, 0),
                next_batch: 1,
            }
        );
        assert_eq!(terrain.windows_completed(), 1);
        assert_eq!(terrain.batches().get(0).map(|b| b.cell_count()), Some(16));
    }

    #[test]
    fn every_tick_policy_recenters_on_observer() {
        let mut terrain = generator(2, 1000);
        terrain.tick(Vec2::ZERO);
        let outcome = terrain.tick(Vec2::ZERO);
        // 螺旋被重置，同一窗口再次扫描但没有新方块
        assert!(matches!(
            outcome,
            TickOutcome::WindowCompleted { center: IVec2::ZERO, emitted: 0, .. }
        ));
        assert_eq!(terrain.occupancy().len(), 16);
    }

    #[test]
    fn observer_move_policy_spirals_outward() {
        let mut config = settings(2, 1000);
        config.recenter = RecenterPolicy::OnObserverMove;
        config.spiral_step = 4;
        let mut terrain = TerrainGenerator::new(NoiseField::new(42, 4), config);

        for _ in 0..9 {
            terrain.tick(Vec2::ZERO);
        }
        // 3x3 个 4x4 窗口
        assert_eq!(terrain.occupancy().len(), 9 * 16);
        assert_eq!(terrain.spiral().ring(), 2);

        // 观察者移动后重新以新位置为中心
        let outcome = terrain.tick(Vec2::new(100.0, 100.0));
        assert!(matches!(
            outcome,
            TickOutcome::WindowCompleted { center, emitted: 16, .. } if center == IVec2::new(100, 100)
        ));
    }

    #[test]
    fn disabled_tick_changes_nothing() {
        let mut terrain = generator(2, 1000);
        terrain.tick(Vec2::ZERO);
        terrain.set_enabled(false);
        assert_eq!(terrain.state(), GenerationState::Disabled);

        let occupied = terrain.occupancy().len();
        let batch = terrain.batches().current_index();
        let spiral = terrain.spiral().current();

        for i in 0..5 {
            assert_eq!(terrain.tick(Vec2::new(i as f32 * 50.0, 3.0)), TickOutcome::Disabled);
        }
        assert_eq!(terrain.occupancy().len(), occupied);
        assert_eq!(terrain.batches().current_index(), batch);
        assert_eq!(terrain.spiral().current(), spiral);

        assert!(terrain.toggle());
        assert_eq!(terrain.state(), GenerationState::Enabled);
        assert!(terrain.tick(Vec2::new(50.0, 3.0)).emitted() > 0);
    }

    #[test]
    fn negative_observer_positions_floor() {
        let mut terrain = generator(1, 1000);
        let outcome = terrain.tick(Vec2::new(-0.5, -3.2));
        assert!(matches!(
            outcome,
            TickOutcome::WindowCompleted { center, .. } if center == IVec2::new(-1, -4)
        ));
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic(expected = "block budget must be positive"))]
    fn zero_budget_is_clamped_to_one() {
        let mut terrain = generator(2, 0);
        assert_eq!(terrain.config().blocks_per_tick, 1);
        assert_eq!(terrain.tick(Vec2::ZERO).emitted(), 1);
    }

    #[test]
    fn far_away_observer_does_not_overflow() {
        let mut terrain = generator(2, 1000);
        let outcome = terrain.tick(Vec2::new(3.0e9, -3.0e9));
        // 观察者坐标饱和到 i32 边界，窗口只剩 2x2
        assert!(matches!(
            outcome,
            TickOutcome::WindowCompleted { center, emitted: 4, .. }
                if center == IVec2::new(i32::MAX, i32::MIN)
        ));
        assert!(terrain.occupancy().iter().all(|c| c.x >= i32::MAX - 2 && c.z < i32::MIN + 2));

        // 再走几步螺旋也不会溢出
        for _ in 0..5 {
            terrain.tick(Vec2::new(3.0e9, -3.0e9));
        }
    }

    #[test]
    fn jitter_stays_between_white_and_gray() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..1000 {
            let [r, g, b, a] = jitter_color(&mut rng).as_rgba_f32();
            assert!((0.85..=1.0).contains(&r));
            assert_eq!(r, g);
            assert_eq!(g, b);
            assert_eq!(a, 1.0);
        }
    }
}
