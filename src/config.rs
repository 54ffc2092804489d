use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// 默认设置文件路径
pub const DEFAULT_SETTINGS_PATH: &str = "terrain.json";

/// 地形设置（可由 JSON 文件覆盖）
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TerrainSettings {
    pub noise: NoiseSettings,
    pub generation: GenerationSettings,
}

/// 噪声参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseSettings {
    /// 为 None 时每次启动随机生成种子
    pub seed: Option<u64>,
    pub octaves: u32,
    pub persistence: f64,
    pub lacunarity: f64,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            seed: None,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
        }
    }
}

/// 窗口中心的重置策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RecenterPolicy {
    /// 每次 tick 都以观察者当前位置重新开始螺旋
    #[default]
    EveryTick,
    /// 观察者停留在同一格时保留螺旋进度
    OnObserverMove,
}

/// 增量生成参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub window_half_width: i32,
    pub blocks_per_tick: usize,
    pub height_scale: f64,
    pub frequency: f64,
    pub batch_count: usize,
    pub spiral_step: i32,
    pub frame_interval: u32,
    pub recenter: RecenterPolicy,
    pub enabled: bool,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            window_half_width: 8,  // 16x16 的扫描窗口
            blocks_per_tick: 10,   // 每次 tick 最多生成 10 个方块
            height_scale: 24.0,
            frequency: 128.0,
            batch_count: 16,
            spiral_step: 16,       // 与窗口宽度一致，相邻窗口正好拼接
            frame_interval: 10,    // 每 10 帧生成一次
            recenter: RecenterPolicy::EveryTick,
            enabled: true,
        }
    }
}

impl TerrainSettings {
    /// 从 JSON 文件读取设置，文件不存在时返回默认值
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            info!("Settings file {:?} not found, using defaults", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_json(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.validate()?;

        info!("Loaded terrain settings from {:?}", path);
        Ok(settings)
    }

    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let g = &self.generation;
        let n = &self.noise;

        if g.window_half_width <= 0 {
            return Err(invalid("generation.window_half_width", "must be positive"));
        }
        if g.blocks_per_tick == 0 {
            return Err(invalid("generation.blocks_per_tick", "must be at least 1"));
        }
        if g.batch_count == 0 {
            return Err(invalid("generation.batch_count", "must be at least 1"));
        }
        if g.spiral_step <= 0 {
            return Err(invalid("generation.spiral_step", "must be positive"));
        }
        if g.frame_interval == 0 {
            return Err(invalid("generation.frame_interval", "must be at least 1"));
        }
        if !(g.frequency.is_finite() && g.frequency > 0.0) {
            return Err(invalid("generation.frequency", "must be a positive finite number"));
        }
        if !(g.height_scale.is_finite() && g.height_scale > 0.0) {
            return Err(invalid("generation.height_scale", "must be a positive finite number"));
        }
        if n.octaves == 0 {
            return Err(invalid("noise.octaves", "must be at least 1"));
        }
        if !(n.lacunarity.is_finite() && n.lacunarity > 0.0) {
            return Err(invalid("noise.lacunarity", "must be a positive finite number"));
        }
        if !(n.persistence.is_finite() && n.persistence >= 0.0) {
            return Err(invalid("noise.persistence", "must be a non-negative finite number"));
        }
        Ok(())
    }

    /// 确定本次运行的种子，未固定时随机选取并写回
    pub fn pin_seed(&mut self) -> u64 {
        *self.noise.seed.get_or_insert_with(rand::random::<u64>)
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field, reason: reason.to_string() }
}

/// 启动参数：`--config <path>` 与 `--seed <u64>`
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchOptions {
    pub config_path: PathBuf,
    pub seed: Option<u64>,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_SETTINGS_PATH),
            seed: None,
        }
    }
}

impl LaunchOptions {
    /// 解析参数（不包含程序名）
    pub fn from_args<I: IntoIterator<Item = String>>(args: I) -> Result<Self, ConfigError> {
        let mut options = Self::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => {
                    let value = args
                        .next()
                        .ok_or_else(|| ConfigError::BadArgument("--config needs a path".into()))?;
                    options.config_path = PathBuf::from(value);
                }
                "--seed" => {
                    let value = args
                        .next()
                        .ok_or_else(|| ConfigError::BadArgument("--seed needs a value".into()))?;
                    let seed = value
                        .parse::<u64>()
                        .map_err(|e| ConfigError::BadArgument(format!("--seed {value}: {e}")))?;
                    options.seed = Some(seed);
                }
                other => {
                    return Err(ConfigError::BadArgument(format!("unknown argument `{other}`")));
                }
            }
        }

        Ok(options)
    }

    /// 读取设置文件并应用命令行覆盖
    pub fn resolve_settings(&self) -> Result<TerrainSettings, ConfigError> {
        let mut settings = TerrainSettings::load(&self.config_path)?;
        if let Some(seed) = self.seed {
            settings.noise.seed = Some(seed);
        }
        Ok(settings)
    }
}
