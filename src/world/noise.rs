use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;

use crate::config::NoiseSettings;

/// 确定性的三维梯度噪声（经典 Perlin），支持多倍频叠加
#[derive(Debug, Clone)]
pub struct NoiseField {
    seed: u64,
    /// 256 项排列重复一次，避免取模
    permutation: [u8; 512],
    octaves: u32,
    persistence: f64,
    lacunarity: f64,
}

impl NoiseField {
    pub fn new(seed: u64, octaves: u32) -> Self {
        // 固定算法的 ChaCha，同一种子在不同版本间得到相同排列
        let mut table: Vec<u8> = (0..=255u8).collect();
        let mut rng = ChaCha12Rng::seed_from_u64(seed);
        table.shuffle(&mut rng);

        let mut permutation = [0u8; 512];
        for (i, slot) in permutation.iter_mut().enumerate() {
            *slot = table[i & 255];
        }

        Self {
            seed,
            permutation,
            octaves,
            persistence: 0.5,
            lacunarity: 2.0,
        }
    }

    pub fn from_settings(settings: &NoiseSettings, seed: u64) -> Self {
        Self::new(seed, settings.octaves).with_fractal(settings.persistence, settings.lacunarity)
    }

    /// 设置每层振幅衰减与频率倍增
    pub fn with_fractal(mut self, persistence: f64, lacunarity: f64) -> Self {
        self.persistence = persistence;
        self.lacunarity = lacunarity;
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn octaves(&self) -> u32 {
        self.octaves
    }

    /// 二维采样（z = 0）
    pub fn sample2(&self, x: f64, y: f64) -> f64 {
        self.sample(x, y, 0.0)
    }

    /// 多倍频叠加采样，结果按振幅总和归一化，范围约为 [-1, 1]
    pub fn sample(&self, x: f64, y: f64, z: f64) -> f64 {
        debug_assert!(self.octaves > 0, "octave count must be at least 1");

        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut amplitude_sum = 0.0;

        for _ in 0..self.octaves.max(1) {
            total += self.sample_single(x * frequency, y * frequency, z * frequency) * amplitude;
            amplitude_sum += amplitude;
            amplitude *= self.persistence;
            frequency *= self.lacunarity;
        }

        let value = if amplitude_sum > 0.0 { total / amplitude_sum } else { 0.0 };
        debug_assert!(value.is_finite(), "noise produced {value} at ({x}, {y}, {z})");
        if value.is_finite() { value } else { 0.0 }
    }

    /// 单层采样
    pub fn sample_single(&self, x: f64, y: f64, z: f64) -> f64 {
        let (xi, xf) = lattice(x);
        let (yi, yf) = lattice(y);
        let (zi, zf) = lattice(z);

        let u = fade(xf);
        let v = fade(yf);
        let w = fade(zf);

        let p = |i: usize| self.permutation[i] as usize;

        let a = p(xi) + yi;
        let aa = p(a) + zi;
        let ab = p(a + 1) + zi;
        let b = p(xi + 1) + yi;
        let ba = p(b) + zi;
        let bb = p(b + 1) + zi;

        lerp(
            w,
            lerp(
                v,
                lerp(u, grad(p(aa), xf, yf, zf), grad(p(ba), xf - 1.0, yf, zf)),
                lerp(u, grad(p(ab), xf, yf - 1.0, zf), grad(p(bb), xf - 1.0, yf - 1.0, zf)),
            ),
            lerp(
                v,
                lerp(
                    u,
                    grad(p(aa + 1), xf, yf, zf - 1.0),
                    grad(p(ba + 1), xf - 1.0, yf, zf - 1.0),
                ),
                lerp(
                    u,
                    grad(p(ab + 1), xf, yf - 1.0, zf - 1.0),
                    grad(p(bb + 1), xf - 1.0, yf - 1.0, zf - 1.0),
                ),
            ),
        )
    }
}

/// 晶格坐标（取低 8 位）与小数部分
#[inline]
fn lattice(t: f64) -> (usize, f64) {
    // 高倍频下坐标可能溢出为无穷
    if !t.is_finite() {
        return (0, 0.0);
    }
    let floor = t.floor();
    // f64 -> i64 饱和转换，极端输入不会 panic
    ((floor as i64 & 255) as usize, t - floor)
}

/// 6t^5 - 15t^4 + 10t^3
#[inline]
fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(t: f64, a: f64, b: f64) -> f64 {
    a + t * (b - a)
}

/// 由哈希低 4 位选择 12 个梯度方向之一（16 项折叠）
#[inline]
fn grad(hash: usize, x: f64, y: f64, z: f64) -> f64 {
    let h = hash & 15;
    let u = if h < 8 { x } else { y };
    let v = if h < 4 {
        y
    } else if h == 12 || h == 14 {
        x
    } else {
        z
    };
    (if h & 1 == 0 { u } else { -u }) + (if h & 2 == 0 { v } else { -v })
}
