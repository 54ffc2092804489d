use bevy::prelude::*;

/// 右、上、左、下（x 为右，z 为上）
const DIRECTIONS: [IVec2; 4] = [IVec2::X, IVec2::Y, IVec2::NEG_X, IVec2::NEG_Y];

/// 从原点向外扩展的方形螺旋游标
///
/// 段长依次为 1,1,2,2,3,3,...，每步移动 `step` 格。
/// `reset` 之后第一次 `advance` 返回原点本身，之后每次移动一步。
#[derive(Debug, Clone)]
pub struct SpiralTraversal {
    origin: IVec2,
    current_offset: IVec2,
    direction_index: usize,
    segment_length: u32,
    steps_taken_in_segment: u32,
    ring_index: u32,
    step: i32,
    started: bool,
}

impl SpiralTraversal {
    pub fn new(step: i32) -> Self {
        debug_assert!(step > 0, "spiral step must be positive");
        Self {
            origin: IVec2::ZERO,
            current_offset: IVec2::ZERO,
            direction_index: 0,
            segment_length: 1,
            steps_taken_in_segment: 0,
            ring_index: 0,
            step: step.max(1),
            started: false,
        }
    }

    pub fn reset(&mut self, origin: IVec2) {
        *self = Self {
            origin,
            ..Self::new(self.step)
        };
    }

    pub fn origin(&self) -> IVec2 {
        self.origin
    }

    /// 当前绝对位置
    pub fn current(&self) -> IVec2 {
        saturating_add(self.origin, self.current_offset)
    }

    /// 当前所在的环（与原点的切比雪夫距离 / 步长）
    pub fn ring(&self) -> u32 {
        self.ring_index
    }

    pub fn advance(&mut self) -> IVec2 {
        if !self.started {
            self.started = true;
            return self.current();
        }

        let delta = DIRECTIONS[self.direction_index] * self.step;
        self.current_offset = saturating_add(self.current_offset, delta);
        self.steps_taken_in_segment += 1;

        if self.steps_taken_in_segment == self.segment_length {
            self.steps_taken_in_segment = 0;
            self.direction_index = (self.direction_index + 1) % DIRECTIONS.len();
            // 每转两次弯段长加一
            if self.direction_index % 2 == 0 {
                self.segment_length += 1;
            }
        }

        let offset = self.current_offset.abs();
        self.ring_index = (offset.x.max(offset.y) / self.step) as u32;

        self.current()
    }
}

/// 在 i32 边界处饱和，而不是溢出
fn saturating_add(a: IVec2, b: IVec2) -> IVec2 {
    IVec2::new(a.x.saturating_add(b.x), a.y.saturating_add(b.y))
}

impl Iterator for SpiralTraversal {
    type Item = IVec2;

    fn next(&mut self) -> Option<IVec2> {
        Some(self.advance())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn chebyshev(a: IVec2, b: IVec2) -> i32 {
        let d = (a - b).abs();
        d.x.max(d.y)
    }

    #[test]
    fn first_advance_returns_origin() {
        let mut spiral = SpiralTraversal::new(1);
        spiral.reset(IVec2::new(5, -3));
        assert_eq!(spiral.origin(), IVec2::new(5, -3));
        assert_eq!(spiral.current(), IVec2::new(5, -3));
        assert_eq!(spiral.advance(), IVec2::new(5, -3));
        assert_eq!(spiral.advance(), IVec2::new(6, -3));
    }

    #[test]
    fn traces_square_spiral() {
        let mut spiral = SpiralTraversal::new(1);
        spiral.reset(IVec2::ZERO);
        let visited: Vec<IVec2> = spiral.by_ref().take(10).collect();
        let expected = [
            (0, 0), (1, 0), (1, 1), (0, 1), (-1, 1),
            (-1, 0), (-1, -1), (0, -1), (1, -1), (2, -1),
        ];
        let expected: Vec<IVec2> = expected.iter().map(|&(x, y)| IVec2::new(x, y)).collect();
        assert_eq!(visited, expected);
    }

    #[test]
    fn hundred_steps_are_distinct_and_expand() {
        let mut spiral = SpiralTraversal::new(1);
        spiral.reset(IVec2::ZERO);

        let mut seen = HashSet::new();
        let mut last_distance = 0;
        for i in 0..100 {
            let pos = spiral.advance();
            if i == 0 {
                assert_eq!(pos, IVec2::ZERO);
            }
            assert!(seen.insert(pos), "{pos:?} visited twice");

            let distance = chebyshev(pos, IVec2::ZERO);
            assert!(distance >= last_distance, "ring shrank at step {i}");
            assert!(distance - last_distance <= 1);
            assert_eq!(spiral.ring(), distance as u32);
            last_distance = distance;
        }
        assert_eq!(seen.len(), 100);
    }

    #[test]
    fn moves_by_configured_step() {
        let mut spiral = SpiralTraversal::new(16);
        spiral.reset(IVec2::new(3, 4));
        spiral.advance();
        assert_eq!(spiral.advance(), IVec2::new(19, 4));
        assert_eq!(spiral.advance(), IVec2::new(19, 20));
        assert_eq!(spiral.ring(), 1);
    }

    #[test]
    fn reset_restarts_the_same_sequence() {
        let mut spiral = SpiralTraversal::new(2);
        spiral.reset(IVec2::new(-7, 9));
        let first: Vec<IVec2> = spiral.by_ref().take(30).collect();
        spiral.reset(IVec2::new(-7, 9));
        let second: Vec<IVec2> = spiral.by_ref().take(30).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn saturates_at_integer_limits() {
        let mut spiral = SpiralTraversal::new(16);
        spiral.reset(IVec2::new(i32::MAX - 20, i32::MIN + 20));
        for _ in 0..50 {
            let p = spiral.advance();
            assert!(p.x >= i32::MAX - 20 - 16 * 4);
            assert!(p.y <= i32::MIN + 20 + 16 * 4);
        }
        assert_eq!(spiral.origin(), IVec2::new(i32::MAX - 20, i32::MIN + 20));
    }
}
