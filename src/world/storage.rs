use bevy::prelude::*;
use std::collections::{HashMap, HashSet};

/// 已生成方块坐标的稀疏集合，唯一的去重依据
#[derive(Debug, Default, Clone)]
pub struct OccupancyStore {
    cells: HashSet<IVec3>,
    /// 每列最高的已生成方块，供角色站立检测使用
    surface: HashMap<IVec2, i32>,
}

impl OccupancyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, cell: IVec3) -> bool {
        self.cells.contains(&cell)
    }

    /// 插入坐标，已存在时为空操作；返回是否为新插入
    pub fn insert(&mut self, cell: IVec3) -> bool {
        if !self.cells.insert(cell) {
            return false;
        }
        self.surface
            .entry(IVec2::new(cell.x, cell.z))
            .and_modify(|top| *top = (*top).max(cell.y))
            .or_insert(cell.y);
        true
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &IVec3> {
        self.cells.iter()
    }

    /// 获取某一列最高方块的 y 坐标
    pub fn surface_height(&self, x: i32, z: i32) -> Option<i32> {
        self.surface.get(&IVec2::new(x, z)).copied()
    }
}
