use bevy::prelude::*;

use super::voxel_mesh::VoxelMeshBuilder;

/// 一个几何批次：累积许多方块的顶点数据，由渲染端整体上传
#[derive(Debug, Default, Clone)]
pub struct GeometryBatch {
    mesh: VoxelMeshBuilder,
    cell_count: usize,
    dirty: bool,
}

impl GeometryBatch {
    /// 追加一个方块
    pub fn push_cube(&mut self, cell: IVec3, color: impl FnMut() -> Color) {
        self.mesh.add_cube(cell.as_vec3(), color);
        self.cell_count += 1;
        self.dirty = true;
    }

    pub fn mesh(&self) -> &VoxelMeshBuilder {
        &self.mesh
    }

    pub fn cell_count(&self) -> usize {
        self.cell_count
    }

    /// 自上次上传以来是否有新内容
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}

/// 固定数量的批次，轮流填充
#[derive(Debug, Clone)]
pub struct BatchPool {
    batches: Vec<GeometryBatch>,
    current_batch_index: usize,
}

impl BatchPool {
    pub fn new(count: usize) -> Self {
        debug_assert!(count > 0, "batch pool needs at least one batch");
        Self {
            batches: vec![GeometryBatch::default(); count.max(1)],
            current_batch_index: 0,
        }
    }

    pub fn current(&self) -> &GeometryBatch {
        &self.batches[self.current_batch_index]
    }

    pub fn current_mut(&mut self) -> &mut GeometryBatch {
        &mut self.batches[self.current_batch_index]
    }

    pub fn current_index(&self) -> usize {
        self.current_batch_index
    }

    /// 切换到下一个批次（取模，不会越界）
    pub fn advance(&mut self) -> usize {
        self.current_batch_index = (self.current_batch_index + 1) % self.batches.len();
        self.current_batch_index
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&GeometryBatch> {
        self.batches.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut GeometryBatch> {
        self.batches.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GeometryBatch> {
        self.batches.iter()
    }

    pub fn total_cells(&self) -> usize {
        self.batches.iter().map(GeometryBatch::cell_count).sum()
    }
}
