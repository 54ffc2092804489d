use bevy::prelude::*;
use bevy::render::mesh::{Indices, PrimitiveTopology};

/// 每个面的四个角 UV
pub const FACE_UVS: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

pub const VERTICES_PER_FACE: usize = 4;
pub const FACES_PER_CUBE: usize = 6;
pub const VERTICES_PER_CUBE: usize = VERTICES_PER_FACE * FACES_PER_CUBE;
pub const INDICES_PER_CUBE: usize = 6 * FACES_PER_CUBE;

/// 方块网格的顶点累积器，只追加不删除
#[derive(Default, Debug, Clone)]
pub struct VoxelMeshBuilder {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<[f32; 2]>,
    pub colors: Vec<[f32; 4]>,
    pub indices: Vec<u32>,
}

impl VoxelMeshBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// 添加完整立方体（6 个面，24 个顶点），`color` 为每个顶点提供颜色
    pub fn add_cube(&mut self, position: Vec3, mut color: impl FnMut() -> Color) {
        for face in CubeFace::ALL {
            self.add_cube_face(position, face, [color(), color(), color(), color()]);
        }
    }

    pub fn add_cube_face(&mut self, position: Vec3, face: CubeFace, colors: [Color; 4]) {
        let base_index = self.positions.len() as u32;
        let normal = face.normal();

        let face_positions = match face {
            CubeFace::Top => [
                position + Vec3::new(0.0, 1.0, 0.0),
                position + Vec3::new(1.0, 1.0, 0.0),
                position + Vec3::new(1.0, 1.0, 1.0),
                position + Vec3::new(0.0, 1.0, 1.0),
            ],
            CubeFace::Bottom => [
                position + Vec3::new(0.0, 0.0, 1.0),
                position + Vec3::new(1.0, 0.0, 1.0),
                position + Vec3::new(1.0, 0.0, 0.0),
                position + Vec3::new(0.0, 0.0, 0.0),
            ],
            CubeFace::North => [
                position + Vec3::new(1.0, 0.0, 0.0),
                position + Vec3::new(0.0, 0.0, 0.0),
                position + Vec3::new(0.0, 1.0, 0.0),
                position + Vec3::new(1.0, 1.0, 0.0),
            ],
            CubeFace::South => [
                position + Vec3::new(0.0, 0.0, 1.0),
                position + Vec3::new(1.0, 0.0, 1.0),
                position + Vec3::new(1.0, 1.0, 1.0),
                position + Vec3::new(0.0, 1.0, 1.0),
            ],
            CubeFace::East => [
                position + Vec3::new(1.0, 0.0, 1.0),
                position + Vec3::new(1.0, 0.0, 0.0),
                position + Vec3::new(1.0, 1.0, 0.0),
                position + Vec3::new(1.0, 1.0, 1.0),
            ],
            CubeFace::West => [
                position + Vec3::new(0.0, 0.0, 0.0),
                position + Vec3::new(0.0, 0.0, 1.0),
                position + Vec3::new(0.0, 1.0, 1.0),
                position + Vec3::new(0.0, 1.0, 0.0),
            ],
        };

        for (i, pos) in face_positions.iter().enumerate() {
            self.positions.push(*pos);
            self.normals.push(normal);
            self.uvs.push(FACE_UVS[i]);
            self.colors.push(colors[i].as_rgba_f32());
        }

        // 顶面和底面的顶点顺序相反，三角形索引也反过来保持朝外
        let indices = if matches!(face, CubeFace::Top | CubeFace::Bottom) {
            [0, 3, 2, 0, 2, 1]
        } else {
            [0, 1, 2, 0, 2, 3]
        };
        for &index in &indices {
            self.indices.push(base_index + index);
        }
    }

    /// 生成可上传的网格（保留自身数据以便继续追加）
    pub fn to_mesh(&self) -> Mesh {
        let mut mesh = Mesh::new(PrimitiveTopology::TriangleList);

        let positions: Vec<[f32; 3]> = self.positions.iter().map(|v| [v.x, v.y, v.z]).collect();
        let normals: Vec<[f32; 3]> = self.normals.iter().map(|v| [v.x, v.y, v.z]).collect();

        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
        mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
        mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, self.uvs.clone());
        mesh.insert_attribute(Mesh::ATTRIBUTE_COLOR, self.colors.clone());
        mesh.set_indices(Some(Indices::U32(self.indices.clone())));

        mesh
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CubeFace {
    Top,
    Bottom,
    North,
    South,
    East,
    West,
}

impl CubeFace {
    pub const ALL: [CubeFace; FACES_PER_CUBE] = [
        CubeFace::North,
        CubeFace::East,
        CubeFace::South,
        CubeFace::West,
        CubeFace::Top,
        CubeFace::Bottom,
    ];

    pub fn normal(&self) -> Vec3 {
        match self {
            CubeFace::Top => Vec3::Y,
            CubeFace::Bottom => Vec3::NEG_Y,
            CubeFace::North => Vec3::NEG_Z,
            CubeFace::South => Vec3::Z,
            CubeFace::East => Vec3::X,
            CubeFace::West => Vec3::NEG_X,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_has_24_vertices_and_36_indices() {
        let mut builder = VoxelMeshBuilder::new();
        builder.add_cube(Vec3::new(2.0, 5.0, -1.0), || Color::WHITE);

        assert_eq!(builder.vertex_count(), VERTICES_PER_CUBE);
        assert_eq!(builder.uvs.len(), VERTICES_PER_CUBE);
        assert_eq!(builder.colors.len(), VERTICES_PER_CUBE);
        assert_eq!(builder.normals.len(), VERTICES_PER_CUBE);
        assert_eq!(builder.indices.len(), INDICES_PER_CUBE);
    }

    #[test]
    fn uvs_repeat_per_face() {
        let mut builder = VoxelMeshBuilder::new();
        builder.add_cube(Vec3::ZERO, || Color::WHITE);
        for face in builder.uvs.chunks(VERTICES_PER_FACE) {
            assert_eq!(face, &FACE_UVS[..]);
        }
    }

    #[test]
    fn vertices_stay_inside_unit_cube() {
        let origin = Vec3::new(-4.0, 10.0, 7.0);
        let mut builder = VoxelMeshBuilder::new();
        builder.add_cube(origin, || Color::WHITE);
        for p in &builder.positions {
            let local = *p - origin;
            assert!(local.cmpge(Vec3::ZERO).all() && local.cmple(Vec3::ONE).all(), "{p:?}");
        }
    }

    #[test]
    fn faces_wind_outward() {
        let mut builder = VoxelMeshBuilder::new();
        builder.add_cube(Vec3::ZERO, || Color::WHITE);
        for tri in builder.indices.chunks(3) {
            let a = builder.positions[tri[0] as usize];
            let b = builder.positions[tri[1] as usize];
            let c = builder.positions[tri[2] as usize];
            let normal = builder.normals[tri[0] as usize];
            assert!((b - a).cross(c - a).dot(normal) > 0.0, "triangle {tri:?} faces inward");
        }
    }

    #[test]
    fn second_cube_offsets_indices() {
        let mut builder = VoxelMeshBuilder::new();
        builder.add_cube(Vec3::ZERO, || Color::WHITE);
        builder.add_cube(Vec3::X, || Color::WHITE);
        let min_second = builder.indices[INDICES_PER_CUBE..].iter().min().copied();
        assert_eq!(min_second, Some(VERTICES_PER_CUBE as u32));
    }
}
