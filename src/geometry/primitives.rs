/// 程序生成的补丁控制网格
///
/// 生成的网格带有法线、纹理坐标、切线和副切线，可以直接交给补丁模型渲染。

use super::mesh::MeshGeometry3D;
use crate::core::math::{Vector2, Vector3};
use crate::renderer::RenderTechnique;

/// 补丁类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchKind {
    /// 3 控制点补丁
    Triangles,
    /// 4 控制点补丁
    Quads,
}

impl PatchKind {
    pub fn control_points(&self) -> usize {
        match self {
            PatchKind::Triangles => 3,
            PatchKind::Quads => 4,
        }
    }

    /// 渲染技术所需的补丁类型，非补丁技术返回 `None`
    pub fn for_technique(technique: RenderTechnique) -> Option<Self> {
        match technique {
            RenderTechnique::PnTriangles => Some(PatchKind::Triangles),
            RenderTechnique::PnQuads => Some(PatchKind::Quads),
            _ => None,
        }
    }
}

/// 生成 XY 平面上 [-1, 1] 范围内的补丁网格
///
/// 平面朝 +Z，每边 `divisions` 个单元（至少为 1）。
/// 四边形补丁的控制点按逆时针排列；三角形补丁把每个单元拆成两个。
pub fn patch_grid(divisions: u32, kind: PatchKind) -> MeshGeometry3D {
    let divisions = divisions.max(1);
    let side = divisions + 1;
    let step = 2.0 / divisions as f32;

    let mut mesh = MeshGeometry3D::with_name(match kind {
        PatchKind::Triangles => "TriangleGrid",
        PatchKind::Quads => "QuadGrid",
    });

    let mut texcoords = Vec::with_capacity((side * side) as usize);
    for y in 0..side {
        for x in 0..side {
            mesh.positions
                .push(Vector3::new(-1.0 + x as f32 * step, -1.0 + y as f32 * step, 0.0));
            texcoords.push(Vector2::new(
                x as f32 / divisions as f32,
                1.0 - y as f32 / divisions as f32,
            ));
        }
    }

    let index = |x: u32, y: u32| y * side + x;
    for y in 0..divisions {
        for x in 0..divisions {
            let (i00, i10, i11, i01) = (index(x, y), index(x + 1, y), index(x + 1, y + 1), index(x, y + 1));
            match kind {
                PatchKind::Quads => mesh.indices.extend_from_slice(&[i00, i10, i11, i01]),
                PatchKind::Triangles => {
                    mesh.indices.extend_from_slice(&[i00, i10, i11, i00, i11, i01])
                }
            }
        }
    }

    mesh.normals = Some(vec![Vector3::z(); mesh.positions.len()]);
    mesh.texture_coordinates = Some(texcoords);
    mesh.compute_tangents();
    mesh
}

/// 生成单位八面体的三角形补丁
///
/// 顶点在各面之间共享，法线取顶点方向，细分后接近球面。
pub fn patch_octahedron() -> MeshGeometry3D {
    let mut mesh = MeshGeometry3D::with_name("Octahedron");
    mesh.positions = vec![
        Vector3::x(),
        -Vector3::x(),
        Vector3::y(),
        -Vector3::y(),
        Vector3::z(),
        -Vector3::z(),
    ];
    mesh.indices = vec![
        4, 0, 2, //
        4, 2, 1, //
        4, 1, 3, //
        4, 3, 0, //
        5, 2, 0, //
        5, 1, 2, //
        5, 3, 1, //
        5, 0, 3,
    ];

    // 球面映射
    let texcoords = mesh
        .positions
        .iter()
        .map(|p| {
            Vector2::new(
                0.5 + p.z.atan2(p.x) / (2.0 * std::f32::consts::PI),
                0.5 - p.y.asin() / std::f32::consts::PI,
            )
        })
        .collect();

    mesh.normals = Some(mesh.positions.clone());
    mesh.texture_coordinates = Some(texcoords);
    mesh.compute_tangents();
    mesh
}
