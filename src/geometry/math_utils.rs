//! 几何数学工具模块
//!
//! 网格后处理用到的函数：
//! - 法线重建（从三角形面计算顶点法线）
//! - 切线空间计算（切线 + 副切线，用于法线贴图和位移贴图）

use crate::core::math::{Vector2, Vector3};

/// 从三角形面重建顶点法线
///
/// 遍历所有三角形，将未归一化的面法线（面积加权）累加到三个顶点，
/// 最后归一化。越界的三角形会被跳过。
///
/// # 参数
///
/// - `positions`: 顶点位置
/// - `indices`: 索引数组（每3个索引定义一个三角形）
/// - `normals`: 输出法线，长度与 `positions` 相同
pub fn reconstruct_normals(positions: &[Vector3], indices: &[u32], normals: &mut [Vector3]) {
    for n in normals.iter_mut() {
        *n = Vector3::zeros();
    }

    for triangle in indices.chunks_exact(3) {
        let [i0, i1, i2] = [triangle[0] as usize, triangle[1] as usize, triangle[2] as usize];
        if i0 >= positions.len() || i1 >= positions.len() || i2 >= positions.len() {
            continue;
        }

        let edge1 = positions[i1] - positions[i0];
        let edge2 = positions[i2] - positions[i0];
        let face_normal = edge1.cross(&edge2);

        normals[i0] += face_normal;
        normals[i1] += face_normal;
        normals[i2] += face_normal;
    }

    for n in normals.iter_mut() {
        *n = normalize(*n);
    }
}

/// 计算顶点的切线和副切线
///
/// # 算法
///
/// 1. 对于每个三角形 (v0, v1, v2):
///    - 位置导数: dp1 = p1 - p0, dp2 = p2 - p0
///    - UV导数: duv1 = uv1 - uv0, duv2 = uv2 - uv0
///    - r = 1 / (duv1.x * duv2.y - duv1.y * duv2.x)
///    - tangent = (dp1 * duv2.y - dp2 * duv1.y) * r
///    - bitangent = (dp2 * duv1.x - dp1 * duv2.x) * r
///    - 累加到三个顶点
///
/// 2. 每个顶点做 Gram-Schmidt 正交化：
///    - tangent = normalize(tangent - n * dot(n, tangent))
///    - bitangent = normalize(bitangent - n * dot(n, bitangent))
///
/// UV 退化（行列式接近零）的三角形不参与累加。
pub fn compute_tangent_space(
    positions: &[Vector3],
    normals: &[Vector3],
    texcoords: &[Vector2],
    indices: &[u32],
    tangents: &mut [Vector3],
    bitangents: &mut [Vector3],
) {
    for t in tangents.iter_mut() {
        *t = Vector3::zeros();
    }
    for b in bitangents.iter_mut() {
        *b = Vector3::zeros();
    }

    let count = positions.len().min(texcoords.len());

    for triangle in indices.chunks_exact(3) {
        let [i0, i1, i2] = [triangle[0] as usize, triangle[1] as usize, triangle[2] as usize];
        if i0 >= count || i1 >= count || i2 >= count {
            continue;
        }

        let dp1 = positions[i1] - positions[i0];
        let dp2 = positions[i2] - positions[i0];
        let duv1 = texcoords[i1] - texcoords[i0];
        let duv2 = texcoords[i2] - texcoords[i0];

        let det = duv1.x * duv2.y - duv1.y * duv2.x;
        if det.abs() < 1e-6 {
            continue;
        }
        let r = 1.0 / det;

        let tangent = (dp1 * duv2.y - dp2 * duv1.y) * r;
        let bitangent = (dp2 * duv1.x - dp1 * duv2.x) * r;

        for i in [i0, i1, i2] {
            tangents[i] += tangent;
            bitangents[i] += bitangent;
        }
    }

    for (i, normal) in normals.iter().enumerate().take(tangents.len()) {
        tangents[i] = normalize(tangents[i] - normal * normal.dot(&tangents[i]));
        bitangents[i] = normalize(bitangents[i] - normal * normal.dot(&bitangents[i]));
    }
}

/// 归一化，长度为零时返回零向量
#[inline]
fn normalize(v: Vector3) -> Vector3 {
    let length = v.norm();
    if length < 1e-6 {
        Vector3::zeros()
    } else {
        v / length
    }
}
