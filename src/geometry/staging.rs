/// 顶点暂存缓冲区
///
/// 把网格的各个属性数组交错写入 `DefaultVertex` 数组，作为顶点缓冲区的上传源。
///
/// # 复用策略
///
/// - 关闭复用：每次构建都分配恰好为顶点数大小的新数组
/// - 开启复用：只有在没有旧数组或旧数组短于顶点数时才重新分配，
///   否则原地覆盖前 N 个元素（N 为顶点数），尾部的旧数据保留但不会被上传

use super::mesh::MeshGeometry3D;
use super::vertex::{DefaultVertex, DEFAULT_VERTEX_COLOR};
use crate::core::error::Result;

/// 从网格构建交错顶点数组
///
/// # 参数
///
/// - `mesh`: 源网格，顶点数由 `positions` 决定
/// - `texcoord_scale`: 纹理坐标的统一缩放系数
/// - `reuse`: 是否复用 `previous` 的存储
/// - `previous`: 上一次构建得到的数组
///
/// # 返回
///
/// 顶点数组和本次写入的顶点数。可选属性数组短于顶点数时返回
/// `GeometryError::AttributeLengthMismatch`，此时不读取任何越界元素。
pub fn stage_vertices(
    mesh: &MeshGeometry3D,
    texcoord_scale: f32,
    reuse: bool,
    previous: Option<Vec<DefaultVertex>>,
) -> Result<(Vec<DefaultVertex>, usize)> {
    let count = mesh.check_attribute_lengths()?;

    let mut buffer = match previous {
        Some(buffer) if reuse && buffer.len() >= count => buffer,
        _ => vec![DefaultVertex::default(); count],
    };

    let colors = mesh.colors.as_deref();
    let texcoords = mesh.texture_coordinates.as_deref();
    let normals = mesh.normals.as_deref();
    let tangents = mesh.tangents.as_deref();
    let bitangents = mesh.bitangents.as_deref();

    for (i, vertex) in buffer[..count].iter_mut().enumerate() {
        let p = mesh.positions[i];
        vertex.position = [p.x, p.y, p.z, 1.0];
        vertex.color = colors.map_or(DEFAULT_VERTEX_COLOR, |c| c[i].to_array());
        vertex.texcoord = texcoords.map_or([0.0, 0.0], |t| {
            let uv = t[i] * texcoord_scale;
            [uv.x, uv.y]
        });
        vertex.normal = normals.map_or([0.0; 3], |n| n[i].into());
        vertex.tangent = tangents.map_or([0.0; 3], |t| t[i].into());
        vertex.bitangent = bitangents.map_or([0.0; 3], |b| b[i].into());
    }

    Ok((buffer, count))
}

/// 组件持有的暂存缓冲区
///
/// 在多次重建之间保存数组，以便按复用策略重用其存储。
#[derive(Debug, Default)]
pub struct VertexStaging {
    buffer: Option<Vec<DefaultVertex>>,
    active: usize,
}

impl VertexStaging {
    pub fn new() -> Self {
        Self::default()
    }

    /// 重新构建，返回本次有效的顶点
    ///
    /// 失败时旧数组保持不变。
    pub fn build(
        &mut self,
        mesh: &MeshGeometry3D,
        texcoord_scale: f32,
        reuse: bool,
    ) -> Result<&[DefaultVertex]> {
        mesh.check_attribute_lengths()?;

        let (buffer, count) = stage_vertices(mesh, texcoord_scale, reuse, self.buffer.take())?;
        self.active = count;
        let buffer = self.buffer.insert(buffer);
        Ok(&buffer[..count])
    }

    /// 丢弃已有的数组
    pub fn discard(&mut self) {
        self.buffer = None;
        self.active = 0;
    }

    /// 最近一次构建写入的顶点
    pub fn vertices(&self) -> &[DefaultVertex] {
        self.buffer.as_deref().map_or(&[], |b| &b[..self.active])
    }

    /// 有效顶点数
    pub fn active_count(&self) -> usize {
        self.active
    }

    /// 底层存储的元素数（可能大于有效顶点数）
    pub fn capacity(&self) -> usize {
        self.buffer.as_ref().map_or(0, Vec::len)
    }

    pub fn is_allocated(&self) -> bool {
        self.buffer.is_some()
    }

    /// 底层存储的地址，用于判断两次构建是否共用同一数组
    pub fn storage_ptr(&self) -> Option<*const DefaultVertex> {
        self.buffer.as_ref().map(|b| b.as_ptr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{GeometryError, PatchRenderError};
    use crate::core::math::{Color, Vector2, Vector3};

    fn quad(n: usize) -> MeshGeometry3D {
        let mut mesh = MeshGeometry3D::new();
        mesh.positions = (0..n).map(|i| Vector3::new(i as f32, 0.0, 0.0)).collect();
        mesh.indices = (0..n as u32).collect();
        mesh
    }

    #[test]
    fn test_default_fallbacks() {
        let (vertices, count) = stage_vertices(&quad(4), 1.0, false, None).unwrap();

        assert_eq!(count, 4);
        assert_eq!(vertices.len(), 4);
        for (i, v) in vertices.iter().enumerate() {
            assert_eq!(v.position, [i as f32, 0.0, 0.0, 1.0]);
            assert_eq!(v.color, [1.0, 0.0, 0.0, 1.0]);
            assert_eq!(v.texcoord, [0.0, 0.0]);
            assert_eq!(v.normal, [0.0; 3]);
            assert_eq!(v.tangent, [0.0; 3]);
            assert_eq!(v.bitangent, [0.0; 3]);
        }
    }

    #[test]
    fn test_attributes_copied_and_scaled() {
        let mut mesh = quad(2);
        mesh.colors = Some(vec![Color::GREEN, Color::BLUE]);
        mesh.texture_coordinates = Some(vec![Vector2::new(0.5, 0.25), Vector2::new(1.0, 2.0)]);
        mesh.normals = Some(vec![Vector3::y(); 2]);
        mesh.tangents = Some(vec![Vector3::x(); 2]);
        mesh.bitangents = Some(vec![Vector3::z(); 2]);

        let (vertices, _) = stage_vertices(&mesh, 2.0, false, None).unwrap();

        assert_eq!(vertices[0].color, [0.0, 1.0, 0.0, 1.0]);
        assert_eq!(vertices[1].color, [0.0, 0.0, 1.0, 1.0]);
        assert_eq!(vertices[0].texcoord, [1.0, 0.5]);
        assert_eq!(vertices[1].texcoord, [2.0, 4.0]);
        assert_eq!(vertices[1].normal, [0.0, 1.0, 0.0]);
        assert_eq!(vertices[1].tangent, [1.0, 0.0, 0.0]);
        assert_eq!(vertices[1].bitangent, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_short_attribute_rejected() {
        let mut mesh = quad(3);
        mesh.texture_coordinates = Some(vec![Vector2::zeros(); 1]);

        let result = stage_vertices(&mesh, 1.0, false, None);
        assert!(matches!(
            result,
            Err(PatchRenderError::Geometry(GeometryError::AttributeLengthMismatch {
                attribute: "texture_coordinates",
                ..
            }))
        ));
    }

    #[test]
    fn test_build_is_idempotent() {
        let mut mesh = quad(5);
        mesh.normals = Some(vec![Vector3::y(); 5]);

        let mut staging = VertexStaging::new();
        let first = staging.build(&mesh, 1.0, true).unwrap().to_vec();
        let second = staging.build(&mesh, 1.0, true).unwrap().to_vec();
        assert_eq!(first, second);

        let mut fresh = VertexStaging::new();
        let third = fresh.build(&mesh, 1.0, false).unwrap().to_vec();
        assert_eq!(first, third);
    }

    #[test]
    fn test_reuse_keeps_storage() {
        let mut staging = VertexStaging::new();
        staging.build(&quad(4), 1.0, true).unwrap();
        let ptr = staging.storage_ptr();

        // 顶点数不超过已有容量时复用
        staging.build(&quad(4), 1.0, true).unwrap();
        assert_eq!(staging.storage_ptr(), ptr);
        staging.build(&quad(2), 1.0, true).unwrap();
        assert_eq!(staging.storage_ptr(), ptr);
        assert_eq!(staging.active_count(), 2);
        assert_eq!(staging.capacity(), 4);
        assert_eq!(staging.vertices().len(), 2);

        // 超出容量时重新分配
        staging.build(&quad(8), 1.0, true).unwrap();
        assert_eq!(staging.capacity(), 8);
        assert_eq!(staging.active_count(), 8);
    }

    #[test]
    fn test_no_reuse_allocates_exact() {
        let mut staging = VertexStaging::new();
        staging.build(&quad(6), 1.0, false).unwrap();
        assert_eq!(staging.capacity(), 6);

        // 关闭复用时即使顶点数变少也按顶点数重新分配
        staging.build(&quad(3), 1.0, false).unwrap();
        assert_eq!(staging.capacity(), 3);
        assert_eq!(staging.active_count(), 3);
    }

    #[test]
    fn test_no_reuse_same_size_allocates_new() {
        let mut staging = VertexStaging::new();
        staging.build(&quad(4), 1.0, false).unwrap();
        let ptr = staging.storage_ptr();

        // 旧数组在新数组分配之后才释放，地址必然不同
        staging.build(&quad(4), 1.0, false).unwrap();
        assert_ne!(staging.storage_ptr(), ptr);
        assert_eq!(staging.capacity(), 4);
    }

    #[test]
    fn test_failed_build_keeps_previous() {
        let mut staging = VertexStaging::new();
        staging.build(&quad(4), 1.0, true).unwrap();
        let ptr = staging.storage_ptr();

        let mut bad = quad(4);
        bad.colors = Some(vec![Color::WHITE]);
        assert!(staging.build(&bad, 1.0, true).is_err());
        assert_eq!(staging.storage_ptr(), ptr);
        assert_eq!(staging.active_count(), 4);
    }

    #[test]
    fn test_discard() {
        let mut staging = VertexStaging::new();
        staging.build(&quad(4), 1.0, true).unwrap();
        staging.discard();
        assert!(!staging.is_allocated());
        assert!(staging.vertices().is_empty());
    }
}
