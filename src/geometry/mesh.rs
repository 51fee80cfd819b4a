/// 几何数据结构模块
///
/// 定义场景图节点引用的 CPU 侧几何数据。几何体由场景拥有，
/// 渲染组件只持有共享引用，并从中派生 GPU 侧的副本。

use crate::core::error::{GeometryError, Result};
use crate::core::math::{Color, Vector2, Vector3};

use super::math_utils::{compute_tangent_space, reconstruct_normals};

/// 几何体种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryKind {
    Mesh,
    Line,
    Point,
}

impl GeometryKind {
    /// 种类名称，用于日志和错误信息
    pub fn name(&self) -> &'static str {
        match self {
            GeometryKind::Mesh => "mesh",
            GeometryKind::Line => "line",
            GeometryKind::Point => "point",
        }
    }
}

/// 三角网格 / 补丁控制网格
///
/// `positions` 决定顶点数，其余顶点属性都是可选的；
/// 存在时长度必须不小于顶点数。
///
/// # 示例
///
/// ```rust
/// use patch_render::geometry::MeshGeometry3D;
/// use patch_render::core::math::Vector3;
///
/// let mut mesh = MeshGeometry3D::with_name("Triangle");
/// mesh.positions = vec![
///     Vector3::new(0.0, 0.0, 0.0),
///     Vector3::new(1.0, 0.0, 0.0),
///     Vector3::new(0.0, 1.0, 0.0),
/// ];
/// mesh.indices = vec![0, 1, 2];
/// assert!(mesh.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshGeometry3D {
    /// 顶点位置
    pub positions: Vec<Vector3>,

    /// 控制点索引，每个补丁 3 或 4 个
    pub indices: Vec<u32>,

    pub normals: Option<Vec<Vector3>>,
    pub texture_coordinates: Option<Vec<Vector2>>,
    pub colors: Option<Vec<Color>>,
    pub tangents: Option<Vec<Vector3>>,
    pub bitangents: Option<Vec<Vector3>>,

    /// 网格名称（可选）
    pub name: Option<String>,
}

impl MeshGeometry3D {
    /// 创建一个空的网格
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建一个指定名称的空网格
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// 获取顶点数量
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// 获取索引数量
    #[inline]
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// 没有位置或没有索引时视为空网格
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() || self.indices.is_empty()
    }

    /// 检查所有可选属性的长度，返回顶点数
    pub fn check_attribute_lengths(&self) -> Result<usize> {
        let expected = self.vertex_count();
        let lengths = [
            ("normals", self.normals.as_ref().map(Vec::len)),
            ("texture_coordinates", self.texture_coordinates.as_ref().map(Vec::len)),
            ("colors", self.colors.as_ref().map(Vec::len)),
            ("tangents", self.tangents.as_ref().map(Vec::len)),
            ("bitangents", self.bitangents.as_ref().map(Vec::len)),
        ];

        for (attribute, len) in lengths {
            if let Some(actual) = len {
                if actual < expected {
                    return Err(GeometryError::AttributeLengthMismatch {
                        attribute,
                        expected,
                        actual,
                    }
                    .into());
                }
            }
        }

        Ok(expected)
    }

    /// 验证网格数据的有效性
    ///
    /// 检查：
    /// - 所有索引都在顶点范围内
    /// - 可选属性数组不短于顶点数
    pub fn validate(&self) -> Result<()> {
        let vertex_count = self.check_attribute_lengths()?;

        if let Some((i, &index)) = self
            .indices
            .iter()
            .enumerate()
            .find(|(_, index)| **index as usize >= vertex_count)
        {
            return Err(GeometryError::InvalidGeometry(format!(
                "index {} at position {} out of range (vertex count {})",
                index, i, vertex_count
            ))
            .into());
        }

        Ok(())
    }

    /// 从三角形重建顶点法线
    ///
    /// 索引按三个一组解释，适用于三角形补丁。
    pub fn compute_normals(&mut self) {
        let mut normals = vec![Vector3::zeros(); self.vertex_count()];
        reconstruct_normals(&self.positions, &self.indices, &mut normals);
        self.normals = Some(normals);
    }

    /// 计算切线和副切线
    ///
    /// 需要法线和纹理坐标；缺少任一属性时不做任何修改并返回 `false`。
    pub fn compute_tangents(&mut self) -> bool {
        let (Some(normals), Some(texcoords)) = (&self.normals, &self.texture_coordinates) else {
            return false;
        };

        let count = self.vertex_count();
        let mut tangents = vec![Vector3::zeros(); count];
        let mut bitangents = vec![Vector3::zeros(); count];
        compute_tangent_space(
            &self.positions,
            normals,
            texcoords,
            &self.indices,
            &mut tangents,
            &mut bitangents,
        );
        self.tangents = Some(tangents);
        self.bitangents = Some(bitangents);
        true
    }
}

/// 线段几何体
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineGeometry3D {
    pub positions: Vec<Vector3>,
    pub indices: Vec<u32>,
    pub colors: Option<Vec<Color>>,
}

/// 点云几何体
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointGeometry3D {
    pub positions: Vec<Vector3>,
    pub indices: Vec<u32>,
    pub colors: Option<Vec<Color>>,
}

/// 场景节点可引用的几何体
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry3D {
    Mesh(MeshGeometry3D),
    Line(LineGeometry3D),
    Point(PointGeometry3D),
}

impl Geometry3D {
    pub fn kind(&self) -> GeometryKind {
        match self {
            Geometry3D::Mesh(_) => GeometryKind::Mesh,
            Geometry3D::Line(_) => GeometryKind::Line,
            Geometry3D::Point(_) => GeometryKind::Point,
        }
    }

    pub fn positions(&self) -> &[Vector3] {
        match self {
            Geometry3D::Mesh(g) => &g.positions,
            Geometry3D::Line(g) => &g.positions,
            Geometry3D::Point(g) => &g.positions,
        }
    }

    pub fn indices(&self) -> &[u32] {
        match self {
            Geometry3D::Mesh(g) => &g.indices,
            Geometry3D::Line(g) => &g.indices,
            Geometry3D::Point(g) => &g.indices,
        }
    }

    /// 没有位置或没有索引
    pub fn is_empty(&self) -> bool {
        self.positions().is_empty() || self.indices().is_empty()
    }

    pub fn as_mesh(&self) -> Option<&MeshGeometry3D> {
        match self {
            Geometry3D::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }
}

impl From<MeshGeometry3D> for Geometry3D {
    fn from(mesh: MeshGeometry3D) -> Self {
        Geometry3D::Mesh(mesh)
    }
}

impl From<LineGeometry3D> for Geometry3D {
    fn from(lines: LineGeometry3D) -> Self {
        Geometry3D::Line(lines)
    }
}

impl From<PointGeometry3D> for Geometry3D {
    fn from(points: PointGeometry3D) -> Self {
        Geometry3D::Point(points)
    }
}
