/// 几何体模块
///
/// CPU 侧的几何数据，以及把它们变成 GPU 顶点数据的工具。
///
/// # 模块结构
///
/// - `vertex`: 上传到顶点缓冲区的 `DefaultVertex` 和输入布局
/// - `mesh`: 网格、线段、点云几何体
/// - `staging`: 把网格属性交错写入顶点数组，支持复用
/// - `primitives`: 程序生成的补丁控制网格
/// - `math_utils`: 法线重建、切线空间计算
/// - `loaders`: 各种格式的模型加载器
///
/// # 数据流
///
/// ```text
/// 文件 (OBJ) / primitives
///     ↓
/// MeshGeometry3D (CPU侧数据)
///     ↓
/// VertexStaging (DefaultVertex 数组)
///     ↓
/// PatchModel (上传到GPU)
/// ```

pub mod vertex;
pub mod mesh;
pub mod staging;
pub mod primitives;
pub mod math_utils;
pub mod loaders;

// 重新导出常用类型
pub use vertex::{DefaultVertex, DEFAULT_VERTEX_COLOR, DEFAULT_VERTEX_LAYOUT};
pub use mesh::{Geometry3D, GeometryKind, LineGeometry3D, MeshGeometry3D, PointGeometry3D};
pub use staging::{stage_vertices, VertexStaging};
pub use primitives::{patch_grid, patch_octahedron, PatchKind};
pub use loaders::{load_mesh, MeshLoader, ObjLoader};
