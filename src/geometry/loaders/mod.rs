/// 模型加载器模块
///
/// 提供统一的模型加载接口。加载结果是 CPU 侧的 `MeshGeometry3D`，
/// 其中的三角形可以直接作为 3 控制点补丁使用。
///
/// # 支持的格式
///
/// - **OBJ**: Wavefront OBJ 格式（使用 tobj crate）
///
/// # 使用示例
///
/// ```rust,no_run
/// use patch_render::geometry::loaders::load_mesh;
///
/// let mesh = load_mesh("model.obj")?;
/// println!("顶点数: {}", mesh.vertex_count());
/// # Ok::<(), patch_render::core::PatchRenderError>(())
/// ```
use crate::core::error::{GeometryError, Result};
use crate::geometry::mesh::MeshGeometry3D;
use std::path::Path;

pub mod obj_loader;

pub use obj_loader::ObjLoader;

/// 网格加载器 trait
///
/// 加载器是无状态的，只返回 CPU 侧数据，不涉及 GPU 资源。
pub trait MeshLoader {
    /// 从文件路径加载网格
    ///
    /// # 错误
    ///
    /// - 文件不存在或无法读取
    /// - 文件格式错误或损坏
    /// - 数据验证失败
    fn load_from_file(path: &Path) -> Result<MeshGeometry3D>;

    /// 从内存数据加载网格
    fn load_from_memory(data: &[u8]) -> Result<MeshGeometry3D>;

    /// 支持的文件扩展名（小写，不含点号）
    fn supported_extensions() -> &'static [&'static str];
}

/// 根据文件扩展名选择合适的加载器
pub fn load_mesh<P: AsRef<Path>>(path: P) -> Result<MeshGeometry3D> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .ok_or_else(|| {
            GeometryError::UnsupportedFormat(format!(
                "cannot determine the format of {}",
                path.display()
            ))
        })?;

    if ObjLoader::supported_extensions().contains(&extension.as_str()) {
        ObjLoader::load_from_file(path)
    } else {
        Err(GeometryError::UnsupportedFormat(format!(".{}", extension)).into())
    }
}
