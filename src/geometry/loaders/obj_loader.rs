/// OBJ 文件加载器
///
/// 使用 tobj crate 加载 Wavefront OBJ 格式的3D模型。
/// 支持顶点位置、法线、纹理坐标和顶点颜色，并可自动重建缺失的法线和切线。
use super::MeshLoader;
use crate::core::error::{GeometryError, Result};
use crate::core::math::{Color, Vector2, Vector3};
use crate::geometry::mesh::MeshGeometry3D;
use std::io::BufReader;
use std::path::Path;

/// OBJ 格式加载器
///
/// # 特性
///
/// - 自动三角化，结果可直接作为三角形补丁渲染
/// - 多个对象合并为一个网格
/// - UV 坐标翻转（V轴：1.0 - v）
/// - 自动重建缺失的法线
/// - 有 UV 时计算切线和副切线
pub struct ObjLoader;

fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        triangulate: true,  // 自动三角化
        single_index: true, // 使用单一索引
        ..Default::default()
    }
}

/// 把 tobj 的模型合并为一个网格
fn build_mesh(name: &str, models: &[tobj::Model]) -> Result<MeshGeometry3D> {
    if models.is_empty() {
        return Err(GeometryError::InvalidGeometry("OBJ file contains no models".to_string()).into());
    }

    let mut mesh = MeshGeometry3D::with_name(name);
    let mut normals = Vec::new();
    let mut texcoords = Vec::new();
    let mut colors = Vec::new();
    let (mut has_normals, mut has_texcoords, mut has_colors) = (true, true, true);

    for model in models {
        let source = &model.mesh;
        if source.positions.len() % 3 != 0 {
            return Err(GeometryError::InvalidGeometry(format!(
                "incomplete position data: {} floats",
                source.positions.len()
            ))
            .into());
        }

        let vertex_start = mesh.positions.len() as u32;
        let vertex_count = source.positions.len() / 3;

        mesh.positions
            .extend(source.positions.chunks_exact(3).map(|p| Vector3::new(p[0], p[1], p[2])));
        mesh.indices.extend(source.indices.iter().map(|&i| vertex_start + i));

        // 任一对象缺少某个属性时整个网格都不带该属性
        has_normals &= source.normals.len() >= vertex_count * 3;
        has_texcoords &= source.texcoords.len() >= vertex_count * 2;
        has_colors &= source.vertex_color.len() >= vertex_count * 3;

        if has_normals {
            normals.extend(
                source.normals.chunks_exact(3).take(vertex_count).map(|n| Vector3::new(n[0], n[1], n[2])),
            );
        }
        if has_texcoords {
            texcoords.extend(
                source.texcoords.chunks_exact(2).take(vertex_count).map(|t| Vector2::new(t[0], 1.0 - t[1])), // 翻转V坐标
            );
        }
        if has_colors {
            colors.extend(
                source.vertex_color.chunks_exact(3).take(vertex_count).map(|c| Color::rgb(c[0], c[1], c[2])),
            );
        }
    }

    if has_texcoords {
        mesh.texture_coordinates = Some(texcoords);
    }
    if has_colors {
        mesh.colors = Some(colors);
    }

    // 后处理：重建法线（如果缺失）
    if has_normals {
        mesh.normals = Some(normals);
    } else {
        tracing::info!("{}: OBJ file has no normals, reconstructing", name);
        mesh.compute_normals();
    }

    // 后处理：计算切线空间（如果有UV坐标）
    if !mesh.compute_tangents() {
        tracing::warn!("{}: OBJ file has no texture coordinates, skipping tangent space", name);
    }

    mesh.validate()?;

    tracing::info!(
        "Loaded OBJ mesh {}: {} vertices, {} triangles",
        name,
        mesh.vertex_count(),
        mesh.index_count() / 3
    );

    Ok(mesh)
}

impl MeshLoader for ObjLoader {
    fn load_from_file(path: &Path) -> Result<MeshGeometry3D> {
        if !path.exists() {
            return Err(GeometryError::FileNotFound(path.to_path_buf()).into());
        }

        let (models, _materials) = tobj::load_obj(path, &load_options())
            .map_err(|e| GeometryError::ParseError(format!("{}: {}", path.display(), e)))?;

        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Unnamed");
        build_mesh(name, &models)
    }

    fn load_from_memory(data: &[u8]) -> Result<MeshGeometry3D> {
        let mut reader = BufReader::new(data);
        // 内存中的 OBJ 不解析外部 .mtl 文件
        let (models, _materials) =
            tobj::load_obj_buf(&mut reader, &load_options(), |_| Ok(Default::default()))
                .map_err(|e| GeometryError::ParseError(e.to_string()))?;

        build_mesh("Memory", &models)
    }

    fn supported_extensions() -> &'static [&'static str] {
        &["obj"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::PatchRenderError;

    const QUAD_OBJ: &str = "\
o Quad
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 1.0 1.0 0.0
v 0.0 1.0 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 1.0 1.0
vt 0.0 1.0
f 1/1 2/2 3/3 4/4
";

    #[test]
    fn test_supported_extensions() {
        let exts = ObjLoader::supported_extensions();
        assert_eq!(exts, &["obj"]);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ObjLoader::load_from_file(Path::new("nonexistent.obj"));
        assert!(matches!(
            result,
            Err(PatchRenderError::Geometry(GeometryError::FileNotFound(_)))
        ));
    }

    #[test]
    fn test_load_from_memory() {
        let mesh = ObjLoader::load_from_memory(QUAD_OBJ.as_bytes()).unwrap();

        assert_eq!(mesh.vertex_count(), 4);
        // 四边形面被三角化
        assert_eq!(mesh.index_count(), 6);
        assert!(mesh.validate().is_ok());

        // 没有法线时按三角形重建，平面朝 +Z
        let normals = mesh.normals.as_ref().unwrap();
        assert!(normals.iter().all(|n| (n - Vector3::z()).norm() < 1e-5));

        // V 坐标被翻转
        let texcoords = mesh.texture_coordinates.as_ref().unwrap();
        assert!(texcoords.contains(&Vector2::new(0.0, 1.0)));
        assert!(mesh.tangents.is_some());
        assert!(mesh.bitangents.is_some());
        assert!(mesh.colors.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join("patch_render_loader_test.obj");
        std::fs::write(&path, QUAD_OBJ).unwrap();

        let mesh = ObjLoader::load_from_file(&path).unwrap();
        assert_eq!(mesh.name.as_deref(), Some("patch_render_loader_test"));
        assert_eq!(mesh.vertex_count(), 4);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_load_empty_obj() {
        assert!(ObjLoader::load_from_memory(b"# nothing here\n").is_err());
    }
}
