//! 场景配置模块
//!
//! 定义演示场景中模型的几何来源、变换和材质。
//!
//! # 场景文件格式 (scene.toml)
//!
//! ```toml
//! [model]
//! primitive = "grid"        # 或 "octahedron"，设置 path 时忽略
//! divisions = 4
//! # path = "assets/models/sphere.obj"
//!
//! [model.transform]
//! position = [0.0, 0.0, -2.0]
//! rotation = [30.0, 0.0, 0.0]
//!
//! [material]
//! diffuse = [0.8, 0.8, 0.8, 1.0]
//! shininess = 40.0
//! # diffuse_map = "assets/textures/bricks.png"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::component::{PhongMaterial, TextureData};
use crate::core::error::{ConfigError, PatchRenderError, Result};
use crate::core::math::{Color, Matrix4, Vector3};
use crate::geometry::{load_mesh, patch_grid, patch_octahedron, MeshGeometry3D, PatchKind};

/// 3D 变换数据
///
/// 包含位置、旋转和缩放信息。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// 位置 (x, y, z)
    #[serde(default = "default_position")]
    pub position: [f32; 3],

    /// 旋转（欧拉角，度数）(pitch, yaw, roll)
    #[serde(default = "default_rotation")]
    pub rotation: [f32; 3],

    /// 缩放 (x, y, z)
    #[serde(default = "default_scale")]
    pub scale: [f32; 3],
}

fn default_position() -> [f32; 3] { [0.0, 0.0, 0.0] }
fn default_rotation() -> [f32; 3] { [0.0, 0.0, 0.0] }
fn default_scale() -> [f32; 3] { [1.0, 1.0, 1.0] }

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: default_position(),
            rotation: default_rotation(),
            scale: default_scale(),
        }
    }
}

impl Transform {
    /// 创建模型矩阵
    ///
    /// 变换顺序：缩放 -> 旋转 -> 平移
    pub fn to_matrix(&self) -> Matrix4 {
        let [pitch, yaw, roll] = self.rotation.map(f32::to_radians);

        let translation = Matrix4::new_translation(&Vector3::from(self.position));
        let rotation = Matrix4::from_axis_angle(&Vector3::z_axis(), roll)
            * Matrix4::from_axis_angle(&Vector3::y_axis(), yaw)
            * Matrix4::from_axis_angle(&Vector3::x_axis(), pitch);
        let scale = Matrix4::new_nonuniform_scaling(&Vector3::from(self.scale));

        // 组合：T * R * S
        translation * rotation * scale
    }
}

/// 程序生成的补丁几何体
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    /// 细分平面，补丁类型跟随渲染技术
    #[default]
    Grid,
    /// 八面体，总是三角形补丁
    Octahedron,
}

/// 模型配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// 模型文件路径，未设置时使用程序生成的几何体
    #[serde(default)]
    pub path: Option<String>,

    #[serde(default)]
    pub primitive: PrimitiveKind,

    /// 平面每边的补丁数
    #[serde(default = "default_divisions")]
    pub divisions: u32,

    /// 模型变换
    #[serde(default)]
    pub transform: Transform,
}

fn default_divisions() -> u32 { 4 }

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: None,
            primitive: PrimitiveKind::default(),
            divisions: default_divisions(),
            transform: Transform::default(),
        }
    }
}

impl ModelConfig {
    /// 加载模型文件或生成几何体
    ///
    /// `kind` 决定平面生成三角形还是四边形补丁。
    pub fn load_geometry(&self, kind: PatchKind) -> Result<MeshGeometry3D> {
        match &self.path {
            Some(path) => load_mesh(path),
            None => Ok(match self.primitive {
                PrimitiveKind::Grid => patch_grid(self.divisions, kind),
                PrimitiveKind::Octahedron => patch_octahedron(),
            }),
        }
    }
}

/// 材质配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialConfig {
    pub name: String,
    pub diffuse: [f32; 4],
    pub ambient: [f32; 4],
    pub emissive: [f32; 4],
    pub specular: [f32; 4],
    pub reflective: [f32; 4],
    pub shininess: f32,
    pub diffuse_map: Option<String>,
    pub normal_map: Option<String>,
    pub displacement_map: Option<String>,
}

impl Default for MaterialConfig {
    fn default() -> Self {
        let material = PhongMaterial::default();
        Self {
            name: material.name,
            diffuse: material.diffuse_color.to_array(),
            ambient: material.ambient_color.to_array(),
            emissive: material.emissive_color.to_array(),
            specular: material.specular_color.to_array(),
            reflective: material.reflective_color.to_array(),
            shininess: material.specular_shininess,
            diffuse_map: None,
            normal_map: None,
            displacement_map: None,
        }
    }
}

impl MaterialConfig {
    /// 构建材质并加载贴图
    pub fn to_material(&self) -> Result<PhongMaterial> {
        let load = |path: &Option<String>| path.as_deref().map(TextureData::from_file).transpose();

        Ok(PhongMaterial {
            name: self.name.clone(),
            diffuse_color: Color::from(self.diffuse),
            ambient_color: Color::from(self.ambient),
            emissive_color: Color::from(self.emissive),
            specular_color: Color::from(self.specular),
            reflective_color: Color::from(self.reflective),
            specular_shininess: self.shininess,
            diffuse_map: load(&self.diffuse_map)?,
            normal_map: load(&self.normal_map)?,
            displacement_map: load(&self.displacement_map)?,
        })
    }
}

/// 场景配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    /// 模型配置
    #[serde(default)]
    pub model: ModelConfig,

    /// 材质配置，省略时模型不带材质
    #[serde(default)]
    pub material: Option<MaterialConfig>,
}

impl SceneConfig {
    /// 从文件加载场景配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| PatchRenderError::Config(ConfigError::FileNotFound(format!(
                "Failed to read scene config file '{}': {}",
                path.display(),
                e
            ))))?;

        toml::from_str(&contents)
            .map_err(|e| PatchRenderError::Config(ConfigError::ParseError(format!(
                "Failed to parse scene config: {}",
                e
            ))))
    }

    /// 从文件加载，如果文件不存在或无法解析则返回默认配置
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if path.exists() {
            match Self::from_file(path) {
                Ok(config) => {
                    tracing::info!("Loaded scene config from: {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to load scene config: {}, using defaults", e);
                    Self::default()
                }
            }
        } else {
            tracing::info!("Scene config not found, using defaults");
            Self::default()
        }
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let contents = toml::to_string_pretty(self)
            .map_err(|e| PatchRenderError::Config(ConfigError::ParseError(format!(
                "Failed to serialize scene config: {}",
                e
            ))))?;

        fs::write(path, contents)?;

        tracing::info!("Saved scene config to: {}", path.display());
        Ok(())
    }
}
