//! 配置管理模块
//!
//! 提供渲染配置的加载、解析和管理功能。
//! 支持从 TOML 配置文件加载，也支持命令行参数覆盖。
//!
//! # 配置文件格式 (config.toml)
//!
//! ```toml
//! [graphics]
//! technique = "pntriangles"   # 或 "pnquads"
//! frames = 3
//!
//! [patch]
//! shading = "Solid"           # Solid, Wires, Positions, Normals, TexCoords, Tangents, Colors
//! tessellation_factor = 4.0
//! reuse_vertex_array_buffer = true
//!
//! [logging]
//! level = "info"              # trace, debug, info, warn, error
//! file_output = false
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

use super::error::{ConfigError, Result};
use crate::component::Visibility;
use crate::renderer::{RenderTechnique, ShadingMode};

/// 细分因子允许的范围（与硬件细分器一致）
pub const TESSELLATION_FACTOR_RANGE: std::ops::RangeInclusive<f32> = 1.0..=64.0;

/// 应用配置
///
/// 所有分区都可以省略，缺失的字段使用默认值。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// 图形配置
    #[serde(default)]
    pub graphics: GraphicsConfig,

    /// 补丁模型配置
    #[serde(default)]
    pub patch: PatchConfig,

    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 图形配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphicsConfig {
    /// 宿主激活的渲染技术
    #[serde(default = "default_technique")]
    pub technique: RenderTechnique,

    /// 演示程序渲染的帧数
    #[serde(default = "default_frames")]
    pub frames: u32,
}

/// 补丁模型的可调参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatchConfig {
    /// 着色 pass 名称
    pub shading: ShadingMode,

    /// 细分因子，写入 `vTessellation.x`
    pub tessellation_factor: f32,

    /// 重建顶点时是否复用暂存数组
    pub reuse_vertex_array_buffer: bool,

    /// 纹理坐标缩放
    pub texture_coordinate_scale: f32,

    pub is_rendering: bool,
    pub visibility: Visibility,

    /// 是否参与阴影 pass
    pub is_throwing_shadow: bool,

    pub render_diffuse_map: bool,
    pub render_normal_map: bool,
    pub render_displacement_map: bool,
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// 是否输出到文件
    #[serde(default = "default_file_output")]
    pub file_output: bool,

    /// 日志文件路径
    #[serde(default = "default_log_file")]
    pub log_file: String,
}

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

// 默认值函数
fn default_technique() -> RenderTechnique { RenderTechnique::PnTriangles }
fn default_frames() -> u32 { 3 }
fn default_log_level() -> LogLevel { LogLevel::Info }
fn default_file_output() -> bool { false }
fn default_log_file() -> String { "patch_render.log".to_string() }

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            technique: default_technique(),
            frames: default_frames(),
        }
    }
}

impl Default for PatchConfig {
    fn default() -> Self {
        Self {
            shading: ShadingMode::Solid,
            tessellation_factor: 1.0,
            reuse_vertex_array_buffer: false,
            texture_coordinate_scale: 1.0,
            is_rendering: true,
            visibility: Visibility::Visible,
            is_throwing_shadow: false,
            render_diffuse_map: true,
            render_normal_map: true,
            render_displacement_map: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_output: default_file_output(),
            log_file: default_log_file(),
        }
    }
}

impl PatchConfig {
    /// 检查数值参数
    pub fn validate(&self) -> Result<()> {
        if !TESSELLATION_FACTOR_RANGE.contains(&self.tessellation_factor) {
            return Err(ConfigError::InvalidValue {
                field: "patch.tessellation_factor".to_string(),
                reason: format!(
                    "{} is outside {:?}",
                    self.tessellation_factor, TESSELLATION_FACTOR_RANGE
                ),
            }
            .into());
        }

        if !self.texture_coordinate_scale.is_finite() {
            return Err(ConfigError::InvalidValue {
                field: "patch.texture_coordinate_scale".to_string(),
                reason: "Texture coordinate scale must be finite".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

impl Config {
    /// 从配置文件加载
    ///
    /// # 示例
    ///
    /// ```no_run
    /// use patch_render::core::Config;
    ///
    /// let config = Config::from_file("config.toml")?;
    /// # Ok::<(), patch_render::core::PatchRenderError>(())
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let contents = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound(path_str.clone()))?;

        toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()).into())
    }

    /// 从配置文件加载，如果文件不存在则使用默认配置
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Self {
        Self::from_file(path).unwrap_or_default()
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, contents)?;
        Ok(())
    }

    /// 从命令行参数覆盖配置
    ///
    /// 支持的参数：
    /// - `--technique <name>`: 渲染技术（`pntriangles`、`RenderPNQuads` 等）
    /// - `--quads`: 等同于 `--technique pnquads`
    /// - `--shading <name>`: 着色 pass
    /// - `--tess <factor>`: 细分因子
    /// - `--frames <n>`: 渲染帧数
    ///
    /// 无法解析的值会被忽略并记录警告。
    pub fn apply_args<I>(&mut self, args: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();
        let value_of = |flag: &str| {
            args.iter()
                .position(|a| a == flag)
                .and_then(|idx| args.get(idx + 1))
                .map(String::as_str)
        };

        if args.iter().any(|a| a == "--quads") {
            self.graphics.technique = RenderTechnique::PnQuads;
        }

        if let Some(name) = value_of("--technique") {
            match name.parse() {
                Ok(technique) => self.graphics.technique = technique,
                Err(e) => warn!("Ignoring --technique: {}", e),
            }
        }

        if let Some(name) = value_of("--shading") {
            match ShadingMode::from_pass_name(name) {
                Some(mode) => self.patch.shading = mode,
                None => warn!("Ignoring unknown shading '{}'", name),
            }
        }

        if let Some(value) = value_of("--tess") {
            match value.parse() {
                Ok(factor) => self.patch.tessellation_factor = factor,
                Err(_) => warn!("Ignoring --tess: '{}' is not a number", value),
            }
        }

        if let Some(value) = value_of("--frames") {
            match value.parse() {
                Ok(frames) => self.graphics.frames = frames,
                Err(_) => warn!("Ignoring --frames: '{}' is not a count", value),
            }
        }
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        if self.graphics.frames == 0 {
            return Err(ConfigError::InvalidValue {
                field: "graphics.frames".to_string(),
                reason: "At least one frame must be rendered".to_string(),
            }
            .into());
        }

        self.patch.validate()
    }
}
