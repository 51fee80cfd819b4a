//! 错误处理模块
//!
//! 定义了渲染库中使用的统一错误类型。
//!
//! 错误分为两类：
//!
//! - **契约违规**：调用方的编程错误，例如为补丁模型提供了非网格几何体，
//!   或者在不支持补丁图元的技术下渲染。这类错误不可恢复，
//!   可以通过 [`PatchRenderError::is_contract_violation`] 识别。
//! - **普通错误**：配置文件缺失、资源创建失败、几何数据无效等。
//!
//! "没有东西可画"（几何体为空、不可见、禁用渲染）不是错误，
//! 相关调用直接返回 `Ok(())`。

use std::fmt;
use std::path::PathBuf;

/// 库统一的 Result 类型
pub type Result<T> = std::result::Result<T, PatchRenderError>;

/// 渲染库的错误类型
#[derive(Debug)]
pub enum PatchRenderError {
    /// 配置错误
    Config(ConfigError),

    /// 图形 API 错误
    Graphics(GraphicsError),

    /// 几何数据错误
    Geometry(GeometryError),

    /// IO 错误
    Io(std::io::Error),

    /// 初始化错误
    Initialization(String),
}

/// 配置相关的错误
#[derive(Debug)]
pub enum ConfigError {
    /// 配置文件未找到
    FileNotFound(String),

    /// 配置文件解析失败
    ParseError(String),

    /// 配置值无效
    InvalidValue { field: String, reason: String },
}

/// 图形 API 相关的错误
#[derive(Debug)]
pub enum GraphicsError {
    /// 资源创建失败
    ResourceCreation(String),

    /// 当前渲染技术不是补丁技术
    UnsupportedTechnique(String),

    /// 渲染时没有可用的着色器 pass
    MissingShaderPass { technique: String, pass: String },

    /// 效果变量不存在
    VariableNotFound(String),

    /// 在错误的生命周期状态下调用
    InvalidState(String),
}

/// 几何数据相关的错误
#[derive(Debug)]
pub enum GeometryError {
    /// 文件不存在
    FileNotFound(PathBuf),

    /// 不支持的文件格式
    UnsupportedFormat(String),

    /// 解析失败
    ParseError(String),

    /// 几何数据无效
    InvalidGeometry(String),

    /// 几何体类型与组件要求不符
    UnexpectedGeometryType {
        expected: &'static str,
        found: &'static str,
    },

    /// 可选属性数组短于顶点数
    AttributeLengthMismatch {
        attribute: &'static str,
        expected: usize,
        actual: usize,
    },
}

impl PatchRenderError {
    /// 是否为调用方的契约违规（不可恢复）
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            PatchRenderError::Graphics(GraphicsError::UnsupportedTechnique(_))
                | PatchRenderError::Geometry(GeometryError::UnexpectedGeometryType { .. })
        )
    }
}

impl fmt::Display for PatchRenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchRenderError::Config(e) => write!(f, "Configuration error: {}", e),
            PatchRenderError::Graphics(e) => write!(f, "Graphics error: {}", e),
            PatchRenderError::Geometry(e) => write!(f, "Geometry error: {}", e),
            PatchRenderError::Io(e) => write!(f, "IO error: {}", e),
            PatchRenderError::Initialization(msg) => write!(f, "Initialization error: {}", msg),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {}", path),
            ConfigError::ParseError(msg) => write!(f, "Failed to parse config: {}", msg),
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "Invalid value for '{}': {}", field, reason)
            }
        }
    }
}

impl fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphicsError::ResourceCreation(msg) => write!(f, "Resource creation failed: {}", msg),
            GraphicsError::UnsupportedTechnique(name) => {
                write!(f, "Technique '{}' not supported by patch models", name)
            }
            GraphicsError::MissingShaderPass { technique, pass } => {
                write!(f, "Pass '{}' not available in technique '{}'", pass, technique)
            }
            GraphicsError::VariableNotFound(name) => write!(f, "Effect variable not found: {}", name),
            GraphicsError::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
        }
    }
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryError::FileNotFound(path) => write!(f, "Mesh file not found: {}", path.display()),
            GeometryError::UnsupportedFormat(msg) => write!(f, "Unsupported mesh format: {}", msg),
            GeometryError::ParseError(msg) => write!(f, "Failed to parse mesh: {}", msg),
            GeometryError::InvalidGeometry(msg) => write!(f, "Invalid geometry data: {}", msg),
            GeometryError::UnexpectedGeometryType { expected, found } => {
                write!(f, "Expected {} geometry, found {}", expected, found)
            }
            GeometryError::AttributeLengthMismatch { attribute, expected, actual } => write!(
                f,
                "Attribute '{}' has {} elements, expected at least {}",
                attribute, actual, expected
            ),
        }
    }
}

impl std::error::Error for PatchRenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PatchRenderError::Io(e) => Some(e),
            PatchRenderError::Config(e) => Some(e),
            PatchRenderError::Graphics(e) => Some(e),
            PatchRenderError::Geometry(e) => Some(e),
            PatchRenderError::Initialization(_) => None,
        }
    }
}

impl std::error::Error for ConfigError {}
impl std::error::Error for GraphicsError {}
impl std::error::Error for GeometryError {}

impl From<std::io::Error> for PatchRenderError {
    fn from(err: std::io::Error) -> Self {
        PatchRenderError::Io(err)
    }
}

impl From<ConfigError> for PatchRenderError {
    fn from(err: ConfigError) -> Self {
        PatchRenderError::Config(err)
    }
}

impl From<GraphicsError> for PatchRenderError {
    fn from(err: GraphicsError) -> Self {
        PatchRenderError::Graphics(err)
    }
}

impl From<GeometryError> for PatchRenderError {
    fn from(err: GeometryError) -> Self {
        PatchRenderError::Geometry(err)
    }
}
