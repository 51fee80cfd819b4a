//! 核心功能模块
//!
//! 本模块提供了渲染库的基础功能，包括数学类型、日志系统、配置管理和错误处理。
//! 这些模块独立于具体的图形 API。
//!
//! # 模块组织
//!
//! - `math`：基于 nalgebra 的向量、矩阵类型，以及颜色和射线
//! - `log`：日志系统初始化
//! - `config`：应用配置和补丁模型参数
//! - `scene`：演示场景（模型和材质）配置
//! - `error`：错误处理，定义统一的错误类型

pub mod math;
pub mod log;
pub mod config;
pub mod scene;
pub mod error;

// 重新导出常用类型，方便使用
pub use math::{Color, Matrix4, Ray, Vector2, Vector3, Vector4};
pub use error::{PatchRenderError, Result};
pub use config::{Config, PatchConfig};
pub use scene::SceneConfig;
