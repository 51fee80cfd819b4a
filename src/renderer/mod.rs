//! 渲染器模块
//!
//! 本模块定义渲染组件与底层图形 API 之间的接口，
//! 组件只通过这些 trait 访问设备，而不需要关心具体使用的是哪个图形 API。
//!
//! # 架构设计
//!
//! - `device`：设备与立即上下文（资源创建、管线状态、绘制）
//! - `effect`：渲染技术、着色 pass 与效果变量
//! - `host`：挂载组件时提供的渲染宿主
//! - `resource`：缓冲区/纹理描述符和 RAII 句柄
//! - `headless`：记录命令的无窗口后端，用于演示和测试

pub mod device;
pub mod effect;
pub mod headless;
pub mod host;
pub mod resource;

pub use device::{
    BufferId, DeviceContext, IndexFormat, InputLayoutId, PrimitiveTopology, RenderDevice,
    TextureId,
};
pub use effect::{
    EffectMaterialVariables, EffectTransformVariables, EffectValue, EffectVariable,
    EffectsManager, RenderTechnique, ShaderPass, ShadingMode, TESSELLATION_VARIABLE,
};
pub use headless::{DeviceCommand, HeadlessDevice, HeadlessEffects, HeadlessHost};
pub use host::{RenderContext, RenderHost};
pub use resource::{
    BufferDescriptor, BufferUsageType, GpuBuffer, GpuTexture, TextureDescriptor, TextureFormat,
};
