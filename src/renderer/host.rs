//! 渲染宿主
//!
//! 场景图在挂载组件时提供宿主，组件从中获取当前渲染技术、设备和效果管理器。

use std::rc::Rc;

use super::device::RenderDevice;
use super::effect::{EffectsManager, RenderTechnique};

/// 渲染宿主接口
pub trait RenderHost {
    /// 当前激活的渲染技术
    fn render_technique(&self) -> RenderTechnique;

    fn device(&self) -> Rc<dyn RenderDevice>;

    fn effects(&self) -> Rc<dyn EffectsManager>;
}

/// 单次渲染调用的上下文
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderContext {
    /// 是否为阴影贴图 pass
    pub is_shadow_pass: bool,
}

impl RenderContext {
    /// 普通场景 pass
    pub fn new() -> Self {
        Self::default()
    }

    /// 阴影 pass
    pub fn shadow_pass() -> Self {
        Self {
            is_shadow_pass: true,
        }
    }
}
