//! 场景元素接口
//!
//! 所有可挂载到渲染宿主的三维元素共用的生命周期接口。

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::error::Result;
use crate::core::math::{Ray, Vector3};
use crate::renderer::{RenderContext, RenderHost};

/// 元素可见性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
    Collapsed,
}

/// 命中测试结果
///
/// `Element3D::hit_test` 的输出类型，能做射线求交的元素把命中追加到调用方的列表中。
/// 细分补丁模型不参与命中测试，不会产生该结果。
#[derive(Debug, Clone, PartialEq)]
pub struct HitTestResult {
    /// 射线起点到命中点的距离
    pub distance: f32,
    pub point: Vector3,
    pub normal: Vector3,
}

/// 三维场景元素
///
/// 生命周期：`attach` 从宿主获取设备资源，`render` 每帧提交绘制，
/// `detach` 释放挂载期间获取的资源。
pub trait Element3D {
    /// 元素名称
    fn name(&self) -> &str;

    /// 挂载到渲染宿主
    fn attach(&mut self, host: &dyn RenderHost) -> Result<()>;

    /// 从宿主卸载
    fn detach(&mut self);

    fn is_attached(&self) -> bool;

    /// 每帧更新（可选实现）
    fn update(&mut self, _elapsed: Duration) {}

    /// 提交绘制命令，没有东西可画时直接返回 `Ok(())`
    fn render(&mut self, context: &RenderContext) -> Result<()>;

    /// 射线命中测试，命中时把结果追加到 `hits`
    fn hit_test(&self, _ray: &Ray, _hits: &mut Vec<HitTestResult>) -> bool {
        false
    }
}
