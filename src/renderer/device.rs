//! 图形设备接口
//!
//! 渲染组件通过这里的 trait 访问底层图形 API：
//!
//! - `RenderDevice`：资源创建与销毁，并提供立即上下文
//! - `DeviceContext`：输入装配器状态设置、pass 应用和绘制命令
//!
//! 所有方法都接收 `&self`，设备通过 `Rc` 在组件之间共享，
//! 具体实现使用内部可变性。整个帧在单个渲染线程上执行，
//! 每个组件在渲染时都会完整覆盖它需要的管线状态。

use super::effect::ShaderPass;
use super::resource::{BufferDescriptor, TextureDescriptor};
use crate::core::error::Result;

/// 设备缓冲区标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub u64);

/// 设备纹理标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u64);

/// 输入布局标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputLayoutId(pub u64);

/// 图元拓扑
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveTopology {
    PointList,
    LineList,
    TriangleList,
    PatchListWith3ControlPoints,
    PatchListWith4ControlPoints,
}

impl PrimitiveTopology {
    /// 补丁图元的控制点数，非补丁图元返回 `None`
    pub fn control_points(&self) -> Option<u32> {
        match self {
            PrimitiveTopology::PatchListWith3ControlPoints => Some(3),
            PrimitiveTopology::PatchListWith4ControlPoints => Some(4),
            _ => None,
        }
    }
}

/// 索引格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexFormat {
    Uint32,
}

/// 立即上下文
pub trait DeviceContext {
    fn set_primitive_topology(&self, topology: PrimitiveTopology);

    fn set_input_layout(&self, layout: InputLayoutId);

    fn set_index_buffer(&self, buffer: BufferId, format: IndexFormat, offset: u32);

    fn set_vertex_buffer(&self, slot: u32, buffer: BufferId, stride: u32, offset: u32);

    /// 把 pass 的着色器和常量状态绑定到管线
    fn apply_pass(&self, pass: &ShaderPass);

    fn draw_indexed(&self, index_count: u32, start_index: u32, base_vertex: i32);

    /// 提交已记录的命令
    fn flush(&self);
}

/// 渲染设备
pub trait RenderDevice {
    /// 创建缓冲区并用 `contents` 初始化
    fn create_buffer(&self, descriptor: &BufferDescriptor, contents: &[u8]) -> Result<BufferId>;

    fn destroy_buffer(&self, buffer: BufferId);

    /// 创建二维纹理并上传像素
    fn create_texture(&self, descriptor: &TextureDescriptor, pixels: &[u8]) -> Result<TextureId>;

    fn destroy_texture(&self, texture: TextureId);

    /// 获取立即上下文
    fn immediate_context(&self) -> &dyn DeviceContext;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_points() {
        assert_eq!(PrimitiveTopology::PatchListWith3ControlPoints.control_points(), Some(3));
        assert_eq!(PrimitiveTopology::PatchListWith4ControlPoints.control_points(), Some(4));
        assert_eq!(PrimitiveTopology::TriangleList.control_points(), None);
    }
}
