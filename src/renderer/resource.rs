//! 资源管理模块
//!
//! GPU 缓冲区和纹理的描述符，以及在 drop 时自动销毁设备资源的 RAII 句柄。

use std::fmt;
use std::rc::Rc;

use bytemuck::Pod;

use super::device::{BufferId, RenderDevice, TextureId};
use crate::core::error::Result;

/// 缓冲区使用类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsageType {
    /// 顶点缓冲区
    Vertex,
    /// 索引缓冲区
    Index,
}

/// 缓冲区描述信息
#[derive(Debug, Clone, PartialEq)]
pub struct BufferDescriptor {
    /// 缓冲区大小（字节）
    pub size: u64,
    /// 使用类型
    pub usage: BufferUsageType,
    /// 单个元素的字节数
    pub stride: u32,
    /// 调试名称（可选）
    pub name: Option<String>,
}

impl BufferDescriptor {
    /// 创建新的缓冲区描述符
    pub fn new(size: u64, usage: BufferUsageType, stride: u32) -> Self {
        Self {
            size,
            usage,
            stride,
            name: None,
        }
    }

    /// 设置调试名称
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// 元素数量
    pub fn element_count(&self) -> u64 {
        if self.stride == 0 {
            0
        } else {
            self.size / self.stride as u64
        }
    }
}

/// 纹理格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    /// RGBA 8位无符号整数
    Rgba8Unorm,
}

impl TextureFormat {
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            TextureFormat::Rgba8Unorm => 4,
        }
    }
}

/// 二维纹理描述信息
#[derive(Debug, Clone, PartialEq)]
pub struct TextureDescriptor {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub name: Option<String>,
}

impl TextureDescriptor {
    pub fn new(width: u32, height: u32, format: TextureFormat) -> Self {
        Self {
            width,
            height,
            format,
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// 像素数据应有的字节数
    pub fn byte_size(&self) -> u64 {
        self.width as u64 * self.height as u64 * self.format.bytes_per_pixel() as u64
    }
}

/// 设备缓冲区句柄
///
/// drop 时通过设备销毁缓冲区。
pub struct GpuBuffer {
    device: Rc<dyn RenderDevice>,
    id: BufferId,
    descriptor: BufferDescriptor,
}

impl GpuBuffer {
    /// 以 `T` 为元素创建缓冲区
    pub fn create<T: Pod>(
        device: &Rc<dyn RenderDevice>,
        usage: BufferUsageType,
        name: &str,
        contents: &[T],
    ) -> Result<Self> {
        let bytes: &[u8] = bytemuck::cast_slice(contents);
        let descriptor = BufferDescriptor::new(
            bytes.len() as u64,
            usage,
            std::mem::size_of::<T>() as u32,
        )
        .with_name(name);

        let id = device.create_buffer(&descriptor, bytes)?;
        Ok(Self {
            device: Rc::clone(device),
            id,
            descriptor,
        })
    }

    pub fn id(&self) -> BufferId {
        self.id
    }

    pub fn descriptor(&self) -> &BufferDescriptor {
        &self.descriptor
    }

    pub fn element_count(&self) -> u64 {
        self.descriptor.element_count()
    }
}

impl Drop for GpuBuffer {
    fn drop(&mut self) {
        self.device.destroy_buffer(self.id);
    }
}

impl fmt::Debug for GpuBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpuBuffer")
            .field("id", &self.id)
            .field("descriptor", &self.descriptor)
            .finish()
    }
}

/// 设备纹理句柄
///
/// drop 时通过设备销毁纹理。
pub struct GpuTexture {
    device: Rc<dyn RenderDevice>,
    id: TextureId,
    descriptor: TextureDescriptor,
}

impl GpuTexture {
    pub fn create(
        device: &Rc<dyn RenderDevice>,
        descriptor: TextureDescriptor,
        pixels: &[u8],
    ) -> Result<Self> {
        let id = device.create_texture(&descriptor, pixels)?;
        Ok(Self {
            device: Rc::clone(device),
            id,
            descriptor,
        })
    }

    pub fn id(&self) -> TextureId {
        self.id
    }

    pub fn descriptor(&self) -> &TextureDescriptor {
        &self.descriptor
    }
}

impl Drop for GpuTexture {
    fn drop(&mut self) {
        self.device.destroy_texture(self.id);
    }
}

impl fmt::Debug for GpuTexture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpuTexture")
            .field("id", &self.id)
            .field("descriptor", &self.descriptor)
            .finish()
    }
}
