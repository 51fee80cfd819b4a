/// 补丁模型的交错顶点定义
///
/// 上传到 GPU 顶点缓冲区的固定布局顶点结构。

use bytemuck::{Pod, Zeroable};

/// 缺失颜色属性时使用的顶点颜色（不透明红色）
pub const DEFAULT_VERTEX_COLOR: [f32; 4] = [1.0, 0.0, 0.0, 1.0];

/// 交错顶点结构
///
/// 内存布局与输入布局一致，使用 `#[repr(C)]` 保证顺序和对齐。
///
/// # 内存布局
///
/// - position: 16 bytes (4 * f32，齐次坐标，w = 1)
/// - color: 16 bytes (4 * f32)
/// - texcoord: 8 bytes (2 * f32)
/// - normal: 12 bytes (3 * f32)
/// - tangent: 12 bytes (3 * f32)
/// - bitangent: 12 bytes (3 * f32)
/// - **总计**: 76 bytes
#[repr(C)]
#[derive(Default, Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct DefaultVertex {
    pub position: [f32; 4],
    pub color: [f32; 4],
    pub texcoord: [f32; 2],
    pub normal: [f32; 3],
    pub tangent: [f32; 3],
    pub bitangent: [f32; 3],
}

impl DefaultVertex {
    /// 单个顶点的字节数，也是顶点缓冲区的步长
    pub const SIZE_IN_BYTES: u32 = std::mem::size_of::<DefaultVertex>() as u32;
}

/// 顶点属性格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexFormat {
    Float32x2,
    Float32x3,
    Float32x4,
}

impl VertexFormat {
    /// 格式占用的字节数
    pub fn size(&self) -> u32 {
        match self {
            VertexFormat::Float32x2 => 8,
            VertexFormat::Float32x3 => 12,
            VertexFormat::Float32x4 => 16,
        }
    }
}

/// 输入布局中的一个属性
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub semantic: &'static str,
    pub format: VertexFormat,
    pub offset: u32,
}

/// `DefaultVertex` 对应的输入布局
pub const DEFAULT_VERTEX_LAYOUT: [VertexAttribute; 6] = [
    VertexAttribute { semantic: "POSITION", format: VertexFormat::Float32x4, offset: 0 },
    VertexAttribute { semantic: "COLOR", format: VertexFormat::Float32x4, offset: 16 },
    VertexAttribute { semantic: "TEXCOORD", format: VertexFormat::Float32x2, offset: 32 },
    VertexAttribute { semantic: "NORMAL", format: VertexFormat::Float32x3, offset: 40 },
    VertexAttribute { semantic: "TANGENT", format: VertexFormat::Float32x3, offset: 52 },
    VertexAttribute { semantic: "BINORMAL", format: VertexFormat::Float32x3, offset: 64 },
];
