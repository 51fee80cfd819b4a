//! patch_render - 细分补丁模型渲染库
//!
//! 把网格几何体作为 3 控制点（PN-Triangles）或 4 控制点（PN-Quads）
//! 补丁图元提交给支持细分的着色器技术。
//!
//! # 模块结构
//!
//! - `core`: 核心功能模块（数学、日志、配置、错误处理）
//! - `geometry`: 几何体模块（顶点、网格、暂存、程序生成、OBJ 加载器）
//! - `renderer`: 渲染接口（设备、效果、宿主、资源、无窗口后端）
//! - `component`: 场景元素（补丁模型、Phong 材质）
//!
//! # 使用示例
//!
//! ```
//! use patch_render::component::{Element3D, PatchModel};
//! use patch_render::geometry::patch_octahedron;
//! use patch_render::renderer::{HeadlessHost, RenderContext, RenderTechnique};
//!
//! let host = HeadlessHost::new(RenderTechnique::PnTriangles);
//! let mut model = PatchModel::new("Octahedron").with_geometry(patch_octahedron());
//! model.set_tessellation_factor(4.0);
//!
//! model.attach(&host)?;
//! model.render(&RenderContext::new())?;
//! model.detach();
//! # Ok::<(), patch_render::core::PatchRenderError>(())
//! ```

pub mod core;
pub mod geometry;
pub mod renderer;
pub mod component;
