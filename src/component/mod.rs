//! 组件系统模块
//!
//! 可挂载到渲染宿主的场景元素，以及它们使用的材质。

mod component;
mod material;
mod patch_model;

pub use component::{Element3D, HitTestResult, Visibility};
pub use material::{PhongMaterial, TextureData};
pub use patch_model::{LifecycleState, PatchModel};
