//! patch_render - 无窗口演示程序
//!
//! 加载配置和场景，把补丁模型挂载到无窗口宿主上渲染若干帧，
//! 最后输出记录下来的设备命令统计。
//!
//! # 使用方法
//!
//! ```bash
//! # 使用配置文件
//! cargo run
//!
//! # 命令行覆盖
//! cargo run -- --quads --shading Wires --tess 8 --frames 5
//! ```
//!
//! # 流程
//!
//! ```text
//! config.toml + scene.toml
//!        │
//! ┌──────▼──────┐
//! │ PatchModel  │  几何体 + 材质
//! └──────┬──────┘
//!        │ attach / render / dispose
//! ┌──────▼──────┐
//! │HeadlessHost │  记录设备命令和效果变量
//! └─────────────┘
//! ```

use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};

use patch_render::component::{Element3D, PatchModel};
use patch_render::core::{log, Config, SceneConfig};
use patch_render::geometry::PatchKind;
use patch_render::renderer::{DeviceCommand, HeadlessHost, RenderContext};

const FRAME_TIME: Duration = Duration::from_millis(16);

/// 应用程序入口点
///
/// # 初始化流程
///
/// 1. 加载配置文件（config.toml）并应用命令行参数
/// 2. 初始化日志系统
/// 3. 加载场景配置文件（scene.toml），构建几何体和材质
/// 4. 挂载模型，渲染配置的帧数和一次阴影 pass
/// 5. 输出统计并销毁模型
fn main() -> anyhow::Result<()> {
    // 1. 加载配置（在初始化日志之前）
    let mut config = Config::from_file_or_default("config.toml");
    config.apply_args(std::env::args().skip(1));
    config.validate().context("invalid configuration")?;

    // 2. 初始化日志系统
    log::init_from_config(&config.logging);
    info!(version = env!("CARGO_PKG_VERSION"), "patch_render starting");

    // 3. 场景
    let scene = SceneConfig::from_file_or_default("scene.toml");
    let technique = config.graphics.technique;
    let kind = PatchKind::for_technique(technique).unwrap_or_else(|| {
        warn!("{} is not a patch technique, rendering will fail", technique);
        PatchKind::Triangles
    });

    let geometry = scene
        .model
        .load_geometry(kind)
        .context("failed to build model geometry")?;
    let material = scene
        .material
        .as_ref()
        .map(|m| m.to_material())
        .transpose()
        .context("failed to load material")?;

    info!(
        technique = %technique,
        shading = %config.patch.shading,
        tessellation = config.patch.tessellation_factor,
        vertices = geometry.vertex_count(),
        indices = geometry.index_count(),
        "Scene configuration"
    );

    // 4. 挂载并渲染
    let host = HeadlessHost::new(technique);
    let mut model = PatchModel::with_config("PatchModel", config.patch.clone())
        .with_geometry(geometry)
        .with_transform(scene.model.transform.to_matrix());
    if let Some(material) = material {
        model = model.with_material(material);
    }

    model.attach(&host).context("failed to attach patch model")?;

    for frame in 0..config.graphics.frames {
        model.update(FRAME_TIME);
        model
            .render(&RenderContext::new())
            .with_context(|| format!("frame {} failed", frame))?;
    }
    model
        .render(&RenderContext::shadow_pass())
        .context("shadow pass failed")?;

    // 5. 统计
    let device = host.headless_device();
    let commands = device.commands();
    let pipeline = commands.iter().filter(|c| c.is_pipeline_command()).count();
    let patches = commands
        .iter()
        .filter_map(|c| match c {
            DeviceCommand::DrawIndexed { index_count, .. } => Some(*index_count as usize),
            _ => None,
        })
        .sum::<usize>()
        / kind.control_points();

    info!(
        commands = commands.len(),
        pipeline_commands = pipeline,
        draw_calls = device.draw_call_count(),
        patches,
        live_buffers = device.live_buffer_count(),
        live_textures = device.live_texture_count(),
        effect_writes = host.headless_effects().write_count(),
        "Rendered {} frames",
        config.graphics.frames
    );

    model.dispose();
    info!(
        live_buffers = device.live_buffer_count(),
        live_textures = device.live_texture_count(),
        "Model disposed"
    );

    Ok(())
}
