//! 细分补丁模型
//!
//! 把网格几何体作为 3 或 4 控制点的补丁图元渲染的场景节点。
//!
//! # 生命周期
//!
//! ```text
//! Unattached --attach--> Attached --detach--> Unattached
//!      |                    |
//!      +------dispose-------+----> Disposed
//! ```
//!
//! 挂载时捕获宿主当前的渲染技术，创建顶点/索引缓冲区、材质贴图，
//! 解析着色 pass 和效果变量；卸载时释放挂载期间获取的全部资源。
//! CPU 侧的顶点暂存数组跨越挂载周期保留，只在 `dispose` 或关闭复用时丢弃。

use std::rc::Rc;
use std::time::Duration;

use tracing::{debug, info, trace, warn};

use super::component::{Element3D, HitTestResult, Visibility};
use super::material::{PhongMaterial, TextureData};
use crate::core::config::PatchConfig;
use crate::core::error::{GeometryError, GraphicsError, Result};
use crate::core::math::{Color, Matrix4, Ray};
use crate::geometry::staging::VertexStaging;
use crate::geometry::{DefaultVertex, Geometry3D, GeometryKind, MeshGeometry3D};
use crate::renderer::{
    BufferId, BufferUsageType, EffectMaterialVariables, EffectTransformVariables, EffectValue,
    EffectVariable, EffectsManager, GpuBuffer, GpuTexture, IndexFormat, InputLayoutId,
    RenderContext, RenderDevice, RenderHost, RenderTechnique, ShaderPass, ShadingMode,
    TextureDescriptor, TextureFormat, TESSELLATION_VARIABLE,
};

/// 模型的生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Unattached,
    Attached,
    /// 终止状态，不能再挂载
    Disposed,
}

/// 一次挂载周期内从宿主获取的对象
struct Attachment {
    technique: RenderTechnique,
    device: Rc<dyn RenderDevice>,
    effects: Rc<dyn EffectsManager>,
    /// 几何体为空时不创建
    bindings: Option<PatchBindings>,
}

/// 几何体对应的设备资源和效果绑定
struct PatchBindings {
    input_layout: InputLayoutId,
    pass: Option<ShaderPass>,
    transform: EffectTransformVariables,
    material: EffectMaterialVariables,
    textures: MaterialTextures,
    vertex_buffer: GpuBuffer,
    index_buffer: GpuBuffer,
    index_count: u32,
    tessellation: EffectVariable,
}

/// 已上传的材质贴图
#[derive(Default)]
struct MaterialTextures {
    diffuse: Option<GpuTexture>,
    normal: Option<GpuTexture>,
    displacement: Option<GpuTexture>,
}

impl MaterialTextures {
    fn upload(device: &Rc<dyn RenderDevice>, material: Option<&PhongMaterial>) -> Result<Self> {
        let Some(material) = material else {
            return Ok(Self::default());
        };

        let upload = |map: Option<&TextureData>, slot: &str| -> Result<Option<GpuTexture>> {
            map.map(|data| {
                let name = data
                    .name
                    .clone()
                    .unwrap_or_else(|| format!("{}.{}", material.name, slot));
                let descriptor = TextureDescriptor::new(data.width, data.height, TextureFormat::Rgba8Unorm)
                    .with_name(name);
                GpuTexture::create(device, descriptor, &data.pixels)
            })
            .transpose()
        };

        Ok(Self {
            diffuse: upload(material.diffuse_map.as_ref(), "DiffuseMap")?,
            normal: upload(material.normal_map.as_ref(), "NormalMap")?,
            displacement: upload(material.displacement_map.as_ref(), "DisplacementMap")?,
        })
    }

    fn count(&self) -> usize {
        [&self.diffuse, &self.normal, &self.displacement]
            .iter()
            .filter(|t| t.is_some())
            .count()
    }
}

fn tessellation_value(factor: f32) -> EffectValue {
    EffectValue::Vector([factor, 0.0, 0.0, 0.0])
}

/// 创建网格的设备资源并解析效果绑定
///
/// 失败时已经创建的资源随返回值一起释放。
#[allow(clippy::too_many_arguments)]
fn create_bindings(
    name: &str,
    technique: RenderTechnique,
    device: &Rc<dyn RenderDevice>,
    effects: &dyn EffectsManager,
    mesh: &MeshGeometry3D,
    material: Option<&PhongMaterial>,
    config: &PatchConfig,
    staging: &mut VertexStaging,
) -> Result<PatchBindings> {
    mesh.validate()?;

    let input_layout = effects.input_layout(technique)?;

    let pass = effects.pass_by_name(technique, config.shading.pass_name());
    if pass.is_none() {
        warn!(
            "{}: pass '{}' not found in technique {}",
            name, config.shading, technique
        );
    }

    let transform = EffectTransformVariables::new(effects)?;
    let material_variables = EffectMaterialVariables::new(effects)?;
    let textures = MaterialTextures::upload(device, material)?;

    let vertices = staging.build(
        mesh,
        config.texture_coordinate_scale,
        config.reuse_vertex_array_buffer,
    )?;
    let vertex_buffer = GpuBuffer::create(
        device,
        BufferUsageType::Vertex,
        &format!("{}.Vertices", name),
        vertices,
    )?;
    let index_buffer = GpuBuffer::create(
        device,
        BufferUsageType::Index,
        &format!("{}.Indices", name),
        &mesh.indices,
    )?;

    let tessellation = effects.variable_by_name(TESSELLATION_VARIABLE)?;
    effects.set_variable(&tessellation, tessellation_value(config.tessellation_factor));

    device.immediate_context().flush();

    Ok(PatchBindings {
        input_layout,
        pass,
        transform,
        material: material_variables,
        textures,
        vertex_buffer,
        index_buffer,
        index_count: mesh.indices.len() as u32,
        tessellation,
    })
}

/// 细分补丁模型
///
/// # 示例
///
/// ```rust
/// use patch_render::component::{Element3D, PatchModel};
/// use patch_render::geometry::{patch_grid, PatchKind};
/// use patch_render::renderer::{HeadlessHost, RenderContext, RenderTechnique};
///
/// let host = HeadlessHost::new(RenderTechnique::PnQuads);
/// let mut model = PatchModel::new("Grid").with_geometry(patch_grid(2, PatchKind::Quads));
///
/// model.attach(&host)?;
/// model.render(&RenderContext::new())?;
/// assert_eq!(host.headless_device().draw_call_count(), 1);
/// model.dispose();
/// # Ok::<(), patch_render::core::PatchRenderError>(())
/// ```
pub struct PatchModel {
    name: String,
    config: PatchConfig,
    geometry: Option<Geometry3D>,
    material: Option<PhongMaterial>,
    transform: Matrix4,
    staging: VertexStaging,
    state: LifecycleState,
    attachment: Option<Attachment>,
}

impl PatchModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, PatchConfig::default())
    }

    pub fn with_config(name: impl Into<String>, config: PatchConfig) -> Self {
        Self {
            name: name.into(),
            config,
            geometry: None,
            material: None,
            transform: Matrix4::identity(),
            staging: VertexStaging::new(),
            state: LifecycleState::Unattached,
            attachment: None,
        }
    }

    pub fn with_geometry(mut self, geometry: impl Into<Geometry3D>) -> Self {
        self.geometry = Some(geometry.into());
        self
    }

    pub fn with_material(mut self, material: PhongMaterial) -> Self {
        self.material = Some(material);
        self
    }

    pub fn with_transform(mut self, transform: Matrix4) -> Self {
        self.transform = transform;
        self
    }

    // ========== 状态查询 ==========

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn config(&self) -> &PatchConfig {
        &self.config
    }

    pub fn geometry(&self) -> Option<&Geometry3D> {
        self.geometry.as_ref()
    }

    pub fn material(&self) -> Option<&PhongMaterial> {
        self.material.as_ref()
    }

    pub fn transform(&self) -> &Matrix4 {
        &self.transform
    }

    /// CPU 侧顶点暂存数组
    pub fn staging(&self) -> &VertexStaging {
        &self.staging
    }

    /// 挂载时捕获的渲染技术
    pub fn technique(&self) -> Option<RenderTechnique> {
        self.attachment.as_ref().map(|a| a.technique)
    }

    /// 当前绑定的着色 pass
    pub fn shader_pass(&self) -> Option<&ShaderPass> {
        self.bindings().and_then(|b| b.pass.as_ref())
    }

    /// 是否持有设备资源
    pub fn has_gpu_resources(&self) -> bool {
        self.bindings().is_some()
    }

    pub fn vertex_buffer_id(&self) -> Option<BufferId> {
        self.bindings().map(|b| b.vertex_buffer.id())
    }

    pub fn index_buffer_id(&self) -> Option<BufferId> {
        self.bindings().map(|b| b.index_buffer.id())
    }

    /// 挂载时记录的索引数，也是每次绘制提交的索引数
    pub fn index_count(&self) -> Option<u32> {
        self.bindings().map(|b| b.index_count)
    }

    /// 已上传的材质贴图数
    pub fn texture_count(&self) -> usize {
        self.bindings().map_or(0, |b| b.textures.count())
    }

    fn bindings(&self) -> Option<&PatchBindings> {
        self.attachment.as_ref().and_then(|a| a.bindings.as_ref())
    }

    // ========== 配置 ==========

    /// 按名称切换着色 pass
    ///
    /// 名称区分大小写，不在固定集合中的名称被忽略并返回 `false`。
    pub fn set_shading(&mut self, name: &str) -> bool {
        match ShadingMode::from_pass_name(name) {
            Some(mode) => {
                self.set_shading_mode(mode);
                true
            }
            None => {
                debug!("{}: ignoring unknown shading '{}'", self.name, name);
                false
            }
        }
    }

    /// 切换着色 pass，挂载时立即重新解析
    ///
    /// 技术中没有对应 pass 时保留上一个 pass。
    pub fn set_shading_mode(&mut self, mode: ShadingMode) {
        self.config.shading = mode;

        let Some(attachment) = self.attachment.as_mut() else {
            return;
        };
        let Some(bindings) = attachment.bindings.as_mut() else {
            return;
        };

        match attachment.effects.pass_by_name(attachment.technique, mode.pass_name()) {
            Some(pass) => bindings.pass = Some(pass),
            None => warn!(
                "{}: pass '{}' not found in technique {}, keeping the previous pass",
                self.name, mode, attachment.technique
            ),
        }
    }

    /// 设置细分因子，挂载时立即写入 `vTessellation`
    pub fn set_tessellation_factor(&mut self, factor: f32) {
        self.config.tessellation_factor = factor;

        if let Some(attachment) = &self.attachment {
            if let Some(bindings) = &attachment.bindings {
                attachment
                    .effects
                    .set_variable(&bindings.tessellation, tessellation_value(factor));
            }
        }
    }

    /// 关闭复用时立即丢弃暂存数组
    pub fn set_reuse_vertex_array_buffer(&mut self, reuse: bool) {
        self.config.reuse_vertex_array_buffer = reuse;
        if !reuse {
            self.staging.discard();
        }
    }

    /// 下一次构建顶点时生效
    pub fn set_texture_coordinate_scale(&mut self, scale: f32) {
        self.config.texture_coordinate_scale = scale;
    }

    pub fn set_is_rendering(&mut self, is_rendering: bool) {
        self.config.is_rendering = is_rendering;
    }

    pub fn set_visibility(&mut self, visibility: Visibility) {
        self.config.visibility = visibility;
    }

    pub fn set_is_throwing_shadow(&mut self, is_throwing_shadow: bool) {
        self.config.is_throwing_shadow = is_throwing_shadow;
    }

    pub fn set_render_diffuse_map(&mut self, enabled: bool) {
        self.config.render_diffuse_map = enabled;
    }

    pub fn set_render_normal_map(&mut self, enabled: bool) {
        self.config.render_normal_map = enabled;
    }

    pub fn set_render_displacement_map(&mut self, enabled: bool) {
        self.config.render_displacement_map = enabled;
    }

    pub fn set_transform(&mut self, transform: Matrix4) {
        self.transform = transform;
    }

    /// 替换几何体，挂载时重建设备资源
    ///
    /// 重建失败时模型被卸载，与 `attach` 失败后的状态一致。
    pub fn set_geometry(&mut self, geometry: Option<Geometry3D>) -> Result<()> {
        self.geometry = geometry;
        if self.attachment.is_some() {
            if let Err(err) = self.rebuild_bindings() {
                warn!("{}: failed to rebuild bindings: {}", self.name, err);
                self.release();
                return Err(err);
            }
        }
        Ok(())
    }

    /// 替换材质，挂载时重新上传贴图
    pub fn set_material(&mut self, material: Option<PhongMaterial>) -> Result<()> {
        self.material = material;

        if let Some(attachment) = self.attachment.as_mut() {
            if let Some(bindings) = attachment.bindings.as_mut() {
                // 先释放旧贴图
                bindings.textures = MaterialTextures::default();
                bindings.textures =
                    MaterialTextures::upload(&attachment.device, self.material.as_ref())?;
            }
        }
        Ok(())
    }

    // ========== 生命周期 ==========

    /// 按当前几何体重建挂载周期内的绑定
    fn rebuild_bindings(&mut self) -> Result<()> {
        let Some(attachment) = self.attachment.as_mut() else {
            return Ok(());
        };
        attachment.bindings = None;

        let mesh = match &self.geometry {
            None => return Ok(()),
            Some(geometry) if geometry.is_empty() => {
                debug!("{}: geometry is empty, no GPU resources created", self.name);
                return Ok(());
            }
            Some(Geometry3D::Mesh(mesh)) => mesh,
            Some(other) => {
                return Err(GeometryError::UnexpectedGeometryType {
                    expected: GeometryKind::Mesh.name(),
                    found: other.kind().name(),
                }
                .into())
            }
        };

        let bindings = create_bindings(
            &self.name,
            attachment.technique,
            &attachment.device,
            attachment.effects.as_ref(),
            mesh,
            self.material.as_ref(),
            &self.config,
            &mut self.staging,
        )?;

        debug!(
            "{}: created {} vertices, {} indices, {} textures",
            self.name,
            self.staging.active_count(),
            bindings.index_count,
            bindings.textures.count()
        );
        attachment.bindings = Some(bindings);
        Ok(())
    }

    /// 释放当前挂载周期的全部资源
    fn release(&mut self) {
        if self.attachment.take().is_some() {
            info!("{}: detached", self.name);
        }
        if self.state == LifecycleState::Attached {
            self.state = LifecycleState::Unattached;
        }
    }

    /// 终止模型
    ///
    /// 卸载并丢弃暂存数组，重复调用无效果。
    pub fn dispose(&mut self) {
        if self.state == LifecycleState::Disposed {
            return;
        }
        self.release();
        self.staging.discard();
        self.state = LifecycleState::Disposed;
        debug!("{}: disposed", self.name);
    }

    /// 把材质参数写入效果变量
    fn push_material(&self, effects: &dyn EffectsManager, bindings: &PatchBindings) {
        let Some(material) = &self.material else {
            return;
        };
        let vars = &bindings.material;
        let color = |c: Color| EffectValue::Vector(c.to_array());

        effects.set_variable(&vars.diffuse, color(material.diffuse_color));
        effects.set_variable(&vars.ambient, color(material.ambient_color));
        effects.set_variable(&vars.emissive, color(material.emissive_color));
        effects.set_variable(&vars.specular, color(material.specular_color));
        effects.set_variable(&vars.reflect, color(material.reflective_color));
        effects.set_variable(&vars.shininess, EffectValue::Scalar(material.specular_shininess));

        effects.set_variable(
            &vars.has_diffuse_map,
            EffectValue::Bool(material.diffuse_map.is_some() && self.config.render_diffuse_map),
        );
        effects.set_variable(
            &vars.has_normal_map,
            EffectValue::Bool(material.normal_map.is_some() && self.config.render_normal_map),
        );
        effects.set_variable(
            &vars.has_displacement_map,
            EffectValue::Bool(
                material.displacement_map.is_some() && self.config.render_displacement_map,
            ),
        );

        let textures = &bindings.textures;
        for (texture, variable) in [
            (&textures.diffuse, &vars.diffuse_map),
            (&textures.normal, &vars.normal_map),
            (&textures.displacement, &vars.displacement_map),
        ] {
            if let Some(texture) = texture {
                effects.set_variable(variable, EffectValue::Texture(texture.id()));
            }
        }
    }
}

impl Element3D for PatchModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn attach(&mut self, host: &dyn RenderHost) -> Result<()> {
        match self.state {
            LifecycleState::Disposed => {
                return Err(GraphicsError::InvalidState(format!(
                    "{}: cannot attach a disposed model",
                    self.name
                ))
                .into())
            }
            LifecycleState::Attached => self.release(),
            LifecycleState::Unattached => {}
        }

        let technique = host.render_technique();
        self.attachment = Some(Attachment {
            technique,
            device: host.device(),
            effects: host.effects(),
            bindings: None,
        });

        if let Err(e) = self.rebuild_bindings() {
            self.attachment = None;
            return Err(e);
        }

        self.state = LifecycleState::Attached;
        info!("{}: attached with technique {}", self.name, technique);
        Ok(())
    }

    fn detach(&mut self) {
        self.release();
    }

    fn is_attached(&self) -> bool {
        self.state == LifecycleState::Attached
    }

    fn update(&mut self, _elapsed: Duration) {}

    fn render(&mut self, context: &RenderContext) -> Result<()> {
        let Some(attachment) = &self.attachment else {
            trace!("{}: render before attach", self.name);
            return Ok(());
        };
        let Some(bindings) = &attachment.bindings else {
            return Ok(());
        };

        if !self.config.is_rendering || self.config.visibility != Visibility::Visible {
            return Ok(());
        }
        if self.geometry.as_ref().map_or(true, Geometry3D::is_empty) {
            return Ok(());
        }
        if context.is_shadow_pass && !self.config.is_throwing_shadow {
            return Ok(());
        }

        let technique = attachment.technique;
        let topology = technique
            .patch_topology()
            .ok_or_else(|| GraphicsError::UnsupportedTechnique(technique.to_string()))?;
        let pass = bindings
            .pass
            .as_ref()
            .ok_or_else(|| GraphicsError::MissingShaderPass {
                technique: technique.to_string(),
                pass: self.config.shading.to_string(),
            })?;

        let effects = attachment.effects.as_ref();
        effects.set_variable(&bindings.transform.world, EffectValue::from(&self.transform));
        self.push_material(effects, bindings);

        let immediate = attachment.device.immediate_context();
        immediate.set_primitive_topology(topology);
        immediate.set_input_layout(bindings.input_layout);
        immediate.set_index_buffer(bindings.index_buffer.id(), IndexFormat::Uint32, 0);
        immediate.set_vertex_buffer(
            0,
            bindings.vertex_buffer.id(),
            DefaultVertex::SIZE_IN_BYTES,
            0,
        );
        immediate.apply_pass(pass);
        immediate.draw_indexed(bindings.index_count, 0, 0);
        Ok(())
    }

    fn hit_test(&self, _ray: &Ray, _hits: &mut Vec<HitTestResult>) -> bool {
        // 细分后的几何体只存在于 GPU 上
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::PatchRenderError;
    use crate::core::math::{Vector2, Vector3};
    use crate::geometry::{LineGeometry3D, DEFAULT_VERTEX_COLOR};
    use crate::renderer::{DeviceCommand, HeadlessHost, PrimitiveTopology};

    fn quad_mesh() -> MeshGeometry3D {
        let mut mesh = MeshGeometry3D::with_name("Quad");
        mesh.positions = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
        ];
        mesh.indices = vec![0, 1, 2, 3];
        mesh
    }

    fn triangle_mesh(count: usize) -> MeshGeometry3D {
        let mut mesh = MeshGeometry3D::new();
        mesh.positions = (0..count)
            .map(|i| Vector3::new(i as f32, (i % 2) as f32, 0.0))
            .collect();
        mesh.indices = vec![0, 1, 2];
        mesh
    }

    fn attached(technique: RenderTechnique, mesh: MeshGeometry3D) -> (HeadlessHost, PatchModel) {
        let host = HeadlessHost::new(technique);
        let mut model = PatchModel::new("Patch").with_geometry(mesh);
        model.attach(&host).unwrap();
        (host, model)
    }

    #[test]
    fn test_empty_geometry_allocates_nothing() {
        let host = HeadlessHost::new(RenderTechnique::PnTriangles);
        let device = host.headless_device();

        let mut no_indices = quad_mesh();
        no_indices.indices.clear();

        for geometry in [None, Some(Geometry3D::from(MeshGeometry3D::new())), Some(no_indices.into())] {
            let mut model = PatchModel::new("Empty");
            model.set_geometry(geometry).unwrap();
            model.attach(&host).unwrap();

            assert!(model.is_attached());
            assert!(!model.has_gpu_resources());
            model.render(&RenderContext::new()).unwrap();
        }

        assert_eq!(device.command_count(), 0);
        assert_eq!(device.live_buffer_count(), 0);
    }

    #[test]
    fn test_render_before_attach_is_noop() {
        let host = HeadlessHost::new(RenderTechnique::PnQuads);
        let mut model = PatchModel::new("Patch").with_geometry(quad_mesh());
        model.render(&RenderContext::new()).unwrap();
        assert_eq!(host.headless_device().command_count(), 0);
        assert_eq!(model.state(), LifecycleState::Unattached);
    }

    #[test]
    fn test_attach_uploads_buffers() {
        let (host, model) = attached(RenderTechnique::PnQuads, quad_mesh());
        let device = host.headless_device();

        assert_eq!(model.technique(), Some(RenderTechnique::PnQuads));
        assert_eq!(model.index_count(), Some(4));
        assert_eq!(device.live_buffer_count(), 2);

        let vertices = device.buffer_vertices(model.vertex_buffer_id().unwrap()).unwrap();
        assert_eq!(vertices.len(), 4);
        let indices = device.buffer_indices(model.index_buffer_id().unwrap()).unwrap();
        assert_eq!(indices, vec![0, 1, 2, 3]);

        // 挂载结束时刷新立即上下文
        assert_eq!(device.commands().last(), Some(&DeviceCommand::Flush));
        assert_eq!(
            host.headless_effects().value(TESSELLATION_VARIABLE),
            Some(EffectValue::Vector([1.0, 0.0, 0.0, 0.0]))
        );
    }

    #[test]
    fn test_fallback_attributes() {
        let (host, model) = attached(RenderTechnique::PnQuads, quad_mesh());
        let vertices = host
            .headless_device()
            .buffer_vertices(model.vertex_buffer_id().unwrap())
            .unwrap();

        for (vertex, position) in vertices.iter().zip(&quad_mesh().positions) {
            assert_eq!(vertex.position, [position.x, position.y, position.z, 1.0]);
            assert_eq!(vertex.color, DEFAULT_VERTEX_COLOR);
            assert_eq!(vertex.color, Color::RED.to_array());
            assert_eq!(vertex.texcoord, [0.0, 0.0]);
            assert_eq!(vertex.normal, [0.0; 3]);
            assert_eq!(vertex.tangent, [0.0; 3]);
            assert_eq!(vertex.bitangent, [0.0; 3]);
        }
    }

    #[test]
    fn test_texture_coordinate_scale() {
        let host = HeadlessHost::new(RenderTechnique::PnQuads);
        let mut mesh = quad_mesh();
        mesh.texture_coordinates = Some(vec![Vector2::new(0.5, 0.25); 4]);

        let mut model = PatchModel::new("Patch").with_geometry(mesh);
        model.set_texture_coordinate_scale(2.0);
        model.attach(&host).unwrap();

        let vertices = host
            .headless_device()
            .buffer_vertices(model.vertex_buffer_id().unwrap())
            .unwrap();
        assert!(vertices.iter().all(|v| v.texcoord == [1.0, 0.5]));
    }

    #[test]
    fn test_render_command_sequence() {
        let (host, mut model) = attached(RenderTechnique::PnQuads, quad_mesh());
        let device = host.headless_device();
        device.take_commands();

        model.render(&RenderContext::new()).unwrap();

        let commands = device.take_commands();
        let vertex_buffer = model.vertex_buffer_id().unwrap();
        let index_buffer = model.index_buffer_id().unwrap();
        assert_eq!(commands.len(), 6);
        assert_eq!(
            commands[0],
            DeviceCommand::SetPrimitiveTopology(PrimitiveTopology::PatchListWith4ControlPoints)
        );
        assert!(matches!(commands[1], DeviceCommand::SetInputLayout(_)));
        assert_eq!(
            commands[2],
            DeviceCommand::SetIndexBuffer { buffer: index_buffer, format: IndexFormat::Uint32, offset: 0 }
        );
        assert_eq!(
            commands[3],
            DeviceCommand::SetVertexBuffer { slot: 0, buffer: vertex_buffer, stride: 76, offset: 0 }
        );
        assert_eq!(
            commands[4],
            DeviceCommand::ApplyPass { technique: RenderTechnique::PnQuads, name: "Solid".to_string() }
        );
        assert_eq!(
            commands[5],
            DeviceCommand::DrawIndexed { index_count: 4, start_index: 0, base_vertex: 0 }
        );
    }

    #[test]
    fn test_triangle_topology() {
        let (host, mut model) = attached(RenderTechnique::PnTriangles, triangle_mesh(3));
        model.render(&RenderContext::new()).unwrap();

        let commands = host.headless_device().commands();
        assert!(commands.contains(&DeviceCommand::SetPrimitiveTopology(
            PrimitiveTopology::PatchListWith3ControlPoints
        )));
        assert!(commands.contains(&DeviceCommand::DrawIndexed {
            index_count: 3,
            start_index: 0,
            base_vertex: 0
        }));
    }

    #[test]
    fn test_unsupported_technique() {
        for technique in RenderTechnique::ALL.into_iter().filter(|t| !t.is_tessellation()) {
            let (host, mut model) = attached(technique, triangle_mesh(3));
            let device = host.headless_device();
            device.take_commands();
            host.headless_effects().clear_writes();

            let err = model.render(&RenderContext::new()).unwrap_err();
            assert!(matches!(
                err,
                PatchRenderError::Graphics(GraphicsError::UnsupportedTechnique(_))
            ));
            assert!(err.is_contract_violation());
            assert_eq!(device.command_count(), 0);
            assert_eq!(host.headless_effects().write_count(), 0);
        }
    }

    #[test]
    fn test_technique_captured_at_attach() {
        let (host, mut model) = attached(RenderTechnique::PnTriangles, triangle_mesh(3));
        host.set_render_technique(RenderTechnique::Phong);

        assert!(model.render(&RenderContext::new()).is_ok());
        assert_eq!(model.technique(), Some(RenderTechnique::PnTriangles));
    }

    #[test]
    fn test_all_shading_passes_resolve() {
        let (_host, mut model) = attached(RenderTechnique::PnTriangles, triangle_mesh(3));

        for mode in ShadingMode::ALL {
            assert!(model.set_shading(mode.pass_name()));
            assert_eq!(model.shader_pass().unwrap().name, mode.pass_name());
        }
    }

    #[test]
    fn test_invalid_shading_keeps_pass() {
        let (_host, mut model) = attached(RenderTechnique::PnQuads, quad_mesh());
        assert!(model.set_shading("Wires"));

        for name in ["wires", "Wireframe", "", "SOLID"] {
            assert!(!model.set_shading(name));
            assert_eq!(model.shader_pass().unwrap().name, "Wires");
            assert_eq!(model.config().shading, ShadingMode::Wires);
        }
    }

    #[test]
    fn test_unresolvable_pass_keeps_previous() {
        // 非补丁技术只有 Solid pass
        let (_host, mut model) = attached(RenderTechnique::Phong, triangle_mesh(3));
        model.set_shading_mode(ShadingMode::Normals);

        assert_eq!(model.shader_pass().unwrap().name, "Solid");
        assert_eq!(model.config().shading, ShadingMode::Normals);
    }

    #[test]
    fn test_shading_before_attach() {
        let host = HeadlessHost::new(RenderTechnique::PnTriangles);
        for mode in ShadingMode::ALL {
            let mut model = PatchModel::new("Patch").with_geometry(triangle_mesh(3));
            assert!(model.set_shading(mode.pass_name()));
            model.attach(&host).unwrap();
            assert_eq!(model.shader_pass().unwrap().name, mode.pass_name());
        }
    }

    #[test]
    fn test_shadow_pass() {
        let (host, mut model) = attached(RenderTechnique::PnQuads, quad_mesh());
        let device = host.headless_device();
        device.take_commands();
        host.headless_effects().clear_writes();

        model.render(&RenderContext::shadow_pass()).unwrap();
        assert_eq!(device.command_count(), 0);
        assert_eq!(host.headless_effects().write_count(), 0);

        model.set_is_throwing_shadow(true);
        model.render(&RenderContext::shadow_pass()).unwrap();
        assert_eq!(device.draw_call_count(), 1);
    }

    #[test]
    fn test_render_gating() {
        let (host, mut model) = attached(RenderTechnique::PnQuads, quad_mesh());
        let device = host.headless_device();
        device.take_commands();

        model.set_is_rendering(false);
        model.render(&RenderContext::new()).unwrap();
        model.set_is_rendering(true);

        for visibility in [Visibility::Hidden, Visibility::Collapsed] {
            model.set_visibility(visibility);
            model.render(&RenderContext::new()).unwrap();
        }
        assert_eq!(device.command_count(), 0);

        model.set_visibility(Visibility::Visible);
        model.render(&RenderContext::new()).unwrap();
        assert_eq!(device.draw_call_count(), 1);
    }

    #[test]
    fn test_world_matrix_pushed() {
        let (host, mut model) = attached(RenderTechnique::PnQuads, quad_mesh());
        let world = Matrix4::new_translation(&Vector3::new(1.0, 2.0, 3.0));
        model.set_transform(world);
        model.render(&RenderContext::new()).unwrap();

        let Some(EffectValue::Matrix(columns)) = host.headless_effects().value("mWorld") else {
            panic!("mWorld not set");
        };
        assert_eq!(columns[3], [1.0, 2.0, 3.0, 1.0]);
    }

    #[test]
    fn test_material_parameters() {
        let host = HeadlessHost::new(RenderTechnique::PnQuads);
        let material = PhongMaterial::new("Stone")
            .with_diffuse(Color::GREEN)
            .with_diffuse_map(TextureData::solid(Color::WHITE))
            .with_displacement_map(TextureData::solid(Color::BLACK));
        let mut model = PatchModel::new("Patch")
            .with_geometry(quad_mesh())
            .with_material(material);
        model.set_render_displacement_map(false);
        model.attach(&host).unwrap();
        model.render(&RenderContext::new()).unwrap();

        let effects = host.headless_effects();
        assert_eq!(effects.value("vMaterialDiffuse"), Some(EffectValue::Vector([0.0, 1.0, 0.0, 1.0])));
        assert_eq!(effects.value("sMaterialShininess"), Some(EffectValue::Scalar(30.0)));
        assert_eq!(effects.value("bHasDiffuseMap"), Some(EffectValue::Bool(true)));
        assert_eq!(effects.value("bHasNormalMap"), Some(EffectValue::Bool(false)));
        assert_eq!(effects.value("bHasDisplacementMap"), Some(EffectValue::Bool(false)));
        assert!(matches!(effects.value("texDiffuseMap"), Some(EffectValue::Texture(_))));
        assert!(matches!(effects.value("texDisplacementMap"), Some(EffectValue::Texture(_))));
        assert_eq!(effects.value("texNormalMap"), None);
    }

    #[test]
    fn test_no_material_skips_material_variables() {
        let (host, mut model) = attached(RenderTechnique::PnQuads, quad_mesh());
        model.render(&RenderContext::new()).unwrap();
        assert_eq!(host.headless_effects().value("vMaterialDiffuse"), None);
        assert!(host.headless_effects().value("mWorld").is_some());
    }

    #[test]
    fn test_set_material_while_attached() {
        let (host, mut model) = attached(RenderTechnique::PnQuads, quad_mesh());
        let device = host.headless_device();
        assert_eq!(device.live_texture_count(), 0);

        let material = PhongMaterial::default()
            .with_diffuse_map(TextureData::solid(Color::WHITE))
            .with_normal_map(TextureData::solid(Color::BLUE));
        model.set_material(Some(material)).unwrap();
        assert_eq!(model.texture_count(), 2);
        assert_eq!(device.live_texture_count(), 2);

        model.set_material(None).unwrap();
        assert_eq!(device.live_texture_count(), 0);
    }

    #[test]
    fn test_detach_releases_everything() {
        let host = HeadlessHost::new(RenderTechnique::PnQuads);
        let material = PhongMaterial::default()
            .with_diffuse_map(TextureData::solid(Color::WHITE))
            .with_normal_map(TextureData::solid(Color::BLUE))
            .with_displacement_map(TextureData::solid(Color::BLACK));
        let mut model = PatchModel::new("Patch")
            .with_geometry(quad_mesh())
            .with_material(material);
        model.attach(&host).unwrap();

        let device = host.headless_device();
        assert_eq!(device.live_buffer_count(), 2);
        assert_eq!(device.live_texture_count(), 3);

        model.detach();
        assert_eq!(model.state(), LifecycleState::Unattached);
        assert_eq!(device.live_buffer_count(), 0);
        assert_eq!(device.live_texture_count(), 0);
        assert!(model.shader_pass().is_none());
        // CPU 侧暂存数组跨挂载周期保留
        assert!(model.staging().is_allocated());

        model.attach(&host).unwrap();
        assert_eq!(device.live_buffer_count(), 2);
    }

    #[test]
    fn test_reattach_releases_previous() {
        let (host, mut model) = attached(RenderTechnique::PnTriangles, triangle_mesh(3));
        host.set_render_technique(RenderTechnique::PnQuads);
        model.attach(&host).unwrap();

        assert_eq!(host.headless_device().live_buffer_count(), 2);
        assert_eq!(model.technique(), Some(RenderTechnique::PnQuads));
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let (host, mut model) = attached(RenderTechnique::PnQuads, quad_mesh());
        model.dispose();
        model.dispose();

        assert_eq!(model.state(), LifecycleState::Disposed);
        assert!(!model.staging().is_allocated());
        assert_eq!(host.headless_device().live_buffer_count(), 0);

        let err = model.attach(&host).unwrap_err();
        assert!(matches!(err, PatchRenderError::Graphics(GraphicsError::InvalidState(_))));
        model.render(&RenderContext::new()).unwrap();
    }

    #[test]
    fn test_tessellation_factor_pushed_while_attached() {
        let (host, mut model) = attached(RenderTechnique::PnTriangles, triangle_mesh(3));
        model.set_tessellation_factor(3.5);
        assert_eq!(
            host.headless_effects().value(TESSELLATION_VARIABLE),
            Some(EffectValue::Vector([3.5, 0.0, 0.0, 0.0]))
        );

        model.detach();
        host.headless_effects().clear_writes();
        model.set_tessellation_factor(5.0);
        assert_eq!(host.headless_effects().write_count(), 0);
        assert_eq!(model.config().tessellation_factor, 5.0);
    }

    #[test]
    fn test_reuse_keeps_storage() {
        let host = HeadlessHost::new(RenderTechnique::PnTriangles);
        let mut model = PatchModel::new("Patch").with_geometry(triangle_mesh(8));
        model.set_reuse_vertex_array_buffer(true);
        model.attach(&host).unwrap();

        let storage = model.staging().storage_ptr();
        for count in [8, 5, 3] {
            model.set_geometry(Some(triangle_mesh(count).into())).unwrap();
            assert_eq!(model.staging().storage_ptr(), storage);
            assert_eq!(model.staging().active_count(), count);
            assert_eq!(model.staging().capacity(), 8);

            // 只上传有效的前 N 个顶点
            let uploaded = host
                .headless_device()
                .buffer_vertices(model.vertex_buffer_id().unwrap())
                .unwrap();
            assert_eq!(uploaded.len(), count);
        }

        model.set_reuse_vertex_array_buffer(false);
        assert!(!model.staging().is_allocated());
    }

    #[test]
    fn test_no_reuse_sizes_exactly() {
        let (_host, mut model) = attached(RenderTechnique::PnTriangles, triangle_mesh(8));
        model.set_geometry(Some(triangle_mesh(4).into())).unwrap();
        assert_eq!(model.staging().capacity(), 4);

        // 顶点数不变也重新分配
        let storage = model.staging().storage_ptr();
        model.set_geometry(Some(triangle_mesh(4).into())).unwrap();
        assert_ne!(model.staging().storage_ptr(), storage);
        assert_eq!(model.staging().capacity(), 4);
    }

    #[test]
    fn test_wrong_geometry_type() {
        let host = HeadlessHost::new(RenderTechnique::PnTriangles);
        let lines = LineGeometry3D {
            positions: vec![Vector3::zeros(), Vector3::x()],
            indices: vec![0, 1],
            colors: None,
        };
        let mut model = PatchModel::new("Lines").with_geometry(lines);

        let err = model.attach(&host).unwrap_err();
        assert!(err.is_contract_violation());
        assert!(matches!(
            err,
            PatchRenderError::Geometry(GeometryError::UnexpectedGeometryType { found: "line", .. })
        ));
        assert!(!model.is_attached());
        assert_eq!(host.headless_device().command_count(), 0);
    }

    #[test]
    fn test_wrong_geometry_type_while_attached() {
        let (host, mut model) = attached(RenderTechnique::PnTriangles, triangle_mesh(3));
        let lines = LineGeometry3D {
            positions: vec![Vector3::zeros(), Vector3::x()],
            indices: vec![0, 1],
            colors: None,
        };

        let err = model.set_geometry(Some(lines.into())).unwrap_err();
        assert!(err.is_contract_violation());
        assert_eq!(model.state(), LifecycleState::Unattached);
        assert!(!model.has_gpu_resources());
        assert_eq!(host.headless_device().live_buffer_count(), 0);

        // 卸载后渲染是空操作，重新挂载同样报错
        let device = host.headless_device();
        device.take_commands();
        model.render(&RenderContext::new()).unwrap();
        assert_eq!(device.command_count(), 0);
        assert!(model.attach(&host).unwrap_err().is_contract_violation());

        model.set_geometry(Some(triangle_mesh(3).into())).unwrap();
        model.attach(&host).unwrap();
        assert!(model.has_gpu_resources());
    }

    #[test]
    fn test_invalid_mesh_fails_attach() {
        let host = HeadlessHost::new(RenderTechnique::PnTriangles);
        let mut mesh = triangle_mesh(3);
        mesh.normals = Some(vec![Vector3::z(); 2]);
        let mut model = PatchModel::new("Broken").with_geometry(mesh);

        assert!(model.attach(&host).is_err());
        assert_eq!(model.state(), LifecycleState::Unattached);
        assert_eq!(host.headless_device().live_buffer_count(), 0);
    }

    #[test]
    fn test_set_empty_geometry_while_attached() {
        let (host, mut model) = attached(RenderTechnique::PnQuads, quad_mesh());
        model.set_geometry(None).unwrap();

        assert!(model.is_attached());
        assert!(!model.has_gpu_resources());
        assert_eq!(host.headless_device().live_buffer_count(), 0);
    }

    #[test]
    fn test_hit_test_always_false() {
        let (_host, mut model) = attached(RenderTechnique::PnQuads, quad_mesh());
        model.update(Duration::from_millis(16));

        let ray = Ray::new(Vector3::new(0.5, 0.5, 1.0), Vector3::new(0.0, 0.0, -1.0));
        let mut hits = Vec::new();
        assert!(!model.hit_test(&ray, &mut hits));
        assert!(hits.is_empty());

        // 已有的结果保持不变
        let earlier = HitTestResult {
            distance: 2.0,
            point: Vector3::new(0.0, 0.0, -1.0),
            normal: Vector3::z(),
        };
        let mut hits = vec![earlier.clone()];
        assert!(!model.hit_test(&ray, &mut hits));
        assert_eq!(hits, vec![earlier]);
    }
}
