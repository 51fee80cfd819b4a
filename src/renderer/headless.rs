//! 无窗口（headless）后端
//!
//! 不访问真实 GPU，而是记录所有设备命令和效果变量写入，
//! 并跟踪存活的缓冲区和纹理。演示程序和测试都通过它驱动渲染组件。

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use tracing::trace;

use super::device::{
    BufferId, DeviceContext, IndexFormat, InputLayoutId, PrimitiveTopology, RenderDevice,
    TextureId,
};
use super::effect::{EffectValue, EffectVariable, EffectsManager, RenderTechnique, ShaderPass, ShadingMode};
use super::host::RenderHost;
use super::resource::{BufferDescriptor, TextureDescriptor};
use crate::core::error::{GraphicsError, Result};
use crate::geometry::vertex::DefaultVertex;

/// 记录下来的设备命令
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCommand {
    CreateBuffer { id: BufferId, descriptor: BufferDescriptor },
    DestroyBuffer(BufferId),
    CreateTexture { id: TextureId, descriptor: TextureDescriptor },
    DestroyTexture(TextureId),
    SetPrimitiveTopology(PrimitiveTopology),
    SetInputLayout(InputLayoutId),
    SetIndexBuffer { buffer: BufferId, format: IndexFormat, offset: u32 },
    SetVertexBuffer { slot: u32, buffer: BufferId, stride: u32, offset: u32 },
    ApplyPass { technique: RenderTechnique, name: String },
    DrawIndexed { index_count: u32, start_index: u32, base_vertex: i32 },
    Flush,
}

impl DeviceCommand {
    /// 是否为立即上下文上的管线命令（而非资源管理）
    pub fn is_pipeline_command(&self) -> bool {
        !matches!(
            self,
            DeviceCommand::CreateBuffer { .. }
                | DeviceCommand::DestroyBuffer(_)
                | DeviceCommand::CreateTexture { .. }
                | DeviceCommand::DestroyTexture(_)
        )
    }
}

/// 记录命令的设备
#[derive(Debug, Default)]
pub struct HeadlessDevice {
    next_id: Cell<u64>,
    commands: RefCell<Vec<DeviceCommand>>,
    buffers: RefCell<BTreeMap<BufferId, Vec<u8>>>,
    textures: RefCell<BTreeMap<TextureId, TextureDescriptor>>,
}

impl HeadlessDevice {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&self) -> u64 {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        id
    }

    fn record(&self, command: DeviceCommand) {
        trace!(target: "patch_render::headless", ?command, "device command");
        self.commands.borrow_mut().push(command);
    }

    /// 已记录命令的副本
    pub fn commands(&self) -> Vec<DeviceCommand> {
        self.commands.borrow().clone()
    }

    /// 取出并清空已记录的命令
    pub fn take_commands(&self) -> Vec<DeviceCommand> {
        std::mem::take(&mut *self.commands.borrow_mut())
    }

    pub fn command_count(&self) -> usize {
        self.commands.borrow().len()
    }

    pub fn draw_call_count(&self) -> usize {
        self.commands
            .borrow()
            .iter()
            .filter(|c| matches!(c, DeviceCommand::DrawIndexed { .. }))
            .count()
    }

    pub fn live_buffer_count(&self) -> usize {
        self.buffers.borrow().len()
    }

    pub fn live_texture_count(&self) -> usize {
        self.textures.borrow().len()
    }

    pub fn buffer_vertices(&self, id: BufferId) -> Option<Vec<DefaultVertex>> {
        let buffers = self.buffers.borrow();
        let bytes = buffers.get(&id)?;
        Some(
            bytes
                .chunks_exact(DefaultVertex::SIZE_IN_BYTES as usize)
                .map(bytemuck::pod_read_unaligned)
                .collect(),
        )
    }

    pub fn buffer_indices(&self, id: BufferId) -> Option<Vec<u32>> {
        let buffers = self.buffers.borrow();
        let bytes = buffers.get(&id)?;
        Some(
            bytes
                .chunks_exact(std::mem::size_of::<u32>())
                .map(bytemuck::pod_read_unaligned)
                .collect(),
        )
    }
}

impl RenderDevice for HeadlessDevice {
    fn create_buffer(&self, descriptor: &BufferDescriptor, contents: &[u8]) -> Result<BufferId> {
        if contents.len() as u64 != descriptor.size {
            return Err(GraphicsError::ResourceCreation(format!(
                "buffer {:?}: {} bytes of data for a {} byte buffer",
                descriptor.name,
                contents.len(),
                descriptor.size
            ))
            .into());
        }

        let id = BufferId(self.allocate_id());
        self.buffers.borrow_mut().insert(id, contents.to_vec());
        self.record(DeviceCommand::CreateBuffer {
            id,
            descriptor: descriptor.clone(),
        });
        Ok(id)
    }

    fn destroy_buffer(&self, buffer: BufferId) {
        if self.buffers.borrow_mut().remove(&buffer).is_some() {
            self.record(DeviceCommand::DestroyBuffer(buffer));
        }
    }

    fn create_texture(&self, descriptor: &TextureDescriptor, pixels: &[u8]) -> Result<TextureId> {
        if pixels.len() as u64 != descriptor.byte_size() {
            return Err(GraphicsError::ResourceCreation(format!(
                "texture {:?}: {} bytes of pixels for {}x{}",
                descriptor.name,
                pixels.len(),
                descriptor.width,
                descriptor.height
            ))
            .into());
        }

        let id = TextureId(self.allocate_id());
        self.textures.borrow_mut().insert(id, descriptor.clone());
        self.record(DeviceCommand::CreateTexture {
            id,
            descriptor: descriptor.clone(),
        });
        Ok(id)
    }

    fn destroy_texture(&self, texture: TextureId) {
        if self.textures.borrow_mut().remove(&texture).is_some() {
            self.record(DeviceCommand::DestroyTexture(texture));
        }
    }

    fn immediate_context(&self) -> &dyn DeviceContext {
        self
    }
}

impl DeviceContext for HeadlessDevice {
    fn set_primitive_topology(&self, topology: PrimitiveTopology) {
        self.record(DeviceCommand::SetPrimitiveTopology(topology));
    }

    fn set_input_layout(&self, layout: InputLayoutId) {
        self.record(DeviceCommand::SetInputLayout(layout));
    }

    fn set_index_buffer(&self, buffer: BufferId, format: IndexFormat, offset: u32) {
        self.record(DeviceCommand::SetIndexBuffer { buffer, format, offset });
    }

    fn set_vertex_buffer(&self, slot: u32, buffer: BufferId, stride: u32, offset: u32) {
        self.record(DeviceCommand::SetVertexBuffer { slot, buffer, stride, offset });
    }

    fn apply_pass(&self, pass: &ShaderPass) {
        self.record(DeviceCommand::ApplyPass {
            technique: pass.technique,
            name: pass.name.clone(),
        });
    }

    fn draw_indexed(&self, index_count: u32, start_index: u32, base_vertex: i32) {
        self.record(DeviceCommand::DrawIndexed {
            index_count,
            start_index,
            base_vertex,
        });
    }

    fn flush(&self) {
        self.record(DeviceCommand::Flush);
    }
}

/// 记录变量写入的效果管理器
///
/// 补丁技术提供全部七种着色 pass，其他技术只有 `Solid`。
/// 已知变量之外的名称会返回 `VariableNotFound`。
#[derive(Debug)]
pub struct HeadlessEffects {
    variables: Vec<&'static str>,
    values: RefCell<HashMap<String, EffectValue>>,
    writes: RefCell<Vec<(String, EffectValue)>>,
}

const KNOWN_VARIABLES: [&str; 14] = [
    "mWorld",
    "vMaterialDiffuse",
    "vMaterialAmbient",
    "vMaterialEmissive",
    "vMaterialSpecular",
    "vMaterialReflect",
    "sMaterialShininess",
    "bHasDiffuseMap",
    "bHasNormalMap",
    "bHasDisplacementMap",
    "texDiffuseMap",
    "texNormalMap",
    "texDisplacementMap",
    "vTessellation",
];

impl Default for HeadlessEffects {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessEffects {
    pub fn new() -> Self {
        Self {
            variables: KNOWN_VARIABLES.to_vec(),
            values: RefCell::new(HashMap::new()),
            writes: RefCell::new(Vec::new()),
        }
    }

    /// 变量的当前值
    pub fn value(&self, name: &str) -> Option<EffectValue> {
        self.values.borrow().get(name).copied()
    }

    pub fn write_count(&self) -> usize {
        self.writes.borrow().len()
    }

    pub fn clear_writes(&self) {
        self.writes.borrow_mut().clear();
    }
}

impl EffectsManager for HeadlessEffects {
    fn input_layout(&self, technique: RenderTechnique) -> Result<InputLayoutId> {
        // 所有技术共用 DefaultVertex 布局，按技术区分标识
        let index = RenderTechnique::ALL
            .iter()
            .position(|t| *t == technique)
            .unwrap_or_default();
        Ok(InputLayoutId(index as u64 + 1))
    }

    fn pass_by_name(&self, technique: RenderTechnique, name: &str) -> Option<ShaderPass> {
        let mode = ShadingMode::from_pass_name(name)?;
        if !technique.is_tessellation() && mode != ShadingMode::Solid {
            return None;
        }
        let index = ShadingMode::ALL.iter().position(|m| *m == mode)?;
        Some(ShaderPass {
            technique,
            name: name.to_string(),
            index: index as u32,
        })
    }

    fn variable_by_name(&self, name: &str) -> Result<EffectVariable> {
        self.variables
            .iter()
            .position(|v| *v == name)
            .map(|slot| EffectVariable {
                name: name.to_string(),
                slot: slot as u32,
            })
            .ok_or_else(|| GraphicsError::VariableNotFound(name.to_string()).into())
    }

    fn set_variable(&self, variable: &EffectVariable, value: EffectValue) {
        self.values.borrow_mut().insert(variable.name.clone(), value);
        self.writes.borrow_mut().push((variable.name.clone(), value));
    }
}

/// 无窗口宿主
#[derive(Debug)]
pub struct HeadlessHost {
    technique: Cell<RenderTechnique>,
    device: Rc<HeadlessDevice>,
    effects: Rc<HeadlessEffects>,
}

impl HeadlessHost {
    pub fn new(technique: RenderTechnique) -> Self {
        Self {
            technique: Cell::new(technique),
            device: Rc::new(HeadlessDevice::new()),
            effects: Rc::new(HeadlessEffects::new()),
        }
    }

    /// 切换激活的技术，对之后挂载的组件生效
    pub fn set_render_technique(&self, technique: RenderTechnique) {
        self.technique.set(technique);
    }

    pub fn headless_device(&self) -> &Rc<HeadlessDevice> {
        &self.device
    }

    pub fn headless_effects(&self) -> &Rc<HeadlessEffects> {
        &self.effects
    }
}

impl RenderHost for HeadlessHost {
    fn render_technique(&self) -> RenderTechnique {
        self.technique.get()
    }

    fn device(&self) -> Rc<dyn RenderDevice> {
        self.device.clone()
    }

    fn effects(&self) -> Rc<dyn EffectsManager> {
        self.effects.clone()
    }
}
