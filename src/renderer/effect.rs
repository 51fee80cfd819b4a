//! 效果（effect）接口
//!
//! 渲染技术、着色 pass 与效果变量的抽象。效果本身由外部编译和管理，
//! 组件只按名称查询 pass 和变量，并在每帧写入变量值。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::device::{InputLayoutId, PrimitiveTopology, TextureId};
use crate::core::error::{ConfigError, Result};
use crate::core::math::{matrix_to_columns, Matrix4};

/// 细分因子变量名，值为 `(factor, 0, 0, 0)`
pub const TESSELLATION_VARIABLE: &str = "vTessellation";

/// 渲染技术
///
/// 只有 `PnTriangles` 和 `PnQuads` 能被补丁模型渲染。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderTechnique {
    Blinn,
    Phong,
    Diffuse,
    Colors,
    Positions,
    Normals,
    PerturbedNormals,
    Tangents,
    TexCoords,
    Wires,
    /// 三控制点补丁（PN-Triangles）
    PnTriangles,
    /// 四控制点补丁（PN-Quads）
    PnQuads,
}

impl RenderTechnique {
    pub const ALL: [RenderTechnique; 12] = [
        RenderTechnique::Blinn,
        RenderTechnique::Phong,
        RenderTechnique::Diffuse,
        RenderTechnique::Colors,
        RenderTechnique::Positions,
        RenderTechnique::Normals,
        RenderTechnique::PerturbedNormals,
        RenderTechnique::Tangents,
        RenderTechnique::TexCoords,
        RenderTechnique::Wires,
        RenderTechnique::PnTriangles,
        RenderTechnique::PnQuads,
    ];

    /// 效果文件中的技术名
    pub fn effect_name(&self) -> &'static str {
        match self {
            RenderTechnique::Blinn => "RenderBlinn",
            RenderTechnique::Phong => "RenderPhong",
            RenderTechnique::Diffuse => "RenderDiffuse",
            RenderTechnique::Colors => "RenderColors",
            RenderTechnique::Positions => "RenderPositions",
            RenderTechnique::Normals => "RenderNormals",
            RenderTechnique::PerturbedNormals => "RenderPerturbedNormals",
            RenderTechnique::Tangents => "RenderTangents",
            RenderTechnique::TexCoords => "RenderTexCoords",
            RenderTechnique::Wires => "RenderWires",
            RenderTechnique::PnTriangles => "RenderPNTriangs",
            RenderTechnique::PnQuads => "RenderPNQuads",
        }
    }

    /// 补丁技术对应的图元拓扑
    pub fn patch_topology(&self) -> Option<PrimitiveTopology> {
        match self {
            RenderTechnique::PnTriangles => Some(PrimitiveTopology::PatchListWith3ControlPoints),
            RenderTechnique::PnQuads => Some(PrimitiveTopology::PatchListWith4ControlPoints),
            _ => None,
        }
    }

    pub fn is_tessellation(&self) -> bool {
        self.patch_topology().is_some()
    }
}

impl fmt::Display for RenderTechnique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.effect_name())
    }
}

impl FromStr for RenderTechnique {
    type Err = ConfigError;

    /// 接受效果技术名（`RenderPNQuads`）或小写简称（`pnquads`）
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        RenderTechnique::ALL
            .iter()
            .copied()
            .find(|t| {
                t.effect_name() == s
                    || format!("{:?}", t).to_ascii_lowercase() == lower
            })
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "graphics.technique".to_string(),
                reason: format!("unknown render technique '{}'", s),
            })
    }
}

/// 着色模式，对应补丁技术中的 pass 名称
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ShadingMode {
    #[default]
    Solid,
    Wires,
    Positions,
    Normals,
    TexCoords,
    Tangents,
    Colors,
}

impl ShadingMode {
    pub const ALL: [ShadingMode; 7] = [
        ShadingMode::Solid,
        ShadingMode::Wires,
        ShadingMode::Positions,
        ShadingMode::Normals,
        ShadingMode::TexCoords,
        ShadingMode::Tangents,
        ShadingMode::Colors,
    ];

    /// pass 名称
    pub fn pass_name(&self) -> &'static str {
        match self {
            ShadingMode::Solid => "Solid",
            ShadingMode::Wires => "Wires",
            ShadingMode::Positions => "Positions",
            ShadingMode::Normals => "Normals",
            ShadingMode::TexCoords => "TexCoords",
            ShadingMode::Tangents => "Tangents",
            ShadingMode::Colors => "Colors",
        }
    }

    /// 按 pass 名称查找（区分大小写）
    pub fn from_pass_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|mode| mode.pass_name() == name)
    }
}

impl fmt::Display for ShadingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.pass_name())
    }
}

/// 技术中的一个 pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderPass {
    pub technique: RenderTechnique,
    pub name: String,
    pub index: u32,
}

/// 效果变量句柄
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectVariable {
    pub name: String,
    pub slot: u32,
}

/// 写入效果变量的值
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EffectValue {
    Bool(bool),
    Scalar(f32),
    Vector([f32; 4]),
    /// 列主序 4x4 矩阵
    Matrix([[f32; 4]; 4]),
    Texture(TextureId),
}

impl From<&Matrix4> for EffectValue {
    fn from(m: &Matrix4) -> Self {
        EffectValue::Matrix(matrix_to_columns(m))
    }
}

/// 效果管理器
pub trait EffectsManager {
    /// 技术对应的顶点输入布局
    fn input_layout(&self, technique: RenderTechnique) -> Result<InputLayoutId>;

    /// 按名称查找 pass，技术中没有该 pass 时返回 `None`
    fn pass_by_name(&self, technique: RenderTechnique, name: &str) -> Option<ShaderPass>;

    fn variable_by_name(&self, name: &str) -> Result<EffectVariable>;

    fn set_variable(&self, variable: &EffectVariable, value: EffectValue);
}

/// 模型变换相关的效果变量
#[derive(Debug, Clone)]
pub struct EffectTransformVariables {
    pub world: EffectVariable,
}

impl EffectTransformVariables {
    pub fn new(effects: &dyn EffectsManager) -> Result<Self> {
        Ok(Self {
            world: effects.variable_by_name("mWorld")?,
        })
    }
}

/// Phong 材质相关的效果变量
#[derive(Debug, Clone)]
pub struct EffectMaterialVariables {
    pub diffuse: EffectVariable,
    pub ambient: EffectVariable,
    pub emissive: EffectVariable,
    pub specular: EffectVariable,
    pub reflect: EffectVariable,
    pub shininess: EffectVariable,
    pub has_diffuse_map: EffectVariable,
    pub has_normal_map: EffectVariable,
    pub has_displacement_map: EffectVariable,
    pub diffuse_map: EffectVariable,
    pub normal_map: EffectVariable,
    pub displacement_map: EffectVariable,
}

impl EffectMaterialVariables {
    pub fn new(effects: &dyn EffectsManager) -> Result<Self> {
        Ok(Self {
            diffuse: effects.variable_by_name("vMaterialDiffuse")?,
            ambient: effects.variable_by_name("vMaterialAmbient")?,
            emissive: effects.variable_by_name("vMaterialEmissive")?,
            specular: effects.variable_by_name("vMaterialSpecular")?,
            reflect: effects.variable_by_name("vMaterialReflect")?,
            shininess: effects.variable_by_name("sMaterialShininess")?,
            has_diffuse_map: effects.variable_by_name("bHasDiffuseMap")?,
            has_normal_map: effects.variable_by_name("bHasNormalMap")?,
            has_displacement_map: effects.variable_by_name("bHasDisplacementMap")?,
            diffuse_map: effects.variable_by_name("texDiffuseMap")?,
            normal_map: effects.variable_by_name("texNormalMap")?,
            displacement_map: effects.variable_by_name("texDisplacementMap")?,
        })
    }
}
