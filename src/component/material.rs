//! Phong 材质
//!
//! 材质不属于 GPU 侧资源，颜色和标量参数在每帧渲染时读取。
//! 贴图以 RGBA8 像素保存在 CPU 侧，挂载时上传为设备纹理。

use std::path::Path;

use tracing::debug;

use crate::core::error::{GraphicsError, PatchRenderError, Result};
use crate::core::math::Color;

/// CPU 侧的 RGBA8 贴图
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    /// 行优先的 RGBA8 像素
    pub pixels: Vec<u8>,
    pub name: Option<String>,
}

impl TextureData {
    /// 从原始像素创建，像素数必须等于 `width * height * 4`
    pub fn from_rgba8(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || pixels.len() != expected {
            return Err(GraphicsError::ResourceCreation(format!(
                "texture {}x{} needs {} bytes, got {}",
                width,
                height,
                expected,
                pixels.len()
            ))
            .into());
        }

        Ok(Self {
            width,
            height,
            pixels,
            name: None,
        })
    }

    /// 1x1 纯色贴图
    pub fn solid(color: Color) -> Self {
        let to_u8 = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self {
            width: 1,
            height: 1,
            pixels: vec![to_u8(color.r), to_u8(color.g), to_u8(color.b), to_u8(color.a)],
            name: None,
        }
    }

    /// 从图片文件解码
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let image = image::open(path).map_err(|e| match e {
            image::ImageError::IoError(io) => PatchRenderError::Io(io),
            other => GraphicsError::ResourceCreation(format!(
                "failed to decode texture {}: {}",
                path.display(),
                other
            ))
            .into(),
        })?;

        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        debug!("Loaded texture {} ({}x{})", path.display(), width, height);

        let mut texture = Self::from_rgba8(width, height, rgba.into_raw())?;
        texture.name = path.file_name().map(|n| n.to_string_lossy().into_owned());
        Ok(texture)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Phong 光照材质
#[derive(Debug, Clone, PartialEq)]
pub struct PhongMaterial {
    pub name: String,
    pub diffuse_color: Color,
    pub ambient_color: Color,
    pub emissive_color: Color,
    pub specular_color: Color,
    pub reflective_color: Color,
    /// 高光指数
    pub specular_shininess: f32,
    pub diffuse_map: Option<TextureData>,
    pub normal_map: Option<TextureData>,
    pub displacement_map: Option<TextureData>,
}

impl Default for PhongMaterial {
    fn default() -> Self {
        Self {
            name: "Default".to_string(),
            diffuse_color: Color::WHITE,
            ambient_color: Color::new(0.1, 0.1, 0.1, 1.0),
            emissive_color: Color::BLACK,
            specular_color: Color::new(0.5, 0.5, 0.5, 1.0),
            reflective_color: Color::BLACK,
            specular_shininess: 30.0,
            diffuse_map: None,
            normal_map: None,
            displacement_map: None,
        }
    }
}

impl PhongMaterial {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_diffuse(mut self, color: Color) -> Self {
        self.diffuse_color = color;
        self
    }

    pub fn with_diffuse_map(mut self, map: TextureData) -> Self {
        self.diffuse_map = Some(map);
        self
    }

    pub fn with_normal_map(mut self, map: TextureData) -> Self {
        self.normal_map = Some(map);
        self
    }

    pub fn with_displacement_map(mut self, map: TextureData) -> Self {
        self.displacement_map = Some(map);
        self
    }

    /// 是否带有任意贴图
    pub fn has_maps(&self) -> bool {
        self.diffuse_map.is_some() || self.normal_map.is_some() || self.displacement_map.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rgba8_checks_size() {
        assert!(TextureData::from_rgba8(2, 2, vec![0; 16]).is_ok());
        assert!(TextureData::from_rgba8(2, 2, vec![0; 15]).is_err());
        assert!(TextureData::from_rgba8(0, 2, Vec::new()).is_err());
    }

    #[test]
    fn test_solid_texture() {
        let texture = TextureData::solid(Color::new(1.0, 0.5, 0.0, 1.0));
        assert_eq!(texture.pixels, vec![255, 128, 0, 255]);
    }

    #[test]
    fn test_from_file_missing() {
        let result = TextureData::from_file("does/not/exist.png");
        assert!(matches!(result, Err(PatchRenderError::Io(_))));
    }

    #[test]
    fn test_from_file_png() {
        let path = std::env::temp_dir().join("patch_render_material_test.png");
        image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();

        let texture = TextureData::from_file(&path).unwrap();
        assert_eq!((texture.width, texture.height), (3, 2));
        assert_eq!(&texture.pixels[..4], &[10, 20, 30, 255]);
        assert_eq!(texture.name.as_deref(), Some("patch_render_material_test.png"));

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_material_maps() {
        let material = PhongMaterial::new("Bricks");
        assert!(!material.has_maps());

        let material = material.with_normal_map(TextureData::solid(Color::BLUE));
        assert!(material.has_maps());
        assert_eq!(material.name, "Bricks");
    }
}
