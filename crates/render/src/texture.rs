use crate::error::RenderError;
use image::imageops::{self, FilterType};
use std::path::Path;

/// A sampled 2D texture with its view and sampler.
pub struct Texture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    width: u32,
    height: u32,
}

/// Decode an image file to RGBA8, optionally flipped so the first row is
/// the bottom of the picture.
pub fn decode_rgba(path: &Path, flip_vertical: bool) -> Result<image::RgbaImage, RenderError> {
    let decoded = image::open(path).map_err(|source| RenderError::Texture {
        path: path.to_path_buf(),
        source,
    })?;
    let decoded = if flip_vertical {
        decoded.flipv()
    } else {
        decoded
    };
    Ok(decoded.to_rgba8())
}

/// The image followed by successively halved copies down to 1x1.
pub fn mip_chain(base: image::RgbaImage) -> Vec<image::RgbaImage> {
    let mut levels = vec![base];
    while let Some(last) = levels.last() {
        let (width, height) = last.dimensions();
        if width == 1 && height == 1 {
            break;
        }
        let next = imageops::resize(
            last,
            (width / 2).max(1),
            (height / 2).max(1),
            FilterType::Triangle,
        );
        levels.push(next);
    }
    levels
}

impl Texture {
    /// Load an image file into a mipmapped sRGB texture with repeat
    /// wrapping and trilinear filtering.
    pub fn load(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        path: &Path,
        flip_vertical: bool,
    ) -> Result<Self, RenderError> {
        let rgba = decode_rgba(path, flip_vertical)?;
        tracing::debug!(
            path = %path.display(),
            width = rgba.width(),
            height = rgba.height(),
            "texture loaded"
        );
        let label = path.file_name().and_then(|name| name.to_str()).unwrap_or("texture");
        Ok(Self::from_rgba(device, queue, label, rgba))
    }

    /// Upload an RGBA8 image together with its generated mip levels.
    pub fn from_rgba(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        rgba: image::RgbaImage,
    ) -> Self {
        let (width, height) = rgba.dimensions();
        let levels = mip_chain(rgba);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: levels.len() as u32,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        for (mip_level, level) in levels.iter().enumerate() {
            let (level_width, level_height) = level.dimensions();
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: mip_level as u32,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                level.as_raw(),
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * level_width),
                    rows_per_image: Some(level_height),
                },
                wgpu::Extent3d {
                    width: level_width,
                    height: level_height,
                    depth_or_array_layers: 1,
                },
            );
        }
        let view = texture.create_view(&Default::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        Self {
            texture,
            view,
            sampler,
            width,
            height,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
