use wgpu::util::{DeviceExt, TextureDataOrder};

use crate::types::Bitmap;

/// Pixel format of uploaded images and of the offscreen screen target.
pub(crate) const IMAGE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// A sampled texture together with its view and sampler.
pub(crate) struct ImageTexture {
    pub _texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

/// Uploads `bitmap`, falling back to a transparent placeholder when the GPU
/// cannot hold it.
pub(crate) fn upload_bitmap(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    bitmap: &Bitmap,
    label: &str,
    max_dimension: u32,
) -> ImageTexture {
    if bitmap.width() > max_dimension || bitmap.height() > max_dimension {
        tracing::warn!(
            label,
            width = bitmap.width(),
            height = bitmap.height(),
            max_dimension,
            "image exceeds GPU texture limits; using placeholder"
        );
        return placeholder(device, queue, label);
    }

    let texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: bitmap.width(),
                height: bitmap.height(),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: IMAGE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        TextureDataOrder::LayerMajor,
        bitmap.as_bytes(),
    );
    finish(device, texture, wgpu::FilterMode::Nearest)
}

/// 1x1 fully transparent texture for unbound image slots.
pub(crate) fn placeholder(device: &wgpu::Device, queue: &wgpu::Queue, label: &str) -> ImageTexture {
    let texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some(&format!("{label} placeholder")),
            size: wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: IMAGE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        TextureDataOrder::LayerMajor,
        &[0u8; 4],
    );
    finish(device, texture, wgpu::FilterMode::Nearest)
}

/// Offscreen render target holding the logical screen.
pub(crate) fn screen_target(device: &wgpu::Device, width: u32, height: u32) -> ImageTexture {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("logical screen"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: IMAGE_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    finish(device, texture, wgpu::FilterMode::Linear)
}

fn finish(device: &wgpu::Device, texture: wgpu::Texture, filter: wgpu::FilterMode) -> ImageTexture {
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: filter,
        min_filter: filter,
        mipmap_filter: filter,
        ..Default::default()
    });
    ImageTexture {
        _texture: texture,
        view,
        sampler,
    }
}

pub(crate) fn texture_entries<'a>(textures: &[&'a ImageTexture]) -> Vec<wgpu::BindGroupEntry<'a>> {
    let mut entries = Vec::with_capacity(textures.len() * 2);
    for (index, texture) in textures.iter().enumerate() {
        entries.push(wgpu::BindGroupEntry {
            binding: (index as u32) * 2,
            resource: wgpu::BindingResource::TextureView(&texture.view),
        });
        entries.push(wgpu::BindGroupEntry {
            binding: (index as u32) * 2 + 1,
            resource: wgpu::BindingResource::Sampler(&texture.sampler),
        });
    }
    entries
}

pub(crate) fn texture_layout_entries(count: usize) -> Vec<wgpu::BindGroupLayoutEntry> {
    let mut entries = Vec::with_capacity(count * 2);
    for index in 0..count {
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: (index as u32) * 2,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        });
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: (index as u32) * 2 + 1,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        });
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_pairs_textures_with_samplers() {
        let entries = texture_layout_entries(4);
        assert_eq!(entries.len(), 8);
        let bindings: Vec<u32> = entries.iter().map(|entry| entry.binding).collect();
        assert_eq!(bindings, vec![0, 1, 2, 3, 4, 5, 6, 7]);
        assert!(matches!(entries[0].ty, wgpu::BindingType::Texture { .. }));
        assert!(matches!(entries[7].ty, wgpu::BindingType::Sampler(_)));
    }

    #[test]
    fn entries_outlive_the_reference_slice() {
        // The bind entries borrow the textures, not the temporary slice of
        // references they were collected from.
        fn collect<'a>(first: &'a ImageTexture, second: &'a ImageTexture) -> Vec<wgpu::BindGroupEntry<'a>> {
            let bound = vec![first, second];
            texture_entries(&bound)
        }
        let collect: for<'a> fn(&'a ImageTexture, &'a ImageTexture) -> Vec<wgpu::BindGroupEntry<'a>> =
            collect;
        let _ = collect;
    }
}
