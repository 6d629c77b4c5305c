//! Swapchain readback for recording mode.

use super::RenderError;
use crate::params::RecordingConfig;

/// Row pitch for a texture-to-buffer copy (bytes)
pub fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * 4;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Strip row padding and convert to tightly packed RGBA8
pub fn unpad_rows(data: &[u8], width: u32, height: u32, bgra: bool) -> Vec<u8> {
    let padded = padded_bytes_per_row(width) as usize;
    let unpadded = (width * 4) as usize;
    let mut image = Vec::with_capacity(unpadded * height as usize);

    for row in data.chunks(padded).take(height as usize) {
        image.extend_from_slice(&row[..unpadded]);
    }

    if bgra {
        for pixel in image.chunks_exact_mut(4) {
            pixel.swap(0, 2);
        }
    }
    image
}

/// Copy `texture` back to the CPU and save it as the recording frame `frame_num`
pub fn save_frame(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    frame_num: usize,
    config: &RecordingConfig,
) -> Result<(), RenderError> {
    let (width, height) = (texture.width(), texture.height());
    let padded = padded_bytes_per_row(width);

    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Frame Capture Buffer"),
        size: (padded * height) as u64,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Frame Capture Encoder"),
    });

    encoder.copy_texture_to_buffer(
        wgpu::ImageCopyTexture {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::ImageCopyBuffer {
            buffer: &buffer,
            layout: wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(padded),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );

    queue.submit(std::iter::once(encoder.finish()));

    let slice = buffer.slice(..);
    slice.map_async(wgpu::MapMode::Read, |_| {});
    device.poll(wgpu::Maintain::Wait);

    let bgra = matches!(
        texture.format(),
        wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb
    );
    let image_data = {
        let data = slice.get_mapped_range();
        unpad_rows(&data, width, height, bgra)
    };
    buffer.unmap();

    let frame_path = config.frame_path(frame_num);
    image::save_buffer(
        &frame_path,
        &image_data,
        width,
        height,
        image::ColorType::Rgba8,
    )
    .map_err(|e| RenderError::Capture(format!("{}: {}", frame_path, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_pitch_is_aligned() {
        assert_eq!(padded_bytes_per_row(64), 256);
        assert_eq!(padded_bytes_per_row(65), 512);
        assert_eq!(padded_bytes_per_row(1280) % wgpu::COPY_BYTES_PER_ROW_ALIGNMENT, 0);
    }

    #[test]
    fn test_unpad_drops_padding_and_swaps_channels() {
        let (width, height) = (2, 2);
        let padded = padded_bytes_per_row(width) as usize;
        let mut data = vec![0u8; padded * height as usize];
        data[0..4].copy_from_slice(&[1, 2, 3, 4]);
        data[padded..padded + 4].copy_from_slice(&[5, 6, 7, 8]);

        let rgba = unpad_rows(&data, width, height, false);
        assert_eq!(rgba.len(), 16);
        assert_eq!(&rgba[8..12], &[5, 6, 7, 8]);

        let swapped = unpad_rows(&data, width, height, true);
        assert_eq!(&swapped[0..4], &[3, 2, 1, 4]);
    }
}
