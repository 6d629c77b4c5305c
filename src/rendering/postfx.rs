//! HDR offscreen targets and the fixed post chain:
//! bright-pass → horizontal blur → vertical blur → composite.
//!
//! Bloom runs at half resolution. All targets are rebuilt on resize.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::params::PostFxParams;

pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Composite / bright-pass parameters
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct PostUniforms {
    pub threshold: f32,
    pub bloom_strength: f32,
    pub vignette_offset: f32,
    pub vignette_darkness: f32,
    /// 0 disables the aberration
    pub chromatic_strength: f32,
    pub exposure: f32,
    pub _padding: [f32; 2],
}

impl PostUniforms {
    pub fn new(params: &PostFxParams) -> Self {
        Self {
            threshold: params.bloom.threshold,
            bloom_strength: params.bloom.strength,
            vignette_offset: params.vignette.offset,
            vignette_darkness: params.vignette.darkness,
            chromatic_strength: params.chromatic.map_or(0.0, |c| c.strength),
            exposure: params.exposure,
            _padding: [0.0; 2],
        }
    }
}

/// One direction of the separable Gaussian
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct BlurUniforms {
    /// Texel offset per tap in UV units
    pub texel_step: [f32; 2],
    pub radius: f32,
    pub _padding: f32,
}

impl BlurUniforms {
    pub fn new(horizontal: bool, size: (u32, u32), radius: f32) -> Self {
        let (w, h) = (size.0.max(1) as f32, size.1.max(1) as f32);
        let texel_step = if horizontal {
            [1.0 / w, 0.0]
        } else {
            [0.0, 1.0 / h]
        };
        Self {
            texel_step,
            radius,
            _padding: 0.0,
        }
    }
}

/// Half-resolution size used by the bloom targets
pub fn bloom_size(width: u32, height: u32) -> (u32, u32) {
    ((width / 2).max(1), (height / 2).max(1))
}

struct Targets {
    scene: wgpu::TextureView,
    depth: wgpu::TextureView,
    bloom_a: wgpu::TextureView,
    bloom_b: wgpu::TextureView,
    bloom_size: (u32, u32),
}

impl Targets {
    fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        let bloom_size = bloom_size(width, height);

        let color = |label: &str, (w, h): (u32, u32)| {
            device
                .create_texture(&wgpu::TextureDescriptor {
                    label: Some(label),
                    size: wgpu::Extent3d {
                        width: w,
                        height: h,
                        depth_or_array_layers: 1,
                    },
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: HDR_FORMAT,
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                        | wgpu::TextureUsages::TEXTURE_BINDING,
                    view_formats: &[],
                })
                .create_view(&wgpu::TextureViewDescriptor::default())
        };

        let depth = device
            .create_texture(&wgpu::TextureDescriptor {
                label: Some("Depth Texture"),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: DEPTH_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            })
            .create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            scene: color("HDR Scene Texture", (width, height)),
            depth,
            bloom_a: color("Bloom Texture A", bloom_size),
            bloom_b: color("Bloom Texture B", bloom_size),
            bloom_size,
        }
    }
}

struct BindGroups {
    bright: wgpu::BindGroup,
    blur_h: wgpu::BindGroup,
    blur_v: wgpu::BindGroup,
    composite: wgpu::BindGroup,
}

/// Offscreen targets plus the passes that turn them into the final image
pub struct PostChain {
    params: PostFxParams,
    targets: Targets,
    sampler: wgpu::Sampler,
    single_layout: wgpu::BindGroupLayout,
    composite_layout: wgpu::BindGroupLayout,
    post_buffer: wgpu::Buffer,
    blur_h_buffer: wgpu::Buffer,
    blur_v_buffer: wgpu::Buffer,
    bright_pipeline: wgpu::RenderPipeline,
    blur_pipeline: wgpu::RenderPipeline,
    composite_pipeline: wgpu::RenderPipeline,
    bind_groups: BindGroups,
}

impl PostChain {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        params: PostFxParams,
    ) -> Self {
        let targets = Targets::new(device, width, height);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Post Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let texture_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let sampler_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        };
        let uniform_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        // Bright pass and blur: one input texture
        let single_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Post Single Input Layout"),
            entries: &[texture_entry(0), sampler_entry(1), uniform_entry(2)],
        });

        // Composite: scene + bloom
        let composite_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Composite Layout"),
            entries: &[
                texture_entry(0),
                texture_entry(1),
                sampler_entry(2),
                uniform_entry(3),
            ],
        });

        let post_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Post Uniform Buffer"),
            contents: bytemuck::cast_slice(&[PostUniforms::new(&params)]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let blur_buffer = |label: &str, horizontal: bool| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(&[BlurUniforms::new(
                    horizontal,
                    targets.bloom_size,
                    params.bloom.radius,
                )]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            })
        };
        let blur_h_buffer = blur_buffer("Blur H Uniform Buffer", true);
        let blur_v_buffer = blur_buffer("Blur V Uniform Buffer", false);

        let bright_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Bright Pass Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/bright.wgsl").into()),
        });
        let blur_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Blur Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/blur.wgsl").into()),
        });
        let composite_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Composite Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/composite.wgsl").into()),
        });

        let bright_pipeline = fullscreen_pipeline(
            device,
            "Bright Pass Pipeline",
            &bright_shader,
            &single_layout,
            HDR_FORMAT,
        );
        let blur_pipeline = fullscreen_pipeline(
            device,
            "Blur Pipeline",
            &blur_shader,
            &single_layout,
            HDR_FORMAT,
        );
        let composite_pipeline = fullscreen_pipeline(
            device,
            "Composite Pipeline",
            &composite_shader,
            &composite_layout,
            surface_format,
        );

        let bind_groups = Self::bind_groups(
            device,
            &targets,
            &sampler,
            &single_layout,
            &composite_layout,
            [&post_buffer, &blur_h_buffer, &blur_v_buffer],
        );

        Self {
            params,
            targets,
            sampler,
            single_layout,
            composite_layout,
            post_buffer,
            blur_h_buffer,
            blur_v_buffer,
            bright_pipeline,
            blur_pipeline,
            composite_pipeline,
            bind_groups,
        }
    }

    fn bind_groups(
        device: &wgpu::Device,
        targets: &Targets,
        sampler: &wgpu::Sampler,
        single_layout: &wgpu::BindGroupLayout,
        composite_layout: &wgpu::BindGroupLayout,
        [post, blur_h, blur_v]: [&wgpu::Buffer; 3],
    ) -> BindGroups {
        let single = |label: &str, view: &wgpu::TextureView, buffer: &wgpu::Buffer| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: single_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: buffer.as_entire_binding(),
                    },
                ],
            })
        };

        BindGroups {
            bright: single("Bright Pass Bind Group", &targets.scene, post),
            blur_h: single("Blur H Bind Group", &targets.bloom_a, blur_h),
            blur_v: single("Blur V Bind Group", &targets.bloom_b, blur_v),
            composite: device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Composite Bind Group"),
                layout: composite_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&targets.scene),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&targets.bloom_a),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: post.as_entire_binding(),
                    },
                ],
            }),
        }
    }

    /// Rebuild targets and dependent bind groups for a new surface size
    pub fn resize(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, width: u32, height: u32) {
        self.targets = Targets::new(device, width, height);

        let radius = self.params.bloom.radius;
        let size = self.targets.bloom_size;
        queue.write_buffer(
            &self.blur_h_buffer,
            0,
            bytemuck::cast_slice(&[BlurUniforms::new(true, size, radius)]),
        );
        queue.write_buffer(
            &self.blur_v_buffer,
            0,
            bytemuck::cast_slice(&[BlurUniforms::new(false, size, radius)]),
        );

        self.bind_groups = Self::bind_groups(
            device,
            &self.targets,
            &self.sampler,
            &self.single_layout,
            &self.composite_layout,
            [&self.post_buffer, &self.blur_h_buffer, &self.blur_v_buffer],
        );
    }

    /// HDR colour target for the scene pass
    pub fn scene_view(&self) -> &wgpu::TextureView {
        &self.targets.scene
    }

    pub fn depth_view(&self) -> &wgpu::TextureView {
        &self.targets.depth
    }

    /// Encode bloom and composite into `output`
    pub fn encode(&self, encoder: &mut wgpu::CommandEncoder, output: &wgpu::TextureView) {
        let passes = [
            ("Bright Pass", &self.bright_pipeline, &self.bind_groups.bright, &self.targets.bloom_a),
            ("Blur H Pass", &self.blur_pipeline, &self.bind_groups.blur_h, &self.targets.bloom_b),
            ("Blur V Pass", &self.blur_pipeline, &self.bind_groups.blur_v, &self.targets.bloom_a),
            ("Composite Pass", &self.composite_pipeline, &self.bind_groups.composite, output),
        ];

        for (label, pipeline, bind_group, target) in passes {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(label),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, bind_group, &[]);
            pass.draw(0..3, 0..1); // Fullscreen triangle
        }
    }
}

fn fullscreen_pipeline(
    device: &wgpu::Device,
    label: &str,
    shader: &wgpu::ShaderModule,
    bind_group_layout: &wgpu::BindGroupLayout,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &[bind_group_layout],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{ChromaticParams, SceneParams};

    #[test]
    fn test_uniform_sizes_are_16_byte_multiples() {
        assert_eq!(std::mem::size_of::<PostUniforms>() % 16, 0);
        assert_eq!(std::mem::size_of::<BlurUniforms>(), 16);
    }

    #[test]
    fn test_chromatic_disabled_when_absent() {
        let classic = PostUniforms::new(&SceneParams::classic().post);
        assert_eq!(classic.chromatic_strength, 0.0);

        let mut post = SceneParams::classic().post;
        post.chromatic = Some(ChromaticParams { strength: 0.01 });
        assert_eq!(PostUniforms::new(&post).chromatic_strength, 0.01);
    }

    #[test]
    fn test_blur_steps_one_texel_along_axis() {
        let h = BlurUniforms::new(true, (640, 360), 1.5);
        let v = BlurUniforms::new(false, (640, 360), 1.5);
        assert_eq!(h.texel_step, [1.0 / 640.0, 0.0]);
        assert_eq!(v.texel_step, [0.0, 1.0 / 360.0]);
    }

    #[test]
    fn test_bloom_size_never_zero() {
        assert_eq!(bloom_size(1280, 720), (640, 360));
        assert_eq!(bloom_size(1, 1), (1, 1));
    }
}
