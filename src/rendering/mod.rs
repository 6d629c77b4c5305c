//! Rendering system with wgpu pipelines, offscreen HDR targets and the
//! bloom / composite post chain.

mod capture;
mod mesh;
mod postfx;

pub use capture::{padded_bytes_per_row, unpad_rows};
pub use mesh::{octahedron, ShapeVertex};
pub use postfx::{bloom_size, BlurUniforms, PostUniforms, DEPTH_FORMAT, HDR_FORMAT};

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use thiserror::Error;
use wgpu::util::DeviceExt;

use crate::params::{RecordingConfig, SceneParams};
use crate::scene::{GroundVertex, RenderContext, Scene, StarVertex};
use crate::tunnel::{InstanceBuffer, InstanceRaw};
use postfx::PostChain;

/// Rendering setup and per-frame failures
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("failed to find suitable GPU adapter")]
    NoAdapter,

    #[error("failed to request device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("surface frame unavailable: {0}")]
    Frame(#[from] wgpu::SurfaceError),

    #[error("instance buffer holds {got} particles, renderer expects {expected}")]
    InstanceCount { expected: usize, got: usize },

    #[error("frame capture failed: {0}")]
    Capture(String),
}

/// Uniform buffer shared by the scene shaders (std140-compatible)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct SceneUniforms {
    pub view_proj: [[f32; 4]; 4],
    /// xyz = eye, w = time (s)
    pub camera_pos: [f32; 4],
    /// xyz = position, w = intensity
    pub light_position: [f32; 4],
    /// rgb = colour, w = field rotation (radians)
    pub light_color: [f32; 4],
    pub ambient: [f32; 4],
    pub fog_color: [f32; 4],
    /// x = fog near, y = fog far, z = ground reflectivity
    pub fog_range: [f32; 4],
    pub ground_color: [f32; 4],
}

impl SceneUniforms {
    pub fn new(view_proj: Mat4, ctx: &RenderContext, scene: &SceneParams, time_s: f32) -> Self {
        let light = &ctx.light;
        let (reflectivity, ground_color) = scene
            .ground
            .map_or((0.0, [0.0; 3]), |g| (g.reflectivity, g.color));

        Self {
            view_proj: view_proj.to_cols_array_2d(),
            camera_pos: ctx.camera.eye.extend(time_s).to_array(),
            light_position: light.position.extend(light.intensity).to_array(),
            light_color: Vec3::from_array(light.color)
                .extend(ctx.field_rotation)
                .to_array(),
            ambient: Vec3::from_array(light.ambient()).extend(1.0).to_array(),
            fog_color: Vec3::from_array(scene.fog.color).extend(1.0).to_array(),
            fog_range: [scene.fog.near, scene.fog.far, reflectivity, 0.0],
            ground_color: Vec3::from_array(ground_color).extend(1.0).to_array(),
        }
    }
}

/// Per-instance vertex layout matching `InstanceRaw`
pub fn instance_layout() -> wgpu::VertexBufferLayout<'static> {
    const ATTRIBUTES: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        2 => Float32x4,
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x4,
        6 => Float32x4,
    ];
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &ATTRIBUTES,
    }
}

fn star_layout() -> wgpu::VertexBufferLayout<'static> {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32];
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<StarVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &ATTRIBUTES,
    }
}

fn ground_layout() -> wgpu::VertexBufferLayout<'static> {
    const ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<GroundVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &ATTRIBUTES,
    }
}

const ADDITIVE: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::SrcAlpha,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
};

struct Geometry {
    shape: wgpu::Buffer,
    shape_vertex_count: u32,
    instances: wgpu::Buffer,
    instance_count: usize,
    stars: wgpu::Buffer,
    star_count: u32,
    ground: Option<wgpu::Buffer>,
}

/// Rendering system managing wgpu device, pipelines, and buffers
pub struct RenderSystem {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    particle_pipeline: wgpu::RenderPipeline,
    star_pipeline: wgpu::RenderPipeline,
    ground_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    geometry: Geometry,
    post: PostChain,
    clear_color: wgpu::Color,
    recording_config: Option<RecordingConfig>,
}

impl RenderSystem {
    /// Create new rendering system
    pub async fn new(
        window: Arc<winit::window::Window>,
        scene: &Scene,
        instance_count: usize,
        recording_config: Option<RecordingConfig>,
    ) -> Result<Self, RenderError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        // Create surface (window must have 'static lifetime via Arc)
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::NoAdapter)?;

        log::info!("GPU adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Main Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let mut usage = wgpu::TextureUsages::RENDER_ATTACHMENT;

        // Add COPY_SRC if recording (needed for frame capture)
        if recording_config.is_some() {
            usage |= wgpu::TextureUsages::COPY_SRC;
        }

        let config = wgpu::SurfaceConfiguration {
            usage,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let particle_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Particle Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/particles.wgsl").into()),
        });
        let star_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Starfield Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/starfield.wgsl").into()),
        });
        let ground_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Ground Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/ground.wgsl").into()),
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Scene Uniform Buffer"),
            contents: bytemuck::cast_slice(&[SceneUniforms::zeroed()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Scene Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene Bind Group"),
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&uniform_bind_group_layout],
            push_constant_ranges: &[],
        });

        let particle_pipeline = scene_pipeline(
            &device,
            &pipeline_layout,
            ScenePass {
                label: "Particle Pipeline",
                shader: &particle_shader,
                buffers: &[ShapeVertex::layout(), instance_layout()],
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                blend: Some(ADDITIVE),
                depth_write: false,
            },
        );
        let star_pipeline = scene_pipeline(
            &device,
            &pipeline_layout,
            ScenePass {
                label: "Starfield Pipeline",
                shader: &star_shader,
                buffers: &[star_layout()],
                topology: wgpu::PrimitiveTopology::PointList,
                cull_mode: None,
                blend: Some(ADDITIVE),
                depth_write: false,
            },
        );
        let ground_pipeline = scene_pipeline(
            &device,
            &pipeline_layout,
            ScenePass {
                label: "Ground Pipeline",
                shader: &ground_shader,
                buffers: &[ground_layout()],
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                blend: None,
                depth_write: true,
            },
        );

        let shape = octahedron();
        let geometry = Geometry {
            shape: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Shape Vertex Buffer"),
                contents: bytemuck::cast_slice(&shape),
                usage: wgpu::BufferUsages::VERTEX,
            }),
            shape_vertex_count: shape.len() as u32,
            instances: device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Instance Buffer"),
                size: (instance_count.max(1) * std::mem::size_of::<InstanceRaw>()) as u64,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }),
            instance_count,
            stars: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Starfield Vertex Buffer"),
                contents: bytemuck::cast_slice(&scene.stars),
                usage: wgpu::BufferUsages::VERTEX,
            }),
            star_count: scene.stars.len() as u32,
            ground: scene.ground.as_ref().map(|quad| {
                device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Ground Vertex Buffer"),
                    contents: bytemuck::cast_slice(quad),
                    usage: wgpu::BufferUsages::VERTEX,
                })
            }),
        };

        let post = PostChain::new(
            &device,
            surface_format,
            config.width,
            config.height,
            scene.params.post,
        );

        let [r, g, b] = scene.params.background;

        Ok(Self {
            surface,
            device,
            queue,
            config,
            particle_pipeline,
            star_pipeline,
            ground_pipeline,
            uniform_buffer,
            uniform_bind_group,
            geometry,
            post,
            clear_color: wgpu::Color {
                r: r as f64,
                g: g as f64,
                b: b as f64,
                a: 1.0,
            },
            recording_config,
        })
    }

    /// Current surface size in pixels
    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Reconfigure the surface and rebuild size-dependent targets
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return; // Minimized
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.post.resize(&self.device, &self.queue, width, height);
        log::debug!("Resized render targets to {}x{}", width, height);
    }

    /// Upload this frame's particle instances
    pub fn update_instances(&self, instances: &InstanceBuffer) -> Result<(), RenderError> {
        if instances.len() != self.geometry.instance_count {
            return Err(RenderError::InstanceCount {
                expected: self.geometry.instance_count,
                got: instances.len(),
            });
        }
        self.queue
            .write_buffer(&self.geometry.instances, 0, instances.as_bytes());
        Ok(())
    }

    /// Update scene uniforms
    pub fn update_uniforms(&self, uniforms: &SceneUniforms) {
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[*uniforms]));
    }

    /// Render a frame (and optionally capture if recording)
    pub fn render(&self, frame_num: usize) -> Result<(), RenderError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: self.post.scene_view(),
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.post.depth_view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);

            // Opaque ground first so the additive passes depth-test against it
            if let Some(ground) = &self.geometry.ground {
                render_pass.set_pipeline(&self.ground_pipeline);
                render_pass.set_vertex_buffer(0, ground.slice(..));
                render_pass.draw(0..6, 0..1);
            }

            render_pass.set_pipeline(&self.star_pipeline);
            render_pass.set_vertex_buffer(0, self.geometry.stars.slice(..));
            render_pass.draw(0..self.geometry.star_count, 0..1);

            render_pass.set_pipeline(&self.particle_pipeline);
            render_pass.set_vertex_buffer(0, self.geometry.shape.slice(..));
            render_pass.set_vertex_buffer(1, self.geometry.instances.slice(..));
            render_pass.draw(
                0..self.geometry.shape_vertex_count,
                0..self.geometry.instance_count as u32,
            );
        }

        self.post.encode(&mut encoder, &view);
        self.queue.submit(std::iter::once(encoder.finish()));

        // Capture frame if recording
        let captured = match &self.recording_config {
            Some(config) => {
                capture::save_frame(&self.device, &self.queue, &output.texture, frame_num, config)
            }
            None => Ok(()),
        };

        output.present();
        captured
    }
}

struct ScenePass<'a> {
    label: &'a str,
    shader: &'a wgpu::ShaderModule,
    buffers: &'a [wgpu::VertexBufferLayout<'a>],
    topology: wgpu::PrimitiveTopology,
    cull_mode: Option<wgpu::Face>,
    blend: Option<wgpu::BlendState>,
    depth_write: bool,
}

fn scene_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    pass: ScenePass<'_>,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(pass.label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: pass.shader,
            entry_point: Some("vs_main"),
            buffers: pass.buffers,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: pass.shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: HDR_FORMAT,
                blend: pass.blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: pass.topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: pass.cull_mode,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: pass.depth_write,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioBands;

    #[test]
    fn test_scene_uniforms_layout() {
        assert_eq!(std::mem::size_of::<SceneUniforms>(), 176);
        assert_eq!(std::mem::size_of::<SceneUniforms>() % 16, 0);
    }

    #[test]
    fn test_scene_uniforms_pack_context() {
        let params = SceneParams::hyperdrive();
        let mut ctx = RenderContext::new(&params);
        ctx.field_rotation = 0.5;
        ctx.light.pulse(&AudioBands {
            bass: 1.0,
            mid: 0.0,
            high: 0.0,
        });

        let uniforms = SceneUniforms::new(Mat4::IDENTITY, &ctx, &params, 2.0);
        assert_eq!(uniforms.camera_pos[3], 2.0);
        assert_eq!(uniforms.light_position[3], ctx.light.intensity);
        assert_eq!(uniforms.light_color[3], 0.5);
        assert_eq!(uniforms.fog_range[0], params.fog.near);
        assert!(uniforms.fog_range[2] > 0.0);
    }

    #[test]
    fn test_no_ground_means_no_reflection() {
        let params = SceneParams::classic();
        let ctx = RenderContext::new(&params);
        let uniforms = SceneUniforms::new(Mat4::IDENTITY, &ctx, &params, 0.0);
        assert_eq!(uniforms.fog_range[2], 0.0);
    }

    #[test]
    fn test_instance_layout_covers_instance_raw() {
        let layout = instance_layout();
        assert_eq!(layout.array_stride, 80);
        assert_eq!(layout.attributes.len(), 5);
        assert_eq!(layout.attributes[4].offset, 64);
    }
}
