//! wgpu renderer for the tree and its decor.
//!
//! Both layers draw instanced quads (six vertices per particle) with additive
//! blending and no depth buffer. Each static attribute lives in its own vertex
//! buffer, uploaded once; only the uniform buffer changes per frame.

use std::sync::Arc;

use glam::Vec3;
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::decor::{DecorBuffers, DECOR_WGSL};
use crate::error::GpuError;
use crate::generator::ParticleBuffers;
use crate::shading::PARTICLE_WGSL;
use crate::uniforms::GpuUniforms;

/// Vertices per particle quad.
const QUAD_VERTICES: u32 = 6;

/// `src * alpha + dst`, the glow look.
const ADDITIVE_BLENDING: wgpu::BlendState = wgpu::BlendState {
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

const fn attribute(location: u32, format: wgpu::VertexFormat) -> [wgpu::VertexAttribute; 1] {
    [wgpu::VertexAttribute {
        format,
        offset: 0,
        shader_location: location,
    }]
}

// rest, expanded, color, brightness, size, phase
const PARTICLE_ATTRIBUTES: [[wgpu::VertexAttribute; 1]; 6] = [
    attribute(0, wgpu::VertexFormat::Float32x3),
    attribute(1, wgpu::VertexFormat::Float32x3),
    attribute(2, wgpu::VertexFormat::Float32x3),
    attribute(3, wgpu::VertexFormat::Float32),
    attribute(4, wgpu::VertexFormat::Float32),
    attribute(5, wgpu::VertexFormat::Float32),
];

// origin, random, speed, layer
const DECOR_ATTRIBUTES: [[wgpu::VertexAttribute; 1]; 4] = [
    attribute(0, wgpu::VertexFormat::Float32x3),
    attribute(1, wgpu::VertexFormat::Float32),
    attribute(2, wgpu::VertexFormat::Float32),
    attribute(3, wgpu::VertexFormat::Uint32),
];

/// One pipeline plus its per-attribute instance buffers.
struct PointLayer {
    pipeline: wgpu::RenderPipeline,
    buffers: Vec<wgpu::Buffer>,
    count: u32,
}

impl PointLayer {
    fn draw<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>) {
        pass.set_pipeline(&self.pipeline);
        for (slot, buffer) in self.buffers.iter().enumerate() {
            pass.set_vertex_buffer(slot as u32, buffer.slice(..));
        }
        pass.draw(0..QUAD_VERTICES, 0..self.count);
    }
}

pub struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    particles: PointLayer,
    decor: Option<PointLayer>,
    clear_color: wgpu::Color,
}

impl GpuState {
    /// Set up the device and upload the static buffers.
    ///
    /// `particles` must not be empty; decor may be.
    pub async fn new(
        window: Arc<Window>,
        particles: &ParticleBuffers,
        decor: &DecorBuffers,
        background: Vec3,
    ) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let info = adapter.get_info();
        tracing::info!(target: "gpu", adapter = %info.name, backend = ?info.backend, "adapter selected");

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Device"),
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
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(GpuError::NoAdapter)?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Uniform Buffer"),
            size: std::mem::size_of::<GpuUniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Uniform Bind Group Layout"),
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
            label: Some("Uniform Bind Group"),
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Point Pipeline Layout"),
            bind_group_layouts: &[&uniform_bind_group_layout],
            push_constant_ranges: &[],
        });

        let particle_layer = PointLayer {
            pipeline: point_pipeline(
                &device,
                &pipeline_layout,
                config.format,
                "Particle",
                PARTICLE_WGSL,
                &[
                    instance_layout(12, &PARTICLE_ATTRIBUTES[0]),
                    instance_layout(12, &PARTICLE_ATTRIBUTES[1]),
                    instance_layout(12, &PARTICLE_ATTRIBUTES[2]),
                    instance_layout(4, &PARTICLE_ATTRIBUTES[3]),
                    instance_layout(4, &PARTICLE_ATTRIBUTES[4]),
                    instance_layout(4, &PARTICLE_ATTRIBUTES[5]),
                ],
            ),
            buffers: vec![
                instance_buffer(&device, "Rest Positions", bytemuck::cast_slice(particles.rest_positions())),
                instance_buffer(&device, "Expanded Positions", bytemuck::cast_slice(particles.expanded_positions())),
                instance_buffer(&device, "Colors", bytemuck::cast_slice(particles.colors())),
                instance_buffer(&device, "Brightness", bytemuck::cast_slice(particles.brightness())),
                instance_buffer(&device, "Sizes", bytemuck::cast_slice(particles.sizes())),
                instance_buffer(&device, "Random Phases", bytemuck::cast_slice(particles.random_phases())),
            ],
            count: instance_count(particles.len()),
        };

        let decor_layer = (!decor.is_empty()).then(|| PointLayer {
            pipeline: point_pipeline(
                &device,
                &pipeline_layout,
                config.format,
                "Decor",
                DECOR_WGSL,
                &[
                    instance_layout(12, &DECOR_ATTRIBUTES[0]),
                    instance_layout(4, &DECOR_ATTRIBUTES[1]),
                    instance_layout(4, &DECOR_ATTRIBUTES[2]),
                    instance_layout(4, &DECOR_ATTRIBUTES[3]),
                ],
            ),
            buffers: vec![
                instance_buffer(&device, "Decor Origins", bytemuck::cast_slice(decor.origins())),
                instance_buffer(&device, "Decor Randoms", bytemuck::cast_slice(decor.randoms())),
                instance_buffer(&device, "Decor Speeds", bytemuck::cast_slice(decor.speeds())),
                instance_buffer(&device, "Decor Layers", bytemuck::cast_slice(decor.layers())),
            ],
            count: instance_count(decor.len()),
        });

        tracing::info!(
            target: "gpu",
            particles = particle_layer.count,
            decor = decor_layer.as_ref().map_or(0, |l| l.count),
            format = ?config.format,
            "buffers uploaded"
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            uniform_buffer,
            uniform_bind_group,
            particles: particle_layer,
            decor: decor_layer,
            clear_color: wgpu::Color {
                r: background.x as f64,
                g: background.y as f64,
                b: background.z as f64,
                a: 1.0,
            },
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Reconfigure the surface at its current size, after it was lost.
    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    pub fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height.max(1) as f32
    }

    /// Surface size in pixels.
    pub fn viewport(&self) -> [f32; 2] {
        [self.config.width as f32, self.config.height as f32]
    }

    pub fn render(&mut self, uniforms: &GpuUniforms) -> Result<(), wgpu::SurfaceError> {
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniforms));

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
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            if let Some(decor) = &self.decor {
                decor.draw(&mut render_pass);
            }
            self.particles.draw(&mut render_pass);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

fn instance_count(len: usize) -> u32 {
    // Population sizes are validated against u32 before generation.
    u32::try_from(len).unwrap_or(u32::MAX)
}

fn instance_buffer(device: &wgpu::Device, label: &str, contents: &[u8]) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents,
        usage: wgpu::BufferUsages::VERTEX,
    })
}

fn instance_layout(stride: u64, attributes: &[wgpu::VertexAttribute]) -> wgpu::VertexBufferLayout<'_> {
    wgpu::VertexBufferLayout {
        array_stride: stride,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes,
    }
}

fn point_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    format: wgpu::TextureFormat,
    label: &str,
    source: &str,
    buffers: &[wgpu::VertexBufferLayout<'_>],
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(ADDITIVE_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}
