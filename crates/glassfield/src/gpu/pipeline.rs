use std::borrow::Cow;

use wgpu::util::DeviceExt;

use crate::error::SessionError;
use crate::shaders::{self, Stage, QUAD_POSITIONS, QUAD_TEX_COORDS};
use crate::types::ShaderVariant;
use crate::uniforms::GlassUniforms;

/// Everything created by a successful compile: the linked pipeline, the two
/// static quad buffers, and the uniform buffer with its bind group.
pub(crate) struct QuadProgram {
    pub pipeline: wgpu::RenderPipeline,
    pub positions: wgpu::Buffer,
    pub tex_coords: wgpu::Buffer,
    pub uniform_buffer: wgpu::Buffer,
    pub uniform_bind_group: wgpu::BindGroup,
}

impl QuadProgram {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        variant: ShaderVariant,
    ) -> Result<Self, SessionError> {
        let fragment_source = shaders::fragment_source(variant);
        check_stage(Stage::Vertex, variant, shaders::vertex_source())?;
        check_stage(Stage::Fragment, variant, &fragment_source)?;

        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let vertex_module = compile_shader(
            device,
            "glass quad vertex",
            Stage::Vertex,
            Cow::Borrowed(shaders::vertex_source()),
        );
        let fragment_module = compile_shader(
            device,
            "glass fragment",
            Stage::Fragment,
            Cow::Owned(fragment_source),
        );

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("glass uniform layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<GlassUniforms>() as u64,
                    ),
                },
                count: None,
            }],
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("glass uniforms"),
            size: std::mem::size_of::<GlassUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("glass uniform bind group"),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let positions = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("glass quad positions"),
            contents: bytemuck::cast_slice(&QUAD_POSITIONS),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let tex_coords = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("glass quad texcoords"),
            contents: bytemuck::cast_slice(&QUAD_TEX_COORDS),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("glass pipeline layout"),
            bind_group_layouts: &[&uniform_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("glass pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vertex_module,
                entry_point: Some("main"),
                buffers: &[
                    vertex_slot(&POSITION_ATTRIBUTES),
                    vertex_slot(&TEX_COORD_ATTRIBUTES),
                ],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
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
            fragment: Some(wgpu::FragmentState {
                module: &fragment_module,
                entry_point: Some("main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview: None,
            cache: None,
        });

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            positions.destroy();
            tex_coords.destroy();
            uniform_buffer.destroy();
            return Err(SessionError::Link {
                variant,
                log: err.to_string(),
            });
        }

        Ok(Self {
            pipeline,
            positions,
            tex_coords,
            uniform_buffer,
            uniform_bind_group,
        })
    }

    pub fn write_uniforms(&self, queue: &wgpu::Queue, uniforms: &GlassUniforms) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniforms));
    }

    pub fn encode(&self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("glass pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.positions.slice(..));
        render_pass.set_vertex_buffer(1, self.tex_coords.slice(..));
        render_pass.draw(0..QUAD_POSITIONS.len() as u32, 0..1);
    }

    /// Destroys the buffers now instead of waiting for the last handle drop.
    pub fn destroy(self) {
        self.positions.destroy();
        self.tex_coords.destroy();
        self.uniform_buffer.destroy();
    }
}

fn check_stage(stage: Stage, variant: ShaderVariant, source: &str) -> Result<(), SessionError> {
    shaders::validate(stage, source).map_err(|log| SessionError::Compile {
        stage,
        variant,
        log,
    })
}

fn compile_shader(
    device: &wgpu::Device,
    label: &str,
    stage: Stage,
    source: Cow<'static, str>,
) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Glsl {
            shader: source,
            stage: stage.naga(),
            defines: &[],
        },
    })
}

const POSITION_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];
const TEX_COORD_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![1 => Float32x2];

fn vertex_slot(attributes: &'static [wgpu::VertexAttribute]) -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes,
    }
}
