//! GPU resources for one field system: instance buffers, uniforms, pipeline.

use wgpu::util::DeviceExt;

use super::{DEPTH_FORMAT, HDR_FORMAT};
use crate::field::{BlendMode, FieldSystem, FieldUniforms, PipelineConfig};

/// Instance buffers plus the pipeline that draws them.
pub(crate) struct FieldGpu {
    position_buffer: wgpu::Buffer,
    color_buffer: wgpu::Buffer,
    attribute_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    pipeline: wgpu::RenderPipeline,
    count: u32,
}

impl FieldGpu {
    pub fn new(
        device: &wgpu::Device,
        camera_layout: &wgpu::BindGroupLayout,
        field_layout: &wgpu::BindGroupLayout,
        field: &FieldSystem,
    ) -> Self {
        let position_buffer = instance_buffer(device, "Field Positions", field.positions());
        let color_buffer = instance_buffer(device, "Field Colors", field.colors());
        let attribute_buffer = instance_buffer(device, "Field Attributes", &field.attributes());

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Field Uniform Buffer"),
            contents: bytemuck::bytes_of(field.uniforms()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Field Bind Group"),
            layout: field_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline = create_pipeline(device, camera_layout, field_layout, &field.pipeline());

        Self {
            position_buffer,
            color_buffer,
            attribute_buffer,
            uniform_buffer,
            bind_group,
            pipeline,
            count: field.count() as u32,
        }
    }

    pub fn write_positions(&self, queue: &wgpu::Queue, positions: &[f32]) {
        if self.count > 0 {
            queue.write_buffer(&self.position_buffer, 0, bytemuck::cast_slice(positions));
        }
    }

    pub fn write_colors(&self, queue: &wgpu::Queue, colors: &[f32]) {
        if self.count > 0 {
            queue.write_buffer(&self.color_buffer, 0, bytemuck::cast_slice(colors));
        }
    }

    pub fn write_uniforms(&self, queue: &wgpu::Queue, uniforms: &FieldUniforms) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniforms));
    }

    /// Record the draw. Camera bind group must already be set at group 0.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        if self.count == 0 {
            return;
        }
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(1, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, self.position_buffer.slice(..));
        pass.set_vertex_buffer(1, self.color_buffer.slice(..));
        pass.set_vertex_buffer(2, self.attribute_buffer.slice(..));
        pass.draw(0..6, 0..self.count);
    }

    pub fn destroy(self) {
        self.position_buffer.destroy();
        self.color_buffer.destroy();
        self.attribute_buffer.destroy();
        self.uniform_buffer.destroy();
    }
}

fn instance_buffer(device: &wgpu::Device, label: &str, data: &[f32]) -> wgpu::Buffer {
    // Zero-sized vertex buffers cannot be bound; keep a placeholder.
    let contents: &[f32] = if data.is_empty() { &[0.0; 4] } else { data };
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(contents),
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
    })
}

fn blend_state(mode: BlendMode) -> wgpu::BlendState {
    match mode {
        BlendMode::Additive => wgpu::BlendState {
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
        },
        BlendMode::Alpha => wgpu::BlendState::ALPHA_BLENDING,
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    camera_layout: &wgpu::BindGroupLayout,
    field_layout: &wgpu::BindGroupLayout,
    config: &PipelineConfig,
) -> wgpu::RenderPipeline {
    let vertex_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Point Vertex Shader"),
        source: wgpu::ShaderSource::Wgsl(config.vertex.source.into()),
    });
    let fragment_module = if config.fragment.source == config.vertex.source {
        None
    } else {
        Some(device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Point Fragment Shader"),
            source: wgpu::ShaderSource::Wgsl(config.fragment.source.into()),
        }))
    };

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Point Pipeline Layout"),
        bind_group_layouts: &[camera_layout, field_layout],
        push_constant_ranges: &[],
    });

    let vec3_stride = (3 * std::mem::size_of::<f32>()) as wgpu::BufferAddress;
    let vec2_stride = (2 * std::mem::size_of::<f32>()) as wgpu::BufferAddress;

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(config.label),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &vertex_module,
            entry_point: Some(config.vertex.entry_point),
            buffers: &[
                wgpu::VertexBufferLayout {
                    array_stride: vec3_stride,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &[wgpu::VertexAttribute {
                        offset: 0,
                        shader_location: 0,
                        format: wgpu::VertexFormat::Float32x3,
                    }],
                },
                wgpu::VertexBufferLayout {
                    array_stride: vec3_stride,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &[wgpu::VertexAttribute {
                        offset: 0,
                        shader_location: 1,
                        format: wgpu::VertexFormat::Float32x3,
                    }],
                },
                wgpu::VertexBufferLayout {
                    array_stride: vec2_stride,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &[wgpu::VertexAttribute {
                        offset: 0,
                        shader_location: 2,
                        format: wgpu::VertexFormat::Float32x2,
                    }],
                },
            ],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: fragment_module.as_ref().unwrap_or(&vertex_module),
            entry_point: Some(config.fragment.entry_point),
            targets: &[Some(wgpu::ColorTargetState {
                format: HDR_FORMAT,
                blend: Some(blend_state(config.blend)),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: config.depth_write,
            depth_compare: if config.depth_write {
                wgpu::CompareFunction::Less
            } else {
                wgpu::CompareFunction::Always
            },
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}
