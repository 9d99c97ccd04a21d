//! Bloom post-processing.
//!
//! The scene is drawn into an offscreen HDR texture, then:
//!
//! 1. extract: bright-pass scene into a half-resolution texture
//! 2. blur horizontally, then vertically (ping-pong between two textures)
//! 3. composite: scene + glow, tone mapped onto the surface

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use super::{DEPTH_FORMAT, HDR_FORMAT};
use crate::config::BloomConfig;
use crate::shaders::{bloom_blur_shader, bloom_composite_shader, bloom_extract_shader};

/// Layout matches `Bloom` in the bloom shaders.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct BloomUniforms {
    direction: [f32; 2],
    texel: [f32; 2],
    threshold: f32,
    strength: f32,
    radius: f32,
    _pad: f32,
}

/// Offscreen textures that depend on the surface size.
struct Targets {
    scene: wgpu::Texture,
    scene_view: wgpu::TextureView,
    depth: wgpu::Texture,
    depth_view: wgpu::TextureView,
    bright: wgpu::Texture,
    bright_view: wgpu::TextureView,
    blur: wgpu::Texture,
    blur_view: wgpu::TextureView,
}

impl Targets {
    fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let (half_w, half_h) = ((width / 2).max(1), (height / 2).max(1));
        let sampled = wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING;

        let scene = create_texture(device, "Scene HDR Texture", width, height, HDR_FORMAT, sampled);
        let depth = create_texture(
            device,
            "Scene Depth Texture",
            width,
            height,
            DEPTH_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        );
        let bright = create_texture(device, "Bloom Bright Texture", half_w, half_h, HDR_FORMAT, sampled);
        let blur = create_texture(device, "Bloom Blur Texture", half_w, half_h, HDR_FORMAT, sampled);

        Self {
            scene_view: scene.create_view(&wgpu::TextureViewDescriptor::default()),
            depth_view: depth.create_view(&wgpu::TextureViewDescriptor::default()),
            bright_view: bright.create_view(&wgpu::TextureViewDescriptor::default()),
            blur_view: blur.create_view(&wgpu::TextureViewDescriptor::default()),
            scene,
            depth,
            bright,
            blur,
        }
    }

    fn destroy(&self) {
        self.scene.destroy();
        self.depth.destroy();
        self.bright.destroy();
        self.blur.destroy();
    }
}

struct BindGroups {
    extract: wgpu::BindGroup,
    blur_h: wgpu::BindGroup,
    blur_v: wgpu::BindGroup,
    composite: wgpu::BindGroup,
}

/// Scene target plus the bloom passes that resolve it onto the surface.
pub(crate) struct BloomChain {
    config: BloomConfig,
    targets: Targets,
    sampler: wgpu::Sampler,
    layout: wgpu::BindGroupLayout,
    extract_pipeline: wgpu::RenderPipeline,
    blur_pipeline: wgpu::RenderPipeline,
    composite_pipeline: wgpu::RenderPipeline,
    extract_uniforms: wgpu::Buffer,
    blur_h_uniforms: wgpu::Buffer,
    blur_v_uniforms: wgpu::Buffer,
    groups: BindGroups,
}

impl BloomChain {
    pub fn new(
        device: &wgpu::Device,
        config: BloomConfig,
        width: u32,
        height: u32,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let targets = Targets::new(device, width, height);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Bloom Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Bloom Bind Group Layout"),
            entries: &[
                texture_entry(0),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                texture_entry(3),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Bloom Pipeline Layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let extract_pipeline = fullscreen_pipeline(
            device,
            &pipeline_layout,
            "Bloom Extract Pipeline",
            &bloom_extract_shader(),
            HDR_FORMAT,
        );
        let blur_pipeline = fullscreen_pipeline(
            device,
            &pipeline_layout,
            "Bloom Blur Pipeline",
            &bloom_blur_shader(),
            HDR_FORMAT,
        );
        let composite_pipeline = fullscreen_pipeline(
            device,
            &pipeline_layout,
            "Bloom Composite Pipeline",
            &bloom_composite_shader(),
            surface_format,
        );

        let uniform_buffer = |label, direction| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::bytes_of(&uniforms(&config, direction, width, height)),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            })
        };
        let extract_uniforms = uniform_buffer("Bloom Extract Uniforms", [0.0, 0.0]);
        let blur_h_uniforms = uniform_buffer("Bloom Blur H Uniforms", [1.0, 0.0]);
        let blur_v_uniforms = uniform_buffer("Bloom Blur V Uniforms", [0.0, 1.0]);

        let groups = create_groups(
            device,
            &layout,
            &sampler,
            &targets,
            [&extract_uniforms, &blur_h_uniforms, &blur_v_uniforms],
        );

        Self {
            config,
            targets,
            sampler,
            layout,
            extract_pipeline,
            blur_pipeline,
            composite_pipeline,
            extract_uniforms,
            blur_h_uniforms,
            blur_v_uniforms,
            groups,
        }
    }

    pub fn scene_view(&self) -> &wgpu::TextureView {
        &self.targets.scene_view
    }

    pub fn depth_view(&self) -> &wgpu::TextureView {
        &self.targets.depth_view
    }

    /// Recreate size-dependent textures and bind groups.
    pub fn resize(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, width: u32, height: u32) {
        self.targets.destroy();
        self.targets = Targets::new(device, width, height);
        self.groups = create_groups(
            device,
            &self.layout,
            &self.sampler,
            &self.targets,
            [&self.extract_uniforms, &self.blur_h_uniforms, &self.blur_v_uniforms],
        );

        for (buffer, direction) in [
            (&self.extract_uniforms, [0.0, 0.0]),
            (&self.blur_h_uniforms, [1.0, 0.0]),
            (&self.blur_v_uniforms, [0.0, 1.0]),
        ] {
            let u = uniforms(&self.config, direction, width, height);
            queue.write_buffer(buffer, 0, bytemuck::bytes_of(&u));
        }
    }

    /// Record the bloom passes, ending with a write to `output`.
    pub fn encode(&self, encoder: &mut wgpu::CommandEncoder, output: &wgpu::TextureView) {
        fullscreen_pass(encoder, "Bloom Extract Pass", &self.targets.bright_view, &self.extract_pipeline, &self.groups.extract);
        fullscreen_pass(encoder, "Bloom Blur H Pass", &self.targets.blur_view, &self.blur_pipeline, &self.groups.blur_h);
        fullscreen_pass(encoder, "Bloom Blur V Pass", &self.targets.bright_view, &self.blur_pipeline, &self.groups.blur_v);
        fullscreen_pass(encoder, "Bloom Composite Pass", output, &self.composite_pipeline, &self.groups.composite);
    }

    pub fn destroy(&self) {
        self.targets.destroy();
        self.extract_uniforms.destroy();
        self.blur_h_uniforms.destroy();
        self.blur_v_uniforms.destroy();
    }
}

fn uniforms(config: &BloomConfig, direction: [f32; 2], width: u32, height: u32) -> BloomUniforms {
    let (half_w, half_h) = ((width / 2).max(1), (height / 2).max(1));
    BloomUniforms {
        direction,
        texel: [1.0 / half_w as f32, 1.0 / half_h as f32],
        threshold: config.threshold,
        strength: config.strength,
        radius: config.radius,
        _pad: 0.0,
    }
}

fn create_texture(
    device: &wgpu::Device,
    label: &str,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
    usage: wgpu::TextureUsages,
) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage,
        view_formats: &[],
    })
}

fn create_groups(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    targets: &Targets,
    [extract, blur_h, blur_v]: [&wgpu::Buffer; 3],
) -> BindGroups {
    let group = |label, source: &wgpu::TextureView, uniforms: &wgpu::Buffer| {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(source),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: uniforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&targets.scene_view),
                },
            ],
        })
    };

    BindGroups {
        extract: group("Bloom Extract Bind Group", &targets.scene_view, extract),
        blur_h: group("Bloom Blur H Bind Group", &targets.bright_view, blur_h),
        blur_v: group("Bloom Blur V Bind Group", &targets.blur_view, blur_v),
        // Composite reads strength from the extract uniforms.
        composite: group("Bloom Composite Bind Group", &targets.bright_view, extract),
    }
}

fn fullscreen_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    label: &str,
    source: &str,
    format: wgpu::TextureFormat,
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
            buffers: &[],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
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
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

fn fullscreen_pass(
    encoder: &mut wgpu::CommandEncoder,
    label: &str,
    target: &wgpu::TextureView,
    pipeline: &wgpu::RenderPipeline,
    group: &wgpu::BindGroup,
) {
    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            resolve_target: None,
            depth_slice: None,
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
    pass.set_bind_group(0, group, &[]);
    pass.draw(0..3, 0..1);
}
