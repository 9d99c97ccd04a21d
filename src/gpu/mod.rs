//! wgpu implementation of [`RenderBackend`].

mod bloom;
mod points;

use std::collections::BTreeMap;
use std::sync::Arc;

use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::backend::{CameraUniforms, FieldHandle, RenderBackend};
use crate::config::BloomConfig;
use crate::error::GpuError;
use crate::field::{FieldSystem, FieldUniforms};

use bloom::BloomChain;
use points::FieldGpu;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.0,
    g: 0.0,
    b: 0.008,
    a: 1.0,
};

/// Window-backed renderer: instanced point sprites into an HDR target,
/// resolved through bloom onto the swapchain.
pub struct WgpuBackend {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    camera_layout: wgpu::BindGroupLayout,
    field_layout: wgpu::BindGroupLayout,
    fields: BTreeMap<FieldHandle, FieldGpu>,
    next_handle: u32,
    bloom: BloomChain,
    released: bool,
}

impl WgpuBackend {
    pub async fn new(window: Arc<Window>, bloom: BloomConfig) -> Result<Self, GpuError> {
        let size = window.inner_size();
        let (width, height) = (size.width.max(1), size.height.max(1));

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
            .await?;

        let info = adapter.get_info();
        tracing::info!(adapter = %info.name, backend = ?info.backend, "GPU adapter selected");

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Backdrop Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .or_else(|| surface_caps.formats.first().copied())
            .unwrap_or(wgpu::TextureFormat::Bgra8UnormSrgb);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let uniform_entry = wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Camera Bind Group Layout"),
            entries: &[uniform_entry],
        });
        let field_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Field Bind Group Layout"),
            entries: &[uniform_entry],
        });

        let camera = CameraUniforms::new(glam::Mat4::IDENTITY, width, height);
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Uniform Buffer"),
            contents: bytemuck::bytes_of(&camera),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let bloom = BloomChain::new(&device, bloom, width, height, surface_format);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            camera_buffer,
            camera_bind_group,
            camera_layout,
            field_layout,
            fields: BTreeMap::new(),
            next_handle: 0,
            bloom,
            released: false,
        })
    }

    fn field(&self, handle: FieldHandle) -> Result<&FieldGpu, GpuError> {
        if self.released {
            return Err(GpuError::Released);
        }
        self.fields.get(&handle).ok_or(GpuError::UnknownField(handle))
    }

    fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }
}

impl RenderBackend for WgpuBackend {
    fn create_field(&mut self, field: &FieldSystem) -> Result<FieldHandle, GpuError> {
        if self.released {
            return Err(GpuError::Released);
        }
        let gpu = FieldGpu::new(&self.device, &self.camera_layout, &self.field_layout, field);
        let handle = FieldHandle(self.next_handle);
        self.next_handle += 1;
        self.fields.insert(handle, gpu);
        tracing::debug!(?handle, kind = ?field.kind(), count = field.count(), "field uploaded");
        Ok(handle)
    }

    fn write_positions(&mut self, handle: FieldHandle, positions: &[f32]) -> Result<(), GpuError> {
        self.field(handle)?.write_positions(&self.queue, positions);
        Ok(())
    }

    fn write_colors(&mut self, handle: FieldHandle, colors: &[f32]) -> Result<(), GpuError> {
        self.field(handle)?.write_colors(&self.queue, colors);
        Ok(())
    }

    fn set_field_uniforms(&mut self, handle: FieldHandle, uniforms: &FieldUniforms) -> Result<(), GpuError> {
        self.field(handle)?.write_uniforms(&self.queue, uniforms);
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        if self.released || width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.reconfigure();
        self.bloom.resize(&self.device, &self.queue, width, height);
    }

    fn render(&mut self, camera: &CameraUniforms) -> Result<(), GpuError> {
        if self.released {
            return Err(GpuError::Released);
        }

        self.queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(camera));

        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(e @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                self.reconfigure();
                return Err(e.into());
            }
            Err(e) => return Err(e.into()),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Backdrop Encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: self.bloom.scene_view(),
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.bloom.depth_view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_bind_group(0, &self.camera_bind_group, &[]);
            // Handles are issued in mount order: stars, nebula, particles.
            for field in self.fields.values() {
                field.draw(&mut pass);
            }
        }

        self.bloom.encode(&mut encoder, &view);

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    fn release_field(&mut self, handle: FieldHandle) {
        match self.fields.remove(&handle) {
            Some(field) => field.destroy(),
            None => tracing::warn!(?handle, "release of unknown field ignored"),
        }
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        for (_, field) in std::mem::take(&mut self.fields) {
            field.destroy();
        }
        self.bloom.destroy();
        self.camera_buffer.destroy();
        tracing::debug!("GPU resources released");
    }
}
