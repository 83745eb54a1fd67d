//! Renderer: wgpu device/surface state, mesh registry and the shader
//! program / uniform pipeline.
//! wgpu = 26.x, winit = 0.30.x

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use wgpu::{
    Backends, CommandEncoder, CommandEncoderDescriptor, Device, DeviceDescriptor, Extent3d,
    Features, Instance, InstanceDescriptor, Limits, LoadOp, Operations, PowerPreference,
    PresentMode, Queue, RenderPass, RenderPassColorAttachment, RenderPassDescriptor, StoreOp,
    Surface, SurfaceConfiguration, SurfaceError, SurfaceTexture, TextureDescriptor,
    TextureDimension, TextureFormat, TextureUsages, TextureView, TextureViewDescriptor,
};

use winit::{dpi::PhysicalSize, window::Window};

pub mod program;
pub mod reflect;
pub mod registry;
pub mod texture;

pub use program::{SCENE_SHADER, ShaderProgram};
pub use reflect::{CompiledShader, compile_shader};
pub use registry::{MeshDescriptor, MeshRegistry};
pub use texture::GpuTexture;

const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

/// GPU device, surface and depth state. Owns no geometry or pipelines;
/// those belong to [`MeshRegistry`] and [`ShaderProgram`].
pub struct Gpu {
    surface: Surface<'static>,
    surface_format: TextureFormat,
    surface_config: SurfaceConfiguration,

    device: Device,
    queue: Queue,

    depth_view: TextureView,

    width: u32,
    height: u32,
}

/// One frame in flight: the surface texture plus the command encoder the
/// scene records its passes into.
pub struct FrameCtx {
    frame: SurfaceTexture,
    view: TextureView,
    encoder: CommandEncoder,
}

impl Gpu {
    /// Create GPU state bound to an `Arc<Window>`.
    pub async fn new(window: Arc<Window>, backends: Backends) -> Result<Self> {
        let PhysicalSize { width, height } = window.inner_size();
        let width = width.max(1);
        let height = height.max(1);

        let instance = Instance::new(&InstanceDescriptor {
            backends,
            ..Default::default()
        });
        let surface: Surface<'static> = instance
            .create_surface(window.clone())
            .context("create_surface failed")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| anyhow!("no suitable GPU adapter: {e}"))?;

        let (device, queue) = adapter
            .request_device(&DeviceDescriptor {
                label: Some("Veles3D Device"),
                required_features: Features::empty(),
                required_limits: Limits::downlevel_webgl2_defaults()
                    .using_resolution(adapter.limits()),
                memory_hints: Default::default(),
                trace: Default::default(),
            })
            .await
            .context("request_device failed")?;

        // Surface format (prefer sRGB)
        let caps = surface.get_capabilities(&adapter);
        let surface_format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(caps.formats[0]);

        let surface_config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: PresentMode::AutoVsync,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let depth_view = create_depth_view(&device, &surface_config);

        log::info!("GPU ready: {:?}, surface {}x{}", surface_format, width, height);

        Ok(Self {
            surface,
            surface_format,
            surface_config,
            device,
            queue,
            depth_view,
            width,
            height,
        })
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> TextureFormat {
        self.surface_format
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    /// Resize: reconfigure surface & recreate depth view.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.surface_config.width = self.width;
        self.surface_config.height = self.height;
        self.surface.configure(&self.device, &self.surface_config);
        self.depth_view = create_depth_view(&self.device, &self.surface_config);
    }

    /// Acquire the next surface texture and a fresh command encoder.
    pub fn begin_frame(&mut self) -> Result<FrameCtx, SurfaceError> {
        let frame = self.surface.get_current_texture()?;
        let view = frame.texture.create_view(&Default::default());
        let encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("MainEncoder"),
            });
        Ok(FrameCtx {
            frame,
            view,
            encoder,
        })
    }

    /// Submit the recorded commands and present the frame.
    pub fn end_frame(&mut self, ctx: FrameCtx) {
        self.queue.submit(Some(ctx.encoder.finish()));
        ctx.frame.present();
    }

    pub fn is_surface_lost(err: &SurfaceError) -> bool {
        matches!(err, SurfaceError::Lost | SurfaceError::Outdated)
    }

    pub fn recreate_surface(&mut self) {
        self.resize(self.width, self.height);
    }
}

impl FrameCtx {
    /// Begin the forward pass: clear color + depth, draw on top.
    pub fn clear_pass(&mut self, gpu: &Gpu, clear: wgpu::Color) -> RenderPass<'static> {
        self.encoder
            .begin_render_pass(&RenderPassDescriptor {
                label: Some("ForwardPass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &self.view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(clear),
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &gpu.depth_view,
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            })
            .forget_lifetime()
    }
}

/// Create a depth texture view matching the surface config.
fn create_depth_view(device: &Device, sc: &SurfaceConfiguration) -> TextureView {
    let tex = device.create_texture(&TextureDescriptor {
        label: Some("DepthTex"),
        size: Extent3d {
            width: sc.width.max(1),
            height: sc.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    tex.create_view(&TextureViewDescriptor::default())
}
