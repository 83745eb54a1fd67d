//! Shader program and per-draw uniform pipeline.
//!
//! A [`ShaderProgram`] owns one render pipeline plus the reflected uniform
//! layout resolved at reset time and reused for every draw. Per-draw values
//! (MVP, model-space light direction, light colors) go through one
//! dynamic-offset uniform buffer with a fixed-stride slot per draw call.

use std::collections::HashMap;
use std::num::NonZeroU64;

use anyhow::Result;
use glam::{Mat4, Vec3};
use wgpu::{
    BindGroup, BindGroupDescriptor, BindGroupEntry, BindGroupLayout, BindGroupLayoutDescriptor,
    BindGroupLayoutEntry, BindingResource, BindingType, BlendState, Buffer, BufferBindingType,
    BufferDescriptor, BufferUsages, ColorTargetState, ColorWrites, DepthBiasState,
    DepthStencilState, FragmentState, PipelineLayoutDescriptor, RenderPass, RenderPipeline,
    RenderPipelineDescriptor, Sampler, SamplerDescriptor, ShaderModuleDescriptor, ShaderSource,
    ShaderStages, TextureSampleType, TextureViewDimension, VertexState,
};

use corelib::lights::LightList;
use corelib::transform::{model_matrix, rotation_matrix, world_dir_to_model};

use crate::reflect::{CompiledShader, GlobalsBlock, UniformMember};
use crate::registry::{MeshDescriptor, VERTEX_LAYOUT};
use crate::texture::GpuTexture;
use crate::{DEPTH_FORMAT, Gpu};

/// Per-draw uniform slots available per frame; draws beyond this are
/// dropped with a warning.
pub const MAX_DRAWS_PER_FRAME: u32 = 256;

/// The WGSL source of the stock forward-lighting shader.
pub const SCENE_SHADER: &str = include_str!("shaders/scene.wgsl");

/// Shader program with cached uniform layout and draw state. Starts null;
/// [`ShaderProgram::reset`] installs a compiled shader.
#[derive(Default)]
pub struct ShaderProgram {
    state: Option<ProgramState>,
    view_projection: Mat4,
    lights: LightList,
}

struct ProgramState {
    pipeline: RenderPipeline,
    globals: Option<GlobalsState>,
    texture: Option<TextureState>,
}

struct GlobalsState {
    block: GlobalsBlock,
    buffer: Buffer,
    bind_group: BindGroup,
    stride: u32,
    slot: u32,
    staging: Vec<u8>,
}

struct TextureState {
    layout: BindGroupLayout,
    sampler: Sampler,
    bind_groups: HashMap<u64, BindGroup>,
}

impl ShaderProgram {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` when no program is installed; all operations are no-ops then.
    pub fn is_null(&self) -> bool {
        self.state.is_none()
    }

    /// Replace the active pipeline, discarding any previous one, and
    /// re-resolve the uniform layout. `None` clears to the null state.
    pub fn reset(&mut self, gpu: &Gpu, compiled: Option<CompiledShader>) {
        self.state = compiled.map(|shader| build_state(gpu, shader));
    }

    /// Rewind the per-draw uniform slot cursor. Call once per frame before
    /// the first draw.
    pub fn begin_frame(&mut self) {
        if let Some(globals) = self.state.as_mut().and_then(|s| s.globals.as_mut()) {
            globals.slot = 0;
        }
    }

    /// Assign the pipeline to the render pass.
    pub fn use_in(&self, rpass: &mut RenderPass<'_>) {
        if let Some(state) = &self.state {
            rpass.set_pipeline(&state.pipeline);
        }
    }

    /// Set the view-projection matrix used by subsequent draws.
    pub fn set_view_projection(&mut self, view_projection: Mat4) {
        self.view_projection = view_projection;
    }

    /// Set the lights used by subsequent draws.
    pub fn set_light_list(&mut self, lights: LightList) {
        self.lights = lights;
    }

    /// Bind a texture for subsequent draws. Skipped silently when the shader
    /// samples no texture.
    pub fn bind_texture(&mut self, gpu: &Gpu, rpass: &mut RenderPass<'_>, texture: &GpuTexture) {
        let Some(tex_state) = self.state.as_mut().and_then(|s| s.texture.as_mut()) else {
            return;
        };
        let bind_group = tex_state
            .bind_groups
            .entry(texture.id())
            .or_insert_with(|| {
                gpu.device().create_bind_group(&BindGroupDescriptor {
                    label: Some("Material BG"),
                    layout: &tex_state.layout,
                    entries: &[
                        BindGroupEntry {
                            binding: 0,
                            resource: BindingResource::TextureView(texture.view()),
                        },
                        BindGroupEntry {
                            binding: 1,
                            resource: BindingResource::Sampler(&tex_state.sampler),
                        },
                    ],
                })
            });
        rpass.set_bind_group(1, &*bind_group, &[]);
    }

    /// Draw one mesh instance.
    ///
    /// Model matrix is scale, then roll (Z, around `(0,0,-1)`), then pitch
    /// (X), then yaw (Y), then translation. The directional light is handed
    /// to the shader in the mesh's local frame via the inverse of the
    /// rotation-only submatrix.
    pub fn draw(
        &mut self,
        gpu: &Gpu,
        rpass: &mut RenderPass<'_>,
        mesh: &MeshDescriptor,
        translate: Vec3,
        rotate: Vec3,
        scale: Vec3,
    ) {
        let Some(state) = self.state.as_mut() else {
            return;
        };

        if let Some(globals) = state.globals.as_mut() {
            if globals.slot >= MAX_DRAWS_PER_FRAME {
                log::warn!("per-frame draw budget exhausted, dropping draw");
                return;
            }

            let mvp = self.view_projection * model_matrix(translate, rotate, scale);
            let light_dir = world_dir_to_model(rotate, self.lights.directional.direction);

            write_member(
                &mut globals.staging,
                globals.block.mvp,
                bytemuck::bytes_of(&mvp.to_cols_array_2d()),
            );
            write_member(
                &mut globals.staging,
                globals.block.light_direction,
                bytemuck::bytes_of(&light_dir.extend(0.0).to_array()),
            );
            write_member(
                &mut globals.staging,
                globals.block.light_color,
                bytemuck::bytes_of(&self.lights.directional.color.extend(1.0).to_array()),
            );
            write_member(
                &mut globals.staging,
                globals.block.ambient_color,
                bytemuck::bytes_of(&self.lights.ambient.color.extend(1.0).to_array()),
            );

            let offset = globals.slot * globals.stride;
            gpu.queue()
                .write_buffer(&globals.buffer, u64::from(offset), &globals.staging);
            rpass.set_bind_group(0, &globals.bind_group, &[offset]);
            globals.slot += 1;
        }

        let first = mesh.first_index();
        rpass.draw_indexed(first..first + mesh.index_count, mesh.base_vertex, 0..1);
    }
}

/// Copy `bytes` into the staging block at the member's reflected offset.
/// Unfound members are skipped; a shorter member truncates the write.
fn write_member(staging: &mut [u8], member: Option<UniformMember>, bytes: &[u8]) {
    let Some(member) = member else {
        return;
    };
    let len = bytes.len().min(member.size as usize);
    let offset = member.offset as usize;
    staging[offset..offset + len].copy_from_slice(&bytes[..len]);
}

fn build_state(gpu: &Gpu, shader: CompiledShader) -> ProgramState {
    let device = gpu.device();
    let module = device.create_shader_module(ShaderModuleDescriptor {
        label: Some("Scene WGSL"),
        source: ShaderSource::Wgsl(shader.source.into()),
    });

    let globals = shader
        .interface
        .globals
        .filter(|block| block.block_size > 0)
        .map(|block| build_globals(gpu, block));

    let texture = shader
        .interface
        .has_texture
        .then(|| build_texture_state(gpu));

    // Bind group layouts are positional; group 0 must exist even when the
    // shader only samples a texture at group 1.
    let empty_bgl;
    let mut layouts: Vec<&BindGroupLayout> = Vec::new();
    match &globals {
        Some(g) => layouts.push(&g.layout),
        None => {
            empty_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
                label: Some("Empty BGL"),
                entries: &[],
            });
            if texture.is_some() {
                layouts.push(&empty_bgl);
            }
        }
    }
    if let Some(t) = &texture {
        layouts.push(&t.layout);
    }

    let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
        label: Some("Scene PipelineLayout"),
        bind_group_layouts: &layouts,
        push_constant_ranges: &[],
    });

    let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some("Scene Pipeline"),
        layout: Some(&pipeline_layout),
        vertex: VertexState {
            module: &module,
            entry_point: Some("vs_main"),
            buffers: &[VERTEX_LAYOUT],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(FragmentState {
            module: &module,
            entry_point: Some("fs_main"),
            targets: &[Some(ColorTargetState {
                format: gpu.surface_format(),
                blend: Some(BlendState::REPLACE),
                write_mask: ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            cull_mode: Some(wgpu::Face::Back),
            ..Default::default()
        },
        depth_stencil: Some(DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    });

    ProgramState {
        pipeline,
        globals: globals.map(|g| g.state),
        texture,
    }
}

struct BuiltGlobals {
    layout: BindGroupLayout,
    state: GlobalsState,
}

fn build_globals(gpu: &Gpu, block: GlobalsBlock) -> BuiltGlobals {
    let device = gpu.device();
    let block_size = block.block_size;

    let align = device.limits().min_uniform_buffer_offset_alignment;
    let stride = block_size.div_ceil(align) * align;

    let layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some("Globals BGL"),
        entries: &[BindGroupLayoutEntry {
            binding: 0,
            visibility: ShaderStages::VERTEX_FRAGMENT,
            ty: BindingType::Buffer {
                ty: BufferBindingType::Uniform,
                has_dynamic_offset: true,
                min_binding_size: NonZeroU64::new(u64::from(block_size)),
            },
            count: None,
        }],
    });

    let buffer = device.create_buffer(&BufferDescriptor {
        label: Some("Globals UBO"),
        size: u64::from(stride) * u64::from(MAX_DRAWS_PER_FRAME),
        usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let bind_group = device.create_bind_group(&BindGroupDescriptor {
        label: Some("Globals BG"),
        layout: &layout,
        entries: &[BindGroupEntry {
            binding: 0,
            resource: BindingResource::Buffer(wgpu::BufferBinding {
                buffer: &buffer,
                offset: 0,
                size: NonZeroU64::new(u64::from(block_size)),
            }),
        }],
    });

    BuiltGlobals {
        layout,
        state: GlobalsState {
            block,
            buffer,
            bind_group,
            stride,
            slot: 0,
            staging: vec![0u8; block_size as usize],
        },
    }
}

fn build_texture_state(gpu: &Gpu) -> TextureState {
    let device = gpu.device();
    let layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some("Material BGL"),
        entries: &[
            BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::FRAGMENT,
                ty: BindingType::Texture {
                    sample_type: TextureSampleType::Float { filterable: true },
                    view_dimension: TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            BindGroupLayoutEntry {
                binding: 1,
                visibility: ShaderStages::FRAGMENT,
                ty: BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    });

    // Nearest filtering and edge clamping, matching the source art.
    let sampler = device.create_sampler(&SamplerDescriptor {
        label: Some("Material Sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Nearest,
        min_filter: wgpu::FilterMode::Nearest,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    });

    TextureState {
        layout,
        sampler,
        bind_groups: HashMap::new(),
    }
}
