//! WGSL compilation and interface reflection.
//!
//! The shader program never hard-codes its uniform layout: the uniform block
//! at group 0 binding 0 is reflected once per reset, and each known member
//! name resolves to a byte range or to "not found". Writes to unfound
//! members are skipped, so a shader that omits a uniform still draws.

use anyhow::{Result, anyhow, bail};
use naga::{
    AddressSpace, Module, ShaderStage, TypeInner,
    front::wgsl,
    valid::{Capabilities, ValidationFlags, Validator},
};

/// Byte range of one member inside the uniform block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UniformMember {
    pub offset: u32,
    pub size: u32,
}

/// Reflected layout of the uniform block at `@group(0) @binding(0)`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GlobalsBlock {
    pub block_size: u32,
    pub mvp: Option<UniformMember>,
    pub light_direction: Option<UniformMember>,
    pub light_color: Option<UniformMember>,
    pub ambient_color: Option<UniformMember>,
}

/// Everything the pipeline builder needs to know about a shader module.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShaderInterface {
    /// `None` when the shader declares no uniform block at group 0.
    pub globals: Option<GlobalsBlock>,
    /// Texture + sampler pair at `@group(1)` bindings 0/1.
    pub has_texture: bool,
}

/// A validated shader with its reflected interface, ready for
/// [`crate::ShaderProgram::reset`].
#[derive(Clone, Debug)]
pub struct CompiledShader {
    pub source: String,
    pub interface: ShaderInterface,
}

/// Parse, validate and reflect a WGSL module containing both stages
/// (`vs_main`/`fs_main`). Failures surface the full compiler diagnostic and
/// yield no program.
pub fn compile_shader(source: &str) -> Result<CompiledShader> {
    let module = wgsl::parse_str(source)
        .map_err(|e| anyhow!("shader compile failed:\n{}", e.emit_to_string(source)))?;

    Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .map_err(|e| anyhow!("shader validation failed:\n{}", e.emit_to_string(source)))?;

    require_entry_point(&module, ShaderStage::Vertex, "vs_main")?;
    require_entry_point(&module, ShaderStage::Fragment, "fs_main")?;

    let interface = reflect_interface(&module);
    Ok(CompiledShader {
        source: source.to_owned(),
        interface,
    })
}

fn require_entry_point(module: &Module, stage: ShaderStage, name: &str) -> Result<()> {
    let found = module
        .entry_points
        .iter()
        .any(|ep| ep.stage == stage && ep.name == name);
    if !found {
        bail!("{stage:?} stage: missing entry point `{name}`");
    }
    Ok(())
}

fn reflect_interface(module: &Module) -> ShaderInterface {
    let mut globals = None;
    let mut has_texture = false;
    let mut has_sampler = false;

    for (_, var) in module.global_variables.iter() {
        let Some(binding) = &var.binding else {
            continue;
        };
        let inner = &module.types[var.ty].inner;

        if var.space == AddressSpace::Uniform && binding.group == 0 && binding.binding == 0 {
            globals = reflect_globals(module, inner);
        }
        if binding.group == 1 && binding.binding == 0 {
            has_texture = matches!(inner, TypeInner::Image { .. });
        }
        if binding.group == 1 && binding.binding == 1 {
            has_sampler = matches!(inner, TypeInner::Sampler { .. });
        }
    }

    ShaderInterface {
        globals,
        has_texture: has_texture && has_sampler,
    }
}

fn reflect_globals(module: &Module, inner: &TypeInner) -> Option<GlobalsBlock> {
    let TypeInner::Struct { members, span } = inner else {
        return None;
    };

    let mut block = GlobalsBlock {
        block_size: *span,
        ..Default::default()
    };
    for member in members {
        let size = module.types[member.ty].inner.size(module.to_ctx());
        let located = Some(UniformMember {
            offset: member.offset,
            size,
        });
        match member.name.as_deref() {
            Some("mvp") => block.mvp = located,
            Some("light_direction") => block.light_direction = located,
            Some("light_color") => block.light_color = located,
            Some("ambient_color") => block.ambient_color = located,
            _ => {}
        }
    }
    Some(block)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = include_str!("shaders/scene.wgsl");

    #[test]
    fn scene_shader_reflects_every_member() {
        let compiled = compile_shader(FULL).expect("scene shader compiles");
        let globals = compiled.interface.globals.expect("globals block");
        assert!(compiled.interface.has_texture);

        let mvp = globals.mvp.expect("mvp");
        assert_eq!(mvp.offset, 0);
        assert_eq!(mvp.size, 64);
        assert!(globals.light_direction.is_some());
        assert!(globals.light_color.is_some());
        assert!(globals.ambient_color.is_some());
        assert!(globals.block_size >= 112);
    }

    #[test]
    fn missing_member_resolves_to_not_found() {
        let src = "\
struct Globals {
    mvp: mat4x4<f32>,
    light_direction: vec4<f32>,
    light_color: vec4<f32>,
};
@group(0) @binding(0) var<uniform> globals: Globals;

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return globals.mvp * vec4<f32>(position, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return globals.light_color * max(-globals.light_direction.y, 0.0);
}
";
        let compiled = compile_shader(src).unwrap();
        let globals = compiled.interface.globals.unwrap();
        assert!(globals.mvp.is_some());
        assert!(globals.ambient_color.is_none());
        assert!(!compiled.interface.has_texture);
    }

    #[test]
    fn shader_without_globals_has_empty_interface() {
        let src = "\
@vertex
fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(position, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0);
}
";
        let compiled = compile_shader(src).unwrap();
        assert!(compiled.interface.globals.is_none());
        assert!(!compiled.interface.has_texture);
    }

    #[test]
    fn missing_fragment_entry_point_fails() {
        let src = "\
@vertex
fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(position, 1.0);
}
";
        let err = compile_shader(src).unwrap_err();
        assert!(err.to_string().contains("fs_main"));
    }

    #[test]
    fn syntax_error_surfaces_the_diagnostic() {
        let err = compile_shader("fn broken(").unwrap_err();
        assert!(err.to_string().contains("shader compile failed"));
    }
}
