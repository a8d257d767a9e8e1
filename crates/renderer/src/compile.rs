use std::borrow::Cow;
use std::collections::HashSet;

use viewer::{DecodeError, Uniform, UniformNames};
use wgpu::naga::ShaderStage;

use crate::types::ShaderProgram;

/// Turns user fragment sources into validated [`ShaderProgram`]s.
///
/// Runs on asset watcher threads, so it only needs the uniform-name mapping
/// and never touches the GPU.
#[derive(Clone, Debug)]
pub struct ShaderCompiler {
    defines: Vec<(String, &'static str)>,
}

impl ShaderCompiler {
    pub fn new(names: &UniformNames) -> Self {
        let defines = Uniform::ALL
            .into_iter()
            .filter_map(|uniform| {
                let name = names.get(uniform);
                (!name.is_empty()).then(|| (name.to_string(), block_field(uniform)))
            })
            .collect();
        Self { defines }
    }

    /// Wraps and validates `bytes` as a fragment shader.
    pub fn compile(&self, bytes: &[u8]) -> Result<ShaderProgram, DecodeError> {
        let source = std::str::from_utf8(bytes)
            .map_err(|err| DecodeError::new(format!("shader is not valid UTF-8: {err}")))?;
        let wrapped = self.wrap(source);
        validate_fragment(&wrapped)?;
        Ok(ShaderProgram::new(wrapped))
    }

    /// Produces a self-contained GLSL fragment shader from user code.
    ///
    /// `#version` directives and `uniform` declarations of mapped names are
    /// dropped; the prelude provides both.
    pub(crate) fn wrap(&self, source: &str) -> String {
        let mapped: HashSet<&str> = self.defines.iter().map(|(name, _)| name.as_str()).collect();

        let mut body = String::with_capacity(source.len());
        for line in source.lines() {
            let trimmed = line.trim_start();
            let skip = trimmed.starts_with("#version")
                || (trimmed.starts_with("uniform ")
                    && identifiers(trimmed).any(|ident| mapped.contains(ident)));
            // Keep line numbers aligned with the user's file.
            if !skip {
                body.push_str(line);
            }
            body.push('\n');
        }

        let mut defines = String::new();
        for (name, field) in &self.defines {
            defines.push_str(&format!("#define {name} viewer.{field}\n"));
        }

        format!("{PRELUDE}{IMAGES}{defines}#line 1\n{body}{MAIN}")
    }
}

fn block_field(uniform: Uniform) -> &'static str {
    match uniform {
        Uniform::Flag => "_flag",
        Uniform::Ticks => "_ticks",
        Uniform::Time => "_time",
        Uniform::Mouse => "_mouse",
        Uniform::Slider => "_slider",
    }
}

fn identifiers(line: &str) -> impl Iterator<Item = &str> {
    line.split(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '_'))
        .filter(|token| !token.is_empty())
}

fn validate_fragment(source: &str) -> Result<(), DecodeError> {
    use wgpu::naga::front::glsl::{Frontend, Options};
    use wgpu::naga::valid::{Capabilities, ValidationFlags, Validator};

    let module = Frontend::default()
        .parse(&Options::from(ShaderStage::Fragment), source)
        .map_err(|errors| DecodeError::new(errors.emit_to_string(source)))?;
    Validator::new(ValidationFlags::all(), Capabilities::default())
        .validate(&module)
        .map_err(|error| DecodeError::new(error.emit_to_string(source)))?;
    Ok(())
}

pub(crate) fn create_fragment_module(
    device: &wgpu::Device,
    program: &ShaderProgram,
) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("viewer fragment"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(program.source().to_string()),
            stage: ShaderStage::Fragment,
            defines: &[],
        },
    })
}

/// Compiles the static full-screen triangle vertex shader.
pub(crate) fn create_vertex_module(device: &wgpu::Device) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("fullscreen triangle vertex"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(VERTEX_SHADER_GLSL),
            stage: ShaderStage::Vertex,
            defines: &[],
        },
    })
}

/// Fragment shader that copies one texture onto the current viewport.
pub(crate) fn create_blit_module(device: &wgpu::Device) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("blit fragment"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(BLIT_SHADER_GLSL),
            stage: ShaderStage::Fragment,
            defines: &[],
        },
    })
}

/// Uniform block and output declarations shared by every user shader.
///
/// The block layout must match `ViewerUniforms` in `gpu/uniforms.rs`.
const PRELUDE: &str = r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 outColor;

layout(std140, set = 0, binding = 0) uniform ViewerParams {
    vec2 _origin;
    vec2 _size;
    vec2 _mouse;
    float _time;
    float _slider;
    int _flag;
    int _ticks;
    vec2 _screen;
} viewer;

";

/// Texture bindings plus the pixel-addressed sampling helpers.
const IMAGES: &str = r"layout(set = 1, binding = 0) uniform texture2D _image0_texture;
layout(set = 1, binding = 1) uniform sampler _image0_sampler;
layout(set = 1, binding = 2) uniform texture2D _image1_texture;
layout(set = 1, binding = 3) uniform sampler _image1_sampler;
layout(set = 1, binding = 4) uniform texture2D _image2_texture;
layout(set = 1, binding = 5) uniform sampler _image2_sampler;
layout(set = 1, binding = 6) uniform texture2D _image3_texture;
layout(set = 1, binding = 7) uniform sampler _image3_sampler;

vec2 imageSrc0Size() { return vec2(textureSize(sampler2D(_image0_texture, _image0_sampler), 0)); }
vec2 imageSrc1Size() { return vec2(textureSize(sampler2D(_image1_texture, _image1_sampler), 0)); }
vec2 imageSrc2Size() { return vec2(textureSize(sampler2D(_image2_texture, _image2_sampler), 0)); }
vec2 imageSrc3Size() { return vec2(textureSize(sampler2D(_image3_texture, _image3_sampler), 0)); }

bool _outside(vec2 pixel, vec2 size) {
    return pixel.x < 0.0 || pixel.y < 0.0 || pixel.x >= size.x || pixel.y >= size.y;
}

vec4 imageSrc0At(vec2 pixel) {
    vec2 size = imageSrc0Size();
    if (_outside(pixel, size)) { return vec4(0.0); }
    return texture(sampler2D(_image0_texture, _image0_sampler), pixel / size);
}
vec4 imageSrc1At(vec2 pixel) {
    vec2 size = imageSrc1Size();
    if (_outside(pixel, size)) { return vec4(0.0); }
    return texture(sampler2D(_image1_texture, _image1_sampler), pixel / size);
}
vec4 imageSrc2At(vec2 pixel) {
    vec2 size = imageSrc2Size();
    if (_outside(pixel, size)) { return vec4(0.0); }
    return texture(sampler2D(_image2_texture, _image2_sampler), pixel / size);
}
vec4 imageSrc3At(vec2 pixel) {
    vec2 size = imageSrc3Size();
    if (_outside(pixel, size)) { return vec4(0.0); }
    return texture(sampler2D(_image3_texture, _image3_sampler), pixel / size);
}

";

/// Calls the user's `Fragment` with screen and rectangle-local positions.
const MAIN: &str = r"
void main() {
    vec4 dstPos = vec4(gl_FragCoord.xy, 0.0, 1.0);
    vec2 srcPos = gl_FragCoord.xy - viewer._origin;
    outColor = Fragment(dstPos, srcPos);
}
";

/// Minimal full-screen triangle vertex shader.
const VERTEX_SHADER_GLSL: &str = r"#version 450
layout(location = 0) out vec2 v_uv;

const vec2 positions[3] = vec2[3](
    vec2(-1.0, -3.0),
    vec2(3.0, 1.0),
    vec2(-1.0, 1.0)
);

void main() {
    uint vertex_index = uint(gl_VertexIndex);
    vec2 pos = positions[vertex_index];
    v_uv = vec2(pos.x * 0.5 + 0.5, 0.5 - pos.y * 0.5);
    gl_Position = vec4(pos, 0.0, 1.0);
}
";

const BLIT_SHADER_GLSL: &str = r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 outColor;

layout(set = 0, binding = 0) uniform texture2D source_texture;
layout(set = 0, binding = 1) uniform sampler source_sampler;

void main() {
    outColor = texture(sampler2D(source_texture, source_sampler), v_uv);
}
";

#[cfg(test)]
mod tests {
    use super::*;

    use crate::types::IMAGE_SLOTS;

    const RIPPLE: &str = r#"
#version 330
uniform float Time;
uniform vec2 Mouse;
uniform float TimeScale;

vec4 Fragment(vec4 dstPos, vec2 srcPos) {
    float wave = sin(Time * TimeScale + srcPos.x * 0.1) * 0.5 + 0.5;
    vec4 base = imageSrc0At(srcPos);
    return mix(base, vec4(wave, Slider, float(Flag), 1.0), 0.5);
}
"#;

    #[test]
    fn strips_mapped_uniforms_only() {
        let wrapped = ShaderCompiler::new(&UniformNames::default()).wrap(RIPPLE);
        assert!(!wrapped.contains("uniform float Time;"));
        assert!(!wrapped.contains("uniform vec2 Mouse;"));
        assert!(wrapped.contains("uniform float TimeScale;"));
        assert!(!wrapped.contains("#version 330"));
        assert!(wrapped.contains("#define Time viewer._time"));
        assert!(wrapped.contains("#define Slider viewer._slider"));
    }

    #[test]
    fn renamed_and_disabled_uniforms() {
        let names = UniformNames {
            flag: "Toggle".into(),
            ticks: String::new(),
            ..UniformNames::default()
        };
        let wrapped = ShaderCompiler::new(&names).wrap("vec4 Fragment(vec4 d, vec2 s) { return vec4(0.0); }");
        assert!(wrapped.contains("#define Toggle viewer._flag"));
        assert!(!wrapped.contains("#define Flag "));
        assert!(!wrapped.contains("viewer._ticks\n"));
    }

    #[test]
    fn user_lines_keep_their_numbers() {
        let wrapped = ShaderCompiler::new(&UniformNames::default()).wrap("a\nuniform int Flag;\nb\n");
        let after = wrapped.split("#line 1\n").nth(1).unwrap();
        let lines: Vec<&str> = after.lines().take(3).collect();
        assert_eq!(lines, vec!["a", "", "b"]);
    }

    #[test]
    fn compiles_valid_shader() {
        let source = r#"
vec4 Fragment(vec4 dstPos, vec2 srcPos) {
    float pulse = 0.5 + 0.5 * sin(Time);
    vec2 size = imageSrc0Size();
    vec4 color = imageSrc0At(srcPos) + imageSrc3At(Mouse);
    if (Ticks > 10 && Flag == 1) {
        color = vec4(color.rgb * pulse * Slider, color.a);
    }
    return color + vec4(size / 1000.0, 0.0, 0.0);
}
"#;
        let program = ShaderCompiler::new(&UniformNames::default())
            .compile(source.as_bytes())
            .expect("shader should validate");
        assert!(program.source().contains("void main()"));
    }

    #[test]
    fn rejects_syntax_errors() {
        let err = ShaderCompiler::new(&UniformNames::default())
            .compile(b"vec4 Fragment(vec4 dstPos, vec2 srcPos) { return vec4(; }")
            .unwrap_err();
        assert!(!err.message().is_empty());
    }

    #[test]
    fn rejects_missing_entry_function() {
        assert!(ShaderCompiler::new(&UniformNames::default())
            .compile(b"float helper(float x) { return x; }")
            .is_err());
    }

    #[test]
    fn every_slot_has_helpers() {
        for slot in 0..IMAGE_SLOTS {
            assert!(IMAGES.contains(&format!("vec4 imageSrc{slot}At(vec2 pixel)")));
            assert!(IMAGES.contains(&format!("vec2 imageSrc{slot}Size()")));
        }
    }

    #[test]
    fn rejects_non_utf8() {
        let err = ShaderCompiler::new(&UniformNames::default())
            .compile(&[0xff, 0xfe, 0x00])
            .unwrap_err();
        assert!(err.message().contains("UTF-8"));
    }
}
