//! WGSL sources for the point sprites and the bloom chain.
//!
//! Uniform struct layouts here must match [`FieldUniforms`](crate::field::FieldUniforms),
//! [`CameraUniforms`](crate::backend::CameraUniforms) and the bloom uniforms in
//! `gpu::bloom` byte for byte.

/// Instanced point sprites: one quad (6 vertices) per instance.
///
/// Vertex inputs (all per-instance):
/// - location 0: position `vec3`
/// - location 1: color `vec3`
/// - location 2: `(size, phase random)`
pub const POINT_SHADER: &str = r#"
struct Camera {
    view_proj: mat4x4<f32>,
    viewport: vec2<f32>,
    point_scale: f32,
    _pad: f32,
};

struct Field {
    model: mat4x4<f32>,
    time: f32,
    opacity: f32,
    size_scale: f32,
    wobble: f32,
    twinkle: f32,
    _pad0: f32,
    _pad1: f32,
    _pad2: f32,
};

@group(0) @binding(0)
var<uniform> camera: Camera;

@group(1) @binding(0)
var<uniform> field: Field;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec3<f32>,
    @location(1) uv: vec2<f32>,
    @location(2) alpha: f32,
};

@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    @location(0) position: vec3<f32>,
    @location(1) color: vec3<f32>,
    @location(2) attrs: vec2<f32>,
) -> VertexOutput {
    var quad_vertices = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>( 1.0,  1.0),
    );
    let quad_pos = quad_vertices[vertex_index];
    let phase = attrs.y * 6.2831853;

    let drift = vec3<f32>(
        sin(field.time * 0.9 + phase),
        cos(field.time * 0.7 + phase * 1.3),
        sin(field.time * 0.5 + phase * 0.7),
    ) * field.wobble;

    let world = field.model * vec4<f32>(position + drift, 1.0);
    var clip_pos = camera.view_proj * world;

    // Offset before the perspective divide so sprites shrink with distance.
    let twinkle = 1.0 + field.twinkle * sin(field.time * 2.0 + phase);
    let size = attrs.x * field.size_scale * twinkle * camera.point_scale;
    clip_pos.x += quad_pos.x * size / camera.viewport.x;
    clip_pos.y += quad_pos.y * size / camera.viewport.y;

    var out: VertexOutput;
    out.clip_position = clip_pos;
    out.color = color;
    out.uv = quad_pos;
    out.alpha = field.opacity;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let dist = length(in.uv);
    if dist > 1.0 {
        discard;
    }
    let glow = 1.0 - smoothstep(0.0, 1.0, dist);
    return vec4<f32>(in.color, glow * in.alpha);
}
"#;

/// Shared fullscreen-triangle vertex stage and bindings for the bloom passes.
const BLOOM_COMMON: &str = r#"
struct Bloom {
    direction: vec2<f32>,
    texel: vec2<f32>,
    threshold: f32,
    strength: f32,
    radius: f32,
    _pad: f32,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@group(0) @binding(0)
var source: texture_2d<f32>;
@group(0) @binding(1)
var source_sampler: sampler;
@group(0) @binding(2)
var<uniform> bloom: Bloom;
@group(0) @binding(3)
var scene: texture_2d<f32>;

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32) -> VertexOutput {
    var positions = array<vec2<f32>, 3>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(3.0, -1.0),
        vec2<f32>(-1.0, 3.0),
    );
    var uvs = array<vec2<f32>, 3>(
        vec2<f32>(0.0, 1.0),
        vec2<f32>(2.0, 1.0),
        vec2<f32>(0.0, -1.0),
    );

    var out: VertexOutput;
    out.clip_position = vec4<f32>(positions[vertex_index], 0.0, 1.0);
    out.uv = uvs[vertex_index];
    return out;
}
"#;

const BLOOM_EXTRACT_FS: &str = r#"
@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let color = textureSample(source, source_sampler, in.uv).rgb;
    let luma = dot(color, vec3<f32>(0.2126, 0.7152, 0.0722));
    let bright = max(luma - bloom.threshold, 0.0) / max(luma, 0.0001);
    return vec4<f32>(color * bright, 1.0);
}
"#;

const BLOOM_BLUR_FS: &str = r#"
@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    var weights = array<f32, 5>(0.227027, 0.1945946, 0.1216216, 0.054054, 0.016216);
    let stride = bloom.direction * bloom.texel * bloom.radius;
    var result = textureSample(source, source_sampler, in.uv).rgb * weights[0];
    for (var i = 1; i < 5; i++) {
        let offset = stride * f32(i);
        result += textureSample(source, source_sampler, in.uv + offset).rgb * weights[i];
        result += textureSample(source, source_sampler, in.uv - offset).rgb * weights[i];
    }
    return vec4<f32>(result, 1.0);
}
"#;

const BLOOM_COMPOSITE_FS: &str = r#"
@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let base = textureSample(scene, source_sampler, in.uv).rgb;
    let glow = textureSample(source, source_sampler, in.uv).rgb;
    let hdr = base + glow * bloom.strength;
    // Reinhard keeps additive hot spots from clipping to flat white.
    let mapped = hdr / (hdr + vec3<f32>(1.0));
    return vec4<f32>(mapped, 1.0);
}
"#;

/// Bright-pass: keeps the part of each pixel above the luminance threshold.
pub fn bloom_extract_shader() -> String {
    format!("{BLOOM_COMMON}{BLOOM_EXTRACT_FS}")
}

/// Separable 9-tap gaussian along `bloom.direction`.
pub fn bloom_blur_shader() -> String {
    format!("{BLOOM_COMMON}{BLOOM_BLUR_FS}")
}

/// Adds the blurred glow onto the scene and tone maps to the surface.
pub fn bloom_composite_shader() -> String {
    format!("{BLOOM_COMMON}{BLOOM_COMPOSITE_FS}")
}
