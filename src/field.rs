//! Field systems: independently owned groups of rendered points.
//!
//! Three kinds make up the backdrop:
//!
//! | Kind | Positions | Per-frame change |
//! |------|-----------|------------------|
//! | [`FieldKind::Stars`] | uniform on a sphere | twinkle via `time` uniform |
//! | [`FieldKind::Nebula`] | uniform on a sphere | slow rotation |
//! | [`FieldKind::Particles`] | driven by the active pattern | wobble via `time` uniform |
//!
//! A field owns its CPU-side buffers and uniforms. Uploading them is the
//! job of a [`RenderBackend`](crate::backend::RenderBackend); dirty flags
//! tell the engine which buffers changed since the last upload.

use std::f32::consts::TAU;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3};
use rand::Rng;

use crate::config::NebulaLayer;
use crate::shaders::POINT_SHADER;

/// Which part of the backdrop a field draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Stars,
    Nebula { layer: usize },
    Particles,
}

/// How overlapping points combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// Colors sum, so dense regions glow.
    #[default]
    Additive,
    /// Standard alpha blending.
    Alpha,
}

/// One programmable stage: WGSL source plus entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderStage {
    pub source: &'static str,
    pub entry_point: &'static str,
}

/// Everything a backend needs to build the draw pipeline for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    pub label: &'static str,
    pub vertex: ShaderStage,
    pub fragment: ShaderStage,
    pub blend: BlendMode,
    pub depth_write: bool,
}

/// Per-field uniform block. Layout matches `Field` in the point shader.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct FieldUniforms {
    pub model: [[f32; 4]; 4],
    pub time: f32,
    pub opacity: f32,
    pub size_scale: f32,
    /// Positional drift amplitude in world units.
    pub wobble: f32,
    /// Relative size oscillation.
    pub twinkle: f32,
    pub _pad: [f32; 3],
}

impl FieldUniforms {
    fn new(opacity: f32, wobble: f32, twinkle: f32) -> Self {
        Self {
            model: Mat4::IDENTITY.to_cols_array_2d(),
            time: 0.0,
            opacity,
            size_scale: 1.0,
            wobble,
            twinkle,
            _pad: [0.0; 3],
        }
    }
}

/// A point group with its buffers and uniforms.
#[derive(Debug, Clone)]
pub struct FieldSystem {
    kind: FieldKind,
    count: usize,
    positions: Vec<f32>,
    colors: Vec<f32>,
    sizes: Vec<f32>,
    randoms: Vec<f32>,
    uniforms: FieldUniforms,
    blend: BlendMode,
    rotation: Vec3,
    rotation_rate: Vec3,
    positions_dirty: bool,
    colors_dirty: bool,
}

impl FieldSystem {
    fn empty(kind: FieldKind, count: usize, uniforms: FieldUniforms) -> Self {
        Self {
            kind,
            count,
            positions: vec![0.0; count * 3],
            colors: vec![0.0; count * 3],
            sizes: vec![0.0; count],
            randoms: vec![0.0; count],
            uniforms,
            blend: BlendMode::default(),
            rotation: Vec3::ZERO,
            rotation_rate: Vec3::ZERO,
            positions_dirty: true,
            colors_dirty: true,
        }
    }

    /// Background stars on a sphere shell with cool hues.
    pub fn starfield<R: Rng + ?Sized>(count: usize, radius: f32, rng: &mut R) -> Self {
        let mut field = Self::empty(FieldKind::Stars, count, FieldUniforms::new(0.9, 0.0, 0.3));
        for i in 0..count {
            let p = random_on_sphere(rng, radius);
            let hue = rng.gen_range(0.55..0.70);
            let saturation = rng.gen_range(0.6..0.9);
            let lightness = rng.gen_range(0.65..0.9);
            let c = hsl_to_rgb(hue, saturation, lightness);

            field.positions[i * 3..i * 3 + 3].copy_from_slice(&p.to_array());
            field.colors[i * 3..i * 3 + 3].copy_from_slice(&c.to_array());
            field.sizes[i] = rng.gen_range(1.0..3.0);
            field.randoms[i] = rng.gen();
        }
        field
    }

    /// One decorative nebula shell.
    pub fn nebula<R: Rng + ?Sized>(index: usize, layer: &NebulaLayer, rng: &mut R) -> Self {
        let mut field = Self::empty(
            FieldKind::Nebula { layer: index },
            layer.count,
            FieldUniforms::new(layer.opacity, 0.0, 0.0),
        );
        field.rotation_rate = layer.rotation_rate();
        for i in 0..layer.count {
            let p = random_on_sphere(rng, layer.radius);
            let hue = rng.gen_range(0.72..0.92);
            let c = hsl_to_rgb(hue, rng.gen_range(0.5..0.8), rng.gen_range(0.4..0.6));

            field.positions[i * 3..i * 3 + 3].copy_from_slice(&p.to_array());
            field.colors[i * 3..i * 3 + 3].copy_from_slice(&c.to_array());
            field.sizes[i] = if layer.max_size > layer.min_size {
                rng.gen_range(layer.min_size..layer.max_size)
            } else {
                layer.max_size
            };
            field.randoms[i] = rng.gen();
        }
        field
    }

    /// The morphing particle system. Positions start at the origin and are
    /// written by the transition controller.
    pub fn particles<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Self {
        let mut field = Self::empty(FieldKind::Particles, count, FieldUniforms::new(0.85, 0.3, 0.0));
        for i in 0..count {
            field.sizes[i] = rng.gen_range(0.5..2.0);
            field.randoms[i] = rng.gen();
        }
        field
    }

    /// Override how this field's points combine with what is behind them.
    pub fn with_blend(mut self, blend: BlendMode) -> Self {
        self.blend = blend;
        self
    }

    #[inline]
    pub fn blend(&self) -> BlendMode {
        self.blend
    }

    #[inline]
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    /// Mutable positions. Marks the buffer for re-upload.
    pub fn positions_mut(&mut self) -> &mut [f32] {
        self.positions_dirty = true;
        &mut self.positions
    }

    #[inline]
    pub fn colors(&self) -> &[f32] {
        &self.colors
    }

    /// Mutable colors. Marks the buffer for re-upload.
    pub fn colors_mut(&mut self) -> &mut [f32] {
        self.colors_dirty = true;
        &mut self.colors
    }

    #[inline]
    pub fn sizes(&self) -> &[f32] {
        &self.sizes
    }

    #[inline]
    pub fn randoms(&self) -> &[f32] {
        &self.randoms
    }

    /// Interleaved `(size, random)` pairs as the vertex stage expects them.
    pub fn attributes(&self) -> Vec<f32> {
        self.sizes
            .iter()
            .zip(&self.randoms)
            .flat_map(|(&s, &r)| [s, r])
            .collect()
    }

    #[inline]
    pub fn uniforms(&self) -> &FieldUniforms {
        &self.uniforms
    }

    #[inline]
    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    /// Feed elapsed seconds to the shader (twinkle and wobble).
    pub fn update_uniform(&mut self, time: f32) {
        self.uniforms.time = time;
    }

    /// Advance the per-frame rotation and refresh the model matrix.
    pub fn rotate_step(&mut self) {
        self.rotation += self.rotation_rate;
        let q = Quat::from_euler(glam::EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z);
        self.uniforms.model = Mat4::from_quat(q).to_cols_array_2d();
    }

    /// Returns `(positions_dirty, colors_dirty)` and clears both flags.
    pub fn take_dirty(&mut self) -> (bool, bool) {
        let flags = (self.positions_dirty, self.colors_dirty);
        self.positions_dirty = false;
        self.colors_dirty = false;
        flags
    }

    pub fn pipeline(&self) -> PipelineConfig {
        let label = match self.kind {
            FieldKind::Stars => "Starfield Pipeline",
            FieldKind::Nebula { .. } => "Nebula Pipeline",
            FieldKind::Particles => "Particle Pipeline",
        };
        PipelineConfig {
            label,
            vertex: ShaderStage {
                source: POINT_SHADER,
                entry_point: "vs_main",
            },
            fragment: ShaderStage {
                source: POINT_SHADER,
                entry_point: "fs_main",
            },
            blend: self.blend,
            depth_write: false,
        }
    }
}

/// Uniform point on a sphere surface via inverse-transform sampling.
pub fn random_on_sphere<R: Rng + ?Sized>(rng: &mut R, radius: f32) -> Vec3 {
    let theta = TAU * rng.gen::<f32>();
    let phi = (2.0 * rng.gen::<f32>() - 1.0).clamp(-1.0, 1.0).acos();
    Vec3::new(
        radius * phi.sin() * theta.cos(),
        radius * phi.sin() * theta.sin(),
        radius * phi.cos(),
    )
}

/// HSL in `[0, 1]` to linear RGB.
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> Vec3 {
    if s <= 0.0 {
        return Vec3::splat(l);
    }
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    let channel = |t: f32| {
        let t = t.rem_euclid(1.0);
        if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        }
    };
    Vec3::new(channel(h + 1.0 / 3.0), channel(h), channel(h - 1.0 / 3.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_uniform_layout_matches_shader() {
        // mat4 + 8 scalars
        assert_eq!(std::mem::size_of::<FieldUniforms>(), 96);
    }

    #[test]
    fn test_starfield_on_sphere() {
        let mut rng = StdRng::seed_from_u64(1);
        let stars = FieldSystem::starfield(500, 800.0, &mut rng);
        assert_eq!(stars.positions().len(), 1500);
        assert_eq!(stars.colors().len(), 1500);
        for p in stars.positions().chunks_exact(3) {
            let r = Vec3::from_slice(p).length();
            assert!((r - 800.0).abs() < 0.1);
        }
        // Cool band: blue channel dominates red
        for c in stars.colors().chunks_exact(3) {
            assert!(c[2] >= c[0]);
        }
    }

    #[test]
    fn test_nebula_respects_layer() {
        let mut rng = StdRng::seed_from_u64(2);
        let layer = NebulaLayer::new(300, 8.0, 5.0, 600.0, 0.3).with_rotation_rate(0.1, 0.2, 0.0);
        let nebula = FieldSystem::nebula(1, &layer, &mut rng);
        assert_eq!(nebula.count(), 300);
        assert_eq!(nebula.kind(), FieldKind::Nebula { layer: 1 });
        assert_eq!(nebula.uniforms().opacity, 0.3);
        assert!(nebula.sizes().iter().all(|&s| (5.0..8.0).contains(&s)));
    }

    #[test]
    fn test_nebula_rotation_accumulates() {
        let mut rng = StdRng::seed_from_u64(2);
        let layer = NebulaLayer::new(10, 8.0, 5.0, 600.0, 0.3).with_rotation_rate(0.1, 0.2, 0.0);
        let mut nebula = FieldSystem::nebula(0, &layer, &mut rng);
        nebula.rotate_step();
        nebula.rotate_step();
        assert!((nebula.rotation() - Vec3::new(0.2, 0.4, 0.0)).length() < 1e-6);
        assert_ne!(nebula.uniforms().model, Mat4::IDENTITY.to_cols_array_2d());
    }

    #[test]
    fn test_particles_start_at_origin() {
        let mut rng = StdRng::seed_from_u64(3);
        let particles = FieldSystem::particles(40, &mut rng);
        assert!(particles.positions().iter().all(|&v| v == 0.0));
        assert_eq!(particles.attributes().len(), 80);
        assert!(particles.uniforms().wobble > 0.0);
    }

    #[test]
    fn test_dirty_flags() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut particles = FieldSystem::particles(4, &mut rng);
        assert_eq!(particles.take_dirty(), (true, true));
        assert_eq!(particles.take_dirty(), (false, false));
        particles.positions_mut()[0] = 1.0;
        assert_eq!(particles.take_dirty(), (true, false));
    }

    #[test]
    fn test_update_uniform_sets_time() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut stars = FieldSystem::starfield(4, 10.0, &mut rng);
        stars.update_uniform(12.5);
        assert_eq!(stars.uniforms().time, 12.5);
    }

    #[test]
    fn test_hsl_primaries() {
        assert!((hsl_to_rgb(0.0, 1.0, 0.5) - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-5);
        assert!((hsl_to_rgb(1.0 / 3.0, 1.0, 0.5) - Vec3::new(0.0, 1.0, 0.0)).length() < 1e-5);
        assert_eq!(hsl_to_rgb(0.3, 0.0, 0.4), Vec3::splat(0.4));
    }

    #[test]
    fn test_pipeline_is_additive_without_depth_writes() {
        let mut rng = StdRng::seed_from_u64(3);
        let field = FieldSystem::particles(1, &mut rng);
        let pipeline = field.pipeline();
        assert_eq!(pipeline.blend, BlendMode::Additive);
        assert!(!pipeline.depth_write);
    }

    #[test]
    fn test_blend_override_reaches_pipeline() {
        let mut rng = StdRng::seed_from_u64(3);
        let field = FieldSystem::starfield(3, 10.0, &mut rng).with_blend(BlendMode::Alpha);
        assert_eq!(field.blend(), BlendMode::Alpha);
        assert_eq!(field.pipeline().blend, BlendMode::Alpha);
        assert_eq!(field.pipeline().label, "Starfield Pipeline");
    }
}
