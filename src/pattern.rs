//! Procedural point-cloud patterns.
//!
//! Each [`Pattern`] pairs a shape generator with a three-color [`Palette`].
//! Generators are pure apart from the RNG they are handed: the same seed
//! always produces the same cloud. Every generator returns exactly the
//! requested number of points, normalized into the display volume.
//!
//! ```ignore
//! use cosmic_backdrop::pattern::Pattern;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let cloud = Pattern::CosmicWeb.generate(15_000, 70.0, &mut rng);
//! assert_eq!(cloud.len(), 15_000);
//! ```

use std::f32::consts::{PI, TAU};

use glam::{Quat, Vec3};
use rand::Rng;

use crate::normalize::normalize;

/// Radians between successive twist offsets on the torus knot.
const GOLDEN_ANGLE: f32 = 2.399_963;

/// An ordered, fixed-length set of points making up one shape.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointCloud {
    points: Vec<Vec3>,
}

impl PointCloud {
    /// Wrap already generated points. No normalization is applied.
    pub fn new(points: Vec<Vec3>) -> Self {
        Self { points }
    }

    /// Number of points.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The points in generation order. Index `i` takes palette color `i % 3`.
    #[inline]
    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    /// Iterate over the points in generation order.
    pub fn iter(&self) -> impl Iterator<Item = &Vec3> {
        self.points.iter()
    }

    /// Flatten into `x, y, z, x, y, z, ...` for buffer upload.
    pub fn to_flat(&self) -> Vec<f32> {
        self.points.iter().flat_map(|p| p.to_array()).collect()
    }
}

/// Three colors assigned to points round-robin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette(pub [Vec3; 3]);

impl Palette {
    /// Color for the point at `index`: `palette[index % 3]`.
    #[inline]
    pub fn color(&self, index: usize) -> Vec3 {
        self.0[index % self.0.len()]
    }

    /// Flat RGB buffer for `count` points.
    pub fn fill(&self, count: usize) -> Vec<f32> {
        (0..count).flat_map(|i| self.color(i).to_array()).collect()
    }
}

/// The fixed cycle of shapes the main particle system morphs between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pattern {
    /// Braided (3, 5) torus knot.
    TorusKnot,
    /// Several tilted ellipses with random eccentricity.
    EllipticalOrbits,
    /// A single closed loop whose radius and height ripple.
    WaveOrbit,
    /// Bézier filaments strung between random anchors.
    CosmicWeb,
}

impl Pattern {
    /// Cycle order. Transitions walk this array and wrap around.
    pub const ALL: [Pattern; 4] = [
        Pattern::TorusKnot,
        Pattern::EllipticalOrbits,
        Pattern::WaveOrbit,
        Pattern::CosmicWeb,
    ];

    /// Pattern at position `index` in the cycle (wrapping).
    pub fn from_index(index: usize) -> Pattern {
        Self::ALL[index % Self::ALL.len()]
    }

    /// Stable kebab-case name, used in log events and bench ids.
    pub fn name(&self) -> &'static str {
        match self {
            Pattern::TorusKnot => "torus-knot",
            Pattern::EllipticalOrbits => "elliptical-orbits",
            Pattern::WaveOrbit => "wave-orbit",
            Pattern::CosmicWeb => "cosmic-web",
        }
    }

    /// The three colors this pattern's particles cycle through.
    pub fn palette(&self) -> Palette {
        match self {
            Pattern::TorusKnot => Palette([
                Vec3::new(0.545, 0.361, 0.965), // Violet
                Vec3::new(0.235, 0.510, 0.965), // Azure
                Vec3::new(0.925, 0.282, 0.600), // Magenta
            ]),
            Pattern::EllipticalOrbits => Palette([
                Vec3::new(0.063, 0.725, 0.506), // Emerald
                Vec3::new(0.024, 0.714, 0.831), // Cyan
                Vec3::new(0.376, 0.647, 0.980), // Sky
            ]),
            Pattern::WaveOrbit => Palette([
                Vec3::new(0.976, 0.451, 0.086), // Amber
                Vec3::new(0.918, 0.702, 0.031), // Gold
                Vec3::new(0.937, 0.267, 0.267), // Crimson
            ]),
            Pattern::CosmicWeb => Palette([
                Vec3::new(0.659, 0.333, 0.969), // Purple
                Vec3::new(0.859, 0.153, 0.467), // Rose
                Vec3::new(0.388, 0.400, 0.945), // Indigo
            ]),
        }
    }

    /// Generate `count` points for this pattern, normalized so the largest
    /// bounding-box side equals `target_size`.
    pub fn generate<R: Rng + ?Sized>(&self, count: usize, target_size: f32, rng: &mut R) -> PointCloud {
        let mut points = match self {
            Pattern::TorusKnot => torus_knot(count),
            Pattern::EllipticalOrbits => elliptical_orbits(count, 8, rng),
            Pattern::WaveOrbit => wave_orbit(count, rng),
            Pattern::CosmicWeb => cosmic_web(count, 15, rng),
        };
        pad_cyclic(&mut points, count, rng);
        normalize(&mut points, target_size);
        PointCloud::new(points)
    }
}

/// Grow `points` to exactly `count` entries by cloning earlier points with a
/// small random scale perturbation. An empty input pads with the origin.
pub fn pad_cyclic<R: Rng + ?Sized>(points: &mut Vec<Vec3>, count: usize, rng: &mut R) {
    points.truncate(count);
    let source_len = points.len();
    if source_len == 0 {
        points.resize(count, Vec3::ZERO);
        return;
    }
    let mut i = 0;
    while points.len() < count {
        let scale = 1.0 + rng.gen_range(-0.02..0.02);
        let p = points[i % source_len] * scale;
        points.push(p);
        i += 1;
    }
}

fn jitter<R: Rng + ?Sized>(rng: &mut R, amount: f32) -> Vec3 {
    Vec3::new(
        rng.gen_range(-amount..=amount),
        rng.gen_range(-amount..=amount),
        rng.gen_range(-amount..=amount),
    )
}

fn torus_knot(count: usize) -> Vec<Vec3> {
    let (p, q) = (3.0_f32, 5.0_f32);
    let (major, tube) = (10.0_f32, 4.0_f32);
    let twist = 0.8_f32;

    (0..count)
        .map(|i| {
            let t = i as f32 / count as f32 * TAU;
            let r = major + tube * (q * t).cos();
            let base = Vec3::new(r * (p * t).cos(), r * (p * t).sin(), tube * (q * t).sin());

            // Offset around the curve so the knot reads as a braid, not a wire.
            let a = i as f32 * GOLDEN_ANGLE;
            let radial = Vec3::new((p * t).cos(), (p * t).sin(), 0.0);
            base + radial * (twist * a.cos()) + Vec3::Z * (twist * a.sin())
        })
        .collect()
}

fn elliptical_orbits<R: Rng + ?Sized>(count: usize, num_orbits: usize, rng: &mut R) -> Vec<Vec3> {
    let per_orbit = (count / num_orbits).max(1);
    let mut points = Vec::with_capacity(count);

    'orbits: for orbit in 0..num_orbits {
        let a = rng.gen_range(18.0..32.0_f32);
        let e = rng.gen_range(0.1..0.7_f32);
        let b = a * (1.0 - e * e).sqrt();
        let tilt = Quat::from_rotation_x(rng.gen_range(-PI..PI)) * Quat::from_rotation_z(rng.gen_range(-PI..PI));

        for j in 0..per_orbit {
            if points.len() == count {
                break 'orbits;
            }
            let theta = j as f32 / per_orbit as f32 * TAU;
            let wave = (theta * 3.0 + orbit as f32).sin() * 1.5;
            let local = Vec3::new(a * theta.cos(), b * theta.sin(), wave) + jitter(rng, 0.4);
            points.push(tilt * local);
        }
    }

    points
}

fn wave_orbit<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<Vec3> {
    (0..count)
        .map(|i| {
            let t = i as f32 / count as f32 * TAU;
            let r = 20.0 + 4.0 * (3.0 * t).sin() + 2.0 * (7.0 * t + 0.5).sin();
            let z = 6.0 * (2.0 * t + 1.0).sin() + 3.0 * (5.0 * t).cos();
            Vec3::new(r * t.cos(), r * t.sin(), z) + jitter(rng, 0.6)
        })
        .collect()
}

fn cubic_bezier(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3, t: f32) -> Vec3 {
    let u = 1.0 - t;
    p0 * (u * u * u) + p1 * (3.0 * u * u * t) + p2 * (3.0 * u * t * t) + p3 * (t * t * t)
}

fn cosmic_web<R: Rng + ?Sized>(count: usize, num_strands: usize, rng: &mut R) -> Vec<Vec3> {
    let per_strand = (count / num_strands).max(1);
    let mut points = Vec::with_capacity(count);

    'strands: for _ in 0..num_strands {
        let start = jitter(rng, 30.0);
        let end = jitter(rng, 30.0);
        let c1 = start.lerp(end, 1.0 / 3.0) + jitter(rng, 15.0);
        let c2 = start.lerp(end, 2.0 / 3.0) + jitter(rng, 15.0);

        for j in 0..per_strand {
            if points.len() == count {
                break 'strands;
            }
            let t = if per_strand > 1 {
                j as f32 / (per_strand - 1) as f32
            } else {
                0.5
            };
            points.push(cubic_bezier(start, c1, c2, end, t) + jitter(rng, 0.5));
        }
    }

    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::Bounds;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const COUNTS: [usize; 9] = [1, 2, 7, 8, 15, 17, 31, 100, 1001];

    #[test]
    fn test_every_pattern_yields_exact_finite_count() {
        let mut rng = StdRng::seed_from_u64(42);
        for pattern in Pattern::ALL {
            for count in COUNTS {
                let cloud = pattern.generate(count, 70.0, &mut rng);
                assert_eq!(cloud.len(), count, "{} count {}", pattern.name(), count);
                assert!(cloud.iter().all(|p| p.is_finite()), "{} count {}", pattern.name(), count);
            }
        }
    }

    #[test]
    fn test_zero_count_is_empty() {
        let mut rng = StdRng::seed_from_u64(1);
        for pattern in Pattern::ALL {
            assert!(pattern.generate(0, 70.0, &mut rng).is_empty());
        }
    }

    #[test]
    fn test_generated_clouds_are_normalized() {
        let mut rng = StdRng::seed_from_u64(3);
        for pattern in Pattern::ALL {
            let cloud = pattern.generate(2000, 70.0, &mut rng);
            let b = Bounds::of(cloud.points()).unwrap();
            assert!((b.max_extent() - 70.0).abs() < 1e-2, "{}", pattern.name());
            assert!(b.center().length() < 1e-2, "{}", pattern.name());
        }
    }

    #[test]
    fn test_same_seed_same_cloud() {
        for pattern in Pattern::ALL {
            let a = pattern.generate(300, 70.0, &mut StdRng::seed_from_u64(9));
            let b = pattern.generate(300, 70.0, &mut StdRng::seed_from_u64(9));
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_palette_color_law() {
        for pattern in Pattern::ALL {
            let palette = pattern.palette();
            let flat = palette.fill(50);
            for i in 0..50 {
                let c = Vec3::from_slice(&flat[i * 3..i * 3 + 3]);
                assert_eq!(c, palette.0[i % 3]);
                assert_eq!(palette.color(i), palette.0[i % 3]);
            }
        }
    }

    #[test]
    fn test_pad_cyclic_from_empty() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut pts = Vec::new();
        pad_cyclic(&mut pts, 5, &mut rng);
        assert_eq!(pts, vec![Vec3::ZERO; 5]);
    }

    #[test]
    fn test_pad_cyclic_clones_near_sources() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut pts = vec![Vec3::new(10.0, 0.0, 0.0), Vec3::new(0.0, 10.0, 0.0)];
        pad_cyclic(&mut pts, 6, &mut rng);
        assert_eq!(pts.len(), 6);
        assert!((pts[2] - Vec3::new(10.0, 0.0, 0.0)).length() <= 0.2 + 1e-5);
        assert!((pts[3] - Vec3::new(0.0, 10.0, 0.0)).length() <= 0.2 + 1e-5);
    }

    #[test]
    fn test_from_index_wraps() {
        assert_eq!(Pattern::from_index(0), Pattern::TorusKnot);
        assert_eq!(Pattern::from_index(5), Pattern::EllipticalOrbits);
    }
}
