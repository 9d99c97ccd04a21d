//! Point cloud normalization.
//!
//! Pattern generators work in whatever units are convenient for their math;
//! [`normalize`] brings the result into the shared display volume so that
//! every pattern occupies the same space on screen.

use glam::Vec3;

/// Boxes whose largest side is at or below this are treated as degenerate.
pub const DEGENERATE_EXTENT: f32 = 1e-6;

/// Axis-aligned bounding box over the finite points of a cloud.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    /// Compute bounds over finite points. Returns `None` when there are none.
    pub fn of(points: &[Vec3]) -> Option<Self> {
        points
            .iter()
            .filter(|p| p.is_finite())
            .fold(None, |acc: Option<Bounds>, &p| match acc {
                None => Some(Bounds { min: p, max: p }),
                Some(b) => Some(Bounds {
                    min: b.min.min(p),
                    max: b.max.max(p),
                }),
            })
    }

    /// Midpoint of the box.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Side lengths along each axis.
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Length of the largest side.
    pub fn max_extent(&self) -> f32 {
        self.size().max_element()
    }
}

/// Center `points` on the origin and scale them uniformly so that the largest
/// bounding-box side equals `target_size`.
///
/// Never produces NaN or infinity:
/// - non-finite input points are placed at the origin
/// - a degenerate box (all points coincide), an empty finite set, or an
///   unusable `target_size` collapses the whole cloud onto the origin
pub fn normalize(points: &mut [Vec3], target_size: f32) {
    let bounds = match Bounds::of(points) {
        Some(b) => b,
        None => {
            points.fill(Vec3::ZERO);
            return;
        }
    };

    let extent = bounds.max_extent();
    if !extent.is_finite()
        || extent <= DEGENERATE_EXTENT
        || !target_size.is_finite()
        || target_size <= 0.0
    {
        points.fill(Vec3::ZERO);
        return;
    }

    let center = bounds.center();
    let scale = target_size / extent;

    for p in points.iter_mut() {
        *p = if p.is_finite() {
            let scaled = (*p - center) * scale;
            // Guard against overflow on pathological (huge but finite) input.
            if scaled.is_finite() {
                scaled
            } else {
                Vec3::ZERO
            }
        } else {
            Vec3::ZERO
        };
    }
}
