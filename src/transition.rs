//! Pattern transitions for the main particle system.
//!
//! The controller is a two-state machine:
//!
//! ```text
//!            request_next_pattern()
//!   Idle ─────────────────────────────▶ Transitioning
//!     ▲                                      │
//!     └──────── advance() with progress ≥ 1 ─┘
//! ```
//!
//! While transitioning it holds `from`/`to` snapshots of the position and
//! color buffers and blends between them with a sine S-curve. Progress moves
//! by a fixed amount per [`advance`](TransitionController::advance) call, so
//! a transition lasts a fixed number of frames rather than a fixed time.

use std::f32::consts::PI;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::field::FieldSystem;
use crate::pattern::Pattern;

/// Eased progress: `0.5 - cos(t·π)·0.5`, clamped to `[0, 1]`.
#[inline]
pub fn ease_in_out_sine(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    0.5 - (t * PI).cos() * 0.5
}

#[derive(Debug, Clone)]
enum Phase {
    Idle,
    Transitioning {
        progress: f32,
        from_positions: Vec<f32>,
        to_positions: Vec<f32>,
        from_colors: Vec<f32>,
        to_colors: Vec<f32>,
    },
}

/// Drives the main particle buffers through the pattern cycle.
#[derive(Debug, Clone)]
pub struct TransitionController {
    current: usize,
    speed: f32,
    target_size: f32,
    rng: StdRng,
    phase: Phase,
}

impl TransitionController {
    /// `seed` feeds the pattern generators only, so a given seed always
    /// yields the same sequence of clouds.
    pub fn new(speed: f32, target_size: f32, seed: u64) -> Self {
        Self {
            current: 0,
            speed,
            target_size,
            rng: StdRng::seed_from_u64(seed),
            phase: Phase::Idle,
        }
    }

    /// Write pattern 0 into `field` and reset to Idle.
    pub fn seed(&mut self, field: &mut FieldSystem) {
        self.current = 0;
        self.phase = Phase::Idle;
        let (positions, colors) = self.build(Pattern::from_index(0), field.count());
        field.positions_mut().copy_from_slice(&positions);
        field.colors_mut().copy_from_slice(&colors);
    }

    /// Start morphing towards the next pattern in the cycle.
    ///
    /// Returns `false` without touching anything while a transition is
    /// already running; requests are dropped, not queued.
    pub fn request_next_pattern(&mut self, field: &FieldSystem) -> bool {
        if self.is_transitioning() {
            return false;
        }

        self.current = (self.current + 1) % Pattern::ALL.len();
        let pattern = Pattern::from_index(self.current);
        let (to_positions, to_colors) = self.build(pattern, field.count());

        tracing::debug!(pattern = pattern.name(), index = self.current, "pattern transition started");

        self.phase = Phase::Transitioning {
            progress: 0.0,
            from_positions: field.positions().to_vec(),
            to_positions,
            from_colors: field.colors().to_vec(),
            to_colors,
        };
        true
    }

    /// Step the transition by one frame, writing the blended buffers.
    ///
    /// Does nothing while Idle. Returns `true` when buffers were written.
    pub fn advance(&mut self, field: &mut FieldSystem) -> bool {
        let finished = match &mut self.phase {
            Phase::Idle => return false,
            Phase::Transitioning {
                progress,
                from_positions,
                to_positions,
                from_colors,
                to_colors,
            } => {
                *progress += self.speed;
                if *progress >= 1.0 {
                    field.positions_mut().copy_from_slice(to_positions);
                    field.colors_mut().copy_from_slice(to_colors);
                    true
                } else {
                    let eased = ease_in_out_sine(*progress);
                    lerp_into(field.positions_mut(), from_positions, to_positions, eased);
                    lerp_into(field.colors_mut(), from_colors, to_colors, eased);
                    false
                }
            }
        };

        if finished {
            self.phase = Phase::Idle;
            tracing::debug!(pattern = self.current_pattern().name(), "pattern transition complete");
        }
        true
    }

    #[inline]
    pub fn is_transitioning(&self) -> bool {
        matches!(self.phase, Phase::Transitioning { .. })
    }

    /// Raw progress in `[0, 1)` while transitioning, `0` when Idle.
    pub fn progress(&self) -> f32 {
        match &self.phase {
            Phase::Idle => 0.0,
            Phase::Transitioning { progress, .. } => progress.min(1.0),
        }
    }

    #[inline]
    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_pattern(&self) -> Pattern {
        Pattern::from_index(self.current)
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// `(from_positions, to_positions)` while transitioning.
    pub fn position_snapshots(&self) -> Option<(&[f32], &[f32])> {
        match &self.phase {
            Phase::Idle => None,
            Phase::Transitioning {
                from_positions,
                to_positions,
                ..
            } => Some((from_positions, to_positions)),
        }
    }

    /// `(from_colors, to_colors)` while transitioning.
    pub fn color_snapshots(&self) -> Option<(&[f32], &[f32])> {
        match &self.phase {
            Phase::Idle => None,
            Phase::Transitioning {
                from_colors, to_colors, ..
            } => Some((from_colors, to_colors)),
        }
    }

    fn build(&mut self, pattern: Pattern, count: usize) -> (Vec<f32>, Vec<f32>) {
        let cloud = pattern.generate(count, self.target_size, &mut self.rng);
        (cloud.to_flat(), pattern.palette().fill(count))
    }
}

fn lerp_into(out: &mut [f32], from: &[f32], to: &[f32], t: f32) {
    for ((o, &a), &b) in out.iter_mut().zip(from).zip(to) {
        *o = a + (b - a) * t;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(count: usize) -> (TransitionController, FieldSystem) {
        let mut rng = StdRng::seed_from_u64(11);
        let mut field = FieldSystem::particles(count, &mut rng);
        let mut controller = TransitionController::new(0.015, 70.0, 99);
        controller.seed(&mut field);
        (controller, field)
    }

    #[test]
    fn test_ease_boundaries() {
        assert_eq!(ease_in_out_sine(0.0), 0.0);
        assert!((ease_in_out_sine(1.0) - 1.0).abs() < 1e-7);
        assert!((ease_in_out_sine(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_ease_monotonic() {
        let mut last = ease_in_out_sine(0.0);
        for i in 1..=1000 {
            let v = ease_in_out_sine(i as f32 / 1000.0);
            assert!(v >= last);
            last = v;
        }
    }

    #[test]
    fn test_seed_writes_pattern_zero() {
        let (controller, field) = setup(30);
        assert!(!controller.is_transitioning());
        assert_eq!(controller.current_pattern(), Pattern::TorusKnot);
        assert!(field.positions().iter().any(|&v| v != 0.0));
        let palette = Pattern::TorusKnot.palette();
        assert_eq!(field.colors()[3..6], palette.color(1).to_array());
    }

    #[test]
    fn test_advance_idle_is_noop() {
        let (mut controller, mut field) = setup(10);
        let before = field.positions().to_vec();
        assert!(!controller.advance(&mut field));
        assert_eq!(field.positions(), &before[..]);
    }

    #[test]
    fn test_progress_zero_equals_from() {
        let (mut controller, field) = setup(10);
        let before = field.positions().to_vec();
        assert!(controller.request_next_pattern(&field));
        let (from, _) = controller.position_snapshots().unwrap();
        assert_eq!(from, &before[..]);
        assert_eq!(field.positions(), from);
        assert_eq!(controller.progress(), 0.0);
    }

    #[test]
    fn test_full_transition_returns_to_idle() {
        let (mut controller, mut field) = setup(20);
        assert!(controller.request_next_pattern(&field));
        let to = controller.position_snapshots().unwrap().1.to_vec();
        let to_colors = controller.color_snapshots().unwrap().1.to_vec();

        let mut steps = 0;
        while controller.is_transitioning() {
            controller.advance(&mut field);
            steps += 1;
            assert!(steps < 1000);
        }

        assert_eq!(steps, 67);
        assert!(controller.position_snapshots().is_none());
        assert!(controller.color_snapshots().is_none());
        assert_eq!(field.positions(), &to[..]);
        assert_eq!(field.colors(), &to_colors[..]);
        assert_eq!(controller.current_index(), 1);
    }

    #[test]
    fn test_request_mid_transition_is_ignored() {
        let (mut controller, mut field) = setup(12);
        assert!(controller.request_next_pattern(&field));
        controller.advance(&mut field);

        let index = controller.current_index();
        let snapshot = controller.position_snapshots().map(|(a, b)| (a.to_vec(), b.to_vec()));
        assert!(!controller.request_next_pattern(&field));
        assert_eq!(controller.current_index(), index);
        assert_eq!(
            controller.position_snapshots().map(|(a, b)| (a.to_vec(), b.to_vec())),
            snapshot
        );
    }

    #[test]
    fn test_cycle_wraps_after_four() {
        let (mut controller, mut field) = setup(8);
        for expected in [1, 2, 3, 0] {
            controller.request_next_pattern(&field);
            while controller.advance(&mut field) && controller.is_transitioning() {}
            assert_eq!(controller.current_index(), expected);
        }
    }

    #[test]
    fn test_mid_transition_values_between_endpoints() {
        let (mut controller, mut field) = setup(6);
        controller.request_next_pattern(&field);
        let (from, to) = controller
            .position_snapshots()
            .map(|(a, b)| (a.to_vec(), b.to_vec()))
            .unwrap();
        for _ in 0..30 {
            controller.advance(&mut field);
        }
        for ((&v, &a), &b) in field.positions().iter().zip(&from).zip(&to) {
            let (lo, hi) = if a < b { (a, b) } else { (b, a) };
            assert!(v >= lo - 1e-4 && v <= hi + 1e-4);
        }
    }
}
