//! Drag-to-seek over a horizontal seek bar.
//!
//! A press or move only computes a provisional fraction of the track; nothing reaches the
//! playback handle until the gesture is released. While a gesture is in progress the
//! [`ProgressSampler`](super::sampler::ProgressSampler) leaves the position alone.

use std::fmt;

/// The on-screen box of the seek bar, in the same coordinate space as the input events.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SeekSurface {
    pub left: f64,
    pub width: f64,
}

impl SeekSurface {
    #[must_use]
    pub const fn new(left: f64, width: f64) -> Self {
        Self { left, width }
    }

    /// Fraction of the bar to the left of `x`, clamped to `[0, 1]`
    #[must_use]
    pub fn fraction_at(&self, x: f64) -> f64 {
        if self.width.is_nan() || self.width <= 0.0 || !x.is_finite() {
            return 0.0;
        }
        ((x - self.left) / self.width).clamp(0.0, 1.0)
    }
}

/// A pointer or touch sample from the seek bar.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SeekInput {
    Pointer { client_x: f64 },
    /// `None` when the event carries no touch points
    Touch { first_touch_x: Option<f64> },
}

impl SeekInput {
    #[must_use]
    pub const fn x(&self) -> Option<f64> {
        match self {
            Self::Pointer { client_x } => Some(*client_x),
            Self::Touch { first_touch_x } => *first_touch_x,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum SeekPhase {
    #[default]
    Idle,
    Dragging {
        fraction: f64,
    },
    /// Released; the seek is being handed to the playback handle.
    Committing {
        fraction: f64,
    },
}

impl fmt::Display for SeekPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Dragging { fraction } => write!(f, "Dragging at {:.0}%", fraction * 100.0),
            Self::Committing { fraction } => write!(f, "Committing {:.0}%", fraction * 100.0),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SeekController {
    phase: SeekPhase,
}

impl SeekController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn phase(&self) -> SeekPhase {
        self.phase
    }

    /// Whether a gesture is in progress, i.e. the sampler must not write the position
    #[must_use]
    pub const fn is_dragging(&self) -> bool {
        !matches!(self.phase, SeekPhase::Idle)
    }

    /// The provisional fraction of the gesture in progress
    #[must_use]
    pub const fn fraction(&self) -> Option<f64> {
        match self.phase {
            SeekPhase::Idle => None,
            SeekPhase::Dragging { fraction } | SeekPhase::Committing { fraction } => {
                Some(fraction)
            }
        }
    }

    /// Start a gesture. Returns the provisional fraction, or `None` if `input` has no
    /// coordinate.
    pub fn press(&mut self, surface: &SeekSurface, input: SeekInput) -> Option<f64> {
        let fraction = surface.fraction_at(input.x()?);
        self.phase = SeekPhase::Dragging { fraction };
        Some(fraction)
    }

    /// Follow the gesture. Ignored unless one is in progress.
    pub fn drag(&mut self, surface: &SeekSurface, input: SeekInput) -> Option<f64> {
        if !matches!(self.phase, SeekPhase::Dragging { .. }) {
            return None;
        }
        let fraction = surface.fraction_at(input.x()?);
        self.phase = SeekPhase::Dragging { fraction };
        Some(fraction)
    }

    /// End the gesture and hand back the fraction to commit.
    ///
    /// Leaves the controller in [`SeekPhase::Committing`] until [`Self::finish`] is called.
    pub fn release(&mut self) -> Option<f64> {
        match self.phase {
            SeekPhase::Dragging { fraction } => {
                self.phase = SeekPhase::Committing { fraction };
                Some(fraction)
            }
            SeekPhase::Idle | SeekPhase::Committing { .. } => None,
        }
    }

    pub fn finish(&mut self) {
        self.phase = SeekPhase::Idle;
    }

    /// Drop the gesture without committing it. Returns whether one was in progress.
    pub fn cancel(&mut self) -> bool {
        let was_dragging = self.is_dragging();
        self.phase = SeekPhase::Idle;
        was_dragging
    }
}

/// Convert a fraction of the track to seconds, once the duration is known.
#[must_use]
pub fn time_at(fraction: f64, duration: Option<f64>) -> Option<f64> {
    duration
        .filter(|d| d.is_finite() && *d > 0.0)
        .map(|d| fraction.clamp(0.0, 1.0) * d)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn surface() -> SeekSurface {
        SeekSurface::new(100.0, 200.0)
    }

    #[rstest]
    #[case::start(100.0, 0.0)]
    #[case::middle(200.0, 0.5)]
    #[case::end(300.0, 1.0)]
    #[case::left_of_bar(20.0, 0.0)]
    #[case::right_of_bar(450.0, 1.0)]
    #[case::nan(f64::NAN, 0.0)]
    fn test_fraction_at(surface: SeekSurface, #[case] x: f64, #[case] expected: f64) {
        assert!((surface.fraction_at(x) - expected).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_width_surface() {
        assert!(SeekSurface::new(0.0, 0.0).fraction_at(10.0).abs() < f64::EPSILON);
    }

    #[rstest]
    fn test_gesture_lifecycle(surface: SeekSurface) {
        let mut seek = SeekController::new();
        assert!(!seek.is_dragging());

        assert_eq!(
            seek.press(&surface, SeekInput::Pointer { client_x: 150.0 }),
            Some(0.25)
        );
        assert_eq!(seek.phase(), SeekPhase::Dragging { fraction: 0.25 });

        assert_eq!(
            seek.drag(
                &surface,
                SeekInput::Touch {
                    first_touch_x: Some(250.0)
                }
            ),
            Some(0.75)
        );
        assert!(seek.is_dragging());

        assert_eq!(seek.release(), Some(0.75));
        assert_eq!(seek.phase(), SeekPhase::Committing { fraction: 0.75 });
        assert!(seek.is_dragging());
        // a second release while committing does nothing
        assert_eq!(seek.release(), None);

        seek.finish();
        assert_eq!(seek.phase(), SeekPhase::Idle);
        assert_eq!(seek.fraction(), None);
    }

    #[rstest]
    fn test_move_without_press_is_ignored(surface: SeekSurface) {
        let mut seek = SeekController::new();
        assert_eq!(seek.drag(&surface, SeekInput::Pointer { client_x: 150.0 }), None);
        assert_eq!(seek.release(), None);
        assert!(!seek.is_dragging());
    }

    #[rstest]
    fn test_touch_without_points(surface: SeekSurface) {
        let mut seek = SeekController::new();
        assert_eq!(seek.press(&surface, SeekInput::Touch { first_touch_x: None }), None);
        assert!(!seek.is_dragging());

        seek.press(&surface, SeekInput::Pointer { client_x: 120.0 });
        // touchmove with no points keeps the last fraction
        assert_eq!(seek.drag(&surface, SeekInput::Touch { first_touch_x: None }), None);
        assert_eq!(seek.fraction(), Some(0.1));
    }

    #[rstest]
    fn test_cancel(surface: SeekSurface) {
        let mut seek = SeekController::new();
        assert!(!seek.cancel());
        seek.press(&surface, SeekInput::Pointer { client_x: 120.0 });
        assert!(seek.cancel());
        assert_eq!(seek.release(), None);
    }

    #[rstest]
    #[case(0.5, Some(200.0), Some(100.0))]
    #[case(0.5, None, None)]
    #[case(0.5, Some(f64::INFINITY), None)]
    #[case(1.5, Some(200.0), Some(200.0))]
    fn test_time_at(
        #[case] fraction: f64,
        #[case] duration: Option<f64>,
        #[case] expected: Option<f64>,
    ) {
        assert_eq!(time_at(fraction, duration), expected);
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(SeekPhase::Idle.to_string(), "Idle");
        assert_eq!(SeekPhase::Dragging { fraction: 0.5 }.to_string(), "Dragging at 50%");
        assert_eq!(SeekPhase::Committing { fraction: 0.25 }.to_string(), "Committing 25%");
    }
}
