// Copyright 2026 the Lightbox Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Timing curves and a tick-driven, pausable animator.

use core::time::Duration;

/// Easing applied to linear time before it is turned into progress.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Curve {
    /// Constant speed.
    Linear,
    /// Starts slow.
    EaseIn,
    /// Ends slow.
    EaseOut,
    /// Starts and ends slow.
    #[default]
    EaseInOut,
}

impl Curve {
    /// Maps linear time `t` in `[0, 1]` to eased progress in `[0, 1]`.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::EaseIn => t * t,
            Self::EaseOut => t * (2.0 - t),
            Self::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
        }
    }
}

/// How a transition animation is timed.
///
/// [`Property`](Self::Property) is the interruptible animator used for
/// interactive transitions. [`Spring`](Self::Spring) is the classic damped
/// spring; it is also pausable here, since every animation is driven by
/// [`Animator::tick`].
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AnimationOption {
    /// A damped spring, normalised to land exactly on the target at the end of the duration.
    Spring {
        /// `1.0` is critically damped; smaller values oscillate.
        damping_ratio: f64,
        /// Initial velocity, in units of the total distance per unit of normalised time.
        initial_velocity: f64,
        /// Easing applied to time before the spring is evaluated.
        curve: Curve,
    },
    /// A plain curve-timed animation.
    Property {
        /// The timing curve.
        curve: Curve,
    },
}

impl AnimationOption {
    /// Critically damped spring with no initial velocity, eased in.
    pub const FALLBACK: Self = Self::Spring {
        damping_ratio: 1.0,
        initial_velocity: 0.0,
        curve: Curve::EaseIn,
    };

    /// Progress at linear time `t` in `[0, 1]`.
    ///
    /// Always `0.0` at `t = 0` and `1.0` at `t = 1`.
    pub fn value_at(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match *self {
            Self::Property { curve } => curve.apply(t),
            Self::Spring {
                damping_ratio,
                initial_velocity,
                curve,
            } => normalized_spring(curve.apply(t), damping_ratio, initial_velocity),
        }
    }
}

impl Default for AnimationOption {
    fn default() -> Self {
        Self::Property {
            curve: Curve::EaseInOut,
        }
    }
}

// Natural frequency in normalised time; settles well inside one unit.
const SPRING_OMEGA: f64 = 12.0;

fn spring_displacement(t: f64, damping_ratio: f64, initial_velocity: f64) -> f64 {
    let zeta = damping_ratio.max(0.0);
    if zeta >= 1.0 {
        1.0 - (1.0 + (SPRING_OMEGA - initial_velocity) * t) * (-SPRING_OMEGA * t).exp()
    } else {
        let damped = SPRING_OMEGA * (1.0 - zeta * zeta).sqrt();
        let sine = (zeta * SPRING_OMEGA - initial_velocity) / damped;
        1.0 - (-zeta * SPRING_OMEGA * t).exp() * ((damped * t).cos() + sine * (damped * t).sin())
    }
}

fn normalized_spring(t: f64, damping_ratio: f64, initial_velocity: f64) -> f64 {
    if t >= 1.0 {
        return 1.0;
    }
    let end = spring_displacement(1.0, damping_ratio, initial_velocity);
    if end.abs() < 1e-9 {
        return t;
    }
    spring_displacement(t, damping_ratio, initial_velocity) / end
}

/// Lifecycle of an [`Animator`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum AnimatorState {
    /// Created but never started.
    Inactive,
    /// Advancing on every tick.
    Running,
    /// Holding its fraction; ticks are ignored.
    Paused,
    /// Reached the end.
    Stopped,
}

/// Drives a single `0 → 1` animation from host-supplied frame ticks.
///
/// ```rust
/// use core::time::Duration;
/// use lightbox_transition::{AnimationOption, Animator, AnimatorState, Curve};
///
/// let mut animator = Animator::new(
///     AnimationOption::Property { curve: Curve::Linear },
///     Duration::from_secs(1),
/// );
/// animator.start();
/// assert_eq!(animator.tick(Duration::from_millis(500)), 0.5);
/// animator.pause();
/// assert_eq!(animator.tick(Duration::from_millis(500)), 0.5);
/// animator.start();
/// assert_eq!(animator.tick(Duration::from_millis(800)), 1.0);
/// assert_eq!(animator.state(), AnimatorState::Stopped);
/// ```
#[derive(Clone, Debug)]
pub struct Animator {
    option: AnimationOption,
    duration: f64,
    elapsed: f64,
    state: AnimatorState,
}

impl Animator {
    /// Creates an inactive animator.
    pub fn new(option: AnimationOption, duration: Duration) -> Self {
        Self {
            option,
            duration: duration.as_secs_f64(),
            elapsed: 0.0,
            state: AnimatorState::Inactive,
        }
    }

    /// Total duration.
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.duration)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> AnimatorState {
        self.state
    }

    /// Starts or resumes the animation.
    ///
    /// A zero-length animation stops on its first tick.
    pub fn start(&mut self) {
        if matches!(self.state, AnimatorState::Inactive | AnimatorState::Paused) {
            self.state = AnimatorState::Running;
        }
    }

    /// Pauses a running animation.
    pub fn pause(&mut self) {
        if self.state == AnimatorState::Running {
            self.state = AnimatorState::Paused;
        }
    }

    /// Jumps to the end.
    pub fn stop(&mut self) {
        self.elapsed = self.duration;
        self.state = AnimatorState::Stopped;
    }

    /// Linear fraction of the duration that has elapsed.
    pub fn fraction_complete(&self) -> f64 {
        if self.duration <= 0.0 {
            return if self.state == AnimatorState::Stopped { 1.0 } else { 0.0 };
        }
        (self.elapsed / self.duration).clamp(0.0, 1.0)
    }

    /// Scrubs a paused or inactive animation to `fraction`.
    pub fn set_fraction_complete(&mut self, fraction: f64) {
        if matches!(self.state, AnimatorState::Inactive | AnimatorState::Paused) {
            self.elapsed = fraction.clamp(0.0, 1.0) * self.duration;
        }
    }

    /// Eased progress at the current fraction.
    pub fn value(&self) -> f64 {
        self.option.value_at(self.fraction_complete())
    }

    /// Advances a running animation by `dt` and returns the eased progress.
    pub fn tick(&mut self, dt: Duration) -> f64 {
        if self.state == AnimatorState::Running {
            self.elapsed += dt.as_secs_f64();
            if self.elapsed >= self.duration {
                self.stop();
            }
        }
        self.value()
    }

    /// Returns `true` once the animation has reached its end.
    pub fn is_finished(&self) -> bool {
        self.state == AnimatorState::Stopped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn curves_pin_their_endpoints() {
        for curve in [Curve::Linear, Curve::EaseIn, Curve::EaseOut, Curve::EaseInOut] {
            assert!(close(curve.apply(0.0), 0.0), "{curve:?} at 0");
            assert!(close(curve.apply(1.0), 1.0), "{curve:?} at 1");
            assert!(close(curve.apply(7.0), 1.0), "{curve:?} clamps");
        }
        assert!(Curve::EaseIn.apply(0.5) < 0.5);
        assert!(Curve::EaseOut.apply(0.5) > 0.5);
        assert!(close(Curve::EaseInOut.apply(0.5), 0.5));
    }

    #[test]
    fn springs_land_on_target() {
        let critically_damped = AnimationOption::FALLBACK;
        let bouncy = AnimationOption::Spring {
            damping_ratio: 0.4,
            initial_velocity: 2.0,
            curve: Curve::Linear,
        };
        for option in [critically_damped, bouncy] {
            assert!(close(option.value_at(0.0), 0.0), "{option:?} at 0");
            assert!(close(option.value_at(1.0), 1.0), "{option:?} at 1");
        }
        let mut last = 0.0;
        for step in 1..=10 {
            let v = critically_damped.value_at(f64::from(step) / 10.0);
            assert!(v >= last, "critically damped spring never reverses");
            last = v;
        }
    }

    #[test]
    fn paused_animator_can_be_scrubbed_then_resumed() {
        let mut animator = Animator::new(
            AnimationOption::Property {
                curve: Curve::Linear,
            },
            Duration::from_secs(1),
        );
        animator.set_fraction_complete(0.25);
        assert!(close(animator.value(), 0.25));
        animator.start();
        animator.pause();
        animator.set_fraction_complete(0.75);
        animator.start();
        animator.set_fraction_complete(0.0);
        assert!(close(animator.fraction_complete(), 0.75), "no scrubbing while running");
        assert!(close(animator.tick(Duration::from_millis(250)), 1.0));
        assert!(animator.is_finished());
    }

    #[test]
    fn zero_duration_finishes_on_first_tick() {
        let mut animator = Animator::new(AnimationOption::default(), Duration::ZERO);
        assert!(close(animator.value(), 0.0));
        animator.start();
        assert!(close(animator.tick(Duration::ZERO), 1.0));
        assert!(animator.is_finished());
    }
}
