//! The hope reveal: a one-shot, forward-only tween of the hope factor from 0
//! to 1 across a fixed list of phases.
//!
//! The timeline is driven explicitly from the frame loop:
//! ```ignore
//! let mut tl = HopeTimeline::new(PhaseSchedule::default(), 0.01, 0.0);
//! tl.start();
//! // per frame
//! let tick = tl.tick(dt);
//! if tick.revealed { show_video(); }
//! ```
//!
//! Values reach the rest of the scene two ways: `tick` returns them, and any
//! listener registered with [`HopeTimeline::subscribe`] is called with each
//! emitted value in order. Small changes are throttled, but phase boundaries
//! and the final 1.0 are always emitted.

use log::{debug, info, warn};
use serde::Deserialize;

use crate::ease::{lerp, Ease};

/// One leg of the reveal.
#[derive(Debug, Copy, Clone, PartialEq, Deserialize)]
pub struct Phase {
    pub target: f32,
    pub duration_secs: f32,
    pub ease: Ease,
}

impl Phase {
    pub const fn new(target: f32, duration_secs: f32, ease: Ease) -> Self {
        Self {
            target,
            duration_secs,
            ease,
        }
    }
}

/// Ordered, immutable list of phases.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct PhaseSchedule {
    phases: Vec<Phase>,
}

impl Default for PhaseSchedule {
    fn default() -> Self {
        Self {
            phases: vec![
                // dramatic pause
                Phase::new(0.1, 2.0, Ease::OutQuad),
                // storm calming, rain stopping
                Phase::new(0.4, 3.0, Ease::InOutCubic),
                // light breaking through
                Phase::new(0.8, 4.0, Ease::InOutCubic),
                Phase::new(1.0, 3.0, Ease::OutQuad),
            ],
        }
    }
}

impl PhaseSchedule {
    pub fn new(phases: Vec<Phase>) -> Self {
        Self { phases }
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn total_duration(&self) -> f32 {
        self.phases.iter().map(|p| p.duration_secs).sum()
    }

    /// Value the factor settles at when every phase has run.
    pub fn final_target(&self) -> f32 {
        self.phases.last().map_or(0.0, |p| p.target)
    }

    /// Value at the start of phase `idx`.
    fn start_value(&self, idx: usize) -> f32 {
        if idx == 0 {
            0.0
        } else {
            self.phases[idx - 1].target
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TimelineState {
    Idle,
    Running { phase: usize },
    /// All phases done, waiting out the reveal delay.
    Settling,
    Revealed,
}

/// Result of advancing the timeline by one frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TimelineTick {
    /// Current unthrottled factor.
    pub factor: f32,
    /// Last value emitted during this tick, if any passed the throttle.
    pub emitted: Option<f32>,
    pub state: TimelineState,
    /// True on exactly one tick: when the reveal delay has elapsed.
    pub revealed: bool,
}

type Listener = Box<dyn FnMut(f32)>;

pub struct HopeTimeline {
    schedule: PhaseSchedule,
    throttle_epsilon: f32,
    reveal_delay_secs: f32,
    state: TimelineState,
    elapsed: f32,
    factor: f32,
    last_emitted: f32,
    listeners: Vec<Listener>,
}

impl std::fmt::Debug for HopeTimeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HopeTimeline")
            .field("state", &self.state)
            .field("elapsed", &self.elapsed)
            .field("factor", &self.factor)
            .field("last_emitted", &self.last_emitted)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl HopeTimeline {
    pub fn new(schedule: PhaseSchedule, throttle_epsilon: f32, reveal_delay_secs: f32) -> Self {
        Self {
            schedule,
            throttle_epsilon: throttle_epsilon.max(0.0),
            reveal_delay_secs: reveal_delay_secs.max(0.0),
            state: TimelineState::Idle,
            elapsed: 0.0,
            factor: 0.0,
            last_emitted: 0.0,
            listeners: Vec::new(),
        }
    }

    /// Register a push-model listener for every emitted factor.
    pub fn subscribe(&mut self, listener: impl FnMut(f32) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Begin the reveal. Returns `false` and changes nothing if it was
    /// already started; the reveal never restarts. An empty schedule could
    /// never reach 1.0, so it never starts either.
    pub fn start(&mut self) -> bool {
        if self.state != TimelineState::Idle {
            debug!("hope timeline already started; ignoring start");
            return false;
        }
        if self.schedule.phases().is_empty() {
            warn!("hope timeline has no phases; not starting");
            return false;
        }
        info!(
            "hope reveal started ({} phases, {:.1}s)",
            self.schedule.phases().len(),
            self.schedule.total_duration()
        );
        self.state = TimelineState::Running { phase: 0 };
        self.elapsed = 0.0;
        self.last_emitted = self.factor;
        true
    }

    pub fn state(&self) -> TimelineState {
        self.state
    }

    pub fn factor(&self) -> f32 {
        self.factor
    }

    /// Last value that passed the throttle.
    pub fn emitted_factor(&self) -> f32 {
        self.last_emitted
    }

    /// Seconds since `start`.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn is_started(&self) -> bool {
        self.state != TimelineState::Idle
    }

    pub fn schedule(&self) -> &PhaseSchedule {
        &self.schedule
    }

    /// Advance by `dt` seconds.
    pub fn tick(&mut self, dt: f32) -> TimelineTick {
        let mut tick = TimelineTick {
            factor: self.factor,
            emitted: None,
            state: self.state,
            revealed: false,
        };

        let current = match self.state {
            TimelineState::Idle | TimelineState::Revealed => return tick,
            TimelineState::Running { phase } => Some(phase),
            TimelineState::Settling => None,
        };

        self.elapsed += dt.max(0.0);

        if let Some(mut phase) = current {
            let phases = self.schedule.phases().to_vec();
            let mut phase_start: f32 = phases[..phase].iter().map(|p| p.duration_secs).sum();

            // Finish every phase whose end we passed, emitting its boundary.
            while phase < phases.len() && self.elapsed >= phase_start + phases[phase].duration_secs
            {
                phase_start += phases[phase].duration_secs;
                self.factor = phases[phase].target;
                self.emit(self.factor, true, &mut tick);
                phase += 1;
            }

            if phase < phases.len() {
                let p = phases[phase];
                let u = (self.elapsed - phase_start) / p.duration_secs.max(1e-6);
                let from = self.schedule.start_value(phase);
                let value = lerp(from, p.target, p.ease.sample(u)).clamp(0.0, 1.0);
                // Forward-only even if a curve overshoots numerically.
                self.factor = self.factor.max(value);
                self.emit(self.factor, false, &mut tick);
                self.state = TimelineState::Running { phase };
            } else {
                info!("hope reveal reached {:.2}", self.factor);
                self.state = TimelineState::Settling;
            }
        }

        if self.state == TimelineState::Settling {
            let settled_for = self.elapsed - self.schedule.total_duration();
            if settled_for >= self.reveal_delay_secs {
                info!("hope reveal complete");
                self.state = TimelineState::Revealed;
                tick.revealed = true;
            }
        }

        tick.factor = self.factor;
        tick.state = self.state;
        tick
    }

    fn emit(&mut self, value: f32, force: bool, tick: &mut TimelineTick) {
        let delta = (value - self.last_emitted).abs();
        if delta == 0.0 || (!force && delta < self.throttle_epsilon) {
            debug!("hope update {value:.4} throttled (delta {delta:.4})");
            return;
        }
        self.last_emitted = value;
        tick.emitted = Some(value);
        for listener in &mut self.listeners {
            listener(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn timeline() -> HopeTimeline {
        HopeTimeline::new(PhaseSchedule::default(), 0.01, 0.0)
    }

    #[test]
    fn default_schedule_lasts_twelve_seconds() {
        let s = PhaseSchedule::default();
        assert_eq!(s.total_duration(), 12.0);
        assert_eq!(s.final_target(), 1.0);
    }

    #[test]
    fn idle_timeline_does_not_move() {
        let mut tl = timeline();
        let t = tl.tick(5.0);
        assert_eq!(t.factor, 0.0);
        assert_eq!(t.emitted, None);
        assert_eq!(t.state, TimelineState::Idle);
    }

    #[test]
    fn second_start_is_rejected() {
        let mut tl = timeline();
        assert!(tl.start());
        tl.tick(1.0);
        let before = tl.factor();
        assert!(!tl.start());
        assert_eq!(tl.factor(), before);
        assert_eq!(tl.elapsed(), 1.0);
    }

    #[test]
    fn empty_schedule_never_starts() {
        let mut tl = HopeTimeline::new(PhaseSchedule::new(Vec::new()), 0.01, 0.0);
        assert!(!tl.start());
        let t = tl.tick(1.0);
        assert!(!t.revealed);
        assert_eq!(t.state, TimelineState::Idle);
    }

    #[test]
    fn phase_boundaries_land_exactly() {
        let mut tl = timeline();
        tl.start();
        tl.tick(2.0);
        assert_eq!(tl.factor(), 0.1);
        tl.tick(3.0);
        assert_eq!(tl.factor(), 0.4);
        tl.tick(4.0);
        assert_eq!(tl.factor(), 0.8);
    }

    #[test]
    fn small_changes_are_throttled() {
        let mut tl = timeline();
        tl.start();
        // 1ms into an ease-out from 0 to 0.1 is well under 0.01
        let t = tl.tick(0.001);
        assert!(t.factor > 0.0);
        assert_eq!(t.emitted, None);
        assert_eq!(tl.emitted_factor(), 0.0);
    }

    #[test]
    fn one_huge_step_delivers_every_boundary_in_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut tl = timeline();
        let sink = seen.clone();
        tl.subscribe(move |v| sink.borrow_mut().push(v));
        tl.start();
        let t = tl.tick(100.0);
        assert_eq!(*seen.borrow(), vec![0.1, 0.4, 0.8, 1.0]);
        assert_eq!(t.factor, 1.0);
        assert!(t.revealed);
    }

    #[test]
    fn reveal_waits_for_delay() {
        let mut tl = HopeTimeline::new(PhaseSchedule::default(), 0.01, 0.5);
        tl.start();
        let t = tl.tick(12.0);
        assert_eq!(t.factor, 1.0);
        assert!(!t.revealed);
        assert_eq!(t.state, TimelineState::Settling);
        assert!(!tl.tick(0.25).revealed);
        assert!(tl.tick(0.25).revealed);
        assert!(!tl.tick(1.0).revealed);
        assert_eq!(tl.state(), TimelineState::Revealed);
    }
}
