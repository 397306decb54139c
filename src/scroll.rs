//! Scroll tracking: normalized progress, backdrop filter, nav state and
//! per-section visibility.
//!
//! Everything here is computed from plain numbers so the browser shell only
//! has to read `scrollTop`, sizes and bounding rects and apply what comes back.

use log::debug;

/// Raw scroll geometry, all in CSS pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ScrollMetrics {
    pub scroll_top: f64,
    pub document_height: f64,
    pub viewport_height: f64,
}

impl ScrollMetrics {
    /// `scroll_top / (document - viewport)` clamped to [0,1]. A page that
    /// does not scroll reports 0.
    pub fn progress(&self) -> f32 {
        let range = self.document_height - self.viewport_height;
        if range <= 0.0 || !range.is_finite() {
            return 0.0;
        }
        let p = (self.scroll_top / range) as f32;
        if p.is_nan() {
            0.0
        } else {
            p.clamp(0.0, 1.0)
        }
    }
}

/// CSS pixels of blur per unit of the `background_blur` sink.
pub const BLUR_PX_PER_UNIT: f32 = 10.0;

/// CSS filter applied to the background photo.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BackdropFilter {
    pub brightness: f32,
    pub saturation: f32,
    pub blur_px: f32,
}

impl BackdropFilter {
    pub fn from_progress(progress: f32) -> Self {
        let p = progress.clamp(0.0, 1.0);
        Self {
            brightness: 0.4 + 0.4 * p,
            saturation: 0.8 + 0.3 * p,
            blur_px: 0.0,
        }
    }

    /// Same tone with the blur taken from the `background_blur` sink value.
    pub fn with_blur(self, background_blur: f32) -> Self {
        Self {
            blur_px: (background_blur * BLUR_PX_PER_UNIT).max(0.0),
            ..self
        }
    }

    /// Look the reveal tweens the photo towards.
    pub const HOPE: BackdropFilter = BackdropFilter {
        brightness: 0.9,
        saturation: 1.2,
        blur_px: 0.0,
    };

    pub fn lerp(self, to: BackdropFilter, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            brightness: crate::ease::lerp(self.brightness, to.brightness, t),
            saturation: crate::ease::lerp(self.saturation, to.saturation, t),
            blur_px: crate::ease::lerp(self.blur_px, to.blur_px, t),
        }
    }

    pub fn css(&self) -> String {
        format!(
            "brightness({:.2}) saturate({:.2}) blur({:.1}px)",
            self.brightness, self.saturation, self.blur_px
        )
    }
}

/// Background parallax: the photo drifts down 20% over the full page.
pub fn parallax_offset_percent(progress: f32) -> f32 {
    20.0 * progress.clamp(0.0, 1.0)
}

/// Map a pointer position in CSS pixels to [-1,1] on both axes, centered
/// on the viewport. `y` grows downwards like `clientY`.
pub fn normalize_pointer(client_x: f64, client_y: f64, width: f64, height: f64) -> (f32, f32) {
    let axis = |v: f64, span: f64| {
        if span > 0.0 && v.is_finite() {
            (((v / span) - 0.5) * 2.0).clamp(-1.0, 1.0) as f32
        } else {
            0.0
        }
    };
    (axis(client_x, width), axis(client_y, height))
}

/// Camera height at rest.
pub const CAMERA_REST_Y: f32 = 3.0;

/// Camera position for a normalized pointer: half a unit of sway sideways,
/// 0.3 up or down around the resting height.
pub fn mouse_parallax(x: f32, y: f32) -> (f32, f32) {
    (x * 0.5, CAMERA_REST_Y - y * 0.3)
}

/// Environmental nudge scroll gives the fog, capped at 0.3.
pub fn scroll_hope(progress: f32) -> f32 {
    (progress * 0.3).clamp(0.0, 0.3)
}

/// Skips filter writes whose change is too small to see.
#[derive(Debug, Clone)]
pub struct FilterThrottle {
    epsilon: f32,
    last: BackdropFilter,
}

impl FilterThrottle {
    pub fn new(epsilon: f32) -> Self {
        Self {
            epsilon,
            last: BackdropFilter {
                brightness: 0.0,
                saturation: 0.0,
                blur_px: 0.0,
            },
        }
    }

    /// Returns the filter to write, or `None` when both channels moved less
    /// than the threshold since the last write.
    pub fn offer(&mut self, next: BackdropFilter) -> Option<BackdropFilter> {
        let db = (next.brightness - self.last.brightness).abs();
        let ds = (next.saturation - self.last.saturation).abs();
        if db < self.epsilon && ds < self.epsilon {
            return None;
        }
        self.last = next;
        Some(next)
    }
}

/// The nav bar gets a "scrolled" look once the reader leaves the top.
#[derive(Debug, Clone)]
pub struct NavState {
    offset_px: f64,
    last_top: f64,
    scrolled: bool,
}

impl NavState {
    pub fn new(offset_px: f64) -> Self {
        Self {
            offset_px,
            last_top: 0.0,
            scrolled: false,
        }
    }

    pub fn is_scrolled(&self) -> bool {
        self.scrolled
    }

    /// Feed a new scroll position; returns the new flag when it changed.
    ///
    /// Set when scrolling down past the offset, cleared as soon as the page
    /// is back above it.
    pub fn update(&mut self, scroll_top: f64) -> Option<bool> {
        let moving_down = scroll_top > self.last_top;
        self.last_top = scroll_top;
        let next = if moving_down && scroll_top > self.offset_px {
            true
        } else if scroll_top <= self.offset_px {
            false
        } else {
            self.scrolled
        };
        if next == self.scrolled {
            return None;
        }
        self.scrolled = next;
        Some(next)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TriggerKind {
    /// Visible while the element overlaps the band between both thresholds.
    Range,
    /// Becomes visible at the start threshold and only hides again when
    /// scrolled back above it.
    EnterOnly,
}

/// Viewport-relative thresholds for one tracked section.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SectionTrigger {
    pub kind: TriggerKind,
    /// Element top must rise above this fraction of the viewport.
    pub start_ratio: f64,
    /// Element bottom must stay below this fraction of the viewport.
    pub end_ratio: f64,
}

impl SectionTrigger {
    pub fn story(start_ratio: f64, end_ratio: f64) -> Self {
        Self {
            kind: TriggerKind::Range,
            start_ratio,
            end_ratio,
        }
    }

    pub fn enter_only(start_ratio: f64) -> Self {
        Self {
            kind: TriggerKind::EnterOnly,
            start_ratio,
            end_ratio: 0.0,
        }
    }

    /// Evaluate against an element's bounding rect (viewport coordinates).
    pub fn is_in_view(&self, rect_top: f64, rect_bottom: f64, viewport_height: f64) -> bool {
        let entered = rect_top <= self.start_ratio * viewport_height;
        match self.kind {
            TriggerKind::Range => entered && rect_bottom >= self.end_ratio * viewport_height,
            TriggerKind::EnterOnly => entered,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibilityChange {
    pub section: String,
    pub visible: bool,
}

/// Per-section visible flags. Setting the current value again is a no-op.
#[derive(Debug, Default, Clone)]
pub struct SectionVisibility {
    states: Vec<(String, bool)>,
}

impl SectionVisibility {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self, section: &str) -> bool {
        self.states
            .iter()
            .find(|(id, _)| id == section)
            .is_some_and(|(_, v)| *v)
    }

    pub fn set(&mut self, section: &str, visible: bool) -> Option<VisibilityChange> {
        match self.states.iter_mut().find(|(id, _)| id == section) {
            Some((_, state)) if *state == visible => return None,
            Some((_, state)) => *state = visible,
            // Sections start hidden.
            None if !visible => {
                self.states.push((section.to_string(), false));
                return None;
            }
            None => self.states.push((section.to_string(), true)),
        }
        debug!("section {section} visible={visible}");
        Some(VisibilityChange {
            section: section.to_string(),
            visible,
        })
    }
}

/// One tracked section as measured this frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionSample {
    pub id: String,
    pub trigger: SectionTrigger,
    pub rect_top: f64,
    pub rect_bottom: f64,
}

/// What the shell has to apply after a recompute.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollUpdate {
    pub progress: f32,
    pub filter: Option<BackdropFilter>,
    pub parallax_percent: f32,
    pub nav_scrolled: Option<bool>,
    pub visibility: Vec<VisibilityChange>,
}

#[derive(Debug, Clone)]
pub struct ScrollTracker {
    progress: f32,
    filter: FilterThrottle,
    nav: NavState,
    sections: SectionVisibility,
}

impl ScrollTracker {
    pub fn new(filter_epsilon: f32, nav_offset_px: f64) -> Self {
        Self {
            progress: 0.0,
            filter: FilterThrottle::new(filter_epsilon),
            nav: NavState::new(nav_offset_px),
            sections: SectionVisibility::new(),
        }
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn sections(&self) -> &SectionVisibility {
        &self.sections
    }

    /// Recompute everything from the latest geometry. Called once per frame
    /// after a burst of scroll or resize events.
    pub fn update(&mut self, metrics: ScrollMetrics, samples: &[SectionSample]) -> ScrollUpdate {
        self.progress = metrics.progress();

        let filter = self
            .filter
            .offer(BackdropFilter::from_progress(self.progress));
        let nav_scrolled = self.nav.update(metrics.scroll_top);

        let visibility = samples
            .iter()
            .filter_map(|s| {
                let visible =
                    s.trigger
                        .is_in_view(s.rect_top, s.rect_bottom, metrics.viewport_height);
                self.sections.set(&s.id, visible)
            })
            .collect();

        ScrollUpdate {
            progress: self.progress,
            filter,
            parallax_percent: parallax_offset_percent(self.progress),
            nav_scrolled,
            visibility,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(top: f64) -> ScrollMetrics {
        ScrollMetrics {
            scroll_top: top,
            document_height: 3000.0,
            viewport_height: 1000.0,
        }
    }

    #[test]
    fn progress_is_normalized_and_clamped() {
        assert_eq!(metrics(0.0).progress(), 0.0);
        assert_eq!(metrics(1000.0).progress(), 0.5);
        assert_eq!(metrics(2000.0).progress(), 1.0);
        // elastic overscroll on either end
        assert_eq!(metrics(-120.0).progress(), 0.0);
        assert_eq!(metrics(2300.0).progress(), 1.0);
    }

    #[test]
    fn short_page_has_zero_progress() {
        let m = ScrollMetrics {
            scroll_top: 10.0,
            document_height: 800.0,
            viewport_height: 1000.0,
        };
        assert_eq!(m.progress(), 0.0);
    }

    #[test]
    fn filter_css_is_two_decimals() {
        let f = BackdropFilter::from_progress(0.5);
        assert_eq!(f.css(), "brightness(0.60) saturate(0.95) blur(0.0px)");
        assert_eq!(
            f.with_blur(0.3).css(),
            "brightness(0.60) saturate(0.95) blur(3.0px)"
        );
    }

    #[test]
    fn throttle_skips_tiny_moves() {
        let mut t = FilterThrottle::new(0.02);
        assert!(t.offer(BackdropFilter::from_progress(0.0)).is_some());
        // 0.04 progress moves brightness by 0.016 and saturation by 0.012
        assert!(t.offer(BackdropFilter::from_progress(0.04)).is_none());
        assert!(t.offer(BackdropFilter::from_progress(0.06)).is_some());
    }

    #[test]
    fn nav_flips_past_offset_and_clears_above_it() {
        let mut nav = NavState::new(80.0);
        assert_eq!(nav.update(40.0), None);
        assert_eq!(nav.update(120.0), Some(true));
        // scrolling up but still below the offset keeps the look
        assert_eq!(nav.update(100.0), None);
        assert!(nav.is_scrolled());
        assert_eq!(nav.update(60.0), Some(false));
        assert_eq!(nav.update(0.0), None);
    }

    #[test]
    fn nav_clears_when_jumping_back_above_offset() {
        let mut nav = NavState::new(80.0);
        assert_eq!(nav.update(300.0), Some(true));
        assert_eq!(nav.update(40.0), Some(false));
        assert!(!nav.is_scrolled());
    }

    #[test]
    fn pointer_maps_to_centered_unit_square() {
        assert_eq!(normalize_pointer(500.0, 400.0, 1000.0, 800.0), (0.0, 0.0));
        assert_eq!(normalize_pointer(0.0, 800.0, 1000.0, 800.0), (-1.0, 1.0));
        assert_eq!(normalize_pointer(1000.0, 0.0, 1000.0, 800.0), (1.0, -1.0));
        assert_eq!(normalize_pointer(10.0, 10.0, 0.0, 0.0), (0.0, 0.0));
    }

    #[test]
    fn mouse_parallax_sways_around_rest() {
        assert_eq!(mouse_parallax(0.0, 0.0), (0.0, CAMERA_REST_Y));
        let (x, y) = mouse_parallax(1.0, 1.0);
        assert!((x - 0.5).abs() < 1e-6);
        assert!((y - 2.7).abs() < 1e-6);
        let (x, y) = mouse_parallax(-1.0, -1.0);
        assert!((x + 0.5).abs() < 1e-6);
        assert!((y - 3.3).abs() < 1e-6);
    }

    #[test]
    fn range_trigger_uses_both_thresholds() {
        let t = SectionTrigger::story(0.8, 0.2);
        assert!(!t.is_in_view(900.0, 1400.0, 1000.0));
        assert!(t.is_in_view(800.0, 1300.0, 1000.0));
        assert!(t.is_in_view(-300.0, 250.0, 1000.0));
        assert!(!t.is_in_view(-400.0, 150.0, 1000.0));
    }

    #[test]
    fn enter_only_trigger_stays_after_passing() {
        let t = SectionTrigger::enter_only(0.8);
        assert!(!t.is_in_view(850.0, 1500.0, 1000.0));
        assert!(t.is_in_view(700.0, 1500.0, 1000.0));
        assert!(t.is_in_view(-2000.0, -1500.0, 1000.0));
    }

    #[test]
    fn visibility_never_double_fires() {
        let mut v = SectionVisibility::new();
        assert_eq!(v.set("storm", false), None);
        assert!(v.set("storm", true).is_some());
        assert_eq!(v.set("storm", true), None);
        assert!(v.is_visible("storm"));
        assert!(v.set("storm", false).is_some());
        assert_eq!(v.set("storm", false), None);
    }

    #[test]
    fn scroll_nudge_is_capped() {
        assert_eq!(scroll_hope(0.0), 0.0);
        assert!((scroll_hope(0.5) - 0.15).abs() < 1e-6);
        assert_eq!(scroll_hope(2.0), 0.3);
    }
}
