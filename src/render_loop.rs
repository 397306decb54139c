//! Per-frame fan-out from the two scene scalars to the renderer and the DOM.
//!
//! `Scene` owns the hope timeline, the scroll tracker and the lifecycle
//! state explicitly; the browser shell holds one `Scene` and hands it the
//! renderer and backdrop each frame.
//!
//! The fog and the backdrop filter are the only targets both scalars can
//! drive. They are resolved last-writer-wins in a fixed order: scroll writes
//! first, and once the reveal has started the hope side writes over it.

use log::info;

use crate::config::HopeConfig;
use crate::ease::Ease;
use crate::scroll::{
    mouse_parallax, scroll_hope, BackdropFilter, ScrollMetrics, ScrollTracker, ScrollUpdate,
    SectionSample, SectionTrigger,
};
use crate::sinks::{SinkTable, VisualParams};
use crate::stage::{AppState, Stage};
use crate::timeline::{HopeTimeline, TimelineTick};

/// The WebGL side of a frame.
pub trait SceneRenderer {
    fn set_exposure(&mut self, exposure: f32);
    fn set_bloom(&mut self, strength: f32, threshold: f32);
    /// Scale applied to the ambient light on the water and the pier.
    fn set_environment(&mut self, intensity: f32);
    /// Push every remaining uniform for this frame.
    fn apply_frame(&mut self, frame: &FrameParams);
    fn render(&mut self);
}

/// The DOM side: the background photo behind the canvas.
pub trait Backdrop {
    fn set_filter(&mut self, css: &str);
    fn set_parallax(&mut self, percent: f32);
}

/// Inputs and derived parameters for one frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameParams {
    pub time: f32,
    pub hope: f32,
    pub scroll: f32,
    /// Factor the fog sinks were evaluated at.
    pub fog_drive: f32,
    /// Camera position from the pointer parallax.
    pub camera: (f32, f32),
    pub visuals: VisualParams,
}

impl FrameParams {
    /// Pure mapping: the same inputs always produce the same frame.
    pub fn compute(
        sinks: &SinkTable,
        time: f32,
        hope: f32,
        scroll: f32,
        pointer: (f32, f32),
        reveal_started: bool,
    ) -> Self {
        let hope = hope.clamp(0.0, 1.0);
        let scroll = scroll.clamp(0.0, 1.0);
        let fog_drive = if reveal_started {
            hope
        } else {
            scroll_hope(scroll)
        };
        Self {
            time,
            hope,
            scroll,
            fog_drive,
            camera: mouse_parallax(pointer.0, pointer.1),
            visuals: sinks.evaluate(hope, fog_drive),
        }
    }
}

/// What happened during one `Scene::frame`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameOutcome {
    pub params: FrameParams,
    pub tick: TimelineTick,
    /// The reveal finished and the video should be shown.
    pub show_video: bool,
}

#[derive(Debug)]
pub struct Scene {
    config: HopeConfig,
    timeline: HopeTimeline,
    scroll: ScrollTracker,
    pub app: AppState,
    time: f32,
    pointer: (f32, f32),
    scroll_filter: Option<BackdropFilter>,
    last_filter_css: Option<String>,
}

impl Scene {
    pub fn new(config: HopeConfig) -> Self {
        let timeline = HopeTimeline::new(
            config.phases.clone(),
            config.hope_epsilon,
            config.reveal_delay_secs,
        );
        let scroll = ScrollTracker::new(config.filter_epsilon, config.nav_offset_px);
        Self {
            config,
            timeline,
            scroll,
            app: AppState::new(),
            time: 0.0,
            pointer: (0.0, 0.0),
            scroll_filter: None,
            last_filter_css: None,
        }
    }

    pub fn config(&self) -> &HopeConfig {
        &self.config
    }

    pub fn timeline(&self) -> &HopeTimeline {
        &self.timeline
    }

    pub fn hope_factor(&self) -> f32 {
        self.timeline.emitted_factor()
    }

    pub fn scroll_progress(&self) -> f32 {
        self.scroll.progress()
    }

    pub fn elapsed(&self) -> f32 {
        self.time
    }

    pub fn story_trigger(&self) -> SectionTrigger {
        SectionTrigger::story(self.config.sections.start_ratio, self.config.sections.end_ratio)
    }

    pub fn experience_trigger(&self) -> SectionTrigger {
        SectionTrigger::enter_only(self.config.sections.start_ratio)
    }

    /// Latest pointer position, normalized to [-1,1] on both axes.
    pub fn on_pointer(&mut self, x: f32, y: f32) {
        self.pointer = (x.clamp(-1.0, 1.0), y.clamp(-1.0, 1.0));
    }

    /// Assets are in (or fell back); the page becomes interactive.
    pub fn assets_ready(&mut self) -> bool {
        self.app.finish_loading()
    }

    /// Button handler. Only the first call on a loaded page starts anything.
    pub fn start_reveal(&mut self) -> bool {
        if self.timeline.schedule().phases().is_empty() {
            return false;
        }
        if !self.app.request_reveal() {
            return false;
        }
        self.timeline.start()
    }

    /// Recompute scroll state. The scroll-driven backdrop filter is only
    /// written while the reveal has not taken the backdrop over.
    pub fn on_scroll(
        &mut self,
        metrics: ScrollMetrics,
        samples: &[SectionSample],
        backdrop: &mut impl Backdrop,
    ) -> ScrollUpdate {
        let update = self.scroll.update(metrics, samples);
        if let Some(f) = update.filter {
            self.scroll_filter = Some(f);
            if !self.timeline.is_started() {
                let f = f.with_blur(self.backdrop_blur());
                self.write_filter(f, backdrop);
            }
        }
        backdrop.set_parallax(update.parallax_percent);
        update
    }

    /// One display frame.
    pub fn frame<R, B>(&mut self, dt: f32, renderer: &mut R, backdrop: &mut B) -> FrameOutcome
    where
        R: SceneRenderer + ?Sized,
        B: Backdrop + ?Sized,
    {
        self.time += dt.max(0.0);
        let tick = self.timeline.tick(dt);

        let show_video = tick.revealed && self.app.reveal_complete();
        if show_video {
            info!("showing video after reveal");
        }

        let params = FrameParams::compute(
            &self.config.sinks,
            self.time,
            self.hope_factor(),
            self.scroll.progress(),
            self.pointer,
            self.timeline.is_started(),
        );

        if self.timeline.is_started() {
            let f = self.reveal_filter().with_blur(params.visuals.background_blur);
            self.write_filter(f, backdrop);
        }

        renderer.set_exposure(params.visuals.exposure);
        renderer.set_bloom(params.visuals.bloom_strength, params.visuals.bloom_threshold);
        renderer.set_environment(params.visuals.env_intensity);
        renderer.apply_frame(&params);
        renderer.render();

        FrameOutcome {
            params,
            tick,
            show_video,
        }
    }

    /// Backdrop filter during the reveal: a power2.inOut tween from wherever
    /// scroll left it to the hope look.
    fn reveal_filter(&self) -> BackdropFilter {
        let from = self
            .scroll_filter
            .unwrap_or_else(|| BackdropFilter::from_progress(self.scroll.progress()));
        let span = self.config.backdrop_tween_secs;
        let t = if span > 0.0 {
            self.timeline.elapsed() / span
        } else {
            1.0
        };
        from.lerp(BackdropFilter::HOPE, Ease::InOutCubic.sample(t))
    }

    fn backdrop_blur(&self) -> f32 {
        self.config.sinks.background_blur.at(self.hope_factor())
    }

    fn write_filter<B: Backdrop + ?Sized>(&mut self, filter: BackdropFilter, backdrop: &mut B) {
        let css = filter.css();
        if self.last_filter_css.as_deref() == Some(css.as_str()) {
            return;
        }
        backdrop.set_filter(&css);
        self.last_filter_css = Some(css);
    }

    pub fn stage(&self) -> Stage {
        self.app.stage()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        exposure: Vec<f32>,
        bloom: Vec<(f32, f32)>,
        environment: Vec<f32>,
        camera: Option<(f32, f32)>,
        frames: usize,
        renders: usize,
    }

    impl SceneRenderer for Recorder {
        fn set_exposure(&mut self, exposure: f32) {
            self.exposure.push(exposure);
        }
        fn set_bloom(&mut self, strength: f32, threshold: f32) {
            self.bloom.push((strength, threshold));
        }
        fn set_environment(&mut self, intensity: f32) {
            self.environment.push(intensity);
        }
        fn apply_frame(&mut self, frame: &FrameParams) {
            self.camera = Some(frame.camera);
            self.frames += 1;
        }
        fn render(&mut self) {
            self.renders += 1;
        }
    }

    #[derive(Default)]
    struct Photo {
        filters: Vec<String>,
        parallax: Option<f32>,
    }

    impl Backdrop for Photo {
        fn set_filter(&mut self, css: &str) {
            self.filters.push(css.to_string());
        }
        fn set_parallax(&mut self, percent: f32) {
            self.parallax = Some(percent);
        }
    }

    #[test]
    fn frame_params_are_deterministic() {
        let sinks = SinkTable::default();
        let a = FrameParams::compute(&sinks, 3.5, 0.42, 0.3, (0.2, -0.4), true);
        let b = FrameParams::compute(&sinks, 3.5, 0.42, 0.3, (0.2, -0.4), true);
        assert_eq!(a, b);
    }

    #[test]
    fn fog_follows_scroll_until_reveal() {
        let sinks = SinkTable::default();
        let before = FrameParams::compute(&sinks, 0.0, 0.0, 1.0, (0.0, 0.0), false);
        assert!((before.fog_drive - 0.3).abs() < 1e-6);
        let during = FrameParams::compute(&sinks, 0.0, 0.0, 1.0, (0.0, 0.0), true);
        assert_eq!(during.fog_drive, 0.0);
    }

    #[test]
    fn every_frame_renders_once() {
        let mut scene = Scene::new(HopeConfig::default());
        let mut r = Recorder::default();
        let mut photo = Photo::default();
        for _ in 0..3 {
            scene.frame(0.016, &mut r, &mut photo);
        }
        assert_eq!(r.renders, 3);
        assert_eq!(r.frames, 3);
        assert_eq!(r.exposure, vec![0.8; 3]);
        assert_eq!(r.bloom[0], (0.2, 0.3));
        assert_eq!(r.environment, vec![0.1; 3]);
    }

    #[test]
    fn environment_brightens_with_the_reveal() {
        let mut scene = Scene::new(HopeConfig::default());
        let mut r = Recorder::default();
        let mut photo = Photo::default();
        scene.assets_ready();
        scene.start_reveal();
        scene.frame(12.0, &mut r, &mut photo);
        let env = r.environment.last().copied().unwrap();
        assert!((env - 1.0).abs() < 1e-6);
    }

    #[test]
    fn pointer_moves_the_camera() {
        let mut scene = Scene::new(HopeConfig::default());
        let mut r = Recorder::default();
        let mut photo = Photo::default();
        scene.frame(0.016, &mut r, &mut photo);
        assert_eq!(r.camera, Some((0.0, 3.0)));
        scene.on_pointer(1.0, -3.0);
        scene.frame(0.016, &mut r, &mut photo);
        let (x, y) = r.camera.unwrap();
        assert!((x - 0.5).abs() < 1e-6);
        assert!((y - 3.3).abs() < 1e-6);
    }

    #[test]
    fn reveal_is_gated_on_loading() {
        let mut scene = Scene::new(HopeConfig::default());
        assert!(!scene.start_reveal());
        scene.assets_ready();
        assert!(scene.start_reveal());
        assert!(!scene.start_reveal());
    }

    #[test]
    fn empty_schedule_leaves_the_page_idle() {
        let config = HopeConfig {
            phases: crate::timeline::PhaseSchedule::new(Vec::new()),
            ..HopeConfig::default()
        };
        let mut scene = Scene::new(config);
        let mut r = Recorder::default();
        let mut photo = Photo::default();
        scene.assets_ready();
        assert!(!scene.start_reveal());
        assert_eq!(scene.stage(), Stage::Idle);
        assert!(!scene.frame(1.0, &mut r, &mut photo).show_video);
    }

    #[test]
    fn reveal_takes_the_backdrop_over() {
        let mut scene = Scene::new(HopeConfig::default());
        let mut r = Recorder::default();
        let mut photo = Photo::default();
        scene.assets_ready();
        let m = ScrollMetrics {
            scroll_top: 0.0,
            document_height: 2000.0,
            viewport_height: 1000.0,
        };
        scene.on_scroll(m, &[], &mut photo);
        assert_eq!(photo.filters, vec!["brightness(0.40) saturate(0.80) blur(3.0px)".to_string()]);

        scene.start_reveal();
        scene.frame(12.0, &mut r, &mut photo);
        assert_eq!(
            photo.filters.last().map(String::as_str),
            Some("brightness(0.90) saturate(1.20) blur(0.0px)")
        );

        // scrolling after the reveal no longer writes the filter
        let writes = photo.filters.len();
        scene.on_scroll(ScrollMetrics { scroll_top: 1000.0, ..m }, &[], &mut photo);
        assert_eq!(photo.filters.len(), writes);
        assert_eq!(photo.parallax, Some(20.0));
    }
}
