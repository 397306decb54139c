//! Page lifecycle: loading, idle, the hope reveal, then the video.

use log::{info, warn};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Stage {
    Loading,
    Idle,
    HopeReveal,
    Video,
}

/// Loader milestones for the backdrop photo, in percent. An image load has
/// no byte-level progress, so the bar steps at request and at fetch; decode
/// completes it.
pub const PROGRESS_REQUESTED: f32 = 10.0;
pub const PROGRESS_FETCHED: f32 = 70.0;

/// Gate around the one asynchronous load the page does.
///
/// Mirrors the loader callback contract: progress in percent, completion,
/// and errors that fall back to the default backdrop and still complete.
#[derive(Debug, Default, Clone)]
pub struct AssetGate {
    percent: f32,
    complete: bool,
    fallback: Option<String>,
}

impl AssetGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_progress(&mut self, percent: f32) {
        if self.complete || !percent.is_finite() {
            return;
        }
        self.percent = percent.clamp(self.percent, 100.0);
    }

    /// Returns `true` the first time only.
    pub fn on_complete(&mut self) -> bool {
        if self.complete {
            return false;
        }
        self.complete = true;
        self.percent = 100.0;
        true
    }

    /// A failed load must not block the page: record why, then complete.
    pub fn on_error(&mut self, error: &str) -> bool {
        warn!("backdrop load failed, using fallback: {error}");
        if self.fallback.is_none() {
            self.fallback = Some(error.to_string());
        }
        self.on_complete()
    }

    pub fn percent(&self) -> f32 {
        self.percent
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn fallback_reason(&self) -> Option<&str> {
        self.fallback.as_deref()
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    stage: Stage,
    pub assets: AssetGate,
    video_overlay_visible: bool,
    video_thumbnail_visible: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            stage: Stage::Loading,
            assets: AssetGate::new(),
            video_overlay_visible: false,
            video_thumbnail_visible: false,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn loading_progress(&self) -> f32 {
        self.assets.percent()
    }

    pub fn is_hope_mode(&self) -> bool {
        matches!(self.stage, Stage::HopeReveal | Stage::Video)
    }

    pub fn is_video_overlay_visible(&self) -> bool {
        self.video_overlay_visible
    }

    pub fn is_video_thumbnail_visible(&self) -> bool {
        self.video_thumbnail_visible
    }

    /// Leave `Loading` once assets are in, whether they loaded or fell back.
    pub fn finish_loading(&mut self) -> bool {
        if self.stage != Stage::Loading {
            return false;
        }
        self.assets.on_complete();
        self.stage = Stage::Idle;
        info!("scene ready");
        true
    }

    /// Latch for the reveal button. Only an idle, loaded page may start it.
    pub fn request_reveal(&mut self) -> bool {
        if self.stage != Stage::Idle {
            return false;
        }
        self.stage = Stage::HopeReveal;
        true
    }

    pub fn reveal_complete(&mut self) -> bool {
        if self.stage != Stage::HopeReveal {
            return false;
        }
        self.stage = Stage::Video;
        self.video_overlay_visible = true;
        self.video_thumbnail_visible = false;
        true
    }

    /// Closing the overlay leaves a thumbnail to reopen it from.
    pub fn close_video(&mut self) -> bool {
        if !self.video_overlay_visible {
            return false;
        }
        self.video_overlay_visible = false;
        self.video_thumbnail_visible = true;
        true
    }

    pub fn open_video(&mut self) -> bool {
        if self.stage != Stage::Video || self.video_overlay_visible {
            return false;
        }
        self.video_overlay_visible = true;
        self.video_thumbnail_visible = false;
        true
    }
}
