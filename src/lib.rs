//! Scene controller for the "Hope" scrolling story.
//!
//! One hope factor and one scroll progress value drive every visual
//! parameter of the WebGL backdrop. The core modules are plain Rust and run
//! on any target; the browser binding lives in `wasm` and is only compiled
//! for `wasm32`.

pub mod config;
pub mod ease;
pub mod render_loop;
pub mod scroll;
pub mod sinks;
pub mod stage;
pub mod timeline;

pub use config::HopeConfig;
pub use render_loop::{Backdrop, FrameOutcome, FrameParams, Scene, SceneRenderer};
pub use scroll::{ScrollMetrics, ScrollTracker};
pub use sinks::{SinkTable, VisualParams};
pub use stage::{AppState, AssetGate, Stage};
pub use timeline::{HopeTimeline, Phase, PhaseSchedule, TimelineState, TimelineTick};

// Only compile wasm-specific code when targeting wasm32.

#[cfg(target_arch = "wasm32")]
mod wasm {
    use wasm_bindgen::prelude::*;

    use crate::config::HopeConfig;

    mod app;
    mod dom;
    mod render;

    #[wasm_bindgen(start)]
    pub fn main() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).ok();

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;
        let canvas = document
            .get_element_by_id("scene")
            .ok_or("canvas not found")?
            .dyn_into::<web_sys::HtmlCanvasElement>()?;

        let config = match document
            .get_element_by_id("hope-config")
            .and_then(|el| el.text_content())
        {
            Some(text) => HopeConfig::from_json(&text).unwrap_or_else(|e| {
                log::warn!("ignoring hope config: {e:#}");
                HopeConfig::default()
            }),
            None => HopeConfig::default(),
        };

        app::start(canvas, config)?;
        Ok(())
    }
}
