//! DOM handles the scene writes to. Every target is optional: a missing
//! element turns its effect into a no-op.

use log::warn;
use wasm_bindgen::{closure::Closure, JsCast};
use web_sys::{Document, Element, HtmlElement, HtmlIFrameElement, Window};

use crate::render_loop::Backdrop;
use crate::scroll::{ScrollMetrics, SectionSample, SectionTrigger, VisibilityChange};

pub fn by_id<T: JsCast>(document: &Document, id: &str) -> Option<T> {
    let found = document
        .get_element_by_id(id)
        .and_then(|el| el.dyn_into::<T>().ok());
    if found.is_none() {
        warn!("#{id} not found; its effect is disabled");
    }
    found
}

pub fn add_class(el: &Element, class: &str) {
    let _ = el.class_list().add_1(class);
}

pub fn remove_class(el: &Element, class: &str) {
    let _ = el.class_list().remove_1(class);
}

pub fn set_style(el: &HtmlElement, prop: &str, value: &str) {
    let _ = el.style().set_property(prop, value);
}

/// Run `f` once after `ms` milliseconds.
pub fn after(window: &Window, ms: i32, f: impl FnOnce() + 'static) {
    let cb = Closure::once_into_js(f);
    if window
        .set_timeout_with_callback_and_timeout_and_arguments_0(cb.unchecked_ref(), ms)
        .is_err()
    {
        warn!("setTimeout failed");
    }
}

/// The background photo behind the canvas.
pub struct PhotoBackdrop {
    el: Option<HtmlElement>,
}

impl PhotoBackdrop {
    pub fn new(el: Option<HtmlElement>) -> Self {
        Self { el }
    }

    pub fn element(&self) -> Option<&HtmlElement> {
        self.el.as_ref()
    }
}

impl Backdrop for PhotoBackdrop {
    fn set_filter(&mut self, css: &str) {
        if let Some(el) = &self.el {
            set_style(el, "filter", css);
        }
    }

    fn set_parallax(&mut self, percent: f32) {
        if let Some(el) = &self.el {
            set_style(el, "transform", &format!("translate3d(0, {percent:.2}%, 0)"));
        }
    }
}

/// A scroll-triggered section and the id its visibility is tracked under.
struct TrackedSection {
    id: String,
    el: Element,
    trigger: SectionTrigger,
}

pub struct Page {
    pub window: Window,
    pub document: Document,
    pub nav: Option<Element>,
    pub loading: Option<HtmlElement>,
    pub progress_bar: Option<HtmlElement>,
    pub hope_button: Option<HtmlElement>,
    pub canvas_container: Option<Element>,
    pub video_overlay: Option<Element>,
    pub video_player: Option<HtmlIFrameElement>,
    pub video_close: Option<HtmlElement>,
    pub video_thumbnail: Option<HtmlElement>,
    sections: Vec<TrackedSection>,
}

impl Page {
    pub fn bind(
        window: Window,
        document: Document,
        story: SectionTrigger,
        experience: SectionTrigger,
    ) -> Self {
        let mut sections = Vec::new();
        if let Ok(list) = document.query_selector_all(".story-content") {
            for i in 0..list.length() {
                let Some(el) = list.item(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
                    continue;
                };
                let id = el
                    .get_attribute("data-story")
                    .unwrap_or_else(|| format!("story-{i}"));
                sections.push(TrackedSection {
                    id,
                    el,
                    trigger: story,
                });
            }
        }
        if let Ok(Some(el)) = document.query_selector(".experience-content") {
            sections.push(TrackedSection {
                id: "experience".to_string(),
                el,
                trigger: experience,
            });
        }

        Self {
            nav: by_id(&document, "nav"),
            loading: by_id(&document, "loading"),
            progress_bar: by_id(&document, "progress-bar"),
            hope_button: by_id(&document, "hope-btn"),
            canvas_container: by_id(&document, "canvas-container"),
            video_overlay: by_id(&document, "video-overlay"),
            video_player: by_id(&document, "youtube-player"),
            video_close: by_id(&document, "video-close"),
            video_thumbnail: by_id(&document, "video-thumbnail"),
            sections,
            window,
            document,
        }
    }

    pub fn scroll_metrics(&self) -> ScrollMetrics {
        let root = self.document.document_element();
        ScrollMetrics {
            scroll_top: self.window.scroll_y().unwrap_or(0.0),
            document_height: root.as_ref().map_or(0, |r| r.scroll_height()) as f64,
            viewport_height: self
                .window
                .inner_height()
                .ok()
                .and_then(|v| v.as_f64())
                .unwrap_or(0.0),
        }
    }

    pub fn section_samples(&self) -> Vec<SectionSample> {
        self.sections
            .iter()
            .map(|s| {
                let rect = s.el.get_bounding_client_rect();
                SectionSample {
                    id: s.id.clone(),
                    trigger: s.trigger,
                    rect_top: rect.top(),
                    rect_bottom: rect.bottom(),
                }
            })
            .collect()
    }

    pub fn apply_visibility(&self, change: &VisibilityChange) {
        let Some(s) = self.sections.iter().find(|s| s.id == change.section) else {
            return;
        };
        if change.visible {
            add_class(&s.el, "visible");
        } else {
            remove_class(&s.el, "visible");
        }
    }

    pub fn set_nav_scrolled(&self, scrolled: bool) {
        if let Some(nav) = &self.nav {
            if scrolled {
                add_class(nav, "scrolled");
            } else {
                remove_class(nav, "scrolled");
            }
        }
    }

    pub fn set_loading_progress(&self, percent: f32) {
        if let Some(bar) = &self.progress_bar {
            set_style(bar, "width", &format!("{percent:.0}%"));
        }
    }

    pub fn enter_hope_mode(&self) {
        if let Some(body) = self.document.body() {
            add_class(&body, "hope-mode");
        }
        if let Some(btn) = &self.hope_button {
            add_class(btn, "hidden");
        }
        if let Some(container) = &self.canvas_container {
            add_class(container, "interactive");
        }
    }

    pub fn show_video(&self, url: &str) {
        if let Some(player) = &self.video_player {
            player.set_src(url);
        }
        if let Some(thumb) = &self.video_thumbnail {
            remove_class(thumb, "visible");
        }
        if let Some(overlay) = &self.video_overlay {
            remove_class(overlay, "hidden");
            let overlay = overlay.clone();
            let cb = Closure::once_into_js(move || add_class(&overlay, "visible"));
            if self
                .window
                .request_animation_frame(cb.unchecked_ref())
                .is_err()
            {
                warn!("requestAnimationFrame failed");
            }
        }
    }

    /// Start the overlay fade; the caller finishes it with `finish_hide_video`.
    pub fn begin_hide_video(&self) {
        if let Some(overlay) = &self.video_overlay {
            remove_class(overlay, "visible");
        }
        if let Some(thumb) = &self.video_thumbnail {
            add_class(thumb, "visible");
        }
    }

    pub fn finish_hide_video(&self) {
        if let Some(overlay) = &self.video_overlay {
            add_class(overlay, "hidden");
        }
        if let Some(player) = &self.video_player {
            // stops playback
            player.set_src("");
        }
    }
}
