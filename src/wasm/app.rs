use std::cell::RefCell;
use std::rc::Rc;

use log::{info, warn};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{window, HtmlCanvasElement, HtmlImageElement, KeyboardEvent, MouseEvent};

use super::dom::{self, Page, PhotoBackdrop};
use super::render::GlRenderer;
use crate::config::HopeConfig;
use crate::render_loop::Scene;
use crate::scroll::normalize_pointer;
use crate::stage::{PROGRESS_FETCHED, PROGRESS_REQUESTED};

/// Everything the browser callbacks share. Only touched from the UI thread.
struct Shell {
    scene: Scene,
    renderer: GlRenderer,
    backdrop: PhotoBackdrop,
    page: Page,
    scroll_dirty: bool,
    resize_dirty: bool,
    last_ts: Option<f64>,
}

impl Shell {
    fn viewport(&self) -> Option<(f64, f64)> {
        let w = self.page.window.inner_width().ok().and_then(|v| v.as_f64())?;
        let h = self.page.window.inner_height().ok().and_then(|v| v.as_f64())?;
        Some((w, h))
    }

    fn resize(&mut self) {
        if let Some((w, h)) = self.viewport() {
            self.renderer
                .resize(w, h, self.page.window.device_pixel_ratio());
        }
    }

    fn report_progress(&mut self, percent: f32) {
        self.scene.app.assets.on_progress(percent);
        self.page
            .set_loading_progress(self.scene.app.loading_progress());
    }

    fn recompute_scroll(&mut self) {
        let metrics = self.page.scroll_metrics();
        let samples = self.page.section_samples();
        let update = self.scene.on_scroll(metrics, &samples, &mut self.backdrop);
        if let Some(scrolled) = update.nav_scrolled {
            self.page.set_nav_scrolled(scrolled);
        }
        for change in &update.visibility {
            self.page.apply_visibility(change);
        }
    }

    /// One animation frame. Scroll and resize bursts are folded in here.
    fn frame(&mut self, ts: f64) {
        let dt = self
            .last_ts
            .map_or(0.0, |prev| ((ts - prev) / 1000.0).max(0.0)) as f32;
        self.last_ts = Some(ts);

        if self.resize_dirty {
            self.resize_dirty = false;
            self.resize();
            self.scroll_dirty = true;
        }
        if self.scroll_dirty {
            self.scroll_dirty = false;
            self.recompute_scroll();
        }

        let outcome = self
            .scene
            .frame(dt, &mut self.renderer, &mut self.backdrop);
        if outcome.show_video {
            self.page.show_video(&self.scene.config().video_url);
        }
    }
}

type Shared = Rc<RefCell<Shell>>;

pub fn start(canvas: HtmlCanvasElement, config: HopeConfig) -> Result<(), JsValue> {
    let window = window().ok_or("no window")?;
    let document = window.document().ok_or("no document")?;

    let renderer = GlRenderer::new(canvas)?;
    let scene = Scene::new(config);
    let page = Page::bind(
        window.clone(),
        document.clone(),
        scene.story_trigger(),
        scene.experience_trigger(),
    );
    let backdrop = PhotoBackdrop::new(dom::by_id(&document, "bg-image"));

    let shell: Shared = Rc::new(RefCell::new(Shell {
        scene,
        renderer,
        backdrop,
        page,
        scroll_dirty: true,
        resize_dirty: true,
        last_ts: None,
    }));

    listen_viewport(&shell)?;
    listen_buttons(&shell)?;
    load_backdrop(&shell)?;
    run_frames(shell)?;

    info!("hope scene running");
    Ok(())
}

/// Scroll and resize only mark state dirty; the next frame recomputes once.
fn listen_viewport(shell: &Shared) -> Result<(), JsValue> {
    let window = window().ok_or("no window")?;

    let on_scroll = {
        let shell = shell.clone();
        Closure::wrap(Box::new(move || {
            if let Ok(mut s) = shell.try_borrow_mut() {
                s.scroll_dirty = true;
            }
        }) as Box<dyn FnMut()>)
    };
    window.add_event_listener_with_callback("scroll", on_scroll.as_ref().unchecked_ref())?;
    on_scroll.forget();

    let on_resize = {
        let shell = shell.clone();
        Closure::wrap(Box::new(move || {
            if let Ok(mut s) = shell.try_borrow_mut() {
                s.resize_dirty = true;
            }
        }) as Box<dyn FnMut()>)
    };
    window.add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref())?;
    on_resize.forget();

    let on_pointer = {
        let shell = shell.clone();
        Closure::wrap(Box::new(move |e: MouseEvent| {
            let Ok(mut s) = shell.try_borrow_mut() else {
                return;
            };
            if let Some((w, h)) = s.viewport() {
                let (x, y) = normalize_pointer(e.client_x() as f64, e.client_y() as f64, w, h);
                s.scene.on_pointer(x, y);
            }
        }) as Box<dyn FnMut(MouseEvent)>)
    };
    window.add_event_listener_with_callback("mousemove", on_pointer.as_ref().unchecked_ref())?;
    on_pointer.forget();

    Ok(())
}

fn listen_buttons(shell: &Shared) -> Result<(), JsValue> {
    let s = shell.borrow();

    if let Some(btn) = &s.page.hope_button {
        let shell = shell.clone();
        let on_click = Closure::wrap(Box::new(move || {
            let Ok(mut s) = shell.try_borrow_mut() else {
                return;
            };
            if s.scene.start_reveal() {
                s.page.enter_hope_mode();
            }
        }) as Box<dyn FnMut()>);
        btn.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
        on_click.forget();
    }

    if let Some(btn) = &s.page.video_close {
        let shell = shell.clone();
        let on_click = Closure::wrap(Box::new(move || close_video(&shell)) as Box<dyn FnMut()>);
        btn.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
        on_click.forget();
    }

    if let Some(thumb) = &s.page.video_thumbnail {
        let shell = shell.clone();
        let on_click = Closure::wrap(Box::new(move || {
            let Ok(mut s) = shell.try_borrow_mut() else {
                return;
            };
            if s.scene.app.open_video() {
                let url = s.scene.config().video_url.clone();
                s.page.show_video(&url);
            }
        }) as Box<dyn FnMut()>);
        thumb.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
        on_click.forget();
    }

    let on_key = {
        let shell = shell.clone();
        Closure::wrap(Box::new(move |e: KeyboardEvent| {
            if e.key() == "Escape" {
                close_video(&shell);
            }
        }) as Box<dyn FnMut(KeyboardEvent)>)
    };
    s.page
        .document
        .add_event_listener_with_callback("keydown", on_key.as_ref().unchecked_ref())?;
    on_key.forget();

    Ok(())
}

fn close_video(shell: &Shared) {
    let Ok(mut s) = shell.try_borrow_mut() else {
        return;
    };
    if !s.scene.app.close_video() {
        return;
    }
    s.page.begin_hide_video();

    let later = shell.clone();
    dom::after(&s.page.window, 500, move || {
        let Ok(s) = later.try_borrow() else {
            return;
        };
        // reopened while fading out
        if s.scene.app.is_video_overlay_visible() {
            return;
        }
        s.page.finish_hide_video();
    });
}

/// Load the backdrop photo through the asset gate. The bar moves at each
/// milestone: request sent, bytes in, image decoded. A failure at any step
/// falls back to the plain backdrop and still lets the page continue.
fn load_backdrop(shell: &Shared) -> Result<(), JsValue> {
    let img = HtmlImageElement::new()?;
    let url = shell.borrow().scene.config().backdrop_url.clone();

    let onload = {
        let shell = shell.clone();
        let url = url.clone();
        let img = img.clone();
        Closure::once_into_js(move || {
            if let Ok(mut s) = shell.try_borrow_mut() {
                s.report_progress(PROGRESS_FETCHED);
            }

            let decoded = {
                let shell = shell.clone();
                let url = url.clone();
                Closure::once(move |_: JsValue| backdrop_ready(&shell, &url))
            };
            let failed = {
                let shell = shell.clone();
                Closure::once(move |err: JsValue| {
                    let reason = err
                        .as_string()
                        .unwrap_or_else(|| format!("could not decode {url}"));
                    backdrop_failed(&shell, &reason);
                })
            };
            let decoding: js_sys::Promise = img.decode();
            let _ = decoding.then2(&decoded, &failed);
            decoded.forget();
            failed.forget();
        })
    };
    let onerror = {
        let shell = shell.clone();
        let url = url.clone();
        Closure::once_into_js(move || backdrop_failed(&shell, &format!("could not load {url}")))
    };

    img.set_onload(Some(onload.unchecked_ref()));
    img.set_onerror(Some(onerror.unchecked_ref()));
    img.set_src(&url);
    shell.borrow_mut().report_progress(PROGRESS_REQUESTED);
    Ok(())
}

fn backdrop_ready(shell: &Shared, url: &str) {
    let Ok(mut s) = shell.try_borrow_mut() else {
        return;
    };
    if let Some(el) = s.backdrop.element() {
        dom::set_style(el, "background-image", &format!("url(\"{url}\")"));
    }
    info!("backdrop loaded");
    assets_ready(shell, &mut s);
}

fn backdrop_failed(shell: &Shared, reason: &str) {
    let Ok(mut s) = shell.try_borrow_mut() else {
        return;
    };
    s.scene.app.assets.on_error(reason);
    if let Some(el) = s.backdrop.element() {
        dom::add_class(el, "fallback");
    }
    assets_ready(shell, &mut s);
}

fn assets_ready(shell: &Shared, s: &mut Shell) {
    if !s.scene.assets_ready() {
        return;
    }
    s.page.set_loading_progress(s.scene.app.loading_progress());

    let Some(loading) = s.page.loading.clone() else {
        return;
    };
    let window = s.page.window.clone();
    let fade = loading.clone();
    dom::after(&window, 500, move || {
        dom::set_style(&fade, "opacity", "0");
    });
    let shell = shell.clone();
    dom::after(&window, 1500, move || {
        // only hide the overlay if the scene is still past loading
        if shell
            .try_borrow()
            .is_ok_and(|s| s.scene.stage() != crate::stage::Stage::Loading)
        {
            dom::set_style(&loading, "display", "none");
        } else {
            warn!("loading overlay left visible");
        }
    });
}

fn run_frames(shell: Shared) -> Result<(), JsValue> {
    // `f` holds the animation-frame closure so that we can keep calling
    // `request_animation_frame` recursively. Storing it inside an `Option`
    // allows us to create the `Closure` first and then obtain a reference to
    // it from within itself.
    let f: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
    let g = f.clone();
    *g.borrow_mut() = Some(Closure::wrap(Box::new(move |ts: f64| {
        if let Ok(mut s) = shell.try_borrow_mut() {
            s.frame(ts);
        }

        // schedule next
        let next = f.borrow();
        if let (Some(w), Some(cb)) = (window(), next.as_ref()) {
            if w.request_animation_frame(cb.as_ref().unchecked_ref()).is_err() {
                warn!("requestAnimationFrame failed; render loop stopped");
            }
        }
    }) as Box<dyn FnMut(f64)>));

    let w = window().ok_or("no window")?;
    if let Some(cb) = g.borrow().as_ref() {
        w.request_animation_frame(cb.as_ref().unchecked_ref())?;
    }
    Ok(())
}
