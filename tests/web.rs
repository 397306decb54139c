#![cfg(target_arch = "wasm32")]

use hope_scene::scroll::{ScrollMetrics, SectionTrigger};
use hope_scene::{Backdrop, FrameParams, HopeConfig, Scene, SceneRenderer};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

struct Null;

impl SceneRenderer for Null {
    fn set_exposure(&mut self, _: f32) {}
    fn set_bloom(&mut self, _: f32, _: f32) {}
    fn set_environment(&mut self, _: f32) {}
    fn apply_frame(&mut self, _: &FrameParams) {}
    fn render(&mut self) {}
}

struct StyleBackdrop(web_sys::HtmlElement);

impl Backdrop for StyleBackdrop {
    fn set_filter(&mut self, css: &str) {
        self.0.style().set_property("filter", css).unwrap();
    }
    fn set_parallax(&mut self, _: f32) {}
}

#[wasm_bindgen_test]
fn reveal_drives_a_real_element_filter() {
    let document = web_sys::window().unwrap().document().unwrap();
    let el = document
        .create_element("div")
        .unwrap()
        .dyn_into::<web_sys::HtmlElement>()
        .unwrap();
    document.body().unwrap().append_child(&el).unwrap();

    let mut scene = Scene::new(HopeConfig::default());
    let mut backdrop = StyleBackdrop(el.clone());
    scene.assets_ready();
    assert!(scene.start_reveal());
    let out = scene.frame(12.0, &mut Null, &mut backdrop);

    assert!(out.show_video);
    let filter = el.style().get_property_value("filter").unwrap();
    assert!(filter.contains("brightness(0.9"), "filter={filter}");
    assert!(filter.contains("blur("), "filter={filter}");
}

#[wasm_bindgen_test]
fn bounding_rect_feeds_section_trigger() {
    let window = web_sys::window().unwrap();
    let document = window.document().unwrap();
    let el = document.create_element("div").unwrap();
    el.set_attribute("style", "position:absolute;top:0;height:50px").unwrap();
    document.body().unwrap().append_child(&el).unwrap();

    let rect = el.get_bounding_client_rect();
    let vh = window.inner_height().unwrap().as_f64().unwrap();
    let trigger = SectionTrigger::story(0.8, 0.2);
    let expected = rect.bottom() >= 0.2 * vh;
    assert_eq!(trigger.is_in_view(rect.top(), rect.bottom(), vh), expected);

    let metrics = ScrollMetrics {
        scroll_top: window.scroll_y().unwrap(),
        document_height: document.document_element().unwrap().scroll_height() as f64,
        viewport_height: vh,
    };
    let p = metrics.progress();
    assert!((0.0..=1.0).contains(&p));
}
