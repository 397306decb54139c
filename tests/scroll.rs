use hope_scene::scroll::{SectionSample, SectionTrigger};
use hope_scene::{Backdrop, HopeConfig, Scene, ScrollMetrics, ScrollTracker};

#[derive(Default)]
struct Photo {
    filters: Vec<String>,
    parallax: Vec<f32>,
}

impl Backdrop for Photo {
    fn set_filter(&mut self, css: &str) {
        self.filters.push(css.to_string());
    }
    fn set_parallax(&mut self, percent: f32) {
        self.parallax.push(percent);
    }
}

fn page(top: f64) -> ScrollMetrics {
    ScrollMetrics {
        scroll_top: top,
        document_height: 5000.0,
        viewport_height: 1000.0,
    }
}

/// A story section 600px tall sitting at `offset` on the page.
fn story(id: &str, offset: f64, scroll_top: f64) -> SectionSample {
    SectionSample {
        id: id.to_string(),
        trigger: SectionTrigger::story(0.8, 0.2),
        rect_top: offset - scroll_top,
        rect_bottom: offset + 600.0 - scroll_top,
    }
}

#[test]
fn halfway_scroll_sets_backdrop() {
    let mut tracker = ScrollTracker::new(0.02, 80.0);
    let update = tracker.update(page(2000.0), &[]);
    assert_eq!(update.progress, 0.5);
    let f = update.filter.unwrap();
    assert!((f.brightness - 0.6).abs() < 1e-6);
    assert!((f.saturation - 0.95).abs() < 1e-6);
    assert_eq!(update.parallax_percent, 10.0);
}

#[test]
fn overscroll_is_clamped() {
    let mut tracker = ScrollTracker::new(0.02, 80.0);
    assert_eq!(tracker.update(page(-200.0), &[]).progress, 0.0);
    assert_eq!(tracker.update(page(4600.0), &[]).progress, 1.0);
}

#[test]
fn sections_toggle_once_per_crossing() {
    let mut tracker = ScrollTracker::new(0.02, 80.0);
    let mut visible_events = 0;
    let mut hidden_events = 0;

    // scroll the page down in 10px steps past a section at 1500px, then back
    let tops: Vec<f64> = (0..=250).map(|i| i as f64 * 10.0).collect();
    for &top in tops.iter().chain(tops.iter().rev()) {
        let update = tracker.update(page(top), &[story("change", 1500.0, top)]);
        for change in update.visibility {
            if change.visible {
                visible_events += 1;
            } else {
                hidden_events += 1;
            }
        }
    }

    // entered going down, left past the top, entered back, left back
    assert_eq!(visible_events, 2);
    assert_eq!(hidden_events, 2);
    assert!(!tracker.sections().is_visible("change"));
}

#[test]
fn holding_still_produces_no_events() {
    let mut tracker = ScrollTracker::new(0.02, 80.0);
    let first = tracker.update(page(1000.0), &[story("storm", 1200.0, 1000.0)]);
    assert_eq!(first.visibility.len(), 1);
    for _ in 0..10 {
        let again = tracker.update(page(1000.0), &[story("storm", 1200.0, 1000.0)]);
        assert!(again.visibility.is_empty());
        assert!(again.filter.is_none());
        assert!(again.nav_scrolled.is_none());
    }
}

#[test]
fn nav_reports_scrolled_state() {
    let mut tracker = ScrollTracker::new(0.02, 80.0);
    assert_eq!(tracker.update(page(200.0), &[]).nav_scrolled, Some(true));
    assert_eq!(tracker.update(page(0.0), &[]).nav_scrolled, Some(false));
}

#[test]
fn nav_clears_once_back_above_the_offset() {
    let mut tracker = ScrollTracker::new(0.02, 80.0);
    assert_eq!(tracker.update(page(300.0), &[]).nav_scrolled, Some(true));
    assert_eq!(tracker.update(page(40.0), &[]).nav_scrolled, Some(false));
}

#[test]
fn scene_writes_filter_only_for_visible_changes() {
    let mut scene = Scene::new(HopeConfig::default());
    let mut photo = Photo::default();
    for top in [0.0, 10.0, 20.0, 30.0, 2000.0] {
        scene.on_scroll(page(top), &[], &mut photo);
    }
    assert_eq!(
        photo.filters,
        vec![
            "brightness(0.40) saturate(0.80) blur(3.0px)".to_string(),
            "brightness(0.60) saturate(0.95) blur(3.0px)".to_string(),
        ]
    );
    assert_eq!(photo.parallax.len(), 5);
    assert_eq!(scene.scroll_progress(), 0.5);
}
