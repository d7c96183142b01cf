//! One viewing session: owns the loaded chart, the shared view state and
//! every view built over them. Hosts drive it with load, input and frame
//! calls; nothing here is global, so independent sessions can coexist.

use crate::config::Config;
use crate::error::{ChartError, Result};
use crate::game::chart::ChartData;
use crate::game::layout::{ChartLayout, LayoutCache};
use crate::game::life::{LifeParams, LifeSummary, LifeTimeline, LifeTraces, Reference};
use crate::ui::click_mode::ClickMode;
use crate::ui::density_graph::DensityGraph;
use crate::ui::life_graph::LifeGraph;
use crate::ui::mesh::MeshVertex;
use crate::ui::notefield::{Edit, Notefield, Surface};
use crate::ui::scene::DrawObject;
use crate::ui::segment_nav::SegmentNav;
use crate::ui::view_state::ViewState;
use log::{debug, error, info, warn};
use std::cell::Cell;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::rc::Rc;

pub const TIMELINE_HEIGHT: f32 = 60.0;
pub const LIFEBAR_HEIGHT: f32 = 80.0;
/// Strip width used when the surface reports none, e.g. headless runs.
pub const FALLBACK_STRIP_WIDTH: f32 = 400.0;

#[derive(Debug)]
pub enum SessionStatus {
    Empty,
    Loading,
    Ready,
    Error(ChartError),
    /// A render failed; the host shows its not-found view.
    NotFound,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Export {
    pub file_name: String,
    pub contents: String,
}

impl Export {
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.contents)?;
        Ok(path)
    }
}

/// Everything a drawing backend needs for one frame.
#[derive(Clone, Debug, Default)]
pub struct Frame {
    pub notefield: Vec<DrawObject>,
    pub timeline: Vec<MeshVertex>,
    pub lifebar: Vec<MeshVertex>,
    pub nav_active: Option<usize>,
}

struct Loaded {
    chart_id: String,
    chart: ChartData,
    layout: ChartLayout,
    timeline: LifeTimeline,
    traces: LifeTraces,
    density: DensityGraph,
    life_graph: LifeGraph,
    nav: SegmentNav,
}

#[inline(always)]
fn reference_for(freeze_percent: u8) -> Reference {
    if freeze_percent == 0 {
        Reference::Perfect
    } else {
        Reference::FrozenUntilFirstMiss {
            fraction: f64::from(freeze_percent.min(100)) / 100.0,
        }
    }
}

fn guarded<T>(f: impl FnOnce() -> T) -> Option<T> {
    catch_unwind(AssertUnwindSafe(f)).ok()
}

pub struct Session {
    config: Config,
    surface: Surface,
    view: ViewState,
    layouts: LayoutCache,
    notefield: Notefield,
    status: SessionStatus,
    loaded: Option<Loaded>,
    freeze_percent: u8,
    misses_dirty: Rc<Cell<bool>>,
    scroll_dirty: Rc<Cell<bool>>,
}

impl Session {
    pub fn new(config: Config, surface: Surface) -> Self {
        let view = ViewState::new(config.viewport_height, ClickMode::from_preset(config.click_mode));
        let misses_dirty = Rc::new(Cell::new(true));
        let scroll_dirty = Rc::new(Cell::new(true));
        let flag = Rc::clone(&misses_dirty);
        view.miss_times.subscribe(move |_| flag.set(true));
        let flag = Rc::clone(&scroll_dirty);
        view.scroll_y.subscribe(move |_| flag.set(true));
        Self {
            freeze_percent: config.freeze_percent,
            config,
            surface,
            view,
            layouts: LayoutCache::new(),
            notefield: Notefield::new(),
            status: SessionStatus::Empty,
            loaded: None,
            misses_dirty,
            scroll_dirty,
        }
    }

    #[inline(always)]
    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    /// Shared state; hosts may subscribe to any signal.
    #[inline(always)]
    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn chart(&self) -> Option<&ChartData> {
        self.loaded.as_ref().map(|l| &l.chart)
    }

    pub fn chart_id(&self) -> Option<&str> {
        self.loaded.as_ref().map(|l| l.chart_id.as_str())
    }

    pub fn layout(&self) -> Option<&ChartLayout> {
        self.loaded.as_ref().map(|l| &l.layout)
    }

    #[inline(always)]
    pub fn is_mounted(&self) -> bool {
        self.notefield.is_mounted()
    }

    #[inline(always)]
    pub fn window_visible(&self, arrow_index: usize) -> bool {
        self.notefield.window_visible(arrow_index)
    }

    fn drop_chart(&mut self) {
        self.notefield.teardown(&self.view);
        self.loaded = None;
    }

    /// Marks a fetch in flight. The previous scene is gone from here on.
    pub fn begin_load(&mut self, chart_id: &str) {
        debug!("Loading chart {chart_id}");
        self.drop_chart();
        self.status = SessionStatus::Loading;
    }

    fn fail_load(&mut self, chart_id: &str, e: ChartError) {
        warn!("Failed to load chart {chart_id}: {e}");
        self.drop_chart();
        self.status = SessionStatus::Error(e);
    }

    /// Fetched payload. Returns whether the session is now ready.
    pub fn load_json(&mut self, chart_id: &str, payload: &str) -> bool {
        match ChartData::from_json(payload) {
            Ok(chart) => {
                self.load_chart(chart_id, chart);
                true
            }
            Err(e) => {
                self.fail_load(chart_id, e);
                false
            }
        }
    }

    /// Uploaded bytes; normalized through the same parser as fetched JSON.
    pub fn load_slice(&mut self, chart_id: &str, payload: &[u8]) -> bool {
        match ChartData::from_slice(payload) {
            Ok(chart) => {
                self.load_chart(chart_id, chart);
                true
            }
            Err(e) => {
                self.fail_load(chart_id, e);
                false
            }
        }
    }

    pub fn load_file(&mut self, chart_id: &str, path: &Path) -> bool {
        match std::fs::read(path) {
            Ok(bytes) => self.load_slice(chart_id, &bytes),
            Err(e) => {
                self.fail_load(chart_id, e.into());
                false
            }
        }
    }

    pub fn load_chart(&mut self, chart_id: &str, chart: ChartData) {
        self.drop_chart();
        let layout = self.layouts.get_or_compute(chart_id, &chart);

        self.view.time_scale.set(layout.time_scale);
        self.view.scroll_y.set(0.0);
        self.view.miss_times.set(chart.seeded_miss_times());
        self.notefield
            .mount(&self.surface, chart_id, &chart, layout, &self.view);

        let strip_width = if self.surface.width > 0.0 {
            self.surface.width
        } else {
            FALLBACK_STRIP_WIDTH
        };
        let timeline = LifeTimeline::from_chart(&chart);
        info!(
            "Chart {chart_id} ready: level {}, {} life events, {} seeded misses",
            chart.level(),
            timeline.len(),
            self.view.miss_times.with(Vec::len)
        );
        self.loaded = Some(Loaded {
            chart_id: chart_id.to_owned(),
            density: DensityGraph::new(&chart, &layout, strip_width, TIMELINE_HEIGHT),
            life_graph: LifeGraph::new(strip_width, LIFEBAR_HEIGHT, layout.last_event_time),
            nav: SegmentNav::new(&chart, layout.time_scale, self.config.nav),
            traces: LifeTraces::default(),
            timeline,
            layout,
            chart,
        });
        self.status = SessionStatus::Ready;
        self.misses_dirty.set(true);
        self.scroll_dirty.set(true);
        self.sync();
    }

    pub fn unload(&mut self) {
        self.drop_chart();
        self.status = SessionStatus::Empty;
    }

    /// Replays life and re-syncs the navigator if their inputs moved.
    fn sync(&mut self) {
        let Some(loaded) = self.loaded.as_mut() else {
            return;
        };
        if self.misses_dirty.replace(false) {
            let params = LifeParams::for_level(loaded.chart.level(), self.config.initial_life);
            let reference = reference_for(self.freeze_percent);
            loaded.traces = self
                .view
                .miss_times
                .with(|misses| LifeTraces::compute(&loaded.timeline, params, misses, reference));
            loaded.life_graph.set_traces(&loaded.traces);
            debug!("Life replay for {}: {:?}", loaded.chart_id, loaded.traces.summary());
        }
        if self.scroll_dirty.replace(false) {
            loaded.nav.sync_scroll(self.view.scroll_y.get());
        }
    }

    /// Pointer click in note-field viewport coordinates.
    pub fn click(&mut self, x: f32, y: f32) -> Option<Edit> {
        let loaded = self.loaded.as_mut()?;
        let outcome = self.notefield.click(&self.view, &loaded.chart, x, y)?;
        if let Some(chart) = outcome.chart {
            loaded.chart = chart;
        }
        Some(outcome.edit)
    }

    pub fn on_scroll(&mut self, y: f32) -> bool {
        self.notefield.scroll_to(&self.view, y)
    }

    pub fn scroll_to_time(&mut self, time: f64) -> bool {
        self.notefield.scroll_to_time(&self.view, time)
    }

    /// Deep-link target: puts segment `index` at the top of the note field.
    pub fn scroll_to_segment(&mut self, index: usize) -> bool {
        let Some(y) = self.loaded.as_ref().and_then(|l| l.nav.scroll_target(index)) else {
            debug!("No segment {index} to scroll to.");
            return false;
        };
        self.notefield.scroll_to(&self.view, y)
    }

    /// Click on the timeline strip at `x`.
    pub fn seek_timeline(&mut self, x: f32) -> bool {
        let Some(time) = self.loaded.as_ref().map(|l| l.density.x_to_time(x)) else {
            return false;
        };
        self.scroll_to_time(time)
    }

    pub fn toggle_segment(&mut self, index: usize) -> Option<bool> {
        self.loaded.as_mut()?.nav.toggle(index)
    }

    pub fn nav(&mut self) -> Option<&SegmentNav> {
        self.sync();
        self.loaded.as_ref().map(|l| &l.nav)
    }

    pub fn set_click_mode(&mut self, mode: ClickMode) {
        self.view.click_mode.set(mode);
    }

    pub fn set_miss_times(&mut self, times: Vec<f64>) {
        self.view.miss_times.set(times);
    }

    /// 0 turns the frozen reference off; larger values clamp to 100.
    pub fn set_freeze_percent(&mut self, percent: u8) {
        let percent = percent.min(100);
        if percent != self.freeze_percent {
            self.freeze_percent = percent;
            self.misses_dirty.set(true);
        }
    }

    pub fn traces(&mut self) -> Option<&LifeTraces> {
        self.sync();
        self.loaded.as_ref().map(|l| &l.traces)
    }

    pub fn life_summary(&mut self) -> Option<LifeSummary> {
        self.traces().map(LifeTraces::summary)
    }

    fn build_frame(&mut self) -> Frame {
        self.sync();
        let Some(loaded) = self.loaded.as_mut() else {
            return Frame::default();
        };
        let scroll = self.view.scroll_y.get();
        let viewport_h = self.view.viewport_height.get();

        let mut timeline = Vec::new();
        timeline.extend_from_slice(loaded.density.bars());
        timeline.extend_from_slice(loaded.density.sparkline());
        timeline.extend_from_slice(loaded.density.viewport_mesh(
            scroll,
            viewport_h,
            loaded.layout.time_scale,
        ));

        let mut lifebar = Vec::new();
        lifebar.extend_from_slice(loaded.life_graph.fill());
        lifebar.extend_from_slice(loaded.life_graph.bleed());
        lifebar.extend_from_slice(loaded.life_graph.reference());
        lifebar.extend_from_slice(loaded.life_graph.cursor_mesh(loaded.layout.y_to_time(scroll)));

        Frame {
            notefield: self.notefield.draw_list(&self.view).to_vec(),
            timeline,
            lifebar,
            nav_active: loaded.nav.active_index(),
        }
    }

    /// Renders every view. A panic while rendering drops the chart and moves
    /// the session to `NotFound` instead of unwinding into the host.
    pub fn frame(&mut self) -> Frame {
        if !matches!(self.status, SessionStatus::Ready) {
            return Frame::default();
        }
        match guarded(|| self.build_frame()) {
            Some(frame) => frame,
            None => {
                error!("Render failed for chart {:?}; showing not-found view.", self.chart_id());
                self.drop_chart();
                self.status = SessionStatus::NotFound;
                Frame::default()
            }
        }
    }

    /// Current chart as pretty JSON, named after its identifier.
    pub fn export(&self) -> Result<Export> {
        let loaded = self.loaded.as_ref().ok_or(ChartError::NotLoaded)?;
        Ok(Export {
            file_name: format!("{}.json", loaded.chart_id),
            contents: loaded.chart.to_json_pretty()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::layout::COLUMN_BASE_X;
    use crate::game::life::DEFAULT_INITIAL_LIFE;
    use crate::ui::click_mode::ClickPreset;

    const CHART: &str = r#"[
        [[0, 1.0, "l"], [1, 2.0, "r"], [2, 3.0, "l_miss"], [3, 4.0, "r"]],
        [[4, 4.5, 6.0, "e"]],
        {
            "level": 10,
            "segments": [[0.0, 3.0], [3.0, 6.0]],
            "segment_metadata": [{"level": 9.0}, {"level": 11.0}],
            "hold_ticks": [[4.5, 6.0, 3]]
        }
    ]"#;

    fn session(preset: ClickPreset) -> Session {
        let config = Config {
            click_mode: preset,
            viewport_height: 1000.0,
            ..Config::default()
        };
        let mut s = Session::new(config, Surface::interactive(400.0, 1000.0));
        assert!(s.load_json("abc", CHART), "status: {:?}", s.status());
        s
    }

    /// Viewport point inside arrow `index` at scroll 0 (level 10: 250 px/s).
    fn arrow_point(s: &Session, index: usize) -> (f32, f32) {
        let a = &s.chart().unwrap().arrowarts[index];
        let layout = s.layout().unwrap();
        (layout.panel_x(a.panel) + 5.0, layout.time_to_y(a.time) + 5.0)
    }

    #[test]
    fn load_seeds_misses_and_mounts() {
        let mut s = session(ClickPreset::Cycle);
        assert!(matches!(s.status(), SessionStatus::Ready));
        assert!(s.is_mounted());
        assert_eq!(s.view().miss_times.get(), vec![3.0]);
        assert_eq!(s.view().time_scale.get(), 250.0);
        let summary = s.life_summary().expect("chart is loaded");
        assert!(summary.final_life < summary.life_max);
    }

    #[test]
    fn missing_level_surfaces_error_and_renders_nothing() {
        let mut s = Session::new(Config::default(), Surface::interactive(400.0, 800.0));
        assert!(!s.load_json("bad", r#"[[], [], {"bpm": 100}]"#));
        assert!(matches!(
            s.status(),
            SessionStatus::Error(ChartError::MissingField("level"))
        ));
        assert!(s.chart().is_none());
        assert!(!s.is_mounted());
        assert!(s.frame().notefield.is_empty());

        assert!(s.load_json("good", CHART));
        assert!(matches!(s.status(), SessionStatus::Ready));
    }

    #[test]
    fn headless_session_simulates_without_a_scene() {
        let mut s = Session::new(Config::default(), Surface::headless());
        assert!(s.load_slice("abc", CHART.as_bytes()));
        assert!(!s.is_mounted());
        assert!(s.click(COLUMN_BASE_X + 1.0, 251.0).is_none());
        assert!(!s.on_scroll(100.0));
        let frame = s.frame();
        assert!(frame.notefield.is_empty());
        assert!(!frame.lifebar.is_empty());
        assert!(s.life_summary().is_some());
    }

    #[test]
    fn miss_toggle_round_trip_restores_trace() {
        let mut s = session(ClickPreset::Miss);
        let baseline = s.traces().cloned().expect("chart is loaded");

        let (x, y) = arrow_point(&s, 1);
        assert_eq!(
            s.click(x, y),
            Some(Edit::Miss {
                index: 1,
                time: 2.0,
                added: true
            })
        );
        assert_eq!(s.view().miss_times.get(), vec![3.0, 2.0]);
        let missed = s.traces().cloned().unwrap();
        assert!(
            missed.actual.healths.last() < baseline.actual.healths.last(),
            "extra miss should cost life"
        );
        assert_eq!(missed.reference, baseline.reference);

        s.click(x, y);
        assert_eq!(s.view().miss_times.get(), vec![3.0]);
        assert_eq!(s.traces().unwrap(), &baseline);
        assert_eq!(s.chart().unwrap().arrowarts[1].limb.as_str(), "r");
    }

    #[test]
    fn seeded_miss_toggles_off_by_click() {
        let mut s = session(ClickPreset::Miss);
        let (x, y) = arrow_point(&s, 2);
        s.click(x, y);
        assert!(s.view().miss_times.get().is_empty());
        assert_eq!(s.view().unique_miss_count(), 0);
    }

    #[test]
    fn freeze_percent_pins_life_until_first_miss() {
        let mut s = session(ClickPreset::Cycle);
        s.set_freeze_percent(50);
        let traces = s.traces().unwrap();
        let pinned = 0.5 * traces.life_max;
        assert_eq!(traces.reference.healths[0], DEFAULT_INITIAL_LIFE);
        assert_eq!(traces.reference.healths[1], pinned);
        // Events at 1.0 and 2.0 precede the first miss at 3.0.
        assert_eq!(traces.actual.healths[1], pinned);
        assert_eq!(traces.actual.healths[2], pinned);
        assert!(traces.actual.healths[3] < pinned);
    }

    #[test]
    fn segment_deep_link_scrolls_and_expands() {
        let mut s = session(ClickPreset::Cycle);
        assert!(s.scroll_to_segment(1));
        assert_eq!(s.view().scroll_y.get(), 750.0);
        assert!(s.nav().unwrap().entries()[1].expanded);
        assert!(!s.scroll_to_segment(5));
        assert_eq!(s.toggle_segment(1), Some(false));
    }

    #[test]
    fn frame_carries_every_view() {
        let mut s = session(ClickPreset::Cycle);
        let frame = s.frame();
        // The arrow at 4 s starts exactly at the viewport bottom and is culled.
        assert_eq!(frame.notefield.len(), 3);
        assert!(!frame.timeline.is_empty());
        assert!(!frame.lifebar.is_empty());
        assert_eq!(frame.nav_active, Some(0));
    }

    #[test]
    fn export_names_file_by_chart_id() {
        let mut s = session(ClickPreset::Cycle);
        let (x, y) = arrow_point(&s, 0);
        assert!(matches!(s.click(x, y), Some(Edit::Arrow { index: 0, .. })));

        let export = s.export().expect("chart is loaded");
        assert_eq!(export.file_name, "abc.json");
        let back = ChartData::from_json(&export.contents).expect("export should parse");
        assert_eq!(back.arrowarts[0].limb.as_str(), "r");
        assert!(back.manually_annotated);

        s.unload();
        assert!(matches!(s.export(), Err(ChartError::NotLoaded)));
    }

    #[test]
    fn chart_switch_rebuilds_and_unload_is_idempotent() {
        let mut s = session(ClickPreset::Cycle);
        // Session listener plus the note field's.
        assert_eq!(s.view().scroll_y.subscriber_count(), 2);
        assert!(s.load_json("other", r#"[[[0, 1.0, "l"]], [], {"level": 3}]"#));
        assert_eq!(s.chart_id(), Some("other"));
        assert_eq!(s.view().scroll_y.subscriber_count(), 2);
        assert!(s.view().miss_times.get().is_empty());

        s.unload();
        s.unload();
        assert_eq!(s.view().scroll_y.subscriber_count(), 1);
        assert!(matches!(s.status(), SessionStatus::Empty));
    }

    #[test]
    fn reloading_an_id_with_new_data_recomputes_layout() {
        let mut s = session(ClickPreset::Cycle);
        let before = *s.layout().unwrap();
        let chart = s.chart().unwrap().clone();

        s.load_chart("abc", chart);
        assert_eq!(s.layout(), Some(&before));

        assert!(s.load_json("abc", r#"[[[7, 9.0, "l"]], [], {"level": 20}]"#));
        let after = s.layout().unwrap();
        assert_eq!(after.panel_count, 10);
        assert_eq!(after.time_scale, 400.0);
        assert_eq!(after.last_event_time, 9.0);
    }

    #[test]
    fn render_guard_turns_panics_into_none() {
        assert_eq!(guarded(|| 7), Some(7));
        assert_eq!(guarded(|| -> i32 { panic!("render failed") }), None);
    }
}
