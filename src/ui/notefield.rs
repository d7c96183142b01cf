use crate::game::annotation::{Annotation, Limb};
use crate::game::chart::{ArrowArt, ChartData, HoldArt};
use crate::game::layout::{ARROW_SIZE, ChartLayout};
use crate::game::timing_windows::window_bands;
use crate::ui::click_mode::{ClickBehavior, ClickMode};
use crate::ui::color;
use crate::ui::scene::{
    DrawObject, Layer, NodeId, NodeKind, NotePart, PanelGlyph, Scene, SpriteAsset,
};
use crate::ui::view_state::{SubscriptionId, ViewState};
use glam::Vec2;
use log::{debug, info};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::cell::Cell;
use std::rc::Rc;

pub const MISS_ALPHA: f32 = 0.35;
pub const WINDOW_MARKER_HEIGHT: f32 = 2.0;

/// What the host can draw into.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Surface {
    pub interactive: bool,
    pub width: f32,
    pub height: f32,
}

impl Surface {
    pub const fn headless() -> Self {
        Self {
            interactive: false,
            width: 0.0,
            height: 0.0,
        }
    }

    pub const fn interactive(width: f32, height: f32) -> Self {
        Self {
            interactive: true,
            width,
            height,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Edit {
    Arrow {
        index: usize,
        from: Annotation,
        to: Annotation,
    },
    Hold {
        index: usize,
        from: Annotation,
        to: Annotation,
    },
    Miss {
        index: usize,
        time: f64,
        added: bool,
    },
    Window {
        index: usize,
        visible: bool,
    },
}

#[derive(Clone, Debug)]
pub struct ClickOutcome {
    pub edit: Edit,
    /// New chart snapshot when the click changed note data.
    pub chart: Option<ChartData>,
}

#[inline(always)]
fn cell_contains(min: Vec2, p: Vec2) -> bool {
    p.x >= min.x && p.x < min.x + ARROW_SIZE && p.y >= min.y && p.y < min.y + ARROW_SIZE
}

/// First arrow whose cell contains `p`, scanning in chart order.
pub fn hit_arrow(layout: &ChartLayout, arrows: &[ArrowArt], p: Vec2) -> Option<usize> {
    arrows.iter().position(|a| {
        cell_contains(Vec2::new(layout.panel_x(a.panel), layout.time_to_y(a.time)), p)
    })
}

/// First hold whose head or cap cell contains `p`. The trail is not clickable.
pub fn hit_hold(layout: &ChartLayout, holds: &[HoldArt], p: Vec2) -> Option<usize> {
    holds.iter().position(|h| {
        let x = layout.panel_x(h.panel);
        cell_contains(Vec2::new(x, layout.time_to_y(h.start)), p)
            || cell_contains(Vec2::new(x, layout.time_to_y(h.end)), p)
    })
}

#[inline(always)]
fn limb_variant(limb: &Annotation) -> Limb {
    limb.limb().unwrap_or_else(|| {
        debug!("Unknown limb code {limb:?}; drawing as either.");
        Limb::Either
    })
}

fn arrow_node(layout: &ChartLayout, arrow: &ArrowArt) -> NodeKind {
    NodeKind::Sprite {
        asset: SpriteAsset {
            glyph: PanelGlyph::for_panel(arrow.panel),
            limb: limb_variant(&arrow.limb),
            part: NotePart::Tap,
        },
        pos: Vec2::new(layout.panel_x(arrow.panel), layout.time_to_y(arrow.time)),
        size: Vec2::splat(ARROW_SIZE),
        alpha: if arrow.limb.is_miss() { MISS_ALPHA } else { 1.0 },
    }
}

fn insert_hold(scene: &mut Scene, layout: &ChartLayout, hold: &HoldArt) -> SmallVec<[NodeId; 3]> {
    let glyph = PanelGlyph::for_panel(hold.panel);
    let limb = limb_variant(&hold.limb);
    let x = layout.panel_x(hold.panel);
    let y_start = layout.time_to_y(hold.start);
    let y_end = layout.time_to_y(hold.end);
    let sprite = |part: NotePart, pos: Vec2, size: Vec2| NodeKind::Sprite {
        asset: SpriteAsset { glyph, limb, part },
        pos,
        size,
        alpha: 1.0,
    };

    let mut ids = SmallVec::new();
    ids.push(scene.insert(
        Layer::Holds,
        sprite(
            NotePart::HoldTrail,
            Vec2::new(x, y_start + ARROW_SIZE * 0.5),
            Vec2::new(ARROW_SIZE, (y_end - y_start).max(0.0)),
        ),
    ));
    ids.push(scene.insert(
        Layer::Holds,
        sprite(NotePart::HoldHead, Vec2::new(x, y_start), Vec2::splat(ARROW_SIZE)),
    ));
    ids.push(scene.insert(
        Layer::Holds,
        sprite(NotePart::HoldCap, Vec2::new(x, y_end), Vec2::splat(ARROW_SIZE)),
    ));
    ids
}

fn insert_window_overlay(
    scene: &mut Scene,
    layout: &ChartLayout,
    arrow: &ArrowArt,
) -> SmallVec<[NodeId; 8]> {
    let x = layout.panel_x(arrow.panel);
    let mut ids = SmallVec::new();
    for band in window_bands() {
        let y0 = layout.time_to_y(arrow.time + band.start);
        let y1 = layout.time_to_y(arrow.time + band.end);
        ids.push(scene.insert(
            Layer::Overlays,
            NodeKind::Rect {
                pos: Vec2::new(x, y0),
                size: Vec2::new(ARROW_SIZE, y1 - y0),
                color: color::JUDGE_TIER_RGBA[band.tier.index()],
            },
        ));
    }
    ids.push(scene.insert(
        Layer::Overlays,
        NodeKind::Rect {
            pos: Vec2::new(x, layout.time_to_y(arrow.time) - WINDOW_MARKER_HEIGHT * 0.5),
            size: Vec2::new(ARROW_SIZE, WINDOW_MARKER_HEIGHT),
            color: color::WINDOW_MARKER_RGBA,
        },
    ));
    ids
}

struct Mounted {
    chart_id: String,
    layout: ChartLayout,
    scene: Scene,
    arrow_nodes: FxHashMap<usize, NodeId>,
    hold_nodes: FxHashMap<usize, SmallVec<[NodeId; 3]>>,
    window_nodes: FxHashMap<usize, SmallVec<[NodeId; 8]>>,
    scroll_sub: SubscriptionId,
    scroll_moved: Rc<Cell<bool>>,
    cached: Option<Vec<DrawObject>>,
}

impl Mounted {
    fn replace_arrow(&mut self, index: usize, arrow: &ArrowArt) {
        if let Some(old) = self.arrow_nodes.remove(&index) {
            self.scene.release(old);
        }
        let id = self.scene.insert(Layer::Arrows, arrow_node(&self.layout, arrow));
        self.arrow_nodes.insert(index, id);
    }

    fn replace_hold(&mut self, index: usize, hold: &HoldArt) {
        if let Some(old) = self.hold_nodes.remove(&index) {
            for id in old {
                self.scene.release(id);
            }
        }
        let ids = insert_hold(&mut self.scene, &self.layout, hold);
        self.hold_nodes.insert(index, ids);
    }

    /// Returns whether the overlay is visible afterwards.
    fn toggle_window(&mut self, index: usize, arrow: &ArrowArt) -> bool {
        if let Some(ids) = self.window_nodes.remove(&index) {
            for id in ids {
                self.scene.release(id);
            }
            return false;
        }
        let ids = insert_window_overlay(&mut self.scene, &self.layout, arrow);
        self.window_nodes.insert(index, ids);
        true
    }

    fn click_arrow(
        &mut self,
        view: &ViewState,
        chart: &ChartData,
        mode: &ClickMode,
        index: usize,
    ) -> Option<ClickOutcome> {
        let arrow = &chart.arrowarts[index];
        if mode.behavior == ClickBehavior::ToggleTimingWindow {
            let visible = self.toggle_window(index, arrow);
            debug!("Timing window for arrow {index}: {visible}");
            return Some(ClickOutcome {
                edit: Edit::Window { index, visible },
                chart: None,
            });
        }

        let Some(next) = mode.next(&arrow.limb).cloned() else {
            debug!("Click mode has no mapping for {}; ignoring.", arrow.limb);
            return None;
        };
        let updated = chart.with_arrow_annotation(index, next.clone())?;
        self.replace_arrow(index, &updated.arrowarts[index]);

        let edit = match mode.behavior {
            ClickBehavior::ToggleMiss if next.is_miss() && !arrow.limb.is_miss() => {
                view.add_miss(arrow.time);
                Edit::Miss {
                    index,
                    time: arrow.time,
                    added: true,
                }
            }
            ClickBehavior::ToggleMiss if arrow.limb.is_miss() && !next.is_miss() => {
                view.remove_miss(arrow.time);
                Edit::Miss {
                    index,
                    time: arrow.time,
                    added: false,
                }
            }
            _ => Edit::Arrow {
                index,
                from: arrow.limb.clone(),
                to: next,
            },
        };
        debug!("Arrow click: {edit:?}");
        Some(ClickOutcome {
            edit,
            chart: Some(updated),
        })
    }

    fn click_hold(
        &mut self,
        chart: &ChartData,
        mode: &ClickMode,
        index: usize,
    ) -> Option<ClickOutcome> {
        // Misses are scored on taps only; holds never toggle them.
        if mode.behavior != ClickBehavior::AnnotateLimb {
            debug!("Ignoring hold click outside limb annotation mode.");
            return None;
        }
        let hold = &chart.holdarts[index];
        let next = mode.next(&hold.limb)?.clone();
        let updated = chart.with_hold_annotation(index, next.clone())?;
        self.replace_hold(index, &updated.holdarts[index]);
        Some(ClickOutcome {
            edit: Edit::Hold {
                index,
                from: hold.limb.clone(),
                to: next,
            },
            chart: Some(updated),
        })
    }
}

/// Scene renderer for the scrolling note field.
#[derive(Default)]
pub struct Notefield {
    mounted: Option<Mounted>,
}

impl Notefield {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    pub fn chart_id(&self) -> Option<&str> {
        self.mounted.as_ref().map(|m| m.chart_id.as_str())
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.mounted.as_ref().map(|m| &m.scene)
    }

    /// Tears down any previous scene, then builds one for `chart`. Headless
    /// surfaces never mount; returns whether a scene now exists.
    pub fn mount(
        &mut self,
        surface: &Surface,
        chart_id: &str,
        chart: &ChartData,
        layout: ChartLayout,
        view: &ViewState,
    ) -> bool {
        self.teardown(view);
        if !surface.interactive {
            debug!("Headless surface; skipping note field for {chart_id}.");
            return false;
        }

        let mut scene = Scene::new();
        let mut arrow_nodes = FxHashMap::default();
        arrow_nodes.reserve(chart.arrowarts.len());
        for (index, arrow) in chart.arrowarts.iter().enumerate() {
            arrow_nodes.insert(index, scene.insert(Layer::Arrows, arrow_node(&layout, arrow)));
        }
        // Payloads may carry window markers from an earlier session.
        let mut window_nodes = FxHashMap::default();
        for (index, arrow) in chart.arrowarts.iter().enumerate() {
            if arrow.limb.is_window() {
                window_nodes.insert(index, insert_window_overlay(&mut scene, &layout, arrow));
            }
        }
        let mut hold_nodes = FxHashMap::default();
        hold_nodes.reserve(chart.holdarts.len());
        for (index, hold) in chart.holdarts.iter().enumerate() {
            hold_nodes.insert(index, insert_hold(&mut scene, &layout, hold));
        }

        let scroll_moved = Rc::new(Cell::new(true));
        let flag = Rc::clone(&scroll_moved);
        let scroll_sub = view.scroll_y.subscribe(move |_| flag.set(true));

        info!(
            "Note field built for {chart_id}: {} arrows, {} holds, {} nodes",
            chart.arrowarts.len(),
            chart.holdarts.len(),
            scene.len()
        );
        self.mounted = Some(Mounted {
            chart_id: chart_id.to_owned(),
            layout,
            scene,
            arrow_nodes,
            hold_nodes,
            window_nodes,
            scroll_sub,
            scroll_moved,
            cached: None,
        });
        true
    }

    /// Releases the scene and the scroll listener. Safe to call repeatedly.
    pub fn teardown(&mut self, view: &ViewState) {
        let Some(mut m) = self.mounted.take() else {
            return;
        };
        view.scroll_y.unsubscribe(m.scroll_sub);
        m.scene.clear();
        info!("Note field for {} torn down.", m.chart_id);
    }

    /// Publishes a new scroll offset, clamped to the canvas.
    pub fn scroll_to(&self, view: &ViewState, y: f32) -> bool {
        let Some(m) = self.mounted.as_ref() else {
            return false;
        };
        let max = m.layout.max_scroll(view.viewport_height.get());
        view.scroll_y.set(y.clamp(0.0, max));
        true
    }

    pub fn scroll_to_time(&self, view: &ViewState, time: f64) -> bool {
        let Some(m) = self.mounted.as_ref() else {
            return false;
        };
        self.scroll_to(view, m.layout.time_to_y(time))
    }

    /// Routes a click in viewport coordinates to the note under it.
    pub fn click(
        &mut self,
        view: &ViewState,
        chart: &ChartData,
        x: f32,
        y: f32,
    ) -> Option<ClickOutcome> {
        let m = self.mounted.as_mut()?;
        let p = Vec2::new(x, y + view.scroll_y.get());
        let mode = view.click_mode.get();
        if let Some(index) = hit_arrow(&m.layout, &chart.arrowarts, p) {
            return m.click_arrow(view, chart, &mode, index);
        }
        let index = hit_hold(&m.layout, &chart.holdarts, p)?;
        m.click_hold(chart, &mode, index)
    }

    pub fn window_visible(&self, index: usize) -> bool {
        self.mounted
            .as_ref()
            .is_some_and(|m| m.window_nodes.contains_key(&index))
    }

    /// Visible draw objects. Rebuilt only after a scene edit or a scroll.
    pub fn draw_list(&mut self, view: &ViewState) -> &[DrawObject] {
        let Some(m) = self.mounted.as_mut() else {
            return &[];
        };
        if m.cached.is_none() || m.scene.is_dirty() || m.scroll_moved.get() {
            m.scene.take_dirty();
            m.scroll_moved.set(false);
            m.cached = Some(
                m.scene
                    .draw_list(view.scroll_y.get(), view.viewport_height.get()),
            );
        }
        m.cached.as_deref().unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHART: &str = r#"[
        [[0, 1.0, "l"], [2, 2.0, "r"], [4, 3.0, "x"]],
        [[1, 4.0, 6.0, "e"]],
        {"level": 8}
    ]"#;

    struct Rig {
        chart: ChartData,
        layout: ChartLayout,
        view: ViewState,
        field: Notefield,
    }

    fn rig(json: &str, mode: ClickMode) -> Rig {
        let chart = ChartData::from_json(json).expect("test chart should parse");
        let layout = ChartLayout::for_chart(&chart);
        let view = ViewState::new(1000.0, mode);
        let mut field = Notefield::new();
        assert!(field.mount(&Surface::interactive(400.0, 1000.0), "t", &chart, layout, &view));
        Rig {
            chart,
            layout,
            view,
            field,
        }
    }

    impl Rig {
        fn click_arrow(&mut self, index: usize) -> Option<ClickOutcome> {
            let a = &self.chart.arrowarts[index];
            let x = self.layout.panel_x(a.panel) + 5.0;
            let y = self.layout.time_to_y(a.time) + 5.0 - self.view.scroll_y.get();
            let out = self.field.click(&self.view, &self.chart, x, y);
            if let Some(chart) = out.as_ref().and_then(|o| o.chart.clone()) {
                self.chart = chart;
            }
            out
        }

        fn sprite_limbs(&mut self) -> Vec<Limb> {
            self.field
                .draw_list(&self.view)
                .iter()
                .filter_map(|d| match d {
                    DrawObject::Sprite { asset, .. } if asset.part == NotePart::Tap => {
                        Some(asset.limb)
                    }
                    _ => None,
                })
                .collect()
        }
    }

    #[test]
    fn headless_surface_never_mounts_and_ops_noop() {
        let chart = ChartData::from_json(CHART).unwrap();
        let view = ViewState::new(600.0, ClickMode::cycle());
        let mut field = Notefield::new();
        assert!(!field.mount(&Surface::headless(), "t", &chart, ChartLayout::for_chart(&chart), &view));
        assert!(!field.is_mounted());
        assert!(field.click(&view, &chart, 45.0, 255.0).is_none());
        assert!(!field.scroll_to(&view, 100.0));
        assert!(field.draw_list(&view).is_empty());
        field.teardown(&view);
        assert_eq!(view.scroll_y.subscriber_count(), 0);
    }

    #[test]
    fn builds_one_sprite_per_arrow_and_three_per_hold() {
        let r = rig(CHART, ClickMode::cycle());
        let scene = r.field.scene().unwrap();
        assert_eq!(scene.layer_len(Layer::Arrows), 3);
        assert_eq!(scene.layer_len(Layer::Holds), 3);
        assert_eq!(scene.len(), 6);
    }

    #[test]
    fn sprite_y_is_time_times_scale() {
        for (level, expected) in [(8, 500.0), (20, 800.0)] {
            let json = format!(r#"[[[0, 2.0, "l"]], [], {{"level": {level}}}]"#);
            let mut r = rig(&json, ClickMode::cycle());
            match r.field.draw_list(&r.view).first() {
                Some(DrawObject::Sprite { pos, .. }) => assert_eq!(pos.y, expected),
                other => panic!("expected the arrow sprite, got {other:?}"),
            }
        }
    }

    #[test]
    fn unknown_limb_draws_as_either() {
        let mut r = rig(CHART, ClickMode::cycle());
        assert_eq!(r.sprite_limbs(), vec![Limb::Left, Limb::Right, Limb::Either]);
    }

    #[test]
    fn cycle_click_replaces_one_arrow_copy_on_write() {
        let mut r = rig(CHART, ClickMode::cycle());
        let before = r.chart.clone();
        let out = r.click_arrow(0).expect("arrow 0 should be hit");
        assert_eq!(
            out.edit,
            Edit::Arrow {
                index: 0,
                from: "l".into(),
                to: "r".into()
            }
        );
        assert_eq!(before.arrowarts[0].limb.as_str(), "l");
        assert_eq!(r.chart.arrowarts[0].limb.as_str(), "r");
        assert_eq!(r.field.scene().unwrap().len(), 6, "old sprite destroyed");
        assert_eq!(r.sprite_limbs()[0], Limb::Right);
    }

    #[test]
    fn swap_mode_applied_twice_restores_limb() {
        let mut r = rig(CHART, ClickMode::swap());
        r.click_arrow(1).unwrap();
        assert_eq!(r.chart.arrowarts[1].limb.as_str(), "l");
        r.click_arrow(1).unwrap();
        assert_eq!(r.chart.arrowarts[1].limb.as_str(), "r");
    }

    #[test]
    fn miss_click_round_trips_exactly_one_occurrence() {
        let mut r = rig(CHART, ClickMode::miss());
        r.view.add_miss(1.0);

        let out = r.click_arrow(0).unwrap();
        assert_eq!(
            out.edit,
            Edit::Miss {
                index: 0,
                time: 1.0,
                added: true
            }
        );
        assert_eq!(r.view.miss_times.get(), vec![1.0, 1.0]);
        assert!(r.chart.arrowarts[0].limb.is_miss());
        match r.field.draw_list(&r.view).iter().find(|d| {
            matches!(d, DrawObject::Sprite { asset, .. } if asset.part == NotePart::Tap)
        }) {
            Some(DrawObject::Sprite { alpha, .. }) => assert_eq!(*alpha, MISS_ALPHA),
            other => panic!("expected faded sprite, got {other:?}"),
        }

        r.click_arrow(0).unwrap();
        assert_eq!(r.view.miss_times.get(), vec![1.0]);
        assert_eq!(r.chart.arrowarts[0].limb.as_str(), "l");
    }

    #[test]
    fn hold_clicks_never_toggle_misses() {
        let mut r = rig(CHART, ClickMode::miss());
        let h = &r.chart.holdarts[0];
        let x = r.layout.panel_x(h.panel) + 1.0;
        let y = r.layout.time_to_y(h.start) + 1.0;
        assert!(r.field.click(&r.view, &r.chart, x, y).is_none());
        assert!(r.view.miss_times.get().is_empty());
    }

    #[test]
    fn hold_head_and_cap_hit_but_trail_does_not() {
        let mut r = rig(CHART, ClickMode::cycle());
        let h = r.chart.holdarts[0].clone();
        let x = r.layout.panel_x(h.panel) + 1.0;

        let head = r.field.click(&r.view, &r.chart, x, r.layout.time_to_y(h.start) + 1.0);
        let head = head.expect("head should be hit");
        let chart = head.chart.unwrap();
        assert_eq!(chart.holdarts[0].limb.as_str(), "h");
        assert_eq!(r.field.scene().unwrap().layer_len(Layer::Holds), 3);

        let mid = (r.layout.time_to_y(h.start) + r.layout.time_to_y(h.end)) * 0.5;
        assert!(r.field.click(&r.view, &chart, x, mid).is_none());

        let cap = r.field.click(&r.view, &chart, x, r.layout.time_to_y(h.end) + 1.0);
        assert_eq!(cap.unwrap().chart.unwrap().holdarts[0].limb.as_str(), "l");
    }

    #[test]
    fn window_toggle_adds_and_removes_exactly_one_overlay() {
        let mut r = rig(CHART, ClickMode::timing_window());
        let out = r.click_arrow(1).unwrap();
        assert_eq!(out.edit, Edit::Window { index: 1, visible: true });
        assert!(out.chart.is_none());
        assert_eq!(r.field.scene().unwrap().layer_len(Layer::Overlays), 8);
        r.click_arrow(2).unwrap();
        assert_eq!(r.field.scene().unwrap().layer_len(Layer::Overlays), 16);

        let out = r.click_arrow(1).unwrap();
        assert_eq!(out.edit, Edit::Window { index: 1, visible: false });
        assert_eq!(r.field.scene().unwrap().layer_len(Layer::Overlays), 8);
        assert!(r.field.window_visible(2));
        assert!(!r.field.window_visible(1));
    }

    #[test]
    fn window_marked_payload_notes_mount_with_overlay() {
        let json = r#"[[[0, 1.0, "l_window"], [1, 2.0, "r"]], [], {"level": 8}]"#;
        let r = rig(json, ClickMode::cycle());
        assert!(r.field.window_visible(0));
        assert!(!r.field.window_visible(1));
        assert_eq!(r.field.scene().unwrap().layer_len(Layer::Overlays), 8);
    }

    #[test]
    fn click_is_translated_by_scroll() {
        let json = r#"[[[0, 1.0, "l"], [0, 5.0, "l"]], [], {"level": 8}]"#;
        let mut r = rig(json, ClickMode::cycle());
        assert!(r.field.scroll_to(&r.view, 600.0));
        assert_eq!(r.view.scroll_y.get(), 600.0);
        let x = r.layout.panel_x(0) + 1.0;
        let out = r.field.click(&r.view, &r.chart, x, 651.0).unwrap();
        assert!(matches!(out.edit, Edit::Arrow { index: 1, .. }));
    }

    #[test]
    fn scroll_is_clamped_and_invalidates_cached_draws() {
        let mut r = rig(CHART, ClickMode::cycle());
        assert_eq!(r.sprite_limbs().len(), 3);
        r.field.scroll_to(&r.view, -50.0);
        assert_eq!(r.view.scroll_y.get(), 0.0);
        r.field.scroll_to(&r.view, 1.0e6);
        assert_eq!(r.view.scroll_y.get(), r.layout.max_scroll(1000.0));
        assert!(r.sprite_limbs().is_empty(), "taps scrolled out of view");
        assert!(!r.field.draw_list(&r.view).is_empty(), "hold still visible");
    }

    #[test]
    fn teardown_is_idempotent_and_drops_listener() {
        let mut r = rig(CHART, ClickMode::cycle());
        assert_eq!(r.view.scroll_y.subscriber_count(), 1);
        r.field.teardown(&r.view);
        r.field.teardown(&r.view);
        assert!(!r.field.is_mounted());
        assert_eq!(r.view.scroll_y.subscriber_count(), 0);
        assert!(r.field.click(&r.view, &r.chart, 45.0, 255.0).is_none());
    }

    #[test]
    fn remount_replaces_previous_scene() {
        let mut r = rig(CHART, ClickMode::cycle());
        let other = ChartData::from_json(r#"[[[0, 1.0, "l"]], [], {"level": 3}]"#).unwrap();
        let layout = ChartLayout::for_chart(&other);
        assert!(r.field.mount(&Surface::interactive(400.0, 600.0), "u", &other, layout, &r.view));
        assert_eq!(r.field.chart_id(), Some("u"));
        assert_eq!(r.field.scene().unwrap().len(), 1);
        assert_eq!(r.view.scroll_y.subscriber_count(), 1);
    }
}
