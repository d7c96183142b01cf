use crate::game::chart::{ChartData, ChartMetadata, MAX_SINGLES_PANEL};
use log::debug;
use rustc_hash::FxHashMap;
use std::sync::Arc;

// All layout values are in canvas pixels.
pub const COLUMN_BASE_X: f32 = 40.0;
pub const COLUMN_INTERVAL: f32 = 40.0;
pub const ARROW_SIZE: f32 = 40.0;
pub const CANVAS_WIDTH_MARGIN: f32 = 80.0;
pub const CANVAS_HEIGHT_MARGIN: f32 = 400.0;

/// Pixels per second for a chart level.
#[inline(always)]
pub const fn time_scale_for_level(level: u32) -> f32 {
    if level < 11 {
        250.0
    } else if level <= 14 {
        300.0
    } else if level <= 25 {
        400.0
    } else {
        450.0
    }
}

/// 5 for singles, 10 as soon as any arrow or hold leaves the first pad.
pub fn panel_count(chart: &ChartData) -> u8 {
    let max_arrow = chart.arrowarts.iter().map(|a| a.panel).max().unwrap_or(0);
    let max_hold = chart.holdarts.iter().map(|h| h.panel).max().unwrap_or(0);
    if max_arrow.max(max_hold) <= MAX_SINGLES_PANEL { 5 } else { 10 }
}

pub fn last_event_time(chart: &ChartData) -> f64 {
    chart.last_arrow_time().max(chart.last_hold_end())
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ChartLayout {
    pub panel_count: u8,
    pub time_scale: f32,
    pub last_event_time: f64,
    pub canvas_width: f32,
    pub canvas_height: f32,
}

impl ChartLayout {
    pub fn for_chart(chart: &ChartData) -> Self {
        let panel_count = panel_count(chart);
        let time_scale = time_scale_for_level(chart.level());
        let last_event_time = last_event_time(chart);
        Self {
            panel_count,
            time_scale,
            last_event_time,
            canvas_width: f32::from(panel_count) * COLUMN_INTERVAL + CANVAS_WIDTH_MARGIN,
            canvas_height: (last_event_time * f64::from(time_scale)) as f32 + CANVAS_HEIGHT_MARGIN,
        }
    }

    #[inline(always)]
    pub fn time_to_y(&self, time: f64) -> f32 {
        (time * f64::from(self.time_scale)) as f32
    }

    #[inline(always)]
    pub fn y_to_time(&self, y: f32) -> f64 {
        if self.time_scale <= 0.0 {
            return 0.0;
        }
        f64::from(y) / f64::from(self.time_scale)
    }

    #[inline(always)]
    pub fn panel_x(&self, panel: u8) -> f32 {
        COLUMN_BASE_X + f32::from(panel) * COLUMN_INTERVAL
    }

    /// Largest scroll offset that still shows canvas content.
    #[inline(always)]
    pub fn max_scroll(&self, viewport_height: f32) -> f32 {
        (self.canvas_height - viewport_height).max(0.0)
    }
}

/// Layouts memoized per chart identifier. An entry is reused only for the
/// payload it was computed from; annotation edits share that payload's
/// metadata, a reload under the same id does not.
#[derive(Debug, Default)]
pub struct LayoutCache {
    by_chart: FxHashMap<String, (Arc<ChartMetadata>, ChartLayout)>,
}

impl LayoutCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compute(&mut self, chart_id: &str, chart: &ChartData) -> ChartLayout {
        if let Some((source, layout)) = self.by_chart.get(chart_id)
            && Arc::ptr_eq(source, &chart.metadata)
        {
            return *layout;
        }
        let layout = ChartLayout::for_chart(chart);
        debug!(
            "Layout for {chart_id}: {} panels, {} px/s, canvas {}x{}",
            layout.panel_count, layout.time_scale, layout.canvas_width, layout.canvas_height
        );
        self.by_chart
            .insert(chart_id.to_owned(), (Arc::clone(&chart.metadata), layout));
        layout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::chart::ChartData;

    fn chart(arrows: &str, holds: &str, level: u32) -> ChartData {
        ChartData::from_json(&format!("[{arrows}, {holds}, {{\"level\": {level}}}]"))
            .expect("test chart should parse")
    }

    #[test]
    fn time_scale_thresholds() {
        assert_eq!(time_scale_for_level(1), 250.0);
        assert_eq!(time_scale_for_level(10), 250.0);
        assert_eq!(time_scale_for_level(11), 300.0);
        assert_eq!(time_scale_for_level(14), 300.0);
        assert_eq!(time_scale_for_level(15), 400.0);
        assert_eq!(time_scale_for_level(25), 400.0);
        assert_eq!(time_scale_for_level(26), 450.0);
    }

    #[test]
    fn panel_count_switches_to_doubles_on_any_high_panel() {
        assert_eq!(panel_count(&chart(r#"[[4, 1.0, "l"]]"#, "[]", 5)), 5);
        assert_eq!(panel_count(&chart(r#"[[5, 1.0, "l"]]"#, "[]", 5)), 10);
        assert_eq!(
            panel_count(&chart(r#"[[0, 1.0, "l"]]"#, r#"[[9, 1.0, 2.0, "r"]]"#, 5)),
            10
        );
        assert_eq!(panel_count(&chart("[]", "[]", 5)), 5);
    }

    #[test]
    fn canvas_height_uses_latest_of_arrows_and_hold_ends() {
        let c = chart(r#"[[0, 3.0, "l"]]"#, r#"[[1, 1.0, 5.0, "r"]]"#, 20);
        let layout = ChartLayout::for_chart(&c);
        assert_eq!(layout.last_event_time, 5.0);
        assert_eq!(layout.canvas_height, 5.0 * 400.0 + CANVAS_HEIGHT_MARGIN);
        assert_eq!(layout.canvas_width, 5.0 * COLUMN_INTERVAL + CANVAS_WIDTH_MARGIN);

        let c = chart(r#"[[0, 6.0, "l"]]"#, r#"[[1, 1.0, 5.0, "r"]]"#, 8);
        let layout = ChartLayout::for_chart(&c);
        assert_eq!(layout.canvas_height, 6.0 * 250.0 + CANVAS_HEIGHT_MARGIN);
    }

    #[test]
    fn arrow_y_follows_level_scale() {
        let low = ChartLayout::for_chart(&chart(r#"[[0, 2.0, "l"]]"#, "[]", 8));
        let high = ChartLayout::for_chart(&chart(r#"[[0, 2.0, "l"]]"#, "[]", 20));
        assert_eq!(low.time_to_y(2.0), 500.0);
        assert_eq!(high.time_to_y(2.0), 800.0);
    }

    #[test]
    fn cache_memoizes_per_payload() {
        let mut cache = LayoutCache::new();
        let a = chart(r#"[[0, 2.0, "l"]]"#, "[]", 8);
        let b = chart(r#"[[0, 9.0, "l"]]"#, "[]", 8);
        let first = cache.get_or_compute("a", &a);

        // Same metadata snapshot: served from the memo without recomputing.
        let shared = ChartData {
            arrowarts: b.arrowarts.clone(),
            ..a.clone()
        };
        assert_eq!(cache.get_or_compute("a", &shared), first, "memoized by payload");

        // A fresh payload under the same id replaces the entry.
        let reloaded = cache.get_or_compute("a", &b);
        assert_ne!(reloaded, first);
        assert_eq!(reloaded.last_event_time, 9.0);
        assert_eq!(cache.get_or_compute("b", &a), first);
    }
}
