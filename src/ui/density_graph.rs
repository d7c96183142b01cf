use crate::game::chart::{ChartData, MAX_CHART_TIME, SegmentInfo};
use crate::game::layout::ChartLayout;
use crate::ui::color;
use crate::ui::mesh::{MeshVertex, push_quad};
use log::debug;

pub const SPARKLINE_HEIGHT: f32 = 8.0;
pub const SPARKLINE_GAP: f32 = 2.0;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DensitySource {
    /// Per-second eNPS samples shipped in the chart metadata.
    Enps,
    /// Arrow times and hold starts counted per second.
    NotesPerSecond,
}

/// Notes per one-second bucket covering `[0, duration]`.
pub fn notes_per_second(chart: &ChartData, duration: f64) -> Vec<f64> {
    let len = duration.clamp(0.0, MAX_CHART_TIME).floor() as usize + 1;
    let mut out = vec![0.0; len];
    let times = chart
        .arrowarts
        .iter()
        .map(|a| a.time)
        .chain(chart.holdarts.iter().map(|h| h.start));
    for t in times {
        if t < 0.0 {
            continue;
        }
        let ix = (t.floor() as usize).min(len - 1);
        out[ix] += 1.0;
    }
    out
}

pub fn density_buckets(chart: &ChartData, duration: f64) -> (Vec<f64>, DensitySource) {
    let enps = &chart.metadata.enps_timeline;
    if enps.is_empty() {
        (notes_per_second(chart, duration), DensitySource::NotesPerSecond)
    } else {
        (enps.clone(), DensitySource::Enps)
    }
}

/// Sparkline color for a segment relative to the chart's easiest and hardest.
pub fn segment_color(level: f64, min: f64, max: f64) -> [f32; 4] {
    let span = max - min;
    let t = if span > 0.0 { (level - min) / span } else { 0.0 };
    color::lerp_color(t as f32, color::SEGMENT_EASY_RGBA, color::SEGMENT_HARD_RGBA)
}

fn level_range(segments: &[SegmentInfo]) -> Option<(f64, f64)> {
    segments.iter().map(|s| s.level).fold(None, |acc, l| match acc {
        None => Some((l, l)),
        Some((lo, hi)) => Some((lo.min(l), hi.max(l))),
    })
}

/// Horizontal timeline strip: density bars on top, segment sparkline below,
/// and a highlight over the part of the chart the note field shows.
#[derive(Debug, Clone)]
pub struct DensityGraph {
    width: f32,
    height: f32,
    duration: f64,
    buckets: Vec<f64>,
    peak: f64,
    source: DensitySource,
    bars: Vec<MeshVertex>,
    sparkline: Vec<MeshVertex>,
    viewport: Vec<MeshVertex>,
    viewport_key: Option<[u32; 3]>,
}

impl DensityGraph {
    pub fn new(chart: &ChartData, layout: &ChartLayout, width: f32, height: f32) -> Self {
        let duration = layout.last_event_time;
        let (buckets, source) = density_buckets(chart, duration);
        let peak = buckets.iter().copied().fold(0.0, f64::max);
        let mut graph = Self {
            width: width.max(0.0),
            height: height.max(0.0),
            duration,
            buckets,
            peak,
            source,
            bars: Vec::new(),
            sparkline: Vec::new(),
            viewport: Vec::new(),
            viewport_key: None,
        };
        graph.bars = graph.build_bars();
        graph.sparkline = graph.build_sparkline(chart);
        debug!(
            "Density graph: {} buckets from {:?}, peak {:.2}",
            graph.buckets.len(),
            graph.source,
            graph.peak
        );
        graph
    }

    #[inline(always)]
    pub fn buckets(&self) -> &[f64] {
        &self.buckets
    }

    #[inline(always)]
    pub fn peak(&self) -> f64 {
        self.peak
    }

    #[inline(always)]
    pub fn source(&self) -> DensitySource {
        self.source
    }

    #[inline(always)]
    fn bar_area_height(&self) -> f32 {
        (self.height - SPARKLINE_HEIGHT - SPARKLINE_GAP).max(0.0)
    }

    pub fn time_to_x(&self, time: f64) -> f32 {
        if self.duration <= 0.0 {
            return 0.0;
        }
        ((time / self.duration).clamp(0.0, 1.0) as f32) * self.width
    }

    /// Inverse of `time_to_x`, for seeking by clicking the strip.
    pub fn x_to_time(&self, x: f32) -> f64 {
        if self.width <= 0.0 {
            return 0.0;
        }
        f64::from((x / self.width).clamp(0.0, 1.0)) * self.duration
    }

    fn build_bars(&self) -> Vec<MeshVertex> {
        let h = self.bar_area_height();
        if self.buckets.is_empty() || self.peak <= 0.0 || self.width <= 0.0 || h <= 0.0 {
            return Vec::new();
        }
        let mut out = Vec::with_capacity(self.buckets.len() * 6);
        for (i, &nps) in self.buckets.iter().enumerate() {
            if nps <= 0.0 {
                continue;
            }
            let frac = (nps / self.peak).clamp(0.0, 1.0) as f32;
            let x0 = self.time_to_x(i as f64);
            let x1 = self.time_to_x(i as f64 + 1.0);
            let bar_h = frac * h;
            let c = color::lerp_color(frac, color::DENSITY_LOW_RGBA, color::DENSITY_HIGH_RGBA);
            push_quad(&mut out, x0, h - bar_h, (x1 - x0).max(1.0), bar_h, c);
        }
        out
    }

    fn build_sparkline(&self, chart: &ChartData) -> Vec<MeshVertex> {
        let Some((min, max)) = level_range(&chart.segment_data) else {
            return Vec::new();
        };
        let y = self.height - SPARKLINE_HEIGHT;
        let mut out = Vec::with_capacity(chart.segments.len() * 6);
        for (seg, info) in chart.segments.iter().zip(chart.segment_data.iter()) {
            let x0 = self.time_to_x(seg.start);
            let x1 = self.time_to_x(seg.end);
            push_quad(
                &mut out,
                x0,
                y,
                (x1 - x0).max(1.0),
                SPARKLINE_HEIGHT,
                segment_color(info.level, min, max),
            );
        }
        out
    }

    #[inline(always)]
    pub fn bars(&self) -> &[MeshVertex] {
        &self.bars
    }

    #[inline(always)]
    pub fn sparkline(&self) -> &[MeshVertex] {
        &self.sparkline
    }

    /// Highlight for the visible time range; rebuilt only when scroll,
    /// viewport height or scale changed since the last call.
    pub fn viewport_mesh(&mut self, scroll_y: f32, viewport_h: f32, time_scale: f32) -> &[MeshVertex] {
        let key = [scroll_y.to_bits(), viewport_h.to_bits(), time_scale.to_bits()];
        if self.viewport_key != Some(key) {
            self.viewport.clear();
            if time_scale > 0.0 {
                let t0 = f64::from(scroll_y / time_scale);
                let t1 = f64::from((scroll_y + viewport_h) / time_scale);
                let x0 = self.time_to_x(t0);
                let x1 = self.time_to_x(t1);
                push_quad(&mut self.viewport, x0, 0.0, (x1 - x0).max(1.0), self.height, color::VIEWPORT_RGBA);
            }
            self.viewport_key = Some(key);
        }
        &self.viewport
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chart(json: &str) -> (ChartData, ChartLayout) {
        let c = ChartData::from_json(json).expect("test chart should parse");
        let l = ChartLayout::for_chart(&c);
        (c, l)
    }

    #[test]
    fn counts_arrows_and_hold_starts_per_second() {
        let (c, l) = chart(
            r#"[[[0, 0.2, "l"], [1, 0.9, "r"], [2, 2.5, "l"]], [[3, 0.5, 3.5, "r"]], {"level": 5}]"#,
        );
        let (buckets, source) = density_buckets(&c, l.last_event_time);
        assert_eq!(source, DensitySource::NotesPerSecond);
        assert_eq!(buckets, vec![3.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn bucket_count_is_bounded() {
        let (c, _) = chart(r#"[[[0, 0.2, "l"]], [], {"level": 5}]"#);
        let buckets = notes_per_second(&c, 1e12);
        assert_eq!(buckets.len(), MAX_CHART_TIME as usize + 1);
        assert_eq!(buckets[0], 1.0);
    }

    #[test]
    fn enps_samples_take_precedence() {
        let (c, l) = chart(
            r#"[[[0, 0.2, "l"]], [], {"level": 5, "eNPS timeline data": [1.5, 4.0, 2.0]}]"#,
        );
        let g = DensityGraph::new(&c, &l, 300.0, 60.0);
        assert_eq!(g.source(), DensitySource::Enps);
        assert_eq!(g.buckets(), &[1.5, 4.0, 2.0]);
        assert_eq!(g.peak(), 4.0);
    }

    #[test]
    fn one_quad_per_nonempty_bucket_with_peak_at_full_height() {
        let (c, l) = chart(r#"[[[0, 0.1, "l"], [1, 0.2, "r"], [2, 3.0, "l"]], [], {"level": 5}]"#);
        let g = DensityGraph::new(&c, &l, 300.0, 60.0);
        assert_eq!(g.bars().len(), 2 * 6);
        let top = g.bars()[..6].iter().map(|v| v.pos[1]).fold(f32::MAX, f32::min);
        assert!(top.abs() < 1e-4, "peak bucket should reach the top, got {top}");
    }

    #[test]
    fn sparkline_colors_span_easy_to_hard() {
        let (c, l) = chart(
            r#"[[[0, 4.0, "l"]], [], {
                "level": 12,
                "segments": [[0.0, 2.0], [2.0, 4.0]],
                "segment_metadata": [{"level": 10.0}, {"level": 14.0}]
            }]"#,
        );
        let g = DensityGraph::new(&c, &l, 400.0, 60.0);
        assert_eq!(g.sparkline().len(), 12);
        let close = |a: [f32; 4], b: [f32; 4]| a.iter().zip(&b).all(|(x, y)| (x - y).abs() < 1e-5);
        assert!(close(g.sparkline()[0].color, color::SEGMENT_EASY_RGBA));
        assert!(close(g.sparkline()[6].color, color::SEGMENT_HARD_RGBA));
    }

    #[test]
    fn flat_segment_levels_use_easy_color() {
        assert_eq!(segment_color(9.0, 9.0, 9.0), color::SEGMENT_EASY_RGBA);
    }

    #[test]
    fn viewport_mesh_tracks_scroll() {
        let (c, l) = chart(r#"[[[0, 10.0, "l"]], [], {"level": 5}]"#);
        let mut g = DensityGraph::new(&c, &l, 100.0, 40.0);
        let first = g.viewport_mesh(0.0, 500.0, 250.0).to_vec();
        assert_eq!(first[0].pos[0], 0.0);
        assert!((first[1].pos[0] - 20.0).abs() < 1e-4, "2 s of 10 s is 20 px");
        let moved = g.viewport_mesh(1250.0, 500.0, 250.0);
        assert!((moved[0].pos[0] - 50.0).abs() < 1e-4);
        assert!((g.x_to_time(50.0) - 5.0).abs() <= 1e-9);
    }
}
