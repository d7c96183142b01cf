use crate::game::life::{LifeTrace, LifeTraces};
use crate::ui::color;
use crate::ui::mesh::{MeshVertex, push_quad};

pub const REFERENCE_LINE_PX: f32 = 1.5;
pub const CURSOR_WIDTH_PX: f32 = 2.0;

/// Horizontal lifebar strip: x follows time, y follows life (full at top).
#[derive(Debug, Clone, Default)]
pub struct LifeGraph {
    width: f32,
    height: f32,
    duration: f64,
    life_max: f64,
    fill: Vec<MeshVertex>,
    reference: Vec<MeshVertex>,
    bleed: Vec<MeshVertex>,
    cursor: Vec<MeshVertex>,
    cursor_key: Option<u32>,
}

/// Constant-life spans `(t0, t1, life)`; each sample holds until the next.
fn steps(trace: &LifeTrace, duration: f64) -> impl Iterator<Item = (f64, f64, f64)> + '_ {
    let n = trace.times.len();
    (0..n).map(move |i| {
        let t0 = trace.times[i];
        let t1 = if i + 1 < n { trace.times[i + 1] } else { duration.max(t0) };
        (t0, t1, trace.healths[i])
    })
}

impl LifeGraph {
    pub fn new(width: f32, height: f32, duration: f64) -> Self {
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
            duration,
            ..Self::default()
        }
    }

    pub fn time_to_x(&self, time: f64) -> f32 {
        if self.duration <= 0.0 {
            return 0.0;
        }
        ((time / self.duration).clamp(0.0, 1.0) as f32) * self.width
    }

    #[inline(always)]
    fn life_to_y(&self, life: f64) -> f32 {
        if self.life_max <= 0.0 {
            return self.height;
        }
        (1.0 - (life / self.life_max).clamp(0.0, 1.0) as f32) * self.height
    }

    /// Rebuilds every trace mesh. Called after each replay.
    pub fn set_traces(&mut self, traces: &LifeTraces) {
        self.life_max = traces.life_max;
        self.fill.clear();
        self.reference.clear();
        self.bleed.clear();
        if self.width <= 0.0 || self.height <= 0.0 {
            return;
        }

        for (t0, t1, life) in steps(&traces.actual, self.duration) {
            let x0 = self.time_to_x(t0);
            let x1 = self.time_to_x(t1);
            if x1 <= x0 {
                continue;
            }
            let y = self.life_to_y(life);
            push_quad(&mut self.fill, x0, y, x1 - x0, self.height - y, color::LIFE_FILL_RGBA);
        }

        for (t0, t1, life) in steps(&traces.reference, self.duration) {
            let x0 = self.time_to_x(t0);
            let x1 = self.time_to_x(t1);
            if x1 <= x0 {
                continue;
            }
            let y = self.life_to_y(life);
            push_quad(
                &mut self.reference,
                x0,
                y - REFERENCE_LINE_PX * 0.5,
                x1 - x0,
                REFERENCE_LINE_PX,
                color::LIFE_REFERENCE_RGBA,
            );
        }

        let ends = traces.actual.times.iter().skip(1).copied().chain([self.duration]);
        for (i, (deficit, t1)) in traces.bleed().into_iter().zip(ends).enumerate() {
            if deficit <= 0.0 {
                continue;
            }
            let x0 = self.time_to_x(traces.actual.times[i]);
            let x1 = self.time_to_x(t1);
            if x1 <= x0 {
                continue;
            }
            let top = self.life_to_y(traces.reference.healths[i]);
            let bottom = self.life_to_y(traces.actual.healths[i]);
            push_quad(&mut self.bleed, x0, top, x1 - x0, bottom - top, color::LIFE_BLEED_RGBA);
        }
    }

    #[inline(always)]
    pub fn fill(&self) -> &[MeshVertex] {
        &self.fill
    }

    #[inline(always)]
    pub fn reference(&self) -> &[MeshVertex] {
        &self.reference
    }

    #[inline(always)]
    pub fn bleed(&self) -> &[MeshVertex] {
        &self.bleed
    }

    /// Vertical marker at the time under the top of the note field.
    pub fn cursor_mesh(&mut self, time: f64) -> &[MeshVertex] {
        let x = self.time_to_x(time);
        if self.cursor_key != Some(x.to_bits()) {
            self.cursor.clear();
            push_quad(
                &mut self.cursor,
                x - CURSOR_WIDTH_PX * 0.5,
                0.0,
                CURSOR_WIDTH_PX,
                self.height,
                color::CURSOR_RGBA,
            );
            self.cursor_key = Some(x.to_bits());
        }
        &self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::life::{LifeParams, LifeTimeline, Reference};
    use crate::game::chart::ChartData;

    fn traces(misses: &[f64]) -> LifeTraces {
        let chart = ChartData::from_json(
            r#"[[[0, 1.0, "l"], [1, 2.0, "r"], [2, 3.0, "l"], [3, 4.0, "r"]], [], {"level": 10}]"#,
        )
        .expect("test chart should parse");
        let timeline = LifeTimeline::from_chart(&chart);
        LifeTraces::compute(
            &timeline,
            LifeParams::for_level(chart.level(), 500.0),
            misses,
            Reference::Perfect,
        )
    }

    #[test]
    fn fill_has_one_quad_per_step() {
        let t = traces(&[]);
        let mut g = LifeGraph::new(400.0, 100.0, 4.0);
        g.set_traces(&t);
        // Samples at 0, 1, 2, 3, 4; the last one has zero width.
        assert_eq!(g.fill().len(), 4 * 6);
        assert_eq!(g.reference().len(), 4 * 6);
        assert!(g.bleed().is_empty(), "no misses means no deficit");
    }

    #[test]
    fn miss_produces_bleed_between_traces() {
        let t = traces(&[2.0]);
        let mut g = LifeGraph::new(400.0, 100.0, 4.0);
        g.set_traces(&t);
        assert_eq!(g.bleed().len(), 2 * 6, "deficit holds from t=2 to the end");
        let v = &g.bleed()[0];
        assert!((v.pos[0] - 200.0).abs() < 1e-3, "bleed starts at the miss, got {}", v.pos[0]);
    }

    #[test]
    fn full_life_sits_at_top() {
        let mut g = LifeGraph::new(100.0, 50.0, 1.0);
        g.life_max = 1000.0;
        assert_eq!(g.life_to_y(1000.0), 0.0);
        assert_eq!(g.life_to_y(0.0), 50.0);
        assert_eq!(g.life_to_y(5000.0), 0.0);
    }

    #[test]
    fn cursor_follows_time() {
        let mut g = LifeGraph::new(400.0, 100.0, 4.0);
        let x = g.cursor_mesh(1.0)[0].pos[0];
        assert!((x - 99.0).abs() < 1e-4);
        let x = g.cursor_mesh(4.0)[0].pos[0];
        assert!((x - 399.0).abs() < 1e-4);
    }
}
