use crate::game::chart::ChartData;
use log::debug;

pub const DEFAULT_LEAD_PX: f32 = 200.0;
pub const DEFAULT_TRAIL_PX: f32 = 100.0;
pub const DEFAULT_COLLAPSE_PX: f32 = 1000.0;

/// Scroll distances, in canvas pixels, that drive auto expand/collapse.
///
/// An entry expands once the top of the viewport is within `lead_px` before
/// the segment start or `trail_px` after its end, and collapses only after
/// the viewport moves `collapse_px` away from the segment in either
/// direction. Positions in between keep the current state.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct NavTolerances {
    pub lead_px: f32,
    pub trail_px: f32,
    pub collapse_px: f32,
}

impl Default for NavTolerances {
    fn default() -> Self {
        Self {
            lead_px: DEFAULT_LEAD_PX,
            trail_px: DEFAULT_TRAIL_PX,
            collapse_px: DEFAULT_COLLAPSE_PX,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NavEntry {
    pub index: usize,
    pub start: f64,
    pub end: f64,
    pub level: f64,
    pub rare_skills: Vec<String>,
    pub similar_sections: Vec<usize>,
    pub expanded: bool,
    /// Set by a user toggle; auto-expand leaves the entry alone until it
    /// is scrolled far enough away to auto-collapse.
    pub manual: bool,
}

#[derive(Clone, Debug, Default)]
pub struct SegmentNav {
    entries: Vec<NavEntry>,
    tolerances: NavTolerances,
    time_scale: f32,
    active: Option<usize>,
}

impl SegmentNav {
    pub fn new(chart: &ChartData, time_scale: f32, tolerances: NavTolerances) -> Self {
        let entries = chart
            .segments
            .iter()
            .zip(chart.segment_data.iter())
            .enumerate()
            .map(|(index, (seg, info))| NavEntry {
                index,
                start: seg.start,
                end: seg.end,
                level: info.level,
                rare_skills: info.rare_skills.clone(),
                similar_sections: info.similar_sections.clone(),
                expanded: false,
                manual: false,
            })
            .collect();
        Self {
            entries,
            tolerances,
            time_scale,
            active: None,
        }
    }

    #[inline(always)]
    pub fn entries(&self) -> &[NavEntry] {
        &self.entries
    }

    #[inline(always)]
    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    /// Canvas scroll offset that puts segment `index` at the top.
    pub fn scroll_target(&self, index: usize) -> Option<f32> {
        self.entries
            .get(index)
            .map(|e| (e.start * f64::from(self.time_scale)) as f32)
    }

    #[inline(always)]
    fn span_px(&self, e: &NavEntry) -> (f32, f32) {
        let s = f64::from(self.time_scale);
        ((e.start * s) as f32, (e.end * s) as f32)
    }

    /// Applies the expand/collapse rules for a new scroll offset. Returns
    /// true when any entry changed state.
    pub fn sync_scroll(&mut self, scroll_y: f32) -> bool {
        let tol = self.tolerances;
        let mut changed = false;
        let mut active = None;
        for i in 0..self.entries.len() {
            let (y0, y1) = self.span_px(&self.entries[i]);
            let near = scroll_y >= y0 - tol.lead_px && scroll_y <= y1 + tol.trail_px;
            let far = scroll_y < y0 - tol.collapse_px || scroll_y > y1 + tol.collapse_px;
            if near && active.is_none() {
                active = Some(i);
            }

            let e = &mut self.entries[i];
            if far {
                if e.expanded || e.manual {
                    changed |= e.expanded;
                    e.expanded = false;
                    e.manual = false;
                }
            } else if near && !e.manual && !e.expanded {
                e.expanded = true;
                changed = true;
            }
        }
        if active != self.active {
            debug!("Segment nav active: {:?} -> {:?}", self.active, active);
            self.active = active;
        }
        changed
    }

    /// Manual expand/collapse. Returns the new state, `None` for a bad index.
    pub fn toggle(&mut self, index: usize) -> Option<bool> {
        let e = self.entries.get_mut(index)?;
        e.expanded = !e.expanded;
        e.manual = true;
        Some(e.expanded)
    }
}
