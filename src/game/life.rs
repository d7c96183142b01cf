use crate::game::chart::ChartData;
use log::trace;

// Life bar model of the PIU-style scoring rule. Life is measured in raw
// points; the bar maximum grows with the chart level.

pub const LIFE_BASE_MAX: f64 = 1000.0;
pub const LIFE_MAX_LEVEL_COEFF: f64 = 3.0;
pub const HEAL_FACTOR_MAX: f64 = 800.0;

// Miss: lose a quarter of life (counted up to 1000) plus a flat 20.
pub const MISS_LIFE_CAP: f64 = 1000.0;
pub const MISS_LIFE_RATIO: f64 = 500.0 / 2000.0;
pub const MISS_LIFE_FLAT: f64 = 20.0;
pub const MISS_HEAL_FACTOR_PENALTY: f64 = 700.0;

// Perfect: heal by 1.2% of the heal factor, then grow the factor.
pub const PERFECT_HEAL_RATE: f64 = 12.0 / 1000.0;
pub const PERFECT_HEAL_FACTOR_GAIN: f64 = 20.0;

pub const DEFAULT_INITIAL_LIFE: f64 = 500.0;
pub const DEFAULT_INITIAL_HEAL_FACTOR: f64 = 0.0;

#[inline(always)]
pub fn life_max(level: u32) -> f64 {
    let level = f64::from(level);
    LIFE_BASE_MAX + LIFE_MAX_LEVEL_COEFF * level * level
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LifeParams {
    pub life_max: f64,
    pub initial_life: f64,
    pub initial_heal_factor: f64,
}

impl LifeParams {
    pub fn for_level(level: u32, initial_life: f64) -> Self {
        let life_max = life_max(level);
        Self {
            life_max,
            initial_life: initial_life.clamp(0.0, life_max),
            initial_heal_factor: DEFAULT_INITIAL_HEAL_FACTOR,
        }
    }
}

/// Pins life to `fraction * life_max` for every event strictly before `until`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Freeze {
    pub fraction: f64,
    pub until: f64,
}

#[derive(Copy, Clone, Debug)]
struct LifeState {
    life: f64,
    heal_factor: f64,
    life_max: f64,
}

impl LifeState {
    #[inline(always)]
    fn miss(&mut self) {
        let loss = self.life.min(MISS_LIFE_CAP) * MISS_LIFE_RATIO + MISS_LIFE_FLAT;
        self.life = (self.life - loss).max(0.0);
        self.heal_factor = (self.heal_factor - MISS_HEAL_FACTOR_PENALTY).max(0.0);
    }

    #[inline(always)]
    fn perfect(&mut self) {
        self.life = (self.life + PERFECT_HEAL_RATE * self.heal_factor).min(self.life_max);
        self.heal_factor = (self.heal_factor + PERFECT_HEAL_FACTOR_GAIN).min(HEAL_FACTOR_MAX);
    }
}

/// Scoring events of one chart: unique arrow times merged with hold-tick end
/// times, ascending, with the number of ticks ending at each time.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LifeTimeline {
    pub times: Vec<f64>,
    pub ticks: Vec<u32>,
}

impl LifeTimeline {
    pub fn from_chart(chart: &ChartData) -> Self {
        let mut events: Vec<(f64, u32)> = Vec::with_capacity(
            chart.arrowarts.len() + chart.hold_ticks().len(),
        );
        events.extend(chart.arrowarts.iter().map(|a| (a.time, 0)));
        events.extend(chart.hold_ticks().iter().map(|t| (t.end, t.count)));
        events.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut times: Vec<f64> = Vec::with_capacity(events.len());
        let mut ticks: Vec<u32> = Vec::with_capacity(events.len());
        for (t, n) in events {
            if let Some(&last) = times.last()
                && last == t
            {
                let ix = ticks.len() - 1;
                ticks[ix] = ticks[ix].saturating_add(n);
                continue;
            }
            times.push(t);
            ticks.push(n);
        }
        Self { times, ticks }
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    #[inline(always)]
    pub fn last_time(&self) -> f64 {
        self.times.last().copied().unwrap_or(0.0)
    }
}

/// Sorted, de-duplicated miss times for membership tests during a replay.
#[derive(Clone, Debug, Default)]
pub struct MissLookup {
    sorted: Vec<f64>,
}

impl MissLookup {
    pub fn new(miss_times: &[f64]) -> Self {
        let mut sorted = miss_times.to_vec();
        sorted.sort_by(f64::total_cmp);
        sorted.dedup();
        Self { sorted }
    }

    #[inline(always)]
    pub fn contains(&self, t: f64) -> bool {
        self.sorted.binary_search_by(|m| m.total_cmp(&t)).is_ok()
    }

    #[inline(always)]
    pub fn first(&self) -> Option<f64> {
        self.sorted.first().copied()
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LifeTrace {
    pub times: Vec<f64>,
    pub healths: Vec<f64>,
}

impl LifeTrace {
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Life at `time`, holding the last sample until the next event.
    pub fn life_at(&self, time: f64) -> f64 {
        let ix = self.times.partition_point(|&t| t <= time);
        if ix == 0 {
            return self.healths.first().copied().unwrap_or(0.0);
        }
        self.healths[ix - 1]
    }
}

/// Replays the whole timeline. Identical inputs give bit-identical traces.
pub fn simulate(
    timeline: &LifeTimeline,
    params: LifeParams,
    misses: &MissLookup,
    freeze: Option<Freeze>,
) -> LifeTrace {
    let frozen_life = freeze.map(|f| (f.fraction.clamp(0.0, 1.0) * params.life_max, f.until));

    let mut state = LifeState {
        life: params.initial_life.clamp(0.0, params.life_max),
        heal_factor: params.initial_heal_factor.clamp(0.0, HEAL_FACTOR_MAX),
        life_max: params.life_max,
    };
    let mut trace = LifeTrace {
        times: Vec::with_capacity(timeline.len() + 1),
        healths: Vec::with_capacity(timeline.len() + 1),
    };
    trace.times.push(0.0);
    trace.healths.push(state.life);

    for (&t, &ticks) in timeline.times.iter().zip(&timeline.ticks) {
        match frozen_life {
            Some((life, until)) if t < until => {
                state.life = life;
            }
            _ => {
                if misses.contains(t) {
                    state.miss();
                } else {
                    state.perfect();
                }
                for _ in 0..ticks {
                    state.perfect();
                }
            }
        }
        trace.times.push(t);
        trace.healths.push(state.life);
    }

    trace!(
        "Life replay: {} events, {} misses, final life {:.2}",
        timeline.len(),
        misses.len(),
        state.life
    );
    trace
}

/// What the reference trace is measured against.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Reference {
    /// Every event played perfectly from the initial life.
    Perfect,
    /// Life pinned at `fraction * life_max` until the first actual miss,
    /// perfect play afterwards.
    FrozenUntilFirstMiss { fraction: f64 },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LifeTraces {
    pub actual: LifeTrace,
    pub reference: LifeTrace,
    pub life_max: f64,
}

impl LifeTraces {
    pub fn compute(
        timeline: &LifeTimeline,
        params: LifeParams,
        miss_times: &[f64],
        reference: Reference,
    ) -> Self {
        let misses = MissLookup::new(miss_times);
        let no_misses = MissLookup::default();
        let (actual, reference) = match reference {
            Reference::Perfect => (
                simulate(timeline, params, &misses, None),
                simulate(timeline, params, &no_misses, None),
            ),
            Reference::FrozenUntilFirstMiss { fraction } => {
                let freeze = Freeze {
                    fraction,
                    until: misses.first().unwrap_or(f64::INFINITY),
                };
                (
                    simulate(timeline, params, &misses, Some(freeze)),
                    simulate(timeline, params, &no_misses, Some(freeze)),
                )
            }
        };
        Self {
            actual,
            reference,
            life_max: params.life_max,
        }
    }

    /// Per-sample deficit of actual play against the reference, never negative.
    pub fn bleed(&self) -> Vec<f64> {
        self.actual
            .healths
            .iter()
            .zip(&self.reference.healths)
            .map(|(a, r)| (r - a).max(0.0))
            .collect()
    }

    pub fn summary(&self) -> LifeSummary {
        let healths = &self.actual.healths;
        let min_life = healths.iter().copied().fold(f64::INFINITY, f64::min);
        let fail_time = healths
            .iter()
            .position(|&h| h <= 0.0)
            .map(|ix| self.actual.times[ix]);
        LifeSummary {
            min_life: if min_life.is_finite() { min_life } else { 0.0 },
            final_life: healths.last().copied().unwrap_or(0.0),
            fail_time,
            life_max: self.life_max,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LifeSummary {
    pub min_life: f64,
    pub final_life: f64,
    pub fail_time: Option<f64>,
    pub life_max: f64,
}
