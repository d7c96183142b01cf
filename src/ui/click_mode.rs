use crate::game::annotation::{Annotation, Limb};
use rustc_hash::FxHashMap;
use std::str::FromStr;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ClickBehavior {
    AnnotateLimb,
    ToggleMiss,
    ToggleTimingWindow,
}

/// Named click-mode tables selectable from config or the host toolbar.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ClickPreset {
    Cycle,
    Swap,
    Set(Limb),
    Miss,
    Window,
}

impl ClickPreset {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cycle => "cycle",
            Self::Swap => "swap",
            Self::Set(Limb::Left) => "left",
            Self::Set(Limb::Right) => "right",
            Self::Set(Limb::Either) => "either",
            Self::Set(Limb::Hand) => "hand",
            Self::Miss => "miss",
            Self::Window => "window",
        }
    }
}

impl FromStr for ClickPreset {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cycle" => Ok(Self::Cycle),
            "swap" => Ok(Self::Swap),
            "left" | "l" => Ok(Self::Set(Limb::Left)),
            "right" | "r" => Ok(Self::Set(Limb::Right)),
            "either" | "e" => Ok(Self::Set(Limb::Either)),
            "hand" | "h" => Ok(Self::Set(Limb::Hand)),
            "miss" => Ok(Self::Miss),
            "window" => Ok(Self::Window),
            _ => Err(()),
        }
    }
}

/// Lookup from the clicked note's current code to its next code, plus what
/// a click means. Swapped wholesale when the user changes mode.
#[derive(Clone, Debug, PartialEq)]
pub struct ClickMode {
    pub behavior: ClickBehavior,
    table: FxHashMap<Annotation, Annotation>,
}

impl ClickMode {
    pub fn from_pairs(behavior: ClickBehavior, pairs: &[(&str, &str)]) -> Self {
        let table = pairs
            .iter()
            .map(|&(from, to)| (Annotation::from(from), Annotation::from(to)))
            .collect();
        Self { behavior, table }
    }

    pub fn cycle() -> Self {
        Self::from_pairs(
            ClickBehavior::AnnotateLimb,
            &[("l", "r"), ("r", "e"), ("e", "h"), ("h", "l")],
        )
    }

    pub fn swap() -> Self {
        Self::from_pairs(ClickBehavior::AnnotateLimb, &[("l", "r"), ("r", "l")])
    }

    pub fn set(limb: Limb) -> Self {
        let table = Limb::ALL
            .iter()
            .map(|&from| (Annotation::from(from), Annotation::from(limb)))
            .collect();
        Self {
            behavior: ClickBehavior::AnnotateLimb,
            table,
        }
    }

    /// Feet only; hand notes are never scored as misses.
    pub fn miss() -> Self {
        let mut table = FxHashMap::default();
        for limb in [Limb::Left, Limb::Right, Limb::Either] {
            let hit = Annotation::from(limb);
            let missed = hit.with_miss();
            table.insert(missed.clone(), hit.clone());
            table.insert(hit, missed);
        }
        Self {
            behavior: ClickBehavior::ToggleMiss,
            table,
        }
    }

    pub fn timing_window() -> Self {
        Self {
            behavior: ClickBehavior::ToggleTimingWindow,
            table: FxHashMap::default(),
        }
    }

    pub fn from_preset(preset: ClickPreset) -> Self {
        match preset {
            ClickPreset::Cycle => Self::cycle(),
            ClickPreset::Swap => Self::swap(),
            ClickPreset::Set(limb) => Self::set(limb),
            ClickPreset::Miss => Self::miss(),
            ClickPreset::Window => Self::timing_window(),
        }
    }

    /// Code a click turns `current` into, `None` when the table has no entry.
    #[inline(always)]
    pub fn next(&self, current: &Annotation) -> Option<&Annotation> {
        self.table.get(current)
    }
}

impl Default for ClickMode {
    fn default() -> Self {
        Self::cycle()
    }
}
