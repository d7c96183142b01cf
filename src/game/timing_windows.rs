// Judgment windows shared by the overlay and anything that colors by tier.

// Half-widths in seconds, normal judge, counted in 60 Hz frames.
pub const PERFECT_S: f64 = 2.5 / 60.0;
pub const GREAT_S: f64 = 5.0 / 60.0;
pub const GOOD_S: f64 = 7.5 / 60.0;
pub const BAD_S: f64 = 10.0 / 60.0;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum JudgeTier {
    Perfect,
    Great,
    Good,
    Bad,
}

impl JudgeTier {
    #[inline(always)]
    pub const fn index(self) -> usize {
        match self {
            Self::Perfect => 0,
            Self::Great => 1,
            Self::Good => 2,
            Self::Bad => 3,
        }
    }
}

/// One band of the overlay, as offsets from the note time.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct WindowBand {
    pub tier: JudgeTier,
    pub start: f64,
    pub end: f64,
}

/// Seven bands, early to late: bad, good, great, perfect, great, good, bad.
pub const fn window_bands() -> [WindowBand; 7] {
    [
        WindowBand { tier: JudgeTier::Bad, start: -BAD_S, end: -GOOD_S },
        WindowBand { tier: JudgeTier::Good, start: -GOOD_S, end: -GREAT_S },
        WindowBand { tier: JudgeTier::Great, start: -GREAT_S, end: -PERFECT_S },
        WindowBand { tier: JudgeTier::Perfect, start: -PERFECT_S, end: PERFECT_S },
        WindowBand { tier: JudgeTier::Great, start: PERFECT_S, end: GREAT_S },
        WindowBand { tier: JudgeTier::Good, start: GREAT_S, end: GOOD_S },
        WindowBand { tier: JudgeTier::Bad, start: GOOD_S, end: BAD_S },
    ]
}
