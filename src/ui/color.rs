/// Accepts "#rgb", "#rgba", "#rrggbb", "#rrggbbaa" (or without '#').
/// Panics on invalid input; use only with trusted literals.
/// Evaluated at COMPILE TIME if assigned to a const/static.
pub const fn rgba_hex(s: &str) -> [f32; 4] {
    let bytes = s.as_bytes();

    // Handle optional '#' by offsetting start index
    let (bytes, len) = if !bytes.is_empty() && bytes[0] == b'#' {
        let (_, rem) = bytes.split_at(1);
        (rem, s.len() - 1)
    } else {
        (bytes, s.len())
    };

    // Const-safe hex char to u8
    const fn val(b: u8) -> u8 {
        match b {
            b'0'..=b'9' => b - b'0',
            b'a'..=b'f' => 10 + (b - b'a'),
            b'A'..=b'F' => 10 + (b - b'A'),
            _ => panic!("invalid hex digit in color string"),
        }
    }

    // Combine two hex digits into a byte
    const fn byte2(h: u8, l: u8) -> u8 {
        (val(h) << 4) | val(l)
    }

    // Expand 4-bit color to 8-bit (e.g. F -> FF)
    const fn rep(n: u8) -> u8 {
        (val(n) << 4) | val(n)
    }

    let (r, g, b, a) = match len {
        3 => (rep(bytes[0]), rep(bytes[1]), rep(bytes[2]), 0xFF),
        4 => (rep(bytes[0]), rep(bytes[1]), rep(bytes[2]), rep(bytes[3])),
        6 => (
            byte2(bytes[0], bytes[1]),
            byte2(bytes[2], bytes[3]),
            byte2(bytes[4], bytes[5]),
            0xFF,
        ),
        8 => (
            byte2(bytes[0], bytes[1]),
            byte2(bytes[2], bytes[3]),
            byte2(bytes[4], bytes[5]),
            byte2(bytes[6], bytes[7]),
        ),
        _ => panic!("color hex string must be 3, 4, 6, or 8 digits"),
    };

    [
        r as f32 / 255.0,
        g as f32 / 255.0,
        b as f32 / 255.0,
        a as f32 / 255.0,
    ]
}

/* =========================== PALETTES =========================== */

/// Overlay band colors indexed by `JudgeTier::index` (perfect, great, good, bad).
pub const JUDGE_TIER_RGBA: [[f32; 4]; 4] = [
    rgba_hex("#21CCE855"),
    rgba_hex("#66C95555"),
    rgba_hex("#E29C1855"),
    rgba_hex("#C9855E55"),
];

pub const WINDOW_MARKER_RGBA: [f32; 4] = rgba_hex("#FFFFFF");

pub const DENSITY_LOW_RGBA: [f32; 4] = rgba_hex("#00ADC0");
pub const DENSITY_HIGH_RGBA: [f32; 4] = rgba_hex("#8200A1");

pub const SEGMENT_EASY_RGBA: [f32; 4] = rgba_hex("#5CE087");
pub const SEGMENT_HARD_RGBA: [f32; 4] = rgba_hex("#FF3C23");

pub const LIFE_FILL_RGBA: [f32; 4] = rgba_hex("#AEFA44CC");
pub const LIFE_REFERENCE_RGBA: [f32; 4] = rgba_hex("#FFFFFF66");
pub const LIFE_BLEED_RGBA: [f32; 4] = rgba_hex("#FF3030AA");

pub const VIEWPORT_RGBA: [f32; 4] = rgba_hex("#FFFFFF33");
pub const CURSOR_RGBA: [f32; 4] = rgba_hex("#FFFF00");

#[inline(always)]
pub fn lerp_color(t: f32, a: [f32; 4], b: [f32; 4]) -> [f32; 4] {
    let t = t.clamp(0.0, 1.0);
    [
        (b[0] - a[0]).mul_add(t, a[0]),
        (b[1] - a[1]).mul_add(t, a[1]),
        (b[2] - a[2]).mul_add(t, a[2]),
        (b[3] - a[3]).mul_add(t, a[3]),
    ]
}
