use serde::{Deserialize, Serialize};
use std::fmt;

pub const MISS_SUFFIX: &str = "_miss";
pub const WINDOW_SUFFIX: &str = "_window";

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Limb {
    Left,
    Right,
    Either,
    Hand,
}

impl Limb {
    pub const ALL: [Self; 4] = [Self::Left, Self::Right, Self::Either, Self::Hand];

    #[inline(always)]
    pub const fn from_code(c: char) -> Option<Self> {
        match c {
            'l' => Some(Self::Left),
            'r' => Some(Self::Right),
            'e' => Some(Self::Either),
            'h' => Some(Self::Hand),
            _ => None,
        }
    }

    #[inline(always)]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Left => "l",
            Self::Right => "r",
            Self::Either => "e",
            Self::Hand => "h",
        }
    }
}

/// Per-note limb marker as it appears in chart payloads (`"l"`, `"r_miss"`, ...).
///
/// The string is kept verbatim so unknown codes survive an export untouched;
/// only the first character decides the limb, and the `_miss`/`_window`
/// suffixes are UI markers layered on top of it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Annotation(String);

impl Annotation {
    #[inline(always)]
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    #[inline(always)]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Limb named by the first character, `None` for codes we don't know.
    #[inline(always)]
    pub fn limb(&self) -> Option<Limb> {
        self.0.chars().next().and_then(Limb::from_code)
    }

    #[inline(always)]
    pub fn is_miss(&self) -> bool {
        self.0.ends_with(MISS_SUFFIX)
    }

    #[inline(always)]
    pub fn is_window(&self) -> bool {
        self.0.ends_with(WINDOW_SUFFIX)
    }

    /// Code with any UI marker stripped.
    pub fn base(&self) -> &str {
        self.0
            .strip_suffix(MISS_SUFFIX)
            .or_else(|| self.0.strip_suffix(WINDOW_SUFFIX))
            .unwrap_or(&self.0)
    }

    pub fn with_miss(&self) -> Self {
        Self(format!("{}{MISS_SUFFIX}", self.base()))
    }
}

impl From<Limb> for Annotation {
    fn from(limb: Limb) -> Self {
        Self(limb.code().to_owned())
    }
}

impl From<&str> for Annotation {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{Annotation, Limb};

    #[test]
    fn limb_comes_from_first_character_only() {
        assert_eq!(Annotation::from("l").limb(), Some(Limb::Left));
        assert_eq!(Annotation::from("r_miss").limb(), Some(Limb::Right));
        assert_eq!(Annotation::from("h").limb(), Some(Limb::Hand));
        assert_eq!(Annotation::from("x").limb(), None);
        assert_eq!(Annotation::from("").limb(), None);
    }

    #[test]
    fn markers_are_not_limbs() {
        let a = Annotation::from("e_miss");
        assert!(a.is_miss());
        assert!(!a.is_window());
        assert_eq!(a.base(), "e");

        let w = Annotation::from("l_window");
        assert!(w.is_window());
        assert_eq!(w.base(), "l");
        assert_eq!(w.with_miss().as_str(), "l_miss");
    }
}
