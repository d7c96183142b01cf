use crate::game::life::DEFAULT_INITIAL_LIFE;
use crate::ui::click_mode::ClickPreset;
use crate::ui::segment_nav::NavTolerances;
use directories::ProjectDirs;
use ini::Ini;
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::str::FromStr;

const CONFIG_FILE: &str = "stepview.ini";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "Off",
            Self::Error => "Error",
            Self::Warn => "Warn",
            Self::Info => "Info",
            Self::Debug => "Debug",
            Self::Trace => "Trace",
        }
    }

    pub const fn as_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Off => log::LevelFilter::Off,
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

impl FromStr for LogLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "none" => Ok(Self::Off),
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    pub log_level: LogLevel,
    pub click_mode: ClickPreset,
    /// 0 disables the frozen reference; 1..=100 pins life at that percent.
    pub freeze_percent: u8,
    pub initial_life: f64,
    pub viewport_height: f32,
    pub nav: NavTolerances,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Warn,
            click_mode: ClickPreset::Cycle,
            freeze_percent: 0,
            initial_life: DEFAULT_INITIAL_LIFE,
            viewport_height: 800.0,
            nav: NavTolerances::default(),
        }
    }
}

/// Platform config directory, or the working directory when none exists.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("", "", "stepview").map_or_else(
        || PathBuf::from(CONFIG_FILE),
        |dirs| dirs.config_dir().join(CONFIG_FILE),
    )
}

fn parse_key<T: FromStr>(conf: &Ini, section: &str, key: &str, default: T) -> T {
    match conf.get_from(Some(section), key) {
        None => default,
        Some(raw) => raw.trim().parse::<T>().unwrap_or_else(|_| {
            warn!("Invalid value '{raw}' for [{section}] {key}; using default.");
            default
        }),
    }
}

impl Config {
    pub fn from_ini(conf: &Ini) -> Self {
        let default = Self::default();
        let freeze_percent: u8 = parse_key(conf, "Lifebar", "FreezePercent", default.freeze_percent);
        let freeze_percent = if freeze_percent > 100 {
            warn!("FreezePercent {freeze_percent} above 100; clamping.");
            100
        } else {
            freeze_percent
        };
        let initial_life: f64 = parse_key(conf, "Lifebar", "InitialLife", default.initial_life);
        let viewport_height: f32 =
            parse_key(conf, "Options", "ViewportHeight", default.viewport_height);

        Self {
            log_level: parse_key(conf, "Options", "LogLevel", default.log_level),
            click_mode: parse_key(conf, "Options", "ClickMode", default.click_mode),
            freeze_percent,
            initial_life: if initial_life.is_finite() && initial_life >= 0.0 {
                initial_life
            } else {
                default.initial_life
            },
            viewport_height: if viewport_height > 0.0 {
                viewport_height
            } else {
                default.viewport_height
            },
            nav: NavTolerances {
                lead_px: parse_key(conf, "Navigator", "LeadPx", default.nav.lead_px),
                trail_px: parse_key(conf, "Navigator", "TrailPx", default.nav.trail_px),
                collapse_px: parse_key(conf, "Navigator", "CollapsePx", default.nav.collapse_px),
            },
        }
    }

    pub fn to_ini(&self) -> Ini {
        let mut conf = Ini::new();
        // Keys in alphabetical order within each section.
        conf.with_section(Some("Options"))
            .set("ClickMode", self.click_mode.as_str())
            .set("LogLevel", self.log_level.as_str())
            .set("ViewportHeight", self.viewport_height.to_string());
        conf.with_section(Some("Lifebar"))
            .set("FreezePercent", self.freeze_percent.to_string())
            .set("InitialLife", self.initial_life.to_string());
        conf.with_section(Some("Navigator"))
            .set("CollapsePx", self.nav.collapse_px.to_string())
            .set("LeadPx", self.nav.lead_px.to_string())
            .set("TrailPx", self.nav.trail_px.to_string());
        conf
    }

    /// Reads `path`, writing a default file first when it does not exist.
    /// Any read failure yields the defaults.
    pub fn load(path: &Path) -> Self {
        if !path.exists()
            && let Err(e) = create_default_config_file(path)
        {
            warn!("Failed to create default config file: {e}");
        }
        match Ini::load_from_file(path) {
            Ok(conf) => {
                let cfg = Self::from_ini(&conf);
                info!("Configuration loaded from '{}'.", path.display());
                cfg
            }
            Err(e) => {
                warn!("Failed to load '{}': {e}. Using defaults.", path.display());
                Self::default()
            }
        }
    }
}

pub fn create_default_config_file(path: &Path) -> Result<(), std::io::Error> {
    info!("'{}' not found, creating with default values.", path.display());
    if let Some(dir) = path.parent()
        && !dir.as_os_str().is_empty()
    {
        std::fs::create_dir_all(dir)?;
    }
    Config::default().to_ini().write_to_file(path)
}
