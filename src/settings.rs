use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, PoisonError, RwLock};

use crate::backend::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use crate::pdf::CoordinateOrigin;

pub const CURRENT_VERSION: u32 = 1;
const SETTINGS_FILENAME: &str = "config.yaml";
const APP_NAME: &str = "rayo";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Base URL of the upload/search server
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,

    /// Raster scale relative to PDF points
    #[serde(default = "default_render_scale")]
    pub render_scale: f32,

    /// Number of page rasters kept in memory
    #[serde(default = "default_page_cache_size")]
    pub page_cache_size: usize,

    /// Minimum gap between two accepted command submissions
    #[serde(default = "default_command_cooldown")]
    pub command_cooldown_ms: u64,

    /// Corner that search result coordinates are measured from
    #[serde(default)]
    pub coordinate_origin: CoordinateOrigin,

    /// RRGGBB
    #[serde(default = "default_highlight_color")]
    pub highlight_color: String,

    #[serde(default = "default_highlight_opacity")]
    pub highlight_opacity: f32,

    #[serde(default = "default_left_sidebar_width")]
    pub left_sidebar_width: u16,

    #[serde(default = "default_right_sidebar_width")]
    pub right_sidebar_width: u16,
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_backend_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_render_scale() -> f32 {
    1.5
}

fn default_page_cache_size() -> usize {
    32
}

fn default_command_cooldown() -> u64 {
    300
}

fn default_highlight_color() -> String {
    "FFEB3B".to_string()
}

fn default_highlight_opacity() -> f32 {
    0.4
}

fn default_left_sidebar_width() -> u16 {
    24
}

fn default_right_sidebar_width() -> u16 {
    36
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            backend_url: default_backend_url(),
            request_timeout_secs: default_timeout(),
            render_scale: default_render_scale(),
            page_cache_size: default_page_cache_size(),
            command_cooldown_ms: default_command_cooldown(),
            coordinate_origin: CoordinateOrigin::default(),
            highlight_color: default_highlight_color(),
            highlight_opacity: default_highlight_opacity(),
            left_sidebar_width: default_left_sidebar_width(),
            right_sidebar_width: default_right_sidebar_width(),
        }
    }
}

impl Settings {
    /// `highlight_color` as RGB, falling back to the default on a bad value
    #[must_use]
    pub fn highlight_rgb(&self) -> (u8, u8, u8) {
        parse_hex_color(&self.highlight_color).unwrap_or_else(|| {
            warn!("Invalid highlight_color {:?}", self.highlight_color);
            (0xFF, 0xEB, 0x3B)
        })
    }
}

/// Parse `RRGGBB` with an optional leading `#`
#[must_use]
pub fn parse_hex_color(value: &str) -> Option<(u8, u8, u8)> {
    let hex = value.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |range| u8::from_str_radix(&hex[range], 16).ok();
    Some((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

static SETTINGS: LazyLock<RwLock<Settings>> = LazyLock::new(|| RwLock::new(Settings::default()));

fn preferred_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

/// Load settings from `explicit`, or from the per-user config file.
///
/// The per-user file is created with defaults when missing. An explicit path
/// that does not exist is left alone.
pub fn load_settings(explicit: Option<&Path>) {
    if let Some(path) = explicit {
        if path.exists() {
            load_settings_from_path(path);
        } else {
            warn!("Config file {path:?} not found, using default settings");
        }
        return;
    }

    let Some(path) = preferred_config_path() else {
        warn!("Could not determine config directory, using default settings");
        return;
    };
    if path.exists() {
        load_settings_from_path(&path);
    } else {
        info!("Settings file not found, creating with defaults at {path:?}");
        save_settings_to_file(&snapshot(), &path);
    }
}

fn load_settings_from_path(path: &Path) {
    match read_settings_file(path) {
        Ok(settings) => {
            *SETTINGS.write().unwrap_or_else(PoisonError::into_inner) = settings;
        }
        Err(e) => error!("{e}"),
    }
}

/// Parse a settings file, migrating and rewriting it when its version is old
pub fn read_settings_file(path: &Path) -> anyhow::Result<Settings> {
    let content = fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read settings file {path:?}: {e}"))?;
    let mut settings = serde_yaml::from_str::<Settings>(&content)
        .map_err(|e| anyhow::anyhow!("Failed to parse settings file {path:?}: {e}"))?;
    debug!("Loaded settings from {path:?}");

    if settings.version < CURRENT_VERSION {
        migrate_settings(&mut settings);
        save_settings_to_file(&settings, path);
    }
    Ok(settings)
}

fn migrate_settings(settings: &mut Settings) {
    info!(
        "Migrating settings from v{} to v{}",
        settings.version, CURRENT_VERSION
    );
    settings.version = CURRENT_VERSION;
}

fn save_settings_to_file(settings: &Settings, path: &Path) {
    if let Some(parent) = path.parent()
        && !parent.exists()
        && let Err(e) = fs::create_dir_all(parent)
    {
        error!("Failed to create config directory {parent:?}: {e}");
        return;
    }

    match serde_yaml::to_string(settings) {
        Ok(body) => {
            let content = format!("{SETTINGS_HEADER}{body}");
            match fs::write(path, content) {
                Ok(()) => debug!("Saved settings to {path:?}"),
                Err(e) => error!("Failed to save settings to {path:?}: {e}"),
            }
        }
        Err(e) => error!("Failed to serialize settings: {e}"),
    }
}

const SETTINGS_HEADER: &str = r#"# ============================================================================
# rayo configuration
# ============================================================================
# backend_url          server providing POST /upload and POST /keyword
# coordinate_origin    bottom_left (PDF user space) or top_left
# highlight_color      RRGGBB used for search result overlays

"#;

// Public API for accessing settings

/// Copy of the current settings
pub fn snapshot() -> Settings {
    SETTINGS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Apply command line overrides on top of the loaded file
pub fn update(apply: impl FnOnce(&mut Settings)) {
    let mut settings = SETTINGS.write().unwrap_or_else(PoisonError::into_inner);
    apply(&mut settings);
}
