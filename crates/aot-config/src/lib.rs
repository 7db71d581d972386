//! Configuration for the always-on-top window controllers.
//!
//! Every field has a default matching the stock behavior, so an empty RON
//! document `()` is a valid configuration. Use [`load_from_path`] for files
//! and [`from_ron_str`] for inline text.

use std::{ffi::OsStr, fs, path::Path, time::Duration};

use aot_protocol::{ASPECT_RATIO, DEFAULT_SIZE, Size};
use serde::{Deserialize, Serialize};
use tracing::debug;

mod error;

pub use error::Error;

/// Complete configuration for both controllers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Host controller settings.
    pub host: HostConfig,
    /// Embedded client controller settings.
    pub client: ClientConfig,
}

/// Window stacking level requested for the floating window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ZLevel {
    /// Ordinary stacking.
    Normal,
    /// Above normal windows.
    Floating,
    /// Torn-off menu level.
    TornOffMenu,
    /// Modal panel level.
    ModalPanel,
    /// Main menu level.
    MainMenu,
    /// Status item level.
    Status,
    /// Pop-up menu level.
    PopUpMenu,
    /// Above full screen applications.
    #[default]
    ScreenSaver,
}

impl ZLevel {
    /// Level name as understood by the window manager.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Floating => "floating",
            Self::TornOffMenu => "torn-off-menu",
            Self::ModalPanel => "modal-panel",
            Self::MainMenu => "main-menu",
            Self::Status => "status",
            Self::PopUpMenu => "pop-up-menu",
            Self::ScreenSaver => "screen-saver",
        }
    }
}

/// Fixed chrome options injected into every allowed floating window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowChrome {
    /// CSS background colour.
    pub background_color: String,
    /// Smallest size the user can resize to.
    pub min_size: Size,
    /// Whether the window can be minimized.
    pub minimizable: bool,
    /// Whether the window can be maximized.
    pub maximizable: bool,
    /// Whether the user can resize the window.
    pub resizable: bool,
    /// Create the window always on top.
    pub always_on_top: bool,
    /// Start in full screen.
    pub fullscreen: bool,
    /// Whether full screen is allowed.
    pub fullscreenable: bool,
    /// Keep the window out of the taskbar.
    pub skip_taskbar: bool,
    /// Whether the OS draws a frame/titlebar.
    pub frame: bool,
    /// Whether the window is visible on creation; the host shows it once ready.
    pub show: bool,
    /// Isolate the page's script context.
    pub context_isolation: bool,
}

impl Default for WindowChrome {
    fn default() -> Self {
        Self {
            background_color: "transparent".to_string(),
            min_size: DEFAULT_SIZE,
            minimizable: false,
            maximizable: false,
            resizable: true,
            always_on_top: true,
            fullscreen: false,
            fullscreenable: false,
            skip_taskbar: true,
            frame: false,
            show: false,
            context_isolation: false,
        }
    }
}

/// Host controller settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    /// Width / height ratio enforced on resize.
    pub aspect_ratio: f64,
    /// Size used for a fresh window and restored on session close.
    pub default_size: Size,
    /// Distance from the bottom-right corner inside which resizes are vetoed.
    pub resize_corner_margin: i32,
    /// Stacking level of the floating window.
    pub always_on_top_level: ZLevel,
    /// Chrome options for the floating window.
    pub chrome: WindowChrome,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            aspect_ratio: ASPECT_RATIO,
            default_size: DEFAULT_SIZE,
            resize_corner_margin: 16,
            always_on_top_level: ZLevel::default(),
            chrome: WindowChrome::default(),
        }
    }
}

/// Embedded client controller settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Treat the pre-join screen as joined.
    pub open_on_prejoin: bool,
    /// Delay before re-attaching video after a media change.
    pub refresh_delay_ms: u64,
    /// Script and style URLs the floating window loads once populated.
    pub resources: Vec<String>,
}

impl ClientConfig {
    /// [`Self::refresh_delay_ms`] as a duration.
    pub fn refresh_delay(&self) -> Duration {
        Duration::from_millis(self.refresh_delay_ms)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            open_on_prejoin: false,
            refresh_delay_ms: 100,
            resources: vec!["alwaysontop.js".to_string(), "alwaysontop.css".to_string()],
        }
    }
}

impl Config {
    /// Reject values the controllers cannot work with.
    pub fn validate(&self) -> Result<(), Error> {
        let h = &self.host;
        if !h.aspect_ratio.is_finite() || h.aspect_ratio <= 0.0 {
            return Err(Error::validation(format!(
                "aspect_ratio must be a positive number, got {}",
                h.aspect_ratio
            )));
        }
        if h.default_size.width <= 0 || h.default_size.height <= 0 {
            return Err(Error::validation(format!(
                "default_size must be positive, got {}x{}",
                h.default_size.width, h.default_size.height
            )));
        }
        if h.resize_corner_margin < 0 {
            return Err(Error::validation("resize_corner_margin must not be negative"));
        }
        Ok(())
    }
}

/// Parse and validate a configuration from RON text.
pub fn from_ron_str(text: &str) -> Result<Config, Error> {
    let cfg: Config = ron::from_str(text).map_err(|e| Error::Parse {
        path: None,
        message: e.to_string(),
    })?;
    cfg.validate()?;
    Ok(cfg)
}

/// Load a configuration from a `.ron` file at `path`.
pub fn load_from_path(path: &Path) -> Result<Config, Error> {
    if path.extension() != Some(OsStr::new("ron")) {
        return Err(Error::Read {
            path: Some(path.to_path_buf()),
            message: "Unsupported config format (expected a .ron file)".to_string(),
        });
    }
    let text = fs::read_to_string(path).map_err(|e| Error::Read {
        path: Some(path.to_path_buf()),
        message: e.to_string(),
    })?;
    debug!(path = %path.display(), "loading config");
    from_ron_str(&text).map_err(|e| e.with_path(path))
}
