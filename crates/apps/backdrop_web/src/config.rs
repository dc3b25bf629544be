use foundation::viewport::ViewportPolicy;
use scene::{BackdropSettings, SettingsError};
use serde::{Deserialize, Serialize};

/// Everything `start_backdrop` accepts; every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackdropConfig {
    #[serde(flatten)]
    pub scene: BackdropSettings,
    pub viewport: ViewportPolicy,
    /// 2D canvas for the star overlay.
    pub fg_canvas_id: String,
    /// GPU canvas for the sky and grid.
    pub bg_canvas_id: String,
    pub section_selector: String,
    /// Attribute holding an `r,g,b` triple.
    pub color_attribute: String,
    pub observer_root_margin: String,
    pub blue_noise_url: String,
    pub resize_debounce_ms: f64,
    pub alert_on_shader_error: bool,
    /// Mirror lifecycle events to the console every frame.
    pub trace_events: bool,
}

impl Default for BackdropConfig {
    fn default() -> Self {
        Self {
            scene: BackdropSettings::default(),
            viewport: ViewportPolicy::default(),
            fg_canvas_id: "render-canvas".to_string(),
            bg_canvas_id: "bg-canvas".to_string(),
            section_selector: "section[data-color]".to_string(),
            color_attribute: "data-color".to_string(),
            observer_root_margin: "-50% 0% -50% 0%".to_string(),
            blue_noise_url: "Assets/blueNoise.png".to_string(),
            resize_debounce_ms: 150.0,
            alert_on_shader_error: true,
            trace_events: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Json(String),
    Settings(SettingsError),
    Viewport,
    Empty(&'static str),
    Debounce(f64),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Json(msg) => write!(f, "config is not valid JSON: {msg}"),
            ConfigError::Settings(err) => write!(f, "invalid scene settings: {err}"),
            ConfigError::Viewport => {
                write!(f, "viewport policy needs a positive dpr cap and resolution cap")
            }
            ConfigError::Empty(field) => write!(f, "{field} must not be empty"),
            ConfigError::Debounce(ms) => {
                write!(f, "resize_debounce_ms must be finite and >= 0, got {ms}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<SettingsError> for ConfigError {
    fn from(err: SettingsError) -> Self {
        ConfigError::Settings(err)
    }
}

impl BackdropConfig {
    /// Parses and validates; an empty or missing string yields the defaults.
    pub fn from_json(text: Option<&str>) -> Result<Self, ConfigError> {
        let config = match text.map(str::trim) {
            None | Some("") => Self::default(),
            Some(text) => {
                serde_json::from_str(text).map_err(|e| ConfigError::Json(e.to_string()))?
            }
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scene.validate()?;
        if !self.viewport.is_valid() {
            return Err(ConfigError::Viewport);
        }
        for (name, value) in [
            ("fg_canvas_id", &self.fg_canvas_id),
            ("bg_canvas_id", &self.bg_canvas_id),
            ("section_selector", &self.section_selector),
            ("color_attribute", &self.color_attribute),
            ("blue_noise_url", &self.blue_noise_url),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Empty(name));
            }
        }
        if !self.resize_debounce_ms.is_finite() || self.resize_debounce_ms < 0.0 {
            return Err(ConfigError::Debounce(self.resize_debounce_ms));
        }
        Ok(())
    }
}
