use serde::Deserialize;
use skygrid_gesture::GestureConfig;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub grid: GridRules,
    pub gesture: GestureSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GridRules {
    /// Seats per resource column at one time row.
    #[serde(default = "default_column_capacity")]
    pub column_capacity: u32,
    /// Base slot labels shared by every day.
    pub base_slots: Vec<String>,
}

fn default_column_capacity() -> u32 {
    4
}

#[derive(Debug, Deserialize, Clone)]
pub struct GestureSettings {
    #[serde(default = "default_menu_arm_ms")]
    pub menu_arm_ms: u64,
    #[serde(default = "default_move_arm_ms")]
    pub move_arm_ms: u64,
    #[serde(default = "default_click_debounce_ms")]
    pub click_debounce_ms: u64,
    #[serde(default)]
    pub cancel_threshold_px: Option<f32>,
}

fn default_menu_arm_ms() -> u64 {
    500
}
fn default_move_arm_ms() -> u64 {
    1000
}
fn default_click_debounce_ms() -> u64 {
    100
}

impl GestureSettings {
    pub fn to_gesture_config(&self) -> GestureConfig {
        GestureConfig {
            menu_arm_ms: self.menu_arm_ms,
            move_arm_ms: self.move_arm_ms,
            click_debounce_ms: self.click_debounce_ms,
            cancel_threshold_px: self.cancel_threshold_px,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Environment-specific file is optional.
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in.
            .add_source(config::File::with_name("config/local").required(false))
            // `SKYGRID_GRID__COLUMN_CAPACITY=6` style overrides.
            .add_source(config::Environment::with_prefix("SKYGRID").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
