use serde::{Deserialize, Serialize};
use winit::keyboard::KeyCode;

/// Window configuration for the canvas surface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Initial window width in pixels
    pub width: u32,
    /// Initial window height in pixels
    pub height: u32,
    /// Window title
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 800,
            title: "Sonder".to_string(),
        }
    }
}

/// Geometry parameters for circle placement and hit-testing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasConfig {
    /// Radius of a conversational circle in pixels
    pub circle_radius: f32,
    /// Minimum center distance between circles, as a multiple of the radius
    pub min_distance_factor: f32,
    /// Approximate height of the text band below a circle, used to keep
    /// labels from stacking on top of each other
    pub text_band_height: f32,
    /// Center distance between the two circles of a pair
    pub pair_distance: f32,
    /// Attempt budget for rejection-sampled placement
    pub max_attempts: u32,
    /// Margin kept between a new circle and the canvas edges
    pub edge_margin: f32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            circle_radius: 50.0,
            min_distance_factor: 4.0,
            text_band_height: 100.0,
            pair_distance: 200.0,
            max_attempts: 50,
            edge_margin: 200.0,
        }
    }
}

/// Timing parameters for the speech animation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Seconds until the speaking side of a pair switches
    pub speaker_switch_secs: f32,
    /// Quote fade-in speed in opacity units per second
    pub fade_in_rate: f32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            speaker_switch_secs: 3.0,
            fade_in_rate: 3.0,
        }
    }
}

/// Text generation endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogueConfig {
    /// Messages API endpoint
    pub endpoint: String,
    /// Model used for dialogue lines
    pub model: String,
    /// Token cap per generated line
    pub max_tokens: u32,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.anthropic.com/v1/messages".to_string(),
            model: "claude-3-haiku-20240307".to_string(),
            max_tokens: 1000,
        }
    }
}

/// Escalation and dissolve-sequence parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExistentialConfig {
    /// Rounds a pair exchanges before its requests turn existential
    pub existential_after: u32,
    /// Total rounds before the dissolve sequence is scheduled
    pub dissolve_after: u32,
    /// Seconds the final exchange is left on screen before dissolving
    pub dissolve_dwell_secs: f32,
    /// Number of rain particles spawned by the dissolve
    pub rain_count: u32,
    /// Rain opacity decay per second
    pub rain_fade: f32,
    /// Opacity below which a rain particle is destroyed
    pub rain_min_opacity: f32,
    /// Circle alpha decay per second during the dissolve
    pub circle_fade: f32,
}

impl Default for ExistentialConfig {
    fn default() -> Self {
        Self {
            existential_after: 3,
            dissolve_after: 6,
            dissolve_dwell_secs: 6.0,
            rain_count: 160,
            rain_fade: 0.35,
            rain_min_opacity: 0.05,
            circle_fade: 0.5,
        }
    }
}

/// Configuration for keyboard shortcuts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyboardShortcuts {
    /// Key that spawns a new circle pair
    pub spawn_pair: String,
    /// Key that resets the scene
    pub reset_scene: String,
    /// Key to exit application
    pub exit_application: String,
}

impl Default for KeyboardShortcuts {
    fn default() -> Self {
        Self {
            spawn_pair: "Space".to_string(),
            reset_scene: "KeyR".to_string(),
            exit_application: "Escape".to_string(),
        }
    }
}

impl KeyboardShortcuts {
    /// Convert a key string to a KeyCode
    pub fn to_key_code(&self, key_str: &str) -> Option<KeyCode> {
        match key_str {
            "KeyA" => Some(KeyCode::KeyA),
            "KeyB" => Some(KeyCode::KeyB),
            "KeyC" => Some(KeyCode::KeyC),
            "KeyD" => Some(KeyCode::KeyD),
            "KeyE" => Some(KeyCode::KeyE),
            "KeyF" => Some(KeyCode::KeyF),
            "KeyG" => Some(KeyCode::KeyG),
            "KeyH" => Some(KeyCode::KeyH),
            "KeyI" => Some(KeyCode::KeyI),
            "KeyJ" => Some(KeyCode::KeyJ),
            "KeyK" => Some(KeyCode::KeyK),
            "KeyL" => Some(KeyCode::KeyL),
            "KeyM" => Some(KeyCode::KeyM),
            "KeyN" => Some(KeyCode::KeyN),
            "KeyO" => Some(KeyCode::KeyO),
            "KeyP" => Some(KeyCode::KeyP),
            "KeyQ" => Some(KeyCode::KeyQ),
            "KeyR" => Some(KeyCode::KeyR),
            "KeyS" => Some(KeyCode::KeyS),
            "KeyT" => Some(KeyCode::KeyT),
            "KeyU" => Some(KeyCode::KeyU),
            "KeyV" => Some(KeyCode::KeyV),
            "KeyW" => Some(KeyCode::KeyW),
            "KeyX" => Some(KeyCode::KeyX),
            "KeyY" => Some(KeyCode::KeyY),
            "KeyZ" => Some(KeyCode::KeyZ),
            "Digit0" => Some(KeyCode::Digit0),
            "Digit1" => Some(KeyCode::Digit1),
            "Digit2" => Some(KeyCode::Digit2),
            "Digit3" => Some(KeyCode::Digit3),
            "Digit4" => Some(KeyCode::Digit4),
            "Digit5" => Some(KeyCode::Digit5),
            "Digit6" => Some(KeyCode::Digit6),
            "Digit7" => Some(KeyCode::Digit7),
            "Digit8" => Some(KeyCode::Digit8),
            "Digit9" => Some(KeyCode::Digit9),
            "Space" => Some(KeyCode::Space),
            "Escape" => Some(KeyCode::Escape),
            "Enter" => Some(KeyCode::Enter),
            "Tab" => Some(KeyCode::Tab),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Window configuration
    pub window: WindowConfig,
    /// Circle geometry and placement configuration
    pub canvas: CanvasConfig,
    /// Speech animation timing
    pub timing: TimingConfig,
    /// Text generation configuration
    pub dialogue: DialogueConfig,
    /// Escalation and dissolve configuration
    pub existential: ExistentialConfig,
    /// Keyboard shortcuts configuration
    pub keyboard_shortcuts: KeyboardShortcuts,
}

/// Helper function to read the application configuration
pub fn read_app_config() -> AppConfig {
    match std::fs::read_to_string("config.json") {
        Ok(config_str) => match serde_json::from_str(&config_str) {
            Ok(config) => config,
            Err(e) => {
                println!(
                    "Failed to parse config.json: {}. Using default configuration.",
                    e
                );
                AppConfig::default()
            }
        },
        Err(e) => {
            println!(
                "Failed to read config.json: {}. Using default configuration.",
                e
            );
            AppConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_json() {
        let config = AppConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.canvas.max_attempts, config.canvas.max_attempts);
        assert_eq!(parsed.dialogue.model, config.dialogue.model);
    }

    #[test]
    fn shortcut_strings_resolve_to_key_codes() {
        let shortcuts = KeyboardShortcuts::default();
        assert_eq!(
            shortcuts.to_key_code(&shortcuts.spawn_pair),
            Some(KeyCode::Space)
        );
        assert_eq!(
            shortcuts.to_key_code(&shortcuts.exit_application),
            Some(KeyCode::Escape)
        );
        assert_eq!(shortcuts.to_key_code("NoSuchKey"), None);
    }
}
