pub mod config;
pub mod dialogue;
pub mod engine;
pub mod names;
pub mod placement;
pub mod scene;
pub mod ui;

// Re-export key components for easier access
pub use config::{read_app_config, AppConfig};
pub use dialogue::{DialogueClient, RoundKind};
pub use engine::{DialogueEngine, EngineBridge, RoundRequest, SceneEvent};
pub use scene::{Circle, CircleId, PairId, Scene, SceneMode, SpeechPhase};

// Re-export common external dependencies
pub use anyhow::{anyhow, Context, Result};
pub use serde::{Deserialize, Serialize};
