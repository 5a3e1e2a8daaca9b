use serde::{Deserialize, Serialize};

/// Terminal rendering options for the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Re-render period in milliseconds (valid range: 100-10000).
    pub tick_interval_ms: u32,
    /// Render the diagnostics block under the presence card.
    pub show_diagnostics: bool,
    /// Max characters of the raw response shown in diagnostics.
    pub raw_response_limit: u32,
    /// Also list listening/custom-status activities.
    pub show_hidden_activities: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            show_diagnostics: false,
            raw_response_limit: 512,
            show_hidden_activities: false,
        }
    }
}
