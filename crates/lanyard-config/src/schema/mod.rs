//! Configuration schema types for the Lanyard client.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod display;
mod presence;
mod system;

pub use display::*;
pub use presence::*;
pub use system::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration.
///
/// Only override what you want to change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct LanyardConfig {
    pub presence: PresenceConfig,
    pub display: DisplayConfig,
    pub logging: LoggingConfig,
}
