//! Session store maintenance configuration.

use serde::{Deserialize, Serialize};

/// Session store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Interval between sweeps that drop records whose refresh token expired.
    /// `0` disables the sweep.
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_minutes: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cleanup_interval_minutes: default_cleanup_interval(),
        }
    }
}

fn default_cleanup_interval() -> u64 {
    15
}
