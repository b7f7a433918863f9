//! Player settings loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file at all) is a valid
//! configuration. Unknown keys are rejected to catch typos early.
//!
//! ```toml
//! [playback]
//! speed = 2.0
//!
//! [moving_averages.long]
//! enabled = true
//! kind = "ema"
//! period = 200
//!
//! [data]
//! dir = "./klines"
//! symbol = "ETHUSDT"
//! interval = "4h"
//! ```

use std::path::{Path, PathBuf};

use market_data::{catalog, models::timeframe::TimeFrame};
use serde::{Deserialize, Serialize};

use crate::{error::PlayerError, indicators::MovingAverageConfig, playback::Speed};

/// Environment variable consulted when no config path is given explicitly.
pub const CONFIG_ENV_VAR: &str = "KLINE_PLAYER_CONFIG";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlayerConfig {
    pub playback: PlaybackSettings,
    pub moving_averages: MovingAverageConfig,
    pub data: DataSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlaybackSettings {
    /// Ticks per second.
    pub speed: f64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self { speed: 1.0 }
    }
}

/// Defaults for the kline source, overridable per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataSettings {
    /// Directory holding `<SYMBOL>_<interval>.json` exports.
    pub dir: PathBuf,
    pub symbol: String,
    pub interval: TimeFrame,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
            symbol: "BTCUSDT".to_string(),
            interval: TimeFrame::H1,
        }
    }
}

impl PlayerConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, PlayerError> {
        let config: Self = toml::from_str(s).map_err(|e| PlayerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_path(path: &Path) -> Result<Self, PlayerError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| PlayerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
    }

    /// Loads from `explicit`, else from `$KLINE_PLAYER_CONFIG`, else defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, PlayerError> {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| shared_utils::env::get_env_var_opt(CONFIG_ENV_VAR).map(PathBuf::from));

        match path {
            Some(path) => {
                tracing::info!(path = %path.display(), "loading config");
                Self::load_path(&path)
            }
            None => {
                tracing::debug!("no config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn validate(&self) -> Result<(), PlayerError> {
        Speed::new(self.playback.speed)?;
        self.moving_averages.validate()?;
        if self.data.symbol.trim().is_empty() {
            return Err(PlayerError::Config("data.symbol must not be empty".to_string()));
        }
        if !catalog::is_supported_timeframe(self.data.interval) {
            return Err(PlayerError::Config(format!(
                "data.interval {} is not one of the supported intervals",
                self.data.interval
            )));
        }
        Ok(())
    }

    pub fn speed(&self) -> Result<Speed, PlayerError> {
        Speed::new(self.playback.speed)
    }
}
