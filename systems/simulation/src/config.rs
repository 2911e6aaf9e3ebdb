//! Run configuration loaded from TOML.

use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use hearthguard_core::{Stockpile, WaveDefinition};
use hearthguard_system_waves::default_wave_table;
use hearthguard_world::WorldSettings;
use serde::Deserialize;

/// Smallest grid that still leaves room between the spawn ring and the base.
const MIN_GRID_HALF_EXTENT: i32 = 6;
/// Largest number of one archetype a single wave row may spawn.
const MAX_WAVE_ENTRY_COUNT: u32 = 500;

/// Tunables for a single run.
///
/// Every key is optional in TOML; missing keys take their defaults.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Seed for every random decision of the run.
    pub seed: u64,
    /// Largest absolute cell coordinate of the playable grid.
    pub grid_half_extent: i32,
    /// Hit points of the main base.
    pub base_max_health: f32,
    /// Base length of a day before skill bonuses.
    pub day_duration_secs: f32,
    /// Wave whose dawn ends the run in victory.
    pub final_wave: u32,
    /// Delay between the last enemy falling and dawn.
    pub night_end_delay_secs: f32,
    /// Upper bound on the time advanced by one tick.
    pub max_tick_secs: f32,
    /// Period between weather re-rolls within a phase.
    pub weather_interval_secs: f32,
    /// Kills inside this window extend the combo.
    pub combo_window_secs: f32,
    /// Wood available at the start.
    pub starting_wood: u32,
    /// Stone available at the start.
    pub starting_stone: u32,
    /// Gold available at the start.
    pub starting_gold: u32,
    /// Scripted waves, first night first.
    pub waves: Vec<WaveDefinition>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 0x5eed_1e55,
            grid_half_extent: 30,
            base_max_health: 1000.0,
            day_duration_secs: 60.0,
            final_wave: 10,
            night_end_delay_secs: 3.0,
            max_tick_secs: 0.05,
            weather_interval_secs: 45.0,
            combo_window_secs: 3.0,
            starting_wood: 60,
            starting_stone: 40,
            starting_gold: 50,
            waves: default_wave_table(),
        }
    }
}

impl SimulationConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Checks that every value can drive a run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("day_duration_secs", self.day_duration_secs),
            ("max_tick_secs", self.max_tick_secs),
            ("weather_interval_secs", self.weather_interval_secs),
            ("combo_window_secs", self.combo_window_secs),
            ("base_max_health", self.base_max_health),
        ];
        for (field, value) in positive {
            if value.is_nan() || value <= 0.0 {
                return Err(ConfigError::NonPositive { field });
            }
        }
        if self.night_end_delay_secs.is_nan() || self.night_end_delay_secs < 0.0 {
            return Err(ConfigError::NonPositive {
                field: "night_end_delay_secs",
            });
        }
        if self.final_wave == 0 {
            return Err(ConfigError::NonPositive {
                field: "final_wave",
            });
        }
        if self.grid_half_extent < MIN_GRID_HALF_EXTENT {
            return Err(ConfigError::GridTooSmall {
                half_extent: self.grid_half_extent,
                minimum: MIN_GRID_HALF_EXTENT,
            });
        }
        if self.waves.is_empty() {
            return Err(ConfigError::EmptyWaveTable);
        }
        for (index, wave) in self.waves.iter().enumerate() {
            if let Some(entry) = wave
                .counts
                .iter()
                .find(|entry| entry.count > MAX_WAVE_ENTRY_COUNT)
            {
                return Err(ConfigError::WaveTooLarge {
                    wave: index + 1,
                    count: entry.count,
                    maximum: MAX_WAVE_ENTRY_COUNT,
                });
            }
        }
        Ok(())
    }

    /// Longest slice of time a single tick may advance, rounded to whole microseconds.
    #[must_use]
    pub fn max_tick(&self) -> Duration {
        let micros = (f64::from(self.max_tick_secs) * 1e6).round();
        Duration::from_micros(micros as u64)
    }

    /// World parameters derived from this configuration.
    #[must_use]
    pub fn world_settings(&self) -> WorldSettings {
        WorldSettings {
            grid_half_extent: self.grid_half_extent,
            base_max_health: self.base_max_health,
            stockpile: Stockpile::new(self.starting_wood, self.starting_stone, self.starting_gold),
        }
    }
}

/// Errors raised while loading a [`SimulationConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config at {}", path.display())]
    Read {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The document is not valid TOML for this schema.
    #[error("failed to parse config")]
    Parse(#[from] toml::de::Error),
    /// A duration or amount that must be positive is not.
    #[error("`{field}` must be positive")]
    NonPositive {
        /// Offending key.
        field: &'static str,
    },
    /// The grid cannot fit the base and the spawn ring.
    #[error("grid half extent {half_extent} is below the minimum of {minimum}")]
    GridTooSmall {
        /// Configured half extent.
        half_extent: i32,
        /// Smallest accepted half extent.
        minimum: i32,
    },
    /// No waves were configured.
    #[error("wave table is empty")]
    EmptyWaveTable,
    /// A wave row asks for more enemies than a night can hold.
    #[error("wave {wave} spawns {count} of one kind, above the limit of {maximum}")]
    WaveTooLarge {
        /// One-based wave number.
        wave: usize,
        /// Configured count.
        count: u32,
        /// Largest accepted count.
        maximum: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearthguard_core::{BossFlag, EnemyKind};

    #[test]
    fn empty_document_yields_defaults() {
        let config = SimulationConfig::from_toml_str("").expect("defaults are valid");
        assert_eq!(config, SimulationConfig::default());
        assert_eq!(config.waves.len(), 10);
    }

    #[test]
    fn waves_can_be_overridden() {
        let config = SimulationConfig::from_toml_str(
            r#"
            seed = 7
            final_wave = 1

            [[waves]]
            delay_secs = 0.5
            boss = "raven"
            counts = [{ kind = "wolf", count = 2 }, { kind = "crow", count = 1 }]
            "#,
        )
        .expect("valid config");

        assert_eq!(config.seed, 7);
        assert_eq!(config.waves.len(), 1);
        assert_eq!(config.waves[0].boss, BossFlag::Raven);
        assert_eq!(config.waves[0].counts[1].kind, EnemyKind::Crow);
    }

    #[test]
    fn validation_rejects_unusable_values() {
        let zero_day = SimulationConfig::from_toml_str("day_duration_secs = 0.0");
        assert!(matches!(
            zero_day,
            Err(ConfigError::NonPositive {
                field: "day_duration_secs"
            })
        ));

        let no_waves = SimulationConfig {
            waves: Vec::new(),
            ..SimulationConfig::default()
        };
        assert!(matches!(no_waves.validate(), Err(ConfigError::EmptyWaveTable)));

        let unknown = SimulationConfig::from_toml_str("speed = 3");
        assert!(matches!(unknown, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn oversized_wave_rows_are_rejected() {
        let flood = SimulationConfig::from_toml_str(
            r#"
            [[waves]]
            delay_secs = 1.0
            counts = [{ kind = "wolf", count = 3 }, { kind = "boar", count = 4000000000 }]
            "#,
        );
        assert!(matches!(
            flood,
            Err(ConfigError::WaveTooLarge {
                wave: 1,
                count: 4_000_000_000,
                maximum: MAX_WAVE_ENTRY_COUNT,
            })
        ));
    }

    #[test]
    fn tick_cap_is_whole_microseconds() {
        let config = SimulationConfig {
            max_tick_secs: 0.05,
            ..SimulationConfig::default()
        };
        assert_eq!(config.max_tick(), Duration::from_millis(50));
    }
}
