use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub struct ConfigPlugin;

impl Plugin for ConfigPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(PreStartup, load_game_config);
    }
}

/// Tuning file read from the working directory at startup.
pub const CONFIG_PATH: &str = "road_hopper.ron";

/// Everything the game can be tuned with.
///
/// Every section is `#[serde(default)]`, so a file that only overrides
/// `obstacles.spawn_interval` is valid and keeps the rest of the defaults.
#[derive(Resource, Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct GameConfig {
    pub player: PlayerConfig,
    pub obstacles: ObstacleConfig,
    pub animation: AnimationConfig,
    pub game: RulesConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PlayerConfig {
    /// Pixels per second at full input deflection.
    pub speed: f32,
    pub start: [f32; 2],
    pub size: [f32; 2],
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            speed: 150.0,
            start: [0.0, -260.0],
            size: [24.0, 24.0],
        }
    }
}

/// A rectangle in world space, given by its centre and full size.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ZoneConfig {
    pub center: [f32; 2],
    pub size: [f32; 2],
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ObstacleConfig {
    pub speed: f32,
    /// Seconds between spawns at the start of a run.
    pub spawn_interval: f32,
    /// Difficulty scaling never pushes the interval below this.
    pub min_spawn_interval: f32,
    /// Seconds of play between two difficulty bumps.
    pub difficulty_step: f32,
    /// Multiplier applied to the spawn interval on each bump.
    pub difficulty_factor: f32,
    /// Markers left of this x drive right, the rest drive left.
    pub direction_threshold_x: f32,
    pub markers: Vec<[f32; 2]>,
    pub kill_zones: Vec<ZoneConfig>,
    pub size: [f32; 2],
}

impl Default for ObstacleConfig {
    fn default() -> Self {
        let lanes = [-180.0, -120.0, -60.0, 0.0, 60.0, 120.0, 180.0];
        let markers = lanes
            .iter()
            .enumerate()
            .map(|(i, &y)| if i % 2 == 0 { [-460.0, y] } else { [460.0, y] })
            .collect();

        Self {
            speed: 160.0,
            spawn_interval: 1.0,
            min_spawn_interval: 0.35,
            difficulty_step: 10.0,
            difficulty_factor: 0.9,
            direction_threshold_x: -200.0,
            markers,
            kill_zones: vec![
                ZoneConfig {
                    center: [-560.0, 0.0],
                    size: [80.0, 800.0],
                },
                ZoneConfig {
                    center: [560.0, 0.0],
                    size: [80.0, 800.0],
                },
            ],
            size: [48.0, 28.0],
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AnimationConfig {
    /// Seconds of continuous idling before the idle pose is shown.
    pub idle_delay: f32,
    /// Seconds per frame of the walk clips.
    pub frame_duration: f32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            idle_delay: 0.2,
            frame_duration: 0.1,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct RulesConfig {
    /// Half width and half height of the area the player can walk in.
    pub playfield_half_extents: [f32; 2],
    /// Seconds survived per point.
    pub score_tick: f32,
    /// Seconds between the player dying and the restart prompt.
    pub death_prompt_delay: f32,
    pub death_particles: u32,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            playfield_half_extents: [380.0, 280.0],
            score_tick: 1.0,
            death_prompt_delay: 1.5,
            death_particles: 16,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: ron::error::SpannedError,
    },

    #[error("obstacles.markers is empty, the spawner has nowhere to put cars")]
    NoSpawnMarkers,

    #[error("obstacles.kill_zones is empty, cars would never be removed")]
    NoKillZones,

    #[error("{field} must be a positive number, got {value}")]
    NotPositive { field: &'static str, value: f32 },
}

impl GameConfig {
    /// Reads and validates the config at `path`.
    ///
    /// Returns `Ok(None)` when the file does not exist so the caller can fall
    /// back to defaults. A file that exists but is broken is an error.
    pub fn load(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        let config = Self::parse(&contents).map_err(|err| match err {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.display().to_string(),
                source,
            },
            other => other,
        })?;

        Ok(Some(config))
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let config = ron::from_str::<GameConfig>(contents).map_err(|source| ConfigError::Parse {
            path: String::from("<inline>"),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("player.speed", self.player.speed),
            ("player.size.x", self.player.size[0]),
            ("player.size.y", self.player.size[1]),
            ("obstacles.speed", self.obstacles.speed),
            ("obstacles.spawn_interval", self.obstacles.spawn_interval),
            ("obstacles.min_spawn_interval", self.obstacles.min_spawn_interval),
            ("obstacles.difficulty_step", self.obstacles.difficulty_step),
            ("obstacles.difficulty_factor", self.obstacles.difficulty_factor),
            ("obstacles.size.x", self.obstacles.size[0]),
            ("obstacles.size.y", self.obstacles.size[1]),
            ("animation.idle_delay", self.animation.idle_delay),
            ("animation.frame_duration", self.animation.frame_duration),
            ("game.score_tick", self.game.score_tick),
            ("game.death_prompt_delay", self.game.death_prompt_delay),
            ("game.playfield_half_extents.x", self.game.playfield_half_extents[0]),
            ("game.playfield_half_extents.y", self.game.playfield_half_extents[1]),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NotPositive { field, value });
            }
        }

        if self.obstacles.markers.is_empty() {
            return Err(ConfigError::NoSpawnMarkers);
        }
        if self.obstacles.kill_zones.is_empty() {
            return Err(ConfigError::NoKillZones);
        }
        Ok(())
    }

    pub fn spawn_markers(&self) -> Vec<Vec2> {
        self.obstacles.markers.iter().map(|&m| Vec2::from(m)).collect()
    }
}

/// Loads the tuning file before anything else starts.
///
/// A broken file stops the app here with the error message instead of
/// letting some later system trip over a half-valid config.
fn load_game_config(mut commands: Commands) -> Result {
    let path = Path::new(CONFIG_PATH);
    let config = match GameConfig::load(path)? {
        Some(config) => {
            info!("Loaded game config from {:?}", path);
            config
        }
        None => {
            info!("No config found at {:?}. Using defaults.", path);
            GameConfig::default()
        }
    };

    commands.insert_resource(config);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        GameConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = GameConfig::parse("(obstacles: (spawn_interval: 0.5))").unwrap();

        assert_eq!(config.obstacles.spawn_interval, 0.5);
        assert_eq!(config.obstacles.speed, 160.0);
        assert_eq!(config.player, PlayerConfig::default());
    }

    #[test]
    fn empty_markers_are_rejected() {
        let err = GameConfig::parse("(obstacles: (markers: []))").unwrap_err();
        assert!(matches!(err, ConfigError::NoSpawnMarkers));
    }

    #[test]
    fn empty_kill_zones_are_rejected() {
        let err = GameConfig::parse("(obstacles: (kill_zones: []))").unwrap_err();
        assert!(matches!(err, ConfigError::NoKillZones));
    }

    #[test]
    fn non_positive_interval_names_the_field() {
        let err = GameConfig::parse("(obstacles: (spawn_interval: 0.0))").unwrap_err();
        match err {
            ConfigError::NotPositive { field, .. } => assert_eq!(field, "obstacles.spawn_interval"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let err = GameConfig::parse("not ron at all {").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let loaded = GameConfig::load(Path::new("definitely/not/here.ron")).unwrap();
        assert!(loaded.is_none());
    }
}
