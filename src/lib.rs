// lib.rs - Road Hopper: cross the road, don't get flattened.
// Each module is a Bevy plugin; main.rs just stacks them.

pub mod animation;
pub mod audio;
pub mod collision;
pub mod config;
pub mod effects;
pub mod game;
pub mod hud;
pub mod input;
pub mod obstacle;
pub mod player;
pub mod spawner;

use bevy::{app::PluginGroupBuilder, prelude::*};

/// Every game plugin, in the order they depend on each other.
pub struct RoadHopperPlugins;

impl PluginGroup for RoadHopperPlugins {
    fn build(self) -> PluginGroupBuilder {
        PluginGroupBuilder::start::<Self>()
            .add(config::ConfigPlugin)
            .add(animation::AnimationPlugin)
            .add(player::PlayerPlugin)
            .add(obstacle::ObstaclePlugin)
            .add(spawner::SpawnerPlugin)
            .add(effects::EffectsPlugin)
            .add(game::GamePlugin)
            .add(hud::HudPlugin)
            .add(audio::AudioPlugin)
    }
}
