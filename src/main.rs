// main.rs - Entry point. A Frogger-style road crossing:
// the frog walks, cars spawn on a timer, one touch and it's game over.

use bevy::prelude::*;
use road_hopper::{obstacle::ObstacleStep, player::PlayerStep, RoadHopperPlugins};

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Road Hopper".to_string(),
                ..default()
            }),
            ..default()
        }))
        .insert_resource(ClearColor(Color::srgb(0.12, 0.12, 0.14)))
        // Physics steps at 60 Hz regardless of the render rate
        .insert_resource(Time::<Fixed>::from_hz(60.0))
        .add_plugins(RoadHopperPlugins)
        // The frog moves before the cars in each step
        .configure_sets(FixedUpdate, PlayerStep.before(ObstacleStep))
        .run();
}
