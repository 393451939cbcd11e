use bevy::prelude::*;

use crate::player::PlayerHit;

pub struct AudioPlugin;

impl Plugin for AudioPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_audio)
            .add_observer(on_player_hit_sound);
    }
}

#[derive(Resource)]
pub struct GameAudio {
    /// Handle<T> is Bevy's way of referencing assets.
    pub squash: Handle<AudioSource>,
}

pub fn setup_audio(mut commands: Commands, asset_server: Res<AssetServer>) {
    // Loading happens in the background; the handle is usable right away.
    let squash = asset_server.load("audio/squash.wav");
    commands.insert_resource(GameAudio { squash });
}

fn on_player_hit_sound(_trigger: On<PlayerHit>, mut commands: Commands, audio: Res<GameAudio>) {
    commands.spawn((AudioPlayer::new(audio.squash.clone()), PlaybackSettings::DESPAWN));
}
