use bevy::prelude::*;

use crate::game::{HighScore, RestartReady, Score};

pub struct HudPlugin;

impl Plugin for HudPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_hud)
            .add_systems(Update, (score_text_system, restart_prompt_system));
    }
}

#[derive(Component)]
struct ScoreText;

#[derive(Component)]
struct HighScoreText;

#[derive(Component)]
struct RestartPromptText;

fn spawn_hud(mut commands: Commands) {
    commands
        .spawn(Node {
            width: Val::Percent(100.0),
            height: Val::Percent(100.0),
            flex_direction: FlexDirection::Column,
            justify_content: JustifyContent::SpaceBetween,
            padding: UiRect::all(Val::Px(12.0)),
            ..default()
        })
        .with_children(|parent| {
            parent
                .spawn(Node {
                    width: Val::Percent(100.0),
                    justify_content: JustifyContent::SpaceBetween,
                    ..default()
                })
                .with_children(|row| {
                    row.spawn((
                        ScoreText,
                        Text::new("Score: 0"),
                        TextFont {
                            font_size: 24.0,
                            ..default()
                        },
                        TextColor(Color::WHITE),
                    ));
                    row.spawn((
                        HighScoreText,
                        Text::new("Best: 0"),
                        TextFont {
                            font_size: 24.0,
                            ..default()
                        },
                        TextColor(Color::srgb(0.8, 0.8, 0.8)),
                    ));
                });

            parent.spawn((
                RestartPromptText,
                Text::new("SPLAT! Press R to try again\nShift+R also clears the best score"),
                TextFont {
                    font_size: 40.0,
                    ..default()
                },
                TextColor(Color::WHITE),
                TextLayout::new_with_justify(Justify::Center),
                Node {
                    align_self: AlignSelf::Center,
                    margin: UiRect::bottom(Val::Percent(40.0)),
                    ..default()
                },
                Visibility::Hidden,
            ));
        });
}

fn score_text_system(
    score: Res<Score>,
    high_score: Res<HighScore>,
    mut score_text: Query<&mut Text, (With<ScoreText>, Without<HighScoreText>)>,
    mut high_score_text: Query<&mut Text, (With<HighScoreText>, Without<ScoreText>)>,
) {
    if score.is_changed() {
        for mut text in score_text.iter_mut() {
            text.0 = format!("Score: {}", score.0);
        }
    }
    if high_score.is_changed() {
        for mut text in high_score_text.iter_mut() {
            text.0 = format!("Best: {}", high_score.best());
        }
    }
}

fn restart_prompt_system(
    ready: Option<Res<RestartReady>>,
    mut prompt: Query<&mut Visibility, With<RestartPromptText>>,
) {
    let wanted = if ready.is_some() {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    };
    for mut visibility in prompt.iter_mut() {
        visibility.set_if_neq(wanted);
    }
}
