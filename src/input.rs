use bevy::prelude::*;

use crate::player::{MoveIntent, MoveState, PlayerController};

/// Raw two-axis input in screen space (x right, y down), length at most 1.
///
/// Sampled from the keyboard at the start of every physics step, then turned
/// into intent. Anything else that wants to drive the frog writes here.
#[derive(Component, Default, Copy, Clone, Debug)]
pub struct InputAxis(pub Vec2);

/// Turns input into intent for the player it sits on.
#[derive(Component, Copy, Clone, Debug)]
pub struct PlayerInput {
    /// Pixels per second at full deflection.
    pub speed: f32,
}

impl PlayerInput {
    /// Builds the intent for one physics step.
    ///
    /// Zero input means Idle and keeps `previous_facing`; anything else is
    /// Walk facing along the input.
    pub fn intent(&self, axis: Vec2, previous_facing: Vec2) -> MoveIntent {
        if axis == Vec2::ZERO {
            return MoveIntent {
                velocity: Vec2::ZERO,
                facing: previous_facing,
                state: MoveState::Idle,
            };
        }

        MoveIntent {
            velocity: axis * self.speed,
            facing: axis.normalize_or_zero(),
            state: MoveState::Walk,
        }
    }
}

fn read_axis(keys: &ButtonInput<KeyCode>) -> Vec2 {
    let mut axis = Vec2::ZERO;
    if keys.any_pressed([KeyCode::ArrowLeft, KeyCode::KeyA]) {
        axis.x -= 1.0;
    }
    if keys.any_pressed([KeyCode::ArrowRight, KeyCode::KeyD]) {
        axis.x += 1.0;
    }
    if keys.any_pressed([KeyCode::ArrowUp, KeyCode::KeyW]) {
        axis.y -= 1.0;
    }
    if keys.any_pressed([KeyCode::ArrowDown, KeyCode::KeyS]) {
        axis.y += 1.0;
    }
    // Diagonals are no faster than straight lines
    axis.clamp_length_max(1.0)
}

pub fn sample_keyboard_system(keys: Res<ButtonInput<KeyCode>>, mut query: Query<&mut InputAxis>) {
    let axis = read_axis(&keys);
    for mut input in query.iter_mut() {
        input.0 = axis;
    }
}

/// First half of the player's physics step: push fresh intent through the
/// controller's gate. Dead players are skipped, the gate would refuse anyway.
pub fn refresh_intent_system(
    mut query: Query<(&PlayerInput, &InputAxis, &mut PlayerController)>,
) {
    for (input, axis, mut controller) in query.iter_mut() {
        if controller.is_dead() {
            continue;
        }
        let intent = input.intent(axis.0, controller.facing());
        controller.set_move_intent(intent);
    }
}
