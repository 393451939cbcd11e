use bevy::prelude::*;

use crate::{
    animation::{AnimationCoordinator, FrogClip, SpriteSheets},
    collision::{Collider, Playfield},
    config::GameConfig,
    input::{refresh_intent_system, sample_keyboard_system, InputAxis, PlayerInput},
    obstacle::{Obstacle, ObstacleStep},
};

pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        // Intent first, then motion. Contact is checked once the cars have
        // moved too, so both sides are at their end-of-step positions.
        app.add_systems(
            FixedUpdate,
            (
                sample_keyboard_system,
                refresh_intent_system,
                apply_velocity_system,
            )
                .chain()
                .in_set(PlayerStep),
        )
        .add_systems(
            FixedUpdate,
            obstacle_contact_system
                .after(PlayerStep)
                .after(ObstacleStep),
        );
    }
}

/// The player's half of each physics step.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlayerStep;

#[derive(Component)]
pub struct Player;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum MoveState {
    #[default]
    Idle,
    Walk,
    Dead,
}

/// What the player wants to do this step, before it is committed.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MoveIntent {
    /// Screen space, pixels per second.
    pub velocity: Vec2,
    /// Screen space. `Vec2::ZERO` keeps the current facing.
    pub facing: Vec2,
    pub state: MoveState,
}

/// Canonical movement state of the player.
///
/// The fields are private: everything goes through [`set_move_intent`], so
/// "dead stays dead" and "facing is never zero" are enforced in one place.
///
/// [`set_move_intent`]: PlayerController::set_move_intent
#[derive(Component, Debug, Clone)]
pub struct PlayerController {
    facing: Vec2,
    velocity: Vec2,
    state: MoveState,
}

impl Default for PlayerController {
    fn default() -> Self {
        Self {
            // Screen space, so this faces down
            facing: Vec2::Y,
            velocity: Vec2::ZERO,
            state: MoveState::Idle,
        }
    }
}

impl PlayerController {
    /// The single write gate. Returns false when the write was refused.
    pub fn set_move_intent(&mut self, intent: MoveIntent) -> bool {
        if self.state == MoveState::Dead {
            return false;
        }

        self.velocity = intent.velocity;
        if intent.facing != Vec2::ZERO {
            self.facing = intent.facing;
        }
        self.state = intent.state;
        true
    }

    /// Kills the player. Returns true only for the call that did it.
    pub fn hit(&mut self) -> bool {
        self.set_move_intent(MoveIntent {
            velocity: Vec2::ZERO,
            facing: Vec2::ZERO,
            state: MoveState::Dead,
        })
    }

    pub fn state(&self) -> MoveState {
        self.state
    }

    pub fn facing(&self) -> Vec2 {
        self.facing
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn is_dead(&self) -> bool {
        self.state == MoveState::Dead
    }
}

/// Screen-space vectors (y down) to Bevy world space (y up).
pub fn screen_to_world(v: Vec2) -> Vec2 {
    Vec2::new(v.x, -v.y)
}

/// Raised once when an obstacle runs the player over.
#[derive(Event, Debug, Clone, Copy)]
pub struct PlayerHit {
    pub player: Entity,
}

pub fn spawn_player(commands: &mut Commands, config: &GameConfig, sheets: &SpriteSheets) -> Entity {
    let start = Vec2::from(config.player.start);
    let size = Vec2::from(config.player.size);

    commands
        .spawn((
            Player,
            PlayerController::default(),
            PlayerInput {
                speed: config.player.speed,
            },
            InputAxis::default(),
            AnimationCoordinator::new(config.animation.idle_delay),
            FrogClip::IDLE_DOWN,
            sheets.frog_sprite(size),
            Collider::from_size(size),
            Transform::from_translation(start.extend(1.0)),
        ))
        .id()
}

fn apply_velocity_system(
    mut query: Query<(&PlayerController, &Collider, &mut Transform)>,
    playfield: Res<Playfield>,
    time: Res<Time>,
) {
    let delta = time.delta_secs();
    for (controller, collider, mut transform) in query.iter_mut() {
        if controller.is_dead() {
            continue;
        }

        let moved =
            transform.translation.truncate() + screen_to_world(controller.velocity()) * delta;
        let resolved = playfield.clamp(moved, collider.half_extents);
        transform.translation.x = resolved.x;
        transform.translation.y = resolved.y;
    }
}

fn obstacle_contact_system(
    mut players: Query<(Entity, &mut PlayerController, &Collider, &Transform), With<Player>>,
    // Cars live under the road container, which sits at the world origin,
    // so their local transform is their world position.
    obstacles: Query<(&Collider, &Transform), (With<Obstacle>, Without<Player>)>,
    mut commands: Commands,
) {
    for (entity, mut controller, collider, transform) in players.iter_mut() {
        if controller.is_dead() {
            continue;
        }

        let position = transform.translation.truncate();
        let run_over = obstacles.iter().any(|(car, car_transform)| {
            collider.overlaps(position, car, car_transform.translation.truncate())
        });

        if run_over && controller.hit() {
            info!("Player {:?} was hit", entity);
            commands.trigger(PlayerHit { player: entity });
        }
    }
}
