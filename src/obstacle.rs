use bevy::prelude::*;

use crate::collision::{Collider, KillZone};

pub struct ObstaclePlugin;

impl Plugin for ObstaclePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            (move_obstacles_system, kill_zone_system)
                .chain()
                .in_set(ObstacleStep),
        )
        .add_systems(Update, paint_obstacles_system);
    }
}

/// The cars' half of each physics step.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObstacleStep;

/// Cosmetic paint job, picked at random by the spawner.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum CarColor {
    #[default]
    Red,
    Blue,
    Yellow,
    Green,
}

impl CarColor {
    pub const ALL: [CarColor; 4] = [
        CarColor::Red,
        CarColor::Blue,
        CarColor::Yellow,
        CarColor::Green,
    ];

    pub fn color(self) -> Color {
        match self {
            CarColor::Red => Color::srgb(0.85, 0.2, 0.2),
            CarColor::Blue => Color::srgb(0.2, 0.4, 0.9),
            CarColor::Yellow => Color::srgb(0.95, 0.8, 0.2),
            CarColor::Green => Color::srgb(0.3, 0.75, 0.35),
        }
    }
}

/// A car driving across the road at constant velocity.
///
/// Freshly attached cars are parked until [`configure`] is called.
///
/// [`configure`]: Obstacle::configure
#[derive(Component, Debug, Clone, Default)]
#[require(Transform)]
pub struct Obstacle {
    direction: Vec2,
    speed: f32,
    color: CarColor,
}

/// The painted body sprite, a child of the [`Obstacle`] entity.
#[derive(Component)]
pub struct CarBody;

impl Obstacle {
    /// Sets speed, heading and paint. Call after the car is attached to the
    /// road: the paint goes onto the body child, which only exists from then.
    pub fn configure(&mut self, speed: f32, direction: Vec2, color: CarColor) {
        self.speed = speed;
        self.direction = direction.normalize_or_zero();
        self.color = color;
    }

    pub fn direction(&self) -> Vec2 {
        self.direction
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn color(&self) -> CarColor {
        self.color
    }

    pub fn velocity(&self) -> Vec2 {
        self.direction * self.speed
    }

    /// Displacement over one physics step of `delta` seconds.
    pub fn step(&self, delta: f32) -> Vec2 {
        self.velocity() * delta
    }
}

/// Raised once when a car drives into a kill zone and removes itself.
#[derive(Event, Debug, Clone, Copy)]
pub struct ObstacleDespawned {
    pub obstacle: Entity,
}

fn move_obstacles_system(mut query: Query<(&Obstacle, &mut Transform)>, time: Res<Time>) {
    let delta = time.delta_secs();
    for (obstacle, mut transform) in query.iter_mut() {
        let step = obstacle.step(delta);
        transform.translation.x += step.x;
        transform.translation.y += step.y;
    }
}

fn kill_zone_system(
    obstacles: Query<(Entity, &Collider, &Transform), With<Obstacle>>,
    zones: Query<(&Collider, &Transform), (With<KillZone>, Without<Obstacle>)>,
    mut commands: Commands,
) {
    for (entity, collider, transform) in obstacles.iter() {
        let position = transform.translation.truncate();
        let in_zone = zones.iter().any(|(zone, zone_transform)| {
            collider.overlaps(position, zone, zone_transform.translation.truncate())
        });

        if in_zone {
            debug!("Obstacle {:?} reached a kill zone", entity);
            commands.entity(entity).despawn();
            commands.trigger(ObstacleDespawned { obstacle: entity });
        }
    }
}

/// Copies each car's paint onto its body sprite whenever the car changes.
fn paint_obstacles_system(
    obstacles: Query<(&Obstacle, &Children), Changed<Obstacle>>,
    mut bodies: Query<&mut Sprite, With<CarBody>>,
) {
    for (obstacle, children) in obstacles.iter() {
        for child in children.iter() {
            if let Ok(mut sprite) = bodies.get_mut(child) {
                sprite.color = obstacle.color().color();
            }
        }
    }
}
