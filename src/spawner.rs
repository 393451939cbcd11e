use std::time::Duration;

use bevy::prelude::*;
use rand::{seq::SliceRandom, Rng};

use crate::{
    collision::{Collider, KillZone},
    config::GameConfig,
    game::GameState,
    obstacle::{CarBody, CarColor, Obstacle, ObstacleDespawned},
};

pub struct SpawnerPlugin;

impl Plugin for SpawnerPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_road_system)
            .add_systems(
                Update,
                spawn_obstacles_system
                    .run_if(resource_exists::<ObstacleSpawner>)
                    .run_if(in_state(GameState::Playing)),
            )
            .add_observer(on_obstacle_despawned);
    }
}

/// Parent of every car. Sits at the world origin.
#[derive(Component)]
pub struct RoadLayer;

/// Raised right after a car has been attached and configured.
#[derive(Event, Debug, Clone, Copy)]
pub struct ObstacleSpawned {
    pub obstacle: Entity,
    pub position: Vec2,
}

/// Where, which way and what colour the next car will be.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SpawnPlan {
    pub position: Vec2,
    pub direction: Vec2,
    pub color: CarColor,
}

/// Shortest spawn period accepted, in seconds.
pub const MIN_SPAWN_INTERVAL: f32 = 0.01;

/// Markers left of `threshold_x` drive right, everything else drives left.
pub fn direction_for_marker(x: f32, threshold_x: f32) -> Vec2 {
    if x < threshold_x {
        Vec2::X
    } else {
        Vec2::NEG_X
    }
}

/// Puts a new car on the road every interval.
///
/// Built once the road container exists, so it never has to go looking for
/// it. Keeps no handle to the cars it makes, only a count.
#[derive(Resource, Debug)]
pub struct ObstacleSpawner {
    timer: Timer,
    markers: Vec<Vec2>,
    direction_threshold_x: f32,
    speed: f32,
    obstacle_size: Vec2,
    container: Entity,
    active: usize,
}

impl ObstacleSpawner {
    pub fn new(config: &GameConfig, container: Entity) -> Self {
        Self {
            timer: Timer::from_seconds(config.obstacles.spawn_interval, TimerMode::Repeating),
            markers: config.spawn_markers(),
            direction_threshold_x: config.obstacles.direction_threshold_x,
            speed: config.obstacles.speed,
            obstacle_size: Vec2::from(config.obstacles.size),
            container,
            active: 0,
        }
    }

    /// Changes the spawn period right away, keeping the time already elapsed.
    ///
    /// If more than the new period has already elapsed, exactly one car is
    /// due, not one per period that would have fit. Returns false (and
    /// changes nothing) for intervals that are not finite or shorter than
    /// [`MIN_SPAWN_INTERVAL`].
    pub fn set_spawn_rate(&mut self, interval: f32) -> bool {
        if !(interval.is_finite() && interval >= MIN_SPAWN_INTERVAL) {
            warn!("Ignoring spawn interval {}", interval);
            return false;
        }

        let duration = Duration::from_secs_f32(interval);
        self.timer.set_duration(duration);
        if self.timer.elapsed() > duration {
            self.timer.set_elapsed(duration);
        }
        true
    }

    pub fn interval(&self) -> f32 {
        self.timer.duration().as_secs_f32()
    }

    /// Advances the timer, returning how many cars are due.
    pub fn tick(&mut self, delta: Duration) -> u32 {
        self.timer.tick(delta);
        self.timer.times_finished_this_tick()
    }

    pub fn plan(&self, rng: &mut impl Rng) -> Option<SpawnPlan> {
        let position = *self.markers.choose(rng)?;
        let color = *CarColor::ALL.choose(rng)?;

        Some(SpawnPlan {
            position,
            direction: direction_for_marker(position.x, self.direction_threshold_x),
            color,
        })
    }

    pub fn active_count(&self) -> usize {
        self.active
    }

    pub fn container(&self) -> Entity {
        self.container
    }

    /// Back to a fresh run: new interval, empty road, timer from zero.
    pub fn reset(&mut self, interval: f32) {
        self.set_spawn_rate(interval);
        self.timer.reset();
        self.active = 0;
    }
}

/// Attaches a car to the road, then configures it.
pub fn spawn_obstacle(commands: &mut Commands, spawner: &ObstacleSpawner, plan: SpawnPlan) -> Entity {
    let size = spawner.obstacle_size;

    let car = commands
        .spawn((
            Obstacle::default(),
            Collider::from_size(size),
            Transform::from_translation(plan.position.extend(0.0)),
            Visibility::default(),
            ChildOf(spawner.container()),
        ))
        .with_children(|parent| {
            parent.spawn((CarBody, Sprite::from_color(Color::WHITE, size)));
        })
        .id();

    // Only now that the body child exists is there something to paint
    let mut obstacle = Obstacle::default();
    obstacle.configure(spawner.speed, plan.direction, plan.color);
    commands.entity(car).insert(obstacle);

    car
}

fn setup_road_system(mut commands: Commands, config: Res<GameConfig>) {
    let container = commands
        .spawn((RoadLayer, Transform::default(), Visibility::default()))
        .id();

    for zone in &config.obstacles.kill_zones {
        commands.spawn((
            KillZone,
            Collider::from_size(Vec2::from(zone.size)),
            Transform::from_xyz(zone.center[0], zone.center[1], 0.0),
        ));
    }

    commands.insert_resource(ObstacleSpawner::new(&config, container));
}

fn spawn_obstacles_system(
    mut commands: Commands,
    mut spawner: ResMut<ObstacleSpawner>,
    time: Res<Time>,
) {
    let due = spawner.tick(time.delta());
    if due == 0 {
        return;
    }

    let mut rng = rand::thread_rng();
    for _ in 0..due {
        let Some(plan) = spawner.plan(&mut rng) else {
            return;
        };

        let obstacle = spawn_obstacle(&mut commands, &spawner, plan);
        spawner.active += 1;
        debug!(
            "Spawned obstacle {:?} at {} heading {} ({} on the road)",
            obstacle,
            plan.position,
            plan.direction,
            spawner.active_count()
        );
        commands.trigger(ObstacleSpawned {
            obstacle,
            position: plan.position,
        });
    }
}

fn on_obstacle_despawned(_trigger: On<ObstacleDespawned>, mut spawner: ResMut<ObstacleSpawner>) {
    spawner.active = spawner.active.saturating_sub(1);
}
