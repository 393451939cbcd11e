use std::time::Duration;

use bevy::prelude::*;

use crate::{
    animation::SpriteSheets,
    collision::Playfield,
    config::GameConfig,
    effects::Particle,
    obstacle::Obstacle,
    player::{spawn_player, Player, PlayerHit},
    spawner::ObstacleSpawner,
};

pub struct GamePlugin;

impl Plugin for GamePlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<GameState>()
            .init_resource::<Score>()
            .init_resource::<HighScore>()
            .add_systems(Startup, setup_run_system)
            .add_systems(
                Update,
                run_timers_system.run_if(in_state(GameState::Playing)),
            )
            .add_systems(
                Update,
                (
                    prompt_delay_system.run_if(resource_exists::<PromptDelay>),
                    restart_system.run_if(resource_exists::<RestartReady>),
                )
                    .chain()
                    .run_if(in_state(GameState::GameOver)),
            )
            .add_observer(on_player_hit);
    }
}

#[derive(States, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum GameState {
    #[default]
    Playing,
    GameOver,
}

/// Points for the current run, one per score tick survived.
#[derive(Resource, Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score(pub u32);

/// Best score since the app started. Lives only in memory.
#[derive(Resource, Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighScore {
    best: u32,
}

impl HighScore {
    /// Keeps `score` if it beats the best. Returns true when it did.
    pub fn record(&mut self, score: u32) -> bool {
        if score > self.best {
            self.best = score;
            return true;
        }
        false
    }

    pub fn best(&self) -> u32 {
        self.best
    }

    pub fn reset(&mut self) {
        self.best = 0;
    }
}

/// Timers that only run while the frog is alive.
#[derive(Resource, Debug)]
pub struct RunTimers {
    score: Timer,
    difficulty: Timer,
}

impl RunTimers {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            score: Timer::from_seconds(config.game.score_tick, TimerMode::Repeating),
            difficulty: Timer::from_seconds(config.obstacles.difficulty_step, TimerMode::Repeating),
        }
    }

    /// Returns the points earned and the number of difficulty bumps due.
    pub fn tick(&mut self, delta: Duration) -> (u32, u32) {
        self.score.tick(delta);
        self.difficulty.tick(delta);
        (
            self.score.times_finished_this_tick(),
            self.difficulty.times_finished_this_tick(),
        )
    }
}

/// The spawn interval after one difficulty bump.
pub fn next_spawn_interval(current: f32, factor: f32, min: f32) -> f32 {
    (current * factor).max(min)
}

/// Counts down from the player's death to the restart prompt.
#[derive(Resource)]
pub struct PromptDelay(pub Timer);

/// Present once the restart prompt is up.
#[derive(Resource)]
pub struct RestartReady;

fn setup_run_system(mut commands: Commands, config: Res<GameConfig>, sheets: Res<SpriteSheets>) {
    commands.spawn(Camera2d);
    commands.insert_resource(Playfield {
        half_extents: Vec2::from(config.game.playfield_half_extents),
    });
    commands.insert_resource(RunTimers::new(&config));
    spawn_player(&mut commands, &config, &sheets);
}

fn run_timers_system(
    mut timers: ResMut<RunTimers>,
    mut score: ResMut<Score>,
    mut spawner: ResMut<ObstacleSpawner>,
    config: Res<GameConfig>,
    time: Res<Time>,
) {
    let (points, bumps) = timers.tick(time.delta());
    if points > 0 {
        score.0 += points;
    }

    for _ in 0..bumps {
        let interval = next_spawn_interval(
            spawner.interval(),
            config.obstacles.difficulty_factor,
            config.obstacles.min_spawn_interval,
        );
        if spawner.set_spawn_rate(interval) {
            info!("Spawn interval now {:.2}s", interval);
        }
    }
}

fn on_player_hit(
    trigger: On<PlayerHit>,
    score: Res<Score>,
    mut high_score: ResMut<HighScore>,
    mut next_state: ResMut<NextState<GameState>>,
    config: Res<GameConfig>,
    mut commands: Commands,
) {
    info!("Player {:?} died with score {}", trigger.player, score.0);
    if high_score.record(score.0) {
        info!("New high score: {}", high_score.best());
    }

    next_state.set(GameState::GameOver);
    commands.insert_resource(PromptDelay(Timer::from_seconds(
        config.game.death_prompt_delay,
        TimerMode::Once,
    )));
}

fn prompt_delay_system(mut commands: Commands, mut delay: ResMut<PromptDelay>, time: Res<Time>) {
    delay.0.tick(time.delta());
    if delay.0.just_finished() {
        commands.remove_resource::<PromptDelay>();
        commands.insert_resource(RestartReady);
    }
}

/// Clears the road and starts a fresh run when R is pressed.
/// Shift+R also forgets the best score.
#[allow(clippy::too_many_arguments)]
fn restart_system(
    mut commands: Commands,
    keys: Res<ButtonInput<KeyCode>>,
    leftovers: Query<Entity, Or<(With<Obstacle>, With<Particle>, With<Player>)>>,
    mut score: ResMut<Score>,
    mut high_score: ResMut<HighScore>,
    mut spawner: ResMut<ObstacleSpawner>,
    mut next_state: ResMut<NextState<GameState>>,
    config: Res<GameConfig>,
    sheets: Res<SpriteSheets>,
) {
    if !keys.just_pressed(KeyCode::KeyR) {
        return;
    }

    for entity in &leftovers {
        commands.entity(entity).despawn();
    }

    *score = Score::default();
    if keys.any_pressed([KeyCode::ShiftLeft, KeyCode::ShiftRight]) {
        info!("Clearing best score {}", high_score.best());
        high_score.reset();
    }
    spawner.reset(config.obstacles.spawn_interval);
    commands.insert_resource(RunTimers::new(&config));
    commands.remove_resource::<RestartReady>();
    spawn_player(&mut commands, &config, &sheets);

    info!("Restarting");
    next_state.set(GameState::Playing);
}

#[cfg(test)]
mod tests {
    use bevy::ecs::system::RunSystemOnce;

    use super::*;

    #[test]
    fn high_score_keeps_the_best() {
        let mut high_score = HighScore::default();
        assert!(high_score.record(12));
        assert!(!high_score.record(7));
        assert!(!high_score.record(12));
        assert_eq!(high_score.best(), 12);

        high_score.reset();
        assert_eq!(high_score.best(), 0);
    }

    #[test]
    fn difficulty_has_a_floor() {
        assert!((next_spawn_interval(1.0, 0.9, 0.35) - 0.9).abs() < 1e-6);
        assert_eq!(next_spawn_interval(0.36, 0.9, 0.35), 0.35);
    }

    #[test]
    fn run_timers_count_points_and_bumps() {
        let mut timers = RunTimers::new(&GameConfig::default());

        let mut points = 0;
        let mut bumps = 0;
        for _ in 0..21 {
            let (p, b) = timers.tick(Duration::from_millis(500));
            points += p;
            bumps += b;
        }

        // 10.5 seconds with one point a second and a bump every 10
        assert_eq!(points, 10);
        assert_eq!(bumps, 1);
    }

    fn game_over_world(keys: &[KeyCode]) -> World {
        let mut world = World::new();
        let config = GameConfig::default();
        world.insert_resource(ObstacleSpawner::new(&config, Entity::PLACEHOLDER));
        world.insert_resource(config);
        world.insert_resource(SpriteSheets {
            frog: Handle::default(),
            frog_layout: Handle::default(),
        });
        world.insert_resource(Score(9));
        world.insert_resource(HighScore { best: 9 });
        world.insert_resource(RestartReady);
        world.init_resource::<NextState<GameState>>();

        let mut input = ButtonInput::<KeyCode>::default();
        for key in keys {
            input.press(*key);
        }
        world.insert_resource(input);
        world
    }

    #[test]
    fn restart_keeps_the_best_score() {
        let mut world = game_over_world(&[KeyCode::KeyR]);
        let old_player = world.spawn(Player).id();

        world.run_system_once(restart_system).unwrap();

        assert_eq!(*world.resource::<Score>(), Score(0));
        assert_eq!(world.resource::<HighScore>().best(), 9);
        assert!(!world.contains_resource::<RestartReady>());
        assert!(world.contains_resource::<RunTimers>());
        assert!(world.get_entity(old_player).is_err());
        let mut players = world.query_filtered::<Entity, With<Player>>();
        assert_eq!(players.iter(&world).count(), 1);
    }

    #[test]
    fn shift_restart_clears_the_best_score() {
        let mut world = game_over_world(&[KeyCode::ShiftLeft, KeyCode::KeyR]);

        world.run_system_once(restart_system).unwrap();

        assert_eq!(world.resource::<HighScore>().best(), 0);
    }

    #[test]
    fn restart_waits_for_r() {
        let mut world = game_over_world(&[KeyCode::ShiftLeft]);

        world.run_system_once(restart_system).unwrap();

        assert_eq!(world.resource::<HighScore>().best(), 9);
        assert!(world.contains_resource::<RestartReady>());
    }

    #[test]
    fn death_records_score_and_arms_the_prompt() {
        let mut world = World::new();
        world.insert_resource(GameConfig::default());
        world.insert_resource(Score(17));
        world.insert_resource(HighScore { best: 3 });
        world.init_resource::<NextState<GameState>>();
        world.add_observer(on_player_hit);

        world.trigger(PlayerHit {
            player: Entity::PLACEHOLDER,
        });
        world.flush();

        assert_eq!(world.resource::<HighScore>().best(), 17);
        assert!(world.contains_resource::<PromptDelay>());
    }
}
