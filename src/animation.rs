use std::{f32::consts::FRAC_PI_2, time::Duration};

use bevy::prelude::*;

use crate::{
    config::GameConfig,
    effects::spawn_death_burst,
    player::{MoveState, PlayerController},
};

pub struct AnimationPlugin;

impl Plugin for AnimationPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(PreStartup, load_sprite_sheets).add_systems(
            Update,
            (
                coordinate_animation_system,
                switch_clip_system,
                animation_system,
            )
                .chain(),
        );
    }
}

/// Seconds of idling before the idle pose replaces the walk cycle.
pub const IDLE_DELAY: f32 = 0.2;

/// Frog sheet: 4 columns of 16x16 cells.
/// Rows 0-3 are the walk cycles (down, up, left, right), row 4 holds the
/// four idle poses in the same order, row 5 column 0 is the lying-down pose.
const SHEET_COLUMNS: u32 = 4;
const SHEET_ROWS: u32 = 6;
const CELL_SIZE: u32 = 16;

/// Which way the frog's sprite looks.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FacingDir {
    Down,
    Up,
    Left,
    Right,
}

impl FacingDir {
    /// Horizontal wins over vertical; no direction at all reads as down.
    /// `facing` is in screen space, so negative y is up.
    pub fn from_facing(facing: Vec2) -> Self {
        if facing.x > 0.0 {
            FacingDir::Right
        } else if facing.x < 0.0 {
            FacingDir::Left
        } else if facing.y < 0.0 {
            FacingDir::Up
        } else {
            FacingDir::Down
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FacingDir::Down => "down",
            FacingDir::Up => "up",
            FacingDir::Left => "left",
            FacingDir::Right => "right",
        }
    }

    fn row(self) -> usize {
        match self {
            FacingDir::Down => 0,
            FacingDir::Up => 1,
            FacingDir::Left => 2,
            FacingDir::Right => 3,
        }
    }
}

pub fn direction_name(facing: Vec2) -> &'static str {
    FacingDir::from_facing(facing).name()
}

#[derive(Component, Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[require(AnimationState, Sprite)]
pub enum FrogClip {
    Walk(FacingDir),
    Idle(FacingDir),
    Dead,
}

impl FrogClip {
    pub const IDLE_DOWN: FrogClip = FrogClip::Idle(FacingDir::Down);

    fn first_index(self) -> usize {
        let columns = SHEET_COLUMNS as usize;
        match self {
            FrogClip::Walk(dir) => dir.row() * columns,
            FrogClip::Idle(dir) => 4 * columns + dir.row(),
            FrogClip::Dead => 5 * columns,
        }
    }

    fn frames(self) -> usize {
        match self {
            FrogClip::Walk(_) => SHEET_COLUMNS as usize,
            FrogClip::Idle(_) | FrogClip::Dead => 1,
        }
    }

    fn looping(self) -> bool {
        matches!(self, FrogClip::Walk(_))
    }
}

/// Playback position within the current clip.
#[derive(Component, Default)]
pub struct AnimationState {
    pub frame_index: usize,
    frame_timer: Timer,
    total_frames: usize,
    looping: bool,
    /// Set once a one-shot clip reaches its last frame, or by [`stop`].
    ///
    /// [`stop`]: AnimationState::stop
    pub finished: bool,
}

impl AnimationState {
    pub fn new(frame_duration: f32, total_frames: usize, looping: bool) -> Self {
        AnimationState {
            frame_index: 0,
            frame_timer: Timer::from_seconds(frame_duration, TimerMode::Repeating),
            total_frames,
            looping,
            finished: false,
        }
    }

    /// Holds the current frame until the clip is switched.
    pub fn stop(&mut self) {
        self.finished = true;
    }

    /// Advances by every frame that fits in `delta`, so a slow render frame
    /// doesn't slow the clip down.
    pub fn update(&mut self, delta: Duration) {
        if self.finished || self.total_frames == 0 {
            return;
        }

        self.frame_timer.tick(delta);
        let advanced = self.frame_index + self.frame_timer.times_finished_this_tick() as usize;

        if advanced < self.total_frames {
            self.frame_index = advanced;
        } else if self.looping {
            self.frame_index = advanced % self.total_frames;
        } else {
            self.frame_index = self.total_frames - 1;
            self.finished = true;
        }
    }
}

/// Loaded once so every frog shares the same image and layout.
#[derive(Resource)]
pub struct SpriteSheets {
    pub frog: Handle<Image>,
    pub frog_layout: Handle<TextureAtlasLayout>,
}

impl SpriteSheets {
    pub fn frog_sprite(&self, size: Vec2) -> Sprite {
        Sprite {
            image: self.frog.clone(),
            texture_atlas: Some(TextureAtlas {
                layout: self.frog_layout.clone(),
                index: FrogClip::IDLE_DOWN.first_index(),
            }),
            custom_size: Some(size),
            ..default()
        }
    }
}

/// What the coordinator wants shown after looking at the controller.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VisualCommand {
    Walk(FacingDir),
    Idle(FacingDir),
    Die,
}

/// Reports the state being entered, once, on the step where it changes.
#[derive(Debug, Clone, Default)]
pub struct StateEdge<S> {
    last: Option<S>,
}

impl<S: Copy + PartialEq> StateEdge<S> {
    pub fn observe(&mut self, state: S) -> Option<S> {
        if self.last == Some(state) {
            return None;
        }
        self.last = Some(state);
        Some(state)
    }
}

/// Picks the frog's visuals from its controller, one frame at a time.
///
/// Remembers what it last applied so a clip is only (re)started when
/// something visible changes, and debounces idle so tapping a key doesn't
/// make the sprite flicker between walk and idle.
#[derive(Component, Debug, Clone)]
pub struct AnimationCoordinator {
    applied_state: Option<MoveState>,
    applied_facing: Vec2,
    idle_elapsed: f32,
    idle_delay: f32,
    edge: StateEdge<MoveState>,
}

impl Default for AnimationCoordinator {
    fn default() -> Self {
        Self::new(IDLE_DELAY)
    }
}

impl AnimationCoordinator {
    pub fn new(idle_delay: f32) -> Self {
        Self {
            applied_state: None,
            applied_facing: Vec2::Y,
            idle_elapsed: 0.0,
            idle_delay,
            edge: StateEdge::default(),
        }
    }

    pub fn observe(&mut self, state: MoveState, facing: Vec2, delta: f32) -> Option<VisualCommand> {
        let entered = self.edge.observe(state);

        match state {
            MoveState::Dead => {
                if entered != Some(MoveState::Dead) {
                    return None;
                }
                self.applied_state = Some(MoveState::Dead);
                Some(VisualCommand::Die)
            }
            MoveState::Walk => {
                self.idle_elapsed = 0.0;
                if self.applied_state == Some(MoveState::Walk) && self.applied_facing == facing {
                    return None;
                }
                self.applied_state = Some(MoveState::Walk);
                self.applied_facing = facing;
                Some(VisualCommand::Walk(FacingDir::from_facing(facing)))
            }
            MoveState::Idle => {
                self.idle_elapsed += delta;
                if self.idle_elapsed < self.idle_delay
                    || self.applied_state == Some(MoveState::Idle)
                {
                    return None;
                }
                // Keep the facing from the last walk, not whatever idle reports
                self.applied_state = Some(MoveState::Idle);
                Some(VisualCommand::Idle(FacingDir::from_facing(
                    self.applied_facing,
                )))
            }
        }
    }

    pub fn idle_elapsed(&self) -> f32 {
        self.idle_elapsed
    }
}

fn coordinate_animation_system(
    mut query: Query<(
        &PlayerController,
        &mut AnimationCoordinator,
        &mut FrogClip,
        &mut Transform,
    )>,
    config: Res<GameConfig>,
    time: Res<Time>,
    mut commands: Commands,
) {
    let delta = time.delta_secs();
    for (controller, mut coordinator, mut clip, mut transform) in query.iter_mut() {
        let Some(command) = coordinator.observe(controller.state(), controller.facing(), delta)
        else {
            continue;
        };

        match command {
            VisualCommand::Walk(dir) => *clip = FrogClip::Walk(dir),
            VisualCommand::Idle(dir) => *clip = FrogClip::Idle(dir),
            VisualCommand::Die => {
                *clip = FrogClip::Dead;
                transform.rotation = Quat::from_rotation_z(FRAC_PI_2);
                spawn_death_burst(
                    &mut commands,
                    transform.translation.truncate(),
                    config.game.death_particles,
                );
            }
        }
    }
}

// Restarts the clip and points the atlas at its first frame whenever the
// coordinator picks a different one.
fn switch_clip_system(
    mut query: Query<(&FrogClip, &mut AnimationState, &mut Sprite), Changed<FrogClip>>,
    config: Res<GameConfig>,
) {
    for (clip, mut anim_state, mut sprite) in query.iter_mut() {
        *anim_state = AnimationState::new(
            config.animation.frame_duration,
            clip.frames(),
            clip.looping(),
        );
        if *clip == FrogClip::Dead {
            anim_state.stop();
        }
        if let Some(ref mut atlas) = sprite.texture_atlas {
            atlas.index = clip.first_index();
        }
    }
}

fn animation_system(
    mut query: Query<(&mut AnimationState, &mut Sprite, &FrogClip)>,
    time: Res<Time>,
) {
    for (mut anim_state, mut sprite, clip) in query.iter_mut() {
        anim_state.update(time.delta());

        if let Some(ref mut atlas) = sprite.texture_atlas {
            atlas.index = clip.first_index() + anim_state.frame_index;
        }
    }
}

pub fn load_sprite_sheets(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    mut texture_atlas_layouts: ResMut<Assets<TextureAtlasLayout>>,
) {
    let frog = asset_server.load("sprites/frog/frog_sheet.png");
    let frog_layout = texture_atlas_layouts.add(TextureAtlasLayout::from_grid(
        UVec2::splat(CELL_SIZE),
        SHEET_COLUMNS,
        SHEET_ROWS,
        None,
        None,
    ));

    commands.insert_resource(SpriteSheets { frog, frog_layout });
}

#[cfg(test)]
mod tests {
    use bevy::ecs::system::RunSystemOnce;

    use super::*;
    use crate::effects::Particle;

    const FRAME: f32 = 1.0 / 60.0;

    #[test]
    fn direction_names() {
        assert_eq!(direction_name(Vec2::new(1.0, 0.0)), "right");
        assert_eq!(direction_name(Vec2::new(1.0, 0.7)), "right");
        assert_eq!(direction_name(Vec2::new(-1.0, 0.0)), "left");
        assert_eq!(direction_name(Vec2::new(-0.5, -0.5)), "left");
        assert_eq!(direction_name(Vec2::new(0.0, -1.0)), "up");
        assert_eq!(direction_name(Vec2::new(0.0, 1.0)), "down");
        assert_eq!(direction_name(Vec2::ZERO), "down");
    }

    #[test]
    fn walk_starts_clip_once_per_change() {
        let mut coordinator = AnimationCoordinator::default();

        assert_eq!(
            coordinator.observe(MoveState::Walk, Vec2::X, FRAME),
            Some(VisualCommand::Walk(FacingDir::Right))
        );
        assert_eq!(coordinator.observe(MoveState::Walk, Vec2::X, FRAME), None);
        assert_eq!(
            coordinator.observe(MoveState::Walk, Vec2::new(0.0, -1.0), FRAME),
            Some(VisualCommand::Walk(FacingDir::Up))
        );
    }

    #[test]
    fn idle_pose_waits_for_the_delay() {
        let mut coordinator = AnimationCoordinator::default();
        coordinator.observe(MoveState::Walk, Vec2::NEG_X, FRAME);

        assert_eq!(coordinator.observe(MoveState::Idle, Vec2::NEG_X, 0.1), None);
        assert_eq!(
            coordinator.observe(MoveState::Idle, Vec2::NEG_X, 0.1),
            Some(VisualCommand::Idle(FacingDir::Left))
        );
        // Already idle, nothing more to do
        assert_eq!(coordinator.observe(MoveState::Idle, Vec2::NEG_X, 0.1), None);
    }

    #[test]
    fn short_idle_tap_never_shows_idle_pose() {
        let mut coordinator = AnimationCoordinator::default();
        coordinator.observe(MoveState::Walk, Vec2::X, FRAME);

        let mut commands = Vec::new();
        for _ in 0..5 {
            // 0.19s of idle, then back to walking the same way
            commands.extend(coordinator.observe(MoveState::Idle, Vec2::X, 0.1));
            commands.extend(coordinator.observe(MoveState::Idle, Vec2::X, 0.09));
            commands.extend(coordinator.observe(MoveState::Walk, Vec2::X, FRAME));
            assert_eq!(coordinator.idle_elapsed(), 0.0);
        }

        assert!(commands.is_empty(), "unexpected {commands:?}");
    }

    #[test]
    fn idle_keeps_last_walk_direction() {
        let mut coordinator = AnimationCoordinator::default();
        coordinator.observe(MoveState::Walk, Vec2::new(0.0, -1.0), FRAME);

        // Idle reports a different facing, the pose still looks up
        assert_eq!(
            coordinator.observe(MoveState::Idle, Vec2::X, 0.25),
            Some(VisualCommand::Idle(FacingDir::Up))
        );
    }

    #[test]
    fn death_visual_fires_once() {
        let mut coordinator = AnimationCoordinator::default();
        coordinator.observe(MoveState::Walk, Vec2::X, FRAME);

        let deaths = (0..30)
            .filter_map(|_| coordinator.observe(MoveState::Dead, Vec2::X, FRAME))
            .collect::<Vec<_>>();

        assert_eq!(deaths, vec![VisualCommand::Die]);
    }

    #[test]
    fn edge_reports_each_entry() {
        let mut edge = StateEdge::default();
        assert_eq!(edge.observe(MoveState::Idle), Some(MoveState::Idle));
        assert_eq!(edge.observe(MoveState::Idle), None);
        assert_eq!(edge.observe(MoveState::Walk), Some(MoveState::Walk));
        assert_eq!(edge.observe(MoveState::Dead), Some(MoveState::Dead));
        assert_eq!(edge.observe(MoveState::Dead), None);
    }

    #[test]
    fn clips_map_into_the_sheet() {
        assert_eq!(FrogClip::Walk(FacingDir::Left).first_index(), 8);
        assert_eq!(FrogClip::Idle(FacingDir::Right).first_index(), 19);
        assert_eq!(FrogClip::Dead.first_index(), 20);
        assert!((FrogClip::Dead.first_index() as u32) < SHEET_COLUMNS * SHEET_ROWS);
    }

    #[test]
    fn stopped_clip_holds_its_frame() {
        let mut state = AnimationState::new(0.1, 4, true);
        state.update(Duration::from_millis(150));
        assert_eq!(state.frame_index, 1);

        state.stop();
        state.update(Duration::from_secs(1));
        assert_eq!(state.frame_index, 1);
    }

    #[test]
    fn looping_clip_wraps_and_one_shot_clip_ends() {
        let mut walk = AnimationState::new(0.1, 4, true);
        walk.update(Duration::from_millis(550));
        assert_eq!(walk.frame_index, 1);
        assert!(!walk.finished);

        let mut once = AnimationState::new(0.1, 3, false);
        once.update(Duration::from_millis(550));
        assert_eq!(once.frame_index, 2);
        assert!(once.finished);
    }

    #[test]
    fn death_visual_applies_once_in_the_world() {
        let mut world = World::new();
        let mut time = Time::<()>::default();
        time.advance_by(Duration::from_secs_f32(FRAME));
        world.insert_resource(time);
        let config = GameConfig::default();
        let particles = config.game.death_particles as usize;
        world.insert_resource(config);

        let mut controller = PlayerController::default();
        controller.hit();
        let frog = world
            .spawn((
                controller,
                AnimationCoordinator::default(),
                FrogClip::IDLE_DOWN,
                Transform::from_xyz(30.0, -40.0, 1.0),
            ))
            .id();

        for _ in 0..2 {
            world.run_system_once(coordinate_animation_system).unwrap();
            world.run_system_once(switch_clip_system).unwrap();
            world.run_system_once(animation_system).unwrap();
        }

        assert_eq!(*world.get::<FrogClip>(frog).unwrap(), FrogClip::Dead);
        assert!(world.get::<AnimationState>(frog).unwrap().finished);
        let rotation = world.get::<Transform>(frog).unwrap().rotation;
        assert!(rotation.abs_diff_eq(Quat::from_rotation_z(FRAC_PI_2), 1e-6));

        let mut burst = world.query::<&Particle>();
        assert_eq!(burst.iter(&world).count(), particles);
    }
}
