use bevy::prelude::*;
use rand::Rng;

pub struct EffectsPlugin;

impl Plugin for EffectsPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, particle_system);
    }
}

const PARTICLE_LIFETIME: f32 = 0.6;
const PARTICLE_SIZE: f32 = 4.0;

/// A short-lived splat thrown out by the death burst.
/// Drifts, slows down and fades, then despawns itself.
#[derive(Component)]
pub struct Particle {
    pub velocity: Vec2,
    pub lifetime: Timer,
}

/// One-shot ring of particles around `position`.
pub fn spawn_death_burst(commands: &mut Commands, position: Vec2, count: u32) {
    let mut rng = rand::thread_rng();

    for i in 0..count {
        // Evenly spread angles with a little jitter so it doesn't look stamped
        let angle = std::f32::consts::TAU * i as f32 / count as f32 + rng.gen_range(-0.2..0.2);
        let speed = rng.gen_range(60.0..140.0);

        commands.spawn((
            Particle {
                velocity: Vec2::from_angle(angle) * speed,
                lifetime: Timer::from_seconds(PARTICLE_LIFETIME, TimerMode::Once),
            },
            Sprite::from_color(Color::srgb(0.4, 0.8, 0.3), Vec2::splat(PARTICLE_SIZE)),
            Transform::from_translation(position.extend(2.0)),
        ));
    }
}

fn particle_system(
    mut commands: Commands,
    mut query: Query<(Entity, &mut Particle, &mut Transform, &mut Sprite)>,
    time: Res<Time>,
) {
    let delta = time.delta_secs();
    for (entity, mut particle, mut transform, mut sprite) in query.iter_mut() {
        particle.lifetime.tick(time.delta());
        if particle.lifetime.is_finished() {
            commands.entity(entity).despawn();
            continue;
        }

        transform.translation += (particle.velocity * delta).extend(0.0);
        particle.velocity *= 0.92;

        let alpha = 1.0 - particle.lifetime.fraction();
        sprite.color = Color::srgba(0.4, 0.8, 0.3, alpha);
    }
}

#[cfg(test)]
mod tests {
    use bevy::ecs::system::RunSystemOnce;

    use super::*;

    #[test]
    fn burst_spawns_requested_particles() {
        let mut world = World::new();
        world
            .run_system_once(|mut commands: Commands| {
                spawn_death_burst(&mut commands, Vec2::new(10.0, -5.0), 12);
            })
            .unwrap();

        let mut particles = world.query::<(&Particle, &Transform)>();
        assert_eq!(particles.iter(&world).count(), 12);
        for (particle, transform) in particles.iter(&world) {
            assert_eq!(transform.translation.truncate(), Vec2::new(10.0, -5.0));
            assert!(particle.velocity.length() > 59.9);
        }
    }
}
