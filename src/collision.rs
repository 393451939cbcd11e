use bevy::prelude::*;

/// Axis-aligned box centred on the entity's translation.
#[derive(Component, Copy, Clone, Debug, PartialEq)]
pub struct Collider {
    pub half_extents: Vec2,
}

impl Collider {
    pub fn from_size(size: Vec2) -> Self {
        Self {
            half_extents: size * 0.5,
        }
    }

    /// True when the two boxes share any area. Touching edges don't count.
    pub fn overlaps(&self, position: Vec2, other: &Collider, other_position: Vec2) -> bool {
        let gap = (position - other_position).abs();
        let reach = self.half_extents + other.half_extents;
        gap.x < reach.x && gap.y < reach.y
    }
}

/// Marks a region that removes any obstacle overlapping it.
#[derive(Component)]
pub struct KillZone;

/// The walkable area. The player is clamped inside it every physics step.
#[derive(Resource, Copy, Clone, Debug)]
pub struct Playfield {
    pub half_extents: Vec2,
}

impl Playfield {
    /// Keeps a box of `half_size` inside the field.
    ///
    /// Each axis is clamped on its own, so pushing diagonally into a wall
    /// still slides along it.
    pub fn clamp(&self, position: Vec2, half_size: Vec2) -> Vec2 {
        let limit = (self.half_extents - half_size).max(Vec2::ZERO);
        position.clamp(-limit, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_boxes() {
        let a = Collider::from_size(Vec2::new(10.0, 10.0));
        let b = Collider::from_size(Vec2::new(20.0, 4.0));

        assert!(a.overlaps(Vec2::ZERO, &b, Vec2::new(14.0, 6.0)));
        assert!(!a.overlaps(Vec2::ZERO, &b, Vec2::new(15.0, 0.0)));
        assert!(!a.overlaps(Vec2::ZERO, &b, Vec2::new(0.0, 7.5)));
    }

    #[test]
    fn clamp_slides_along_the_wall() {
        let field = Playfield {
            half_extents: Vec2::new(100.0, 50.0),
        };
        let clamped = field.clamp(Vec2::new(130.0, 20.0), Vec2::splat(10.0));
        assert_eq!(clamped, Vec2::new(90.0, 20.0));
    }
}
