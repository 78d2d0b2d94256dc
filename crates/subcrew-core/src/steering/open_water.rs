//! Steering outside the hull: seek, wander and keep off the submarine.

use rand::Rng;
use subcrew_logic::geometry::Vec2;

use super::SteeringContext;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OpenWaterSteering {
    wander_angle: f32,
}

impl OpenWaterSteering {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn seek(&self, position: Vec2, target: Vec2) -> Vec2 {
        (target - position).normalize()
    }

    /// Drift in a slowly turning direction.
    pub fn wander(&mut self, ctx: &mut SteeringContext<'_>) -> Vec2 {
        let turn = ctx.tuning.wander_turn;
        if turn > 0.0 {
            self.wander_angle += ctx.rng.gen_range(-turn..=turn);
        }
        Vec2::new(self.wander_angle.cos(), self.wander_angle.sin())
    }

    /// Bend `direction` away from hulls ahead. The hull holding `target`
    /// is never avoided.
    pub fn avoid(&self, ctx: &SteeringContext<'_>, direction: Vec2, target: Option<Vec2>) -> Vec2 {
        let look_ahead = ctx.tuning.avoid_look_ahead;
        if direction.is_zero() || look_ahead <= 0.0 {
            return direction;
        }
        let position = ctx.character.position;
        let heading = direction.normalize();
        let ahead = position + heading * look_ahead;

        let mut push = Vec2::ZERO;
        for hull in ctx.sub.hulls() {
            if target.is_some_and(|t| hull.rect.contains(t, 0.0)) {
                continue;
            }
            let distance = hull.rect.distance_to(position);
            if distance > look_ahead || hull.rect.distance_to(ahead) >= distance {
                continue;
            }
            let away = (position - hull.rect.center()).normalize();
            push += away * (1.0 - distance / look_ahead);
        }
        heading + push
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seek_points_at_target() {
        let steering = OpenWaterSteering::default();
        let dir = steering.seek(Vec2::new(0.0, 0.0), Vec2::new(0.0, 5.0));
        assert!((dir.y - 1.0).abs() < 1e-5);
        assert_eq!(steering.seek(Vec2::new(1.0, 1.0), Vec2::new(1.0, 1.0)), Vec2::ZERO);
    }
}
