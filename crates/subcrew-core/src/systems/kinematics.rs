//! Kinematic stand-in for the physics body.
//!
//! Characters move at their desired velocity with a few rules applied:
//! walkers stay on the floor, climbers stay on their ladder, swimmers move
//! freely, and nobody passes through a door that isn't fully open.

use hecs::World;
use subcrew_logic::config::SteeringTuning;
use subcrew_logic::geometry::Vec2;

use crate::components::{Character, Submarine};

/// Fraction of the velocity difference made up per second in water.
const WATER_RESPONSE: f32 = 4.0;

/// Move every character one step.
pub fn kinematics_system(world: &mut World, sub: &Submarine, tuning: &SteeringTuning, dt: f32) {
    for (_, character) in world.query_mut::<&mut Character>() {
        integrate(character, sub, tuning, dt);
    }
}

/// Move one character and refresh where they are.
pub fn integrate(character: &mut Character, sub: &Submarine, tuning: &SteeringTuning, dt: f32) {
    if dt <= 0.0 {
        return;
    }
    if character.climbing.is_some() && !character.can_climb() {
        character.climbing = None;
    }

    let desired = character.desired_velocity;
    let ladder = character.climbing.and_then(|id| sub.ladder(id).ok());
    character.velocity = if let Some(ladder) = ladder {
        Vec2::new((ladder.x - character.position.x) / dt, desired.y)
    } else if character.in_water || character.hull.is_none() {
        let blend = (WATER_RESPONSE * dt).min(1.0);
        character.velocity + (desired - character.velocity) * blend
    } else {
        Vec2::new(desired.x, 0.0)
    };

    let from = character.position;
    let mut to = from + character.velocity * dt;
    if sub.blocking_door(from, to).is_some() {
        to = from;
        character.velocity = Vec2::ZERO;
    }
    if let Some(ladder) = ladder {
        to.x = ladder.x;
        to.y = to.y.clamp(ladder.bottom, ladder.top);
    }
    character.position = to;

    let body = Vec2::new(to.x, to.y + character.collider_height * 0.5);
    character.hull = sub.hull_at(body).or_else(|| sub.hull_at_feet(to));
    let hull = character.hull.and_then(|h| sub.hull(h).ok());
    character.in_water = match hull {
        Some(h) => h.water_depth_at(character.position.y) > tuning.submerged_depth,
        None => true,
    };

    let walking = ladder.is_none() && !character.in_water;
    match hull {
        Some(h) if walking => {
            character.position.y = h.rect.min_y();
            character.on_floor = true;
        }
        _ => character.on_floor = false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use subcrew_logic::access::Department;
    use subcrew_logic::doors::Passage;
    use subcrew_logic::geometry::Rect;

    fn deck() -> Submarine {
        let mut sub = Submarine::new();
        let a = sub.add_hull("Lower", Rect::new(0.0, 0.0, 10.0, 3.0));
        sub.add_hull("Upper", Rect::new(0.0, 3.0, 10.0, 3.0));
        let c = sub.add_hull("Aft", Rect::new(10.0, 0.0, 10.0, 3.0));
        sub.add_door(Vec2::new(10.0, 0.0), Passage::Horizontal, [Some(a), Some(c)]);
        sub.add_ladder(2.0, 0.0, 3.0);
        sub
    }

    fn walker(x: f32) -> Character {
        let mut c = Character::crew("Mate", Department::Operations, 1).at(Vec2::new(x, 0.0));
        c.hull = Some(0);
        c
    }

    #[test]
    fn test_walker_stays_on_floor() {
        let sub = deck();
        let mut mate = walker(1.0);
        mate.desired_velocity = Vec2::new(2.0, 5.0);
        integrate(&mut mate, &sub, &SteeringTuning::default(), 0.5);
        assert!((mate.position.x - 2.0).abs() < 1e-5);
        assert_eq!(mate.position.y, 0.0);
        assert!(mate.on_floor);
        assert_eq!(mate.hull, Some(0));
    }

    #[test]
    fn test_closed_door_blocks() {
        let sub = deck();
        let mut mate = walker(9.8);
        mate.desired_velocity = Vec2::new(2.0, 0.0);
        integrate(&mut mate, &sub, &SteeringTuning::default(), 0.5);
        assert!((mate.position.x - 9.8).abs() < 1e-5);
        assert_eq!(mate.velocity, Vec2::ZERO);
    }

    #[test]
    fn test_climber_rises_into_upper_hull() {
        let sub = deck();
        let mut mate = walker(2.0);
        mate.climbing = Some(0);
        mate.desired_velocity = Vec2::new(0.0, 2.0);
        let tuning = SteeringTuning::default();
        for _ in 0..4 {
            integrate(&mut mate, &sub, &tuning, 0.5);
        }
        assert_eq!(mate.position.y, 3.0);
        assert_eq!(mate.hull, Some(1));
        assert!(!mate.on_floor);

        mate.climbing = None;
        integrate(&mut mate, &sub, &tuning, 0.1);
        assert_eq!(mate.position.y, 3.0);
        assert!(mate.on_floor);
    }

    #[test]
    fn test_creature_cannot_hold_ladder() {
        let sub = deck();
        let mut eel = Character::creature("Eel").at(Vec2::new(2.0, 0.0));
        eel.hull = Some(0);
        eel.climbing = Some(0);
        eel.desired_velocity = Vec2::new(0.0, 2.0);
        integrate(&mut eel, &sub, &SteeringTuning::default(), 0.5);
        assert_eq!(eel.climbing, None);
        assert_eq!(eel.position.y, 0.0);
    }

    #[test]
    fn test_flooded_hull_means_swimming() {
        let mut sub = deck();
        sub.hull_mut(0).unwrap().water_percentage = 100.0;
        let mut mate = walker(5.0);
        mate.desired_velocity = Vec2::new(0.0, 1.0);
        integrate(&mut mate, &sub, &SteeringTuning::default(), 0.1);
        assert!(mate.in_water);
        assert!(!mate.on_floor);
        integrate(&mut mate, &sub, &SteeringTuning::default(), 0.1);
        assert!(mate.position.y > 0.0);
    }
}
