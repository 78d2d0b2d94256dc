//! Read-only snapshot of every character, captured once per tick.
//!
//! Agents look at each other through the snapshot while their own
//! components are borrowed mutably, the same collect-then-apply split the
//! systems use.

use std::collections::HashMap;

use hecs::{Entity, World};
use subcrew_logic::geometry::Vec2;

use crate::components::{Character, HullId, Submarine, Team};
use crate::controller::AiController;

/// Range at which two characters in open water see each other.
const OPEN_WATER_SIGHT: f32 = 20.0;

#[derive(Debug, Clone, PartialEq)]
pub struct CrewMember {
    pub entity: Entity,
    pub team: Team,
    pub position: Vec2,
    pub hull: Option<HullId>,
    /// Conscious, alive and not restrained.
    pub active: bool,
    pub incapacitated: bool,
    pub handcuffed: bool,
    pub security: bool,
    pub health_fraction: f32,
    pub has_ai: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CrewSnapshot {
    members: Vec<CrewMember>,
    index: HashMap<Entity, usize>,
}

impl CrewSnapshot {
    pub fn capture(world: &World) -> Self {
        let mut snapshot = Self::default();
        for (entity, (character, ai)) in world
            .query::<(&Character, Option<&AiController>)>()
            .iter()
        {
            snapshot.index.insert(entity, snapshot.members.len());
            snapshot.members.push(CrewMember {
                entity,
                team: character.team,
                position: character.position,
                hull: character.hull,
                active: character.is_active(),
                incapacitated: character.vitals.is_incapacitated(),
                handcuffed: character.handcuffed,
                security: character.is_security(),
                health_fraction: character.vitals.health_fraction(),
                has_ai: ai.is_some(),
            });
        }
        snapshot
    }

    pub fn members(&self) -> &[CrewMember] {
        &self.members
    }

    pub fn get(&self, entity: Entity) -> Option<&CrewMember> {
        self.index.get(&entity).map(|&i| &self.members[i])
    }

    /// Active, unrestrained hostiles of `team` standing in any of `hulls`.
    pub fn hostiles_in(&self, team: Team, hulls: &[HullId]) -> u32 {
        self.members
            .iter()
            .filter(|m| m.active && !team.is_friendly(m.team))
            .filter(|m| m.hull.is_some_and(|h| hulls.contains(&h)))
            .count() as u32
    }

    pub fn is_friendly(&self, a: Entity, b: Entity) -> bool {
        match (self.get(a), self.get(b)) {
            (Some(a), Some(b)) => a.team.is_friendly(b.team),
            _ => false,
        }
    }

    /// Whether `observer` can currently see `target`.
    pub fn can_perceive(&self, sub: &Submarine, observer: Entity, target: Entity) -> bool {
        match (self.get(observer), self.get(target)) {
            (Some(o), Some(t)) => perceives(sub, o.hull, o.position, t.hull, t.position),
            _ => false,
        }
    }

    /// Update the cached position after a character moved mid-tick.
    pub fn relocate(&mut self, entity: Entity, position: Vec2, hull: Option<HullId>) {
        if let Some(&i) = self.index.get(&entity) {
            self.members[i].position = position;
            self.members[i].hull = hull;
        }
    }
}

/// Sight rule: same or adjacent visible hull indoors, distance outdoors.
pub fn perceives(
    sub: &Submarine,
    from_hull: Option<HullId>,
    from: Vec2,
    to_hull: Option<HullId>,
    to: Vec2,
) -> bool {
    match (from_hull, to_hull) {
        (Some(a), Some(b)) => a == b || sub.visible_hulls(a).contains(&b),
        (None, None) => from.distance(&to) <= OPEN_WATER_SIGHT,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use subcrew_logic::access::Department;
    use subcrew_logic::doors::Passage;
    use subcrew_logic::geometry::Rect;

    #[test]
    fn test_hostile_count_skips_restrained_and_friends() {
        let mut world = World::new();
        let mut sub = Submarine::new();
        let a = sub.add_hull("A", Rect::new(0.0, 0.0, 10.0, 3.0));

        let mut crew = Character::crew("Mate", Department::Operations, 1);
        crew.hull = Some(a);
        world.spawn((crew,));
        let mut raider = Character::raider("Raider");
        raider.hull = Some(a);
        world.spawn((raider.clone(),));
        raider.handcuffed = true;
        world.spawn((raider,));

        let snapshot = CrewSnapshot::capture(&world);
        assert_eq!(snapshot.members().len(), 3);
        assert_eq!(snapshot.hostiles_in(Team::Crew, &[a]), 1);
        assert_eq!(snapshot.hostiles_in(Team::Raiders, &[a]), 1);
    }

    #[test]
    fn test_perception_through_open_door_only() {
        let mut sub = Submarine::new();
        let a = sub.add_hull("A", Rect::new(0.0, 0.0, 10.0, 3.0));
        let b = sub.add_hull("B", Rect::new(10.0, 0.0, 10.0, 3.0));
        let d = sub.add_door(Vec2::new(10.0, 0.0), Passage::Horizontal, [Some(a), Some(b)]);
        let p = Vec2::ZERO;
        assert!(!perceives(&sub, Some(a), p, Some(b), p));
        sub.door_mut(d).unwrap().operate(true);
        assert!(perceives(&sub, Some(a), p, Some(b), p));
        assert!(!perceives(&sub, Some(a), p, None, p));
        assert!(perceives(&sub, None, p, None, Vec2::new(5.0, 0.0)));
    }
}
