//! Characters: crew, intruders and sea creatures.

use serde::{Deserialize, Serialize};
use subcrew_logic::access::{Clearance, Department};
use subcrew_logic::geometry::Vec2;
use subcrew_logic::hazard::Protection;
use subcrew_logic::penalty::TraverserTraits;
use subcrew_logic::progress::TraversalMode;

use super::item::{Item, ItemId, ItemKind};
use super::ship::{HullId, LadderId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    #[default]
    Crew,
    Raiders,
    Creatures,
}

impl Team {
    pub fn is_friendly(self, other: Team) -> bool {
        self == other
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyKind {
    Humanoid,
    /// Swims, can't climb or press buttons, may smash doors.
    Creature,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    pub health: f32,
    pub max_health: f32,
    pub conscious: bool,
}

impl Default for Vitals {
    fn default() -> Self {
        Self {
            health: 100.0,
            max_health: 100.0,
            conscious: true,
        }
    }
}

impl Vitals {
    pub fn health_fraction(&self) -> f32 {
        if self.max_health <= 0.0 {
            return 0.0;
        }
        (self.health / self.max_health).clamp(0.0, 1.0)
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    pub fn is_incapacitated(&self) -> bool {
        !self.conscious || self.is_dead()
    }
}

/// Worn gear, held items and pocket storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    /// Suit or mask currently worn.
    pub worn: Option<Item>,
    pub hands: Vec<Item>,
    pub pockets: Vec<Item>,
}

/// Items held at once.
pub const HAND_SLOTS: usize = 2;
pub const POCKET_SLOTS: usize = 4;

impl Inventory {
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.worn.iter().chain(self.hands.iter()).chain(self.pockets.iter())
    }

    pub fn has(&self, kind: ItemKind) -> bool {
        self.items().any(|i| i.kind == kind)
    }

    pub fn is_wearing(&self, kind: ItemKind) -> bool {
        self.worn.as_ref().is_some_and(|i| i.kind == kind)
    }

    pub fn has_weapon(&self) -> bool {
        self.has(ItemKind::Weapon)
    }

    pub fn is_full(&self) -> bool {
        self.hands.len() >= HAND_SLOTS && self.pockets.len() >= POCKET_SLOTS
    }

    /// Pick something up into a free hand, then a free pocket.
    pub fn add(&mut self, item: Item) -> Result<(), Item> {
        if item.kind.is_diving_gear() && self.worn.is_none() {
            self.worn = Some(item);
        } else if self.hands.len() < HAND_SLOTS {
            self.hands.push(item);
        } else if self.pockets.len() < POCKET_SLOTS {
            self.pockets.push(item);
        } else {
            return Err(item);
        }
        Ok(())
    }

    pub fn take(&mut self, id: ItemId) -> Option<Item> {
        if self.worn.as_ref().is_some_and(|i| i.id == id) {
            return self.worn.take();
        }
        if let Some(pos) = self.hands.iter().position(|i| i.id == id) {
            return Some(self.hands.remove(pos));
        }
        let pos = self.pockets.iter().position(|i| i.id == id)?;
        Some(self.pockets.remove(pos))
    }

    pub fn find(&self, kind: ItemKind) -> Option<&Item> {
        self.items().find(|i| i.kind == kind)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    pub team: Team,
    pub body: BodyKind,
    pub clearance: Clearance,
    /// Feet position.
    pub position: Vec2,
    pub velocity: Vec2,
    /// Velocity the controller asks the body for this tick.
    pub desired_velocity: Vec2,
    /// +1 facing right, -1 facing left.
    pub facing: f32,
    pub hull: Option<HullId>,
    pub climbing: Option<LadderId>,
    pub on_floor: bool,
    pub in_water: bool,
    pub collider_radius: f32,
    pub collider_height: f32,
    pub vitals: Vitals,
    pub inventory: Inventory,
    pub handcuffed: bool,
    pub needs_air: bool,
    /// 0..=1; higher re-plans paths more often.
    pub pathfinder_priority: f32,
}

impl Character {
    fn base(name: impl Into<String>, team: Team, body: BodyKind, clearance: Clearance) -> Self {
        Self {
            name: name.into(),
            team,
            body,
            clearance,
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            desired_velocity: Vec2::ZERO,
            facing: 1.0,
            hull: None,
            climbing: None,
            on_floor: true,
            in_water: false,
            collider_radius: 0.3,
            collider_height: 1.8,
            vitals: Vitals::default(),
            inventory: Inventory::default(),
            handcuffed: false,
            needs_air: true,
            pathfinder_priority: 0.5,
        }
    }

    pub fn crew(name: impl Into<String>, department: Department, rank: u8) -> Self {
        Self::base(name, Team::Crew, BodyKind::Humanoid, Clearance::crew(department, rank))
    }

    pub fn raider(name: impl Into<String>) -> Self {
        Self::base(name, Team::Raiders, BodyKind::Humanoid, Clearance::outsider())
    }

    pub fn creature(name: impl Into<String>) -> Self {
        let mut c = Self::base(name, Team::Creatures, BodyKind::Creature, Clearance::outsider());
        c.needs_air = false;
        c.collider_radius = 0.6;
        c.collider_height = 1.2;
        c
    }

    pub fn at(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    /// Conscious, alive and free to act.
    pub fn is_active(&self) -> bool {
        !self.vitals.is_incapacitated() && !self.handcuffed
    }

    pub fn is_security(&self) -> bool {
        self.clearance.is_security()
    }

    pub fn is_armed(&self) -> bool {
        self.inventory.has_weapon() || self.body == BodyKind::Creature
    }

    pub fn can_climb(&self) -> bool {
        self.body == BodyKind::Humanoid
    }

    pub fn can_open_doors(&self) -> bool {
        self.body == BodyKind::Humanoid && !self.handcuffed
    }

    pub fn can_break_doors(&self) -> bool {
        self.body == BodyKind::Creature
    }

    pub fn protection(&self) -> Protection {
        let worn = self.inventory.worn.as_ref();
        Protection {
            breathing: !self.needs_air || worn.is_some_and(|i| i.kind.provides_air()),
            pressure: self.body == BodyKind::Creature
                || worn.is_some_and(|i| i.kind.provides_pressure_protection()),
        }
    }

    pub fn traverser_traits(&self) -> TraverserTraits {
        let protection = self.protection();
        TraverserTraits {
            breathing_gear: protection.breathing,
            pressure_protection: protection.pressure,
            aquatic: self.body == BodyKind::Creature,
        }
    }

    pub fn traversal_mode(&self) -> TraversalMode {
        if self.climbing.is_some() {
            TraversalMode::Climbing
        } else if self.in_water || self.hull.is_none() {
            TraversalMode::Swimming
        } else {
            TraversalMode::Walking
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inventory_slots() {
        let mut inv = Inventory::default();
        let suit = Item::new(1, ItemKind::DivingSuit);
        inv.add(suit).unwrap();
        assert!(inv.is_wearing(ItemKind::DivingSuit));
        for id in 2..8 {
            inv.add(Item::new(id, ItemKind::Misc)).unwrap();
        }
        assert!(inv.is_full());
        assert!(inv.add(Item::new(99, ItemKind::Wrench)).is_err());
        assert_eq!(inv.take(1).map(|i| i.kind), Some(ItemKind::DivingSuit));
        assert!(inv.take(1).is_none());
    }

    #[test]
    fn test_protection_from_gear() {
        let mut diver = Character::crew("Diver", Department::Engineering, 1);
        assert_eq!(diver.protection(), Protection::default());
        diver.inventory.add(Item::new(1, ItemKind::DivingMask)).unwrap();
        assert!(diver.protection().breathing);
        assert!(!diver.protection().pressure);

        let fish = Character::creature("Crawler");
        assert!(fish.protection().breathing && fish.protection().pressure);
        assert!(fish.traverser_traits().aquatic);
    }

    #[test]
    fn test_activity_and_roles() {
        let mut guard = Character::crew("Guard", Department::Security, 2);
        assert!(guard.is_security());
        assert!(guard.is_active());
        guard.vitals.conscious = false;
        assert!(!guard.is_active());
        assert!(Team::Crew.is_friendly(Team::Crew));
        assert!(!Team::Crew.is_friendly(Team::Raiders));
    }

    #[test]
    fn test_traversal_mode() {
        let mut c = Character::crew("Deckhand", Department::Operations, 0);
        c.hull = Some(0);
        assert_eq!(c.traversal_mode(), TraversalMode::Walking);
        c.climbing = Some(0);
        assert_eq!(c.traversal_mode(), TraversalMode::Climbing);
        c.climbing = None;
        c.hull = None;
        assert_eq!(c.traversal_mode(), TraversalMode::Swimming);
    }
}
