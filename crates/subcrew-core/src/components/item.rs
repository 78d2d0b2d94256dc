//! Items the crew carry, stow and use.

use serde::{Deserialize, Serialize};

pub type ItemId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    /// Full diving suit: own air plus pressure protection.
    DivingSuit,
    /// Mask: own air only.
    DivingMask,
    Extinguisher,
    WeldingTool,
    Wrench,
    Weapon,
    Handcuffs,
    MedKit,
    Explosive,
    Misc,
}

impl ItemKind {
    pub fn is_diving_gear(self) -> bool {
        matches!(self, ItemKind::DivingSuit | ItemKind::DivingMask)
    }

    pub fn provides_air(self) -> bool {
        self.is_diving_gear()
    }

    pub fn provides_pressure_protection(self) -> bool {
        self == ItemKind::DivingSuit
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub kind: ItemKind,
    /// Worth, for theft tallies.
    pub value: f32,
    /// Lowers the safety of whatever room it lies in.
    pub dangerous: bool,
}

impl Item {
    pub fn new(id: ItemId, kind: ItemKind) -> Self {
        Self {
            id,
            kind,
            value: 10.0,
            dangerous: kind == ItemKind::Explosive,
        }
    }
}
